// error.rs

use thiserror::Error;

use crate::ClientId;

/// Faults the device recovers from locally. None of these stop the control loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Inbound text is not one of the recognized commands.
    #[error("unknown command {0:?}")]
    ProtocolViolation(String),
    /// Connect attempt or message from a client that is not the active one.
    #[error("client {0} is not the active client")]
    AuthorizationFailure(ClientId),
    /// The sensor produced no usable reading.
    #[error("sensor fault: {0}")]
    SensorFault(String),
    /// A frame could not be queued to the client.
    #[error("cannot write to client {0}")]
    TransportFault(ClientId),
}

impl DeviceError {
    /// Text sent back to the client, where the fault warrants a reply at all.
    pub fn reply_text(&self) -> Option<&'static str> {
        match self {
            Self::ProtocolViolation(_) => Some("unknown command"),
            Self::AuthorizationFailure(_) => Some("another user is already connected"),
            Self::SensorFault(_) | Self::TransportFault(_) => None,
        }
    }
}


// EOF
