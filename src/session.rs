// session.rs

use std::fmt;

use log::*;
use tokio::sync::mpsc;

use crate::DeviceError;

/// Opaque handle of one channel connection. Equality means "same client".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Queue of text frames feeding one client's socket.
pub type Outbound = mpsc::Sender<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Accepted,
    Rejected,
}

#[derive(Debug)]
struct ActiveClient {
    id: ClientId,
    outbound: Outbound,
}

/// At most one active client at any time.
#[derive(Debug, Default)]
pub struct Session {
    active: Option<ActiveClient>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_client(&self) -> Option<ClientId> {
        self.active.as_ref().map(|c| c.id)
    }

    pub fn is_authorized(&self, id: ClientId) -> bool {
        self.active_client() == Some(id)
    }

    /// Accept `id` only if nobody holds the session. A rejected candidate's
    /// outbound queue is dropped here, which closes its socket.
    pub fn on_connect_attempt(&mut self, id: ClientId, outbound: Outbound) -> ConnectOutcome {
        match &self.active {
            Some(active) => {
                warn!("Client {id} refused, {} already connected", active.id);
                drop(outbound);
                ConnectOutcome::Rejected
            }
            None => {
                info!("Client {id} connected");
                self.active = Some(ActiveClient { id, outbound });
                ConnectOutcome::Accepted
            }
        }
    }

    /// Returns true if this released the session.
    pub fn on_disconnect(&mut self, id: ClientId) -> bool {
        if self.is_authorized(id) {
            info!("Client {id} disconnected");
            self.active = None;
            true
        } else {
            debug!("Ignoring disconnect of inactive client {id}");
            false
        }
    }

    /// Queue `text` to `id` if it is the active client. Never waits.
    pub fn send_to(&self, id: ClientId, text: String) -> Result<(), DeviceError> {
        match &self.active {
            Some(active) if active.id == id => active
                .outbound
                .try_send(text)
                .map_err(|_| DeviceError::TransportFault(id)),
            _ => Err(DeviceError::AuthorizationFailure(id)),
        }
    }

    /// Queue `text` to the active client, if any. `Ok(false)` means nobody is connected.
    pub fn send_active(&self, text: String) -> Result<bool, DeviceError> {
        match &self.active {
            Some(active) => active
                .outbound
                .try_send(text)
                .map(|_| true)
                .map_err(|_| DeviceError::TransportFault(active.id)),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_client_is_refused() {
        let mut s = Session::new();
        let (tx_a, _rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        let a = ClientId::new(1);
        let b = ClientId::new(2);

        assert_eq!(s.on_connect_attempt(a, tx_a), ConnectOutcome::Accepted);
        assert_eq!(s.on_connect_attempt(b, tx_b), ConnectOutcome::Rejected);
        assert!(s.is_authorized(a));
        assert!(!s.is_authorized(b));
        // the refused socket sees its queue closed
        assert_eq!(rx_b.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
    }

    #[test]
    fn only_active_client_disconnect_releases() {
        let mut s = Session::new();
        let (tx, _rx) = mpsc::channel(4);
        let a = ClientId::new(1);
        s.on_connect_attempt(a, tx);

        assert!(!s.on_disconnect(ClientId::new(7)));
        assert!(s.is_connected());
        assert!(s.on_disconnect(a));
        assert!(!s.is_connected());
        assert_eq!(s.active_client(), None);
    }

    #[test]
    fn full_queue_is_transport_fault() {
        let mut s = Session::new();
        let (tx, mut rx) = mpsc::channel(1);
        let a = ClientId::new(3);
        s.on_connect_attempt(a, tx);

        assert_eq!(s.send_active("1".into()), Ok(true));
        assert_eq!(s.send_active("2".into()), Err(DeviceError::TransportFault(a)));
        assert_eq!(rx.try_recv().unwrap(), "1");
        // still connected
        assert!(s.is_authorized(a));
    }

    #[test]
    fn send_without_client_is_noop() {
        let s = Session::new();
        assert_eq!(s.send_active("x".into()), Ok(false));
        assert_eq!(
            s.send_to(ClientId::new(1), "x".into()),
            Err(DeviceError::AuthorizationFailure(ClientId::new(1)))
        );
    }
}

// EOF
