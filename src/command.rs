// command.rs

use std::str::FromStr;

use embedded_hal::digital::OutputPin;
use log::*;
use serde::Serialize;
use tokio::time::Instant;

use crate::{ClientId, DeviceError, DeviceState};

/// Everything a client may send. Anything else is a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Test,
    WebConnected,
    WebDisconnected,
    StartRecord,
    EndRecord,
    ThresholdAlertOn,
    ThresholdAlertOff,
    GetRecord,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Test,
        Command::WebConnected,
        Command::WebDisconnected,
        Command::StartRecord,
        Command::EndRecord,
        Command::ThresholdAlertOn,
        Command::ThresholdAlertOff,
        Command::GetRecord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::WebConnected => "web_connected",
            Self::WebDisconnected => "web_disconnected",
            Self::StartRecord => "start_record",
            Self::EndRecord => "end_record",
            Self::ThresholdAlertOn => "threshold_alert_on",
            Self::ThresholdAlertOff => "threshold_alert_off",
            Self::GetRecord => "get_record",
        }
    }
}

impl FromStr for Command {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DeviceError::ProtocolViolation(s.to_string()))
    }
}

/// Outbound JSON frame, serialized as an object with a single key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    Temperature(f32),
    Status(&'static str),
    Recording(&'static str),
    Data(Vec<f32>),
    Error(&'static str),
}

impl Frame {
    pub fn error(e: &DeviceError) -> Self {
        Frame::Error(e.reply_text().unwrap_or("internal error"))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Run one command from `sender` against the device state.
///
/// Returns the reply for the sender, or `None` for the fire-and-forget
/// commands. Unrecognized text leaves the state untouched.
pub fn interpret<P: OutputPin>(
    state: &mut DeviceState<P>,
    sender: ClientId,
    text: &str,
    now: Instant,
) -> Option<Frame> {
    let cmd = match text.parse::<Command>() {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!("Client {sender}: {e}");
            return Some(Frame::error(&e));
        }
    };
    info!("Client {sender} command {}", cmd.as_str());

    match cmd {
        Command::Test => {
            if state.session.is_authorized(sender) {
                Some(Frame::Status("ok"))
            } else {
                Some(Frame::error(&DeviceError::AuthorizationFailure(sender)))
            }
        }
        Command::WebConnected => {
            state.indicators.connection.set(true);
            None
        }
        Command::WebDisconnected => {
            state.indicators.connection.set(false);
            None
        }
        Command::StartRecord => {
            state.set_recording(true, now);
            Some(Frame::Recording("started"))
        }
        Command::EndRecord => {
            state.set_recording(false, now);
            Some(Frame::Recording("stopped"))
        }
        Command::ThresholdAlertOn => {
            state.set_alerting(true, now);
            None
        }
        Command::ThresholdAlertOff => {
            state.set_alerting(false, now);
            None
        }
        Command::GetRecord => Some(Frame::Data(state.recording.samples().to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Indicators, SimPin};
    use tokio::sync::mpsc;

    fn device_state() -> DeviceState<SimPin> {
        let ind = Indicators::new(
            SimPin::new("connection"),
            SimPin::new("read"),
            SimPin::new("recording"),
            SimPin::new("alert"),
        );
        DeviceState::new(ind, 100)
    }

    #[test]
    fn frames_match_wire_format() {
        assert_eq!(Frame::Temperature(21.5).to_json(), r#"{"temperature":21.5}"#);
        assert_eq!(Frame::Status("ok").to_json(), r#"{"status":"ok"}"#);
        assert_eq!(Frame::Recording("started").to_json(), r#"{"recording":"started"}"#);
        assert_eq!(Frame::Data(vec![]).to_json(), r#"{"data":[]}"#);
        assert_eq!(
            Frame::Data(vec![20.0, 21.5, 19.8]).to_json(),
            r#"{"data":[20.0,21.5,19.8]}"#
        );
        assert_eq!(
            Frame::Error("unknown command").to_json(),
            r#"{"error":"unknown command"}"#
        );
    }

    #[test]
    fn every_literal_parses() {
        for cmd in Command::ALL {
            assert_eq!(cmd.as_str().parse::<Command>(), Ok(cmd));
        }
        assert!("TEST".parse::<Command>().is_err());
        assert!(" test".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn unknown_command_changes_nothing() {
        let mut st = device_state();
        let now = Instant::now();
        st.set_recording(true, now);
        st.recording.push(20.0);

        let reply = interpret(&mut st, ClientId::new(1), "foo", now);
        assert_eq!(reply.unwrap().to_json(), r#"{"error":"unknown command"}"#);
        assert!(st.recording.is_recording());
        assert_eq!(st.recording.samples(), &[20.0]);
        assert!(!st.is_alerting());
    }

    #[test]
    fn test_command_checks_sender() {
        let mut st = device_state();
        let (tx, _rx) = mpsc::channel(4);
        let a = ClientId::new(1);
        st.connect(a, tx);
        let now = Instant::now();

        assert_eq!(interpret(&mut st, a, "test", now), Some(Frame::Status("ok")));
        assert_eq!(
            interpret(&mut st, ClientId::new(2), "test", now).unwrap().to_json(),
            r#"{"error":"another user is already connected"}"#
        );
    }

    #[test]
    fn fire_and_forget_commands() {
        let mut st = device_state();
        let a = ClientId::new(1);
        let now = Instant::now();

        assert_eq!(interpret(&mut st, a, "web_connected", now), None);
        assert!(st.indicators.connection.is_on());
        assert_eq!(interpret(&mut st, a, "web_disconnected", now), None);
        assert!(!st.indicators.connection.is_on());

        assert_eq!(interpret(&mut st, a, "threshold_alert_on", now), None);
        assert!(st.is_alerting());
        assert!(st.indicators.alert.is_blinking());
        assert_eq!(interpret(&mut st, a, "threshold_alert_off", now), None);
        assert!(!st.is_alerting());
        assert!(!st.indicators.alert.is_on());
    }

    #[test]
    fn record_commands() {
        let mut st = device_state();
        let a = ClientId::new(1);
        let now = Instant::now();

        assert_eq!(interpret(&mut st, a, "get_record", now), Some(Frame::Data(vec![])));
        assert_eq!(
            interpret(&mut st, a, "start_record", now),
            Some(Frame::Recording("started"))
        );
        assert!(st.indicators.recording.is_blinking());
        st.recording.push(18.25);
        assert_eq!(
            interpret(&mut st, a, "end_record", now),
            Some(Frame::Recording("stopped"))
        );
        assert!(!st.indicators.recording.is_on());
        assert_eq!(interpret(&mut st, a, "get_record", now), Some(Frame::Data(vec![18.25])));
    }
}

// EOF
