//! Command interpreter tests against the wire format

use esp32tempmon::*;
use tokio::sync::mpsc;

fn device_state() -> DeviceState<SimPin> {
    let indicators = Indicators::new(
        SimPin::new("connection"),
        SimPin::new("read"),
        SimPin::new("recording"),
        SimPin::new("alert"),
    );
    DeviceState::new(indicators, 16)
}

fn reply(state: &mut DeviceState<SimPin>, id: ClientId, text: &str) -> Option<String> {
    interpret(state, id, text, Instant::now()).map(|f| f.to_json())
}

#[test]
fn test_unknown_commands_fail_closed() {
    let mut st = device_state();
    let (tx, _rx) = mpsc::channel(4);
    let a = ClientId::new(1);
    st.connect(a, tx);

    for text in ["foo", "", "Test", "start_record ", "get-record", "threshold_alert", "{\"cmd\":\"test\"}"] {
        assert_eq!(
            reply(&mut st, a, text).as_deref(),
            Some(r#"{"error":"unknown command"}"#),
            "{text:?}"
        );
        assert!(!st.recording.is_recording());
        assert!(!st.is_alerting());
        assert!(st.indicators.connection.is_on());
    }
}

#[test]
fn test_replies_per_command() {
    let mut st = device_state();
    let (tx, _rx) = mpsc::channel(4);
    let a = ClientId::new(9);
    st.connect(a, tx);

    assert_eq!(reply(&mut st, a, "test").as_deref(), Some(r#"{"status":"ok"}"#));
    assert_eq!(reply(&mut st, a, "web_connected"), None);
    assert_eq!(reply(&mut st, a, "web_disconnected"), None);
    assert_eq!(reply(&mut st, a, "threshold_alert_on"), None);
    assert_eq!(reply(&mut st, a, "threshold_alert_off"), None);
    assert_eq!(
        reply(&mut st, a, "start_record").as_deref(),
        Some(r#"{"recording":"started"}"#)
    );
    assert_eq!(
        reply(&mut st, a, "end_record").as_deref(),
        Some(r#"{"recording":"stopped"}"#)
    );
    assert_eq!(reply(&mut st, a, "get_record").as_deref(), Some(r#"{"data":[]}"#));
}

#[test]
fn test_web_disconnected_only_touches_indicator() {
    let mut st = device_state();
    let (tx, _rx) = mpsc::channel(4);
    let a = ClientId::new(1);
    st.connect(a, tx);

    reply(&mut st, a, "web_disconnected");
    assert!(!st.indicators.connection.is_on());
    // the session itself is unaffected
    assert!(st.session.is_authorized(a));
}

#[test]
fn test_end_record_freezes_samples() {
    let mut st = device_state();
    let a = ClientId::new(1);

    reply(&mut st, a, "start_record");
    st.recording.push(20.0);
    st.recording.push(20.5);
    reply(&mut st, a, "end_record");
    st.recording.push(21.0);

    assert_eq!(
        reply(&mut st, a, "get_record").as_deref(),
        Some(r#"{"data":[20.0,20.5]}"#)
    );
}
