// device.rs

use std::sync::Arc;

use anyhow::bail;
use chrono::{DateTime, Utc};
use embedded_hal::digital::OutputPin;
use log::*;
use tokio::{
    sync::mpsc,
    time::{sleep, Duration, Instant},
};

use crate::*;

/// Idle time of one control loop iteration when no channel event arrives.
pub const LOOP_TICK: Duration = Duration::from_millis(10);

/// What the socket tasks report to the control loop.
#[derive(Debug)]
pub enum ChannelEvent {
    Connected { id: ClientId, outbound: Outbound },
    Message { id: ClientId, text: String },
    Disconnected { id: ClientId },
}

/// All mutable device state. Owned by the control loop and nothing else.
pub struct DeviceState<P> {
    pub session: Session,
    pub indicators: Indicators<P>,
    pub recording: RecordingBuffer,
    alerting: bool,
}

impl<P: OutputPin> DeviceState<P> {
    pub fn new(indicators: Indicators<P>, record_limit: usize) -> Self {
        Self {
            session: Session::new(),
            indicators,
            recording: RecordingBuffer::new(record_limit),
            alerting: false,
        }
    }

    pub fn connect(&mut self, id: ClientId, outbound: Outbound) -> ConnectOutcome {
        let outcome = self.session.on_connect_attempt(id, outbound);
        if outcome == ConnectOutcome::Accepted {
            self.indicators.connection.set(true);
        }
        outcome
    }

    pub fn disconnect(&mut self, id: ClientId) {
        if self.session.on_disconnect(id) {
            self.indicators.connection.set(false);
        }
    }

    pub fn set_recording(&mut self, on: bool, now: Instant) {
        if on {
            self.recording.start();
        } else {
            self.recording.stop();
        }
        self.indicators.recording.set_enabled(on, now);
    }

    pub fn is_alerting(&self) -> bool {
        self.alerting
    }

    pub fn set_alerting(&mut self, on: bool, now: Instant) {
        self.alerting = on;
        self.indicators.alert.set_enabled(on, now);
    }
}

/// Device state together with its sample source and cadence.
pub struct Device<S, P> {
    pub state: DeviceState<P>,
    sampler: S,
    broadcaster: Broadcaster,
    last_sample: Option<(f32, DateTime<Utc>)>,
}

impl<S: Sampler, P: OutputPin> Device<S, P> {
    pub fn new(config: &MyConfig, sampler: S, indicators: Indicators<P>, now: Instant) -> Self {
        Self {
            state: DeviceState::new(indicators, config.record_limit as usize),
            sampler,
            broadcaster: Broadcaster::new(Duration::from_millis(config.sample_delay_ms), now),
            last_sample: None,
        }
    }

    pub fn handle_event(&mut self, event: ChannelEvent, now: Instant) {
        match event {
            ChannelEvent::Connected { id, outbound } => {
                self.state.connect(id, outbound);
            }
            ChannelEvent::Message { id, text } => {
                if !self.state.session.is_authorized(id) {
                    warn!("{}, dropping {text:?}", DeviceError::AuthorizationFailure(id));
                    return;
                }
                if let Some(reply) = interpret(&mut self.state, id, &text, now) {
                    if let Err(e) = self.state.session.send_to(id, reply.to_json()) {
                        debug!("{e}, reply dropped");
                    }
                }
            }
            ChannelEvent::Disconnected { id } => self.state.disconnect(id),
        }
    }

    /// One pass of the timed work. Returns the reading if a sample was taken.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let sampled = self.broadcaster.tick(now, &mut self.sampler, &mut self.state);
        if let Some(value) = sampled {
            self.last_sample = Some((value, Utc::now()));
        }
        self.state.indicators.tick(now);
        sampled
    }

    pub fn status(&self) -> DeviceStatus {
        let (temperature, timestamp, last_update) = match &self.last_sample {
            Some((value, at)) => (Some(*value), at.timestamp(), at.to_rfc3339()),
            None => (None, 0, "-".to_string()),
        };
        DeviceStatus {
            device: String::new(),
            timestamp,
            last_update,
            uptime: 0,
            temperature,
            connected: self.state.session.is_connected(),
            recording: self.state.recording.is_recording(),
            alerting: self.state.is_alerting(),
            samples: self.state.recording.len(),
        }
    }
}

/// The single cooperative loop: drain channel events, then run the timed work.
pub async fn run_control_loop<S, P>(
    state: Arc<MyState>,
    mut device: Device<S, P>,
    mut events: mpsc::Receiver<ChannelEvent>,
) -> anyhow::Result<()>
where
    S: Sampler,
    P: OutputPin,
{
    info!(
        "Control loop running, sampling every {} ms",
        device.broadcaster.delay().as_millis()
    );

    // set until a snapshot lands, so a busy reader only delays publication
    let mut stale = true;
    loop {
        let changed = tokio::select! {
            ev = events.recv() => match ev {
                Some(ev) => {
                    device.handle_event(ev, Instant::now());
                    true
                }
                None => bail!("Channel event queue closed"),
            },
            _ = sleep(LOOP_TICK) => false,
        };

        let sampled = device.tick(Instant::now()).is_some();

        stale |= changed || sampled;
        if stale {
            // never wait on a reader here, retry on the next pass instead
            if let Ok(mut status) = state.status.try_write() {
                *status = device.status();
                stale = false;
            }
        }
    }
}


// EOF
