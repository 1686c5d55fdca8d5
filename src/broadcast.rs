// broadcast.rs

use embedded_hal::digital::OutputPin;
use log::*;
use tokio::time::{Duration, Instant};

use crate::{DeviceError, DeviceState, Frame, Sampler};

/// Fixed-delay sampling cadence: the next tick is due `delay` after the
/// previous one ran, not on a wall-clock grid.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    delay: Duration,
    last: Instant,
}

impl Broadcaster {
    /// First tick becomes due one `delay` after `now`.
    pub fn new(delay: Duration, now: Instant) -> Self {
        Self { delay, last: now }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.delay
    }

    /// Sample, pulse the read indicator, record, and push to the active client.
    ///
    /// Returns the reading taken on this tick, if any. Delivery is best effort:
    /// a sample that cannot be queued is dropped and never retried.
    pub fn tick<S, P>(&mut self, now: Instant, sampler: &mut S, state: &mut DeviceState<P>) -> Option<f32>
    where
        S: Sampler,
        P: OutputPin,
    {
        if !self.is_due(now) {
            return None;
        }
        self.last = now;

        let value = match sampler.read().and_then(usable) {
            Ok(v) => v,
            Err(e) => {
                warn!("{e}");
                return None;
            }
        };

        state.indicators.read.fire(now);
        state.recording.push(value);
        match state.session.send_active(Frame::Temperature(value).to_json()) {
            Ok(true) => debug!("Sent temperature {value}"),
            Ok(false) => {}
            Err(e) => debug!("{e}, sample {value} dropped"),
        }
        Some(value)
    }
}

// NaN and infinities have no JSON form
fn usable(value: f32) -> Result<f32, DeviceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DeviceError::SensorFault(format!("unusable reading {value}")))
    }
}


// EOF
