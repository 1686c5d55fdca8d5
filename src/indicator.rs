// indicator.rs

use embedded_hal::digital::OutputPin;
use log::*;
use tokio::time::{Duration, Instant};

pub const ALERT_BLINK_PERIOD: Duration = Duration::from_millis(500);
pub const RECORD_BLINK_PERIOD: Duration = Duration::from_millis(1000);
pub const READ_PULSE_DWELL: Duration = Duration::from_millis(200);

/// One on/off output. The logical state is authoritative; pin errors are only logged.
pub struct Indicator<P> {
    name: &'static str,
    pin: P,
    on: bool,
}

impl<P: OutputPin> Indicator<P> {
    pub fn new(name: &'static str, pin: P) -> Self {
        let mut ind = Self {
            name,
            pin,
            on: false,
        };
        ind.drive();
        ind
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn set(&mut self, on: bool) {
        if self.on != on {
            debug!("Indicator {} {}", self.name, if on { "on" } else { "off" });
        }
        self.on = on;
        self.drive();
    }

    pub fn toggle(&mut self) {
        self.set(!self.on);
    }

    fn drive(&mut self) {
        let res = if self.on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = res {
            warn!("Indicator {} pin write failed: {e:?}", self.name);
        }
    }
}

/// Toggles its indicator every `period` while enabled.
pub struct Blinker<P> {
    led: Indicator<P>,
    period: Duration,
    // None while idle
    last_toggle: Option<Instant>,
}

impl<P: OutputPin> Blinker<P> {
    pub fn new(led: Indicator<P>, period: Duration) -> Self {
        Self {
            led,
            period,
            last_toggle: None,
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.last_toggle.is_some()
    }

    pub fn is_on(&self) -> bool {
        self.led.is_on()
    }

    /// Idle -> Blinking. The output goes on right away; a blinker that is
    /// already running keeps its phase.
    pub fn enable(&mut self, now: Instant) {
        if self.last_toggle.is_none() {
            self.led.set(true);
            self.last_toggle = Some(now);
        }
    }

    /// Blinking -> Idle, output forced off whatever the phase.
    pub fn disable(&mut self) {
        self.last_toggle = None;
        self.led.set(false);
    }

    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if enabled {
            self.enable(now);
        } else {
            self.disable();
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last_toggle {
            if now.saturating_duration_since(last) >= self.period {
                self.led.toggle();
                self.last_toggle = Some(now);
            }
        }
    }
}

/// One-shot: on when fired, off again once `dwell` has passed.
pub struct Pulse<P> {
    led: Indicator<P>,
    dwell: Duration,
    fired_at: Option<Instant>,
}

impl<P: OutputPin> Pulse<P> {
    pub fn new(led: Indicator<P>, dwell: Duration) -> Self {
        Self {
            led,
            dwell,
            fired_at: None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.led.is_on()
    }

    pub fn fire(&mut self, now: Instant) {
        self.led.set(true);
        self.fired_at = Some(now);
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(at) = self.fired_at {
            if now.saturating_duration_since(at) >= self.dwell {
                self.led.set(false);
                self.fired_at = None;
            }
        }
    }
}

/// The four status outputs of the device.
pub struct Indicators<P> {
    pub connection: Indicator<P>,
    pub read: Pulse<P>,
    pub recording: Blinker<P>,
    pub alert: Blinker<P>,
}

impl<P: OutputPin> Indicators<P> {
    pub fn new(connection: P, read: P, recording: P, alert: P) -> Self {
        Self {
            connection: Indicator::new("connection", connection),
            read: Pulse::new(Indicator::new("read", read), READ_PULSE_DWELL),
            recording: Blinker::new(Indicator::new("recording", recording), RECORD_BLINK_PERIOD),
            alert: Blinker::new(Indicator::new("alert", alert), ALERT_BLINK_PERIOD),
        }
    }

    /// Advance every timed indicator. Call once per loop iteration.
    pub fn tick(&mut self, now: Instant) {
        self.read.tick(now);
        self.recording.tick(now);
        self.alert.tick(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimPin;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn alert_toggles_every_500ms() {
        let pin = SimPin::new("alert");
        let level = pin.level();
        let mut alert = Blinker::new(Indicator::new("alert", pin), ALERT_BLINK_PERIOD);
        let t0 = Instant::now();

        alert.enable(t0);
        assert!(level.is_high());

        alert.tick(t0 + ms(499));
        assert!(level.is_high());
        alert.tick(t0 + ms(500));
        assert!(!level.is_high());
        alert.tick(t0 + ms(990));
        assert!(!level.is_high());
        alert.tick(t0 + ms(1000));
        assert!(level.is_high());
    }

    #[test]
    fn disabling_mid_cycle_forces_off() {
        let mut alert = Blinker::new(Indicator::new("alert", SimPin::new("alert")), ALERT_BLINK_PERIOD);
        let t0 = Instant::now();
        alert.enable(t0);
        alert.tick(t0 + ms(250));
        assert!(alert.is_on());

        alert.disable();
        assert!(!alert.is_on());
        assert!(!alert.is_blinking());

        // idle blinker ignores time passing
        alert.tick(t0 + ms(5000));
        assert!(!alert.is_on());
    }

    #[test]
    fn re_enable_keeps_phase() {
        let mut rec = Blinker::new(Indicator::new("recording", SimPin::new("rec")), RECORD_BLINK_PERIOD);
        let t0 = Instant::now();
        rec.enable(t0);
        rec.enable(t0 + ms(900));
        rec.tick(t0 + ms(1000));
        assert!(!rec.is_on());
    }

    #[test]
    fn read_pulse_clears_after_dwell() {
        let mut read = Pulse::new(Indicator::new("read", SimPin::new("read")), READ_PULSE_DWELL);
        let t0 = Instant::now();
        read.fire(t0);
        read.tick(t0 + ms(199));
        assert!(read.is_on());
        read.tick(t0 + ms(200));
        assert!(!read.is_on());
    }

    #[test]
    fn indicators_start_off() {
        let ind = Indicators::new(
            SimPin::new("c"),
            SimPin::new("r"),
            SimPin::new("rec"),
            SimPin::new("a"),
        );
        assert!(!ind.connection.is_on());
        assert!(!ind.read.is_on());
        assert!(!ind.recording.is_on());
        assert!(!ind.alert.is_on());
    }
}

// EOF
