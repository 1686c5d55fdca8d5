// simpin.rs

use std::convert::Infallible;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use embedded_hal::digital::{ErrorType, OutputPin};
use log::*;

/// Output pin for running without hardware. The level can be watched through
/// a [`PinLevel`] handle.
#[derive(Debug, Clone)]
pub struct SimPin {
    name: &'static str,
    level: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
pub struct PinLevel(Arc<AtomicBool>);

impl PinLevel {
    pub fn is_high(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl SimPin {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            level: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn level(&self) -> PinLevel {
        PinLevel(self.level.clone())
    }

    fn write(&mut self, high: bool) {
        if self.level.swap(high, Ordering::Relaxed) != high {
            trace!("pin {} -> {}", self.name, if high { "HIGH" } else { "LOW" });
        }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

// EOF
