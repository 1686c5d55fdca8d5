// sampler.rs

use std::collections::VecDeque;

use crate::DeviceError;

/// A temperature source read synchronously from the control loop.
///
/// Implementations must return quickly; anything slow (sensor conversion time)
/// has to be overlapped with the cadence rather than waited for inside `read`.
pub trait Sampler {
    fn read(&mut self) -> Result<f32, DeviceError>;
}

/// Plays back a fixed list of readings, then reports a sensor fault.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    values: VecDeque<f32>,
}

impl ScriptedSampler {
    pub fn new<I: IntoIterator<Item = f32>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl Sampler for ScriptedSampler {
    fn read(&mut self) -> Result<f32, DeviceError> {
        self.values
            .pop_front()
            .ok_or_else(|| DeviceError::SensorFault("no reading available".into()))
    }
}

/// Slow deterministic swing around a base temperature, for running without hardware.
#[derive(Debug, Clone)]
pub struct SimSampler {
    base: f32,
    amplitude: f32,
    step: u32,
}

impl SimSampler {
    pub fn new(base: f32, amplitude: f32) -> Self {
        Self {
            base,
            amplitude,
            step: 0,
        }
    }
}

impl Default for SimSampler {
    fn default() -> Self {
        Self::new(21.0, 1.5)
    }
}

impl Sampler for SimSampler {
    fn read(&mut self) -> Result<f32, DeviceError> {
        // one full swing per two minutes at 1 Hz
        let phase = self.step as f32 * std::f32::consts::TAU / 120.0;
        self.step = self.step.wrapping_add(1);
        let value = self.base + self.amplitude * phase.sin();
        // 1/16 degree resolution, same as a 12-bit DS18B20
        Ok((value * 16.0).round() / 16.0)
    }
}


// EOF
