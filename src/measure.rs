// measure.rs

use std::fmt::Debug;

use ds18b20::{Ds18b20, Resolution};
use embedded_hal::digital::{InputPin, OutputPin};
use esp_idf_hal::delay::{Ets, FreeRtos};
use log::*;
use one_wire_bus::{Address, OneWire, OneWireError};

use crate::{DeviceError, Sampler};

/// DS18B20 on a 1-Wire bus.
///
/// A conversion is started after every read and collected by the next one,
/// so with a cadence longer than the 750 ms conversion time `read` never
/// waits for the sensor.
pub struct Ds18b20Sampler<P> {
    bus: OneWire<P>,
    sensor: Ds18b20,
    address: Address,
}

impl<P, E> Ds18b20Sampler<P>
where
    P: OutputPin<Error = E> + InputPin<Error = E>,
    E: Debug,
{
    /// Uses the first sensor found on the bus and runs one blocking conversion.
    pub fn new(mut bus: OneWire<P>) -> Result<Self, MeasurementError<E>> {
        let address = match bus.device_search(None, false, &mut Ets)? {
            Some((address, _)) => address,
            None => return Err(MeasurementError::NoDeviceFound),
        };
        info!("Using DS18B20 at {address:?}");

        let sensor = Ds18b20::new::<E>(address)?;
        ds18b20::start_simultaneous_temp_measurement(&mut bus, &mut Ets)?;
        Resolution::Bits12.delay_for_measurement_time(&mut FreeRtos);

        Ok(Self {
            bus,
            sensor,
            address,
        })
    }

    fn collect(&mut self) -> Result<f32, MeasurementError<E>> {
        let data = self.sensor.read_data(&mut self.bus, &mut Ets)?;
        ds18b20::start_simultaneous_temp_measurement(&mut self.bus, &mut Ets)?;
        Ok(data.temperature)
    }
}

impl<P, E> Sampler for Ds18b20Sampler<P>
where
    P: OutputPin<Error = E> + InputPin<Error = E>,
    E: Debug,
{
    fn read(&mut self) -> Result<f32, DeviceError> {
        self.collect().map_err(|e| {
            DeviceError::SensorFault(format!("DS18B20 {:?}: {e:?}", self.address))
        })
    }
}

// Besides bus errors, the bus may simply have nothing on it.
#[derive(Debug)]
pub enum MeasurementError<E> {
    OneWireError(OneWireError<E>),
    NoDeviceFound,
}

impl<E> From<OneWireError<E>> for MeasurementError<E> {
    fn from(value: OneWireError<E>) -> Self {
        MeasurementError::OneWireError(value)
    }
}

// EOF
