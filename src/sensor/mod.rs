//! Sensor protocol layer.
//!
//! Decodes raw bus transfers into [`Reading`]s. The sampling loop consumes
//! sensors through the [`MeasurementSource`] trait so it can be exercised
//! against a scripted source in tests.

pub mod scd4x;

pub use scd4x::Scd4x;

use crate::error::Result;

/// One sampled tuple of raw sensor values, produced once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// CO2 concentration in parts per million
    pub co2_ppm: u16,
    /// Temperature in milli-degrees Celsius
    pub temperature_raw: i32,
    /// Relative humidity in milli-percent
    pub humidity_raw: i32,
}

impl Reading {
    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature_raw as f32 / 1000.0
    }

    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> f32 {
        self.humidity_raw as f32 / 1000.0
    }
}

/// Source of measurements for the sampling loop.
pub trait MeasurementSource: Send {
    /// Obtain one reading, or fail for this cycle.
    fn read_measurement(&mut self) -> Result<Reading>;
}
