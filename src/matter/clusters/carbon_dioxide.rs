//! CarbonDioxideConcentrationMeasurement cluster constants.
//!
//! Cluster 0x040D carries the raw CO2 concentration as a nullable float.
//! Values are in parts per million, measured in air.

use strum::FromRepr;

/// Matter Cluster ID for CarbonDioxideConcentrationMeasurement
pub const CLUSTER_ID: u32 = 0x040d;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 3;

/// Attribute IDs for the CarbonDioxideConcentrationMeasurement cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum CarbonDioxideAttribute {
    /// Measured concentration, nullable
    MeasuredValue = 0x0000,
    /// Minimum measurable concentration
    MinMeasuredValue = 0x0001,
    /// Maximum measurable concentration
    MaxMeasuredValue = 0x0002,
    /// Unit of the measured value
    MeasurementUnit = 0x0008,
    /// Medium the measurement is taken in
    MeasurementMedium = 0x0009,
}

/// Measurement unit: parts per million
pub const MEASUREMENT_UNIT_PPM: u8 = 0;

/// Measurement medium: air
pub const MEASUREMENT_MEDIUM_AIR: u8 = 0x00;

/// Measurable range of the sensor, in ppm
pub const MIN_MEASURED_VALUE: f32 = 0.0;
pub const MAX_MEASURED_VALUE: f32 = 10_000.0;

/// Typical ambient concentration; seeds the measured value before the first
/// cycle publishes a real reading.
pub const AMBIENT_CO2_PPM: f32 = 400.0;
