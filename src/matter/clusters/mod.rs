//! Cluster constants for the clusters this node serves.
//!
//! IDs and value shapes follow the Matter application cluster specification;
//! the external stack owns cluster behavior, we own what gets published.

pub mod air_quality;
pub mod carbon_dioxide;

pub use air_quality::{AirQuality, classify_co2};
