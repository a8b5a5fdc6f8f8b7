//! Matter CO2 sensor node library.
//!
//! Core functionality for an air-quality sensor node: the I2C bus
//! transaction adapter, the SCD4x sensor protocol, and the sampling loop
//! that publishes CO2 concentration and a derived air-quality category into
//! the node's attribute store.

pub mod bus;
pub mod config;
pub mod error;
pub mod matter;
pub mod sampling;
pub mod sensor;
