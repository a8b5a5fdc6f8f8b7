//! AirQuality cluster constants and classification policy.
//!
//! The AirQuality cluster (0x005B) exposes a coarse air-quality category.
//! This node derives the category from the CO2 concentration.

use strum::FromRepr;

/// Matter Cluster ID for AirQuality
pub const CLUSTER_ID: u32 = 0x005b;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 1;

/// Attribute IDs for the AirQuality cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum AirQualityAttribute {
    /// Current air-quality category
    AirQuality = 0x0000,
}

/// Air-quality category, as reported on the cluster.
///
/// `Unknown` is the default/absent value for "no valid reading yet"; the
/// classification never produces it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum AirQuality {
    Unknown = 0,
    Good = 1,
    Fair = 2,
    Moderate = 3,
    Poor = 4,
}

/// CO2 bands as (inclusive upper bound, category), ascending. Scanned in
/// order, first match wins; anything above the last band is Poor.
const CO2_BANDS: &[(u16, AirQuality)] = &[
    (1000, AirQuality::Good),
    (2500, AirQuality::Fair),
    (5000, AirQuality::Moderate),
];

/// Classify a CO2 concentration into an air-quality category.
pub fn classify_co2(co2_ppm: u16) -> AirQuality {
    CO2_BANDS
        .iter()
        .find(|(upper, _)| co2_ppm <= *upper)
        .map(|(_, category)| *category)
        .unwrap_or(AirQuality::Poor)
}
