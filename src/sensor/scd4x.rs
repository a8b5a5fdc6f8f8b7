//! Sensirion SCD4x CO2/temperature/humidity sensor.
//!
//! Command protocol per the Sensirion SCD4x interface description: each
//! command is a big-endian 16-bit code; responses are sequences of 16-bit
//! words, each followed by a CRC-8 over the two data bytes.

use log::debug;
use std::sync::Arc;

use super::{MeasurementSource, Reading};
use crate::bus::{self, I2cBus};
use crate::error::{NodeError, Result};

/// Default 7-bit I2C address of the SCD4x family.
pub const DEFAULT_ADDRESS: u8 = 0x62;

const CMD_START_PERIODIC_MEASUREMENT: [u8; 2] = [0x21, 0xb1];
const CMD_READ_MEASUREMENT: [u8; 2] = [0xec, 0x05];
const CMD_STOP_PERIODIC_MEASUREMENT: [u8; 2] = [0x3f, 0x86];
const CMD_GET_DATA_READY_STATUS: [u8; 2] = [0xe4, 0xb8];
const CMD_WAKE_UP: [u8; 2] = [0x36, 0xf6];
const CMD_REINIT: [u8; 2] = [0x36, 0x46];
const CMD_GET_SERIAL_NUMBER: [u8; 2] = [0x36, 0x82];

/// Delay between issuing a command and fetching its response.
const CMD_DELAY_USEC: u32 = 1_000;
/// Stop has to wait for the measurement in flight to finish.
const STOP_DELAY_USEC: u32 = 500_000;
const REINIT_DELAY_USEC: u32 = 20_000;
const WAKE_UP_DELAY_USEC: u32 = 30_000;

/// Data-ready status word: low 11 bits non-zero means a reading is pending.
const DATA_READY_MASK: u16 = 0x07ff;

/// SCD4x device bound to a shared bus.
pub struct Scd4x {
    bus: Arc<I2cBus>,
    address: u8,
}

impl Scd4x {
    /// Bind a sensor at `address` to the given bus.
    pub fn new(bus: Arc<I2cBus>, address: u8) -> Self {
        Self { bus, address }
    }

    fn command(&self, cmd: [u8; 2], delay_usec: u32) -> Result<()> {
        self.bus.write(self.address, &cmd)?;
        bus::sleep_usec(delay_usec);
        Ok(())
    }

    /// Issue `cmd` and read back `count` CRC-protected words.
    fn read_words(&self, cmd: [u8; 2], count: usize) -> Result<Vec<u16>> {
        self.bus.write(self.address, &cmd)?;
        bus::sleep_usec(CMD_DELAY_USEC);
        let raw = self.bus.read(self.address, count * 3)?;
        decode_words(&raw)
    }

    /// Wake the sensor from sleep.
    pub fn wake_up(&self) {
        // The sensor does not acknowledge the wake-up command while asleep
        let _ = self.bus.write(self.address, &CMD_WAKE_UP);
        bus::sleep_usec(WAKE_UP_DELAY_USEC);
    }

    /// Stop periodic measurement mode.
    pub fn stop_periodic_measurement(&self) -> Result<()> {
        self.command(CMD_STOP_PERIODIC_MEASUREMENT, STOP_DELAY_USEC)
    }

    /// Reinitialize the sensor from its persisted settings.
    pub fn reinit(&self) -> Result<()> {
        self.command(CMD_REINIT, REINIT_DELAY_USEC)
    }

    /// Start periodic measurement mode (one new reading every 5 seconds).
    pub fn start_periodic_measurement(&self) -> Result<()> {
        self.command(CMD_START_PERIODIC_MEASUREMENT, CMD_DELAY_USEC)
    }

    /// Whether a fresh reading is available.
    pub fn data_ready(&self) -> Result<bool> {
        let words = self.read_words(CMD_GET_DATA_READY_STATUS, 1)?;
        Ok(words[0] & DATA_READY_MASK != 0)
    }

    /// 48-bit factory serial number.
    pub fn serial_number(&self) -> Result<u64> {
        let words = self.read_words(CMD_GET_SERIAL_NUMBER, 3)?;
        Ok(((words[0] as u64) << 32) | ((words[1] as u64) << 16) | words[2] as u64)
    }
}

impl MeasurementSource for Scd4x {
    fn read_measurement(&mut self) -> Result<Reading> {
        self.bus.write(self.address, &CMD_READ_MEASUREMENT)?;
        bus::sleep_usec(CMD_DELAY_USEC);
        let raw = self.bus.read(self.address, 9)?;
        let reading = decode_measurement(&raw)?;
        debug!(
            "SCD4x reading: {} ppm, {} m°C, {} m%RH",
            reading.co2_ppm, reading.temperature_raw, reading.humidity_raw
        );
        Ok(reading)
    }
}

/// CRC-8 over `data` (polynomial 0x31, init 0xFF), as used by all Sensirion
/// I2C sensors.
pub(crate) fn crc8(data: &[u8]) -> u8 {
    let mut rem: u8 = 0xff;
    for byte in data {
        rem ^= byte;
        for _ in 0..8 {
            rem = if rem & 0x80 != 0 {
                (rem << 1) ^ 0x31
            } else {
                rem << 1
            };
        }
    }
    rem
}

/// Split a response buffer into 16-bit words, verifying the CRC that trails
/// each word.
fn decode_words(raw: &[u8]) -> Result<Vec<u16>> {
    if raw.is_empty() || raw.len() % 3 != 0 {
        return Err(NodeError::ReadingUnavailable(format!(
            "unexpected response length {}",
            raw.len()
        )));
    }

    let mut words = Vec::with_capacity(raw.len() / 3);
    for chunk in raw.chunks_exact(3) {
        if crc8(&chunk[..2]) != chunk[2] {
            return Err(NodeError::ReadingUnavailable(format!(
                "checksum mismatch for word {:02x}{:02x}",
                chunk[0], chunk[1]
            )));
        }
        words.push(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    Ok(words)
}

/// Decode one 9-byte measurement frame into a [`Reading`].
///
/// Conversions are the driver's fixed-point forms of
/// `-45 + 175 * raw / 2^16` °C and `100 * raw / 2^16` %RH, scaled to
/// milli-units.
fn decode_measurement(raw: &[u8]) -> Result<Reading> {
    let words = decode_words(raw)?;
    if words.len() != 3 {
        return Err(NodeError::ReadingUnavailable(format!(
            "expected 3 measurement words, got {}",
            words.len()
        )));
    }

    Ok(Reading {
        co2_ppm: words[0],
        temperature_raw: ((21875 * words[1] as i32) >> 13) - 45000,
        humidity_raw: (12500 * words[2] as i32) >> 13,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a response frame from words, appending the CRC each word
    /// carries on the wire.
    fn frame(words: &[u16]) -> Vec<u8> {
        let mut out = Vec::with_capacity(words.len() * 3);
        for word in words {
            let bytes = word.to_be_bytes();
            out.extend_from_slice(&bytes);
            out.push(crc8(&bytes));
        }
        out
    }

    #[test]
    fn test_crc8_reference_vector() {
        // Vector from the Sensirion interface description
        assert_eq!(crc8(&[0xbe, 0xef]), 0x92);
    }

    #[test]
    fn test_decode_measurement_datasheet_example() {
        // 0x01F4 / 0x6667 / 0x5EB9: 500 ppm, 25 °C, 37 %RH
        let raw = frame(&[0x01f4, 0x6667, 0x5eb9]);
        let reading = decode_measurement(&raw).unwrap();
        assert_eq!(reading.co2_ppm, 500);
        assert_eq!(reading.temperature_raw, 24996);
        assert_eq!(reading.humidity_raw, 37000);
        assert!((reading.temperature_celsius() - 25.0).abs() < 0.01);
        assert!((reading.humidity_percent() - 37.0).abs() < 0.01);
    }

    #[test]
    fn test_decode_measurement_rejects_bad_checksum() {
        let mut raw = frame(&[0x01f4, 0x6667, 0x5eb9]);
        raw[2] ^= 0xff;
        assert!(matches!(
            decode_measurement(&raw),
            Err(NodeError::ReadingUnavailable(_))
        ));
    }

    #[test]
    fn test_decode_measurement_rejects_short_frame() {
        let raw = frame(&[0x01f4, 0x6667]);
        assert!(matches!(
            decode_measurement(&raw),
            Err(NodeError::ReadingUnavailable(_))
        ));
    }

    #[test]
    fn test_decode_words_empty_is_error() {
        assert!(decode_words(&[]).is_err());
    }
}
