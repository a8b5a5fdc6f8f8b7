//! Periodic sensor-sampling and attribute-publishing loop.
//!
//! Runs for the lifetime of the process on a fixed cadence: take the stack
//! lock, obtain one reading, classify it, publish the air-quality category
//! and the raw CO2 concentration, release the lock, sleep. A failed read
//! skips the cycle's publishes; the next scheduled cycle is the retry.

use log::{error, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::matter::clusters::air_quality::{self, AirQualityAttribute};
use crate::matter::clusters::carbon_dioxide::{self, CarbonDioxideAttribute};
use crate::matter::{AttrValue, AttributeWriter, StackLock};
use crate::sensor::MeasurementSource;

/// Grace period before the first cycle, so the surrounding framework can
/// finish initializing. A fixed constant, not a readiness signal.
pub const WARMUP_DELAY: Duration = Duration::from_secs(5);

/// Cycle period, slept after each cycle's work. Cycle start times drift
/// under load; that is accepted.
pub const CYCLE_PERIOD: Duration = Duration::from_secs(5);

/// Spawn the sampling loop on a dedicated thread.
///
/// The loop has no terminal state: no bus, sensor or store failure ends it.
pub fn spawn_sampling_task<S, W>(
    mut source: S,
    store: Arc<W>,
    lock: Arc<StackLock>,
    endpoint_id: u16,
) -> thread::JoinHandle<()>
where
    S: MeasurementSource + 'static,
    W: AttributeWriter + 'static,
{
    thread::Builder::new()
        .name("sensor-sampling".into())
        .spawn(move || {
            info!("Waiting for Matter stack to initialize...");
            thread::sleep(WARMUP_DELAY);

            loop {
                run_cycle(&mut source, &*store, &lock, endpoint_id);
                thread::sleep(CYCLE_PERIOD);
            }
        })
        .expect("Failed to spawn sampling thread")
}

/// One sampling cycle: read under the stack lock, classify, publish the
/// category and then the raw concentration.
///
/// The lock guard is held across both publishes and released on every exit
/// path, including a failed read.
fn run_cycle<S, W>(source: &mut S, store: &W, lock: &StackLock, endpoint_id: u16)
where
    S: MeasurementSource,
    W: AttributeWriter,
{
    let _guard = lock.lock();

    let reading = match source.read_measurement() {
        Ok(reading) => reading,
        Err(e) => {
            // Nothing is published this cycle; the previously published
            // values stay in effect downstream.
            warn!("Sensor read failed, skipping cycle: {}", e);
            return;
        }
    };

    info!(
        "Measurements: {} ppm, {:.2} °C, {:.2} %RH",
        reading.co2_ppm,
        reading.temperature_celsius(),
        reading.humidity_percent()
    );

    let category = air_quality::classify_co2(reading.co2_ppm);

    if let Err(e) = store.update(
        endpoint_id,
        air_quality::CLUSTER_ID,
        AirQualityAttribute::AirQuality as u32,
        AttrValue::Enum8(category as u8),
    ) {
        error!("Failed to update air-quality attribute: {}", e);
    }

    if let Err(e) = store.update(
        endpoint_id,
        carbon_dioxide::CLUSTER_ID,
        CarbonDioxideAttribute::MeasuredValue as u32,
        AttrValue::NullableFloat(Some(f32::from(reading.co2_ppm))),
    ) {
        error!("Failed to update CO2 measured value: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NodeError, Result};
    use crate::matter::clusters::AirQuality;
    use crate::sensor::Reading;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    fn reading(co2_ppm: u16) -> Reading {
        Reading {
            co2_ppm,
            temperature_raw: 25000,
            humidity_raw: 40000,
        }
    }

    /// Source that replays a fixed script of results.
    struct ScriptedSource {
        results: VecDeque<Result<Reading>>,
    }

    impl MeasurementSource for ScriptedSource {
        fn read_measurement(&mut self) -> Result<Reading> {
            self.results
                .pop_front()
                .unwrap_or_else(|| Err(NodeError::NotInitialized))
        }
    }

    /// Writer that records every update it receives.
    struct RecordingWriter {
        updates: Mutex<Vec<(u16, u32, u32, AttrValue)>>,
        fail: bool,
    }

    impl RecordingWriter {
        fn new() -> Self {
            Self {
                updates: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                updates: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    impl AttributeWriter for RecordingWriter {
        fn update(
            &self,
            endpoint_id: u16,
            cluster_id: u32,
            attribute_id: u32,
            value: AttrValue,
        ) -> Result<()> {
            self.updates
                .lock()
                .push((endpoint_id, cluster_id, attribute_id, value));
            if self.fail {
                Err(NodeError::NotInitialized)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_successful_cycle_publishes_pair_in_order() {
        let mut source = ScriptedSource {
            results: VecDeque::from([Ok(reading(400))]),
        };
        let store = RecordingWriter::new();
        let lock = StackLock::new();

        run_cycle(&mut source, &store, &lock, 1);

        let updates = store.updates.lock();
        assert_eq!(updates.len(), 2);
        assert_eq!(
            updates[0],
            (
                1,
                air_quality::CLUSTER_ID,
                0x0000,
                AttrValue::Enum8(AirQuality::Good as u8)
            )
        );
        assert_eq!(
            updates[1],
            (
                1,
                carbon_dioxide::CLUSTER_ID,
                0x0000,
                AttrValue::NullableFloat(Some(400.0))
            )
        );
    }

    #[test]
    fn test_high_co2_publishes_poor() {
        let mut source = ScriptedSource {
            results: VecDeque::from([Ok(reading(9999))]),
        };
        let store = RecordingWriter::new();
        let lock = StackLock::new();

        run_cycle(&mut source, &store, &lock, 1);

        let updates = store.updates.lock();
        assert_eq!(updates[0].3, AttrValue::Enum8(AirQuality::Poor as u8));
        assert_eq!(updates[1].3, AttrValue::NullableFloat(Some(9999.0)));
    }

    #[test]
    fn test_failed_read_publishes_nothing_and_releases_lock() {
        let mut source = ScriptedSource {
            results: VecDeque::from([Err(NodeError::ReadingUnavailable(
                "checksum mismatch".into(),
            ))]),
        };
        let store = RecordingWriter::new();
        let lock = StackLock::new();

        run_cycle(&mut source, &store, &lock, 1);

        assert!(store.updates.lock().is_empty());
        assert_eq!(lock.acquisitions(), 1);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_successful_cycle_releases_lock_once() {
        let mut source = ScriptedSource {
            results: VecDeque::from([Ok(reading(1200))]),
        };
        let store = RecordingWriter::new();
        let lock = StackLock::new();

        run_cycle(&mut source, &store, &lock, 1);

        assert_eq!(lock.acquisitions(), 1);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_store_errors_do_not_stop_the_cycle() {
        let mut source = ScriptedSource {
            results: VecDeque::from([Ok(reading(800))]),
        };
        let store = RecordingWriter::failing();
        let lock = StackLock::new();

        run_cycle(&mut source, &store, &lock, 1);

        // Both updates are still attempted; each failure is only logged
        assert_eq!(store.updates.lock().len(), 2);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_cycle_updates_real_store() {
        use crate::matter::NodeAttributeStore;

        let mut source = ScriptedSource {
            results: VecDeque::from([Ok(reading(2600))]),
        };
        let store = NodeAttributeStore::new();
        let lock = StackLock::new();

        run_cycle(&mut source, &store, &lock, 1);

        assert_eq!(
            store.get(1, air_quality::CLUSTER_ID, 0x0000),
            Some(AttrValue::Enum8(AirQuality::Moderate as u8))
        );
        assert_eq!(
            store.get(1, carbon_dioxide::CLUSTER_ID, 0x0000),
            Some(AttrValue::NullableFloat(Some(2600.0)))
        );
        assert_eq!(store.version(), 2);
    }
}
