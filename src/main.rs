use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use matter_co2_node::bus::I2cBus;
use matter_co2_node::config::{Config, load_dotenv};
use matter_co2_node::error::Result;
use matter_co2_node::matter::clusters::air_quality::{self, AirQuality, AirQualityAttribute};
use matter_co2_node::matter::clusters::carbon_dioxide::{self, CarbonDioxideAttribute};
use matter_co2_node::matter::{AttrValue, AttributeWriter, NodeAttributeStore, StackLock};
use matter_co2_node::sampling::{CYCLE_PERIOD, spawn_sampling_task};
use matter_co2_node::sensor::Scd4x;

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Populate the cluster attributes with their configured ranges and the
/// ambient default, before the first cycle publishes a real reading.
fn seed_attributes(store: &NodeAttributeStore, lock: &StackLock, endpoint_id: u16) -> Result<()> {
    let _guard = lock.lock();

    store.update(
        endpoint_id,
        air_quality::CLUSTER_ID,
        AirQualityAttribute::AirQuality as u32,
        AttrValue::Enum8(AirQuality::Unknown as u8),
    )?;

    let co2 = carbon_dioxide::CLUSTER_ID;
    store.update(
        endpoint_id,
        co2,
        CarbonDioxideAttribute::MinMeasuredValue as u32,
        AttrValue::NullableFloat(Some(carbon_dioxide::MIN_MEASURED_VALUE)),
    )?;
    store.update(
        endpoint_id,
        co2,
        CarbonDioxideAttribute::MaxMeasuredValue as u32,
        AttrValue::NullableFloat(Some(carbon_dioxide::MAX_MEASURED_VALUE)),
    )?;
    store.update(
        endpoint_id,
        co2,
        CarbonDioxideAttribute::MeasurementUnit as u32,
        AttrValue::Enum8(carbon_dioxide::MEASUREMENT_UNIT_PPM),
    )?;
    store.update(
        endpoint_id,
        co2,
        CarbonDioxideAttribute::MeasurementMedium as u32,
        AttrValue::Enum8(carbon_dioxide::MEASUREMENT_MEDIUM_AIR),
    )?;
    store.update(
        endpoint_id,
        co2,
        CarbonDioxideAttribute::MeasuredValue as u32,
        AttrValue::NullableFloat(Some(carbon_dioxide::AMBIENT_CO2_PPM)),
    )?;

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logger();
    load_dotenv();
    info!("Starting Matter CO2 sensor node");

    let config = Config::load();
    info!("Configuration loaded:");
    info!("  Device Name: {}", config.matter.device_name);
    info!("  Vendor ID: 0x{:04X}", config.matter.vendor_id);
    info!("  Product ID: 0x{:04X}", config.matter.product_id);
    info!("  Endpoint: {}", config.matter.endpoint_id);
    info!("  I2C Bus: {}", config.i2c.bus_path);
    info!("  Sensor Address: 0x{:02x}", config.i2c.sensor_address);

    // Bring up the bus. Failure is not fatal: cycles will keep failing and
    // logging until the bus appears, and recover on their own once it does.
    let bus = Arc::new(I2cBus::new(&config.i2c.bus_path));
    if let Err(e) = bus.init() {
        error!("Failed to initialize I2C bus: {}", e);
    }

    // Sensor bring-up: wake it, abort any measurement left over from a
    // previous run, reinitialize, then start periodic measurement mode.
    let sensor = Scd4x::new(bus.clone(), config.i2c.sensor_address);
    sensor.wake_up();
    if let Err(e) = sensor.stop_periodic_measurement() {
        warn!("Could not stop previous measurement: {}", e);
    }
    if let Err(e) = sensor.reinit() {
        warn!("Sensor reinit failed: {}", e);
    }
    match sensor.serial_number() {
        Ok(serial) => info!("SCD4x serial number: {:012x}", serial),
        Err(e) => warn!("Could not read sensor serial number: {}", e),
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    if let Err(e) = sensor.start_periodic_measurement() {
        error!("Failed to start periodic measurement: {}", e);
    }

    let store = Arc::new(NodeAttributeStore::new());
    let lock = Arc::new(StackLock::new());

    if let Err(e) = seed_attributes(&store, &lock, config.matter.endpoint_id) {
        error!("Failed to seed attribute store: {}", e);
    }

    let _sampling_handle = spawn_sampling_task(
        sensor,
        store.clone(),
        lock.clone(),
        config.matter.endpoint_id,
    );

    info!("Matter CO2 sensor node is running");
    info!("  - Sampling every {} seconds", CYCLE_PERIOD.as_secs());
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    // Best-effort shutdown: stop the sensor's measurement mode and release
    // the bus. The sampling thread dies with the process.
    let sensor = Scd4x::new(bus.clone(), config.i2c.sensor_address);
    if let Err(e) = sensor.stop_periodic_measurement() {
        warn!("Could not stop periodic measurement: {}", e);
    }
    bus.free();

    info!("Shutdown complete");
}
