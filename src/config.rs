use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = &value[1..value.len() - 1];
            }

            // Only set if not already set (env vars take precedence)
            if std::env::var(key).is_err() {
                // SAFETY: We're single-threaded at this point (called before any async runtime)
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

/// Directory under the user's home for node configuration
const CONFIG_DIR: &str = ".config/matter-co2-node";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub i2c: I2cConfig,
    pub matter: MatterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I2cConfig {
    /// Device node of the I2C bus the sensor is wired to
    pub bus_path: String,
    /// 7-bit I2C address of the SCD4x sensor
    pub sensor_address: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatterConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_name: String,
    /// Endpoint the air-quality clusters live on (endpoint 0 is the root)
    pub endpoint_id: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            i2c: I2cConfig {
                bus_path: "/dev/i2c-1".to_string(),
                sensor_address: 0x62,
            },
            matter: MatterConfig {
                vendor_id: 0xFFF1,
                product_id: 0x8002,
                device_name: "CO2 Sensor Node".to_string(),
                endpoint_id: 1,
            },
        }
    }
}

/// Parse a u8 that may be given as decimal ("98") or hex ("0x62").
fn parse_address(s: &str) -> Option<u8> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

impl Config {
    /// Path of the optional JSON config file.
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load configuration: defaults, then the config file if present,
    /// then environment variable overrides.
    pub fn load() -> Self {
        let mut config = Self::default();

        let path = Self::config_path();
        if path.exists() {
            match fs::read_to_string(&path)
                .map_err(crate::error::NodeError::from)
                .and_then(|c| serde_json::from_str(&c).map_err(Into::into))
            {
                Ok(file_config) => config = file_config,
                Err(e) => {
                    log::warn!("Ignoring unreadable config file {:?}: {}", path, e);
                }
            }
        }

        config.apply_env();
        config
    }

    /// Build configuration from defaults plus environment overrides only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("I2C_BUS_PATH") {
            self.i2c.bus_path = path;
        }
        if let Ok(address) = std::env::var("SENSOR_ADDRESS")
            && let Some(a) = parse_address(&address)
        {
            self.i2c.sensor_address = a;
        }
        if let Ok(name) = std::env::var("DEVICE_NAME") {
            self.matter.device_name = name;
        }
        if let Ok(endpoint) = std::env::var("MATTER_ENDPOINT_ID")
            && let Ok(e) = endpoint.parse()
        {
            self.matter.endpoint_id = e;
        }
        if let Ok(vendor) = std::env::var("MATTER_VENDOR_ID")
            && let Some(v) = parse_u16(&vendor)
        {
            self.matter.vendor_id = v;
        }
        if let Ok(product) = std::env::var("MATTER_PRODUCT_ID")
            && let Some(p) = parse_u16(&product)
        {
            self.matter.product_id = p;
        }
    }
}

fn parse_u16(s: &str) -> Option<u16> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}
