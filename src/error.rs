use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum NodeError {
    #[error("I2C bus not initialized")]
    NotInitialized,

    #[error("I2C transfer failed for device 0x{address:02x}: {source}")]
    Transfer {
        address: u8,
        #[source]
        source: i2cdev::linux::LinuxI2CError,
    },

    #[error("not implemented on this hardware profile")]
    NotImplemented,

    #[error("sensor returned no valid reading: {0}")]
    ReadingUnavailable(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NodeError>;
