//! I2C bus transaction adapter.
//!
//! Owns the bus device node and provides address-based read/write primitives
//! for the sensor protocol layer. Every transfer is a self-contained
//! transaction: a device session is opened for the target address, the
//! transfer runs, and the session is closed again whether or not the
//! transfer succeeded. This keeps no per-device state on a bus that may be
//! shared with other peripherals.

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use log::{error, info, warn};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::{NodeError, Result};

/// Bus clock used for device sessions (standard mode).
///
/// On Linux the actual clock, pin mapping, glitch filter and pull-ups are
/// fixed by the platform device tree; this constant documents what the
/// hardware is provisioned for.
pub const BUS_CLOCK_HZ: u32 = 100_000;

/// Scheduler time-slice granularity for [`sleep_usec`].
const TIME_SLICE: Duration = Duration::from_millis(10);

/// Record of the initialized bus. At most one live handle exists per
/// [`I2cBus`]; operations without a handle fail with
/// [`NodeError::NotInitialized`].
struct BusHandle {
    path: PathBuf,
}

/// Ephemeral binding of one 7-bit device address to the bus for a single
/// transaction. Dropping the session closes the underlying device node on
/// every exit path.
struct DeviceSession {
    dev: LinuxI2CDevice,
    address: u8,
}

impl DeviceSession {
    fn open(path: &Path, address: u8) -> Result<Self> {
        let dev = LinuxI2CDevice::new(path, u16::from(address))
            .map_err(|source| NodeError::Transfer { address, source })?;
        Ok(Self { dev, address })
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        self.dev.read(buf).map_err(|source| NodeError::Transfer {
            address: self.address,
            source,
        })
    }

    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        self.dev.write(data).map_err(|source| NodeError::Transfer {
            address: self.address,
            source,
        })
    }
}

/// Shared I2C bus.
///
/// The handle lives behind a mutex that is held for the whole duration of a
/// transaction, so concurrent callers are serialized by the adapter itself
/// and device sessions never overlap. Methods take `&self`; the bus is meant
/// to be shared via `Arc` and injected into the layers that need it.
pub struct I2cBus {
    path: PathBuf,
    handle: Mutex<Option<BusHandle>>,
}

impl I2cBus {
    /// Create an adapter for the bus at `path`. The bus is not usable until
    /// [`init`](Self::init) has succeeded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: Mutex::new(None),
        }
    }

    /// Acquire the bus handle.
    ///
    /// Idempotent: calling it on an already-initialized bus logs a warning
    /// and succeeds without touching the existing handle.
    pub fn init(&self) -> Result<()> {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            warn!("I2C already initialized");
            return Ok(());
        }

        if !self.path.exists() {
            error!("I2C bus device {:?} not present", self.path);
            return Err(NodeError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such I2C bus: {}", self.path.display()),
            )));
        }

        *handle = Some(BusHandle {
            path: self.path.clone(),
        });
        info!("I2C master bus initialized on {:?}", self.path);
        Ok(())
    }

    /// Release the bus handle if present; no-op otherwise.
    pub fn free(&self) {
        let mut handle = self.handle.lock();
        if handle.take().is_some() {
            info!("I2C master bus released");
        }
    }

    /// Whether a live bus handle exists.
    pub fn is_initialized(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Execute one read transaction, receiving exactly `count` bytes from
    /// the device at `address`.
    ///
    /// The transfer is bounded by the kernel i2c-dev transaction timeout; a
    /// transfer that does not complete or is not acknowledged fails with
    /// [`NodeError::Transfer`].
    pub fn read(&self, address: u8, count: usize) -> Result<Vec<u8>> {
        let guard = self.handle.lock();
        let handle = guard.as_ref().ok_or(NodeError::NotInitialized)?;

        let mut session = DeviceSession::open(&handle.path, address)?;
        let mut buf = vec![0u8; count];
        if let Err(e) = session.receive(&mut buf) {
            error!("I2C read failed: {}", e);
            return Err(e);
        }
        Ok(buf)
    }

    /// Execute one write transaction, sending `data` to the device at
    /// `address`. Symmetric to [`read`](Self::read).
    pub fn write(&self, address: u8, data: &[u8]) -> Result<()> {
        let guard = self.handle.lock();
        let handle = guard.as_ref().ok_or(NodeError::NotInitialized)?;

        let mut session = DeviceSession::open(&handle.path, address)?;
        if let Err(e) = session.transmit(data) {
            error!("I2C write failed: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Select the current bus by index on multi-bus hardware.
    ///
    /// This deployment is single-bus; the call always fails and performs no
    /// action.
    pub fn select_bus(&self, _bus_idx: u8) -> Result<()> {
        Err(NodeError::NotImplemented)
    }
}

/// Block the calling thread for at least `useconds` microseconds.
///
/// The request is rounded up to the scheduler time-slice granularity, with a
/// minimum of one slice: even `sleep_usec(0)` blocks for a full slice, and
/// the sleep never returns early.
pub fn sleep_usec(useconds: u32) {
    let slice_us = TIME_SLICE.as_micros() as u32;
    let slices = useconds.div_ceil(slice_us).max(1);
    thread::sleep(TIME_SLICE * slices);
}
