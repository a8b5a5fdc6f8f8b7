//! The framework's global stack lock.
//!
//! All attribute mutations must happen with this lock held, so the sampling
//! loop cannot interleave with framework-driven updates (commissioning,
//! fabric changes) mid-cycle. Acquisition is infallible; release happens
//! when the guard drops, on every exit path.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU32, Ordering};

/// Global advisory lock guarding the attribute store.
pub struct StackLock {
    inner: Mutex<()>,
    acquisitions: AtomicU32,
}

/// Scoped critical section on the stack lock.
pub struct StackLockGuard<'a> {
    _inner: MutexGuard<'a, ()>,
}

impl StackLock {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(()),
            acquisitions: AtomicU32::new(0),
        }
    }

    /// Acquire the lock, blocking until it is available.
    pub fn lock(&self) -> StackLockGuard<'_> {
        let guard = self.inner.lock();
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        StackLockGuard { _inner: guard }
    }

    /// Number of times the lock has been acquired.
    pub fn acquisitions(&self) -> u32 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Whether the lock is currently held.
    pub fn is_locked(&self) -> bool {
        self.inner.try_lock().is_none()
    }
}

impl Default for StackLock {
    fn default() -> Self {
        Self::new()
    }
}
