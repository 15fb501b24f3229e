use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, ErrorKind, Result};

/// A mutual-exclusion handle that several writers can share.
///
/// Cloning the handle does not create a new lock: all clones serialize
/// against the same critical section. Hand one `SharedLock` to every writer
/// that targets the same physical destination and their lines will not tear.
#[derive(Clone, Debug, Default)]
pub struct SharedLock {
    inner: Arc<Mutex<()>>,
}

pub struct LockGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl SharedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock is held.
    ///
    /// Fails only if a previous holder panicked while inside the critical
    /// section; the protected destination may then be in an arbitrary state.
    pub fn acquire(&self) -> Result<LockGuard<'_>> {
        match self.inner.lock() {
            Ok(guard) => Ok(LockGuard { _guard: guard }),
            Err(_) => Err(Error::new(ErrorKind::Lock, "shared lock is poisoned")),
        }
    }

    pub fn ptr_eq(&self, other: &SharedLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
