//! Synchronization primitives used to hold the kernel's singleton state.
//!
//! At most one kernel execution context is ever active at a time, so
//! this wrapper exists for `'static` reachability from the `log` facade
//! rather than to arbitrate real contention.

use std::sync::{Mutex, MutexGuard};

/// A mutex guarding the log ring buffer, the one piece of kernel state that
/// is reachable from a `'static` location rather than threaded through as
/// an explicit argument.
///
/// Lock poisoning is not a concern in this single-threaded model; a poisoned
/// lock here means a prior kernel operation panicked, which is already a
/// fatal condition, so the guard is recovered unconditionally.
pub struct KMutex<T>(Mutex<T>);

impl<T> KMutex<T> {
	pub const fn new(val: T) -> Self {
		Self(Mutex::new(val))
	}

	pub fn lock(&self) -> MutexGuard<'_, T> {
		self.0.lock().unwrap_or_else(|e| e.into_inner())
	}
}
