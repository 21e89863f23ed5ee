//! The kernel's closed error-kind set.
//!
//! Every system call surfaces failures through [`KernError`] instead of the
//! reference kernel's negative-integer convention; the set of kinds is the
//! same closed set either way.

use thiserror::Error;

/// A kernel-level failure. Internal inconsistencies are never represented
/// here — those call `panic!` at the point of discovery.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernError {
	/// A bad argument, permission set, or virtual address.
	#[error("invalid argument")]
	Inval,
	/// The frame table is empty or a page-table allocation failed.
	#[error("out of memory")]
	NoMem,
	/// The environment table is full.
	#[error("no free environment")]
	NoFreeEnv,
	/// An envid is stale, mismatched, or not permitted for this operation.
	#[error("bad environment id")]
	BadEnv,
	/// A page lookup found no mapping.
	#[error("address not mapped")]
	NotMapped,
	/// The target environment is not currently in `ipc_recv`.
	#[error("target not receiving")]
	IpcNotRecv,
}

/// Result type used throughout the kernel core.
pub type KernResult<T> = Result<T, KernError>;
