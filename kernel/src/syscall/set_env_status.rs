//! `set_env_status(id, status)` — set an environment's status.

use crate::env::Status;
use crate::error::{KernError, KernResult};
use macros::syscall;

#[syscall]
pub fn set_env_status(id: u32, status: u32) -> KernResult<u32> {
	let status = match status {
		0 => Status::Free,
		1 => Status::Runnable,
		2 => Status::NotRunnable,
		_ => return Err(KernError::Inval),
	};
	let index = kernel.envs.envid2env(id, caller, false)?;
	kernel.envs.get_mut(index).status = status;
	Ok(0)
}
