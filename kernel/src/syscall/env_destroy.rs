//! `env_destroy(id)` — destroy the target environment (self or child).

use crate::error::KernResult;
use macros::syscall;

#[syscall]
pub fn env_destroy(id: u32) -> KernResult<u32> {
	let index = kernel.envs.envid2env(id, caller, true)?;
	let victim_id = kernel.envs.get(index).env_id;
	let was_current = kernel.envs.current_id() == Some(victim_id);
	kernel.envs.env_destroy(&mut kernel.frames, index, caller);
	if was_current {
		// The victim was the environment making this call: the scheduler
		// must pick its replacement before control returns to user mode.
		let next = kernel
			.scheduler
			.pick_next(&kernel.envs)
			.unwrap_or_else(|e| panic!("{e}"));
		kernel.envs.set_current(next);
	}
	Ok(0)
}
