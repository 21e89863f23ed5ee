//! `yield()` — save the caller's trap frame, then invoke the scheduler.
//!
//! Conceptually this never returns to the caller: the trap path resumes
//! directly into whichever environment the scheduler selects. There is no
//! separate execution context to jump into here, so the handler instead
//! saves the frame, advances `kernel.envs`' current pointer, and returns —
//! the caller (a test harness, or a `user::fork`/`user::spawn` driver) is
//! responsible for treating a successful `yield` as "control has left this
//! environment" rather than inspecting the return value.

use crate::error::KernResult;
use macros::syscall;

#[syscall]
pub fn sys_yield() -> KernResult<u32> {
	let index = kernel.envs.envid2env(caller, caller, false)?;
	kernel.envs.get_mut(index).trap_frame = *regs;
	// No runnable environment: the reference kernel spins forever, which
	// has no useful hosted equivalent; treated as fatal here rather than
	// returned through the closed error set.
	let next = kernel
		.scheduler
		.pick_next(&kernel.envs)
		.unwrap_or_else(|e| panic!("{e}"));
	kernel.envs.set_current(next);
	Ok(0)
}
