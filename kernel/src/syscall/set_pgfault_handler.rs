//! `set_pgfault_handler(id, pc, xstk)` — record the target's user-mode
//! fault entry and exception-stack top.

use crate::error::KernResult;
use macros::syscall;

#[syscall]
pub fn set_pgfault_handler(id: u32, pc: u32, xstk: u32) -> KernResult<u32> {
	let index = kernel.envs.envid2env(id, caller, false)?;
	let env = kernel.envs.get_mut(index);
	env.pgfault_pc = pc;
	env.exception_stack_top = xstk;
	Ok(0)
}
