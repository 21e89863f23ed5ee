//! `ipc_recv(dst_va)` — flag the caller as receiving, then yield.
//!
//! `dst_va` may be `0`, meaning "no page transfer wanted". Never returns
//! directly to the caller in the reference kernel; here, as with `yield`,
//! it instead leaves `kernel.envs`' current pointer pointing at whatever
//! the scheduler picks next.

use crate::env::Status;
use crate::error::KernResult;
use macros::syscall;

#[syscall]
pub fn ipc_recv(dst_va: u32) -> KernResult<u32> {
	let index = kernel.envs.envid2env(caller, caller, false)?;
	{
		let env = kernel.envs.get_mut(index);
		env.ipc.dst_va = dst_va;
		env.ipc.recving = true;
		env.status = Status::NotRunnable;
	}
	crate::syscall::sys_yield(kernel, caller, regs)
}
