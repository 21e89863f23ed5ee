//! `mem_unmap(id, va)` — remove a mapping. Silent no-op if absent.

use crate::error::KernResult;
use crate::memory::pagetable;
use macros::syscall;

#[syscall]
pub fn mem_unmap(id: u32, va: u32) -> KernResult<u32> {
	pagetable::check_va(va, true)?;
	let index = kernel.envs.envid2env(id, caller, true)?;
	kernel
		.envs
		.get_mut(index)
		.address_space
		.remove(&mut kernel.frames, va);
	Ok(0)
}
