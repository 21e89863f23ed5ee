//! `mem_alloc(id, va, perm)` — allocate a zeroed frame and map it.

use crate::error::KernResult;
use crate::memory::{pagetable, PteFlags};
use macros::syscall;

#[syscall]
pub fn mem_alloc(id: u32, va: u32, perm: PteFlags) -> KernResult<u32> {
	pagetable::check_perm(perm)?;
	pagetable::check_va(va, true)?;
	let index = kernel.envs.envid2env(id, caller, false)?;
	let frame = kernel.frames.frame_alloc()?;
	kernel.storage.zero(frame);
	let env = kernel.envs.get_mut(index);
	env.address_space
		.insert(&mut kernel.frames, frame, va, perm | PteFlags::R | PteFlags::V)?;
	Ok(0)
}
