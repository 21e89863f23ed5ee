//! `mem_map(src_id, src_va, dst_id, dst_va, perm)` — map the frame backing
//! `src_va` in `src_id` at `dst_va` in `dst_id`. No copy occurs.

use crate::error::{KernError, KernResult};
use crate::memory::{pagetable, PteFlags};
use macros::syscall;

#[syscall]
pub fn mem_map(src_id: u32, src_va: u32, dst_id: u32, dst_va: u32, perm: PteFlags) -> KernResult<u32> {
	pagetable::check_perm(perm)?;
	pagetable::check_va(src_va, true)?;
	pagetable::check_va(dst_va, true)?;
	let src_index = kernel.envs.envid2env(src_id, caller, true)?;
	let dst_index = kernel.envs.envid2env(dst_id, caller, true)?;
	let pte = kernel
		.envs
		.get(src_index)
		.address_space
		.lookup(src_va)
		.ok_or(KernError::NotMapped)?;
	kernel
		.envs
		.get_mut(dst_index)
		.address_space
		.insert(&mut kernel.frames, pte.frame, dst_va, perm)?;
	Ok(0)
}
