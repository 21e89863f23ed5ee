//! `env_alloc()` — create a child environment.
//!
//! Besides the fresh slot, this performs the one-page deep copy of the
//! parent's top-of-stack page and the parent/child trap-frame fixup:
//! the child's saved PC becomes the
//! parent's post-syscall resume address, and its return-value register is
//! forced to `0`, giving user-space `fork` (C7) the standard
//! "parent sees child id, child sees 0" convention at the primitive
//! layer — all other pages remain unmapped in the child until user-space
//! `fork` duplicates them.

use crate::error::KernResult;
use crate::memory::{PteFlags, USTACKTOP};
use macros::syscall;

#[syscall]
pub fn env_alloc() -> KernResult<u32> {
	let child_index = kernel.envs.env_alloc(Some(caller))?;
	let mut child_regs = *regs;
	child_regs.ret = 0;
	kernel.envs.get_mut(child_index).trap_frame = child_regs;

	let parent_index = kernel.envs.envid2env(caller, caller, false)?;
	let stack_va = USTACKTOP - crate::memory::PGSIZE as u32;
	if let Some(pte) = kernel.envs.get(parent_index).address_space.lookup(stack_va) {
		let child_frame = kernel.frames.frame_alloc()?;
		kernel.storage.copy(pte.frame, child_frame);
		kernel.envs.get_mut(child_index).address_space.insert(
			&mut kernel.frames,
			child_frame,
			stack_va,
			PteFlags::R | PteFlags::V,
		)?;
	}

	Ok(kernel.envs.get(child_index).env_id)
}
