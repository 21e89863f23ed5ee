//! `fork()` and the copy-on-write page-fault handler (C7).
//!
//! Built entirely from the syscall surface, as in the reference `lib/fork.c`:
//! a page-fault handler is installed, a child slot is allocated, every
//! mapped page below the stack is duplicated page-by-page, and the child is
//! marked runnable. There is no separate execution context to "return 0
//! into" in this simulation, so `fork` here performs the whole parent-side
//! setup in one call and hands back the child's envid; the child is left
//! `Runnable` for the scheduler to pick up exactly as it would after a real
//! `sys_exofork` returned `0` on the other side of a context switch.

use crate::env::EnvId;
use crate::error::KernResult;
use crate::kernel::Kernel;
use crate::memory::pagetable::AddressSpace;
use crate::memory::frame::{FrameStorage, FrameTable};
use crate::memory::{round_down, PteFlags, VirtAddr, PGSIZE, USTACKTOP, UXSTACKTOP};
use crate::regs::Regs;

/// The page-fault handler installed on both parent and child: the COW
/// fault path described in §4.7.1.
///
/// Adapted from "allocate a scratch page, copy into it, map it at `va`,
/// unmap the scratch" to directly allocating the replacement frame, copying
/// the faulting page's bytes into it, and inserting it at `va` — the same
/// end state (a private writable copy backing `va`, the shared frame's
/// refcount dropped by one) without a scratch virtual address, which this
/// simulation has no use for.
fn cow_fault(
	address_space: &mut AddressSpace,
	frames: &mut FrameTable,
	storage: &mut FrameStorage,
	va: VirtAddr,
) -> KernResult<()> {
	let va = round_down(va);
	let pte = address_space
		.lookup(va)
		.unwrap_or_else(|| panic!("cow fault at {va:#x} with no mapping"));
	if !pte.perm.contains(PteFlags::COW) {
		panic!("cow fault handler invoked on non-COW page at {va:#x}");
	}
	let fresh = frames.frame_alloc()?;
	storage.copy(pte.frame, fresh);
	address_space.insert(frames, fresh, va, PteFlags::V | PteFlags::R)?;
	Ok(())
}

/// Duplicates one parent page into the child per the three-way branch in
/// §4.7: `LIBRARY` pages are shared read-write, writable/already-`COW`
/// pages become `COW` in both directions, everything else is mapped
/// read-only in the child.
fn duppage(
	kernel: &mut Kernel,
	parent_index: usize,
	child_index: usize,
	va: VirtAddr,
) -> KernResult<()> {
	let pte = kernel
		.envs
		.get(parent_index)
		.address_space
		.lookup(va)
		.expect("va came from mapped_pages_below on the same address space");

	if pte.perm.contains(PteFlags::LIBRARY) {
		kernel.envs.get_mut(child_index).address_space.insert(
			&mut kernel.frames,
			pte.frame,
			va,
			PteFlags::V | PteFlags::R,
		)?;
	} else if pte.perm.contains(PteFlags::R) || pte.perm.contains(PteFlags::COW) {
		let cow_perm = PteFlags::V | PteFlags::COW;
		kernel.envs.get_mut(child_index).address_space.insert(
			&mut kernel.frames,
			pte.frame,
			va,
			cow_perm,
		)?;
		kernel.envs.get_mut(parent_index).address_space.insert(
			&mut kernel.frames,
			pte.frame,
			va,
			cow_perm,
		)?;
	} else {
		kernel.envs.get_mut(child_index).address_space.insert(
			&mut kernel.frames,
			pte.frame,
			va,
			PteFlags::V,
		)?;
	}
	Ok(())
}

/// Runs the parent-side sequence of a copy-on-write `fork`: install the COW
/// handler, allocate a child, duplicate every mapped page below the stack,
/// give the child its own exception stack, and mark it runnable.
///
/// `parent_regs` stands in for the parent's trap frame at the point `fork`
/// is called, exactly as `env_alloc`'s own syscall signature requires (see
/// `syscall::env_alloc`).
pub fn fork(kernel: &mut Kernel, parent_id: EnvId, parent_regs: &Regs) -> KernResult<EnvId> {
	let parent_index = kernel.envs.envid2env(parent_id, parent_id, false)?;
	kernel
		.envs
		.get_mut(parent_index)
		.install_fault_handler(Box::new(cow_fault));

	let child_id = crate::syscall::env_alloc(kernel, parent_id, parent_regs)?;
	let child_index = kernel.envs.envid2env(child_id, parent_id, true)?;

	let stack_top_page = USTACKTOP - PGSIZE as u32;
	for va in kernel
		.envs
		.get(parent_index)
		.address_space
		.mapped_pages_below(stack_top_page)
	{
		duppage(kernel, parent_index, child_index, va)?;
	}

	let xstk_frame = kernel.frames.frame_alloc()?;
	kernel.storage.zero(xstk_frame);
	kernel.envs.get_mut(child_index).address_space.insert(
		&mut kernel.frames,
		xstk_frame,
		UXSTACKTOP - PGSIZE as u32,
		PteFlags::V | PteFlags::R,
	)?;

	let child = kernel.envs.get_mut(child_index);
	child.install_fault_handler(Box::new(cow_fault));
	child.exception_stack_top = UXSTACKTOP;
	child.status = crate::env::Status::Runnable;

	Ok(child_id)
}
