//! `ipc_try_send(id, val, src_va, perm)` — non-blocking IPC send (C6).

use crate::env::Status;
use crate::error::{KernError, KernResult};
use crate::memory::{pagetable, PteFlags};
use macros::syscall;

#[syscall]
pub fn ipc_try_send(id: u32, val: u32, src_va: u32, perm: PteFlags) -> KernResult<u32> {
	if src_va != 0 {
		pagetable::check_perm(perm)?;
		pagetable::check_va(src_va, true)?;
	}
	let dst_index = kernel.envs.envid2env(id, caller, false)?;
	if !kernel.envs.get(dst_index).ipc.recving {
		return Err(KernError::IpcNotRecv);
	}

	let dst_va = kernel.envs.get(dst_index).ipc.dst_va;
	if src_va != 0 && dst_va != 0 {
		let src_index = kernel.envs.envid2env(caller, caller, false)?;
		let pte = kernel
			.envs
			.get(src_index)
			.address_space
			.lookup(src_va)
			.ok_or(KernError::Inval)?;
		kernel
			.envs
			.get_mut(dst_index)
			.address_space
			.insert(&mut kernel.frames, pte.frame, dst_va, perm)?;
		kernel.envs.get_mut(dst_index).ipc.perm = perm;
	}

	let dst = kernel.envs.get_mut(dst_index);
	dst.ipc.recving = false;
	dst.ipc.from_id = caller;
	dst.ipc.value = val;
	dst.status = Status::Runnable;
	Ok(0)
}
