//! C5 — the system-call dispatcher.
//!
//! Validation precedes any state change. Each operation lives in its own
//! module, mirroring the reference kernel's one-file-per-syscall layout,
//! and is declared
//! with the `#[syscall]` attribute so its handler reads as a plain
//! function over already-typed arguments instead of manual register
//! plumbing.

mod env_alloc;
mod env_destroy;
mod getenvid;
mod ipc_recv;
mod ipc_try_send;
mod mem_alloc;
mod mem_map;
mod mem_unmap;
mod panic;
mod putchar;
mod set_env_status;
mod set_pgfault_handler;
mod yield_;

use crate::env::EnvId;
use crate::error::{KernError, KernResult};
use crate::kernel::Kernel;
use crate::memory::PteFlags;
use crate::regs::Regs;

/// A system call number, stable across the table in this module.
/// `sys_set_trapframe` is omitted entirely rather than kept as a dead stub.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallNo {
	Putchar = 0x00,
	GetEnvId = 0x01,
	Yield = 0x02,
	EnvDestroy = 0x03,
	SetPgfaultHandler = 0x04,
	MemAlloc = 0x05,
	MemMap = 0x06,
	MemUnmap = 0x07,
	EnvAlloc = 0x08,
	SetEnvStatus = 0x09,
	IpcRecv = 0x0a,
	IpcTrySend = 0x0b,
	Panic = 0x0c,
}

/// Converts a raw register value into a syscall argument type. Implemented
/// for every type a `#[syscall]` handler may take.
pub trait FromReg {
	fn from_reg(v: u32) -> Self;
}

impl FromReg for u32 {
	fn from_reg(v: u32) -> Self {
		v
	}
}

impl FromReg for u8 {
	fn from_reg(v: u32) -> Self {
		v as u8
	}
}

impl FromReg for PteFlags {
	fn from_reg(v: u32) -> Self {
		PteFlags::from_bits_truncate(v)
	}
}

/// Dispatches one system call by number. Returns `BadEnv`-shaped errors
/// for an unrecognized number, matching the reference kernel's closed
/// syscall table.
pub fn dispatch(kernel: &mut Kernel, caller: EnvId, regs: &Regs, num: u32) -> KernResult<u32> {
	match num {
		x if x == SyscallNo::Putchar as u32 => Ok(putchar::putchar(kernel, caller, regs)),
		x if x == SyscallNo::GetEnvId as u32 => Ok(getenvid::getenvid(kernel, caller, regs)),
		x if x == SyscallNo::Yield as u32 => yield_::sys_yield(kernel, caller, regs),
		x if x == SyscallNo::EnvDestroy as u32 => env_destroy::env_destroy(kernel, caller, regs),
		x if x == SyscallNo::SetPgfaultHandler as u32 => {
			set_pgfault_handler::set_pgfault_handler(kernel, caller, regs)
		}
		x if x == SyscallNo::MemAlloc as u32 => mem_alloc::mem_alloc(kernel, caller, regs),
		x if x == SyscallNo::MemMap as u32 => mem_map::mem_map(kernel, caller, regs),
		x if x == SyscallNo::MemUnmap as u32 => mem_unmap::mem_unmap(kernel, caller, regs),
		x if x == SyscallNo::EnvAlloc as u32 => env_alloc::env_alloc(kernel, caller, regs),
		x if x == SyscallNo::SetEnvStatus as u32 => {
			set_env_status::set_env_status(kernel, caller, regs)
		}
		x if x == SyscallNo::IpcRecv as u32 => ipc_recv::ipc_recv(kernel, caller, regs),
		x if x == SyscallNo::IpcTrySend as u32 => ipc_try_send::ipc_try_send(kernel, caller, regs),
		x if x == SyscallNo::Panic as u32 => panic::sys_panic(kernel, caller, regs),
		_ => Err(KernError::Inval),
	}
}

pub use env_alloc::env_alloc;
pub use env_destroy::env_destroy;
pub use getenvid::getenvid;
pub use ipc_recv::ipc_recv;
pub use ipc_try_send::ipc_try_send;
pub use mem_alloc::mem_alloc;
pub use mem_map::mem_map;
pub use mem_unmap::mem_unmap;
pub use panic::sys_panic;
pub use putchar::putchar;
pub use set_env_status::set_env_status;
pub use set_pgfault_handler::set_pgfault_handler;
pub use yield_::sys_yield;
