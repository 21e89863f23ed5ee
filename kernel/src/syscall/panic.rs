//! `panic(msg)` — an environment reporting a fatal, unrecoverable error.
//!
//! The reference kernel prints the NUL-terminated string at `msg` and halts
//! the whole machine. There is no "the machine" to halt here, only this
//! `Kernel` instance, so the adaptation is to log the message at `error`
//! level through the ring logger and then unwind the host process via
//! `panic!`, matching the "never returns" contract without inventing a
//! shutdown primitive nothing else in this crate needs.

use crate::error::KernResult;
use macros::syscall;

const MAX_PANIC_MSG: usize = 256;

#[syscall]
pub fn sys_panic(msg: u32) -> KernResult<u32> {
	let index = kernel.envs.envid2env(caller, caller, false)?;
	let mut bytes = Vec::new();
	let mut va = msg;
	while bytes.len() < MAX_PANIC_MSG {
		let b = kernel
			.envs
			.get(index)
			.read_user(&kernel.storage, va)
			.unwrap_or(0);
		if b == 0 {
			break;
		}
		bytes.push(b);
		va = va.wrapping_add(1);
	}
	let text = String::from_utf8_lossy(&bytes);
	log::error!("[{caller:#010x}] user panic: {text}");
	panic!("env {caller:#010x} panicked: {text}");
}
