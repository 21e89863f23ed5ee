//! `getenvid()` — returns the caller's envid. Never fails.

use macros::syscall;

#[syscall]
pub fn getenvid() -> u32 {
	let _ = kernel;
	caller
}
