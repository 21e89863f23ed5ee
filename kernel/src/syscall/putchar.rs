//! `putchar(c)` — write one byte to the console. Never fails.

use macros::syscall;

#[syscall]
pub fn putchar(c: u8) -> u32 {
	kernel.console.putchar(c);
	0
}
