//! Procedural macros for the kernel crate.

extern crate proc_macro;

mod syscall;

use proc_macro::TokenStream;

/// Attribute macro to declare a system call handler.
///
/// This macro lets a handler take its arguments directly instead of
/// manually pulling them out of the trap frame's argument registers.
#[proc_macro_attribute]
pub fn syscall(_metadata: TokenStream, input: TokenStream) -> TokenStream {
	syscall::syscall(input)
}
