//! Implementation of the `#[syscall]` attribute macro.

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Type};

/// The list of argument registers, in order. The trap frame carries five
/// argument registers, one fewer than the reference kernel's six, since
/// this teaching kernel targets a simpler calling convention.
const REGS: [&str; 5] = ["a0", "a1", "a2", "a3", "a4"];

/// Implementation of the syscall macro.
pub fn syscall(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as ItemFn);

	if input.sig.constness.is_some() {
		panic!("a system call handler cannot be `const`");
	}
	if !input.sig.generics.params.is_empty() {
		panic!("a system call cannot have generic arguments");
	}
	if input.sig.variadic.is_some() {
		panic!("a system call handler cannot have variadic arguments");
	}
	if input.sig.inputs.len() > REGS.len() {
		panic!(
			"too many arguments for the current target (max: {})",
			REGS.len()
		);
	}

	let args = input
		.sig
		.inputs
		.iter()
		.enumerate()
		.map(|(i, arg)| match arg {
			FnArg::Typed(typed) => {
				let pat = &typed.pat;
				let ty = &typed.ty;
				let reg_name = Ident::new(REGS[i], Span::call_site());
				(pat, ty, reg_name)
			}
			FnArg::Receiver(_) => panic!("a system call handler cannot have a `self` argument"),
		})
		.collect::<Vec<_>>();

	let args_tokens: proc_macro2::TokenStream = args
		.iter()
		.map(|(pat, ty, reg_name)| {
			let ty = (*ty).clone();
			quote! {
				let #pat = <#ty as crate::syscall::FromReg>::from_reg(regs.#reg_name);
			}
		})
		.collect();

	let ident = input.sig.ident;
	let output = match &input.sig.output {
		syn::ReturnType::Type(_, ty) => (**ty).clone(),
		syn::ReturnType::Default => Type::Verbatim(quote! { () }),
	};
	let code = input.block;
	let name_str = ident.to_string();

	#[cfg(feature = "strace")]
	let trace_entry = quote! {
		log::trace!("syscall {} caller={:#010x} regs={:?}", #name_str, caller, regs);
	};
	#[cfg(not(feature = "strace"))]
	let trace_entry = quote! {};

	// The handler always receives the kernel context and the caller's
	// envid explicitly, ahead of its declared arguments, instead of
	// reaching for a global "current process" the way the reference
	// kernel does; see DESIGN.md.
	let toks = quote! {
		pub fn #ident(
			kernel: &mut crate::kernel::Kernel,
			caller: crate::env::EnvId,
			regs: &crate::regs::Regs,
		) -> #output {
			#trace_entry
			#args_tokens
			#code
		}
	};
	TokenStream::from(toks)
}
