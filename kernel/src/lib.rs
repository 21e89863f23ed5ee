//! Environment (process) kernel core of a small MIPS-style teaching
//! operating system: physical frames, two-level page tables, a fixed-size
//! environment table, a cooperative round-robin scheduler, a system-call
//! dispatcher, an IPC rendezvous channel, and the two user-space routines
//! (COW `fork`, ELF `spawn`) built on top of that syscall surface.
//!
//! This crate is a host-runnable simulation rather than a bare-metal image:
//! there is no real trap entry, MMU, or boot-time physical memory detection
//! underneath it. `Kernel::syscall` stands in for trap entry; `memory` is
//! the simulated MMU; `Kernel::new` takes the place of the bootstrap
//! allocator.

pub mod config;
pub mod console;
pub mod elf;
pub mod env;
pub mod error;
pub mod file;
pub mod kernel;
pub mod log;
pub mod memory;
pub mod regs;
pub mod sched;
pub mod sync;
pub mod syscall;
pub mod user;

pub use env::EnvId;
pub use error::{KernError, KernResult};
pub use kernel::Kernel;
pub use regs::Regs;
