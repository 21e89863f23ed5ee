//! User-space routines built entirely on the syscall surface: copy-on-write
//! `fork` (C7) and ELF `spawn` (C8).

pub mod fork;
pub mod spawn;

pub use fork::fork;
pub use spawn::spawn;
