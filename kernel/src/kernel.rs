//! The kernel's singleton state, bundled behind a single owning handle.
//!
//! The frame table, environment table, and scheduler are process-wide
//! singletons, encapsulated behind an interface that takes them as an
//! explicit context rather than reaching for ambient globals, so the whole
//! thing stays constructible fresh in every test.

use crate::config::Config;
use crate::console::{BufferConsole, Console};
use crate::env::EnvTable;
use crate::memory::frame::{FrameStorage, FrameTable};
use crate::sched::Scheduler;

pub struct Kernel {
	pub frames: FrameTable,
	pub storage: FrameStorage,
	pub envs: EnvTable,
	pub scheduler: Scheduler,
	pub console: Box<dyn Console>,
}

impl Kernel {
	pub fn new(config: &Config) -> Self {
		Self {
			frames: FrameTable::new(config.nframe),
			storage: FrameStorage::new(),
			envs: EnvTable::new(config.nenv),
			scheduler: Scheduler::new(),
			console: Box::new(BufferConsole::new()),
		}
	}

	/// Builds a kernel with the default configuration, for tests that do
	/// not care about sizing.
	pub fn with_defaults() -> Self {
		Self::new(&Config::default())
	}

	/// Dispatches one system call on behalf of `caller`. Stands in for trap
	/// entry: a real entry path would land here after saving `regs` from
	/// the architectural register file.
	pub fn syscall(
		&mut self,
		caller: crate::env::EnvId,
		regs: &crate::regs::Regs,
		num: u32,
	) -> crate::error::KernResult<u32> {
		crate::syscall::dispatch(self, caller, regs, num)
	}
}
