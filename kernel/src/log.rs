//! Kernel logging.
//!
//! Modeled on the reference kernel's own ring-buffer logger: records are
//! kept in memory regardless of whether they are also printed, so that a
//! crash handler (or a test) can dump recent history. Unlike the reference
//! kernel, output is routed through the [`log`] facade crate rather than a
//! bare VGA/TTY backend, since there is no console device underneath this
//! simulation beyond the [`crate::console::Console`] trait.

use crate::sync::KMutex;
use std::collections::VecDeque;

/// Maximum number of log records retained in memory.
const LOG_CAPACITY: usize = 4096;

/// One retained log record.
#[derive(Debug, Clone)]
pub struct Record {
	pub level: log::Level,
	pub message: String,
}

/// Ring buffer backing the kernel's in-memory log history.
pub struct RingLogger {
	records: KMutex<VecDeque<Record>>,
}

impl RingLogger {
	const fn new() -> Self {
		Self {
			records: KMutex::new(VecDeque::new()),
		}
	}

	/// Returns a snapshot of the retained records, oldest first.
	pub fn history(&self) -> Vec<Record> {
		self.records.lock().iter().cloned().collect()
	}
}

impl log::Log for RingLogger {
	fn enabled(&self, _metadata: &log::Metadata) -> bool {
		true
	}

	fn log(&self, record: &log::Record) {
		let mut records = self.records.lock();
		if records.len() == LOG_CAPACITY {
			records.pop_front();
		}
		records.push_back(Record {
			level: record.level(),
			message: format!("{}", record.args()),
		});
	}

	fn flush(&self) {}
}

static LOGGER: RingLogger = RingLogger::new();

/// Installs the ring logger as the global `log` backend.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init(level: log::LevelFilter) {
	let _ = log::set_logger(&LOGGER);
	log::set_max_level(level);
}

/// Returns the installed logger's retained history, for tests that assert
/// on the user-visible destroyer/victim and panic messages.
pub fn history() -> Vec<Record> {
	LOGGER.history()
}
