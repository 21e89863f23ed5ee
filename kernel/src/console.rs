//! The console device `putchar` writes to.
//!
//! This trait is that device's contract, with an in-memory default so
//! tests can assert on emitted output instead of needing a real terminal.

pub trait Console: Send {
	fn putchar(&mut self, c: u8);
}

/// Collects everything written to it; the default console for tests and
/// for `Kernel::new` when no other backend is supplied.
#[derive(Default)]
pub struct BufferConsole {
	buf: Vec<u8>,
}

impl BufferConsole {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contents(&self) -> &[u8] {
		&self.buf
	}
}

impl Console for BufferConsole {
	fn putchar(&mut self, c: u8) {
		self.buf.push(c);
	}
}
