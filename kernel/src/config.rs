//! Boot-time kernel sizing knobs.
//!
//! The environment-table size and physical frame count are left as runtime
//! knobs rather than fixed compile-time constants (`NENV`, `NPAGE` in the
//! reference kernel this design descends from). This crate reads them from a
//! small TOML document instead, using `serde`/`toml` for configuration, so
//! tests can exercise a small table without recompiling.

use serde::Deserialize;

/// Kernel sizing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Number of environment-table slots.
	pub nenv: usize,
	/// Number of physical frames in the simulated arena.
	pub nframe: usize,
	/// Default log level.
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			nenv: 64,
			nframe: 8192,
			log_level: "info".to_string(),
		}
	}
}

impl Config {
	/// Parses a configuration from a TOML document, falling back to
	/// [`Config::default`] for any field left unspecified.
	pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(s)
	}

	pub fn log_level_filter(&self) -> log::LevelFilter {
		self.log_level.parse().unwrap_or(log::LevelFilter::Info)
	}
}
