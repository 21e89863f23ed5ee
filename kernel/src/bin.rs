//! Minimal host entry point: boots a `Kernel` with config read from
//! `ENVKERN_CONFIG` (a TOML file path) if set, otherwise defaults, installs
//! the ring logger, and runs the scheduler until no environment is
//! runnable. Real workloads are expected to be driven through the library
//! crate (`kernel::Kernel`) rather than this binary, which exists mainly so
//! `cargo run` has something to do and to exercise boot-time wiring.

use kernel::config::Config;
use kernel::kernel::Kernel;
use std::env;
use std::fs;

fn main() {
	let config = match env::var("ENVKERN_CONFIG") {
		Ok(path) => {
			let text = fs::read_to_string(&path)
				.unwrap_or_else(|e| panic!("reading {path}: {e}"));
			Config::from_toml(&text).unwrap_or_else(|e| panic!("parsing {path}: {e}"))
		}
		Err(_) => Config::default(),
	};

	kernel::log::init(config.log_level_filter());
	let mut kern = Kernel::new(&config);

	log::info!(
		"envkern booted: nenv={} nframe={}",
		config.nenv,
		config.nframe
	);

	loop {
		match kern.scheduler.pick_next(&kern.envs) {
			Ok(index) => kern.envs.set_current(index),
			Err(_) => {
				log::info!("no runnable environment, halting");
				break;
			}
		}
	}
}
