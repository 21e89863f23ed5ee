//! ELF32 parsing for `spawn` (C8).
//!
//! The reference kernel's `spawn.c` reads the ELF header and program
//! headers by hand with `readn`. This crate parses the same 32-bit
//! little-endian, `PT_LOAD`-only subset with the `xmas-elf` crate instead
//! of hand-rolling a parser.

use crate::error::{KernError, KernResult};
use xmas_elf::program::{ProgramHeader, Type};
use xmas_elf::ElfFile;

/// One `PT_LOAD` segment's layout, in file and in memory.
#[derive(Debug, Clone, Copy)]
pub struct LoadSegment {
	pub file_offset: u64,
	pub file_size: u64,
	pub mem_addr: u32,
	pub mem_size: u64,
}

/// A parsed program image: entry point plus every `PT_LOAD` segment.
pub struct Image {
	pub entry: u32,
	pub segments: Vec<LoadSegment>,
}

/// Parses `bytes` as a 32-bit little-endian ELF image: only `PT_LOAD`
/// segments are honored, and the entry point must be below `UTOP`.
pub fn parse(bytes: &[u8]) -> KernResult<Image> {
	let elf = ElfFile::new(bytes).map_err(|_| KernError::Inval)?;
	let entry = elf.header.pt2.entry_point() as u32;
	if entry as u64 >= crate::memory::UTOP as u64 {
		return Err(KernError::Inval);
	}
	let mut segments = Vec::new();
	for ph in elf.program_iter() {
		if let ProgramHeader::Ph32(ph32) = ph {
			if ph32.get_type() == Ok(Type::Load) {
				segments.push(LoadSegment {
					file_offset: ph32.offset as u64,
					file_size: ph32.file_size as u64,
					mem_addr: ph32.virtual_addr,
					mem_size: ph32.mem_size as u64,
				});
			}
		}
	}
	Ok(Image { entry, segments })
}
