//! `spawn(prog, argv)` — user-space ELF loader (C8).

use crate::elf;
use crate::env::{EnvId, Status};
use crate::error::{KernError, KernResult};
use crate::file::ProgramFile;
use crate::kernel::Kernel;
use crate::memory::{round_down, PteFlags, PGSIZE, USTACKTOP};
use crate::regs::Regs;

/// Loads every `PT_LOAD` segment of `file` into `child_index`'s address
/// space: every page gets a freshly allocated frame, filled either by a
/// bulk copy out of a full, file-offset-aligned page (via
/// [`ProgramFile::read_map`]) or by [`ProgramFile::readn`] for a partial
/// one; bytes past `file_size` up to `mem_size` are zero-filled, per §4.8.
fn load_segments(
	kernel: &mut Kernel,
	child_index: usize,
	file: &dyn ProgramFile,
	segments: &[elf::LoadSegment],
) -> KernResult<()> {
	for seg in segments {
		let va_start = round_down(seg.mem_addr);
		let mut off: u64 = 0;
		while off < seg.mem_size {
			let va = va_start + off as u32;
			let frame = if off < seg.file_size {
				let file_off = seg.file_offset + off;
				if file_off % PGSIZE as u64 == 0 && (seg.file_size - off) >= PGSIZE as u64 {
					if let Some(page) = file.read_map(file_off as usize) {
						let f = kernel.frames.frame_alloc()?;
						*kernel.storage.write(f) = *page;
						f
					} else {
						let f = kernel.frames.frame_alloc()?;
						kernel.storage.zero(f);
						let mut buf = [0u8; PGSIZE];
						file.readn(file_off as usize, &mut buf)?;
						*kernel.storage.write(f) = buf;
						f
					}
				} else {
					let f = kernel.frames.frame_alloc()?;
					kernel.storage.zero(f);
					let mut buf = [0u8; PGSIZE];
					file.readn(file_off as usize, &mut buf)?;
					*kernel.storage.write(f) = buf;
					f
				}
			} else {
				let f = kernel.frames.frame_alloc()?;
				kernel.storage.zero(f);
				f
			};
			kernel.envs.get_mut(child_index).address_space.insert(
				&mut kernel.frames,
				frame,
				va,
				PteFlags::V | PteFlags::R,
			)?;
			off += PGSIZE as u64;
		}
	}
	Ok(())
}

/// Builds the one-page argv/argc stack image described in §4.8: strings
/// first, then a pointer array targeting them, then `argc`, then the
/// pointer to the array, with the child-relative addresses baked in.
/// Returns `(page bytes, stack pointer)`. Fails with `NoMem` if everything
/// doesn't fit in one page.
fn build_stack(argv: &[&str]) -> KernResult<([u8; PGSIZE], u32)> {
	let mut page = [0u8; PGSIZE];
	let base = USTACKTOP - PGSIZE as u32;
	let mut off = 0usize;
	let mut string_offsets = Vec::with_capacity(argv.len());

	for s in argv {
		let bytes = s.as_bytes();
		if off + bytes.len() + 1 > PGSIZE {
			return Err(KernError::NoMem);
		}
		string_offsets.push(off);
		page[off..off + bytes.len()].copy_from_slice(bytes);
		off += bytes.len() + 1;
	}
	off = (off + 3) & !3;

	let ptrarray_off = off;
	let needed = 4 * argv.len() + 8;
	if ptrarray_off + needed > PGSIZE {
		return Err(KernError::NoMem);
	}
	for (i, &str_off) in string_offsets.iter().enumerate() {
		let addr = base + str_off as u32;
		page[ptrarray_off + i * 4..ptrarray_off + i * 4 + 4].copy_from_slice(&addr.to_le_bytes());
	}
	off = ptrarray_off + 4 * argv.len();

	let argc_off = off;
	page[argc_off..argc_off + 4].copy_from_slice(&(argv.len() as u32).to_le_bytes());

	let argv_off = argc_off + 4;
	let argv_ptr = base + ptrarray_off as u32;
	page[argv_off..argv_off + 4].copy_from_slice(&argv_ptr.to_le_bytes());

	Ok((page, base + argc_off as u32))
}

/// Allocates a child, loads `file`'s `PT_LOAD` segments, builds its initial
/// argv stack, shares every `LIBRARY` page of the parent, and marks it
/// runnable.
pub fn spawn(
	kernel: &mut Kernel,
	parent_id: EnvId,
	file: &dyn ProgramFile,
	argv: &[&str],
) -> KernResult<EnvId> {
	let image = elf::parse(file.as_bytes())?;

	let child_id = crate::syscall::env_alloc(kernel, parent_id, &Regs::default())?;
	let child_index = kernel.envs.envid2env(child_id, parent_id, true)?;

	load_segments(kernel, child_index, file, &image.segments)?;

	let (stack_page, sp) = build_stack(argv)?;
	let stack_frame = kernel.frames.frame_alloc()?;
	*kernel.storage.write(stack_frame) = stack_page;
	kernel.envs.get_mut(child_index).address_space.insert(
		&mut kernel.frames,
		stack_frame,
		USTACKTOP - PGSIZE as u32,
		PteFlags::V | PteFlags::R,
	)?;

	let parent_index = kernel.envs.envid2env(parent_id, parent_id, false)?;
	let library_pages = kernel
		.envs
		.get(parent_index)
		.address_space
		.mapped_pages_below(crate::memory::UTOP)
		.into_iter()
		.filter(|&va| {
			kernel
				.envs
				.get(parent_index)
				.address_space
				.lookup(va)
				.is_some_and(|p| p.perm.contains(PteFlags::LIBRARY))
		})
		.collect::<Vec<_>>();
	for va in library_pages {
		let frame = kernel
			.envs
			.get(parent_index)
			.address_space
			.lookup(va)
			.expect("just filtered for a present mapping")
			.frame;
		kernel.envs.get_mut(child_index).address_space.insert(
			&mut kernel.frames,
			frame,
			va,
			PteFlags::V | PteFlags::R | PteFlags::LIBRARY,
		)?;
	}

	let child = kernel.envs.get_mut(child_index);
	child.trap_frame.pc = image.entry;
	child.trap_frame.sp = sp;
	child.status = Status::Runnable;

	Ok(child_id)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::MemFile;
	use crate::kernel::Kernel;

	// Minimal 32-bit LE ELF: header + one PT_LOAD program header covering
	// a single page at UTEXT, no section headers.
	fn tiny_elf(entry: u32) -> Vec<u8> {
		let mut f = vec![0u8; PGSIZE + 0x34 + 0x20];
		f[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
		f[4] = 1; // ELFCLASS32
		f[5] = 1; // little endian
		f[6] = 1; // EI_VERSION
		f[16..18].copy_from_slice(&2u16.to_le_bytes()); // e_type = ET_EXEC
		f[18..20].copy_from_slice(&8u16.to_le_bytes()); // e_machine = MIPS
		f[20..24].copy_from_slice(&1u32.to_le_bytes()); // e_version
		f[24..28].copy_from_slice(&entry.to_le_bytes()); // e_entry
		f[28..32].copy_from_slice(&0x34u32.to_le_bytes()); // e_phoff
		f[40..42].copy_from_slice(&0x34u16.to_le_bytes()); // e_ehsize
		f[42..44].copy_from_slice(&0x20u16.to_le_bytes()); // e_phentsize
		f[44..46].copy_from_slice(&1u16.to_le_bytes()); // e_phnum

		let ph = 0x34usize;
		f[ph..ph + 4].copy_from_slice(&1u32.to_le_bytes()); // p_type = PT_LOAD
		f[ph + 4..ph + 8].copy_from_slice(&0u32.to_le_bytes()); // p_offset
		f[ph + 8..ph + 12].copy_from_slice(&crate::memory::UTEXT.to_le_bytes()); // p_vaddr
		f[ph + 16..ph + 20].copy_from_slice(&(PGSIZE as u32).to_le_bytes()); // p_filesz
		f[ph + 20..ph + 24].copy_from_slice(&(PGSIZE as u32).to_le_bytes()); // p_memsz
		f
	}

	#[test]
	fn spawn_sets_entry_and_argv_stack() {
		let mut kernel = Kernel::with_defaults();
		let parent_index = kernel.envs.env_alloc(None).unwrap();
		let parent_id = kernel.envs.get(parent_index).env_id;

		let entry = crate::memory::UTEXT;
		let file = MemFile::new(tiny_elf(entry));
		let child_id = spawn(&mut kernel, parent_id, &file, &["echo", "hi"]).unwrap();
		let child_index = kernel.envs.envid2env(child_id, parent_id, true).unwrap();

		let child = kernel.envs.get(child_index);
		assert_eq!(child.status, Status::Runnable);
		assert_eq!(child.trap_frame.pc, entry);

		let sp = child.trap_frame.sp;
		let read_u32 = |va: u32| -> u32 {
			let mut bytes = [0u8; 4];
			for (i, b) in bytes.iter_mut().enumerate() {
				*b = child.read_user(&kernel.storage, va + i as u32).unwrap();
			}
			u32::from_le_bytes(bytes)
		};
		assert_eq!(read_u32(sp), 2);
		let argv_ptr = read_u32(sp + 4);
		let arg0_ptr = read_u32(argv_ptr);
		let arg1_ptr = read_u32(argv_ptr + 4);
		let read_str = |mut va: u32| -> String {
			let mut s = Vec::new();
			loop {
				let b = child.read_user(&kernel.storage, va).unwrap();
				if b == 0 {
					break;
				}
				s.push(b);
				va += 1;
			}
			String::from_utf8(s).unwrap()
		};
		assert_eq!(read_str(arg0_ptr), "echo");
		assert_eq!(read_str(arg1_ptr), "hi");
	}
}
