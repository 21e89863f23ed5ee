//! Physical frames and per-environment address spaces.

pub mod frame;
pub mod pagetable;

pub use frame::{FrameIdx, FrameTable};
pub use pagetable::{AddressSpace, PageTable};

use bitflags::bitflags;

/// Page size, fixed at 4 KiB as in the reference kernel.
pub const PGSIZE: usize = 4096;

/// Number of page-table entries per directory/leaf table.
///
/// The reference kernel's two-level table has 1024 entries per level on a
/// 32-bit MIPS/x86 address; this crate keeps the same geometry so the
/// directory/leaf split in [`pagetable`] has a real reason to exist instead
/// of collapsing into a flat map.
pub const PTES_PER_TABLE: usize = 1024;

/// Top of user address space; everything at or above is kernel-only.
pub const UTOP: u32 = 0xEEC0_0000;
/// Boundary between the low user-accessible region and user text/data/stack.
pub const UTEXT: u32 = 0x0080_0000;
/// Top of the ordinary user stack; the mapped stack page is
/// `[USTACKTOP - PGSIZE, USTACKTOP)`.
pub const USTACKTOP: u32 = UTOP - PGSIZE as u32;
/// Top of the user exception stack; the mapped exception-stack page is
/// `[UXSTACKTOP - PGSIZE, UXSTACKTOP)`. Equal to `UTOP`: the exception
/// stack page is the highest page below the kernel-only region, directly
/// above the ordinary stack page.
pub const UXSTACKTOP: u32 = UTOP;

bitflags! {
	/// Page-table-entry permission bits.
	///
	/// `V` and `R` are hardware-meaningful; `COW` and `LIBRARY` are
	/// software conventions enforced entirely by this crate.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct PteFlags: u32 {
		/// Valid: the MMU honors this mapping.
		const V = 1 << 0;
		/// Writable.
		const R = 1 << 1;
		/// Copy-on-write: hardware read-only, a store traps.
		const COW = 1 << 2;
		/// Shared read-write across `fork` instead of copied.
		const LIBRARY = 1 << 3;
	}
}

impl PteFlags {
	/// The validation the syscall boundary applies to every `perm`
	/// argument: must carry `V`, must not carry `COW`.
	pub fn is_valid_user_perm(self) -> bool {
		self.contains(PteFlags::V) && !self.contains(PteFlags::COW)
	}
}

/// A virtual address, always below [`UTOP`] for addresses this crate maps.
pub type VirtAddr = u32;

/// Splits a virtual address into (directory index, table index, offset).
pub fn split_va(va: VirtAddr) -> (usize, usize, usize) {
	let page = (va as usize) / PGSIZE;
	let dir = page / PTES_PER_TABLE;
	let tab = page % PTES_PER_TABLE;
	let off = va as usize % PGSIZE;
	(dir, tab, off)
}

/// Rounds a virtual address down to its containing page boundary.
pub fn round_down(va: VirtAddr) -> VirtAddr {
	va & !((PGSIZE - 1) as u32)
}

/// Tells whether `va` is page-aligned.
pub fn is_page_aligned(va: VirtAddr) -> bool {
	va % PGSIZE as u32 == 0
}

/// Number of page-directory slots needed to address every page below
/// [`UTOP`].
pub const NDIR: usize = (UTOP as usize) / (PGSIZE * PTES_PER_TABLE) + 1;
