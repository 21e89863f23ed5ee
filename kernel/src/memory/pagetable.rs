//! C2 — the two-level address-space map.

use crate::error::{KernError, KernResult};
use crate::memory::frame::{FrameIdx, FrameTable};
use crate::memory::{split_va, PteFlags, VirtAddr, PTES_PER_TABLE};

/// A single page-table entry: a frame index plus permission bits. Absence
/// of an entry (no mapping) is represented by `None` in the owning table,
/// not by a sentinel value here.
#[derive(Debug, Clone, Copy)]
pub struct Pte {
	pub frame: FrameIdx,
	pub perm: PteFlags,
}

type LeafTable = Box<[Option<Pte>; PTES_PER_TABLE]>;

fn new_leaf() -> LeafTable {
	Box::new([None; PTES_PER_TABLE])
}

/// One environment's page table: a directory of lazily-allocated leaf
/// tables. The directory frame and every leaf-table frame consume a slot
/// in the shared [`FrameTable`], exactly like a user mapping, which is why
/// `insert`/`remove` are the only places refcounts on those frames change.
pub struct PageTable {
	dir: Vec<Option<LeafTable>>,
	/// Frame backing each allocated leaf table, indexed the same as `dir`,
	/// so destroying the address space can drop their references.
	leaf_frames: Vec<Option<FrameIdx>>,
}

/// A `PageTable` *is* an address space's directory of mappings.
pub type AddressSpace = PageTable;

impl PageTable {
	pub fn new(ndirs: usize) -> Self {
		Self {
			dir: (0..ndirs).map(|_| None).collect(),
			leaf_frames: vec![None; ndirs],
		}
	}

	/// Returns a pointer to the leaf entry for `va`, allocating a leaf
	/// table (and consuming a frame for it) if absent and `create` is
	/// true.
	pub fn walk(
		&mut self,
		frames: &mut FrameTable,
		va: VirtAddr,
		create: bool,
	) -> KernResult<Option<&mut Option<Pte>>> {
		let (dir_i, tab_i, _) = split_va(va);
		if self.dir[dir_i].is_none() {
			if !create {
				return Ok(None);
			}
			let f = frames.frame_alloc()?;
			frames.frame_incref(f);
			self.dir[dir_i] = Some(new_leaf());
			self.leaf_frames[dir_i] = Some(f);
		}
		Ok(Some(&mut self.dir[dir_i].as_mut().unwrap()[tab_i]))
	}

	/// Returns the mapped frame and a view of the entry for `va`, or
	/// `None` if unmapped.
	pub fn lookup(&self, va: VirtAddr) -> Option<Pte> {
		let (dir_i, tab_i, _) = split_va(va);
		self.dir[dir_i].as_ref()?[tab_i]
	}

	/// Maps `va` to frame `f` with `perm`. If a mapping already exists at
	/// `va`, it is removed first. Re-inserting the same frame at the same
	/// `va` does not net-change that frame's refcount.
	pub fn insert(
		&mut self,
		frames: &mut FrameTable,
		f: FrameIdx,
		va: VirtAddr,
		perm: PteFlags,
	) -> KernResult<()> {
		let same_frame_reinsert = self.lookup(va).is_some_and(|p| p.frame == f);
		if !same_frame_reinsert {
			self.remove(frames, va);
		}
		frames.frame_incref(f);
		if same_frame_reinsert {
			// The `remove` above was skipped, so undo the net effect of
			// this incref against the entry that is about to be
			// overwritten: the old entry referenced the same frame, and
			// we're not removing it first, so cancel one of the two
			// increfs by decref'ing once more than a plain insert would.
			frames.frame_decref(f);
		}
		let slot = self
			.walk(frames, va, true)?
			.expect("walk(create=true) always yields a slot");
		*slot = Some(Pte {
			frame: f,
			perm: perm | PteFlags::V,
		});
		// `invalidate`: no-op in this simulation; a real backend would
		// flush the TLB entry for `va` here.
		invalidate(va);
		Ok(())
	}

	/// Removes the mapping at `va`, decrementing the backing frame's
	/// refcount. Silent no-op if `va` is unmapped.
	pub fn remove(&mut self, frames: &mut FrameTable, va: VirtAddr) {
		let (dir_i, tab_i, _) = split_va(va);
		if let Some(leaf) = self.dir[dir_i].as_mut() {
			if let Some(pte) = leaf[tab_i].take() {
				frames.frame_decref(pte.frame);
			}
		}
		invalidate(va);
	}

	/// Iterates every currently-mapped virtual page below `limit`, in
	/// ascending address order. Used by `fork`'s `duppage` loop and by
	/// `env_destroy`.
	pub fn mapped_pages_below(&self, limit: VirtAddr) -> Vec<VirtAddr> {
		let mut out = Vec::new();
		let last_page = (limit as usize) / crate::memory::PGSIZE;
		for page in 0..last_page {
			let dir_i = page / PTES_PER_TABLE;
			let tab_i = page % PTES_PER_TABLE;
			if dir_i >= self.dir.len() {
				break;
			}
			if let Some(leaf) = self.dir[dir_i].as_ref() {
				if leaf[tab_i].is_some() {
					out.push((page * crate::memory::PGSIZE) as VirtAddr);
				}
			}
		}
		out
	}

	/// Releases the directory and every allocated leaf table. Called by
	/// `env_destroy` after every user mapping has already been removed.
	pub fn teardown(&mut self, frames: &mut FrameTable) {
		for (dir_i, leaf) in self.leaf_frames.iter_mut().enumerate() {
			if let Some(f) = leaf.take() {
				frames.frame_decref(f);
			}
			self.dir[dir_i] = None;
		}
	}
}

/// Stands in for a TLB flush; there is no TLB in this simulation.
fn invalidate(_va: VirtAddr) {}

/// Validates a `perm` argument against the syscall-boundary rule: must
/// carry `V`, must not carry `COW`. The reference kernel's own check is a
/// C operator-precedence bug that almost certainly parses differently
/// from what its author intended; this is the intended predicate.
pub fn check_perm(perm: PteFlags) -> KernResult<()> {
	if perm.is_valid_user_perm() {
		Ok(())
	} else {
		Err(KernError::Inval)
	}
}

/// Validates that `va` is a legal user address, and page-aligned if
/// `must_align` is set.
pub fn check_va(va: VirtAddr, must_align: bool) -> KernResult<()> {
	if va >= crate::memory::UTOP {
		return Err(KernError::Inval);
	}
	if must_align && !crate::memory::is_page_aligned(va) {
		return Err(KernError::Inval);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn new_space() -> (PageTable, FrameTable) {
		(PageTable::new(PTES_PER_TABLE), FrameTable::new(16))
	}

	#[test]
	fn insert_lookup_remove() {
		let (mut pt, mut frames) = new_space();
		let f = frames.frame_alloc().unwrap();
		pt.insert(&mut frames, f, 0x1000, PteFlags::V | PteFlags::R)
			.unwrap();
		let pte = pt.lookup(0x1000).unwrap();
		assert_eq!(pte.frame, f);
		assert_eq!(frames.ref_count(f), 1);
		pt.remove(&mut frames, 0x1000);
		assert!(pt.lookup(0x1000).is_none());
		assert_eq!(frames.ref_count(f), 0);
	}

	#[test]
	fn reinsert_same_frame_same_va_no_net_refcount_change() {
		let (mut pt, mut frames) = new_space();
		let f = frames.frame_alloc().unwrap();
		pt.insert(&mut frames, f, 0x2000, PteFlags::V).unwrap();
		assert_eq!(frames.ref_count(f), 1);
		pt.insert(&mut frames, f, 0x2000, PteFlags::V | PteFlags::R)
			.unwrap();
		assert_eq!(frames.ref_count(f), 1);
	}

	#[test]
	fn insert_replaces_existing_mapping_at_va() {
		let (mut pt, mut frames) = new_space();
		let f1 = frames.frame_alloc().unwrap();
		let f2 = frames.frame_alloc().unwrap();
		pt.insert(&mut frames, f1, 0x3000, PteFlags::V).unwrap();
		pt.insert(&mut frames, f2, 0x3000, PteFlags::V).unwrap();
		assert_eq!(frames.ref_count(f1), 0);
		assert_eq!(frames.ref_count(f2), 1);
	}

	#[test]
	fn remove_unmapped_is_silent_noop() {
		let (mut pt, mut frames) = new_space();
		pt.remove(&mut frames, 0x4000);
	}

	use proptest::collection::vec as op_vec;
	use proptest::prelude::*;

	#[derive(Debug, Clone, Copy)]
	enum Op {
		Insert(usize, usize),
		Remove(usize),
	}

	fn op_strategy() -> impl Strategy<Value = Op> {
		prop_oneof![
			(0usize..4, 0usize..3).prop_map(|(va, f)| Op::Insert(va, f)),
			(0usize..4).prop_map(Op::Remove),
		]
	}

	proptest! {
		/// Frame conservation: after any sequence of inserts/removes, each
		/// frame's refcount equals the number of virtual addresses currently
		/// mapped to it.
		#[test]
		fn frame_refcount_tracks_live_mappings(ops in op_vec(op_strategy(), 1..50)) {
			let (mut pt, mut frames) = new_space();
			let vas = [0x1000u32, 0x2000, 0x3000, 0x4000];
			let pool: Vec<FrameIdx> = (0..3).map(|_| frames.frame_alloc().unwrap()).collect();
			let mut mapped: [Option<usize>; 4] = [None; 4];

			for op in ops {
				match op {
					Op::Insert(va_i, f_i) => {
						pt.insert(&mut frames, pool[f_i], vas[va_i], PteFlags::V | PteFlags::R).unwrap();
						mapped[va_i] = Some(f_i);
					}
					Op::Remove(va_i) => {
						pt.remove(&mut frames, vas[va_i]);
						mapped[va_i] = None;
					}
				}
				for (f_i, &f) in pool.iter().enumerate() {
					let expected = mapped.iter().filter(|m| **m == Some(f_i)).count() as u32;
					prop_assert_eq!(frames.ref_count(f), expected);
				}
			}
		}

		/// Permission monotonicity: the syscall boundary never accepts a
		/// `perm` missing `V` or containing `COW`, for any bit pattern.
		#[test]
		fn check_perm_requires_v_forbids_cow(bits in any::<u32>()) {
			let perm = PteFlags::from_bits_truncate(bits);
			let expected = perm.contains(PteFlags::V) && !perm.contains(PteFlags::COW);
			prop_assert_eq!(check_perm(perm).is_ok(), expected);
		}
	}
}
