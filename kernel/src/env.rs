//! C3 — the environment table.

use crate::error::{KernError, KernResult};
use crate::memory::frame::{FrameStorage, FrameTable};
use crate::memory::pagetable::AddressSpace;
use crate::memory::{PteFlags, VirtAddr, NDIR};
use crate::regs::Regs;
use log::info;

/// Identifies one environment-table slot at a point in time.
///
/// Packs a slot index in the low bits and a generation counter in the
/// high bits, so a stale id (one whose slot has since been reused) is
/// distinguishable from the live one. `0` is reserved to mean "the
/// caller" at the syscall boundary, never a real id.
pub type EnvId = u32;

/// Status of an environment-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	Free,
	Runnable,
	NotRunnable,
}

/// A page-fault handler, installed by user-space `fork`'s COW setup.
///
/// Conceptually this is a user-mode program counter the trap path resumes
/// at; since there is no trap hardware in this simulation, it is instead
/// stored as a closure invoked directly by [`Environment::write_user`].
pub type PgFaultHandler =
	Box<dyn FnMut(&mut AddressSpace, &mut FrameTable, &mut FrameStorage, VirtAddr) -> KernResult<()>>;

/// The IPC rendezvous slot embedded in every environment (see C6).
#[derive(Default)]
pub struct IpcSlot {
	pub recving: bool,
	pub dst_va: VirtAddr,
	pub value: u32,
	pub from_id: EnvId,
	pub perm: PteFlags,
}

/// One environment-table slot.
pub struct Environment {
	pub env_id: EnvId,
	pub parent_id: Option<EnvId>,
	pub status: Status,
	pub trap_frame: Regs,
	pub address_space: AddressSpace,
	/// User-mode program counter to resume at on a page fault, recorded
	/// by `set_pgfault_handler`.
	pub pgfault_pc: VirtAddr,
	/// The closure actually invoked by [`Environment::write_user`]; see
	/// the module doc on [`PgFaultHandler`] for why this is separate from
	/// `pgfault_pc`.
	pub pgfault_handler_entry: Option<PgFaultHandler>,
	pub exception_stack_top: VirtAddr,
	pub ipc: IpcSlot,
}

impl Environment {
	fn fresh(env_id: EnvId, ndir: usize) -> Self {
		Self {
			env_id,
			parent_id: None,
			status: Status::Free,
			trap_frame: Regs::default(),
			address_space: AddressSpace::new(ndir),
			pgfault_pc: 0,
			pgfault_handler_entry: None,
			exception_stack_top: 0,
			ipc: IpcSlot::default(),
		}
	}

	/// Installs the Rust closure actually invoked on a simulated store
	/// fault. Called by `user::fork` right after the `set_pgfault_handler`
	/// syscall records `pgfault_pc`/`exception_stack_top`, since there is
	/// no byte-addressable user-mode code for the kernel to jump to in
	/// this simulation.
	pub fn install_fault_handler(&mut self, handler: PgFaultHandler) {
		self.pgfault_handler_entry = Some(handler);
	}

	/// Writes `value` to the single byte at `va`, routing through the
	/// registered COW fault handler if the mapped entry carries `COW`.
	///
	/// This is the simulation's stand-in for the hardware store-fault trap.
	pub fn write_user(
		&mut self,
		frames: &mut FrameTable,
		storage: &mut FrameStorage,
		va: VirtAddr,
		value: u8,
	) -> KernResult<()> {
		let pte = self
			.address_space
			.lookup(va)
			.ok_or(KernError::NotMapped)?;
		if pte.perm.contains(PteFlags::COW) {
			let handler = self
				.pgfault_handler_entry
				.as_mut()
				.unwrap_or_else(|| panic!("store fault at {va:#x} with no pgfault handler installed"));
			handler(&mut self.address_space, frames, storage, va)?;
		}
		let pte = self.address_space.lookup(va).expect("handler must leave va mapped");
		let off = (va as usize) % crate::memory::PGSIZE;
		storage.write(pte.frame)[off] = value;
		Ok(())
	}

	pub fn read_user(&self, storage: &FrameStorage, va: VirtAddr) -> KernResult<u8> {
		let pte = self
			.address_space
			.lookup(va)
			.ok_or(KernError::NotMapped)?;
		let off = (va as usize) % crate::memory::PGSIZE;
		Ok(storage.read(pte.frame)[off])
	}
}

/// Fixed-size table of environment slots, the free list, and envid
/// encoding.
pub struct EnvTable {
	slots: Vec<Environment>,
	generations: Vec<u32>,
	free_list: Vec<usize>,
	index_bits: u32,
	current: Option<usize>,
}

impl EnvTable {
	pub fn new(nenv: usize) -> Self {
		let index_bits = (nenv.next_power_of_two().max(2)).trailing_zeros();
		Self {
			slots: (0..nenv).map(|_| Environment::fresh(0, NDIR)).collect(),
			generations: vec![0; nenv],
			free_list: (0..nenv).collect(),
			index_bits,
			current: None,
		}
	}

	fn encode(&self, index: usize, generation: u32) -> EnvId {
		(generation << self.index_bits) | index as u32
	}

	fn decode(&self, id: EnvId) -> (usize, u32) {
		let mask = (1u32 << self.index_bits) - 1;
		((id & mask) as usize, id >> self.index_bits)
	}

	pub fn current_id(&self) -> Option<EnvId> {
		self.current.map(|i| self.slots[i].env_id)
	}

	pub fn current(&self) -> Option<&Environment> {
		self.current.map(|i| &self.slots[i])
	}

	pub fn current_mut(&mut self) -> Option<&mut Environment> {
		self.current.map(move |i| &mut self.slots[i])
	}

	pub fn set_current(&mut self, index: usize) {
		self.current = Some(index);
	}

	pub fn nenv(&self) -> usize {
		self.slots.len()
	}

	pub fn get(&self, index: usize) -> &Environment {
		&self.slots[index]
	}

	pub fn get_mut(&mut self, index: usize) -> &mut Environment {
		&mut self.slots[index]
	}

	/// Resolves `id` to a slot index. `0` resolves to `caller`. Fails
	/// with `BadEnv` on a stale generation, a `Free` slot, or (when
	/// `check_perm`) a target that is neither the caller nor its
	/// immediate child.
	pub fn envid2env(&self, id: EnvId, caller: EnvId, check_perm: bool) -> KernResult<usize> {
		if id == 0 {
			let (index, _) = self.decode(caller);
			return Ok(index);
		}
		let (index, generation) = self.decode(id);
		if index >= self.slots.len() || self.generations[index] != generation {
			return Err(KernError::BadEnv);
		}
		let env = &self.slots[index];
		if env.status == Status::Free {
			return Err(KernError::BadEnv);
		}
		if check_perm {
			let is_self = env.env_id == caller;
			let is_child = env.parent_id == Some(caller);
			if !is_self && !is_child {
				return Err(KernError::BadEnv);
			}
		}
		Ok(index)
	}

	/// Pulls a `Free` slot, bumps its generation, and resets it to a
	/// fresh address space in status `NotRunnable`. The one-page
	/// top-of-stack deep copy and trap-frame fixup are performed by the
	/// caller (the `env_alloc` syscall handler), since they need access to
	/// the parent.
	pub fn env_alloc(&mut self, parent_id: Option<EnvId>) -> KernResult<usize> {
		let index = self.free_list.pop().ok_or(KernError::NoFreeEnv)?;
		self.generations[index] += 1;
		let generation = self.generations[index];
		let env_id = self.encode(index, generation);
		self.slots[index] = Environment::fresh(env_id, NDIR);
		self.slots[index].parent_id = parent_id;
		self.slots[index].status = Status::NotRunnable;
		Ok(index)
	}

	/// Releases every user-region mapping, tears down the page table, and
	/// returns the slot to `Free`. If the destroyed environment is
	/// current, the caller is responsible for invoking the scheduler
	/// before resuming user mode.
	pub fn env_destroy(&mut self, frames: &mut FrameTable, index: usize, destroyer: EnvId) {
		let victim_id = self.slots[index].env_id;
		let mapped: Vec<VirtAddr> = self.slots[index]
			.address_space
			.mapped_pages_below(crate::memory::UTOP);
		for va in mapped {
			self.slots[index].address_space.remove(frames, va);
		}
		self.slots[index].address_space.teardown(frames);
		self.slots[index].status = Status::Free;
		self.free_list.push(index);
		if self.current == Some(index) {
			self.current = None;
		}
		info!("[{destroyer:#010x}] destroyed {victim_id:#010x}");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn envid_freshness_across_realloc() {
		let mut t = EnvTable::new(4);
		let i = t.env_alloc(None).unwrap();
		let first = t.get(i).env_id;
		let mut frames = FrameTable::new(8);
		t.env_destroy(&mut frames, i, first);
		let i2 = t.env_alloc(None).unwrap();
		let second = t.get(i2).env_id;
		assert_eq!(i, i2);
		assert_ne!(first, second);
	}

	#[test]
	fn bad_envid_after_destroy() {
		let mut t = EnvTable::new(4);
		let i = t.env_alloc(None).unwrap();
		let id = t.get(i).env_id;
		let mut frames = FrameTable::new(8);
		t.env_destroy(&mut frames, i, id);
		assert_eq!(t.envid2env(id, id, false), Err(KernError::BadEnv));
	}

	#[test]
	fn self_and_child_permission_check() {
		let mut t = EnvTable::new(4);
		let p = t.env_alloc(None).unwrap();
		let parent_id = t.get(p).env_id;
		let c = t.env_alloc(Some(parent_id)).unwrap();
		let child_id = t.get(c).env_id;
		let other = t.env_alloc(None).unwrap();
		let other_id = t.get(other).env_id;
		assert!(t.envid2env(child_id, parent_id, true).is_ok());
		assert_eq!(
			t.envid2env(other_id, parent_id, true),
			Err(KernError::BadEnv)
		);
	}
}
