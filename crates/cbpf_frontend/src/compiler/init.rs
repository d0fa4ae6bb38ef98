//! Memory Initialization
//!
//! A strict verifier refuses any read of a register or scratch cell that
//! is not guaranteed to have been written first. This pass finds every
//! cell that some path reads before writing and zero-initializes it at
//! program entry.
//!
//! The analysis is a single forward sweep over the topologically ordered
//! block list. A cell counts as initialized at a block's entry only when
//! every predecessor guarantees it, so states merge by intersection.

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, trace};

use crate::bytecode::registers::SCRATCH_CELLS;
use crate::bytecode::{BlockInsn, Instruction, MemSet, Register};

use super::block::Block;

/// Zero-initialize every cell that may be read before it is written.
///
/// Prepends `LoadConstant {dst, 0}` and `InitializeScratch {n}` to the
/// entry block, in the canonical order A, X, M[0..16].
pub(crate) fn initialize_memory(blocks: &mut [Block]) {
    let mut entry_states: Vec<Option<MemSet>> = vec![None; blocks.len()];
    entry_states[0] = Some(MemSet::empty());

    let mut uninitialized = MemSet::empty();

    for index in 0..blocks.len() {
        let mut state = entry_states[index].unwrap_or_else(MemSet::empty);

        for wrapped in blocks[index].insns() {
            let effects = wrapped.insn.effects();
            uninitialized |= effects.reads & !state;
            state |= effects.writes;
        }

        // Successors run with the state left by the whole block.
        for &successor in blocks[index].jumps().values() {
            entry_states[successor] = Some(match entry_states[successor] {
                Some(existing) => existing & state,
                None => state,
            });
        }
    }

    let mut prefix: Vec<BlockInsn> = Vec::new();
    for reg in [Register::A, Register::X] {
        if uninitialized.contains(MemSet::reg(reg)) {
            trace!("zero-initializing register {}", reg);
            prefix.push(BlockInsn::pseudo(Instruction::LoadConstant { dst: reg, val: 0 }));
        }
    }
    for n in 0..SCRATCH_CELLS {
        if uninitialized.contains(MemSet::scratch(n)) {
            trace!("zero-initializing scratch cell M[{}]", n);
            prefix.push(BlockInsn::pseudo(Instruction::InitializeScratch { n }));
        }
    }

    if !prefix.is_empty() {
        debug!("prepending {} zero-initializers", prefix.len());
        blocks[0].prepend(prefix);
    }
}
