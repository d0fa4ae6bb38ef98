//! Packet-Bounds Guards
//!
//! Every packet load must be preceded by a guard proving the packet is
//! long enough. Absolute loads (`LoadAbsolute`, `LoadMemShift`) and
//! indirect loads (`LoadIndirect`) are guarded on independent tracks:
//!
//! - absolute: `packet_length >= len` with `len = max(off + size)`
//! - indirect: `packet_length >= X + len`, valid only while X is
//!   untouched; any write to X invalidates the guard
//!
//! The guard in effect at a block's entry is the weakest of its
//! predecessors' exit guards (merging paths can only guarantee the
//! weakest common bound), so states merge with `min`. A guard is
//! inserted only when a block demands a strictly stronger bound than its
//! entry supplies, keeping the output minimal.
//!
//! Guard lengths are computed in u64: `off` and `size` are 32-bit, so
//! the sum can exceed `u32::MAX` but never wraps.

use alloc::vec;
use alloc::vec::Vec;

use log::trace;

use crate::bytecode::{BlockInsn, Instruction};

use super::block::Block;

/// Insert absolute packet guards where a block's loads demand a stronger
/// bound than every predecessor already supplies.
pub(crate) fn add_absolute_packet_guards(blocks: &mut [Block]) {
    let mut entry_states: Vec<Option<u64>> = vec![None; blocks.len()];
    entry_states[0] = Some(0);

    for index in 0..blocks.len() {
        let entry = entry_states[index].unwrap_or(0);

        // `covered` is the bound already proven (entry guard plus any
        // guard instruction present in the block); `biggest` is the bound
        // the block's loads demand.
        let mut covered = entry;
        let mut biggest = 0u64;
        for wrapped in blocks[index].insns() {
            match wrapped.insn {
                Instruction::PacketGuardAbsolute { len } => covered = covered.max(len),
                Instruction::LoadAbsolute { off, size } => {
                    biggest = biggest.max(u64::from(off) + u64::from(size));
                }
                Instruction::LoadMemShift { off } => {
                    biggest = biggest.max(u64::from(off) + 1);
                }
                _ => {}
            }
        }

        if biggest > covered {
            trace!("block {}: absolute guard {} > {}", blocks[index].id(), biggest, covered);
            blocks[index].insert(
                0,
                BlockInsn::pseudo(Instruction::PacketGuardAbsolute { len: biggest }),
            );
        }
        let exit = covered.max(biggest);

        for &successor in blocks[index].jumps().values() {
            entry_states[successor] = Some(match entry_states[successor] {
                Some(existing) => existing.min(exit),
                None => exit,
            });
        }
    }
}

/// Insert indirect packet guards per X-write-delimited sub-run.
///
/// An indirect guard proves a bound relative to the current X, so a
/// write to X resets the bound to zero and starts a fresh sub-run.
pub(crate) fn add_indirect_packet_guards(blocks: &mut [Block]) {
    let mut entry_states: Vec<Option<u64>> = vec![None; blocks.len()];
    entry_states[0] = Some(0);

    for index in 0..blocks.len() {
        let mut guard = entry_states[index].unwrap_or(0);

        let mut start = 0;
        while start < blocks[index].insns().len() {
            // The sub-run ends at the first X-clobbering instruction.
            let mut run_end = blocks[index].insns()[start..]
                .iter()
                .position(|wrapped| wrapped.insn.writes_x())
                .map(|offset| start + offset)
                .unwrap_or(blocks[index].insns().len());

            let mut covered = guard;
            let mut biggest = 0u64;
            for wrapped in &blocks[index].insns()[start..run_end] {
                match wrapped.insn {
                    Instruction::PacketGuardIndirect { len } => covered = covered.max(len),
                    Instruction::LoadIndirect { off, size } => {
                        biggest = biggest.max(u64::from(off) + u64::from(size));
                    }
                    _ => {}
                }
            }

            if biggest > covered {
                trace!("block {}: indirect guard {} > {}", blocks[index].id(), biggest, covered);
                blocks[index].insert(
                    start,
                    BlockInsn::pseudo(Instruction::PacketGuardIndirect { len: biggest }),
                );
                run_end += 1;
            }
            guard = covered.max(biggest);

            if run_end == blocks[index].insns().len() {
                break;
            }
            // Crossing the X write: the proven bound no longer describes
            // the new X.
            guard = 0;
            start = run_end + 1;
        }

        for &successor in blocks[index].jumps().values() {
            entry_states[successor] = Some(match entry_states[successor] {
                Some(existing) => existing.min(guard),
                None => guard,
            });
        }
    }
}
