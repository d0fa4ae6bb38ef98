//! Basic Blocks and Control Flow Reconstruction
//!
//! A block is a maximal straight-line run of instructions: nothing jumps
//! into its middle and nothing but its last instruction leaves it. The
//! splitter turns the flat, normalized instruction list into an ordered
//! list of blocks with every relative skip resolved into an edge.
//!
//! Because classic BPF skips are unsigned, every edge points forward and
//! the resulting graph is a DAG whose block list is already in
//! topological order. Each dataflow pass therefore needs only a single
//! forward sweep.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use log::debug;

use crate::bytecode::{BlockInsn, Instruction};

use super::error::{CompileError, CompileResult};

/// A basic block of the reconstructed control flow graph.
///
/// After splitting, `id`, `jumps` and `is_target` are frozen; the
/// analysis passes only ever insert instructions into `insns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Ordered instructions; non-empty, only the last may transfer control
    insns: Vec<BlockInsn>,
    /// Original position of the instruction that started this block
    id: usize,
    /// Absolute target position of each outgoing edge, mapped to the
    /// successor's index in the block list
    jumps: BTreeMap<usize, usize>,
    /// Whether a non-fallthrough edge points at this block
    is_target: bool,
}

impl Block {
    fn new(id: usize, insns: Vec<BlockInsn>) -> Self {
        Self {
            insns,
            id,
            jumps: BTreeMap::new(),
            is_target: false,
        }
    }

    /// Original position of the first input instruction of this block.
    ///
    /// Stable across later pseudo-instruction insertions, and the key
    /// other blocks' `jumps` use to name this block.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The instructions of this block, in execution order.
    #[inline]
    pub fn insns(&self) -> &[BlockInsn] {
        &self.insns
    }

    /// Outgoing edges: absolute target position to successor index in the
    /// block list. Fallthrough contributes an edge like any jump.
    #[inline]
    pub fn jumps(&self) -> &BTreeMap<usize, usize> {
        &self.jumps
    }

    /// Whether any non-fallthrough edge points at this block.
    #[inline]
    pub fn is_target(&self) -> bool {
        self.is_target
    }

    /// Insert an instruction at `index`, shifting the tail.
    pub(crate) fn insert(&mut self, index: usize, insn: BlockInsn) {
        self.insns.insert(index, insn);
    }

    /// Insert a run of instructions at the front, preserving their order.
    pub(crate) fn prepend(&mut self, prefix: Vec<BlockInsn>) {
        self.insns.splice(0..0, prefix);
    }
}

/// An edge waiting for its target block to be built.
struct PendingEdge {
    /// Index of the source block
    from: usize,
    /// Whether the edge is the source's fallthrough (skip of zero)
    fallthrough: bool,
}

/// Split a normalized instruction list into basic blocks.
///
/// Single pass over a map of pending targets, smallest first. Each target
/// yields one block; the block's outgoing skips queue further targets.
/// Instructions no pending target ever reaches are unreachable and are
/// dropped.
pub(crate) fn split_blocks(insns: Vec<BlockInsn>) -> CompileResult<Vec<Block>> {
    let mut pending: BTreeMap<usize, Vec<PendingEdge>> = BTreeMap::new();
    pending.insert(0, Vec::new());

    let mut blocks: Vec<Block> = Vec::new();

    while let Some((&start, _)) = pending.first_key_value() {
        // The next pending target bounds this block: nothing may jump
        // into the middle of the run we are about to form.
        let bound = pending
            .range(start + 1..)
            .next()
            .map(|(&target, _)| target)
            .unwrap_or(insns.len());

        // Scan forward to the first control transfer, or to the
        // instruction just before the bound.
        let mut end = start;
        while end < bound - 1 && !insns[end].insn.is_control_transfer() {
            end += 1;
        }
        let last = insns[end];
        let block_index = blocks.len();

        // Queue targets for every outgoing skip, in true-then-false order.
        let skips: [Option<u8>; 2] = match last.insn {
            Instruction::Jump { skip } => [Some(skip), None],
            Instruction::JumpIf { skip_true, skip_false, .. }
            | Instruction::JumpIfX { skip_true, skip_false, .. } => {
                [Some(skip_true), Some(skip_false)]
            }
            Instruction::RetA | Instruction::RetConstant { .. } => [None, None],
            // Cut short by the bound: plain fallthrough.
            _ => [Some(0), None],
        };
        for skip in skips.into_iter().flatten() {
            let target = end + 1 + skip as usize;
            if target >= insns.len() {
                return Err(CompileError::FlowsPastEnd { last: last.pos.unwrap_or(end) });
            }
            pending
                .entry(target)
                .or_default()
                .push(PendingEdge { from: block_index, fallthrough: skip == 0 });
        }

        // Resolve every edge waiting on this block.
        let mut block = Block::new(start, insns[start..=end].to_vec());
        for edge in pending.remove(&start).unwrap_or_default() {
            blocks[edge.from].jumps.insert(start, block_index);
            if !edge.fallthrough {
                block.is_target = true;
            }
        }
        blocks.push(block);
    }

    debug!("split {} instructions into {} blocks", insns.len(), blocks.len());
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use crate::bytecode::JumpCond;

    use super::*;

    fn wrap(insns: &[Instruction]) -> Vec<BlockInsn> {
        insns
            .iter()
            .enumerate()
            .map(|(pos, &insn)| BlockInsn::new(insn, pos))
            .collect()
    }

    fn positions(block: &Block) -> Vec<usize> {
        block.insns().iter().filter_map(|wrapped| wrapped.pos).collect()
    }

    #[test]
    fn single_return_is_one_block() {
        let blocks = split_blocks(wrap(&[Instruction::RetConstant { val: 0 }])).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id(), 0);
        assert!(!blocks[0].is_target());
        assert!(blocks[0].jumps().is_empty());
    }

    #[test]
    fn straight_line_run_is_one_block() {
        let blocks = split_blocks(wrap(&[
            Instruction::LoadAbsolute { off: 0, size: 4 },
            Instruction::AluOpConstant { op: crate::bytecode::AluOp::And, val: 0xff },
            Instruction::RetA,
        ]))
        .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(positions(&blocks[0]), vec![0, 1, 2]);
    }

    #[test]
    fn conditional_jump_makes_three_blocks() {
        let blocks = split_blocks(wrap(&[
            Instruction::JumpIf { cond: JumpCond::NotEqual, val: 1, skip_true: 1, skip_false: 0 },
            Instruction::RetConstant { val: 0 },
            Instruction::RetConstant { val: 1 },
        ]))
        .unwrap();
        assert_eq!(blocks.len(), 3);

        assert_eq!(positions(&blocks[0]), vec![0]);
        assert_eq!(positions(&blocks[1]), vec![1]);
        assert_eq!(positions(&blocks[2]), vec![2]);

        // skip_true -> 2 (explicit), skip_false -> 1 (fallthrough)
        assert_eq!(blocks[0].jumps().get(&1), Some(&1));
        assert_eq!(blocks[0].jumps().get(&2), Some(&2));
        assert!(!blocks[1].is_target());
        assert!(blocks[2].is_target());
    }

    #[test]
    fn two_jumps_share_a_target_block() {
        let blocks = split_blocks(wrap(&[
            Instruction::JumpIf { cond: JumpCond::Equal, val: 1, skip_true: 2, skip_false: 0 },
            Instruction::LoadConstant { dst: crate::bytecode::Register::A, val: 0 },
            Instruction::Jump { skip: 0 },
            Instruction::RetA,
        ]))
        .unwrap();
        // Blocks: [0], [1..2], [3]; both terminators target position 3.
        assert_eq!(blocks.len(), 3);
        assert_eq!(positions(&blocks[1]), vec![1, 2]);
        assert_eq!(blocks[0].jumps().get(&3), Some(&2));
        assert_eq!(blocks[1].jumps().get(&3), Some(&2));
        assert!(blocks[2].is_target());
    }

    #[test]
    fn fallthrough_into_jump_target_coexists() {
        // Position 2 is reached both by the explicit skip and by falling
        // out of position 1; the explicit edge flags it as a target.
        let blocks = split_blocks(wrap(&[
            Instruction::JumpIf { cond: JumpCond::Equal, val: 5, skip_true: 1, skip_false: 0 },
            Instruction::LoadConstant { dst: crate::bytecode::Register::A, val: 1 },
            Instruction::RetA,
        ]))
        .unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(positions(&blocks[1]), vec![1]);
        assert!(blocks[2].is_target());
        assert_eq!(blocks[1].jumps().get(&2), Some(&2));
        assert_eq!(blocks[0].jumps().get(&2), Some(&2));
        assert_eq!(blocks[0].jumps().get(&1), Some(&1));
    }

    #[test]
    fn degenerate_conditional_collapses_to_one_successor() {
        let blocks = split_blocks(wrap(&[
            Instruction::JumpIfX { cond: JumpCond::Equal, skip_true: 0, skip_false: 0 },
            Instruction::RetConstant { val: 0 },
        ]))
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].jumps().len(), 1);
        assert_eq!(blocks[0].jumps().get(&1), Some(&1));
        // Both edges are fallthroughs, so the successor is not a target.
        assert!(!blocks[1].is_target());
    }

    #[test]
    fn jump_past_end_rejected() {
        let result = split_blocks(wrap(&[
            Instruction::Jump { skip: 5 },
            Instruction::RetConstant { val: 0 },
        ]));
        assert_eq!(result, Err(CompileError::FlowsPastEnd { last: 0 }));
    }

    #[test]
    fn fallthrough_off_the_end_rejected() {
        let result = split_blocks(wrap(&[Instruction::LoadAbsolute { off: 0, size: 1 }]));
        assert_eq!(result, Err(CompileError::FlowsPastEnd { last: 0 }));
    }

    #[test]
    fn conditional_false_branch_past_end_rejected() {
        let result = split_blocks(wrap(&[
            Instruction::JumpIf { cond: JumpCond::Equal, val: 0, skip_true: 1, skip_false: 0 },
            Instruction::RetA,
        ]));
        // skip_true reaches 2, one past the last instruction.
        assert_eq!(result, Err(CompileError::FlowsPastEnd { last: 0 }));
    }

    #[test]
    fn unreachable_tail_is_dropped() {
        let blocks = split_blocks(wrap(&[
            Instruction::Jump { skip: 1 },
            Instruction::RetConstant { val: 7 },
            Instruction::RetConstant { val: 0 },
        ]))
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].id(), 0);
        assert_eq!(blocks[1].id(), 2);
    }

    #[test]
    fn edges_only_point_forward() {
        let blocks = split_blocks(wrap(&[
            Instruction::LoadAbsolute { off: 12, size: 2 },
            Instruction::JumpIf { cond: JumpCond::NotEqual, val: 0x800, skip_true: 2, skip_false: 0 },
            Instruction::LoadAbsolute { off: 23, size: 1 },
            Instruction::RetA,
            Instruction::RetConstant { val: 0 },
        ]))
        .unwrap();
        for (index, block) in blocks.iter().enumerate() {
            for (&target, &successor) in block.jumps() {
                assert!(successor > index);
                assert!(target > block.id());
                assert_eq!(blocks[successor].id(), target);
            }
        }
    }
}
