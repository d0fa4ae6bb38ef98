//! Division-by-Zero Guards
//!
//! Division or modulo by a constant zero can never succeed and is
//! rejected outright. Division by X is guarded: unless X is already known
//! to be non-zero on every path into the instruction, a `CheckXNotZero`
//! is inserted immediately before it. The marker short-circuits the
//! program to a no-match return when X is zero and adds no control-flow
//! edges.
//!
//! "X known non-zero" is a per-block boolean propagated forward with AND
//! on merge. A `CheckXNotZero` establishes it; any write to X clears it.

use alloc::vec;
use alloc::vec::Vec;

use log::trace;

use crate::bytecode::{BlockInsn, Instruction};

use super::block::Block;
use super::error::{CompileError, CompileResult};

/// Guard every division by X and reject constant division by zero.
pub(crate) fn add_divide_guards(blocks: &mut [Block]) -> CompileResult<()> {
    let mut entry_states: Vec<Option<bool>> = vec![None; blocks.len()];
    entry_states[0] = Some(false);

    for index in 0..blocks.len() {
        let mut known_nonzero = entry_states[index].unwrap_or(false);

        let mut at = 0;
        while at < blocks[index].insns().len() {
            let wrapped = blocks[index].insns()[at];
            match wrapped.insn {
                Instruction::AluOpConstant { op, val } if op.can_divide_by_zero() && val == 0 => {
                    return Err(CompileError::StaticDivideByZero {
                        index: wrapped.pos.unwrap_or(blocks[index].id()),
                    });
                }
                Instruction::AluOpX { op } if op.can_divide_by_zero() && !known_nonzero => {
                    trace!("guarding {} at {:?}", wrapped.insn, wrapped.pos);
                    blocks[index].insert(at, BlockInsn::pseudo(Instruction::CheckXNotZero));
                    known_nonzero = true;
                    at += 1;
                }
                Instruction::CheckXNotZero => known_nonzero = true,
                _ => {}
            }
            if wrapped.insn.writes_x() {
                known_nonzero = false;
            }
            at += 1;
        }

        for &successor in blocks[index].jumps().values() {
            entry_states[successor] = Some(match entry_states[successor] {
                Some(existing) => existing && known_nonzero,
                None => known_nonzero,
            });
        }
    }

    Ok(())
}
