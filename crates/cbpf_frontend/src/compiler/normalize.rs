//! Jump Normalization
//!
//! Downstream code generation handles the shapes "skip on true, else fall
//! through" and "skip on true, else skip". A conditional jump that only
//! uses its false branch is rewritten into the canonical form by swapping
//! the skips and complementing the condition:
//!
//! | skip-true | skip-false | action    |
//! |-----------|------------|-----------|
//! | 0         | 0          | unchanged |
//! | >0        | 0          | unchanged |
//! | >0        | >0         | unchanged |
//! | 0         | >0         | inverted  |

use core::mem;

use crate::bytecode::{BlockInsn, Instruction};

/// Rewrite false-branch-only conditional jumps into canonical form.
pub(crate) fn normalize_jumps(insns: &mut [BlockInsn]) {
    for wrapped in insns.iter_mut() {
        if let Instruction::JumpIf { cond, skip_true, skip_false, .. }
        | Instruction::JumpIfX { cond, skip_true, skip_false } = &mut wrapped.insn
        {
            if *skip_true == 0 && *skip_false > 0 {
                *cond = cond.negated();
                mem::swap(skip_true, skip_false);
            }
        }
    }
}
