//! Input Validation
//!
//! Rejects programs the rest of the pipeline cannot handle: empty
//! programs, instructions outside the supported classic BPF subset, and
//! instructions that fail their own self-consistency checks. Validation
//! never mutates the input.

use crate::bytecode::Instruction;
use crate::bytecode::registers::SCRATCH_CELLS;

use super::error::{CompileError, CompileResult};

/// Validate an input program.
pub(crate) fn validate(insns: &[Instruction]) -> CompileResult<()> {
    if insns.is_empty() {
        return Err(CompileError::EmptyProgram);
    }

    for (index, insn) in insns.iter().enumerate() {
        check_insn(insn, index)?;
    }

    Ok(())
}

fn check_insn(insn: &Instruction, index: usize) -> CompileResult<()> {
    // Pseudo-instructions are artifacts of this compiler; accepting them
    // as input would let them masquerade as jump targets.
    if insn.is_pseudo() {
        return Err(CompileError::UnsupportedOpcode { index });
    }

    match *insn {
        Instruction::LoadExtension { .. } | Instruction::Raw { .. } => {
            Err(CompileError::UnsupportedOpcode { index })
        }

        Instruction::LoadAbsolute { size, .. } | Instruction::LoadIndirect { size, .. }
            if !matches!(size, 1 | 2 | 4) =>
        {
            Err(CompileError::MalformedInstruction {
                index,
                reason: "load size must be 1, 2 or 4",
            })
        }

        Instruction::LoadScratch { n, .. } | Instruction::StoreScratch { n, .. }
            if n >= SCRATCH_CELLS =>
        {
            Err(CompileError::MalformedInstruction {
                index,
                reason: "scratch cell out of range",
            })
        }

        _ => Ok(()),
    }
}
