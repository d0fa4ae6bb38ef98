//! Classic BPF Bytecode Model
//!
//! This module implements the classic BPF instruction set as consumed by
//! the compiler:
//!
//! - Two working registers (A, X) and sixteen scratch cells
//! - Value-typed instructions, forward-only jumps with 8-bit skips
//! - Four pseudo-instructions produced by the analysis passes
//! - Per-opcode memory-effect summaries shared by the dataflow passes

pub mod effects;
pub mod insn;
pub mod opcode;
pub mod registers;

pub use effects::{Effects, MemSet};
pub use insn::{BlockInsn, Instruction};
pub use opcode::{AluOp, JumpCond};
pub use registers::{Register, SCRATCH_CELLS};
