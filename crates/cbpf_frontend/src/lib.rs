//! Classic BPF Front-End for Extended BPF Code Generation
//!
//! This crate prepares classic BPF (cBPF) filter programs so that their
//! semantics can be faithfully re-expressed as extended BPF (eBPF)
//! acceptable to a strict in-kernel static verifier. The input is an
//! ordered sequence of cBPF instructions; the output is an ordered list
//! of basic blocks whose instruction stream has been rewritten with:
//!
//! - zero-initialization for any register or scratch cell read before
//!   being written,
//! - explicit packet-bounds guards preceding every packet load,
//! - divisor-non-zero guards preceding every division by X,
//! - normalized conditional jumps (always skip on the true branch),
//! - fully resolved forward jump edges between blocks.
//!
//! Encoding the blocks to eBPF bytes or C source is the job of a
//! downstream code generator; this crate stops at the block list.
//!
//! # Modules
//!
//! - [`bytecode`] - the cBPF instruction set, registers, and memory-effect
//!   summaries
//! - [`compiler`] - validation, control-flow reconstruction, and the
//!   dataflow passes that insert guards and initializers
//!
//! # Quick Start
//!
//! ```
//! use cbpf_frontend::{compile, Instruction};
//!
//! // Accept the packet if its EtherType is IPv4.
//! let blocks = compile(&[
//!     Instruction::LoadAbsolute { off: 12, size: 2 },
//!     Instruction::JumpIf {
//!         cond: cbpf_frontend::JumpCond::Equal,
//!         val: 0x0800,
//!         skip_true: 1,
//!         skip_false: 0,
//!     },
//!     Instruction::RetConstant { val: 0 },
//!     Instruction::RetConstant { val: 65535 },
//! ])
//! .expect("valid filter");
//!
//! // The packet load is now preceded by a bounds guard.
//! assert_eq!(
//!     blocks[0].insns()[0].insn,
//!     Instruction::PacketGuardAbsolute { len: 14 },
//! );
//! ```
//!
//! # Guarantees
//!
//! The transformation is pure, single-threaded, and deterministic:
//! identical input produces byte-identical output. No instruction is
//! reordered across a block boundary, and no guard is inserted where a
//! weaker one already dominates.

#![no_std]

extern crate alloc;

pub mod bytecode;
pub mod compiler;

pub use bytecode::{AluOp, BlockInsn, Effects, Instruction, JumpCond, MemSet, Register};
pub use compiler::{Block, CompileError, CompileResult, compile};
