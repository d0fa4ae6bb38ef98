//! Filter Compilation Pipeline
//!
//! Prepares a classic BPF program for re-expression as an extended BPF
//! program acceptable to a strict static verifier:
//!
//! ```text
//!  instructions
//!       │
//!  ┌────▼─────────┐  reject empty / unsupported / malformed input
//!  │  validate    │
//!  └────┬─────────┘
//!  ┌────▼─────────┐  tag every instruction with its original position
//!  │  wrap        │
//!  └────┬─────────┘
//!  ┌────▼─────────┐  canonicalize false-branch-only conditionals
//!  │  normalize   │
//!  └────┬─────────┘
//!  ┌────▼─────────┐  rebuild the control flow graph as basic blocks
//!  │  split       │
//!  └────┬─────────┘
//!  ┌────▼─────────┐  zero-init cells read before written
//!  │  initialize  │
//!  └────┬─────────┘
//!  ┌────▼─────────┐  reject /0, guard division by X
//!  │  div guards  │
//!  └────┬─────────┘
//!  ┌────▼─────────┐  prove packet bounds for every load
//!  │  pkt guards  │
//!  └────┬─────────┘
//!       ▼
//!   block list
//! ```
//!
//! Skips are unsigned, so every edge points forward and the block list
//! comes out topologically ordered; each analysis is a single forward
//! sweep. The whole transformation is pure, deterministic and
//! synchronous: on any error the caller receives no block list at all.

mod block;
mod div_guard;
mod error;
mod init;
mod normalize;
mod packet_guard;
mod validate;

pub use block::Block;
pub use error::{CompileError, CompileResult};

use alloc::vec::Vec;

use log::debug;

use crate::bytecode::{BlockInsn, Instruction};

/// Compile a classic BPF program into an ordered basic-block list ready
/// for code generation.
///
/// The returned blocks are topologically ordered, every jump edge is
/// resolved, and guard and initializer pseudo-instructions have been
/// inserted wherever the verifier would otherwise reject the program.
///
/// # Errors
///
/// Returns an error if the program is empty, contains unsupported or
/// malformed instructions, lets control flow past its end, or divides by
/// a constant zero.
pub fn compile(insns: &[Instruction]) -> CompileResult<Vec<Block>> {
    validate::validate(insns)?;

    let mut wrapped: Vec<BlockInsn> = insns
        .iter()
        .enumerate()
        .map(|(pos, &insn)| BlockInsn::new(insn, pos))
        .collect();

    normalize::normalize_jumps(&mut wrapped);

    let mut blocks = block::split_blocks(wrapped)?;

    init::initialize_memory(&mut blocks);
    div_guard::add_divide_guards(&mut blocks)?;
    packet_guard::add_absolute_packet_guards(&mut blocks);
    packet_guard::add_indirect_packet_guards(&mut blocks);

    debug!("compiled {} instructions into {} blocks", insns.len(), blocks.len());
    Ok(blocks)
}
