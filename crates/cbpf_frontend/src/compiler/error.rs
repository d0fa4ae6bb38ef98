//! Compilation Errors
//!
//! Every failure is synchronous and aborts the whole compile call; no
//! partial block list is ever produced and nothing is retried.

use thiserror::Error;

/// Errors that can occur while preparing a classic BPF program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The input program contains no instructions.
    #[error("program contains no instructions")]
    EmptyProgram,

    /// The instruction at `index` is not part of the supported classic
    /// BPF subset (extension load, raw instruction, or a stray
    /// pseudo-instruction).
    #[error("unsupported instruction at {index}")]
    UnsupportedOpcode {
        /// Position of the offending instruction
        index: usize,
    },

    /// The instruction at `index` failed its self-consistency check.
    #[error("malformed instruction at {index}: {reason}")]
    MalformedInstruction {
        /// Position of the offending instruction
        index: usize,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Control flow leaves the program other than through a return.
    #[error("instruction {last} flows past the end of the program")]
    FlowsPastEnd {
        /// Position of the last instruction of the offending block
        last: usize,
    },

    /// Division or modulo by the constant zero.
    #[error("division by zero at {index}")]
    StaticDivideByZero {
        /// Position of the offending instruction
        index: usize,
    },
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
