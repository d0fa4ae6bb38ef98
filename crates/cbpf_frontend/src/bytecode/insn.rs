//! Classic BPF Instruction Format
//!
//! Instructions are modeled as a value-typed union rather than the raw
//! `sock_filter` encoding:
//!
//! ```text
//! +--------+------+------+-----------+
//! |  code  |  jt  |  jf  |     k     |
//! | 16 bit | 8bit | 8bit |  32 bits  |
//! +--------+------+------+-----------+
//! ```
//!
//! The raw form survives only as [`Instruction::Raw`], which the compiler
//! rejects. Four pseudo-instructions extend the classic set; they are
//! produced by the analysis passes and consumed by code generators, and
//! never appear in input programs.
//!
//! Conditional jumps carry two unsigned skips. A skip is added to the
//! position *following* the jump to obtain the absolute target; a skip of
//! zero falls through.

use core::fmt;

use super::opcode::{AluOp, JumpCond};
use super::registers::Register;

/// A single classic BPF instruction, or one of the pseudo-instructions
/// introduced by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Load `size` bytes of packet data at absolute offset `off` into A.
    LoadAbsolute {
        /// Byte offset into the packet
        off: u32,
        /// Load width: 1, 2 or 4 bytes
        size: u32,
    },

    /// Load `size` bytes of packet data at offset `X + off` into A.
    LoadIndirect {
        /// Byte offset added to X
        off: u32,
        /// Load width: 1, 2 or 4 bytes
        size: u32,
    },

    /// Load the low nibble of the packet byte at `off`, times four, into X.
    ///
    /// This is the classic idiom for fetching an IPv4 header length.
    LoadMemShift {
        /// Byte offset into the packet
        off: u32,
    },

    /// Load the constant `val` into `dst`.
    LoadConstant {
        /// Destination register
        dst: Register,
        /// Constant value
        val: u32,
    },

    /// Load scratch cell `M[n]` into `dst`.
    LoadScratch {
        /// Destination register
        dst: Register,
        /// Scratch cell index, < 16
        n: u32,
    },

    /// Store `src` into scratch cell `M[n]`.
    StoreScratch {
        /// Source register
        src: Register,
        /// Scratch cell index, < 16
        n: u32,
    },

    /// ALU operation with a constant right-hand side: `A = A op val`.
    AluOpConstant {
        /// Operation
        op: AluOp,
        /// Constant operand
        val: u32,
    },

    /// ALU operation with X as the right-hand side: `A = A op X`.
    AluOpX {
        /// Operation
        op: AluOp,
    },

    /// Negate the accumulator: `A = -A`.
    NegateA,

    /// Copy A into X.
    Tax,

    /// Copy X into A.
    Txa,

    /// Unconditional jump.
    Jump {
        /// Unsigned displacement from the next instruction
        skip: u8,
    },

    /// Conditional jump comparing A against a constant.
    JumpIf {
        /// Comparison
        cond: JumpCond,
        /// Constant right-hand side
        val: u32,
        /// Displacement taken when the condition holds
        skip_true: u8,
        /// Displacement taken when it does not
        skip_false: u8,
    },

    /// Conditional jump comparing A against X.
    JumpIfX {
        /// Comparison
        cond: JumpCond,
        /// Displacement taken when the condition holds
        skip_true: u8,
        /// Displacement taken when it does not
        skip_false: u8,
    },

    /// Return the accumulator as the filter result.
    RetA,

    /// Return a constant filter result.
    RetConstant {
        /// Return value
        val: u32,
    },

    /// Load from an ancillary-data extension. Not supported; rejected by
    /// the validator.
    LoadExtension {
        /// Raw extension number
        ext: u32,
    },

    /// An undecoded instruction. Not supported; rejected by the validator.
    Raw {
        /// Raw opcode
        code: u16,
        /// Raw true-branch skip
        jt: u8,
        /// Raw false-branch skip
        jf: u8,
        /// Raw operand
        k: u32,
    },

    /// Pseudo: return no-match unless `packet_length >= len`.
    PacketGuardAbsolute {
        /// Required packet length in bytes
        len: u64,
    },

    /// Pseudo: return no-match unless `packet_length >= X + len`,
    /// treating overflow of `X + len` as failure.
    PacketGuardIndirect {
        /// Required packet length in bytes beyond X
        len: u64,
    },

    /// Pseudo: set scratch cell `M[n]` to zero.
    InitializeScratch {
        /// Scratch cell index, < 16
        n: u32,
    },

    /// Pseudo: return no-match if X is zero.
    CheckXNotZero,
}

impl Instruction {
    /// Check if this instruction transfers control non-sequentially.
    ///
    /// Control-transfer instructions terminate a basic block.
    #[inline]
    pub const fn is_control_transfer(&self) -> bool {
        matches!(
            self,
            Self::Jump { .. }
                | Self::JumpIf { .. }
                | Self::JumpIfX { .. }
                | Self::RetA
                | Self::RetConstant { .. }
        )
    }

    /// Check if this instruction returns from the filter.
    #[inline]
    pub const fn is_return(&self) -> bool {
        matches!(self, Self::RetA | Self::RetConstant { .. })
    }

    /// Check if this is one of the pseudo-instructions introduced by the
    /// compiler.
    #[inline]
    pub const fn is_pseudo(&self) -> bool {
        matches!(
            self,
            Self::PacketGuardAbsolute { .. }
                | Self::PacketGuardIndirect { .. }
                | Self::InitializeScratch { .. }
                | Self::CheckXNotZero
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Mnemonics follow the classic BPF assembler; pseudo-instructions
        // get a readable spelling of their guard condition.
        let size_mnemonic = |size: u32| match size {
            1 => "ldb",
            2 => "ldh",
            _ => "ld",
        };

        match *self {
            Self::LoadAbsolute { off, size } => {
                write!(f, "{} [{}]", size_mnemonic(size), off)
            }
            Self::LoadIndirect { off, size } => {
                write!(f, "{} [x + {}]", size_mnemonic(size), off)
            }
            Self::LoadMemShift { off } => write!(f, "ldx 4*([{}]&0xf)", off),
            Self::LoadConstant { dst: Register::A, val } => write!(f, "ld #{}", val),
            Self::LoadConstant { dst: Register::X, val } => write!(f, "ldx #{}", val),
            Self::LoadScratch { dst: Register::A, n } => write!(f, "ld M[{}]", n),
            Self::LoadScratch { dst: Register::X, n } => write!(f, "ldx M[{}]", n),
            Self::StoreScratch { src: Register::A, n } => write!(f, "st M[{}]", n),
            Self::StoreScratch { src: Register::X, n } => write!(f, "stx M[{}]", n),
            Self::AluOpConstant { op, val } => write!(f, "{} #{}", op, val),
            Self::AluOpX { op } => write!(f, "{} x", op),
            Self::NegateA => write!(f, "neg"),
            Self::Tax => write!(f, "tax"),
            Self::Txa => write!(f, "txa"),
            Self::Jump { skip } => write!(f, "ja +{}", skip),
            Self::JumpIf { cond, val, skip_true, skip_false } => {
                write!(f, "{} #{},{},{}", cond, val, skip_true, skip_false)
            }
            Self::JumpIfX { cond, skip_true, skip_false } => {
                write!(f, "{} x,{},{}", cond, skip_true, skip_false)
            }
            Self::RetA => write!(f, "ret a"),
            Self::RetConstant { val } => write!(f, "ret #{}", val),
            Self::LoadExtension { ext } => write!(f, "ld extension[{}]", ext),
            Self::Raw { code, jt, jf, k } => {
                write!(f, "raw code={:#06x} jt={} jf={} k={}", code, jt, jf, k)
            }
            Self::PacketGuardAbsolute { len } => write!(f, "guard pkt >= {}", len),
            Self::PacketGuardIndirect { len } => write!(f, "guard pkt >= x+{}", len),
            Self::InitializeScratch { n } => write!(f, "init M[{}]", n),
            Self::CheckXNotZero => write!(f, "guard x != 0"),
        }
    }
}

/// An instruction as it appears inside a basic block.
///
/// Input instructions carry their original 0-based position, which is the
/// identity used to resolve jump edges. Instructions inserted by the
/// analysis passes carry no position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInsn {
    /// The instruction
    pub insn: Instruction,
    /// Original position in the input program, if any
    pub pos: Option<usize>,
}

impl BlockInsn {
    /// Wrap an input instruction with its original position.
    #[inline]
    pub const fn new(insn: Instruction, pos: usize) -> Self {
        Self { insn, pos: Some(pos) }
    }

    /// Wrap an instruction inserted by an analysis pass.
    #[inline]
    pub const fn pseudo(insn: Instruction) -> Self {
        Self { insn, pos: None }
    }
}

impl fmt::Display for BlockInsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{:3}: {}", pos, self.insn),
            None => write!(f, "   : {}", self.insn),
        }
    }
}
