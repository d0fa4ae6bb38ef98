//! Memory-Effects Oracle
//!
//! Shared read/write summaries per opcode, consumed by the dataflow
//! passes. "Memory" here means the register file and the scratch cells;
//! packet reads are bounds-checked by the packet-guard pass and do not
//! participate in these summaries. In particular `LoadMemShift` reads the
//! packet but has an empty read set.

use bitflags::bitflags;

use super::insn::Instruction;
use super::registers::Register;

bitflags! {
    /// A set of memory cells: the two working registers plus the sixteen
    /// scratch cells.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemSet: u32 {
        /// Scratch cell M[0]
        const M0 = 1 << 0;
        /// Scratch cell M[1]
        const M1 = 1 << 1;
        /// Scratch cell M[2]
        const M2 = 1 << 2;
        /// Scratch cell M[3]
        const M3 = 1 << 3;
        /// Scratch cell M[4]
        const M4 = 1 << 4;
        /// Scratch cell M[5]
        const M5 = 1 << 5;
        /// Scratch cell M[6]
        const M6 = 1 << 6;
        /// Scratch cell M[7]
        const M7 = 1 << 7;
        /// Scratch cell M[8]
        const M8 = 1 << 8;
        /// Scratch cell M[9]
        const M9 = 1 << 9;
        /// Scratch cell M[10]
        const M10 = 1 << 10;
        /// Scratch cell M[11]
        const M11 = 1 << 11;
        /// Scratch cell M[12]
        const M12 = 1 << 12;
        /// Scratch cell M[13]
        const M13 = 1 << 13;
        /// Scratch cell M[14]
        const M14 = 1 << 14;
        /// Scratch cell M[15]
        const M15 = 1 << 15;
        /// Accumulator
        const A = 1 << 16;
        /// Index register
        const X = 1 << 17;
    }
}

impl MemSet {
    /// The cell backing a working register.
    #[inline]
    pub const fn reg(reg: Register) -> Self {
        match reg {
            Register::A => Self::A,
            Register::X => Self::X,
        }
    }

    /// The cell backing scratch slot `n`.
    ///
    /// Out-of-range slots map to the empty set; the validator rejects them
    /// before any pass consults the oracle.
    #[inline]
    pub const fn scratch(n: u32) -> Self {
        if n < 16 {
            Self::from_bits_truncate(1 << n)
        } else {
            Self::empty()
        }
    }
}

/// Read/write summary of a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effects {
    /// Cells the instruction reads
    pub reads: MemSet,
    /// Cells the instruction writes
    pub writes: MemSet,
}

impl Effects {
    const NONE: Self = Self {
        reads: MemSet::empty(),
        writes: MemSet::empty(),
    };

    const fn reads(reads: MemSet) -> Self {
        Self { reads, writes: MemSet::empty() }
    }

    const fn writes(writes: MemSet) -> Self {
        Self { reads: MemSet::empty(), writes }
    }

    const fn reads_writes(reads: MemSet, writes: MemSet) -> Self {
        Self { reads, writes }
    }
}

impl Instruction {
    /// The memory cells this instruction reads and writes.
    pub fn effects(&self) -> Effects {
        match *self {
            Self::LoadAbsolute { .. } => Effects::writes(MemSet::A),
            Self::LoadIndirect { .. } => Effects::reads_writes(MemSet::X, MemSet::A),
            Self::LoadMemShift { .. } => Effects::writes(MemSet::X),
            Self::LoadConstant { dst, .. } => Effects::writes(MemSet::reg(dst)),
            Self::LoadScratch { dst, n } => {
                Effects::reads_writes(MemSet::scratch(n), MemSet::reg(dst))
            }
            Self::StoreScratch { src, n } => {
                Effects::reads_writes(MemSet::reg(src), MemSet::scratch(n))
            }
            Self::AluOpConstant { .. } => Effects::reads_writes(MemSet::A, MemSet::A),
            Self::AluOpX { .. } => {
                Effects::reads_writes(MemSet::A.union(MemSet::X), MemSet::A)
            }
            Self::NegateA => Effects::reads_writes(MemSet::A, MemSet::A),
            Self::Tax => Effects::reads_writes(MemSet::A, MemSet::X),
            Self::Txa => Effects::reads_writes(MemSet::X, MemSet::A),
            Self::Jump { .. } => Effects::NONE,
            Self::JumpIf { .. } => Effects::reads(MemSet::A),
            Self::JumpIfX { .. } => Effects::reads(MemSet::A.union(MemSet::X)),
            Self::RetA => Effects::reads(MemSet::A),
            Self::RetConstant { .. } => Effects::NONE,
            // Rejected by the validator; nothing downstream sees these.
            Self::LoadExtension { .. } | Self::Raw { .. } => Effects::NONE,
            Self::PacketGuardAbsolute { .. } => Effects::NONE,
            Self::PacketGuardIndirect { .. } => Effects::reads(MemSet::X),
            Self::InitializeScratch { n } => Effects::writes(MemSet::scratch(n)),
            Self::CheckXNotZero => Effects::reads(MemSet::X),
        }
    }

    /// Check if this instruction clobbers X.
    #[inline]
    pub fn writes_x(&self) -> bool {
        self.effects().writes.contains(MemSet::X)
    }
}
