//! Bit tables for the dest, comp and jump fields of a compute instruction.
//!
//! The mnemonic sets are closed, so each field is an enum with a total
//! mapping to its bit pattern. Parsing a mnemonic outside the set is the
//! only way encoding can fail.

use core::str::FromStr;

use thiserror_no_std::Error;
use variant_count::VariantCount;

use crate::Word;

/// High bits shared by every compute instruction.
pub const COMPUTE_PREFIX: Word = 0b111 << 13;

/// Mnemonic used in listings for an absent dest or jump field.
pub const NULL_MNEMONIC: &str = "null";

const COMP_SHIFT: u32 = 6;
const DEST_SHIFT: u32 = 3;
const FIELD3_MASK: Word = 0b111;
const COMP_MASK: Word = 0b111_1111;
const ADDRESS_BIT: Word = 1 << 15;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("unknown dest mnemonic `{0}`")]
    UnknownDest(String),
    #[error("unknown comp mnemonic `{0}`")]
    UnknownComp(String),
    #[error("unknown jump mnemonic `{0}`")]
    UnknownJump(String),
    #[error("word {0:#06x} is not a compute instruction")]
    NotComputeInstruction(Word),
    #[error("word {0:#06x} has no comp mnemonic")]
    InvalidCompBits(Word),
}

#[allow(clippy::upper_case_acronyms)]
#[derive(VariantCount, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dest {
    Null,
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

impl Dest {
    pub const ALL: [Dest; Dest::VARIANT_COUNT] = [
        Dest::Null,
        Dest::M,
        Dest::D,
        Dest::MD,
        Dest::A,
        Dest::AM,
        Dest::AD,
        Dest::AMD,
    ];

    pub fn bits(self) -> Word {
        match self {
            Dest::Null => 0b000,
            Dest::M => 0b001,
            Dest::D => 0b010,
            Dest::MD => 0b011,
            Dest::A => 0b100,
            Dest::AM => 0b101,
            Dest::AD => 0b110,
            Dest::AMD => 0b111,
        }
    }

    pub fn from_bits(bits: Word) -> Option<Self> {
        Self::ALL.into_iter().find(|dest| dest.bits() == bits)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Dest::Null => NULL_MNEMONIC,
            Dest::M => "M",
            Dest::D => "D",
            Dest::MD => "MD",
            Dest::A => "A",
            Dest::AM => "AM",
            Dest::AD => "AD",
            Dest::AMD => "AMD",
        }
    }

    /// Absent field (`None`) maps to `Dest::Null`.
    pub fn parse(mnemonic: Option<&str>) -> Result<Self, CodeError> {
        match mnemonic {
            None => Ok(Dest::Null),
            Some(mnemonic) => mnemonic.parse(),
        }
    }

    pub fn writes_a(self) -> bool {
        self.bits() & 0b100 != 0
    }

    pub fn writes_d(self) -> bool {
        self.bits() & 0b010 != 0
    }

    pub fn writes_m(self) -> bool {
        self.bits() & 0b001 != 0
    }
}

impl FromStr for Dest {
    type Err = CodeError;

    fn from_str(mnemonic: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .filter(|dest| *dest != Dest::Null)
            .find(|dest| dest.mnemonic() == mnemonic)
            .ok_or_else(|| CodeError::UnknownDest(mnemonic.to_string()))
    }
}

/// Computations of the ALU. The first 18 read the `A` register, the
/// last 10 read `M` (the memory word addressed by `A`) and set the `a` bit.
#[derive(VariantCount, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comp {
    Zero,
    One,
    MinusOne,
    D,
    A,
    NotD,
    NotA,
    NegD,
    NegA,
    DPlusOne,
    APlusOne,
    DMinusOne,
    AMinusOne,
    DPlusA,
    DMinusA,
    AMinusD,
    DAndA,
    DOrA,
    M,
    NotM,
    NegM,
    MPlusOne,
    MMinusOne,
    DPlusM,
    DMinusM,
    MMinusD,
    DAndM,
    DOrM,
}

impl Comp {
    pub const ALL: [Comp; Comp::VARIANT_COUNT] = [
        Comp::Zero,
        Comp::One,
        Comp::MinusOne,
        Comp::D,
        Comp::A,
        Comp::NotD,
        Comp::NotA,
        Comp::NegD,
        Comp::NegA,
        Comp::DPlusOne,
        Comp::APlusOne,
        Comp::DMinusOne,
        Comp::AMinusOne,
        Comp::DPlusA,
        Comp::DMinusA,
        Comp::AMinusD,
        Comp::DAndA,
        Comp::DOrA,
        Comp::M,
        Comp::NotM,
        Comp::NegM,
        Comp::MPlusOne,
        Comp::MMinusOne,
        Comp::DPlusM,
        Comp::DMinusM,
        Comp::MMinusD,
        Comp::DAndM,
        Comp::DOrM,
    ];

    /// The 7-bit field, `a` bit first.
    pub fn bits(self) -> Word {
        match self {
            Comp::Zero => 0b0101010,
            Comp::One => 0b0111111,
            Comp::MinusOne => 0b0111010,
            Comp::D => 0b0001100,
            Comp::A => 0b0110000,
            Comp::NotD => 0b0001101,
            Comp::NotA => 0b0110001,
            Comp::NegD => 0b0001111,
            Comp::NegA => 0b0110011,
            Comp::DPlusOne => 0b0011111,
            Comp::APlusOne => 0b0110111,
            Comp::DMinusOne => 0b0001110,
            Comp::AMinusOne => 0b0110010,
            Comp::DPlusA => 0b0000010,
            Comp::DMinusA => 0b0010011,
            Comp::AMinusD => 0b0000111,
            Comp::DAndA => 0b0000000,
            Comp::DOrA => 0b0010101,
            Comp::M => 0b1110000,
            Comp::NotM => 0b1110001,
            Comp::NegM => 0b1110011,
            Comp::MPlusOne => 0b1110111,
            Comp::MMinusOne => 0b1110010,
            Comp::DPlusM => 0b1000010,
            Comp::DMinusM => 0b1010011,
            Comp::MMinusD => 0b1000111,
            Comp::DAndM => 0b1000000,
            Comp::DOrM => 0b1010101,
        }
    }

    pub fn from_bits(bits: Word) -> Option<Self> {
        Self::ALL.into_iter().find(|comp| comp.bits() == bits)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Comp::Zero => "0",
            Comp::One => "1",
            Comp::MinusOne => "-1",
            Comp::D => "D",
            Comp::A => "A",
            Comp::NotD => "!D",
            Comp::NotA => "!A",
            Comp::NegD => "-D",
            Comp::NegA => "-A",
            Comp::DPlusOne => "D+1",
            Comp::APlusOne => "A+1",
            Comp::DMinusOne => "D-1",
            Comp::AMinusOne => "A-1",
            Comp::DPlusA => "D+A",
            Comp::DMinusA => "D-A",
            Comp::AMinusD => "A-D",
            Comp::DAndA => "D&A",
            Comp::DOrA => "D|A",
            Comp::M => "M",
            Comp::NotM => "!M",
            Comp::NegM => "-M",
            Comp::MPlusOne => "M+1",
            Comp::MMinusOne => "M-1",
            Comp::DPlusM => "D+M",
            Comp::DMinusM => "D-M",
            Comp::MMinusD => "M-D",
            Comp::DAndM => "D&M",
            Comp::DOrM => "D|M",
        }
    }

    /// True when the computation reads memory instead of `A`.
    pub fn reads_memory(self) -> bool {
        self.bits() & 0b1000000 != 0
    }
}

impl FromStr for Comp {
    type Err = CodeError;

    fn from_str(mnemonic: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|comp| comp.mnemonic() == mnemonic)
            .ok_or_else(|| CodeError::UnknownComp(mnemonic.to_string()))
    }
}

#[derive(VariantCount, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Jump {
    Null,
    Jgt,
    Jeq,
    Jge,
    Jlt,
    Jne,
    Jle,
    Jmp,
}

impl Jump {
    pub const ALL: [Jump; Jump::VARIANT_COUNT] = [
        Jump::Null,
        Jump::Jgt,
        Jump::Jeq,
        Jump::Jge,
        Jump::Jlt,
        Jump::Jne,
        Jump::Jle,
        Jump::Jmp,
    ];

    pub fn bits(self) -> Word {
        match self {
            Jump::Null => 0b000,
            Jump::Jgt => 0b001,
            Jump::Jeq => 0b010,
            Jump::Jge => 0b011,
            Jump::Jlt => 0b100,
            Jump::Jne => 0b101,
            Jump::Jle => 0b110,
            Jump::Jmp => 0b111,
        }
    }

    pub fn from_bits(bits: Word) -> Option<Self> {
        Self::ALL.into_iter().find(|jump| jump.bits() == bits)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Jump::Null => NULL_MNEMONIC,
            Jump::Jgt => "JGT",
            Jump::Jeq => "JEQ",
            Jump::Jge => "JGE",
            Jump::Jlt => "JLT",
            Jump::Jne => "JNE",
            Jump::Jle => "JLE",
            Jump::Jmp => "JMP",
        }
    }

    /// Absent field (`None`) maps to `Jump::Null`.
    pub fn parse(mnemonic: Option<&str>) -> Result<Self, CodeError> {
        match mnemonic {
            None => Ok(Jump::Null),
            Some(mnemonic) => mnemonic.parse(),
        }
    }

    /// Whether the jump is taken for an ALU result, read as two's complement.
    pub fn taken(self, value: Word) -> bool {
        let value = value as i16;
        match self {
            Jump::Null => false,
            Jump::Jgt => value > 0,
            Jump::Jeq => value == 0,
            Jump::Jge => value >= 0,
            Jump::Jlt => value < 0,
            Jump::Jne => value != 0,
            Jump::Jle => value <= 0,
            Jump::Jmp => true,
        }
    }
}

impl FromStr for Jump {
    type Err = CodeError;

    fn from_str(mnemonic: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .filter(|jump| *jump != Jump::Null)
            .find(|jump| jump.mnemonic() == mnemonic)
            .ok_or_else(|| CodeError::UnknownJump(mnemonic.to_string()))
    }
}

/// A decoded machine word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Address(Word),
    Compute { dest: Dest, comp: Comp, jump: Jump },
}

impl Instruction {
    pub fn encode(&self) -> Word {
        match *self {
            Instruction::Address(value) => value & !ADDRESS_BIT,
            Instruction::Compute { dest, comp, jump } => encode_compute(dest, comp, jump),
        }
    }

    pub fn decode(word: Word) -> Result<Self, CodeError> {
        if word & ADDRESS_BIT == 0 {
            return Ok(Instruction::Address(word));
        }
        if word & COMPUTE_PREFIX != COMPUTE_PREFIX {
            return Err(CodeError::NotComputeInstruction(word));
        }
        let comp = Comp::from_bits((word >> COMP_SHIFT) & COMP_MASK)
            .ok_or(CodeError::InvalidCompBits(word))?;
        // Three bit fields always map.
        let dest = Dest::from_bits((word >> DEST_SHIFT) & FIELD3_MASK).unwrap_or(Dest::Null);
        let jump = Jump::from_bits(word & FIELD3_MASK).unwrap_or(Jump::Null);
        Ok(Instruction::Compute { dest, comp, jump })
    }
}

pub fn encode_compute(dest: Dest, comp: Comp, jump: Jump) -> Word {
    COMPUTE_PREFIX | (comp.bits() << COMP_SHIFT) | (dest.bits() << DEST_SHIFT) | jump.bits()
}

/// Look up all three mnemonics of a compute command and encode them.
pub fn encode_mnemonics(
    dest: Option<&str>,
    comp: &str,
    jump: Option<&str>,
) -> Result<Word, CodeError> {
    let comp: Comp = comp.parse()?;
    let dest = Dest::parse(dest)?;
    let jump = Jump::parse(jump)?;
    Ok(encode_compute(dest, comp, jump))
}

#[cfg(test)]
mod test;
