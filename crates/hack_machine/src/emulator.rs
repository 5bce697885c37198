//! Reference CPU used to execute assembled programs in tests.
//!
//! The machine has separate instruction and data memories, the `A` and `D`
//! registers and a program counter. Memory mapped devices are plain RAM.

use thiserror_no_std::Error;

use crate::code::{Comp, Instruction};
use crate::{RAM_SIZE, ROM_SIZE, Word};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error("program counter {0} is outside the loaded program")]
    ProgramCounterOutOfBounds(Word),
    #[error("word {word:#06x} at {pc} is not a valid instruction")]
    InvalidInstruction { pc: Word, word: Word },
    #[error("did not reach {target} within {steps} steps")]
    StepLimitExceeded { target: Word, steps: usize },
    #[error("program of {0} words does not fit in ROM")]
    ProgramTooLarge(usize),
}

pub struct Computer {
    rom: Vec<Word>,
    ram: Vec<Word>,
    a: Word,
    d: Word,
    pc: Word,
}

impl Computer {
    pub fn new(rom: Vec<Word>) -> Result<Self, MachineError> {
        if rom.len() > ROM_SIZE {
            return Err(MachineError::ProgramTooLarge(rom.len()));
        }
        Ok(Self {
            rom,
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
        })
    }

    pub fn a(&self) -> Word {
        self.a
    }

    pub fn d(&self) -> Word {
        self.d
    }

    pub fn pc(&self) -> Word {
        self.pc
    }

    pub fn ram(&self) -> &[Word] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [Word] {
        &mut self.ram
    }

    /// Out of range addresses read as zero.
    pub fn peek(&self, address: Word) -> Word {
        self.ram.get(usize::from(address)).copied().unwrap_or(0)
    }

    /// Out of range addresses are ignored.
    pub fn poke(&mut self, address: Word, value: Word) {
        if let Some(slot) = self.ram.get_mut(usize::from(address)) {
            *slot = value;
        }
    }

    /// Execute the instruction at the program counter.
    pub fn step(&mut self) -> Result<(), MachineError> {
        let pc = self.pc;
        let word = self
            .rom
            .get(usize::from(pc))
            .copied()
            .ok_or(MachineError::ProgramCounterOutOfBounds(pc))?;
        let instruction =
            Instruction::decode(word).map_err(|_| MachineError::InvalidInstruction { pc, word })?;

        match instruction {
            Instruction::Address(value) => {
                self.a = value;
                self.pc = pc.wrapping_add(1);
            }
            Instruction::Compute { dest, comp, jump } => {
                // M and the jump target both use A as it was before this instruction.
                let address = self.a;
                let value = self.alu(comp, address);
                if dest.writes_m() {
                    self.poke(address, value);
                }
                if dest.writes_a() {
                    self.a = value;
                }
                if dest.writes_d() {
                    self.d = value;
                }
                self.pc = if jump.taken(value) {
                    address
                } else {
                    pc.wrapping_add(1)
                };
            }
        }
        Ok(())
    }

    /// Step until the program counter equals `target`.
    pub fn run_until(&mut self, target: Word, max_steps: usize) -> Result<usize, MachineError> {
        for steps in 0..max_steps {
            if self.pc == target {
                return Ok(steps);
            }
            self.step()?;
        }
        if self.pc == target {
            return Ok(max_steps);
        }
        Err(MachineError::StepLimitExceeded {
            target,
            steps: max_steps,
        })
    }

    fn alu(&self, comp: Comp, address: Word) -> Word {
        let d = self.d;
        let a = self.a;
        let m = self.peek(address);
        match comp {
            Comp::Zero => 0,
            Comp::One => 1,
            Comp::MinusOne => Word::MAX,
            Comp::D => d,
            Comp::A => a,
            Comp::M => m,
            Comp::NotD => !d,
            Comp::NotA => !a,
            Comp::NotM => !m,
            Comp::NegD => d.wrapping_neg(),
            Comp::NegA => a.wrapping_neg(),
            Comp::NegM => m.wrapping_neg(),
            Comp::DPlusOne => d.wrapping_add(1),
            Comp::APlusOne => a.wrapping_add(1),
            Comp::MPlusOne => m.wrapping_add(1),
            Comp::DMinusOne => d.wrapping_sub(1),
            Comp::AMinusOne => a.wrapping_sub(1),
            Comp::MMinusOne => m.wrapping_sub(1),
            Comp::DPlusA => d.wrapping_add(a),
            Comp::DPlusM => d.wrapping_add(m),
            Comp::DMinusA => d.wrapping_sub(a),
            Comp::DMinusM => d.wrapping_sub(m),
            Comp::AMinusD => a.wrapping_sub(d),
            Comp::MMinusD => m.wrapping_sub(d),
            Comp::DAndA => d & a,
            Comp::DAndM => d & m,
            Comp::DOrA => d | a,
            Comp::DOrM => d | m,
        }
    }
}
