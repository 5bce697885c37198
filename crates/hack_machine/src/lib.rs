#![cfg_attr(
    not(test),
    deny(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing,
        clippy::string_slice,
        clippy::panicking_unwrap,
        clippy::out_of_bounds_indexing,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
    )
)]
#![cfg_attr(not(test), warn(clippy::missing_panics_doc))]

use std::io::{self, Write};

pub mod assembler;
pub mod code;
pub mod emulator;
pub mod parser;
pub mod symbols;

#[cfg(test)]
mod assembler_test;

/// This crate implements the assembler for the 16-bit Hack platform.
///
/// Every instruction is one `Word`. An address instruction has the top
/// bit clear and carries a 15-bit value which is loaded into `A`:
/// `
///     0vvv vvvv vvvv vvvv
/// `
/// A compute instruction has the three top bits set, followed by the
/// 7-bit comp field (the `a` bit plus six ALU control bits), the 3-bit
/// dest field and the 3-bit jump field:
/// `
///     111a cccc ccdd djjj
/// `
/// Assembly is done in two passes over the source lines. The first pass
/// binds labels to the address of the next real instruction, the second
/// pass allocates variables from `VARIABLE_BASE` upward and encodes.
pub type Word = u16;

/// Largest value an address instruction can carry.
pub const ADDRESS_MAX: Word = 0x7fff;

/// Number of instruction words the ROM can hold.
pub const ROM_SIZE: usize = 0x8000;

/// Number of addressable data words.
pub const RAM_SIZE: usize = 0x8000;

/// First RAM address handed out to variable symbols, one past `R15`.
pub const VARIABLE_BASE: Word = 16;

/// Base of the memory mapped screen.
pub const SCREEN: Word = 0x4000;

/// Memory mapped keyboard register.
pub const KBD: Word = 0x6000;

/// Render a word as the 16 character bit pattern used by `.hack` files.
pub fn format_word(word: Word) -> String {
    format!("{word:016b}")
}

/// Write one bit pattern line per word.
pub fn write_words<W: Write>(out: &mut W, words: &[Word]) -> io::Result<()> {
    for word in words {
        writeln!(out, "{}", format_word(*word))?;
    }
    Ok(())
}
