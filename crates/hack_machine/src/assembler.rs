// Two pass assembler. The first pass only counts instructions and binds
// labels, the second pass resolves variables and encodes.

use thiserror_no_std::Error;

use crate::code::{self, CodeError};
use crate::parser::{CommandKind, ParseError, Parser};
use crate::symbols::{SymbolError, SymbolTable};
use crate::{ADDRESS_MAX, ROM_SIZE, Word};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    #[error("{0}")]
    Kind(AssemblerErrorKind),
    #[error("line {line}: {kind}")]
    WithLine { line: usize, kind: AssemblerErrorKind },
}

impl AssemblerError {
    fn with_line(self, line: usize) -> Self {
        match self {
            AssemblerError::WithLine { .. } => self,
            AssemblerError::Kind(kind) => AssemblerError::WithLine { line, kind },
        }
    }

    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Kind(_) => None,
            Self::WithLine { line, .. } => Some(*line),
        }
    }

    pub fn error_kind(&self) -> &AssemblerErrorKind {
        match self {
            Self::Kind(kind) => kind,
            Self::WithLine { kind, .. } => kind,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblerErrorKind {
    #[error(transparent)]
    Parse(ParseError),
    #[error(transparent)]
    Code(CodeError),
    #[error(transparent)]
    Symbol(SymbolError),
    #[error("address literal `{0}` does not fit in 15 bits")]
    AddressOutOfRange(String),
    #[error("program does not fit in ROM")]
    ProgramTooLarge,
}

impl From<ParseError> for AssemblerError {
    fn from(err: ParseError) -> Self {
        AssemblerError::Kind(AssemblerErrorKind::Parse(err))
    }
}

impl From<CodeError> for AssemblerError {
    fn from(err: CodeError) -> Self {
        AssemblerError::Kind(AssemblerErrorKind::Code(err))
    }
}

impl From<SymbolError> for AssemblerError {
    fn from(err: SymbolError) -> Self {
        AssemblerError::Kind(AssemblerErrorKind::Symbol(err))
    }
}

pub struct Assembler {
    symbols: SymbolTable,
    program_counter: usize,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            program_counter: 0,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Bind every `(LABEL)` to the address of the instruction after it.
    pub fn first_pass<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), AssemblerError> {
        let mut parser = Parser::new(lines);
        self.program_counter = 0;
        while parser.has_more_commands() {
            self.first_pass_command(&mut parser)
                .map_err(|err| err.with_line(parser.line_number()))?;
        }
        tracing::debug!(
            instructions = self.program_counter,
            symbols = self.symbols.len(),
            "first pass done"
        );
        Ok(())
    }

    fn first_pass_command<S: AsRef<str>>(
        &mut self,
        parser: &mut Parser<'_, S>,
    ) -> Result<(), AssemblerError> {
        parser.advance()?;
        match parser.command_kind()? {
            CommandKind::Label => {
                let address = Word::try_from(self.program_counter)
                    .ok()
                    .filter(|_| self.program_counter < ROM_SIZE)
                    .ok_or(AssemblerError::Kind(AssemblerErrorKind::ProgramTooLarge))?;
                self.symbols.bind_label(parser.symbol()?, address)?;
            }
            CommandKind::Address | CommandKind::Compute => {
                if self.program_counter >= ROM_SIZE {
                    return Err(AssemblerError::Kind(AssemblerErrorKind::ProgramTooLarge));
                }
                self.program_counter = self.program_counter.saturating_add(1);
            }
        }
        Ok(())
    }

    /// Encode every instruction, allocating variables as they are first seen.
    pub fn second_pass<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<Vec<Word>, AssemblerError> {
        let mut parser = Parser::new(lines);
        let mut words = Vec::new();
        while parser.has_more_commands() {
            if let Some(word) = self
                .second_pass_command(&mut parser)
                .map_err(|err| err.with_line(parser.line_number()))?
            {
                words.push(word);
            }
        }
        tracing::debug!(
            words = words.len(),
            next_variable = self.symbols.next_variable(),
            "second pass done"
        );
        Ok(words)
    }

    fn second_pass_command<S: AsRef<str>>(
        &mut self,
        parser: &mut Parser<'_, S>,
    ) -> Result<Option<Word>, AssemblerError> {
        parser.advance()?;
        match parser.command_kind()? {
            CommandKind::Label => Ok(None),
            CommandKind::Address => {
                let symbol = parser.symbol()?;
                let value = if is_decimal(symbol) {
                    parse_literal(symbol)?
                } else {
                    self.symbols.resolve_variable(symbol)?
                };
                Ok(Some(value))
            }
            CommandKind::Compute => {
                let word = code::encode_mnemonics(parser.dest()?, parser.comp()?, parser.jump()?)?;
                Ok(Some(word))
            }
        }
    }
}

/// Assemble a whole program with a fresh symbol table.
pub fn assemble<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Word>, AssemblerError> {
    let mut assembler = Assembler::new();
    assembler.first_pass(lines)?;
    assembler.second_pass(lines)
}

fn is_decimal(symbol: &str) -> bool {
    !symbol.is_empty() && symbol.bytes().all(|b| b.is_ascii_digit())
}

fn parse_literal(symbol: &str) -> Result<Word, AssemblerError> {
    symbol
        .parse::<Word>()
        .ok()
        .filter(|value| *value <= ADDRESS_MAX)
        .ok_or_else(|| AssemblerError::Kind(AssemblerErrorKind::AddressOutOfRange(symbol.to_string())))
}
