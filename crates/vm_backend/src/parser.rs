//! Line parser for the stack machine form.
//!
//! Lines are cut at `//`, split on whitespace and classified by their first
//! token. Parsing is strict about operand counts so that a malformed line is
//! reported where it occurs instead of producing odd assembly later.

use heapless::Vec;
use thiserror_no_std::Error;

use hack_machine::Word;

use crate::code_writer::GENERATED_SEPARATOR;
use crate::command::{ArithmeticOp, Command, CommandKind, Segment};

pub const COMMENT_MARKER: &str = "//";

// Keyword plus at most two operands.
const MAX_TOKENS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    Kind(ParseErrorKind),
    #[error("line {line}: {kind}")]
    WithLine { line: usize, kind: ParseErrorKind },
}

impl ParseError {
    fn with_line(self, line: usize) -> Self {
        match self {
            ParseError::WithLine { .. } => self,
            ParseError::Kind(kind) => ParseError::WithLine { line, kind },
        }
    }

    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Kind(_) => None,
            Self::WithLine { line, .. } => Some(*line),
        }
    }

    pub fn error_kind(&self) -> &ParseErrorKind {
        match self {
            Self::Kind(kind) => kind,
            Self::WithLine { kind, .. } => kind,
        }
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> Self {
        ParseError::Kind(kind)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("advance called with no commands left")]
    NoMoreCommands,
    #[error("no current command, call advance first")]
    NoCurrentCommand,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("unknown segment `{0}`")]
    UnknownSegment(String),
    #[error("`{0}` is not a valid index or count")]
    InvalidIndex(String),
    #[error("`{0}` is missing an operand")]
    MissingOperand(String),
    #[error("too many tokens")]
    TooManyTokens,
    #[error("cannot pop to the constant segment")]
    PopConstant,
    #[error("`{0}` contains `$`, which is reserved for generated labels")]
    ReservedCharacter(String),
    #[error("operand is not available on a {found:?} command")]
    WrongCommandKind { found: CommandKind },
}

pub struct Parser<'a, S: AsRef<str>> {
    lines: &'a [S],
    cursor: usize,
    line: usize,
    current: Option<Command>,
}

impl<'a, S: AsRef<str>> Parser<'a, S> {
    pub fn new(lines: &'a [S]) -> Self {
        let mut parser = Self {
            lines,
            cursor: 0,
            line: 0,
            current: None,
        };
        parser.skip_blank_lines();
        parser
    }

    pub fn has_more_commands(&self) -> bool {
        self.cursor < self.lines.len()
    }

    pub fn advance(&mut self) -> Result<(), ParseError> {
        let raw = self
            .lines
            .get(self.cursor)
            .ok_or(ParseError::Kind(ParseErrorKind::NoMoreCommands))?;
        self.cursor = self.cursor.saturating_add(1);
        self.line = self.cursor;
        self.current = None;
        let parsed = parse_line(raw.as_ref()).map_err(|err| ParseError::from(err).with_line(self.line));
        self.skip_blank_lines();
        match parsed? {
            Some(command) => {
                self.current = Some(command);
                Ok(())
            }
            None => Err(ParseError::Kind(ParseErrorKind::NoMoreCommands).with_line(self.line)),
        }
    }

    /// 1-based source line of the current command.
    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn command(&self) -> Option<&Command> {
        self.current.as_ref()
    }

    pub fn command_kind(&self) -> Result<CommandKind, ParseError> {
        Ok(self.current()?.kind())
    }

    /// The op mnemonic for arithmetic, otherwise the first operand.
    /// Not available on `return`.
    pub fn arg1(&self) -> Result<&str, ParseError> {
        match self.current()? {
            Command::Arithmetic(op) => Ok(op.mnemonic()),
            Command::Push(segment, _) | Command::Pop(segment, _) => Ok(segment.keyword()),
            Command::Label(label) | Command::Goto(label) | Command::IfGoto(label) => Ok(label),
            Command::Function { name, .. } | Command::Call { name, .. } => Ok(name),
            other => Err(wrong_kind(other)),
        }
    }

    /// Index of `push`/`pop`, local count of `function`, argument count of
    /// `call`.
    pub fn arg2(&self) -> Result<Word, ParseError> {
        match self.current()? {
            Command::Push(_, index) | Command::Pop(_, index) => Ok(*index),
            Command::Function { locals: count, .. } | Command::Call { args: count, .. } => Ok(*count),
            other => Err(wrong_kind(other)),
        }
    }

    fn current(&self) -> Result<&Command, ParseError> {
        self.command()
            .ok_or(ParseError::Kind(ParseErrorKind::NoCurrentCommand))
    }

    fn skip_blank_lines(&mut self) {
        while let Some(raw) = self.lines.get(self.cursor) {
            if !strip_comment(raw.as_ref()).trim().is_empty() {
                return;
            }
            self.cursor = self.cursor.saturating_add(1);
        }
    }
}

fn wrong_kind(command: &Command) -> ParseError {
    ParseError::Kind(ParseErrorKind::WrongCommandKind {
        found: command.kind(),
    })
}

pub fn strip_comment(line: &str) -> &str {
    match line.split_once(COMMENT_MARKER) {
        Some((code, _)) => code,
        None => line,
    }
}

/// Parse one raw line. Blank and comment-only lines give `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseErrorKind> {
    let mut tokens: Vec<&str, MAX_TOKENS> = Vec::new();
    for token in strip_comment(line).split_whitespace() {
        tokens
            .push(token)
            .map_err(|_| ParseErrorKind::TooManyTokens)?;
    }
    let Some((keyword, operands)) = tokens.split_first() else {
        return Ok(None);
    };

    let kind = match keyword.parse::<ArithmeticOp>() {
        Ok(_) => CommandKind::Arithmetic,
        Err(err) => CommandKind::from_keyword(keyword).ok_or(err)?,
    };
    if operands.len() < kind.operand_count() {
        return Err(ParseErrorKind::MissingOperand(keyword.to_string()));
    }
    if operands.len() > kind.operand_count() {
        return Err(ParseErrorKind::TooManyTokens);
    }

    let first = operands.first().copied().unwrap_or_default();
    let second = operands.get(1).copied().unwrap_or_default();
    let command = match kind {
        CommandKind::Arithmetic => Command::Arithmetic(keyword.parse()?),
        CommandKind::Push => Command::Push(first.parse()?, parse_index(second)?),
        CommandKind::Pop => {
            let segment: Segment = first.parse()?;
            if segment == Segment::Constant {
                return Err(ParseErrorKind::PopConstant);
            }
            Command::Pop(segment, parse_index(second)?)
        }
        CommandKind::Label => Command::Label(parse_symbol(first)?),
        CommandKind::Goto => Command::Goto(parse_symbol(first)?),
        CommandKind::IfGoto => Command::IfGoto(parse_symbol(first)?),
        CommandKind::Function => Command::Function {
            name: parse_symbol(first)?,
            locals: parse_index(second)?,
        },
        CommandKind::Call => Command::Call {
            name: parse_symbol(first)?,
            args: parse_index(second)?,
        },
        CommandKind::Return => Command::Return,
    };
    Ok(Some(command))
}

/// Label or function name. The separator is left to generated labels.
fn parse_symbol(token: &str) -> Result<String, ParseErrorKind> {
    if token.contains(GENERATED_SEPARATOR) {
        return Err(ParseErrorKind::ReservedCharacter(token.to_string()));
    }
    Ok(token.to_string())
}

fn parse_index(token: &str) -> Result<Word, ParseErrorKind> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseErrorKind::InvalidIndex(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| ParseErrorKind::InvalidIndex(token.to_string()))
}
