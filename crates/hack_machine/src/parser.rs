//! Line parser for the assembly form.
//!
//! The parser walks a slice of source lines and keeps one command of
//! lookahead, so `has_more_commands` is answered without consuming
//! anything. Operand accessors check the kind of the current command and
//! return `WrongCommandKind` instead of guessing.

use thiserror_no_std::Error;

pub const COMMENT_MARKER: &str = "//";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `@value`
    Address,
    /// `(LABEL)`, zero width in the address space.
    Label,
    /// `dest=comp;jump`
    Compute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Address(String),
    Label(String),
    Compute {
        dest: Option<String>,
        comp: String,
        jump: Option<String>,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Address(_) => CommandKind::Address,
            Command::Label(_) => CommandKind::Label,
            Command::Compute { .. } => CommandKind::Compute,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("advance called with no commands left")]
    NoMoreCommands,
    #[error("no current command, call advance first")]
    NoCurrentCommand,
    #[error("operand is not available on a {found:?} command")]
    WrongCommandKind { found: CommandKind },
    #[error("empty symbol in `{0}`")]
    EmptySymbol(String),
    #[error("label `{0}` is missing its closing parenthesis")]
    UnterminatedLabel(String),
}

pub struct Parser<'a, S: AsRef<str>> {
    lines: &'a [S],
    cursor: usize,
    line: usize,
    current: Option<Command>,
    next: Option<(usize, String)>,
}

impl<'a, S: AsRef<str>> Parser<'a, S> {
    pub fn new(lines: &'a [S]) -> Self {
        let mut parser = Self {
            lines,
            cursor: 0,
            line: 0,
            current: None,
            next: None,
        };
        parser.find_next_command();
        parser
    }

    pub fn has_more_commands(&self) -> bool {
        self.next.is_some()
    }

    /// Make the next command current. Fails when `has_more_commands` is false
    /// or when the line does not have the shape of any command.
    pub fn advance(&mut self) -> Result<(), ParseError> {
        let (line, text) = self.next.take().ok_or(ParseError::NoMoreCommands)?;
        self.find_next_command();
        self.line = line;
        self.current = None;
        self.current = Some(classify(text)?);
        Ok(())
    }

    /// 1-based source line of the current command, or of the line that
    /// failed to parse.
    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn command(&self) -> Option<&Command> {
        self.current.as_ref()
    }

    pub fn command_kind(&self) -> Result<CommandKind, ParseError> {
        Ok(self.current()?.kind())
    }

    /// The symbol or literal of an address command, or the name of a label.
    pub fn symbol(&self) -> Result<&str, ParseError> {
        match self.current()? {
            Command::Address(symbol) | Command::Label(symbol) => Ok(symbol),
            other => Err(ParseError::WrongCommandKind { found: other.kind() }),
        }
    }

    /// `None` when the compute command has no `dest=` part.
    pub fn dest(&self) -> Result<Option<&str>, ParseError> {
        match self.current()? {
            Command::Compute { dest, .. } => Ok(dest.as_deref()),
            other => Err(ParseError::WrongCommandKind { found: other.kind() }),
        }
    }

    pub fn comp(&self) -> Result<&str, ParseError> {
        match self.current()? {
            Command::Compute { comp, .. } => Ok(comp),
            other => Err(ParseError::WrongCommandKind { found: other.kind() }),
        }
    }

    /// `None` when the compute command has no `;jump` part.
    pub fn jump(&self) -> Result<Option<&str>, ParseError> {
        match self.current()? {
            Command::Compute { jump, .. } => Ok(jump.as_deref()),
            other => Err(ParseError::WrongCommandKind { found: other.kind() }),
        }
    }

    fn current(&self) -> Result<&Command, ParseError> {
        self.command().ok_or(ParseError::NoCurrentCommand)
    }

    fn find_next_command(&mut self) {
        self.next = None;
        while let Some(raw) = self.lines.get(self.cursor) {
            self.cursor = self.cursor.saturating_add(1);
            let stripped = strip_line(raw.as_ref());
            if !stripped.is_empty() {
                self.next = Some((self.cursor, stripped));
                return;
            }
        }
    }
}

/// Drop the comment and every whitespace character.
pub fn strip_line(line: &str) -> String {
    let code = match line.split_once(COMMENT_MARKER) {
        Some((code, _)) => code,
        None => line,
    };
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

fn classify(text: String) -> Result<Command, ParseError> {
    if let Some(symbol) = text.strip_prefix('@') {
        if symbol.is_empty() {
            return Err(ParseError::EmptySymbol(text));
        }
        return Ok(Command::Address(symbol.to_string()));
    }

    if let Some(rest) = text.strip_prefix('(') {
        let Some(label) = rest.strip_suffix(')') else {
            return Err(ParseError::UnterminatedLabel(text));
        };
        if label.is_empty() {
            return Err(ParseError::EmptySymbol(text));
        }
        return Ok(Command::Label(label.to_string()));
    }

    let (dest, rest) = match text.split_once('=') {
        Some((dest, rest)) => (Some(dest.to_string()), rest),
        None => (None, text.as_str()),
    };
    let (comp, jump) = match rest.split_once(';') {
        Some((comp, jump)) => (comp.to_string(), Some(jump.to_string())),
        None => (rest.to_string(), None),
    };
    Ok(Command::Compute { dest, comp, jump })
}
