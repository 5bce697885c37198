use std::fmt;
use std::str::FromStr;

use hack_machine::Word;
use variant_count::VariantCount;

use crate::parser::ParseErrorKind;

/// Named storage region addressed by `push` and `pop`.
#[derive(VariantCount, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
}

impl Segment {
    pub const ALL: [Segment; Segment::VARIANT_COUNT] = [
        Segment::Constant,
        Segment::Local,
        Segment::Argument,
        Segment::This,
        Segment::That,
        Segment::Temp,
        Segment::Pointer,
        Segment::Static,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Temp => "temp",
            Segment::Pointer => "pointer",
            Segment::Static => "static",
        }
    }
}

impl FromStr for Segment {
    type Err = ParseErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Segment::ALL
            .into_iter()
            .find(|segment| segment.keyword() == s)
            .ok_or_else(|| ParseErrorKind::UnknownSegment(s.to_string()))
    }
}

#[derive(VariantCount, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; ArithmeticOp::VARIANT_COUNT] = [
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::Neg,
        ArithmeticOp::Eq,
        ArithmeticOp::Gt,
        ArithmeticOp::Lt,
        ArithmeticOp::And,
        ArithmeticOp::Or,
        ArithmeticOp::Not,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }

    /// Change in stack height after the op runs.
    pub fn stack_effect(self) -> i8 {
        match self {
            ArithmeticOp::Neg | ArithmeticOp::Not => 0,
            _ => -1,
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = ParseErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArithmeticOp::ALL
            .into_iter()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| ParseErrorKind::UnknownCommand(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    IfGoto,
    Function,
    Call,
    Return,
}

impl CommandKind {
    /// Kind for a leading keyword other than an arithmetic mnemonic.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "push" => CommandKind::Push,
            "pop" => CommandKind::Pop,
            "label" => CommandKind::Label,
            "goto" => CommandKind::Goto,
            "if-goto" => CommandKind::IfGoto,
            "function" => CommandKind::Function,
            "call" => CommandKind::Call,
            "return" => CommandKind::Return,
            _ => return None,
        })
    }

    /// Number of operands after the keyword.
    pub fn operand_count(self) -> usize {
        match self {
            CommandKind::Arithmetic | CommandKind::Return => 0,
            CommandKind::Label | CommandKind::Goto | CommandKind::IfGoto => 1,
            CommandKind::Push | CommandKind::Pop | CommandKind::Function | CommandKind::Call => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Arithmetic(ArithmeticOp),
    Push(Segment, Word),
    Pop(Segment, Word),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: Word },
    Call { name: String, args: Word },
    Return,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Arithmetic(_) => CommandKind::Arithmetic,
            Command::Push(..) => CommandKind::Push,
            Command::Pop(..) => CommandKind::Pop,
            Command::Label(_) => CommandKind::Label,
            Command::Goto(_) => CommandKind::Goto,
            Command::IfGoto(_) => CommandKind::IfGoto,
            Command::Function { .. } => CommandKind::Function,
            Command::Call { .. } => CommandKind::Call,
            Command::Return => CommandKind::Return,
        }
    }
}

/// Canonical source form, used for annotation comments.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Arithmetic(op) => write!(f, "{}", op.mnemonic()),
            Command::Push(segment, index) => write!(f, "push {} {index}", segment.keyword()),
            Command::Pop(segment, index) => write!(f, "pop {} {index}", segment.keyword()),
            Command::Label(label) => write!(f, "label {label}"),
            Command::Goto(label) => write!(f, "goto {label}"),
            Command::IfGoto(label) => write!(f, "if-goto {label}"),
            Command::Function { name, locals } => write!(f, "function {name} {locals}"),
            Command::Call { name, args } => write!(f, "call {name} {args}"),
            Command::Return => write!(f, "return"),
        }
    }
}
