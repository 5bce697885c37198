//! Lowers stack machine commands to assembly lines.
//!
//! Every sequence assumes `SP` points one past the top of the stack on entry
//! and leaves it that way on exit, so sequences compose in any order. `R13`
//! and `R14` are scratch registers owned by the generated code.

use thiserror_no_std::Error;

use hack_machine::{ADDRESS_MAX, Word};

use crate::command::{ArithmeticOp, Command, Segment};

/// First RAM address of the `temp` segment.
pub const TEMP_BASE: Word = 5;
pub const TEMP_SIZE: Word = 8;

/// Saved return address plus the four saved segment pointers.
pub const FRAME_HEADER: Word = 5;

/// Label scope for code emitted before the first source is named.
pub const BOOTSTRAP_SCOPE: &str = "Bootstrap";

/// Joins a scope to a label. Parsed labels and function names never contain
/// it, so generated labels with a second separator cannot clash with them.
pub const GENERATED_SEPARATOR: char = '$';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("constant {0} does not fit in 15 bits")]
    ConstantOutOfRange(Word),
    #[error("pointer index {0} is out of range")]
    PointerIndexOutOfRange(Word),
    #[error("temp index {0} is out of range")]
    TempIndexOutOfRange(Word),
    #[error("segment index {0} does not fit in 15 bits")]
    IndexOutOfRange(Word),
    #[error("cannot pop to the constant segment")]
    PopConstant,
    #[error("call with {0} arguments overflows the frame offset")]
    FrameSizeOverflow(Word),
}

pub struct CodeWriter {
    file_name: String,
    function_name: Option<String>,
    label_counter: usize,
    annotate: bool,
    lines: Vec<String>,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl CodeWriter {
    pub fn new(annotate: bool) -> Self {
        Self {
            file_name: BOOTSTRAP_SCOPE.to_string(),
            function_name: None,
            label_counter: 0,
            annotate,
            lines: Vec::new(),
        }
    }

    /// Start a new source. Statics and labels outside functions are scoped
    /// by this name.
    pub fn set_file_name(&mut self, name: &str) {
        self.file_name = name.to_string();
        self.function_name = None;
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn finish(self) -> Vec<String> {
        self.lines
    }

    pub fn write_command(&mut self, command: &Command) -> Result<(), CodeError> {
        tracing::trace!(%command, scope = self.scope(), "lowering");
        if self.annotate {
            self.emit(format!("// {command}"));
        }
        match command {
            Command::Arithmetic(op) => self.write_arithmetic(*op),
            Command::Push(segment, index) => self.write_push(*segment, *index)?,
            Command::Pop(segment, index) => self.write_pop(*segment, *index)?,
            Command::Label(label) => self.write_label(label),
            Command::Goto(label) => self.write_goto(label),
            Command::IfGoto(label) => self.write_if(label),
            Command::Function { name, locals } => self.write_function(name, *locals),
            Command::Call { name, args } => self.write_call(name, *args)?,
            Command::Return => self.write_return(),
        }
        Ok(())
    }

    pub fn write_arithmetic(&mut self, op: ArithmeticOp) {
        match op {
            ArithmeticOp::Add => self.binary("M=D+M"),
            ArithmeticOp::Sub => self.binary("M=M-D"),
            ArithmeticOp::And => self.binary("M=D&M"),
            ArithmeticOp::Or => self.binary("M=D|M"),
            ArithmeticOp::Neg => self.unary("M=-M"),
            ArithmeticOp::Not => self.unary("M=!M"),
            ArithmeticOp::Eq => self.compare("JEQ"),
            ArithmeticOp::Gt => self.compare("JGT"),
            ArithmeticOp::Lt => self.compare("JLT"),
        }
    }

    pub fn write_push(&mut self, segment: Segment, index: Word) -> Result<(), CodeError> {
        match segment {
            Segment::Constant => {
                if index > ADDRESS_MAX {
                    return Err(CodeError::ConstantOutOfRange(index));
                }
                self.emit_all([format!("@{index}"), "D=A".to_string()]);
            }
            Segment::Local => self.load_indirect("LCL", index)?,
            Segment::Argument => self.load_indirect("ARG", index)?,
            Segment::This => self.load_indirect("THIS", index)?,
            Segment::That => self.load_indirect("THAT", index)?,
            Segment::Temp | Segment::Pointer | Segment::Static => {
                let target = self.direct_target(segment, index)?;
                self.emit_all([format!("@{target}"), "D=M".to_string()]);
            }
        }
        self.push_d();
        Ok(())
    }

    pub fn write_pop(&mut self, segment: Segment, index: Word) -> Result<(), CodeError> {
        match segment {
            Segment::Constant => return Err(CodeError::PopConstant),
            Segment::Local => self.store_indirect("LCL", index)?,
            Segment::Argument => self.store_indirect("ARG", index)?,
            Segment::This => self.store_indirect("THIS", index)?,
            Segment::That => self.store_indirect("THAT", index)?,
            Segment::Temp | Segment::Pointer | Segment::Static => {
                let target = self.direct_target(segment, index)?;
                self.pop_d();
                self.emit_all([format!("@{target}"), "M=D".to_string()]);
            }
        }
        Ok(())
    }

    pub fn write_label(&mut self, label: &str) {
        let label = self.qualify(label);
        self.emit(format!("({label})"));
    }

    pub fn write_goto(&mut self, label: &str) {
        let label = self.qualify(label);
        self.emit_all([format!("@{label}"), "0;JMP".to_string()]);
    }

    /// Pop and jump when the value is not zero.
    pub fn write_if(&mut self, label: &str) {
        let label = self.qualify(label);
        self.pop_d();
        self.emit_all([format!("@{label}"), "D;JNE".to_string()]);
    }

    pub fn write_function(&mut self, name: &str, locals: Word) {
        self.function_name = Some(name.to_string());
        self.emit(format!("({name})"));
        for _ in 0..locals {
            self.emit_all(["@SP", "AM=M+1", "A=A-1", "M=0"]);
        }
    }

    pub fn write_call(&mut self, name: &str, args: Word) -> Result<(), CodeError> {
        let offset = args
            .checked_add(FRAME_HEADER)
            .filter(|offset| *offset <= ADDRESS_MAX)
            .ok_or(CodeError::FrameSizeOverflow(args))?;
        let n = self.next_label();
        let return_label = format!("{}$ret${n}", self.scope());

        self.emit_all([format!("@{return_label}"), "D=A".to_string()]);
        self.push_d();
        for register in ["LCL", "ARG", "THIS", "THAT"] {
            self.emit_all([format!("@{register}"), "D=M".to_string()]);
            self.push_d();
        }
        // ARG = SP - 5 - args, LCL = SP
        self.emit_all([
            "@SP".to_string(),
            "D=M".to_string(),
            format!("@{offset}"),
            "D=D-A".to_string(),
            "@ARG".to_string(),
            "M=D".to_string(),
            "@SP".to_string(),
            "D=M".to_string(),
            "@LCL".to_string(),
            "M=D".to_string(),
            format!("@{name}"),
            "0;JMP".to_string(),
            format!("({return_label})"),
        ]);
        Ok(())
    }

    pub fn write_return(&mut self) {
        // R13 = frame, R14 = return address. The return address is read
        // before the return value lands on ARG[0], which may be the same slot.
        self.emit_all([
            "@LCL",
            "D=M",
            "@R13",
            "M=D",
            "@5",
            "A=D-A",
            "D=M",
            "@R14",
            "M=D",
        ]);
        self.pop_d();
        self.emit_all(["@ARG", "A=M", "M=D", "@ARG", "D=M+1", "@SP", "M=D"]);
        for register in ["THAT", "THIS", "ARG", "LCL"] {
            self.emit_all([
                "@R13".to_string(),
                "AM=M-1".to_string(),
                "D=M".to_string(),
                format!("@{register}"),
                "M=D".to_string(),
            ]);
        }
        self.emit_all(["@R14", "A=M", "0;JMP"]);
    }

    /// Set `SP` and call the entry function.
    pub fn write_bootstrap(&mut self, stack_base: Word, entry: &str) -> Result<(), CodeError> {
        if stack_base > ADDRESS_MAX {
            return Err(CodeError::ConstantOutOfRange(stack_base));
        }
        if self.annotate {
            self.emit(format!("// bootstrap: SP = {stack_base}, call {entry} 0"));
        }
        self.emit_all([format!("@{stack_base}"), "D=A".to_string()]);
        self.emit_all(["@SP", "M=D"]);
        self.write_call(entry, 0)
    }

    /// Function name while inside one, otherwise the source name.
    fn scope(&self) -> &str {
        self.function_name.as_deref().unwrap_or(&self.file_name)
    }

    fn qualify(&self, label: &str) -> String {
        format!("{}${label}", self.scope())
    }

    fn next_label(&mut self) -> usize {
        let label = self.label_counter;
        self.label_counter = self.label_counter.wrapping_add(1);
        label
    }

    fn direct_target(&self, segment: Segment, index: Word) -> Result<String, CodeError> {
        match segment {
            Segment::Temp if index < TEMP_SIZE => Ok(format!("R{}", TEMP_BASE.saturating_add(index))),
            Segment::Temp => Err(CodeError::TempIndexOutOfRange(index)),
            Segment::Pointer if index == 0 => Ok("THIS".to_string()),
            Segment::Pointer if index == 1 => Ok("THAT".to_string()),
            Segment::Pointer => Err(CodeError::PointerIndexOutOfRange(index)),
            _ => Ok(format!("{}.{index}", self.file_name)),
        }
    }

    /// `D = base[index]`
    fn load_indirect(&mut self, base: &str, index: Word) -> Result<(), CodeError> {
        check_offset(index)?;
        self.emit_all([
            format!("@{index}"),
            "D=A".to_string(),
            format!("@{base}"),
            "A=D+M".to_string(),
            "D=M".to_string(),
        ]);
        Ok(())
    }

    /// `base[index] = pop`, with the target address parked in `R13`.
    fn store_indirect(&mut self, base: &str, index: Word) -> Result<(), CodeError> {
        check_offset(index)?;
        self.emit_all([
            format!("@{index}"),
            "D=A".to_string(),
            format!("@{base}"),
            "D=D+M".to_string(),
            "@R13".to_string(),
            "M=D".to_string(),
        ]);
        self.pop_d();
        self.emit_all(["@R13", "A=M", "M=D"]);
        Ok(())
    }

    fn binary(&mut self, op: &str) {
        self.emit_all(["@SP", "AM=M-1", "D=M", "A=A-1", op]);
    }

    fn unary(&mut self, op: &str) {
        self.emit_all(["@SP", "A=M-1", op]);
    }

    fn compare(&mut self, jump: &str) {
        let n = self.next_label();
        let when_true = format!("$CMP_TRUE${n}");
        let end = format!("$CMP_END${n}");
        self.emit_all([
            "@SP".to_string(),
            "AM=M-1".to_string(),
            "D=M".to_string(),
            "A=A-1".to_string(),
            "D=M-D".to_string(),
            format!("@{when_true}"),
            format!("D;{jump}"),
            "D=0".to_string(),
            format!("@{end}"),
            "0;JMP".to_string(),
            format!("({when_true})"),
            "D=-1".to_string(),
            format!("({end})"),
            "@SP".to_string(),
            "A=M-1".to_string(),
            "M=D".to_string(),
        ]);
    }

    fn push_d(&mut self) {
        self.emit_all(["@SP", "AM=M+1", "A=A-1", "M=D"]);
    }

    fn pop_d(&mut self) {
        self.emit_all(["@SP", "AM=M-1", "D=M"]);
    }

    fn emit(&mut self, line: String) {
        self.lines.push(line);
    }

    fn emit_all<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }
}

fn check_offset(index: Word) -> Result<(), CodeError> {
    if index > ADDRESS_MAX {
        return Err(CodeError::IndexOutOfRange(index));
    }
    Ok(())
}
