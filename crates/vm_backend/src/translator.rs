use thiserror_no_std::Error;

use hack_machine::Word;
use hack_machine::assembler::{self, AssemblerError};

use crate::code_writer::{CodeError, CodeWriter, GENERATED_SEPARATOR};
use crate::parser::{ParseError, Parser};

pub const DEFAULT_STACK_BASE: Word = 256;
pub const DEFAULT_ENTRY: &str = "Sys.init";

/// Program entry sequence emitted ahead of all translated sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub stack_base: Word,
    pub entry: String,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            stack_base: DEFAULT_STACK_BASE,
            entry: DEFAULT_ENTRY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorOptions {
    pub bootstrap: Option<Bootstrap>,
    /// Emit each command as a comment ahead of its assembly.
    pub annotate: bool,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            bootstrap: Some(Bootstrap::default()),
            annotate: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("{source_name}: {error}")]
    Parse { source_name: String, error: ParseError },
    #[error("{source_name}: line {line}: {error}")]
    Code {
        source_name: String,
        line: usize,
        error: CodeError,
    },
    #[error("bootstrap: {0}")]
    Bootstrap(CodeError),
    #[error("source name `{0}` contains `$`, which is reserved for generated labels")]
    ReservedSourceName(String),
}

impl TranslateError {
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::Parse { source_name, .. }
            | Self::Code { source_name, .. }
            | Self::ReservedSourceName(source_name) => Some(source_name),
            Self::Bootstrap(_) => None,
        }
    }

    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Parse { error, .. } => error.line_number(),
            Self::Code { line, .. } => Some(*line),
            Self::Bootstrap(_) | Self::ReservedSourceName(_) => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Translate(TranslateError),
    #[error("assembling translated program: {0}")]
    Assemble(AssemblerError),
}

impl From<TranslateError> for BuildError {
    fn from(err: TranslateError) -> Self {
        BuildError::Translate(err)
    }
}

impl From<AssemblerError> for BuildError {
    fn from(err: AssemblerError) -> Self {
        BuildError::Assemble(err)
    }
}

/// Translates a sequence of sources into one assembly program. Sources are
/// processed in the order they are given, which fixes label numbering.
pub struct Translator {
    writer: CodeWriter,
    sources: usize,
}

impl Translator {
    pub fn new(options: TranslatorOptions) -> Result<Self, TranslateError> {
        let mut writer = CodeWriter::new(options.annotate);
        if let Some(bootstrap) = &options.bootstrap {
            writer
                .write_bootstrap(bootstrap.stack_base, &bootstrap.entry)
                .map_err(TranslateError::Bootstrap)?;
        }
        Ok(Self { writer, sources: 0 })
    }

    /// Translate one source. `name` scopes statics and labels outside
    /// functions, usually the file stem.
    pub fn translate_source<S: AsRef<str>>(
        &mut self,
        name: &str,
        lines: &[S],
    ) -> Result<(), TranslateError> {
        if name.contains(GENERATED_SEPARATOR) {
            return Err(TranslateError::ReservedSourceName(name.to_string()));
        }
        let start = self.writer.lines().len();
        self.writer.set_file_name(name);
        let mut parser = Parser::new(lines);
        let mut commands = 0usize;
        while parser.has_more_commands() {
            parser.advance().map_err(|error| TranslateError::Parse {
                source_name: name.to_string(),
                error,
            })?;
            let Some(command) = parser.command() else {
                continue;
            };
            self.writer
                .write_command(command)
                .map_err(|error| TranslateError::Code {
                    source_name: name.to_string(),
                    line: parser.line_number(),
                    error,
                })?;
            commands = commands.saturating_add(1);
        }
        self.sources = self.sources.saturating_add(1);
        tracing::debug!(
            source = name,
            commands,
            lines = self.writer.lines().len().saturating_sub(start),
            "translated source"
        );
        Ok(())
    }

    pub fn sources(&self) -> usize {
        self.sources
    }

    pub fn lines(&self) -> &[String] {
        self.writer.lines()
    }

    pub fn finish(self) -> Vec<String> {
        self.writer.finish()
    }
}

/// Translate `(name, lines)` pairs in order into one assembly program.
pub fn translate<N, S>(sources: &[(N, Vec<S>)], options: TranslatorOptions) -> Result<Vec<String>, TranslateError>
where
    N: AsRef<str>,
    S: AsRef<str>,
{
    let mut translator = Translator::new(options)?;
    for (name, lines) in sources {
        translator.translate_source(name.as_ref(), lines)?;
    }
    Ok(translator.finish())
}

/// Translate and assemble without touching the file system. Returns the
/// intermediate assembly alongside the machine words.
pub fn build<N, S>(
    sources: &[(N, Vec<S>)],
    options: TranslatorOptions,
) -> Result<(Vec<String>, Vec<Word>), BuildError>
where
    N: AsRef<str>,
    S: AsRef<str>,
{
    let assembly = translate(sources, options)?;
    let words = assembler::assemble(&assembly)?;
    tracing::debug!(
        assembly_lines = assembly.len(),
        words = words.len(),
        "built program"
    );
    Ok((assembly, words))
}

#[cfg(test)]
mod test;
