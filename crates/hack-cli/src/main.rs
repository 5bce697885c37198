use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

use hack_machine::assembler;
use vm_backend::{Translator, TranslatorOptions};

mod sources;

use sources::{ASM_EXTENSION, HACK_EXTENSION, Source};

#[derive(Parser, Debug)]
#[command(name = "hackc", version, about = "Stack machine translator and assembler for the Hack platform")]
struct Cli {
    /// More log output, repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a .asm file into .hack bit patterns.
    Asm {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Translate a .vm file or a directory of them into one .asm file.
    Vm {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Do not set SP and call Sys.init first.
        #[arg(long)]
        no_bootstrap: bool,
        /// Do not echo VM commands as comments.
        #[arg(long)]
        no_comments: bool,
    },
    /// Translate and assemble in one go.
    Build {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_bootstrap: bool,
        /// Also write the intermediate assembly to PATH.
        #[arg(long, value_name = "PATH")]
        emit_asm: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Asm { input, output } => {
            let output = output.unwrap_or_else(|| sources::default_output(&input, HACK_EXTENSION));
            assemble_file(&input, &output)
        }
        Command::Vm {
            input,
            output,
            no_bootstrap,
            no_comments,
        } => {
            let output = output.unwrap_or_else(|| sources::default_output(&input, ASM_EXTENSION));
            let options = translator_options(no_bootstrap, !no_comments);
            translate_input(&input, &output, options)
        }
        Command::Build {
            input,
            output,
            no_bootstrap,
            emit_asm,
        } => {
            let output = output.unwrap_or_else(|| sources::default_output(&input, HACK_EXTENSION));
            let options = translator_options(no_bootstrap, emit_asm.is_some());
            build_input(&input, &output, emit_asm.as_deref(), options)
        }
    }
}

fn translator_options(no_bootstrap: bool, annotate: bool) -> TranslatorOptions {
    let defaults = TranslatorOptions::default();
    TranslatorOptions {
        bootstrap: if no_bootstrap { None } else { defaults.bootstrap },
        annotate,
    }
}

fn assemble_file(input: &Path, output: &Path) -> Result<()> {
    let lines = sources::read_lines(input)?;
    let mut out = sources::create_output(output)?;
    let words = assembler::assemble(&lines).with_context(|| format!("assembling {}", input.display()))?;
    hack_machine::write_words(&mut out, &words)
        .and_then(|()| std::io::Write::flush(&mut out))
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(input = %input.display(), output = %output.display(), words = words.len(), "assembled");
    Ok(())
}

fn translate_sources(sources: &[Source], options: TranslatorOptions) -> Result<Vec<String>> {
    let mut translator = Translator::new(options)?;
    for source in sources {
        translator
            .translate_source(&source.name, &source.lines)
            .with_context(|| format!("translating {}", source.path.display()))?;
    }
    Ok(translator.finish())
}

fn translate_input(input: &Path, output: &Path, options: TranslatorOptions) -> Result<()> {
    let sources = sources::load_vm_sources(input)?;
    let mut out = sources::create_output(output)?;
    let assembly = translate_sources(&sources, options)?;
    sources::write_lines(&mut out, &assembly, output)?;
    tracing::info!(
        sources = sources.len(),
        output = %output.display(),
        lines = assembly.len(),
        "translated"
    );
    Ok(())
}

fn build_input(input: &Path, output: &Path, emit_asm: Option<&Path>, options: TranslatorOptions) -> Result<()> {
    let sources = sources::load_vm_sources(input)?;
    let mut out = sources::create_output(output)?;
    let mut asm_out = emit_asm.map(sources::create_output).transpose()?;

    let assembly = translate_sources(&sources, options)?;
    let words = assembler::assemble(&assembly).context("assembling translated program")?;

    if let (Some(asm_out), Some(path)) = (asm_out.as_mut(), emit_asm) {
        sources::write_lines(asm_out, &assembly, path)?;
    }
    hack_machine::write_words(&mut out, &words)
        .and_then(|()| std::io::Write::flush(&mut out))
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(
        sources = sources.len(),
        output = %output.display(),
        words = words.len(),
        "built"
    );
    Ok(())
}
