//! Input discovery and file plumbing for the command line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const VM_EXTENSION: &str = "vm";
pub const ASM_EXTENSION: &str = "asm";
pub const HACK_EXTENSION: &str = "hack";

/// One translation unit, named by its file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub path: PathBuf,
    pub lines: Vec<String>,
}

/// The `.vm` files named by `input`. A directory yields its `.vm` entries
/// in file name order; anything else in it is skipped with a warning.
pub fn discover_vm_files(input: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(input).with_context(|| format!("reading {}", input.display()))?;
    if metadata.is_file() {
        if !has_extension(input, VM_EXTENSION) {
            bail!("{} is not a .{VM_EXTENSION} file", input.display());
        }
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input).with_context(|| format!("listing {}", input.display()))? {
        let path = entry
            .with_context(|| format!("listing {}", input.display()))?
            .path();
        if path.is_file() && has_extension(&path, VM_EXTENSION) {
            files.push(path);
        } else {
            tracing::warn!(path = %path.display(), "skipping, not a .vm file");
        }
    }
    files.sort();
    if files.is_empty() {
        bail!("no .{VM_EXTENSION} files in {}", input.display());
    }
    Ok(files)
}

pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading {}", path.display()))
}

pub fn load_vm_sources(input: &Path) -> Result<Vec<Source>> {
    discover_vm_files(input)?
        .into_iter()
        .map(|path| {
            let name = source_name(&path)?;
            let lines = read_lines(&path)?;
            tracing::info!(source = %name, lines = lines.len(), "loaded");
            Ok(Source { name, path, lines })
        })
        .collect()
}

/// File stem used to scope statics and labels.
pub fn source_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

/// `<stem>.<extension>` next to a file, `<dir>/<dir name>.<extension>`
/// inside a directory.
pub fn default_output(input: &Path, extension: &str) -> PathBuf {
    if input.is_dir() {
        let mut name = input
            .canonicalize()
            .ok()
            .and_then(|path| path.file_name().map(|name| name.to_os_string()))
            .unwrap_or_else(|| "out".into());
        name.push(".");
        name.push(extension);
        input.join(name)
    } else {
        input.with_extension(extension)
    }
}

/// Create the output file up front so an unwritable path fails before any
/// work is done.
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn write_lines<W: Write>(out: &mut W, lines: &[String], path: &Path) -> Result<()> {
    for line in lines {
        writeln!(out, "{line}").with_context(|| format!("writing {}", path.display()))?;
    }
    out.flush().with_context(|| format!("writing {}", path.display()))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
