use hack_machine::assembler::{Assembler, AssemblerError};
use hack_machine::emulator::{Computer, MachineError};

use super::*;
use crate::code_writer::CodeError;
use crate::parser::ParseErrorKind;

#[derive(Debug)]
enum TestError {
    Translate(TranslateError),
    Build(BuildError),
    Assembler(AssemblerError),
    Machine(MachineError),
    MissingSymbol(String),
}

impl From<TranslateError> for TestError {
    fn from(err: TranslateError) -> Self {
        TestError::Translate(err)
    }
}

impl From<BuildError> for TestError {
    fn from(err: BuildError) -> Self {
        TestError::Build(err)
    }
}

impl From<AssemblerError> for TestError {
    fn from(err: AssemblerError) -> Self {
        TestError::Assembler(err)
    }
}

impl From<MachineError> for TestError {
    fn from(err: MachineError) -> Self {
        TestError::Machine(err)
    }
}

const SYS: [&str; 9] = [
    "// entry point",
    "function Sys.init 0",
    "push constant 4",
    "call Main.double 1",
    "pop static 0",
    "call Main.bump 0",
    "pop temp 0",
    "label END",
    "goto END",
];

const MAIN: [&str; 12] = [
    "function Main.double 0",
    "push argument 0",
    "push argument 0",
    "add",
    "return",
    "function Main.bump 0",
    "push static 0",
    "push constant 1",
    "add",
    "pop static 0",
    "push constant 0",
    "return",
];

fn sources() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![("Sys", SYS.to_vec()), ("Main", MAIN.to_vec())]
}

fn no_bootstrap() -> TranslatorOptions {
    TranslatorOptions {
        bootstrap: None,
        annotate: false,
    }
}

/// Assemble, run from reset until `stop` and return the machine and the
/// address of each requested symbol.
fn execute(assembly: &[String], stop: &str, names: &[&str]) -> Result<(Computer, Vec<Word>), TestError> {
    let mut assembler = Assembler::new();
    assembler.first_pass(assembly)?;
    let words = assembler.second_pass(assembly)?;
    let lookup = |name: &str| {
        assembler
            .symbols()
            .address(name)
            .ok_or_else(|| TestError::MissingSymbol(name.to_string()))
    };
    let target = lookup(stop)?;
    let addresses = names.iter().map(|&name| lookup(name)).collect::<Result<Vec<_>, _>>()?;
    let mut computer = Computer::new(words)?;
    computer.run_until(target, 100_000)?;
    Ok((computer, addresses))
}

#[test]
fn test_multi_source_program_with_bootstrap() -> Result<(), TestError> {
    let (assembly, words) = build(&sources(), TranslatorOptions::default())?;
    assert_eq!(assembly.first().map(String::as_str), Some("// bootstrap: SP = 256, call Sys.init 0"));
    assert_eq!(words, hack_machine::assembler::assemble(&assembly)?);

    let (computer, statics) = execute(&assembly, "Sys.init$END", &["Sys.0", "Main.0"])?;
    let [sys_static, main_static] = statics[..] else {
        panic!("expected two statics");
    };
    assert_ne!(sys_static, main_static);
    assert_eq!(computer.peek(sys_static), 8);
    assert_eq!(computer.peek(main_static), 1);
    // Sys.init frame sits on the stack base, its stack is empty again.
    assert_eq!(computer.peek(0), 261);
    assert_eq!(computer.peek(1), 261);
    Ok(())
}

#[test]
fn test_annotation_does_not_change_binary() -> Result<(), TestError> {
    let annotated = build(&sources(), TranslatorOptions::default())?;
    let plain = build(
        &sources(),
        TranslatorOptions {
            annotate: false,
            ..TranslatorOptions::default()
        },
    )?;
    assert!(annotated.0.len() > plain.0.len());
    assert!(plain.0.iter().all(|line| !line.starts_with("//")));
    assert_eq!(annotated.1, plain.1);
    Ok(())
}

#[test]
fn test_translation_is_deterministic() -> Result<(), TestError> {
    let first = translate(&sources(), TranslatorOptions::default())?;
    let second = translate(&sources(), TranslatorOptions::default())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_without_bootstrap_starts_with_source() -> Result<(), TestError> {
    let assembly = translate(&[("Main", vec!["push constant 3"])], no_bootstrap())?;
    assert_eq!(assembly.first().map(String::as_str), Some("@3"));
    assert!(!assembly.iter().any(|line| line.contains("Sys.init")));
    Ok(())
}

#[test]
fn test_same_static_index_in_two_sources() -> Result<(), TestError> {
    let mut translator = Translator::new(no_bootstrap())?;
    translator.translate_source("A", &["pop static 3", "pop static 3"])?;
    translator.translate_source("B", &["pop static 3"])?;
    translator.translate_source("A", &["push static 3"])?;
    assert_eq!(translator.sources(), 3);
    let assembly = translator.finish();
    assert_eq!(assembly.iter().filter(|line| *line == "@A.3").count(), 3);
    assert_eq!(assembly.iter().filter(|line| *line == "@B.3").count(), 1);
    Ok(())
}

#[test]
fn test_top_level_labels_reset_per_source() -> Result<(), TestError> {
    let mut translator = Translator::new(no_bootstrap())?;
    translator.translate_source("A", &["function A.f 0", "label L"])?;
    translator.translate_source("B", &["label L", "goto L"])?;
    let assembly = translator.finish();
    assert!(assembly.iter().any(|line| line == "(A.f$L)"));
    assert!(assembly.iter().any(|line| line == "(B$L)"));
    assert!(assembly.iter().any(|line| line == "@B$L"));
    Ok(())
}

#[test]
fn test_parse_error_names_source_and_line() {
    let mut translator = match Translator::new(no_bootstrap()) {
        Ok(translator) => translator,
        Err(err) => panic!("{err}"),
    };
    let err = translator
        .translate_source("Broken", &["push constant 1", "// fine", "push nowhere 2"])
        .err();
    assert_eq!(
        err,
        Some(TranslateError::Parse {
            source_name: "Broken".to_string(),
            error: crate::parser::ParseError::WithLine {
                line: 3,
                kind: ParseErrorKind::UnknownSegment("nowhere".to_string()),
            },
        })
    );
    let message = err.map(|err| err.to_string());
    assert_eq!(message.as_deref(), Some("Broken: line 3: unknown segment `nowhere`"));
}

#[test]
fn test_code_error_names_source_and_line() {
    let err = translate(&[("Main", vec!["push constant 1", "pop pointer 2"])], no_bootstrap()).err();
    assert_eq!(err.as_ref().and_then(TranslateError::source_name), Some("Main"));
    assert_eq!(err.as_ref().and_then(TranslateError::line_number), Some(2));
    assert!(matches!(
        err,
        Some(TranslateError::Code {
            error: CodeError::PointerIndexOutOfRange(2),
            ..
        })
    ));
}

#[test]
fn test_bad_bootstrap_base() {
    let options = TranslatorOptions {
        bootstrap: Some(Bootstrap {
            stack_base: 40000,
            entry: DEFAULT_ENTRY.to_string(),
        }),
        annotate: false,
    };
    assert!(matches!(
        Translator::new(options),
        Err(TranslateError::Bootstrap(CodeError::ConstantOutOfRange(40000)))
    ));
}

#[test]
fn test_user_label_named_like_return_address() -> Result<(), TestError> {
    let program = vec![(
        "P",
        vec![
            "function Sys.init 0",
            "call f 0",
            "label END",
            "goto END",
            "function f 0",
            "label ret.0",
            "label ret",
            "call g 0",
            "return",
            "function g 0",
            "push constant 1",
            "push constant 2",
            "lt",
            "pop temp 0",
            "push constant 7",
            "return",
            "function CMP_TRUE.0 0",
            "push constant 0",
            "return",
        ],
    )];
    let (assembly, _) = build(&program, TranslatorOptions::default())?;
    let (computer, _) = execute(&assembly, "Sys.init$END", &[])?;
    // f returns g's result to Sys.init, which holds it on its own stack.
    assert_eq!(computer.peek(0), 262);
    assert_eq!(computer.peek(261), 7);
    Ok(())
}

#[test]
fn test_segment_index_error_names_source_and_line() {
    let err = translate(&[("P", vec!["push constant 1", "push local 40000"])], no_bootstrap()).err();
    assert_eq!(
        err,
        Some(TranslateError::Code {
            source_name: "P".to_string(),
            line: 2,
            error: CodeError::IndexOutOfRange(40000),
        })
    );
}

#[test]
fn test_source_name_cannot_hold_separator() {
    let err = translate(&[("A$ret", vec!["label 0"])], no_bootstrap()).err();
    assert_eq!(err, Some(TranslateError::ReservedSourceName("A$ret".to_string())));
}
