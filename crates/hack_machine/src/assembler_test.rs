use crate::assembler::{Assembler, AssemblerError, AssemblerErrorKind, assemble};
use crate::code::CodeError;
use crate::symbols::SymbolError;
use crate::{Word, format_word};

fn to_lines(words: &[Word]) -> Vec<String> {
    words.iter().copied().map(format_word).collect()
}

#[test]
fn test_adds_two_constants() -> Result<(), AssemblerError> {
    let source = "@2\nD=A\n@3\nD=D+A\n@0\nM=D\n";
    let lines: Vec<&str> = source.lines().collect();
    let words = assemble(&lines)?;
    assert_eq!(
        to_lines(&words),
        vec![
            "0000000000000010",
            "1110110000010000",
            "0000000000000011",
            "1110000010010000",
            "0000000000000000",
            "1110001100001000",
        ]
    );
    Ok(())
}

#[test]
fn test_forward_label_binds_to_next_instruction() -> Result<(), AssemblerError> {
    let lines = [
        "@END", "0;JMP", "// skipped", "@1", "D=A", "(END)", "@0", "D=A",
    ];
    let mut assembler = Assembler::new();
    assembler.first_pass(&lines)?;
    assert_eq!(assembler.symbols().address("END"), Some(4));
    let words = assembler.second_pass(&lines)?;
    assert_eq!(words.len(), 6);
    assert_eq!(words.first(), Some(&4));
    assert_eq!(words.get(4), Some(&0));
    Ok(())
}

#[test]
fn test_consecutive_labels_share_an_address() -> Result<(), AssemblerError> {
    let lines = ["(A)", "(B)", "@A", "@B", "(C)"];
    let mut assembler = Assembler::new();
    assembler.first_pass(&lines)?;
    assert_eq!(assembler.symbols().address("A"), Some(0));
    assert_eq!(assembler.symbols().address("B"), Some(0));
    assert_eq!(assembler.symbols().address("C"), Some(2));
    Ok(())
}

#[test]
fn test_variables_allocated_in_first_use_order() -> Result<(), AssemblerError> {
    let lines = [
        "@i", "M=1", "@sum", "M=0", "@LOOP_DONE", "0;JMP", "@i", "D=M", "@R15", "@SCREEN",
        "@counter", "(LOOP_DONE)", "@KBD",
    ];
    let words = assemble(&lines)?;
    assert_eq!(
        words,
        vec![16, 0xefc8, 17, 0xea88, 11, 0xea87, 16, 0xfc10, 15, 16384, 18, 24576]
    );
    Ok(())
}

#[test]
fn test_assembly_is_deterministic() -> Result<(), AssemblerError> {
    let lines = ["(LOOP)", "@x", "M=M+1", "@y", "D=M", "@LOOP", "D;JGT", "@z"];
    let first = assemble(&lines)?;
    let second = assemble(&lines)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_every_word_is_sixteen_bits() -> Result<(), AssemblerError> {
    let lines = ["@32767", "AMD=!M;JLE", "@0", "0;JMP"];
    for line in to_lines(&assemble(&lines)?) {
        assert_eq!(line.len(), 16);
        assert!(line.chars().all(|c| c == '0' || c == '1'));
    }
    Ok(())
}

#[test]
fn test_duplicate_label_reports_line() {
    let lines = ["(LOOP)", "@LOOP", "0;JMP", "(LOOP)", "@0"];
    let err = assemble(&lines).err();
    assert_eq!(
        err,
        Some(AssemblerError::WithLine {
            line: 4,
            kind: AssemblerErrorKind::Symbol(SymbolError::DuplicateSymbol("LOOP".to_string())),
        })
    );
}

#[test]
fn test_label_cannot_shadow_predefined_symbol() {
    let lines = ["(R1)", "@R1"];
    let err = assemble(&lines).err();
    assert_eq!(err.as_ref().and_then(AssemblerError::line_number), Some(1));
}

#[test]
fn test_literal_out_of_range() {
    let lines = ["@32767", "@32768"];
    let err = assemble(&lines).err();
    assert_eq!(
        err,
        Some(AssemblerError::WithLine {
            line: 2,
            kind: AssemblerErrorKind::AddressOutOfRange("32768".to_string()),
        })
    );
}

#[test]
fn test_unknown_mnemonic_reports_line() {
    let lines = ["@1", "", "D=D*A"];
    let Err(err) = assemble(&lines) else {
        panic!("expected an error");
    };
    assert_eq!(err.line_number(), Some(3));
    assert_eq!(
        err.error_kind(),
        &AssemblerErrorKind::Code(CodeError::UnknownComp("D*A".to_string()))
    );
    assert_eq!(err.to_string(), "line 3: unknown comp mnemonic `D*A`");
}
