use super::*;
use crate::format_word;

#[test]
fn test_closed_mnemonic_sets() {
    assert_eq!(Dest::VARIANT_COUNT, 8);
    assert_eq!(Jump::VARIANT_COUNT, 8);
    assert_eq!(Comp::VARIANT_COUNT, 28);
    let memory = Comp::ALL.iter().filter(|comp| comp.reads_memory()).count();
    assert_eq!(memory, 10);
    assert_eq!(Comp::VARIANT_COUNT - memory, 18);
}

#[test]
fn test_bit_patterns_are_distinct() {
    for (i, lhs) in Comp::ALL.iter().enumerate() {
        for rhs in Comp::ALL.iter().skip(i + 1) {
            assert_ne!(lhs.bits(), rhs.bits(), "{lhs:?} and {rhs:?} collide");
        }
    }
    for (i, dest) in Dest::ALL.iter().enumerate() {
        assert_eq!(usize::from(dest.bits()), i);
    }
    for (i, jump) in Jump::ALL.iter().enumerate() {
        assert_eq!(usize::from(jump.bits()), i);
    }
}

#[test]
fn test_encode_decode_every_triple() -> Result<(), CodeError> {
    for dest in Dest::ALL {
        for comp in Comp::ALL {
            for jump in Jump::ALL {
                let word = encode_compute(dest, comp, jump);
                assert_eq!(word & COMPUTE_PREFIX, COMPUTE_PREFIX);
                assert_eq!(format_word(word).len(), 16);

                let decoded = Instruction::decode(word)?;
                assert_eq!(decoded, Instruction::Compute { dest, comp, jump });

                // And back through the text form the parser hands over.
                let dest_text = (dest != Dest::Null).then(|| dest.mnemonic());
                let jump_text = (jump != Jump::Null).then(|| jump.mnemonic());
                assert_eq!(encode_mnemonics(dest_text, comp.mnemonic(), jump_text)?, word);
            }
        }
    }
    Ok(())
}

#[test]
fn test_known_encodings() -> Result<(), CodeError> {
    assert_eq!(
        format_word(encode_mnemonics(Some("D"), "A", None)?),
        "1110110000010000"
    );
    assert_eq!(
        format_word(encode_mnemonics(Some("D"), "D+A", None)?),
        "1110000010010000"
    );
    assert_eq!(
        format_word(encode_mnemonics(Some("M"), "D", None)?),
        "1110001100001000"
    );
    assert_eq!(
        format_word(encode_mnemonics(None, "0", Some("JMP"))?),
        "1110101010000111"
    );
    assert_eq!(
        format_word(encode_mnemonics(Some("AM"), "M-1", None)?),
        "1111110010101000"
    );
    Ok(())
}

#[test]
fn test_unknown_mnemonics() {
    assert_eq!(
        encode_mnemonics(Some("X"), "D", None),
        Err(CodeError::UnknownDest("X".to_string()))
    );
    assert_eq!(
        encode_mnemonics(None, "A+D", None),
        Err(CodeError::UnknownComp("A+D".to_string()))
    );
    assert_eq!(
        encode_mnemonics(None, "0", Some("JUMP")),
        Err(CodeError::UnknownJump("JUMP".to_string()))
    );
    assert!("null".parse::<Dest>().is_err());
}

#[test]
fn test_decode_rejects_garbage() {
    assert_eq!(Instruction::decode(0x0042), Ok(Instruction::Address(0x42)));
    assert_eq!(
        Instruction::decode(0b1000_0000_0000_0000),
        Err(CodeError::NotComputeInstruction(0x8000))
    );
    // a=1 with comp bits 101010 is not a published mnemonic.
    let word = COMPUTE_PREFIX | (0b1101010 << 6);
    assert_eq!(Instruction::decode(word), Err(CodeError::InvalidCompBits(word)));
}

#[test]
fn test_jump_conditions() {
    let negative = (-3i16) as Word;
    assert!(Jump::Jlt.taken(negative));
    assert!(!Jump::Jgt.taken(negative));
    assert!(Jump::Jeq.taken(0));
    assert!(Jump::Jge.taken(0));
    assert!(Jump::Jle.taken(0));
    assert!(Jump::Jne.taken(1));
    assert!(Jump::Jmp.taken(0));
    assert!(!Jump::Null.taken(0));
}
