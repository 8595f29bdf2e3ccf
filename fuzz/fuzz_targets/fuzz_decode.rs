//! Fuzz target for the instruction decoder.
//!
//! Decoding must be total: every word maps to exactly one opcode and every
//! operand view is in range.

#![no_main]

use libpic18::opcodes::Instruction;
use libpic18::{decode, Opcode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|word: u16| {
    let opcode = decode(word);
    let inst = Instruction(word);

    assert_eq!(inst.opcode(), opcode);
    assert!(matches!(opcode.words(), 1 | 2));
    if opcode == Opcode::Illegal {
        assert_eq!(opcode.words(), 1);
    }

    assert!(inst.bit() <= 7);
    assert!(inst.file12() <= 0x0FFF);
    assert!(inst.lfsr_fsr() <= 3);
    assert!(inst.stack_offset() <= 0x7F);
    assert!((-128..=127).contains(&inst.offset8()));
    assert!((-1024..=1023).contains(&inst.offset11()));
});
