//! Fuzz target for CPU execution.
//!
//! This target creates arbitrary register state and program memory, then runs
//! the core for a bounded number of cycles to find panics and broken invariants.

#![no_main]

use arbitrary::Arbitrary;
use libpic18::registers::{FSR0H, FSR0L, FSR1H, FSR1L, FSR2H, FSR2L};
use libpic18::{Cpu, CpuConfig, Memory, Status};
use libfuzzer_sys::fuzz_target;

/// Arbitrary core configuration and initial state
#[derive(Debug, Arbitrary)]
struct FuzzCpuState {
    wreg: u8,
    status: u8,
    /// Initial FSR0..FSR2
    fsr: [u16; 3],
    reset_on_stack_overflow: bool,
    reset_on_stack_underflow: bool,
    extended_instruction_set: bool,
}

/// Complete fuzz input
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    cpu_state: FuzzCpuState,
    /// Program words starting at address 0
    program: Vec<u16>,
    /// Contents of the first RAM bank
    bank0: [u8; 256],
    /// Number of cycles to run (kept small)
    cycles: u8,
}

fuzz_target!(|input: FuzzInput| {
    // Limit program size to prevent OOM
    if input.program.len() > 4096 {
        return;
    }

    let mut cpu = Cpu::new(CpuConfig {
        reset_on_stack_overflow: input.cpu_state.reset_on_stack_overflow,
        reset_on_stack_underflow: input.cpu_state.reset_on_stack_underflow,
        extended_instruction_set: input.cpu_state.extended_instruction_set,
    });

    cpu.attach_program(Box::new(Memory::from_words(0, &input.program)));
    let mut ram = Memory::new(0, 0xF00);
    let _ = ram.load(0, &input.bank0);
    cpu.attach_data(Box::new(ram));

    cpu.set_wreg(input.cpu_state.wreg);
    cpu.set_status(Status::from_bits_truncate(input.cpu_state.status));
    let pointers = [(FSR0L, FSR0H), (FSR1L, FSR1H), (FSR2L, FSR2H)];
    for (&(low, high), &value) in pointers.iter().zip(input.cpu_state.fsr.iter()) {
        cpu.write_data(low, value as u8);
        cpu.write_data(high, (value >> 8) as u8);
    }

    cpu.run_for_cycles(input.cycles as u64);

    // Invariants that must hold after any instruction sequence
    assert!(cpu.pc() <= 0x1F_FFFF);
    assert_eq!(cpu.pc() & 1, 0);
    assert!(cpu.stack().pointer() <= 31);
    for n in 0..3 {
        assert!(cpu.fsr(n) <= 0x0FFF);
    }
    assert!(cpu.table().pointer() <= 0x3F_FFFF);
});
