//! Tests for the extended instruction set and indexed literal offset addressing.
//!
//! Tests cover:
//! - FSR arithmetic (ADDFSR, SUBFSR) and the return forms (ADDULNK, SUBULNK)
//! - CALLW through PCLATU:PCLATH:W
//! - Software stack moves (PUSHL, MOVSF, MOVSS)
//! - Access-bank operands below 0x60 becoming FSR2-relative
//! - Extended encodings executing as NOP when XINST is off

use libpic18::{registers, Cpu, CpuConfig, Memory};

fn setup_cpu(program: &[u16]) -> Cpu {
    let mut cpu = Cpu::new(CpuConfig {
        extended_instruction_set: true,
        ..CpuConfig::default()
    });
    cpu.attach_program(Box::new(Memory::from_words(0, program)));
    cpu.attach_data(Box::new(Memory::new(0, 0xF00)));
    cpu
}

fn set_fsr(cpu: &mut Cpu, n: u16, value: u16) {
    // FSRnL sits 8 bytes below FSR(n-1)L
    let low = registers::FSR0L - 8 * n;
    cpu.write_data(low + 1, (value >> 8) as u8);
    cpu.write_data(low, value as u8);
}

// ========== FSR Arithmetic ==========

#[test]
fn test_addfsr() {
    // ADDFSR 0, 5
    let mut cpu = setup_cpu(&[0xE805]);
    set_fsr(&mut cpu, 0, 0x100);
    cpu.run_for_cycles(2);
    assert_eq!(cpu.fsr(0), 0x105);
}

#[test]
fn test_subfsr() {
    // SUBFSR 1, 0x10
    let mut cpu = setup_cpu(&[0xE950]);
    set_fsr(&mut cpu, 1, 0x200);
    cpu.run_for_cycles(2);
    assert_eq!(cpu.fsr(1), 0x1F0);
}

#[test]
fn test_fsr_arithmetic_wraps_12_bits() {
    // ADDFSR 2, 0x3F ; SUBFSR 0, 1
    let mut cpu = setup_cpu(&[0xE8BF, 0xE901]);
    set_fsr(&mut cpu, 2, 0xFF0);
    cpu.run_for_cycles(3);
    assert_eq!(cpu.fsr(2), 0x02F);
    assert_eq!(cpu.fsr(0), 0xFFF);
}

#[test]
fn test_fsr_arithmetic_leaves_flags() {
    // ADDFSR 0, 1
    let mut cpu = setup_cpu(&[0xE801]);
    set_fsr(&mut cpu, 0, 0xFFF);
    cpu.run_for_cycles(2);
    assert_eq!(cpu.fsr(0), 0x000);
    assert_eq!(cpu.status(), libpic18::Status::empty());
}

#[test]
fn test_addulnk_returns() {
    // 0x00: RCALL +1
    // 0x02: SLEEP
    // 0x04: ADDULNK 4
    let mut cpu = setup_cpu(&[0xD801, 0x0003, 0xE8C4]);
    set_fsr(&mut cpu, 2, 0x100);

    cpu.run_for_cycles(4);
    assert_eq!(cpu.fsr(2), 0x104);
    assert_eq!(cpu.pc(), 0x02);
    assert_eq!(cpu.stack().pointer(), 0);
    assert!(cpu.is_flushing());
}

#[test]
fn test_subulnk_returns() {
    // RCALL +1 ; SLEEP ; SUBULNK 4
    let mut cpu = setup_cpu(&[0xD801, 0x0003, 0xE9C4]);
    set_fsr(&mut cpu, 2, 0x100);

    cpu.run_for_cycles(4);
    assert_eq!(cpu.fsr(2), 0x0FC);
    assert_eq!(cpu.pc(), 0x02);
}

// ========== CALLW ==========

#[test]
fn test_callw() {
    // MOVLW 0x01 ; MOVWF PCLATH ; MOVLW 0x20 ; CALLW
    let mut cpu = setup_cpu(&[0x0E01, 0x6EFA, 0x0E20, 0x0014]);
    cpu.run_for_cycles(5);
    assert_eq!(cpu.pc(), 0x0120);
    assert_eq!(cpu.stack().pointer(), 1);
    assert_eq!(cpu.stack().top(), 0x08);
    assert!(cpu.is_flushing());
}

// ========== Software Stack ==========

#[test]
fn test_pushl() {
    // PUSHL 0x5A ; PUSHL 0xA5
    let mut cpu = setup_cpu(&[0xEA5A, 0xEAA5]);
    set_fsr(&mut cpu, 2, 0x180);

    cpu.run_for_cycles(3);
    assert_eq!(cpu.read_data(0x180), 0x5A);
    assert_eq!(cpu.read_data(0x17F), 0xA5);
    assert_eq!(cpu.fsr(2), 0x17E);
}

#[test]
fn test_movsf() {
    // MOVSF [2], 0x050
    let mut cpu = setup_cpu(&[0xEB02, 0xF050]);
    set_fsr(&mut cpu, 2, 0x100);
    cpu.write_data(0x102, 0x77);

    cpu.run_for_cycles(2);
    assert!(cpu.has_pending_continuation());

    cpu.tick();
    assert_eq!(cpu.read_data(0x050), 0x77);
    assert_eq!(cpu.pc(), 0x04);
}

#[test]
fn test_movss() {
    // MOVSS [1], [3]
    let mut cpu = setup_cpu(&[0xEB81, 0xF003]);
    set_fsr(&mut cpu, 2, 0x100);
    cpu.write_data(0x101, 0x3C);

    cpu.run_for_cycles(3);
    assert_eq!(cpu.read_data(0x103), 0x3C);
    assert_eq!(cpu.fsr(2), 0x100);
}

// ========== Indexed Literal Offset ==========

#[test]
fn test_access_operand_is_fsr2_relative() {
    // MOVF 0x05, W (access)
    let mut cpu = setup_cpu(&[0x5005]);
    set_fsr(&mut cpu, 2, 0x200);
    cpu.write_data(0x205, 0x66);
    cpu.write_data(0x005, 0x11);

    cpu.run_for_cycles(2);
    assert_eq!(cpu.wreg(), 0x66);
}

#[test]
fn test_access_ram_above_0x60_unchanged() {
    // MOVF 0x60, W (access) ; MOVF 0x05, W (banked)
    let mut cpu = setup_cpu(&[0x5060, 0x5105]);
    set_fsr(&mut cpu, 2, 0x200);
    cpu.write_data(0x060, 0x12);
    cpu.write_data(0x005, 0x34);

    cpu.run_for_cycles(2);
    assert_eq!(cpu.wreg(), 0x12);
    cpu.tick();
    assert_eq!(cpu.wreg(), 0x34);
}

#[test]
fn test_indexed_bit_operation() {
    // BSF [0x10], 3
    let mut cpu = setup_cpu(&[0x8610]);
    set_fsr(&mut cpu, 2, 0x300);
    cpu.run_for_cycles(2);
    assert_eq!(cpu.read_data(0x310), 0x08);
    assert_eq!(cpu.read_data(0x010), 0x00);
}

// ========== XINST off ==========

#[test]
fn test_extended_encodings_are_nops_when_disabled() {
    // ADDFSR 0, 5 ; PUSHL 0x5A ; MOVLW 1
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.attach_program(Box::new(Memory::from_words(0, &[0xE805, 0xEA5A, 0x0E01])));
    cpu.attach_data(Box::new(Memory::new(0, 0xF00)));
    set_fsr(&mut cpu, 2, 0x100);

    cpu.run_for_cycles(4);
    assert_eq!(cpu.fsr(0), 0);
    assert_eq!(cpu.fsr(2), 0x100);
    assert_eq!(cpu.read_data(0x100), 0);
    assert_eq!(cpu.wreg(), 1);
}

#[test]
fn test_access_operand_not_indexed_when_disabled() {
    // MOVF 0x05, W (access)
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.attach_program(Box::new(Memory::from_words(0, &[0x5005])));
    cpu.attach_data(Box::new(Memory::new(0, 0xF00)));
    set_fsr(&mut cpu, 2, 0x200);
    cpu.write_data(0x005, 0x11);

    cpu.run_for_cycles(2);
    assert_eq!(cpu.wreg(), 0x11);
}
