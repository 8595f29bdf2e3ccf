//! Tests for two-word instructions completed by a continuation (MOVFF, LFSR).

use libpic18::{registers, Cpu, CpuConfig, InterruptConfig, Memory};

fn setup_cpu(program: &[u16]) -> Cpu {
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.attach_program(Box::new(Memory::from_words(0, program)));
    cpu.attach_data(Box::new(Memory::new(0, 0xF00)));
    cpu
}

// ========== MOVFF ==========

#[test]
fn test_movff_copies_across_banks() {
    // MOVFF 0x020, 0x1A0
    let mut cpu = setup_cpu(&[0xC020, 0xF1A0]);
    cpu.write_data(0x020, 0x5C);

    cpu.run_for_cycles(2);
    assert!(cpu.has_pending_continuation());
    assert_eq!(cpu.read_data(0x1A0), 0x00);

    cpu.tick();
    assert!(!cpu.has_pending_continuation());
    assert_eq!(cpu.read_data(0x1A0), 0x5C);
    assert_eq!(cpu.pc(), 0x04);
    assert!(!cpu.is_flushing());
}

#[test]
fn test_movff_reads_source_in_first_cycle() {
    // MOVFF 0x020, 0x021
    let mut cpu = setup_cpu(&[0xC020, 0xF021]);
    cpu.write_data(0x020, 0x11);

    cpu.run_for_cycles(2);
    cpu.write_data(0x020, 0x22);
    cpu.tick();
    assert_eq!(cpu.read_data(0x021), 0x11);
}

#[test]
fn test_movff_to_wreg() {
    // MOVFF 0x020, WREG
    let mut cpu = setup_cpu(&[0xC020, 0xFFE8]);
    cpu.write_data(0x020, 0x3E);
    cpu.run_for_cycles(3);
    assert_eq!(cpu.wreg(), 0x3E);
}

#[test]
fn test_movff_leaves_flags() {
    // MOVFF 0x020, 0x021
    let mut cpu = setup_cpu(&[0xC020, 0xF021]);
    cpu.run_for_cycles(3);
    assert_eq!(cpu.status(), libpic18::Status::empty());
}

#[test]
fn test_movff_to_pcl_ignored() {
    // MOVFF 0x020, PCL
    let mut cpu = setup_cpu(&[0xC020, 0xFFF9, 0x0E07]);
    cpu.write_data(0x020, 0x40);

    cpu.run_for_cycles(3);
    assert_eq!(cpu.pc(), 0x04);
    assert!(!cpu.is_flushing());

    cpu.tick();
    assert_eq!(cpu.wreg(), 0x07);
}

#[test]
fn test_movff_to_tos_ignored() {
    // PUSH ; MOVFF 0x020, TOSL
    let mut cpu = setup_cpu(&[0x0005, 0xC020, 0xFFFD]);
    cpu.write_data(0x020, 0x40);

    cpu.run_for_cycles(4);
    assert_eq!(cpu.stack().top(), 0x02);
}

// ========== Second word ==========

#[test]
fn test_second_word_alone_is_nop() {
    // NOP (second-word form) ; MOVLW 3
    let mut cpu = setup_cpu(&[0xF123, 0x0E03]);
    cpu.run_for_cycles(3);
    assert_eq!(cpu.wreg(), 0x03);
    assert_eq!(cpu.pc(), 0x04);
}

#[test]
fn test_lfsr_to_missing_fsr_is_nop() {
    // LFSR 3, 0x055 ; MOVLW 7
    let mut cpu = setup_cpu(&[0xEE30, 0xF055, 0x0E07]);
    cpu.run_for_cycles(4);
    assert_eq!(cpu.wreg(), 0x07);
    assert_eq!(cpu.fsr(0), 0);
    assert_eq!(cpu.fsr(1), 0);
    assert_eq!(cpu.fsr(2), 0);
}

#[test]
fn test_set_pc_discards_continuation() {
    // MOVFF 0x020, 0x021
    let mut cpu = setup_cpu(&[0xC020, 0xF021]);
    cpu.write_data(0x020, 0x99);
    cpu.run_for_cycles(2);
    assert!(cpu.has_pending_continuation());

    cpu.set_pc(0x00);
    assert!(!cpu.has_pending_continuation());
    cpu.tick();
    assert_eq!(cpu.read_data(0x021), 0x00);
}

// ========== Interrupts ==========

#[test]
fn test_interrupt_waits_for_second_word() {
    // 0x00: MOVFF 0x020, 0x021
    // 0x04: BRA $
    let mut cpu = setup_cpu(&[0xC020, 0xF021, 0xD7FF]);
    let source = cpu
        .register_interrupt(InterruptConfig::peripheral("TEST", 1, 0).unwrap())
        .unwrap();
    cpu.write_data(registers::RCON, 0x80);
    cpu.write_data(registers::INTCON, 0x80);
    cpu.write_data(0xF9D, 0x01);
    cpu.write_data(0x020, 0xAB);

    cpu.run_for_cycles(2);
    source.raise();
    assert!(cpu.interrupts().high_pending());

    // The continuation completes before vectoring
    cpu.tick();
    assert_eq!(cpu.read_data(0x021), 0xAB);
    assert_eq!(cpu.pc(), 0x04);
    assert_eq!(cpu.stack().pointer(), 0);

    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
    assert_eq!(cpu.stack().top(), 0x04);
}
