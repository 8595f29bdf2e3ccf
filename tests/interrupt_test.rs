//! Tests for interrupt vectoring, priority levels, RETFIE and wake-up.

use libpic18::{registers, Cpu, CpuConfig, EventObserver, Interrupt, InterruptConfig, Memory};
use std::cell::RefCell;
use std::rc::Rc;

const PIE1: u16 = 0xF9D;
const PIR1: u16 = 0xF9E;
const IPR1: u16 = 0xF9F;

const GIEH: u8 = 0x80;
const GIEL: u8 = 0x40;
const IPEN: u8 = 0x80;

/// Main loop spinning at 0x00, a high priority handler at 0x08 loading 0x42
/// and a low priority handler at 0x18 loading 0x24. Both handlers clear
/// PIR1 bit 3 before RETFIE.
fn handler_program() -> Vec<u16> {
    let mut words = vec![0x0000; 16];
    words[0] = 0xD7FF; // BRA $
    words[4] = 0x0E42; // MOVLW 0x42
    words[5] = 0x969E; // BCF PIR1, 3
    words[6] = 0x0010; // RETFIE
    words[12] = 0x0E24; // MOVLW 0x24
    words[13] = 0x969E; // BCF PIR1, 3
    words[14] = 0x0010; // RETFIE
    words
}

fn setup_cpu(program: &[u16]) -> Cpu {
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.attach_program(Box::new(Memory::from_words(0, program)));
    cpu.attach_data(Box::new(Memory::new(0, 0xF00)));
    cpu
}

fn register_source(cpu: &mut Cpu, bit: u8) -> Interrupt {
    cpu.register_interrupt(InterruptConfig::peripheral("TEST", 1, bit).unwrap())
        .unwrap()
}

#[derive(Default)]
struct Recorder {
    events: Vec<&'static str>,
}

impl EventObserver for Recorder {
    fn sleep(&mut self) {
        self.events.push("sleep");
    }

    fn wake_up(&mut self) {
        self.events.push("wake");
    }
}

// ========== Priority Mode ==========

#[test]
fn test_high_priority_interrupt() {
    let mut cpu = setup_cpu(&handler_program());
    let source = register_source(&mut cpu, 3);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.write_data(PIE1, 0x08);

    // Settle into the main loop
    cpu.run_for_cycles(3);
    assert_eq!(cpu.pc(), 0x00);

    source.raise();
    assert!(cpu.interrupts().high_pending());
    assert!(!cpu.interrupts().high_enable());

    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
    assert_eq!(cpu.stack().pointer(), 1);
    assert_eq!(cpu.stack().top(), 0x00);
    assert!(!cpu.interrupts().high_pending());

    // Fetch, MOVLW, BCF, RETFIE
    cpu.run_for_cycles(4);
    assert_eq!(cpu.wreg(), 0x42);
    assert_eq!(cpu.pc(), 0x00);
    assert_eq!(cpu.stack().pointer(), 0);
    assert!(!source.is_requested());
    assert!(cpu.interrupts().high_enable());
    assert!(cpu.interrupts().low_enable());
}

#[test]
fn test_low_priority_interrupt() {
    let mut cpu = setup_cpu(&handler_program());
    let source = register_source(&mut cpu, 3);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.write_data(PIE1, 0x08);
    cpu.write_data(IPR1, 0x00);
    cpu.run_for_cycles(3);

    source.raise();
    assert!(cpu.interrupts().low_pending());
    assert!(cpu.interrupts().high_enable());
    assert!(!cpu.interrupts().low_enable());

    cpu.tick();
    assert_eq!(cpu.pc(), 0x18);

    cpu.run_for_cycles(4);
    assert_eq!(cpu.wreg(), 0x24);
    assert_eq!(cpu.pc(), 0x00);
    assert!(cpu.interrupts().low_enable());
    assert_eq!(cpu.read_data(registers::INTCON) & (GIEH | GIEL), GIEH | GIEL);
}

#[test]
fn test_vector_saves_context() {
    let mut program = handler_program();
    // High handler: MOVLW 0x42 ; MOVLB 5 ; BCF PIR1, 3 ; RETFIE FAST
    program[5] = 0x0105;
    program[6] = 0x969E;
    program[7] = 0x0011;

    let mut cpu = setup_cpu(&program);
    let source = register_source(&mut cpu, 3);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH);
    cpu.write_data(PIE1, 0x08);
    cpu.set_wreg(0x99);
    cpu.write_data(registers::BSR, 0x02);
    cpu.run_for_cycles(3);

    source.raise();
    cpu.run_for_cycles(1 + 1 + 2);
    assert_eq!(cpu.wreg(), 0x42);
    assert_eq!(cpu.bsr(), 5);

    cpu.run_for_cycles(2);
    assert_eq!(cpu.pc(), 0x00);
    assert_eq!(cpu.wreg(), 0x99);
    assert_eq!(cpu.bsr(), 0x02);
}

#[test]
fn test_same_level_masked_until_retfie() {
    let mut cpu = setup_cpu(&handler_program());
    let first = register_source(&mut cpu, 3);
    let second = register_source(&mut cpu, 4);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.write_data(PIE1, 0x18);
    cpu.run_for_cycles(3);

    first.raise();
    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);

    // Second high priority request waits for GIEH
    second.raise();
    assert!(!cpu.interrupts().high_pending());

    cpu.run_for_cycles(4);
    assert_eq!(cpu.pc(), 0x00);

    // RETFIE re-enabled GIEH and the still-flagged request fires again
    assert!(cpu.interrupts().high_pending());
    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
    assert!(second.is_requested());
}

#[test]
fn test_high_preempts_low_handler() {
    let mut program = handler_program();
    program[5] = 0x989E; // high handler clears PIR1 bit 4

    let mut cpu = setup_cpu(&program);
    let low = register_source(&mut cpu, 3);
    let high = register_source(&mut cpu, 4);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.write_data(PIE1, 0x18);
    cpu.write_data(IPR1, 0x10);
    cpu.run_for_cycles(3);

    low.raise();
    cpu.run_for_cycles(2);
    assert_eq!(cpu.pc(), 0x18);

    high.raise();
    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
    assert_eq!(cpu.stack().pointer(), 2);
    assert_eq!(cpu.stack().top(), 0x18);

    // High handler returns into the low handler with GIEL still clear
    cpu.run_for_cycles(4);
    assert_eq!(cpu.pc(), 0x18);
    assert_eq!(cpu.wreg(), 0x42);
    assert!(cpu.interrupts().high_enable());
    assert!(!cpu.interrupts().low_enable());
    assert!(!cpu.interrupts().low_pending());

    cpu.run_for_cycles(4);
    assert_eq!(cpu.pc(), 0x00);
    assert_eq!(cpu.wreg(), 0x24);
    assert_eq!(cpu.stack().pointer(), 0);
    assert!(cpu.interrupts().low_enable());
    assert!(!low.is_requested());
    assert!(!high.is_requested());
}

#[test]
fn test_simultaneous_requests_run_high_handler_first() {
    let mut program = handler_program();
    program[5] = 0x989E; // high handler clears PIR1 bit 4

    let mut cpu = setup_cpu(&program);
    let low = register_source(&mut cpu, 3);
    let high = register_source(&mut cpu, 4);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.write_data(PIE1, 0x18);
    cpu.write_data(IPR1, 0x10);
    cpu.run_for_cycles(3);

    low.raise();
    high.raise();
    assert!(cpu.interrupts().high_pending());
    assert!(cpu.interrupts().low_pending());

    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);

    // The low request stays latched while the high handler runs
    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
    assert_eq!(cpu.stack().pointer(), 1);
    assert!(cpu.interrupts().low_pending());

    cpu.run_for_cycles(3);
    assert_eq!(cpu.wreg(), 0x42);
    assert_eq!(cpu.pc(), 0x00);
    assert_eq!(cpu.stack().pointer(), 0);

    cpu.tick();
    assert_eq!(cpu.pc(), 0x18);
    assert_eq!(cpu.stack().top(), 0x00);

    cpu.run_for_cycles(4);
    assert_eq!(cpu.wreg(), 0x24);
    assert_eq!(cpu.pc(), 0x00);
    assert!(!low.is_requested());
    assert!(!high.is_requested());
}

// ========== Compatibility Mode ==========

#[test]
fn test_compatibility_mode_needs_gie_and_peie() {
    let mut cpu = setup_cpu(&handler_program());
    let source = register_source(&mut cpu, 3);
    cpu.write_data(PIE1, 0x08);
    cpu.write_data(registers::INTCON, GIEH);
    cpu.run_for_cycles(3);

    source.raise();
    cpu.run_for_cycles(6);
    assert_eq!(cpu.stack().pointer(), 0);
    assert!(cpu.pc() < 0x08);

    // Setting PEIE with the request still flagged vectors to 0x08
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    assert!(cpu.interrupts().high_pending());
    assert!(!cpu.interrupts().high_enable());
    assert!(cpu.interrupts().low_enable());

    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);

    cpu.run_for_cycles(4);
    assert_eq!(cpu.wreg(), 0x42);
    assert!(cpu.interrupts().high_enable());
}

#[test]
fn test_compatibility_mode_ignores_priority_bit() {
    let mut cpu = setup_cpu(&handler_program());
    let source = register_source(&mut cpu, 3);
    cpu.write_data(PIE1, 0x08);
    cpu.write_data(IPR1, 0x00);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.run_for_cycles(3);

    source.raise();
    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
}

// ========== Masking ==========

#[test]
fn test_disabled_source_never_vectors() {
    let mut cpu = setup_cpu(&handler_program());
    let source = register_source(&mut cpu, 3);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.run_for_cycles(3);

    source.raise();
    cpu.run_for_cycles(10);
    assert_eq!(cpu.stack().pointer(), 0);
    assert!(cpu.pc() < 0x08);
    assert!(source.is_requested());
    assert_eq!(cpu.read_data(PIR1) & 0x08, 0x08);
}

#[test]
fn test_software_raised_request() {
    // Firmware sets its own request flag: BSF PIR1, 3
    let mut program = handler_program();
    program[0] = 0x869E;
    program[1] = 0xD7FF;

    let mut cpu = setup_cpu(&program);
    let source = register_source(&mut cpu, 3);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH);
    cpu.write_data(PIE1, 0x08);

    cpu.run_for_cycles(2);
    assert!(source.is_requested());
    assert!(cpu.interrupts().high_pending());

    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
    assert_eq!(cpu.stack().top(), 0x02);
}

#[test]
fn test_power_on_reset_disables_sources() {
    let mut cpu = setup_cpu(&handler_program());
    let source = register_source(&mut cpu, 3);
    cpu.write_data(registers::INTCON, GIEH | GIEL);
    cpu.write_data(PIE1, 0x08);
    source.raise();

    cpu.power_on_reset();
    assert!(!source.is_enabled());
    assert!(!source.is_requested());
    assert!(!cpu.interrupts().high_pending());
    assert_eq!(cpu.read_data(registers::INTCON) & (GIEH | GIEL), 0);
}

// ========== Sleep and Wake-up ==========

#[test]
fn test_interrupt_wakes_sleeping_core() {
    // SLEEP ; BRA $
    let mut program = handler_program();
    program[0] = 0x0003;
    program[1] = 0xD7FF;

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut cpu = setup_cpu(&program);
    cpu.set_observer(Box::new(Rc::clone(&recorder)));
    let source = register_source(&mut cpu, 3);
    cpu.write_data(registers::RCON, IPEN);
    cpu.write_data(registers::INTCON, GIEH);
    cpu.write_data(PIE1, 0x08);

    cpu.run_for_cycles(2);
    assert!(cpu.is_asleep());

    source.raise();
    assert!(!cpu.is_asleep());
    assert_eq!(recorder.borrow().events, vec!["sleep", "wake"]);

    cpu.tick();
    assert_eq!(cpu.pc(), 0x08);
    assert_eq!(cpu.stack().top(), 0x02);
}

#[test]
fn test_masked_request_does_not_wake() {
    // SLEEP
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut cpu = setup_cpu(&[0x0003]);
    cpu.set_observer(Box::new(Rc::clone(&recorder)));
    let source = register_source(&mut cpu, 3);

    cpu.run_for_cycles(2);
    source.raise();
    assert!(cpu.is_asleep());
    assert_eq!(recorder.borrow().events, vec!["sleep"]);
}
