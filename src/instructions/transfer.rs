//! # Data Transfers
//!
//! Two-word moves (LFSR, MOVFF) and table reads/writes between data and program
//! memory. Two-word moves leave a [`Continuation`] that the next cycle completes
//! with the second word.

use crate::cpu::{Continuation, Cpu};
use crate::opcodes::Instruction;
use crate::registers;

/// LFSR f, k: the first word loads the high nibble.
pub(crate) fn execute_lfsr(cpu: &mut Cpu, inst: Instruction) {
    let fsr = inst.lfsr_fsr();
    if fsr > 2 {
        return;
    }
    let low = cpu.bank.fsr(fsr) & 0x00FF;
    cpu.bank
        .set_fsr(fsr, ((inst.lfsr_high() as u16) << 8) | low);
    cpu.pending = Some(Continuation::LoadFsr { fsr });
}

pub(crate) fn complete_lfsr(cpu: &mut Cpu, fsr: usize, inst: Instruction) {
    let high = cpu.bank.fsr(fsr) & 0x0F00;
    cpu.bank.set_fsr(fsr, high | inst.literal() as u16);
}

/// MOVFF fs, fd: the first word reads the source.
pub(crate) fn execute_movff(cpu: &mut Cpu, inst: Instruction) {
    let value = cpu.bus_read(inst.file12());
    cpu.pending = Some(Continuation::MoveFile { value });
}

pub(crate) fn complete_movff(cpu: &mut Cpu, value: u8, inst: Instruction) {
    let destination = inst.file12();
    if matches!(
        destination,
        registers::PCL | registers::TOSU | registers::TOSH | registers::TOSL
    ) {
        log::warn!("MOVFF to {:#05X} ignored", destination);
        return;
    }
    cpu.bus_write(destination, value);
}

pub(crate) fn execute_tblrd(cpu: &mut Cpu, inst: Instruction) {
    cpu.table.table_read(&mut cpu.program, inst.table_action());
    cpu.flush = true;
}

pub(crate) fn execute_tblwt(cpu: &mut Cpu, inst: Instruction) {
    cpu.table.table_write(&mut cpu.program, inst.table_action());
    cpu.flush = true;
}
