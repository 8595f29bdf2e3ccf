//! # Extended Instruction Set
//!
//! Only dispatched when XINST is enabled. FSR2 doubles as a software stack
//! pointer for these: PUSHL stores through it and MOVSF/MOVSS address relative
//! to it.

use crate::cpu::{Continuation, Cpu};
use crate::opcodes::Instruction;

const FSR2: usize = 2;

fn adjust_fsr(cpu: &mut Cpu, n: usize, delta: i32) {
    if n > FSR2 {
        return;
    }
    let value = (cpu.bank.fsr(n) as i32 + delta) as u16;
    cpu.bank.set_fsr(n, value);
}

/// FSR2 plus a MOVSF/MOVSS offset.
fn stack_address(cpu: &Cpu, offset: u8) -> u16 {
    (cpu.bank.fsr(FSR2) + offset as u16) & 0x0FFF
}

pub(crate) fn execute_addfsr(cpu: &mut Cpu, inst: Instruction) {
    adjust_fsr(cpu, inst.xinst_fsr(), inst.xinst_literal() as i32);
}

pub(crate) fn execute_subfsr(cpu: &mut Cpu, inst: Instruction) {
    adjust_fsr(cpu, inst.xinst_fsr(), -(inst.xinst_literal() as i32));
}

/// ADDULNK k: FSR2 += k, then return.
pub(crate) fn execute_addulnk(cpu: &mut Cpu, inst: Instruction) {
    adjust_fsr(cpu, FSR2, inst.xinst_literal() as i32);
    if let Some(address) = cpu.pop_return() {
        cpu.jump(address);
    }
}

/// SUBULNK k: FSR2 -= k, then return.
pub(crate) fn execute_subulnk(cpu: &mut Cpu, inst: Instruction) {
    adjust_fsr(cpu, FSR2, -(inst.xinst_literal() as i32));
    if let Some(address) = cpu.pop_return() {
        cpu.jump(address);
    }
}

/// CALLW: call to PCLATU:PCLATH:W.
pub(crate) fn execute_callw(cpu: &mut Cpu) {
    let target = ((cpu.pclatu as u32) << 16) | ((cpu.pclath as u32) << 8) | cpu.wreg as u32;
    if !cpu.push_return(cpu.pc) {
        return;
    }
    cpu.jump(target);
}

/// PUSHL k: `[FSR2] = k`, then FSR2 - 1.
pub(crate) fn execute_pushl(cpu: &mut Cpu, inst: Instruction) {
    let address = cpu.bank.fsr(FSR2);
    cpu.bus_write(address, inst.literal());
    adjust_fsr(cpu, FSR2, -1);
}

/// MOVSF zs, fd: the first word reads `[FSR2 + zs]`.
pub(crate) fn execute_movsf(cpu: &mut Cpu, inst: Instruction) {
    let source = stack_address(cpu, inst.stack_offset());
    let value = cpu.bus_read(source);
    cpu.pending = Some(Continuation::MoveToFile { value });
}

pub(crate) fn complete_movsf(cpu: &mut Cpu, value: u8, inst: Instruction) {
    cpu.bus_write(inst.file12(), value);
}

/// MOVSS zs, zd: the first word reads `[FSR2 + zs]`.
pub(crate) fn execute_movss(cpu: &mut Cpu, inst: Instruction) {
    let source = stack_address(cpu, inst.stack_offset());
    let value = cpu.bus_read(source);
    cpu.pending = Some(Continuation::MoveStack { value });
}

pub(crate) fn complete_movss(cpu: &mut Cpu, value: u8, inst: Instruction) {
    let destination = stack_address(cpu, inst.stack_offset());
    cpu.bus_write(destination, value);
}
