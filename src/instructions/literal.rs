//! Literal operations: W combined with the 8-bit constant in the instruction.

use crate::cpu::Cpu;
use crate::opcodes::Instruction;

pub(crate) fn execute_movlw(cpu: &mut Cpu, inst: Instruction) {
    cpu.wreg = inst.literal();
}

pub(crate) fn execute_addlw(cpu: &mut Cpu, inst: Instruction) {
    cpu.wreg = cpu.alu.add(cpu.wreg, inst.literal());
}

pub(crate) fn execute_andlw(cpu: &mut Cpu, inst: Instruction) {
    cpu.wreg = cpu.alu.and(cpu.wreg, inst.literal());
}

pub(crate) fn execute_iorlw(cpu: &mut Cpu, inst: Instruction) {
    cpu.wreg = cpu.alu.or(cpu.wreg, inst.literal());
}

pub(crate) fn execute_xorlw(cpu: &mut Cpu, inst: Instruction) {
    cpu.wreg = cpu.alu.xor(cpu.wreg, inst.literal());
}

/// SUBLW k: `W = k - W`
pub(crate) fn execute_sublw(cpu: &mut Cpu, inst: Instruction) {
    cpu.wreg = cpu.alu.sub(inst.literal(), cpu.wreg);
}

pub(crate) fn execute_mullw(cpu: &mut Cpu, inst: Instruction) {
    cpu.alu.mul(cpu.wreg, inst.literal());
}

/// MOVLB k: only the low nibble reaches BSR.
pub(crate) fn execute_movlb(cpu: &mut Cpu, inst: Instruction) {
    cpu.bank.set_bsr(inst.literal() & 0x0F);
}
