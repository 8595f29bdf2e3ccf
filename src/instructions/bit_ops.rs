//! Bit-oriented read-modify-write operations. None of them touch STATUS
//! (unless STATUS itself is the target).

use crate::cpu::Cpu;
use crate::opcodes::Instruction;

fn modify_bit(cpu: &mut Cpu, inst: Instruction, op: impl FnOnce(u8, u8) -> u8) {
    let address = cpu.file_address(inst);
    let value = cpu.bus_read(address);
    cpu.bus_write(address, op(value, 1 << inst.bit()));
}

pub(crate) fn execute_bcf(cpu: &mut Cpu, inst: Instruction) {
    modify_bit(cpu, inst, |value, mask| value & !mask);
}

pub(crate) fn execute_bsf(cpu: &mut Cpu, inst: Instruction) {
    modify_bit(cpu, inst, |value, mask| value | mask);
}

pub(crate) fn execute_btg(cpu: &mut Cpu, inst: Instruction) {
    modify_bit(cpu, inst, |value, mask| value ^ mask);
}
