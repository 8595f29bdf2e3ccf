//! # Byte-Oriented File Register Operations
//!
//! Operations of the form `OP f, d, a`: read the file register, combine it with W
//! in the ALU and store the result in W (`d = 0`) or back into the file register
//! (`d = 1`). Flag behaviour lives in [`crate::alu::Alu`].

use crate::alu::Alu;
use crate::cpu::Cpu;
use crate::opcodes::Instruction;

/// Reads `f`, computes `op(alu, f, w)` and stores according to `d`.
fn byte_op(cpu: &mut Cpu, inst: Instruction, op: impl FnOnce(&mut Alu, u8, u8) -> u8) {
    let address = cpu.file_address(inst);
    let value = cpu.bus_read(address);
    let result = op(&mut cpu.alu, value, cpu.wreg);
    store(cpu, inst, address, result);
}

/// Writes a result to W or to the file register selected by the `d` bit.
pub(crate) fn store(cpu: &mut Cpu, inst: Instruction, address: u16, result: u8) {
    if inst.to_file() {
        cpu.bus_write(address, result);
    } else {
        cpu.wreg = result;
    }
}

pub(crate) fn execute_addwf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.add(w, f));
}

pub(crate) fn execute_addwfc(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.add_with_carry(w, f));
}

pub(crate) fn execute_andwf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.and(w, f));
}

pub(crate) fn execute_iorwf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.or(w, f));
}

pub(crate) fn execute_xorwf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.xor(w, f));
}

pub(crate) fn execute_comf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| alu.complement(f));
}

pub(crate) fn execute_decf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| alu.sub(f, 1));
}

pub(crate) fn execute_incf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| alu.add(f, 1));
}

/// SUBFWB: `W - f - !C`
pub(crate) fn execute_subfwb(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.sub_with_borrow(w, f));
}

/// SUBWF: `f - W`
pub(crate) fn execute_subwf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.sub(f, w));
}

/// SUBWFB: `f - W - !C`
pub(crate) fn execute_subwfb(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, w| alu.sub_with_borrow(f, w));
}

pub(crate) fn execute_rlcf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| alu.rotate_left_carry(f));
}

pub(crate) fn execute_rlncf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| alu.rotate_left(f));
}

pub(crate) fn execute_rrcf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| alu.rotate_right_carry(f));
}

pub(crate) fn execute_rrncf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| alu.rotate_right(f));
}

/// SWAPF: exchange nibbles, no flags.
pub(crate) fn execute_swapf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |_, f, _| f.rotate_left(4));
}

/// MOVF: copy `f` to the destination, updating Z and N.
pub(crate) fn execute_movf(cpu: &mut Cpu, inst: Instruction) {
    byte_op(cpu, inst, |alu, f, _| {
        alu.update_zero_negative(f);
        f
    });
}

pub(crate) fn execute_movwf(cpu: &mut Cpu, inst: Instruction) {
    let address = cpu.file_address(inst);
    cpu.bus_write(address, cpu.wreg);
}

pub(crate) fn execute_clrf(cpu: &mut Cpu, inst: Instruction) {
    let address = cpu.file_address(inst);
    cpu.bus_write(address, 0);
    cpu.alu.update_zero(0);
}

pub(crate) fn execute_setf(cpu: &mut Cpu, inst: Instruction) {
    let address = cpu.file_address(inst);
    cpu.bus_write(address, 0xFF);
}

/// NEGF: `f = -f`, always stored to the file register.
pub(crate) fn execute_negf(cpu: &mut Cpu, inst: Instruction) {
    let address = cpu.file_address(inst);
    let value = cpu.bus_read(address);
    let result = cpu.alu.negate(value);
    cpu.bus_write(address, result);
}

/// MULWF: `PRODH:PRODL = W * f`
pub(crate) fn execute_mulwf(cpu: &mut Cpu, inst: Instruction) {
    let address = cpu.file_address(inst);
    let value = cpu.bus_read(address);
    cpu.alu.mul(cpu.wreg, value);
}
