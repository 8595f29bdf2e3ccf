//! # Branches and Skips
//!
//! Relative branches add a signed word offset to the PC (which already points at
//! the next instruction) and flush the pipeline. Skip instructions step over the
//! next word the same way; landing on the second word of a two-word instruction
//! executes it as NOP.
//!
//! None of these affect STATUS.

use crate::alu::Status;
use crate::cpu::Cpu;
use crate::instructions::alu::store;
use crate::opcodes::{Instruction, Opcode};

/// Branch target for a signed word offset relative to the current PC.
pub(crate) fn relative(pc: u32, words: i32) -> u32 {
    pc.wrapping_add((words * 2) as u32)
}

fn skip_if(cpu: &mut Cpu, condition: bool) {
    if condition {
        cpu.skip();
    }
}

/// Reads `f`, returns it alongside W for comparisons.
fn compare_operands(cpu: &mut Cpu, inst: Instruction) -> (u8, u8) {
    let address = cpu.file_address(inst);
    (cpu.bus_read(address), cpu.wreg)
}

pub(crate) fn execute_cpfseq(cpu: &mut Cpu, inst: Instruction) {
    let (f, w) = compare_operands(cpu, inst);
    skip_if(cpu, f == w);
}

pub(crate) fn execute_cpfsgt(cpu: &mut Cpu, inst: Instruction) {
    let (f, w) = compare_operands(cpu, inst);
    skip_if(cpu, f > w);
}

pub(crate) fn execute_cpfslt(cpu: &mut Cpu, inst: Instruction) {
    let (f, w) = compare_operands(cpu, inst);
    skip_if(cpu, f < w);
}

pub(crate) fn execute_tstfsz(cpu: &mut Cpu, inst: Instruction) {
    let (f, _) = compare_operands(cpu, inst);
    skip_if(cpu, f == 0);
}

/// Adds `delta` to `f`, stores per `d` and returns the result.
fn step_file(cpu: &mut Cpu, inst: Instruction, delta: u8) -> u8 {
    let address = cpu.file_address(inst);
    let result = cpu.bus_read(address).wrapping_add(delta);
    store(cpu, inst, address, result);
    result
}

pub(crate) fn execute_decfsz(cpu: &mut Cpu, inst: Instruction) {
    let result = step_file(cpu, inst, 0xFF);
    skip_if(cpu, result == 0);
}

pub(crate) fn execute_dcfsnz(cpu: &mut Cpu, inst: Instruction) {
    let result = step_file(cpu, inst, 0xFF);
    skip_if(cpu, result != 0);
}

pub(crate) fn execute_incfsz(cpu: &mut Cpu, inst: Instruction) {
    let result = step_file(cpu, inst, 1);
    skip_if(cpu, result == 0);
}

pub(crate) fn execute_infsnz(cpu: &mut Cpu, inst: Instruction) {
    let result = step_file(cpu, inst, 1);
    skip_if(cpu, result != 0);
}

pub(crate) fn execute_btfsc(cpu: &mut Cpu, inst: Instruction) {
    let (f, _) = compare_operands(cpu, inst);
    skip_if(cpu, f & (1 << inst.bit()) == 0);
}

pub(crate) fn execute_btfss(cpu: &mut Cpu, inst: Instruction) {
    let (f, _) = compare_operands(cpu, inst);
    skip_if(cpu, f & (1 << inst.bit()) != 0);
}

/// BC, BN, BNC, BNN, BNOV, BNZ, BOV, BZ
pub(crate) fn execute_conditional(cpu: &mut Cpu, opcode: Opcode, inst: Instruction) {
    let status = cpu.alu.status();
    let taken = match opcode {
        Opcode::Bc => status.contains(Status::C),
        Opcode::Bnc => !status.contains(Status::C),
        Opcode::Bn => status.contains(Status::N),
        Opcode::Bnn => !status.contains(Status::N),
        Opcode::Bov => status.contains(Status::OV),
        Opcode::Bnov => !status.contains(Status::OV),
        Opcode::Bz => status.contains(Status::Z),
        Opcode::Bnz => !status.contains(Status::Z),
        _ => false,
    };

    if taken {
        let target = relative(cpu.pc, inst.offset8());
        cpu.jump(target);
    }
}

pub(crate) fn execute_bra(cpu: &mut Cpu, inst: Instruction) {
    let target = relative(cpu.pc, inst.offset11());
    cpu.jump(target);
}
