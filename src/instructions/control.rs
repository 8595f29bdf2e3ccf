//! # Control Flow Instructions
//!
//! Calls, returns and core control. CALL and GOTO fetch their second word straight
//! from program memory (the pipeline is flushed anyway), so they finish in the
//! cycle that decodes them and the flush accounts for the second cycle.

use crate::cpu::Cpu;
use crate::instructions::branches::relative;
use crate::opcodes::Instruction;

/// Word address from the two halves of a GOTO/CALL, as a byte address.
fn absolute_target(first: Instruction, second: Instruction) -> u32 {
    (((second.target_high() as u32) << 8) | first.target_low() as u32) << 1
}

pub(crate) fn execute_goto(cpu: &mut Cpu, inst: Instruction) {
    let second = Instruction(cpu.program.read_word(cpu.pc));
    cpu.jump(absolute_target(inst, second));
}

/// CALL k, s: pushes the address after both words.
pub(crate) fn execute_call(cpu: &mut Cpu, inst: Instruction) {
    let second = Instruction(cpu.program.read_word(cpu.pc));
    let target = absolute_target(inst, second);

    if !cpu.push_return(cpu.pc + 2) {
        return;
    }
    if inst.call_fast() {
        cpu.save_shadow();
    }
    cpu.jump(target);
}

pub(crate) fn execute_rcall(cpu: &mut Cpu, inst: Instruction) {
    let target = relative(cpu.pc, inst.offset11());
    if !cpu.push_return(cpu.pc) {
        return;
    }
    cpu.jump(target);
}

/// Pops the return address and jumps there. Returns false if the core reset.
fn return_to_caller(cpu: &mut Cpu, fast: bool) -> bool {
    let Some(address) = cpu.pop_return() else {
        return false;
    };
    if fast {
        cpu.restore_shadow();
    }
    cpu.jump(address);
    true
}

pub(crate) fn execute_return(cpu: &mut Cpu, inst: Instruction) {
    return_to_caller(cpu, inst.return_fast());
}

/// RETLW k: W = k, then return.
pub(crate) fn execute_retlw(cpu: &mut Cpu, inst: Instruction) {
    cpu.wreg = inst.literal();
    return_to_caller(cpu, false);
}

/// RETFIE s: return and re-enable the interrupt level that was being serviced.
pub(crate) fn execute_retfie(cpu: &mut Cpu, inst: Instruction) {
    if !return_to_caller(cpu, inst.return_fast()) {
        return;
    }

    // A high priority handler may have preempted a low priority one
    let from_low = if cpu.in_high_handler {
        cpu.in_high_handler = false;
        false
    } else {
        std::mem::take(&mut cpu.in_low_handler)
    };

    log::debug!(
        "RETFIE to {:#08X} ({} priority handler)",
        cpu.pc,
        if from_low { "low" } else { "high" }
    );
    cpu.interrupts.return_from_interrupt(from_low);
}

/// PUSH: pushes the address of the next instruction.
pub(crate) fn execute_push(cpu: &mut Cpu) {
    cpu.push_return(cpu.pc);
}

/// POP: discards the top of stack.
pub(crate) fn execute_pop(cpu: &mut Cpu) {
    cpu.pop_return();
}

pub(crate) fn execute_reset(cpu: &mut Cpu) {
    cpu.mclr_reset();
}

pub(crate) fn execute_sleep(cpu: &mut Cpu) {
    log::debug!("SLEEP at {:#08X}", cpu.pc.wrapping_sub(2));
    cpu.signals.sleep();
}

/// DAW: decimal adjust W.
pub(crate) fn execute_daw(cpu: &mut Cpu) {
    cpu.wreg = cpu.alu.decimal_adjust(cpu.wreg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_target() {
        // GOTO 0x1234 (word address 0x091A)
        assert_eq!(
            absolute_target(Instruction(0xEF1A), Instruction(0xF009)),
            0x1234
        );
        // Full 20-bit word address
        assert_eq!(
            absolute_target(Instruction(0xEFFF), Instruction(0xFFFF)),
            0x1F_FFFE
        );
    }
}
