//! # PIC18 Instruction Implementations
//!
//! This module contains the implementations of all PIC18 instructions, organized by
//! category. Each instruction is a standalone function taking the CPU and the
//! instruction word. By the time one runs, the PC already points past the
//! instruction; staged FSR updates are committed by the caller afterwards.
//!
//! ## Categories
//!
//! - **alu**: Byte-oriented file register operations (ADDWF, SUBWF, MOVF, RLCF, ...)
//! - **bit_ops**: Bit set/clear/toggle (BCF, BSF, BTG)
//! - **branches**: Relative branches and conditional skips (BZ, BRA, CPFSEQ, BTFSC, ...)
//! - **control**: Calls, returns, resets and core control (CALL, RETFIE, SLEEP, ...)
//! - **literal**: Literal operations (MOVLW, ADDLW, MOVLB, ...)
//! - **transfer**: Two-word moves and table access (MOVFF, LFSR, TBLRD, TBLWT)
//! - **extended**: Extended instruction set (ADDFSR, PUSHL, MOVSF, ...)

pub mod alu;
pub mod bit_ops;
pub mod branches;
pub mod control;
pub mod extended;
pub mod literal;
pub mod transfer;

use crate::cpu::{Continuation, Cpu};
use crate::opcodes::{Instruction, Opcode};

/// Executes a decoded single-cycle instruction (or the first word of a two-word one).
pub(crate) fn execute(cpu: &mut Cpu, opcode: Opcode, inst: Instruction) {
    use Opcode::*;
    match opcode {
        Addwf => alu::execute_addwf(cpu, inst),
        Addwfc => alu::execute_addwfc(cpu, inst),
        Andwf => alu::execute_andwf(cpu, inst),
        Clrf => alu::execute_clrf(cpu, inst),
        Comf => alu::execute_comf(cpu, inst),
        Decf => alu::execute_decf(cpu, inst),
        Incf => alu::execute_incf(cpu, inst),
        Iorwf => alu::execute_iorwf(cpu, inst),
        Movf => alu::execute_movf(cpu, inst),
        Movwf => alu::execute_movwf(cpu, inst),
        Mulwf => alu::execute_mulwf(cpu, inst),
        Negf => alu::execute_negf(cpu, inst),
        Rlcf => alu::execute_rlcf(cpu, inst),
        Rlncf => alu::execute_rlncf(cpu, inst),
        Rrcf => alu::execute_rrcf(cpu, inst),
        Rrncf => alu::execute_rrncf(cpu, inst),
        Setf => alu::execute_setf(cpu, inst),
        Subfwb => alu::execute_subfwb(cpu, inst),
        Subwf => alu::execute_subwf(cpu, inst),
        Subwfb => alu::execute_subwfb(cpu, inst),
        Swapf => alu::execute_swapf(cpu, inst),
        Xorwf => alu::execute_xorwf(cpu, inst),

        Bcf => bit_ops::execute_bcf(cpu, inst),
        Bsf => bit_ops::execute_bsf(cpu, inst),
        Btg => bit_ops::execute_btg(cpu, inst),

        Cpfseq => branches::execute_cpfseq(cpu, inst),
        Cpfsgt => branches::execute_cpfsgt(cpu, inst),
        Cpfslt => branches::execute_cpfslt(cpu, inst),
        Decfsz => branches::execute_decfsz(cpu, inst),
        Dcfsnz => branches::execute_dcfsnz(cpu, inst),
        Incfsz => branches::execute_incfsz(cpu, inst),
        Infsnz => branches::execute_infsnz(cpu, inst),
        Tstfsz => branches::execute_tstfsz(cpu, inst),
        Btfsc => branches::execute_btfsc(cpu, inst),
        Btfss => branches::execute_btfss(cpu, inst),
        Bc | Bn | Bnc | Bnn | Bnov | Bnz | Bov | Bz => {
            branches::execute_conditional(cpu, opcode, inst)
        }
        Bra => branches::execute_bra(cpu, inst),

        Call => control::execute_call(cpu, inst),
        Goto => control::execute_goto(cpu, inst),
        Rcall => control::execute_rcall(cpu, inst),
        Return => control::execute_return(cpu, inst),
        Retfie => control::execute_retfie(cpu, inst),
        Retlw => control::execute_retlw(cpu, inst),
        Push => control::execute_push(cpu),
        Pop => control::execute_pop(cpu),
        Reset => control::execute_reset(cpu),
        Sleep => control::execute_sleep(cpu),
        Daw => control::execute_daw(cpu),
        Clrwdt | Nop | Nop1 => {}

        Addlw => literal::execute_addlw(cpu, inst),
        Andlw => literal::execute_andlw(cpu, inst),
        Iorlw => literal::execute_iorlw(cpu, inst),
        Movlb => literal::execute_movlb(cpu, inst),
        Movlw => literal::execute_movlw(cpu, inst),
        Mullw => literal::execute_mullw(cpu, inst),
        Sublw => literal::execute_sublw(cpu, inst),
        Xorlw => literal::execute_xorlw(cpu, inst),

        Lfsr => transfer::execute_lfsr(cpu, inst),
        Movff => transfer::execute_movff(cpu, inst),
        Tblrd => transfer::execute_tblrd(cpu, inst),
        Tblwt => transfer::execute_tblwt(cpu, inst),

        Addfsr => extended::execute_addfsr(cpu, inst),
        Subfsr => extended::execute_subfsr(cpu, inst),
        Addulnk => extended::execute_addulnk(cpu, inst),
        Subulnk => extended::execute_subulnk(cpu, inst),
        Callw => extended::execute_callw(cpu),
        Pushl => extended::execute_pushl(cpu, inst),
        Movsf => extended::execute_movsf(cpu, inst),
        Movss => extended::execute_movss(cpu, inst),

        // Filtered out by the CPU before dispatch
        Illegal => {}
    }
}

/// Executes the second word of a two-word instruction.
pub(crate) fn complete(cpu: &mut Cpu, continuation: Continuation, inst: Instruction) {
    match continuation {
        Continuation::LoadFsr { fsr } => transfer::complete_lfsr(cpu, fsr, inst),
        Continuation::MoveFile { value } => transfer::complete_movff(cpu, value, inst),
        Continuation::MoveToFile { value } => extended::complete_movsf(cpu, value, inst),
        Continuation::MoveStack { value } => extended::complete_movss(cpu, value, inst),
    }
}
