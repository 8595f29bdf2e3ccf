//! # CPU State and Execution
//!
//! This module contains the [`Cpu`] struct tying the core components together and
//! the per-cycle state machine driving them.
//!
//! ## CPU State
//!
//! The CPU maintains:
//! - **Program counter** (PC): 21-bit byte address of the next instruction word
//! - **WREG** and the **PCLATH/PCLATU** latches
//! - **Fetched word**: the pipeline stage holding the next instruction
//! - **Flush flag**: set by anything that changes control flow, costs one cycle
//! - **Continuation**: the pending half of a two-word instruction
//! - **Shadow registers**: WREG, STATUS and BSR saved by interrupts and fast calls
//! - **Cycle counter**: u64 monotonically increasing instruction cycle count
//!
//! ## Execution Model
//!
//! `tick()` advances one instruction cycle. In priority order it:
//! 1. vectors to a pending interrupt (never in the middle of a two-word instruction)
//! 2. refills the pipeline after a flush
//! 3. completes a pending two-word instruction
//! 4. executes the fetched instruction
//!
//! Pointer updates staged by indirect accesses are committed after steps 3 and 4.
//!
//! ## Data bus
//!
//! Instruction accesses go through an internal dispatch that consults every core
//! component (WREG/PCL, ALU, stack, bank controller, table controller, interrupt
//! controller) and then the external data bus, merging the answers by mask. The
//! INDF family is resolved here: the bank controller turns the virtual register
//! into a target address, and the target is accessed one level deep.

use crate::alu::{Alu, Status};
use crate::bank::{self, BankController};
use crate::bus::{merge, DataBus, DataDevice, Mask, ProgramBus, ProgramDevice};
use crate::config::CpuConfig;
use crate::events::{EventObserver, Signals};
use crate::instructions;
use crate::interrupts::{Interrupt, InterruptConfig, InterruptController};
use crate::opcodes::{Instruction, Opcode};
use crate::registers::{self, PC_MASK};
use crate::stack::{Stack, StackFault};
use crate::table::TableController;
use crate::Result;
use std::rc::Rc;

/// Second half of a two-word instruction, waiting for its operand word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Continuation {
    /// LFSR: the second word holds the low byte of FSR`fsr`
    LoadFsr { fsr: usize },
    /// MOVFF: `value` goes to the 12-bit address in the second word
    MoveFile { value: u8 },
    /// MOVSF: `value` goes to the 12-bit address in the second word
    MoveToFile { value: u8 },
    /// MOVSS: `value` goes to FSR2 plus the offset in the second word
    MoveStack { value: u8 },
}

/// Registers saved by interrupts and `CALL FAST`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Shadow {
    pub(crate) wreg: u8,
    pub(crate) status: Status,
    pub(crate) bsr: u8,
}

/// PIC18 core.
///
/// # Examples
///
/// ```
/// use libpic18::{Cpu, CpuConfig, Memory};
///
/// // ADDLW 1 ; BNZ -2
/// let mut cpu = Cpu::new(CpuConfig::default());
/// cpu.attach_program(Box::new(Memory::from_words(0, &[0x0F01, 0xE1FE])));
///
/// cpu.tick(); // fetch
/// cpu.tick(); // ADDLW
/// assert_eq!(cpu.wreg(), 1);
/// assert_eq!(cpu.pc(), 0x0002); // next word is in the fetch stage
/// ```
pub struct Cpu {
    /// Address of the word in the fetch stage
    pub(crate) pc: u32,

    /// Word fetched from `pc` during the previous cycle
    pub(crate) fetched: u16,

    /// Working register
    pub(crate) wreg: u8,

    pub(crate) pclath: u8,
    pub(crate) pclatu: u8,

    /// Pipeline must be refilled before the next execute
    pub(crate) flush: bool,

    pub(crate) pending: Option<Continuation>,

    /// Inside a high priority handler (cleared by RETFIE)
    pub(crate) in_high_handler: bool,

    /// Inside a low priority handler (cleared by RETFIE)
    pub(crate) in_low_handler: bool,

    pub(crate) shadow: Shadow,

    pub(crate) cycles: u64,

    pub(crate) config: CpuConfig,

    pub(crate) alu: Alu,
    pub(crate) stack: Stack,
    pub(crate) bank: BankController,
    pub(crate) table: TableController,
    pub(crate) interrupts: InterruptController,

    pub(crate) data: DataBus,
    pub(crate) program: ProgramBus,

    pub(crate) signals: Rc<Signals>,
}

impl Cpu {
    /// Creates a core with empty buses, in the power-on reset state.
    ///
    /// The first `tick()` fills the pipeline from address 0.
    pub fn new(config: CpuConfig) -> Self {
        let signals = Signals::new();
        let mut cpu = Self {
            pc: 0,
            fetched: 0,
            wreg: 0,
            pclath: 0,
            pclatu: 0,
            flush: true,
            pending: None,
            in_high_handler: false,
            in_low_handler: false,
            shadow: Shadow::default(),
            cycles: 0,
            config,
            alu: Alu::new(),
            stack: Stack::new(),
            bank: BankController::new(),
            table: TableController::new(),
            interrupts: InterruptController::new(Rc::clone(&signals)),
            data: DataBus::new(),
            program: ProgramBus::new(),
            signals,
        };
        cpu.power_on_reset();
        cpu
    }

    // ========== System Assembly ==========

    /// Attaches a device to the data bus.
    pub fn attach_data(&mut self, device: Box<dyn DataDevice>) {
        self.data.attach(device);
    }

    /// Attaches a device to the program bus.
    pub fn attach_program(&mut self, device: Box<dyn ProgramDevice>) {
        self.program.attach(device);
    }

    /// Registers an interrupt source with the interrupt controller.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidInterruptBit`] for bits above 7.
    pub fn register_interrupt(&mut self, config: InterruptConfig) -> Result<Interrupt> {
        self.interrupts.register(config)
    }

    /// Installs the observer receiving illegal instruction and sleep notifications.
    pub fn set_observer(&mut self, observer: Box<dyn EventObserver>) {
        self.signals.set_observer(observer);
    }

    pub fn config(&self) -> CpuConfig {
        self.config
    }

    pub fn set_config(&mut self, config: CpuConfig) {
        self.config = config;
    }

    // ========== Resets ==========

    /// Power-on reset: every register returns to its initial value.
    pub fn power_on_reset(&mut self) {
        log::debug!("power-on reset");
        self.reset_core();
        self.wreg = 0;
        self.alu.reset();
        self.stack.reset();
        self.bank.reset();
    }

    /// Master clear reset (MCLR pin, RESET instruction, configured stack faults).
    ///
    /// Like power-on reset, but WREG, STATUS, PROD, the FSRs and the stack
    /// STKFUL/STKUNF latches keep their values.
    pub fn mclr_reset(&mut self) {
        log::debug!("MCLR reset at pc {:#08X}", self.pc);
        self.reset_core();
        self.stack.reset_pointer();
        self.bank.reset_bsr();
    }

    fn reset_core(&mut self) {
        self.pc = 0;
        self.fetched = 0;
        self.pclath = 0;
        self.pclatu = 0;
        self.flush = true;
        self.pending = None;
        self.in_high_handler = false;
        self.in_low_handler = false;
        self.shadow = Shadow::default();
        self.table.reset();
        self.interrupts.reset();
        self.signals.reset();
    }

    // ========== Execution ==========

    /// Advances the core by one instruction cycle.
    pub fn tick(&mut self) {
        self.cycles += 1;

        if self.pending.is_none() {
            if self.interrupts.take_high() {
                self.vector(registers::HIGH_PRIORITY_VECTOR, false);
                return;
            }
            // A latched low request waits for the high handler to return
            if !self.in_high_handler && self.interrupts.take_low() {
                self.vector(registers::LOW_PRIORITY_VECTOR, true);
                return;
            }
        }

        if self.flush {
            self.fetch();
            self.flush = false;
            return;
        }

        let word = self.fetched;
        let address = self.pc;
        self.pc = (self.pc + 2) & PC_MASK;

        if let Some(continuation) = self.pending.take() {
            log::trace!("{:#08X}: {:04X} completes {:?}", address, word, continuation);
            instructions::complete(self, continuation, Instruction(word));
        } else {
            self.execute(Instruction(word), address);
        }

        self.bank.commit();
        if !self.flush {
            self.fetch();
        }
    }

    /// Runs `cycles` ticks.
    ///
    /// # Returns
    ///
    /// The number of cycles executed (always `cycles`).
    pub fn run_for_cycles(&mut self, cycles: u64) -> u64 {
        for _ in 0..cycles {
            self.tick();
        }
        cycles
    }

    fn execute(&mut self, inst: Instruction, address: u32) {
        let opcode = inst.opcode();
        log::trace!("{:#08X}: {:04X} {}", address, inst.0, opcode.mnemonic());

        if opcode == Opcode::Illegal {
            log::warn!("illegal instruction {:#06X} at {:#08X}", inst.0, address);
            self.signals.illegal_instruction(inst.0, address);
            return;
        }

        if opcode.is_extended() && !self.config.extended_instruction_set {
            // Without XINST these encodings execute as NOP
            return;
        }

        instructions::execute(self, opcode, inst);
    }

    fn fetch(&mut self) {
        self.fetched = self.program.read_word(self.pc);
    }

    fn vector(&mut self, target: u32, low: bool) {
        log::debug!(
            "{} priority interrupt at pc {:#08X}",
            if low { "low" } else { "high" },
            self.pc
        );

        if !self.push_return(self.pc) {
            return;
        }
        self.save_shadow();
        if low {
            self.in_low_handler = true;
        } else {
            self.in_high_handler = true;
        }
        self.jump(target);
    }

    // ========== Helpers used by instruction implementations ==========

    /// Sets the PC and schedules a pipeline flush.
    pub(crate) fn jump(&mut self, target: u32) {
        self.pc = target & PC_MASK & !1;
        self.flush = true;
    }

    /// Skips the instruction in the fetch stage.
    pub(crate) fn skip(&mut self) {
        self.jump(self.pc + 2);
    }

    /// Pushes a return address, applying the stack overflow policy.
    ///
    /// Returns false if the core was reset and the instruction must be abandoned.
    pub(crate) fn push_return(&mut self, address: u32) -> bool {
        match self.stack.push(address) {
            Ok(()) => true,
            Err(fault) => self.stack_fault(fault),
        }
    }

    /// Pops the top of stack and returns it, applying the underflow policy.
    ///
    /// Returns `None` if the core was reset.
    pub(crate) fn pop_return(&mut self) -> Option<u32> {
        let top = self.stack.top();
        match self.stack.pop() {
            Ok(()) => Some(top),
            Err(fault) => self.stack_fault(fault).then_some(top),
        }
    }

    fn stack_fault(&mut self, fault: StackFault) -> bool {
        let reset = match fault {
            StackFault::Overflow => self.config.reset_on_stack_overflow,
            StackFault::Underflow => self.config.reset_on_stack_underflow,
        };
        log::warn!("stack {:?} at pc {:#08X}", fault, self.pc);

        if reset {
            self.mclr_reset();
            return false;
        }
        true
    }

    pub(crate) fn save_shadow(&mut self) {
        self.shadow = Shadow {
            wreg: self.wreg,
            status: self.alu.status,
            bsr: self.bank.bsr(),
        };
    }

    pub(crate) fn restore_shadow(&mut self) {
        self.wreg = self.shadow.wreg;
        self.alu.status = self.shadow.status;
        self.bank.set_bsr(self.shadow.bsr);
    }

    /// Data address of a byte/bit instruction's file operand.
    pub(crate) fn file_address(&self, inst: Instruction) -> u16 {
        self.bank.address(
            inst.file(),
            inst.banked(),
            self.config.extended_instruction_set,
        )
    }

    /// Data read as performed by an instruction.
    pub(crate) fn bus_read(&mut self, address: u16) -> u8 {
        let address = match self.bank.resolve(address, self.wreg) {
            Some(target) if bank::is_indirect(target) => return 0,
            Some(target) => target,
            None => address,
        };
        self.read_direct(address).0
    }

    /// Data write as performed by an instruction.
    pub(crate) fn bus_write(&mut self, address: u16, data: u8) {
        let address = match self.bank.resolve(address, self.wreg) {
            Some(target) if bank::is_indirect(target) => return,
            Some(target) => target,
            None => address,
        };
        self.write_direct(address, data);
    }

    fn read_direct(&mut self, address: u16) -> (u8, Mask) {
        let mut result = self.core_read(address);
        result = merge(result, self.alu.read(address));
        result = merge(result, self.stack.read(address));
        result = merge(result, self.bank.read(address));
        result = merge(result, self.table.read(address));
        result = merge(result, self.interrupts.read(address));
        merge(result, self.data.read(address))
    }

    fn write_direct(&mut self, address: u16, data: u8) -> Mask {
        self.core_write(address, data)
            | self.alu.write(address, data)
            | self.stack.write(address, data)
            | self.bank.write(address, data)
            | self.table.write(address, data)
            | self.interrupts.write(address, data)
            | self.data.write(address, data)
    }

    fn core_read(&mut self, address: u16) -> (u8, Mask) {
        match address {
            registers::PCL => {
                self.pclatu = (self.pc >> 16) as u8;
                self.pclath = (self.pc >> 8) as u8;
                (self.pc as u8, 0xFF)
            }
            registers::PCLATH => (self.pclath, 0xFF),
            registers::PCLATU => (self.pclatu, 0xFF),
            registers::WREG => (self.wreg, 0xFF),
            _ => (0, 0),
        }
    }

    fn core_write(&mut self, address: u16, data: u8) -> Mask {
        match address {
            registers::PCL => {
                let target =
                    ((self.pclatu as u32) << 16) | ((self.pclath as u32) << 8) | data as u32;
                self.jump(target);
                0xFF
            }
            registers::PCLATH => {
                self.pclath = data;
                0xFF
            }
            registers::PCLATU => {
                self.pclatu = data;
                0xFF
            }
            registers::WREG => {
                self.wreg = data;
                0xFF
            }
            _ => 0,
        }
    }

    // ========== Host Access ==========

    /// Reads the data bus the way an instruction would.
    ///
    /// Side effects happen as for an instruction access: reading PCL loads the
    /// latches, and an indirect access updates its FSR immediately.
    pub fn read_data(&mut self, address: u16) -> u8 {
        let value = self.bus_read(address & 0x0FFF);
        self.bank.commit();
        value
    }

    /// Writes the data bus the way an instruction would.
    pub fn write_data(&mut self, address: u16, data: u8) {
        self.bus_write(address & 0x0FFF, data);
        self.bank.commit();
    }

    /// Reads one byte of program memory.
    pub fn read_program(&mut self, address: u32) -> u8 {
        ProgramDevice::read(&mut self.program, address).0
    }

    /// Writes one byte of program memory.
    pub fn write_program(&mut self, address: u32, data: u8) {
        ProgramDevice::write(&mut self.program, address, data);
    }

    // ========== Register Getters ==========

    /// Program counter (address of the word in the fetch stage).
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Redirects execution to `address`; the next tick refills the pipeline.
    pub fn set_pc(&mut self, address: u32) {
        self.pending = None;
        self.jump(address);
    }

    pub fn wreg(&self) -> u8 {
        self.wreg
    }

    pub fn set_wreg(&mut self, value: u8) {
        self.wreg = value;
    }

    /// STATUS flags.
    pub fn status(&self) -> Status {
        self.alu.status()
    }

    pub fn set_status(&mut self, status: Status) {
        self.alu.set_status(status);
    }

    pub fn bsr(&self) -> u8 {
        self.bank.bsr()
    }

    /// FSR`n` (0..=2).
    pub fn fsr(&self, n: usize) -> u16 {
        self.bank.fsr(n)
    }

    /// PRODH:PRODL.
    pub fn product(&self) -> u16 {
        self.alu.product()
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn table(&self) -> &TableController {
        &self.table
    }

    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    /// Total instruction cycles since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Instruction word in the fetch stage.
    pub fn fetched(&self) -> u16 {
        self.fetched
    }

    /// Returns true if the next tick refills the pipeline.
    pub fn is_flushing(&self) -> bool {
        self.flush
    }

    /// Returns true while the second word of a two-word instruction is awaited.
    pub fn has_pending_continuation(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns true between SLEEP and the next wake-up.
    pub fn is_asleep(&self) -> bool {
        self.signals.is_asleep()
    }
}
