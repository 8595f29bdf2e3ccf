//! # PIC18 Microcontroller Core Emulator
//!
//! A cycle-stepped emulator for the execution core of 8-bit PIC18 microcontrollers,
//! designed for firmware test harnesses that need hardware-faithful register side
//! effects: pipeline delay, deferred indirect pointer updates and mask-based bus
//! contention.
//!
//! ## Quick Start
//!
//! ```rust
//! use libpic18::{Cpu, CpuConfig, Memory, registers};
//!
//! // MOVLW 0x45 ; SLEEP
//! let program = Memory::from_words(0, &[0x0E45, 0x0003]);
//! let ram = Memory::new(0, 0xF00);
//!
//! let mut cpu = Cpu::new(CpuConfig::default());
//! cpu.attach_program(Box::new(program));
//! cpu.attach_data(Box::new(ram));
//!
//! cpu.run_for_cycles(3);
//! assert_eq!(cpu.read_data(registers::WREG), 0x45);
//! assert!(cpu.is_asleep());
//! ```
//!
//! ## Architecture
//!
//! - **Harvard buses**: separate data (12-bit register file) and program (22-bit flash)
//!   address spaces, each a list of devices arbitrated by bit masks
//! - **Single-cycle ticks**: `Cpu::tick()` advances exactly one instruction cycle,
//!   modelling the one-stage fetch pipeline and two-word instructions
//! - **Interrupts**: a controller with priority and compatibility modes, driven by
//!   handles that peripherals raise
//! - **No OS dependencies**: portable to WebAssembly behind the `wasm` feature
//!
//! ## Modules
//!
//! - `bus` - Device traits and mask-OR composite buses
//! - `memory` - Flat memory device usable on either bus
//! - `alu` - Arithmetic/logic unit and STATUS flags
//! - `bank` - BSR, FSR pointers and indirect addressing
//! - `stack` - 31-level return address stack
//! - `table` - Table pointer and latch for flash access
//! - `interrupts` - Interrupt sources and controller
//! - `opcodes` - Instruction decoder and operand views
//! - `cpu` - Tick loop, resets and interrupt vectoring
//! - `devices` - Bus-mapped peripherals (EUSART)

pub mod alu;
pub mod bank;
pub mod bus;
pub mod config;
pub mod cpu;
pub mod devices;
pub mod events;
pub mod interrupts;
pub mod memory;
pub mod opcodes;
pub mod registers;
pub mod stack;
pub mod table;

// Internal instruction implementations (not part of public API)
mod instructions;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export public API
pub use alu::{Alu, Status};
pub use bus::{DataBus, DataDevice, Mask, ProgramBus, ProgramDevice};
pub use config::CpuConfig;
pub use cpu::Cpu;
pub use devices::{Eusart, EusartPort};
pub use events::{EventObserver, NullObserver};
pub use interrupts::{Interrupt, InterruptConfig, InterruptFlag};
pub use memory::Memory;
pub use opcodes::{decode, Opcode};

/// Errors reported while assembling an emulated system.
///
/// Nothing inside the tick loop returns an error; these cover construction-time
/// misconfiguration only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An interrupt flag names a bit outside 0..=7.
    #[error("interrupt '{label}' uses bit {bit}, which is outside 0..=7")]
    InvalidInterruptBit {
        /// Label of the offending interrupt source
        label: String,
        /// Requested bit number
        bit: u8,
    },

    /// A peripheral interrupt register group outside 1..=5 was requested.
    #[error("peripheral interrupt register group {0} does not exist (expected 1..=5)")]
    InvalidPeripheralGroup(u8),

    /// A program or data image does not fit inside its memory device.
    #[error("image of {len} bytes at offset 0x{start:06X} exceeds memory of {size} bytes")]
    ImageTooLarge {
        /// Start offset inside the device
        start: usize,
        /// Image length in bytes
        len: usize,
        /// Device capacity in bytes
        size: usize,
    },
}

/// Convenience alias for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
