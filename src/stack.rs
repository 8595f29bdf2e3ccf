//! # Return Address Stack
//!
//! The hardware stack is 31 entries of 21 bits, separate from the data memory. Its
//! top is visible through TOSU:TOSH:TOSL and the pointer through STKPTR, which also
//! carries the sticky STKFUL (bit 7) and STKUNF (bit 6) latches.
//!
//! Overflow and underflow never corrupt memory: a push onto a full stack is
//! dropped and a pop from an empty stack leaves the pointer at 0. Whether the core
//! resets afterwards is a configuration decision taken by the CPU.

use crate::bus::{DataDevice, Mask};
use crate::registers;

/// Number of return address slots.
pub const STACK_DEPTH: usize = 31;

const STKFUL: u8 = 0x80;
const STKUNF: u8 = 0x40;

/// Outcome of a stack operation that hit a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackFault {
    /// The push filled the last slot, or the stack was already full.
    Overflow,
    /// A pop was attempted on an empty stack.
    Underflow,
}

/// 31-level return address stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    data: [u32; STACK_DEPTH],
    pointer: u8,
    full: bool,
    underflow: bool,
}

impl Default for Stack {
    fn default() -> Self {
        Self {
            data: [0; STACK_DEPTH],
            pointer: 0,
            full: false,
            underflow: false,
        }
    }
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a return address.
    ///
    /// # Returns
    ///
    /// `Err(StackFault::Overflow)` when this push filled the last slot. A push onto
    /// an already full stack keeps the STKFUL latch, discards the value and
    /// returns `Ok`.
    pub fn push(&mut self, value: u32) -> Result<(), StackFault> {
        if self.pointer as usize == STACK_DEPTH {
            self.full = true;
            return Ok(());
        }

        self.data[self.pointer as usize] = value & registers::PC_MASK;
        self.pointer += 1;

        if self.pointer as usize == STACK_DEPTH {
            self.full = true;
            return Err(StackFault::Overflow);
        }
        Ok(())
    }

    /// Discards the top entry.
    ///
    /// # Returns
    ///
    /// `Err(StackFault::Underflow)` if the stack was empty; the underflow latch is set.
    pub fn pop(&mut self) -> Result<(), StackFault> {
        if self.pointer == 0 {
            self.underflow = true;
            return Err(StackFault::Underflow);
        }
        self.pointer -= 1;
        Ok(())
    }

    /// The most recently pushed address, or 0 when empty.
    pub fn top(&self) -> u32 {
        match self.pointer {
            0 => 0,
            p => self.data[p as usize - 1],
        }
    }

    /// Replaces the most recently pushed address. Ignored when empty.
    pub fn set_top(&mut self, value: u32) {
        if self.pointer > 0 {
            self.data[self.pointer as usize - 1] = value & registers::PC_MASK;
        }
    }

    /// Number of occupied slots.
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    /// STKFUL latch.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// STKUNF latch.
    pub fn has_underflowed(&self) -> bool {
        self.underflow
    }

    /// Power-on state: empty, latches cleared.
    pub(crate) fn reset(&mut self) {
        self.pointer = 0;
        self.full = false;
        self.underflow = false;
    }

    /// MCLR state: empty, latches kept for post-mortem inspection.
    pub(crate) fn reset_pointer(&mut self) {
        self.pointer = 0;
    }
}

impl DataDevice for Stack {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        match address {
            registers::STKPTR => {
                let mut stkptr = self.pointer & 0x1F;
                if self.full {
                    stkptr |= STKFUL;
                }
                if self.underflow {
                    stkptr |= STKUNF;
                }
                (stkptr, 0xDF)
            }
            registers::TOSL => (self.top() as u8, 0xFF),
            registers::TOSH => ((self.top() >> 8) as u8, 0xFF),
            registers::TOSU => ((self.top() >> 16) as u8 & 0x1F, 0x1F),
            _ => (0, 0),
        }
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        match address {
            registers::STKPTR => {
                // Latches can be cleared by software but never set
                self.full &= data & STKFUL != 0;
                self.underflow &= data & STKUNF != 0;
                self.pointer = (data & 0x1F).min(STACK_DEPTH as u8);
                0xDF
            }
            registers::TOSL => {
                self.set_top((self.top() & 0x1F_FF00) | data as u32);
                0xFF
            }
            registers::TOSH => {
                self.set_top((self.top() & 0x1F_00FF) | ((data as u32) << 8));
                0xFF
            }
            registers::TOSU => {
                self.set_top((self.top() & 0x00_FFFF) | (((data & 0x1F) as u32) << 16));
                0x1F
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_top() {
        let mut stack = Stack::new();
        assert_eq!(stack.push(0x1234), Ok(()));
        assert_eq!(stack.push(0x5678), Ok(()));
        assert_eq!(stack.top(), 0x5678);

        assert_eq!(stack.pop(), Ok(()));
        assert_eq!(stack.top(), 0x1234);
        assert_eq!(stack.pointer(), 1);
    }

    #[test]
    fn test_overflow_keeps_last_value() {
        let mut stack = Stack::new();
        for i in 1..STACK_DEPTH as u32 {
            assert_eq!(stack.push(i), Ok(()));
        }
        assert_eq!(stack.push(31), Err(StackFault::Overflow));
        assert!(stack.is_full());

        assert_eq!(stack.push(32), Ok(()));
        assert_eq!(stack.top(), 31);
        assert_eq!(stack.pointer(), 31);
    }

    #[test]
    fn test_underflow_latches() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(StackFault::Underflow));
        assert!(stack.has_underflowed());
        assert_eq!(stack.top(), 0);
    }

    #[test]
    fn test_stkptr_write_cannot_set_latches() {
        let mut stack = Stack::new();
        stack.write(registers::STKPTR, 0xC3);
        assert_eq!(stack.read(registers::STKPTR), (0x03, 0xDF));

        let _ = stack.pop();
        let _ = stack.pop();
        let _ = stack.pop();
        let _ = stack.pop();
        assert_eq!(stack.read(registers::STKPTR), (0x40, 0xDF));

        // Writing 0 clears STKUNF
        stack.write(registers::STKPTR, 0x00);
        assert!(!stack.has_underflowed());
    }

    #[test]
    fn test_tos_registers() {
        let mut stack = Stack::new();
        stack.push(0x01_2345).unwrap();

        assert_eq!(stack.read(registers::TOSU), (0x01, 0x1F));
        assert_eq!(stack.read(registers::TOSH), (0x23, 0xFF));
        assert_eq!(stack.read(registers::TOSL), (0x45, 0xFF));

        stack.write(registers::TOSH, 0xAB);
        assert_eq!(stack.top(), 0x01_AB45);
    }

    #[test]
    fn test_mclr_keeps_latches() {
        let mut stack = Stack::new();
        let _ = stack.pop();
        stack.push(0x10).unwrap();
        stack.reset_pointer();
        assert_eq!(stack.pointer(), 0);
        assert!(stack.has_underflowed());

        stack.reset();
        assert!(!stack.has_underflowed());
    }
}
