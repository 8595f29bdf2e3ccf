//! # Arithmetic Logic Unit
//!
//! The ALU owns the STATUS register and the 16-bit product register
//! (PRODH:PRODL). Instruction implementations feed it operands and write the
//! returned result wherever the destination bit points.
//!
//! ## Flag rules
//!
//! - Arithmetic (add, subtract, negate, with or without carry): all five flags are
//!   recomputed from the 9-bit intermediate. C is bit 8, Z means the low byte is
//!   zero, N is bit 7 and OV is set when N changes relative to its previous value.
//!   DC is cleared and never computed.
//! - Logic (and, or, xor, complement, rotates without carry): only Z and N are
//!   touched.
//! - Rotates through carry: C takes the bit shifted out, then Z and N.
//! - Multiply: product register only, flags untouched.

use crate::bus::{DataDevice, Mask};
use crate::registers;
use bitflags::bitflags;

bitflags! {
    /// The STATUS register (low five bits).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        /// Carry / not borrow
        const C = 0x01;
        /// Digit carry / not digit borrow
        const DC = 0x02;
        /// Zero
        const Z = 0x04;
        /// Overflow
        const OV = 0x08;
        /// Negative
        const N = 0x10;
    }
}

/// Arithmetic logic unit state: STATUS and the product register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alu {
    pub(crate) status: Status,
    pub(crate) product: u16,
}

impl Alu {
    /// Creates an ALU with cleared flags and product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current STATUS flags.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Overwrites the STATUS flags.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// PRODH:PRODL as one value.
    pub fn product(&self) -> u16 {
        self.product
    }

    /// Returns true when the carry flag is set.
    pub fn carry(&self) -> bool {
        self.status.contains(Status::C)
    }

    pub fn add(&mut self, a: u8, b: u8) -> u8 {
        self.arithmetic(a as u16 + b as u16)
    }

    /// `a - b`, computed as `a + !b + 1`; C set means no borrow occurred.
    pub fn sub(&mut self, a: u8, b: u8) -> u8 {
        self.arithmetic(a as u16 + (!b) as u16 + 1)
    }

    pub fn add_with_carry(&mut self, a: u8, b: u8) -> u8 {
        let carry = self.carry() as u16;
        self.arithmetic(a as u16 + b as u16 + carry)
    }

    /// `a - b - !C`, computed as `a + !b + C`.
    pub fn sub_with_borrow(&mut self, a: u8, b: u8) -> u8 {
        let carry = self.carry() as u16;
        self.arithmetic(a as u16 + (!b) as u16 + carry)
    }

    /// Two's complement negation, `0 - a`.
    pub fn negate(&mut self, a: u8) -> u8 {
        self.sub(0, a)
    }

    pub fn and(&mut self, a: u8, b: u8) -> u8 {
        self.logic(a & b)
    }

    pub fn or(&mut self, a: u8, b: u8) -> u8 {
        self.logic(a | b)
    }

    pub fn xor(&mut self, a: u8, b: u8) -> u8 {
        self.logic(a ^ b)
    }

    pub fn complement(&mut self, a: u8) -> u8 {
        self.logic(!a)
    }

    /// Rotate left without carry (RLNCF).
    pub fn rotate_left(&mut self, a: u8) -> u8 {
        self.logic(a.rotate_left(1))
    }

    /// Rotate right without carry (RRNCF).
    pub fn rotate_right(&mut self, a: u8) -> u8 {
        self.logic(a.rotate_right(1))
    }

    /// Rotate left through carry (RLCF).
    pub fn rotate_left_carry(&mut self, a: u8) -> u8 {
        let result = (a << 1) | self.carry() as u8;
        self.status.set(Status::C, a & 0x80 != 0);
        self.logic(result)
    }

    /// Rotate right through carry (RRCF).
    pub fn rotate_right_carry(&mut self, a: u8) -> u8 {
        let result = (a >> 1) | ((self.carry() as u8) << 7);
        self.status.set(Status::C, a & 0x01 != 0);
        self.logic(result)
    }

    /// Decimal adjust of W after a packed BCD addition (DAW).
    ///
    /// Each nibble is corrected by 6 when it exceeds 9 or its carry flag is set.
    /// Only C is affected; it is set by a carry out of the high nibble and never
    /// cleared.
    pub fn decimal_adjust(&mut self, a: u8) -> u8 {
        let mut result = a as u16;

        if result & 0x0F > 0x09 || self.status.contains(Status::DC) {
            result += 0x06;
        }
        if result & 0x1F0 > 0x90 || self.carry() {
            result += 0x60;
        }
        if result > 0xFF {
            self.status.insert(Status::C);
        }

        result as u8
    }

    /// Unsigned 8x8 multiply into PRODH:PRODL. Flags are unchanged.
    pub fn mul(&mut self, a: u8, b: u8) {
        self.product = a as u16 * b as u16;
    }

    /// Sets Z and N from `value` without touching the other flags.
    ///
    /// Used by data moves (MOVF) that report on the value they touched.
    pub fn update_zero_negative(&mut self, value: u8) {
        self.logic(value);
    }

    /// Sets Z from `value` alone (CLRF).
    pub fn update_zero(&mut self, value: u8) {
        self.status.set(Status::Z, value == 0);
    }

    fn arithmetic(&mut self, result: u16) -> u8 {
        let was_negative = self.status.contains(Status::N);
        let negative = result & 0x80 != 0;

        let mut status = Status::empty();
        status.set(Status::C, result & 0x100 != 0);
        status.set(Status::Z, result & 0xFF == 0);
        status.set(Status::N, negative);
        status.set(Status::OV, negative != was_negative);
        self.status = status;

        result as u8
    }

    fn logic(&mut self, result: u8) -> u8 {
        self.status.set(Status::Z, result == 0);
        self.status.set(Status::N, result & 0x80 != 0);
        result
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

impl DataDevice for Alu {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        match address {
            registers::STATUS => (self.status.bits(), 0x1F),
            registers::PRODH => ((self.product >> 8) as u8, 0xFF),
            registers::PRODL => (self.product as u8, 0xFF),
            _ => (0, 0),
        }
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        match address {
            registers::STATUS => {
                self.status = Status::from_bits_truncate(data);
                0x1F
            }
            registers::PRODH => {
                self.product = (self.product & 0x00FF) | ((data as u16) << 8);
                0xFF
            }
            registers::PRODL => {
                self.product = (self.product & 0xFF00) | data as u16;
                0xFF
            }
            _ => 0,
        }
    }
}
