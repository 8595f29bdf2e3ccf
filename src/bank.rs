//! # Bank and Indirect Addressing
//!
//! Byte and bit instructions carry an 8-bit file address `f` and an access bit `a`.
//! The bank controller expands these into 12-bit register file addresses:
//!
//! | `a` | Mode | Address |
//! |-----|------|---------|
//! | 1 | Banked | `(BSR << 8) \| f` |
//! | 0 | Access, `f >= 0x80` | `0xF00 + f` (special function registers) |
//! | 0 | Access, `f < 0x80` | `f` (access RAM) |
//! | 0 | Indexed literal offset, extended set and `f < 0x60` | `FSR2 + f` |
//!
//! ## Indirect registers
//!
//! Each of the three file select registers (FSR0..FSR2) has five virtual registers
//! that access the location it points to:
//!
//! - `INDFn`: `[FSRn]`
//! - `POSTINCn` / `POSTDECn`: `[FSRn]`, then FSRn ± 1
//! - `PREINCn`: FSRn + 1, then `[FSRn]`
//! - `PLUSWn`: `[FSRn + W]`, W taken as signed
//!
//! Pointer updates are staged and only committed at the end of the instruction,
//! so an instruction that reads and writes `POSTINC0` touches the same location
//! twice and bumps the pointer once.

use crate::bus::{DataDevice, Mask};
use crate::registers;

const FSR_MASK: u16 = 0x0FFF;

/// Kind of virtual indirect register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndirectOp {
    Indf,
    PostIncrement,
    PostDecrement,
    PreIncrement,
    PlusW,
}

/// Maps a data address to the FSR and operation it stands for, if any.
pub fn indirect_op(address: u16) -> Option<(usize, IndirectOp)> {
    let (fsr, base) = match address {
        registers::PLUSW0..=registers::INDF0 => (0, registers::INDF0),
        registers::PLUSW1..=registers::INDF1 => (1, registers::INDF1),
        registers::PLUSW2..=registers::INDF2 => (2, registers::INDF2),
        _ => return None,
    };

    let op = match base - address {
        0 => IndirectOp::Indf,
        1 => IndirectOp::PostIncrement,
        2 => IndirectOp::PostDecrement,
        3 => IndirectOp::PreIncrement,
        _ => IndirectOp::PlusW,
    };
    Some((fsr, op))
}

/// Returns true for any INDF-family address.
pub fn is_indirect(address: u16) -> bool {
    indirect_op(address).is_some()
}

/// A 12-bit file select register with a pending update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Fsr {
    value: u16,
    staged: Option<u16>,
}

impl Fsr {
    fn set(&mut self, value: u16) {
        self.value = value & FSR_MASK;
        self.staged = None;
    }

    fn stage(&mut self, value: u16) {
        self.staged = Some(value & FSR_MASK);
    }
}

/// BSR and FSR0..FSR2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankController {
    bsr: u8,
    fsr: [Fsr; 3],
}

impl BankController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank select register.
    pub fn bsr(&self) -> u8 {
        self.bsr
    }

    pub fn set_bsr(&mut self, bsr: u8) {
        self.bsr = bsr;
    }

    /// Live value of FSR`n` (staged updates not yet applied).
    ///
    /// # Panics
    ///
    /// Panics if `n > 2`.
    pub fn fsr(&self, n: usize) -> u16 {
        self.fsr[n].value
    }

    /// Loads FSR`n`, discarding any staged update.
    pub fn set_fsr(&mut self, n: usize, value: u16) {
        self.fsr[n].set(value);
    }

    /// Returns true when any FSR has an update waiting for [`commit`](Self::commit).
    pub fn has_staged(&self) -> bool {
        self.fsr.iter().any(|fsr| fsr.staged.is_some())
    }

    /// Expands a byte-instruction file operand into a data address.
    ///
    /// # Arguments
    ///
    /// * `f` - 8-bit file field
    /// * `banked` - the instruction's `a` bit
    /// * `extended` - extended instruction set enabled (indexed literal offset mode)
    pub fn address(&self, f: u8, banked: bool, extended: bool) -> u16 {
        if banked {
            return ((self.bsr as u16) << 8) | f as u16;
        }

        if extended && f < 0x60 {
            return (self.fsr[2].value + f as u16) & FSR_MASK;
        }

        if f >= 0x80 {
            0xF00 + f as u16
        } else {
            f as u16
        }
    }

    /// Resolves an INDF-family address to the location it accesses.
    ///
    /// Stages the pointer side effect of the access. Staged values are computed from
    /// the live value, so resolving the same register twice within one instruction
    /// yields the same target and a single update.
    ///
    /// # Returns
    ///
    /// `None` when `address` is not an indirect register.
    pub fn resolve(&mut self, address: u16, wreg: u8) -> Option<u16> {
        let (n, op) = indirect_op(address)?;
        let fsr = &mut self.fsr[n];
        let current = fsr.value;

        let target = match op {
            IndirectOp::Indf => current,
            IndirectOp::PostIncrement => {
                fsr.stage(current.wrapping_add(1));
                current
            }
            IndirectOp::PostDecrement => {
                fsr.stage(current.wrapping_sub(1));
                current
            }
            IndirectOp::PreIncrement => {
                let next = current.wrapping_add(1);
                fsr.stage(next);
                next
            }
            IndirectOp::PlusW => current.wrapping_add(wreg as i8 as u16),
        };

        Some(target & FSR_MASK)
    }

    /// Applies staged pointer updates. Called once per instruction boundary.
    pub fn commit(&mut self) {
        for fsr in &mut self.fsr {
            if let Some(value) = fsr.staged.take() {
                fsr.value = value;
            }
        }
    }

    /// Power-on state.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// MCLR state: BSR cleared, pointers kept.
    pub(crate) fn reset_bsr(&mut self) {
        self.bsr = 0;
        for fsr in &mut self.fsr {
            fsr.staged = None;
        }
    }

    fn fsr_register(address: u16) -> Option<(usize, bool)> {
        match address {
            registers::FSR0L => Some((0, false)),
            registers::FSR0H => Some((0, true)),
            registers::FSR1L => Some((1, false)),
            registers::FSR1H => Some((1, true)),
            registers::FSR2L => Some((2, false)),
            registers::FSR2H => Some((2, true)),
            _ => None,
        }
    }
}

impl DataDevice for BankController {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        if address == registers::BSR {
            return (self.bsr, 0xFF);
        }

        match Self::fsr_register(address) {
            Some((n, true)) => ((self.fsr[n].value >> 8) as u8, 0x0F),
            Some((n, false)) => (self.fsr[n].value as u8, 0xFF),
            None => (0, 0),
        }
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        if address == registers::BSR {
            self.bsr = data;
            return 0xFF;
        }

        match Self::fsr_register(address) {
            Some((n, true)) => {
                let value = (self.fsr[n].value & 0x00FF) | (((data & 0x0F) as u16) << 8);
                self.fsr[n].set(value);
                0x0F
            }
            Some((n, false)) => {
                let value = (self.fsr[n].value & 0x0F00) | data as u16;
                self.fsr[n].set(value);
                0xFF
            }
            None => 0,
        }
    }
}
