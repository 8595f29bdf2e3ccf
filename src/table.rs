//! # Table Pointer Controller
//!
//! TBLRD and TBLWT move single bytes between program memory and the TABLAT latch,
//! addressed by the 22-bit TBLPTR. The pointer can be adjusted before or after the
//! access; every adjustment wraps inside 22 bits.

use crate::bus::{DataDevice, Mask, ProgramDevice};
use crate::registers;

const POINTER_MASK: u32 = 0x3F_FFFF;

/// Pointer adjustment encoded in the low two bits of TBLRD/TBLWT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    /// `TBLRD*`
    None,
    /// `TBLRD*+`
    PostIncrement,
    /// `TBLRD*-`
    PostDecrement,
    /// `TBLRD+*`
    PreIncrement,
}

impl TableAction {
    /// Decodes the `n` field of a table instruction.
    pub fn from_bits(n: u8) -> Self {
        match n & 0x03 {
            0 => TableAction::None,
            1 => TableAction::PostIncrement,
            2 => TableAction::PostDecrement,
            _ => TableAction::PreIncrement,
        }
    }
}

/// TBLPTR and TABLAT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableController {
    pointer: u32,
    latch: u8,
}

impl TableController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current 22-bit TBLPTR.
    pub fn pointer(&self) -> u32 {
        self.pointer
    }

    /// Current TABLAT.
    pub fn latch(&self) -> u8 {
        self.latch
    }

    /// Executes TBLRD: TABLAT = program[TBLPTR] with the requested adjustment.
    pub fn table_read<P: ProgramDevice + ?Sized>(&mut self, program: &mut P, action: TableAction) {
        self.before(action);
        let (data, _) = program.read(self.pointer);
        self.latch = data;
        self.after(action);
    }

    /// Executes TBLWT: program[TBLPTR] = TABLAT with the requested adjustment.
    pub fn table_write<P: ProgramDevice + ?Sized>(&mut self, program: &mut P, action: TableAction) {
        self.before(action);
        program.write(self.pointer, self.latch);
        self.after(action);
    }

    fn before(&mut self, action: TableAction) {
        if action == TableAction::PreIncrement {
            self.pointer = self.pointer.wrapping_add(1) & POINTER_MASK;
        }
    }

    fn after(&mut self, action: TableAction) {
        match action {
            TableAction::PostIncrement => {
                self.pointer = self.pointer.wrapping_add(1) & POINTER_MASK;
            }
            TableAction::PostDecrement => {
                self.pointer = self.pointer.wrapping_sub(1) & POINTER_MASK;
            }
            TableAction::None | TableAction::PreIncrement => {}
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

impl DataDevice for TableController {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        match address {
            registers::TABLAT => (self.latch, 0xFF),
            registers::TBLPTRL => (self.pointer as u8, 0xFF),
            registers::TBLPTRH => ((self.pointer >> 8) as u8, 0xFF),
            registers::TBLPTRU => ((self.pointer >> 16) as u8 & 0x3F, 0x3F),
            _ => (0, 0),
        }
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        match address {
            registers::TABLAT => {
                self.latch = data;
                0xFF
            }
            registers::TBLPTRL => {
                self.pointer = (self.pointer & 0x3F_FF00) | data as u32;
                0xFF
            }
            registers::TBLPTRH => {
                self.pointer = (self.pointer & 0x3F_00FF) | ((data as u32) << 8);
                0xFF
            }
            registers::TBLPTRU => {
                self.pointer = (self.pointer & 0x00_FFFF) | (((data & 0x3F) as u32) << 16);
                0x3F
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Memory;

    fn setup() -> (TableController, Memory) {
        let flash = Memory::from_image(0, &[0x10, 0x20, 0x30, 0x40]);
        (TableController::new(), flash)
    }

    #[test]
    fn test_post_increment_walks_forward() {
        let (mut table, mut flash) = setup();
        table.table_read(&mut flash, TableAction::PostIncrement);
        assert_eq!(table.latch(), 0x10);
        table.table_read(&mut flash, TableAction::PostIncrement);
        assert_eq!(table.latch(), 0x20);
        assert_eq!(table.pointer(), 2);
    }

    #[test]
    fn test_pre_increment_reads_next() {
        let (mut table, mut flash) = setup();
        table.table_read(&mut flash, TableAction::PreIncrement);
        assert_eq!(table.latch(), 0x20);
        assert_eq!(table.pointer(), 1);
    }

    #[test]
    fn test_post_decrement_wraps_to_22_bits() {
        let (mut table, mut flash) = setup();
        table.table_read(&mut flash, TableAction::PostDecrement);
        assert_eq!(table.latch(), 0x10);
        assert_eq!(table.pointer(), 0x3F_FFFF);
    }

    #[test]
    fn test_table_write() {
        let (mut table, mut flash) = setup();
        table.write(registers::TBLPTRL, 0x03);
        table.write(registers::TABLAT, 0xEE);
        table.table_write(&mut flash, TableAction::None);
        assert_eq!(flash.as_slice()[3], 0xEE);
        assert_eq!(table.pointer(), 3);
    }

    #[test]
    fn test_pointer_registers() {
        let mut table = TableController::new();
        table.write(registers::TBLPTRU, 0xFF);
        table.write(registers::TBLPTRH, 0x12);
        table.write(registers::TBLPTRL, 0x34);
        assert_eq!(table.pointer(), 0x3F_1234);
        assert_eq!(table.read(registers::TBLPTRU), (0x3F, 0x3F));
    }

    #[test]
    fn test_action_decoding() {
        assert_eq!(TableAction::from_bits(0), TableAction::None);
        assert_eq!(TableAction::from_bits(1), TableAction::PostIncrement);
        assert_eq!(TableAction::from_bits(2), TableAction::PostDecrement);
        assert_eq!(TableAction::from_bits(3), TableAction::PreIncrement);
    }
}
