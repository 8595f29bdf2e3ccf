//! Data-bus addresses of the core special function registers.
//!
//! Addresses are full 12-bit register file addresses (access bank SFRs live
//! in 0xF60..=0xFFF).

pub const TOSU: u16 = 0xFFF;
pub const TOSH: u16 = 0xFFE;
pub const TOSL: u16 = 0xFFD;
pub const STKPTR: u16 = 0xFFC;
pub const PCLATU: u16 = 0xFFB;
pub const PCLATH: u16 = 0xFFA;
pub const PCL: u16 = 0xFF9;
pub const TBLPTRU: u16 = 0xFF8;
pub const TBLPTRH: u16 = 0xFF7;
pub const TBLPTRL: u16 = 0xFF6;
pub const TABLAT: u16 = 0xFF5;
pub const PRODH: u16 = 0xFF4;
pub const PRODL: u16 = 0xFF3;
pub const INTCON: u16 = 0xFF2;

pub const INDF0: u16 = 0xFEF;
pub const POSTINC0: u16 = 0xFEE;
pub const POSTDEC0: u16 = 0xFED;
pub const PREINC0: u16 = 0xFEC;
pub const PLUSW0: u16 = 0xFEB;
pub const FSR0H: u16 = 0xFEA;
pub const FSR0L: u16 = 0xFE9;

pub const WREG: u16 = 0xFE8;

pub const INDF1: u16 = 0xFE7;
pub const POSTINC1: u16 = 0xFE6;
pub const POSTDEC1: u16 = 0xFE5;
pub const PREINC1: u16 = 0xFE4;
pub const PLUSW1: u16 = 0xFE3;
pub const FSR1H: u16 = 0xFE2;
pub const FSR1L: u16 = 0xFE1;

pub const BSR: u16 = 0xFE0;

pub const INDF2: u16 = 0xFDF;
pub const POSTINC2: u16 = 0xFDE;
pub const POSTDEC2: u16 = 0xFDD;
pub const PREINC2: u16 = 0xFDC;
pub const PLUSW2: u16 = 0xFDB;
pub const FSR2H: u16 = 0xFDA;
pub const FSR2L: u16 = 0xFD9;

pub const STATUS: u16 = 0xFD8;
pub const RCON: u16 = 0xFD0;

/// Interrupt vector for high priority (and compatibility mode) interrupts.
pub const HIGH_PRIORITY_VECTOR: u32 = 0x000008;

/// Interrupt vector for low priority interrupts.
pub const LOW_PRIORITY_VECTOR: u32 = 0x000018;

/// Mask applied to the program counter (2 MiB address space).
pub const PC_MASK: u32 = 0x1F_FFFF;
