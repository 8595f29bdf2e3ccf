//! # Instruction Decoding
//!
//! Every PIC18 instruction is a 16-bit word (two-word instructions carry their
//! extra operand in a second word starting with `1111`). Decoding walks an ordered
//! table of `(mask, pattern)` pairs and returns the first match, so more specific
//! encodings must come before the broader ones they overlap (RETFIE before
//! RETURN, ADDULNK before ADDFSR, the exact-match control words before anything
//! else).
//!
//! Decoding is total: words matching no entry decode to [`Opcode::Illegal`]. Any
//! word starting with `1111` decodes to [`Opcode::Nop1`], which is what the core
//! executes when it lands on the second word of a skipped two-word instruction.
//!
//! [`Instruction`] wraps the raw word and exposes the operand fields of each
//! encoding format.

use crate::table::TableAction;

/// Every PIC18 opcode, including the extended instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Illegal,

    // Byte-oriented file register operations
    Addwf,
    Addwfc,
    Andwf,
    Clrf,
    Comf,
    Cpfseq,
    Cpfsgt,
    Cpfslt,
    Decf,
    Decfsz,
    Dcfsnz,
    Incf,
    Incfsz,
    Infsnz,
    Iorwf,
    Movf,
    Movff,
    Movwf,
    Mulwf,
    Negf,
    Rlcf,
    Rlncf,
    Rrcf,
    Rrncf,
    Setf,
    Subfwb,
    Subwf,
    Subwfb,
    Swapf,
    Tstfsz,
    Xorwf,

    // Bit-oriented file register operations
    Bcf,
    Bsf,
    Btfsc,
    Btfss,
    Btg,

    // Control operations
    Bc,
    Bn,
    Bnc,
    Bnn,
    Bnov,
    Bnz,
    Bov,
    Bra,
    Bz,
    Call,
    Clrwdt,
    Daw,
    Goto,
    Nop,
    /// Second word of a two-word instruction, executed as NOP.
    Nop1,
    Pop,
    Push,
    Rcall,
    Reset,
    Retfie,
    Retlw,
    Return,
    Sleep,

    // Literal operations
    Addlw,
    Andlw,
    Iorlw,
    Lfsr,
    Movlb,
    Movlw,
    Mullw,
    Sublw,
    Xorlw,

    // Data memory <-> program memory
    Tblrd,
    Tblwt,

    // Extended instruction set
    Addfsr,
    Addulnk,
    Callw,
    Movsf,
    Movss,
    Pushl,
    Subfsr,
    Subulnk,
}

impl Opcode {
    /// Assembler mnemonic.
    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Illegal => "???",
            Addwf => "ADDWF",
            Addwfc => "ADDWFC",
            Andwf => "ANDWF",
            Clrf => "CLRF",
            Comf => "COMF",
            Cpfseq => "CPFSEQ",
            Cpfsgt => "CPFSGT",
            Cpfslt => "CPFSLT",
            Decf => "DECF",
            Decfsz => "DECFSZ",
            Dcfsnz => "DCFSNZ",
            Incf => "INCF",
            Incfsz => "INCFSZ",
            Infsnz => "INFSNZ",
            Iorwf => "IORWF",
            Movf => "MOVF",
            Movff => "MOVFF",
            Movwf => "MOVWF",
            Mulwf => "MULWF",
            Negf => "NEGF",
            Rlcf => "RLCF",
            Rlncf => "RLNCF",
            Rrcf => "RRCF",
            Rrncf => "RRNCF",
            Setf => "SETF",
            Subfwb => "SUBFWB",
            Subwf => "SUBWF",
            Subwfb => "SUBWFB",
            Swapf => "SWAPF",
            Tstfsz => "TSTFSZ",
            Xorwf => "XORWF",
            Bcf => "BCF",
            Bsf => "BSF",
            Btfsc => "BTFSC",
            Btfss => "BTFSS",
            Btg => "BTG",
            Bc => "BC",
            Bn => "BN",
            Bnc => "BNC",
            Bnn => "BNN",
            Bnov => "BNOV",
            Bnz => "BNZ",
            Bov => "BOV",
            Bra => "BRA",
            Bz => "BZ",
            Call => "CALL",
            Clrwdt => "CLRWDT",
            Daw => "DAW",
            Goto => "GOTO",
            Nop | Nop1 => "NOP",
            Pop => "POP",
            Push => "PUSH",
            Rcall => "RCALL",
            Reset => "RESET",
            Retfie => "RETFIE",
            Retlw => "RETLW",
            Return => "RETURN",
            Sleep => "SLEEP",
            Addlw => "ADDLW",
            Andlw => "ANDLW",
            Iorlw => "IORLW",
            Lfsr => "LFSR",
            Movlb => "MOVLB",
            Movlw => "MOVLW",
            Mullw => "MULLW",
            Sublw => "SUBLW",
            Xorlw => "XORLW",
            Tblrd => "TBLRD",
            Tblwt => "TBLWT",
            Addfsr => "ADDFSR",
            Addulnk => "ADDULNK",
            Callw => "CALLW",
            Movsf => "MOVSF",
            Movss => "MOVSS",
            Pushl => "PUSHL",
            Subfsr => "SUBFSR",
            Subulnk => "SUBULNK",
        }
    }

    /// Number of program words the instruction occupies.
    pub fn words(self) -> u8 {
        match self {
            Opcode::Movff
            | Opcode::Call
            | Opcode::Goto
            | Opcode::Lfsr
            | Opcode::Movsf
            | Opcode::Movss => 2,
            _ => 1,
        }
    }

    /// Returns true for instructions that only exist with XINST enabled.
    pub fn is_extended(self) -> bool {
        matches!(
            self,
            Opcode::Addfsr
                | Opcode::Addulnk
                | Opcode::Callw
                | Opcode::Movsf
                | Opcode::Movss
                | Opcode::Pushl
                | Opcode::Subfsr
                | Opcode::Subulnk
        )
    }
}

/// One row of the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeEntry {
    pub mask: u16,
    pub pattern: u16,
    pub opcode: Opcode,
}

const fn entry(mask: u16, pattern: u16, opcode: Opcode) -> DecodeEntry {
    DecodeEntry {
        mask,
        pattern,
        opcode,
    }
}

/// Decode table in priority order.
pub const DECODE_TABLE: &[DecodeEntry] = &[
    // Exact encodings
    entry(0xFFFF, 0x0004, Opcode::Clrwdt),
    entry(0xFFFF, 0x0007, Opcode::Daw),
    entry(0xFFFF, 0x0000, Opcode::Nop),
    entry(0xFFFF, 0x0006, Opcode::Pop),
    entry(0xFFFF, 0x0005, Opcode::Push),
    entry(0xFFFF, 0x00FF, Opcode::Reset),
    entry(0xFFFF, 0x0003, Opcode::Sleep),
    entry(0xFFFF, 0x0014, Opcode::Callw),
    entry(0xFFFE, 0x0010, Opcode::Retfie),
    entry(0xFFFE, 0x0012, Opcode::Return),
    entry(0xFFFC, 0x0008, Opcode::Tblrd),
    entry(0xFFFC, 0x000C, Opcode::Tblwt),
    entry(0xFFF0, 0x0100, Opcode::Movlb),
    // 0xE8xx / 0xE9xx / 0xEBxx / 0xEExx families
    entry(0xFFC0, 0xEE00, Opcode::Lfsr),
    entry(0xFFC0, 0xE8C0, Opcode::Addulnk),
    entry(0xFFC0, 0xE9C0, Opcode::Subulnk),
    entry(0xFF80, 0xEB00, Opcode::Movsf),
    entry(0xFF80, 0xEB80, Opcode::Movss),
    // Conditional branches
    entry(0xFF00, 0xE200, Opcode::Bc),
    entry(0xFF00, 0xE600, Opcode::Bn),
    entry(0xFF00, 0xE300, Opcode::Bnc),
    entry(0xFF00, 0xE700, Opcode::Bnn),
    entry(0xFF00, 0xE500, Opcode::Bnov),
    entry(0xFF00, 0xE100, Opcode::Bnz),
    entry(0xFF00, 0xE400, Opcode::Bov),
    entry(0xFF00, 0xE000, Opcode::Bz),
    entry(0xFF00, 0xEF00, Opcode::Goto),
    // Literals
    entry(0xFF00, 0x0C00, Opcode::Retlw),
    entry(0xFF00, 0x0F00, Opcode::Addlw),
    entry(0xFF00, 0x0B00, Opcode::Andlw),
    entry(0xFF00, 0x0900, Opcode::Iorlw),
    entry(0xFF00, 0x0E00, Opcode::Movlw),
    entry(0xFF00, 0x0D00, Opcode::Mullw),
    entry(0xFF00, 0x0800, Opcode::Sublw),
    entry(0xFF00, 0x0A00, Opcode::Xorlw),
    entry(0xFF00, 0xE800, Opcode::Addfsr),
    entry(0xFF00, 0xEA00, Opcode::Pushl),
    entry(0xFF00, 0xE900, Opcode::Subfsr),
    // Byte operations without a destination bit
    entry(0xFE00, 0x6200, Opcode::Cpfseq),
    entry(0xFE00, 0x6400, Opcode::Cpfsgt),
    entry(0xFE00, 0x6000, Opcode::Cpfslt),
    entry(0xFE00, 0x6A00, Opcode::Clrf),
    entry(0xFE00, 0x6E00, Opcode::Movwf),
    entry(0xFE00, 0x0200, Opcode::Mulwf),
    entry(0xFE00, 0x6C00, Opcode::Negf),
    entry(0xFE00, 0x6800, Opcode::Setf),
    entry(0xFE00, 0x6600, Opcode::Tstfsz),
    entry(0xFE00, 0xEC00, Opcode::Call),
    // Byte operations with a destination bit
    entry(0xFC00, 0x2400, Opcode::Addwf),
    entry(0xFC00, 0x2000, Opcode::Addwfc),
    entry(0xFC00, 0x1400, Opcode::Andwf),
    entry(0xFC00, 0x1C00, Opcode::Comf),
    entry(0xFC00, 0x0400, Opcode::Decf),
    entry(0xFC00, 0x2C00, Opcode::Decfsz),
    entry(0xFC00, 0x4C00, Opcode::Dcfsnz),
    entry(0xFC00, 0x2800, Opcode::Incf),
    entry(0xFC00, 0x3C00, Opcode::Incfsz),
    entry(0xFC00, 0x4800, Opcode::Infsnz),
    entry(0xFC00, 0x1000, Opcode::Iorwf),
    entry(0xFC00, 0x5000, Opcode::Movf),
    entry(0xFC00, 0x3400, Opcode::Rlcf),
    entry(0xFC00, 0x4400, Opcode::Rlncf),
    entry(0xFC00, 0x3000, Opcode::Rrcf),
    entry(0xFC00, 0x4000, Opcode::Rrncf),
    entry(0xFC00, 0x5400, Opcode::Subfwb),
    entry(0xFC00, 0x5C00, Opcode::Subwf),
    entry(0xFC00, 0x5800, Opcode::Subwfb),
    entry(0xFC00, 0x3800, Opcode::Swapf),
    entry(0xFC00, 0x1800, Opcode::Xorwf),
    // Relative jumps with 11-bit offsets
    entry(0xF800, 0xD000, Opcode::Bra),
    entry(0xF800, 0xD800, Opcode::Rcall),
    // 4-bit prefixes
    entry(0xF000, 0xC000, Opcode::Movff),
    entry(0xF000, 0x9000, Opcode::Bcf),
    entry(0xF000, 0x8000, Opcode::Bsf),
    entry(0xF000, 0xB000, Opcode::Btfsc),
    entry(0xF000, 0xA000, Opcode::Btfss),
    entry(0xF000, 0x7000, Opcode::Btg),
    entry(0xF000, 0xF000, Opcode::Nop1),
];

/// Decodes an instruction word.
///
/// # Examples
///
/// ```rust
/// use libpic18::{decode, Opcode};
///
/// assert_eq!(decode(0x0E45), Opcode::Movlw);
/// assert_eq!(decode(0x0012), Opcode::Return);
/// assert_eq!(decode(0x0013), Opcode::Return); // RETURN FAST
/// assert_eq!(decode(0xF123), Opcode::Nop1);
/// assert_eq!(decode(0x0001), Opcode::Illegal);
/// ```
pub fn decode(word: u16) -> Opcode {
    DECODE_TABLE
        .iter()
        .find(|entry| word & entry.mask == entry.pattern)
        .map_or(Opcode::Illegal, |entry| entry.opcode)
}

/// A raw instruction word with typed views of its operand fields.
///
/// Accessors are grouped by encoding format; calling one that does not belong to
/// the word's format simply extracts those bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(pub u16);

impl Instruction {
    pub fn opcode(self) -> Opcode {
        decode(self.0)
    }

    // ========== Byte / bit oriented ==========

    /// 8-bit file register address.
    pub fn file(self) -> u8 {
        self.0 as u8
    }

    /// `a` bit: true selects the bank in BSR, false the access bank.
    pub fn banked(self) -> bool {
        self.0 & 0x0100 != 0
    }

    /// `d` bit: true stores the result in the file register, false in W.
    pub fn to_file(self) -> bool {
        self.0 & 0x0200 != 0
    }

    /// Bit number of BCF/BSF/BTG/BTFSC/BTFSS.
    pub fn bit(self) -> u8 {
        ((self.0 & 0x0E00) >> 9) as u8
    }

    /// 12-bit file address of MOVFF and the second word of MOVSF.
    pub fn file12(self) -> u16 {
        self.0 & 0x0FFF
    }

    // ========== Literal ==========

    /// 8-bit literal.
    pub fn literal(self) -> u8 {
        self.0 as u8
    }

    // ========== Control ==========

    /// Low 8 bits of a GOTO/CALL target word address (first word).
    pub fn target_low(self) -> u8 {
        self.0 as u8
    }

    /// High 12 bits of a GOTO/CALL target word address (second word).
    pub fn target_high(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// `s` bit of CALL (bit 8).
    pub fn call_fast(self) -> bool {
        self.0 & 0x0100 != 0
    }

    /// `s` bit of RETURN/RETFIE (bit 0).
    pub fn return_fast(self) -> bool {
        self.0 & 0x0001 != 0
    }

    /// Signed 8-bit word offset of conditional branches.
    pub fn offset8(self) -> i32 {
        self.0 as u8 as i8 as i32
    }

    /// Signed 11-bit word offset of BRA/RCALL.
    pub fn offset11(self) -> i32 {
        // Move bit 10 into the sign position, then shift back arithmetically
        (((self.0 & 0x07FF) << 5) as i16 >> 5) as i32
    }

    // ========== LFSR ==========

    /// FSR number of LFSR (first word).
    pub fn lfsr_fsr(self) -> usize {
        ((self.0 & 0x0030) >> 4) as usize
    }

    /// High nibble of the LFSR literal (first word).
    pub fn lfsr_high(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    // ========== Table ==========

    pub fn table_action(self) -> TableAction {
        TableAction::from_bits(self.0 as u8)
    }

    // ========== Extended ==========

    /// FSR number of ADDFSR/SUBFSR.
    pub fn xinst_fsr(self) -> usize {
        ((self.0 & 0x00C0) >> 6) as usize
    }

    /// 6-bit literal of ADDFSR/SUBFSR/ADDULNK/SUBULNK.
    pub fn xinst_literal(self) -> u8 {
        (self.0 & 0x003F) as u8
    }

    /// 7-bit FSR2 offset of MOVSF/MOVSS.
    pub fn stack_offset(self) -> u8 {
        (self.0 & 0x007F) as u8
    }
}
