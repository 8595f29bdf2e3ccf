//! EUSART (enhanced universal synchronous/asynchronous receiver transmitter).
//!
//! Byte-level serial port with a host callback interface, mapped onto the data bus
//! at the register addresses of EUSART1 or EUSART2.
//!
//! ## Registers
//!
//! | Register | Port 1 | Port 2 | Description |
//! |----------|--------|--------|-------------|
//! | RCSTA    | 0xFAB  | 0xF71  | Receive status and control |
//! | TXSTA    | 0xFAC  | 0xF72  | Transmit status and control |
//! | TXREG    | 0xFAD  | 0xF73  | Transmit data |
//! | RCREG    | 0xFAE  | 0xF74  | Receive data |
//! | SPBRG    | 0xFAF  | 0xF75  | Baud rate generator, low byte |
//! | SPBRGH   | 0xFB0  | 0xF76  | Baud rate generator, high byte |
//! | BAUDCON  | 0xFB8  | 0xF70  | Baud rate control |
//!
//! ## Transmit
//!
//! A TXREG write clears TXIF and moves the byte straight into the shift register,
//! which hands it to the transmit callback. The shift register empties at once,
//! so TRMT reads 1 again and TXIF is raised as soon as the write completes.
//! Setting TXEN also raises TXIF.
//!
//! ## Receive
//!
//! [`Eusart::receive_byte`] accepts data only while SPEN and one of SREN/CREN are
//! set. SREN is cleared after one byte. A byte arriving while RCIF is still set
//! is dropped and latches OERR, which clears when CREN is cleared. Reading RCREG
//! clears RCIF.
//!
//! Baud rate, polarity and wake-up settings are stored but have no timing effect.

use crate::bus::{DataDevice, Mask};
use crate::cpu::Cpu;
use crate::interrupts::{Interrupt, InterruptConfig};
use crate::Result;

// TXSTA
const CSRC: u8 = 0x80;
const TX9: u8 = 0x40;
const TXEN: u8 = 0x20;
const SYNC: u8 = 0x10;
const SENDB: u8 = 0x08;
const BRGH: u8 = 0x04;
const TRMT: u8 = 0x02;
const TX9D: u8 = 0x01;

// RCSTA
const SPEN: u8 = 0x80;
const RX9: u8 = 0x40;
const SREN: u8 = 0x20;
const CREN: u8 = 0x10;
const ADDEN: u8 = 0x08;
const FERR: u8 = 0x04;
const OERR: u8 = 0x02;
const RX9D: u8 = 0x01;

// BAUDCON
const RCIDL: u8 = 0x40;
const BAUDCON_WRITABLE: u8 = 0x3A;
const BAUDCON_MASK: Mask = 0xFB;

/// Which of the two serial ports the device stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EusartPort {
    One,
    Two,
}

/// Data bus addresses of one port's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EusartRegisters {
    pub txsta: u16,
    pub rcsta: u16,
    pub txreg: u16,
    pub rcreg: u16,
    pub spbrg: u16,
    pub spbrgh: u16,
    pub baudcon: u16,
}

impl EusartPort {
    pub fn registers(self) -> EusartRegisters {
        match self {
            EusartPort::One => EusartRegisters {
                rcsta: 0xFAB,
                txsta: 0xFAC,
                txreg: 0xFAD,
                rcreg: 0xFAE,
                spbrg: 0xFAF,
                spbrgh: 0xFB0,
                baudcon: 0xFB8,
            },
            EusartPort::Two => EusartRegisters {
                baudcon: 0xF70,
                rcsta: 0xF71,
                txsta: 0xF72,
                txreg: 0xF73,
                rcreg: 0xF74,
                spbrg: 0xF75,
                spbrgh: 0xF76,
            },
        }
    }

    /// Peripheral interrupt register group holding TXIF/RCIF.
    fn interrupt_group(self) -> u8 {
        match self {
            EusartPort::One => 1,
            EusartPort::Two => 3,
        }
    }

    fn number(self) -> u8 {
        match self {
            EusartPort::One => 1,
            EusartPort::Two => 2,
        }
    }
}

/// One EUSART port.
///
/// # Example
///
/// ```rust
/// use libpic18::{Cpu, CpuConfig, Eusart, EusartPort};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let mut cpu = Cpu::new(CpuConfig::default());
/// let mut eusart = Eusart::new(EusartPort::One, &mut cpu).unwrap();
///
/// let sent = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&sent);
/// eusart.set_transmit_callback(move |byte| sink.borrow_mut().push(byte));
///
/// let eusart = Rc::new(RefCell::new(eusart));
/// cpu.attach_data(Box::new(Rc::clone(&eusart)));
///
/// cpu.write_data(0xFAC, 0x20); // TXSTA1.TXEN
/// cpu.write_data(0xFAD, b'A'); // TXREG1
/// assert_eq!(*sent.borrow(), vec![b'A']);
/// ```
pub struct Eusart {
    port: EusartPort,
    registers: EusartRegisters,

    txsta: u8,
    rcsta: u8,
    baudcon: u8,
    baud_rate: u16,

    tx_reg: u8,
    rx_reg: u8,

    on_transmit: Option<Box<dyn FnMut(u8)>>,

    tx_interrupt: Interrupt,
    rx_interrupt: Interrupt,
}

impl Eusart {
    /// Creates a port and registers its TX and RC interrupt sources with `cpu`.
    ///
    /// The device still has to be attached to the data bus.
    ///
    /// # Errors
    ///
    /// Propagates interrupt registration failures.
    pub fn new(port: EusartPort, cpu: &mut Cpu) -> Result<Self> {
        let group = port.interrupt_group();
        let number = port.number();
        let tx_interrupt = cpu.register_interrupt(InterruptConfig::peripheral(
            &format!("TX{}", number),
            group,
            4,
        )?)?;
        let rx_interrupt = cpu.register_interrupt(InterruptConfig::peripheral(
            &format!("RC{}", number),
            group,
            5,
        )?)?;

        Ok(Self {
            port,
            registers: port.registers(),
            txsta: 0,
            rcsta: 0,
            baudcon: 0,
            baud_rate: 0,
            tx_reg: 0,
            rx_reg: 0,
            on_transmit: None,
            tx_interrupt,
            rx_interrupt,
        })
    }

    /// Sets the function receiving every transmitted byte.
    pub fn set_transmit_callback<F>(&mut self, callback: F)
    where
        F: FnMut(u8) + 'static,
    {
        self.on_transmit = Some(Box::new(callback));
    }

    /// Delivers a byte from the host side of the line.
    ///
    /// # Returns
    ///
    /// `true` if the byte landed in RCREG.
    pub fn receive_byte(&mut self, byte: u8) -> bool {
        if self.rcsta & SPEN == 0 || self.rcsta & (SREN | CREN) == 0 {
            return false;
        }

        if self.rx_interrupt.is_requested() {
            log::debug!("EUSART{} overrun, dropped {:#04X}", self.port.number(), byte);
            self.rcsta |= OERR;
            return false;
        }

        self.rcsta &= !SREN;
        self.rx_reg = byte;
        self.rx_interrupt.raise();
        true
    }

    pub fn port(&self) -> EusartPort {
        self.port
    }

    /// Baud rate generator value (SPBRGH:SPBRG).
    pub fn baud_rate(&self) -> u16 {
        self.baud_rate
    }

    /// Returns true while TXSTA.TXEN is set.
    pub fn is_transmit_enabled(&self) -> bool {
        self.txsta & TXEN != 0
    }

    /// Returns true after a dropped byte, until CREN is cleared.
    pub fn has_overrun(&self) -> bool {
        self.rcsta & OERR != 0
    }

    fn transmit(&mut self, byte: u8) {
        self.tx_reg = byte;
        self.tx_interrupt.clear();

        // The shift register empties within the same cycle
        if let Some(callback) = self.on_transmit.as_mut() {
            callback(byte);
        }
        self.tx_interrupt.raise();
    }

    fn write_txsta(&mut self, value: u8) {
        self.txsta = value & (CSRC | TX9 | TXEN | SYNC | SENDB | BRGH | TX9D);
        if self.txsta & TXEN != 0 {
            self.tx_interrupt.raise();
        }
    }

    fn write_rcsta(&mut self, value: u8) {
        let errors = self.rcsta & (FERR | OERR);
        self.rcsta = (value & (SPEN | RX9 | SREN | CREN | ADDEN | RX9D)) | errors;
        if self.rcsta & CREN == 0 {
            self.rcsta &= !OERR;
        }
    }
}

impl DataDevice for Eusart {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        let r = self.registers;
        match address {
            a if a == r.txsta => (self.txsta | TRMT, 0xFF),
            a if a == r.rcsta => (self.rcsta, 0xFF),
            a if a == r.txreg => (self.tx_reg, 0xFF),
            a if a == r.rcreg => {
                self.rx_interrupt.clear();
                (self.rx_reg, 0xFF)
            }
            a if a == r.spbrg => (self.baud_rate as u8, 0xFF),
            a if a == r.spbrgh => ((self.baud_rate >> 8) as u8, 0xFF),
            // The receiver is always idle between bytes
            a if a == r.baudcon => (self.baudcon | RCIDL, BAUDCON_MASK),
            _ => (0, 0),
        }
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        let r = self.registers;
        match address {
            a if a == r.txsta => self.write_txsta(data),
            a if a == r.rcsta => self.write_rcsta(data),
            a if a == r.txreg => self.transmit(data),
            a if a == r.rcreg => {}
            a if a == r.spbrg => self.baud_rate = (self.baud_rate & 0xFF00) | data as u16,
            a if a == r.spbrgh => {
                self.baud_rate = (self.baud_rate & 0x00FF) | ((data as u16) << 8)
            }
            a if a == r.baudcon => {
                self.baudcon = data & BAUDCON_WRITABLE;
                return BAUDCON_MASK;
            }
            _ => return 0,
        }
        0xFF
    }
}
