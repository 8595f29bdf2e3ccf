//! WASM API for the PIC18 emulator.
//!
//! Provides JavaScript-callable interfaces for loading firmware, stepping the core,
//! inspecting registers and exchanging bytes with EUSART1.

use crate::{registers, Cpu, CpuConfig, Eusart, EusartPort, Memory, Status};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// Program flash size (64 KiB)
const PROGRAM_SIZE: usize = 0x1_0000;

/// General purpose RAM below the SFR area
const RAM_SIZE: usize = 0xF00;

/// JavaScript-compatible error wrapper
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsError {
    message: String,
}

#[wasm_bindgen]
impl JsError {
    #[wasm_bindgen(constructor)]
    pub fn new(message: &str) -> JsError {
        JsError {
            message: message.to_string(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<crate::Error> for JsError {
    fn from(error: crate::Error) -> Self {
        JsError::new(&error.to_string())
    }
}

/// Main emulator interface for JavaScript
#[wasm_bindgen]
pub struct Pic18Emulator {
    cpu: Cpu,
    flash: Rc<RefCell<Memory>>,
    eusart: Rc<RefCell<Eusart>>,
}

#[wasm_bindgen]
impl Pic18Emulator {
    /// Create a PIC18 system with EUSART1 transmitting to `on_transmit`.
    ///
    /// `extended` enables the extended instruction set.
    #[wasm_bindgen(constructor)]
    pub fn new(on_transmit: js_sys::Function, extended: bool) -> Result<Pic18Emulator, JsError> {
        let mut cpu = Cpu::new(CpuConfig {
            extended_instruction_set: extended,
            ..CpuConfig::default()
        });

        let flash = Rc::new(RefCell::new(Memory::new(0, PROGRAM_SIZE)));
        cpu.attach_program(Box::new(Rc::clone(&flash)));
        cpu.attach_data(Box::new(Memory::new(0, RAM_SIZE)));

        let mut eusart = Eusart::new(EusartPort::One, &mut cpu)?;
        eusart.set_transmit_callback(move |byte| {
            let char_str = String::from_utf8(vec![byte]).unwrap_or_else(|_| "?".to_string());
            if let Err(err) = on_transmit.call1(&JsValue::NULL, &JsValue::from_str(&char_str)) {
                log::warn!("transmit callback threw {:?}", err);
            }
        });
        let eusart = Rc::new(RefCell::new(eusart));
        cpu.attach_data(Box::new(Rc::clone(&eusart)));

        Ok(Pic18Emulator { cpu, flash, eusart })
    }

    /// Copy a firmware image into flash at `start` and reset the core.
    pub fn load_program(&mut self, image: &[u8], start: u32) -> Result<(), JsError> {
        self.flash.borrow_mut().load(start as usize, image)?;
        self.cpu.power_on_reset();
        Ok(())
    }

    /// Execute a single instruction cycle
    pub fn tick(&mut self) {
        self.cpu.tick();
    }

    /// Execute multiple cycles and return cycles executed
    pub fn run_for_cycles(&mut self, cycles: u32) -> u32 {
        self.cpu.run_for_cycles(cycles as u64) as u32
    }

    /// Power-on reset (memory contents are kept)
    pub fn reset(&mut self) {
        self.cpu.power_on_reset();
    }

    // Register getters
    #[wasm_bindgen(getter)]
    pub fn wreg(&self) -> u8 {
        self.cpu.wreg()
    }

    #[wasm_bindgen(getter)]
    pub fn pc(&self) -> u32 {
        self.cpu.pc()
    }

    #[wasm_bindgen(getter)]
    pub fn bsr(&self) -> u8 {
        self.cpu.bsr()
    }

    #[wasm_bindgen(getter)]
    pub fn status(&self) -> u8 {
        self.cpu.status().bits()
    }

    #[wasm_bindgen(getter)]
    pub fn cycles(&self) -> f64 {
        self.cpu.cycles() as f64 // Convert u64 to f64 for JavaScript
    }

    #[wasm_bindgen(getter)]
    pub fn asleep(&self) -> bool {
        self.cpu.is_asleep()
    }

    // Flag getters
    #[wasm_bindgen(getter)]
    pub fn flag_c(&self) -> bool {
        self.cpu.status().contains(Status::C)
    }

    #[wasm_bindgen(getter)]
    pub fn flag_z(&self) -> bool {
        self.cpu.status().contains(Status::Z)
    }

    #[wasm_bindgen(getter)]
    pub fn flag_n(&self) -> bool {
        self.cpu.status().contains(Status::N)
    }

    #[wasm_bindgen(getter)]
    pub fn flag_ov(&self) -> bool {
        self.cpu.status().contains(Status::OV)
    }

    /// FSR`n` (0..=2)
    pub fn fsr(&self, n: usize) -> Result<u16, JsError> {
        if n > 2 {
            return Err(JsError::new(&format!("FSR{} does not exist", n)));
        }
        Ok(self.cpu.fsr(n))
    }

    /// Redirect execution to `address`
    pub fn set_pc(&mut self, address: u32) {
        self.cpu.set_pc(address);
    }

    // EUSART methods

    /// Deliver a character from the terminal to EUSART1
    pub fn receive_char(&mut self, byte: u8) -> bool {
        self.eusart.borrow_mut().receive_byte(byte)
    }

    // Memory access methods

    /// Read a data register the way an instruction would
    pub fn read_data(&mut self, address: u16) -> u8 {
        self.cpu.read_data(address)
    }

    /// Write a data register the way an instruction would
    pub fn write_data(&mut self, address: u16, value: u8) {
        self.cpu.write_data(address, value);
    }

    /// Read a 256-byte bank of the register file (for efficient display)
    pub fn get_bank(&mut self, bank: u8) -> Vec<u8> {
        let start = ((bank & 0x0F) as u16) << 8;
        let rcreg = EusartPort::One.registers().rcreg;
        // Registers with read side effects read as 0
        (0..256)
            .map(|i| {
                let address = start + i;
                if crate::bank::is_indirect(address)
                    || address == registers::PCL
                    || address == rcreg
                {
                    0
                } else {
                    self.cpu.read_data(address)
                }
            })
            .collect()
    }

    /// Read a byte of program memory
    pub fn read_program(&mut self, address: u32) -> u8 {
        self.cpu.read_program(address)
    }
}
