//! WebAssembly bindings for the libpic18 emulator.
//!
//! This module provides a JavaScript-callable PIC18 system: program flash, data
//! RAM and EUSART1 wired to a terminal callback.

pub mod api;

pub use api::Pic18Emulator;
