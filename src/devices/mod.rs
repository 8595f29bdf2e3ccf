//! Peripheral devices for the data bus.
//!
//! Devices implement [`DataDevice`](crate::DataDevice) and register their
//! interrupt sources with the [`Cpu`](crate::Cpu) when constructed. To keep a host
//! handle on a device after attaching it, wrap it in `Rc<RefCell<_>>`; the bus
//! traits are implemented for that wrapper.

pub mod eusart;

pub use eusart::{Eusart, EusartPort, EusartRegisters};
