//! # Bus Abstraction
//!
//! Both address spaces of the core are modelled as buses of devices. Every device sees
//! every access and answers with a bit mask marking which data bits it drives. A
//! composite bus merges the answers with a bitwise OR, so several devices can share
//! one address as long as they own disjoint bits (INTCON is the usual example: the
//! global enables live in the interrupt controller while individual source bits
//! belong to peripherals).
//!
//! A mask of 0 means "not mine". Unmapped reads therefore return `(0, 0)` and
//! unmapped writes are silently dropped.
//!
//! ## Address spaces
//!
//! - [`DataDevice`]: the 12-bit register file, addressed with `u16`
//! - [`ProgramDevice`]: flash memory, 22-bit byte addresses carried in a `u32`

use std::cell::RefCell;
use std::rc::Rc;

/// Bits driven by a device on a single access.
pub type Mask = u8;

/// A device attached to the data (register file) bus.
///
/// Reads take `&mut self` because several special function registers have
/// read side effects (indirect post-increment, PCL latching, receive FIFOs).
///
/// # Examples
///
/// ```rust
/// use libpic18::{DataDevice, Mask};
///
/// struct Latch {
///     value: u8,
/// }
///
/// impl DataDevice for Latch {
///     fn read(&mut self, address: u16) -> (u8, Mask) {
///         if address == 0xF80 {
///             (self.value, 0xFF)
///         } else {
///             (0, 0)
///         }
///     }
///
///     fn write(&mut self, address: u16, data: u8) -> Mask {
///         if address == 0xF80 {
///             self.value = data;
///             0xFF
///         } else {
///             0
///         }
///     }
/// }
/// ```
pub trait DataDevice {
    /// Reads `address`, returning the data and the mask of bits this device drives.
    fn read(&mut self, address: u16) -> (u8, Mask);

    /// Writes `data` to `address`, returning the mask of bits this device accepted.
    fn write(&mut self, address: u16, data: u8) -> Mask;
}

/// A device attached to the program (flash) bus.
pub trait ProgramDevice {
    /// Reads the byte at `address`, returning the data and the driven mask.
    fn read(&mut self, address: u32) -> (u8, Mask);

    /// Writes `data` to `address`, returning the accepted mask.
    fn write(&mut self, address: u32, data: u8) -> Mask;
}

impl<D: DataDevice + ?Sized> DataDevice for Rc<RefCell<D>> {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        self.borrow_mut().read(address)
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        self.borrow_mut().write(address, data)
    }
}

impl<D: ProgramDevice + ?Sized> ProgramDevice for Rc<RefCell<D>> {
    fn read(&mut self, address: u32) -> (u8, Mask) {
        self.borrow_mut().read(address)
    }

    fn write(&mut self, address: u32, data: u8) -> Mask {
        self.borrow_mut().write(address, data)
    }
}

/// Merges one device's read result into an accumulated one.
#[inline]
pub(crate) fn merge(acc: (u8, Mask), next: (u8, Mask)) -> (u8, Mask) {
    let (data, mask) = next;
    (acc.0 | (data & mask), acc.1 | mask)
}

/// The data bus: an ordered list of [`DataDevice`]s.
///
/// # Examples
///
/// ```rust
/// use libpic18::{DataBus, DataDevice, Memory};
///
/// let mut bus = DataBus::new();
/// bus.attach(Box::new(Memory::new(0x000, 0x100)));
///
/// assert_eq!(bus.write(0x010, 0x5A), 0xFF);
/// assert_eq!(bus.read(0x010), (0x5A, 0xFF));
///
/// // Nothing answers above 0xFF
/// assert_eq!(bus.read(0x200), (0, 0));
/// ```
#[derive(Default)]
pub struct DataBus {
    devices: Vec<Box<dyn DataDevice>>,
}

impl DataBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device. Devices are polled in attachment order.
    pub fn attach(&mut self, device: Box<dyn DataDevice>) {
        self.devices.push(device);
    }

    /// Number of attached devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true when no device is attached.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl DataDevice for DataBus {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        self.devices
            .iter_mut()
            .fold((0, 0), |acc, device| merge(acc, device.read(address)))
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        self.devices
            .iter_mut()
            .fold(0, |mask, device| mask | device.write(address, data))
    }
}

/// The program bus: an ordered list of [`ProgramDevice`]s.
#[derive(Default)]
pub struct ProgramBus {
    devices: Vec<Box<dyn ProgramDevice>>,
}

impl ProgramBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device. Devices are polled in attachment order.
    pub fn attach(&mut self, device: Box<dyn ProgramDevice>) {
        self.devices.push(device);
    }

    /// Number of attached devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true when no device is attached.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Reads a little-endian instruction word starting at `address`.
    ///
    /// Unmapped bytes read as 0, so an empty bus yields NOP.
    pub fn read_word(&mut self, address: u32) -> u16 {
        let (low, _) = ProgramDevice::read(self, address);
        let (high, _) = ProgramDevice::read(self, address.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }
}

impl ProgramDevice for ProgramBus {
    fn read(&mut self, address: u32) -> (u8, Mask) {
        self.devices
            .iter_mut()
            .fold((0, 0), |acc, device| merge(acc, device.read(address)))
    }

    fn write(&mut self, address: u32, data: u8) -> Mask {
        self.devices
            .iter_mut()
            .fold(0, |mask, device| mask | device.write(address, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Device answering a single address with a fixed value on selected bits.
    struct BitOwner {
        address: u16,
        value: u8,
        mask: Mask,
        writes: Vec<u8>,
    }

    impl DataDevice for BitOwner {
        fn read(&mut self, address: u16) -> (u8, Mask) {
            if address == self.address {
                (self.value, self.mask)
            } else {
                (0, 0)
            }
        }

        fn write(&mut self, address: u16, data: u8) -> Mask {
            if address == self.address {
                self.writes.push(data);
                self.mask
            } else {
                0
            }
        }
    }

    #[test]
    fn test_merge_ignores_undriven_bits() {
        // Device reports garbage on bits it doesn't drive
        assert_eq!(merge((0x01, 0x01), (0xFF, 0xF0)), (0xF1, 0xF1));
    }

    #[test]
    fn test_data_bus_combines_disjoint_owners() {
        let mut bus = DataBus::new();
        bus.attach(Box::new(BitOwner {
            address: 0xFF2,
            value: 0xFF,
            mask: 0xC0,
            writes: Vec::new(),
        }));
        bus.attach(Box::new(BitOwner {
            address: 0xFF2,
            value: 0x04,
            mask: 0x3F,
            writes: Vec::new(),
        }));

        assert_eq!(bus.read(0xFF2), (0xC4, 0xFF));
        assert_eq!(bus.write(0xFF2, 0x00), 0xFF);
    }

    #[test]
    fn test_unmapped_access() {
        let mut bus = DataBus::new();
        assert!(bus.is_empty());
        assert_eq!(bus.read(0x123), (0, 0));
        assert_eq!(bus.write(0x123, 0xAA), 0);
    }

    #[test]
    fn test_shared_device_sees_writes() {
        let shared = Rc::new(RefCell::new(BitOwner {
            address: 0x010,
            value: 0,
            mask: 0xFF,
            writes: Vec::new(),
        }));

        let mut bus = DataBus::new();
        bus.attach(Box::new(Rc::clone(&shared)));
        bus.write(0x010, 0x42);

        assert_eq!(shared.borrow().writes, vec![0x42]);
    }

    #[test]
    fn test_program_bus_read_word_empty() {
        let mut bus = ProgramBus::new();
        assert_eq!(bus.read_word(0x100), 0x0000);
    }
}
