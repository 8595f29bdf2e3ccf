//! # Flat Memory Device
//!
//! `Memory` is a plain byte array mapped at a fixed offset. It implements both
//! [`DataDevice`] and [`ProgramDevice`], so the same type backs general purpose
//! RAM on the data bus and flash on the program bus.
//!
//! Accesses inside `offset..offset + len` drive all eight bits; accesses
//! outside the window report mask 0 and leave the device untouched.

use crate::bus::{DataDevice, Mask, ProgramDevice};
use crate::{Error, Result};

/// Byte-addressable memory mapped at `offset`.
///
/// # Examples
///
/// ```rust
/// use libpic18::{Memory, ProgramDevice};
///
/// // GOTO 0x000100 encoded as two little-endian words
/// let mut flash = Memory::from_words(0, &[0xEF80, 0xF000]);
///
/// assert_eq!(ProgramDevice::read(&mut flash, 0), (0x80, 0xFF));
/// assert_eq!(ProgramDevice::read(&mut flash, 1), (0xEF, 0xFF));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    offset: usize,
    data: Vec<u8>,
}

impl Memory {
    /// Creates zero-filled memory of `size` bytes starting at `offset`.
    pub fn new(offset: usize, size: usize) -> Self {
        Self {
            offset,
            data: vec![0; size],
        }
    }

    /// Creates memory whose contents (and size) are exactly `image`.
    pub fn from_image(offset: usize, image: &[u8]) -> Self {
        Self {
            offset,
            data: image.to_vec(),
        }
    }

    /// Creates memory from instruction words, stored little-endian.
    ///
    /// This is the layout the core fetches from, so it is the quickest way
    /// to build a program image in tests.
    pub fn from_words(offset: usize, words: &[u16]) -> Self {
        let image: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        Self::from_image(offset, &image)
    }

    /// Copies `image` into the device starting at device-relative `start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageTooLarge`] if the image runs past the end of the device.
    /// The device is left unchanged in that case.
    pub fn load(&mut self, start: usize, image: &[u8]) -> Result<()> {
        let end = start
            .checked_add(image.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::ImageTooLarge {
                start,
                len: image.len(),
                size: self.data.len(),
            })?;

        self.data[start..end].copy_from_slice(image);
        Ok(())
    }

    /// Bus address of the first byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for zero-sized memory.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn index(&self, address: usize) -> Option<usize> {
        address
            .checked_sub(self.offset)
            .filter(|&index| index < self.data.len())
    }

    fn read_at(&self, address: usize) -> (u8, Mask) {
        match self.index(address) {
            Some(index) => (self.data[index], 0xFF),
            None => (0, 0),
        }
    }

    fn write_at(&mut self, address: usize, value: u8) -> Mask {
        match self.index(address) {
            Some(index) => {
                self.data[index] = value;
                0xFF
            }
            None => 0,
        }
    }
}

impl DataDevice for Memory {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        self.read_at(address as usize)
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        self.write_at(address as usize, data)
    }
}

impl ProgramDevice for Memory {
    fn read(&mut self, address: u32) -> (u8, Mask) {
        self.read_at(address as usize)
    }

    fn write(&mut self, address: u32, data: u8) -> Mask {
        self.write_at(address as usize, data)
    }
}
