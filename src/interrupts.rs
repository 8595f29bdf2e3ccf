//! # Interrupt Controller
//!
//! Peripherals register interrupt sources with the controller and receive an
//! [`Interrupt`] handle that they raise and clear. Each source owns three bits on
//! the data bus: a request flag (PIRx), an enable (PIEx) and a priority (IPRx).
//!
//! ## Priority modes
//!
//! RCON.IPEN selects how a raised request is gated:
//!
//! - **Priority mode** (IPEN = 1): the source must be enabled and the global enable
//!   of its level (INTCON.GIEH or INTCON.GIEL) must be set. The level's global
//!   enable is cleared and the matching vector (0x08 or 0x18) becomes pending.
//! - **Compatibility mode** (IPEN = 0): INTCON.GIE gates every source and
//!   INTCON.PEIE additionally gates peripheral sources. Every interrupt takes the
//!   high priority vector and clears GIE.
//!
//! GIEH/GIE and GIEL/PEIE share storage (INTCON bits 7 and 6), exactly as on the
//! silicon.
//!
//! Requests are level sensitive: a source that is still flagged when its enables
//! come back (through a bus write or RETFIE) fires again. A low priority vector
//! latched while the high priority handler runs is taken after its RETFIE.
//!
//! INTCON2 and INTCON3 (INTx edge select and priority) are not modelled; those
//! addresses are left to other devices.

use crate::bus::{DataDevice, Mask};
use crate::events::Signals;
use crate::{registers, Error, Result};
use std::cell::RefCell;
use std::rc::Rc;

const GIEH: u8 = 0x80;
const GIEL: u8 = 0x40;
const IPEN: u8 = 0x80;

/// (PIE, PIR, IPR) addresses of the five peripheral interrupt register groups.
///
/// Groups 4 and 5 sit at 0xF7A..0xF7F, clear of BAUDCON1 (0xFB8) and the
/// EUSART2 block (0xF70..0xF76).
const PERIPHERAL_GROUPS: [(u16, u16, u16); 5] = [
    (0xF9D, 0xF9E, 0xF9F),
    (0xFA0, 0xFA1, 0xFA2),
    (0xFA3, 0xFA4, 0xFA5),
    (0xF7A, 0xF7B, 0xF7C),
    (0xF7D, 0xF7E, 0xF7F),
];

/// A single bit in the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptFlag {
    pub register: u16,
    pub bit: u8,
}

impl InterruptFlag {
    pub fn new(register: u16, bit: u8) -> Self {
        Self { register, bit }
    }

    fn mask(&self) -> u8 {
        1 << self.bit
    }
}

/// Description of an interrupt source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptConfig {
    /// Name used in log output
    pub label: String,
    /// Peripheral sources are additionally gated by PEIE in compatibility mode
    pub peripheral: bool,
    pub request: InterruptFlag,
    pub enable: InterruptFlag,
    pub priority: InterruptFlag,
}

impl InterruptConfig {
    /// Builds a peripheral source living in PIE`group`/PIR`group`/IPR`group`.
    ///
    /// # Arguments
    ///
    /// * `label` - Name used in log output
    /// * `group` - Register group, 1 to 5 (PIR1..PIR5)
    /// * `bit` - Bit within each of the three registers
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPeripheralGroup`] for groups outside 1..=5.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use libpic18::InterruptConfig;
    ///
    /// let rc1 = InterruptConfig::peripheral("RC1", 1, 5).unwrap();
    /// assert_eq!(rc1.request.register, 0xF9E);
    /// assert_eq!(rc1.enable.register, 0xF9D);
    /// assert_eq!(rc1.priority.register, 0xF9F);
    /// ```
    pub fn peripheral(label: &str, group: u8, bit: u8) -> Result<Self> {
        let index = (group as usize)
            .checked_sub(1)
            .filter(|&i| i < PERIPHERAL_GROUPS.len())
            .ok_or(Error::InvalidPeripheralGroup(group))?;
        let (enable, request, priority) = PERIPHERAL_GROUPS[index];

        Ok(Self {
            label: label.to_string(),
            peripheral: true,
            request: InterruptFlag::new(request, bit),
            enable: InterruptFlag::new(enable, bit),
            priority: InterruptFlag::new(priority, bit),
        })
    }

    fn validate(&self) -> Result<()> {
        for flag in [self.request, self.enable, self.priority] {
            if flag.bit > 7 {
                return Err(Error::InvalidInterruptBit {
                    label: self.label.clone(),
                    bit: flag.bit,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Source {
    config: InterruptConfig,
    enable: bool,
    flag: bool,
    high_priority: bool,
}

impl Source {
    fn new(config: InterruptConfig) -> Self {
        Self {
            config,
            enable: false,
            flag: false,
            high_priority: true,
        }
    }

    fn reset(&mut self) {
        self.enable = false;
        self.flag = false;
        self.high_priority = true;
    }

    fn read(&self, address: u16) -> (u8, Mask) {
        let mut data = 0;
        let mut mask = 0;
        for (flag, value) in [
            (self.config.request, self.flag),
            (self.config.enable, self.enable),
            (self.config.priority, self.high_priority),
        ] {
            if flag.register == address {
                mask |= flag.mask();
                if value {
                    data |= flag.mask();
                }
            }
        }
        (data, mask)
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        let mut mask = 0;
        if self.config.request.register == address {
            self.flag = data & self.config.request.mask() != 0;
            mask |= self.config.request.mask();
        }
        if self.config.enable.register == address {
            self.enable = data & self.config.enable.mask() != 0;
            mask |= self.config.enable.mask();
        }
        if self.config.priority.register == address {
            self.high_priority = data & self.config.priority.mask() != 0;
            mask |= self.config.priority.mask();
        }
        mask
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    priority_mode: bool,
    high_enable: bool,
    low_enable: bool,
    goto_high: bool,
    goto_low: bool,
    sources: Vec<Source>,
    /// Sorted by address; each entry lists the sources with a bit in that register.
    register_map: Vec<(u16, Vec<usize>)>,
}

impl ControllerState {
    /// Tries to turn a raised request into a pending vector.
    ///
    /// Returns true if the core should wake up.
    fn evaluate(&mut self, index: usize) -> bool {
        let source = &self.sources[index];
        if !source.enable {
            log::debug!("interrupt {} masked by its enable bit", source.config.label);
            return false;
        }

        let level = if self.priority_mode {
            if source.high_priority {
                if !self.high_enable {
                    return false;
                }
                self.high_enable = false;
                self.goto_high = true;
                "high"
            } else {
                if !self.low_enable {
                    return false;
                }
                self.low_enable = false;
                self.goto_low = true;
                "low"
            }
        } else {
            if !self.high_enable {
                return false;
            }
            if source.config.peripheral && !self.low_enable {
                return false;
            }
            self.high_enable = false;
            self.goto_high = true;
            "high"
        };

        log::debug!("interrupt {} pending ({} priority)", source.config.label, level);
        true
    }

    /// Re-checks every flagged source after enables changed.
    fn evaluate_flagged(&mut self) -> bool {
        let mut wake = false;
        for index in 0..self.sources.len() {
            if self.sources[index].flag {
                wake |= self.evaluate(index);
            }
        }
        wake
    }

    fn sources_at(&self, address: u16) -> &[usize] {
        match self
            .register_map
            .binary_search_by_key(&address, |(register, _)| *register)
        {
            Ok(position) => &self.register_map[position].1,
            Err(_) => &[],
        }
    }

    fn map_register(&mut self, address: u16, index: usize) {
        match self
            .register_map
            .binary_search_by_key(&address, |(register, _)| *register)
        {
            Ok(position) => {
                let entry = &mut self.register_map[position].1;
                if !entry.contains(&index) {
                    entry.push(index);
                }
            }
            Err(position) => self.register_map.insert(position, (address, vec![index])),
        }
    }
}

struct Shared {
    state: RefCell<ControllerState>,
    signals: Rc<Signals>,
}

impl Shared {
    fn wake_if(&self, wake: bool) {
        if wake {
            self.signals.wake_up();
        }
    }
}

/// Handle a peripheral uses to drive its interrupt request line.
#[derive(Clone)]
pub struct Interrupt {
    shared: Rc<Shared>,
    index: usize,
}

impl Interrupt {
    /// Sets the request flag and, if the source and its level are enabled,
    /// makes the interrupt vector pending and wakes the core.
    pub fn raise(&self) {
        let wake = {
            let mut state = self.shared.state.borrow_mut();
            state.sources[self.index].flag = true;
            state.evaluate(self.index)
        };
        self.shared.wake_if(wake);
    }

    /// Clears the request flag.
    pub fn clear(&self) {
        self.shared.state.borrow_mut().sources[self.index].flag = false;
    }

    /// Current value of the request flag.
    pub fn is_requested(&self) -> bool {
        self.shared.state.borrow().sources[self.index].flag
    }

    /// Current value of the enable bit.
    pub fn is_enabled(&self) -> bool {
        self.shared.state.borrow().sources[self.index].enable
    }

    /// Label given at registration.
    pub fn label(&self) -> String {
        self.shared.state.borrow().sources[self.index].config.label.clone()
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Interrupt")
            .field("index", &self.index)
            .field("requested", &self.is_requested())
            .finish()
    }
}

/// Global interrupt state and the registry of sources.
pub struct InterruptController {
    shared: Rc<Shared>,
}

impl InterruptController {
    pub(crate) fn new(signals: Rc<Signals>) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(ControllerState::default()),
                signals,
            }),
        }
    }

    /// Registers a source and returns its handle.
    ///
    /// Sources start disabled, not requested, high priority.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInterruptBit`] if any of the three bits is above 7.
    pub fn register(&mut self, config: InterruptConfig) -> Result<Interrupt> {
        config.validate()?;

        let mut state = self.shared.state.borrow_mut();
        let index = state.sources.len();
        for register in [
            config.request.register,
            config.enable.register,
            config.priority.register,
        ] {
            state.map_register(register, index);
        }
        log::debug!("registered interrupt source {} as #{}", config.label, index);
        state.sources.push(Source::new(config));
        drop(state);

        Ok(Interrupt {
            shared: Rc::clone(&self.shared),
            index,
        })
    }

    /// RCON.IPEN.
    pub fn priority_mode(&self) -> bool {
        self.shared.state.borrow().priority_mode
    }

    /// INTCON.GIEH (GIE in compatibility mode).
    pub fn high_enable(&self) -> bool {
        self.shared.state.borrow().high_enable
    }

    /// INTCON.GIEL (PEIE in compatibility mode).
    pub fn low_enable(&self) -> bool {
        self.shared.state.borrow().low_enable
    }

    /// Returns true while a high priority vector is waiting to be taken.
    pub fn high_pending(&self) -> bool {
        self.shared.state.borrow().goto_high
    }

    /// Returns true while a low priority vector is waiting to be taken.
    pub fn low_pending(&self) -> bool {
        self.shared.state.borrow().goto_low
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.shared.state.borrow().sources.len()
    }

    /// Consumes a pending high priority vector.
    pub(crate) fn take_high(&mut self) -> bool {
        std::mem::take(&mut self.shared.state.borrow_mut().goto_high)
    }

    /// Consumes a pending low priority vector.
    pub(crate) fn take_low(&mut self) -> bool {
        std::mem::take(&mut self.shared.state.borrow_mut().goto_low)
    }

    /// Re-enables interrupts on RETFIE.
    ///
    /// The high level enable is always restored; returning from a low priority
    /// handler restores the low level enable as well.
    pub(crate) fn return_from_interrupt(&mut self, from_low: bool) {
        let wake = {
            let mut state = self.shared.state.borrow_mut();
            state.high_enable = true;
            if from_low {
                state.low_enable = true;
            }
            state.evaluate_flagged()
        };
        self.shared.wake_if(wake);
    }

    /// Reset values: globals and IPEN cleared, nothing pending, every source
    /// disabled, not requested and high priority.
    pub(crate) fn reset(&mut self) {
        let mut state = self.shared.state.borrow_mut();
        state.priority_mode = false;
        state.high_enable = false;
        state.low_enable = false;
        state.goto_high = false;
        state.goto_low = false;
        for source in &mut state.sources {
            source.reset();
        }
    }
}

impl DataDevice for InterruptController {
    fn read(&mut self, address: u16) -> (u8, Mask) {
        let state = self.shared.state.borrow();

        let (mut data, mut mask) = state
            .sources_at(address)
            .iter()
            .map(|&index| state.sources[index].read(address))
            .fold((0, 0), crate::bus::merge);

        match address {
            registers::INTCON => {
                if state.high_enable {
                    data |= GIEH;
                }
                if state.low_enable {
                    data |= GIEL;
                }
                mask |= GIEH | GIEL;
            }
            registers::RCON => {
                if state.priority_mode {
                    data |= IPEN;
                }
                mask |= IPEN;
            }
            _ => {}
        }

        (data, mask)
    }

    fn write(&mut self, address: u16, data: u8) -> Mask {
        let wake = {
            let mut guard = self.shared.state.borrow_mut();
            let state = &mut *guard;

            let mut mask = 0;
            for &index in state.sources_at(address).to_vec().iter() {
                mask |= state.sources[index].write(address, data);
            }

            match address {
                registers::INTCON => {
                    state.high_enable = data & GIEH != 0;
                    state.low_enable = data & GIEL != 0;
                    mask |= GIEH | GIEL;
                }
                registers::RCON => {
                    state.priority_mode = data & IPEN != 0;
                    mask |= IPEN;
                }
                _ => {}
            }

            if mask == 0 {
                return 0;
            }
            (mask, state.evaluate_flagged())
        };

        self.shared.wake_if(wake.1);
        wake.0
    }
}
