//! # Core Events
//!
//! The core reports a few conditions to its host instead of handling them itself:
//! illegal instruction words, entering sleep and waking up. Hosts implement
//! [`EventObserver`] and install it with `Cpu::set_observer`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Receives notifications from the core. All methods default to doing nothing.
///
/// # Examples
///
/// ```rust
/// use libpic18::{Cpu, CpuConfig, EventObserver, Memory};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct SleepCounter {
///     sleeps: usize,
/// }
///
/// impl EventObserver for SleepCounter {
///     fn sleep(&mut self) {
///         self.sleeps += 1;
///     }
/// }
///
/// let counter = Rc::new(RefCell::new(SleepCounter::default()));
///
/// let mut cpu = Cpu::new(CpuConfig::default());
/// cpu.attach_program(Box::new(Memory::from_words(0, &[0x0003]))); // SLEEP
/// cpu.set_observer(Box::new(Rc::clone(&counter)));
///
/// cpu.run_for_cycles(2);
/// assert_eq!(counter.borrow().sleeps, 1);
/// ```
pub trait EventObserver {
    /// An undecodable instruction word was executed at `address`.
    fn illegal_instruction(&mut self, _word: u16, _address: u32) {}

    /// SLEEP was executed.
    fn sleep(&mut self) {}

    /// An interrupt woke the core from sleep.
    fn wake_up(&mut self) {}
}

impl<O: EventObserver + ?Sized> EventObserver for Rc<RefCell<O>> {
    fn illegal_instruction(&mut self, word: u16, address: u32) {
        self.borrow_mut().illegal_instruction(word, address);
    }

    fn sleep(&mut self) {
        self.borrow_mut().sleep();
    }

    fn wake_up(&mut self) {
        self.borrow_mut().wake_up();
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl EventObserver for NullObserver {}

/// Observer slot and sleep latch shared by the CPU and the interrupt controller.
pub(crate) struct Signals {
    observer: RefCell<Box<dyn EventObserver>>,
    asleep: Cell<bool>,
}

impl Signals {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            observer: RefCell::new(Box::new(NullObserver)),
            asleep: Cell::new(false),
        })
    }

    pub(crate) fn set_observer(&self, observer: Box<dyn EventObserver>) {
        match self.observer.try_borrow_mut() {
            Ok(mut slot) => *slot = observer,
            Err(_) => log::warn!("observer replaced from inside a notification; ignored"),
        }
    }

    pub(crate) fn is_asleep(&self) -> bool {
        self.asleep.get()
    }

    pub(crate) fn illegal_instruction(&self, word: u16, address: u32) {
        self.notify(|observer| observer.illegal_instruction(word, address));
    }

    pub(crate) fn sleep(&self) {
        self.asleep.set(true);
        self.notify(|observer| observer.sleep());
    }

    /// Notifies only on the asleep to awake transition.
    pub(crate) fn wake_up(&self) {
        if self.asleep.replace(false) {
            self.notify(|observer| observer.wake_up());
        }
    }

    pub(crate) fn reset(&self) {
        self.asleep.set(false);
    }

    fn notify(&self, event: impl FnOnce(&mut dyn EventObserver)) {
        match self.observer.try_borrow_mut() {
            Ok(mut observer) => event(observer.as_mut()),
            Err(_) => log::warn!("reentrant core event dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<&'static str>,
    }

    impl EventObserver for Recorder {
        fn illegal_instruction(&mut self, _word: u16, _address: u32) {
            self.events.push("illegal");
        }

        fn sleep(&mut self) {
            self.events.push("sleep");
        }

        fn wake_up(&mut self) {
            self.events.push("wake");
        }
    }

    #[test]
    fn test_wake_up_is_edge_triggered() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let signals = Signals::new();
        signals.set_observer(Box::new(Rc::clone(&recorder)));

        signals.wake_up();
        signals.sleep();
        assert!(signals.is_asleep());
        signals.wake_up();
        signals.wake_up();
        assert!(!signals.is_asleep());

        assert_eq!(recorder.borrow().events, vec!["sleep", "wake"]);
    }

    #[test]
    fn test_illegal_instruction_forwarded() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let signals = Signals::new();
        signals.set_observer(Box::new(Rc::clone(&recorder)));

        signals.illegal_instruction(0x0001, 0x000100);
        assert_eq!(recorder.borrow().events, vec!["illegal"]);
    }
}
