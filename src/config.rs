//! Core configuration bits.
//!
//! These mirror the device configuration words that change core behaviour
//! (STVREN and XINST). Hosts usually build one in code, but the type is serde
//! friendly so it can live next to the rest of a harness configuration.

use serde::{Deserialize, Serialize};

/// Behavioural switches of the core. Everything defaults to off.
///
/// # Examples
///
/// ```rust
/// use libpic18::CpuConfig;
///
/// let config = CpuConfig {
///     extended_instruction_set: true,
///     ..CpuConfig::default()
/// };
/// assert!(!config.reset_on_stack_overflow);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// MCLR reset when a push fills or overruns the stack (STVREN)
    pub reset_on_stack_overflow: bool,
    /// MCLR reset when popping an empty stack (STVREN)
    pub reset_on_stack_underflow: bool,
    /// Enable the extended instruction set and indexed literal offset addressing (XINST)
    pub extended_instruction_set: bool,
}
