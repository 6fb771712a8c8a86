//! # Register I/O Adapter
//!
//! The engine never touches registers itself. Everything that reaches the
//! hardware goes through [`BtsIo`], implemented by the platform layer (MMIO
//! writes plus clock gating) or by a recording double in tests.
//!
//! All calls are synchronous and bounded. An implementation may busy-wait on
//! a ready bit but must not block or sleep: the engine calls it with the
//! registry lock held.

use core::fmt;

use crate::types::{BlockId, QosConfig};

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Failure reported by the register adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// Hardware did not acknowledge in time
    Timeout,
    /// Hardware reported a fault
    Fault,
    /// Block has no register window mapped
    NotMapped,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::Timeout => write!(f, "hardware timeout"),
            IoError::Fault => write!(f, "hardware fault"),
            IoError::NotMapped => write!(f, "register window not mapped"),
        }
    }
}

/// Adapter result type
pub type IoResult = Result<(), IoError>;

// =============================================================================
// ADAPTER TRAIT
// =============================================================================

/// Hardware capability the scenario engine drives
pub trait BtsIo {
    /// Program `block` with one scenario's fixed configuration
    ///
    /// Never called with [`QosFunction::TrexDisable`] or
    /// [`QosFunction::Nop`]; those go through [`BtsIo::disable`] or are
    /// skipped.
    ///
    /// [`QosFunction::TrexDisable`]: crate::types::QosFunction::TrexDisable
    /// [`QosFunction::Nop`]: crate::types::QosFunction::Nop
    fn apply_config(&mut self, block: BlockId, config: &QosConfig) -> IoResult;

    /// Put `block` into its disabled/bypass state
    fn disable(&mut self, block: BlockId) -> IoResult;

    /// Ungate the block's clock
    fn clock_enable(&mut self, block: BlockId) -> IoResult;

    /// Gate the block's clock
    fn clock_disable(&mut self, block: BlockId) -> IoResult;

    /// Is the block's clock currently running?
    fn is_clock_enabled(&self, block: BlockId) -> bool;
}
