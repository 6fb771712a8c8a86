//! # Error Handling
//!
//! Scenario operations never fail their caller. A failure on one block is
//! logged, counted in an [`OpReport`] and the traversal moves on to the next
//! block. Only table construction and name lookup return `Err`.
//!
//! | Error | Raised by | Effect |
//! |-------|-----------|--------|
//! | `UnknownName`, `RingNotBuilt` | `Bts::set_scenario_by_name` | returned to the caller |
//! | `InvariantViolation` | remove above top, remove of the floor | block skipped |
//! | `HardwareApply` | register adapter | list state kept, loop continues |
//! | `Clock` | clock gate/ungate | power flag kept, loop continues |
//! | `ClockDrift` | clock audit, pre-write check | warning only |

use core::fmt;

use crate::io::IoError;
use crate::types::{BlockId, ScenarioId};

// =============================================================================
// RESULT TYPE
// =============================================================================

/// BTS result type
pub type BtsResult<T> = Result<T, BtsError>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// BTS error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtsError {
    /// Block id outside the registry
    UnknownBlock(BlockId),
    /// Scenario id outside the registry
    UnknownScenario(ScenarioId),
    /// No scenario carries the given name
    UnknownName,
    /// No block belongs to the named power domain
    UnknownDomain,
    /// Scenario has no ring (empty mask, or never built)
    RingNotBuilt(ScenarioId),
    /// Active list is not in the state the operation expects
    InvariantViolation {
        /// Block whose list is inconsistent
        block: BlockId,
        /// Scenario being added or removed
        scenario: ScenarioId,
        /// Recorded top of the block's list
        top: ScenarioId,
    },
    /// Register adapter rejected a configuration
    HardwareApply {
        /// Target block
        block: BlockId,
        /// Scenario whose configuration was applied
        scenario: ScenarioId,
        /// Adapter error
        cause: IoError,
    },
    /// Clock gate or ungate failed
    Clock {
        /// Target block
        block: BlockId,
        /// Adapter error
        cause: IoError,
    },
    /// Clock state differs from the block's power flag
    ClockDrift {
        /// Target block
        block: BlockId,
        /// Power flag recorded by the engine
        powered_on: bool,
    },
    /// More blocks than a block mask can address
    TooManyBlocks(usize),
    /// Tables need at least the Disable and Default scenarios
    TooFewScenarios(usize),
    /// Block table length differs from the scenario count
    TableMismatch {
        /// Offending block
        block: BlockId,
        /// Scenario count
        expected: usize,
        /// Entries in the block's table
        found: usize,
    },
    /// Scenario table is not indexed by id starting at Disable
    ScenarioOrder(ScenarioId),
}

impl fmt::Display for BtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBlock(id) => write!(f, "unknown block {}", id),
            Self::UnknownScenario(id) => write!(f, "unknown scenario {}", id),
            Self::UnknownName => write!(f, "unknown scenario name"),
            Self::UnknownDomain => write!(f, "no block in power domain"),
            Self::RingNotBuilt(id) => write!(f, "scenario {} has no ring", id),
            Self::InvariantViolation {
                block,
                scenario,
                top,
            } => write!(
                f,
                "block {}: scenario {} inconsistent with top {}",
                block, scenario, top
            ),
            Self::HardwareApply {
                block,
                scenario,
                cause,
            } => write!(f, "block {}: applying {} failed: {}", block, scenario, cause),
            Self::Clock { block, cause } => {
                write!(f, "block {}: clock gate failed: {}", block, cause)
            },
            Self::ClockDrift { block, powered_on } => write!(
                f,
                "block {}: clock {} while powered_on={}",
                block,
                if *powered_on { "gated" } else { "running" },
                powered_on
            ),
            Self::TooManyBlocks(n) => {
                write!(f, "{} blocks exceed mask capacity {}", n, crate::BlockMask::CAPACITY)
            },
            Self::TooFewScenarios(n) => write!(f, "{} scenarios, need at least 2", n),
            Self::TableMismatch {
                block,
                expected,
                found,
            } => write!(
                f,
                "block {}: {} table entries, expected {}",
                block, found, expected
            ),
            Self::ScenarioOrder(id) => write!(f, "scenario {} out of order", id),
        }
    }
}

// =============================================================================
// OPERATION REPORT
// =============================================================================

/// Outcome counters of one scenario operation
///
/// Errors are absorbed per block; the report lets callers and tests see
/// what happened without the operation ever failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpReport {
    /// Blocks the traversal reached
    pub visited: usize,
    /// Blocks whose active list changed
    pub updated: usize,
    /// Register writes issued (configuration or disable)
    pub hw_writes: usize,
    /// Invariant violations and clock drift
    pub warnings: usize,
    /// Adapter failures
    pub errors: usize,
    /// Most recent absorbed error
    pub last_error: Option<BtsError>,
}

impl OpReport {
    /// Empty report
    pub const fn new() -> Self {
        Self {
            visited: 0,
            updated: 0,
            hw_writes: 0,
            warnings: 0,
            errors: 0,
            last_error: None,
        }
    }

    /// Record a non-fatal warning
    pub(crate) fn warn(&mut self, err: BtsError) {
        log::warn!("BTS: {}", err);
        self.warnings += 1;
        self.last_error = Some(err);
    }

    /// Record an adapter failure
    pub(crate) fn fail(&mut self, err: BtsError) {
        log::error!("BTS: {}", err);
        self.errors += 1;
        self.last_error = Some(err);
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: OpReport) {
        self.visited += other.visited;
        self.updated += other.updated;
        self.hw_writes += other.hw_writes;
        self.warnings += other.warnings;
        self.errors += other.errors;
        if other.last_error.is_some() {
            self.last_error = other.last_error;
        }
    }

    /// No warnings and no errors?
    pub fn is_clean(&self) -> bool {
        self.warnings == 0 && self.errors == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge() {
        let mut a = OpReport::new();
        a.visited = 2;
        a.hw_writes = 1;

        let mut b = OpReport::new();
        b.visited = 1;
        b.fail(BtsError::HardwareApply {
            block: BlockId(3),
            scenario: ScenarioId::DEBUG,
            cause: IoError::Timeout,
        });

        a.merge(b);
        assert_eq!(a.visited, 3);
        assert_eq!(a.hw_writes, 1);
        assert_eq!(a.errors, 1);
        assert!(!a.is_clean());
        assert!(matches!(a.last_error, Some(BtsError::HardwareApply { .. })));
    }

    #[test]
    fn test_clean_report() {
        assert!(OpReport::new().is_clean());
        let mut r = OpReport::new();
        r.warn(BtsError::UnknownDomain);
        assert_eq!(r.warnings, 1);
        assert!(!r.is_clean());
    }
}
