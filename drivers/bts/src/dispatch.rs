//! # Scenario Update Dispatch
//!
//! External collaborators (bandwidth monitor, media drivers) report events
//! as a kind plus a value. A [`ScenarioPolicy`] turns such an event into an
//! add or remove request. The mapping is platform specific and supplied by
//! the integrator; [`UnmappedPolicy`] maps nothing.

use crate::registry::Registry;
use crate::types::{BlockId, ScenarioId};

/// Source of a scenario update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UpdateKind {
    /// Aggregate media bandwidth changed (value in MB/s)
    Bandwidth,
    /// Number of active display layers changed
    DisplayLayers,
    /// Camera pipeline started (1) or stopped (0)
    Camera,
    /// Video codec workload class changed
    Mfc,
    /// Platform-defined event
    Custom(u16),
}

/// Add or remove request produced by a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioRequest {
    /// Scenario to add or remove
    pub scenario: ScenarioId,
    /// Block to start the ring traversal at; `None` uses the ring head
    pub start: Option<BlockId>,
    /// `true` adds, `false` removes
    pub on: bool,
}

impl ScenarioRequest {
    /// Add `scenario` across its ring
    pub const fn activate(scenario: ScenarioId) -> Self {
        Self {
            scenario,
            start: None,
            on: true,
        }
    }

    /// Remove `scenario` across its ring
    pub const fn deactivate(scenario: ScenarioId) -> Self {
        Self {
            scenario,
            start: None,
            on: false,
        }
    }
}

/// Maps update events onto scenario requests
pub trait ScenarioPolicy: Send {
    /// Resolve an event; `None` ignores it
    fn resolve(&self, kind: UpdateKind, value: u32, registry: &Registry)
        -> Option<ScenarioRequest>;
}

/// Policy that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmappedPolicy;

impl ScenarioPolicy for UnmappedPolicy {
    fn resolve(
        &self,
        kind: UpdateKind,
        value: u32,
        _registry: &Registry,
    ) -> Option<ScenarioRequest> {
        bts_dbg!("BTS: unmapped update {:?}={}", kind, value);
        None
    }
}
