//! # BTS Controller
//!
//! [`Bts`] is the public handle. It owns the registry, the register adapter
//! and the scenario policy behind one lock, so every entry point runs to
//! completion before the next one starts.
//!
//! ```text
//!   initialize(domain, on) ────────┐
//!   notify_scenario(kind, value) ──┤     ┌──────────────────────────┐
//!   activate / deactivate ─────────┼────▶│ spin::Mutex<State>       │
//!   set_scenario_by_name ──────────┘     │  registry · io · policy  │
//!                                        └──────────────────────────┘
//! ```

extern crate alloc;
use alloc::boxed::Box;
use core::fmt;

use spin::Mutex;

use crate::config::BtsConfig;
use crate::dispatch::{ScenarioPolicy, UnmappedPolicy, UpdateKind};
use crate::error::{BtsError, BtsResult, OpReport};
use crate::io::BtsIo;
use crate::registry::Registry;
use crate::status::StatusReport;
use crate::types::{BlockId, ScenarioId};

struct State<I> {
    registry: Registry,
    io: I,
    policy: Box<dyn ScenarioPolicy>,
    config: BtsConfig,
}

/// BTS instance
pub struct Bts<I: BtsIo> {
    state: Mutex<State<I>>,
}

impl<I: BtsIo> Bts<I> {
    /// Create an instance with default settings and no event mapping
    pub fn new(registry: Registry, io: I) -> Self {
        Self::with_config(registry, io, BtsConfig::default())
    }

    /// Create an instance with explicit settings
    pub fn with_config(registry: Registry, io: I, config: BtsConfig) -> Self {
        log::info!(
            "BTS: {} blocks, {} scenarios",
            registry.blocks().len(),
            registry.scenarios().len()
        );
        Self {
            state: Mutex::new(State {
                registry,
                io,
                policy: Box::new(UnmappedPolicy),
                config,
            }),
        }
    }

    /// Replace the event-to-scenario policy
    pub fn with_policy(self, policy: impl ScenarioPolicy + 'static) -> Self {
        self.state.lock().policy = Box::new(policy);
        self
    }

    // =========================================================================
    // ENTRY POINTS
    // =========================================================================

    /// Bring power domain `domain` up or down
    pub fn initialize(&self, domain: &str, on: bool) -> OpReport {
        let mut guard = self.state.lock();
        let State {
            registry,
            io,
            config,
            ..
        } = &mut *guard;
        registry.set_domain_power(io, config, domain, on)
    }

    /// Route an external event through the policy
    ///
    /// Events the policy does not map are ignored.
    pub fn notify_scenario(&self, kind: UpdateKind, value: u32) -> OpReport {
        let mut guard = self.state.lock();
        let State { registry, policy, .. } = &*guard;

        let Some(request) = policy.resolve(kind, value, registry) else {
            return OpReport::new();
        };
        guard.toggle(request.scenario, request.start, request.on)
    }

    /// Add `scenario` starting at `start`
    pub fn add_scenario(&self, scenario: ScenarioId, start: Option<BlockId>) -> OpReport {
        let mut guard = self.state.lock();
        let State {
            registry,
            io,
            config,
            ..
        } = &mut *guard;
        registry.add_scenario(io, config, scenario, start)
    }

    /// Remove `scenario` starting at `start`
    pub fn remove_scenario(&self, scenario: ScenarioId, start: Option<BlockId>) -> OpReport {
        let mut guard = self.state.lock();
        let State {
            registry,
            io,
            config,
            ..
        } = &mut *guard;
        registry.remove_scenario(io, config, scenario, start)
    }

    /// Add `scenario` across its whole ring
    pub fn activate(&self, scenario: ScenarioId) -> OpReport {
        self.state.lock().toggle(scenario, None, true)
    }

    /// Remove `scenario` across its whole ring
    pub fn deactivate(&self, scenario: ScenarioId) -> OpReport {
        self.state.lock().toggle(scenario, None, false)
    }

    /// Add or remove a scenario by its diagnostic name
    ///
    /// Unlike the id-based calls, an unknown name or a scenario without a
    /// ring is returned as an error.
    pub fn set_scenario_by_name(&self, name: &str, on: bool) -> BtsResult<OpReport> {
        let mut state = self.state.lock();
        let scenario = state
            .registry
            .scenario_by_name(name)
            .ok_or(BtsError::UnknownName)?;
        let id = scenario.id();
        let head = scenario.head().ok_or(BtsError::RingNotBuilt(id))?;

        Ok(state.toggle(id, Some(head), on))
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Snapshot of every block
    pub fn status(&self) -> StatusReport {
        StatusReport::capture(&self.state.lock().registry)
    }

    /// Compare clock state with the recorded power flags
    pub fn audit_clocks(&self) -> OpReport {
        let state = self.state.lock();
        state.registry.audit_clocks(&state.io)
    }

    /// Run `f` with the registry
    pub fn with_registry<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.state.lock().registry)
    }

    /// Run `f` with the register adapter
    pub fn with_io<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        f(&mut self.state.lock().io)
    }

    /// Active settings
    pub fn config(&self) -> BtsConfig {
        self.state.lock().config
    }
}

impl<I: BtsIo> State<I> {
    /// Add or remove `scenario` from `start`, or from its ring head
    fn toggle(&mut self, scenario: ScenarioId, start: Option<BlockId>, on: bool) -> OpReport {
        let start = start.or_else(|| self.registry.ring_head(scenario));
        if on {
            self.registry
                .add_scenario(&mut self.io, &self.config, scenario, start)
        } else {
            self.registry
                .remove_scenario(&mut self.io, &self.config, scenario, start)
        }
    }
}

impl<I: BtsIo> fmt::Debug for Bts<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Bts")
            .field("blocks", &state.registry.blocks().len())
            .field("scenarios", &state.registry.scenarios().len())
            .field("config", &state.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
