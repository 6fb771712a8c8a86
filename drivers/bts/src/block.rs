//! # Traffic Shaper Blocks
//!
//! A [`Block`] owns one [`ScenarioSlot`] per scenario. Active slots are
//! chained into a list ordered by scenario id:
//!
//! ```text
//!   floor (Disable)          middle               top
//!   ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//!   │ prev: None  │◀─────│ prev: S0    │◀─────│ prev: S1    │
//!   │ next: S1    │─────▶│ next: S2    │─────▶│ next: None  │
//!   └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! The floor is linked for the whole lifetime of the block. A slot with no
//! link is not active. Only the top's configuration is ever programmed.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::{BtsError, BtsResult};
use crate::types::{BlockId, QosConfig, ScenarioId};

/// Lowest scenario id, permanently linked at the bottom of every list
pub const FLOOR: ScenarioId = ScenarioId::DISABLE;

// =============================================================================
// SLOT
// =============================================================================

/// Neighbours of an active slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLink {
    /// Next lower active scenario; `None` only on the floor
    pub prev: Option<ScenarioId>,
    /// Next higher active scenario; `None` on the top
    pub next: Option<ScenarioId>,
}

/// Per-scenario state of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSlot {
    /// Configuration applied when this scenario is on top
    pub config: QosConfig,
    link: Option<SlotLink>,
}

impl ScenarioSlot {
    fn new(config: QosConfig) -> Self {
        Self { config, link: None }
    }

    /// Position in the active list, if active
    pub fn link(&self) -> Option<SlotLink> {
        self.link
    }

    /// Is the scenario active on this block?
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }
}

/// Result of linking a scenario into a block's list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Already active, nothing changed
    AlreadyLinked,
    /// Became the new top
    NewTop,
    /// Spliced below the top
    Spliced,
}

/// Result of unlinking a scenario from a block's list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlinkOutcome {
    /// Was not active, nothing changed
    NotLinked,
    /// Was the top; the given scenario is the new top
    TopRemoved(ScenarioId),
    /// Removed from below the top
    Spliced,
}

// =============================================================================
// BLOCK
// =============================================================================

/// One hardware traffic shaper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) name: &'static str,
    pub(crate) domain: &'static str,
    pub(crate) enabled: bool,
    pub(crate) powered_on: bool,
    pub(crate) current: ScenarioId,
    pub(crate) top: ScenarioId,
    pub(crate) slots: Vec<ScenarioSlot>,
}

impl Block {
    /// Create a powered-off block whose list holds only the floor
    pub(crate) fn new(
        id: BlockId,
        name: &'static str,
        domain: &'static str,
        enabled: bool,
        table: &[QosConfig],
    ) -> Self {
        let mut slots: Vec<ScenarioSlot> = table.iter().copied().map(ScenarioSlot::new).collect();
        if let Some(floor) = slots.first_mut() {
            floor.link = Some(SlotLink {
                prev: None,
                next: None,
            });
        }

        Self {
            id,
            name,
            domain,
            enabled,
            powered_on: false,
            current: FLOOR,
            top: FLOOR,
            slots,
        }
    }

    /// Block id
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Diagnostic name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Power domain name
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Does the block take part in scenario scheduling?
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Is the block's clock domain active?
    pub fn is_powered_on(&self) -> bool {
        self.powered_on
    }

    /// Scenario last programmed into hardware
    pub fn current_scenario(&self) -> ScenarioId {
        self.current
    }

    /// Highest active scenario
    pub fn top_scenario(&self) -> ScenarioId {
        self.top
    }

    /// Slot for `scenario`
    pub fn slot(&self, scenario: ScenarioId) -> Option<&ScenarioSlot> {
        self.slots.get(scenario.index())
    }

    /// Is `scenario` active on this block?
    pub fn is_active(&self, scenario: ScenarioId) -> bool {
        self.slot(scenario).is_some_and(ScenarioSlot::is_linked)
    }

    /// Configuration of the current top
    pub fn top_config(&self) -> Option<&QosConfig> {
        self.slot(self.top).map(|s| &s.config)
    }

    /// Active scenarios from the top down to the floor
    pub fn active_scenarios(&self) -> Vec<ScenarioId> {
        let mut out = Vec::new();
        let mut cursor = Some(self.top);
        while let Some(id) = cursor {
            // A well-formed list never revisits an id; stop on corruption.
            if out.len() > self.slots.len() {
                break;
            }
            out.push(id);
            cursor = self.slot(id).and_then(ScenarioSlot::link).and_then(|l| l.prev);
        }
        out
    }

    fn violation(&self, scenario: ScenarioId) -> BtsError {
        BtsError::InvariantViolation {
            block: self.id,
            scenario,
            top: self.top,
        }
    }

    fn link_of(&self, scenario: ScenarioId, target: ScenarioId) -> BtsResult<SlotLink> {
        self.slot(target)
            .and_then(ScenarioSlot::link)
            .ok_or_else(|| self.violation(scenario))
    }

    fn link_mut(&mut self, scenario: ScenarioId, target: ScenarioId) -> BtsResult<&mut SlotLink> {
        let err = self.violation(scenario);
        self.slots
            .get_mut(target.index())
            .and_then(|s| s.link.as_mut())
            .ok_or(err)
    }

    // =========================================================================
    // ACTIVE LIST
    // =========================================================================

    /// Insert `scenario` into the active list
    ///
    /// A scenario above the current top becomes the new top. A lower one is
    /// spliced between its nearest active neighbours.
    pub(crate) fn link(&mut self, scenario: ScenarioId) -> BtsResult<LinkOutcome> {
        let slot = self
            .slot(scenario)
            .ok_or(BtsError::UnknownScenario(scenario))?;
        if slot.is_linked() {
            return Ok(LinkOutcome::AlreadyLinked);
        }

        let top = self.top;
        if scenario > top {
            self.link_mut(scenario, top)?.next = Some(scenario);
            self.slots[scenario.index()].link = Some(SlotLink {
                prev: Some(top),
                next: None,
            });
            self.top = scenario;
            return Ok(LinkOutcome::NewTop);
        }

        // Walk down from the top until the first active scenario below.
        let mut above = top;
        let below = loop {
            let prev = self
                .link_of(scenario, above)?
                .prev
                .ok_or_else(|| self.violation(scenario))?;
            if prev < scenario {
                break prev;
            }
            above = prev;
        };

        self.link_mut(scenario, above)?.prev = Some(scenario);
        self.link_mut(scenario, below)?.next = Some(scenario);
        self.slots[scenario.index()].link = Some(SlotLink {
            prev: Some(below),
            next: Some(above),
        });
        Ok(LinkOutcome::Spliced)
    }

    /// Remove `scenario` from the active list
    pub(crate) fn unlink(&mut self, scenario: ScenarioId) -> BtsResult<UnlinkOutcome> {
        let link = match self.slot(scenario) {
            Some(slot) => match slot.link {
                Some(link) => link,
                None => return Ok(UnlinkOutcome::NotLinked),
            },
            None => return Err(BtsError::UnknownScenario(scenario)),
        };

        if scenario == FLOOR || scenario > self.top {
            return Err(self.violation(scenario));
        }

        let prev = link.prev.ok_or_else(|| self.violation(scenario))?;
        let outcome = if scenario == self.top {
            self.link_mut(scenario, prev)?.next = None;
            self.top = prev;
            UnlinkOutcome::TopRemoved(prev)
        } else {
            let next = link.next.ok_or_else(|| self.violation(scenario))?;
            self.link_mut(scenario, next)?.prev = Some(prev);
            self.link_mut(scenario, prev)?.next = Some(next);
            UnlinkOutcome::Spliced
        };

        self.slots[scenario.index()].link = None;
        Ok(outcome)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const S1: ScenarioId = ScenarioId(1);
    const S2: ScenarioId = ScenarioId(2);
    const S3: ScenarioId = ScenarioId(3);

    fn block() -> Block {
        let table = [
            QosConfig::disable(),
            QosConfig::trex(0x4),
            QosConfig::trex(0x8),
            QosConfig::trex(0xC),
        ];
        Block::new(BlockId(0), "blk0", "trex", true, &table)
    }

    #[test]
    fn test_new_block_holds_floor() {
        let b = block();
        assert_eq!(b.top_scenario(), FLOOR);
        assert_eq!(b.current_scenario(), FLOOR);
        assert!(b.is_active(FLOOR));
        assert!(!b.is_active(S1));
        assert_eq!(b.active_scenarios(), vec![FLOOR]);
    }

    #[test]
    fn test_link_new_top() {
        let mut b = block();
        assert_eq!(b.link(S1).unwrap(), LinkOutcome::NewTop);
        assert_eq!(b.link(S3).unwrap(), LinkOutcome::NewTop);
        assert_eq!(b.top_scenario(), S3);
        assert_eq!(b.active_scenarios(), vec![S3, S1, FLOOR]);
    }

    #[test]
    fn test_link_splice_below_top() {
        let mut b = block();
        b.link(S1).unwrap();
        b.link(S3).unwrap();
        assert_eq!(b.link(S2).unwrap(), LinkOutcome::Spliced);
        assert_eq!(b.top_scenario(), S3);
        assert_eq!(b.active_scenarios(), vec![S3, S2, S1, FLOOR]);

        let mid = b.slot(S2).unwrap().link().unwrap();
        assert_eq!(mid.prev, Some(S1));
        assert_eq!(mid.next, Some(S3));
    }

    #[test]
    fn test_link_twice_is_noop() {
        let mut b = block();
        b.link(S2).unwrap();
        let before = b.clone();
        assert_eq!(b.link(S2).unwrap(), LinkOutcome::AlreadyLinked);
        assert_eq!(b, before);
    }

    #[test]
    fn test_unlink_top_and_middle() {
        let mut b = block();
        b.link(S1).unwrap();
        b.link(S2).unwrap();
        b.link(S3).unwrap();

        assert_eq!(b.unlink(S2).unwrap(), UnlinkOutcome::Spliced);
        assert_eq!(b.active_scenarios(), vec![S3, S1, FLOOR]);

        assert_eq!(b.unlink(S3).unwrap(), UnlinkOutcome::TopRemoved(S1));
        assert_eq!(b.top_scenario(), S1);
        assert_eq!(b.slot(S1).unwrap().link().unwrap().next, None);
    }

    #[test]
    fn test_unlink_not_linked() {
        let mut b = block();
        let before = b.clone();
        assert_eq!(b.unlink(S2).unwrap(), UnlinkOutcome::NotLinked);
        assert_eq!(b, before);
    }

    #[test]
    fn test_unlink_floor_refused() {
        let mut b = block();
        assert!(matches!(
            b.unlink(FLOOR),
            Err(BtsError::InvariantViolation { .. })
        ));
        assert!(b.is_active(FLOOR));
    }

    #[test]
    fn test_unknown_scenario() {
        let mut b = block();
        assert_eq!(
            b.link(ScenarioId(9)),
            Err(BtsError::UnknownScenario(ScenarioId(9)))
        );
    }
}
