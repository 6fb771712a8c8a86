//! # Scenario Engine
//!
//! Adds and removes scenarios on the blocks of a ring and reprograms a
//! block whenever its top scenario changes while it is powered.
//!
//! ```text
//!   add_scenario(S, start)                 remove_scenario(S, start)
//!          │                                        │
//!          ▼                                        ▼
//!   ┌─────────────┐   next in ring          ┌─────────────┐
//!   │ block.link  │◀──────────────┐         │ block.unlink│◀─────┐
//!   └──────┬──────┘               │         └──────┬──────┘      │
//!          │ NewTop && powered    │                │ TopRemoved  │
//!          ▼                      │                ▼ && powered  │
//!   ┌─────────────┐               │         ┌─────────────┐      │
//!   │ apply(top)  │───────────────┘         │ apply(top)  │──────┘
//!   └─────────────┘  until back at start    └─────────────┘
//! ```
//!
//! Every function here runs with the registry lock held by the caller
//! ([`crate::Bts`]). Nothing fails the caller: per-block problems are logged
//! and counted in the returned [`OpReport`].

extern crate alloc;
use alloc::vec::Vec;

use crate::block::{LinkOutcome, UnlinkOutcome};
use crate::config::BtsConfig;
use crate::error::{BtsError, OpReport};
use crate::io::BtsIo;
use crate::registry::Registry;
use crate::types::{BlockId, QosFunction, ScenarioId};

impl Registry {
    /// Blocks a traversal of `scenario` from `start` visits
    fn traversal(&self, scenario: ScenarioId, start: BlockId) -> Option<Vec<BlockId>> {
        self.scenario(scenario).map(|s| s.walk(start).collect())
    }

    /// Scenario a block runs when its power domain comes up
    ///
    /// Every block uses Default; no per-block policy exists.
    pub fn domain_scenario(&self, _block: BlockId) -> ScenarioId {
        ScenarioId::DEFAULT
    }

    // =========================================================================
    // ADD
    // =========================================================================

    /// Activate `scenario` on every block of its ring, starting at `start`
    ///
    /// A missing start (scenario without a ring) is a no-op. A block that
    /// already runs the scenario is left alone. A new top is programmed
    /// immediately when the block is powered; a scenario spliced below the
    /// top never touches the hardware.
    pub fn add_scenario<I: BtsIo + ?Sized>(
        &mut self,
        io: &mut I,
        config: &BtsConfig,
        scenario: ScenarioId,
        start: Option<BlockId>,
    ) -> OpReport {
        let mut report = OpReport::new();
        let Some(start) = start else {
            bts_dbg!("BTS: scenario {} has no ring, add skipped", scenario);
            return report;
        };
        let Some(walk) = self.traversal(scenario, start) else {
            report.warn(BtsError::UnknownScenario(scenario));
            return report;
        };

        bts_dbg!("BTS: scenario {} on from block {}", scenario, start);

        for id in walk {
            report.visited += 1;
            let Some(block) = self.block_mut(id) else {
                report.warn(BtsError::UnknownBlock(id));
                continue;
            };
            if !block.enabled {
                continue;
            }

            match block.link(scenario) {
                Ok(LinkOutcome::NewTop) => {
                    report.updated += 1;
                    if block.powered_on {
                        self.apply(io, config, id, scenario, &mut report);
                    }
                },
                Ok(LinkOutcome::Spliced) => report.updated += 1,
                Ok(LinkOutcome::AlreadyLinked) => {},
                Err(err) => report.warn(err),
            }
        }

        report
    }

    // =========================================================================
    // REMOVE
    // =========================================================================

    /// Deactivate `scenario` on every block of its ring, starting at `start`
    ///
    /// Removing the top programs the next lower active scenario when the
    /// block is powered. Removing a lower entry only relinks the list. A
    /// scenario above the recorded top is reported and that block skipped.
    pub fn remove_scenario<I: BtsIo + ?Sized>(
        &mut self,
        io: &mut I,
        config: &BtsConfig,
        scenario: ScenarioId,
        start: Option<BlockId>,
    ) -> OpReport {
        let mut report = OpReport::new();
        let Some(start) = start else {
            bts_dbg!("BTS: scenario {} has no ring, remove skipped", scenario);
            return report;
        };
        let Some(walk) = self.traversal(scenario, start) else {
            report.warn(BtsError::UnknownScenario(scenario));
            return report;
        };

        bts_dbg!("BTS: scenario {} off from block {}", scenario, start);

        for id in walk {
            report.visited += 1;
            let Some(block) = self.block_mut(id) else {
                report.warn(BtsError::UnknownBlock(id));
                continue;
            };
            if !block.enabled {
                continue;
            }

            match block.unlink(scenario) {
                Ok(UnlinkOutcome::TopRemoved(new_top)) => {
                    report.updated += 1;
                    if block.powered_on {
                        self.apply(io, config, id, new_top, &mut report);
                    }
                },
                Ok(UnlinkOutcome::Spliced) => report.updated += 1,
                Ok(UnlinkOutcome::NotLinked) => {},
                Err(err) => report.warn(err),
            }
        }

        report
    }

    // =========================================================================
    // APPLY
    // =========================================================================

    /// Program `scenario`'s configuration into `block`
    ///
    /// `current_scenario` follows the request even when the adapter fails;
    /// the list reflects what should be active, not what the hardware
    /// acknowledged.
    pub(crate) fn apply<I: BtsIo + ?Sized>(
        &mut self,
        io: &mut I,
        config: &BtsConfig,
        id: BlockId,
        scenario: ScenarioId,
        report: &mut OpReport,
    ) {
        let Some(block) = self.block_mut(id) else {
            report.warn(BtsError::UnknownBlock(id));
            return;
        };
        let Some(qos) = block.slot(scenario).map(|s| s.config) else {
            report.warn(BtsError::UnknownScenario(scenario));
            return;
        };

        bts_dbg!(
            "BTS: {} on:{} scen [{}]->[{}] ({})",
            block.name,
            block.powered_on,
            block.current,
            scenario,
            qos.function.name()
        );

        if config.verify_clocks && qos.writes_hardware() && !io.is_clock_enabled(id) {
            report.warn(BtsError::ClockDrift {
                block: id,
                powered_on: block.powered_on,
            });
        }

        let result = match qos.function {
            QosFunction::Nop => None,
            QosFunction::TrexDisable => Some(io.disable(id)),
            _ => Some(io.apply_config(id, &qos)),
        };

        if let Some(result) = result {
            report.hw_writes += 1;
            if let Err(cause) = result {
                report.fail(BtsError::HardwareApply {
                    block: id,
                    scenario,
                    cause,
                });
            }
        }

        block.current = scenario;
    }

    // =========================================================================
    // POWER DOMAIN
    // =========================================================================

    /// Bring every block of power domain `domain` up or down
    ///
    /// Administratively disabled blocks only record the new power state.
    /// Power-on adds the block's domain scenario, ungates the clock if it was
    /// off and programs the top. Power-off gates the clock first and then
    /// removes the domain scenario, so no register write happens.
    pub fn set_domain_power<I: BtsIo + ?Sized>(
        &mut self,
        io: &mut I,
        config: &BtsConfig,
        domain: &str,
        on: bool,
    ) -> OpReport {
        let mut report = OpReport::new();
        let members = self.blocks_in_domain(domain);
        if members.is_empty() {
            log::debug!("BTS: no block in domain {}", domain);
            report.last_error = Some(BtsError::UnknownDomain);
            return report;
        }

        for id in members {
            let scenario = self.domain_scenario(id);
            let Some(block) = self.block_mut(id) else {
                continue;
            };

            log::debug!(
                "BTS: {} power {} -> {}",
                block.name,
                block.powered_on,
                on
            );

            if !block.enabled {
                block.powered_on = on;
                continue;
            }

            let was_on = block.powered_on;
            if on {
                report.merge(self.add_scenario(io, config, scenario, Some(id)));

                if !was_on {
                    if let Some(block) = self.block_mut(id) {
                        block.powered_on = true;
                    }
                    if let Err(cause) = io.clock_enable(id) {
                        report.fail(BtsError::Clock { block: id, cause });
                    }
                }

                let top = self
                    .block(id)
                    .map(|b| b.top)
                    .unwrap_or(ScenarioId::DISABLE);
                self.apply(io, config, id, top, &mut report);
            } else {
                if was_on {
                    block.powered_on = false;
                    if let Err(cause) = io.clock_disable(id) {
                        report.fail(BtsError::Clock { block: id, cause });
                    }
                }

                report.merge(self.remove_scenario(io, config, scenario, Some(id)));
            }
        }

        report
    }

    // =========================================================================
    // DIAGNOSTICS
    // =========================================================================

    /// Compare each enabled block's clock with its recorded power state
    pub fn audit_clocks<I: BtsIo + ?Sized>(&self, io: &I) -> OpReport {
        let mut report = OpReport::new();
        for block in self.blocks.iter().filter(|b| b.enabled) {
            report.visited += 1;
            if io.is_clock_enabled(block.id) != block.powered_on {
                report.warn(BtsError::ClockDrift {
                    block: block.id,
                    powered_on: block.powered_on,
                });
            }
        }
        report
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::FLOOR;
    use crate::mock::{IoCall, RecordingIo};
    use crate::registry::{BlockDesc, ScenarioDesc};
    use crate::types::{BlockMask, QosConfig};
    use alloc::vec;

    const S0: ScenarioId = ScenarioId(0);
    const S1: ScenarioId = ScenarioId(1);
    const S2: ScenarioId = ScenarioId(2);
    const S3: ScenarioId = ScenarioId(3);

    const CFG: BtsConfig = BtsConfig::new();

    /// Four scenarios; S2 covers blocks {0, 2}, S3 covers {1, 2, 3}
    const SCENARIOS: [ScenarioDesc; 4] = [
        ScenarioDesc::new(S0, "disable", BlockMask::EMPTY),
        ScenarioDesc::new(S1, "default", BlockMask(0b1111)),
        ScenarioDesc::new(S2, "debug", BlockMask(0b0101)),
        ScenarioDesc::new(S3, "boost", BlockMask(0b1110)),
    ];

    const TABLE: [QosConfig; 4] = [
        QosConfig::disable(),
        QosConfig::trex(0x4),
        QosConfig::mo(0x8, 0x10),
        QosConfig::bw(0xC, 0x100, 0x20, 0x1),
    ];

    /// Blocks 0 and 1 sit in "trex", blocks 2 and 3 in "mfc"
    const DOMAINS: [&str; 2] = ["trex", "mfc"];

    fn registry(enabled: [bool; 4]) -> Registry {
        let blocks = [
            BlockDesc::new("b0", DOMAINS[0], enabled[0], &TABLE),
            BlockDesc::new("b1", DOMAINS[0], enabled[1], &TABLE),
            BlockDesc::new("b2", DOMAINS[1], enabled[2], &TABLE),
            BlockDesc::new("b3", DOMAINS[1], enabled[3], &TABLE),
        ];
        Registry::from_tables(&SCENARIOS, &blocks).unwrap()
    }

    fn power_all(reg: &mut Registry, io: &mut RecordingIo, on: bool) {
        for domain in DOMAINS {
            reg.set_domain_power(io, &CFG, domain, on);
        }
    }

    fn powered(enabled: [bool; 4]) -> (Registry, RecordingIo) {
        let mut reg = registry(enabled);
        let mut io = RecordingIo::new();
        power_all(&mut reg, &mut io, true);
        io.clear();
        (reg, io)
    }

    fn add(reg: &mut Registry, io: &mut RecordingIo, s: ScenarioId) -> OpReport {
        let head = reg.ring_head(s);
        reg.add_scenario(io, &CFG, s, head)
    }

    fn remove(reg: &mut Registry, io: &mut RecordingIo, s: ScenarioId) -> OpReport {
        let head = reg.ring_head(s);
        reg.remove_scenario(io, &CFG, s, head)
    }

    fn check_ordering(reg: &Registry) {
        for block in reg.blocks() {
            let active = block.active_scenarios();
            assert_eq!(active.first(), Some(&block.top_scenario()));
            assert_eq!(active.last(), Some(&FLOOR));
            assert!(active.windows(2).all(|w| w[0] > w[1]), "{:?}", active);
            for s in 0..4u8 {
                assert_eq!(
                    block.is_active(ScenarioId(s)),
                    active.contains(&ScenarioId(s))
                );
            }
        }
    }

    fn check_top_tracks_hardware(reg: &Registry) {
        for block in reg.blocks().iter().filter(|b| b.is_enabled()) {
            if block.is_powered_on() {
                assert_eq!(block.current_scenario(), block.top_scenario());
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Add(ScenarioId),
        Remove(ScenarioId),
        Power(&'static str, bool),
    }

    /// Every sequence of `len` operations: add/remove of S2 and S3 plus
    /// power on/off of both domains
    fn sequences(len: usize) -> Vec<Vec<Op>> {
        let ops = [
            Op::Add(S2),
            Op::Remove(S2),
            Op::Add(S3),
            Op::Remove(S3),
            Op::Power(DOMAINS[0], true),
            Op::Power(DOMAINS[0], false),
            Op::Power(DOMAINS[1], true),
            Op::Power(DOMAINS[1], false),
        ];
        let mut out: Vec<Vec<Op>> = vec![Vec::new()];
        for _ in 0..len {
            out = out
                .iter()
                .flat_map(|seq| {
                    ops.iter().map(move |op| {
                        let mut next = seq.clone();
                        next.push(*op);
                        next
                    })
                })
                .collect();
        }
        out
    }

    fn run(reg: &mut Registry, io: &mut RecordingIo, seq: &[Op]) {
        for &op in seq {
            match op {
                Op::Add(s) => {
                    add(reg, io, s);
                },
                Op::Remove(s) => {
                    remove(reg, io, s);
                },
                Op::Power(domain, on) => {
                    reg.set_domain_power(io, &CFG, domain, on);
                },
            }
        }
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    #[test]
    fn test_ordering_holds_for_all_sequences() {
        for seq in sequences(4) {
            for powered_up in [false, true] {
                let (mut reg, mut io) = if powered_up {
                    powered([true; 4])
                } else {
                    (registry([true; 4]), RecordingIo::new())
                };
                run(&mut reg, &mut io, &seq);
                check_ordering(&reg);
                check_top_tracks_hardware(&reg);
            }
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        for seq in sequences(3) {
            for s in [S2, S3] {
                let (mut reg, mut io) = powered([true; 4]);
                run(&mut reg, &mut io, &seq);
                add(&mut reg, &mut io, s);
                let once = reg.clone();
                let writes = io.calls().len();

                let report = add(&mut reg, &mut io, s);
                assert_eq!(reg, once);
                assert_eq!(io.calls().len(), writes);
                assert_eq!(report.updated, 0);
            }
        }
    }

    #[test]
    fn test_add_then_remove_restores_state() {
        for seq in sequences(3) {
            for s in [S2, S3] {
                let (mut reg, mut io) = powered([true; 4]);
                run(&mut reg, &mut io, &seq);
                if reg.blocks().iter().any(|b| b.is_active(s)) {
                    continue;
                }
                let before = reg.clone();
                add(&mut reg, &mut io, s);
                remove(&mut reg, &mut io, s);
                assert_eq!(reg, before, "sequence {:?} then {:?}", seq, s);
            }
        }
    }

    #[test]
    fn test_disabled_blocks_untouched() {
        for seq in sequences(3) {
            let (mut reg, mut io) = powered([true, false, true, true]);
            let before = reg.block(BlockId(1)).unwrap().clone();
            run(&mut reg, &mut io, &seq);
            power_all(&mut reg, &mut io, false);
            power_all(&mut reg, &mut io, true);

            let after = reg.block(BlockId(1)).unwrap();
            assert_eq!(after.slots, before.slots);
            assert_eq!(after.top_scenario(), before.top_scenario());
            assert_eq!(io.calls_for(BlockId(1)), 0);
        }
    }

    #[test]
    fn test_ring_scope() {
        let (mut reg, mut io) = powered([true; 4]);
        let report = add(&mut reg, &mut io, S3);
        assert_eq!(report.visited, 3);
        assert_eq!(report.updated, 3);
        for block in reg.blocks() {
            let member = SCENARIOS[3].mask.contains(block.id());
            assert_eq!(block.is_active(S3), member);
        }

        let (mut reg, mut io) = powered([true, true, false, true]);
        add(&mut reg, &mut io, S3);
        let touched: Vec<_> = reg
            .blocks()
            .iter()
            .filter(|b| b.is_active(S3))
            .map(|b| b.id())
            .collect();
        assert_eq!(touched, vec![BlockId(1), BlockId(3)]);
    }

    // -------------------------------------------------------------------------
    // List edge cases
    // -------------------------------------------------------------------------

    #[test]
    fn test_lower_scenario_spliced_without_write() {
        let (mut reg, mut io) = powered([true; 4]);
        add(&mut reg, &mut io, S3);
        io.clear();

        // Block 0 gains a new top, block 2 only splices S2 under S3.
        let report = add(&mut reg, &mut io, S2);
        assert_eq!(report.hw_writes, 1);
        assert!(io.applied(BlockId(2)).is_empty());

        let b2 = reg.block(BlockId(2)).unwrap();
        assert_eq!(b2.top_scenario(), S3);
        assert_eq!(b2.active_scenarios(), vec![S3, S2, S1, S0]);

        let b0 = reg.block(BlockId(0)).unwrap();
        assert_eq!(b0.top_scenario(), S2);
        assert_eq!(b0.current_scenario(), S2);
        assert_eq!(io.applied(BlockId(0)), vec![TABLE[2]]);
    }

    #[test]
    fn test_remove_middle_keeps_hardware() {
        let (mut reg, mut io) = powered([true; 4]);
        add(&mut reg, &mut io, S2);
        add(&mut reg, &mut io, S3);
        io.clear();

        let start = Some(BlockId(2));
        let report = reg.remove_scenario(&mut io, &CFG, S2, start);
        assert_eq!(report.visited, 2);
        assert_eq!(report.hw_writes, 1);
        assert!(io.applied(BlockId(2)).is_empty());
        assert_eq!(io.applied(BlockId(0)), vec![TABLE[1]]);

        let b2 = reg.block(BlockId(2)).unwrap();
        assert_eq!(b2.active_scenarios(), vec![S3, S1, S0]);
        assert_eq!(b2.current_scenario(), S3);
    }

    #[test]
    fn test_remove_above_top_is_reported() {
        let (mut reg, mut io) = powered([true; 4]);
        let block = reg.block_mut(BlockId(0)).unwrap();
        // Corrupt the top pointer so S2 sits above the recorded top.
        block.link(S2).unwrap();
        block.top = S1;

        let report = reg.remove_scenario(&mut io, &CFG, S2, Some(BlockId(0)));
        assert_eq!(report.warnings, 1);
        assert!(matches!(
            report.last_error,
            Some(BtsError::InvariantViolation { .. })
        ));
        assert!(reg.block(BlockId(0)).unwrap().is_active(S2));
    }

    #[test]
    fn test_no_ring_is_noop() {
        let (mut reg, mut io) = powered([true; 4]);
        let before = reg.clone();
        let report = reg.add_scenario(&mut io, &CFG, S0, reg.ring_head(S0));
        assert_eq!(report, OpReport::new());
        assert_eq!(reg, before);
        assert!(io.calls().is_empty());
    }

    #[test]
    fn test_unpowered_add_defers_write() {
        let mut reg = registry([true; 4]);
        let mut io = RecordingIo::new();
        add(&mut reg, &mut io, S2);
        assert!(io.calls().is_empty());
        assert_eq!(reg.block(BlockId(0)).unwrap().top_scenario(), S2);
        assert_eq!(reg.block(BlockId(0)).unwrap().current_scenario(), S0);

        power_all(&mut reg, &mut io, true);
        assert_eq!(io.applied(BlockId(0)), vec![TABLE[2]]);
        assert_eq!(io.applied(BlockId(1)), vec![TABLE[1]]);
        check_top_tracks_hardware(&reg);
    }

    // -------------------------------------------------------------------------
    // Hardware failures and diagnostics
    // -------------------------------------------------------------------------

    #[test]
    fn test_apply_failure_is_absorbed() {
        let (mut reg, mut io) = powered([true; 4]);
        io.fail_writes(BlockId(0));

        let report = add(&mut reg, &mut io, S2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.hw_writes, 2);
        assert!(matches!(
            report.last_error,
            Some(BtsError::HardwareApply { block: BlockId(0), .. })
        ));

        let b0 = reg.block(BlockId(0)).unwrap();
        assert_eq!(b0.top_scenario(), S2);
        assert_eq!(b0.current_scenario(), S2);
        assert_eq!(reg.block(BlockId(2)).unwrap().current_scenario(), S2);
    }

    #[test]
    fn test_clock_drift_warned_before_write() {
        let (mut reg, mut io) = powered([true; 4]);
        io.set_clock(BlockId(2), false);

        let report = add(&mut reg, &mut io, S2);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.hw_writes, 2);

        let quiet = BtsConfig::new().with_verify_clocks(false);
        let head = reg.ring_head(S3);
        let report = reg.add_scenario(&mut io, &quiet, S3, head);
        assert_eq!(report.warnings, 0);
    }

    #[test]
    fn test_audit_clocks() {
        let (reg, mut io) = powered([true; 4]);
        assert!(reg.audit_clocks(&io).is_clean());

        io.set_clock(BlockId(3), false);
        let report = reg.audit_clocks(&io);
        assert_eq!(report.visited, 4);
        assert_eq!(
            report.last_error,
            Some(BtsError::ClockDrift {
                block: BlockId(3),
                powered_on: true,
            })
        );
    }

    #[test]
    fn test_power_off_gates_before_remove() {
        let (mut reg, mut io) = powered([true; 4]);
        power_all(&mut reg, &mut io, false);
        for id in 0..4u8 {
            let id = BlockId(id);
            assert_eq!(io.count(IoCall::ClockDisable(id)), 1);
            assert_eq!(reg.block(id).unwrap().top_scenario(), S0);
            assert!(!reg.block(id).unwrap().is_powered_on());
        }
        assert_eq!(io.apply_count(), 0);
    }

    #[test]
    fn test_clock_failure_is_absorbed() {
        let quiet = BtsConfig::new().with_verify_clocks(false);
        let mut reg = registry([true; 4]);
        let mut io = RecordingIo::new();
        io.fail_clocks(BlockId(1));

        let report = reg.set_domain_power(&mut io, &quiet, "trex", true);
        assert_eq!(report.errors, 1);
        assert!(matches!(
            report.last_error,
            Some(BtsError::Clock { block: BlockId(1), .. })
        ));
        for id in [BlockId(0), BlockId(1)] {
            let block = reg.block(id).unwrap();
            assert!(block.is_powered_on());
            assert_eq!(block.current_scenario(), S1);
            assert_eq!(io.applied(id), vec![TABLE[1]]);
        }
        assert!(io.is_clock_enabled(BlockId(0)));
        assert!(!io.is_clock_enabled(BlockId(1)));

        let report = reg.set_domain_power(&mut io, &quiet, "trex", false);
        assert_eq!(report.errors, 1);
        assert!(matches!(
            report.last_error,
            Some(BtsError::Clock { block: BlockId(1), .. })
        ));
        for id in [BlockId(0), BlockId(1)] {
            let block = reg.block(id).unwrap();
            assert!(!block.is_powered_on());
            assert_eq!(block.top_scenario(), S0);
            assert_eq!(io.count(IoCall::ClockDisable(id)), 1);
        }
        assert_eq!(io.apply_count(), 2);

        // The other domain never saw a call.
        assert_eq!(io.calls_for(BlockId(2)), 0);
        assert_eq!(io.calls_for(BlockId(3)), 0);
    }

    #[test]
    fn test_unknown_domain_is_ignored() {
        let mut reg = registry([true; 4]);
        let mut io = RecordingIo::new();
        let report = reg.set_domain_power(&mut io, &CFG, "g3d", true);
        assert!(report.is_clean());
        assert_eq!(report.visited, 0);
        assert_eq!(report.last_error, Some(BtsError::UnknownDomain));
        assert!(io.calls().is_empty());
    }
}
