//! # Status Snapshot
//!
//! Point-in-time view of every block, rendered one line per block:
//!
//! ```text
//! [ 0] trex_disp0_0   pd=trex       en=1 on=1 cur=bts_default     top=bts_default     [1 0]
//! ```

extern crate alloc;
use alloc::vec::Vec;
use core::fmt;

use crate::registry::Registry;
use crate::types::{BlockId, ScenarioId};

/// State of one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStatus {
    /// Block id
    pub id: BlockId,
    /// Block name
    pub name: &'static str,
    /// Power domain
    pub domain: &'static str,
    /// Takes part in scheduling
    pub enabled: bool,
    /// Clock domain active
    pub powered_on: bool,
    /// Scenario programmed into hardware
    pub current: ScenarioId,
    /// Highest active scenario
    pub top: ScenarioId,
    /// Active scenarios, top first
    pub active: Vec<ScenarioId>,
    /// Name of `current`
    pub current_name: &'static str,
    /// Name of `top`
    pub top_name: &'static str,
}

/// Snapshot of all blocks in id order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Per-block entries
    pub blocks: Vec<BlockStatus>,
}

impl StatusReport {
    /// Capture the current state of `registry`
    pub fn capture(registry: &Registry) -> Self {
        let name = |id: ScenarioId| registry.scenario(id).map_or("?", |s| s.name());
        let blocks = registry
            .blocks()
            .iter()
            .map(|b| BlockStatus {
                id: b.id(),
                name: b.name(),
                domain: b.domain(),
                enabled: b.is_enabled(),
                powered_on: b.is_powered_on(),
                current: b.current_scenario(),
                top: b.top_scenario(),
                active: b.active_scenarios(),
                current_name: name(b.current_scenario()),
                top_name: name(b.top_scenario()),
            })
            .collect();
        Self { blocks }
    }

    /// Entry for `id`
    pub fn block(&self, id: BlockId) -> Option<&BlockStatus> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Blocks currently powered
    pub fn powered(&self) -> impl Iterator<Item = &BlockStatus> {
        self.blocks.iter().filter(|b| b.powered_on)
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:2}] {:<14} pd={:<10} en={} on={} cur={:<15} top={:<15} [",
            self.id.0,
            self.name,
            self.domain,
            u8::from(self.enabled),
            u8::from(self.powered_on),
            self.current_name,
            self.top_name
        )?;
        for (i, s) in self.active.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", s.0)?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{}", block)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BlockDesc, ScenarioDesc};
    use crate::types::{BlockMask, QosConfig};
    use alloc::string::ToString;
    use alloc::vec;

    const TABLE: [QosConfig; 3] = [QosConfig::disable(), QosConfig::trex(4), QosConfig::trex(8)];

    fn registry() -> Registry {
        let scenarios = [
            ScenarioDesc::new(ScenarioId::DISABLE, "bts_disable", BlockMask::EMPTY),
            ScenarioDesc::new(ScenarioId::DEFAULT, "bts_default", BlockMask::EMPTY),
            ScenarioDesc::new(ScenarioId::DEBUG, "bts_debug", BlockMask(0b1)),
        ];
        let blocks = [
            BlockDesc::new("trex_disp0_0", "trex", true, &TABLE),
            BlockDesc::new("trex_cp", "trex", false, &TABLE),
        ];
        Registry::from_tables(&scenarios, &blocks).unwrap()
    }

    #[test]
    fn test_capture() {
        let report = StatusReport::capture(&registry());
        assert_eq!(report.blocks.len(), 2);

        let b0 = report.block(BlockId(0)).unwrap();
        assert_eq!(b0.top, ScenarioId::DISABLE);
        assert_eq!(b0.top_name, "bts_disable");
        assert_eq!(b0.active, vec![ScenarioId::DISABLE]);
        assert!(!report.block(BlockId(1)).unwrap().enabled);
        assert_eq!(report.powered().count(), 0);
    }

    #[test]
    fn test_render() {
        let report = StatusReport::capture(&registry());
        let text = report.to_string();
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("[ 0] trex_disp0_0"));
        assert!(first.contains("en=1 on=0"));
        assert!(first.ends_with("[0]"));
        assert_eq!(text.lines().count(), 2);
    }
}
