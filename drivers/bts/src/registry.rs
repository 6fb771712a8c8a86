//! # Block and Scenario Registry
//!
//! The registry owns every [`Block`] and [`Scenario`]. It is built once from
//! constant tables and afterwards mutated only by the scenario engine.
//!
//! ```text
//!   ScenarioDesc[]  ──┐
//!                     ├──▶ Registry::from_tables ──▶ build_rings ──▶ Registry
//!   BlockDesc[]     ──┘         (validate)          (per scenario)
//! ```

extern crate alloc;
use alloc::vec::Vec;

use crate::block::Block;
use crate::error::{BtsError, BtsResult};
use crate::scenario::Scenario;
use crate::types::{BlockId, BlockMask, QosConfig, ScenarioId};

// =============================================================================
// TABLE DESCRIPTORS
// =============================================================================

/// Constant description of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioDesc {
    /// Scenario id; must equal the entry's index in the table
    pub id: ScenarioId,
    /// Diagnostic name
    pub name: &'static str,
    /// Blocks the scenario affects
    pub mask: BlockMask,
}

impl ScenarioDesc {
    /// Describe a scenario
    pub const fn new(id: ScenarioId, name: &'static str, mask: BlockMask) -> Self {
        Self { id, name, mask }
    }
}

/// Constant description of a block
///
/// The block's id is its index in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDesc<'a> {
    /// Diagnostic name
    pub name: &'static str,
    /// Power domain the block is gated with
    pub domain: &'static str,
    /// Takes part in scenario scheduling
    pub enabled: bool,
    /// One configuration per scenario, indexed by scenario id
    pub table: &'a [QosConfig],
}

impl<'a> BlockDesc<'a> {
    /// Describe a block
    pub const fn new(
        name: &'static str,
        domain: &'static str,
        enabled: bool,
        table: &'a [QosConfig],
    ) -> Self {
        Self {
            name,
            domain,
            enabled,
            table,
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// All blocks and scenarios of one BTS instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub(crate) blocks: Vec<Block>,
    pub(crate) scenarios: Vec<Scenario>,
}

impl Registry {
    /// Build a registry from constant tables and build every ring
    pub fn from_tables(scenarios: &[ScenarioDesc], blocks: &[BlockDesc<'_>]) -> BtsResult<Self> {
        if scenarios.len() < 2 {
            return Err(BtsError::TooFewScenarios(scenarios.len()));
        }
        if blocks.len() > BlockMask::CAPACITY {
            return Err(BtsError::TooManyBlocks(blocks.len()));
        }

        let mut scen = Vec::with_capacity(scenarios.len());
        for (index, desc) in scenarios.iter().enumerate() {
            if desc.id.index() != index {
                return Err(BtsError::ScenarioOrder(desc.id));
            }
            scen.push(Scenario::new(desc.id, desc.name, desc.mask));
        }

        let mut blks = Vec::with_capacity(blocks.len());
        for (index, desc) in blocks.iter().enumerate() {
            let id = BlockId(index as u8);
            if desc.table.len() != scenarios.len() {
                return Err(BtsError::TableMismatch {
                    block: id,
                    expected: scenarios.len(),
                    found: desc.table.len(),
                });
            }
            blks.push(Block::new(id, desc.name, desc.domain, desc.enabled, desc.table));
        }

        let mut registry = Self {
            blocks: blks,
            scenarios: scen,
        };
        registry.build_rings();
        Ok(registry)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Block by id
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.index())
    }

    /// Scenario by id
    pub fn scenario(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.get(id.index())
    }

    /// Scenario by diagnostic name
    pub fn scenario_by_name(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// All blocks in id order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All scenarios in id (priority) order
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Ids of the blocks gated by power domain `domain`
    pub fn blocks_in_domain(&self, domain: &str) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|b| b.domain == domain)
            .map(|b| b.id)
            .collect()
    }

    /// Ring of `scenario`, if built
    pub fn ring(&self, scenario: ScenarioId) -> Option<&[BlockId]> {
        self.scenario(scenario).and_then(Scenario::ring)
    }

    /// First block of the ring of `scenario`
    pub fn ring_head(&self, scenario: ScenarioId) -> Option<BlockId> {
        self.scenario(scenario).and_then(Scenario::head)
    }

    // =========================================================================
    // RING BUILDER
    // =========================================================================

    /// Chain every enabled block of the scenario's mask into its ring
    ///
    /// Members are taken in ascending block id. An empty member set leaves
    /// the scenario without a ring. Rebuilding yields the same ring.
    pub fn build_ring(&mut self, scenario: ScenarioId) -> BtsResult<()> {
        let mask = self
            .scenario(scenario)
            .ok_or(BtsError::UnknownScenario(scenario))?
            .mask;

        let members: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|b| b.enabled && mask.contains(b.id))
            .map(|b| b.id)
            .collect();

        bts_dbg!(
            "BTS: scenario {} ring has {} blocks",
            self.scenarios[scenario.index()].name,
            members.len()
        );

        self.scenarios[scenario.index()].ring = if members.is_empty() {
            None
        } else {
            Some(members)
        };
        Ok(())
    }

    /// Build the ring of every scenario except Default
    ///
    /// Default is applied per block by power-domain control and never
    /// traverses a ring.
    pub fn build_rings(&mut self) {
        for index in 0..self.scenarios.len() {
            let id = ScenarioId(index as u8);
            if id == ScenarioId::DEFAULT {
                continue;
            }
            // Ids come from the table itself, so lookup cannot fail.
            let _ = self.build_ring(id);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
