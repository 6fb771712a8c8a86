//! # Scenarios and Rings
//!
//! Each scenario carries the mask of blocks it affects and, once built, a
//! ring: the enabled members of that mask in ascending id order. Add and
//! remove walk the ring from a starting block and wrap around until they
//! are back where they began.

extern crate alloc;
use alloc::vec::Vec;

use crate::types::{BlockId, BlockMask, ScenarioId};

/// Scenario metadata and traversal ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub(crate) id: ScenarioId,
    pub(crate) name: &'static str,
    pub(crate) mask: BlockMask,
    pub(crate) ring: Option<Vec<BlockId>>,
}

impl Scenario {
    pub(crate) fn new(id: ScenarioId, name: &'static str, mask: BlockMask) -> Self {
        Self {
            id,
            name,
            mask,
            ring: None,
        }
    }

    /// Scenario id (also its priority)
    pub fn id(&self) -> ScenarioId {
        self.id
    }

    /// Diagnostic name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Blocks the scenario affects
    pub fn mask(&self) -> BlockMask {
        self.mask
    }

    /// Ring members in traversal order, if built
    pub fn ring(&self) -> Option<&[BlockId]> {
        self.ring.as_deref()
    }

    /// First block of the ring
    pub fn head(&self) -> Option<BlockId> {
        self.ring.as_ref().and_then(|r| r.first().copied())
    }

    /// Blocks visited by a traversal starting at `start`
    ///
    /// Inside the ring the walk wraps back to `start`. A block outside the
    /// ring has no successor, so only that block is visited.
    pub fn walk(&self, start: BlockId) -> RingWalk<'_> {
        let ring = self.ring.as_deref().unwrap_or(&[]);
        match ring.iter().position(|&b| b == start) {
            Some(pos) => RingWalk {
                ring,
                start: pos,
                step: 0,
                lone: None,
            },
            None => RingWalk {
                ring: &[],
                start: 0,
                step: 0,
                lone: Some(start),
            },
        }
    }
}

/// Iterator over one ring traversal
#[derive(Debug, Clone)]
pub struct RingWalk<'a> {
    ring: &'a [BlockId],
    start: usize,
    step: usize,
    lone: Option<BlockId>,
}

impl Iterator for RingWalk<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        if let Some(block) = self.lone.take() {
            return Some(block);
        }
        if self.step >= self.ring.len() {
            return None;
        }
        let block = self.ring[(self.start + self.step) % self.ring.len()];
        self.step += 1;
        Some(block)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn ringed() -> Scenario {
        let mut s = Scenario::new(ScenarioId::DEBUG, "debug", BlockMask(0b1101));
        s.ring = Some(vec![BlockId(0), BlockId(2), BlockId(3)]);
        s
    }

    #[test]
    fn test_walk_from_head() {
        let s = ringed();
        let order: Vec<_> = s.walk(BlockId(0)).collect();
        assert_eq!(order, vec![BlockId(0), BlockId(2), BlockId(3)]);
    }

    #[test]
    fn test_walk_wraps() {
        let s = ringed();
        let order: Vec<_> = s.walk(BlockId(2)).collect();
        assert_eq!(order, vec![BlockId(2), BlockId(3), BlockId(0)]);
    }

    #[test]
    fn test_walk_outside_ring_visits_start_only() {
        let s = ringed();
        let order: Vec<_> = s.walk(BlockId(1)).collect();
        assert_eq!(order, vec![BlockId(1)]);

        let bare = Scenario::new(ScenarioId::DEFAULT, "default", BlockMask::EMPTY);
        assert_eq!(bare.head(), None);
        let order: Vec<_> = bare.walk(BlockId(5)).collect();
        assert_eq!(order, vec![BlockId(5)]);
    }
}
