//! # Recording I/O Adapter
//!
//! A [`BtsIo`] that touches no hardware. It logs every call, tracks clock
//! state per block and can be told to fail register writes or clock
//! gating on selected blocks.

extern crate alloc;
use alloc::vec::Vec;

use crate::io::{BtsIo, IoError, IoResult};
use crate::types::{BlockId, BlockMask, QosConfig};

/// One adapter call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCall {
    /// `apply_config`
    Apply {
        /// Target block
        block: BlockId,
        /// Configuration written
        config: QosConfig,
    },
    /// `disable`
    Disable(BlockId),
    /// `clock_enable`
    ClockEnable(BlockId),
    /// `clock_disable`
    ClockDisable(BlockId),
}

/// Adapter double recording every call
#[derive(Debug, Clone, Default)]
pub struct RecordingIo {
    calls: Vec<IoCall>,
    clocks: BlockMask,
    failing: BlockMask,
    failing_clocks: BlockMask,
}

impl RecordingIo {
    /// Empty recorder, all clocks gated
    pub fn new() -> Self {
        Self::default()
    }

    /// Make register writes to `block` fail with a timeout
    pub fn fail_writes(&mut self, block: BlockId) {
        self.failing = self.failing.with(block);
    }

    /// Make clock gate and ungate calls on `block` fail with a fault
    ///
    /// A failed call leaves the recorded clock state unchanged.
    pub fn fail_clocks(&mut self, block: BlockId) {
        self.failing_clocks = self.failing_clocks.with(block);
    }

    /// Force the recorded clock state of `block`
    pub fn set_clock(&mut self, block: BlockId, running: bool) {
        self.clocks = if running {
            self.clocks.with(block)
        } else {
            BlockMask(self.clocks.bits() & !block.bit())
        };
    }

    /// Every call so far, in order
    pub fn calls(&self) -> &[IoCall] {
        &self.calls
    }

    /// Forget recorded calls, keep clock state
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Configurations applied to `block`, in order
    pub fn applied(&self, block: BlockId) -> Vec<QosConfig> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                IoCall::Apply { block: b, config } if *b == block => Some(*config),
                _ => None,
            })
            .collect()
    }

    /// Number of `apply_config` calls
    pub fn apply_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, IoCall::Apply { .. }))
            .count()
    }

    /// Number of calls that target `block`
    pub fn calls_for(&self, block: BlockId) -> usize {
        self.calls
            .iter()
            .filter(|c| match c {
                IoCall::Apply { block: b, .. } => *b == block,
                IoCall::Disable(b) | IoCall::ClockEnable(b) | IoCall::ClockDisable(b) => {
                    *b == block
                },
            })
            .count()
    }

    /// Number of calls matching `call`
    pub fn count(&self, call: IoCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn gate(&mut self, block: BlockId, call: IoCall, running: bool) -> IoResult {
        self.calls.push(call);
        if self.failing_clocks.contains(block) {
            return Err(IoError::Fault);
        }
        self.set_clock(block, running);
        Ok(())
    }

    fn write(&mut self, block: BlockId, call: IoCall) -> IoResult {
        self.calls.push(call);
        if self.failing.contains(block) {
            Err(IoError::Timeout)
        } else {
            Ok(())
        }
    }
}

impl BtsIo for RecordingIo {
    fn apply_config(&mut self, block: BlockId, config: &QosConfig) -> IoResult {
        self.write(
            block,
            IoCall::Apply {
                block,
                config: *config,
            },
        )
    }

    fn disable(&mut self, block: BlockId) -> IoResult {
        self.write(block, IoCall::Disable(block))
    }

    fn clock_enable(&mut self, block: BlockId) -> IoResult {
        self.gate(block, IoCall::ClockEnable(block), true)
    }

    fn clock_disable(&mut self, block: BlockId) -> IoResult {
        self.gate(block, IoCall::ClockDisable(block), false)
    }

    fn is_clock_enabled(&self, block: BlockId) -> bool {
        self.clocks.contains(block)
    }
}
