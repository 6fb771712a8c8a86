//! # Runtime Configuration
//!
//! Compile-time configuration lives in the board tables and the crate
//! features (`exynos8890`, `debug`, `testing`). [`BtsConfig`] carries the
//! few knobs that can change per instance.

/// Per-instance engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtsConfig {
    /// Check the block clock before every register write and warn on drift
    pub verify_clocks: bool,
}

impl BtsConfig {
    /// Default settings
    pub const fn new() -> Self {
        Self {
            verify_clocks: true,
        }
    }

    /// Enable or disable the pre-write clock check
    pub const fn with_verify_clocks(mut self, verify: bool) -> Self {
        self.verify_clocks = verify;
        self
    }
}

impl Default for BtsConfig {
    fn default() -> Self {
        Self::new()
    }
}
