//! # Exynos Bus Traffic Shaper
//!
//! Scenario engine for the TREX traffic shapers that sit between the media
//! masters of an Exynos SoC and the system bus. Each shaper ("block") keeps
//! a priority-ordered list of the QoS scenarios currently active on it and
//! is reprogrammed whenever the highest one changes.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                                 Bts<I>                                │
//! │   initialize · notify_scenario · activate · deactivate · status       │
//! └──────────────────────────────────┬────────────────────────────────────┘
//!                                    │ spin::Mutex
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐          ┌──────────────┐
//!   │ Registry    │          │ Engine       │          │ BtsIo        │
//!   │  blocks     │◀────────▶│  add/remove  │─────────▶│  apply       │
//!   │  scenarios  │          │  power       │          │  disable     │
//!   │  rings      │          │  apply       │          │  clocks      │
//!   └─────────────┘          └──────────────┘          └──────────────┘
//! ```
//!
//! ## Active Scenario List
//!
//! Scenario ids double as priorities. Per block the active scenarios form
//! a doubly linked list through the block's per-scenario slots, ordered by
//! id, with Disable (id 0) as the permanent floor:
//!
//! ```text
//!   top ──▶ [Debug] ──prev──▶ [Default] ──prev──▶ [Disable] (floor)
//! ```
//!
//! Adding a scenario above the top makes it the new top and programs the
//! hardware. Adding below the top splices it in silently. Removing the top
//! falls back to the next lower scenario and programs that.
//!
//! ## Features
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `exynos8890` | Exynos8890 board tables ([`exynos8890::registry`]) |
//! | `debug` | per-transition tracing through `log::debug!` |
//! | `testing` | exports [`mock::RecordingIo`] |

#![no_std]
#![warn(missing_docs)]

// =============================================================================
// EXTERNAL DEPENDENCIES
// =============================================================================

extern crate alloc;

/// Trace a scenario transition when the `debug` feature is on
macro_rules! bts_dbg {
    ($($arg:tt)*) => {
        if cfg!(feature = "debug") {
            log::debug!($($arg)*);
        }
    };
}

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

/// Identifiers, masks and QoS configurations
pub mod types;

/// Error types and operation reports
pub mod error;

/// Register I/O adapter
pub mod io;

/// Runtime settings
pub mod config;

/// Per-block active scenario list
pub mod block;

/// Scenario metadata and rings
pub mod scenario;

/// Block and scenario tables
pub mod registry;

/// Add, remove and power-domain algorithms
pub mod engine;

/// External event dispatch
pub mod dispatch;

/// Status snapshots
pub mod status;

/// Lock-wrapped public handle
pub mod controller;

/// Exynos8890 board tables
#[cfg(feature = "exynos8890")]
pub mod exynos8890;

cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "testing"))] {
        /// Recording adapter for tests
        pub mod mock;
    }
}

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use block::{Block, ScenarioSlot, SlotLink, FLOOR};
pub use config::BtsConfig;
pub use controller::Bts;
pub use dispatch::{ScenarioPolicy, ScenarioRequest, UnmappedPolicy, UpdateKind};
pub use error::{BtsError, BtsResult, OpReport};
pub use io::{BtsIo, IoError, IoResult};
pub use registry::{BlockDesc, Registry, ScenarioDesc};
pub use scenario::{RingWalk, Scenario};
pub use status::{BlockStatus, StatusReport};
pub use types::{BlockId, BlockMask, QosConfig, QosFlags, QosFunction, ScenarioId};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
