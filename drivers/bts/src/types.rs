//! # Core Types
//!
//! Identifiers, block masks and the per-scenario QoS configuration that the
//! register adapter programs into a traffic shaper.

use core::fmt;

use bitflags::bitflags;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Traffic shaper block identifier
///
/// The value is the block's bit position in a [`BlockMask`] and its index in
/// the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u8);

impl BlockId {
    /// Registry index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask for this block; zero for ids a mask cannot hold
    pub const fn bit(self) -> u64 {
        match 1u64.checked_shl(self.0 as u32) {
            Some(bit) => bit,
            None => 0,
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scenario identifier
///
/// Scenario ids double as priorities: a higher id wins when several
/// scenarios are active on the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScenarioId(pub u8);

impl ScenarioId {
    /// Lowest priority, the floor of every block's active list
    pub const DISABLE: Self = Self(0);
    /// Power-on configuration of every block
    pub const DEFAULT: Self = Self(1);
    /// Debug override
    pub const DEBUG: Self = Self(2);

    /// Table index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// =============================================================================
// BLOCK MASK
// =============================================================================

/// Set of blocks a scenario affects, one bit per [`BlockId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct BlockMask(pub u64);

impl BlockMask {
    /// Maximum number of blocks a mask can address
    pub const CAPACITY: usize = 64;

    /// Mask with no blocks
    pub const EMPTY: Self = Self(0);

    /// Build from raw bits
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Does the mask include `block`?
    pub const fn contains(self, block: BlockId) -> bool {
        self.0 & block.bit() != 0
    }

    /// Is the mask empty?
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Add a block
    pub const fn with(self, block: BlockId) -> Self {
        Self(self.0 | block.bit())
    }

    /// Number of blocks in the mask
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

// =============================================================================
// QOS CONFIGURATION
// =============================================================================

/// Register programming sequence used for a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QosFunction {
    /// Priority only
    TrexQos,
    /// Priority + outstanding limit, real-time with timeout and bypass
    TrexQosMoRt,
    /// Priority + outstanding limit
    TrexQosMo,
    /// Priority + outstanding limit, modem port variant
    TrexQosMoCp,
    /// Priority + outstanding limit, runtime-changeable variant
    TrexQosMoChange,
    /// Priority with the urgent signal masked
    TrexQosUrgentOff,
    /// Priority + bandwidth window/token
    TrexQosBw,
    /// Priority + fair bandwidth meter
    TrexQosFbmBw,
    /// Shaper disabled (bypass)
    TrexDisable,
    /// Leave the hardware untouched
    Nop,
}

impl QosFunction {
    /// Short register-sequence name used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            Self::TrexQos => "trexqos",
            Self::TrexQosMoRt => "trexqos_mo_rt",
            Self::TrexQosMo => "trexqos_mo",
            Self::TrexQosMoCp => "trexqos_mo_cp",
            Self::TrexQosMoChange => "trexqos_mo_change",
            Self::TrexQosUrgentOff => "trexqos_urgent_off",
            Self::TrexQosBw => "trexqos_bw",
            Self::TrexQosFbmBw => "trexqos_fbmbw",
            Self::TrexDisable => "trexdisable",
            Self::Nop => "nop",
        }
    }
}

bitflags! {
    /// Control bits carried alongside the numeric QoS parameters
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct QosFlags: u32 {
        /// Traffic bypasses the shaper once the timeout expires
        const BYPASS   = 1 << 0;
        /// Master is real-time (display, camera)
        const REALTIME = 1 << 1;
    }
}

/// Fixed hardware configuration for one block in one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QosConfig {
    /// Register programming sequence
    pub function: QosFunction,
    /// Arbitration priority
    pub priority: u32,
    /// Bandwidth window
    pub window: u32,
    /// Bandwidth token
    pub token: u32,
    /// Outstanding transaction limit
    pub mo: u32,
    /// Fair bandwidth meter setting
    pub fbm: u32,
    /// Token decrement value
    pub decval: u32,
    /// Real-time timeout
    pub timeout: u32,
    /// Control bits
    pub flags: QosFlags,
}

impl QosConfig {
    const fn base(function: QosFunction, priority: u32) -> Self {
        Self {
            function,
            priority,
            window: 0,
            token: 0,
            mo: 0,
            fbm: 0,
            decval: 0,
            timeout: 0,
            flags: QosFlags::empty(),
        }
    }

    /// Untouched hardware
    pub const fn nop() -> Self {
        Self::base(QosFunction::Nop, 0)
    }

    /// Shaper disabled
    pub const fn disable() -> Self {
        Self::base(QosFunction::TrexDisable, 0)
    }

    /// Priority only
    pub const fn trex(priority: u32) -> Self {
        Self::base(QosFunction::TrexQos, priority)
    }

    /// Priority with urgent masked
    pub const fn urgent_off(priority: u32) -> Self {
        Self::base(QosFunction::TrexQosUrgentOff, priority)
    }

    /// Priority + outstanding limit
    pub const fn mo(priority: u32, mo: u32) -> Self {
        let mut cfg = Self::base(QosFunction::TrexQosMo, priority);
        cfg.mo = mo;
        cfg
    }

    /// Priority + outstanding limit for the modem port
    pub const fn mo_cp(priority: u32, mo: u32) -> Self {
        let mut cfg = Self::mo(priority, mo);
        cfg.function = QosFunction::TrexQosMoCp;
        cfg
    }

    /// Priority + outstanding limit, changeable at runtime
    pub const fn mo_change(priority: u32, mo: u32) -> Self {
        let mut cfg = Self::mo(priority, mo);
        cfg.function = QosFunction::TrexQosMoChange;
        cfg
    }

    /// Real-time master with outstanding limit, timeout and optional bypass
    pub const fn mo_rt(priority: u32, mo: u32, timeout: u32, bypass: bool) -> Self {
        let mut cfg = Self::mo(priority, mo);
        cfg.function = QosFunction::TrexQosMoRt;
        cfg.timeout = timeout;
        cfg.flags = if bypass {
            QosFlags::REALTIME.union(QosFlags::BYPASS)
        } else {
            QosFlags::REALTIME
        };
        cfg
    }

    /// Priority + bandwidth limit
    pub const fn bw(priority: u32, window: u32, token: u32, decval: u32) -> Self {
        let mut cfg = Self::base(QosFunction::TrexQosBw, priority);
        cfg.window = window;
        cfg.token = token;
        cfg.decval = decval;
        cfg
    }

    /// Priority + fair bandwidth meter
    pub const fn fbm_bw(priority: u32, fbm: u32) -> Self {
        let mut cfg = Self::base(QosFunction::TrexQosFbmBw, priority);
        cfg.fbm = fbm;
        cfg
    }

    /// Does applying this configuration touch the hardware?
    pub const fn writes_hardware(&self) -> bool {
        !matches!(self.function, QosFunction::Nop)
    }

    /// Bypass once the real-time timeout expires?
    pub const fn bypass(&self) -> bool {
        self.flags.contains(QosFlags::BYPASS)
    }
}

// =============================================================================
// TESTS
// =============================================================================
