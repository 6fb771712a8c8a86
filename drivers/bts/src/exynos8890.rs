//! # Exynos8890 Board Tables
//!
//! Sixteen TREX traffic shapers sit between the media masters and the bus.
//! Three scenarios are defined:
//!
//! | Id | Name | Blocks |
//! |----|------|--------|
//! | 0 | `bts_disable` | none (floor) |
//! | 1 | `bts_default` | all, applied per power domain |
//! | 2 | `bts_debug` | real-time masters (display, ISP, camera) |
//!
//! Power domains:
//!
//! ```text
//!   pd-disp0  : DISP0_0 DISP0_1        pd-mfc  : MFC0 MFC1
//!   pd-disp1  : DISP1_0 DISP1_1        pd-mscl : G2D0 G2D1 G2D2 MSCL0
//!   pd-isp0   : ISP0                   trex    : CP FSYS0 FSYS1
//!   pd-cam0   : CAM0 CAM1
//! ```

use bitflags::bitflags;
use static_assertions::{const_assert, const_assert_eq};

use crate::error::BtsResult;
use crate::registry::{BlockDesc, Registry, ScenarioDesc};
use crate::types::{BlockMask, QosConfig, ScenarioId};

// =============================================================================
// BLOCK BITS
// =============================================================================

bitflags! {
    /// One bit per shaper, in block-id order
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Ip: u64 {
        /// Display 0, port 0
        const DISP0_0 = 1 << 0;
        /// Display 0, port 1
        const DISP0_1 = 1 << 1;
        /// Display 1, port 0
        const DISP1_0 = 1 << 2;
        /// Display 1, port 1
        const DISP1_1 = 1 << 3;
        /// Image signal processor
        const ISP0    = 1 << 4;
        /// Camera 0
        const CAM0    = 1 << 5;
        /// Camera 1
        const CAM1    = 1 << 6;
        /// Modem
        const CP      = 1 << 7;
        /// Video codec, port 0
        const MFC0    = 1 << 8;
        /// Video codec, port 1
        const MFC1    = 1 << 9;
        /// 2D engine, port 0
        const G2D0    = 1 << 10;
        /// 2D engine, port 1
        const G2D1    = 1 << 11;
        /// 2D engine, port 2
        const G2D2    = 1 << 12;
        /// Storage 0
        const FSYS0   = 1 << 13;
        /// Storage 1
        const FSYS1   = 1 << 14;
        /// Scaler
        const MSCL0   = 1 << 15;

        /// All display ports
        const DISP = Self::DISP0_0.bits() | Self::DISP0_1.bits()
            | Self::DISP1_0.bits() | Self::DISP1_1.bits();
        /// ISP and camera ports
        const CAMERA = Self::ISP0.bits() | Self::CAM0.bits() | Self::CAM1.bits();
    }
}

/// Scenario count
pub const SCENARIO_COUNT: usize = 3;

/// Scenario table
pub const SCENARIOS: [ScenarioDesc; SCENARIO_COUNT] = [
    ScenarioDesc::new(ScenarioId::DISABLE, "bts_disable", BlockMask::EMPTY),
    ScenarioDesc::new(ScenarioId::DEFAULT, "bts_default", BlockMask::from_bits(Ip::all().bits())),
    ScenarioDesc::new(
        ScenarioId::DEBUG,
        "bts_debug",
        BlockMask::from_bits(Ip::DISP.union(Ip::CAMERA).bits()),
    ),
];

// =============================================================================
// PER-BLOCK CONFIGURATION
// =============================================================================

type Table = [QosConfig; SCENARIO_COUNT];

const DISP: Table = [
    QosConfig::disable(),
    QosConfig::mo_rt(0xC, 0x10, 0x10, false),
    QosConfig::mo_rt(0xE, 0x20, 0x08, true),
];

const CAM: Table = [
    QosConfig::disable(),
    QosConfig::mo_rt(0xA, 0x10, 0x20, false),
    QosConfig::mo_rt(0xC, 0x18, 0x10, true),
];

const CP: Table = [
    QosConfig::disable(),
    QosConfig::mo_cp(0xA, 0x18),
    QosConfig::nop(),
];

const MFC: Table = [
    QosConfig::disable(),
    QosConfig::mo_change(0x4, 0x10),
    QosConfig::nop(),
];

const G2D: Table = [
    QosConfig::disable(),
    QosConfig::urgent_off(0x4),
    QosConfig::nop(),
];

const FSYS: Table = [
    QosConfig::disable(),
    QosConfig::fbm_bw(0x4, 0x1),
    QosConfig::nop(),
];

const MSCL: Table = [
    QosConfig::disable(),
    QosConfig::bw(0x4, 0x7FFF, 0x100, 0x1),
    QosConfig::nop(),
];

/// Block table, indexed by block id
pub const BLOCKS: [BlockDesc<'static>; 16] = [
    BlockDesc::new("trex_disp0_0", "pd-disp0", true, &DISP),
    BlockDesc::new("trex_disp0_1", "pd-disp0", true, &DISP),
    BlockDesc::new("trex_disp1_0", "pd-disp1", true, &DISP),
    BlockDesc::new("trex_disp1_1", "pd-disp1", true, &DISP),
    BlockDesc::new("trex_isp0", "pd-isp0", true, &CAM),
    BlockDesc::new("trex_cam0", "pd-cam0", true, &CAM),
    BlockDesc::new("trex_cam1", "pd-cam0", true, &CAM),
    BlockDesc::new("trex_cp", "trex", true, &CP),
    BlockDesc::new("trex_mfc0", "pd-mfc", true, &MFC),
    BlockDesc::new("trex_mfc1", "pd-mfc", true, &MFC),
    BlockDesc::new("trex_g2d0", "pd-mscl", true, &G2D),
    BlockDesc::new("trex_g2d1", "pd-mscl", true, &G2D),
    BlockDesc::new("trex_g2d2", "pd-mscl", true, &G2D),
    BlockDesc::new("trex_fsys0", "trex", true, &FSYS),
    BlockDesc::new("trex_fsys1", "trex", true, &FSYS),
    BlockDesc::new("trex_mscl0", "pd-mscl", true, &MSCL),
];

const_assert!(BLOCKS.len() <= BlockMask::CAPACITY);
const_assert_eq!(BLOCKS.len(), Ip::all().bits().count_ones() as usize);
const_assert_eq!(SCENARIOS.len(), ScenarioId::DEBUG.index() + 1);

/// Build the Exynos8890 registry with every ring in place
pub fn registry() -> BtsResult<Registry> {
    Registry::from_tables(&SCENARIOS, &BLOCKS)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingIo;
    use crate::types::BlockId;
    use crate::{Bts, QosFunction};
    use alloc::vec::Vec;

    #[test]
    fn test_registry_builds() {
        let reg = registry().unwrap();
        assert_eq!(reg.blocks().len(), 16);
        assert_eq!(reg.block(BlockId(7)).unwrap().name(), "trex_cp");
        assert!(reg.ring(ScenarioId::DEFAULT).is_none());
    }

    #[test]
    fn test_debug_ring_covers_realtime_masters() {
        let reg = registry().unwrap();
        let ring: Vec<u8> = reg
            .ring(ScenarioId::DEBUG)
            .unwrap()
            .iter()
            .map(|b| b.0)
            .collect();
        assert_eq!(ring, [0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_domains() {
        let reg = registry().unwrap();
        assert_eq!(reg.blocks_in_domain("pd-mscl").len(), 4);
        assert_eq!(reg.blocks_in_domain("pd-disp0"), [BlockId(0), BlockId(1)]);
        assert_eq!(reg.blocks_in_domain("trex").len(), 3);
    }

    #[test]
    fn test_debug_toggle_on_display() {
        let bts = Bts::new(registry().unwrap(), RecordingIo::new());
        bts.initialize("pd-disp0", true);
        bts.with_io(|io| io.clear());

        // Only the powered display shapers are reprogrammed.
        let report = bts.set_scenario_by_name("bts_debug", true).unwrap();
        assert_eq!(report.visited, 7);
        assert_eq!(report.hw_writes, 2);
        bts.with_io(|io| {
            let applied = io.applied(BlockId(0));
            assert_eq!(applied.len(), 1);
            assert_eq!(applied[0].function, QosFunction::TrexQosMoRt);
            assert!(applied[0].bypass());
        });

        // Powering the camera afterwards programs Debug straight away.
        bts.initialize("pd-cam0", true);
        bts.with_registry(|r| {
            assert_eq!(r.block(BlockId(5)).unwrap().current_scenario(), ScenarioId::DEBUG);
        });
    }
}
