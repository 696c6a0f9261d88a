// src/control/bands.rs
//
// Band tables for the banded proportional policy.
//
// A table is an ordered list of intervals, each mapped to one magnitude.
// Tables are evaluated first-match, in order, NOT as a sorted partition:
// the reference longitudinal table deliberately overlaps at 50000 and
// leaves everything from 360000 up unmatched. Values that match no band
// produce no command for that axis.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// REFERENCE GAINS
// ============================================================================
const S1: u32 = 30;
const S2: u32 = 20;
const S3: u32 = 15;
const S4: u32 = 7;
const S5: u32 = 2;

/// Fixed forward / backward speed for range hold
const SZ: u32 = 10;

/// Bounding-box area above which the vehicle lands (~400x400 px)
const LAND_AREA_THRESHOLD: i64 = 160_000;

fn inclusive() -> bool {
    true
}

/// One interval of the input mapped to a magnitude. Missing edges are
/// unbounded; edges are inclusive unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default)]
    pub lower: Option<i64>,
    #[serde(default)]
    pub upper: Option<i64>,
    #[serde(default = "inclusive")]
    pub lower_inclusive: bool,
    #[serde(default = "inclusive")]
    pub upper_inclusive: bool,
    #[serde(default)]
    pub magnitude: u32,
}

impl Band {
    const fn new(
        lower: Option<i64>,
        lower_inclusive: bool,
        upper: Option<i64>,
        upper_inclusive: bool,
        magnitude: u32,
    ) -> Self {
        Self {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
            magnitude,
        }
    }

    /// `(-inf, hi]`
    pub const fn at_most(hi: i64, magnitude: u32) -> Self {
        Self::new(None, true, Some(hi), true, magnitude)
    }

    /// `[lo, +inf)`
    pub const fn at_least(lo: i64, magnitude: u32) -> Self {
        Self::new(Some(lo), true, None, true, magnitude)
    }

    /// `(lo, hi]`
    pub const fn open_closed(lo: i64, hi: i64, magnitude: u32) -> Self {
        Self::new(Some(lo), false, Some(hi), true, magnitude)
    }

    /// `[lo, hi)`
    pub const fn closed_open(lo: i64, hi: i64, magnitude: u32) -> Self {
        Self::new(Some(lo), true, Some(hi), false, magnitude)
    }

    /// `[lo, hi]`
    pub const fn closed(lo: i64, hi: i64, magnitude: u32) -> Self {
        Self::new(Some(lo), true, Some(hi), true, magnitude)
    }

    /// `(lo, hi)`
    pub const fn open(lo: i64, hi: i64, magnitude: u32) -> Self {
        Self::new(Some(lo), false, Some(hi), false, magnitude)
    }

    /// `[v, v]`
    pub const fn exactly(v: i64, magnitude: u32) -> Self {
        Self::closed(v, v, magnitude)
    }

    pub fn contains(&self, value: i64) -> bool {
        let above = match self.lower {
            None => true,
            Some(lo) if self.lower_inclusive => value >= lo,
            Some(lo) => value > lo,
        };
        let below = match self.upper {
            None => true,
            Some(hi) if self.upper_inclusive => value <= hi,
            Some(hi) => value < hi,
        };
        above && below
    }

    /// True when at least one integer can fall inside the band.
    pub fn is_well_formed(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => {
                let lo = if self.lower_inclusive { lo } else { lo.saturating_add(1) };
                let hi = if self.upper_inclusive { hi } else { hi.saturating_sub(1) };
                lo <= hi
            }
            _ => true,
        }
    }
}

/// First band in `table` containing `value`.
pub fn first_match(table: &[Band], value: i64) -> Option<&Band> {
    table.iter().find(|band| band.contains(value))
}

/// Band tables for one signed axis. `negative` applies to offsets <= -1,
/// `positive` to offsets >= 1; an offset of exactly 0 is the dead-zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBands {
    pub negative: Vec<Band>,
    pub positive: Vec<Band>,
}

impl AxisBands {
    /// Lateral reference: mirror-symmetric, edge values +-1 map to 0.
    pub fn reference_lateral() -> Self {
        Self {
            negative: vec![
                Band::at_most(-500, S1),
                Band::open_closed(-500, -400, S2),
                Band::open_closed(-400, -200, S3),
                Band::open_closed(-200, -50, S4),
                Band::open(-50, -1, S5),
                Band::exactly(-1, 0),
            ],
            positive: vec![
                Band::at_least(500, S1),
                Band::closed_open(400, 500, S2),
                Band::closed_open(200, 400, S3),
                Band::closed_open(50, 200, S4),
                Band::open(1, 50, S5),
                Band::exactly(1, 0),
            ],
        }
    }

    /// Vertical reference. Descending corrections run at double gain in the
    /// four outer bands, and the ascending inner band starts at 1 inclusive,
    /// so +1 still climbs at S5 while -1 stops.
    pub fn reference_vertical() -> Self {
        Self {
            negative: vec![
                Band::at_most(-500, S1 * 2),
                Band::open_closed(-500, -400, S2 * 2),
                Band::open_closed(-400, -200, S3 * 2),
                Band::open_closed(-200, -50, S4 * 2),
                Band::open(-50, -1, S5),
                Band::exactly(-1, 0),
            ],
            positive: vec![
                Band::at_least(500, S1),
                Band::closed_open(400, 500, S2),
                Band::closed_open(200, 400, S3),
                Band::closed_open(50, 200, S4),
                Band::closed_open(1, 50, S5),
            ],
        }
    }

    fn validate(&self, axis: &str) -> Result<()> {
        for (side, table) in [("negative", &self.negative), ("positive", &self.positive)] {
            ensure!(!table.is_empty(), "{axis}.{side}: band table is empty");
            for (i, band) in table.iter().enumerate() {
                ensure!(
                    band.is_well_formed(),
                    "{axis}.{side}[{i}]: band {band:?} contains no value"
                );
            }
        }
        Ok(())
    }
}

/// What the target's apparent size says about range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeState {
    /// Too small to trust: hold position on the range axis
    TooSmall,
    /// Close in at the band's magnitude
    TooFar,
    /// Back off at the band's magnitude
    TooClose,
    /// Inside the hold window: explicit stop both ways
    JustRight,
}

impl RangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooSmall => "TOO_SMALL",
            Self::TooFar => "TOO_FAR",
            Self::TooClose => "TOO_CLOSE",
            Self::JustRight => "JUST_RIGHT",
        }
    }
}

/// A longitudinal band over target area. `magnitude` only matters for
/// `too_far` / `too_close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBand {
    pub state: RangeState,
    #[serde(flatten)]
    pub band: Band,
}

impl RangeBand {
    const fn new(state: RangeState, band: Band) -> Self {
        Self { state, band }
    }
}

/// Longitudinal reference, in evaluation order. The close band is checked
/// before the hold window, so 50000 backs off.
pub fn reference_longitudinal() -> Vec<RangeBand> {
    vec![
        RangeBand::new(RangeState::TooSmall, Band::closed_open(0, 2_500, 0)),
        RangeBand::new(RangeState::TooFar, Band::closed_open(2_500, 30_000, SZ)),
        RangeBand::new(RangeState::TooClose, Band::closed_open(50_000, 360_000, SZ)),
        RangeBand::new(RangeState::JustRight, Band::closed(30_000, 50_000, 0)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub lateral: AxisBands,
    pub vertical: AxisBands,
    pub longitudinal: Vec<RangeBand>,
    /// Land when the target's box area is strictly above this
    pub land_area_threshold: i64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            lateral: AxisBands::reference_lateral(),
            vertical: AxisBands::reference_vertical(),
            longitudinal: reference_longitudinal(),
            land_area_threshold: LAND_AREA_THRESHOLD,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<()> {
        self.lateral.validate("control.lateral")?;
        self.vertical.validate("control.vertical")?;
        ensure!(
            !self.longitudinal.is_empty(),
            "control.longitudinal: band table is empty"
        );
        for (i, range) in self.longitudinal.iter().enumerate() {
            ensure!(
                range.band.is_well_formed(),
                "control.longitudinal[{i}]: band {:?} contains no value",
                range.band
            );
        }
        ensure!(
            self.land_area_threshold >= 0,
            "control.land_area_threshold must be non-negative, got {}",
            self.land_area_threshold
        );
        Ok(())
    }
}
