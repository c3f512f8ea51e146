//! Decision engine: one report plus override memory in, one level out.
//!
//! Pure function of its inputs; the state-file poll happens in the caller
//! ([`PresenceService`](crate::app::service::PresenceService)) and arrives
//! here as `observed`.
//!
//! 1. Override edge (neutral → non-neutral) wins outright.
//! 2. Otherwise the strongest found device above the selection floor is
//!    mapped through the threshold table.

use core::fmt;

use crate::config::{DecisionRules, ThresholdBand};

use super::override_watch::{Edge, OverrideState};
use super::report::{DeviceReading, PresenceReport};

/// Wire level for "a reading exists but matches no band".
pub const LEVEL_NO_SIGNAL: i32 = -1;
/// Wire level for "no found device in the report".
pub const LEVEL_NOTHING_DETECTED: i32 = 0;

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NothingDetected,
    /// The representative device fell into a threshold band.
    Proximity(i32),
    /// The representative device matched no band.
    NoSignal,
    /// A neutral → `symbol` edge forced `level`.
    Override { symbol: char, level: i32 },
    /// An edge fired on a symbol the override table does not know.
    UnmappedOverride(char),
}

impl Verdict {
    /// Integer put on the wire.
    pub fn level(self) -> i32 {
        match self {
            Self::NothingDetected => LEVEL_NOTHING_DETECTED,
            Self::Proximity(level) | Self::Override { level, .. } => level,
            Self::NoSignal | Self::UnmappedOverride(_) => LEVEL_NO_SIGNAL,
        }
    }

    pub fn is_override(self) -> bool {
        matches!(self, Self::Override { .. } | Self::UnmappedOverride(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingDetected => write!(f, "nothing detected"),
            Self::Proximity(level) => write!(f, "proximity {level}"),
            Self::NoSignal => write!(f, "no signal"),
            Self::Override { symbol, level } => write!(f, "override '{symbol}' -> {level}"),
            Self::UnmappedOverride(symbol) => write!(f, "unmapped override '{symbol}'"),
        }
    }
}

/// Decide the level for `report` given this line's poll result.
pub fn decide(
    report: &PresenceReport,
    observed: Option<char>,
    state: OverrideState,
    rules: &DecisionRules,
) -> (Verdict, OverrideState) {
    let (edge, next) = state.observe(observed, rules.neutral_symbol);

    let verdict = match edge {
        Edge::Triggered(symbol) => match rules.overrides.iter().find(|r| r.symbol == symbol) {
            Some(rule) => Verdict::Override {
                symbol,
                level: rule.level,
            },
            None => Verdict::UnmappedOverride(symbol),
        },
        Edge::Steady => match representative(report, rules.selection_floor_dbm) {
            Some(dev) => classify(dev.rssi, &rules.thresholds),
            None => Verdict::NothingDetected,
        },
    };

    (verdict, next)
}

/// Strongest found device strictly above `floor`; the first one wins ties.
pub fn representative(report: &PresenceReport, floor: i32) -> Option<&DeviceReading> {
    report
        .devices
        .iter()
        .filter(|d| d.found && d.rssi > floor)
        .fold(None, |best: Option<&DeviceReading>, d| match best {
            Some(b) if b.rssi >= d.rssi => Some(b),
            _ => Some(d),
        })
}

/// First band whose threshold `rssi` strictly exceeds.
pub fn classify(rssi: i32, bands: &[ThresholdBand]) -> Verdict {
    bands
        .iter()
        .find(|b| rssi > b.above_dbm)
        .map_or(Verdict::NoSignal, |b| Verdict::Proximity(b.level))
}
