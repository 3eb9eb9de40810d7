//! Input settings for the reconciliation pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseVariantError;

/// Minutes in one rounding cell. Every produced interval snaps to this
/// grid.
pub const ROUNDING_UNIT_MINUTES: i64 = 30;

/// Tie-break direction when duplicate resolution must pick between an
/// earlier-but-shorter and a longer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeCompare {
    /// Prefer the shorter event.
    Small,
    /// Prefer the longer event.
    Large,
}

impl TimeCompare {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Large => "large",
        }
    }
}

impl FromStr for TimeCompare {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "large" => Ok(Self::Large),
            _ => Err(ParseVariantError::new("time comparison", s)),
        }
    }
}

/// Which boundary markers to derive from a presence schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartEndKind {
    /// Emit both the work-start and the work-end marker.
    Both,
    /// Emit only the work-start marker.
    Start,
    /// Emit only the work-end marker.
    End,
    /// Emit both markers and fill the gaps between events with
    /// work-ongoing markers.
    Fill,
}

impl StartEndKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Start => "start",
            Self::End => "end",
            Self::Fill => "fill",
        }
    }

    pub(crate) const fn wants_start(self) -> bool {
        !matches!(self, Self::End)
    }

    pub(crate) const fn wants_end(self) -> bool {
        !matches!(self, Self::Start)
    }
}

impl FromStr for StartEndKind {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(Self::Both),
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "fill" => Ok(Self::Fill),
            _ => Err(ParseVariantError::new("boundary marker kind", s)),
        }
    }
}

/// Settings applied to calendar events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInputInfo {
    /// How event intervals snap to the rounding grid.
    pub rounding_mode: crate::rounding::RoundingMode,
    /// Tie-break direction for duplicate resolution.
    pub time_compare: TimeCompare,
}

/// Settings applied to work-presence schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInputInfo {
    /// How derived boundary intervals snap to the rounding grid.
    pub rounding_mode: crate::rounding::RoundingMode,
    /// Length of the boundary window in minutes; must be a multiple of
    /// [`ROUNDING_UNIT_MINUTES`].
    pub start_end_minutes: i64,
    /// Which markers to derive.
    pub start_end_kind: StartEndKind,
}
