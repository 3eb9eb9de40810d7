//! Error types for the fatal failure class.
//!
//! Only configuration and construction problems are surfaced as errors.
//! Per-row failures inside the pipeline (rounding drops, unworkable
//! schedules, boundary-less dates) are logged and the row is skipped.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Invalid pipeline configuration, detected when building a
/// [`Reconciler`](crate::Reconciler).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No work-schedule settings were supplied.
    #[error("work schedule settings are not configured")]
    MissingScheduleInput,

    /// The boundary window length does not align with the rounding unit.
    #[error("start/end window of {minutes} min must be a multiple of {unit} min")]
    MisalignedStartEnd { minutes: i64, unit: i64 },

    /// `nonduplicate` rounding only makes sense for calendar events, where
    /// an overlap context exists before conversion.
    #[error("nonduplicate rounding is not supported for schedule conversion")]
    UnsupportedScheduleRounding,
}

/// Cross-field invariant violations in the data model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The interval's bounds are inverted.
    #[error("end {end} is before start {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Paid leave is a kind of holiday; the flags must agree.
    #[error("paid leave requires the holiday flag")]
    PaidLeaveWithoutHoliday,
}

/// A policy string that matches no known variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseVariantError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Failures of the rounding engine itself (not of a single interval).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoundingError {
    /// `nonduplicate` rounding was invoked without overlap context.
    #[error("nonduplicate rounding requires an overlap context")]
    MissingContext,
}

/// A raw schedule that cannot be turned into work events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Holiday rows, parse-error rows and open-ended rows carry no workable
    /// window.
    #[error("schedule has no workable window: {reason}")]
    NotWorkable { reason: String },

    #[error(transparent)]
    Rounding(#[from] RoundingError),
}
