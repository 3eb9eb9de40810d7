//! Fully-bounded time intervals and the strict overlap predicate.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A fully-bounded interval.
///
/// Invariant: `start <= end`. [`TimeSpan::new`] enforces it for callers;
/// crate-internal code may build literals where the ordering is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    /// Creates a span, rejecting inverted bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ModelError> {
        if end < start {
            return Err(ModelError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// The calendar date this span is attributed to (the start's date).
    pub fn base_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Strict overlap: spans attributed to different dates never overlap,
    /// and touching endpoints do not count as overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.base_date() != other.base_date() {
            return false;
        }
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// Midnight at the start of `date`.
pub(crate) fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Where a day's fill/split window ends: 23:00 plus one rounding unit
/// (23:30 for the 30-minute unit). Ending at 23:59:59 would make the last
/// slice of a day overlap the first slice of the next, so the final
/// `60 - unit` minutes of every day stay structurally unreachable.
pub(crate) fn day_cutoff(date: NaiveDate, unit: i64) -> DateTime<Utc> {
    midnight(date) + Duration::minutes(23 * 60 + unit)
}
