//! Raw work-presence rows as handed over by the attendance-document parser.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::span::TimeSpan;

/// One raw presence interval for a day: either a workable `start..end`
/// window, a holiday marker, or a row the parser could not read
/// (`error_message` set, bounds unreliable).
///
/// Invariants: `start <= end` when both bounds are set, and
/// `is_paid_leave` implies `is_holiday`. The constructors uphold them;
/// [`Schedule::validate`] re-checks manually built values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub is_paid_leave: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Schedule {
    /// A plain working window.
    pub fn working(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ModelError> {
        if end < start {
            return Err(ModelError::EndBeforeStart { start, end });
        }
        Ok(Self {
            start,
            end: Some(end),
            is_holiday: false,
            is_paid_leave: false,
            error_message: None,
        })
    }

    /// A window whose end is not known yet.
    pub fn open(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            is_holiday: false,
            is_paid_leave: false,
            error_message: None,
        }
    }

    /// A holiday row; `paid_leave` marks it as paid leave (which is always
    /// also a holiday).
    pub fn holiday(start: DateTime<Utc>, paid_leave: bool) -> Self {
        Self {
            start,
            end: None,
            is_holiday: true,
            is_paid_leave: paid_leave,
            error_message: None,
        }
    }

    /// A row the document parser failed on.
    pub fn faulted(start: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            start,
            end: None,
            is_holiday: false,
            is_paid_leave: false,
            error_message: Some(message.into()),
        }
    }

    /// Re-checks the cross-field invariants on a manually built value.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.is_paid_leave && !self.is_holiday {
            return Err(ModelError::PaidLeaveWithoutHoliday);
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(ModelError::EndBeforeStart {
                    start: self.start,
                    end,
                });
            }
        }
        Ok(())
    }

    /// The bounded interval, when both bounds are set.
    pub fn span(&self) -> Option<TimeSpan> {
        self.end.map(|end| TimeSpan {
            start: self.start,
            end,
        })
    }

    pub fn duration(&self) -> Option<Duration> {
        self.span().map(|s| s.duration())
    }

    /// The calendar date this row belongs to.
    pub fn base_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Strict same-date overlap; rows lacking an end never overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self.span(), other.span()) {
            (Some(a), Some(b)) => a.overlaps(&b),
            _ => false,
        }
    }

    /// Whether this row can be converted into work events: not a holiday,
    /// not a parse failure, and fully bounded.
    pub fn is_workable(&self) -> bool {
        !self.is_holiday && self.error_message.is_none() && self.end.is_some()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_date().format("%Y-%m-%d"))?;
        if self.is_paid_leave {
            write!(f, " [paid leave]")?;
        } else if self.is_holiday {
            write!(f, " [holiday]")?;
        }
        write!(f, " {}", self.start.format("%H:%M"))?;
        match self.end {
            Some(end) if end.date_naive() != self.base_date() => {
                write!(f, " - {}", end.format("%Y-%m-%d %H:%M"))?;
            }
            Some(end) => write!(f, " - {}", end.format("%H:%M"))?,
            None => write!(f, " - ??:??")?,
        }
        if let Some(message) = &self.error_message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}
