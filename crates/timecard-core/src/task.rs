//! Per-day reconciliation output.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// The billing project a timeline is reconciled for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
        }
    }
}

/// One day's reconciled timeline: calendar events and the work markers
/// derived from the presence schedule, kept apart so downstream reporting
/// can bill them differently.
///
/// Within a day the union of both lists is overlap-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTask {
    pub base_date: NaiveDate,
    pub project: Project,
    /// Ordinary calendar events that survived rounding and validity checks.
    pub events: Vec<Event>,
    /// Derived work-start/middle/end markers.
    pub schedule_events: Vec<Event>,
}

impl DayTask {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.schedule_events.is_empty()
    }
}
