//! Calendar events and the work markers derived from presence schedules.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseVariantError;
use crate::span::TimeSpan;

/// Classification of events derived from a work-presence schedule.
/// Ordinary calendar events carry no working type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkingEventType {
    /// Marks the start of the workday.
    Start,
    /// Fills a gap between ordinary events during work hours.
    Middle,
    /// Marks the end of the workday.
    End,
}

impl WorkingEventType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

impl fmt::Display for WorkingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkingEventType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "middle" => Ok(Self::Middle),
            "end" => Ok(Self::End),
            _ => Err(ParseVariantError::new("working event type", s)),
        }
    }
}

/// Opaque stable identity for an event.
///
/// Identity survives rescheduling but is regenerated for recurrence and
/// day-split copies, so history lookups keyed by id do not collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generates a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A calendar appointment or a derived work marker, always fully bounded.
///
/// Events are value-like: any time shift produces a new instance via
/// [`Event::rescheduled`] or [`Event::rescheduled_unique`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub organizer: String,
    pub location: String,
    pub is_private: bool,
    pub is_cancelled: bool,
    pub span: TimeSpan,
    pub id: EventId,
    /// Past dates this event also occurred on, excluding its own base date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<NaiveDate>>,
    /// `None` for ordinary calendar events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_type: Option<WorkingEventType>,
}

impl Event {
    /// An ordinary calendar event with a fresh identity.
    pub fn new(name: impl Into<String>, organizer: impl Into<String>, span: TimeSpan) -> Self {
        Self {
            name: name.into(),
            organizer: organizer.into(),
            location: String::new(),
            is_private: false,
            is_cancelled: false,
            span,
            id: EventId::generate(),
            recurrence: None,
            working_type: None,
        }
    }

    /// A derived work boundary or fill marker.
    pub(crate) fn work_marker(name: &str, span: TimeSpan, working_type: WorkingEventType) -> Self {
        Self {
            name: name.to_owned(),
            organizer: "automatic".to_owned(),
            location: String::new(),
            is_private: false,
            is_cancelled: false,
            span,
            id: EventId::generate(),
            recurrence: None,
            working_type: Some(working_type),
        }
    }

    pub fn base_date(&self) -> NaiveDate {
        self.span.base_date()
    }

    pub fn duration(&self) -> Duration {
        self.span.duration()
    }

    /// Content equality: two events describe the same appointment when
    /// name, organizer, working type and privacy flag match. Identity and
    /// interval deliberately play no part.
    pub fn same(&self, other: &Self) -> bool {
        self.content_key() == other.content_key()
    }

    fn content_key(&self) -> (&str, &str, Option<WorkingEventType>, bool) {
        (
            &self.name,
            &self.organizer,
            self.working_type,
            self.is_private,
        )
    }

    /// A copy of this event over a different interval, keeping its identity.
    pub fn rescheduled(&self, span: TimeSpan) -> Self {
        Self {
            span,
            ..self.clone()
        }
    }

    /// A copy over a different interval with a fresh identity.
    pub fn rescheduled_unique(&self, span: TimeSpan) -> Self {
        Self {
            span,
            id: EventId::generate(),
            ..self.clone()
        }
    }
}
