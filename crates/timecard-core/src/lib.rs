//! Core reconciliation logic for the timecard engine.
//!
//! This crate contains the fundamental types and logic for:
//! - Rounding: snapping event intervals to a fixed grid of cells
//! - Conversion: deriving work markers from presence schedules
//! - Reconciliation: merging events and markers into per-day,
//!   overlap-free billable timelines

mod convert;
mod expand;
mod merge;
mod reconciler;
mod resolve;

pub mod config;
pub mod error;
pub mod event;
pub mod rounding;
pub mod schedule;
pub mod span;
pub mod task;

pub use config::{
    EventInputInfo, ROUNDING_UNIT_MINUTES, ScheduleInputInfo, StartEndKind, TimeCompare,
};
pub use convert::schedule_to_events;
pub use error::{ConfigError, ConvertError, ModelError, ParseVariantError, RoundingError};
pub use expand::{recurrence_copies, split_multi_day};
pub use merge::merge_boundary_events;
pub use resolve::{resolve_duplicates, search_next};
pub use event::{Event, EventId, WorkingEventType};
pub use reconciler::Reconciler;
pub use rounding::{RoundDirection, RoundingMode, round_span, round_time};
pub use schedule::Schedule;
pub use span::TimeSpan;
pub use task::{DayTask, Project};
