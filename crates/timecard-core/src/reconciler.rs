//! The reconciliation pipeline.
//!
//! [`Reconciler`] turns raw calendar events and work-presence schedules
//! into per-date [`DayTask`] timelines: events are replayed onto their
//! recurrence dates, cut at midnight, snapped to the rounding grid,
//! framed by work markers derived from the schedules, flattened into an
//! overlap-free sequence and finally screened for validity.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::config::{EventInputInfo, ScheduleInputInfo, ROUNDING_UNIT_MINUTES};
use crate::convert::schedule_to_events;
use crate::error::ConfigError;
use crate::event::Event;
use crate::expand::{recurrence_copies, split_multi_day};
use crate::merge::merge_boundary_events;
use crate::resolve::resolve_duplicates;
use crate::rounding::{round_span, RoundingMode};
use crate::schedule::Schedule;
use crate::task::{DayTask, Project};

/// Events longer than this many hours are treated as bogus.
const MAX_EVENT_HOURS: i64 = 6;
/// Events that ended more than this many days ago are no longer billable.
const MAX_EVENT_AGE_DAYS: i64 = 30;

/// Reconciles calendar events and presence schedules for one project.
#[derive(Debug, Clone)]
pub struct Reconciler {
    project: Project,
    event_input: EventInputInfo,
    schedule_input: ScheduleInputInfo,
}

impl Reconciler {
    /// Builds a reconciler, validating the schedule settings.
    pub fn new(
        project: Project,
        event_input: EventInputInfo,
        schedule_input: Option<ScheduleInputInfo>,
    ) -> Result<Self, ConfigError> {
        let schedule_input = schedule_input.ok_or(ConfigError::MissingScheduleInput)?;
        if schedule_input.start_end_minutes % ROUNDING_UNIT_MINUTES != 0 {
            return Err(ConfigError::MisalignedStartEnd {
                minutes: schedule_input.start_end_minutes,
                unit: ROUNDING_UNIT_MINUTES,
            });
        }
        if schedule_input.rounding_mode == RoundingMode::NonDuplicate {
            return Err(ConfigError::UnsupportedScheduleRounding);
        }
        Ok(Self {
            project,
            event_input,
            schedule_input,
        })
    }

    /// Reconciles against the current wall clock.
    pub fn day_tasks(&self, events: Vec<Event>, schedules: &[Schedule]) -> Vec<DayTask> {
        self.day_tasks_at(events, schedules, Utc::now())
    }

    /// Reconciles with an explicit `now`, which anchors the validity
    /// screen (future events and events older than the billing horizon
    /// are dropped).
    pub fn day_tasks_at(
        &self,
        mut events: Vec<Event>,
        schedules: &[Schedule],
        now: DateTime<Utc>,
    ) -> Vec<DayTask> {
        let unit = ROUNDING_UNIT_MINUTES;

        if events.is_empty() {
            tracing::warn!("no calendar events to reconcile");
        }
        if schedules.is_empty() {
            tracing::warn!("no work schedules to reconcile");
        }
        let Some((min_date, max_date)) = schedule_date_range(schedules) else {
            return Vec::new();
        };

        events.sort_by_key(Event::base_date);
        let mut day_map: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
        for event in events {
            let copies = recurrence_copies(&event);
            day_map.entry(event.base_date()).or_default().push(event);
            for copy in copies {
                day_map.entry(copy.base_date()).or_default().push(copy);
            }
        }
        // Events outside the scheduled period are not billable.
        day_map.retain(|date, _| (min_date..=max_date).contains(date));

        let day_map = split_multi_day(day_map, unit);
        let rounded_map = self.round_events(day_map, unit);

        let context: Vec<Event> = rounded_map.values().flatten().cloned().collect();
        let mut schedule_map: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
        for schedule in schedules {
            if !schedule.is_workable() {
                tracing::warn!(schedule = %schedule, "schedule is not workable, skipping");
                continue;
            }
            match schedule_to_events(schedule, &self.schedule_input, unit, &context) {
                Ok(markers) => {
                    for marker in markers {
                        schedule_map
                            .entry(marker.base_date())
                            .or_default()
                            .push(marker);
                    }
                }
                Err(error) => {
                    tracing::error!(
                        schedule = %schedule,
                        %error,
                        "failed to derive work markers, skipping schedule",
                    );
                }
            }
        }

        let merged = merge_boundary_events(schedule_map, &rounded_map);
        let resolved = resolve_duplicates(merged, self.event_input.time_compare);

        resolved
            .into_iter()
            .map(|(date, events)| {
                let (schedule_events, events): (Vec<Event>, Vec<Event>) =
                    filter_valid(events, now, unit)
                        .into_iter()
                        .partition(|event| event.working_type.is_some());
                DayTask {
                    base_date: date,
                    project: self.project.clone(),
                    events,
                    schedule_events,
                }
            })
            .collect()
    }

    /// Snaps every event to the grid, each against its date's other events.
    fn round_events(
        &self,
        day_map: BTreeMap<NaiveDate, Vec<Event>>,
        unit: i64,
    ) -> BTreeMap<NaiveDate, Vec<Event>> {
        let mut rounded_map = BTreeMap::new();
        for (date, events) in day_map {
            let mut rounded = Vec::new();
            for event in &events {
                let context: Vec<Event> = events
                    .iter()
                    .filter(|other| other.id != event.id)
                    .cloned()
                    .collect();
                match round_span(
                    event.span,
                    self.event_input.rounding_mode,
                    unit,
                    Some(&context),
                ) {
                    Ok(Some(span)) => rounded.push(event.rescheduled(span)),
                    Ok(None) => {}
                    Err(error) => {
                        tracing::error!(name = %event.name, %error, "failed to round event, dropping");
                    }
                }
            }
            rounded_map.insert(date, rounded);
        }
        rounded_map
    }
}

fn schedule_date_range(schedules: &[Schedule]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = schedules.iter().map(Schedule::base_date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(min, max), date| {
        (min.min(date), max.max(date))
    }))
}

/// Screens out events that cannot be billed as of `now`.
fn filter_valid(events: Vec<Event>, now: DateTime<Utc>, unit: i64) -> Vec<Event> {
    let horizon = now - Duration::days(MAX_EVENT_AGE_DAYS);
    events
        .into_iter()
        .filter(|event| {
            let duration = event.duration();
            if duration > Duration::hours(MAX_EVENT_HOURS) {
                tracing::error!(name = %event.name, start = %event.span.start, "event exceeds the hour limit, dropping");
                return false;
            }
            if now < event.span.end {
                tracing::error!(name = %event.name, end = %event.span.end, "event has not finished yet, dropping");
                return false;
            }
            if event.span.end < horizon {
                tracing::error!(name = %event.name, end = %event.span.end, "event is past the billing horizon, dropping");
                return false;
            }
            if event.span.start == event.span.end || duration < Duration::minutes(unit) {
                tracing::error!(name = %event.name, start = %event.span.start, "event is shorter than one grid cell, dropping");
                return false;
            }
            true
        })
        .collect()
}
