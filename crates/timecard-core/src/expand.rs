//! Spreading events across calendar dates.
//!
//! Two expansions happen before rounding: recurring events are copied onto
//! each recorded recurrence date, and events whose interval crosses
//! midnight are cut into one slice per calendar day.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::event::Event;
use crate::span::{day_cutoff, midnight, TimeSpan};

/// Copies of a recurring event, one per recurrence date.
///
/// The event's own base date is skipped. Each copy keeps the original
/// time of day, carries a fresh identity and no recurrence of its own.
pub fn recurrence_copies(event: &Event) -> Vec<Event> {
    let Some(recurrence) = &event.recurrence else {
        return Vec::new();
    };

    let mut result = Vec::new();
    for &date in recurrence {
        if date == event.base_date() {
            continue;
        }
        let start = date.and_time(event.span.start.time()).and_utc();
        let end = date.and_time(event.span.end.time()).and_utc();
        match TimeSpan::new(start, end) {
            Ok(span) => {
                let mut copy = event.rescheduled_unique(span);
                copy.recurrence = None;
                result.push(copy);
            }
            Err(error) => {
                // A midnight-crossing event cannot be replayed onto a
                // single recurrence date.
                tracing::warn!(
                    name = %event.name,
                    date = %date,
                    %error,
                    "recurrence copy would invert its interval, skipping",
                );
            }
        }
    }
    result
}

/// Cuts every midnight-crossing event into per-day slices.
///
/// The first slice keeps the event's identity and runs to the day cutoff;
/// the continuation slices get fresh identities and run from midnight to
/// the cutoff, or to the real end on the final day.
pub fn split_multi_day(
    event_map: BTreeMap<NaiveDate, Vec<Event>>,
    unit: i64,
) -> BTreeMap<NaiveDate, Vec<Event>> {
    let mut result: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();

    for (date, events) in event_map {
        for event in events {
            result.entry(date).or_default();

            let end_date = event.span.end.date_naive();
            if end_date == date {
                if let Some(day) = result.get_mut(&date) {
                    day.push(event);
                }
                continue;
            }

            let cutoff = day_cutoff(date, unit);
            if event.span.start < cutoff {
                let first = event.rescheduled(TimeSpan {
                    start: event.span.start,
                    end: cutoff,
                });
                if let Some(day) = result.get_mut(&date) {
                    day.push(first);
                }
            } else {
                tracing::warn!(
                    name = %event.name,
                    start = %event.span.start,
                    "first-day slice starts past the day cutoff, dropping it",
                );
            }

            for offset in 1..=(end_date - date).num_days() {
                let day = date + Duration::days(offset);
                let span = if day == end_date {
                    TimeSpan {
                        start: midnight(day),
                        end: event.span.end,
                    }
                } else {
                    TimeSpan {
                        start: midnight(day),
                        end: day_cutoff(day, unit),
                    }
                };
                let mut slice = event.rescheduled_unique(span);
                slice.recurrence = None;
                result.entry(day).or_default().push(slice);
            }
        }
    }

    result
}
