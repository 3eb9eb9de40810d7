//! Fitting calendar events between the day's work boundaries.
//!
//! Each date's work markers frame the working hours: events entirely
//! outside the frame are discarded, events straddling a boundary are
//! clipped to it, and a boundary whose window an event already covers is
//! dropped in favour of that event.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::event::Event;
use crate::span::TimeSpan;

/// Merges per-date work markers with that date's calendar events.
///
/// Only dates that have work markers appear in the result; a date needs at
/// least a start and an end marker to be processed.
pub fn merge_boundary_events(
    schedule_map: BTreeMap<NaiveDate, Vec<Event>>,
    event_map: &BTreeMap<NaiveDate, Vec<Event>>,
) -> BTreeMap<NaiveDate, Vec<Event>> {
    let mut result = BTreeMap::new();

    for (date, mut boundary) in schedule_map {
        boundary.sort_by_key(|event| event.span.start);
        let [start_item, middles @ .., end_item] = boundary.as_slice() else {
            tracing::warn!(
                %date,
                count = boundary.len(),
                "fewer than two work markers, skipping date",
            );
            continue;
        };

        let mut merged = Vec::new();
        match event_map.get(&date) {
            Some(events) if !events.is_empty() => {
                let mut start_covered = false;
                let mut end_covered = false;

                for event in events {
                    if start_item.span.start >= event.span.end
                        || end_item.span.end <= event.span.start
                    {
                        // Entirely outside working hours.
                        continue;
                    }

                    let mut fitted = event.clone();
                    if start_item.span.overlaps(&fitted.span) {
                        start_covered = true;
                        fitted = fitted.rescheduled(TimeSpan {
                            start: start_item.span.start,
                            end: fitted.span.end,
                        });
                    }
                    if end_item.span.overlaps(&fitted.span) {
                        end_covered = true;
                        fitted = fitted.rescheduled(TimeSpan {
                            start: fitted.span.start,
                            end: end_item.span.end,
                        });
                    }
                    merged.push(fitted);
                }

                if !start_covered {
                    merged.push(start_item.clone());
                }
                if !end_covered {
                    merged.push(end_item.clone());
                }
                merged.extend(middles.iter().cloned());
                merged.sort_by_key(|event| event.span.start);
            }
            _ => {
                merged.push(start_item.clone());
                merged.extend(middles.iter().cloned());
                merged.push(end_item.clone());
            }
        }

        result.insert(date, merged);
    }

    result
}
