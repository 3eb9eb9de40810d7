//! Greedy duplicate resolution.
//!
//! Overlapping events on one date are flattened into a strictly ordered,
//! overlap-free sequence. A cursor walks the timeline; each step picks the
//! next surviving event, trimming candidates that the cursor already
//! covers and truncating the pick where a preferred competitor starts.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::TimeCompare;
use crate::event::Event;
use crate::span::TimeSpan;

fn sort_events(events: &mut [Event], compare: TimeCompare) {
    match compare {
        TimeCompare::Small => events.sort_by_key(|e| (e.span.start, e.duration())),
        TimeCompare::Large => events.sort_by_key(|e| (e.span.start, Reverse(e.duration()))),
    }
}

/// Picks the event that follows `cursor` on the timeline.
///
/// Without a cursor this is the first event in `compare` order. With one,
/// candidates ending at or before the cursor are out; candidates the
/// cursor overlaps are trimmed to begin where the cursor ends. When the
/// pick itself contends with overlapping candidates, the `compare`
/// direction decides: a preferred competitor truncates the pick at its
/// own start.
pub fn search_next(
    cursor: Option<&Event>,
    events: &[Event],
    compare: TimeCompare,
) -> Option<Event> {
    if events.is_empty() {
        return None;
    }

    let mut candidates: Vec<Event> = match cursor {
        None => events.to_vec(),
        Some(current) => events
            .iter()
            .filter(|event| event.span.end > current.span.end)
            .filter_map(|event| {
                if current.span.overlaps(&event.span) {
                    let trimmed = TimeSpan {
                        start: current.span.end,
                        end: event.span.end,
                    };
                    (trimmed.start != trimmed.end).then(|| event.rescheduled(trimmed))
                } else {
                    Some(event.clone())
                }
            })
            .collect(),
    };
    if candidates.is_empty() {
        return None;
    }
    sort_events(&mut candidates, compare);

    let next_target = candidates[0].clone();
    let mut contenders: Vec<&Event> = candidates
        .iter()
        .filter(|event| event.span.overlaps(&next_target.span))
        .collect();
    if contenders.is_empty() {
        return Some(next_target);
    }

    match compare {
        TimeCompare::Small => contenders.sort_by_key(|e| e.duration()),
        TimeCompare::Large => contenders.sort_by_key(|e| Reverse(e.duration())),
    }
    let preferred = contenders[0];
    if next_target.duration() <= preferred.duration() {
        return Some(next_target);
    }
    let truncated = TimeSpan {
        start: next_target.span.start,
        end: preferred.span.start,
    };
    Some(next_target.rescheduled(truncated))
}

/// Resolves each date's events into an overlap-free ordered sequence.
pub fn resolve_duplicates(
    event_map: BTreeMap<NaiveDate, Vec<Event>>,
    compare: TimeCompare,
) -> BTreeMap<NaiveDate, Vec<Event>> {
    let mut result = BTreeMap::new();

    for (date, mut events) in event_map {
        if events.is_empty() {
            tracing::warn!(%date, "no events to resolve, skipping date");
            continue;
        }
        sort_events(&mut events, compare);

        let mut resolved: Vec<Event> = Vec::new();
        let mut cursor: Option<Event> = None;
        while let Some(next) = search_next(cursor.as_ref(), &events, compare) {
            events.retain(|event| event.id != next.id);
            resolved.push(next.clone());
            cursor = Some(next);
        }
        result.insert(date, resolved);
    }

    result
}
