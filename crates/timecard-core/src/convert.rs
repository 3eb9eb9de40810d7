//! Deriving work markers from a presence schedule.
//!
//! A workable schedule row yields a `work-start` and/or `work-end` marker
//! spanning the configured boundary window, and in fill mode additional
//! `work-ongoing` markers covering every grid cell between the two
//! boundaries that no existing event claims.

use chrono::Duration;

use crate::config::{ScheduleInputInfo, StartEndKind};
use crate::error::ConvertError;
use crate::event::{Event, WorkingEventType};
use crate::rounding::{round_span, RoundingMode};
use crate::schedule::Schedule;
use crate::span::{day_cutoff, midnight, TimeSpan};

fn workable_span(schedule: &Schedule) -> Result<TimeSpan, ConvertError> {
    if schedule.is_holiday {
        return Err(ConvertError::NotWorkable {
            reason: "holiday".to_owned(),
        });
    }
    if let Some(message) = &schedule.error_message {
        return Err(ConvertError::NotWorkable {
            reason: format!("unparsable row: {message}"),
        });
    }
    schedule.span().ok_or_else(|| ConvertError::NotWorkable {
        reason: "no end time recorded".to_owned(),
    })
}

/// Rounds a boundary window, retrying once with a doubled window when the
/// first attempt collapses.
fn rounded_window(
    window: TimeSpan,
    retry: TimeSpan,
    mode: RoundingMode,
    unit: i64,
    context: &[Event],
) -> Result<Option<TimeSpan>, ConvertError> {
    match round_span(window, mode, unit, Some(context))? {
        Some(span) => Ok(Some(span)),
        None => Ok(round_span(retry, mode, unit, Some(context))?),
    }
}

/// Converts one workable schedule row into work markers.
///
/// `context` holds the date's already-rounded calendar events; fill cells
/// overlapping any of them are withheld. The emitted markers may cross
/// date boundaries when the schedule does; callers group them by base
/// date afterwards.
pub fn schedule_to_events(
    schedule: &Schedule,
    info: &ScheduleInputInfo,
    unit: i64,
    context: &[Event],
) -> Result<Vec<Event>, ConvertError> {
    let window = workable_span(schedule)?;
    let minutes = info.start_end_minutes;
    let mode = info.rounding_mode;
    let mut result = Vec::new();

    let start_span = if info.start_end_kind.wants_start() {
        let first = TimeSpan {
            start: window.start,
            end: window.start + Duration::minutes(minutes),
        };
        let retry = TimeSpan {
            start: window.start,
            end: window.start + Duration::minutes(minutes * 2),
        };
        match rounded_window(first, retry, mode, unit, context)? {
            Some(mut span) => {
                // Stretch can widen past the configured window.
                if span.duration() > Duration::minutes(minutes) {
                    span.end = span.start + Duration::minutes(minutes);
                }
                result.push(Event::work_marker("work-start", span, WorkingEventType::Start));
                Some(span)
            }
            None => {
                tracing::error!(schedule = %schedule, "work-start window failed to round");
                None
            }
        }
    } else {
        None
    };

    let end_span = if info.start_end_kind.wants_end() {
        let first = TimeSpan {
            start: window.end - Duration::minutes(minutes),
            end: window.end,
        };
        let retry = TimeSpan {
            start: window.end - Duration::minutes(minutes * 2),
            end: window.end,
        };
        match rounded_window(first, retry, mode, unit, context)? {
            Some(mut span) => {
                if span.duration() > Duration::minutes(unit) {
                    span.start = span.end - Duration::minutes(unit);
                }
                result.push(Event::work_marker("work-end", span, WorkingEventType::End));
                Some(span)
            }
            None => {
                tracing::error!(schedule = %schedule, "work-end window failed to round");
                None
            }
        }
    } else {
        None
    };

    if info.start_end_kind == StartEndKind::Fill {
        let (Some(start_span), Some(end_span)) = (start_span, end_span) else {
            tracing::warn!(
                schedule = %schedule,
                "gap fill needs both boundary markers, skipping",
            );
            return Ok(result);
        };
        result.extend(
            fill_gaps(start_span, end_span, unit, context)
                .into_iter()
                .map(|span| Event::work_marker("work-ongoing", span, WorkingEventType::Middle)),
        );
    }

    Ok(result)
}

/// Grid cells between the boundary markers that no context event claims,
/// with runs of adjacent cells merged into one span.
fn fill_gaps(
    start_span: TimeSpan,
    end_span: TimeSpan,
    unit: i64,
    context: &[Event],
) -> Vec<TimeSpan> {
    let first_day = start_span.base_date();
    let last_day = end_span.end.date_naive();

    let mut merged: Vec<TimeSpan> = Vec::new();
    for offset in 0..=(last_day - first_day).num_days() {
        let day = first_day + Duration::days(offset);
        let fill_start = if offset == 0 {
            day.and_time(start_span.end.time()).and_utc()
        } else {
            midnight(day)
        };
        let fill_end = if day == end_span.base_date() {
            day.and_time(end_span.start.time()).and_utc()
        } else {
            day_cutoff(day, unit)
        };

        let cell_count = ((fill_end - fill_start).num_minutes() / unit).max(0);
        for index in 0..cell_count {
            let cell = TimeSpan {
                start: fill_start + Duration::minutes(index * unit),
                end: fill_start + Duration::minutes((index + 1) * unit),
            };
            if context.iter().any(|event| event.span.overlaps(&cell)) {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.end == cell.start => last.end = cell.end,
                _ => merged.push(cell),
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    const UNIT: i64 = 30;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 18, hour, min, 0).unwrap()
    }

    fn at_on(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, min, 0).unwrap()
    }

    fn span(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeSpan {
        TimeSpan::new(start, end).expect("valid test span")
    }

    fn info(kind: StartEndKind, mode: RoundingMode) -> ScheduleInputInfo {
        ScheduleInputInfo {
            rounding_mode: mode,
            start_end_minutes: 30,
            start_end_kind: kind,
        }
    }

    fn convert(schedule: &Schedule, info: &ScheduleInputInfo, context: &[Event]) -> Vec<Event> {
        schedule_to_events(schedule, info, UNIT, context).expect("workable schedule")
    }

    fn sorted_spans(events: &[Event]) -> Vec<TimeSpan> {
        let mut spans: Vec<TimeSpan> = events.iter().map(|e| e.span).collect();
        spans.sort_by_key(|s| s.start);
        spans
    }

    #[test]
    fn unworkable_rows_are_rejected() {
        let holiday = Schedule::holiday(at(0, 0), false);
        let open = Schedule::open(at(9, 0));
        let faulted = Schedule::faulted(at(9, 0), "unreadable row");
        let cfg = info(StartEndKind::Both, RoundingMode::Backward);

        for row in [holiday, open, faulted] {
            let err = schedule_to_events(&row, &cfg, UNIT, &[]).unwrap_err();
            assert!(matches!(err, ConvertError::NotWorkable { .. }));
        }
    }

    #[test]
    fn start_only_and_end_only() {
        let schedule = Schedule::working(at(8, 52), at(18, 12)).unwrap();

        let starts = convert(&schedule, &info(StartEndKind::Start, RoundingMode::Backward), &[]);
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].working_type, Some(WorkingEventType::Start));
        assert_eq!(starts[0].span, span(at(9, 0), at(9, 30)));
        assert_eq!(starts[0].name, "work-start");
        assert_eq!(starts[0].organizer, "automatic");

        let ends = convert(&schedule, &info(StartEndKind::End, RoundingMode::Backward), &[]);
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].working_type, Some(WorkingEventType::End));
        assert_eq!(ends[0].span, span(at(18, 0), at(18, 30)));
    }

    #[test]
    fn boundary_windows_per_rounding_mode() {
        let schedule = Schedule::working(at(8, 52), at(18, 12)).unwrap();
        let both = |mode| convert(&schedule, &info(StartEndKind::Both, mode), &[]);

        let backward = both(RoundingMode::Backward);
        assert_eq!(backward[0].span, span(at(9, 0), at(9, 30)));
        assert_eq!(backward[1].span, span(at(18, 0), at(18, 30)));

        let forward = both(RoundingMode::Forward);
        assert_eq!(forward[0].span, span(at(8, 30), at(9, 0)));
        assert_eq!(forward[1].span, span(at(17, 30), at(18, 0)));

        // Both windows collapse on the first attempt and succeed on the
        // doubled retry window.
        let round = both(RoundingMode::Round);
        assert_eq!(round[0].span, span(at(9, 0), at(9, 30)));
        assert_eq!(round[1].span, span(at(17, 30), at(18, 0)));

        // Stretch widens past the window and gets clamped back.
        let stretch = both(RoundingMode::Stretch);
        assert_eq!(stretch[0].span, span(at(8, 30), at(9, 0)));
        assert_eq!(stretch[1].span, span(at(18, 0), at(18, 30)));
    }

    #[test]
    fn markers_follow_a_midnight_crossing_schedule() {
        let schedule = Schedule::working(at(21, 0), at_on(20, 3, 45)).unwrap();
        let events = convert(
            &schedule,
            &info(StartEndKind::Both, RoundingMode::Backward),
            &[],
        );

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].working_type, Some(WorkingEventType::Start));
        assert_eq!(events[0].span, span(at(21, 0), at(21, 30)));
        assert_eq!(events[1].working_type, Some(WorkingEventType::End));
        assert_eq!(events[1].span, span(at_on(20, 3, 30), at_on(20, 4, 0)));
    }

    #[test]
    fn fill_covers_whole_days_up_to_the_cutoff() {
        let schedule = Schedule::working(at(8, 52), at_on(20, 20, 36)).unwrap();
        let events = convert(&schedule, &info(StartEndKind::Fill, RoundingMode::Stretch), &[]);

        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|e| e.working_type.is_some()));
        assert_eq!(
            sorted_spans(&events),
            vec![
                span(at(8, 30), at(9, 0)),
                span(at(9, 0), at(23, 30)),
                span(at_on(19, 0, 0), at_on(19, 23, 30)),
                span(at_on(20, 0, 0), at_on(20, 20, 30)),
                span(at_on(20, 20, 30), at_on(20, 21, 0)),
            ]
        );
    }

    #[test]
    fn fill_skips_cells_claimed_by_events() {
        let schedule = Schedule::working(at(8, 52), at(20, 36)).unwrap();
        let context = [
            Event::new("a", "alice", span(at(9, 0), at(9, 30))),
            Event::new("b", "alice", span(at(10, 0), at(11, 0))),
            Event::new("c", "alice", span(at(12, 30), at(13, 30))),
            Event::new("d", "alice", span(at(13, 30), at(15, 0))),
            Event::new("e", "alice", span(at(16, 30), at(17, 0))),
            Event::new("f", "alice", span(at(16, 30), at(17, 30))),
        ];

        let events = convert(&schedule, &info(StartEndKind::Fill, RoundingMode::Round), &context);

        assert_eq!(events.len(), 6);
        assert!(events.iter().all(|e| e.working_type.is_some()));
        assert_eq!(
            sorted_spans(&events),
            vec![
                span(at(9, 0), at(9, 30)),
                span(at(9, 30), at(10, 0)),
                span(at(11, 0), at(12, 30)),
                span(at(15, 0), at(16, 30)),
                span(at(17, 30), at(20, 0)),
                span(at(20, 0), at(20, 30)),
            ]
        );
    }
}
