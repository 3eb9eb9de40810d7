//! Snapping intervals to the rounding grid.
//!
//! All produced timelines live on a fixed grid of
//! [`ROUNDING_UNIT_MINUTES`](crate::ROUNDING_UNIT_MINUTES)-minute cells.
//! Bounds already on the grid are never moved; an interval that collapses
//! below one cell after rounding is dropped rather than emitted.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoundingError;
use crate::event::Event;
use crate::span::TimeSpan;

/// Which way a single bound moves off the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDirection {
    /// To the next grid line.
    Up,
    /// To the previous grid line.
    Down,
}

/// Policy for snapping an interval's bounds to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Both bounds up: the interval shifts later.
    Backward,
    /// Both bounds down: the interval shifts earlier.
    Forward,
    /// Start up, end down: the interval shrinks.
    Round,
    /// Start down, end up: the interval grows.
    Stretch,
    /// Each bound to its nearest grid line, half a cell rounding up.
    Half,
    /// Grow where the surrounding events leave room, shrink where they
    /// do not. Needs an overlap context.
    NonDuplicate,
}

impl RoundingMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Backward => "backward",
            Self::Forward => "forward",
            Self::Round => "round",
            Self::Stretch => "stretch",
            Self::Half => "half",
            Self::NonDuplicate => "nonduplicate",
        }
    }
}

impl std::fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = crate::error::ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backward" => Ok(Self::Backward),
            "forward" => Ok(Self::Forward),
            "round" => Ok(Self::Round),
            "stretch" => Ok(Self::Stretch),
            "half" => Ok(Self::Half),
            "nonduplicate" => Ok(Self::NonDuplicate),
            _ => Err(crate::error::ParseVariantError::new("rounding mode", s)),
        }
    }
}

/// Moves a timestamp to the grid. On-grid timestamps are returned as-is.
pub fn round_time(time: DateTime<Utc>, direction: RoundDirection, unit: i64) -> DateTime<Utc> {
    let rem = i64::from(time.minute()) % unit;
    if rem == 0 {
        return time;
    }
    match direction {
        RoundDirection::Up => time + Duration::minutes(unit - rem),
        RoundDirection::Down => time - Duration::minutes(rem),
    }
}

fn overlaps_any(probe: &TimeSpan, context: &[Event]) -> bool {
    context.iter().any(|event| event.span.overlaps(probe))
}

/// Snaps a span to the grid under `mode`.
///
/// Returns `Ok(None)` when the rounded interval collapses to less than one
/// grid cell. `context` is required for [`RoundingMode::NonDuplicate`] and
/// ignored otherwise; the span under adjustment must not itself be part of
/// the context, or it will collide with its own unrounded interval.
pub fn round_span(
    span: TimeSpan,
    mode: RoundingMode,
    unit: i64,
    context: Option<&[Event]>,
) -> Result<Option<TimeSpan>, RoundingError> {
    let start_off_grid = i64::from(span.start.minute()) % unit != 0;
    let end_off_grid = i64::from(span.end.minute()) % unit != 0;
    if !start_off_grid && !end_off_grid {
        return Ok(Some(span));
    }

    let mut start = span.start;
    let mut end = span.end;
    match mode {
        RoundingMode::Backward => {
            start = round_time(start, RoundDirection::Up, unit);
            end = round_time(end, RoundDirection::Up, unit);
        }
        RoundingMode::Forward => {
            start = round_time(start, RoundDirection::Down, unit);
            end = round_time(end, RoundDirection::Down, unit);
        }
        RoundingMode::Round => {
            start = round_time(start, RoundDirection::Up, unit);
            end = round_time(end, RoundDirection::Down, unit);
        }
        RoundingMode::Stretch => {
            start = round_time(start, RoundDirection::Down, unit);
            end = round_time(end, RoundDirection::Up, unit);
        }
        RoundingMode::Half => {
            let towards = |rem: i64| {
                if rem >= unit / 2 {
                    RoundDirection::Up
                } else {
                    RoundDirection::Down
                }
            };
            start = round_time(start, towards(i64::from(start.minute()) % unit), unit);
            end = round_time(end, towards(i64::from(end.minute()) % unit), unit);
        }
        RoundingMode::NonDuplicate => {
            let context = context.ok_or(RoundingError::MissingContext)?;
            if start_off_grid {
                let widened = round_time(start, RoundDirection::Down, unit);
                let probe = TimeSpan {
                    start: widened,
                    end: span.end,
                };
                start = if overlaps_any(&probe, context) {
                    round_time(start, RoundDirection::Up, unit)
                } else {
                    widened
                };
            }
            if end_off_grid {
                let widened = round_time(end, RoundDirection::Up, unit);
                let probe = TimeSpan {
                    start: span.start,
                    end: widened,
                };
                end = if overlaps_any(&probe, context) {
                    round_time(end, RoundDirection::Down, unit)
                } else {
                    widened
                };
            }
        }
    }

    if start >= end || end - start < Duration::minutes(unit) {
        tracing::info!(
            original_start = %span.start,
            original_end = %span.end,
            mode = %mode,
            "interval collapsed below one grid cell after rounding, dropping",
        );
        return Ok(None);
    }

    Ok(Some(TimeSpan { start, end }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const UNIT: i64 = 30;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 18, hour, min, 0).unwrap()
    }

    fn next_day_midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 19, 0, 0, 0).unwrap()
    }

    fn span(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeSpan {
        TimeSpan::new(start, end).expect("valid test span")
    }

    fn rounded(s: TimeSpan, mode: RoundingMode) -> Option<TimeSpan> {
        round_span(s, mode, UNIT, Some(&[])).expect("context provided")
    }

    #[test]
    fn round_time_is_identity_on_the_grid() {
        assert_eq!(round_time(at(9, 30), RoundDirection::Up, UNIT), at(9, 30));
        assert_eq!(round_time(at(9, 30), RoundDirection::Down, UNIT), at(9, 30));
        assert_eq!(round_time(at(9, 7), RoundDirection::Up, UNIT), at(9, 30));
        assert_eq!(round_time(at(9, 7), RoundDirection::Down, UNIT), at(9, 0));
    }

    #[test]
    fn round_time_up_crosses_midnight() {
        assert_eq!(
            round_time(at(23, 45), RoundDirection::Up, UNIT),
            next_day_midnight()
        );
        assert_eq!(round_time(at(23, 45), RoundDirection::Down, UNIT), at(23, 30));
    }

    #[test]
    fn on_grid_span_is_untouched() {
        let aligned = span(at(9, 0), at(18, 30));
        for mode in [
            RoundingMode::Backward,
            RoundingMode::Forward,
            RoundingMode::Round,
            RoundingMode::Stretch,
            RoundingMode::Half,
            RoundingMode::NonDuplicate,
        ] {
            assert_eq!(rounded(aligned, mode), Some(aligned), "{mode}");
        }
    }

    #[test]
    fn full_day_interval_per_mode() {
        let s = span(at(9, 7), at(18, 49));

        assert_eq!(
            rounded(s, RoundingMode::Backward),
            Some(span(at(9, 30), at(19, 0)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Forward),
            Some(span(at(9, 0), at(18, 30)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Round),
            Some(span(at(9, 30), at(18, 30)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Stretch),
            Some(span(at(9, 0), at(19, 0)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Half),
            Some(span(at(9, 0), at(19, 0)))
        );
        assert_eq!(
            rounded(s, RoundingMode::NonDuplicate),
            Some(span(at(9, 0), at(19, 0)))
        );
    }

    #[test]
    fn sub_cell_interval_drops_under_shrinking_modes() {
        let s = span(at(9, 7), at(9, 15));

        assert_eq!(rounded(s, RoundingMode::Backward), None);
        assert_eq!(rounded(s, RoundingMode::Forward), None);
        assert_eq!(rounded(s, RoundingMode::Round), None);
        assert_eq!(
            rounded(s, RoundingMode::Half),
            Some(span(at(9, 0), at(9, 30)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Stretch),
            Some(span(at(9, 0), at(9, 30)))
        );
        assert_eq!(
            rounded(s, RoundingMode::NonDuplicate),
            Some(span(at(9, 0), at(9, 30)))
        );
    }

    #[test]
    fn interval_straddling_one_grid_line() {
        let s = span(at(9, 7), at(9, 45));

        assert_eq!(
            rounded(s, RoundingMode::Backward),
            Some(span(at(9, 30), at(10, 0)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Forward),
            Some(span(at(9, 0), at(9, 30)))
        );
        assert_eq!(rounded(s, RoundingMode::Round), None);
        assert_eq!(
            rounded(s, RoundingMode::Half),
            Some(span(at(9, 0), at(10, 0)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Stretch),
            Some(span(at(9, 0), at(10, 0)))
        );
        assert_eq!(
            rounded(s, RoundingMode::NonDuplicate),
            Some(span(at(9, 0), at(10, 0)))
        );
    }

    #[test]
    fn rounding_up_rolls_over_midnight() {
        let s = span(at(9, 7), at(23, 45));

        assert_eq!(
            rounded(s, RoundingMode::Backward),
            Some(span(at(9, 30), next_day_midnight()))
        );
        assert_eq!(
            rounded(s, RoundingMode::Forward),
            Some(span(at(9, 0), at(23, 30)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Round),
            Some(span(at(9, 30), at(23, 30)))
        );
        assert_eq!(
            rounded(s, RoundingMode::Half),
            Some(span(at(9, 0), next_day_midnight()))
        );
        assert_eq!(
            rounded(s, RoundingMode::Stretch),
            Some(span(at(9, 0), next_day_midnight()))
        );
        assert_eq!(
            rounded(s, RoundingMode::NonDuplicate),
            Some(span(at(9, 0), next_day_midnight()))
        );
    }

    #[test]
    fn half_rounds_each_bound_to_nearest_line() {
        assert_eq!(
            rounded(span(at(9, 14), at(10, 14)), RoundingMode::Half),
            Some(span(at(9, 0), at(10, 0)))
        );
        assert_eq!(
            rounded(span(at(9, 14), at(10, 1)), RoundingMode::Half),
            Some(span(at(9, 0), at(10, 0)))
        );
        assert_eq!(
            rounded(span(at(9, 15), at(10, 15)), RoundingMode::Half),
            Some(span(at(9, 30), at(10, 30)))
        );
    }

    #[test]
    fn nonduplicate_requires_context() {
        let s = span(at(9, 7), at(18, 49));
        assert_eq!(
            round_span(s, RoundingMode::NonDuplicate, UNIT, None),
            Err(RoundingError::MissingContext)
        );
    }

    #[test]
    fn nonduplicate_yields_to_surrounding_events() {
        let context = [
            Event::new("early", "alice", span(at(9, 0), at(9, 30))),
            Event::new("late", "alice", span(at(10, 30), at(11, 0))),
        ];
        let nondup = |s: TimeSpan| {
            round_span(s, RoundingMode::NonDuplicate, UNIT, Some(&context))
                .expect("context provided")
        };

        // Widening the start collides with the early event, widening the
        // end keeps the original start in the probe and collides too.
        assert_eq!(
            nondup(span(at(9, 15), at(10, 15))),
            Some(span(at(9, 30), at(10, 0)))
        );
        // Start already on grid; the widened end collides with the late
        // event and falls back.
        assert_eq!(
            nondup(span(at(9, 30), at(10, 45))),
            Some(span(at(9, 30), at(10, 30)))
        );
        // The widened end only touches the late event, touching is fine.
        assert_eq!(
            nondup(span(at(9, 30), at(10, 15))),
            Some(span(at(9, 30), at(10, 30)))
        );
        // End already on grid; only the start yields.
        assert_eq!(
            nondup(span(at(9, 15), at(10, 0))),
            Some(span(at(9, 30), at(10, 0)))
        );
    }
}
