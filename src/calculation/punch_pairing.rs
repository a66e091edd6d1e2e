//! Punch pairing.
//!
//! This module groups one employee's punch events into IN/OUT intervals.
//! Every IN produces exactly one interval keyed by the IN's calendar date
//! (the shift date, even when the OUT falls on the next day). Each interval
//! ends in one of four states, see [`IntervalState`].
//!
//! The pass is a pure function of the punch set: the same punches in any
//! order always yield the same intervals.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{PunchDirection, PunchEvent, PunchSource};

use super::time_math::minute_of_day_at;

/// Terminal state of one IN's search for an OUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalState {
    /// An OUT was paired.
    Closed,
    /// Another IN was reached before any acceptable OUT.
    Partial,
    /// Punches ran out without any OUT candidate.
    Open,
    /// OUT candidates were seen but all rejected, or the window was exceeded.
    Confused,
}

/// One IN and its paired OUT, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchInterval {
    /// The IN's calendar date.
    pub shift_date: NaiveDate,
    /// The IN.
    pub in_time: NaiveDateTime,
    /// The paired OUT; only set for [`IntervalState::Closed`].
    pub out_time: Option<NaiveDateTime>,
    /// How the search ended.
    pub state: IntervalState,
    /// Sources of the IN and OUT pulses.
    pub sources: Vec<PunchSource>,
}

/// The result of a pairing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingOutcome {
    /// Intervals whose shift date falls inside the target range, by IN time.
    pub intervals: Vec<PunchInterval>,
    /// OUTs inside the target range that no IN claimed.
    pub unmatched_outs: Vec<NaiveDateTime>,
}

/// The consolidated punches of one shift date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPunches {
    /// The shift date.
    pub date: NaiveDate,
    /// The first IN of the day.
    pub in_time: NaiveDateTime,
    /// The latest OUT among the day's closed intervals.
    pub out_time: Option<NaiveDateTime>,
    /// `Closed` when an OUT exists, otherwise the first interval's state.
    pub state: IntervalState,
    /// How many intervals the day had.
    pub interval_count: usize,
    /// Sources of every pulse that contributed.
    pub sources: Vec<PunchSource>,
}

/// A collapsed pulse: identical (timestamp, direction) events from any source.
#[derive(Debug, Clone)]
struct Pulse {
    timestamp: NaiveDateTime,
    direction: PunchDirection,
    sources: Vec<PunchSource>,
}

/// Extends a target date range by one calendar day on each side.
///
/// Pairing must see the previous day's IN to claim an early-morning OUT,
/// and the next day's OUT to close an overnight interval.
pub fn pairing_window(from: NaiveDate, to: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        from.pred_opt().unwrap_or(from),
        to.succ_opt().unwrap_or(to),
    )
}

/// Pairs punch events into IN/OUT intervals.
///
/// # Arguments
///
/// * `events` - One employee's punches covering at least [`pairing_window`]
/// * `from`, `to` - The inclusive target range of shift dates
/// * `max_window_hours` - An OUT further than this from its IN is never paired
///
/// # Rules
///
/// For each IN, unconsumed punches after it are searched in order:
///
/// 1. A pulse at the IN's exact timestamp is a duplicate and skipped.
/// 2. Another IN stops the search; the interval is `Partial`.
/// 3. A pulse beyond the max window stops the search; the interval is `Confused`.
/// 4. A same-date OUT is accepted only if its minute of day is after the IN's.
/// 5. A later-date OUT is accepted unless that date has its own IN strictly
///    before the OUT.
///
/// A paired OUT is consumed and cannot pair again.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{pair_punches, IntervalState};
/// use attendance_engine::models::{PunchDirection, PunchEvent, PunchSource};
/// use chrono::{NaiveDate, NaiveDateTime};
///
/// let punch = |ts: &str, direction| PunchEvent {
///     employee_number: "E001".to_string(),
///     timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
///     direction,
///     source: PunchSource::Device,
/// };
/// let events = vec![
///     punch("2024-01-15 22:00:00", PunchDirection::In),
///     punch("2024-01-16 06:05:00", PunchDirection::Out),
/// ];
/// let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
///
/// let outcome = pair_punches(&events, day, day, 25);
/// assert_eq!(outcome.intervals.len(), 1);
/// assert_eq!(outcome.intervals[0].state, IntervalState::Closed);
/// assert_eq!(outcome.intervals[0].shift_date, day);
/// ```
pub fn pair_punches(
    events: &[PunchEvent],
    from: NaiveDate,
    to: NaiveDate,
    max_window_hours: u32,
) -> PairingOutcome {
    let pulses = collapse_pulses(events);
    let max_window = Duration::hours(i64::from(max_window_hours));
    let mut consumed = vec![false; pulses.len()];
    let mut intervals = Vec::new();

    for (index, pulse) in pulses.iter().enumerate() {
        if pulse.direction != PunchDirection::In {
            continue;
        }

        let (state, out_index) = search_out(&pulses, &consumed, index, max_window);
        if let Some(out_index) = out_index {
            consumed[out_index] = true;
        }

        let shift_date = pulse.timestamp.date();
        if shift_date < from || shift_date > to {
            continue;
        }

        let mut sources = pulse.sources.clone();
        if let Some(out_index) = out_index {
            sources.extend_from_slice(&pulses[out_index].sources);
        }
        sources.sort();
        sources.dedup();

        intervals.push(PunchInterval {
            shift_date,
            in_time: pulse.timestamp,
            out_time: out_index.map(|j| pulses[j].timestamp),
            state,
            sources,
        });
    }

    let unmatched_outs = pulses
        .iter()
        .zip(&consumed)
        .filter(|(pulse, used)| {
            !**used
                && pulse.direction == PunchDirection::Out
                && pulse.timestamp.date() >= from
                && pulse.timestamp.date() <= to
        })
        .map(|(pulse, _)| pulse.timestamp)
        .collect();

    PairingOutcome {
        intervals,
        unmatched_outs,
    }
}

/// Consolidates intervals into one entry per shift date.
///
/// Takes the first IN of the day and the latest OUT among the day's
/// closed intervals.
pub fn consolidate_days(intervals: &[PunchInterval]) -> Vec<DayPunches> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&PunchInterval>> = BTreeMap::new();
    for interval in intervals {
        by_date.entry(interval.shift_date).or_default().push(interval);
    }

    by_date
        .into_iter()
        .filter_map(|(date, mut day)| {
            day.sort_by_key(|i| i.in_time);
            let first = day.first()?;
            let out_time = day
                .iter()
                .filter(|i| i.state == IntervalState::Closed)
                .filter_map(|i| i.out_time)
                .max();
            let state = if out_time.is_some() {
                IntervalState::Closed
            } else {
                first.state
            };

            let mut sources: Vec<PunchSource> =
                day.iter().flat_map(|i| i.sources.iter().copied()).collect();
            sources.sort();
            sources.dedup();

            Some(DayPunches {
                date,
                in_time: first.in_time,
                out_time,
                state,
                interval_count: day.len(),
                sources,
            })
        })
        .collect()
}

fn collapse_pulses(events: &[PunchEvent]) -> Vec<Pulse> {
    let mut sorted: Vec<&PunchEvent> = events
        .iter()
        .filter(|e| e.direction != PunchDirection::Unknown)
        .collect();
    sorted.sort_by_key(|e| (e.timestamp, e.direction, e.source));

    let mut pulses: Vec<Pulse> = Vec::with_capacity(sorted.len());
    for event in sorted {
        match pulses.last_mut() {
            Some(last) if last.timestamp == event.timestamp && last.direction == event.direction => {
                if !last.sources.contains(&event.source) {
                    last.sources.push(event.source);
                }
            }
            _ => pulses.push(Pulse {
                timestamp: event.timestamp,
                direction: event.direction,
                sources: vec![event.source],
            }),
        }
    }
    pulses
}

fn search_out(
    pulses: &[Pulse],
    consumed: &[bool],
    in_index: usize,
    max_window: Duration,
) -> (IntervalState, Option<usize>) {
    let in_time = pulses[in_index].timestamp;
    let in_date = in_time.date();
    let in_minute = minute_of_day_at(in_time);
    let mut rejected_out = false;

    for (j, candidate) in pulses.iter().enumerate().skip(in_index + 1) {
        if consumed[j] || candidate.timestamp == in_time {
            continue;
        }
        if candidate.direction == PunchDirection::In {
            return (IntervalState::Partial, None);
        }
        if candidate.timestamp - in_time > max_window {
            return (IntervalState::Confused, None);
        }

        let out_date = candidate.timestamp.date();
        if out_date == in_date {
            if minute_of_day_at(candidate.timestamp) > in_minute {
                return (IntervalState::Closed, Some(j));
            }
            rejected_out = true;
        } else if has_in_before(pulses, out_date, candidate.timestamp) {
            rejected_out = true;
        } else {
            return (IntervalState::Closed, Some(j));
        }
    }

    if rejected_out {
        (IntervalState::Confused, None)
    } else {
        (IntervalState::Open, None)
    }
}

fn has_in_before(pulses: &[Pulse], date: NaiveDate, before: NaiveDateTime) -> bool {
    pulses.iter().any(|p| {
        p.direction == PunchDirection::In && p.timestamp.date() == date && p.timestamp < before
    })
}
