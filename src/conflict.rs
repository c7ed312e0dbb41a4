//! Same-day schedule conflict detection.
//!
//! Rules applied by every function here:
//! - all-day events never take part in pairing, neither against timed events
//!   nor against each other;
//! - events without a parsable `HH:MM` time are skipped;
//! - a missing duration falls back to [`ConflictPolicy::default_duration_minutes`],
//!   an explicit zero stays zero;
//! - intervals are half-open `[start, start + duration)` in minutes from
//!   midnight, so back-to-back events do not conflict.

use std::collections::HashSet;

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{Event, EventDuration, EventId};

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictPolicy {
    /// Length assumed for timed events that carry no duration.
    pub default_duration_minutes: u32,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: u32,
    end: u32,
}

impl Interval {
    fn overlaps(self, other: Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

fn interval(event: &Event, policy: &ConflictPolicy) -> Option<Interval> {
    if event.is_all_day() {
        return None;
    }
    let start = event.start_time()?;
    let start = start.hour() * 60 + start.minute();
    let minutes = match event.duration {
        Some(EventDuration::Minutes(minutes)) => minutes,
        Some(EventDuration::AllDay) => return None,
        None => policy.default_duration_minutes,
    };
    Some(Interval {
        start,
        end: start.saturating_add(minutes),
    })
}

fn timed<'a>(
    day_events: impl IntoIterator<Item = &'a Event>,
    policy: &ConflictPolicy,
) -> Vec<(&'a Event, Interval)> {
    day_events
        .into_iter()
        .filter_map(|event| interval(event, policy).map(|interval| (event, interval)))
        .collect()
}

/// Whether any two of one day's events overlap in time.
pub fn has_conflict<'a>(
    day_events: impl IntoIterator<Item = &'a Event>,
    policy: &ConflictPolicy,
) -> bool {
    let timed = timed(day_events, policy);
    if timed.len() < 2 {
        return false;
    }

    for (left_index, (left, left_interval)) in timed.iter().enumerate() {
        for (right, right_interval) in &timed[left_index + 1..] {
            if left_interval.overlaps(*right_interval) {
                trace!(left = %left.id, right = %right.id, "conflict found");
                return true;
            }
        }
    }
    false
}

/// Every overlapping pair, in input order.
pub fn conflict_pairs<'a>(
    day_events: impl IntoIterator<Item = &'a Event>,
    policy: &ConflictPolicy,
) -> Vec<(&'a Event, &'a Event)> {
    let timed = timed(day_events, policy);
    let mut pairs = Vec::new();
    for (left_index, (left, left_interval)) in timed.iter().enumerate() {
        for (right, right_interval) in &timed[left_index + 1..] {
            if left_interval.overlaps(*right_interval) {
                pairs.push((*left, *right));
            }
        }
    }
    pairs
}

/// Ids of events that overlap at least one other event.
pub fn conflicting_ids<'a>(
    day_events: impl IntoIterator<Item = &'a Event>,
    policy: &ConflictPolicy,
) -> HashSet<EventId> {
    conflict_pairs(day_events, policy)
        .into_iter()
        .flat_map(|(left, right)| [left.id.clone(), right.id.clone()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ConflictPolicy, conflict_pairs, conflicting_ids, has_conflict};
    use crate::domain::{ALL_DAY, Event, EventDuration, EventId};

    fn timed(id: u64, time: &str, minutes: Option<u32>) -> Event {
        Event {
            id: EventId::Number(id),
            title: format!("event {id}"),
            date: "2025-06-24".to_string(),
            time: Some(time.to_string()),
            duration: minutes.map(EventDuration::Minutes),
            location: None,
            description: None,
            attendees: Vec::new(),
            priority: Default::default(),
            category: String::new(),
            color: None,
            calendar: None,
            all_day: false,
        }
    }

    fn all_day(id: u64) -> Event {
        Event {
            time: Some(ALL_DAY.to_string()),
            duration: Some(EventDuration::AllDay),
            all_day: true,
            ..timed(id, "00:00", None)
        }
    }

    fn policy() -> ConflictPolicy {
        ConflictPolicy::default()
    }

    #[test]
    fn detects_partial_overlap() {
        let events = [timed(1, "10:00", Some(60)), timed(2, "10:30", Some(30))];
        assert!(has_conflict(&events, &policy()));
    }

    #[test]
    fn back_to_back_is_not_a_conflict() {
        let events = [timed(1, "10:00", Some(60)), timed(2, "11:00", Some(30))];
        assert!(!has_conflict(&events, &policy()));
    }

    #[test]
    fn fewer_than_two_events_never_conflict() {
        assert!(!has_conflict(&[] as &[Event], &policy()));
        assert!(!has_conflict(&[timed(1, "10:00", Some(60))], &policy()));
    }

    #[test]
    fn missing_duration_uses_policy_default() {
        let events = [timed(1, "10:00", None), timed(2, "10:45", Some(15))];
        assert!(has_conflict(&events, &policy()));
        let short = ConflictPolicy {
            default_duration_minutes: 30,
        };
        assert!(!has_conflict(&events, &short));
    }

    #[test]
    fn zero_duration_inside_another_event_conflicts() {
        let events = [timed(1, "09:00", Some(120)), timed(2, "10:00", Some(0))];
        assert!(has_conflict(&events, &policy()));
    }

    #[test]
    fn all_day_events_are_ignored() {
        let events = [all_day(1), all_day(2), timed(3, "10:00", Some(60))];
        assert!(!has_conflict(&events, &policy()));

        let mut flagged = timed(4, "10:00", Some(60));
        flagged.all_day = true;
        let events = [flagged, timed(5, "10:15", Some(30))];
        assert!(!has_conflict(&events, &policy()));
    }

    #[test]
    fn malformed_times_are_skipped() {
        let mut untimed = timed(1, "10:00", Some(60));
        untimed.time = None;
        let events = [untimed, timed(2, "noon", Some(60)), timed(3, "10:00", Some(60))];
        assert!(!has_conflict(&events, &policy()));
    }

    #[test]
    fn reports_every_conflicting_event() {
        let events = [
            timed(1, "09:00", Some(60)),
            timed(2, "09:30", Some(60)),
            timed(3, "12:00", Some(30)),
            timed(4, "10:15", Some(30)),
        ];
        let pairs = conflict_pairs(&events, &policy());
        assert_eq!(pairs.len(), 2);
        let ids = conflicting_ids(&events, &policy());
        assert!(ids.contains(&EventId::Number(1)));
        assert!(ids.contains(&EventId::Number(2)));
        assert!(ids.contains(&EventId::Number(4)));
        assert!(!ids.contains(&EventId::Number(3)));
    }
}
