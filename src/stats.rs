use std::collections::HashSet;

use chrono::NaiveDate;

use crate::conflict::{ConflictPolicy, has_conflict};
use crate::domain::{Event, EventDuration};
use crate::index::{events_in_month, group_by_date};

const UPCOMING_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthStats<'a> {
    pub total_events: usize,
    pub active_days: usize,
    pub conflict_days: usize,
    pub total_minutes: u64,
    pub upcoming: Vec<&'a Event>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthSummary {
    pub month: u32,
    pub events: usize,
    pub conflict_days: usize,
}

/// Overview of one month (zero-based) as of `today`.
pub fn month_stats<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    year: i32,
    month: u32,
    today: NaiveDate,
    policy: &ConflictPolicy,
) -> MonthStats<'a> {
    let in_month = events_in_month(events, year, month);

    let active_days = in_month
        .iter()
        .map(|event| event.date.as_str())
        .collect::<HashSet<_>>()
        .len();

    let conflict_days = count_conflict_days(&in_month, policy);

    let total_minutes = in_month
        .iter()
        .map(|event| match event.duration {
            Some(EventDuration::Minutes(minutes)) => u64::from(minutes),
            Some(EventDuration::AllDay) | None => 0,
        })
        .sum();

    let mut upcoming = in_month
        .iter()
        .copied()
        .filter(|event| event.parsed_date().is_some_and(|date| date >= today))
        .collect::<Vec<_>>();
    upcoming.sort_by(|left, right| {
        left.parsed_date()
            .cmp(&right.parsed_date())
            .then_with(|| left.start_time().cmp(&right.start_time()))
    });
    upcoming.truncate(UPCOMING_LIMIT);

    MonthStats {
        total_events: in_month.len(),
        active_days,
        conflict_days,
        total_minutes,
        upcoming,
    }
}

/// Event and conflict-day counts for each month of `year`.
pub fn year_summary<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    year: i32,
    policy: &ConflictPolicy,
) -> [MonthSummary; 12] {
    let events = events.into_iter().collect::<Vec<_>>();
    let mut summary = [MonthSummary::default(); 12];
    for (month, slot) in (0u32..).zip(summary.iter_mut()) {
        let in_month = events_in_month(events.iter().copied(), year, month);
        *slot = MonthSummary {
            month,
            events: in_month.len(),
            conflict_days: count_conflict_days(&in_month, policy),
        };
    }
    summary
}

pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

fn count_conflict_days(events: &[&Event], policy: &ConflictPolicy) -> usize {
    group_by_date(events.iter().copied())
        .into_values()
        .filter(|day_events| has_conflict(day_events.iter().copied(), policy))
        .count()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{format_minutes, month_stats, year_summary};
    use crate::conflict::ConflictPolicy;
    use crate::domain::{Event, EventDuration, EventId};
    use crate::sample::sample_events;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 25).unwrap()
    }

    #[test]
    fn summarises_sample_month() {
        let events = sample_events();
        let stats = month_stats(&events, 2025, 5, today(), &ConflictPolicy::default());
        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.active_days, 3);
        assert_eq!(stats.conflict_days, 0);
        assert_eq!(stats.total_minutes, 60 + 90 + 60 + 1440);
        assert_eq!(
            stats.upcoming.iter().map(|event| event.id.clone()).collect::<Vec<_>>(),
            vec![EventId::Number(3), EventId::Number(4)]
        );
    }

    #[test]
    fn counts_conflicting_days_once() {
        let mut events = sample_events();
        let mut overlap = events[0].clone();
        overlap.id = EventId::Number(20);
        overlap.time = Some("10:30".to_string());
        overlap.duration = Some(EventDuration::Minutes(15));
        let mut overlap_again = overlap.clone();
        overlap_again.id = EventId::Number(21);
        events.push(overlap);
        events.push(overlap_again);

        let stats = month_stats(&events, 2025, 5, today(), &ConflictPolicy::default());
        assert_eq!(stats.conflict_days, 1);

        let year = year_summary(&events, 2025, &ConflictPolicy::default());
        assert_eq!(year[5].events, 6);
        assert_eq!(year[5].conflict_days, 1);
        assert_eq!(year[6].events, 0);
    }

    #[test]
    fn all_day_marker_adds_no_minutes() {
        let events: Vec<Event> = serde_json::from_str(
            r#"[{"id": 1, "title": "Trip", "date": "2025-03-03", "duration": "All day"}]"#,
        )
        .unwrap();
        let stats = month_stats(&events, 2025, 2, today(), &ConflictPolicy::default());
        assert_eq!(stats.total_minutes, 0);
        assert!(stats.upcoming.is_empty());
    }

    #[test]
    fn unpadded_dates_are_neither_counted_nor_upcoming() {
        let events: Vec<Event> = serde_json::from_str(
            r#"[{"id": 1, "title": "Loose", "date": "2025-6-5", "time": "09:00"}]"#,
        )
        .unwrap();
        let stats = month_stats(&events, 2025, 5, today(), &ConflictPolicy::default());
        assert_eq!(stats.total_events, 0);
        assert!(stats.upcoming.is_empty());
        assert_eq!(year_summary(&events, 2025, &ConflictPolicy::default())[5].events, 0);
    }

    #[test]
    fn upcoming_orders_all_day_before_timed() {
        let events: Vec<Event> = serde_json::from_str(
            r#"[
                {"id": 1, "title": "Late", "date": "2025-06-27", "time": "16:00"},
                {"id": 2, "title": "Early", "date": "2025-06-27", "time": "08:00"},
                {"id": 3, "title": "Offsite", "date": "2025-06-27", "time": "All day"},
                {"id": 4, "title": "Past", "date": "2025-06-24", "time": "08:00"}
            ]"#,
        )
        .unwrap();
        let stats = month_stats(&events, 2025, 5, today(), &ConflictPolicy::default());
        assert_eq!(
            stats.upcoming.iter().map(|event| event.id.clone()).collect::<Vec<_>>(),
            vec![EventId::Number(3), EventId::Number(2), EventId::Number(1)]
        );
    }

    #[test]
    fn formats_minutes() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(150), "2h 30m");
        assert_eq!(format_minutes(1440), "24h 0m");
    }
}
