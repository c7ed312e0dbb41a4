use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Event, EventColor};

/// A toggleable group of events, matched against `Event::calendar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
    pub color: EventColor,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Events whose date string equals `YYYY-MM-DD` for the given day.
///
/// `month` is zero-based. Input order is preserved and nothing is deduplicated.
pub fn events_on_date<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    year: i32,
    month: u32,
    day: u32,
) -> Vec<&'a Event> {
    let key = format!("{year:04}-{:02}-{day:02}", month + 1);
    events.into_iter().filter(|event| event.date == key).collect()
}

/// Events whose parsed date falls within `month` (zero-based) of `year`.
///
/// Events with an unparsable date are skipped.
pub fn events_in_month<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    year: i32,
    month: u32,
) -> Vec<&'a Event> {
    events
        .into_iter()
        .filter(|event| match event.parsed_date() {
            Some(date) => date.year() == year && date.month0() == month,
            None => {
                debug!(id = %event.id, date = %event.date, "skipping event with malformed date");
                false
            }
        })
        .collect()
}

/// Groups events by their raw date string, keeping input order within a day.
pub fn group_by_date<'a>(
    events: impl IntoIterator<Item = &'a Event>,
) -> BTreeMap<String, Vec<&'a Event>> {
    let mut groups: BTreeMap<String, Vec<&'a Event>> = BTreeMap::new();
    for event in events {
        groups.entry(event.date.clone()).or_default().push(event);
    }
    groups
}

/// Applies calendar toggles and the search term.
///
/// Events without a calendar, or with one not in `calendars`, stay visible.
pub fn visible_events<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    calendars: &[Calendar],
    search: &str,
) -> Vec<&'a Event> {
    let enabled = calendars
        .iter()
        .map(|calendar| (calendar.id.as_str(), calendar.enabled))
        .collect::<HashMap<_, _>>();
    let needle = search.trim().to_lowercase();

    events
        .into_iter()
        .filter(|event| {
            event
                .calendar
                .as_deref()
                .and_then(|id| enabled.get(id).copied())
                .unwrap_or(true)
        })
        .filter(|event| needle.is_empty() || matches_search(event, &needle))
        .collect()
}

fn matches_search(event: &Event, needle: &str) -> bool {
    [
        Some(event.title.as_str()),
        event.description.as_deref(),
        event.location.as_deref(),
        Some(event.category.as_str()),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::{Calendar, events_in_month, events_on_date, group_by_date, visible_events};
    use crate::domain::{Event, EventColor, EventId};
    use crate::sample::sample_events;

    fn event(id: u64, date: &str) -> Event {
        Event {
            id: EventId::Number(id),
            title: format!("event {id}"),
            date: date.to_string(),
            time: None,
            duration: None,
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

    fn ids(events: &[&Event]) -> Vec<EventId> {
        events.iter().map(|event| event.id.clone()).collect()
    }

    #[test]
    fn filters_by_exact_date_in_order() {
        let events = sample_events();
        let found = events_on_date(&events, 2025, 5, 24);
        assert_eq!(ids(&found), vec![EventId::Number(1), EventId::Number(2)]);
        assert_eq!(events_on_date(&events, 2025, 5, 25).len(), 1);
        assert!(events_on_date(&events, 2025, 5, 1).is_empty());
    }

    #[test]
    fn keeps_duplicates() {
        let events = vec![event(1, "2025-01-05"), event(1, "2025-01-05")];
        assert_eq!(events_on_date(&events, 2025, 0, 5).len(), 2);
    }

    #[test]
    fn month_filter_skips_malformed_dates() {
        let events = vec![
            event(1, "2025-03-01"),
            event(2, "garbage"),
            event(3, "2025-03-31"),
            event(4, "2025-04-01"),
            event(5, "2024-03-15"),
        ];
        let found = events_in_month(&events, 2025, 2);
        assert_eq!(ids(&found), vec![EventId::Number(1), EventId::Number(3)]);
    }

    #[test]
    fn month_and_day_lookups_agree_on_unpadded_dates() {
        let events = vec![event(1, "2025-6-5"), event(2, "2025-06-05")];
        assert_eq!(ids(&events_in_month(&events, 2025, 5)), vec![EventId::Number(2)]);
        assert_eq!(ids(&events_on_date(&events, 2025, 5, 5)), vec![EventId::Number(2)]);
    }

    #[test]
    fn groups_by_raw_date() {
        let events = sample_events();
        let groups = group_by_date(&events);
        assert_eq!(groups["2025-06-24"].len(), 2);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn hides_disabled_calendars_and_applies_search() {
        let mut events = sample_events();
        events.push(event(10, "2025-06-27"));
        let calendars = vec![
            Calendar {
                id: "work".to_string(),
                name: "Work".to_string(),
                color: EventColor::Red,
                enabled: false,
            },
            Calendar {
                id: "personal".to_string(),
                name: "Personal".to_string(),
                color: EventColor::Blue,
                enabled: true,
            },
        ];

        let visible = visible_events(&events, &calendars, "");
        assert_eq!(
            ids(&visible),
            vec![EventId::Number(3), EventId::Number(4), EventId::Number(10)]
        );

        let searched = visible_events(&events, &calendars, "  CAFE ");
        assert_eq!(ids(&searched), vec![EventId::Number(3)]);
    }
}
