use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CalendarError;

pub const ALL_DAY: &str = "All day";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

const ID_SUFFIX_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Number(u64),
    Text(String),
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EventId::Number(value) => write!(f, "{value}"),
            EventId::Text(value) => write!(f, "{value}"),
        }
    }
}

/// Length of an event: whole minutes or the "All day" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDuration", into = "RawDuration")]
pub enum EventDuration {
    Minutes(u32),
    AllDay,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Minutes(u32),
    Marker(String),
}

impl TryFrom<RawDuration> for EventDuration {
    type Error = String;

    fn try_from(raw: RawDuration) -> Result<Self, Self::Error> {
        match raw {
            RawDuration::Minutes(minutes) => Ok(EventDuration::Minutes(minutes)),
            RawDuration::Marker(marker) if marker.eq_ignore_ascii_case(ALL_DAY) => {
                Ok(EventDuration::AllDay)
            }
            RawDuration::Marker(marker) => Err(format!(
                "duration must be minutes or \"{ALL_DAY}\", got \"{marker}\""
            )),
        }
    }
}

impl From<EventDuration> for RawDuration {
    fn from(duration: EventDuration) -> Self {
        match duration {
            EventDuration::Minutes(minutes) => RawDuration::Minutes(minutes),
            EventDuration::AllDay => RawDuration::Marker(ALL_DAY.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Display tag used to group events visually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    Blue,
    Red,
    Green,
    Purple,
    Orange,
    Yellow,
    Pink,
    Indigo,
}

impl EventColor {
    pub const ALL: [EventColor; 8] = [
        EventColor::Blue,
        EventColor::Red,
        EventColor::Green,
        EventColor::Purple,
        EventColor::Orange,
        EventColor::Yellow,
        EventColor::Pink,
        EventColor::Indigo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventColor::Blue => "blue",
            EventColor::Red => "red",
            EventColor::Green => "green",
            EventColor::Purple => "purple",
            EventColor::Orange => "orange",
            EventColor::Yellow => "yellow",
            EventColor::Pink => "pink",
            EventColor::Indigo => "indigo",
        }
    }

    /// Accepts both `blue` and the utility-class form `bg-blue-500`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let name = value
            .strip_prefix("bg-")
            .map(|rest| rest.rsplit_once('-').map(|(name, _)| name).unwrap_or(rest))
            .unwrap_or(value);
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<EventDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,
    #[serde(default)]
    pub all_day: bool,
}

impl Event {
    /// The event's day, only when `date` is exactly `YYYY-MM-DD`.
    /// Unpadded dates and surrounding whitespace yield `None`.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .ok()
            .filter(|date| date.format(DATE_FORMAT).to_string() == self.date)
    }

    /// Start of a timed event. `None` for all-day events and missing or malformed times.
    pub fn start_time(&self) -> Option<NaiveTime> {
        let time = self.time.as_deref()?.trim();
        if time.eq_ignore_ascii_case(ALL_DAY) {
            return None;
        }
        NaiveTime::parse_from_str(time, TIME_FORMAT).ok()
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
            || self.duration == Some(EventDuration::AllDay)
            || self
                .time
                .as_deref()
                .is_some_and(|time| time.trim().eq_ignore_ascii_case(ALL_DAY))
    }

    pub fn color_tag(&self) -> Option<EventColor> {
        self.color.as_deref().and_then(EventColor::parse)
    }

    pub fn time_label(&self) -> String {
        if self.is_all_day() {
            return ALL_DAY.to_string();
        }
        match (self.start_time(), self.time.as_deref()) {
            (Some(start), _) => start.format("%-I:%M %p").to_string(),
            (None, Some(raw)) => raw.to_string(),
            (None, None) => ALL_DAY.to_string(),
        }
    }

    pub fn duration_label(&self) -> Option<String> {
        match self.duration {
            Some(EventDuration::Minutes(minutes)) if !self.is_all_day() => {
                Some(format!("{minutes} min"))
            }
            _ => None,
        }
    }
}

/// Values applied to fields a draft leaves unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDefaults {
    pub color: EventColor,
    pub category: String,
    pub priority: Priority,
    pub calendar: Option<String>,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            color: EventColor::Blue,
            category: "personal".to_string(),
            priority: Priority::Medium,
            calendar: None,
        }
    }
}

/// Raw input from the event creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub date: Option<String>,
    pub all_day: bool,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub guests: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub color: Option<EventColor>,
    pub calendar: Option<String>,
}

/// Session-held event collection. Events are appended and never removed.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
    defaults: EventDefaults,
}

impl EventStore {
    pub fn new(events: Vec<Event>, defaults: EventDefaults) -> Self {
        Self { events, defaults }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    /// Validates a draft, fills defaults, assigns an id and appends the event.
    ///
    /// `fallback_date` is used when the draft carries no date.
    pub fn create(
        &mut self,
        draft: EventDraft,
        fallback_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<&Event, CalendarError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CalendarError::EmptyTitle);
        }

        let date = match non_empty(draft.date) {
            Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map_err(|_| CalendarError::InvalidDate(raw.clone()))?,
            None => fallback_date,
        };

        let (time, duration) = if draft.all_day {
            (Some(ALL_DAY.to_string()), Some(EventDuration::AllDay))
        } else {
            let start_raw = non_empty(draft.start)
                .ok_or_else(|| CalendarError::InvalidTime(String::new()))?;
            let start = parse_clock(&start_raw)?;
            let duration = match non_empty(draft.end) {
                Some(end_raw) => {
                    let end = parse_clock(&end_raw)?;
                    let minutes = (end - start).num_minutes().max(0);
                    Some(EventDuration::Minutes(minutes as u32))
                }
                None => None,
            };
            (Some(start.format(TIME_FORMAT).to_string()), duration)
        };

        let attendees = draft
            .guests
            .as_deref()
            .map(|guests| {
                guests
                    .split(',')
                    .map(str::trim)
                    .filter(|guest| !guest.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let event = Event {
            id: self.next_id(now),
            title: title.to_string(),
            date: date.format(DATE_FORMAT).to_string(),
            time,
            duration,
            location: non_empty(draft.location),
            description: non_empty(draft.description),
            attendees,
            priority: draft.priority.unwrap_or(self.defaults.priority),
            category: non_empty(draft.category).unwrap_or_else(|| self.defaults.category.clone()),
            color: Some(draft.color.unwrap_or(self.defaults.color).as_str().to_string()),
            calendar: non_empty(draft.calendar).or_else(|| self.defaults.calendar.clone()),
            all_day: draft.all_day,
        };

        info!(id = %event.id, date = %event.date, "created event");
        let index = self.events.len();
        self.events.push(event);
        Ok(&self.events[index])
    }

    fn next_id(&self, now: DateTime<Utc>) -> EventId {
        loop {
            let id = generate_id(now);
            if self.event(&id).is_none() {
                return id;
            }
            debug!(%id, "event id collision, regenerating");
        }
    }
}

pub fn generate_id(now: DateTime<Utc>) -> EventId {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    EventId::Text(format!("event-{}-{suffix}", now.timestamp_millis()))
}

pub fn parse_clock(raw: &str) -> Result<NaiveTime, CalendarError> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
        .map_err(|_| CalendarError::InvalidTime(raw.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{
        ALL_DAY, Event, EventColor, EventDefaults, EventDraft, EventDuration, EventId,
        EventStore, Priority,
    };
    use crate::error::CalendarError;

    fn store() -> EventStore {
        EventStore::new(Vec::new(), EventDefaults::default())
    }

    fn fallback() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 24).unwrap()
    }

    #[test]
    fn rejects_blank_title() {
        let mut store = store();
        let draft = EventDraft {
            title: "   ".to_string(),
            start: Some("09:00".to_string()),
            ..Default::default()
        };
        let err = store.create(draft, fallback(), Utc::now()).unwrap_err();
        assert_eq!(err, CalendarError::EmptyTitle);
        assert!(store.events().is_empty());
    }

    #[test]
    fn fills_defaults_and_computes_duration() {
        let mut store = store();
        let draft = EventDraft {
            title: " Standup ".to_string(),
            start: Some("09:00".to_string()),
            end: Some("09:45".to_string()),
            guests: Some("Ana, , Ben ,".to_string()),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 6, 20, 8, 0, 0).unwrap();
        let event = store.create(draft, fallback(), now).expect("event should be created");

        assert_eq!(event.title, "Standup");
        assert_eq!(event.date, "2025-06-24");
        assert_eq!(event.time.as_deref(), Some("09:00"));
        assert_eq!(event.duration, Some(EventDuration::Minutes(45)));
        assert_eq!(event.attendees, vec!["Ana".to_string(), "Ben".to_string()]);
        assert_eq!(event.priority, Priority::Medium);
        assert_eq!(event.category, "personal");
        assert_eq!(event.color.as_deref(), Some("blue"));
        assert_eq!(event.location, None);
        match &event.id {
            EventId::Text(id) => assert!(id.starts_with(&format!("event-{}-", now.timestamp_millis()))),
            other => panic!("unexpected id {other:?}"),
        }
    }

    #[test]
    fn end_before_start_clamps_to_zero() {
        let mut store = store();
        let draft = EventDraft {
            title: "Backwards".to_string(),
            start: Some("10:00".to_string()),
            end: Some("09:00".to_string()),
            ..Default::default()
        };
        let event = store.create(draft, fallback(), Utc::now()).unwrap();
        assert_eq!(event.duration, Some(EventDuration::Minutes(0)));
    }

    #[test]
    fn all_day_draft_uses_marker() {
        let mut store = store();
        let draft = EventDraft {
            title: "Holiday".to_string(),
            date: Some("2025-12-25".to_string()),
            all_day: true,
            ..Default::default()
        };
        let event = store.create(draft, fallback(), Utc::now()).unwrap();
        assert_eq!(event.time.as_deref(), Some(ALL_DAY));
        assert_eq!(event.duration, Some(EventDuration::AllDay));
        assert!(event.is_all_day());
        assert_eq!(event.start_time(), None);
    }

    #[test]
    fn rejects_malformed_date_and_time() {
        let mut store = store();
        let bad_date = EventDraft {
            title: "x".to_string(),
            date: Some("2025-02-30".to_string()),
            start: Some("09:00".to_string()),
            ..Default::default()
        };
        assert_eq!(
            store.create(bad_date, fallback(), Utc::now()).unwrap_err(),
            CalendarError::InvalidDate("2025-02-30".to_string())
        );

        let bad_time = EventDraft {
            title: "x".to_string(),
            start: Some("25:00".to_string()),
            ..Default::default()
        };
        assert_eq!(
            store.create(bad_time, fallback(), Utc::now()).unwrap_err(),
            CalendarError::InvalidTime("25:00".to_string())
        );
    }

    #[test]
    fn ids_stay_distinct_within_one_millisecond() {
        let mut store = store();
        let now = Utc::now();
        for index in 0..20 {
            let draft = EventDraft {
                title: format!("event {index}"),
                start: Some("09:00".to_string()),
                ..Default::default()
            };
            store.create(draft, fallback(), now).unwrap();
        }
        let mut ids = store.events().iter().map(|event| event.id.clone()).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn deserializes_seed_records() {
        let raw = r#"[
            {"id": 4, "title": "Birthday", "date": "2025-06-26", "time": "00:00",
             "duration": 1440, "priority": "high", "category": "birthday",
             "color": "purple", "calendar": "family", "allDay": true},
            {"id": "event-1", "title": "Offsite", "date": "2025-06-27",
             "time": "All day", "duration": "All day", "color": "bg-orange-500"},
            {"id": 9, "title": "Loose", "date": "not a date"}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(raw).expect("seed should parse");

        assert_eq!(events[0].id, EventId::Number(4));
        assert!(events[0].is_all_day());
        assert_eq!(events[0].duration, Some(EventDuration::Minutes(1440)));
        assert_eq!(events[1].duration, Some(EventDuration::AllDay));
        assert_eq!(events[1].color_tag(), Some(EventColor::Orange));
        assert_eq!(events[1].priority, Priority::Medium);
        assert_eq!(events[2].parsed_date(), None);
        assert_eq!(events[2].time, None);
    }

    #[test]
    fn parsed_date_requires_canonical_form() {
        let raw = r#"[
            {"id": 1, "title": "a", "date": "2025-06-05"},
            {"id": 2, "title": "b", "date": "2025-6-5"},
            {"id": 3, "title": "c", "date": " 2025-06-05"}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(raw).unwrap();
        assert_eq!(events[0].parsed_date(), NaiveDate::from_ymd_opt(2025, 6, 5));
        assert_eq!(events[1].parsed_date(), None);
        assert_eq!(events[2].parsed_date(), None);
    }

    #[test]
    fn parses_color_tags() {
        assert_eq!(EventColor::parse("bg-indigo-500"), Some(EventColor::Indigo));
        assert_eq!(EventColor::parse("Red"), Some(EventColor::Red));
        assert_eq!(EventColor::parse("bg-teal-500"), None);
    }
}
