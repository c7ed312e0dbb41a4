use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{ALL_DAY, Event, EventId};
use crate::error::StorageError;
use crate::sample::sample_events;

/// Reads a JSON array of events. An empty file is an empty list.
pub fn load_events(path: &Path) -> Result<Vec<Event>, StorageError> {
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw)?)
}

/// Loads the seed list at `path`, falling back to the built-in samples when
/// no path is configured or the file cannot be read.
pub fn load_events_or_sample(path: Option<&Path>) -> Vec<Event> {
    let Some(path) = path else {
        info!("no event list configured, using sample events");
        return sample_events();
    };

    match load_events(path) {
        Ok(events) => {
            info!(path = %path.display(), count = events.len(), "loaded events");
            events
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load events, using sample events");
            sample_events()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventIssue {
    MalformedDate { id: EventId, date: String },
    MalformedTime { id: EventId, time: String },
}

impl std::fmt::Display for EventIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventIssue::MalformedDate { id, date } => {
                write!(f, "event {id}: date \"{date}\" is not YYYY-MM-DD, hidden from the calendar")
            }
            EventIssue::MalformedTime { id, time } => {
                write!(f, "event {id}: time \"{time}\" is not HH:MM, skipped by conflict checks")
            }
        }
    }
}

/// Records the core will silently skip.
pub fn find_issues(events: &[Event]) -> Vec<EventIssue> {
    let mut issues = Vec::new();
    for event in events {
        if event.parsed_date().is_none() {
            issues.push(EventIssue::MalformedDate {
                id: event.id.clone(),
                date: event.date.clone(),
            });
        }
        if let Some(time) = &event.time {
            if !time.trim().eq_ignore_ascii_case(ALL_DAY) && event.start_time().is_none() {
                issues.push(EventIssue::MalformedTime {
                    id: event.id.clone(),
                    time: time.clone(),
                });
            }
        }
    }
    issues
}
