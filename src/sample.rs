//! Built-in events and calendars used when no seed list is configured.

use crate::domain::{Event, EventColor, EventDuration, EventId, Priority};
use crate::index::Calendar;

pub fn sample_events() -> Vec<Event> {
    vec![
        Event {
            id: EventId::Number(1),
            title: "Team Meeting".to_string(),
            date: "2025-06-24".to_string(),
            time: Some("10:00".to_string()),
            duration: Some(EventDuration::Minutes(60)),
            location: Some("CC 8".to_string()),
            description: Some("Weekly team sync to discuss project progress".to_string()),
            attendees: vec!["Swathi".to_string(), "Swetha".to_string(), "Tharani".to_string()],
            priority: Priority::High,
            category: "meeting".to_string(),
            color: Some("blue".to_string()),
            calendar: Some("work".to_string()),
            all_day: false,
        },
        Event {
            id: EventId::Number(2),
            title: "Project Review".to_string(),
            date: "2025-06-24".to_string(),
            time: Some("14:00".to_string()),
            duration: Some(EventDuration::Minutes(90)),
            location: Some("Main Hall".to_string()),
            description: Some("Q2 project review meeting with stakeholders".to_string()),
            attendees: vec!["Tamil".to_string(), "Vishnu".to_string()],
            priority: Priority::High,
            category: "review".to_string(),
            color: Some("red".to_string()),
            calendar: Some("work".to_string()),
            all_day: false,
        },
        Event {
            id: EventId::Number(3),
            title: "Lunch with Friends".to_string(),
            date: "2025-06-25".to_string(),
            time: Some("12:30".to_string()),
            duration: Some(EventDuration::Minutes(60)),
            location: Some("Downtown Cafe".to_string()),
            description: Some("Catch up lunch".to_string()),
            attendees: Vec::new(),
            priority: Priority::Medium,
            category: "personal".to_string(),
            color: Some("green".to_string()),
            calendar: Some("personal".to_string()),
            all_day: false,
        },
        Event {
            id: EventId::Number(4),
            title: "Sister's Birthday".to_string(),
            date: "2025-06-26".to_string(),
            time: Some("00:00".to_string()),
            duration: Some(EventDuration::Minutes(1440)),
            location: None,
            description: Some("All day celebration".to_string()),
            attendees: Vec::new(),
            priority: Priority::High,
            category: "birthday".to_string(),
            color: Some("purple".to_string()),
            calendar: Some("family".to_string()),
            all_day: true,
        },
    ]
}

pub fn default_calendars() -> Vec<Calendar> {
    [
        ("personal", "Personal", EventColor::Blue, true),
        ("work", "Work", EventColor::Red, true),
        ("family", "Family", EventColor::Green, true),
        ("birthdays", "Birthdays", EventColor::Purple, true),
        ("holidays", "Holidays", EventColor::Orange, false),
    ]
    .into_iter()
    .map(|(id, name, color, enabled)| Calendar {
        id: id.to_string(),
        name: name.to_string(),
        color,
        enabled,
    })
    .collect()
}
