//! Month grid construction.
//!
//! Months are zero-based throughout this module (0 = January, 11 = December)
//! and weeks start on Sunday.

use chrono::{Datelike, Duration, NaiveDate};

use crate::conflict::{ConflictPolicy, has_conflict};
use crate::domain::{DATE_FORMAT, Event};
use crate::error::CalendarError;
use crate::index::group_by_date;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonthOffset {
    Previous,
    Current,
    Next,
}

/// One square of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub date: NaiveDate,
    pub day_number: u32,
    pub month_offset: MonthOffset,
    pub is_today: bool,
}

/// A grid cell with the events that fall on its date.
#[derive(Debug, Clone)]
pub struct DayCell<'a> {
    pub cell: GridCell,
    pub events: Vec<&'a Event>,
    pub has_conflict: bool,
}

/// Builds the cells for `month` of `year`, padded with the neighbouring
/// months' days to complete weeks.
///
/// Only `Current` cells are ever marked as today.
pub fn build_month_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<Vec<GridCell>, CalendarError> {
    let first = first_of_month(year, month)?;
    let month_days = days_in_month(year, month)?;
    let first_weekday = first.weekday().num_days_from_sunday();

    let total = (first_weekday + month_days).div_ceil(7) * 7;
    let mut cells = Vec::with_capacity(total as usize);

    let (prev_year, prev_month) = adjacent_month(year, month, -1);
    let prev_days = days_in_month(prev_year, prev_month)?;
    for index in 0..first_weekday {
        let day = prev_days - (first_weekday - index - 1);
        cells.push(GridCell {
            date: date_for(prev_year, prev_month, day)?,
            day_number: day,
            month_offset: MonthOffset::Previous,
            is_today: false,
        });
    }

    for day in 1..=month_days {
        let date = date_for(year, month, day)?;
        cells.push(GridCell {
            date,
            day_number: day,
            month_offset: MonthOffset::Current,
            is_today: date == today,
        });
    }

    let (next_year, next_month) = adjacent_month(year, month, 1);
    let trailing = total - first_weekday - month_days;
    for day in 1..=trailing {
        cells.push(GridCell {
            date: date_for(next_year, next_month, day)?,
            day_number: day,
            month_offset: MonthOffset::Next,
            is_today: false,
        });
    }

    Ok(cells)
}

/// Grid cells paired with their events and a per-day conflict flag.
///
/// Adjacent-month cells carry their own date's events as well.
pub fn layout_month<'a>(
    year: i32,
    month: u32,
    today: NaiveDate,
    events: impl IntoIterator<Item = &'a Event>,
    policy: &ConflictPolicy,
) -> Result<Vec<DayCell<'a>>, CalendarError> {
    let cells = build_month_grid(year, month, today)?;
    let mut by_date = group_by_date(events);

    Ok(cells
        .into_iter()
        .map(|cell| {
            let key = cell.date.format(DATE_FORMAT).to_string();
            let events = by_date.remove(&key).unwrap_or_default();
            let has_conflict = has_conflict(events.iter().copied(), policy);
            DayCell {
                cell,
                events,
                has_conflict,
            }
        })
        .collect())
}

/// Day count of `month`, computed as the day before the first of the next month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32, CalendarError> {
    let (next_year, next_month) = adjacent_month(year, month, 1);
    let first_of_next = first_of_month(next_year, next_month)?;
    Ok((first_of_next - Duration::days(1)).day())
}

/// Moves `day` by `delta` months, clamping the day to the target month's length.
pub fn shift_month(day: NaiveDate, delta: i32) -> Option<NaiveDate> {
    let (year, month) = adjacent_month(day.year(), day.month0(), delta);
    let max_day = days_in_month(year, month).ok()?;
    NaiveDate::from_ymd_opt(year, month + 1, day.day().min(max_day))
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES.get(month as usize).copied().unwrap_or("Unknown")
}

/// Year and zero-based month `delta` months away, rolling the year over.
pub fn adjacent_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let total = year * 12 + month as i32 + delta;
    (total.div_euclid(12), total.rem_euclid(12) as u32)
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, CalendarError> {
    if month > 11 {
        return Err(CalendarError::InvalidArgument(format!(
            "month must be within 0..=11, got {month}"
        )));
    }
    NaiveDate::from_ymd_opt(year, month + 1, 1).ok_or_else(|| {
        CalendarError::InvalidArgument(format!("year {year} is outside the supported range"))
    })
}

fn date_for(year: i32, month: u32, day: u32) -> Result<NaiveDate, CalendarError> {
    NaiveDate::from_ymd_opt(year, month + 1, day).ok_or_else(|| {
        CalendarError::InvalidArgument(format!("{year}-{:02}-{day:02} is not a date", month + 1))
    })
}
