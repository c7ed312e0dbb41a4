mod conflict;
mod config;
mod domain;
mod error;
mod grid;
mod index;
mod logging;
mod sample;
mod stats;
mod storage;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::{Config, resolve_config_path, resolve_events_path, state_dir};
use crate::conflict::{ConflictPolicy, conflict_pairs, conflicting_ids};
use crate::domain::{DATE_FORMAT, Event, EventStore};
use crate::grid::{DAY_NAMES, MonthOffset, layout_month, month_name};
use crate::index::{events_in_month, events_on_date, visible_events};
use crate::logging::{LOG_FILE, LogTarget, init_logging};
use crate::stats::{format_minutes, month_stats, year_summary};
use crate::storage::{find_issues, load_events_or_sample};
use crate::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "gridcal", about = "Terminal month and year calendar")]
struct Cli {
	/// Config file, overrides GRIDCAL_CONFIG.
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	/// JSON event list, overrides GRIDCAL_EVENTS and events_path.
	#[arg(long, global = true)]
	events: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	/// Print the month grid with event markers.
	Grid {
		#[arg(long)]
		year: Option<i32>,
		#[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
		month: Option<u32>,
	},
	/// List the events of one day.
	Day {
		#[arg(long)]
		date: Option<String>,
	},
	Stats {
		#[arg(long)]
		year: Option<i32>,
		#[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
		month: Option<u32>,
	},
	Year {
		#[arg(long)]
		year: Option<i32>,
	},
	/// Report events the calendar cannot place.
	Validate,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let command = cli.command.unwrap_or(Command::Dashboard);

	let config = match resolve_config_path(cli.config) {
		Some(path) => Config::load(&path)?,
		None => Config::default(),
	};

	let target = match command {
		Command::Dashboard => LogTarget::File(state_dir().join(LOG_FILE)),
		_ => LogTarget::Stderr,
	};
	let default_level = match (&command, config.log_level.as_deref()) {
		(_, Some(level)) => level,
		(Command::Dashboard, None) => "info",
		(_, None) => "warn",
	};
	if let Err(err) = init_logging(default_level, target) {
		eprintln!("warning: logging disabled: {err}");
	}

	let events_path = resolve_events_path(cli.events, &config);
	let events = load_events_or_sample(events_path.as_deref());
	let today = Local::now().date_naive();
	debug!(%today, events = events.len(), "session loaded");

	match command {
		Command::Dashboard => {
			let mut store = EventStore::new(events, config.defaults.clone());
			run_dashboard(&mut store, config.calendars.clone(), config.conflicts)?;
		}
		Command::Grid { year, month } => {
			let visible = visible_events(&events, &config.calendars, "");
			let (year, month) = month_or_today(year, month, today);
			print_grid(&visible, year, month, today, &config.conflicts)?;
		}
		Command::Day { date } => {
			let visible = visible_events(&events, &config.calendars, "");
			let day = parse_day(date.as_deref(), today)?;
			print_day(&visible, day, &config.conflicts);
		}
		Command::Stats { year, month } => {
			let visible = visible_events(&events, &config.calendars, "");
			let (year, month) = month_or_today(year, month, today);
			print_stats(&visible, year, month, today, &config.conflicts);
		}
		Command::Year { year } => {
			let visible = visible_events(&events, &config.calendars, "");
			print_year(&visible, year.unwrap_or(today.year()), &config.conflicts);
		}
		Command::Validate => {
			print_issues(&events);
		}
	}

	Ok(())
}

/// Zero-based month from the human 1-12 flag, defaulting to the current month.
fn month_or_today(year: Option<i32>, month: Option<u32>, today: NaiveDate) -> (i32, u32) {
	(
		year.unwrap_or(today.year()),
		month.map(|month| month - 1).unwrap_or(today.month0()),
	)
}

fn parse_day(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)?)
	} else {
		Ok(today)
	}
}

fn print_grid(
	events: &[&Event],
	year: i32,
	month: u32,
	today: NaiveDate,
	policy: &ConflictPolicy,
) -> Result<(), Box<dyn Error>> {
	let cells = layout_month(year, month, today, events.iter().copied(), policy)?;

	println!("{} {}", month_name(month), year);
	println!(
		"{}",
		DAY_NAMES
			.iter()
			.map(|name| format!("{:>4}", &name[..2]))
			.collect::<String>()
	);
	for week in cells.chunks(7) {
		let row = week
			.iter()
			.map(|day| {
				if day.cell.month_offset != MonthOffset::Current {
					return format!("({:>2})", day.cell.day_number);
				}
				let marker = if day.has_conflict {
					'!'
				} else if day.cell.is_today {
					'<'
				} else if !day.events.is_empty() {
					'*'
				} else {
					' '
				};
				format!(" {:>2}{marker}", day.cell.day_number)
			})
			.collect::<String>();
		println!("{row}");
	}

	let in_month = events_in_month(events.iter().copied(), year, month);
	if in_month.is_empty() {
		println!("\nno events this month");
		return Ok(());
	}

	let conflicts = cells
		.iter()
		.filter(|day| day.cell.month_offset == MonthOffset::Current && day.has_conflict)
		.flat_map(|day| conflicting_ids(day.events.iter().copied(), policy))
		.collect::<std::collections::HashSet<_>>();
	println!();
	for event in sorted(in_month) {
		println!(
			"{} | {:<8} | {}{}",
			event.date,
			event.time_label(),
			event.title,
			if conflicts.contains(&event.id) { " (conflict)" } else { "" }
		);
	}

	Ok(())
}

fn print_day(events: &[&Event], day: NaiveDate, policy: &ConflictPolicy) {
	let on_day = sorted(events_on_date(events.iter().copied(), day.year(), day.month0(), day.day()));

	println!("{}", day.format("%A, %B %-d, %Y"));
	if on_day.is_empty() {
		println!("no events");
		return;
	}

	let conflicts = conflicting_ids(on_day.iter().copied(), policy);
	for event in &on_day {
		let mut line = format!("{} {:<8} | {}", event.id, event.time_label(), event.title);
		if let Some(duration) = event.duration_label() {
			line.push_str(&format!(" | {duration}"));
		}
		if let Some(location) = &event.location {
			line.push_str(&format!(" | {location}"));
		}
		if conflicts.contains(&event.id) {
			line.push_str(" | conflict");
		}
		println!("{line}");
	}

	for (left, right) in conflict_pairs(on_day.iter().copied(), policy) {
		println!("overlap: {} and {}", left.title, right.title);
	}
}

fn print_stats(events: &[&Event], year: i32, month: u32, today: NaiveDate, policy: &ConflictPolicy) {
	let stats = month_stats(events.iter().copied(), year, month, today, policy);

	println!("{} {}", month_name(month), year);
	println!("total events: {}", stats.total_events);
	println!("active days:  {}", stats.active_days);
	println!("conflicts:    {}", stats.conflict_days);
	println!("total time:   {}", format_minutes(stats.total_minutes));

	if stats.upcoming.is_empty() {
		return;
	}
	println!("\nupcoming:");
	for event in &stats.upcoming {
		println!("{} {} | {}", event.date, event.time_label(), event.title);
	}
}

fn print_year(events: &[&Event], year: i32, policy: &ConflictPolicy) {
	println!("{year}");
	for summary in year_summary(events.iter().copied(), year, policy) {
		println!(
			"{:<10} {:>3} events {:>3} conflict days",
			month_name(summary.month),
			summary.events,
			summary.conflict_days
		);
	}
}

fn print_issues(events: &[Event]) {
	let issues = find_issues(events);
	if issues.is_empty() {
		println!("{} events, no issues", events.len());
		return;
	}

	for issue in &issues {
		println!("{issue}");
	}
	println!("{} of {} events have issues", issues.len(), events.len());
}

fn sorted(mut events: Vec<&Event>) -> Vec<&Event> {
	events.sort_by(|left, right| {
		left.date
			.cmp(&right.date)
			.then_with(|| left.start_time().cmp(&right.start_time()))
	});
	events
}
