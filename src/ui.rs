use std::collections::HashSet;
use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::{debug, info, warn};

use crate::conflict::{ConflictPolicy, conflicting_ids};
use crate::domain::{DATE_FORMAT, Event, EventColor, EventDraft, EventId, EventStore, Priority, parse_clock};
use crate::error::CalendarError;
use crate::grid::{DayCell, GridCell, MonthOffset, build_month_grid, layout_month, month_name, shift_month};
use crate::index::{Calendar, events_on_date, visible_events};
use crate::stats::{MonthStats, MonthSummary, format_minutes, month_stats, year_summary};

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const TODAY_COLOR: Color = Color::Cyan;
const CONFLICT_COLOR: Color = Color::LightRed;
const MAX_CELL_EVENTS: usize = 3;
const WEEKDAY_HEADER: &str = "Su Mo Tu We Th Fr Sa";
const CATEGORIES: [&str; 5] = ["meeting", "client", "training", "review", "personal"];

pub fn run_dashboard(
	store: &mut EventStore,
	calendars: Vec<Calendar>,
	policy: ConflictPolicy,
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let mut app = App::new(calendars, policy, Local::now().date_naive());
	info!(events = store.events().len(), "dashboard started");
	let result = run_event_loop(&mut terminal, store, &mut app);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	store: &mut EventStore,
	app: &mut App,
) -> Result<(), Box<dyn Error>> {
	loop {
		app.today = Local::now().date_naive();

		let action = {
			let view = build_view(app, store.events())?;
			app.clamp_selection(&view);
			terminal.draw(|frame| draw_dashboard(frame, app, &view))?;

			if !event::poll(StdDuration::from_millis(250))? {
				continue;
			}
			let CEvent::Key(key) = event::read()? else {
				continue;
			};
			if key.kind != KeyEventKind::Press {
				continue;
			}
			handle_key(app, key.code, &view)
		};

		match action {
			Action::Quit => break,
			Action::Create(draft) => create_event(app, store, *draft),
			Action::None => {}
		}
	}

	info!("dashboard closed");
	Ok(())
}

fn create_event(app: &mut App, store: &mut EventStore, draft: EventDraft) {
	match store.create(draft, app.selected_day, Utc::now()) {
		Ok(event) => {
			if let Some(date) = event.parsed_date() {
				app.selected_day = date;
			}
			app.day_index = 0;
			app.status = format!("created event: {}", event.title);
		}
		Err(err) => {
			warn!(error = %err, "event creation rejected");
			app.status = format!("error: {err}");
		}
	}
}

fn handle_key(app: &mut App, code: KeyCode, view: &ViewModel) -> Action {
	match app.mode {
		InputMode::Normal => handle_normal_key(app, code, view),
		InputMode::Detail(_) => {
			if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
				app.mode = InputMode::Normal;
			}
			Action::None
		}
		InputMode::Prompt(_) => handle_prompt_key(app, code),
		InputMode::Select(_) => handle_select_key(app, code),
	}
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Length(26), Constraint::Min(40), Constraint::Length(36)])
		.split(layout[1]);

	let sidebar = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(10), Constraint::Min(4), Constraint::Length(3)])
		.split(body[0]);

	let right = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(8), Constraint::Length(11)])
		.split(body[2]);

	render_header(frame, layout[0], app, view);
	render_mini_calendar(frame, sidebar[0], app, view);
	render_calendar_toggles(frame, sidebar[1], app);
	render_search(frame, sidebar[2], app);
	match app.view {
		ViewMode::Month => render_month_grid(frame, body[1], app, view),
		ViewMode::Year => render_year_grid(frame, body[1], app, view),
	}
	render_day_panel(frame, right[0], app, view);
	render_stats_panel(frame, right[1], view);
	render_footer(frame, layout[2], app);

	match &app.mode {
		InputMode::Select(select) => render_select_popup(frame, select),
		InputMode::Detail(id) => {
			if let Some(event) = view.day_events.iter().find(|event| &event.id == id) {
				render_detail_popup(frame, event, view.day_conflicts.contains(id));
			}
		}
		InputMode::Normal | InputMode::Prompt(_) => {}
	}
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let period = match app.view {
		ViewMode::Month => format!("{} {}", month_name(app.selected_day.month0()), app.selected_day.year()),
		ViewMode::Year => app.selected_day.year().to_string(),
	};
	let mut spans = vec![
		Span::styled(period, Style::default().add_modifier(Modifier::BOLD)),
		Span::raw(format!(
			" | {} view | today {}",
			app.view.label(),
			app.today.format("%A, %B %-d, %Y")
		)),
	];
	if view.hidden > 0 {
		spans.push(Span::styled(
			format!(" | {} hidden by filters", view.hidden),
			Style::default().fg(Color::DarkGray),
		));
	}

	let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Calendar"));
	frame.render_widget(header, area);
}

fn render_mini_calendar(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let mut lines = Vec::new();
	lines.push(Line::from(format!(
		"{} {}",
		month_name(app.selected_day.month0()),
		app.selected_day.year()
	)));
	lines.push(Line::from(WEEKDAY_HEADER));

	for week in view.month_cells.chunks(7) {
		let spans = week
			.iter()
			.map(|day| {
				if day.cell.month_offset != MonthOffset::Current {
					return Span::raw("   ");
				}
				let mut style = Style::default();
				if day.cell.date == app.selected_day {
					style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
				} else if day.cell.is_today {
					style = style.fg(Color::Black).bg(TODAY_COLOR);
				} else if !day.events.is_empty() {
					style = style.fg(Color::LightYellow).add_modifier(Modifier::BOLD);
				}
				Span::styled(format!("{:>2} ", day.cell.day_number), style)
			})
			.collect::<Vec<_>>();
		lines.push(Line::from(spans));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Mini")
		.border_style(border_style(false));
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_calendar_toggles(frame: &mut Frame, area: Rect, app: &App) {
	let items = app
		.calendars
		.iter()
		.map(|calendar| {
			let mark = if calendar.enabled { "[x]" } else { "[ ]" };
			ListItem::new(Line::from(vec![
				Span::raw(format!("{mark} ")),
				Span::styled(calendar.name.clone(), Style::default().fg(color_of(calendar.color))),
			]))
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if app.focus == FocusPane::Sidebar && !app.calendars.is_empty() {
		state.select(Some(app.calendar_index.min(app.calendars.len() - 1)));
	}

	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no calendars)")]
	} else {
		items
	})
	.block(
		Block::default()
			.borders(Borders::ALL)
			.title("My Calendars")
			.border_style(border_style(app.focus == FocusPane::Sidebar)),
	)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_search(frame: &mut Frame, area: Rect, app: &App) {
	let text = if app.search.is_empty() {
		Line::from(Span::styled("/ to search", Style::default().fg(Color::DarkGray)))
	} else {
		Line::from(app.search.clone())
	};
	frame.render_widget(
		Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Search")),
		area,
	);
}

fn render_month_grid(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let block = Block::default()
		.borders(Borders::ALL)
		.title(format!("{} {}", month_name(app.selected_day.month0()), app.selected_day.year()))
		.border_style(border_style(app.focus == FocusPane::Grid));
	let inner = block.inner(area);
	frame.render_widget(block, area);

	let weeks = (view.month_cells.len() / 7).max(1);
	let mut row_constraints = vec![Constraint::Length(1)];
	row_constraints.extend((0..weeks).map(|_| Constraint::Ratio(1, weeks as u32)));
	let rows = Layout::default()
		.direction(Direction::Vertical)
		.constraints(row_constraints)
		.split(inner);
	let column_constraints = [Constraint::Ratio(1, 7); 7];

	let header_columns = Layout::default()
		.direction(Direction::Horizontal)
		.constraints(column_constraints)
		.split(rows[0]);
	for (index, name) in crate::grid::DAY_NAMES.iter().enumerate() {
		let style = if index == 0 || index == 6 {
			Style::default().fg(Color::Gray)
		} else {
			Style::default().add_modifier(Modifier::BOLD)
		};
		frame.render_widget(Paragraph::new(Span::styled(&name[..3], style)), header_columns[index]);
	}

	for (week_index, week) in view.month_cells.chunks(7).enumerate() {
		let columns = Layout::default()
			.direction(Direction::Horizontal)
			.constraints(column_constraints)
			.split(rows[week_index + 1]);
		for (day, column) in week.iter().zip(columns.iter()) {
			render_grid_cell(frame, *column, app, day);
		}
	}
}

fn render_grid_cell(frame: &mut Frame, area: Rect, app: &App, day: &DayCell) {
	let outside = day.cell.month_offset != MonthOffset::Current;
	let selected = day.cell.date == app.selected_day;

	let border = if selected {
		Style::default().fg(FOCUSED_PANEL_BORDER_COLOR).add_modifier(Modifier::BOLD)
	} else if day.cell.is_today {
		Style::default().fg(TODAY_COLOR)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	};
	let mut title = vec![Span::styled(
		day.cell.day_number.to_string(),
		if outside {
			Style::default().fg(Color::DarkGray)
		} else if day.cell.is_today {
			Style::default().fg(TODAY_COLOR).add_modifier(Modifier::BOLD)
		} else {
			Style::default()
		},
	)];
	if day.has_conflict {
		title.push(Span::styled(" !", Style::default().fg(CONFLICT_COLOR).add_modifier(Modifier::BOLD)));
	}

	let conflicts = if day.has_conflict {
		conflicting_ids(day.events.iter().copied(), &app.policy)
	} else {
		HashSet::new()
	};

	let mut lines = day
		.events
		.iter()
		.take(MAX_CELL_EVENTS)
		.map(|event| {
			let style = if outside {
				Style::default().fg(Color::DarkGray)
			} else {
				event_style(event)
			};
			let marker = if conflicts.contains(&event.id) { "!" } else { "" };
			Line::from(vec![
				Span::styled(marker, Style::default().fg(CONFLICT_COLOR)),
				Span::styled(event.title.clone(), style),
			])
		})
		.collect::<Vec<_>>();
	if day.events.len() > MAX_CELL_EVENTS {
		lines.push(Line::from(Span::styled(
			format!("+{} more", day.events.len() - MAX_CELL_EVENTS),
			Style::default().fg(Color::Gray),
		)));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title(Line::from(title))
		.border_style(border);
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_year_grid(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let block = Block::default()
		.borders(Borders::ALL)
		.title(app.selected_day.year().to_string())
		.border_style(border_style(app.focus == FocusPane::Grid));
	let inner = block.inner(area);
	frame.render_widget(block, area);

	let rows = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Ratio(1, 3); 3])
		.split(inner);
	for (row_index, row) in rows.iter().enumerate() {
		let columns = Layout::default()
			.direction(Direction::Horizontal)
			.constraints([Constraint::Ratio(1, 4); 4])
			.split(*row);
		for (column_index, column) in columns.iter().enumerate() {
			let month = (row_index * 4 + column_index) as u32;
			if let (Some(grid), Some(summary)) = (
				view.year_grids.get(month as usize),
				view.year_summary.get(month as usize),
			) {
				render_year_month(frame, *column, app, grid, summary);
			}
		}
	}
}

fn render_year_month(frame: &mut Frame, area: Rect, app: &App, grid: &[GridCell], summary: &MonthSummary) {
	let selected = summary.month == app.selected_day.month0();
	let mut lines = vec![Line::from(Span::styled(WEEKDAY_HEADER, Style::default().fg(Color::Gray)))];
	for week in grid.chunks(7) {
		let spans = week
			.iter()
			.map(|cell| {
				if cell.month_offset != MonthOffset::Current {
					return Span::raw("   ");
				}
				let style = if cell.is_today {
					Style::default().fg(Color::Black).bg(TODAY_COLOR)
				} else if selected && cell.date == app.selected_day {
					Style::default().fg(Color::Black).bg(Color::Yellow)
				} else {
					Style::default()
				};
				Span::styled(format!("{:>2} ", cell.day_number), style)
			})
			.collect::<Vec<_>>();
		lines.push(Line::from(spans));
	}

	let mut counts = vec![Span::raw(format!("{} events", summary.events))];
	if summary.conflict_days > 0 {
		counts.push(Span::styled(
			format!(" | {} conflicts", summary.conflict_days),
			Style::default().fg(CONFLICT_COLOR),
		));
	}
	lines.push(Line::from(counts));

	let block = Block::default()
		.borders(Borders::ALL)
		.title(month_name(summary.month))
		.border_style(if selected {
			Style::default().fg(FOCUSED_PANEL_BORDER_COLOR).add_modifier(Modifier::BOLD)
		} else {
			Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
		});
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_day_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let mut items = view
		.day_events
		.iter()
		.map(|event| {
			let conflict = view.day_conflicts.contains(&event.id);
			let mut spans = vec![
				Span::styled(
					if conflict { "! " } else { "  " },
					Style::default().fg(CONFLICT_COLOR).add_modifier(Modifier::BOLD),
				),
				Span::styled(format!("{:<9}", event.time_label()), Style::default().fg(Color::Gray)),
				Span::styled(event.title.clone(), event_style(event)),
			];
			if let Some(location) = &event.location {
				spans.push(Span::styled(format!(" @ {location}"), Style::default().fg(Color::DarkGray)));
			}
			ListItem::new(Line::from(spans))
		})
		.collect::<Vec<_>>();

	if items.is_empty() {
		items.push(ListItem::new("(no events for selected day)"));
	}

	let mut state = ListState::default();
	if app.focus == FocusPane::Day && !view.day_events.is_empty() {
		state.select(Some(app.day_index.min(view.day_events.len() - 1)));
	}

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(app.selected_day.format("%A, %d %B %Y").to_string())
				.border_style(border_style(app.focus == FocusPane::Day)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_stats_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let stats = &view.stats;
	let mut lines = vec![
		Line::from(format!("Total events: {}", stats.total_events)),
		Line::from(format!("Active days:  {}", stats.active_days)),
		Line::from(vec![
			Span::raw("Conflicts:    "),
			Span::styled(
				stats.conflict_days.to_string(),
				if stats.conflict_days > 0 {
					Style::default().fg(CONFLICT_COLOR).add_modifier(Modifier::BOLD)
				} else {
					Style::default()
				},
			),
		]),
		Line::from(format!("Total time:   {}", format_minutes(stats.total_minutes))),
		Line::from(""),
		Line::from("Upcoming"),
	];

	if stats.upcoming.is_empty() {
		lines.push(Line::from(Span::styled(
			"(no upcoming events this month)",
			Style::default().fg(Color::DarkGray),
		)));
	}
	for event in &stats.upcoming {
		let when = event
			.parsed_date()
			.map(|date| date.format("%b %-d").to_string())
			.unwrap_or_else(|| event.date.clone());
		lines.push(Line::from(vec![
			Span::raw(format!("{when} {} ", event.time_label())),
			Span::styled(event.title.clone(), event_style(event)),
		]));
	}

	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Month Overview"));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab pane | arrows/hjkl move | n/N next/prev | t today | v month/year | q quit"),
			Line::from("a add event | / search | Esc clear search | space toggle calendar | Enter open"),
			Line::from(app.status.clone()),
		],
		InputMode::Detail(_) => vec![
			Line::from("Event details"),
			Line::from("Esc or Enter close"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from(format!("Enter submit | Esc cancel | {}", app.status)),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_detail_popup(frame: &mut Frame, event: &Event, in_conflict: bool) {
	let area = centered_rect(60, 60, frame.area());
	frame.render_widget(Clear, area);

	let label = Style::default().fg(Color::Gray);
	let date = event
		.parsed_date()
		.map(|date| date.format("%A, %B %-d, %Y").to_string())
		.unwrap_or_else(|| event.date.clone());
	let time = match event.duration_label() {
		Some(duration) => format!("{} ({duration})", event.time_label()),
		None => event.time_label(),
	};

	let mut lines = vec![
		Line::from(Span::styled(event.title.clone(), event_style(event).add_modifier(Modifier::BOLD))),
		Line::from(vec![
			Span::styled(
				format!("{} priority", capitalize(event.priority.as_str())),
				Style::default().fg(priority_color(event.priority)),
			),
			Span::raw(if event.category.is_empty() {
				String::new()
			} else {
				format!(" | {}", event.category)
			}),
		]),
		Line::from(""),
		Line::from(vec![Span::styled("Date:      ", label), Span::raw(date)]),
		Line::from(vec![Span::styled("Time:      ", label), Span::raw(time)]),
	];
	if let Some(location) = &event.location {
		lines.push(Line::from(vec![Span::styled("Location:  ", label), Span::raw(location.clone())]));
	}
	if !event.attendees.is_empty() {
		lines.push(Line::from(vec![
			Span::styled("Attendees: ", label),
			Span::raw(event.attendees.join(", ")),
		]));
	}
	if let Some(calendar) = &event.calendar {
		lines.push(Line::from(vec![Span::styled("Calendar:  ", label), Span::raw(calendar.clone())]));
	}
	if let Some(description) = &event.description {
		lines.push(Line::from(""));
		lines.push(Line::from(description.clone()));
	}
	if in_conflict {
		lines.push(Line::from(""));
		lines.push(Line::from(Span::styled(
			"Overlaps another event on this day",
			Style::default().fg(CONFLICT_COLOR).add_modifier(Modifier::BOLD),
		)));
	}

	let popup = Paragraph::new(lines)
		.wrap(Wrap { trim: true })
		.block(Block::default().borders(Borders::ALL).title(format!("Event {}", event.id)));
	frame.render_widget(popup, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(50, 50, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(app: &mut App, code: KeyCode, view: &ViewModel) -> Action {
	match code {
		KeyCode::Char('q') => return Action::Quit,
		KeyCode::Esc => {
			if app.search.is_empty() {
				return Action::Quit;
			}
			app.search.clear();
			app.status = "Search cleared".to_string();
		}
		KeyCode::Tab => app.focus = app.focus.next(),
		KeyCode::BackTab => app.focus = app.focus.prev(),
		KeyCode::Up | KeyCode::Char('k') => match app.focus {
			FocusPane::Grid => app.move_grid(-7, -4),
			FocusPane::Day => app.move_day_selection(-1, view),
			FocusPane::Sidebar => app.move_calendar_selection(-1),
		},
		KeyCode::Down | KeyCode::Char('j') => match app.focus {
			FocusPane::Grid => app.move_grid(7, 4),
			FocusPane::Day => app.move_day_selection(1, view),
			FocusPane::Sidebar => app.move_calendar_selection(1),
		},
		KeyCode::Left | KeyCode::Char('h') => {
			if app.focus == FocusPane::Grid {
				app.move_grid(-1, -1);
			}
		}
		KeyCode::Right | KeyCode::Char('l') => {
			if app.focus == FocusPane::Grid {
				app.move_grid(1, 1);
			}
		}
		KeyCode::Char('n') => app.shift_period(1),
		KeyCode::Char('N') => app.shift_period(-1),
		KeyCode::Char('t') => {
			app.selected_day = app.today;
			app.day_index = 0;
			app.status = "Jumped to today".to_string();
		}
		KeyCode::Char('v') => {
			app.view = app.view.toggle();
			app.status = format!("{} view", app.view.label());
		}
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new(
				"Event title",
				PromptKind::Draft {
					field: DraftField::Title,
					draft: Box::default(),
				},
			));
		}
		KeyCode::Char('/') => {
			app.mode = InputMode::Prompt(PromptState::with_input("Search events", PromptKind::Search, app.search.clone()));
		}
		KeyCode::Char(' ') => {
			if app.focus == FocusPane::Sidebar {
				app.status = app.toggle_calendar();
			} else {
				app.status = "Focus My Calendars to toggle a calendar".to_string();
			}
		}
		KeyCode::Enter => match app.focus {
			FocusPane::Grid if app.view == ViewMode::Year => {
				app.view = ViewMode::Month;
				app.status = format!("Month view: {}", month_name(app.selected_day.month0()));
			}
			FocusPane::Grid => {
				app.focus = FocusPane::Day;
				app.day_index = 0;
			}
			FocusPane::Day => match view.day_events.get(app.day_index) {
				Some(event) => {
					debug!(id = %event.id, "opening event details");
					app.mode = InputMode::Detail(event.id.clone());
				}
				None => app.status = "No event selected".to_string(),
			},
			FocusPane::Sidebar => app.status = app.toggle_calendar(),
		},
		_ => {}
	}
	Action::None
}

fn handle_prompt_key(app: &mut App, code: KeyCode) -> Action {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				other => {
					app.mode = other;
					return Action::None;
				}
			};

			match submit_prompt(prompt.clone(), app) {
				Ok(outcome) => return apply_outcome(app, outcome),
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	Action::None
}

fn handle_select_key(app: &mut App, code: KeyCode) -> Action {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				other => {
					app.mode = other;
					return Action::None;
				}
			};

			match submit_select(select.clone(), app) {
				Ok(outcome) => return apply_outcome(app, outcome),
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	Action::None
}

fn apply_outcome(app: &mut App, outcome: Outcome) -> Action {
	match outcome {
		Outcome::Prompt(prompt) => {
			app.mode = InputMode::Prompt(prompt);
			app.status.clear();
			Action::None
		}
		Outcome::Select(select) => {
			app.mode = InputMode::Select(select);
			app.status.clear();
			Action::None
		}
		Outcome::Done(message) => {
			app.mode = InputMode::Normal;
			app.status = message;
			Action::None
		}
		Outcome::Create(draft) => {
			app.mode = InputMode::Normal;
			Action::Create(draft)
		}
	}
}

fn submit_prompt(prompt: PromptState, app: &mut App) -> Result<Outcome, String> {
	let (field, mut draft) = match prompt.kind {
		PromptKind::Search => {
			app.search = prompt.input.trim().to_string();
			app.day_index = 0;
			return Ok(Outcome::Done(if app.search.is_empty() {
				"Search cleared".to_string()
			} else {
				format!("Searching for \"{}\"", app.search)
			}));
		}
		PromptKind::Draft { field, draft } => (field, draft),
	};

	match field {
		DraftField::Title => {
			draft.title = required_text(&prompt.input, "event title")?;
			let date = app.selected_day.format(DATE_FORMAT).to_string();
			Ok(Outcome::Prompt(PromptState::with_input(
				"Date (YYYY-MM-DD)",
				PromptKind::Draft {
					field: DraftField::Date,
					draft,
				},
				date,
			)))
		}
		DraftField::Date => {
			let date = required_text(&prompt.input, "date")?;
			NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|_| format!("invalid date: {date}"))?;
			draft.date = Some(date);
			Ok(Outcome::Select(build_all_day_select(draft)))
		}
		DraftField::Start => {
			let start = required_text(&prompt.input, "start time")?;
			parse_clock(&start).map_err(|err| err.to_string())?;
			draft.start = Some(start);
			Ok(Outcome::Prompt(PromptState::with_input(
				"End time (HH:MM, optional)",
				PromptKind::Draft {
					field: DraftField::End,
					draft,
				},
				"10:00",
			)))
		}
		DraftField::End => {
			let end = optional_text(&prompt.input);
			if let Some(end) = &end {
				parse_clock(end).map_err(|err| err.to_string())?;
			}
			draft.end = end;
			Ok(Outcome::Prompt(location_prompt(draft)))
		}
		DraftField::Location => {
			draft.location = optional_text(&prompt.input);
			Ok(Outcome::Prompt(PromptState::new(
				"Description (optional)",
				PromptKind::Draft {
					field: DraftField::Description,
					draft,
				},
			)))
		}
		DraftField::Description => {
			draft.description = optional_text(&prompt.input);
			Ok(Outcome::Prompt(PromptState::new(
				"Guests, comma separated (optional)",
				PromptKind::Draft {
					field: DraftField::Guests,
					draft,
				},
			)))
		}
		DraftField::Guests => {
			draft.guests = optional_text(&prompt.input);
			Ok(Outcome::Select(build_priority_select(draft)))
		}
	}
}

fn submit_select(select: SelectState, app: &mut App) -> Result<Outcome, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	let SelectKind::Draft { field, mut draft } = select.kind;
	match field {
		SelectField::AllDay => {
			draft.all_day = selected_value.as_deref() == Some("yes");
			if draft.all_day {
				Ok(Outcome::Prompt(location_prompt(draft)))
			} else {
				Ok(Outcome::Prompt(PromptState::with_input(
					"Start time (HH:MM)",
					PromptKind::Draft {
						field: DraftField::Start,
						draft,
					},
					"09:00",
				)))
			}
		}
		SelectField::Priority => {
			draft.priority = selected_value.as_deref().and_then(Priority::parse);
			Ok(Outcome::Select(build_category_select(draft)))
		}
		SelectField::Category => {
			draft.category = selected_value;
			Ok(Outcome::Select(build_color_select(draft)))
		}
		SelectField::Color => {
			draft.color = selected_value.as_deref().and_then(EventColor::parse);
			Ok(Outcome::Select(build_calendar_select(draft, &app.calendars)))
		}
		SelectField::Calendar => {
			draft.calendar = selected_value;
			Ok(Outcome::Create(draft))
		}
	}
}

fn location_prompt(draft: Box<EventDraft>) -> PromptState {
	PromptState::new(
		"Location (optional)",
		PromptKind::Draft {
			field: DraftField::Location,
			draft,
		},
	)
}

fn build_all_day_select(draft: Box<EventDraft>) -> SelectState {
	let options = vec![
		SelectOption::new("Timed event", Some("no".to_string()), Style::default()),
		SelectOption::new("All day", Some("yes".to_string()), Style::default()),
	];
	SelectState::new("All day?", SelectKind::Draft { field: SelectField::AllDay, draft }, options)
}

fn build_priority_select(draft: Box<EventDraft>) -> SelectState {
	let options = Priority::ALL
		.into_iter()
		.map(|priority| {
			SelectOption::new(
				format!("{} priority", capitalize(priority.as_str())),
				Some(priority.as_str().to_string()),
				Style::default().fg(priority_color(priority)),
			)
		})
		.collect::<Vec<_>>();
	let mut select = SelectState::new("Priority", SelectKind::Draft { field: SelectField::Priority, draft }, options);
	select.selected = 1;
	select
}

fn build_category_select(draft: Box<EventDraft>) -> SelectState {
	let options = CATEGORIES
		.into_iter()
		.map(|category| SelectOption::new(capitalize(category), Some(category.to_string()), Style::default()))
		.collect::<Vec<_>>();
	SelectState::new("Category", SelectKind::Draft { field: SelectField::Category, draft }, options)
}

fn build_color_select(draft: Box<EventDraft>) -> SelectState {
	let options = EventColor::ALL
		.into_iter()
		.map(|color| {
			SelectOption::new(
				format!("████████ {}", color.as_str()),
				Some(color.as_str().to_string()),
				Style::default().fg(color_of(color)),
			)
		})
		.collect::<Vec<_>>();
	SelectState::new("Event color", SelectKind::Draft { field: SelectField::Color, draft }, options)
}

fn build_calendar_select(draft: Box<EventDraft>, calendars: &[Calendar]) -> SelectState {
	let mut options = vec![SelectOption::new("No calendar", None, Style::default().fg(Color::Gray))];
	for calendar in calendars {
		options.push(SelectOption::new(
			calendar.name.clone(),
			Some(calendar.id.clone()),
			Style::default().fg(color_of(calendar.color)),
		));
	}
	SelectState::new("Calendar", SelectKind::Draft { field: SelectField::Calendar, draft }, options)
}

fn build_view<'a>(app: &App, events: &'a [Event]) -> Result<ViewModel<'a>, CalendarError> {
	let visible = visible_events(events, &app.calendars, &app.search);
	let year = app.selected_day.year();
	let month = app.selected_day.month0();

	let month_cells = layout_month(year, month, app.today, visible.iter().copied(), &app.policy)?;
	let day_events = events_on_date(visible.iter().copied(), year, month, app.selected_day.day());
	let day_conflicts = conflicting_ids(day_events.iter().copied(), &app.policy);
	let stats = month_stats(visible.iter().copied(), year, month, app.today, &app.policy);
	let year_summary = year_summary(visible.iter().copied(), year, &app.policy);
	let year_grids = match app.view {
		ViewMode::Year => (0..12)
			.map(|month| build_month_grid(year, month, app.today))
			.collect::<Result<Vec<_>, _>>()?,
		ViewMode::Month => Vec::new(),
	};

	Ok(ViewModel {
		month_cells,
		day_events,
		day_conflicts,
		stats,
		year_summary,
		year_grids,
		hidden: events.len() - visible.len(),
	})
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn capitalize(value: &str) -> String {
	let mut chars = value.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

fn event_style(event: &Event) -> Style {
	let color = event
		.color_tag()
		.map(color_of)
		.unwrap_or_else(|| priority_color(event.priority));
	Style::default().fg(color)
}

fn color_of(color: EventColor) -> Color {
	match color {
		EventColor::Blue => Color::LightBlue,
		EventColor::Red => Color::LightRed,
		EventColor::Green => Color::LightGreen,
		EventColor::Purple => Color::LightMagenta,
		EventColor::Orange => Color::Rgb(255, 165, 0),
		EventColor::Yellow => Color::Yellow,
		EventColor::Pink => Color::Rgb(255, 105, 180),
		EventColor::Indigo => Color::Rgb(99, 102, 241),
	}
}

fn priority_color(priority: Priority) -> Color {
	match priority {
		Priority::High => Color::LightRed,
		Priority::Medium => Color::Yellow,
		Priority::Low => Color::Green,
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug)]
enum Action {
	None,
	Quit,
	Create(Box<EventDraft>),
}

#[derive(Debug, Clone)]
enum Outcome {
	Prompt(PromptState),
	Select(SelectState),
	Create(Box<EventDraft>),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self::with_input(title, kind, String::new())
	}

	fn with_input(title: impl Into<String>, kind: PromptKind, input: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			input: input.into(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	Search,
	Draft {
		field: DraftField,
		draft: Box<EventDraft>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DraftField {
	Title,
	Date,
	Start,
	End,
	Location,
	Description,
	Guests,
}

#[derive(Debug, Clone)]
enum SelectKind {
	Draft {
		field: SelectField,
		draft: Box<EventDraft>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectField {
	AllDay,
	Priority,
	Category,
	Color,
	Calendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Grid,
	Day,
	Sidebar,
}

impl FocusPane {
	fn next(self) -> Self {
		match self {
			FocusPane::Grid => FocusPane::Day,
			FocusPane::Day => FocusPane::Sidebar,
			FocusPane::Sidebar => FocusPane::Grid,
		}
	}

	fn prev(self) -> Self {
		match self {
			FocusPane::Grid => FocusPane::Sidebar,
			FocusPane::Day => FocusPane::Grid,
			FocusPane::Sidebar => FocusPane::Day,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
	Month,
	Year,
}

impl ViewMode {
	fn toggle(self) -> Self {
		match self {
			ViewMode::Month => ViewMode::Year,
			ViewMode::Year => ViewMode::Month,
		}
	}

	fn label(self) -> &'static str {
		match self {
			ViewMode::Month => "Month",
			ViewMode::Year => "Year",
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
	Detail(EventId),
}

#[derive(Debug, Clone)]
struct App {
	focus: FocusPane,
	view: ViewMode,
	today: NaiveDate,
	selected_day: NaiveDate,
	day_index: usize,
	calendar_index: usize,
	calendars: Vec<Calendar>,
	search: String,
	policy: ConflictPolicy,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(calendars: Vec<Calendar>, policy: ConflictPolicy, today: NaiveDate) -> Self {
		Self {
			focus: FocusPane::Grid,
			view: ViewMode::Month,
			today,
			selected_day: today,
			day_index: 0,
			calendar_index: 0,
			calendars,
			search: String::new(),
			policy,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		if view.day_events.is_empty() {
			self.day_index = 0;
		} else {
			self.day_index = self.day_index.min(view.day_events.len() - 1);
		}

		if self.calendars.is_empty() {
			self.calendar_index = 0;
		} else {
			self.calendar_index = self.calendar_index.min(self.calendars.len() - 1);
		}
	}

	/// Day steps in month view, month steps in year view.
	fn move_grid(&mut self, month_view_days: i64, year_view_months: i32) {
		match self.view {
			ViewMode::Month => self.shift_selected_day(month_view_days),
			ViewMode::Year => self.shift_selected_month(year_view_months),
		}
	}

	fn shift_period(&mut self, delta: i32) {
		match self.view {
			ViewMode::Month => self.shift_selected_month(delta),
			ViewMode::Year => self.shift_selected_month(delta * 12),
		}
	}

	fn shift_selected_day(&mut self, delta_days: i64) {
		if let Some(day) = self.selected_day.checked_add_signed(Duration::days(delta_days)) {
			self.selected_day = day;
			self.day_index = 0;
		}
	}

	fn shift_selected_month(&mut self, delta_months: i32) {
		if let Some(day) = shift_month(self.selected_day, delta_months) {
			self.selected_day = day;
			self.day_index = 0;
		}
	}

	fn move_day_selection(&mut self, delta: i32, view: &ViewModel) {
		if view.day_events.is_empty() {
			self.day_index = 0;
			return;
		}

		if delta > 0 {
			self.day_index = (self.day_index + delta as usize).min(view.day_events.len() - 1);
		} else {
			self.day_index = self.day_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn move_calendar_selection(&mut self, delta: i32) {
		if self.calendars.is_empty() {
			self.calendar_index = 0;
			return;
		}

		if delta > 0 {
			self.calendar_index = (self.calendar_index + delta as usize).min(self.calendars.len() - 1);
		} else {
			self.calendar_index = self.calendar_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn toggle_calendar(&mut self) -> String {
		let Some(calendar) = self.calendars.get_mut(self.calendar_index) else {
			return "No calendar selected".to_string();
		};
		calendar.enabled = !calendar.enabled;
		self.day_index = 0;
		debug!(calendar = %calendar.id, enabled = calendar.enabled, "calendar toggled");
		format!(
			"{} {}",
			if calendar.enabled { "Showing" } else { "Hiding" },
			calendar.name
		)
	}
}

struct ViewModel<'a> {
	month_cells: Vec<DayCell<'a>>,
	day_events: Vec<&'a Event>,
	day_conflicts: HashSet<EventId>,
	stats: MonthStats<'a>,
	year_summary: [MonthSummary; 12],
	year_grids: Vec<Vec<GridCell>>,
	hidden: usize,
}
