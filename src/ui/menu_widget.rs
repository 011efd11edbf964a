//! Menu screen rendering
//!
//! Renders the canteen header, the cached menu day with its dishes and
//! student prices, a footer with data freshness, and the key help on top
//! when it is open.

use chrono::{Local, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{Action, App};
use crate::cache::{MenuStatus, UnavailableReason};
use crate::data::{Dish, MenuDay};

/// Color for a diet label
fn label_color(label: &str) -> Color {
    match label {
        "VEGAN" => Color::Green,
        "VEGETARIAN" => Color::LightGreen,
        "PORK" | "BEEF" | "POULTRY" | "LAMB" | "VEAL" | "WILD_MEAT" | "MEAT" => Color::Red,
        "FISH" => Color::Blue,
        _ => Color::DarkGray,
    }
}

/// "Today", "Tomorrow" or a weekday with date
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%A, %d.%m.").to_string(),
    }
}

/// Lines describing a single dish
fn dish_lines(dish: &Dish) -> Vec<Line<'static>> {
    let mut title = vec![
        Span::styled("• ", Style::default().fg(Color::Cyan)),
        Span::styled(
            dish.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if !dish.dish_type.is_empty() {
        title.push(Span::styled(
            format!("  {}", dish.dish_type),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut details = vec![Span::raw("  ")];
    if let Some(price) = dish.prices.students.as_ref().and_then(|p| p.describe()) {
        details.push(Span::styled(price, Style::default().fg(Color::Yellow)));
        details.push(Span::raw("  "));
    }
    for label in &dish.labels {
        details.push(Span::styled(
            format!("{} ", label.to_lowercase()),
            Style::default().fg(label_color(label)),
        ));
    }

    vec![Line::from(title), Line::from(details)]
}

/// Lines for a resolved menu day
fn menu_lines(day: &MenuDay, today: NaiveDate) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} ({})", day_label(day.date, today), day.date.format("%Y-%m-%d")),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for dish in &day.dishes {
        lines.extend(dish_lines(dish));
    }
    lines
}

/// Lines for a cache with nothing to show
fn status_lines(status: &MenuStatus) -> Vec<Line<'static>> {
    let (text, color) = match status {
        MenuStatus::Pending => ("Loading menu...".to_string(), Color::Cyan),
        MenuStatus::Unavailable(UnavailableReason::NoMatchingDay) => (
            "No menu for the rest of this week".to_string(),
            Color::Yellow,
        ),
        MenuStatus::Unavailable(UnavailableReason::FetchFailed(err)) => {
            (format!("Menu unavailable: {}", err), Color::Red)
        }
        MenuStatus::Resolved(_) => (String::new(), Color::Reset),
    };
    vec![Line::from(Span::styled(text, Style::default().fg(color)))]
}

/// Renders the menu screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(3),    // Menu
            Constraint::Length(1), // Help text
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_menu(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);

    if app.show_help {
        render_help(frame, chunks[1]);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let now = Local::now().format("%a %d.%m., %H:%M").to_string();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            app.mensa_name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", now), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Mensa "));

    frame.render_widget(header, area);
}

fn render_menu(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.status();
    let lines = match &status {
        MenuStatus::Resolved(day) => menu_lines(day, Local::now().date_naive()),
        other => status_lines(other),
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0));

    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let freshness = match (&app.last_error, app.last_refresh) {
        (Some(err), _) => Span::styled(
            format!("refresh failed: {}", err),
            Style::default().fg(Color::Red),
        ),
        (None, Some(at)) => Span::styled(
            format!("updated {}", at.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
        (None, None) => Span::raw(""),
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "r refresh  ↑/↓ scroll  ? help  q quit   ",
            Style::default().fg(Color::DarkGray),
        ),
        freshness,
    ]))
    .alignment(Alignment::Left);

    frame.render_widget(footer, area);
}

/// Key table drawn over the menu area
fn render_help(frame: &mut Frame, area: Rect) {
    let rows = Action::ALL.iter().map(|action| {
        Row::new([
            Span::styled(action.keys(), Style::default().fg(Color::Yellow)),
            Span::raw(action.description()),
        ])
    });

    // Two border rows plus one row per action
    let height = Action::ALL.len() as u16 + 2;
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(44)])
        .flex(Flex::Center)
        .areas(area);

    let table = Table::new(rows, [Constraint::Length(7), Constraint::Fill(1)])
        .column_spacing(2)
        .block(
            Block::default()
                .title(" Keys ")
                .title_bottom(Line::from(" ? or Esc closes ").right_aligned())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    frame.render_widget(Clear, area);
    frame.render_widget(table, area);
}
