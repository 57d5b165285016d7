//! UI rendering module for the traffic dashboard
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod dashboard;
pub mod events;
pub mod help_overlay;
pub mod widgets;

pub use help_overlay::render as render_help_overlay;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, AppState};

/// Renders the whole screen for the current page
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, chunks[0], app.state);

    match app.state {
        AppState::Dashboard => dashboard::render(frame, chunks[1], &app.dashboard),
        AppState::Events => events::render(frame, chunks[1], &app.events),
    }

    render_status_bar(frame, chunks[2], app);

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_tabs(frame: &mut Frame, area: Rect, state: AppState) {
    let tab = |key: &str, label: &str, active: bool| {
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Span::styled(format!(" [{}] {} ", key, label), style)
    };

    let line = Line::from(vec![
        Span::styled(
            " Traffic Monitor ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        tab("1", "Dashboard", state == AppState::Dashboard),
        Span::raw(" "),
        tab("2", "Events", state == AppState::Events),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Text and colour for the right-hand side of the status bar
pub fn status_message(app: &App) -> Option<(String, Color)> {
    if app.state != AppState::Dashboard {
        return None;
    }
    let dashboard = &app.dashboard;
    if let Some(message) = &dashboard.status_message {
        return Some((message.clone(), Color::Green));
    }
    if let Some(error) = &dashboard.last_error {
        return Some((format!("Last error: {}", error), Color::Red));
    }
    dashboard.last_refresh.map(|at| {
        (
            format!("Last refresh: {}", at.format("%H:%M:%S")),
            Color::Gray,
        )
    })
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let hints = match app.state {
        AppState::Dashboard => " j/k road  [/] history  w window  r refresh  x export  ? help  q quit",
        AppState::Events => " Tab field  \u{2190}/\u{2192} choose  Enter submit  PgUp/PgDn page  ? help",
    };

    let mut spans = vec![Span::styled(hints, Style::default().fg(Color::DarkGray))];
    if let Some((message, color)) = status_message(app) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(message, Style::default().fg(color)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
