//! Event log screen rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::data::format::{format_date_time, or_placeholder};
use crate::data::Road;
use crate::pages::events::EventForm;
use crate::pages::{EventsController, Feedback, FormField, Tone};

/// Display value of one form field
pub fn field_value(form: &EventForm, roads: &[Road], field: FormField) -> String {
    match field {
        FormField::Road => form
            .road
            .and_then(|i| roads.get(i))
            .map(Road::label)
            .unwrap_or_else(|| "Select a road".to_string()),
        FormField::Type => form.kind.as_str().to_string(),
        FormField::Status => form.status.as_str().to_string(),
        FormField::Severity => or_placeholder(form.severity),
        FormField::Position => form.position.clone(),
        FormField::Description => form.description.clone(),
    }
}

fn feedback_line(feedback: &Feedback) -> Line<'static> {
    let color = match feedback.tone {
        Tone::Success => Color::Green,
        Tone::Danger => Color::Red,
    };
    Line::from(Span::styled(
        feedback.message.clone(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Renders the events page into `area`
pub fn render(frame: &mut Frame, area: Rect, page: &EventsController) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(area);

    render_form(frame, columns[0], page);
    render_table(frame, columns[1], page);
}

fn render_form(frame: &mut Frame, area: Rect, page: &EventsController) {
    let mut lines = Vec::new();

    for field in FormField::ALL {
        let focused = page.form.focus == field;
        let mut value = field_value(&page.form, &page.roads, field);
        if field.is_text() && focused {
            value.push('_');
        }

        let (marker, label_style) = if focused {
            (
                "> ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default().fg(Color::Gray))
        };
        let value_style = if field.is_text() || !focused {
            Style::default()
        } else {
            Style::default().fg(Color::Cyan)
        };

        let value = if field.is_text() || !focused {
            value
        } else {
            format!("< {} >", value)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{}{:<12}", marker, field.label()), label_style),
            Span::styled(value, value_style),
        ]));

        if field == FormField::Road {
            if let Some(error) = &page.roads_error {
                lines.push(Line::from(Span::styled(
                    format!("  {}", error),
                    Style::default().fg(Color::Red),
                )));
            }
        }
    }

    lines.push(Line::from(""));
    if page.submitting {
        lines.push(Line::from(Span::styled(
            "Submitting...",
            Style::default().fg(Color::Gray),
        )));
    } else if let Some(feedback) = &page.feedback {
        lines.push(feedback_line(feedback));
    }

    let block = Block::default()
        .title(" Report Event [Tab field, \u{2190}/\u{2192} choose, Enter submit] ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_table(frame: &mut Frame, area: Rect, page: &EventsController) {
    let block = Block::default()
        .title(format!(" Events ({}) [PgUp/PgDn] ", page.rows.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(error) = &page.events_error {
        frame.render_widget(
            Paragraph::new(error.clone()).style(Style::default().fg(Color::Red)),
            inner,
        );
        return;
    }
    if !page.events_loaded {
        frame.render_widget(
            Paragraph::new("Loading...").style(Style::default().fg(Color::Gray)),
            inner,
        );
        return;
    }
    if page.rows.is_empty() {
        frame.render_widget(
            Paragraph::new("No events recorded.").style(Style::default().fg(Color::Gray)),
            inner,
        );
        return;
    }

    let rows_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(inner);

    let header = Row::new(vec!["Time", "Road", "Type", "Status", "Sev", "Details"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let rows = page.visible_rows().iter().map(|row| {
        let event = &row.event;
        Row::new(vec![
            Cell::from(format_date_time(event.timestamp.as_deref())),
            Cell::from(event.road_name.clone().unwrap_or_else(|| "Unknown".to_string())),
            Cell::from(event.kind.clone()),
            Cell::from(or_placeholder(event.status.as_deref())),
            Cell::from(or_placeholder(event.severity)),
            Cell::from(row.details.active().unwrap_or("...").to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Fill(2),
        ],
    )
    .header(header);
    frame.render_widget(table, rows_area[0]);
    frame.render_widget(&page.controls(), rows_area[1]);
}
