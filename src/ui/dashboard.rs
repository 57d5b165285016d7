//! Dashboard screen rendering
//!
//! Lays out the KPI strip, live tables, event map, road details, history chart
//! and weekly report cards. Regions that have not loaded yet show a loading
//! line; regions whose last fetch failed keep showing their previous data.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution, Points},
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Wrap,
    },
    Frame,
};

use crate::data::format::{
    format_date_time, format_fixed, format_percentage, format_speed, or_placeholder,
    parse_timestamp,
};
use crate::data::{AlertLevel, DashboardSummary, RoadSnapshot, TrafficHistory, WeeklyReport};
use crate::pages::dashboard::{EventAnnotation, HistoryView, MapMarker};
use crate::pages::DashboardController;
use crate::ui::widgets::VolumeSparkline;

const LOADING: &str = "Loading...";

fn section_block(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn muted(text: impl Into<String>) -> Paragraph<'static> {
    Paragraph::new(text.into()).style(Style::default().fg(Color::Gray))
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Renders the dashboard into `area`
pub fn render(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(14),
            Constraint::Length(12),
            Constraint::Length(7),
        ])
        .split(area);

    render_kpis(frame, rows[0], dashboard.summary.as_ref());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(42),
            Constraint::Percentage(30),
            Constraint::Percentage(28),
        ])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);
    render_latest_traffic(frame, left[0], dashboard);
    render_recent_events(frame, left[1], dashboard);

    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[1]);
    render_map(frame, middle[0], &dashboard.map_markers);
    render_road_details(frame, middle[1], dashboard);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(columns[2]);
    render_alerts(frame, right[0], dashboard);
    render_congestion_and_timeline(frame, right[1], dashboard);
    render_system_status(frame, right[2], dashboard);

    render_history(frame, rows[2], dashboard);
    render_weekly_report(frame, rows[3], dashboard.weekly_report.as_ref());
}

/// Label and value of each KPI card
pub fn kpi_values(summary: Option<&DashboardSummary>) -> [(&'static str, String); 4] {
    let summary = summary.cloned().unwrap_or_default();
    [
        ("Total Roads", or_placeholder(summary.total_roads)),
        ("Active Events", or_placeholder(summary.active_events)),
        ("Avg Speed", format_speed(summary.avg_speed_last_window)),
        ("Max Volume", or_placeholder(summary.max_volume_last_window)),
    ]
}

/// "Updated at ... (last Nh)" line for the summary
pub fn summary_caption(summary: &DashboardSummary) -> String {
    format!(
        "Updated at {} (last {}h)",
        format_date_time(summary.generated_at.as_deref()),
        or_placeholder(summary.window_hours)
    )
}

fn render_kpis(frame: &mut Frame, area: Rect, summary: Option<&DashboardSummary>) {
    let title = summary
        .map(summary_caption)
        .unwrap_or_else(|| "Summary".to_string());
    let block = section_block(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(inner);

    for (card, (label, value)) in cards.iter().zip(kpi_values(summary)) {
        let lines = vec![
            Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
            Line::from(Span::styled(
                value,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), *card);
    }
}

fn render_latest_traffic(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let block = section_block("Latest Traffic");
    let samples = match &dashboard.latest_traffic {
        None => {
            frame.render_widget(muted(LOADING).block(block), area);
            return;
        }
        Some(samples) if samples.is_empty() => {
            frame.render_widget(muted("No traffic data available.").block(block), area);
            return;
        }
        Some(samples) => samples,
    };

    let header = Row::new(vec!["Road", "Time", "Speed", "Volume", "Status"]).style(header_style());
    let rows = samples.iter().map(|sample| {
        Row::new(vec![
            Cell::from(sample.road_name.clone().unwrap_or_else(|| "Unknown".to_string())),
            Cell::from(format_date_time(sample.timestamp.as_deref())),
            Cell::from(format_speed(sample.speed)),
            Cell::from(or_placeholder(sample.volume)),
            Cell::from(or_placeholder(sample.status.as_deref())),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Fill(2),
            Constraint::Length(19),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Fill(1),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

fn render_recent_events(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let block = section_block("Recent Events");
    let events = match &dashboard.events {
        None => {
            frame.render_widget(muted(LOADING).block(block), area);
            return;
        }
        Some(events) if events.is_empty() => {
            frame.render_widget(muted("No active events.").block(block), area);
            return;
        }
        Some(events) => events,
    };

    let header = Row::new(vec!["Road", "Type", "Description", "Time"]).style(header_style());
    let rows = events.iter().map(|event| {
        Row::new(vec![
            Cell::from(event.road_name.clone().unwrap_or_else(|| "Unknown".to_string())),
            Cell::from(event.kind.clone()),
            Cell::from(or_placeholder(event.description.as_deref())),
            Cell::from(format_date_time(event.timestamp.as_deref())),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Fill(2),
            Constraint::Length(19),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

/// Map bounds as `([west, east], [south, north])`, padded around the markers
pub fn map_bounds(markers: &[MapMarker]) -> ([f64; 2], [f64; 2]) {
    if markers.is_empty() {
        return ([-180.0, 180.0], [-90.0, 90.0]);
    }
    let (mut west, mut east) = (f64::MAX, f64::MIN);
    let (mut south, mut north) = (f64::MAX, f64::MIN);
    for marker in markers {
        west = west.min(marker.lon);
        east = east.max(marker.lon);
        south = south.min(marker.lat);
        north = north.max(marker.lat);
    }
    let pad_x = ((east - west) * 0.1).max(0.05);
    let pad_y = ((north - south) * 0.1).max(0.05);
    ([west - pad_x, east + pad_x], [south - pad_y, north + pad_y])
}

fn severity_color(severity: Option<i64>) -> Color {
    match severity {
        Some(s) if s >= 4 => Color::Red,
        Some(3) => Color::Yellow,
        Some(_) => Color::Green,
        None => Color::Cyan,
    }
}

fn render_map(frame: &mut Frame, area: Rect, markers: &[MapMarker]) {
    let block = section_block(format!("Event Map ({})", markers.len()));
    if markers.is_empty() {
        frame.render_widget(muted("No events with coordinates.").block(block), area);
        return;
    }

    let (x_bounds, y_bounds) = map_bounds(markers);
    let mut groups: Vec<(Color, Vec<(f64, f64)>)> = Vec::new();
    for marker in markers {
        let color = severity_color(marker.severity);
        match groups.iter_mut().find(|(c, _)| *c == color) {
            Some((_, coords)) => coords.push((marker.lon, marker.lat)),
            None => groups.push((color, vec![(marker.lon, marker.lat)])),
        }
    }

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();
            for (color, coords) in &groups {
                ctx.draw(&Points {
                    coords,
                    color: *color,
                });
            }
        });
    frame.render_widget(canvas, area);
}

/// Text lines of the road details panel
pub fn snapshot_lines(snapshot: &RoadSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(road) = &snapshot.road {
        lines.push(road.label());
        lines.push(format!(
            "{} km · {} lanes · Limit {} km/h",
            or_placeholder(road.length),
            or_placeholder(road.lanes),
            or_placeholder(road.speed_limit)
        ));
    }
    let averages = snapshot.averages.clone().unwrap_or_default();
    lines.push(format!(
        "Latest speed: {}",
        format_speed(snapshot.latest.as_ref().and_then(|l| l.speed))
    ));
    lines.push(format!("Avg speed: {}", format_speed(averages.speed)));
    lines.push(format!("Avg volume: {}", format_fixed(averages.volume, 0)));
    lines.push(format!(
        "Congestion: {}",
        format_percentage(averages.congestion)
    ));
    lines.push(format!(
        "Events (24h): {}",
        or_placeholder(snapshot.events_last_24h)
    ));
    lines
}

fn render_road_details(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let title = match dashboard.selected_snapshot_road() {
        Some(road) => format!("Road Details [j/k]: {}", road.code),
        None => "Road Details [j/k]".to_string(),
    };
    let block = section_block(title);

    let paragraph = if let Some(error) = &dashboard.snapshot_error {
        Paragraph::new(error.clone()).style(Style::default().fg(Color::Red))
    } else if let Some(snapshot) = &dashboard.snapshot {
        let lines: Vec<Line> = snapshot_lines(snapshot)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                if i == 0 && snapshot.road.is_some() {
                    Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)))
                } else {
                    Line::from(text)
                }
            })
            .collect();
        Paragraph::new(lines)
    } else if dashboard.roads.is_empty() {
        muted("No roads available.")
    } else {
        muted(LOADING)
    };
    frame.render_widget(paragraph.block(block), area);
}

/// Icon shown before an alert
pub fn alert_icon(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Critical => "\u{1F6A8}", // 🚨
        _ => "\u{26A0}\u{FE0F}",            // ⚠️
    }
}

fn render_alerts(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let block = section_block("Alerts");
    let paragraph = match &dashboard.alerts {
        None => muted(LOADING),
        Some(alerts) if alerts.is_empty() => muted("No active alerts."),
        Some(alerts) => {
            let lines: Vec<Line> = alerts
                .iter()
                .map(|alert| {
                    let color = match alert.level {
                        AlertLevel::Critical => Color::Red,
                        AlertLevel::Warning => Color::Yellow,
                        AlertLevel::Info => Color::Cyan,
                    };
                    Line::from(vec![
                        Span::raw(format!("{} ", alert_icon(alert.level))),
                        Span::styled(
                            format!("{} ", alert.level.as_str().to_uppercase()),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(alert.message.clone()),
                    ])
                })
                .collect();
            Paragraph::new(lines).wrap(Wrap { trim: true })
        }
    };
    frame.render_widget(paragraph.block(block), area);
}

fn render_congestion_and_timeline(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let mut lines = vec![Line::from(Span::styled(
        "Top congested roads",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    match &dashboard.summary {
        None => lines.push(Line::from(LOADING)),
        Some(summary) if summary.top_congested_roads.is_empty() => {
            lines.push(Line::from("No congestion in the last window."))
        }
        Some(summary) => lines.extend(summary.top_congested_roads.iter().map(|road| {
            Line::from(format!(
                "  {}: {}",
                road.road_name,
                format_percentage(road.avg_congestion)
            ))
        })),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Timeline",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for event in dashboard.timeline() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {} ", format_date_time(event.timestamp.as_deref())),
                Style::default().fg(Color::Gray),
            ),
            Span::raw(format!(
                "{} @ {}",
                event.kind,
                event.road_name.as_deref().unwrap_or("Unknown")
            )),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).block(section_block("Congestion & Timeline")),
        area,
    );
}

fn render_system_status(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let block = section_block("System Status");
    let paragraph = match &dashboard.system_status {
        None => muted(LOADING),
        Some(status) => {
            let mut lines: Vec<Line> = status
                .totals
                .iter()
                .map(|(name, count)| Line::from(format!("{}: {}", name, count)))
                .collect();
            lines.push(Line::from(Span::styled(
                format!("Updated {}", format_date_time(status.generated_at.as_deref())),
                Style::default().fg(Color::Gray),
            )));
            Paragraph::new(lines)
        }
    };
    frame.render_widget(paragraph.block(block), area);
}

/// "Showing data from ... to ..." for a loaded history window
pub fn history_caption(history: &TrafficHistory) -> Option<String> {
    let window = history.window.as_ref()?;
    Some(format!(
        "Showing data from {} to {}",
        format_date_time(Some(&window.start)),
        format_date_time(Some(&window.end))
    ))
}

fn axis_label(at: DateTime<Utc>) -> Span<'static> {
    Span::raw(at.with_timezone(&Local).format("%m-%d %H:%M").to_string())
}

fn render_history(frame: &mut Frame, area: Rect, dashboard: &DashboardController) {
    let title = format!(
        "History [ [ ] road, w window ]: {} | {}",
        dashboard
            .selected_history_road()
            .map(|road| road.label())
            .unwrap_or_else(|| "--".to_string()),
        dashboard.history_window.label()
    );
    let block = section_block(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(inner);

    match &dashboard.history {
        HistoryView::Idle => {
            frame.render_widget(muted("Select a road to view history."), columns[0]);
        }
        HistoryView::Loading => {
            frame.render_widget(muted(LOADING), columns[0]);
        }
        HistoryView::Failed => {
            frame.render_widget(
                Paragraph::new("Unable to load traffic history.")
                    .style(Style::default().fg(Color::Red)),
                columns[0],
            );
            frame.render_widget(
                Paragraph::new("Unable to load history data.")
                    .style(Style::default().fg(Color::Red)),
                columns[1],
            );
        }
        HistoryView::Loaded {
            history,
            annotations,
        } => {
            render_history_chart(frame, columns[0], history, annotations);
            render_history_events(frame, columns[1], history);
        }
    }
}

fn render_history_chart(
    frame: &mut Frame,
    area: Rect,
    history: &TrafficHistory,
    annotations: &[EventAnnotation],
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    if let Some(caption) = history_caption(history) {
        frame.render_widget(muted(caption), rows[0]);
    }

    let samples: Vec<(DateTime<Utc>, f64, f64)> = history
        .traffic
        .iter()
        .filter_map(|sample| {
            let at = parse_timestamp(sample.timestamp.as_deref()?)?;
            Some((
                at,
                sample.speed.unwrap_or(0.0),
                sample.volume.unwrap_or(0) as f64,
            ))
        })
        .collect();

    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        frame.render_widget(muted("No traffic data for the selected window."), rows[1]);
        return;
    };

    let start = first.0.min(last.0);
    let end = first.0.max(last.0);
    let x_min = start.timestamp() as f64;
    let x_max = (end.timestamp() as f64).max(x_min + 1.0);
    let y_max = samples
        .iter()
        .map(|(_, speed, _)| *speed)
        .fold(10.0, f64::max)
        * 1.1;

    let speed_points: Vec<(f64, f64)> = samples
        .iter()
        .map(|(at, speed, _)| (at.timestamp() as f64, *speed))
        .collect();
    let annotation_lines: Vec<[(f64, f64); 2]> = annotations
        .iter()
        .map(|a| a.at.timestamp() as f64)
        .filter(|x| (x_min..=x_max).contains(x))
        .map(|x| [(x, 0.0), (x, y_max)])
        .collect();

    let mut datasets = vec![Dataset::default()
        .name("Speed (km/h)")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&speed_points)];
    for line in &annotation_lines {
        datasets.push(
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(line),
        );
    }

    let chart = Chart::new(datasets)
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)))
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(vec![axis_label(start), axis_label(end)])
                .style(Style::default().fg(Color::Gray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max)),
                ])
                .style(Style::default().fg(Color::Gray)),
        );
    frame.render_widget(chart, rows[1]);

    let volumes: Vec<f64> = samples.iter().map(|(_, _, volume)| *volume).collect();
    let sparkline_area = rows[2];
    let label = "Volume ";
    frame.render_widget(muted(label), sparkline_area);
    let bar_area = Rect {
        x: sparkline_area.x + label.len() as u16,
        width: sparkline_area.width.saturating_sub(label.len() as u16),
        ..sparkline_area
    };
    frame.render_widget(
        VolumeSparkline::new(&volumes).highlight_latest(),
        bar_area,
    );
}

fn render_history_events(frame: &mut Frame, area: Rect, history: &TrafficHistory) {
    if history.events.is_empty() {
        frame.render_widget(muted("No events in this window."), area);
        return;
    }

    let header = Row::new(vec!["Time", "Type", "Status", "Sev"]).style(header_style());
    let rows = history.events.iter().map(|event| {
        Row::new(vec![
            Cell::from(format_date_time(event.timestamp.as_deref())),
            Cell::from(event.kind.clone()),
            Cell::from(or_placeholder(event.status.as_deref())),
            Cell::from(or_placeholder(event.severity)),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Fill(1),
            Constraint::Length(9),
            Constraint::Length(3),
        ],
    )
    .header(header);
    frame.render_widget(table, area);
}

/// Title and body of each weekly report card
pub fn weekly_cards(report: &WeeklyReport) -> Vec<(&'static str, Vec<String>)> {
    let events = report
        .events
        .map(|e| format!("{} total / {} severe", e.total, e.severe))
        .unwrap_or_else(|| "--".to_string());
    let busiest = if report.busiest_roads.is_empty() {
        vec!["No data.".to_string()]
    } else {
        report
            .busiest_roads
            .iter()
            .map(|road| format!("{}: {}", road.road_name, format_fixed(road.avg_volume, 0)))
            .collect()
    };

    vec![
        (
            "Traffic Records (7d)",
            vec![or_placeholder(report.traffic_records)],
        ),
        ("Avg Speed", vec![format_speed(report.avg_speed)]),
        ("Events", vec![events]),
        ("Busiest Roads", busiest),
    ]
}

fn render_weekly_report(frame: &mut Frame, area: Rect, report: Option<&WeeklyReport>) {
    let block = section_block("Weekly Report [x export]");
    let Some(report) = report else {
        frame.render_widget(muted(LOADING).block(block), area);
        return;
    };
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(inner);

    for (card, (title, body)) in cards.iter().zip(weekly_cards(report)) {
        let mut lines = vec![Line::from(Span::styled(title, Style::default().fg(Color::Gray)))];
        lines.extend(body.into_iter().map(|text| {
            Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)))
        }));
        frame.render_widget(Paragraph::new(lines), *card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        Alert, Averages, BusiestRoad, EventTotals, Road, TimeWindow, TrafficClient,
        TrafficEvent, TrafficSample,
    };
    use crate::pages::dashboard::DashboardUpdate;
    use crate::refresh::RefreshConfig;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn dashboard() -> DashboardController {
        DashboardController::new(
            TrafficClient::new("http://127.0.0.1:9"),
            RefreshConfig::default(),
            PathBuf::from("."),
        )
    }

    fn render_to_string(dashboard: &DashboardController) -> String {
        let backend = TestBackend::new(180, 60);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), dashboard))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_kpi_values_placeholders() {
        let values = kpi_values(None);
        assert_eq!(values[0], ("Total Roads", "--".to_string()));
        assert_eq!(values[2].1, "--");
    }

    #[test]
    fn test_kpi_values_formatting() {
        let summary = DashboardSummary {
            total_roads: Some(12),
            active_events: Some(3),
            avg_speed_last_window: Some(41.26),
            max_volume_last_window: Some(1530),
            ..Default::default()
        };
        let values = kpi_values(Some(&summary));
        assert_eq!(values[1].1, "3");
        assert_eq!(values[2].1, "41.3 km/h");
        assert_eq!(values[3].1, "1530");
    }

    #[test]
    fn test_summary_caption_window() {
        let summary = DashboardSummary {
            window_hours: Some(24),
            ..Default::default()
        };
        assert_eq!(summary_caption(&summary), "Updated at -- (last 24h)");
    }

    #[test]
    fn test_alert_icons() {
        assert_eq!(alert_icon(AlertLevel::Critical), "🚨");
        assert_eq!(alert_icon(AlertLevel::Warning), "\u{26A0}\u{FE0F}");
        assert_eq!(alert_icon(AlertLevel::Info), alert_icon(AlertLevel::Warning));
    }

    #[test]
    fn test_snapshot_lines() {
        let snapshot = RoadSnapshot {
            road: Some(Road {
                id: 1,
                name: "Ring Road".to_string(),
                code: "R1".to_string(),
                lanes: Some(4),
                level: None,
                speed_limit: Some(80),
                length: Some(12.5),
            }),
            latest: Some(TrafficSample {
                speed: Some(52.34),
                ..Default::default()
            }),
            averages: Some(Averages {
                speed: Some(48.0),
                volume: Some(812.6),
                congestion: Some(0.42),
            }),
            events_last_24h: Some(2),
        };

        let lines = snapshot_lines(&snapshot);

        assert_eq!(lines[0], "Ring Road (R1)");
        assert_eq!(lines[1], "12.5 km · 4 lanes · Limit 80 km/h");
        assert_eq!(lines[2], "Latest speed: 52.3 km/h");
        assert_eq!(lines[4], "Avg volume: 813");
        assert_eq!(lines[5], "Congestion: 42%");
        assert_eq!(lines[6], "Events (24h): 2");
    }

    #[test]
    fn test_weekly_cards() {
        let report = WeeklyReport {
            traffic_records: Some(2016),
            avg_speed: Some(41.27),
            events: Some(EventTotals {
                total: 12,
                severe: 4,
            }),
            busiest_roads: vec![BusiestRoad {
                road_name: "Ring Road".to_string(),
                avg_volume: Some(1520.4),
            }],
            ..Default::default()
        };

        let cards = weekly_cards(&report);

        assert_eq!(cards[0], ("Traffic Records (7d)", vec!["2016".to_string()]));
        assert_eq!(cards[1].1, vec!["41.3 km/h".to_string()]);
        assert_eq!(cards[2].1, vec!["12 total / 4 severe".to_string()]);
        assert_eq!(cards[3].1, vec!["Ring Road: 1520".to_string()]);
    }

    #[test]
    fn test_weekly_cards_without_busiest_roads() {
        let cards = weekly_cards(&WeeklyReport::default());
        assert_eq!(cards[3].1, vec!["No data.".to_string()]);
    }

    #[test]
    fn test_map_bounds_pad_single_marker() {
        let marker = MapMarker {
            key: "event-1".to_string(),
            lat: 28.2,
            lon: 112.9,
            label: "Accident - Ring Road".to_string(),
            severity: Some(4),
        };
        let ([west, east], [south, north]) = map_bounds(&[marker]);
        assert!(west < 112.9 && east > 112.9);
        assert!(south < 28.2 && north > 28.2);
    }

    #[test]
    fn test_history_caption() {
        let history = TrafficHistory {
            window: Some(TimeWindow {
                start: "garbage".to_string(),
                end: "later".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            history_caption(&history).as_deref(),
            Some("Showing data from garbage to later")
        );
        assert!(history_caption(&TrafficHistory::default()).is_none());
    }

    #[test]
    fn test_render_before_any_data() {
        let content = render_to_string(&dashboard());
        assert!(content.contains("Latest Traffic"));
        assert!(content.contains("Loading..."));
        assert!(content.contains("Select a road to view history."));
    }

    #[test]
    fn test_render_empty_regions() {
        let mut dashboard = dashboard();
        dashboard.apply(DashboardUpdate::LatestTraffic(Ok(vec![])));
        dashboard.apply(DashboardUpdate::Events(Ok(vec![])));
        dashboard.apply(DashboardUpdate::Alerts(Ok(Default::default())));
        dashboard.apply(DashboardUpdate::Summary(Ok(Default::default())));

        let content = render_to_string(&dashboard);

        assert!(content.contains("No traffic data available."));
        assert!(content.contains("No active events."));
        assert!(content.contains("No active alerts."));
        assert!(content.contains("No congestion in the last window."));
    }

    #[test]
    fn test_render_live_data() {
        let mut dashboard = dashboard();
        dashboard.apply(DashboardUpdate::LatestTraffic(Ok(vec![TrafficSample {
            road_name: Some("Ring Road".to_string()),
            speed: Some(42.0),
            volume: Some(310),
            status: Some("smooth".to_string()),
            ..Default::default()
        }])));
        dashboard.apply(DashboardUpdate::Events(Ok(vec![TrafficEvent {
            kind: "Accident".to_string(),
            road_name: None,
            ..Default::default()
        }])));
        dashboard.alerts = Some(vec![Alert {
            level: AlertLevel::Critical,
            message: "9 active events detected.".to_string(),
        }]);

        let content = render_to_string(&dashboard);

        assert!(content.contains("Ring Road"));
        assert!(content.contains("42.0 km/h"));
        assert!(content.contains("Unknown"));
        assert!(content.contains("CRITICAL"));
        assert!(content.contains("9 active events detected."));
    }

    #[test]
    fn test_render_failed_history() {
        let mut dashboard = dashboard();
        dashboard.history = HistoryView::Failed;

        let content = render_to_string(&dashboard);

        assert!(content.contains("Unable to load traffic history."));
        assert!(content.contains("Unable to load history data."));
    }

    #[test]
    fn test_render_history_without_samples() {
        let mut dashboard = dashboard();
        dashboard.history = HistoryView::Loaded {
            history: TrafficHistory::default(),
            annotations: Vec::new(),
        };

        let content = render_to_string(&dashboard);

        assert!(content.contains("No traffic data for the selected window."));
        assert!(content.contains("No events in this window."));
    }

    #[test]
    fn test_render_history_chart() {
        let mut dashboard = dashboard();
        let traffic = (0..6)
            .map(|i| TrafficSample {
                timestamp: Some(format!("2024-07-15T0{}:00:00Z", i)),
                speed: Some(30.0 + i as f64),
                volume: Some(100 * i),
                ..Default::default()
            })
            .collect();
        dashboard.history = HistoryView::Loaded {
            history: TrafficHistory {
                traffic,
                ..Default::default()
            },
            annotations: Vec::new(),
        };

        let content = render_to_string(&dashboard);

        assert!(content.contains("Speed (km/h)"));
        assert!(content.contains("Volume"));
        assert!(!content.contains("No traffic data for the selected window."));
    }

    #[test]
    fn test_render_weekly_report() {
        let mut dashboard = dashboard();
        dashboard.weekly_report = Some(WeeklyReport {
            events: Some(EventTotals {
                total: 12,
                severe: 4,
            }),
            ..Default::default()
        });

        let content = render_to_string(&dashboard);

        assert!(content.contains("Traffic Records (7d)"));
        assert!(content.contains("12 total / 4 severe"));
        assert!(content.contains("No data."));
    }
}
