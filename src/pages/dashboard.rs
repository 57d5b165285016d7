//! Dashboard page
//!
//! Live data is fetched as one fan-out every refresh tick; the weekly report
//! on its own, slower tick. Road snapshot and history requests can supersede
//! each other, so each carries a ticket and only the latest response is
//! applied.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use futures::future::{join_all, BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{cycle_next, cycle_prev, RequestGeneration, Ticket, UPDATE_CHANNEL_CAPACITY};
use crate::data::format::parse_timestamp;
use crate::data::{
    export_weekly_report, Alert, AlertsResponse, ApiError, DashboardSummary, ExportError,
    HistoryQuery, MapEvent, Road, RoadSnapshot, SystemStatus, TrafficClient, TrafficEvent,
    TrafficHistory, TrafficSample, WeeklyReport, WeeklyReportDocument,
};
use crate::refresh::{self, RefreshConfig, RefreshHandle, RefreshMessage};
use crate::utils::{Debounce, SimpleCache, Throttle};

pub const LATEST_TRAFFIC_LIMIT: u32 = 10;
pub const RECENT_EVENTS_LIMIT: u32 = 10;
pub const MAP_EVENTS_LIMIT: u32 = 100;
/// Number of recent events shown on the timeline
pub const TIMELINE_LENGTH: usize = 5;

pub const SNAPSHOT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const SNAPSHOT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const MANUAL_REFRESH_LIMIT: Duration = Duration::from_secs(5);

/// Why a weekly report export failed
#[derive(Debug, Error)]
pub enum ReportExportError {
    #[error(transparent)]
    Fetch(#[from] ApiError),

    #[error(transparent)]
    Write(#[from] ExportError),
}

/// Results delivered to the dashboard by its fetch tasks
#[derive(Debug)]
pub enum DashboardUpdate {
    Roads(Result<Vec<Road>, ApiError>),
    LatestTraffic(Result<Vec<TrafficSample>, ApiError>),
    Events(Result<Vec<TrafficEvent>, ApiError>),
    Summary(Result<DashboardSummary, ApiError>),
    Alerts(Result<AlertsResponse, ApiError>),
    SystemStatus(Result<SystemStatus, ApiError>),
    MapEvents(Result<Vec<MapEvent>, ApiError>),
    Snapshot {
        ticket: Ticket,
        road_id: i64,
        result: Result<RoadSnapshot, ApiError>,
    },
    History {
        ticket: Ticket,
        result: Result<TrafficHistory, ApiError>,
    },
    WeeklyReport(Result<WeeklyReportDocument, ApiError>),
    Exported(Result<PathBuf, ReportExportError>),
}

/// Time range presets for the history chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// Let the backend pick its default window
    #[default]
    All,
    Last24Hours,
    Last3Days,
    Last7Days,
}

impl HistoryWindow {
    pub const ALL: [HistoryWindow; 4] = [
        HistoryWindow::All,
        HistoryWindow::Last24Hours,
        HistoryWindow::Last3Days,
        HistoryWindow::Last7Days,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HistoryWindow::All => "All",
            HistoryWindow::Last24Hours => "Last 24 hours",
            HistoryWindow::Last3Days => "Last 3 days",
            HistoryWindow::Last7Days => "Last 7 days",
        }
    }

    fn span(&self) -> Option<chrono::Duration> {
        match self {
            HistoryWindow::All => None,
            HistoryWindow::Last24Hours => Some(chrono::Duration::hours(24)),
            HistoryWindow::Last3Days => Some(chrono::Duration::days(3)),
            HistoryWindow::Last7Days => Some(chrono::Duration::days(7)),
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|w| *w == self);
        cycle_next(index, Self::ALL.len()).map_or(self, |i| Self::ALL[i])
    }

    /// History query for `road_id` ending at `now`
    pub fn query(&self, road_id: i64, now: DateTime<Utc>) -> HistoryQuery {
        match self.span() {
            Some(span) => HistoryQuery::new(road_id).with_window(Some(now - span), Some(now)),
            None => HistoryQuery::new(road_id),
        }
    }
}

/// A point on the event map
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub key: String,
    pub lat: f64,
    pub lon: f64,
    pub label: String,
    pub severity: Option<i64>,
}

fn event_key(event: &TrafficEvent) -> String {
    match event.id {
        Some(id) => format!("event-{}", id),
        None => format!("event-{}", event.kind),
    }
}

/// Markers for the events that have coordinates
pub fn markers_from(events: &[MapEvent]) -> Vec<MapMarker> {
    events
        .iter()
        .filter_map(|map_event| {
            let coords = map_event.coordinates?;
            let event = &map_event.event;
            Some(MapMarker {
                key: event_key(event),
                lat: coords.lat,
                lon: coords.lon,
                label: format!(
                    "{} - {}",
                    event.kind,
                    event.road_name.as_deref().unwrap_or("Unknown")
                ),
                severity: event.severity,
            })
        })
        .collect()
}

/// Vertical marker on the history chart for one event
#[derive(Debug, Clone, PartialEq)]
pub struct EventAnnotation {
    pub key: String,
    pub at: DateTime<Utc>,
    pub label: String,
}

/// Annotations for the events with a readable timestamp
pub fn annotations_from(events: &[TrafficEvent]) -> Vec<EventAnnotation> {
    events
        .iter()
        .filter_map(|event| {
            let at = parse_timestamp(event.timestamp.as_deref()?)?;
            Some(EventAnnotation {
                key: event_key(event),
                at,
                label: event.kind.clone(),
            })
        })
        .collect()
}

/// Text shown in the road details panel when no snapshot could be loaded
pub fn snapshot_error_message(err: &ApiError) -> &'static str {
    match err.status() {
        Some(404) => "Road not found",
        _ => "Unable to load road details",
    }
}

/// State of the history region
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HistoryView {
    #[default]
    Idle,
    Loading,
    Loaded {
        history: TrafficHistory,
        annotations: Vec<EventAnnotation>,
    },
    Failed,
}

/// Spawns the dashboard's fetches and reports back over its channel
#[derive(Clone)]
struct DashboardFetcher {
    client: TrafficClient,
    tx: mpsc::Sender<DashboardUpdate>,
    snapshot_generation: Arc<RequestGeneration>,
    history_generation: Arc<RequestGeneration>,
    export_dir: PathBuf,
}

impl DashboardFetcher {
    fn load_roads(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_roads().await;
            let _ = tx.send(DashboardUpdate::Roads(result)).await;
        });
    }

    /// Fetches every live region concurrently
    fn refresh_live(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let requests: Vec<BoxFuture<'_, DashboardUpdate>> = vec![
                async {
                    DashboardUpdate::LatestTraffic(
                        client.fetch_latest_traffic(LATEST_TRAFFIC_LIMIT).await,
                    )
                }
                .boxed(),
                async {
                    DashboardUpdate::Events(
                        client.fetch_events(None, Some(RECENT_EVENTS_LIMIT)).await,
                    )
                }
                .boxed(),
                async { DashboardUpdate::Summary(client.fetch_dashboard_summary().await) }.boxed(),
                async { DashboardUpdate::Alerts(client.fetch_alerts().await) }.boxed(),
                async { DashboardUpdate::SystemStatus(client.fetch_system_status().await) }
                    .boxed(),
                async {
                    DashboardUpdate::MapEvents(client.fetch_map_events(MAP_EVENTS_LIMIT).await)
                }
                .boxed(),
            ];

            for update in join_all(requests).await {
                if tx.send(update).await.is_err() {
                    break;
                }
            }
        });
    }

    fn fetch_snapshot(&self, road_id: i64) {
        let ticket = self.snapshot_generation.issue();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_road_snapshot(road_id).await;
            let _ = tx
                .send(DashboardUpdate::Snapshot {
                    ticket,
                    road_id,
                    result,
                })
                .await;
        });
    }

    fn submit_history(&self, query: HistoryQuery) {
        let ticket = self.history_generation.issue();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_traffic_history(&query).await;
            let _ = tx.send(DashboardUpdate::History { ticket, result }).await;
        });
    }

    fn load_weekly_report(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_weekly_report().await;
            let _ = tx.send(DashboardUpdate::WeeklyReport(result)).await;
        });
    }

    fn export_weekly_report(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let dir = self.export_dir.clone();
        tokio::spawn(async move {
            let result: Result<PathBuf, ReportExportError> = match client.fetch_weekly_report().await {
                Ok(document) => export_weekly_report(&document.raw, &dir).map_err(Into::into),
                Err(err) => Err(err.into()),
            };
            let _ = tx.send(DashboardUpdate::Exported(result)).await;
        });
    }
}

struct Session {
    fetcher: DashboardFetcher,
    rx: mpsc::Receiver<DashboardUpdate>,
    refresh: RefreshHandle,
    snapshot_debounce: Debounce<i64>,
    manual_refresh: Throttle<()>,
}

/// Controller for the dashboard page
pub struct DashboardController {
    client: TrafficClient,
    refresh_config: RefreshConfig,
    export_dir: PathBuf,
    session: Option<Session>,
    pub roads: Vec<Road>,
    /// Index into `roads` of the road shown in the details panel
    pub snapshot_road: Option<usize>,
    pub snapshot: Option<RoadSnapshot>,
    /// Road id `snapshot` was loaded for
    snapshot_road_id: Option<i64>,
    pub snapshot_error: Option<String>,
    snapshot_cache: SimpleCache<i64, RoadSnapshot>,
    /// Index into `roads` of the road shown in the history chart
    pub history_road: Option<usize>,
    pub history_window: HistoryWindow,
    pub history: HistoryView,
    pub latest_traffic: Option<Vec<TrafficSample>>,
    pub events: Option<Vec<TrafficEvent>>,
    pub summary: Option<DashboardSummary>,
    pub alerts: Option<Vec<Alert>>,
    pub system_status: Option<SystemStatus>,
    pub map_markers: Vec<MapMarker>,
    pub weekly_report: Option<WeeklyReport>,
    /// Most recent fetch failure, for the status bar
    pub last_error: Option<String>,
    pub status_message: Option<String>,
    pub last_refresh: Option<DateTime<Local>>,
}

impl DashboardController {
    pub fn new(client: TrafficClient, refresh_config: RefreshConfig, export_dir: PathBuf) -> Self {
        Self {
            client,
            refresh_config,
            export_dir,
            session: None,
            roads: Vec::new(),
            snapshot_road: None,
            snapshot: None,
            snapshot_road_id: None,
            snapshot_error: None,
            snapshot_cache: SimpleCache::new(SNAPSHOT_CACHE_TTL),
            history_road: None,
            history_window: HistoryWindow::default(),
            history: HistoryView::default(),
            latest_traffic: None,
            events: None,
            summary: None,
            alerts: None,
            system_status: None,
            map_markers: Vec::new(),
            weekly_report: None,
            last_error: None,
            status_message: None,
            last_refresh: None,
        }
    }

    /// Starts loading and polling
    ///
    /// Loads roads (which in turn loads the first road's snapshot and
    /// history), runs one live refresh and one weekly report fetch, then
    /// starts the refresh timers. Must be called from within a tokio runtime.
    pub fn init(&mut self) {
        self.teardown();

        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let fetcher = DashboardFetcher {
            client: self.client.clone(),
            tx,
            snapshot_generation: Arc::new(RequestGeneration::new()),
            history_generation: Arc::new(RequestGeneration::new()),
            export_dir: self.export_dir.clone(),
        };

        let snapshot_fetcher = fetcher.clone();
        let snapshot_debounce = Debounce::new(
            move |road_id| snapshot_fetcher.fetch_snapshot(road_id),
            SNAPSHOT_DEBOUNCE,
        );
        let live_fetcher = fetcher.clone();
        let manual_refresh = Throttle::new(move |()| live_fetcher.refresh_live(), MANUAL_REFRESH_LIMIT);

        fetcher.load_roads();
        fetcher.refresh_live();
        fetcher.load_weekly_report();

        info!(
            live_secs = self.refresh_config.live_interval.as_secs(),
            report_secs = self.refresh_config.report_interval.as_secs(),
            polling = self.refresh_config.enabled,
            "Dashboard started"
        );

        self.session = Some(Session {
            fetcher,
            rx,
            refresh: RefreshHandle::spawn(self.refresh_config.clone()),
            snapshot_debounce,
            manual_refresh,
        });
    }

    /// Stops polling, cancels a pending snapshot fetch and drops the channel
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.snapshot_debounce.cancel();
            session.refresh.shutdown();
            debug!("Dashboard stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The first few recent events
    pub fn timeline(&self) -> &[TrafficEvent] {
        match &self.events {
            Some(events) => &events[..events.len().min(TIMELINE_LENGTH)],
            None => &[],
        }
    }

    pub fn selected_snapshot_road(&self) -> Option<&Road> {
        self.snapshot_road.and_then(|i| self.roads.get(i))
    }

    pub fn selected_history_road(&self) -> Option<&Road> {
        self.history_road.and_then(|i| self.roads.get(i))
    }

    /// Shows the snapshot for the road at `index`
    ///
    /// A fresh cached snapshot is shown at once; otherwise the fetch is
    /// debounced so quickly stepping through roads only loads the last one.
    pub fn select_snapshot_road(&mut self, index: usize) {
        self.show_snapshot(index, false);
    }

    fn show_snapshot(&mut self, index: usize, immediate: bool) {
        let Some(road_id) = self.roads.get(index).map(|road| road.id) else {
            return;
        };
        self.snapshot_road = Some(index);

        if let Some(cached) = self.snapshot_cache.get(&road_id) {
            debug!(road_id, "Snapshot served from cache");
            self.snapshot = Some(cached.clone());
            self.snapshot_road_id = Some(road_id);
            self.snapshot_error = None;
            if let Some(session) = self.session.as_mut() {
                // Supersede any fetch still in flight for another road
                session.snapshot_debounce.cancel();
                session.fetcher.snapshot_generation.issue();
            }
            return;
        }

        if let Some(session) = self.session.as_mut() {
            if immediate {
                session.snapshot_debounce.cancel();
                session.fetcher.fetch_snapshot(road_id);
            } else {
                session.snapshot_debounce.call(road_id);
            }
        }
    }

    pub fn next_snapshot_road(&mut self) {
        if let Some(index) = cycle_next(self.snapshot_road, self.roads.len()) {
            self.select_snapshot_road(index);
        }
    }

    pub fn prev_snapshot_road(&mut self) {
        if let Some(index) = cycle_prev(self.snapshot_road, self.roads.len()) {
            self.select_snapshot_road(index);
        }
    }

    /// Requests history for the selected road and window
    pub fn submit_history(&mut self) {
        let Some(road_id) = self.selected_history_road().map(|road| road.id) else {
            return;
        };
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let query = self.history_window.query(road_id, Utc::now());
        session.fetcher.submit_history(query);
        self.history = HistoryView::Loading;
    }

    pub fn cycle_history_road(&mut self, forward: bool) {
        let next = if forward {
            cycle_next(self.history_road, self.roads.len())
        } else {
            cycle_prev(self.history_road, self.roads.len())
        };
        if next.is_some() {
            self.history_road = next;
            self.submit_history();
        }
    }

    pub fn cycle_history_window(&mut self) {
        self.history_window = self.history_window.next();
        self.submit_history();
    }

    /// Runs a live refresh unless one was requested within the throttle window
    ///
    /// # Returns
    /// `true` if a refresh was started
    pub fn manual_refresh(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let started = session.manual_refresh.call(());
        if !started {
            debug!("Manual refresh throttled");
        }
        started
    }

    /// Saves the current weekly report to disk
    pub fn export_report(&mut self) {
        if let Some(session) = self.session.as_ref() {
            session.fetcher.export_weekly_report();
            self.status_message = Some("Exporting weekly report...".to_string());
        }
    }

    /// Handles pending timer ticks and fetch results
    ///
    /// # Returns
    /// The number of fetch results applied
    pub fn drain(&mut self) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };

        while let Some(tick) = refresh::try_recv(&mut session.refresh) {
            match tick {
                RefreshMessage::LiveTick => session.fetcher.refresh_live(),
                RefreshMessage::ReportTick => session.fetcher.load_weekly_report(),
            }
        }

        let mut updates = Vec::new();
        while let Ok(update) = session.rx.try_recv() {
            updates.push(update);
        }

        let count = updates.len();
        for update in updates {
            self.apply(update);
        }
        count
    }

    fn record_failure(&mut self, region: &str, err: &dyn std::error::Error) {
        warn!(region, error = %err, "Dashboard fetch failed");
        self.last_error = Some(format!("{}: {}", region, err));
    }

    fn is_current_snapshot(&self, ticket: Ticket) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.fetcher.snapshot_generation.is_current(ticket))
    }

    fn is_current_history(&self, ticket: Ticket) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.fetcher.history_generation.is_current(ticket))
    }

    pub fn apply(&mut self, update: DashboardUpdate) {
        match update {
            DashboardUpdate::Roads(Ok(roads)) => self.set_roads(roads),
            DashboardUpdate::Roads(Err(err)) => self.record_failure("roads", &err),
            DashboardUpdate::LatestTraffic(Ok(samples)) => {
                self.latest_traffic = Some(samples);
                self.last_refresh = Some(Local::now());
            }
            DashboardUpdate::LatestTraffic(Err(err)) => self.record_failure("latest traffic", &err),
            DashboardUpdate::Events(Ok(events)) => self.events = Some(events),
            DashboardUpdate::Events(Err(err)) => self.record_failure("events", &err),
            DashboardUpdate::Summary(Ok(summary)) => self.summary = Some(summary),
            DashboardUpdate::Summary(Err(err)) => self.record_failure("summary", &err),
            DashboardUpdate::Alerts(Ok(response)) => self.alerts = Some(response.alerts),
            DashboardUpdate::Alerts(Err(err)) => self.record_failure("alerts", &err),
            DashboardUpdate::SystemStatus(Ok(status)) => self.system_status = Some(status),
            DashboardUpdate::SystemStatus(Err(err)) => self.record_failure("system status", &err),
            DashboardUpdate::MapEvents(Ok(events)) => self.map_markers = markers_from(&events),
            DashboardUpdate::MapEvents(Err(err)) => self.record_failure("map", &err),
            DashboardUpdate::Snapshot {
                ticket,
                road_id,
                result,
            } => {
                if !self.is_current_snapshot(ticket) {
                    debug!(road_id, "Discarding stale snapshot");
                    return;
                }
                match result {
                    Ok(snapshot) => {
                        self.snapshot_cache.set(road_id, snapshot.clone());
                        self.snapshot = Some(snapshot);
                        self.snapshot_road_id = Some(road_id);
                        self.snapshot_error = None;
                    }
                    Err(err) => {
                        // A stale snapshot of the same road stays on screen
                        if self.snapshot_road_id != Some(road_id) {
                            self.snapshot = None;
                            self.snapshot_road_id = None;
                            self.snapshot_error = Some(snapshot_error_message(&err).to_string());
                        }
                        self.record_failure("road snapshot", &err);
                    }
                }
            }
            DashboardUpdate::History { ticket, result } => {
                if !self.is_current_history(ticket) {
                    debug!("Discarding stale history");
                    return;
                }
                match result {
                    Ok(history) => {
                        let annotations = annotations_from(&history.events);
                        self.history = HistoryView::Loaded {
                            history,
                            annotations,
                        };
                    }
                    Err(err) => {
                        self.history = HistoryView::Failed;
                        self.record_failure("history", &err);
                    }
                }
            }
            DashboardUpdate::WeeklyReport(Ok(document)) => {
                self.weekly_report = Some(document.report)
            }
            DashboardUpdate::WeeklyReport(Err(err)) => self.record_failure("weekly report", &err),
            DashboardUpdate::Exported(Ok(path)) => {
                self.status_message = Some(format!("Saved weekly report to {}", path.display()));
            }
            DashboardUpdate::Exported(Err(err)) => {
                self.status_message = None;
                self.record_failure("export", &err);
            }
        }
    }

    /// Replaces the road list and reloads the selected snapshot and history
    fn set_roads(&mut self, roads: Vec<Road>) {
        self.roads = roads;
        if self.roads.is_empty() {
            self.snapshot_road = None;
            self.history_road = None;
            return;
        }

        let len = self.roads.len();
        let snapshot_index = self.snapshot_road.filter(|i| *i < len).unwrap_or(0);
        self.history_road = Some(self.history_road.filter(|i| *i < len).unwrap_or(0));

        self.show_snapshot(snapshot_index, true);
        self.submit_history();
    }

    /// Handles a key press on this page
    ///
    /// # Returns
    /// `true` if the key was used
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next_snapshot_road(),
            KeyCode::Up | KeyCode::Char('k') => self.prev_snapshot_road(),
            KeyCode::Char(']') => self.cycle_history_road(true),
            KeyCode::Char('[') => self.cycle_history_road(false),
            KeyCode::Char('w') => self.cycle_history_window(),
            KeyCode::Char('r') => {
                self.manual_refresh();
            }
            KeyCode::Char('x') => self.export_report(),
            _ => return false,
        }
        true
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Coordinates;
    use chrono::TimeZone;

    fn controller() -> DashboardController {
        DashboardController::new(
            TrafficClient::new("http://127.0.0.1:9"),
            RefreshConfig {
                enabled: false,
                ..Default::default()
            },
            PathBuf::from("."),
        )
    }

    fn road(id: i64) -> Road {
        Road {
            id,
            name: format!("Road {}", id),
            code: format!("R{}", id),
            lanes: Some(2),
            level: None,
            speed_limit: Some(60),
            length: Some(4.5),
        }
    }

    fn snapshot(id: i64, speed: f64) -> RoadSnapshot {
        RoadSnapshot {
            road: Some(road(id)),
            latest: Some(TrafficSample {
                speed: Some(speed),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn event(id: Option<i64>, kind: &str, timestamp: Option<&str>) -> TrafficEvent {
        TrafficEvent {
            id,
            kind: kind.to_string(),
            timestamp: timestamp.map(str::to_string),
            ..Default::default()
        }
    }

    fn not_found() -> ApiError {
        ApiError::UnexpectedStatus {
            url: "http://127.0.0.1:9/api/roads/9".to_string(),
            status: 404,
        }
    }

    #[test]
    fn test_history_window_all_has_no_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 8, 0, 0).unwrap();
        let query = HistoryWindow::All.query(3, now);
        assert_eq!(query, HistoryQuery::new(3));
    }

    #[test]
    fn test_history_window_last_24_hours() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 8, 0, 0).unwrap();
        let query = HistoryWindow::Last24Hours.query(3, now);
        assert_eq!(
            query.start,
            Some(Utc.with_ymd_and_hms(2024, 7, 14, 8, 0, 0).unwrap())
        );
        assert_eq!(query.end, Some(now));
    }

    #[test]
    fn test_history_window_cycles() {
        assert_eq!(HistoryWindow::All.next(), HistoryWindow::Last24Hours);
        assert_eq!(HistoryWindow::Last7Days.next(), HistoryWindow::All);
    }

    #[test]
    fn test_markers_skip_events_without_coordinates() {
        let events = vec![
            MapEvent {
                event: event(Some(1), "Accident", None),
                coordinates: Some(Coordinates {
                    lat: 28.2,
                    lon: 112.9,
                }),
            },
            MapEvent {
                event: event(Some(2), "Control", None),
                coordinates: None,
            },
        ];

        let markers = markers_from(&events);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].key, "event-1");
        assert_eq!(markers[0].label, "Accident - Unknown");
    }

    #[test]
    fn test_annotations_keyed_by_id_or_label() {
        let events = vec![
            event(Some(7), "Accident", Some("2024-07-15T08:30:00")),
            event(None, "Congestion", Some("2024-07-15T09:00:00+00:00")),
            event(Some(9), "Control", None),
        ];

        let annotations = annotations_from(&events);

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].key, "event-7");
        assert_eq!(annotations[1].key, "event-Congestion");
        assert_eq!(
            annotations[1].at,
            Utc.with_ymd_and_hms(2024, 7, 15, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_timeline_takes_first_five_events() {
        let mut dashboard = controller();
        assert!(dashboard.timeline().is_empty());

        let events = (0..8).map(|i| event(Some(i), "Accident", None)).collect();
        dashboard.apply(DashboardUpdate::Events(Ok(events)));

        assert_eq!(dashboard.timeline().len(), 5);
        assert_eq!(dashboard.timeline()[0].id, Some(0));
    }

    #[test]
    fn test_failed_fetch_keeps_previous_state() {
        let mut dashboard = controller();
        dashboard.apply(DashboardUpdate::LatestTraffic(Ok(vec![TrafficSample::default()])));
        assert!(dashboard.last_refresh.is_some());

        dashboard.apply(DashboardUpdate::LatestTraffic(Err(not_found())));

        assert_eq!(dashboard.latest_traffic.as_ref().map(Vec::len), Some(1));
        assert!(dashboard
            .last_error
            .as_deref()
            .is_some_and(|e| e.starts_with("latest traffic")));
    }

    #[test]
    fn test_snapshot_ignored_without_session() {
        let mut dashboard = controller();
        let ticket = RequestGeneration::new().issue();
        dashboard.apply(DashboardUpdate::Snapshot {
            ticket,
            road_id: 1,
            result: Ok(snapshot(1, 40.0)),
        });
        assert!(dashboard.snapshot.is_none());
    }

    #[tokio::test]
    async fn test_stale_snapshot_discarded() {
        let mut dashboard = controller();
        dashboard.init();
        let generation = Arc::clone(&dashboard.session.as_ref().unwrap().fetcher.snapshot_generation);
        let stale = generation.issue();
        let current = generation.issue();

        dashboard.apply(DashboardUpdate::Snapshot {
            ticket: stale,
            road_id: 1,
            result: Ok(snapshot(1, 40.0)),
        });
        assert!(dashboard.snapshot.is_none());

        dashboard.apply(DashboardUpdate::Snapshot {
            ticket: current,
            road_id: 2,
            result: Ok(snapshot(2, 55.0)),
        });
        let speed = dashboard
            .snapshot
            .as_ref()
            .and_then(|s| s.latest.as_ref())
            .and_then(|l| l.speed);
        assert_eq!(speed, Some(55.0));
        assert!(dashboard.snapshot_cache.has(&2));
        assert!(!dashboard.snapshot_cache.has(&1));
    }

    #[tokio::test]
    async fn test_snapshot_error_shows_road_not_found() {
        let mut dashboard = controller();
        dashboard.init();
        let ticket = dashboard
            .session
            .as_ref()
            .unwrap()
            .fetcher
            .snapshot_generation
            .issue();

        dashboard.apply(DashboardUpdate::Snapshot {
            ticket,
            road_id: 9,
            result: Err(not_found()),
        });

        assert_eq!(dashboard.snapshot_error.as_deref(), Some("Road not found"));
    }

    fn unavailable() -> ApiError {
        ApiError::UnexpectedStatus {
            url: "http://127.0.0.1:9/api/roads/1".to_string(),
            status: 503,
        }
    }

    #[test]
    fn test_snapshot_error_messages() {
        assert_eq!(snapshot_error_message(&not_found()), "Road not found");
        assert_eq!(
            snapshot_error_message(&unavailable()),
            "Unable to load road details"
        );
    }

    #[tokio::test]
    async fn test_failed_snapshot_refresh_keeps_previous_snapshot() {
        let mut dashboard = controller();
        dashboard.init();
        let generation = Arc::clone(&dashboard.session.as_ref().unwrap().fetcher.snapshot_generation);

        dashboard.apply(DashboardUpdate::Snapshot {
            ticket: generation.issue(),
            road_id: 1,
            result: Ok(snapshot(1, 40.0)),
        });
        dashboard.apply(DashboardUpdate::Snapshot {
            ticket: generation.issue(),
            road_id: 1,
            result: Err(unavailable()),
        });

        assert_eq!(dashboard.snapshot, Some(snapshot(1, 40.0)));
        assert!(dashboard.snapshot_error.is_none());
        assert!(dashboard
            .last_error
            .as_deref()
            .is_some_and(|e| e.starts_with("road snapshot")));
    }

    #[tokio::test]
    async fn test_failed_snapshot_for_other_road_shows_error() {
        let mut dashboard = controller();
        dashboard.init();
        let generation = Arc::clone(&dashboard.session.as_ref().unwrap().fetcher.snapshot_generation);

        dashboard.apply(DashboardUpdate::Snapshot {
            ticket: generation.issue(),
            road_id: 1,
            result: Ok(snapshot(1, 40.0)),
        });
        dashboard.apply(DashboardUpdate::Snapshot {
            ticket: generation.issue(),
            road_id: 2,
            result: Err(unavailable()),
        });

        assert!(dashboard.snapshot.is_none());
        assert_eq!(
            dashboard.snapshot_error.as_deref(),
            Some("Unable to load road details")
        );
    }

    #[tokio::test]
    async fn test_cached_snapshot_shown_without_fetch() {
        let mut dashboard = controller();
        dashboard.init();
        dashboard.roads = vec![road(1), road(2)];
        dashboard.snapshot_cache.set(2, snapshot(2, 61.0));

        dashboard.select_snapshot_road(1);

        assert_eq!(dashboard.snapshot_road, Some(1));
        assert_eq!(dashboard.snapshot, Some(snapshot(2, 61.0)));
        assert!(!dashboard.session.as_ref().unwrap().snapshot_debounce.is_pending());
    }

    #[tokio::test]
    async fn test_uncached_snapshot_is_debounced() {
        let mut dashboard = controller();
        dashboard.init();
        dashboard.roads = vec![road(1), road(2)];

        dashboard.next_snapshot_road();

        assert_eq!(dashboard.snapshot_road, Some(0));
        assert!(dashboard.session.as_ref().unwrap().snapshot_debounce.is_pending());
    }

    #[tokio::test]
    async fn test_roads_select_first_road() {
        let mut dashboard = controller();
        dashboard.init();

        dashboard.apply(DashboardUpdate::Roads(Ok(vec![road(4), road(5)])));

        assert_eq!(dashboard.snapshot_road, Some(0));
        assert_eq!(dashboard.history_road, Some(0));
        assert_eq!(dashboard.history, HistoryView::Loading);
        assert_eq!(dashboard.selected_history_road().map(|r| r.id), Some(4));
    }

    #[tokio::test]
    async fn test_stale_history_discarded() {
        let mut dashboard = controller();
        dashboard.init();
        let generation = Arc::clone(&dashboard.session.as_ref().unwrap().fetcher.history_generation);
        let stale = generation.issue();
        let current = generation.issue();

        dashboard.apply(DashboardUpdate::History {
            ticket: stale,
            result: Err(not_found()),
        });
        assert_eq!(dashboard.history, HistoryView::Idle);

        let history = TrafficHistory {
            events: vec![event(Some(3), "Accident", Some("2024-07-15T08:30:00Z"))],
            ..Default::default()
        };
        dashboard.apply(DashboardUpdate::History {
            ticket: current,
            result: Ok(history),
        });
        match &dashboard.history {
            HistoryView::Loaded { annotations, .. } => assert_eq!(annotations[0].key, "event-3"),
            other => panic!("Expected loaded history, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_failure() {
        let mut dashboard = controller();
        dashboard.init();
        let ticket = dashboard
            .session
            .as_ref()
            .unwrap()
            .fetcher
            .history_generation
            .issue();

        dashboard.apply(DashboardUpdate::History {
            ticket,
            result: Err(not_found()),
        });

        assert_eq!(dashboard.history, HistoryView::Failed);
        assert!(dashboard.last_error.is_some());
    }

    #[tokio::test]
    async fn test_manual_refresh_is_throttled() {
        let mut dashboard = controller();
        assert!(!dashboard.manual_refresh());

        dashboard.init();
        assert!(dashboard.manual_refresh());
        assert!(!dashboard.manual_refresh());
    }

    #[tokio::test]
    async fn test_window_key_resubmits_history() {
        let mut dashboard = controller();
        dashboard.init();
        dashboard.roads = vec![road(1)];
        dashboard.history_road = Some(0);

        assert!(dashboard.handle_key(KeyEvent::from(KeyCode::Char('w'))));

        assert_eq!(dashboard.history_window, HistoryWindow::Last24Hours);
        assert_eq!(dashboard.history, HistoryView::Loading);
    }

    #[tokio::test]
    async fn test_teardown_stops_session() {
        let mut dashboard = controller();
        dashboard.init();
        assert!(dashboard.is_active());

        dashboard.teardown();

        assert!(!dashboard.is_active());
        assert_eq!(dashboard.drain(), 0);
        assert!(!dashboard.manual_refresh());
    }

    #[test]
    fn test_export_result_sets_status() {
        let mut dashboard = controller();
        dashboard.apply(DashboardUpdate::Exported(Ok(PathBuf::from(
            "/tmp/weekly_report.json",
        ))));
        assert_eq!(
            dashboard.status_message.as_deref(),
            Some("Saved weekly report to /tmp/weekly_report.json")
        );
    }
}
