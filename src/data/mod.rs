//! Data models for the traffic monitoring backend
//!
//! These types mirror the JSON served by the REST API. Fields the backend may
//! leave out or send as `null` are optional so a sparse payload still renders,
//! with `--` placeholders where values are missing.

pub mod client;
pub mod export;
pub mod format;

pub use client::{ApiError, TrafficClient, DEFAULT_BASE_URL};
pub use export::{export_weekly_report, ExportError, WEEKLY_REPORT_FILE_NAME};

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A monitored road
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub lanes: Option<i64>,
    #[serde(default)]
    pub level: Option<i64>,
    /// Speed limit in km/h
    #[serde(default)]
    pub speed_limit: Option<i64>,
    /// Length in km
    #[serde(default)]
    pub length: Option<f64>,
}

impl Road {
    /// Selector label, e.g. "Ring Road (R1)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// A single traffic measurement for a road
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSample {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub road_id: Option<i64>,
    #[serde(default)]
    pub road_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Average speed in km/h
    #[serde(default)]
    pub speed: Option<f64>,
    /// Vehicles counted in the sample
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    /// Congestion index between 0 and 1
    #[serde(default)]
    pub congestion_level: Option<f64>,
}

/// An incident or operation recorded against a road
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficEvent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub road_id: Option<i64>,
    #[serde(default)]
    pub road_name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    /// WKT point such as "POINT(112.9 28.2)"
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Severity from 1 (minor) to 5 (critical)
    #[serde(default)]
    pub severity: Option<i64>,
}

impl TrafficEvent {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("active")
    }
}

/// Geographic coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// An event with its parsed position, as served for the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEvent {
    #[serde(flatten)]
    pub event: TrafficEvent,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Event categories accepted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Accident,
    Construction,
    Congestion,
    Control,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Accident,
        EventType::Construction,
        EventType::Congestion,
        EventType::Control,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Accident => "Accident",
            EventType::Construction => "Construction",
            EventType::Congestion => "Congestion",
            EventType::Control => "Control",
        }
    }
}

/// Lifecycle status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Resolved,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [
        EventStatus::Active,
        EventStatus::Resolved,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Resolved => "resolved",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

/// Body of `POST /api/events`
///
/// `road_id` is left out entirely when no road is selected so the backend can
/// report the missing field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub status: EventStatus,
    pub severity: Option<u8>,
    pub position: Option<String>,
    pub description: Option<String>,
}

/// Rolling averages over the last 24 hours
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub congestion: Option<f64>,
}

/// Current state of one road, served by `/api/roads/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadSnapshot {
    #[serde(default)]
    pub road: Option<Road>,
    #[serde(default)]
    pub latest: Option<TrafficSample>,
    #[serde(default)]
    pub averages: Option<Averages>,
    #[serde(default)]
    pub events_last_24h: Option<i64>,
}

/// A road ranked by average congestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestedRoad {
    pub road_name: String,
    #[serde(default)]
    pub avg_congestion: Option<f64>,
}

/// Headline figures for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub window_hours: Option<i64>,
    #[serde(default)]
    pub total_roads: Option<i64>,
    #[serde(default)]
    pub active_events: Option<i64>,
    #[serde(default)]
    pub avg_speed_last_window: Option<f64>,
    #[serde(default)]
    pub max_volume_last_window: Option<i64>,
    #[serde(default)]
    pub top_congested_roads: Vec<CongestedRoad>,
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    #[serde(other)]
    Info,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "critical",
            AlertLevel::Warning => "warning",
            AlertLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

/// Body of `/api/alerts`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// Row counts and latest records, served by `/api/system/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub totals: BTreeMap<String, i64>,
    #[serde(default)]
    pub latest_event: Option<TrafficEvent>,
    #[serde(default)]
    pub latest_traffic: Option<TrafficSample>,
}

/// Start and end of a reporting window, as ISO 8601 strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTotals {
    pub total: i64,
    pub severe: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusiestRoad {
    pub road_name: String,
    #[serde(default)]
    pub avg_volume: Option<f64>,
}

/// Seven-day aggregate report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    #[serde(default)]
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub traffic_records: Option<i64>,
    #[serde(default)]
    pub avg_speed: Option<f64>,
    #[serde(default)]
    pub events: Option<EventTotals>,
    #[serde(default)]
    pub busiest_roads: Vec<BusiestRoad>,
}

/// Weekly report as parsed for display, plus the untouched JSON for export
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReportDocument {
    pub report: WeeklyReport,
    pub raw: serde_json::Value,
}

/// Traffic samples and events for one road within a time window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficHistory {
    #[serde(default)]
    pub road: Option<Road>,
    #[serde(default)]
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub traffic: Vec<TrafficSample>,
    #[serde(default)]
    pub events: Vec<TrafficEvent>,
}

/// Parameters for `/api/traffic/history/{road_id}`
///
/// The backend defaults a missing start to seven days before the end and a
/// missing end to now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub road_id: i64,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    pub fn new(road_id: i64) -> Self {
        Self {
            road_id,
            start: None,
            end: None,
        }
    }

    pub fn with_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Query pairs, timestamps as RFC 3339 in UTC
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start {
            pairs.push(("start", start.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        if let Some(end) = self.end {
            pairs.push(("end", end.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        pairs
    }
}

/// A list endpoint's body, either a bare array or a paged envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page {
        data: Vec<T>,
        #[serde(default)]
        #[allow(dead_code)]
        total: Option<i64>,
    },
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Items(items) => items,
            Listing::Page { data, .. } => data,
        }
    }
}
