//! HTTP client for the traffic monitoring REST API
//!
//! Wraps every endpoint the dashboard and events pages read from, plus the
//! single write (`POST /api/events`). Responses are parsed into the models in
//! `crate::data`.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{
    AlertsResponse, DashboardSummary, HistoryQuery, Listing, MapEvent, NewEvent, Road,
    RoadSnapshot, SystemStatus, TrafficEvent, TrafficHistory, TrafficSample, WeeklyReport,
    WeeklyReportDocument,
};

/// Backend address used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Message shown when event creation fails without an `error` field
pub const CREATE_EVENT_FALLBACK_ERROR: &str = "Failed to create event";

/// Errors that can occur when talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the body could not be read
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The body was not the JSON we expected
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The backend answered with a non-2xx status
    #[error("{url} returned HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The backend refused a write and explained why
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl ApiError {
    /// HTTP status of the response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnexpectedStatus { status, .. } | ApiError::Rejected { status, .. } => {
                Some(*status)
            }
            ApiError::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            ApiError::ParseError(_) => None,
        }
    }
}

/// Error body returned by the backend on validation failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the traffic monitoring backend
#[derive(Debug, Clone)]
pub struct TrafficClient {
    client: Client,
    base_url: String,
}

impl Default for TrafficClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TrafficClient {
    /// Creates a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GETs `path` with `query` and parses the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, ?query, "GET");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetches every road
    pub async fn fetch_roads(&self) -> Result<Vec<Road>, ApiError> {
        let listing: Listing<Road> = self.get_json("/api/roads", &[]).await?;
        Ok(listing.into_items())
    }

    /// Fetches the current snapshot of one road
    pub async fn fetch_road_snapshot(&self, road_id: i64) -> Result<RoadSnapshot, ApiError> {
        self.get_json(&format!("/api/roads/{}", road_id), &[]).await
    }

    /// Fetches events, optionally filtered by status ("all" disables the filter)
    ///
    /// The backend only returns active events when `status` is omitted.
    pub async fn fetch_events(
        &self,
        status: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<TrafficEvent>, ApiError> {
        let mut query = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let listing: Listing<TrafficEvent> = self.get_json("/api/events", &query).await?;
        Ok(listing.into_items())
    }

    /// Fetches recent events that have coordinates
    pub async fn fetch_map_events(&self, limit: u32) -> Result<Vec<MapEvent>, ApiError> {
        let listing: Listing<MapEvent> = self
            .get_json("/api/events/map", &[("limit", limit.to_string())])
            .await?;
        Ok(listing.into_items())
    }

    /// Fetches the most recent traffic samples across all roads
    pub async fn fetch_latest_traffic(&self, limit: u32) -> Result<Vec<TrafficSample>, ApiError> {
        let listing: Listing<TrafficSample> = self
            .get_json("/api/traffic/latest", &[("limit", limit.to_string())])
            .await?;
        Ok(listing.into_items())
    }

    /// Fetches samples and events for one road within a window
    pub async fn fetch_traffic_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<TrafficHistory, ApiError> {
        self.get_json(
            &format!("/api/traffic/history/{}", query.road_id),
            &query.query_pairs(),
        )
        .await
    }

    pub async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.get_json("/api/dashboard/summary", &[]).await
    }

    pub async fn fetch_alerts(&self) -> Result<AlertsResponse, ApiError> {
        self.get_json("/api/alerts", &[]).await
    }

    pub async fn fetch_system_status(&self) -> Result<SystemStatus, ApiError> {
        self.get_json("/api/system/status", &[]).await
    }

    /// Fetches the weekly report, keeping the raw JSON alongside the parsed form
    pub async fn fetch_weekly_report(&self) -> Result<WeeklyReportDocument, ApiError> {
        let raw: serde_json::Value = self.get_json("/api/reports/weekly", &[]).await?;
        let report: WeeklyReport = serde_json::from_value(raw.clone())?;
        Ok(WeeklyReportDocument { report, raw })
    }

    /// Creates an event
    ///
    /// # Returns
    /// * `Ok(TrafficEvent)` - The event as stored by the backend
    /// * `Err(ApiError::Rejected)` - The backend refused it; the message is its `error` text
    pub async fn create_event(&self, event: &NewEvent) -> Result<TrafficEvent, ApiError> {
        let url = self.url("/api/events");
        debug!(url = %url, road_id = ?event.road_id, kind = event.kind.as_str(), "POST");

        let response = self.client.post(&url).json(event).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| CREATE_EVENT_FALLBACK_ERROR.to_string());
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
