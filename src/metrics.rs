//! Prometheus-compatible metrics endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::AppState;

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Server start time
    start_time: Instant,
    /// Total requests processed
    request_count: RwLock<u64>,
    /// Requests by endpoint
    requests_by_endpoint: RwLock<HashMap<String, u64>>,
    /// Transcripts returned to clients
    transcripts_served: RwLock<u64>,
    /// Cues returned to clients
    cues_served: RwLock<u64>,
    /// Transcripts that had no cues
    empty_transcripts: RwLock<u64>,
    /// Requests answered by another request's extraction
    shared_extractions: RwLock<u64>,
    /// Errors by kind
    errors_by_kind: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            request_count: RwLock::new(0),
            requests_by_endpoint: RwLock::new(HashMap::new()),
            transcripts_served: RwLock::new(0),
            cues_served: RwLock::new(0),
            empty_transcripts: RwLock::new(0),
            shared_extractions: RwLock::new(0),
            errors_by_kind: RwLock::new(HashMap::new()),
        }
    }

    /// Record a request
    pub fn record_request(&self, endpoint: &str) {
        *self.request_count.write() += 1;
        *self
            .requests_by_endpoint
            .write()
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    /// Record a transcript sent to a client
    pub fn record_transcript(&self, cues: usize) {
        *self.transcripts_served.write() += 1;
        *self.cues_served.write() += cues as u64;
        if cues == 0 {
            *self.empty_transcripts.write() += 1;
        }
    }

    pub fn record_shared_extraction(&self) {
        *self.shared_extractions.write() += 1;
    }

    /// Record error
    pub fn record_error(&self, kind: &str) {
        *self
            .errors_by_kind
            .write()
            .entry(kind.to_string())
            .or_insert(0) += 1;
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP caption_sync_uptime_seconds Server uptime in seconds\n");
        output.push_str("# TYPE caption_sync_uptime_seconds counter\n");
        output.push_str(&format!(
            "caption_sync_uptime_seconds {}\n",
            self.uptime_secs()
        ));

        output.push_str(
            "\n# HELP caption_sync_start_time_seconds Server start time as Unix timestamp\n",
        );
        output.push_str("# TYPE caption_sync_start_time_seconds gauge\n");
        output.push_str(&format!(
            "caption_sync_start_time_seconds {}\n",
            std::time::SystemTime::UNIX_EPOCH
                .elapsed()
                .unwrap_or(Duration::ZERO)
                .as_secs()
                .saturating_sub(self.uptime_secs())
        ));

        output.push_str("\n# HELP caption_sync_requests_total Total number of HTTP requests\n");
        output.push_str("# TYPE caption_sync_requests_total counter\n");
        output.push_str(&format!(
            "caption_sync_requests_total {}\n",
            *self.request_count.read()
        ));

        output.push_str("\n# HELP caption_sync_requests_by_endpoint Requests by endpoint\n");
        output.push_str("# TYPE caption_sync_requests_by_endpoint counter\n");
        for (endpoint, count) in self.requests_by_endpoint.read().iter() {
            output.push_str(&format!(
                "caption_sync_requests_by_endpoint{{endpoint=\"{}\"}} {}\n",
                endpoint, count
            ));
        }

        output.push_str("\n# HELP caption_sync_transcripts_served_total Transcripts returned\n");
        output.push_str("# TYPE caption_sync_transcripts_served_total counter\n");
        output.push_str(&format!(
            "caption_sync_transcripts_served_total {}\n",
            *self.transcripts_served.read()
        ));

        output.push_str("\n# HELP caption_sync_cues_served_total Cues returned\n");
        output.push_str("# TYPE caption_sync_cues_served_total counter\n");
        output.push_str(&format!(
            "caption_sync_cues_served_total {}\n",
            *self.cues_served.read()
        ));

        output.push_str("\n# HELP caption_sync_empty_transcripts_total Transcripts with no cues\n");
        output.push_str("# TYPE caption_sync_empty_transcripts_total counter\n");
        output.push_str(&format!(
            "caption_sync_empty_transcripts_total {}\n",
            *self.empty_transcripts.read()
        ));

        output.push_str(
            "\n# HELP caption_sync_shared_extractions_total Requests served by an in-flight extraction\n",
        );
        output.push_str("# TYPE caption_sync_shared_extractions_total counter\n");
        output.push_str(&format!(
            "caption_sync_shared_extractions_total {}\n",
            *self.shared_extractions.read()
        ));

        output.push_str("\n# HELP caption_sync_errors_total Total errors by kind\n");
        output.push_str("# TYPE caption_sync_errors_total counter\n");
        for (kind, count) in self.errors_by_kind.read().iter() {
            output.push_str(&format!(
                "caption_sync_errors_total{{kind=\"{}\"}} {}\n",
                kind, count
            ));
        }

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let prometheus_output = state.metrics.export_prometheus();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        prometheus_output,
    )
        .into_response()
}
