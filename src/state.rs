//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - The transcript service (extraction pipeline)
//! - In-flight extractions, shared between concurrent requests
//! - Metrics and server configuration

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use caption_sync_lib::{PipelineError, Transcript, TranscriptRequest, TranscriptService};

use crate::config::ServerConfig;
use crate::metrics::Metrics;

type Extraction = Result<Arc<Transcript>, PipelineError>;

/// Application state shared across all handlers
pub struct AppState {
    /// Extraction pipeline
    pub service: TranscriptService,

    /// In-flight extractions: video id -> shared cell resolving to the result.
    /// Entries live only while an extraction runs; nothing is cached.
    pub in_flight: DashMap<String, Arc<OnceCell<Extraction>>>,

    /// Metrics collector
    pub metrics: Arc<Metrics>,

    /// Server start time
    pub started_at: DateTime<Utc>,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: ServerConfig) -> caption_sync_lib::Result<Self> {
        let service = TranscriptService::new(
            config.upstream.clone(),
            config.captions.language_preference(),
        )?;
        Ok(Self {
            service,
            in_flight: DashMap::new(),
            metrics: Arc::new(Metrics::new()),
            started_at: Utc::now(),
            config,
        })
    }

    /// Extract a transcript, joining an identical extraction already in
    /// flight instead of starting a second one.
    pub async fn get_transcript(&self, request: TranscriptRequest) -> Extraction {
        let key = request.video_id.to_string();

        let cell = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let entry = InFlightEntry {
            map: &self.in_flight,
            key,
            cell,
        };

        let mut ran_here = false;
        let result = entry
            .cell
            .get_or_init(|| {
                ran_here = true;
                let service = &self.service;
                let request = &request;
                async move { service.get_transcript(request).await.map(Arc::new) }
            })
            .await
            .clone();

        if !ran_here {
            debug!(video_id = %entry.key, "joined in-flight extraction");
            self.metrics.record_shared_extraction();
        }

        result
    }

    /// Number of extractions currently running
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

/// One caller's hold on an in-flight extraction. Dropping it, on completion
/// or because the request was cancelled, removes the map entry once the
/// extraction has finished or no other caller is left waiting on it.
struct InFlightEntry<'a> {
    map: &'a DashMap<String, Arc<OnceCell<Extraction>>>,
    key: String,
    cell: Arc<OnceCell<Extraction>>,
}

impl Drop for InFlightEntry<'_> {
    fn drop(&mut self) {
        // The map holds one reference and this entry the other.
        self.map.remove_if(&self.key, |_, current| {
            Arc::ptr_eq(current, &self.cell)
                && (current.initialized() || Arc::strong_count(current) <= 2)
        });
    }
}
