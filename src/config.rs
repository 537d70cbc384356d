//! Server configuration

use std::path::PathBuf;

use caption_sync_lib::{LanguagePreference, UpstreamConfig};
use serde::{Deserialize, Serialize};

/// Caption selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Preferred caption language code
    pub default_language: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
        }
    }
}

impl CaptionConfig {
    pub fn language_preference(&self) -> LanguagePreference {
        LanguagePreference::from_code(&self.default_language)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Directory served for paths no route matches
    pub static_dir: Option<PathBuf>,

    /// Video platform access
    pub upstream: UpstreamConfig,

    /// Caption selection
    pub captions: CaptionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            static_dir: Some(PathBuf::from("public")),
            upstream: UpstreamConfig::default(),
            captions: CaptionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply the `PORT` environment override, if set and valid.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Option<u16> {
        let port = port?.trim().parse::<u16>().ok()?;
        self.port = port;
        Some(port)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
