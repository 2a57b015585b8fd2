//! Runtime configuration loaded via OrthoConfig.
//!
//! Every field is optional; accessors fall back to the portal defaults so an
//! empty environment yields a working local setup.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::notifications::{DEFAULT_TOAST_DURATION, FEED_CAPACITY};

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Settings for the portal client runtime.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Base URL of the portal REST API, including any path prefix.
    pub api_base_url: Option<String>,
    /// Bounded timeout applied to every API request, in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Default lifetime of a toast, in milliseconds. `0` makes toasts sticky.
    pub toast_duration_ms: Option<u64>,
    /// Number of entries kept in the notification feed.
    pub feed_capacity: Option<usize>,
}

impl PortalSettings {
    /// Parse the configured API base URL, falling back to the local default.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured value is not a URL.
    pub fn api_base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
                .max(1),
        )
    }

    pub fn toast_duration(&self) -> Duration {
        self.toast_duration_ms
            .map_or(DEFAULT_TOAST_DURATION, Duration::from_millis)
    }

    /// Feed capacity; never below one entry.
    pub fn feed_capacity(&self) -> usize {
        self.feed_capacity.unwrap_or(FEED_CAPACITY).max(1)
    }
}
