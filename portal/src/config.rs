use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PortalError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
const API_PREFIX: &str = "/api";

/// Client configuration, normally read from the environment
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Backend origin without the API prefix, e.g. `http://localhost:8080`
    pub origin: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
}

impl PortalConfig {
    /// Create configuration for a backend URL, with or without the `/api` prefix
    pub fn new(api_url: impl AsRef<str>) -> Self {
        Self {
            origin: origin_of(api_url.as_ref()),
            session_file: default_session_file(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the session file location
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `PORTAL_API_URL`, `PORTAL_SESSION_FILE` and `PORTAL_HTTP_TIMEOUT_SECS`,
    /// after loading an optional `.env` file.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let api_url =
            std::env::var("PORTAL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        if let Ok(path) = std::env::var("PORTAL_SESSION_FILE") {
            config = config.with_session_file(path);
        }

        if let Ok(secs) = std::env::var("PORTAL_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                PortalError::validation("PORTAL_HTTP_TIMEOUT_SECS", "Invalid timeout")
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Base URL every API path is resolved against. Always ends in exactly one `/api`.
    pub fn api_base(&self) -> String {
        format!("{}{}", self.origin, API_PREFIX)
    }

    /// Resolve a stored file reference. Files are served from the origin, not under `/api`.
    pub fn file_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}/{}", self.origin, reference.trim_start_matches('/'))
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Strip trailing slashes and any number of trailing `/api` segments.
fn origin_of(url: &str) -> String {
    let mut origin = url.trim().trim_end_matches('/');
    while let Some(stripped) = origin.strip_suffix(API_PREFIX) {
        origin = stripped.trim_end_matches('/');
    }
    origin.to_string()
}

fn default_session_file() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("patient-portal").join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".patient-portal-session.json"))
}
