//! Configuration for the API client and the renderer.
//!
//! Plain data, assembled once from CLI arguments. Nothing here is
//! reloaded or mutated after startup.

use clap::ValueEnum;
use tracing::warn;

/// Default OBS API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.opensuse.org";

/// API endpoints this viewer knows how to link back to the web UI for.
pub const KNOWN_API_URLS: [&str; 2] = ["https://api.opensuse.org", "https://api.suse.de"];

/// Default stylesheet injected into rendered pages. Swappable via
/// `--stylesheet-url`; has no effect on data correctness.
pub const DEFAULT_STYLESHEET_URL: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";

/// OBS API client configuration.
#[derive(Debug, Clone)]
pub struct ObsClientConfig {
    /// Base URL of the OBS API (e.g. `https://api.opensuse.org`).
    pub api_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ObsClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ObsClientConfig {
    /// Web UI base URL matching the configured API endpoint.
    pub fn web_base_url(&self) -> &'static str {
        if self.api_url.contains("suse.de") {
            "https://build.suse.de"
        } else {
            "https://build.opensuse.org"
        }
    }
}

/// Clamp an API URL to the known instances, warning on fallback.
pub fn sanitize_api_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if KNOWN_API_URLS.contains(&trimmed) {
        trimmed.to_string()
    } else {
        warn!("Unknown API {:?}, defaulting to {}", url, DEFAULT_API_URL);
        DEFAULT_API_URL.to_string()
    }
}

/// Page color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl From<&str> for Theme {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Rendering options shared by both sinks.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub stylesheet_url: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            stylesheet_url: DEFAULT_STYLESHEET_URL.to_string(),
        }
    }
}
