//! Credential lookup in the osc configuration file.
//!
//! This viewer never stores or validates credentials itself. It reads the
//! pre-existing `oscrc` that the `osc` command-line client maintains and
//! takes the `user`/`pass` pair from the section matching the API URL.

use crate::error::AppError;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Username/password pair for HTTP Basic auth against the OBS API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Load credentials for the given API URL from the osc config file.
///
/// Lookup order: `$OSC_CONFIG`, `~/.config/osc/oscrc`, `~/.oscrc`.
pub fn load(api_url: &str) -> Result<Credentials, AppError> {
    let path = config_path()
        .ok_or_else(|| AppError::credentials("Could not determine the osc config location"))?;

    let text = fs::read_to_string(&path).map_err(|e| {
        AppError::credentials(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_oscrc(&text, api_url).ok_or_else(|| {
        AppError::credentials(format!(
            "No credentials for {} in {}",
            api_url,
            path.display()
        ))
    })
}

/// Resolve the osc config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("OSC_CONFIG") {
        return Some(PathBuf::from(path));
    }

    if let Some(config) = dirs::config_dir() {
        let candidate = config.join("osc").join("oscrc");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidate = home.join(".oscrc");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    // Nothing exists yet: report the XDG location in the error message.
    dirs::config_dir().map(|c| c.join("osc").join("oscrc"))
}

/// Extract `user`/`pass` from the section whose header matches `api_url`.
///
/// The oscrc is INI-shaped: `[https://api.opensuse.org]` sections with
/// `key = value` lines. Only the keys this viewer needs are read.
fn parse_oscrc(text: &str, api_url: &str) -> Option<Credentials> {
    let wanted = normalize_url(api_url);

    let mut in_section = false;
    let mut user: Option<String> = None;
    let mut pass: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if in_section {
                break;
            }
            in_section = normalize_url(header) == wanted;
            continue;
        }

        if !in_section {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "user" => user = Some(value.trim().to_string()),
                "pass" => pass = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    match (user, pass) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => None,
    }
}

/// Normalize a URL for section matching: no trailing slash, lowercase.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}
