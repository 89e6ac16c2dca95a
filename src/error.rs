//! Application error types.
//!
//! Every failure surfaces to the immediate caller unmodified: the CLI
//! prints it and exits nonzero, the web server maps it to an HTTP status.
//! There is no retry or partial-result handling anywhere.

use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// OBS API request failed with a non-success status.
    #[error("OBS API error: {message}")]
    ObsApi {
        message: String,
        status_code: Option<u16>,
        endpoint: Option<String>,
    },

    /// Network request failed before a response was received.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Authentication against the OBS API was rejected.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// The local osc credential file is missing or unusable.
    #[error("Credential error: {message}")]
    Credentials { message: String },

    /// Requested resource does not exist upstream.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        id: Option<String>,
    },

    /// Invalid input provided before any network call was made.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Template rendering failed. This is a programming defect (a template
    /// referenced a slot the view model does not provide, or the remote
    /// returned a request state this code does not know about).
    #[error("Render error: {message}")]
    Render { message: String },

    /// Writing the output file failed.
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl AppError {
    /// Create an OBS API error.
    pub fn obs_api(message: impl Into<String>) -> Self {
        Self::ObsApi {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create an OBS API error with status code and endpoint.
    pub fn obs_api_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::ObsApi {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a credential error.
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with the offending ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a render error.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_status() {
            Self::obs_api(format!("HTTP error: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<quick_xml::DeError> for AppError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::obs_api(format!("Malformed XML response: {}", err))
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::render(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}
