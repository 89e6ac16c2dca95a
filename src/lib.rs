//! obs-sr-view — HTML viewer for openSUSE Build Service submit requests.
//!
//! Fetches the metadata of one submit/delete request from the OBS XML API,
//! flattens it into a view model, and renders it to a self-contained HTML
//! page, either written to a file by the CLI or served inline by a small
//! web server. Stateless: every render is an independent fetch.

pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;

pub use error::AppError;
