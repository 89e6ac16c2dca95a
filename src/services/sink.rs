//! File sink.

use crate::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write a rendered page to `<output_dir>/<request_id>.html`.
///
/// Creates the directory if absent and overwrites an existing file
/// without warning, so repeated runs for the same id are idempotent.
pub fn write_page(output_dir: &Path, request_id: &str, html: &str) -> Result<PathBuf, AppError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.html", request_id));
    fs::write(&path, html)?;
    info!("Wrote {}", path.display());
    Ok(path)
}
