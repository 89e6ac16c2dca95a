//! One-shot pipeline used by the CLI: fetch, build, render, write.

use crate::config::RenderOptions;
use crate::error::AppError;
use crate::services::obs_client::{validate_request_id, RequestSource};
use crate::services::renderer::Renderer;
use crate::services::sink;
use crate::services::view_model::build_view_model;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Fetch one request and write its rendered page to
/// `<output_dir>/<request_id>.html`, returning the written path.
///
/// Strictly sequenced: any failure before the final write leaves the
/// output directory untouched.
pub async fn render_to_file(
    source: &dyn RequestSource,
    options: &RenderOptions,
    web_base_url: &str,
    output_dir: &Path,
    request_id: &str,
) -> Result<PathBuf, AppError> {
    validate_request_id(request_id)?;
    let bundle = source.fetch_request(request_id).await?;
    let view = build_view_model(&bundle, options, web_base_url, Utc::now())?;
    let html = Renderer::new()?.render_request(&view)?;
    sink::write_page(output_dir, request_id, &html)
}
