//! HTTP front-end.
//!
//! A small axum server exposing the same pipeline as the CLI: a landing
//! page with a request-id form and an inline request page per id. The
//! handlers share one immutable state; each incoming request triggers an
//! independent fetch, so no synchronization is needed.

use crate::config::{RenderOptions, Theme};
use crate::error::AppError;
use crate::services::obs_client::{validate_request_id, RequestSource};
use crate::services::renderer::Renderer;
use crate::services::view_model::build_view_model;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn RequestSource>,
    pub renderer: Arc<Renderer>,
    pub options: RenderOptions,
    pub web_base_url: String,
}

/// Wrapper to make AppError usable as an axum error response.
struct ApiErr(AppError);

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{}", self.0);
        }

        let body = format!(
            "<!DOCTYPE html><html><body><h2>{}</h2><pre>{}</pre></body></html>",
            status,
            handlebars::html_escape(&self.0.to_string())
        );
        (status, Html(body)).into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

#[derive(Deserialize)]
struct PageQuery {
    theme: Option<String>,
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/request/{request_id}", get(show_request))
        .with_state(state)
}

/// GET / — landing page with the request-id form.
async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiErr> {
    Ok(Html(state.renderer.render_index(&state.options)?))
}

/// GET /request/{id} — fetch, build, render, return inline.
async fn show_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ApiErr> {
    validate_request_id(&request_id)?;

    let bundle = state.source.fetch_request(&request_id).await?;

    let mut options = state.options.clone();
    if let Some(theme) = query.theme.as_deref() {
        options.theme = Theme::from(theme);
    }

    let view = build_view_model(&bundle, &options, &state.web_base_url, Utc::now())?;
    let html = state.renderer.render_request(&view)?;

    info!("Rendered request {}", request_id);
    Ok(Html(html))
}

/// Bind and run the server until ctrl-c.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), AppError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::io(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
