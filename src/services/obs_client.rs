//! OBS API client.
//!
//! HTTP client for the Open Build Service XML API with Basic auth taken
//! from the osc credential file. One immutable handle is created at
//! startup and passed into every fetch; the handle holds no per-request
//! state and is safe to share across concurrent requests.

use crate::config::ObsClientConfig;
use crate::error::AppError;
use crate::models::diff::sort_diffs_for_display;
use crate::models::{
    BuildResult, ChangeType, Comment, FileDiff, Issue, Request, RequestAction, RequestState,
    Review, ReviewEvent,
};
use crate::services::credentials::Credentials;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Timestamp format used by the OBS API (`2024-05-01T09:30:00`).
const OBS_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Everything one render needs, fetched in a single pass.
#[derive(Debug, Clone, Default)]
pub struct RequestBundle {
    pub request: Request,
    pub comments: Vec<Comment>,
    pub diffs: Vec<FileDiff>,
    pub issues: Vec<Issue>,
    pub results: Vec<BuildResult>,
}

/// Read access to request data, independent of the transport.
///
/// `ObsClient` is the production implementation; the HTTP server is
/// generic over this trait so it can be tested without a network.
#[async_trait]
pub trait RequestSource: Send + Sync {
    /// Fetch the full bundle for one request id.
    async fn fetch_request(&self, request_id: &str) -> Result<RequestBundle, AppError>;
}

/// Check a request id before any network call is made.
///
/// OBS request ids are positive integers; anything else is rejected
/// up front with an input error rather than a confusing API failure.
pub fn validate_request_id(request_id: &str) -> Result<(), AppError> {
    if request_id.is_empty() || !request_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::invalid_input(format!(
            "Invalid request id: {:?}",
            request_id
        )));
    }
    Ok(())
}

/// OBS API client.
#[derive(Debug, Clone)]
pub struct ObsClient {
    client: Client,
    config: ObsClientConfig,
    credentials: Credentials,
}

impl ObsClient {
    /// Create a new OBS client.
    pub fn new(config: ObsClientConfig, credentials: Credentials) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// Build a full API URL from an endpoint path.
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), endpoint)
    }

    /// Issue an authenticated request and return the response body on success.
    async fn request_text(&self, method: Method, endpoint: &str) -> Result<String, AppError> {
        let url = self.api_url(endpoint);
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method, &url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;

        Self::handle_response(response, endpoint).await
    }

    /// Map non-success statuses to errors, extracting the OBS error summary.
    async fn handle_response(response: Response, endpoint: &str) -> Result<String, AppError> {
        let status = response.status();

        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| AppError::obs_api(format!("Failed to read response: {}", e)));
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::authentication(
                "OBS rejected the stored credentials",
            ));
        }

        let body = response.text().await.unwrap_or_default();
        let summary = quick_xml::de::from_str::<ErrorStatusXml>(&body)
            .ok()
            .and_then(|s| s.summary);

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound {
                resource: summary.unwrap_or_else(|| "Resource not found".to_string()),
                id: None,
            });
        }

        Err(AppError::obs_api_full(
            summary.unwrap_or_else(|| format!("Request failed ({})", status.as_u16())),
            status.as_u16(),
            endpoint,
        ))
    }

    /// Fetch and parse the request metadata.
    async fn fetch_metadata(&self, request_id: &str) -> Result<Request, AppError> {
        let xml = self
            .request_text(Method::GET, &format!("/request/{}", request_id))
            .await?;
        let mut request = parse_request_xml(&xml)?;
        if request.id.is_empty() {
            request.id = request_id.to_string();
        }
        Ok(request)
    }

    /// Fetch the request's comment thread.
    async fn fetch_comments(&self, request_id: &str) -> Result<Vec<Comment>, AppError> {
        let xml = self
            .request_text(Method::GET, &format!("/comments/request/{}", request_id))
            .await?;
        parse_comments_xml(&xml)
    }

    /// Fetch the per-file diffs and the issues they mention.
    async fn fetch_diff(&self, request_id: &str) -> Result<(Vec<FileDiff>, Vec<Issue>), AppError> {
        let endpoint = format!("/request/{}?cmd=diff&view=xml&withissues=1", request_id);
        let xml = self.request_text(Method::POST, &endpoint).await?;
        parse_diff_xml(&xml)
    }

    /// Fetch build results for the request's package in one project.
    async fn fetch_build_results(
        &self,
        project: &str,
        package: &str,
    ) -> Result<Vec<BuildResult>, AppError> {
        let xml = self
            .request_text(Method::GET, &format!("/build/{}/_result", project))
            .await?;
        parse_build_results_xml(&xml, package)
    }
}

#[async_trait]
impl RequestSource for ObsClient {
    async fn fetch_request(&self, request_id: &str) -> Result<RequestBundle, AppError> {
        let request = self.fetch_metadata(request_id).await.map_err(|e| match e {
            AppError::NotFound { .. } => AppError::not_found_with_id("request", request_id),
            other => other,
        })?;

        // The comment thread is decoration; a missing one is an empty one.
        let comments = match self.fetch_comments(request_id).await {
            Ok(comments) => comments,
            Err(AppError::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        let (mut diffs, issues) = self.fetch_diff(request_id).await.map_err(|e| match e {
            AppError::NotFound { .. } => AppError::not_found_with_id("request diff", request_id),
            other => other,
        })?;
        sort_diffs_for_display(&mut diffs);

        // Staged requests build in the staging project, everything else in
        // the source project. A vanished project yields empty results, not
        // a failed page.
        let results = match (request.build_project(), request.display_package()) {
            (Some(project), Some(package)) => {
                match self.fetch_build_results(project, package).await {
                    Ok(results) => results,
                    Err(AppError::NotFound { .. }) => Vec::new(),
                    Err(e) => return Err(e),
                }
            }
            _ => Vec::new(),
        };

        Ok(RequestBundle {
            request,
            comments,
            diffs,
            issues,
            results,
        })
    }
}

// ── Wire format ──────────────────────────────────────────────────────────────

/// OBS error body: `<status code="..."><summary>...</summary></status>`.
#[derive(Debug, Deserialize)]
struct ErrorStatusXml {
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RequestXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "@creator", default)]
    creator: String,
    #[serde(default)]
    action: Vec<ActionXml>,
    state: Option<StateXml>,
    #[serde(default)]
    review: Vec<ReviewXml>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ActionXml {
    #[serde(rename = "@type", default)]
    kind: String,
    source: Option<SourceTargetXml>,
    target: Option<SourceTargetXml>,
}

#[derive(Debug, Deserialize)]
struct SourceTargetXml {
    #[serde(rename = "@project")]
    project: Option<String>,
    #[serde(rename = "@package")]
    package: Option<String>,
    #[serde(rename = "@rev")]
    rev: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateXml {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@who")]
    who: Option<String>,
    #[serde(rename = "@when")]
    when: Option<String>,
    #[serde(rename = "@created")]
    created: Option<String>,
    #[serde(rename = "@superseded_by")]
    superseded_by: Option<String>,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct ReviewXml {
    #[serde(rename = "@state", default)]
    state: String,
    #[serde(rename = "@when")]
    when: Option<String>,
    #[serde(rename = "@who")]
    who: Option<String>,
    #[serde(rename = "@by_user")]
    by_user: Option<String>,
    #[serde(rename = "@by_group")]
    by_group: Option<String>,
    #[serde(rename = "@by_project")]
    by_project: Option<String>,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    history: Vec<ReviewHistoryXml>,
}

#[derive(Debug, Deserialize)]
struct ReviewHistoryXml {
    #[serde(rename = "@who", default)]
    who: String,
    #[serde(rename = "@when", default)]
    when: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct CommentsXml {
    #[serde(default)]
    comment: Vec<CommentXml>,
}

#[derive(Debug, Deserialize)]
struct CommentXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "@who", default)]
    who: String,
    #[serde(rename = "@when", default)]
    when: String,
    #[serde(rename = "@parent")]
    parent: Option<String>,
    #[serde(rename = "$text", default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct DiffRequestXml {
    #[serde(default)]
    action: Vec<DiffActionXml>,
}

#[derive(Debug, Deserialize)]
struct DiffActionXml {
    sourcediff: Option<SourceDiffXml>,
}

#[derive(Debug, Deserialize)]
struct SourceDiffXml {
    files: Option<FilesXml>,
    issues: Option<IssuesXml>,
}

#[derive(Debug, Deserialize)]
struct FilesXml {
    #[serde(default)]
    file: Vec<FileXml>,
}

#[derive(Debug, Deserialize)]
struct FileXml {
    #[serde(rename = "@state")]
    state: Option<String>,
    old: Option<FileNameXml>,
    new: Option<FileNameXml>,
    diff: Option<DiffBodyXml>,
}

#[derive(Debug, Deserialize)]
struct FileNameXml {
    #[serde(rename = "@name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiffBodyXml {
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct IssuesXml {
    #[serde(default)]
    issue: Vec<IssueXml>,
}

#[derive(Debug, Deserialize)]
struct IssueXml {
    #[serde(rename = "@state")]
    state: Option<String>,
    #[serde(rename = "@tracker")]
    tracker: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@label")]
    label: Option<String>,
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultListXml {
    #[serde(default)]
    result: Vec<ResultXml>,
}

#[derive(Debug, Deserialize)]
struct ResultXml {
    #[serde(rename = "@repository", default)]
    repository: String,
    #[serde(rename = "@arch", default)]
    arch: String,
    #[serde(rename = "@code", default)]
    code: String,
    #[serde(rename = "@state", default)]
    state: String,
    #[serde(default)]
    status: Vec<StatusXml>,
}

#[derive(Debug, Deserialize)]
struct StatusXml {
    #[serde(rename = "@package", default)]
    package: String,
    #[serde(rename = "@code", default)]
    code: String,
    details: Option<String>,
}

// ── Parsing ──────────────────────────────────────────────────────────────────

fn parse_obs_timestamp(raw: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(raw, OBS_TIME_FORMAT)
        .map_err(|e| AppError::obs_api(format!("Bad timestamp {:?}: {}", raw, e)))
}

/// Parse the `/request/{id}` metadata response.
pub fn parse_request_xml(xml: &str) -> Result<Request, AppError> {
    let raw: RequestXml = quick_xml::de::from_str(xml)?;

    // OBS allows multiple actions per request; this viewer renders the
    // first, which is the only one submit/delete requests carry.
    let action = raw
        .action
        .into_iter()
        .next()
        .map(|a| RequestAction {
            kind: a.kind,
            source_project: a.source.as_ref().and_then(|s| s.project.clone()),
            source_package: a.source.as_ref().and_then(|s| s.package.clone()),
            source_rev: a.source.as_ref().and_then(|s| s.rev.clone()),
            target_project: a.target.as_ref().and_then(|t| t.project.clone()),
            target_package: a.target.as_ref().and_then(|t| t.package.clone()),
        })
        .unwrap_or_default();

    let state = raw
        .state
        .map(|s| RequestState {
            name: s.name,
            who: s.who,
            when: s.when,
            created: s.created,
            comment: s.comment.trim().to_string(),
            superseded_by: s.superseded_by,
        })
        .unwrap_or_default();

    let reviews = raw
        .review
        .into_iter()
        .map(|r| {
            let history = r
                .history
                .into_iter()
                .map(|h| {
                    Ok(ReviewEvent {
                        who: h.who,
                        when: parse_obs_timestamp(&h.when)?,
                        description: h.description.trim().to_string(),
                        comment: h.comment.trim().to_string(),
                    })
                })
                .collect::<Result<Vec<_>, AppError>>()?;

            Ok(Review {
                state: r.state,
                who: r.who,
                when: r.when,
                by_user: r.by_user,
                by_group: r.by_group,
                by_project: r.by_project,
                comment: r.comment.trim().to_string(),
                history,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Request {
        id: raw.id,
        creator: raw.creator,
        description: raw.description.trim().to_string(),
        action,
        state,
        reviews,
    })
}

/// Parse the `/comments/request/{id}` response.
pub fn parse_comments_xml(xml: &str) -> Result<Vec<Comment>, AppError> {
    let raw: CommentsXml = quick_xml::de::from_str(xml)?;

    Ok(raw
        .comment
        .into_iter()
        .map(|c| Comment {
            id: c.id,
            who: c.who,
            when: c.when,
            parent: c.parent,
            body: c.body.trim().to_string(),
        })
        .collect())
}

/// Parse the diff response (`cmd=diff&view=xml&withissues=1`).
///
/// Returns the file diffs in API order together with the issues the diff
/// mentions; the display sort is applied by the caller.
pub fn parse_diff_xml(xml: &str) -> Result<(Vec<FileDiff>, Vec<Issue>), AppError> {
    let raw: DiffRequestXml = quick_xml::de::from_str(xml)?;

    let mut diffs = Vec::new();
    let mut issues = Vec::new();

    for action in raw.action {
        let Some(sourcediff) = action.sourcediff else {
            continue;
        };

        for file in sourcediff.files.map(|f| f.file).unwrap_or_default() {
            let old_name = file.old.and_then(|o| o.name);
            let new_name = file.new.and_then(|n| n.name);

            let state = match (&old_name, &new_name) {
                (Some(old), Some(new)) if old != new => ChangeType::Renamed,
                _ => file.state.as_deref().map(ChangeType::from).unwrap_or(ChangeType::Changed),
            };

            diffs.push(FileDiff {
                state,
                old_name,
                new_name,
                content: file.diff.map(|d| d.text.trim().to_string()).unwrap_or_default(),
            });
        }

        for issue in sourcediff.issues.map(|i| i.issue).unwrap_or_default() {
            issues.push(Issue {
                state: issue.state,
                tracker: issue.tracker,
                name: issue.name,
                label: issue.label,
                url: issue.url,
            });
        }
    }

    Ok((diffs, issues))
}

/// Parse the `/build/{project}/_result` response, keeping only entries for
/// `package` (and its multibuild flavors) that carry build information.
pub fn parse_build_results_xml(xml: &str, package: &str) -> Result<Vec<BuildResult>, AppError> {
    let raw: ResultListXml = quick_xml::de::from_str(xml)?;

    let mut results = Vec::new();
    for result in raw.result {
        for status in result.status {
            if !BuildResult::matches_package(&status.package, package) {
                continue;
            }
            let entry = BuildResult {
                package: status.package,
                repository: result.repository.clone(),
                arch: result.arch.clone(),
                code: result.code.clone(),
                state: result.state.clone(),
                status_code: status.code,
                details: status.details,
            };
            if !entry.is_hidden() {
                results.push(entry);
            }
        }
    }

    Ok(results)
}
