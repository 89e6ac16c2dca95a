//! View model builder.
//!
//! Pure transformation from a fetched [`RequestBundle`] into the flat,
//! serializable structure the templates substitute from. No I/O; the
//! clock is an explicit argument so the output is fully determined by
//! the inputs.

use crate::config::RenderOptions;
use crate::error::AppError;
use crate::models::{BuildResult, Comment, FileDiff, Issue};
use crate::services::obs_client::RequestBundle;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Template-ready representation of one request.
///
/// Every slot the templates reference exists here; optional upstream
/// fields become empty strings so a missing value never breaks a lookup.
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    pub id: String,
    pub kind: String,
    pub creator: String,
    pub description: String,

    pub source_project: String,
    pub source_package: String,
    pub source_rev: String,
    pub target_project: String,
    pub target_package: String,

    pub state: StateView,

    /// Package name used for display and build-result grouping.
    pub package: String,

    /// Staging project, empty when the request is not staged.
    pub staging: String,

    pub history: Vec<HistoryEventView>,
    pub comments: Vec<Comment>,
    pub diffs: Vec<FileDiffView>,
    pub issues: Vec<Issue>,
    pub results: Vec<PackageResultsView>,

    pub has_history: bool,
    pub has_comments: bool,
    pub has_diffs: bool,
    pub has_issues: bool,
    pub has_results: bool,

    /// Link to the request in the OBS web UI.
    pub web_url: String,
    pub creator_url: String,
    pub source_project_url: String,
    pub target_project_url: String,
    pub source_package_url: String,
    pub target_package_url: String,
    pub staging_url: String,

    pub theme: String,
    pub stylesheet_url: String,
    pub generated_at: String,
}

/// Current state slots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateView {
    pub name: String,
    pub who: String,
    pub when: String,
    pub created: String,
    pub comment: String,
    pub superseded_by: String,
}

/// One flattened review-history event.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEventView {
    pub who: String,
    pub when: String,
    pub when_relative: String,
    pub description: String,
    pub comment: String,
}

/// One file diff, formatted for the template's client-side highlighter.
#[derive(Debug, Clone, Serialize)]
pub struct FileDiffView {
    pub state: String,
    pub display_path: String,
    pub content: String,
}

/// Build results grouped package → repository → arch, in first-seen order.
#[derive(Debug, Clone, Serialize)]
pub struct PackageResultsView {
    pub package: String,
    pub repositories: Vec<RepositoryResultsView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryResultsView {
    pub repository: String,
    pub archs: Vec<ArchResultsView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchResultsView {
    pub arch: String,
    pub code: String,
    pub state: String,
    pub status_code: String,
    pub details: String,
}

/// Build the view model for one fetched request.
///
/// `web_base_url` is the OBS web UI matching the API the bundle came from;
/// `now` anchors the relative-age labels.
pub fn build_view_model(
    bundle: &RequestBundle,
    options: &RenderOptions,
    web_base_url: &str,
    now: DateTime<Utc>,
) -> Result<RequestView, AppError> {
    let request = &bundle.request;

    // An unknown state is a defect in this viewer, not something to paper
    // over with a default rendering.
    let state_kind = request.state.kind()?;

    let action = &request.action;
    let source_project = action.source_project.clone().unwrap_or_default();
    let source_package = action.source_package.clone().unwrap_or_default();
    let target_project = action.target_project.clone().unwrap_or_default();
    let target_package = action.target_package.clone().unwrap_or_default();

    let staging = request.staging_project().unwrap_or_default().to_string();
    let package = request.display_package().unwrap_or_default().to_string();

    let history = flatten_history(bundle, now);
    let diffs: Vec<FileDiffView> = bundle
        .diffs
        .iter()
        .map(|d: &FileDiff| FileDiffView {
            state: d.state.to_string(),
            display_path: d.display_path(),
            content: d.content.clone(),
        })
        .collect();
    let results = group_results(&bundle.results);

    Ok(RequestView {
        id: request.id.clone(),
        kind: action.kind.clone(),
        creator: request.creator.clone(),
        description: request.description.clone(),

        web_url: format!("{}/requests/{}", web_base_url, request.id),
        creator_url: format!("{}/users/{}", web_base_url, request.creator),
        source_project_url: format!("{}/project/show/{}", web_base_url, source_project),
        target_project_url: format!("{}/project/show/{}", web_base_url, target_project),
        source_package_url: format!(
            "{}/package/show/{}/{}",
            web_base_url, source_project, source_package
        ),
        target_package_url: format!(
            "{}/package/show/{}/{}",
            web_base_url, target_project, target_package
        ),
        staging_url: if staging.is_empty() {
            String::new()
        } else {
            format!("{}/project/show/{}", web_base_url, staging)
        },

        source_project,
        source_package,
        source_rev: action.source_rev.clone().unwrap_or_default(),
        target_project,
        target_package,

        state: StateView {
            name: state_kind.to_string(),
            who: request.state.who.clone().unwrap_or_default(),
            when: request.state.when.clone().unwrap_or_default(),
            created: request.state.created.clone().unwrap_or_default(),
            comment: request.state.comment.clone(),
            superseded_by: request.state.superseded_by.clone().unwrap_or_default(),
        },

        package,
        staging,

        has_history: !history.is_empty(),
        has_comments: !bundle.comments.is_empty(),
        has_diffs: !diffs.is_empty(),
        has_issues: !bundle.issues.is_empty(),
        has_results: !results.is_empty(),

        history,
        comments: bundle.comments.clone(),
        diffs,
        issues: bundle.issues.clone(),
        results,

        theme: options.theme.to_string(),
        stylesheet_url: options.stylesheet_url.clone(),
        generated_at: now.format("%Y-%m-%d %H:%M UTC").to_string(),
    })
}

/// Flatten the reviews' nested history into one timeline sorted by time.
fn flatten_history(bundle: &RequestBundle, now: DateTime<Utc>) -> Vec<HistoryEventView> {
    let mut events: Vec<(NaiveDateTime, HistoryEventView)> = bundle
        .request
        .reviews
        .iter()
        .flat_map(|review| review.history.iter())
        .map(|event| {
            (
                event.when,
                HistoryEventView {
                    who: event.who.clone(),
                    when: event.when.format("%Y-%m-%d %H:%M").to_string(),
                    when_relative: relative_age(event.when, now),
                    description: event.description.clone(),
                    comment: event.comment.clone(),
                },
            )
        })
        .collect();

    events.sort_by_key(|(when, _)| *when);
    events.into_iter().map(|(_, view)| view).collect()
}

/// Human age label for a timestamp: whole days once at least one day has
/// passed, hours below that. OBS timestamps are UTC without an offset.
fn relative_age(when: NaiveDateTime, now: DateTime<Utc>) -> String {
    let delta = now.naive_utc().signed_duration_since(when);
    if delta.num_days() > 0 {
        format!("{} days ago", delta.num_days())
    } else {
        format!("{} hours ago", delta.num_hours().max(0))
    }
}

/// Group flat build results package → repository → arch, keeping the
/// upstream order of first appearance at every level.
fn group_results(results: &[BuildResult]) -> Vec<PackageResultsView> {
    let mut grouped: Vec<PackageResultsView> = Vec::new();

    for result in results {
        let package_idx = match grouped.iter().position(|p| p.package == result.package) {
            Some(idx) => idx,
            None => {
                grouped.push(PackageResultsView {
                    package: result.package.clone(),
                    repositories: Vec::new(),
                });
                grouped.len() - 1
            }
        };
        let package = &mut grouped[package_idx];

        let repo_idx = match package
            .repositories
            .iter()
            .position(|r| r.repository == result.repository)
        {
            Some(idx) => idx,
            None => {
                package.repositories.push(RepositoryResultsView {
                    repository: result.repository.clone(),
                    archs: Vec::new(),
                });
                package.repositories.len() - 1
            }
        };

        package.repositories[repo_idx].archs.push(ArchResultsView {
            arch: result.arch.clone(),
            code: result.code.clone(),
            state: result.state.clone(),
            status_code: result.status_code.clone(),
            details: result.details.clone().unwrap_or_default(),
        });
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChangeType, Request, RequestAction, RequestState, Review, ReviewEvent,
    };
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn sample_bundle() -> RequestBundle {
        RequestBundle {
            request: Request {
                id: "1234".into(),
                creator: "alice".into(),
                description: "Update to version 1.2".into(),
                action: RequestAction {
                    kind: "submit".into(),
                    source_project: Some("home:alice:branches".into()),
                    source_package: Some("mypkg".into()),
                    source_rev: Some("7".into()),
                    target_project: Some("openSUSE:Factory".into()),
                    target_package: Some("mypkg".into()),
                },
                state: RequestState {
                    name: "review".into(),
                    who: Some("bob".into()),
                    when: Some("2024-05-02T10:00:00".into()),
                    created: Some("2024-05-01T09:00:00".into()),
                    comment: String::new(),
                    superseded_by: None,
                },
                reviews: vec![
                    Review {
                        state: "accepted".into(),
                        history: vec![ReviewEvent {
                            who: "factory-auto".into(),
                            when: NaiveDateTime::parse_from_str(
                                "2024-05-08T10:00:00",
                                "%Y-%m-%dT%H:%M:%S",
                            )
                            .unwrap(),
                            description: "Review got accepted".into(),
                            comment: String::new(),
                        }],
                        ..Default::default()
                    },
                    Review {
                        state: "new".into(),
                        history: vec![ReviewEvent {
                            who: "licensedigger".into(),
                            when: NaiveDateTime::parse_from_str(
                                "2024-05-01T10:00:00",
                                "%Y-%m-%dT%H:%M:%S",
                            )
                            .unwrap(),
                            description: "Review got added".into(),
                            comment: String::new(),
                        }],
                        ..Default::default()
                    },
                ],
            },
            diffs: vec![
                FileDiff {
                    state: ChangeType::Changed,
                    old_name: Some("mypkg.changes".into()),
                    new_name: Some("mypkg.changes".into()),
                    content: "+ new entry".into(),
                },
                FileDiff {
                    state: ChangeType::Added,
                    old_name: None,
                    new_name: Some("fix.patch".into()),
                    content: "+ patch body".into(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_diff_list_preserves_count_and_order() {
        let view = build_view_model(
            &sample_bundle(),
            &RenderOptions::default(),
            "https://build.opensuse.org",
            fixed_now(),
        )
        .unwrap();

        assert_eq!(view.diffs.len(), 2);
        assert_eq!(view.diffs[0].display_path, "mypkg.changes");
        assert_eq!(view.diffs[1].display_path, "fix.patch");
        assert!(view.has_diffs);
    }

    #[test]
    fn test_empty_diffs_yield_empty_list() {
        let mut bundle = sample_bundle();
        bundle.diffs.clear();
        let view = build_view_model(
            &bundle,
            &RenderOptions::default(),
            "https://build.opensuse.org",
            fixed_now(),
        )
        .unwrap();

        assert!(view.diffs.is_empty());
        assert!(!view.has_diffs);
    }

    #[test]
    fn test_history_flattened_and_sorted() {
        let view = build_view_model(
            &sample_bundle(),
            &RenderOptions::default(),
            "https://build.opensuse.org",
            fixed_now(),
        )
        .unwrap();

        assert_eq!(view.history.len(), 2);
        // The later review appears first in the reviews list but its event
        // is newer, so it sorts second.
        assert_eq!(view.history[0].who, "licensedigger");
        assert_eq!(view.history[1].who, "factory-auto");
        assert_eq!(view.history[0].when_relative, "9 days ago");
        assert_eq!(view.history[1].when_relative, "2 days ago");
    }

    #[test]
    fn test_relative_age_hours() {
        let when =
            NaiveDateTime::parse_from_str("2024-05-10T07:30:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(relative_age(when, fixed_now()), "4 hours ago");
    }

    #[test]
    fn test_relative_age_future_clamped() {
        let when =
            NaiveDateTime::parse_from_str("2024-05-10T13:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(relative_age(when, fixed_now()), "0 hours ago");
    }

    #[test]
    fn test_unknown_state_is_render_error() {
        let mut bundle = sample_bundle();
        bundle.request.state.name = "mystery".into();
        let err = build_view_model(
            &bundle,
            &RenderOptions::default(),
            "https://build.opensuse.org",
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Render { .. }));
    }

    #[test]
    fn test_absent_optionals_become_empty_strings() {
        let mut bundle = sample_bundle();
        bundle.request.description = String::new();
        bundle.request.action.source_rev = None;
        let view = build_view_model(
            &bundle,
            &RenderOptions::default(),
            "https://build.opensuse.org",
            fixed_now(),
        )
        .unwrap();

        assert_eq!(view.description, "");
        assert_eq!(view.source_rev, "");
        assert_eq!(view.state.superseded_by, "");
    }

    #[test]
    fn test_web_links() {
        let view = build_view_model(
            &sample_bundle(),
            &RenderOptions::default(),
            "https://build.opensuse.org",
            fixed_now(),
        )
        .unwrap();

        assert_eq!(view.web_url, "https://build.opensuse.org/requests/1234");
        assert_eq!(
            view.target_package_url,
            "https://build.opensuse.org/package/show/openSUSE:Factory/mypkg"
        );
        assert_eq!(view.staging_url, "");
    }

    #[test]
    fn test_group_results_nesting_and_order() {
        let mk = |package: &str, repo: &str, arch: &str, code: &str| BuildResult {
            package: package.into(),
            repository: repo.into(),
            arch: arch.into(),
            code: "building".into(),
            state: "building".into(),
            status_code: code.into(),
            details: None,
        };
        let results = vec![
            mk("mypkg", "standard", "x86_64", "succeeded"),
            mk("mypkg", "standard", "aarch64", "building"),
            mk("mypkg:docs", "standard", "x86_64", "failed"),
            mk("mypkg", "ports", "riscv64", "unresolvable"),
        ];

        let grouped = group_results(&results);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].package, "mypkg");
        assert_eq!(grouped[0].repositories.len(), 2);
        assert_eq!(grouped[0].repositories[0].repository, "standard");
        assert_eq!(grouped[0].repositories[0].archs.len(), 2);
        assert_eq!(grouped[1].package, "mypkg:docs");
    }
}
