//! End-to-end pipeline tests: fixture XML → parse → view model → HTML.
//!
//! These exercise the whole transformation without a network, using
//! captured OBS API responses.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use obs_sr_view::config::RenderOptions;
use obs_sr_view::error::AppError;
use obs_sr_view::models::diff::sort_diffs_for_display;
use obs_sr_view::services::obs_client::{
    parse_build_results_xml, parse_comments_xml, parse_diff_xml, parse_request_xml, RequestBundle,
    RequestSource,
};
use obs_sr_view::services::pipeline::render_to_file;
use obs_sr_view::services::renderer::Renderer;
use obs_sr_view::services::sink::write_page;
use obs_sr_view::services::view_model::build_view_model;

const REQUEST_XML: &str = include_str!("fixtures/request.xml");
const COMMENTS_XML: &str = include_str!("fixtures/comments.xml");
const DIFF_XML: &str = include_str!("fixtures/diff.xml");
const DIFF_EMPTY_XML: &str = include_str!("fixtures/diff_empty.xml");
const RESULTS_XML: &str = include_str!("fixtures/results.xml");

const WEB_BASE: &str = "https://build.opensuse.org";

fn fixture_bundle() -> RequestBundle {
    let request = parse_request_xml(REQUEST_XML).unwrap();
    let comments = parse_comments_xml(COMMENTS_XML).unwrap();
    let (mut diffs, issues) = parse_diff_xml(DIFF_XML).unwrap();
    sort_diffs_for_display(&mut diffs);
    let results = parse_build_results_xml(RESULTS_XML, "mypkg").unwrap();

    RequestBundle {
        request,
        comments,
        diffs,
        issues,
        results,
    }
}

fn render(bundle: &RequestBundle) -> String {
    let view = build_view_model(
        bundle,
        &RenderOptions::default(),
        WEB_BASE,
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
    )
    .unwrap();
    Renderer::new().unwrap().render_request(&view).unwrap()
}

#[test]
fn diff_list_matches_changed_files_in_display_order() {
    let bundle = fixture_bundle();

    assert_eq!(bundle.diffs.len(), 3);
    let names: Vec<String> = bundle.diffs.iter().map(|d| d.display_path()).collect();
    assert_eq!(names, vec!["mypkg.changes", "mypkg.spec", "fix-build.patch"]);

    let view = build_view_model(
        &bundle,
        &RenderOptions::default(),
        WEB_BASE,
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
    )
    .unwrap();
    assert_eq!(view.diffs.len(), 3);
    assert_eq!(view.diffs[0].display_path, "mypkg.changes");
}

#[test]
fn page_contains_target_coordinates_verbatim() {
    let html = render(&fixture_bundle());
    assert!(html.contains("openSUSE:Factory"));
    assert!(html.contains("mypkg"));
    assert!(html.contains("Update to version 1.2"));
}

#[test]
fn page_reflects_staging_and_history() {
    let html = render(&fixture_bundle());
    assert!(html.contains("openSUSE:Factory:Staging:C"));
    assert!(html.contains("Review got accepted"));
    // staged on 2024-05-01, rendered on 2024-05-10
    assert!(html.contains("9 days ago"));
}

#[test]
fn request_with_no_changed_files_renders_no_changes_state() {
    let mut bundle = fixture_bundle();
    let (diffs, _) = parse_diff_xml(DIFF_EMPTY_XML).unwrap();
    assert!(diffs.is_empty());
    bundle.diffs = diffs;

    let html = render(&bundle);
    assert!(html.contains("No changes."));
}

#[test]
fn excluded_build_results_are_dropped() {
    let bundle = fixture_bundle();
    assert_eq!(bundle.results.len(), 2);
    assert!(bundle.results.iter().all(|r| r.status_code != "excluded"));

    let html = render(&bundle);
    assert!(html.contains("unresolvable"));
    assert!(html.contains("nothing provides libfoo"));
}

/// Source for the one-shot pipeline tests: either the fixture bundle or
/// an upstream not-found, regardless of id.
struct FixtureSource {
    missing: bool,
}

#[async_trait]
impl RequestSource for FixtureSource {
    async fn fetch_request(&self, request_id: &str) -> Result<RequestBundle, AppError> {
        if self.missing {
            Err(AppError::not_found_with_id("request", request_id))
        } else {
            Ok(fixture_bundle())
        }
    }
}

#[tokio::test]
async fn one_shot_pipeline_writes_the_page() {
    let dir = tempfile::tempdir().unwrap();
    let source = FixtureSource { missing: false };

    let path = render_to_file(
        &source,
        &RenderOptions::default(),
        WEB_BASE,
        dir.path(),
        "1234",
    )
    .await
    .unwrap();

    assert_eq!(path, dir.path().join("1234.html"));
    assert!(std::fs::read_to_string(path)
        .unwrap()
        .contains("openSUSE:Factory"));
}

#[tokio::test]
async fn failed_fetch_leaves_output_directory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source = FixtureSource { missing: true };

    let err = render_to_file(
        &source,
        &RenderOptions::default(),
        WEB_BASE,
        dir.path(),
        "999",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound { .. }));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn file_sink_is_idempotent_by_filename() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = fixture_bundle();

    // Descriptions the fixture carries nowhere else, so the overwrite is
    // observable in the page body.
    let mut first_pass = bundle.clone();
    first_pass.request.description = "first render marker".into();
    let first = write_page(dir.path(), "1234", &render(&first_pass)).unwrap();

    // Second render with changed remote state overwrites in place.
    let mut second_pass = bundle.clone();
    second_pass.request.description = "second render marker".into();
    let second = write_page(dir.path(), "1234", &render(&second_pass)).unwrap();

    assert_eq!(first, second);
    let content = std::fs::read_to_string(second).unwrap();
    assert!(content.contains("second render marker"));
    assert!(!content.contains("first render marker"));
}
