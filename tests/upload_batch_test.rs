mod common;

use std::fs;
use std::sync::Arc;

use common::{FakeRepository, BASE_URL, PASSWORD, USERNAME};
use mods_xml_uploader::{App, AuthError, Config, Credentials, ItemOutcome, WebClient};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn batch_dir(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in files {
        fs::write(dir.path().join(name), format!("<mods>{}</mods>", name)).unwrap();
    }
    dir
}

fn config_for(dir: &TempDir) -> Config {
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();
    Config {
        base_url: BASE_URL.to_string(),
        xml_folder: dir.path().display().to_string(),
        output_log_file: out.join("upload_log.txt").display().to_string(),
        failure_log_file: out.join("failed.txt").display().to_string(),
        report_file: Some(out.join("report.json").display().to_string()),
        ..Config::default()
    }
}

fn app_for(dir: &TempDir, site: &Arc<FakeRepository>) -> App {
    let client: Arc<dyn WebClient> = site.clone();
    App::with_client(config_for(dir), client)
}

#[tokio::test]
async fn test_end_to_end_batch_with_denied_lock() {
    let dir = batch_dir(&["repoA_001.xml", "repoA_002.xml", "bad.xml"]);
    let site = Arc::new(FakeRepository::new().deny_lock("repoA:002"));
    let app = app_for(&dir, &site);

    let report = assert_ok!(app.run(&Credentials::new(USERNAME, PASSWORD)).await)
        .expect("批次不应为空");

    assert_eq!(report.total(), 2);
    assert_eq!(report.completed(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.tally(), "1/2");

    let denied = report
        .results
        .iter()
        .find(|r| r.item.object_id() == "repoA:002")
        .unwrap();
    assert_eq!(denied.outcome, ItemOutcome::LockUnavailable);

    let uploads = site.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "repoA:001");
    assert_eq!(uploads[0].1, "repoA_001.xml");
    assert_eq!(uploads[0].2, b"<mods>repoA_001.xml</mods>".to_vec());
    assert!(site.locked_objects().is_empty());
    assert_eq!(site.release_requests("repoA:001"), 1);
    assert_eq!(site.release_requests("repoA:002"), 0);

    let failed = fs::read_to_string(dir.path().join("out/failed.txt")).unwrap();
    assert_eq!(failed.lines().count(), 1);
    assert!(failed.contains("repoA:002"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out/report.json")).unwrap())
            .unwrap();
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["completed"], 2);
}

#[tokio::test]
async fn test_batch_without_valid_files_does_not_log_in() {
    let dir = batch_dir(&["bad.xml", "notes.txt"]);
    let site = Arc::new(FakeRepository::new());
    let app = app_for(&dir, &site);

    let report = assert_ok!(app.run(&Credentials::new(USERNAME, PASSWORD)).await);
    assert!(report.is_none());
    assert_eq!(site.request_count(), 0);
}

#[tokio::test]
async fn test_blank_password_aborts_before_any_request() {
    let dir = batch_dir(&["repoA_001.xml"]);
    let site = Arc::new(FakeRepository::new());
    let app = app_for(&dir, &site);

    let err = assert_err!(app.run(&Credentials::new(USERNAME, "   ")).await);
    assert!(matches!(
        err.downcast_ref::<AuthError>(),
        Some(AuthError::BlankPassword)
    ));
    assert_eq!(site.request_count(), 0);
}

#[tokio::test]
async fn test_wrong_password_is_rejected_and_nothing_is_uploaded() {
    let dir = batch_dir(&["repoA_001.xml", "repoA_002.xml"]);
    let site = Arc::new(FakeRepository::new());
    let app = app_for(&dir, &site);

    let err = assert_err!(app.run(&Credentials::new(USERNAME, "wrong")).await);
    match err.downcast_ref::<AuthError>() {
        Some(AuthError::Rejected { heading, .. }) => {
            assert_eq!(heading.as_deref(), Some("User account"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(site.uploads().is_empty());
    assert_eq!(site.lock_requests("repoA:001"), 0);
}

#[tokio::test]
async fn test_cancelled_batch_touches_no_objects() {
    let dir = batch_dir(&["repoA_001.xml", "repoA_002.xml", "repoB_010.xml"]);
    let site = Arc::new(FakeRepository::new());
    let app = app_for(&dir, &site);
    app.cancellation_token().cancel();

    let report = assert_ok!(app.run(&Credentials::new(USERNAME, PASSWORD)).await).unwrap();

    assert_eq!(report.completed(), 3);
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.cancelled(), 3);
    assert!(report
        .results
        .iter()
        .all(|r| r.outcome == ItemOutcome::Cancelled));
    assert!(site.uploads().is_empty());
    assert_eq!(site.lock_requests("repoA:001"), 0);
}
