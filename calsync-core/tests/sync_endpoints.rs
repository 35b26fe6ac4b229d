//! Push and pull against a mock calendar server.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use calsync_core::fingerprint::fingerprint;
use calsync_core::{HttpClient, Paths, Resource, ResourceKind, ResourceSpec, Settings, SyncOutcome};
use chrono::Utc;
use wiremock::matchers::{basic_auth, body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALENDAR: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";

fn resource(dir: &Path, name: &str, kind: ResourceKind, address: String) -> Resource {
    let spec = ResourceSpec {
        name: name.to_string(),
        kind,
        address,
    };
    Resource::new(spec, &Paths::new(dir)).unwrap()
}

fn http() -> HttpClient {
    HttpClient::new(&Settings::default()).unwrap()
}

/// Set a file's mtime, so tests don't depend on filesystem timestamp granularity.
fn set_mtime(path: &Path, secs_from_now: i64) {
    let t = if secs_from_now >= 0 {
        SystemTime::now() + Duration::from_secs(secs_from_now as u64)
    } else {
        SystemTime::now() - Duration::from_secs(secs_from_now.unsigned_abs())
    };
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(t).unwrap();
}

// =============================================================================
// Local push
// =============================================================================

#[tokio::test]
async fn push_uploads_then_reports_no_change() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/cal/home.ics"))
        .and(header("Content-Type", "text/calendar"))
        .and(body_bytes(CALENDAR.as_bytes()))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut home = resource(
        dir.path(),
        "Home",
        ResourceKind::LocalPush,
        format!("{}/cal/home.ics", server.uri()),
    );
    fs::write(home.store().current_path(), CALENDAR).unwrap();

    let first = home.sync(&http(), Utc::now()).await.unwrap();
    assert_eq!(first, SyncOutcome::Ok);
    assert_eq!(
        home.store().last_synced_fingerprint().unwrap(),
        fingerprint(CALENDAR.as_bytes())
    );
    assert!(fs::metadata(home.store().last_synced_path()).unwrap().permissions().readonly());

    let log = fs::read_to_string(home.store().log_path()).unwrap();
    assert!(log.starts_with(&format!("{}/cal/home.ics", server.uri())));
    assert!(log.contains("created"));

    // Nothing changed on disk: no second PUT.
    let second = home.sync(&http(), Utc::now()).await.unwrap();
    assert_eq!(second, SyncOutcome::NoChange);
}

#[tokio::test]
async fn push_sends_embedded_credentials_as_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/home.ics"))
        .and(basic_auth("alice", "s3cret"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let address = format!("{}/home.ics", server.uri()).replacen("http://", "http://alice:s3cret@", 1);
    let mut home = resource(dir.path(), "Home", ResourceKind::LocalPush, address);
    fs::write(home.store().current_path(), CALENDAR).unwrap();

    assert_eq!(home.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::Ok);
}

#[tokio::test]
async fn push_skips_touch_without_content_change() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut home = resource(dir.path(), "Home", ResourceKind::LocalPush, format!("{}/h.ics", server.uri()));
    let current = home.store().current_path().to_path_buf();
    fs::write(&current, CALENDAR).unwrap();
    set_mtime(&current, -60);

    assert_eq!(home.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::Ok);

    // Same bytes, newer mtime.
    fs::write(&current, CALENDAR).unwrap();
    set_mtime(&current, 0);

    assert_eq!(home.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::NoChange);
}

#[tokio::test]
async fn push_of_edited_calendar_replaces_read_only_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut home = resource(dir.path(), "Home", ResourceKind::LocalPush, format!("{}/h.ics", server.uri()));
    let current = home.store().current_path().to_path_buf();
    fs::write(&current, CALENDAR).unwrap();
    set_mtime(&current, -60);
    assert_eq!(home.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::Ok);

    fs::write(&current, "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n").unwrap();
    set_mtime(&current, 0);
    assert_eq!(home.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::Ok);

    assert_eq!(
        home.store().read_last_synced().unwrap().unwrap(),
        b"BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n"
    );
}

#[tokio::test]
async fn failed_put_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut home = resource(dir.path(), "Home", ResourceKind::LocalPush, format!("{}/h.ics", server.uri()));
    fs::write(home.store().current_path(), CALENDAR).unwrap();

    let err = home.sync(&http(), Utc::now()).await.unwrap_err();

    assert!(err.to_string().contains("500"));
    assert!(!home.store().last_synced_exists());
}

#[tokio::test]
async fn push_without_local_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut home = resource(
        dir.path(),
        "Home",
        ResourceKind::LocalPush,
        "http://127.0.0.1:9/h.ics".to_string(),
    );

    assert_eq!(home.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::NotFound);
}

// =============================================================================
// Remote pull
// =============================================================================

#[tokio::test]
async fn pull_materializes_calendar_then_reports_no_change() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/work.ics"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(CALENDAR, "text/calendar; charset=utf-8"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut work = resource(dir.path(), "Work", ResourceKind::RemotePull, format!("{}/work.ics", server.uri()));

    assert_eq!(work.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::Ok);
    assert_eq!(work.store().read_current().unwrap().unwrap(), CALENDAR.as_bytes());
    assert!(fs::metadata(work.store().current_path()).unwrap().permissions().readonly());
    assert!(!work.store().last_synced_exists());

    assert_eq!(work.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::NoChange);
}

#[tokio::test]
async fn pull_keeps_previous_version_as_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(CALENDAR, "text/plain"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut work = resource(dir.path(), "Work", ResourceKind::RemotePull, format!("{}/w.ics", server.uri()));
    fs::write(work.store().current_path(), "old calendar").unwrap();

    assert_eq!(work.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::Ok);
    assert_eq!(work.store().read_current().unwrap().unwrap(), CALENDAR.as_bytes());
    assert_eq!(work.store().read_last_synced().unwrap().unwrap(), b"old calendar");
}

#[tokio::test]
async fn pull_rejects_non_calendar_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("{\"error\": \"nope\"}", "application/json"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut work = resource(dir.path(), "Work", ResourceKind::RemotePull, format!("{}/w.ics", server.uri()));
    fs::write(work.store().current_path(), CALENDAR).unwrap();

    assert_eq!(work.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::NotFound);
    assert_eq!(work.store().read_current().unwrap().unwrap(), CALENDAR.as_bytes());

    // The rejected response is still in the trace log.
    let log = fs::read_to_string(work.store().log_path()).unwrap();
    assert!(log.contains("application/json"));
    assert!(log.contains("nope"));
}

#[tokio::test]
async fn unreachable_remote_leaves_files_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CALENDAR, "text/calendar"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut work = resource(dir.path(), "Work", ResourceKind::RemotePull, format!("{}/w.ics", server.uri()));
    fs::write(work.store().current_path(), "BEGIN:VCALENDAR\r\nOLD\r\n").unwrap();
    assert_eq!(work.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::Ok);

    // Same calendar, but nothing listens on port 9.
    let mut offline = resource(
        dir.path(),
        "Work",
        ResourceKind::RemotePull,
        "http://127.0.0.1:9/w.ics".to_string(),
    );
    assert!(offline.sync(&http(), Utc::now()).await.is_err());

    assert_eq!(offline.store().read_current().unwrap().unwrap(), CALENDAR.as_bytes());
    assert_eq!(
        offline.store().read_last_synced().unwrap().unwrap(),
        b"BEGIN:VCALENDAR\r\nOLD\r\n"
    );
    assert!(!offline.store().temp_path().exists());
}

#[tokio::test]
async fn pull_of_missing_remote_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw("Not Found", "text/plain"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut work = resource(dir.path(), "Work", ResourceKind::RemotePull, format!("{}/w.ics", server.uri()));

    assert_eq!(work.sync(&http(), Utc::now()).await.unwrap(), SyncOutcome::NotFound);
    assert!(!work.store().current_exists());
}

#[tokio::test]
async fn pull_before_eligible_time_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut work = resource(dir.path(), "Work", ResourceKind::RemotePull, format!("{}/w.ics", server.uri()));
    let now = Utc::now();
    work.defer_until(now + chrono::TimeDelta::seconds(10));

    assert_eq!(work.sync(&http(), now).await.unwrap(), SyncOutcome::TooSoon);
    assert!(!work.store().log_path().exists());
}
