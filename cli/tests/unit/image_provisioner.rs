//! Unit tests for restoring missing images from archives.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use apphub_cli::application::services::image_provisioner::{self, LIST_IMAGES};
use apphub_cli::domain::error::ProvisionError;

use crate::mocks::{MockExecutor, RecordingSink};

fn required(images: &[&str]) -> Vec<String> {
    images.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn only_absent_image_is_loaded() {
    let exec = MockExecutor::new().with_host_images("alpha/app:1.0\n");
    let sink = RecordingSink::default();
    let archives = tempfile::tempdir().expect("tempdir");
    std::fs::write(archives.path().join("beta_db.tar.gz"), b"tar").expect("archive");

    let report = image_provisioner::ensure_present(
        &exec,
        &sink,
        &required(&["alpha/app", "beta/db"]),
        archives.path(),
        None,
    )
    .await
    .expect("provision");

    assert_eq!(report.present, vec!["alpha/app".to_string()]);
    assert_eq!(report.loaded, vec!["beta/db".to_string()]);
    let calls = exec.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].line, LIST_IMAGES);
    assert!(calls[0].silent);
    assert_eq!(calls[1].line, "docker load < beta_db.tar.gz");
    assert_eq!(calls[1].cwd.as_deref(), Some(archives.path()));
}

#[tokio::test]
async fn missing_archive_is_fatal_before_any_load() {
    let exec = MockExecutor::new().with_host_images("");
    let sink = RecordingSink::default();
    let archives = tempfile::tempdir().expect("tempdir");
    std::fs::write(archives.path().join("alpha_app.tar.gz"), b"tar").expect("archive");

    let err = image_provisioner::ensure_present(
        &exec,
        &sink,
        &required(&["alpha/app", "beta/db"]),
        archives.path(),
        None,
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::MissingArchive { image, archive }) => {
            assert_eq!(image, "beta/db");
            assert_eq!(archive, &archives.path().join("beta_db.tar.gz"));
        }
        other => panic!("expected MissingArchive, got {other:?}"),
    }
    assert_eq!(exec.count_starting_with("docker load"), 0);
}

#[tokio::test]
async fn nothing_to_do_when_all_present() {
    let exec = MockExecutor::new().with_host_images("redis:7.2\npostgres:15-alpine\n");
    let sink = RecordingSink::default();
    let archives = tempfile::tempdir().expect("tempdir");

    let report = image_provisioner::ensure_present(
        &exec,
        &sink,
        &required(&["redis", "postgres"]),
        archives.path(),
        None,
    )
    .await
    .expect("provision");

    assert!(report.loaded.is_empty());
    assert_eq!(exec.calls().len(), 1);
}

#[tokio::test]
async fn tagged_requirement_needs_exact_tag() {
    let exec = MockExecutor::new().with_host_images("redis:6\n");
    let sink = RecordingSink::default();
    let archives = tempfile::tempdir().expect("tempdir");
    std::fs::write(archives.path().join("redis:7.tar.gz"), b"tar").expect("archive");

    let report = image_provisioner::ensure_present(
        &exec,
        &sink,
        &required(&["redis:7"]),
        archives.path(),
        None,
    )
    .await
    .expect("provision");

    assert_eq!(report.loaded, vec!["redis:7".to_string()]);
}

#[tokio::test]
async fn failed_load_propagates_executor_error() {
    let exec = MockExecutor::new()
        .with_host_images("")
        .fail_on("docker load", 1);
    let sink = RecordingSink::default();
    let archives = tempfile::tempdir().expect("tempdir");
    std::fs::write(archives.path().join("redis.tar.gz"), b"tar").expect("archive");

    let err = image_provisioner::ensure_present(
        &exec,
        &sink,
        &required(&["redis"]),
        archives.path(),
        None,
    )
    .await
    .unwrap_err();
    assert!(format!("{err:#}").contains("loading image redis"));
}
