//! Unit tests for the app lifecycle controller.
//!
//! Every port is mocked; the only real I/O is inside temp directories.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use apphub_cli::application::services::lifecycle::AppController;
use apphub_cli::domain::error::{LifecycleError, ProvisionError};
use apphub_cli::domain::{AppState, ExecError};
use apphub_cli::infra::state::StateManager;

use crate::mocks::{Harness, MockExecutor, TEST_HOST, small_cvat};

// ── Full cycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_cycle_returns_to_uninstalled_with_no_record() {
    let h = Harness::new();
    let mut app = h.controller().await;
    assert_eq!(app.state(), AppState::Uninstalled);

    app.installation(&h.install_location(), "2.11.3")
        .await
        .expect("install");
    assert_eq!(app.state(), AppState::Installed);
    let record = h.store.get("cvat").expect("record saved");
    assert_eq!(record.config.version.as_deref(), Some("2.11.3"));
    assert_eq!(record.config.source_directory, Some(h.source_directory()));
    assert!(record.config.installed_at.is_some());

    app.start().await.expect("start");
    assert_eq!(app.state(), AppState::Running);
    assert!(h.store.get("cvat").expect("record").running);

    app.close().await.expect("close");
    assert_eq!(app.state(), AppState::Installed);
    assert!(!h.store.get("cvat").expect("record").running);

    app.uninstall(false).await.expect("uninstall");
    assert_eq!(app.state(), AppState::Uninstalled);
    assert!(h.store.is_empty());
    assert!(!h.source_directory().exists());
    assert_eq!(app.config().version, None);
    assert_eq!(
        h.notifier.events(),
        vec!["installed:cvat".to_string(), "started:cvat".to_string()]
    );
}

#[tokio::test]
async fn installation_checks_out_tag_then_pulls_in_source_dir() {
    let h = Harness::new();
    let _app = h.installed().await;

    let calls = h.exec.calls();
    assert_eq!(
        calls[0].line,
        "git clone --depth 1 --branch v2.11.3 https://github.com/cvat-ai/cvat cvat"
    );
    assert_eq!(calls[0].cwd.as_deref(), Some(h.install_location().as_path()));
    assert_eq!(calls[1].line, "docker compose pull");
    assert_eq!(calls[1].cwd.as_deref(), Some(h.source_directory().as_path()));
    assert_eq!(calls.len(), 2);
}

// ── Start ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_returns_while_app_process_keeps_running() {
    let h = Harness::new();
    let mut app = h.installed().await;

    let handle = tokio::time::timeout(Duration::from_secs(5), app.start())
        .await
        .expect("start must not wait for the app to exit")
        .expect("start");
    assert!(!handle.is_finished());
    assert_eq!(handle.pid(), Some(4242));
}

#[tokio::test]
async fn start_passes_host_and_log_file_to_daemon() {
    let h = Harness::new();
    let mut app = h.installed().await;
    app.start().await.expect("start");

    let up = h
        .exec
        .calls()
        .into_iter()
        .find(|c| c.line == "docker compose up")
        .expect("compose up");
    assert!(up.daemon);
    assert_eq!(up.cwd.as_deref(), Some(h.source_directory().as_path()));
    assert_eq!(
        up.envs,
        vec![("CVAT_HOST".to_string(), TEST_HOST.to_string())]
    );
    assert_eq!(up.log_file, Some(h.log_dir().join("cvat.log")));
}

#[tokio::test]
async fn start_before_install_is_rejected_without_commands() {
    let h = Harness::new();
    let mut app = h.controller().await;
    let err = app.start().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::InvalidTransition { operation: "start", .. })
    ));
    assert!(h.exec.calls().is_empty());
}

#[tokio::test]
async fn start_restores_missing_image_from_archive_first() {
    let h = Harness::with_executor(MockExecutor::new().with_host_images("redis:7.2\n"));
    std::fs::write(h.images_dir().join("cvat_server.tar.gz"), b"archive").expect("archive");
    let mut app = h.installed().await;

    app.start().await.expect("start");
    let lines = h.exec.lines();
    let load = lines
        .iter()
        .position(|l| l == "docker load < cvat_server.tar.gz")
        .expect("load ran");
    let up = lines
        .iter()
        .position(|l| l == "docker compose up")
        .expect("up ran");
    assert!(load < up);
    assert_eq!(h.exec.count_starting_with("docker load"), 1);
}

#[tokio::test]
async fn start_with_missing_archive_launches_nothing() {
    let h = Harness::with_executor(MockExecutor::new().with_host_images("redis:7.2\n"));
    let mut app = h.installed().await;

    let err = app.start().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::MissingArchive { image, .. }) if image == "cvat/server"
    ));
    assert_eq!(h.exec.count_starting_with("docker compose up"), 0);
    assert_eq!(app.state(), AppState::Installed);
    assert_eq!(h.notifier.events(), vec!["installed:cvat".to_string()]);
}

// ── Installation failures ────────────────────────────────────────────────────

#[tokio::test]
async fn failed_pull_persists_nothing_and_removes_checkout() {
    let h = Harness::with_executor(MockExecutor::new().fail_on("docker compose pull", 18));
    let mut app = h.controller().await;

    let err = app
        .installation(&h.install_location(), "2.11.3")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::CommandFailed { exit_code: 18, .. })
    ));
    assert_eq!(app.state(), AppState::Uninstalled);
    assert!(h.store.is_empty());
    assert!(h.notifier.events().is_empty());
    assert!(!h.source_directory().exists());
}

#[tokio::test]
async fn unknown_version_is_rejected_before_any_command() {
    let h = Harness::new();
    let mut app = h.controller().await;
    let err = app
        .installation(&h.install_location(), "9.9.9")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::UnsupportedVersion { .. })
    ));
    assert!(h.exec.calls().is_empty());
}

#[tokio::test]
async fn existing_checkout_directory_is_not_overwritten() {
    let h = Harness::new();
    std::fs::create_dir_all(h.source_directory()).expect("dir");
    std::fs::write(h.source_directory().join("keep.txt"), "mine").expect("file");
    let mut app = h.controller().await;

    let err = app
        .installation(&h.install_location(), "2.11.3")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::SourceDirectoryExists(_))
    ));
    assert!(h.source_directory().join("keep.txt").exists());
}

#[tokio::test]
async fn leftover_checkout_can_be_discarded_then_installed() {
    let h = Harness::new();
    std::fs::create_dir_all(h.source_directory()).expect("dir");
    std::fs::write(h.source_directory().join("HEAD"), "partial").expect("file");
    let mut app = h.controller().await;

    assert!(app.discard_partial_checkout(&h.install_location()).expect("discard"));
    assert!(!h.source_directory().exists());
    assert!(!app.discard_partial_checkout(&h.install_location()).expect("nothing left"));

    app.installation(&h.install_location(), "2.11.3")
        .await
        .expect("install");
    assert_eq!(app.state(), AppState::Installed);
}

#[tokio::test]
async fn installed_checkout_is_never_discarded() {
    let h = Harness::new();
    let app = h.installed().await;
    let err = app
        .discard_partial_checkout(&h.install_location())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::InvalidTransition { operation: "install", .. })
    ));
    assert!(h.source_directory().exists());
}

#[tokio::test]
async fn second_installation_is_an_invalid_transition() {
    let h = Harness::new();
    let mut app = h.installed().await;
    let err = app
        .installation(&h.install_location(), "2.11.3")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::InvalidTransition {
            state: AppState::Installed,
            ..
        })
    ));
}

// ── Close ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_stop_still_records_installed() {
    let h = Harness::with_executor(
        MockExecutor::new()
            .with_host_images("cvat/server:v2.11.3\nredis:7.2\n")
            .fail_on("docker compose down", 1),
    );
    let mut app = h.installed().await;
    app.start().await.expect("start");

    assert!(app.close().await.is_err());
    assert_eq!(app.state(), AppState::Installed);
    assert!(!h.store.get("cvat").expect("record").running);
}

#[tokio::test]
async fn close_when_not_running_is_rejected() {
    let h = Harness::new();
    let mut app = h.installed().await;
    let err = app.close().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::InvalidTransition { operation: "stop", .. })
    ));
    assert_eq!(h.exec.count_starting_with("docker compose down"), 0);
}

// ── Uninstall ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn uninstall_keeps_going_after_first_image_removal_fails() {
    let h = Harness::with_executor(
        MockExecutor::new()
            .with_host_images("cvat/server:v2.11.3\nredis:7.2\n")
            .fail_on("docker rmi cvat/server", 1),
    );
    let mut app = h.installed().await;

    app.uninstall(false).await.expect("uninstall");
    assert_eq!(h.exec.count_starting_with("docker rmi"), 2);
    assert!(h.exec.lines().contains(&"docker rmi redis".to_string()));
    assert_eq!(h.sink.warnings().len(), 1);
    assert_eq!(app.state(), AppState::Uninstalled);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn running_app_uninstall_needs_force() {
    let h = Harness::new();
    let mut app = h.installed().await;
    app.start().await.expect("start");

    let err = app.uninstall(false).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::AppRunning(key)) if key == "cvat"
    ));
    assert_eq!(app.state(), AppState::Running);
    assert_eq!(h.exec.count_starting_with("docker rmi"), 0);

    app.uninstall(true).await.expect("forced uninstall");
    assert_eq!(h.exec.count_starting_with("docker compose down"), 1);
    assert_eq!(app.state(), AppState::Uninstalled);
}

#[tokio::test]
async fn forced_uninstall_continues_when_stop_fails() {
    let h = Harness::with_executor(
        MockExecutor::new()
            .with_host_images("cvat/server:v2.11.3\nredis:7.2\n")
            .fail_on("docker compose down", 1),
    );
    let mut app = h.installed().await;
    app.start().await.expect("start");

    app.uninstall(true).await.expect("forced uninstall");
    assert_eq!(h.exec.count_starting_with("docker compose down"), 1);
    let lines = h.exec.lines();
    assert!(lines.contains(&"docker rmi cvat/server".to_string()));
    assert!(lines.contains(&"docker rmi redis".to_string()));
    let warnings = h.sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("stop failed, continuing uninstall"));
    assert!(!h.source_directory().exists());
    assert_eq!(app.state(), AppState::Uninstalled);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn uninstall_before_install_is_rejected() {
    let h = Harness::new();
    let mut app = h.controller().await;
    assert!(app.uninstall(true).await.is_err());
    assert!(h.exec.calls().is_empty());
}

// ── Persistence ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn state_survives_a_new_controller_over_the_same_store() {
    let h = Harness::new();
    let state_dir = h.root.path().join("state");
    let store = StateManager::new(state_dir.clone());
    let ports = || apphub_cli::application::services::lifecycle::LifecyclePorts {
        executor: &h.exec,
        store: &store,
        notifier: &h.notifier,
        sink: &h.sink,
    };

    let mut first = AppController::load(small_cvat(), h.settings(), ports())
        .await
        .expect("load");
    first
        .installation(&h.install_location(), "2.11.3")
        .await
        .expect("install");
    first.start().await.expect("start");
    drop(first);

    let mut settings = h.settings();
    settings.docker_image_directory = h.root.path().join("moved-images");
    let second = AppController::load(small_cvat(), settings, ports())
        .await
        .expect("reload");
    assert_eq!(second.state(), AppState::Running);
    assert_eq!(second.config().version.as_deref(), Some("2.11.3"));
    assert_eq!(
        second.config().docker_image_directory,
        h.root.path().join("moved-images")
    );
    assert!(state_dir.join("cvat.json").exists());
}
