//! Settings resolution against real files, and the JSON shape of results.

use std::path::PathBuf;

use assert_fs::prelude::*;
use predicates::prelude::*;
use tracker_core::{
    ConfigError, PublishOutcome, PublishResult, PublishStep, RawSettings, StepReport, StepStatus,
    TrackerSettings,
};

fn raw(files: String) -> RawSettings {
    RawSettings {
        files,
        user: "alice".to_string(),
        branch: "main".to_string(),
        ..RawSettings::default()
    }
}

#[test]
fn watch_list_file_resolves_to_targets() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let bashrc = home.child(".bashrc");
    bashrc.write_str("alias ll='ls -l'\n").expect("write bashrc");
    let config_dir = home.child(".config");
    config_dir.create_dir_all().expect("mkdir");
    let list = home.child("watch.list");
    list.write_str(&format!(
        "{}\n{}\n",
        bashrc.path().display(),
        config_dir.path().display()
    ))
    .expect("write list");

    let settings =
        TrackerSettings::resolve(raw(list.path().display().to_string())).expect("resolve");
    assert_eq!(settings.targets.len(), 2);
    assert_eq!(settings.targets[0].path, bashrc.path());
    assert!(!settings.targets[0].recursive);
    assert_eq!(settings.targets[1].path, config_dir.path());
    assert!(settings.targets[1].recursive);

    list.assert(predicate::str::contains(".bashrc"));
}

#[test]
fn explicit_lock_and_repo_paths_are_kept() {
    let mut settings = raw("/home/alice/.bashrc".to_string());
    settings.repo_path = Some(PathBuf::from("/srv/alice/dots.git"));
    settings.lock_path = Some(PathBuf::from("/run/user/1000/tracker.pid"));

    let resolved = TrackerSettings::resolve(settings).expect("resolve");
    assert_eq!(resolved.repository.repo_path, PathBuf::from("/srv/alice/dots.git"));
    assert_eq!(resolved.lock_path, PathBuf::from("/run/user/1000/tracker.pid"));
}

#[test]
fn missing_username_message_names_the_field() {
    let mut settings = raw("/home/alice/.bashrc".to_string());
    settings.user.clear();
    let err = TrackerSettings::resolve(settings).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { .. }));
    assert!(err.to_string().contains("username"), "got: {err}");
}

#[test]
fn publish_result_serializes_with_step_statuses() {
    let result = PublishResult::from_steps(
        "/home/alice/.bashrc",
        vec![
            StepReport {
                step: PublishStep::Stage,
                status: StepStatus::Succeeded,
            },
            StepReport {
                step: PublishStep::Commit,
                status: StepStatus::Succeeded,
            },
            StepReport {
                step: PublishStep::Push,
                status: StepStatus::Failed { code: Some(128) },
            },
        ],
    );
    assert_eq!(result.outcome, PublishOutcome::PushFailed);

    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["outcome"], "push_failed");
    assert_eq!(json["steps"][0]["step"], "stage");
    assert_eq!(json["steps"][0]["status"], "succeeded");
    assert_eq!(json["steps"][2]["status"], "failed");
    assert_eq!(json["steps"][2]["code"], 128);
}
