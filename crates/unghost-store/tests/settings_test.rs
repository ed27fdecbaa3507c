use std::fs;

use unghost_store::{SettingsStore, SETTINGS_KEY};
use unghost_types::{ReportStyle, Settings};

#[test]
fn test_fresh_directory_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::open(dir.path());

    assert_eq!(store.settings(), &Settings::default());
    assert!(!store.path().exists());
}

#[test]
fn test_setters_persist_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SettingsStore::open(dir.path());

    store.set_report_style(ReportStyle::Conservative).unwrap();
    store.set_user_background("Founder of a fintech startup").unwrap();

    let reopened = SettingsStore::open(dir.path());
    assert_eq!(reopened.settings().general.report_style, ReportStyle::Conservative);
    assert_eq!(
        reopened.settings().general.user_background,
        "Founder of a fintech startup"
    );
}

#[test]
fn test_partial_file_is_merged_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.json", SETTINGS_KEY));
    fs::write(&path, r#"{"general": {"max_step_num": 5}}"#).unwrap();

    let store = SettingsStore::open(dir.path());
    assert_eq!(store.settings().general.max_step_num, 5);
    assert_eq!(store.settings().general.max_search_results, 3);
    assert_eq!(store.settings().general.report_style, ReportStyle::Friendly);
}

#[test]
fn test_corrupt_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.json", SETTINGS_KEY));
    fs::write(&path, "{ not json").unwrap();

    let store = SettingsStore::open(dir.path());
    assert_eq!(store.settings(), &Settings::default());
}

#[test]
fn test_change_is_in_memory_until_saved() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SettingsStore::open(dir.path());

    let mut settings = store.settings().clone();
    settings.general.auto_accepted_plan = true;
    store.change(settings);
    assert!(store.settings().general.auto_accepted_plan);
    assert!(!SettingsStore::open(dir.path()).settings().general.auto_accepted_plan);

    store.save().unwrap();
    assert!(SettingsStore::open(dir.path()).settings().general.auto_accepted_plan);
}
