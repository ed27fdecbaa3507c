use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use unghost_types::{ReportStyle, Settings};

use crate::error::SettingsError;

/// Key the settings are stored under.
pub const SETTINGS_KEY: &str = "unghost-agent.settings";

/// File-backed user settings.
///
/// Settings live as one JSON document named after [`SETTINGS_KEY`] inside the
/// settings directory. Missing members are filled from the defaults on load.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Open the store in `dir` and load whatever was saved there.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(format!("{}.json", SETTINGS_KEY));
        let mut store = Self {
            path,
            settings: Settings::default(),
        };
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reload from disk. A missing file keeps the current settings; a corrupt
    /// one is logged and ignored.
    pub fn load(&mut self) {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to read settings");
                return;
            }
        };

        match merge_with_defaults(&json) {
            Ok(settings) => self.settings = settings,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to parse settings");
            }
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    /// Replace the settings in memory without saving.
    pub fn change(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn set_report_style(&mut self, style: ReportStyle) -> Result<(), SettingsError> {
        self.settings.general.report_style = style;
        self.save()
    }

    pub fn set_user_background(&mut self, background: impl Into<String>) -> Result<(), SettingsError> {
        self.settings.general.user_background = background.into();
        self.save()
    }
}

/// Overlay saved settings on the defaults, member by member for `general`.
fn merge_with_defaults(json: &str) -> Result<Settings, serde_json::Error> {
    let saved: Value = serde_json::from_str(json)?;
    let mut merged = serde_json::to_value(Settings::default())?;

    if let (Some(merged_general), Some(saved_general)) = (
        merged.get_mut("general").and_then(Value::as_object_mut),
        saved.get("general").and_then(Value::as_object),
    ) {
        for (key, value) in saved_general {
            merged_general.insert(key.clone(), value.clone());
        }
    }
    if let Some(mcp) = saved.get("mcp").filter(|mcp| !mcp.is_null()) {
        merged["mcp"] = mcp.clone();
    }

    serde_json::from_value(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_general_members_take_defaults() {
        let settings = merge_with_defaults(r#"{"general": {"report_style": "aggressive"}}"#).unwrap();
        assert_eq!(settings.general.report_style, ReportStyle::Aggressive);
        assert_eq!(settings.general.max_step_num, 3);
        assert!(settings.mcp.servers.is_empty());
    }

    #[test]
    fn test_empty_document_is_all_defaults() {
        let settings = merge_with_defaults("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_wrong_member_type_is_an_error() {
        assert!(merge_with_defaults(r#"{"general": {"max_step_num": "many"}}"#).is_err());
    }
}
