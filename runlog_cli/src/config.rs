use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Settings file (JSON). Every field may also come from flags or env.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub store_path: PathBuf,
    pub authorized_user_id: Option<i64>,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("runs.csv"),
            authorized_user_id: None,
            chart_width: 1280,
            chart_height: 720,
        }
    }
}

/// Values given on the command line (or through their env fallbacks).
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub store_path: Option<PathBuf>,
    pub authorized_user_id: Option<i64>,
}

impl Settings {
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(store) = overrides.store_path.as_ref() {
            settings.store_path = store.clone();
        }
        if overrides.authorized_user_id.is_some() {
            settings.authorized_user_id = overrides.authorized_user_id;
        }
        if settings.chart_width == 0 || settings.chart_height == 0 {
            return Err(anyhow!("chart dimensions must be > 0"));
        }
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid runlog config", path.display()))
    }

    pub fn require_user_id(&self) -> Result<i64> {
        self.authorized_user_id.ok_or_else(|| {
            anyhow!("no authorized user id: pass --user-id, set RUNLOG_USER_ID or add authorized_user_id to the config")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runlog.json");
        fs::write(
            &path,
            r#"{"store_path": "data/runs.csv", "authorized_user_id": 7, "chart_width": 800}"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(settings.store_path, PathBuf::from("data/runs.csv"));
        assert_eq!(settings.authorized_user_id, Some(7));
        assert_eq!((settings.chart_width, settings.chart_height), (800, 720));

        let overrides = Overrides {
            store_path: Some(PathBuf::from("other.csv")),
            authorized_user_id: Some(9),
        };
        let settings = Settings::load(Some(&path), &overrides).unwrap();
        assert_eq!(settings.store_path, PathBuf::from("other.csv"));
        assert_eq!(settings.require_user_id().unwrap(), 9);
    }

    #[test]
    fn missing_user_id_is_an_error() {
        let settings = Settings::load(None, &Overrides::default()).unwrap();
        assert!(settings.require_user_id().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runlog.json");
        fs::write(&path, r#"{"sheet_name": "PaceDataBot"}"#).unwrap();
        assert!(Settings::load(Some(&path), &Overrides::default()).is_err());
    }
}
