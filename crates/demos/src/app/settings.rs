use std::fs;
use std::path::{Path, PathBuf};

use gametools::{Color, GravityConfig, WindowSettings};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const SETTINGS_ENV_VAR: &str = "GAMETOOLS_SETTINGS";

/// Optional window settings read from a JSON file. Absent fields keep what the
/// demo chose in its `window` hook.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SettingsOverrides {
    pub(crate) title: Option<String>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) target_tps: Option<u32>,
    pub(crate) background: Option<Color>,
    pub(crate) gravity: Option<GravityConfig>,
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse settings '{path}' at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SettingsOverrides {
    pub(crate) fn apply(&self, settings: &mut WindowSettings) {
        if let Some(title) = &self.title {
            settings.title = title.clone();
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(target_tps) = self.target_tps {
            settings.target_tps = target_tps;
        }
        if let Some(background) = self.background {
            settings.background = background;
        }
        if let Some(gravity) = self.gravity {
            settings.gravity = gravity;
        }
    }
}

pub(crate) fn load_overrides_from_env() -> Result<Option<SettingsOverrides>, SettingsError> {
    match std::env::var_os(SETTINGS_ENV_VAR) {
        Some(path) if !path.is_empty() => load_overrides(Path::new(&path)).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn load_overrides(path: &Path) -> Result<SettingsOverrides, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_overrides(&raw, path)
}

fn parse_overrides(raw: &str, path: &Path) -> Result<SettingsOverrides, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        SettingsError::Parse {
            path: path.to_path_buf(),
            field: if field.is_empty() { ".".to_string() } else { field },
            source: error.into_inner(),
        }
    })
}
