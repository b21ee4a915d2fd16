//! Settings file.
//!
//! An optional TOML file supplies defaults for the command line:
//!
//! ```toml
//! [target]
//! user = "postgres"
//! config_file = "/etc/postgresql/16/main/postgresql.conf"
//!
//! [run]
//! level = 1
//! exclude = ["3.2"]
//! max_concurrency = 4
//! ```
//!
//! Every key is optional. Command line values take precedence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::checks::TargetSettings;
use crate::AuditError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub target: TargetOverrides,
    #[serde(default)]
    pub run: RunSettings,
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, AuditError> {
        let data = fs::read_to_string(path)
            .map_err(|e| AuditError::io(format!("settings file {}", path.display()), e))?;
        Self::parse(&data)
            .map_err(|e| AuditError::Settings(format!("{}: {}", path.display(), e)))
    }

    /// Load the settings file if one was given, else built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AuditError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Settings::default()),
        }
    }

    pub fn parse(data: &str) -> Result<Self, AuditError> {
        toml::from_str(data).map_err(|e| AuditError::Settings(e.to_string()))
    }
}

/// `[target]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetOverrides {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl TargetOverrides {
    pub fn apply(&self, target: &mut TargetSettings) {
        if let Some(ref user) = self.user {
            target.user = user.clone();
        }
        if let Some(ref name) = self.process_name {
            target.process_name = name.clone();
        }
        if let Some(ref path) = self.config_file {
            target.config_file = path.clone();
        }
        if let Some(ref path) = self.data_dir {
            target.data_dir = path.clone();
        }
    }
}

/// `[run]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    #[serde(default)]
    pub level: Option<u8>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    #[serde(default)]
    pub progress: Option<bool>,
    #[serde(default)]
    pub nice: Option<bool>,
    #[serde(default)]
    pub color: Option<bool>,
}
