use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

use crate::fetch::{DEFAULT_BRANCH, DEFAULT_LICENSE_FILE};
use crate::license::COPYLEFT_MARKER;

/// Section of pyproject.toml holding the configuration.
pub const CONFIG_SECTION: &str = "py-license-collector";

pub const DEFAULT_PYTHON: &str = "python3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Site-packages directory or virtualenv to inspect
    pub site_packages: Option<PathBuf>,

    /// Interpreter used to locate site-packages and to run pip
    pub python: Option<String>,

    /// Branch used when guessing license locations
    pub branch: Option<String>,

    /// License file fetched when guessing
    pub license_file: Option<String>,

    /// Substring marking a copyleft license
    pub copyleft_marker: Option<String>,

    /// Archive full sources of copyleft packages
    pub archive_sources: Option<bool>,

    /// Summary format (table, json)
    pub format: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_packages: None,
            python: Some(DEFAULT_PYTHON.to_string()),
            branch: Some(DEFAULT_BRANCH.to_string()),
            license_file: Some(DEFAULT_LICENSE_FILE.to_string()),
            copyleft_marker: Some(COPYLEFT_MARKER.to_string()),
            archive_sources: Some(true),
            format: Some("table".to_string()),
        }
    }
}

impl Config {
    pub fn python(&self) -> &str {
        self.python.as_deref().unwrap_or(DEFAULT_PYTHON)
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn license_file(&self) -> &str {
        self.license_file.as_deref().unwrap_or(DEFAULT_LICENSE_FILE)
    }

    pub fn copyleft_marker(&self) -> &str {
        self.copyleft_marker.as_deref().unwrap_or(COPYLEFT_MARKER)
    }

    pub fn archive_sources(&self) -> bool {
        self.archive_sources.unwrap_or(true)
    }
}

/// Load configuration from pyproject.toml in the current directory
pub fn load_config() -> Result<Config> {
    let pyproject_path = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("pyproject.toml");

    load_config_from(&pyproject_path)
}

pub fn load_config_from(pyproject_path: &Path) -> Result<Config> {
    if !pyproject_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(pyproject_path)
        .with_context(|| format!("Failed to read pyproject.toml: {}", pyproject_path.display()))?;

    let pyproject: toml::Value = toml::from_str(&content)
        .with_context(|| format!("Failed to parse pyproject.toml: {}", pyproject_path.display()))?;

    // Extract [tool.py-license-collector] section
    if let Some(section) = pyproject.get("tool").and_then(|tool| tool.get(CONFIG_SECTION)) {
        let config: Config = section
            .clone()
            .try_into()
            .with_context(|| format!("Failed to parse [tool.{}] section", CONFIG_SECTION))?;
        return Ok(config);
    }

    Ok(Config::default())
}
