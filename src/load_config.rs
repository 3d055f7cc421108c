//! `load_config` module: loads the optional YAML config file and merges it with
//! command-line flags and environment secrets into a [`RunConfig`].
//!
//! # Responsibilities
//! - Parse the user-supplied YAML file into [`FileConfig`] (every key optional)
//! - Apply command-line overrides field by field
//! - Read the credential from `--token` or `GITLAB_TOKEN`; it is never read from the file
//! - Decide the target scope: project, else groups, else all visible projects
//!
//! # Errors
//! All errors use `anyhow::Error` and surface at the CLI boundary. These are the
//! only fatal errors of a run.
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{default_since, RunConfig};
use crate::model::{Target, TargetScope, GITLAB_DEFAULT_URL};

pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub project: Option<String>,
    pub groups: Vec<String>,
    pub since: Option<String>,
    pub output_dir: Option<PathBuf>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str::<Option<FileConfig>>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_since(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("Invalid since date {raw:?}, expected YYYY-MM-DD or RFC 3339: {e}"))
}

/// Merges file values, overrides and the environment into a [`RunConfig`].
pub fn build_run_config(
    file: FileConfig,
    overrides: Overrides,
    now: DateTime<Utc>,
) -> Result<RunConfig> {
    let token = match overrides.token.or_else(|| std::env::var(TOKEN_ENV).ok()) {
        Some(token) if !token.trim().is_empty() => token,
        _ => {
            error!(env = TOKEN_ENV, "No GitLab token given");
            anyhow::bail!("A GitLab token is required: pass --token or set {TOKEN_ENV}");
        }
    };

    let url = overrides
        .url
        .or(file.url)
        .unwrap_or_else(|| GITLAB_DEFAULT_URL.to_string());
    let project = overrides.project.or(file.project);
    let groups = if overrides.groups.is_empty() {
        file.groups
    } else {
        overrides.groups
    };
    let groups: Vec<String> = groups
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect();

    let scope = match project {
        Some(project) => {
            if !groups.is_empty() {
                warn!(project = %project, "Both project and groups given; counting the project only");
            }
            TargetScope::Project(project)
        }
        None if !groups.is_empty() => TargetScope::Groups(groups),
        None => TargetScope::AllVisible,
    };

    let since = match overrides.since.or(file.since) {
        Some(raw) => parse_since(&raw)?,
        None => default_since(now),
    };

    let output_dir = overrides
        .output_dir
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(RunConfig {
        target: Target::new(url, token, scope),
        since,
        output_dir,
    })
}
