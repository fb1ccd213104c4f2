use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use client_core::{RefreshPolicy, DEFAULT_TABLE};
use serde::Deserialize;
use thiserror::Error;

pub const MEMORY_STORE: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_url: String,
    pub api_key: Option<String>,
    pub table: String,
    pub refresh_policy: RefreshPolicy,
    pub request_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: MEMORY_STORE.into(),
            api_key: None,
            table: DEFAULT_TABLE.into(),
            refresh_policy: RefreshPolicy::default(),
            request_timeout: None,
        }
    }
}

impl Settings {
    pub fn uses_memory_store(&self) -> bool {
        self.store_url.trim().eq_ignore_ascii_case(MEMORY_STORE)
    }

    /// Notice for settings whose records will not outlive the process.
    pub fn persistence_warning(&self) -> Option<&'static str> {
        self.uses_memory_store().then_some(
            "in-memory store selected; records are discarded on exit (set store_url or RECORDS_STORE_URL)",
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    store_url: Option<String>,
    api_key: Option<String>,
    table: Option<String>,
    refresh_policy: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Defaults, then `path` if it exists, then the process environment.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    resolve_settings(raw.as_deref(), path, |key| std::env::var(key).ok())
}

pub fn resolve_settings(
    file: Option<&str>,
    origin: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| SettingsError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if let Some(v) = file_cfg.store_url {
            settings.store_url = v;
        }
        if let Some(v) = file_cfg.api_key {
            settings.api_key = Some(v);
        }
        if let Some(v) = file_cfg.table {
            settings.table = v;
        }
        if let Some(v) = file_cfg.refresh_policy {
            settings.refresh_policy = parse_policy("refresh_policy", &v)?;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout = Some(Duration::from_secs(v));
        }
    }

    if let Some(v) = env("RECORDS_STORE_URL") {
        settings.store_url = v;
    }
    if let Some(v) = env("APP__STORE_URL") {
        settings.store_url = v;
    }

    if let Some(v) = env("RECORDS_API_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = env("APP__API_KEY") {
        settings.api_key = Some(v);
    }

    if let Some(v) = env("APP__TABLE") {
        settings.table = v;
    }

    if let Some(v) = env("APP__REFRESH_POLICY") {
        settings.refresh_policy = parse_policy("APP__REFRESH_POLICY", &v)?;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        let secs = v
            .trim()
            .parse::<u64>()
            .map_err(|err| SettingsError::InvalidValue {
                key: "APP__REQUEST_TIMEOUT_SECS",
                reason: err.to_string(),
            })?;
        settings.request_timeout = Some(Duration::from_secs(secs));
    }

    Ok(settings)
}

fn parse_policy(key: &'static str, value: &str) -> Result<RefreshPolicy, SettingsError> {
    value
        .parse()
        .map_err(|reason| SettingsError::InvalidValue { key, reason })
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
