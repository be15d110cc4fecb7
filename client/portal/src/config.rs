use bookshelf_common::env_opt;
use serde::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api_base: String,
    pub refresh_interval: Duration,
    pub countdown_tick: Duration,
    pub notice_timeout: Duration,
    pub request_timeout: Duration,
    pub state_path: PathBuf,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000".to_string(),
            refresh_interval: Duration::from_secs(300),
            countdown_tick: Duration::from_millis(1000),
            notice_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            state_path: PathBuf::from("portal-state.json"),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FileConfig {
    pub api_base: Option<String>,
    pub refresh_interval_secs: Option<u64>,
    pub countdown_tick_millis: Option<u64>,
    pub notice_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub state_path: Option<String>,
}

pub fn resolve_config_path() -> PathBuf {
    if let Ok(path) = env::var("PORTAL_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let repo_path = PathBuf::from("client/portal/portal.toml");
    if repo_path.exists() {
        return repo_path;
    }

    PathBuf::from("portal.toml")
}

pub fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str::<FileConfig>(&content)?)
}

/// Loads config from file and env; env wins.
pub fn load_config() -> Result<PortalConfig, ConfigError> {
    let file_config = read_file_config(&resolve_config_path())?;
    build_config(file_config)
}

pub fn build_config(file_config: FileConfig) -> Result<PortalConfig, ConfigError> {
    let defaults = PortalConfig::default();

    let api_base = env::var("API_BASE")
        .ok()
        .or(file_config.api_base)
        .unwrap_or(defaults.api_base);
    if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            field: "api_base",
            reason: format!("expected an http(s) url, got {api_base:?}"),
        });
    }

    let refresh_interval = env_opt::<u64>("REFRESH_INTERVAL_SECS")
        .or(file_config.refresh_interval_secs)
        .map(Duration::from_secs)
        .unwrap_or(defaults.refresh_interval);
    let countdown_tick = env_opt::<u64>("COUNTDOWN_TICK_MILLIS")
        .or(file_config.countdown_tick_millis)
        .map(Duration::from_millis)
        .unwrap_or(defaults.countdown_tick);
    let notice_timeout = env_opt::<u64>("NOTICE_TIMEOUT_SECS")
        .or(file_config.notice_timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(defaults.notice_timeout);
    let request_timeout = env_opt::<u64>("REQUEST_TIMEOUT_SECS")
        .or(file_config.request_timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(defaults.request_timeout);
    let state_path = env::var("STATE_PATH")
        .ok()
        .or(file_config.state_path)
        .map(PathBuf::from)
        .unwrap_or(defaults.state_path);

    for (field, value) in [
        ("refresh_interval_secs", refresh_interval),
        ("countdown_tick_millis", countdown_tick),
    ] {
        if value.is_zero() {
            return Err(ConfigError::InvalidValue {
                field,
                reason: "must be greater than zero".to_string(),
            });
        }
    }

    Ok(PortalConfig {
        api_base,
        refresh_interval,
        countdown_tick,
        notice_timeout,
        request_timeout,
        state_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_apply_over_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
api_base = "https://books.example.org"
refresh_interval_secs = 60
state_path = "/tmp/portal.json"
"#,
        )
        .unwrap();
        let config = build_config(file).unwrap();
        assert_eq!(config.api_base, "https://books.example.org");
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.countdown_tick, Duration::from_secs(1));
        assert_eq!(config.notice_timeout, Duration::from_secs(5));
        assert_eq!(config.state_path, PathBuf::from("/tmp/portal.json"));
    }

    #[test]
    fn rejects_zero_interval_and_bad_url() {
        let file = FileConfig {
            refresh_interval_secs: Some(0),
            ..FileConfig::default()
        };
        assert!(matches!(
            build_config(file),
            Err(ConfigError::InvalidValue {
                field: "refresh_interval_secs",
                ..
            })
        ));

        let file = FileConfig {
            api_base: Some("localhost:3000".to_string()),
            ..FileConfig::default()
        };
        assert!(matches!(
            build_config(file),
            Err(ConfigError::InvalidValue { field: "api_base", .. })
        ));
    }

    #[test]
    fn reads_config_file_and_tolerates_missing_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal.toml");
        std::fs::write(&path, "api_base = \"http://127.0.0.1:3000\"\nnotice_timeout_secs = 3\n").unwrap();
        let loaded = read_file_config(&path).unwrap();
        assert_eq!(loaded.api_base.as_deref(), Some("http://127.0.0.1:3000"));
        assert_eq!(loaded.notice_timeout_secs, Some(3));
        assert_eq!(read_file_config(&dir.path().join("missing.toml")).unwrap().api_base, None);

        std::fs::write(&path, "refresh_interval_secs = \"often\"").unwrap();
        assert!(matches!(read_file_config(&path), Err(ConfigError::Parse(_))));
    }
}
