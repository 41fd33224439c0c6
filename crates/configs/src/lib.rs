//! # configs
//!
//! Layered settings: built-in defaults, then an optional TOML file, then
//! `RJ__SECTION__KEY` environment variables (a `.env` file is loaded first).

use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const MAX_RETRIES_CAP: u32 = 5;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

const DEFAULTS: &str = r#"
[database]
url = "sqlite:rusty_journal.db"
max_connections = 5

[drafts]
dir = "./data/drafts"
max_age_days = 7
quota_bytes = 5242880

[retry]
max_retries = 2
base_delay_ms = 1000

[calendar]

[cleanup]
timeout_secs = 10

[log]
level = "info"
json = false

[profile]
name = "default"
"#;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub drafts: DraftConfig,
    pub retry: RetryConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    pub log: LogConfig,
    pub profile: ProfileConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DraftConfig {
    pub dir: PathBuf,
    pub max_age_days: i64,
    /// Largest serialized draft accepted
    pub quota_bytes: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CalendarConfig {
    /// Fixed offset for "same day" decisions. Unset means host local time.
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    pub name: String,
}

impl AppConfig {
    /// Loads `.env`, then defaults, `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), ".env loaded");
        }
        Self::from_sources(path, Environment::with_prefix("RJ").prefix_separator("__").separator("__"))
    }

    fn from_sources(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::from_str(DEFAULTS, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let settings = builder.add_source(env.try_parsing(true)).build()?;

        let cfg: AppConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".into()));
        }
        if self.retry.max_retries > MAX_RETRIES_CAP {
            return Err(ConfigError::Invalid(format!(
                "retry.max_retries must be at most {MAX_RETRIES_CAP}"
            )));
        }
        if self.drafts.max_age_days < 1 {
            return Err(ConfigError::Invalid("drafts.max_age_days must be positive".into()));
        }
        if let Some(offset) = self.calendar.utc_offset_minutes {
            if offset.abs() > MAX_OFFSET_MINUTES {
                return Err(ConfigError::Invalid(
                    "calendar.utc_offset_minutes must be within +/-14h".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("RJ")
            .prefix_separator("__")
            .separator("__")
            .source(Some(source))
    }

    #[test]
    fn defaults_are_complete() {
        let cfg = AppConfig::from_sources(None, env(&[])).unwrap();
        assert_eq!(cfg.retry.max_retries, 2);
        assert_eq!(cfg.retry.base_delay_ms, 1000);
        assert_eq!(cfg.drafts.max_age_days, 7);
        assert_eq!(cfg.calendar.utc_offset_minutes, None);
        assert!(cfg.cleanup.endpoint.is_none());
        assert_eq!(cfg.profile.name, "default");
    }

    #[test]
    fn file_then_environment_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[database]\nurl = \"sqlite:file.db\"\nmax_connections = 2").unwrap();
        writeln!(file, "[cleanup]\nendpoint = \"http://localhost:3000/api/cleanup\"\ntimeout_secs = 3").unwrap();

        let cfg = AppConfig::from_sources(
            Some(file.path()),
            env(&[("RJ__DATABASE__URL", "sqlite::memory:"), ("RJ__CLEANUP__API_KEY", "sk-live")]),
        )
        .unwrap();
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.database.max_connections, 2);
        assert_eq!(cfg.cleanup.timeout_secs, 3);
        assert_eq!(
            cfg.cleanup.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-live".to_string())
        );
        assert!(!format!("{:?}", cfg.cleanup).contains("sk-live"));
    }

    #[test]
    fn too_many_retries_is_rejected() {
        let err = AppConfig::from_sources(None, env(&[("RJ__RETRY__MAX_RETRIES", "9")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let err = AppConfig::from_sources(None, env(&[("RJ__CALENDAR__UTC_OFFSET_MINUTES", "900")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
