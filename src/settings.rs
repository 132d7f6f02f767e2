use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime knobs. Defaults, then `cf_problems.toml` if present, then `CFP_*`
/// environment variables (e.g. `CFP_CONCURRENCY=8`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub concurrency: usize,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub db_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into(),
            concurrency: 4,
            max_retries: 3,
            backoff_ms: 1000,
            db_path: PathBuf::from("data/problems.sqlite"),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("cf_problems").required(false))
            .add_source(Environment::with_prefix("CFP").try_parsing(true))
            .build()?;
        Settings::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Settings, ConfigError> {
        let mut settings: Settings = config.try_deserialize()?;
        settings.concurrency = settings.concurrency.max(1);
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

// ── Tests ──
