//! # configs
//!
//! Layered settings for the feed ledger: built-in defaults, then an optional
//! TOML file, then `FEED_LEDGER__*` environment variables (a `.env` file is
//! loaded first). Connection strings are held as [`SecretString`].

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "feed-ledger.toml";
pub const ENV_PREFIX: &str = "FEED_LEDGER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub log: LogSettings,
    pub storage: StorageSettings,
    pub cache: CacheSettings,
    pub events: EventSettings,
    pub chain: ChainSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Default filter directive, used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Filesystem,
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Root for attachment blobs; `temp/` and `permanent/` live below it
    pub root: PathBuf,
    /// SQLite URL for the message store; in-memory store when absent
    #[serde(default, deserialize_with = "optional_secret")]
    pub database_url: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
pub struct CacheSettings {
    pub max_messages_per_feed: usize,
    /// Redis URL; in-process cache when absent
    #[serde(default, deserialize_with = "optional_secret")]
    pub redis_url: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventSettings {
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    pub initial_block_index: u64,
}

fn optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

impl Settings {
    /// Loads settings from `.env`, the config file and the environment.
    ///
    /// Without an explicit `path`, `feed-ledger.toml` is read if present.
    /// An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::build(path, env)
    }

    fn build(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        debug!(file = %file.display(), "Loading configuration");

        let settings: Settings = Config::builder()
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            .set_default("storage.backend", "memory")?
            .set_default("storage.root", "./data")?
            .set_default("cache.max_messages_per_feed", 100_i64)?
            .set_default("events.channel_capacity", 1000_i64)?
            .set_default("chain.initial_block_index", 0_i64)?
            .add_source(File::from(file).required(path.is_some()))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_messages_per_feed == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_messages_per_feed must be at least 1".into(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "events.channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn temporary_attachment_root(&self) -> PathBuf {
        self.storage.root.join("temp")
    }

    pub fn permanent_attachment_root(&self) -> PathBuf {
        self.storage.root.join("permanent")
    }
}
