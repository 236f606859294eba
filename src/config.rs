use std::{path::PathBuf, sync::OnceLock};

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ConfigError;

pub type SharedConfig = RwLock<Config>;

// this will be initialized by the app itself
pub static CONFIG: OnceLock<SharedConfig> = OnceLock::new();

/// Currency used for price entries when the config was never initialized
/// (library used standalone, e.g. in tests).
pub const FALLBACK_CURRENCY: &str = "HUF";

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Path to the app's data directory.
    pub data_dir: PathBuf,

    /// Currency code stamped on price entries that don't specify one.
    pub default_currency: String,
}

impl Config {
    pub fn new(data_dir: PathBuf, default_currency: String) -> Self {
        Self {
            data_dir,
            default_currency,
        }
    }

    /// Attempts to read a previous `Config` from disk.
    ///
    /// Note that this may fail across versions, requiring new configs.
    pub async fn from_disk(data_dir: PathBuf) -> Result<Self, ConfigError> {
        // read the config from disk
        let s = tokio::fs::read_to_string(data_dir.join("config.toml"))
            .await
            .map_err(ConfigError::ReadFailed)?;

        // parse with `toml` crate
        let s: Self = toml::from_str(s.as_str()).map_err(ConfigError::ParseFailed)?;

        // ensure paths are equal
        if s.data_dir != data_dir {
            tracing::error!(
                "loaded config from disk, but it points at `{}` instead of `{}`.",
                s.data_dir.display(),
                data_dir.display()
            );
            return Err(ConfigError::PathMismatch);
        }

        Ok(s)
    }

    /// Use this EXACTLY ONCE to initialize the config.
    ///
    /// The app should be the only one calling this.
    pub async fn init_config(data_dir: PathBuf, default_currency: String) {
        if CONFIG.get().is_none() {
            let conf = RwLock::new(Config {
                data_dir,
                default_currency,
            });

            CONFIG
                .set(conf)
                .expect("the config should not be configured yet");
        } else {
            tracing::error!("attempted to init the config, but the config is already running.")
        }
    }

    /// Grabs the config for reading.
    ///
    /// Note that while you're reading the config, others cannot write to it.
    /// DO NOT HOLD ONTO IT FOR A LONG TIME.
    pub async fn read() -> RwLockReadGuard<'static, Config> {
        CONFIG
            .get()
            .expect("should have initialized already")
            .read()
            .await
    }

    pub async fn write() -> RwLockWriteGuard<'static, Config> {
        CONFIG
            .get()
            .expect("should have initialized already")
            .write()
            .await
    }

    /// The currency for new price entries.
    ///
    /// Falls back to [`FALLBACK_CURRENCY`] when no config was initialized,
    /// so the library stays usable without app bootstrapping.
    pub async fn default_currency() -> String {
        match CONFIG.get() {
            Some(shared) => shared.read().await.default_currency.clone(),
            None => FALLBACK_CURRENCY.to_string(),
        }
    }
}
