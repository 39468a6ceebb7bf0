//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use rewear_auth::AuthConfig;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the shared storage database
    pub database_path: PathBuf,
    /// Where tabs open by default
    pub landing_url: String,
    /// Auth timings and password rules
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("rewear.db"),
            landing_url: "http://localhost:8000/index.html".to_string(),
            auth: AuthConfig::default(),
        }
    }

    /// Load a JSON config file. Missing `auth` settings keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;

        if url::Url::parse(&config.landing_url).is_err() {
            return Err(CoreError::Config(format!(
                "landing_url is not an absolute URL: {}",
                config.landing_url
            )));
        }

        Ok(config)
    }

    pub fn data_dir() -> PathBuf {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|d| d.join("rewear"))
            .unwrap_or_else(|| PathBuf::from(".rewear"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
