//! Configuration for identify sessions.
//!
//! Read from `~/.identify/config.toml`:
//!
//! ```toml
//! [confirm]
//! identity_confirmed = true
//! auto_confirmed = true
//!
//! [session]
//! buffered = true
//! ```
//!
//! Every key is optional. A missing file means defaults.

use std::io;
use std::path::{Path, PathBuf};

use identify_types::ConfirmResult;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct IdentifyConfig {
    /// Answer given to confirmation prompts that are never shown.
    pub confirm: ConfirmResult,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hold identify notifications back until tracking breaks. When false the
    /// UI sees every notification as it happens.
    pub buffered: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { buffered: true }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl IdentifyConfig {
    /// Load from the default location, logging and ignoring a broken file.
    pub fn load() -> Option<Self> {
        let path = config_path()?;
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("{err}");
                None
            }
        }
    }

    /// Load from `path`. `Ok(None)` when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".identify").join("config.toml"))
}
