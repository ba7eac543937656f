//! Configuration file discovery.
//!
//! Lookup order: `$GIT_INVOKE_CONFIG`, `./.git-invoke.toml`, then
//! `<config dir>/git-invoke/config.toml`. The first file that exists wins;
//! with none, defaults apply.

use std::path::{Path, PathBuf};

use super::InvokerConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "GIT_INVOKE_CONFIG";

const LOCAL_CONFIG_FILE: &str = ".git-invoke.toml";

/// Finds and reads the invoker configuration.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    candidates: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Loader over the standard lookup order.
    #[must_use]
    pub fn new() -> Self {
        let candidates = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .into_iter()
            .chain(std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)))
            .chain(dirs::config_dir().map(|dir| dir.join("git-invoke").join("config.toml")))
            .collect();
        Self { candidates }
    }

    /// Loader that only looks at `path`.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            candidates: vec![path],
        }
    }

    /// Read and validate the first config file found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file found cannot be read, parsed or
    /// validated.
    pub fn load(&self) -> Result<InvokerConfig, ConfigError> {
        let Some(path) = self.find_config_file() else {
            tracing::debug!(candidates = ?self.candidates, "No config file found, using defaults");
            return Ok(InvokerConfig::default());
        };

        tracing::debug!(path = %path.display(), "Loading config file");
        let config = Self::load_from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse one config file without validating it.
    ///
    /// # Errors
    ///
    /// Returns `ReadError` or `ParseError`.
    pub fn load_from_path(path: &Path) -> Result<InvokerConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Candidate paths in lookup order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.candidates.iter().find(|p| p.is_file()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`InvokerConfig`].
    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// An extra signature pattern does not compile.
    #[error("Invalid signature pattern {pattern:?}: {source}")]
    InvalidSignature {
        pattern: String,
        source: regex::Error,
    },

    /// A capacity setting is zero.
    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),
}
