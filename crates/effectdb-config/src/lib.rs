//! Paging configuration for EffectDB.
//!
//! Configuration is plain TOML decoded into typed structs. Every loaded
//! config is validated before it is handed to the query layer, so the
//! engine never has to re-check limits or separators at request time.

use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

/// Page size used when a request does not name one.
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest page a single request may ask for.
pub const MAX_LIMIT: u64 = 200;

/// Separator between the two fields of a paging token.
pub const DEFAULT_PAIR_SEPARATOR: char = '-';

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid paging config: {0}")]
    Invalid(String),
}

///
/// Config
///
/// Root of the TOML document. Unknown tables are rejected so typos surface
/// at load time.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paging: PagingConfig,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.paging.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }
}

///
/// PagingConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    pub default_limit: u64,
    pub max_limit: u64,
    pub separator: char,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            separator: DEFAULT_PAIR_SEPARATOR,
        }
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(ConfigError::Invalid(
                "default_limit and max_limit must be positive".to_string(),
            ));
        }
        if self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit {} exceeds max_limit {}",
                self.default_limit, self.max_limit
            )));
        }
        if self.separator.is_ascii_digit() || self.separator.is_whitespace() {
            return Err(ConfigError::Invalid(format!(
                "separator '{}' must not be a digit or whitespace",
                self.separator
            )));
        }

        Ok(())
    }
}

///
/// TESTS
///
