// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! The only configuration dotstrap reads is the __defaults__ document: a TOML
//! table whose keys feed template placeholders. The document is optional. A
//! bootstrap root without one simply renders templates against an empty
//! mapping, which means any template that references a key will fail.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Key-value mapping used to render templates.
///
/// # General Layout
///
/// Top-level keys are placeholder names. Nested tables are reachable through
/// dotted access inside templates, e.g., `{{ git.email }}` resolves against
/// the following document:
///
/// ```toml
/// [git]
/// email = "alice@example.org"
/// ```
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Defaults(toml::Table);

impl Defaults {
    /// Construct empty defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults document from target path.
    ///
    /// A missing document is treated as an empty mapping.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the document exists but cannot be
    ///   read.
    /// - Return [`ConfigError::Deserialize`] if the document is not valid
    ///   TOML.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(data) => {
                debug!("load defaults from {:?}", path.display());
                data.parse()
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no defaults at {:?}, using empty mapping", path.display());
                Ok(Self::new())
            }
            Err(err) => Err(ConfigError::Read {
                source: err,
                path: path.to_path_buf(),
            }),
        }
    }

    /// Insert or replace a top-level key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Lookup a top-level key.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }

    /// Check if mapping has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Treat defaults as a TOML table slice.
    pub fn as_table(&self) -> &toml::Table {
        &self.0
    }
}

impl FromStr for Defaults {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for Defaults {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

impl From<toml::Table> for Defaults {
    fn from(table: toml::Table) -> Self {
        Self(table)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Defaults document exists, but cannot be read.
    #[error("failed to read defaults at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
