// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where dotfiles get materialized, and where the source tree and
//! defaults document live when the caller does not say otherwise.

use std::path::{Path, PathBuf};

/// Name of the source tree directory relative to the bootstrap root.
pub const SOURCE_TREE_NAME: &str = "dotfiles";

/// Name of the defaults document relative to the bootstrap root.
pub const DEFAULTS_FILE_NAME: &str = "defaults.toml";

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Default source tree location under a bootstrap root.
pub fn default_source_dir(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join(SOURCE_TREE_NAME)
}

/// Default defaults document location under a bootstrap root.
pub fn default_defaults_file(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join(DEFAULTS_FILE_NAME)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
