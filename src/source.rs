// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Source tree enumeration.
//!
//! The __source tree__ is the directory holding the dotfiles to materialize.
//! Every regular file below it becomes a [`SourceEntry`], except for the
//! housekeeping files that belong to the bootstrap repository itself.
//!
//! # Target Paths
//!
//! Each entry maps to exactly one target path under the home directory. The
//! source tree prefix is dropped, the first remaining component gets a
//! leading dot, and the template suffix is stripped from the leaf:
//!
//! | Source                        | Target                  |
//! |-------------------------------|-------------------------|
//! | `dotfiles/zshrc`              | `~/.zshrc`              |
//! | `dotfiles/vim/colors/x.vim`   | `~/.vim/colors/x.vim`   |
//! | `dotfiles/gitconfig.tera`     | `~/.gitconfig`          |

use ignore::WalkBuilder;
use std::{
    ffi::{OsStr, OsString},
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// File name suffix that marks an entry as a template.
pub const TEMPLATE_SUFFIX: &str = ".tera";

/// Top-level names in the source tree that are never dotfiles.
pub const HOUSEKEEPING: &[&str] = &[
    "bootstrap",
    "defaults.toml",
    "README.md",
    "LICENSE",
    "oh-my-zsh",
    ".gitignore",
];

/// Check if top-level name belongs to the housekeeping exclusion set.
pub fn is_housekeeping(name: &OsStr) -> bool {
    HOUSEKEEPING.iter().any(|excluded| OsStr::new(excluded) == name)
}

/// Kind of source entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Symlinked into place.
    #[default]
    Plain,

    /// Rendered into place.
    Template,
}

impl EntryKind {
    /// Classify a file by its name.
    pub fn classify(path: impl AsRef<Path>) -> Self {
        let is_template = path
            .as_ref()
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| {
                name.len() > TEMPLATE_SUFFIX.len() && name.ends_with(TEMPLATE_SUFFIX)
            });

        if is_template {
            Self::Template
        } else {
            Self::Plain
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template)
    }
}

/// A file in the source tree that will be materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    relative: PathBuf,
    absolute: PathBuf,
    kind: EntryKind,
}

impl SourceEntry {
    /// Construct new source entry from its path relative to the source tree.
    pub fn new(root: impl AsRef<Path>, relative: impl Into<PathBuf>) -> Self {
        let relative = relative.into();
        let absolute = root.as_ref().join(&relative);
        let kind = EntryKind::classify(&relative);

        Self {
            relative,
            absolute,
            kind,
        }
    }

    /// Path relative to the source tree root.
    pub fn relative(&self) -> &Path {
        self.relative.as_path()
    }

    /// Absolute path that symlinks point at.
    pub fn absolute(&self) -> &Path {
        self.absolute.as_path()
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Determine where this entry lands under target home directory.
    pub fn target_path(&self, home: impl AsRef<Path>) -> PathBuf {
        target_path(&self.relative, self.kind, home)
    }
}

impl Display for SourceEntry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.relative.to_string_lossy().as_ref())
    }
}

/// Map a relative source path onto its target under home.
///
/// Pure function of its inputs.
pub fn target_path(
    relative: impl AsRef<Path>,
    kind: EntryKind,
    home: impl AsRef<Path>,
) -> PathBuf {
    let mut components = relative.as_ref().iter();
    let mut target = home.as_ref().to_path_buf();

    // INVARIANT: Only the top-level component is hidden.
    if let Some(first) = components.next() {
        let mut hidden = OsString::from(".");
        hidden.push(first);
        target.push(hidden);
    }
    target.extend(components);

    if kind.is_template() {
        let stripped = target
            .file_name()
            .and_then(OsStr::to_str)
            .and_then(|name| name.strip_suffix(TEMPLATE_SUFFIX))
            .map(str::to_owned);
        if let Some(name) = stripped {
            target.set_file_name(name);
        }
    }

    target
}

/// Directory of dotfiles to materialize.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// Open existing source tree.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError::Absolute`] if the absolute path of the tree
    ///   cannot be determined.
    /// - Return [`SourceError::MissingSourceTree`] if the path is not a
    ///   directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref()).map_err(|err| SourceError::Absolute {
            source: err,
            path: root.as_ref().to_path_buf(),
        })?;

        if !root.is_dir() {
            return Err(SourceError::MissingSourceTree { path: root });
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Enumerate every source entry.
    ///
    /// Walks the tree in file name order, so repeated calls on an unchanged
    /// tree yield the same sequence. Hidden files are included, and ignore
    /// files are not honored. Directories and housekeeping entries are
    /// skipped.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError::Walk`] if a directory cannot be read.
    #[instrument(skip(self), level = "debug")]
    pub fn entries(&self) -> Result<Vec<SourceEntry>> {
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .sort_by_file_name(|lhs, rhs| lhs.cmp(rhs))
            .filter_entry(|entry| entry.depth() != 1 || !is_housekeeping(entry.file_name()))
            .build();

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry?;
            if entry.depth() == 0 || entry.path().is_dir() {
                continue;
            }

            // INVARIANT: Walker only yields paths below its root.
            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };

            debug!("found source entry {:?}", relative.display());
            entries.push(SourceEntry::new(&self.root, relative));
        }

        Ok(entries)
    }
}

/// Source tree error types.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Source tree path is not a directory.
    #[error("source tree {:?} is not a directory", path.display())]
    MissingSourceTree { path: PathBuf },

    /// Absolute path of source tree cannot be determined.
    #[error("failed to determine absolute path of {:?}", path.display())]
    Absolute {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory walk fails.
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

/// Friendly result alias :3
pub type Result<T, E = SourceError> = std::result::Result<T, E>;
