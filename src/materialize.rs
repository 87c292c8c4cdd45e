// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfile materialization.
//!
//! To __materialize__ a source entry is to produce its final artifact under
//! the home directory. Plain files become symlinks that point back at the
//! source tree. Templates are rendered against the defaults mapping, and
//! written out as ordinary files.
//!
//! # Conflict Resolution
//!
//! Before anything is written, the current state of the target path decides
//! what happens:
//!
//! 1. Nothing there: materialize.
//! 2. Content identical to the raw source (or, for templates, to the
//!    rendered output): skip.
//! 3. Anything else: ask the operator to pick "yes", "no", or "always",
//!    unless the overwrite policy already says "always". Picking "always"
//!    sticks for the rest of the run.
//!
//! The overwrite policy is a plain value handed into [`Materializer::run`]
//! and handed back inside the [`Report`], so no state outlives a run.
//!
//! # Failure
//!
//! By default the first failure aborts the run, leaving every entry that was
//! already materialized in place. [`ErrorPolicy::CollectAndReport`] instead
//! records failures against their entries and keeps going. Prompt failures
//! and answers outside the offered choices always abort.
//!
//! Templates are rendered before an existing target is removed, and a real
//! directory in the way is reported as a conflict without asking.

use crate::{
    config::Defaults,
    prompt::{PromptError, Prompter},
    source::SourceEntry,
    template::{render, TemplateError},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read, remove_file, symlink_metadata, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info, instrument, warn};

/// Choices offered when a target is in the way.
pub const CONFLICT_OPTIONS: [&str; 3] = ["yes", "no", "always"];

/// Whether conflicting targets get overwritten without asking.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Ask the operator about each conflict.
    #[default]
    Unset,

    /// Overwrite every conflict without asking.
    Always,
}

/// What to do when a single entry fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first failing entry.
    #[default]
    AbortOnFirstError,

    /// Record failure against the entry and move on.
    CollectAndReport,
}

/// Current state of a target path relative to its source entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Nothing exists at target path.
    Missing,

    /// Target content matches source entry.
    Identical,

    /// Something else is in the way.
    Differs,
}

impl Display for TargetState {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Missing => fmt.pad("missing"),
            Self::Identical => fmt.pad("identical"),
            Self::Differs => fmt.pad("differs"),
        }
    }
}

/// Result of processing one source entry.
#[derive(Debug)]
pub enum Outcome {
    /// Target already matched, nothing written.
    Identical,

    /// Operator chose to keep the existing target.
    Declined,

    /// Symlink created, possibly after removing an old target.
    Linked { overwrote: bool },

    /// Template rendered, possibly after removing an old target.
    Rendered { overwrote: bool },

    /// Entry failed while collecting errors.
    Failed(MaterializeError),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of one source entry paired with where it was headed.
#[derive(Debug)]
pub struct Record {
    pub entry: SourceEntry,
    pub target: PathBuf,
    pub outcome: Outcome,
}

/// Summary of a full materialization run.
#[derive(Debug, Default)]
pub struct Report {
    pub records: Vec<Record>,

    /// Overwrite policy as it stood when the run ended.
    pub policy: OverwritePolicy,
}

impl Report {
    /// Iterate over records that failed.
    pub fn failures(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|record| record.outcome.is_failed())
    }

    /// Check if every entry went through without failure.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Materialize source entries into a home directory.
#[derive(Debug, Clone)]
pub struct Materializer {
    home: PathBuf,
    defaults: Defaults,
    error_policy: ErrorPolicy,
}

impl Materializer {
    /// Construct new materializer rooted at target home directory.
    pub fn new(home: impl Into<PathBuf>, defaults: Defaults) -> Self {
        Self {
            home: home.into(),
            defaults,
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Replace error policy.
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn home(&self) -> &Path {
        self.home.as_path()
    }

    /// Materialize every entry in order.
    ///
    /// Starts from the given overwrite policy. The policy in effect at the
    /// end of the run is returned in the report.
    ///
    /// # Errors
    ///
    /// - Return [`MaterializeError::Prompt`] if the operator cannot be asked.
    /// - Return the first entry failure under
    ///   [`ErrorPolicy::AbortOnFirstError`].
    #[instrument(skip(self, entries, prompter), level = "debug")]
    pub fn run(
        &self,
        entries: &[SourceEntry],
        policy: OverwritePolicy,
        prompter: &mut impl Prompter,
    ) -> Result<Report> {
        let mut report = Report {
            records: Vec::with_capacity(entries.len()),
            policy,
        };

        for entry in entries {
            let target = entry.target_path(&self.home);
            let outcome = match self.process(entry, &target, &mut report.policy, prompter) {
                Ok(outcome) => outcome,
                Err(err @ MaterializeError::Prompt(_)) => return Err(err),
                Err(err @ MaterializeError::UnknownChoice { .. }) => return Err(err),
                Err(err) => match self.error_policy {
                    ErrorPolicy::AbortOnFirstError => return Err(err),
                    ErrorPolicy::CollectAndReport => {
                        error!("failed to process {entry}: {err}");
                        Outcome::Failed(err)
                    }
                },
            };

            report.records.push(Record {
                entry: entry.clone(),
                target,
                outcome,
            });
        }

        Ok(report)
    }

    /// Inspect target state of every entry without writing anything.
    ///
    /// # Errors
    ///
    /// - Return [`MaterializeError::Io`] if a source or target cannot be
    ///   read.
    pub fn status(&self, entries: &[SourceEntry]) -> Result<Vec<(PathBuf, TargetState)>> {
        entries
            .iter()
            .map(|entry| {
                let target = entry.target_path(&self.home);
                let source = read(entry.absolute()).map_err(io_error(entry.absolute()))?;
                let state = self.target_state(entry, &source, &target)?;
                Ok((target, state))
            })
            .collect()
    }

    fn process(
        &self,
        entry: &SourceEntry,
        target: &Path,
        policy: &mut OverwritePolicy,
        prompter: &mut impl Prompter,
    ) -> Result<Outcome> {
        info!("processing {entry} => {}", target.display());
        if let Some(parent) = target.parent() {
            mkdirp::mkdirp(parent).map_err(io_error(parent))?;
        }

        let source = read(entry.absolute()).map_err(io_error(entry.absolute()))?;
        let overwrote = match self.target_state(entry, &source, target)? {
            TargetState::Missing => false,
            TargetState::Identical => {
                info!("\tfiles are identical");
                return Ok(Outcome::Identical);
            }
            TargetState::Differs => {
                // INVARIANT: Never offer to replace something that cannot be removed.
                if is_real_dir(target) {
                    return Err(MaterializeError::FilesystemConflict {
                        target: target.to_path_buf(),
                    });
                }

                if !should_overwrite(target, policy, prompter)? {
                    info!("\tskipping {}", target.display());
                    return Ok(Outcome::Declined);
                }
                true
            }
        };

        // INVARIANT: Render before removal, so a broken template leaves the
        // existing target alone.
        let rendered = if entry.kind().is_template() {
            let rendered = render(&source, &self.defaults).map_err(|err| {
                MaterializeError::Template {
                    source: err,
                    path: entry.absolute().to_path_buf(),
                }
            })?;
            Some(rendered)
        } else {
            None
        };

        if overwrote {
            info!("\tremoving {}", target.display());
            remove_file(target).map_err(io_error(target))?;
        }

        match rendered {
            Some(rendered) => {
                info!("\tgenerating {}", target.display());
                write_new(target, &rendered)?;
                Ok(Outcome::Rendered { overwrote })
            }
            None => {
                info!(
                    "\tsymlinking {} => {}",
                    target.display(),
                    entry.absolute().display()
                );
                symlink(entry.absolute(), target)?;
                Ok(Outcome::Linked { overwrote })
            }
        }
    }

    fn target_state(
        &self,
        entry: &SourceEntry,
        source: &[u8],
        target: &Path,
    ) -> Result<TargetState> {
        let metadata = match symlink_metadata(target) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(TargetState::Missing),
            Err(err) => return Err(io_error(target)(err)),
        };

        if metadata.is_dir() || target.is_dir() {
            return Ok(TargetState::Differs);
        }

        // INVARIANT: Dangling symlinks exist, but never match anything.
        let existing = match read(target) {
            Ok(existing) => existing,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("dangling symlink at {}", target.display());
                return Ok(TargetState::Differs);
            }
            Err(err) => return Err(io_error(target)(err)),
        };

        if existing == source {
            return Ok(TargetState::Identical);
        }

        // INVARIANT: A template that fails to render is never identical. The
        // render error surfaces later if the operator decides to overwrite.
        if entry.kind().is_template()
            && render(source, &self.defaults).is_ok_and(|rendered| rendered == existing)
        {
            return Ok(TargetState::Identical);
        }

        Ok(TargetState::Differs)
    }
}

fn should_overwrite(
    target: &Path,
    policy: &mut OverwritePolicy,
    prompter: &mut impl Prompter,
) -> Result<bool> {
    if *policy == OverwritePolicy::Always {
        return Ok(true);
    }

    let message = format!("File already exists: {}. Overwrite it?", target.display());
    let choice = prompter.select(&message, &CONFLICT_OPTIONS)?;
    match CONFLICT_OPTIONS.get(choice) {
        Some(&"yes") => Ok(true),
        Some(&"no") => Ok(false),
        Some(&"always") => {
            *policy = OverwritePolicy::Always;
            Ok(true)
        }
        _ => Err(MaterializeError::UnknownChoice { choice }),
    }
}

fn is_real_dir(path: &Path) -> bool {
    symlink_metadata(path).is_ok_and(|metadata| metadata.is_dir())
}

fn write_new(target: &Path, contents: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(conflict_or_io(target))?;
    file.write_all(contents).map_err(io_error(target))?;

    Ok(())
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, target).map_err(conflict_or_io(target))
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(source, target).map_err(conflict_or_io(target))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> MaterializeError + '_ {
    move |err| MaterializeError::Io {
        source: err,
        path: path.to_path_buf(),
    }
}

fn conflict_or_io(path: &Path) -> impl FnOnce(std::io::Error) -> MaterializeError + '_ {
    move |err| {
        if err.kind() == ErrorKind::AlreadyExists {
            MaterializeError::FilesystemConflict {
                target: path.to_path_buf(),
            }
        } else {
            io_error(path)(err)
        }
    }
}

/// Materialization error types.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// Something appeared at target path after conflict resolution.
    #[error("unexpected filesystem object at {:?}", target.display())]
    FilesystemConflict { target: PathBuf },

    /// Filesystem operation fails.
    #[error("filesystem operation failed at {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Template cannot be rendered.
    #[error("failed to render template {:?}", path.display())]
    Template {
        #[source]
        source: TemplateError,
        path: PathBuf,
    },

    /// Operator cannot be asked.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Operator answer does not map to any offered choice.
    #[error("operator choice {choice} is not an offered option")]
    UnknownChoice { choice: usize },
}

/// Friendly result alias :3
pub type Result<T, E = MaterializeError> = std::result::Result<T, E>;
