// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap a home directory from a tree of dotfiles.
//!
//! Every regular file in the __source tree__ is materialized under the home
//! directory with a hidden name. Plain files are symlinked back into the
//! source tree, so edits flow both ways. Files ending in `.tera` are
//! templates: they are rendered against the __defaults__ document and
//! written out as ordinary files.
//!
//! Files already in the way are never clobbered silently. Identical content
//! is left alone. Anything else is put to the operator through a
//! [`Prompter`].

pub mod config;
pub mod materialize;
pub mod path;
pub mod prompt;
pub mod source;
pub mod template;

pub use config::Defaults;
pub use materialize::{ErrorPolicy, Materializer, Outcome, OverwritePolicy, Report, TargetState};
pub use prompt::{InquirePrompter, Prompter, ScriptedPrompter};
pub use source::{SourceEntry, SourceTree};
