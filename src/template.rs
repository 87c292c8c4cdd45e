// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Template rendering.
//!
//! Templates use Tera syntax, so a placeholder looks like `{{ name }}`.
//! Rendering is strict: a placeholder that names a key missing from the
//! defaults mapping is an error, never an empty string.

use crate::config::Defaults;

use std::error::Error as StdError;
use tera::{Context, Tera};
use tracing::{debug, instrument};

/// Render raw template bytes against defaults mapping.
///
/// Text outside of placeholders is copied through byte for byte. Output is
/// never HTML escaped.
///
/// # Errors
///
/// - Return [`TemplateError::Encoding`] if the template is not UTF-8.
/// - Return [`TemplateError::KeyMissing`] if a placeholder references a key
///   that the defaults do not provide.
/// - Return [`TemplateError::Render`] for any other rendering failure.
#[instrument(skip(template, defaults), level = "debug")]
pub fn render(template: &[u8], defaults: &Defaults) -> Result<Vec<u8>> {
    let template = std::str::from_utf8(template)?;
    let context = Context::from_serialize(defaults.as_table())?;
    let rendered = Tera::one_off(template, &context, false).map_err(|err| {
        match missing_key(&err) {
            Some(key) => TemplateError::KeyMissing { key },
            None => TemplateError::Render(err),
        }
    })?;
    debug!("rendered {} bytes", rendered.len());

    Ok(rendered.into_bytes())
}

// Tera reports an undefined variable as a plain message somewhere down the
// error chain, e.g., "Variable `name` not found in context while rendering".
fn missing_key(err: &tera::Error) -> Option<String> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(cause) = current {
        let message = cause.to_string();
        if message.contains("not found in context") {
            return message
                .split('`')
                .nth(1)
                .map(ToString::to_string);
        }
        current = cause.source();
    }

    None
}

/// Template error types.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template references key absent from defaults.
    #[error("template references undefined key {key:?}")]
    KeyMissing { key: String },

    /// Template is not valid UTF-8.
    #[error(transparent)]
    Encoding(#[from] std::str::Utf8Error),

    /// Tera fails to parse or render template.
    #[error(transparent)]
    Render(#[from] tera::Error),
}

/// Friendly result alias :3
pub type Result<T, E = TemplateError> = std::result::Result<T, E>;
