#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the generator crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint, so the lint is disabled
//! for this module.

use std::path::{Path, PathBuf};

/// Unified error type returned by the state extractor, the output sink and
/// the CLI.
///
/// Every variant is fatal. The CLI prints the message and exits with a
/// non-zero status; nothing is retried.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// The Terraform state file could not be read.
    #[error("failed to read terraform state from {path:?}: {source}")]
    Read {
        /// Location of the state file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// The state bytes are not valid JSON or do not match the expected shape.
    #[error("failed to parse terraform state: {source}")]
    Parse {
        /// Source decoding error from serde_json.
        source: serde_json::Error
    },
    /// The state holds no usable node entries.
    #[error("empty cluster state: {message}")]
    EmptyState {
        /// Human readable description of what was missing.
        message: String
    },
    /// The rendered ConfigMap could not be written.
    #[error("failed to write configmap to {path:?}: {source}")]
    Write {
        /// Destination path or directory that failed.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// The rendered ConfigMap failed the structural YAML check.
    #[error("rendered configmap is not valid YAML: {message}")]
    RenderCheck {
        /// Human readable message describing the failure.
        message: String
    }
}

impl Error {
    /// Constructs an empty state error from the provided message.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of what was missing.
    pub fn empty_state<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::EmptyState {
            message: message.into()
        }
    }

    /// Constructs a structural check error from the provided message.
    pub fn render_check<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::RenderCheck {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

/// Creates an [`Error::Read`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the state file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn read_error(path: &Path, source: std::io::Error) -> Error {
    Error::Read {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::Write`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Output file or directory that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn write_error(path: &Path, source: std::io::Error) -> Error {
    Error::Write {
        path: path.to_path_buf(),
        source
    }
}
