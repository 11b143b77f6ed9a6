// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Output sink for the rendered ConfigMap.
//!
//! Writes to stdout when the destination is `-`, otherwise to a file whose
//! parent directories are created on demand.

use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf}
};

use tracing::info;

use crate::{
    config::STDOUT_MARKER,
    error::{self, Error}
};

/// Where the rendered ConfigMap is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Print the document verbatim to stdout.
    Stdout,
    /// Write the document to a file.
    File(PathBuf)
}

impl OutputTarget {
    /// Resolves an output argument, treating `-` as stdout.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use promgen::OutputTarget;
    ///
    /// assert_eq!(OutputTarget::from_arg(Path::new("-")), OutputTarget::Stdout);
    /// assert!(matches!(OutputTarget::from_arg(Path::new("out/cm.yaml")), OutputTarget::File(_)));
    /// ```
    pub fn from_arg(raw: &Path) -> Self {
        if raw.as_os_str() == STDOUT_MARKER {
            Self::Stdout
        } else {
            Self::File(raw.to_path_buf())
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => formatter.write_str("stdout"),
            Self::File(path) => write!(formatter, "{}", path.display())
        }
    }
}

/// Writes the rendered document to `target`.
///
/// For [`OutputTarget::Stdout`] the document goes to `stdout` unchanged. For
/// [`OutputTarget::File`] the file is written and a confirmation line is
/// printed to `stdout` instead.
///
/// # Errors
///
/// Returns [`Error::Write`] when the parent directory cannot be created, the
/// file cannot be written, or `stdout` rejects the write.
pub fn write_output<W: Write>(
    target: &OutputTarget,
    rendered: &str,
    stdout: &mut W
) -> Result<(), Error> {
    let stdout_path = Path::new(STDOUT_MARKER);

    match target {
        OutputTarget::Stdout => {
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|source| error::write_error(stdout_path, source))?;
        }
        OutputTarget::File(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                info!("Creating output directory {}", parent.display());
                fs::create_dir_all(parent).map_err(|source| error::write_error(parent, source))?;
            }

            fs::write(path, rendered).map_err(|source| error::write_error(path, source))?;
            info!("Wrote configmap to {}", path.display());

            writeln!(stdout, "✓ wrote ConfigMap to {}", path.display())
                .map_err(|source| error::write_error(stdout_path, source))?;
        }
    }

    Ok(())
}
