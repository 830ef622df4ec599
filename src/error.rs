#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the activity tracker."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free while still
//! exposing a thoroughly documented error surface for library consumers.

use std::path::{Path, PathBuf};

/// Unified error type returned by configuration loading, classification and
/// reporting.
///
/// Each variant captures sufficient context for diagnostics while avoiding
/// accidental exposure of sensitive values such as tokens or webhook URLs.
/// Instances are typically constructed through the helper constructors or by
/// converting from serde error types via the provided `From` implementations.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Returned when the runtime configuration violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Service errors when interacting with external APIs.
    #[error("service error: {message}")]
    Service {
        /// Human readable message describing the service error.
        message: String
    },
    /// Returned when building a developer activity record fails.
    #[error("classification failed: {message}")]
    Classification {
        /// Human readable message describing the classification failure.
        message: String
    },
    /// Wraps serialization errors when encoding records or payloads.
    #[error("failed to serialize report data: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps I/O errors that occur while writing the debug artifact.
    #[error("failed to write debug artifact at {path:?}: {source}")]
    ArtifactIo {
        /// Location of the artifact being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a service error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the service error.
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Constructs a classification error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the classification failure.
    pub fn classification<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Classification {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics in CLI contexts.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation
    /// and is suitable for printing to standard error before exiting.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::ArtifactIo`] variant capturing the failing path and
/// source.
///
/// # Parameters
///
/// * `path` - Location of the debug artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn artifact_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ArtifactIo {
        path: path.to_path_buf(),
        source
    }
}
