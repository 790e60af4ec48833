// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types shared by the whole crate.
//!
//! Failures here are final: this is synchronous, deterministic numeric code
//! where retrying would not change the outcome. Everything propagates to the
//! immediate caller with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All the ways loading or transforming dataset data can fail.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying filesystem error, with the path that triggered it.
    #[error("io error on {path}: {source}")]
    Io {
        /// Path of the file or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A text file did not have the expected shape or numeric content.
    #[error("could not parse {path}: {reason}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A camera sensor description could not be decoded.
    #[error("could not decode sensor description {path}: {source}")]
    Yaml {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A ground-truth trajectory table could not be read.
    #[error("could not read trajectory table {path}: {source}")]
    Csv {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// A cached artifact could not be encoded or decoded.
    #[error("cache artifact {path}: {source}")]
    Cache {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: bincode::Error,
    },

    /// Two collections that must be aligned one-to-one have different lengths.
    #[error("{left_name} has {left} entries but {right_name} has {right}")]
    LengthMismatch {
        /// Name of the first collection.
        left_name: &'static str,
        /// Length of the first collection.
        left: usize,
        /// Name of the second collection.
        right_name: &'static str,
        /// Length of the second collection.
        right: usize,
    },

    /// The matrix logarithm of a rotation by exactly pi is not unique.
    /// Callers should avoid this input range or use another representation.
    #[error("rotation angle is pi, the matrix logarithm is not unique; consider another representation")]
    RotationLogSingularity,

    /// An expensive offline preprocessing step has not been run yet.
    /// It is never triggered automatically, to keep one-time preprocessing
    /// explicit and controllable.
    #[error("{artifact} not found; run {instruction} first")]
    MissingPreprocessing {
        /// What is missing on disk.
        artifact: String,
        /// Which offline step produces it.
        instruction: String,
    },
}

impl Error {
    /// Attach a path to an io error, for use with `map_err`.
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }

    /// Build a parse error for the given file.
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Error {
        Error::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
