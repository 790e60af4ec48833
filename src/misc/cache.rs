// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Disk-backed compute-if-absent cache for expensive one-time computations.
//!
//! The key is a deterministic string fingerprint of the inputs, the value a
//! bincode-encoded artifact. There is no eviction: artifacts are written once
//! and reused until deleted by hand.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Deterministic string key built from named input values.
///
/// Values are rendered with `Display` and joined as `name=value` pairs,
/// so the same inputs always map to the same cache file.
#[derive(Debug, Clone, Default)]
pub struct Fingerprint {
    parts: Vec<String>,
}

impl Fingerprint {
    /// Start an empty fingerprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named input value.
    pub fn with(mut self, name: &str, value: impl Display) -> Self {
        self.parts.push(format!("{}={}", name, value));
        self
    }

    /// Render the fingerprint as a file-system friendly key.
    pub fn key(&self) -> String {
        // Path separators in values would escape the cache directory.
        self.parts.join("_").replace('/', "_")
    }
}

/// A directory of bincode-encoded artifacts, looked up by fingerprint key.
#[derive(Debug, Clone)]
pub struct BincodeCache {
    dir: PathBuf,
}

impl BincodeCache {
    /// Use the given directory for cache files. Created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        BincodeCache { dir: dir.into() }
    }

    /// Path of the cache file for a key.
    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", key))
    }

    /// Does an artifact for this key already exist on disk?
    pub fn contains(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }

    /// Load the artifact for `key`, or compute, store and return it.
    ///
    /// The computation runs only when the artifact is absent.
    pub fn get_or_compute<T, F>(&self, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let path = self.file_path(key);
        if path.exists() {
            log::debug!("cache hit: {}", path.display());
            let file = File::open(&path).map_err(Error::io(&path))?;
            return bincode::deserialize_from(BufReader::new(file))
                .map_err(|source| Error::Cache { path, source });
        }
        log::debug!("cache miss, computing: {}", path.display());
        let value = compute()?;
        self.store(&path, &value)?;
        Ok(value)
    }

    fn store<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(Error::io(&self.dir))?;
        let file = File::create(path).map_err(Error::io(path))?;
        bincode::serialize_into(BufWriter::new(file), value).map_err(|source| Error::Cache {
            path: path.to_path_buf(),
            source,
        })
    }
}

// TESTS #############################################################
