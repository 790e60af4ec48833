// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One loader per supported dataset.
//!
//! Every loader takes an explicit [`DataRoot`] instead of resolving the
//! dataset location from ambient process state, and returns one of the
//! sequence types of [`crate::core::sequence`].

pub mod dtu;
pub mod euroc;
pub mod kitti;
pub mod robotcar;
pub mod tum_mono;

use std::path::{Path, PathBuf};

/// Root directory of one dataset on disk, threaded explicitly through the
/// loaders.
#[derive(Debug, Clone)]
pub struct DataRoot(PathBuf);

impl DataRoot {
    /// Wrap a dataset root directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DataRoot(path.into())
    }

    /// The root path itself.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// A path below the root.
    pub fn join(&self, part: impl AsRef<Path>) -> PathBuf {
        self.0.join(part)
    }
}

/// Hand-curated dataset partitions. The sequence lists are fixed per
/// dataset, not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// Sequences used for training.
    Training,
    /// Sequences used for validation.
    Validation,
    /// Sequences held out for testing.
    Testing,
}
