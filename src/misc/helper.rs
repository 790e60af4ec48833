// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Miscellaneous helper functions that didn't fit elsewhere.
//!
//! Mostly plumbing shared by the dataset loaders: sorted directory listings
//! and whitespace-separated numeric text files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::misc::type_aliases::{Float, Mat3};

/// List the files of a directory with the given extension,
/// sorted lexicographically by file name.
///
/// The sorted listing defines the frame ordering of the image sequences.
pub fn images_from_dir(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(Error::io(dir))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| Path::new(name).extension().map_or(false, |e| e == extension))
        .collect();
    names.sort();
    Ok(names.iter().map(|name| dir.join(name)).collect())
}

/// List images of several sibling sub-directories, e.g. `["left", "right"]`.
pub fn images_from_subdirs(
    root: &Path,
    sub_names: &[&str],
    extension: &str,
) -> Result<Vec<Vec<PathBuf>>> {
    sub_names
        .iter()
        .map(|sub| images_from_dir(&root.join(sub), extension))
        .collect()
}

/// Read a whitespace-separated numeric text file into rows of Floats.
///
/// Empty lines are skipped. Rows may have different lengths,
/// callers check the shapes they expect.
pub fn read_float_rows(path: &Path) -> Result<Vec<Vec<Float>>> {
    let content = fs::read_to_string(path).map_err(Error::io(path))?;
    let mut rows = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|s| {
                s.parse()
                    .map_err(|_| Error::parse(path, format!("invalid number {:?}", s)))
            })
            .collect::<Result<Vec<Float>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read a numeric text file as a flat list of Floats, regardless of line breaks.
pub fn read_floats(path: &Path) -> Result<Vec<Float>> {
    Ok(read_float_rows(path)?.into_iter().flatten().collect())
}

/// Read a 3x3 matrix stored as 9 whitespace-separated values.
pub fn read_mat3(path: &Path) -> Result<Mat3> {
    let values = read_floats(path)?;
    if values.len() != 9 {
        return Err(Error::parse(
            path,
            format!("expected 9 values for a 3x3 matrix, got {}", values.len()),
        ));
    }
    Ok(Mat3::from_row_slice(&values))
}

// TESTS #############################################################
