// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Loader for the TUM monoVO dataset.
//!
//! Plain image sequences: `<root>/sequence_<id>/rect/*.jpg`, no calibration
//! or ground-truth poses attached.

use crate::core::sequence::ImageSequence;
use crate::dataset::DataRoot;
use crate::error::Result;
use crate::misc::helper;

/// Load one TUM monoVO sequence.
pub fn load(root: &DataRoot, sequence_id: &str) -> Result<ImageSequence> {
    let rect_dir = root.join(format!("sequence_{}", sequence_id)).join("rect");
    let images = helper::images_from_dir(&rect_dir, "jpg")?;
    Ok(ImageSequence::new(images, "tm", sequence_id))
}

// TESTS #############################################################
