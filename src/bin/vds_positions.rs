// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{env, error::Error, path::Path};

use vision_datasets_rs::core::sequence::RectifiedMonoSequence;
use vision_datasets_rs::dataset::{euroc, kitti, robotcar, DataRoot};

/// Print the per-frame camera positions of a sequence, one `x y z` row per
/// frame, e.g. to plot a ground-truth trajectory.
fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if let Err(error) = my_run(&args) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

const USAGE: &str = "Usage: ./vds_positions [kitti|euroc|robotcar] dataset_root sequence_id";

fn my_run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let (dataset, root, sequence_id) = check_args(args)?;
    let mono = load_mono(dataset, &root, sequence_id)?;
    log::info!("{}: {} frames", mono.frames.name(), mono.frames.len());
    let positions = mono.positions();
    for i in 0..positions.nrows() {
        println!(
            "{} {} {}",
            positions[(i, 0)],
            positions[(i, 1)],
            positions[(i, 2)]
        );
    }
    Ok(())
}

fn check_args(args: &[String]) -> Result<(&str, DataRoot, &str), String> {
    if let [_, dataset, root_str, sequence_id] = args {
        let root_path = Path::new(root_str);
        if !root_path.is_dir() {
            return Err(format!("Dataset root is not a directory: {}", root_str));
        }
        Ok((dataset.as_str(), DataRoot::new(root_path), sequence_id.as_str()))
    } else {
        Err(USAGE.to_string())
    }
}

fn load_mono(
    dataset: &str,
    root: &DataRoot,
    sequence_id: &str,
) -> Result<RectifiedMonoSequence, Box<dyn Error>> {
    match dataset {
        "kitti" => Ok(kitti::load(root, sequence_id)?.mono),
        "euroc" => Ok(euroc::load(root, sequence_id)?.mono),
        "robotcar" => Ok(robotcar::load_cropped_gray(root, sequence_id)?.mono),
        _ => Err(format!("Unknown dataset: {}\n{}", dataset, USAGE).into()),
    }
}
