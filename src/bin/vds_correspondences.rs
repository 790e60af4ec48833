// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rand::Rng;
use std::{env, error::Error, path::Path};

use vision_datasets_rs::dataset::{dtu, DataRoot};

/// Sample random pixels in the first frame of a DTU set and print their
/// ground-truth correspondence in the last frame. The first run of a set
/// computes and caches the visibility maps, later runs reuse them.
fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if let Err(error) = my_run(&args) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

const USAGE: &str = "Usage: ./vds_correspondences dataset_root set_index light_index";

const NB_SAMPLES: usize = 20;

fn my_run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let (root, set_i, light_i) = check_args(args)?;
    let sequence = dtu::load_same_light(&root, set_i, light_i, true)?;
    let last = sequence.mono.frames.len() - 1;
    let (rows, cols) = sequence.visibility(0).shape();
    let mut rng = rand::thread_rng();
    for _ in 0..NB_SAMPLES {
        let pixel = (rng.gen_range(0..rows), rng.gen_range(0..cols));
        match sequence.correspondence(0, last, pixel) {
            Some((row, col)) => println!("({}, {}) -> ({}, {})", pixel.0, pixel.1, row, col),
            None => println!("({}, {}) -> no correspondence", pixel.0, pixel.1),
        }
    }
    Ok(())
}

fn check_args(args: &[String]) -> Result<(DataRoot, usize, usize), String> {
    if let [_, root_str, set_str, light_str] = args {
        let root_path = Path::new(root_str);
        if !root_path.is_dir() {
            return Err(format!("Dataset root is not a directory: {}", root_str));
        }
        let set_i = set_str
            .parse()
            .map_err(|_| format!("Invalid set index: {}", set_str))?;
        let light_i = light_str
            .parse()
            .map_err(|_| format!("Invalid light index: {}", light_str))?;
        Ok((DataRoot::new(root_path), set_i, light_i))
    } else {
        Err(USAGE.to_string())
    }
}
