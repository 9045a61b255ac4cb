// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! This program runs the standard parameter sweep for one array: 30 sky
//! seeds, four sky types, correlated and uncorrelated timing and amplitude
//! errors at six error scales. Each observation (corrupted, filtered and
//! filtered-per-baseline uv planes) is written to `out/` as a `.npy` file.
//!
//! Usage: `telescope-sweep <ndishes> <npix_fft> <redundant (1 or 0)>`

use std::path::Path;

use log::info;
use thiserror::Error;

use telescope_1d::{
    io::{write_obs, ObsFilename, WriteObsError},
    ErrorType, InitTelescopeError, ObsParams, SkyType, Telescope1D, TelescopeConfig,
    TelescopeError,
};

const NFREQ: usize = 512;
const TELESCOPE_SEED: u64 = 22;
const NUM_SKY_SEEDS: u64 = 30;
const ERROR_SCALES: [f64; 6] = [0.0, 0.05, 0.1, 1.0, 10.0, 100.0];
const OUTPUT_DIR: &str = "out";

#[derive(Error, Debug)]
enum SweepError {
    #[error("Usage: telescope-sweep <ndishes> <npix_fft> <redundant (1 or 0)>")]
    Usage,

    #[error("Couldn't parse '{0}' as a number")]
    BadNumber(String),

    #[error(transparent)]
    Init(#[from] InitTelescopeError),

    #[error(transparent)]
    Telescope(#[from] TelescopeError),

    #[error(transparent)]
    Write(#[from] WriteObsError),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(std::env::args().skip(1).collect()) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn parse_number(s: &str) -> Result<usize, SweepError> {
    s.parse().map_err(|_| SweepError::BadNumber(s.to_string()))
}

fn run(args: Vec<String>) -> Result<(), SweepError> {
    let [ndishes, npix_fft, redundant] = args.as_slice() else {
        return Err(SweepError::Usage);
    };
    let ndishes = parse_number(ndishes)?;
    let npix_fft = parse_number(npix_fft)?;
    let redundant = redundant == "1";

    info!("Creating telescope...");
    let telescope = Telescope1D::new(TelescopeConfig {
        nfreq: NFREQ,
        ndishes,
        npix_fft,
        redundant,
        seed: TELESCOPE_SEED,
        ..Default::default()
    })?;

    for seed in 0..NUM_SKY_SEEDS {
        info!("Doing seed: {seed}");
        for sky_type in SkyType::SWEEP {
            let sky = telescope.get_sky(sky_type, seed)?;
            let uvplane = telescope.observe_sky(&sky)?;
            for correlated in [false, true] {
                for error_type in [ErrorType::Timing, ErrorType::Amplitude] {
                    for error_scale in ERROR_SCALES {
                        let filename = ObsFilename {
                            ndishes,
                            npix: npix_fft,
                            redundant,
                            seed,
                            sky: sky_type,
                            correlated,
                            error_type,
                            error_scale,
                        };
                        let unit = match error_type {
                            ErrorType::Timing => 1e-12,
                            ErrorType::Amplitude => 1e-2,
                        };
                        let params = ObsParams {
                            error_sigma: error_scale * unit,
                            correlated,
                            error_type,
                            filter_fg: true,
                            ..Default::default()
                        };

                        info!("Working on {filename} (sky sum {})", sky.sum());
                        let obs = telescope.get_obs_uvplane(uvplane.view(), &params)?;
                        write_obs(filename.path_in(Path::new(OUTPUT_DIR)), &obs)?;
                    }
                }
            }
        }
    }

    Ok(())
}
