// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing observed uv planes to disk.

use std::path::{Path, PathBuf};

use log::trace;
use ndarray::{stack, Axis};
use ndarray_npy::{write_npy, WriteNpyError};
use thiserror::Error;

use crate::{corruption::ObsUvPlane, ErrorType, SkyType};

#[derive(Error, Debug)]
pub enum WriteObsError {
    #[error(transparent)]
    Npy(#[from] WriteNpyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Couldn't stack the uv planes: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Everything that distinguishes one observation of a parameter sweep from
/// another. The [`std::fmt::Display`] implementation gives the file name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObsFilename {
    pub ndishes: usize,
    pub npix: usize,
    pub redundant: bool,
    pub seed: u64,
    pub sky: SkyType,
    pub correlated: bool,
    pub error_type: ErrorType,

    /// The error scale, in units of 1 ps for timing errors and 1% for
    /// amplitude errors. Zero is written as `0`; every other value keeps its
    /// decimal point (`1.0`, `0.05`).
    pub error_scale: f64,
}

impl ObsFilename {
    /// The full path of this observation's file inside `dir`.
    pub fn path_in<P: AsRef<Path>>(&self, dir: P) -> PathBuf {
        dir.as_ref().join(self.to_string())
    }
}

impl std::fmt::Display for ObsFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}_{}{}{}.npy",
            self.ndishes,
            self.npix,
            if self.redundant { "red" } else { "nred" },
            self.seed,
            self.sky,
            if self.correlated { "c" } else { "u" },
            self.error_type,
            if self.error_scale == 0.0 {
                "0".to_string()
            } else {
                format!("{:?}", self.error_scale)
            }
        )
    }
}

/// Write all of the uv planes of an observation into a single `.npy` file,
/// stacked along the first axis (so the array has shape `(1, nfreq, nb)` or
/// `(3, nfreq, nb)`). Missing parent directories are created.
pub fn write_obs<P: AsRef<Path>>(path: P, obs: &ObsUvPlane) -> Result<(), WriteObsError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let stacked = stack(Axis(0), &obs.planes())?;
    trace!("Writing {:?} to {}", stacked.dim(), path.display());
    write_npy(path, &stacked)?;
    Ok(())
}
