// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-dish instrumental errors and their effect on observed uv planes.


use std::f64::consts::TAU;

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::prelude::*;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::{
    c64,
    constants::MHZ_TO_HZ,
    telescope::{Telescope1D, TelescopeError},
    ErrorType, SimRng,
};

/// How an observation is corrupted (and optionally filtered).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObsParams {
    /// The standard deviation of the per-dish errors. Timing errors are in
    /// seconds, amplitude errors are fractional. Zero means no errors.
    pub error_sigma: f64,

    /// If true, errors on nearby dishes are correlated.
    pub correlated: bool,

    pub error_type: ErrorType,

    /// The seed for drawing the errors.
    pub seed: u64,

    /// If true, also filter foregrounds out of the corrupted uv plane.
    pub filter_fg: bool,
}

impl Default for ObsParams {
    fn default() -> Self {
        ObsParams {
            error_sigma: 10e-12,
            correlated: true,
            error_type: ErrorType::Timing,
            seed: 0,
            filter_fg: true,
        }
    }
}

/// The result of [`Telescope1D::get_obs_uvplane`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObsUvPlane {
    /// Only the corrupted uv plane.
    Unfiltered(Array2<c64>),

    /// The corrupted uv plane, and the same after foreground filtering with
    /// the global and the per-baseline bases.
    Filtered {
        corrupted: Array2<c64>,
        filtered: Array2<c64>,
        filtered_per_baseline: Array2<c64>,
    },
}

impl ObsUvPlane {
    pub fn corrupted(&self) -> &Array2<c64> {
        match self {
            ObsUvPlane::Unfiltered(c) => c,
            ObsUvPlane::Filtered { corrupted, .. } => corrupted,
        }
    }

    /// All of the uv planes, in the order corrupted, filtered, filtered per
    /// baseline.
    pub fn planes(&self) -> Vec<ArrayView2<c64>> {
        match self {
            ObsUvPlane::Unfiltered(c) => vec![c.view()],
            ObsUvPlane::Filtered {
                corrupted,
                filtered,
                filtered_per_baseline,
            } => vec![
                corrupted.view(),
                filtered.view(),
                filtered_per_baseline.view(),
            ],
        }
    }
}

impl Telescope1D {
    /// Draw one error per dish. Uncorrelated errors are independent normal
    /// deviates. Correlated errors have covariance `σ²` on the diagonal and
    /// `σ² / sqrt(|Δx| / r0)` between dishes `Δx` apart; `r0` defaults to the
    /// dish diameter.
    pub fn get_errors(
        &self,
        error_sigma: f64,
        correlated: bool,
        seed: u64,
        r0: Option<f64>,
    ) -> Result<Array1<f64>, TelescopeError> {
        if !(error_sigma.is_finite() && error_sigma >= 0.0) {
            return Err(TelescopeError::BadErrorSigma(error_sigma));
        }
        let r0 = r0.unwrap_or(self.config().ddish);
        if !(r0.is_finite() && r0 > 0.0) {
            return Err(TelescopeError::BadCorrelationLength(r0));
        }

        let mut rng = SimRng::seed_from_u64(seed);
        let positions = self.dish_locations();
        let n = positions.len();
        if !correlated {
            let normal = Normal::new(0.0, error_sigma)
                .map_err(|_| TelescopeError::BadErrorSigma(error_sigma))?;
            return Ok(Array1::from_shape_fn(n, |_| normal.sample(&mut rng)));
        }

        let var = error_sigma * error_sigma;
        let cov = DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                var
            } else {
                var / ((positions[j] - positions[i]).abs() / r0).sqrt()
            }
        });
        let factor = correlated_factor(cov);
        let z: DVector<f64> = DVector::from_fn(n, |_, _| StandardNormal.sample(&mut rng));
        let errors = factor * z;
        Ok(errors.iter().copied().collect())
    }

    /// Corrupt a uv plane with per-dish errors. Each unique baseline's
    /// visibility becomes the mean of the corrupted visibilities of all the
    /// dish pairs sharing that baseline.
    pub fn get_obs_uvplane(
        &self,
        uvplane: ArrayView2<c64>,
        params: &ObsParams,
    ) -> Result<ObsUvPlane, TelescopeError> {
        self.check_uvplane_shape(uvplane)?;

        let corrupted = if params.error_sigma > 0.0 {
            let errors = self.get_errors(params.error_sigma, params.correlated, params.seed, None)?;
            self.apply_errors(uvplane, errors.view(), params.error_type)
        } else if params.error_sigma == 0.0 {
            uvplane.to_owned()
        } else {
            return Err(TelescopeError::BadErrorSigma(params.error_sigma));
        };

        if params.filter_fg {
            let scale = self.config().fg_scale;
            let filtered = self.filter_fg(corrupted.view(), scale)?;
            let filtered_per_baseline = self.filter_fg_per_baseline(corrupted.view(), scale)?;
            Ok(ObsUvPlane::Filtered {
                corrupted,
                filtered,
                filtered_per_baseline,
            })
        } else {
            Ok(ObsUvPlane::Unfiltered(corrupted))
        }
    }

    fn apply_errors(
        &self,
        uvplane: ArrayView2<c64>,
        errors: ArrayView1<f64>,
        error_type: ErrorType,
    ) -> Array2<c64> {
        let baselines = self.baselines();
        let freqs = self.freqs();
        let mut out = Array2::zeros(uvplane.dim());
        for ((i_freq, i_bl), vis) in out.indexed_iter_mut() {
            let pairs = baselines.group_pairs(i_bl);
            let (sum, count) = match error_type {
                ErrorType::Timing => {
                    let to_phase = freqs[i_freq] * MHZ_TO_HZ * TAU;
                    pairs.fold((c64::default(), 0), |(sum, count), (d1, d2)| {
                        let phase = (errors[d2] - errors[d1]) * to_phase;
                        (sum + c64::cis(phase), count + 1)
                    })
                }
                ErrorType::Amplitude => pairs.fold((c64::default(), 0), |(sum, count), (d1, d2)| {
                    let gain = (1.0 + errors[d1]) * (1.0 + errors[d2]);
                    (sum + c64::new(gain, 0.0), count + 1)
                }),
            };
            *vis = sum / count as f64 * uvplane[[i_freq, i_bl]];
        }
        out
    }

    /// Corrupt a uv plane, optionally filter out the foregrounds with the global
    /// basis, then grid it back into a map (`nfreq` × `npix`).
    pub fn get_obs_rmap(
        &self,
        uvplane: ArrayView2<c64>,
        params: &ObsParams,
    ) -> Result<Array2<f64>, TelescopeError> {
        let unfiltered = ObsParams {
            filter_fg: false,
            ..*params
        };
        let corrupted = match self.get_obs_uvplane(uvplane, &unfiltered)? {
            ObsUvPlane::Unfiltered(c) | ObsUvPlane::Filtered { corrupted: c, .. } => c,
        };
        let uvplane_obs = if params.filter_fg {
            self.filter_fg(corrupted.view(), self.config().fg_scale)?
        } else {
            corrupted
        };
        self.uvplane_to_rmap(uvplane_obs.view())
    }
}

/// Get `L` such that `L Lᵀ` is the covariance. Negative eigenvalues (the
/// correlation model isn't guaranteed to be positive semi-definite) are
/// clamped to zero.
fn correlated_factor(cov: DMatrix<f64>) -> DMatrix<f64> {
    let n = cov.nrows();
    let eigen = SymmetricEigen::new(cov);
    let max = eigen.eigenvalues.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let min = eigen.eigenvalues.iter().fold(f64::INFINITY, |acc, &v| acc.min(v));
    if min < -1e-10 * max {
        warn!(
            "The error covariance is not positive semi-definite (smallest eigenvalue {min:e}, largest {max:e}); clamping negative eigenvalues to zero"
        );
    } else {
        debug!("Error covariance eigenvalues span {min:e} to {max:e}");
    }
    let sqrt_vals = DVector::from_fn(n, |i, _| eigen.eigenvalues[i].max(0.0).sqrt());
    let mut factor = eigen.eigenvectors;
    for (mut col, &s) in factor.column_iter_mut().zip(sqrt_vals.iter()) {
        col *= s;
    }
    factor
}
