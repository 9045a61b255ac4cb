// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Foreground filtering.

Foregrounds are taken to be frequency independent. Every direction on the sky
contributes a known visibility pattern across frequency and baseline; the sum
of the outer products of these patterns is a Hermitian covariance whose
dominant eigenvectors span the foreground subspace. Filtering projects those
eigenvectors out of a uv plane.
 */


use std::f64::consts::TAU;
use std::sync::Arc;

use log::debug;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::prelude::*;
use parking_lot::RwLock;

use crate::{
    c64,
    telescope::{Telescope1D, TelescopeError},
};

/// The eigendecomposition of a Hermitian foreground covariance. Eigenvalues
/// are ascending and `eigenvectors` holds one eigenvector per column.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBasis {
    pub eigenvalues: Array1<f64>,
    pub eigenvectors: Array2<c64>,
}

impl FilterBasis {
    /// The number of eigenpairs.
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Remove every mode whose eigenvalue magnitude exceeds `scale` times the
    /// largest eigenvalue magnitude from `out`. Each mode is removed along
    /// both the eigenvector and its conjugate. Returns the number of modes
    /// removed.
    pub fn project_out(&self, mut out: ArrayViewMut1<c64>, scale: f64) -> usize {
        let max = self
            .eigenvalues
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let threshold = max * scale;

        let mut count = 0;
        for (&val, vec) in self.eigenvalues.iter().zip(self.eigenvectors.columns()) {
            if val.abs() > threshold {
                let x: c64 = out
                    .iter()
                    .zip(vec.iter())
                    .map(|(&o, &v)| o * v.conj())
                    .sum();
                out.zip_mut_with(&vec, |o, &v| *o -= x * v);
                let x: c64 = out.iter().zip(vec.iter()).map(|(&o, &v)| o * v).sum();
                out.zip_mut_with(&vec, |o, &v| *o -= x * v.conj());
                count += 1;
            }
        }
        count
    }
}

/// Eigendecompose a Hermitian matrix. Only the lower triangle of `matrix` is
/// read.
///
/// The phase of each eigenvector is fixed so that its largest-magnitude
/// component is real and positive, which makes the result reproducible.
pub fn decompose_filtering(matrix: ArrayView2<c64>) -> Result<FilterBasis, TelescopeError> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(TelescopeError::MatrixShape {
            expected: rows,
            got: (rows, cols),
        });
    }
    let n = rows;
    if n == 0 {
        return Ok(FilterBasis {
            eigenvalues: Array1::zeros(0),
            eigenvectors: Array2::zeros((0, 0)),
        });
    }

    let eigen = SymmetricEigen::new(DMatrix::from_fn(n, n, |i, j| matrix[[i, j]]));
    let mut order = (0..n).collect::<Vec<_>>();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let eigenvalues = order.iter().map(|&k| eigen.eigenvalues[k]).collect();
    let mut eigenvectors = Array2::zeros((n, n));
    for (mut out, &k) in eigenvectors.columns_mut().into_iter().zip(order.iter()) {
        let column = eigen.eigenvectors.column(k);
        let pivot = column.iter().fold(c64::default(), |acc, &v| {
            if v.norm_sqr() > acc.norm_sqr() {
                v
            } else {
                acc
            }
        });
        let phase = if pivot.norm() > 0.0 {
            pivot.conj() / pivot.norm()
        } else {
            c64::new(1.0, 0.0)
        };
        out.iter_mut()
            .zip(column.iter())
            .for_each(|(o, &v)| *o = v * phase);
    }

    Ok(FilterBasis {
        eigenvalues,
        eigenvectors,
    })
}

/// Memoised filter bases. The global basis and the per-baseline bases are
/// computed on first use.
#[derive(Default)]
pub(crate) struct FilterCache {
    global: RwLock<Option<Arc<FilterBasis>>>,
    per_baseline: RwLock<Option<Arc<Vec<FilterBasis>>>>,
}

impl FilterCache {
    fn clear(&self) {
        *self.global.write() = None;
        *self.per_baseline.write() = None;
    }
}

impl Telescope1D {
    /// The visibility pattern of every `step`-th direction, one column per
    /// direction. Rows are frequency-major: row `f * nb + b` is frequency `f`
    /// and unique baseline `b`.
    fn fg_patterns(&self, step: usize) -> Array2<c64> {
        let (nfreq, nb) = self.uvplane_shape();
        let step = step.max(1);
        let alpha = self.alpha();
        let dol = self.dol();
        let p2fac = self.get_p2fac();
        let num_directions = alpha.len().div_ceil(step);
        Array2::from_shape_fn((nfreq * nb, num_directions), |(row, col)| {
            let (i_freq, i_bl) = (row / nb, row % nb);
            let i_alpha = col * step;
            c64::cis(-TAU * dol[[i_freq, i_bl]] * alpha[i_alpha]) * p2fac[[i_freq, i_alpha]]
        })
    }

    /// The foreground covariance over the whole uv plane, summing every
    /// `step`-th direction. The matrix is `(nfreq * nb)` square and
    /// frequency-major.
    pub fn get_fg_filtering_matrix(&self, step: usize) -> Array2<c64> {
        let patterns = self.fg_patterns(step);
        patterns.dot(&patterns.t().mapv(|v| v.conj()))
    }

    /// Get the global filter basis, computing and caching it if necessary.
    pub fn filter_basis(&self) -> Result<Arc<FilterBasis>, TelescopeError> {
        {
            let cache = self.fg_cache.global.read();
            if let Some(basis) = cache.as_ref() {
                return Ok(Arc::clone(basis));
            }
        }

        debug!("Caching the foreground filter basis");
        let basis = Arc::new(self.calc_global_basis()?);
        *self.fg_cache.global.write() = Some(Arc::clone(&basis));
        Ok(basis)
    }

    /// Get the per-baseline filter bases (one per unique baseline), computing
    /// and caching them if necessary.
    pub fn per_baseline_filter_bases(&self) -> Result<Arc<Vec<FilterBasis>>, TelescopeError> {
        {
            let cache = self.fg_cache.per_baseline.read();
            if let Some(bases) = cache.as_ref() {
                return Ok(Arc::clone(bases));
            }
        }

        debug!("Caching the per-baseline foreground filter bases");
        let bases = Arc::new(self.calc_per_baseline_bases()?);
        *self.fg_cache.per_baseline.write() = Some(Arc::clone(&bases));
        Ok(bases)
    }

    fn calc_global_basis(&self) -> Result<FilterBasis, TelescopeError> {
        decompose_filtering(self.get_fg_filtering_matrix(self.config().fg_step).view())
    }

    fn calc_per_baseline_bases(&self) -> Result<Vec<FilterBasis>, TelescopeError> {
        let (_, nb) = self.uvplane_shape();
        let patterns = self.fg_patterns(self.config().fg_step);
        (0..nb)
            .map(|i_bl| {
                // Every nb-th row starting at this baseline is its
                // frequency-by-frequency block.
                let block = patterns.slice(s![i_bl..;nb, ..]);
                let matrix = block.dot(&block.t().mapv(|v| v.conj()));
                decompose_filtering(matrix.view())
            })
            .collect()
    }

    /// Drop the cached filter bases. They are recomputed on next use.
    pub fn empty_cache(&self) {
        self.fg_cache.clear();
    }

    /// Recompute and cache both the global and the per-baseline filter bases
    /// now, rather than on first use.
    pub fn recompute_filter_bases(&self) -> Result<(), TelescopeError> {
        let global = Arc::new(self.calc_global_basis()?);
        let per_baseline = Arc::new(self.calc_per_baseline_bases()?);
        *self.fg_cache.global.write() = Some(global);
        *self.fg_cache.per_baseline.write() = Some(per_baseline);
        Ok(())
    }

    /// Filter foregrounds out of a uv plane using the cached global basis.
    /// `scale` sets how many modes are removed (see
    /// [`FilterBasis::project_out`]).
    pub fn filter_fg(
        &self,
        uvplane: ArrayView2<c64>,
        scale: f64,
    ) -> Result<Array2<c64>, TelescopeError> {
        self.check_uvplane_shape(uvplane)?;
        if uvplane.is_empty() {
            return Ok(uvplane.to_owned());
        }
        let basis = self.filter_basis()?;
        Ok(project_flat(&basis, uvplane, scale))
    }

    /// The same as [`Self::filter_fg`], but decomposing the supplied
    /// foreground covariance instead of the cached one.
    pub fn filter_fg_with_matrix(
        &self,
        uvplane: ArrayView2<c64>,
        matrix: ArrayView2<c64>,
        scale: f64,
    ) -> Result<Array2<c64>, TelescopeError> {
        self.check_uvplane_shape(uvplane)?;
        let n = uvplane.len();
        if matrix.dim() != (n, n) {
            return Err(TelescopeError::MatrixShape {
                expected: n,
                got: matrix.dim(),
            });
        }
        if uvplane.is_empty() {
            return Ok(uvplane.to_owned());
        }
        let basis = decompose_filtering(matrix)?;
        Ok(project_flat(&basis, uvplane, scale))
    }

    /// Filter foregrounds out of each unique baseline's column of the uv
    /// plane independently.
    pub fn filter_fg_per_baseline(
        &self,
        uvplane: ArrayView2<c64>,
        scale: f64,
    ) -> Result<Array2<c64>, TelescopeError> {
        self.check_uvplane_shape(uvplane)?;
        let mut out = uvplane.to_owned();
        if uvplane.is_empty() {
            return Ok(out);
        }
        let bases = self.per_baseline_filter_bases()?;
        for (i_bl, (basis, column)) in bases.iter().zip(out.columns_mut()).enumerate() {
            let count = basis.project_out(column, scale);
            debug!("Filtered {count} modes for baseline {i_bl}");
        }
        Ok(out)
    }
}

/// Flatten the uv plane (frequency-major), filter it and restore its shape.
fn project_flat(basis: &FilterBasis, uvplane: ArrayView2<c64>, scale: f64) -> Array2<c64> {
    let nb = uvplane.ncols();
    let mut flat: Array1<c64> = uvplane.iter().copied().collect();
    let count = basis.project_out(flat.view_mut(), scale);
    debug!("Filtered {count} modes");
    Array2::from_shape_fn(uvplane.dim(), |(i, j)| flat[i * nb + j])
}
