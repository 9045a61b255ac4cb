// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Primary-beam code.

use std::f64::consts::{LN_2, TAU};

use ndarray::prelude::*;

use super::{Telescope1D, TelescopeError};
use crate::{
    c64,
    constants::{MHZ_TO_HZ, VEL_C},
    executor::Executor,
    transform::UvTransform,
};

/// Convert a frequency \[MHz\] to a wavelength \[metres\].
pub fn freq2lam(freq_mhz: f64) -> f64 {
    VEL_C / (freq_mhz * MHZ_TO_HZ)
}

/// A single dish's beam: the transform of a top hat in uv space that is one
/// (half) dish wide.
fn primary_beam(
    transform: &UvTransform,
    ddish: f64,
    freq_mhz: f64,
) -> Result<Array1<f64>, TelescopeError> {
    let mut uv = transform.empty_uv();
    let width = transform.dol2ndx(ddish / freq2lam(freq_mhz) / 2.0) as usize;
    let width = width.min(uv.len());
    uv.slice_mut(s![..width]).fill(c64::new(1.0, 0.0));
    transform.uv2image(uv.view())
}

/// The beam table: for every frequency, `|beam|² / cos(α)`.
pub(super) fn calc_p2fac(
    transform: &UvTransform,
    freqs: &Array1<f64>,
    alpha: &Array1<f64>,
    ddish: f64,
    executor: Executor,
) -> Result<Array2<f64>, TelescopeError> {
    let rows = executor.map_ordered(freqs.len(), |i_freq| {
        primary_beam(transform, ddish, freqs[i_freq])
    });
    let mut p2fac = Array2::zeros((freqs.len(), alpha.len()));
    for (mut out, beam) in p2fac.outer_iter_mut().zip(rows) {
        let beam = beam?;
        out.iter_mut()
            .zip(beam.iter())
            .zip(alpha.iter())
            .for_each(|((o, &b), &a)| *o = b * b / a.cos());
    }
    Ok(p2fac)
}

impl Telescope1D {
    /// The beam of a single dish at `freq_mhz`, one value per image pixel.
    pub fn primary_beam_1(&self, freq_mhz: f64) -> Result<Array1<f64>, TelescopeError> {
        primary_beam(&self.transform, self.config.ddish, freq_mhz)
    }

    /// The beam table (`nfreq` × `npix`) applied to every sky before it is
    /// observed.
    pub fn get_p2fac(&self) -> ArrayView2<f64> {
        self.p2fac.view()
    }

    /// What the beam would be if the whole array were a single dish: a
    /// Gaussian in θ whose FWHM is λ over the array's extent.
    pub fn beam_no_interferometry(&self, freq_mhz: f64) -> Result<Array1<f64>, TelescopeError> {
        let size = self.layout.extent();
        if size <= 0.0 {
            return Err(TelescopeError::NoExtent);
        }
        let fwhm = freq2lam(freq_mhz) / size;
        let sigma = fwhm / (2.0 * (2.0 * LN_2).sqrt());
        let norm = 1.0 / (sigma * TAU.sqrt());
        Ok(self.alpha.mapv(|a| {
            let x = a.asin() / sigma;
            norm * (-0.5 * x * x).exp()
        }))
    }
}
