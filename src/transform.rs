// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Transforms between 1D sky images and their visibility functions ("uv").
//!
//! An image has `npix_fft + 1` pixels spanning `sin(θ)` from -1 to 1. It is
//! zero-padded to `nfft = npix_fft * npad` samples before being transformed,
//! which oversamples the uv axis by `npad`. The uv array holds the
//! `nfft / 2 + 1` non-negative spatial frequencies.

use std::sync::Arc;

use ndarray::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::{c64, telescope::TelescopeError};

/// Forward and inverse transforms between images and uv arrays. The FFT plans
/// are made once and can be shared between threads.
pub struct UvTransform {
    npix_fft: usize,
    npad: usize,
    nfft: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl UvTransform {
    /// Plan the transforms. `npix_fft` is expected to be even and both
    /// arguments non-zero; [`crate::Telescope1D::new`] checks this.
    pub fn new(npix_fft: usize, npad: usize) -> UvTransform {
        let nfft = npix_fft * npad;
        let mut planner = FftPlanner::new();
        UvTransform {
            npix_fft,
            npad,
            nfft,
            forward: planner.plan_fft_forward(nfft),
            inverse: planner.plan_fft_inverse(nfft),
        }
    }

    /// The number of image pixels.
    pub fn npix(&self) -> usize {
        self.npix_fft + 1
    }

    /// The length of the zero-padded transform.
    pub fn nfft(&self) -> usize {
        self.nfft
    }

    /// The number of uv samples.
    pub fn uv_len(&self) -> usize {
        self.nfft / 2 + 1
    }

    pub fn empty_uv(&self) -> Array1<c64> {
        Array1::zeros(self.uv_len())
    }

    pub fn empty_image(&self) -> Array1<f64> {
        Array1::zeros(self.npix())
    }

    /// Convert from pixel space to uv space.
    ///
    /// The centre pixel of the image lands at the start of the padded buffer,
    /// the image's second half follows it, and the first half wraps around to
    /// the end of the buffer. This makes uv index 0 zero spatial frequency.
    pub fn image2uv(&self, image: ArrayView1<f64>) -> Result<Array1<c64>, TelescopeError> {
        if image.len() != self.npix() {
            return Err(TelescopeError::ImageLength {
                expected: self.npix(),
                got: image.len(),
            });
        }
        let half = self.npix_fft / 2;
        let mut buffer = vec![c64::default(); self.nfft];
        buffer[..=half]
            .iter_mut()
            .zip(image.slice(s![half..]).iter())
            .for_each(|(b, &i)| *b = c64::new(i, 0.0));
        buffer[self.nfft - half..]
            .iter_mut()
            .zip(image.slice(s![..half]).iter())
            .for_each(|(b, &i)| *b = c64::new(i, 0.0));

        self.forward.process(&mut buffer);
        buffer.truncate(self.uv_len());
        Ok(Array1::from(buffer))
    }

    /// Convert from uv space to pixel space. This undoes [`Self::image2uv`].
    pub fn uv2image(&self, uv: ArrayView1<c64>) -> Result<Array1<f64>, TelescopeError> {
        if uv.len() != self.uv_len() {
            return Err(TelescopeError::UvLength {
                expected: self.uv_len(),
                got: uv.len(),
            });
        }
        // Rebuild the Hermitian spectrum of a real signal. The imaginary parts
        // of the zero and Nyquist terms only ever contribute to the imaginary
        // part of the output, which is discarded.
        let mut buffer = vec![c64::default(); self.nfft];
        for (k, &v) in uv.iter().enumerate() {
            buffer[k] = v;
            if k > 0 && k < self.nfft - k {
                buffer[self.nfft - k] = v.conj();
            }
        }
        self.inverse.process(&mut buffer);

        let norm = self.nfft as f64;
        let half = self.npix_fft / 2;
        let image = buffer[self.nfft - half..]
            .iter()
            .chain(buffer[..=half].iter())
            .map(|b| b.re / norm)
            .collect::<Vec<_>>();
        Ok(Array1::from(image))
    }

    /// Get the (fractional) uv index of a baseline length in wavelengths.
    pub fn dol2ndx(&self, dol: f64) -> f64 {
        dol * self.npad as f64 * 2.0
    }
}

/// Sample `uv` at fractional `indices` with linear interpolation between the
/// bracketing samples.
///
/// Indices whose ceiling falls beyond the end of `uv` are out of band; their
/// output is left at zero.
pub fn uv2uvplane(
    uv: ArrayView1<c64>,
    indices: ArrayView1<f64>,
) -> Result<Array1<c64>, TelescopeError> {
    let mut uvplane = Array1::zeros(indices.len());
    for (out, &index) in uvplane.iter_mut().zip(indices.iter()) {
        if !index.is_finite() || index < 0.0 {
            return Err(TelescopeError::BadUvIndex(index));
        }
        let upper = index.ceil() as usize;
        if upper < uv.len() {
            let lower = index.floor() as usize;
            let frac = index - index.floor();
            let (v1, v2) = (uv[lower], uv[upper]);
            *out = (v2 - v1) * frac + v1;
        }
    }
    Ok(uvplane)
}
