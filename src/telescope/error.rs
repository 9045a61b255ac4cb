// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with the telescope.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitTelescopeError {
    #[error("The number of dishes must be at least 1")]
    NoDishes,

    #[error("The dish diameter must be positive and finite (got {0} m)")]
    BadDishDiameter(f64),

    #[error("npix_fft must be a non-zero, even number (got {0})")]
    BadNpixFft(usize),

    #[error("npad must be at least 1")]
    ZeroNpad,

    #[error("The number of frequencies must be at least 1")]
    NoFreqs,

    #[error("The frequency band must satisfy 0 < minfreq < maxfreq (got {min} MHz to {max} MHz)")]
    BadFreqBand { min: f64, max: f64 },

    #[error("The angular stride used for the foreground matrix must be at least 1")]
    ZeroFgStep,

    #[error("The foreground filter scale must be non-negative and finite (got {0})")]
    BadFgScale(f64),

    #[error(transparent)]
    Telescope(#[from] TelescopeError),
}

#[derive(Error, Debug)]
pub enum TelescopeError {
    #[error("Expected an image with {expected} pixels, but got {got}")]
    ImageLength { expected: usize, got: usize },

    #[error("Expected an image with shape {expected:?}, but got {got:?}")]
    ImageShape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Expected {expected} uv samples, but got {got}")]
    UvLength { expected: usize, got: usize },

    #[error("Expected a uv plane with shape {expected:?}, but got {got:?}")]
    UvPlaneShape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Got a uv index of {0}, but uv indices must be finite and non-negative")]
    BadUvIndex(f64),

    #[error("Pixel index {index} is out of range for an image with {npix} pixels")]
    PixelOutOfRange { index: usize, npix: usize },

    #[error("Expected a square matrix with {expected} rows, but got shape {got:?}")]
    MatrixShape {
        expected: usize,
        got: (usize, usize),
    },

    #[error("The dish array has zero extent; the single-dish beam is undefined")]
    NoExtent,

    #[error("Error sigma must be non-negative and finite (got {0})")]
    BadErrorSigma(f64),

    #[error("Invalid sky parameter {name} = {value}")]
    BadSkyParameter { name: &'static str, value: f64 },

    #[error("The error correlation length must be positive and finite (got {0} m)")]
    BadCorrelationLength(f64),
}
