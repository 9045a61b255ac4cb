// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with power spectra.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PowerSpectrumError {
    #[error("At least one frequency chunk is required")]
    NoChunks,

    #[error("Cannot split {nfreq} frequencies into {chunks} chunks")]
    TooManyChunks { chunks: usize, nfreq: usize },

    #[error("Binning factors must be at least 1 (got m_freq = {m_freq}, m_cols = {m_cols})")]
    ZeroBinFactor { m_freq: usize, m_cols: usize },

    #[error("Binning {n_rows} x {n_cols} by {m_freq} x {m_cols} leaves no bins")]
    NoBins {
        n_rows: usize,
        n_cols: usize,
        m_freq: usize,
        m_cols: usize,
    },

    #[error("Expected data with shape {expected:?}, but got {got:?}")]
    Shape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("The comoving distance between {freq1} MHz and {freq2} MHz is {distance} Mpc/h; it must be positive and finite")]
    BadDistance {
        freq1: f64,
        freq2: f64,
        distance: f64,
    },

    #[error("Cannot bin {nfreq} frequencies in groups of {n}")]
    BadResidualBinning { n: usize, nfreq: usize },
}
