// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Power spectra along the line of sight.

The frequency axis is split into chunks; each chunk is windowed, zero-padded
and Fourier transformed along frequency. The power in the non-negative delay
modes is then summed into coarser bins along both axes. Frequencies are turned
into comoving wavenumbers with a [`ComovingDistance`].
 */

mod distance;
mod error;
#[cfg(test)]
mod tests;

pub use distance::{freq2distance, freq2z, ComovingDistance, FlatLambdaCdm};
pub use error::PowerSpectrumError;

use std::f64::consts::{PI, TAU};

use log::trace;
use ndarray::prelude::*;
use rustfft::FftPlanner;

use crate::{
    c64,
    corruption::{ObsParams, ObsUvPlane},
    telescope::{Telescope1D, TelescopeError},
};

/// The taper applied to each frequency chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Window {
    #[default]
    Blackman,

    /// No taper.
    None,
}

impl Window {
    /// The `n` window weights.
    pub fn weights(self, n: usize) -> Array1<f64> {
        match self {
            Window::Blackman => blackman_window(n),
            Window::None => Array1::ones(n),
        }
    }
}

/// The symmetric Blackman window, `0.42 - 0.5 cos(2πi/(n-1)) + 0.08 cos(4πi/(n-1))`.
fn blackman_window(n: usize) -> Array1<f64> {
    if n == 1 {
        return Array1::ones(1);
    }
    Array1::from_shape_fn(n, |i| {
        let a = 2.0 * PI * i as f64 / (n as f64 - 1.0);
        0.42 - 0.5 * a.cos() + 0.08 * (2.0 * a).cos()
    })
}

/// How to make a power spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsConfig {
    /// The number of frequency chunks, each with its own spectrum.
    pub n_freq_chunks: usize,

    /// How many delay modes go into each bin.
    pub m_freq: usize,

    /// How many columns (pixels or baselines) go into each bin.
    pub m_cols: usize,

    /// Each chunk of `n` frequencies is padded with `n * padding` zeros.
    pub padding: usize,

    pub window: Window,
}

impl Default for PsConfig {
    fn default() -> Self {
        PsConfig {
            n_freq_chunks: 4,
            m_freq: 2,
            m_cols: 2,
            padding: 1,
            window: Window::Blackman,
        }
    }
}

/// A binned power spectrum for each frequency chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    /// One `n_row_bins` × `n_col_bins` array per chunk.
    pub chunks: Vec<Array2<f64>>,

    /// The wavenumber of each row bin, per chunk \[h/Mpc\].
    pub k_modes: Vec<Array1<f64>>,

    /// The mean column coordinate of each column bin: sin(θ) for maps, the
    /// baseline length \[metres\] for uv planes.
    pub columns: Array1<f64>,
}

/// Map residuals from [`Telescope1D::rmap_residuals`].
#[derive(Debug, Clone, PartialEq)]
pub struct RmapResiduals {
    /// `(with_error - no_error) / max(no_error)`, where the maximum is taken
    /// over each group of frequencies.
    pub residuals: Array2<f64>,

    /// The mean frequency of each complete group \[MHz\].
    pub freqs: Array1<f64>,
}

/// Sizes shared by every chunk.
struct ChunkLayout {
    /// Frequencies per chunk.
    n: usize,
    /// Transform length.
    len: usize,
    /// Non-negative delay rows.
    n_rows: usize,
    n_row_bins: usize,
    n_col_bins: usize,
}

impl ChunkLayout {
    fn new(
        nfreq: usize,
        n_cols: usize,
        config: &PsConfig,
    ) -> Result<ChunkLayout, PowerSpectrumError> {
        if config.n_freq_chunks == 0 {
            return Err(PowerSpectrumError::NoChunks);
        }
        let n = nfreq / config.n_freq_chunks;
        if n == 0 {
            return Err(PowerSpectrumError::TooManyChunks {
                chunks: config.n_freq_chunks,
                nfreq,
            });
        }
        if config.m_freq == 0 || config.m_cols == 0 {
            return Err(PowerSpectrumError::ZeroBinFactor {
                m_freq: config.m_freq,
                m_cols: config.m_cols,
            });
        }
        let len = n * (1 + config.padding);
        let n_rows = len / 2 + 1;
        let n_row_bins = n_rows / config.m_freq;
        let n_col_bins = n_cols / config.m_cols;
        if n_row_bins == 0 || n_col_bins == 0 {
            return Err(PowerSpectrumError::NoBins {
                n_rows,
                n_cols,
                m_freq: config.m_freq,
                m_cols: config.m_cols,
            });
        }
        Ok(ChunkLayout {
            n,
            len,
            n_rows,
            n_row_bins,
            n_col_bins,
        })
    }
}

/// Transform the real part of each column of every chunk along frequency.
/// Returns, per chunk, the `n_rows` × columns non-negative delay modes.
fn chunk_transforms(
    data: ArrayView2<c64>,
    layout: &ChunkLayout,
    config: &PsConfig,
) -> Vec<Array2<c64>> {
    let fft = FftPlanner::new().plan_fft_forward(layout.len);
    let window = config.window.weights(layout.n);
    (0..config.n_freq_chunks)
        .map(|i_chunk| {
            let chunk = data.slice(s![i_chunk * layout.n..(i_chunk + 1) * layout.n, ..]);
            let mut out = Array2::zeros((layout.n_rows, data.ncols()));
            let mut buffer = vec![c64::default(); layout.len];
            for (column, mut modes) in chunk.columns().into_iter().zip(out.columns_mut()) {
                buffer.iter_mut().for_each(|b| *b = c64::default());
                buffer
                    .iter_mut()
                    .zip(column.iter().zip(window.iter()))
                    .for_each(|(b, (&v, &w))| *b = c64::new(v.re * w, 0.0));
                fft.process(&mut buffer);
                modes
                    .iter_mut()
                    .zip(buffer.iter())
                    .for_each(|(m, &b)| *m = b);
            }
            out
        })
        .collect()
}

/// Sum `m_freq` × `m_cols` boxes, discarding any partial boxes at the ends.
fn bin(ps: ArrayView2<f64>, layout: &ChunkLayout, config: &PsConfig) -> Array2<f64> {
    Array2::from_shape_fn((layout.n_row_bins, layout.n_col_bins), |(r, c)| {
        ps.slice(s![
            r * config.m_freq..(r + 1) * config.m_freq,
            c * config.m_cols..(c + 1) * config.m_cols
        ])
        .sum()
    })
}

fn check_shape(expected: (usize, usize), got: (usize, usize)) -> Result<(), PowerSpectrumError> {
    if expected != got {
        return Err(PowerSpectrumError::Shape { expected, got });
    }
    Ok(())
}

/// The mean of each complete group of `m` values.
fn bin_mean(values: ArrayView1<f64>, m: usize, n_bins: usize) -> Array1<f64> {
    Array1::from_shape_fn(n_bins, |i| {
        values.slice(s![i * m..(i + 1) * m]).sum() / m as f64
    })
}

impl Telescope1D {
    fn power_spectrum<D: ComovingDistance + ?Sized>(
        &self,
        data: ArrayView2<c64>,
        cross: Option<ArrayView2<c64>>,
        column_coords: ArrayView1<f64>,
        config: &PsConfig,
        distance: &D,
    ) -> Result<PowerSpectrum, PowerSpectrumError> {
        let layout = ChunkLayout::new(self.nfreq(), data.ncols(), config)?;
        trace!(
            "Power spectrum: {} chunks of {} frequencies, {} delay rows",
            config.n_freq_chunks,
            layout.n,
            layout.n_rows
        );

        let ffts = chunk_transforms(data, &layout, config);
        let cross_ffts = cross.map(|c| chunk_transforms(c, &layout, config));
        let chunks: Vec<Array2<f64>> = match cross_ffts {
            None => ffts
                .iter()
                .map(|f| bin(f.mapv(|v| v.norm_sqr()).view(), &layout, config))
                .collect(),
            Some(cross_ffts) => ffts
                .iter()
                .zip(cross_ffts.iter())
                .map(|(f1, f2)| {
                    let ps = Array2::from_shape_fn(f1.dim(), |ij| (f1[ij] * f2[ij].conj()).re);
                    bin(ps.view(), &layout, config)
                })
                .collect(),
        };

        let freqs = self.freqs();
        let k_modes = (0..config.n_freq_chunks)
            .map(|i_chunk| {
                let freq1 = freqs[i_chunk * layout.n];
                let freq2 = freqs[(i_chunk + 1) * layout.n - 1];
                let dist = distance.distance(freq1, freq2);
                if !(dist.is_finite() && dist > 0.0) {
                    return Err(PowerSpectrumError::BadDistance {
                        freq1,
                        freq2,
                        distance: dist,
                    });
                }
                let k0 = TAU / dist / (1 + config.padding) as f64;
                let k = Array1::from_shape_fn(layout.n_row_bins * config.m_freq, |i| i as f64 * k0);
                Ok(bin_mean(k.view(), config.m_freq, layout.n_row_bins))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PowerSpectrum {
            chunks,
            k_modes,
            columns: bin_mean(column_coords, config.m_cols, layout.n_col_bins),
        })
    }

    /// The power spectrum of a map (`nfreq` × `npix`), with the default
    /// cosmology.
    pub fn get_rmap_ps(
        &self,
        rmap: ArrayView2<f64>,
        config: &PsConfig,
    ) -> Result<PowerSpectrum, PowerSpectrumError> {
        self.get_rmap_ps_with(rmap, config, &FlatLambdaCdm::PLANCK15)
    }

    /// The power spectrum of a map (`nfreq` × `npix`).
    pub fn get_rmap_ps_with<D: ComovingDistance + ?Sized>(
        &self,
        rmap: ArrayView2<f64>,
        config: &PsConfig,
        distance: &D,
    ) -> Result<PowerSpectrum, PowerSpectrumError> {
        check_shape((self.nfreq(), self.npix()), rmap.dim())?;
        let data = rmap.mapv(|v| c64::new(v, 0.0));
        self.power_spectrum(data.view(), None, self.alpha(), config, distance)
    }

    /// The power spectrum of a uv plane, with the default cosmology. If
    /// `uvplane2` is given, this is the cross-spectrum `Re(F₁ F₂*)`. Only the
    /// real parts of the visibilities are transformed.
    pub fn get_uvplane_ps(
        &self,
        uvplane: ArrayView2<c64>,
        uvplane2: Option<ArrayView2<c64>>,
        config: &PsConfig,
    ) -> Result<PowerSpectrum, PowerSpectrumError> {
        self.get_uvplane_ps_with(uvplane, uvplane2, config, &FlatLambdaCdm::PLANCK15)
    }

    /// The power spectrum (or cross-spectrum) of uv planes.
    pub fn get_uvplane_ps_with<D: ComovingDistance + ?Sized>(
        &self,
        uvplane: ArrayView2<c64>,
        uvplane2: Option<ArrayView2<c64>>,
        config: &PsConfig,
        distance: &D,
    ) -> Result<PowerSpectrum, PowerSpectrumError> {
        let shape = self.uvplane_shape();
        check_shape(shape, uvplane.dim())?;
        if let Some(uvplane2) = uvplane2 {
            check_shape(shape, uvplane2.dim())?;
        }
        let lengths = ArrayView1::from(self.unique_baseline_lengths());
        self.power_spectrum(uvplane, uvplane2, lengths, config, distance)
    }

    /// The comoving distance \[Mpc/h\] between two 21 cm frequencies in the
    /// default cosmology.
    pub fn freq2distance(&self, freq1_mhz: f64, freq2_mhz: f64) -> f64 {
        freq2distance(freq1_mhz, freq2_mhz)
    }

    /// The delay power of `nreal` frequency-independent uniform skies
    /// (brightness in `[0, 1)`, seeded by the realisation number), summed.
    ///
    /// The real part of each unique baseline's spectrum is padded with
    /// `nfreq` zeros before transforming, giving `nfreq + 1` non-negative
    /// delay rows. When
    /// `params.error_sigma` is positive, each realisation is corrupted first
    /// (with the realisation number as the seed) and, if `params.filter_fg`
    /// is set, filtered with the global basis.
    pub fn get_wedge(
        &self,
        nreal: usize,
        params: &ObsParams,
    ) -> Result<Array2<f64>, TelescopeError> {
        let (nfreq, nb) = self.uvplane_shape();
        let len = 2 * nfreq;
        let fft = FftPlanner::new().plan_fft_forward(len);
        let mut ps = Array2::zeros((nfreq + 1, nb));
        let mut buffer = vec![c64::default(); len];
        for real in 0..nreal {
            let seed = real as u64;
            let sky = self.get_uniform_sky(1.0, seed)?;
            let mut uvplane = self.observe_image(sky.view())?;
            if params.error_sigma > 0.0 {
                let obs = self.get_obs_uvplane(uvplane.view(), &ObsParams { seed, ..*params })?;
                uvplane = match obs {
                    ObsUvPlane::Unfiltered(corrupted) => corrupted,
                    ObsUvPlane::Filtered { filtered, .. } => filtered,
                };
            }

            for (column, mut out) in uvplane.columns().into_iter().zip(ps.columns_mut()) {
                buffer.iter_mut().for_each(|b| *b = c64::default());
                buffer
                    .iter_mut()
                    .zip(column.iter())
                    .for_each(|(b, &v)| *b = c64::new(v.re, 0.0));
                fft.process(&mut buffer);
                out.iter_mut()
                    .zip(buffer.iter())
                    .for_each(|(o, b)| *o += b.norm_sqr());
            }
        }
        Ok(ps)
    }

    /// Normalise the difference between two maps (`nfreq` × `npix`) by the
    /// maximum of the error-free map over each group of `n` frequencies. A
    /// trailing partial group is normalised by its own maximum.
    pub fn rmap_residuals(
        &self,
        rmap_no_error: ArrayView2<f64>,
        rmap_with_error: ArrayView2<f64>,
        n: usize,
    ) -> Result<RmapResiduals, PowerSpectrumError> {
        let shape = (self.nfreq(), self.npix());
        check_shape(shape, rmap_no_error.dim())?;
        check_shape(shape, rmap_with_error.dim())?;
        if n == 0 || n > self.nfreq() {
            return Err(PowerSpectrumError::BadResidualBinning {
                n,
                nfreq: self.nfreq(),
            });
        }

        let mut residuals = &rmap_with_error - &rmap_no_error;
        for (no_error, mut residual) in rmap_no_error
            .axis_chunks_iter(Axis(0), n)
            .zip(residuals.axis_chunks_iter_mut(Axis(0), n))
        {
            let max = no_error.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            residual /= max;
        }

        let freqs = self.freqs();
        let num_groups = self.nfreq() / n;
        Ok(RmapResiduals {
            residuals,
            freqs: bin_mean(freqs, n, num_groups),
        })
    }
}
