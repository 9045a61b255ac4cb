// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The 1D telescope: dish geometry, frequencies, the primary beam and the
//! observation of sky images.

mod beam;
mod error;
#[cfg(test)]
mod tests;

pub use beam::freq2lam;
pub use error::{InitTelescopeError, TelescopeError};

use std::f64::consts::TAU;

use log::debug;
use ndarray::prelude::*;
use rand::SeedableRng;

use crate::{
    c64,
    constants::DEFAULT_FG_SCALE,
    executor::Executor,
    fg_filter::FilterCache,
    geometry::{Baselines, DishLayout},
    transform::{uv2uvplane, UvTransform},
    SimRng,
};

/// Everything needed to reproduce a [`Telescope1D`] exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct TelescopeConfig {
    /// The number of frequency channels.
    pub nfreq: usize,

    /// The number of dishes.
    pub ndishes: usize,

    /// The diameter of the dishes \[metres\]. This is also the smallest
    /// spacing between dishes.
    pub ddish: f64,

    /// The number of image pixels is `npix_fft + 1`. Must be even.
    pub npix_fft: usize,

    /// The zero-padding (uv oversampling) factor.
    pub npad: usize,

    /// The lowest frequency \[MHz\].
    pub minfreq: f64,

    /// The highest frequency \[MHz\].
    pub maxfreq: f64,

    /// If true, dishes are exactly `ddish` apart; otherwise spacings are
    /// randomly `ddish`, `1.25 ddish` or `1.5 ddish`.
    pub redundant: bool,

    /// The seed used to lay out the dishes.
    pub seed: u64,

    /// Only every `fg_step`-th angle is used when building the foreground
    /// covariance.
    pub fg_step: usize,

    /// The eigenvalue threshold (relative to the largest eigenvalue) used when
    /// filtering foregrounds in [`Telescope1D::get_obs_uvplane`].
    pub fg_scale: f64,

    /// How per-frequency work is run.
    pub executor: Executor,
}

impl Default for TelescopeConfig {
    fn default() -> Self {
        TelescopeConfig {
            nfreq: 256,
            ndishes: 32,
            ddish: 6.0,
            npix_fft: 1 << 12,
            npad: 1 << 8,
            minfreq: 400.0,
            maxfreq: 800.0,
            redundant: false,
            seed: 0,
            fg_step: 1,
            fg_scale: DEFAULT_FG_SCALE,
            executor: Executor::default(),
        }
    }
}

impl TelescopeConfig {
    fn validate(&self) -> Result<(), InitTelescopeError> {
        if self.ndishes == 0 {
            return Err(InitTelescopeError::NoDishes);
        }
        if !(self.ddish.is_finite() && self.ddish > 0.0) {
            return Err(InitTelescopeError::BadDishDiameter(self.ddish));
        }
        if self.npix_fft == 0 || self.npix_fft % 2 != 0 {
            return Err(InitTelescopeError::BadNpixFft(self.npix_fft));
        }
        if self.npad == 0 {
            return Err(InitTelescopeError::ZeroNpad);
        }
        if self.nfreq == 0 {
            return Err(InitTelescopeError::NoFreqs);
        }
        if !(self.minfreq > 0.0 && self.maxfreq > self.minfreq && self.maxfreq.is_finite()) {
            return Err(InitTelescopeError::BadFreqBand {
                min: self.minfreq,
                max: self.maxfreq,
            });
        }
        if self.fg_step == 0 {
            return Err(InitTelescopeError::ZeroFgStep);
        }
        if !(self.fg_scale.is_finite() && self.fg_scale >= 0.0) {
            return Err(InitTelescopeError::BadFgScale(self.fg_scale));
        }
        Ok(())
    }
}

/// A line of dishes observing a 1D sky.
///
/// Everything except the foreground-filter caches is fixed at construction.
pub struct Telescope1D {
    config: TelescopeConfig,
    layout: DishLayout,
    baselines: Baselines,
    /// \[MHz\]
    freqs: Array1<f64>,
    /// sin(θ) of each pixel.
    alpha: Array1<f64>,
    /// Baseline length in wavelengths, `nfreq` × unique baselines.
    dol: Array2<f64>,
    /// Fractional uv index of each element of `dol`.
    uv_indices: Array2<f64>,
    transform: UvTransform,
    /// The beam envelope |beam|² / cos(α), `nfreq` × `npix`.
    p2fac: Array2<f64>,
    pub(crate) fg_cache: FilterCache,
}

impl Telescope1D {
    /// Build a new telescope. This lays out the dishes, works out the
    /// baselines and pre-computes the beam table.
    pub fn new(config: TelescopeConfig) -> Result<Telescope1D, InitTelescopeError> {
        config.validate()?;

        let mut rng = SimRng::seed_from_u64(config.seed);
        let layout = DishLayout::new(config.ndishes, config.ddish, config.redundant, &mut rng);
        let baselines = Baselines::new(&layout);

        let freqs = linspace(config.minfreq, config.maxfreq, config.nfreq);
        let alpha = linspace(-1.0, 1.0, config.npix_fft + 1);
        let lams = freqs.mapv(freq2lam);
        let dol = Array2::from_shape_fn((config.nfreq, baselines.num_unique()), |(i, j)| {
            baselines.unique_lengths()[j] / lams[i]
        });
        let transform = UvTransform::new(config.npix_fft, config.npad);
        let uv_indices = dol.mapv(|d| transform.dol2ndx(d));
        let p2fac = beam::calc_p2fac(&transform, &freqs, &alpha, config.ddish, config.executor)?;

        debug!(
            "Created a 1D telescope with {} dishes ({} baselines, {} unique), {} frequencies and {} pixels",
            layout.len(),
            baselines.pairs().len(),
            baselines.num_unique(),
            freqs.len(),
            alpha.len()
        );

        Ok(Telescope1D {
            config,
            layout,
            baselines,
            freqs,
            alpha,
            dol,
            uv_indices,
            transform,
            p2fac,
            fg_cache: FilterCache::default(),
        })
    }

    pub fn config(&self) -> &TelescopeConfig {
        &self.config
    }

    pub fn nfreq(&self) -> usize {
        self.config.nfreq
    }

    pub fn ndishes(&self) -> usize {
        self.config.ndishes
    }

    pub fn npix_fft(&self) -> usize {
        self.config.npix_fft
    }

    /// The number of image pixels (`npix_fft + 1`).
    pub fn npix(&self) -> usize {
        self.transform.npix()
    }

    /// The length of the zero-padded transform (`npix_fft * npad`).
    pub fn nfft(&self) -> usize {
        self.transform.nfft()
    }

    pub fn layout(&self) -> &DishLayout {
        &self.layout
    }

    /// Dish positions \[metres\].
    pub fn dish_locations(&self) -> &[f64] {
        self.layout.positions()
    }

    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    /// Sorted, distinct baseline lengths \[metres\].
    pub fn unique_baseline_lengths(&self) -> &[f64] {
        self.baselines.unique_lengths()
    }

    /// The shape of every uv plane this telescope produces.
    pub fn uvplane_shape(&self) -> (usize, usize) {
        (self.nfreq(), self.baselines.num_unique())
    }

    /// Frequencies \[MHz\].
    pub fn freqs(&self) -> ArrayView1<f64> {
        self.freqs.view()
    }

    /// Wavelengths \[metres\].
    pub fn lams(&self) -> Array1<f64> {
        self.freqs.mapv(freq2lam)
    }

    /// sin(θ) for every pixel, where θ runs from -π/2 to π/2 with θ = 0 at
    /// zenith.
    pub fn alpha(&self) -> ArrayView1<f64> {
        self.alpha.view()
    }

    /// Baseline lengths in wavelengths (`nfreq` × unique baselines).
    pub fn dol(&self) -> ArrayView2<f64> {
        self.dol.view()
    }

    /// The fractional uv index of every element of [`Self::dol`].
    pub fn uv_indices(&self) -> ArrayView2<f64> {
        self.uv_indices.view()
    }

    pub fn transform(&self) -> &UvTransform {
        &self.transform
    }

    pub fn image2uv(&self, image: ArrayView1<f64>) -> Result<Array1<c64>, TelescopeError> {
        self.transform.image2uv(image)
    }

    pub fn uv2image(&self, uv: ArrayView1<c64>) -> Result<Array1<f64>, TelescopeError> {
        self.transform.uv2image(uv)
    }

    pub fn dol2ndx(&self, dol: f64) -> f64 {
        self.transform.dol2ndx(dol)
    }

    pub fn empty_uv(&self) -> Array1<c64> {
        self.transform.empty_uv()
    }

    pub fn empty_image(&self) -> Array1<f64> {
        self.transform.empty_image()
    }

    /// The visibilities of a unit point source at `alpha` (`nfreq` × unique
    /// baselines), ignoring the beam.
    pub fn predict_point(&self, alpha: f64) -> Array2<c64> {
        self.dol.mapv(|d| c64::cis(-TAU * d * alpha))
    }

    /// Observe a frequency-independent sky image (`npix` pixels). Each
    /// frequency's view of the sky is weighted by the beam envelope, transformed
    /// to uv space and sampled at the unique baselines.
    pub fn observe_image(&self, image: ArrayView1<f64>) -> Result<Array2<c64>, TelescopeError> {
        if image.len() != self.npix() {
            return Err(TelescopeError::ImageLength {
                expected: self.npix(),
                got: image.len(),
            });
        }
        self.observe_rows(|i_freq| &image * &self.p2fac.row(i_freq))
    }

    /// The same as [`Self::observe_image`], but the sky has one row per
    /// frequency (`nfreq` × `npix`).
    pub fn observe_image_per_freq(
        &self,
        image: ArrayView2<f64>,
    ) -> Result<Array2<c64>, TelescopeError> {
        let expected = (self.nfreq(), self.npix());
        if image.dim() != expected {
            return Err(TelescopeError::ImageShape {
                expected,
                got: image.dim(),
            });
        }
        self.observe_rows(|i_freq| &image.row(i_freq) * &self.p2fac.row(i_freq))
    }

    fn observe_rows<F>(&self, sky_row: F) -> Result<Array2<c64>, TelescopeError>
    where
        F: Fn(usize) -> Array1<f64> + Sync + Send,
    {
        let rows = self.config.executor.map_ordered(self.nfreq(), |i_freq| {
            let msky = sky_row(i_freq);
            let uv = self.transform.image2uv(msky.view())?;
            uv2uvplane(uv.view(), self.uv_indices.row(i_freq))
        });

        let mut uvplane = Array2::zeros(self.uvplane_shape());
        for (mut out, row) in uvplane.outer_iter_mut().zip(rows) {
            out.assign(&row?);
        }
        Ok(uvplane)
    }

    /// Turn a uv plane back into a map (`nfreq` × `npix`). Each visibility is
    /// put into the uv sample nearest its baseline; baselines beyond the uv
    /// array are dropped.
    pub fn uvplane_to_rmap(&self, uvplane: ArrayView2<c64>) -> Result<Array2<f64>, TelescopeError> {
        self.check_uvplane_shape(uvplane)?;
        let rows = self.config.executor.map_ordered(self.nfreq(), |i_freq| {
            let mut uv = self.empty_uv();
            for (&index, &vis) in self
                .uv_indices
                .row(i_freq)
                .iter()
                .zip(uvplane.row(i_freq).iter())
            {
                let nearest = (index + 0.5) as usize;
                if let Some(u) = uv.get_mut(nearest) {
                    *u = vis;
                }
            }
            self.transform.uv2image(uv.view())
        });

        let mut rmap = Array2::zeros((self.nfreq(), self.npix()));
        for (mut out, row) in rmap.outer_iter_mut().zip(rows) {
            out.assign(&row?);
        }
        Ok(rmap)
    }

    pub(crate) fn check_uvplane_shape(&self, uvplane: ArrayView2<c64>) -> Result<(), TelescopeError> {
        let expected = self.uvplane_shape();
        if uvplane.dim() != expected {
            return Err(TelescopeError::UvPlaneShape {
                expected,
                got: uvplane.dim(),
            });
        }
        Ok(())
    }
}

/// `n` evenly-spaced values from `start` to `stop` inclusive. The last value
/// is exactly `stop`.
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => array![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out = Array1::from_shape_fn(n, |i| start + step * i as f64);
            out[n - 1] = stop;
            out
        }
    }
}
