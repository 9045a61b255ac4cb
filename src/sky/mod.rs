// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synthetic sky images.
//!
//! The generators take an explicit random source. The [`Telescope1D`] methods
//! seed a new source on every call, so the same seed always gives the same
//! sky.

#[cfg(test)]
mod tests;

use ndarray::prelude::*;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson, Uniform};

use crate::{
    c64,
    constants::{GAUSSIAN_TRUNCATE, POINT_SOURCE_BRIGHTNESS, POISSON_SKY_SCALE},
    telescope::{Telescope1D, TelescopeError},
    SimRng, SkyType,
};

/// The default number of randomly-placed point sources.
pub const DEFAULT_NUM_POINT_SOURCES: usize = 50;

/// A sky image, either the same at every frequency or varying with frequency.
#[derive(Debug, Clone, PartialEq)]
pub enum SkyImage {
    /// `npix` pixels.
    Flat(Array1<f64>),

    /// `nfreq` × `npix` pixels.
    PerFreq(Array2<f64>),
}

impl SkyImage {
    /// The sum of all pixels.
    pub fn sum(&self) -> f64 {
        match self {
            SkyImage::Flat(a) => a.sum(),
            SkyImage::PerFreq(a) => a.sum(),
        }
    }
}

fn normal(mean: f64, std: f64) -> Result<Normal<f64>, TelescopeError> {
    if !(std.is_finite() && std >= 0.0 && mean.is_finite()) {
        return Err(TelescopeError::BadSkyParameter {
            name: "sigma",
            value: std,
        });
    }
    Normal::new(mean, std).map_err(|_| TelescopeError::BadSkyParameter {
        name: "sigma",
        value: std,
    })
}

/// Gaussian noise with standard deviation `level` (`nfreq` × `npix`).
pub fn signal<R: Rng>(
    nfreq: usize,
    npix: usize,
    level: f64,
    rng: &mut R,
) -> Result<Array2<f64>, TelescopeError> {
    let dist = normal(0.0, level)?;
    Ok(Array2::from_shape_simple_fn((nfreq, npix), || {
        dist.sample(rng)
    }))
}

/// Point sources at each of the given pixels.
pub fn point_sources(npix: usize, indices: &[usize]) -> Result<Array1<f64>, TelescopeError> {
    let mut image = Array1::zeros(npix);
    for &index in indices {
        let pixel = image
            .get_mut(index)
            .ok_or(TelescopeError::PixelOutOfRange { index, npix })?;
        *pixel = POINT_SOURCE_BRIGHTNESS;
    }
    Ok(image)
}

/// `n` point sources at pixels drawn uniformly from `[0, max_index)`. Pixels
/// can be drawn more than once.
pub fn random_point_sources<R: Rng>(
    npix: usize,
    max_index: usize,
    n: usize,
    rng: &mut R,
) -> Result<Array1<f64>, TelescopeError> {
    if max_index == 0 || max_index > npix {
        return Err(TelescopeError::PixelOutOfRange {
            index: max_index,
            npix,
        });
    }
    let indices = (0..n)
        .map(|_| rng.gen_range(0..max_index))
        .collect::<Vec<_>>();
    point_sources(npix, &indices)
}

/// A correlated Gaussian random field: white noise with the given mean and
/// standard deviation, smoothed with a Gaussian kernel `sigma_f` pixels wide.
pub fn gaussian_field<R: Rng>(
    npix: usize,
    mean: f64,
    sigma_o: f64,
    sigma_f: f64,
    rng: &mut R,
) -> Result<Array1<f64>, TelescopeError> {
    if !(sigma_f.is_finite() && sigma_f >= 0.0) {
        return Err(TelescopeError::BadSkyParameter {
            name: "sigma_f",
            value: sigma_f,
        });
    }
    let dist = normal(mean, sigma_o)?;
    let white = Array1::from_shape_simple_fn(npix, || dist.sample(rng));
    Ok(gaussian_filter(white.view(), sigma_f))
}

/// Uniform brightness in `[0, high)`.
pub fn uniform<R: Rng>(npix: usize, high: f64, rng: &mut R) -> Result<Array1<f64>, TelescopeError> {
    if !(high.is_finite() && high > 0.0) {
        return Err(TelescopeError::BadSkyParameter {
            name: "high",
            value: high,
        });
    }
    let dist = Uniform::new(0.0, high);
    Ok(Array1::from_shape_simple_fn(npix, || dist.sample(rng)))
}

/// Poisson-distributed counts with mean `lam`, scaled up to a brightness. A
/// zero `lam` gives an empty sky.
pub fn poisson<R: Rng>(npix: usize, lam: f64, rng: &mut R) -> Result<Array1<f64>, TelescopeError> {
    if lam == 0.0 {
        return Ok(Array1::zeros(npix));
    }
    let dist = Poisson::new(lam).map_err(|_| TelescopeError::BadSkyParameter {
        name: "lam",
        value: lam,
    })?;
    Ok(Array1::from_shape_simple_fn(npix, || {
        let count: f64 = dist.sample(rng);
        count * POISSON_SKY_SCALE
    }))
}

/// Smooth with a normalised Gaussian kernel of standard deviation `sigma`
/// (in samples), truncated at 4 standard deviations. Samples beyond the edges
/// are reflected about the edge (`d c b a | a b c d | d c b a`).
pub fn gaussian_filter(input: ArrayView1<f64>, sigma: f64) -> Array1<f64> {
    let n = input.len();
    if n == 0 || sigma <= 0.0 {
        return input.to_owned();
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let mut weights = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect::<Vec<_>>();
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);

    let period = 2 * n as isize;
    let reflect = |i: isize| {
        let m = i.rem_euclid(period);
        if m >= n as isize {
            (period - m - 1) as usize
        } else {
            m as usize
        }
    };
    Array1::from_shape_fn(n, |j| {
        weights
            .iter()
            .zip(-radius..=radius)
            .map(|(w, offset)| w * input[reflect(j as isize + offset)])
            .sum()
    })
}

impl Telescope1D {
    /// Frequency-dependent Gaussian noise with standard deviation `level`
    /// (`nfreq` × `npix`).
    pub fn get_signal(&self, level: f64, seed: u64) -> Result<Array2<f64>, TelescopeError> {
        signal(
            self.nfreq(),
            self.npix(),
            level,
            &mut SimRng::seed_from_u64(seed),
        )
    }

    /// Point sources at the given pixels or, if `indices` is `None`, at `n`
    /// random pixels.
    pub fn get_point_source_sky(
        &self,
        indices: Option<&[usize]>,
        n: usize,
        seed: u64,
    ) -> Result<Array1<f64>, TelescopeError> {
        match indices {
            Some(indices) => point_sources(self.npix(), indices),
            None => random_point_sources(
                self.npix(),
                self.npix_fft(),
                n,
                &mut SimRng::seed_from_u64(seed),
            ),
        }
    }

    pub fn get_gaussian_sky(
        &self,
        mean: f64,
        sigma_o: f64,
        sigma_f: f64,
        seed: u64,
    ) -> Result<Array1<f64>, TelescopeError> {
        gaussian_field(
            self.npix(),
            mean,
            sigma_o,
            sigma_f,
            &mut SimRng::seed_from_u64(seed),
        )
    }

    pub fn get_uniform_sky(&self, high: f64, seed: u64) -> Result<Array1<f64>, TelescopeError> {
        uniform(self.npix(), high, &mut SimRng::seed_from_u64(seed))
    }

    pub fn get_poisson_sky(&self, lam: f64, seed: u64) -> Result<Array1<f64>, TelescopeError> {
        poisson(self.npix(), lam, &mut SimRng::seed_from_u64(seed))
    }

    /// Make a sky of the given type with its default parameters.
    pub fn get_sky(&self, sky_type: SkyType, seed: u64) -> Result<SkyImage, TelescopeError> {
        let sky = match sky_type {
            SkyType::Signal => SkyImage::PerFreq(self.get_signal(1.0, seed)?),
            SkyType::Point => {
                SkyImage::Flat(self.get_point_source_sky(None, DEFAULT_NUM_POINT_SOURCES, seed)?)
            }
            SkyType::Gaussian => SkyImage::Flat(self.get_gaussian_sky(0.0, 1.4e4, 60.0, seed)?),
            SkyType::Uniform => SkyImage::Flat(self.get_uniform_sky(3500.0, seed)?),
            SkyType::Poisson => SkyImage::Flat(self.get_poisson_sky(0.01, seed)?),
        };
        Ok(sky)
    }

    /// Observe either kind of [`SkyImage`].
    pub fn observe_sky(&self, sky: &SkyImage) -> Result<Array2<c64>, TelescopeError> {
        match sky {
            SkyImage::Flat(image) => self.observe_image(image.view()),
            SkyImage::PerFreq(image) => self.observe_image_per_freq(image.view()),
        }
    }
}
