// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.
 */

/// Speed of light \[metres per second\]. The simulation has always used this
/// rounded value; keep it that way for reproducibility.
pub const VEL_C: f64 = 3e8;

/// The rest frequency of the 21 cm line \[MHz\].
pub const FREQ_21CM_MHZ: f64 = 1420.4;

/// Number of Hz in a MHz.
pub(crate) const MHZ_TO_HZ: f64 = 1e6;

/// The brightness given to each pixel of a point-source sky.
pub const POINT_SOURCE_BRIGHTNESS: f64 = 1e4;

/// Poisson skies are scaled by this factor.
pub(crate) const POISSON_SKY_SCALE: f64 = 100.0;

/// Eigenvalues smaller than this fraction of the largest eigenvalue are not
/// projected out of the visibilities by the foreground filter.
pub const DEFAULT_FG_SCALE: f64 = 1e-11;

/// Gaussian smoothing kernels are truncated at this many standard deviations.
pub(crate) const GAUSSIAN_TRUNCATE: f64 = 4.0;
