// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Simulation of a one-dimensional radio interferometer.

A line of dishes observes a 1D sky. Sky images are turned into visibilities
per unique baseline and frequency (a "uv plane"), which can then be corrupted
by per-dish timing or amplitude errors, have a foreground model projected out
of them, and be turned into power spectra.
 */

pub mod constants;
pub mod corruption;
mod executor;
pub mod fg_filter;
pub mod geometry;
pub mod io;
pub mod power_spectrum;
pub mod sky;
pub mod telescope;
pub mod transform;
mod types;

pub use corruption::{ObsParams, ObsUvPlane};
pub use executor::Executor;
pub use telescope::{InitTelescopeError, Telescope1D, TelescopeConfig, TelescopeError};
pub use types::*;

// Re-exports.
pub use ndarray;
pub use num_complex::Complex64 as c64;
