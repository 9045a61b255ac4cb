// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generic types.

use std::str::FromStr;

use rand_chacha::ChaCha8Rng;

/// The random source used for all stochastic parts of the simulation. A
/// portable, seedable generator, so that a given seed produces the same
/// dishes, skies and errors on every platform.
pub type SimRng = ChaCha8Rng;

/// The kind of per-dish instrumental error being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Each dish has a clock offset \[seconds\], which turns into a
    /// frequency-dependent phase error on every visibility.
    Timing,

    /// Each dish has a fractional gain error.
    Amplitude,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ErrorType::Timing => "t",
                ErrorType::Amplitude => "a",
            }
        )
    }
}

/// The kinds of synthetic skies that the sweep knows how to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyType {
    /// Frequency-dependent Gaussian noise.
    Signal,
    /// Randomly-placed point sources.
    Point,
    /// A smoothed Gaussian random field.
    Gaussian,
    /// Uniform random brightness.
    Uniform,
    /// Poisson-distributed brightness.
    Poisson,
}

impl SkyType {
    /// The sky types used by the parameter sweep, in the order they're
    /// processed.
    pub const SWEEP: [SkyType; 4] = [
        SkyType::Signal,
        SkyType::Point,
        SkyType::Gaussian,
        SkyType::Uniform,
    ];
}

impl std::fmt::Display for SkyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SkyType::Signal => "sig",
                SkyType::Point => "point",
                SkyType::Gaussian => "gauss",
                SkyType::Uniform => "unif",
                SkyType::Poisson => "poisson",
            }
        )
    }
}

impl FromStr for SkyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sig" => Ok(SkyType::Signal),
            "point" => Ok(SkyType::Point),
            "gauss" => Ok(SkyType::Gaussian),
            "unif" => Ok(SkyType::Uniform),
            "poisson" => Ok(SkyType::Poisson),
            _ => Err(format!("Unrecognised sky type '{s}'")),
        }
    }
}
