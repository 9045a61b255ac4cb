// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Line-of-sight distances between 21 cm frequencies.

use crate::constants::FREQ_21CM_MHZ;

/// The speed of light \[km/s\]. With H0 = 100 h km/s/Mpc, `c / H0` is this
/// divided by 100, in Mpc/h.
const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// The number of Simpson intervals used per unit redshift.
const INTERVALS_PER_UNIT_Z: f64 = 2048.0;

/// Anything that gives the comoving distance \[Mpc/h\] between the redshifted
/// 21 cm frequencies `freq1_mhz` and `freq2_mhz`.
///
/// The distance is positive when `freq1_mhz < freq2_mhz`. Any
/// `Fn(f64, f64) -> f64` can be used.
pub trait ComovingDistance {
    fn distance(&self, freq1_mhz: f64, freq2_mhz: f64) -> f64;
}

impl<F> ComovingDistance for F
where
    F: Fn(f64, f64) -> f64,
{
    fn distance(&self, freq1_mhz: f64, freq2_mhz: f64) -> f64 {
        self(freq1_mhz, freq2_mhz)
    }
}

/// The redshift at which the 21 cm line is observed at `freq_mhz`.
pub fn freq2z(freq_mhz: f64) -> f64 {
    FREQ_21CM_MHZ / freq_mhz - 1.0
}

/// A flat ΛCDM cosmology without radiation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatLambdaCdm {
    /// The matter density today, relative to critical.
    pub omega_m: f64,

    /// H0 / (100 km/s/Mpc).
    pub h: f64,
}

impl FlatLambdaCdm {
    /// Planck 2015 (TT,TE,EE+lowP+lensing+ext).
    pub const PLANCK15: FlatLambdaCdm = FlatLambdaCdm {
        omega_m: 0.3075,
        h: 0.6774,
    };

    fn inv_efunc(&self, z: f64) -> f64 {
        let zp1 = 1.0 + z;
        1.0 / (self.omega_m * zp1 * zp1 * zp1 + (1.0 - self.omega_m)).sqrt()
    }

    /// The comoving distance from redshift `z1` to `z2` \[Mpc/h\].
    pub fn comoving_distance_between(&self, z1: f64, z2: f64) -> f64 {
        if z1 == z2 {
            return 0.0;
        }
        let mut n = ((z2 - z1).abs() * INTERVALS_PER_UNIT_Z).ceil() as usize;
        n = n.max(2);
        if n % 2 == 1 {
            n += 1;
        }
        let dz = (z2 - z1) / n as f64;
        let interior: f64 = (1..n)
            .map(|i| {
                let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
                weight * self.inv_efunc(z1 + i as f64 * dz)
            })
            .sum();
        let integral = (self.inv_efunc(z1) + interior + self.inv_efunc(z2)) * dz / 3.0;
        SPEED_OF_LIGHT_KM_S / 100.0 * integral
    }

    /// The comoving distance to redshift `z` \[Mpc/h\].
    pub fn comoving_distance(&self, z: f64) -> f64 {
        self.comoving_distance_between(0.0, z)
    }
}

impl Default for FlatLambdaCdm {
    fn default() -> Self {
        FlatLambdaCdm::PLANCK15
    }
}

impl ComovingDistance for FlatLambdaCdm {
    fn distance(&self, freq1_mhz: f64, freq2_mhz: f64) -> f64 {
        self.comoving_distance_between(freq2z(freq2_mhz), freq2z(freq1_mhz))
    }
}

/// The comoving distance \[Mpc/h\] between the 21 cm frequencies `freq1_mhz`
/// and `freq2_mhz` in the Planck 2015 cosmology.
pub fn freq2distance(freq1_mhz: f64, freq2_mhz: f64) -> f64 {
    FlatLambdaCdm::PLANCK15.distance(freq1_mhz, freq2_mhz)
}
