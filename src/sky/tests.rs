// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::{telescope::TelescopeConfig, Executor};

fn telescope() -> Telescope1D {
    Telescope1D::new(TelescopeConfig {
        nfreq: 4,
        ndishes: 4,
        npix_fft: 256,
        npad: 4,
        redundant: true,
        executor: Executor::Serial,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn uniform_sky_is_reproducible() {
    let t = telescope();
    let a = t.get_uniform_sky(10.0, 5).unwrap();
    let b = t.get_uniform_sky(10.0, 5).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 257);
    assert!(a.iter().all(|&v| (0.0..10.0).contains(&v)));

    let c = t.get_uniform_sky(10.0, 6).unwrap();
    assert_ne!(a, c);
}

#[test]
fn point_source_at_a_given_pixel() {
    let t = telescope();
    let sky = t.get_point_source_sky(Some(&[10]), 0, 0).unwrap();
    assert_eq!(sky[10], 1e4);
    assert_abs_diff_eq!(sky.sum(), 1e4);

    let result = t.get_point_source_sky(Some(&[257]), 0, 0);
    assert!(matches!(
        result,
        Err(TelescopeError::PixelOutOfRange {
            index: 257,
            npix: 257
        })
    ));
}

#[test]
fn random_point_sources() {
    let t = telescope();
    let sky = t.get_point_source_sky(None, 50, 3).unwrap();
    let num_sources = sky.iter().filter(|&&v| v == POINT_SOURCE_BRIGHTNESS).count();
    assert!(num_sources > 0 && num_sources <= 50);
    assert!(sky.iter().all(|&v| v == 0.0 || v == POINT_SOURCE_BRIGHTNESS));
    // The last pixel can never be drawn.
    assert_eq!(sky[256], 0.0);
    assert_eq!(sky, t.get_point_source_sky(None, 50, 3).unwrap());
}

#[test]
fn signal_shape_and_level() {
    let t = telescope();
    let sig = t.get_signal(3.0, 1).unwrap();
    assert_eq!(sig.dim(), (4, 257));
    let std = sig.std(0.0);
    assert!((std - 3.0).abs() < 0.3, "std {std}");
    assert!(matches!(
        t.get_signal(-1.0, 1),
        Err(TelescopeError::BadSkyParameter { name: "sigma", .. })
    ));
    assert!(t.get_signal(f64::NAN, 1).is_err());
    assert!(t.get_gaussian_sky(0.0, -1.4e4, 60.0, 0).is_err());

    // No noise at all is fine.
    let quiet = t.get_signal(0.0, 1).unwrap();
    assert!(quiet.iter().all(|&v| v == 0.0));
}

#[test]
fn poisson_sky_is_scaled_counts() {
    let t = telescope();
    let sky = t.get_poisson_sky(2.0, 0).unwrap();
    assert!(sky.iter().all(|&v| v >= 0.0 && (v / 100.0).fract() == 0.0));
    assert!(sky.sum() > 0.0);

    let empty = t.get_poisson_sky(0.0, 0).unwrap();
    assert_eq!(empty, Array1::zeros(257));
    assert!(t.get_poisson_sky(-1.0, 0).is_err());
}

#[test]
fn gaussian_filter_preserves_constants() {
    let input = Array1::from_elem(20, 3.0);
    let output = gaussian_filter(input.view(), 2.5);
    assert_abs_diff_eq!(output, input, epsilon = 1e-12);
}

#[test]
fn gaussian_filter_reflects_at_edges() {
    // With a kernel much wider than the input, every sample sees the mirrored
    // input many times over, so the output tends to the mean.
    let input = array![1.0, 2.0, 3.0, 4.0];
    let output = gaussian_filter(input.view(), 50.0);
    for v in output.iter() {
        assert_abs_diff_eq!(*v, 2.5, epsilon = 1e-2);
    }

    // An impulse spreads symmetrically and keeps its total away from edges.
    let mut impulse = Array1::zeros(41);
    impulse[20] = 1.0;
    let output = gaussian_filter(impulse.view(), 2.0);
    assert_abs_diff_eq!(output.sum(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(output[18], output[22], epsilon = 1e-15);
    assert!(output[20] > output[21]);
    // Truncated at 4 sigma.
    assert_eq!(output[11], 0.0);
    assert!(output[12] > 0.0);
}

#[test]
fn gaussian_sky_is_smooth() {
    let t = telescope();
    let sky = t.get_gaussian_sky(0.0, 1.4e4, 60.0, 0).unwrap();
    assert_eq!(sky.len(), 257);
    let max_step = sky
        .windows(2)
        .into_iter()
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0, f64::max);
    // White noise would jump by ~1e4 between pixels.
    assert!(max_step < 1e3, "max step {max_step}");
}

#[test]
fn sky_types_match_their_shapes() {
    let t = telescope();
    for sky_type in SkyType::SWEEP {
        let sky = t.get_sky(sky_type, 0).unwrap();
        match (sky_type, &sky) {
            (SkyType::Signal, SkyImage::PerFreq(a)) => assert_eq!(a.dim(), (4, 257)),
            (SkyType::Signal, SkyImage::Flat(_)) => panic!("signal should vary with frequency"),
            (_, SkyImage::Flat(a)) => assert_eq!(a.len(), 257),
            (_, SkyImage::PerFreq(_)) => panic!("{sky_type} should be flat"),
        }
        let uvplane = t.observe_sky(&sky).unwrap();
        assert_eq!(uvplane.dim(), t.uvplane_shape());
    }
}
