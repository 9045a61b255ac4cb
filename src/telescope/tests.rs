// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

fn small_redundant(executor: Executor) -> Telescope1D {
    Telescope1D::new(TelescopeConfig {
        nfreq: 8,
        ndishes: 4,
        npix_fft: 256,
        npad: 8,
        redundant: true,
        executor,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn redundant_telescope_geometry() {
    let telescope = small_redundant(Executor::Serial);
    assert_eq!(telescope.dish_locations(), &[0.0, 6.0, 12.0, 18.0]);
    assert_eq!(telescope.baselines().pairs().len(), 6);
    assert_eq!(telescope.layout().unique_spacings(), vec![6.0]);
    assert_eq!(telescope.unique_baseline_lengths()[0], 6.0);
    assert_eq!(telescope.uvplane_shape(), (8, 3));
    assert_eq!(telescope.npix(), 257);
    assert_eq!(telescope.nfft(), 256 * 8);
    assert_eq!(
        telescope.baselines().lengths(),
        &[6.0, 12.0, 18.0, 6.0, 12.0, 6.0]
    );
    assert_eq!(telescope.transform().uv_len(), 256 * 8 / 2 + 1);
    assert_eq!(telescope.empty_uv().len(), telescope.transform().uv_len());
}

#[test]
fn frequencies_and_angles() {
    let telescope = small_redundant(Executor::Serial);
    let freqs = telescope.freqs();
    assert_eq!(freqs.len(), 8);
    assert_abs_diff_eq!(freqs[0], 400.0);
    assert_abs_diff_eq!(freqs[7], 800.0);
    assert_abs_diff_eq!(freqs[1] - freqs[0], 400.0 / 7.0, epsilon = 1e-12);

    let alpha = telescope.alpha();
    assert_abs_diff_eq!(alpha[0], -1.0);
    assert_abs_diff_eq!(alpha[128], 0.0, epsilon = 1e-15);
    assert_abs_diff_eq!(alpha[256], 1.0);

    // 400 MHz is a 0.75 m wavelength.
    assert_abs_diff_eq!(freq2lam(400.0), 0.75);
    let lams = telescope.lams();
    assert_eq!(lams.len(), 8);
    assert_abs_diff_eq!(lams[0], 0.75);
    assert_abs_diff_eq!(lams[7], 0.375);
    assert_abs_diff_eq!(telescope.dol()[[0, 0]], 8.0, epsilon = 1e-12);
    assert_abs_diff_eq!(telescope.uv_indices()[[0, 0]], 8.0 * 8.0 * 2.0, epsilon = 1e-9);
}

#[test]
fn invalid_configs_are_rejected() {
    let result = Telescope1D::new(TelescopeConfig {
        ndishes: 0,
        ..Default::default()
    });
    assert!(matches!(result, Err(InitTelescopeError::NoDishes)));

    let result = Telescope1D::new(TelescopeConfig {
        npix_fft: 255,
        ..Default::default()
    });
    assert!(matches!(result, Err(InitTelescopeError::BadNpixFft(255))));

    let result = Telescope1D::new(TelescopeConfig {
        minfreq: 800.0,
        maxfreq: 400.0,
        ..Default::default()
    });
    assert!(matches!(result, Err(InitTelescopeError::BadFreqBand { .. })));

    let result = Telescope1D::new(TelescopeConfig {
        fg_step: 0,
        ..Default::default()
    });
    assert!(matches!(result, Err(InitTelescopeError::ZeroFgStep)));

    let result = Telescope1D::new(TelescopeConfig {
        ddish: -1.0,
        ..Default::default()
    });
    assert!(matches!(result, Err(InitTelescopeError::BadDishDiameter(_))));
}

#[test]
fn construction_is_deterministic() {
    let config = TelescopeConfig {
        nfreq: 4,
        ndishes: 10,
        npix_fft: 64,
        npad: 4,
        seed: 22,
        ..Default::default()
    };
    let a = Telescope1D::new(config.clone()).unwrap();
    let b = Telescope1D::new(config).unwrap();
    assert_eq!(a.dish_locations(), b.dish_locations());
    assert_eq!(a.unique_baseline_lengths(), b.unique_baseline_lengths());
}

#[test]
fn primary_beam_peaks_at_zenith() {
    let telescope = small_redundant(Executor::Serial);
    let beam = telescope.primary_beam_1(600.0).unwrap();
    assert_eq!(beam.len(), telescope.npix());
    let peak = beam
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, 128);

    let p2fac = telescope.get_p2fac();
    assert_eq!(p2fac.dim(), (8, 257));
    assert_abs_diff_eq!(p2fac[[3, 128]], beam_at(&telescope, 3, 128).powi(2), epsilon = 1e-12);
}

fn beam_at(telescope: &Telescope1D, i_freq: usize, i_pix: usize) -> f64 {
    telescope.primary_beam_1(telescope.freqs()[i_freq]).unwrap()[i_pix]
}

#[test]
fn single_dish_beam_needs_extent() {
    let telescope = small_redundant(Executor::Serial);
    let beam = telescope.beam_no_interferometry(500.0).unwrap();
    assert_eq!(beam.len(), telescope.npix());
    assert!(beam[128] > beam[100]);
    assert_abs_diff_eq!(beam[100], beam[156], epsilon = 1e-9);

    let single = Telescope1D::new(TelescopeConfig {
        nfreq: 2,
        ndishes: 1,
        npix_fft: 32,
        npad: 2,
        ..Default::default()
    })
    .unwrap();
    assert!(matches!(
        single.beam_no_interferometry(500.0),
        Err(TelescopeError::NoExtent)
    ));
}

#[test]
fn observing_a_zenith_point_source() {
    let telescope = small_redundant(Executor::Serial);
    let mut image = telescope.empty_image();
    image[128] = 1.0;
    let uvplane = telescope.observe_image(image.view()).unwrap();
    assert_eq!(uvplane.dim(), (8, 3));

    // A source at zenith has no phase; every visibility is the beam there.
    for (i_freq, row) in uvplane.outer_iter().enumerate() {
        let expected = telescope.get_p2fac()[[i_freq, 128]];
        for vis in row {
            assert_abs_diff_eq!(*vis, c64::new(expected, 0.0), epsilon = 1e-9);
        }
    }
}

#[test]
fn observing_matches_predict_point() {
    let telescope = small_redundant(Executor::Serial);
    let i_pix = 160;
    let mut image = telescope.empty_image();
    image[i_pix] = 1.0;
    let uvplane = telescope.observe_image(image.view()).unwrap();
    let prediction = telescope.predict_point(telescope.alpha()[i_pix]);
    for i_freq in 0..telescope.nfreq() {
        let p = telescope.get_p2fac()[[i_freq, i_pix]];
        for j in 0..3 {
            // The uv indices are fractional so there is some interpolation
            // error.
            assert_abs_diff_eq!(
                uvplane[[i_freq, j]],
                prediction[[i_freq, j]] * p,
                epsilon = 1e-2 * p
            );
        }
    }
}

#[test]
fn serial_and_rayon_agree() {
    let serial = small_redundant(Executor::Serial);
    let rayon = small_redundant(Executor::Rayon);
    let image = Array1::from_shape_fn(serial.npix(), |i| (i as f64 * 0.1).sin() + 1.0);
    let a = serial.observe_image(image.view()).unwrap();
    let b = rayon.observe_image(image.view()).unwrap();
    assert_abs_diff_eq!(a, b, epsilon = 0.0);

    let per_freq = Array2::from_shape_fn((8, serial.npix()), |(f, i)| (f * i) as f64);
    let a = serial.observe_image_per_freq(per_freq.view()).unwrap();
    let b = rayon.observe_image_per_freq(per_freq.view()).unwrap();
    assert_abs_diff_eq!(a, b, epsilon = 0.0);
}

#[test]
fn bad_image_shapes() {
    let telescope = small_redundant(Executor::Serial);
    assert!(matches!(
        telescope.observe_image(Array1::zeros(10).view()),
        Err(TelescopeError::ImageLength { .. })
    ));
    assert!(matches!(
        telescope.observe_image_per_freq(Array2::zeros((7, 257)).view()),
        Err(TelescopeError::ImageShape { .. })
    ));
    assert!(matches!(
        telescope.uvplane_to_rmap(Array2::zeros((8, 2)).view()),
        Err(TelescopeError::UvPlaneShape { .. })
    ));
}

#[test]
fn rmap_shape() {
    let telescope = small_redundant(Executor::Rayon);
    let mut image = telescope.empty_image();
    image[128] = 1.0;
    let uvplane = telescope.observe_image(image.view()).unwrap();
    let rmap = telescope.uvplane_to_rmap(uvplane.view()).unwrap();
    assert_eq!(rmap.dim(), (8, 257));
    assert!(rmap.iter().all(|v| v.is_finite()));
}

#[test]
fn single_dish_observes_nothing() {
    let telescope = Telescope1D::new(TelescopeConfig {
        nfreq: 3,
        ndishes: 1,
        npix_fft: 32,
        npad: 2,
        ..Default::default()
    })
    .unwrap();
    let uvplane = telescope
        .observe_image(telescope.empty_image().view())
        .unwrap();
    assert_eq!(uvplane.dim(), (3, 0));
}
