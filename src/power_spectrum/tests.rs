// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::{telescope::TelescopeConfig, Executor};

fn telescope() -> Telescope1D {
    Telescope1D::new(TelescopeConfig {
        nfreq: 16,
        ndishes: 4,
        npix_fft: 256,
        npad: 2,
        redundant: true,
        executor: Executor::Serial,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn blackman_window_values() {
    let w = Window::Blackman.weights(5);
    assert_abs_diff_eq!(
        w,
        array![-1.38777878e-17, 0.34, 1.0, 0.34, -1.38777878e-17],
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(Window::Blackman.weights(1), array![1.0]);
    assert_abs_diff_eq!(Window::None.weights(3), array![1.0, 1.0, 1.0]);
}

#[test]
fn rmap_ps_shapes() {
    let t = telescope();
    let rmap = Array2::from_shape_fn((16, 257), |(f, p)| (f as f64 * 0.3 + p as f64).sin());
    let ps = t.get_rmap_ps(rmap.view(), &PsConfig::default()).unwrap();
    // 4 frequencies per chunk, padded to 8, gives 5 delay rows and 2 bins.
    assert_eq!(ps.chunks.len(), 4);
    for chunk in &ps.chunks {
        assert_eq!(chunk.dim(), (2, 128));
        assert!(chunk.iter().all(|&v| v >= 0.0));
    }
    assert_eq!(ps.k_modes.len(), 4);
    assert_eq!(ps.k_modes[0].len(), 2);
    assert_eq!(ps.columns.len(), 128);
    assert_abs_diff_eq!(ps.columns[0], (t.alpha()[0] + t.alpha()[1]) / 2.0);
}

#[test]
fn constant_map_only_has_zero_delay_power() {
    let t = telescope();
    let rmap = Array2::from_elem((16, 257), 3.0);
    let config = PsConfig {
        padding: 0,
        m_freq: 1,
        m_cols: 1,
        window: Window::None,
        ..Default::default()
    };
    let ps = t.get_rmap_ps(rmap.view(), &config).unwrap();
    for chunk in &ps.chunks {
        assert_eq!(chunk.dim(), (3, 257));
        for j in 0..257 {
            assert_abs_diff_eq!(chunk[[0, j]], 144.0, epsilon = 1e-9);
            assert_abs_diff_eq!(chunk[[1, j]], 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(chunk[[2, j]], 0.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn k_modes_follow_the_distance() {
    let t = telescope();
    let rmap = Array2::zeros((16, 257));
    let distance = |_: f64, _: f64| 100.0;
    let ps = t
        .get_rmap_ps_with(rmap.view(), &PsConfig::default(), &distance)
        .unwrap();
    let k0 = TAU / 100.0 / 2.0;
    for k in &ps.k_modes {
        assert_abs_diff_eq!(k[0], 0.5 * k0, epsilon = 1e-12);
        assert_abs_diff_eq!(k[1], 2.5 * k0, epsilon = 1e-12);
    }

    // The default cosmology gives positive, increasing modes.
    let ps = t.get_rmap_ps(rmap.view(), &PsConfig::default()).unwrap();
    for k in &ps.k_modes {
        assert!(k[0] > 0.0 && k[1] > k[0]);
    }
}

#[test]
fn cross_spectrum_with_itself_is_the_auto_spectrum() {
    let t = telescope();
    let uvplane = Array2::from_shape_fn(t.uvplane_shape(), |(f, b)| {
        c64::new((f * b) as f64, f as f64 - b as f64)
    });
    let config = PsConfig {
        m_cols: 1,
        ..Default::default()
    };
    let auto = t.get_uvplane_ps(uvplane.view(), None, &config).unwrap();
    let cross = t
        .get_uvplane_ps(uvplane.view(), Some(uvplane.view()), &config)
        .unwrap();
    for (a, c) in auto.chunks.iter().zip(cross.chunks.iter()) {
        assert_abs_diff_eq!(*a, *c, epsilon = 1e-9);
    }
    assert_abs_diff_eq!(auto.columns, array![6.0, 12.0, 18.0]);

    let binned = t
        .get_uvplane_ps(uvplane.view(), None, &PsConfig::default())
        .unwrap();
    assert_abs_diff_eq!(binned.columns, array![9.0]);
}

#[test]
fn uvplane_spectra_only_see_real_parts() {
    let t = telescope();
    let imaginary = Array2::from_shape_fn(t.uvplane_shape(), |(f, b)| {
        c64::new(0.0, 1.0 + (f * b) as f64)
    });
    let config = PsConfig {
        m_cols: 1,
        ..Default::default()
    };
    let ps = t.get_uvplane_ps(imaginary.view(), None, &config).unwrap();
    for chunk in &ps.chunks {
        assert!(chunk.iter().all(|&v| v == 0.0));
    }

    let real = Array2::from_shape_fn(t.uvplane_shape(), |(f, b)| {
        c64::new((f + b) as f64, 0.0)
    });
    let a = t.get_uvplane_ps(real.view(), None, &config).unwrap();
    let b = t
        .get_uvplane_ps((&real + &imaginary).view(), None, &config)
        .unwrap();
    for (a, b) in a.chunks.iter().zip(b.chunks.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
    }
}

#[test]
fn bad_power_spectrum_inputs() {
    let t = telescope();
    let rmap = Array2::zeros((16, 257));
    let result = t.get_rmap_ps(
        rmap.view(),
        &PsConfig {
            n_freq_chunks: 0,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(PowerSpectrumError::NoChunks)));

    let result = t.get_rmap_ps(
        rmap.view(),
        &PsConfig {
            n_freq_chunks: 17,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(PowerSpectrumError::TooManyChunks { .. })));

    let result = t.get_rmap_ps(
        rmap.view(),
        &PsConfig {
            m_freq: 6,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(PowerSpectrumError::NoBins { .. })));

    let result = t.get_rmap_ps(Array2::zeros((16, 10)).view(), &PsConfig::default());
    assert!(matches!(result, Err(PowerSpectrumError::Shape { .. })));

    let uvplane = Array2::zeros(t.uvplane_shape());
    let result = t.get_uvplane_ps(
        uvplane.view(),
        Some(Array2::zeros((16, 2)).view()),
        &PsConfig::default(),
    );
    assert!(matches!(result, Err(PowerSpectrumError::Shape { .. })));

    let result = t.get_rmap_ps_with(rmap.view(), &PsConfig::default(), &|_: f64, _: f64| 0.0);
    assert!(matches!(result, Err(PowerSpectrumError::BadDistance { .. })));
}

#[test]
fn wedge_accumulates_delay_power() {
    let t = telescope();
    let params = ObsParams {
        error_sigma: 0.0,
        ..Default::default()
    };
    let wedge = t.get_wedge(1, &params).unwrap();
    assert_eq!(wedge.dim(), (17, 3));
    assert!(wedge.iter().all(|&v| v >= 0.0));

    // The zero-delay power is the squared sum over frequency.
    let sky = t.get_uniform_sky(1.0, 0).unwrap();
    let uvplane = t.observe_image(sky.view()).unwrap();
    for j in 0..3 {
        let total: f64 = uvplane.column(j).iter().map(|v| v.re).sum();
        assert_abs_diff_eq!(wedge[[0, j]], total * total, epsilon = 1e-9 * total * total);
    }

    let two = t.get_wedge(2, &params).unwrap();
    assert!(two.iter().zip(wedge.iter()).all(|(&b, &a)| b >= a));

    let corrupted = t
        .get_wedge(
            1,
            &ObsParams {
                error_sigma: 1e-10,
                filter_fg: false,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(corrupted.dim(), (17, 3));
    assert_ne!(corrupted, wedge);
}

#[test]
fn residuals() {
    let t = telescope();
    let no_error = Array2::from_shape_fn((16, 257), |(f, _)| 2.0 + f as f64);
    let with_error = &no_error + 1.0;

    let r = t.rmap_residuals(no_error.view(), with_error.view(), 4).unwrap();
    assert_eq!(r.freqs.len(), 4);
    assert_abs_diff_eq!(r.freqs[0], t.freqs().slice(s![..4]).mean().unwrap(), epsilon = 1e-12);
    // The first group's maximum is 5.
    assert_abs_diff_eq!(r.residuals[[0, 0]], 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(r.residuals[[3, 100]], 0.2, epsilon = 1e-12);
    // The last group's maximum is 17.
    assert_abs_diff_eq!(r.residuals[[12, 0]], 1.0 / 17.0, epsilon = 1e-12);

    // 16 = 3 * 5 + 1; the last row is its own group.
    let r = t.rmap_residuals(no_error.view(), with_error.view(), 5).unwrap();
    assert_eq!(r.freqs.len(), 3);
    assert_abs_diff_eq!(r.residuals[[15, 0]], 1.0 / 17.0, epsilon = 1e-12);

    assert!(matches!(
        t.rmap_residuals(no_error.view(), with_error.view(), 0),
        Err(PowerSpectrumError::BadResidualBinning { .. })
    ));
}
