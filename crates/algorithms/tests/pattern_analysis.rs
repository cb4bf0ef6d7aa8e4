//! Pattern extraction on synthetic dune fields.
//!
//! Fields are `amplitude · cos(2π/λ · d)` where `d` is the distance across
//! the crests; the crest orientation is given in the pixel frame (from
//! `+col` towards `+row`).

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use dunestrat_algorithms::pattern::{analyze_pattern, periodicity_2d, PatternAnalysis, PeakSelection, PeriodicityParams};
use dunestrat_core::angles::{cosd, sind, smallest_signed_angle_between};
use dunestrat_core::raster::{GridAxes, Raster};
use dunestrat_core::{Algorithm, Error};

fn dune_field(size: usize, wavelength: f64, crest: f64, amplitude: f64) -> Array2<f64> {
    let k = 2.0 * std::f64::consts::PI / wavelength;
    let (c, s) = (cosd(crest + 90.0), sind(crest + 90.0));
    Array2::from_shape_fn((size, size), |(row, col)| {
        amplitude * (k * (col as f64 * c + row as f64 * s)).cos()
    })
}

/// Orientation error on the undirected axis
fn axis_error(found: f64, expected: f64) -> f64 {
    let e = smallest_signed_angle_between(found, expected).abs();
    e.min(180.0 - e)
}

// ---------------------------------------------------------------------------
// Synthetic recovery
// ---------------------------------------------------------------------------

#[test]
fn recovers_oblique_pattern() {
    for &crest in &[30.0, 120.0] {
        let field = dune_field(200, 50.0, crest, 2.0);
        let d = periodicity_2d(field.view(), &PeriodicityParams::default()).unwrap();
        assert!(axis_error(d.orientation, crest) <= 2.0, "crest {} found {}", crest, d.orientation);
        assert_abs_diff_eq!(d.wavelength_px, 50.0, epsilon = 2.0);
        assert_abs_diff_eq!(d.amplitude, 2.0, epsilon = 0.2);
        assert!(d.orientation >= 0.0 && d.orientation < 180.0);
    }
}

#[test]
fn recovers_axis_aligned_patterns() {
    for &crest in &[0.0, 90.0] {
        let field = dune_field(128, 32.0, crest, 1.0);
        let d = periodicity_2d(field.view(), &PeriodicityParams::default()).unwrap();
        assert!(axis_error(d.orientation, crest) <= 2.0, "crest {} found {}", crest, d.orientation);
        assert_abs_diff_eq!(d.wavelength_px, 32.0, epsilon = 2.0);
        assert_eq!(d.p0, (127.0, 127.0));
    }
}

#[test]
fn highest_peak_selection() {
    let field = dune_field(128, 32.0, 45.0, 1.0);
    let params = PeriodicityParams {
        peak_selection: PeakSelection::Max,
        ..Default::default()
    };
    let d = periodicity_2d(field.view(), &params).unwrap();
    // The autocorrelation envelope decays, so the highest peak is the first one
    assert_abs_diff_eq!(d.wavelength_px, 32.0, epsilon = 2.0);
}

#[test]
fn analysis_is_deterministic() {
    let field = dune_field(96, 24.0, 65.0, 3.0);
    let params = PeriodicityParams::default();
    let first = periodicity_2d(field.view(), &params).unwrap();
    let second = periodicity_2d(field.view(), &params).unwrap();
    assert_eq!(first.orientation.to_bits(), second.orientation.to_bits());
    assert_eq!(first.wavelength.to_bits(), second.wavelength.to_bits());
    assert_eq!(first.amplitude.to_bits(), second.amplitude.to_bits());
    assert_eq!(first.transect, second.transect);
}

// ---------------------------------------------------------------------------
// Georeferenced DEMs
// ---------------------------------------------------------------------------

fn namib_axes(size: usize) -> GridAxes {
    // ~30 m pixels near 24°S
    GridAxes::regular(size, size, 15.0, -24.0, 0.0003, 0.0003).unwrap()
}

#[test]
fn polynomial_dem_has_no_wavelength() {
    let axes = namib_axes(64);
    let (lon, lat) = axes.meshgrid();
    let z: Vec<f64> = lon
        .iter()
        .zip(lat.iter())
        .map(|(x, y)| 800.0 + 2.0e4 * (x - 15.0) - 1.0e4 * (y + 24.0) + 5.0e6 * (x - 15.0) * (y + 24.0))
        .collect();
    let dem = Raster::with_axes(Array2::from_shape_vec((64, 64), z).unwrap(), axes).unwrap();
    let d = analyze_pattern(&dem, PeriodicityParams::default()).unwrap();
    assert!(d.wavelength.is_nan());
    assert_eq!(d.amplitude, 0.0);
}

#[test]
fn wavelength_converted_to_kilometres() {
    let size = 160;
    let axes = namib_axes(size);
    let field = dune_field(size, 40.0, 60.0, 5.0);
    let (lon, lat) = axes.meshgrid();
    let mut data = field.clone();
    for ((row, col), v) in data.indexed_iter_mut() {
        let k = row * size + col;
        *v += 900.0 + 3.0e4 * (lon[k] - 15.0) + 2.0e4 * (lat[k] + 24.0);
    }
    let dem = Raster::with_axes(data, axes).unwrap();
    let d = PatternAnalysis.execute_default(dem).unwrap();

    assert!(d.km_step > 0.025 && d.km_step < 0.035, "km_step {}", d.km_step);
    assert_abs_diff_eq!(d.wavelength, d.wavelength_px * d.km_step, epsilon = 1e-12);
    assert_abs_diff_eq!(d.wavelength_px, 40.0, epsilon = 2.0);
    assert!(axis_error(d.orientation, 60.0) <= 2.0);
    assert_abs_diff_eq!(d.amplitude, 5.0, epsilon = 0.5);

    let summary = d.summary();
    assert_eq!(summary.wavelength_km, d.wavelength);
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

#[test]
fn rejects_empty_and_invalid_settings() {
    let empty = Array2::<f64>::zeros((0, 10));
    assert!(matches!(
        periodicity_2d(empty.view(), &PeriodicityParams::default()),
        Err(Error::InvalidDimensions { .. })
    ));
    let field = dune_field(32, 8.0, 10.0, 1.0);
    let params = PeriodicityParams {
        integration_radius: 0,
        ..Default::default()
    };
    assert!(matches!(
        periodicity_2d(field.view(), &params),
        Err(Error::InvalidParameter { .. })
    ));
}
