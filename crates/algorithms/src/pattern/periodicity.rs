//! Orientation, wavelength and amplitude of a 2-D dune pattern
//!
//! 1. Remove the polynomial trend of the DEM.
//! 2. Autocorrelate the residual.
//! 3. Orientation: angle of slowest decay of the autocorrelation.
//! 4. Transect of the autocorrelation across the crests, from its peak.
//! 5. Wavelength: first positive peak of the transect.
//! 6. Amplitude: `sqrt(2 C(0, 0))`, exact for a sinusoid.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;
use dunestrat_core::geodesy::Spheroid;
use dunestrat_core::raster::Raster;
use dunestrat_core::station::DunePattern;
use dunestrat_core::{Algorithm, Error, Result};

use super::correlation::{argmax, autocorrelate};
use super::detrend::{detrend, DetrendParams};
use super::orientation::dominant_orientation;
use super::peaks::{find_first_max, PeakSelection};
use super::transect::{array_transect, Interpolation};
use dunestrat_core::angles::{cosd, sind};

/// Parameters for the pattern analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicityParams {
    /// Length in pixels of the rays integrated for the orientation
    pub integration_radius: usize,
    /// Orientation resolution in degrees
    pub angle_step: f64,
    /// Which transect peak gives the wavelength
    pub peak_selection: PeakSelection,
    /// Orientations within this many degrees of a grid axis use a native slice
    pub axis_tolerance: f64,
    /// Trend removed before the analysis (used by `analyze_pattern`)
    pub detrend: DetrendParams,
}

impl Default for PeriodicityParams {
    fn default() -> Self {
        Self {
            integration_radius: 40,
            angle_step: 1.0,
            peak_selection: PeakSelection::First,
            axis_tolerance: 2.0,
            detrend: DetrendParams::default(),
        }
    }
}

impl PeriodicityParams {
    pub fn validate(&self) -> Result<()> {
        if self.integration_radius == 0 {
            return Err(Error::invalid("integration_radius", 0, "must be > 0"));
        }
        if !(self.angle_step > 0.0 && self.angle_step < 180.0) {
            return Err(Error::invalid("angle_step", self.angle_step, "must be in (0, 180)"));
        }
        if !(self.axis_tolerance >= 0.0 && self.axis_tolerance < 45.0) {
            return Err(Error::invalid("axis_tolerance", self.axis_tolerance, "must be in [0, 45)"));
        }
        Ok(())
    }
}

/// Result of the pattern analysis
#[derive(Debug, Clone, Serialize)]
pub struct PatternDescriptor {
    /// Crest orientation in degrees, `[0, 180)`, pixel frame
    pub orientation: f64,
    /// Wavelength in kilometres (pixels for `periodicity_2d`); NaN if no peak
    pub wavelength: f64,
    /// Wavelength in pixels; NaN if no peak
    pub wavelength_px: f64,
    /// Amplitude in elevation units
    pub amplitude: f64,
    /// Ground length of one pixel in kilometres (1 for pixel units)
    pub km_step: f64,
    /// Autocorrelation peak `(row, col)`
    pub p0: (f64, f64),
    /// End of the transect `(row, col)`
    pub p1: (f64, f64),
    pub transect: Vec<f64>,
    /// Scanned angles and their radial integrals
    pub angles: Vec<f64>,
    pub angular_integral: Vec<f64>,
    #[serde(skip)]
    pub autocorrelation: Array2<f64>,
}

impl PatternDescriptor {
    /// Compact record stored on a station
    pub fn summary(&self) -> DunePattern {
        DunePattern {
            orientation: self.orientation,
            wavelength_km: self.wavelength,
            amplitude: self.amplitude,
        }
    }
}

/// Pattern analysis algorithm
#[derive(Debug, Clone, Default)]
pub struct PatternAnalysis;

impl Algorithm for PatternAnalysis {
    type Input = Raster;
    type Output = PatternDescriptor;
    type Params = PeriodicityParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PatternAnalysis"
    }

    fn description(&self) -> &'static str {
        "Orientation, wavelength and amplitude of a periodic dune pattern from its DEM"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        analyze_pattern(&input, params)
    }
}

/// Autocorrelation profile across the crests.
///
/// Returns the profile and its end point. Near-axis orientations read a
/// native row or column of `c`; the others are interpolated.
fn crest_normal_transect(
    c: ArrayView2<'_, f64>,
    peak: (usize, usize),
    orientation: f64,
    length: usize,
    axis_tolerance: f64,
) -> (Vec<f64>, (f64, f64)) {
    let (rows, cols) = c.dim();
    let (pr, pc) = peak;
    if (orientation - 90.0).abs() < axis_tolerance {
        // Crests run along +row: cross them along +col
        let profile = c.slice(ndarray::s![pr, pc..]).to_vec();
        (profile, (pr as f64, (cols - 1) as f64))
    } else if orientation < axis_tolerance || orientation > 180.0 - axis_tolerance {
        // Crests run along +col: cross them along +row
        let profile = c.slice(ndarray::s![pr.., pc]).to_vec();
        (profile, ((rows - 1) as f64, pc as f64))
    } else {
        let p0 = (pr as f64, pc as f64);
        let len = length as f64;
        let p1 = (
            p0.0 + sind(orientation + 90.0) * len,
            p0.1 + cosd(orientation + 90.0) * len,
        );
        (array_transect(c, p0, p1, Interpolation::Cubic, length + 1), p1)
    }
}

/// Analyse an already de-trended field; distances are in pixels.
///
/// # Arguments
/// * `residual` - De-trended elevation field
/// * `params` - Orientation scan and peak selection settings
pub fn periodicity_2d(residual: ArrayView2<'_, f64>, params: &PeriodicityParams) -> Result<PatternDescriptor> {
    params.validate()?;
    let (rows, cols) = residual.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { width: cols, height: rows });
    }

    let c = autocorrelate(residual)?;
    let peak = argmax(c.view()).ok_or_else(|| Error::Algorithm("autocorrelation has no finite value".into()))?;
    let scan = dominant_orientation(c.view(), peak, params.integration_radius, params.angle_step)?;

    let (transect, p1) = crest_normal_transect(
        c.view(),
        peak,
        scan.orientation,
        rows.min(cols),
        params.axis_tolerance,
    );
    let wavelength_px = find_first_max(&transect, params.peak_selection, 0, None)
        .map(|p| p as f64)
        .unwrap_or(f64::NAN);
    let amplitude = (2.0 * transect[0]).sqrt();

    debug!(
        orientation = scan.orientation,
        wavelength_px,
        amplitude,
        "periodicity"
    );

    Ok(PatternDescriptor {
        orientation: scan.orientation,
        wavelength: wavelength_px,
        wavelength_px,
        amplitude,
        km_step: 1.0,
        p0: (peak.0 as f64, peak.1 as f64),
        p1,
        transect,
        angles: scan.angles,
        angular_integral: scan.integral,
        autocorrelation: c,
    })
}

/// De-trend a georeferenced DEM and extract its pattern; wavelength in km.
pub fn analyze_pattern(dem: &Raster, params: PeriodicityParams) -> Result<PatternDescriptor> {
    params.validate()?;
    let (residual, _) = detrend(dem, params.detrend)?;
    let mut descriptor = periodicity_2d(residual.view(), &params)?;
    let km_step = dem.axes().km_step(&Spheroid::default())?;
    descriptor.km_step = km_step;
    descriptor.wavelength = descriptor.wavelength_px * km_step;
    debug!(km_step, wavelength_km = descriptor.wavelength, "pattern");
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Crests along `crest` degrees in the pixel frame
    fn dunes(size: usize, wavelength: f64, crest: f64, amplitude: f64) -> Array2<f64> {
        let k = 2.0 * std::f64::consts::PI / wavelength;
        let (c, s) = (cosd(crest + 90.0), sind(crest + 90.0));
        Array2::from_shape_fn((size, size), |(row, col)| {
            amplitude * (k * (col as f64 * c + row as f64 * s)).cos()
        })
    }

    #[test]
    fn test_params_validation() {
        assert!(PeriodicityParams::default().validate().is_ok());
        let bad = PeriodicityParams {
            integration_radius: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = PeriodicityParams {
            angle_step: 200.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_crests_along_rows_use_native_slice() {
        let field = dunes(64, 16.0, 90.0, 1.0);
        let d = periodicity_2d(field.view(), &PeriodicityParams::default()).unwrap();
        assert_abs_diff_eq!(d.orientation, 90.0, epsilon = 2.0);
        assert_eq!(d.p0, (63.0, 63.0));
        assert_eq!(d.transect.len(), 64);
        assert_abs_diff_eq!(d.wavelength_px, 16.0, epsilon = 1.0);
    }

    #[test]
    fn test_zero_field_has_no_wavelength() {
        let field = Array2::zeros((32, 40));
        let d = periodicity_2d(field.view(), &PeriodicityParams::default()).unwrap();
        assert!(d.wavelength.is_nan());
        assert_eq!(d.amplitude, 0.0);
    }

    #[test]
    fn test_summary() {
        let field = dunes(64, 16.0, 45.0, 2.0);
        let d = periodicity_2d(field.view(), &PeriodicityParams::default()).unwrap();
        let s = d.summary();
        assert_eq!(s.orientation, d.orientation);
        assert_eq!(s.amplitude, d.amplitude);
    }
}
