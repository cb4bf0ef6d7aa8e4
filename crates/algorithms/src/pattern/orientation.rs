//! Dominant orientation of an autocorrelation map
//!
//! Correlation decays slowest along the crests, so integrating the map along
//! rays from its peak and taking the angle of the largest sum gives the
//! crest orientation. Angles are measured in the pixel frame from `+col`
//! towards `+row`.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use dunestrat_core::angles::{cosd, sind};
use dunestrat_core::{Error, Result};

use crate::maybe_rayon::*;

/// Radial integrals for every scanned angle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationScan {
    /// Angle of the largest integral, in `[0, 180)`
    pub orientation: f64,
    pub angles: Vec<f64>,
    pub integral: Vec<f64>,
}

/// Scan angles `0, step, 2·step, ... < 180`
pub fn scan_angles(step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0 && step < 180.0) {
        return Err(Error::invalid("angle_step", step, "must be in (0, 180)"));
    }
    let n = (180.0 / step).ceil() as usize;
    Ok((0..n).map(|k| k as f64 * step).filter(|&a| a < 180.0).collect())
}

/// Sum of `c` over `radius` nearest-pixel samples along the ray at `angle`
fn ray_integral(c: ArrayView2<'_, f64>, peak: (usize, usize), radius: usize, angle: f64) -> f64 {
    let (rows, cols) = c.dim();
    let (s, co) = (sind(angle), cosd(angle));
    let clamp = |v: f64, len: usize| (v.round().max(0.0) as usize).min(len - 1);
    (0..radius)
        .map(|r| {
            let row = clamp(peak.0 as f64 + s * r as f64, rows);
            let col = clamp(peak.1 as f64 + co * r as f64, cols);
            c[[row, col]]
        })
        .sum()
}

/// Find the angle along which `c` decays slowest away from `peak`.
pub fn dominant_orientation(
    c: ArrayView2<'_, f64>,
    peak: (usize, usize),
    radius: usize,
    step: f64,
) -> Result<OrientationScan> {
    let (rows, cols) = c.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { width: cols, height: rows });
    }
    if peak.0 >= rows || peak.1 >= cols {
        return Err(Error::invalid(
            "peak",
            format!("{:?}", peak),
            format!("must lie inside {}x{}", rows, cols),
        ));
    }
    if radius == 0 {
        return Err(Error::invalid("integration_radius", radius, "must be > 0"));
    }
    let angles = scan_angles(step)?;

    let integral: Vec<f64> = (0..angles.len())
        .into_par_iter()
        .map(|k| ray_integral(c, peak, radius, angles[k]))
        .collect();

    let mut best = 0;
    for (k, &v) in integral.iter().enumerate() {
        if v > integral[best] {
            best = k;
        }
    }
    Ok(OrientationScan {
        orientation: angles[best],
        angles,
        integral,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_scan_angles() {
        let angles = scan_angles(1.0).unwrap();
        assert_eq!(angles.len(), 180);
        assert_eq!(angles[179], 179.0);
        assert_eq!(scan_angles(7.0).unwrap().len(), 26);
        assert!(scan_angles(0.0).is_err());
        assert!(scan_angles(180.0).is_err());
    }

    #[test]
    fn test_ridge_along_columns() {
        // Correlation constant along the row through the peak
        let mut c = Array2::zeros((21, 21));
        for col in 0..21 {
            c[[10, col]] = 1.0;
        }
        let scan = dominant_orientation(c.view(), (10, 10), 8, 1.0).unwrap();
        assert_abs_diff_eq!(scan.orientation, 0.0);
        assert_abs_diff_eq!(scan.integral[0], 8.0);
    }

    #[test]
    fn test_diagonal_ridge() {
        let mut c = Array2::zeros((41, 41));
        for k in 0..41 {
            c[[k, k]] = 1.0;
        }
        let scan = dominant_orientation(c.view(), (20, 20), 15, 1.0).unwrap();
        assert_abs_diff_eq!(scan.orientation, 45.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let c = Array2::zeros((5, 5));
        assert!(dominant_orientation(c.view(), (2, 2), 0, 1.0).is_err());
        assert!(dominant_orientation(c.view(), (7, 2), 3, 1.0).is_err());
    }
}
