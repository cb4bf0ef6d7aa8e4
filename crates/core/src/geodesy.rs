//! Geodesic distances on the reference ellipsoid
//!
//! Used to turn grid steps of a geographic DEM into ground distances
//! (Vincenty 1975 inverse problem). Only short baselines along one row or
//! one column of a grid are needed; the iteration is reported as an error
//! when it does not settle instead of silently falling back to a sphere.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

const MAX_ITERATIONS: usize = 200;
const LAMBDA_TOLERANCE: f64 = 1e-12;

/// Reference ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spheroid {
    /// Semi-major axis in meters. Default: WGS84
    pub semi_major: f64,
    /// Flattening. Default: WGS84
    pub flattening: f64,
}

impl Default for Spheroid {
    fn default() -> Self {
        Self {
            semi_major: WGS84_A,
            flattening: WGS84_F,
        }
    }
}

impl Spheroid {
    fn semi_minor(&self) -> f64 {
        self.semi_major * (1.0 - self.flattening)
    }

    /// Second eccentricity squared scaled by `cos²α`
    fn u_squared(&self, cos2_alpha: f64) -> f64 {
        let (a, b) = (self.semi_major, self.semi_minor());
        cos2_alpha * (a * a - b * b) / (b * b)
    }
}

/// Angular quantities on the auxiliary sphere once `λ` has converged
struct AuxiliaryArc {
    sigma: f64,
    sin_sigma: f64,
    cos_sigma: f64,
    cos2_alpha: f64,
    cos_2sigma_m: f64,
}

impl AuxiliaryArc {
    /// `-1 + 2cos²2σm`, shared by the λ update and the length series
    fn bracket(&self) -> f64 {
        -1.0 + 2.0 * self.cos_2sigma_m * self.cos_2sigma_m
    }

    /// Geodesic length on `spheroid`
    fn length(&self, spheroid: &Spheroid) -> f64 {
        let u_sq = spheroid.u_squared(self.cos2_alpha);
        let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let delta_sigma = big_b
            * self.sin_sigma
            * (self.cos_2sigma_m
                + big_b / 4.0
                    * (self.cos_sigma * self.bracket()
                        - big_b / 6.0
                            * self.cos_2sigma_m
                            * (-3.0 + 4.0 * self.sin_sigma * self.sin_sigma)
                            * (-3.0 + 4.0 * self.cos_2sigma_m * self.cos_2sigma_m)));
        spheroid.semi_minor() * big_a * (self.sigma - delta_sigma)
    }
}

/// Iterate the longitude on the auxiliary sphere; `None` for coincident points.
fn converge_lambda(lat1: f64, lat2: f64, dlon: f64, f: f64) -> Result<Option<AuxiliaryArc>> {
    let (sin_u1, cos_u1) = ((1.0 - f) * lat1.tan()).atan().sin_cos();
    let (sin_u2, cos_u2) = ((1.0 - f) * lat2.tan()).atan().sin_cos();

    let mut lambda = dlon;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma < 1e-15 {
            return Ok(None);
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos2_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos²α = 0
        let cos_2sigma_m = if cos2_alpha > 1e-15 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos2_alpha
        } else {
            0.0
        };
        let arc = AuxiliaryArc {
            sigma: sin_sigma.atan2(cos_sigma),
            sin_sigma,
            cos_sigma,
            cos2_alpha,
            cos_2sigma_m,
        };

        let c = f / 16.0 * cos2_alpha * (4.0 + f * (4.0 - 3.0 * cos2_alpha));
        let next = dlon
            + (1.0 - c) * f * sin_alpha * (arc.sigma + c * sin_sigma * (cos_2sigma_m + c * cos_sigma * arc.bracket()));
        if (next - lambda).abs() < LAMBDA_TOLERANCE {
            return Ok(Some(arc));
        }
        lambda = next;
    }

    Err(Error::Algorithm(format!(
        "Vincenty iteration did not converge in {} steps (nearly antipodal points?)",
        MAX_ITERATIONS
    )))
}

/// Vincenty inverse formula: geodesic distance between two points.
///
/// # Arguments
/// * `lat1`, `lon1` - Point 1 in radians
/// * `lat2`, `lon2` - Point 2 in radians
///
/// # Returns
/// Distance in meters, or an error when the iteration does not converge
pub fn vincenty_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, spheroid: &Spheroid) -> Result<f64> {
    let inputs = [lat1, lon1, lat2, lon2];
    if let Some(bad) = inputs.iter().find(|v| !v.is_finite()) {
        return Err(Error::invalid("coordinate", bad, "must be finite"));
    }
    Ok(converge_lambda(lat1, lat2, lon2 - lon1, spheroid.flattening)?
        .map_or(0.0, |arc| arc.length(spheroid)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = vincenty_distance(0.0, 0.0, 0.0, 1f64.to_radians(), &Spheroid::default()).unwrap();
        assert_relative_eq!(d, 111_319.49, epsilon = 0.1);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = vincenty_distance(0.0, 0.0, 1f64.to_radians(), 0.0, &Spheroid::default()).unwrap();
        // Meridian arc from 0° to 1° on WGS84
        assert_relative_eq!(d, 110_574.4, epsilon = 1.0);
    }

    #[test]
    fn test_short_parallel_baseline_in_the_namib() {
        let (lat, lon) = ((-24f64).to_radians(), 15f64.to_radians());
        let d = vincenty_distance(lat, lon, lat, lon + 0.3f64.to_radians(), &Spheroid::default()).unwrap();
        assert_relative_eq!(d, 30_525.5, epsilon = 1.0);
    }

    #[test]
    fn test_coincident_points() {
        let p = 0.3_f64;
        assert_eq!(vincenty_distance(p, p, p, p, &Spheroid::default()).unwrap(), 0.0);
    }

    #[test]
    fn test_nearly_antipodal_points_report_non_convergence() {
        let err = vincenty_distance(0.0, 0.0, 0.5f64.to_radians(), 179.7f64.to_radians(), &Spheroid::default())
            .unwrap_err();
        assert!(matches!(err, Error::Algorithm(_)));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        assert!(vincenty_distance(f64::NAN, 0.0, 0.0, 0.0, &Spheroid::default()).is_err());
    }
}
