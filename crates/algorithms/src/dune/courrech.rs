//! Two modes for dune orientation
//!
//! In a multidirectional wind, dunes either grow in height from the flat
//! bed (orientation maximising the growth rate) or elongate from a fixed
//! source (orientation where the resultant crest flux runs along the crest).
//!
//! Reference:
//! Courrech du Pont, S., Narteau, C., & Gao, X. (2014). Two modes for dune
//! orientation. Geology, 42(9), 743-746.

use dunestrat_core::angles::{cosd, sind, vector_average};
use dunestrat_core::{Error, Result};

/// Default flux-up ratio `γ`
pub const FLUX_UP_RATIO: f64 = 1.6;

/// Dune orientations scanned by default: 0, 1, ..., 360 degrees
pub fn default_alpha_bins() -> Vec<f64> {
    (0..=360).map(|a| a as f64).collect()
}

fn check_flux(theta: &[f64], q0: &[f64]) -> Result<()> {
    if theta.len() != q0.len() {
        return Err(Error::SizeMismatch {
            what: "flux magnitudes",
            expected: theta.len(),
            actual: q0.len(),
        });
    }
    Ok(())
}

fn check_bins(alpha_bins: &[f64]) -> Result<()> {
    if alpha_bins.is_empty() {
        return Err(Error::invalid("alpha_bins", "[]", "must not be empty"));
    }
    Ok(())
}

/// Flux at the crest of a dune of orientation `alpha`: `Q0 (1 + γ |sin(θ - α)|)`
pub fn flux_at_crest(alpha: f64, theta: f64, q0: f64, gamma: f64) -> f64 {
    q0 * (1.0 + gamma * sind(theta - alpha).abs())
}

/// Vector average `(angle, norm)` of the crest fluxes
pub fn resultant_flux_at_crest(alpha: f64, theta: &[f64], q0: &[f64], gamma: f64) -> Result<(f64, f64)> {
    check_flux(theta, q0)?;
    let crest: Vec<f64> = theta
        .iter()
        .zip(q0.iter())
        .map(|(&t, &q)| flux_at_crest(alpha, t, q, gamma))
        .collect();
    Ok(vector_average(theta, &crest))
}

/// Component of the resultant crest flux normal to a crest of orientation `alpha`
pub fn resultant_flux_perp_crest(alpha: f64, theta: &[f64], q0: &[f64], gamma: f64) -> Result<f64> {
    let (rdd, rdp) = resultant_flux_at_crest(alpha, theta, q0, gamma)?;
    Ok(rdp * (cosd(alpha + 90.0) * cosd(rdd) + sind(alpha + 90.0) * sind(rdd)))
}

/// Growth rate of a bed of orientation `alpha` with a capture rate closure
/// `cr(alpha, theta, q0)`.
pub fn growth_rate_with<F>(alpha: f64, theta: &[f64], q0: &[f64], gamma: f64, capture_rate: F) -> Result<f64>
where
    F: Fn(f64, f64, f64) -> f64,
{
    check_flux(theta, q0)?;
    Ok(theta
        .iter()
        .zip(q0.iter())
        .map(|(&t, &q)| {
            let s = sind(t - alpha);
            capture_rate(alpha, t, q) * q * (s.abs() + gamma * s * s)
        })
        .sum())
}

/// `Σ Q0 (|sin(θ - α)| + γ sin²(θ - α))` with unit capture rate
pub fn growth_rate(alpha: f64, theta: &[f64], q0: &[f64], gamma: f64) -> Result<f64> {
    growth_rate_with(alpha, theta, q0, gamma, |_, _, _| 1.0)
}

fn argmax_bin(values: &[f64]) -> usize {
    let mut best = 0;
    for (k, &v) in values.iter().enumerate() {
        if v > values[best] || values[best].is_nan() {
            best = k;
        }
    }
    best
}

/// Orientation (mod 180) of dunes growing in height from a flat bed.
pub fn bed_instability_orientation(theta: &[f64], q0: &[f64], gamma: f64, alpha_bins: &[f64]) -> Result<f64> {
    check_bins(alpha_bins)?;
    let rates = alpha_bins
        .iter()
        .map(|&a| growth_rate(a, theta, q0, gamma))
        .collect::<Result<Vec<f64>>>()?;
    Ok(alpha_bins[argmax_bin(&rates)].rem_euclid(180.0))
}

/// Direction (mod 360) in which dunes elongate from a fixed sand source.
///
/// The crest orientation where the normal component of the resultant crest
/// flux vanishes, turned to point downwind of the resultant wind.
pub fn elongation_direction(theta: &[f64], q0: &[f64], gamma: f64, alpha_bins: &[f64]) -> Result<f64> {
    check_bins(alpha_bins)?;
    let perp = alpha_bins
        .iter()
        .map(|&a| resultant_flux_perp_crest(a, theta, q0, gamma).map(f64::abs))
        .collect::<Result<Vec<f64>>>()?;
    let mut best = 0;
    for (k, &v) in perp.iter().enumerate() {
        if v < perp[best] || perp[best].is_nan() {
            best = k;
        }
    }
    let alpha_f = alpha_bins[best];
    let (rdd, _) = vector_average(theta, q0);
    let along = cosd(alpha_f) * cosd(rdd) + sind(alpha_f) * sind(rdd);
    let direction = if along > 0.0 { alpha_f } else { alpha_f + 180.0 };
    Ok(direction.rem_euclid(360.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_flux_at_crest() {
        assert_abs_diff_eq!(flux_at_crest(0.0, 90.0, 2.0, 1.6), 5.2, epsilon = 1e-12);
        assert_abs_diff_eq!(flux_at_crest(10.0, 10.0, 2.0, 1.6), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unidirectional_wind_gives_transverse_dunes() {
        let theta = [0.0];
        let q0 = [1.0];
        let bins = default_alpha_bins();
        assert_abs_diff_eq!(
            bed_instability_orientation(&theta, &q0, FLUX_UP_RATIO, &bins).unwrap(),
            90.0
        );
        // Fingers point downwind
        assert_abs_diff_eq!(
            elongation_direction(&theta, &q0, FLUX_UP_RATIO, &bins).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_growth_rate_symmetry() {
        let theta = [30.0, 150.0];
        let q0 = [1.0, 1.0];
        let g1 = growth_rate(60.0, &theta, &q0, 1.6).unwrap();
        let g2 = growth_rate(120.0, &theta, &q0, 1.6).unwrap();
        assert_abs_diff_eq!(g1, g2, epsilon = 1e-12);
        let doubled = growth_rate_with(60.0, &theta, &q0, 1.6, |_, _, _| 2.0).unwrap();
        assert_abs_diff_eq!(doubled, 2.0 * g1, epsilon = 1e-12);
    }

    #[test]
    fn test_perp_flux_vanishes_along_wind() {
        let v = resultant_flux_perp_crest(45.0, &[45.0], &[3.0], 1.6).unwrap();
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
        let v = resultant_flux_perp_crest(0.0, &[90.0], &[1.0], 1.6).unwrap();
        assert_abs_diff_eq!(v, 2.6, epsilon = 1e-12);
    }

    #[test]
    fn test_mismatched_inputs() {
        assert!(growth_rate(0.0, &[0.0, 1.0], &[1.0], 1.6).is_err());
        assert!(bed_instability_orientation(&[0.0], &[1.0], 1.6, &[]).is_err());
    }
}
