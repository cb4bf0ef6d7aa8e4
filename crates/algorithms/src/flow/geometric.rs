//! Basal shear stress over oblique sinusoidal bedforms
//!
//! Geometrical model: a bed of orientation `α` (relative to the normal of the
//! wind) sees only the wind component across its crests, so the coefficients
//! scale as `A_x = A0 cos²α` and `A_y = A0 cosα sinα / 2` (same for `B`).

use num_complex::Complex64;
use dunestrat_core::angles::{cosd, sind};

pub fn ax(alpha: f64, a0: f64) -> f64 {
    a0 * cosd(alpha).powi(2)
}

pub fn ay(alpha: f64, a0: f64) -> f64 {
    a0 * cosd(alpha) * sind(alpha) / 2.0
}

pub fn bx(alpha: f64, b0: f64) -> f64 {
    b0 * cosd(alpha).powi(2)
}

pub fn by(alpha: f64, b0: f64) -> f64 {
    b0 * cosd(alpha) * sind(alpha) / 2.0
}

/// Non-dimensional shear stress `(τx, τy)` for a wind along `+x`.
///
/// # Arguments
/// * `x`, `y` - Non-dimensional coordinates `kx`, `ky`
/// * `alpha` - Bed orientation in degrees
/// * `a0`, `b0` - Hydrodynamic coefficients for `α = 0`
/// * `aspect_ratio` - `kξ`
pub fn basal_shear_stress(x: f64, y: f64, alpha: f64, a0: f64, b0: f64, aspect_ratio: f64) -> (f64, f64) {
    let phase = Complex64::new(0.0, cosd(alpha) * x + sind(alpha) * y).exp() * aspect_ratio;
    let tau_x = 1.0 + (Complex64::new(ax(alpha, a0), bx(alpha, b0)) * phase).re;
    let tau_y = (Complex64::new(ay(alpha, a0), by(alpha, b0)) * phase).re;
    (tau_x, tau_y)
}

/// Shear stress for a wind blowing towards `theta` (degrees, counterclockwise from `+x`).
pub fn basal_shear_stress_rotated(
    x: f64,
    y: f64,
    alpha: f64,
    a0: f64,
    b0: f64,
    aspect_ratio: f64,
    theta: f64,
) -> (f64, f64) {
    let (c, s) = (cosd(theta), sind(theta));
    let x_rot = x * c + y * s;
    let y_rot = y * c - x * s;
    let alpha_rot = (alpha - theta + 90.0).rem_euclid(180.0) - 90.0;
    let (tx, ty) = basal_shear_stress(x_rot, y_rot, alpha_rot, a0, b0, aspect_ratio);
    (c * tx - s * ty, s * tx + c * ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_coefficients_transverse_bed() {
        assert_abs_diff_eq!(ax(0.0, 4.0), 4.0, epsilon = 1e-15);
        assert_abs_diff_eq!(ay(0.0, 4.0), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(ay(45.0, 4.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bx(90.0, 2.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(by(45.0, 2.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_bed_gives_unit_stress() {
        let (tx, ty) = basal_shear_stress(1.3, -0.7, 20.0, 4.0, 2.0, 0.0);
        assert_abs_diff_eq!(tx, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(ty, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_stress_leads_crest() {
        // Transverse bed: τx = 1 + kξ (A0 cos x - B0 sin x)
        let (a0, b0, ar) = (4.0, 2.0, 0.1);
        let x = 0.4;
        let (tx, _) = basal_shear_stress(x, 0.0, 0.0, a0, b0, ar);
        assert_abs_diff_eq!(tx, 1.0 + ar * (a0 * x.cos() - b0 * x.sin()), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_zero_is_identity() {
        let direct = basal_shear_stress(0.5, 1.5, 30.0, 4.0, 2.0, 0.1);
        let rotated = basal_shear_stress_rotated(0.5, 1.5, 30.0, 4.0, 2.0, 0.1, 0.0);
        assert_abs_diff_eq!(direct.0, rotated.0, epsilon = 1e-12);
        assert_abs_diff_eq!(direct.1, rotated.1, epsilon = 1e-12);
    }

    #[test]
    fn test_rotated_flat_bed_follows_wind() {
        let (tx, ty) = basal_shear_stress_rotated(0.2, 0.3, 10.0, 4.0, 2.0, 0.0, 90.0);
        assert_abs_diff_eq!(tx, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ty, 1.0, epsilon = 1e-12);
    }
}
