//! Fitted hydrodynamic coefficients for an unbounded neutral boundary layer
//!
//! Rational fits of `A0` and `B0` against `R = ln(2π/η0)`.
//!
//! Reference:
//! Fourrière, A., Claudin, P., & Andreotti, B. (2010). Bedforms in a turbulent
//! stream: formation of ripples by primary linear instability and of dunes by
//! nonlinear pattern coarsening. J. Fluid Mech., 649, 287-328.

use std::f64::consts::PI;

const A0_FIT: [f64; 7] = [2.0, 1.0702, 0.093069, 0.10838, 0.024835, 0.041603, 0.0010625];
const B0_FIT: [f64; 7] = [0.0, 0.036989, 0.15765, 0.11518, 0.0020249, 0.0028725, 0.00053483];

/// `a0 + (a1 + a2 R + a3 R² + a4 R³) / (1 + a5 R² + a6 R⁴)`
pub fn rational_fit(r: f64, a: &[f64; 7]) -> f64 {
    let r2 = r * r;
    a[0] + (a[1] + a[2] * r + a[3] * r2 + a[4] * r2 * r) / (1.0 + a[5] * r2 + a[6] * r2 * r2)
}

/// In-phase coefficient for roughness `η0 = k z0`
pub fn coeff_a0(eta_0: f64) -> f64 {
    rational_fit((2.0 * PI / eta_0).ln(), &A0_FIT)
}

/// In-quadrature coefficient for roughness `η0 = k z0`
pub fn coeff_b0(eta_0: f64) -> f64 {
    rational_fit((2.0 * PI / eta_0).ln(), &B0_FIT)
}
