//! Law-of-the-wall velocity profile
//!
//! Non-dimensional mean wind `U(z)/u*` above a rough bed and its vertical
//! derivative. Heights and roughness may be dimensional or scaled by the
//! same wavenumber; only their ratio matters in `mu`.

/// Von Kármán constant
pub const KAPPA: f64 = 0.4;

/// `μ(z) = ln(1 + z/z0) / κ`
pub fn mu(z: f64, z0: f64, kappa: f64) -> f64 {
    (z / z0).ln_1p() / kappa
}

/// `μ'(z) = 1 / (κ (z + z0))`
pub fn mu_prime(z: f64, z0: f64, kappa: f64) -> f64 {
    1.0 / (kappa * (z + z0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mu_vanishes_at_bed() {
        assert_eq!(mu(0.0, 1e-3, KAPPA), 0.0);
    }

    #[test]
    fn test_mu_log_profile() {
        let z0 = 1e-3;
        assert_relative_eq!(mu(1.0, z0, KAPPA), (1.0 + 1.0 / z0).ln() / 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_mu_prime_matches_finite_difference() {
        let (z, z0, h) = (0.3, 1e-3, 1e-6);
        let fd = (mu(z + h, z0, KAPPA) - mu(z - h, z0, KAPPA)) / (2.0 * h);
        assert_relative_eq!(mu_prime(z, z0, KAPPA), fd, max_relative = 1e-8);
    }
}
