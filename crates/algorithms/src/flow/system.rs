//! Linearised flow equations over a sinusoidal bed
//!
//! The perturbation state is `X = [U, W, S_t, S_n]` (streamwise and vertical
//! velocity, tangential and normal stress), all complex amplitudes of the
//! mode `e^{ikx}`. It obeys `dX/dη = P(η) X + F(η)` with a mixing-length
//! closure inside a capped boundary layer of height `η_H`.
//!
//! Reference:
//! Andreotti, B., Fourrière, A., Ould-Kaddour, F., Murray, B., & Claudin, P.
//! (2009). Giant aeolian dune size determined by the average depth of the
//! atmospheric boundary layer. Nature, 457, 1120-1123.

use num_complex::Complex64;

use super::ode::OdeSystem;
use super::profile::{mu, mu_prime};

const I: Complex64 = Complex64::new(0.0, 1.0);
const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Inhomogeneous term driving a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forcing {
    /// Homogeneous system
    None,
    /// Mixing-length source `S(η)`
    Surface,
    /// Sensitivity to a displacement of the boundary-layer top, `S_δ(η)`
    Capping,
}

/// `P(η)`, `S(η)` and `S_δ(η)` for given `η_H`, `η_0`, `κ`.
#[derive(Debug, Clone, Copy)]
pub struct FlowSystem {
    pub eta_h: f64,
    pub eta_0: f64,
    pub kappa: f64,
    pub forcing: Forcing,
}

impl FlowSystem {
    pub fn new(eta_h: f64, eta_0: f64, kappa: f64, forcing: Forcing) -> Self {
        Self {
            eta_h,
            eta_0,
            kappa,
            forcing,
        }
    }

    /// The four canonical branches: initial state and forcing.
    ///
    /// The final solution is a linear combination of these.
    pub fn branches(eta_h: f64, eta_0: f64, kappa: f64) -> [(FlowSystem, [Complex64; 4]); 4] {
        let one = Complex64::new(1.0, 0.0);
        let u0 = Complex64::new(-mu_prime(0.0, eta_0, kappa), 0.0);
        [
            (Self::new(eta_h, eta_0, kappa, Forcing::Surface), [u0, ZERO, ZERO, ZERO]),
            (Self::new(eta_h, eta_0, kappa, Forcing::None), [ZERO, ZERO, one, ZERO]),
            (Self::new(eta_h, eta_0, kappa, Forcing::None), [ZERO, ZERO, ZERO, one]),
            (Self::new(eta_h, eta_0, kappa, Forcing::Capping), [ZERO; 4]),
        ]
    }

    /// Row-major `P(η)`
    pub fn matrix(&self, eta: f64) -> [[Complex64; 4]; 4] {
        let tp = 1.0 - eta / self.eta_h;
        let m = mu(eta, self.eta_0, self.kappa);
        let mp = mu_prime(eta, self.eta_0, self.kappa);
        let re = |v: f64| Complex64::new(v, 0.0);
        [
            [ZERO, -I, re(mp / (2.0 * tp)), ZERO],
            [-I, ZERO, ZERO, ZERO],
            [I * m + 4.0 * tp / mp, re(mp), ZERO, I],
            [ZERO, -I * m, I, ZERO],
        ]
    }

    /// `S(η)`: only the `U` equation is forced
    pub fn surface_source(&self, eta: f64) -> f64 {
        let mp = mu_prime(eta, self.eta_0, self.kappa);
        self.kappa * mp * mp - mp / (2.0 * self.eta_h)
    }

    /// `S_δ(η)`: only the `U` equation is forced
    pub fn capping_source(&self, eta: f64) -> f64 {
        let tp = 1.0 - eta / self.eta_h;
        let mp = mu_prime(eta, self.eta_0, self.kappa);
        -eta * mp / (2.0 * self.eta_h * self.eta_h * tp)
    }
}

impl OdeSystem<4> for FlowSystem {
    fn derivative(&self, eta: f64, x: &[Complex64; 4]) -> [Complex64; 4] {
        let p = self.matrix(eta);
        let mut dx = [ZERO; 4];
        for (row, out) in p.iter().zip(dx.iter_mut()) {
            *out = row[0] * x[0] + row[1] * x[1] + row[2] * x[2] + row[3] * x[3];
        }
        dx[0] += match self.forcing {
            Forcing::None => 0.0,
            Forcing::Surface => self.surface_source(eta),
            Forcing::Capping => self.capping_source(eta),
        };
        dx
    }
}

/// Vertical wavenumber root of the free-atmosphere internal waves.
///
/// `-sqrt(1 - 1/η_B²)` for `η_B > 1` (evanescent side), `i sqrt(1/η_B² - 1)`
/// otherwise. `η_B = +∞` is the neutral limit `-1`.
pub fn q1(eta_b: f64) -> Complex64 {
    if eta_b.is_infinite() && eta_b > 0.0 {
        Complex64::new(-1.0, 0.0)
    } else if eta_b > 1.0 {
        Complex64::new(-(1.0 - 1.0 / (eta_b * eta_b)).sqrt(), 0.0)
    } else {
        Complex64::new(0.0, (1.0 / (eta_b * eta_b) - 1.0).sqrt())
    }
}
