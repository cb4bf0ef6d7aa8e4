//! Adaptive explicit Runge-Kutta integration of complex linear systems
//!
//! Dormand-Prince 5(4) with the Shampine continuous extension: every accepted
//! step keeps enough information to evaluate the solution anywhere inside it
//! with 4th-order accuracy, so a branch integrated once can be queried at
//! arbitrary heights afterwards.
//!
//! Reference:
//! Dormand, J. R. & Prince, P. J. (1980). A family of embedded Runge-Kutta
//! formulae. J. Comput. Appl. Math., 6(1), 19-26.
//! Shampine, L. F. (1986). Some practical Runge-Kutta formulas.
//! Math. Comp., 46(173), 135-150.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use dunestrat_core::{Error, Result};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

// Butcher tableau
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];
const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
];
const B: [f64; 6] = [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0];

/// Difference between the 5th and embedded 4th order weights (FSAL stage last)
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Continuous extension: y(t + θh) = y + h Σ_i K_i Σ_j P[i][j] θ^(j+1)
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

/// Right-hand side of `dy/dt = f(t, y)` for an `N`-component complex state.
pub trait OdeSystem<const N: usize> {
    fn derivative(&self, t: f64, y: &[Complex64; N]) -> [Complex64; N];
}

impl<const N: usize, F> OdeSystem<N> for F
where
    F: Fn(f64, &[Complex64; N]) -> [Complex64; N],
{
    fn derivative(&self, t: f64, y: &[Complex64; N]) -> [Complex64; N] {
        self(t, y)
    }
}

/// Parameters for the adaptive integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorParams {
    /// Absolute tolerance
    pub atol: f64,
    /// Relative tolerance
    pub rtol: f64,
    /// Maximum number of attempted steps
    pub max_steps: usize,
    /// First step size; selected automatically when `None`
    pub first_step: Option<f64>,
}

impl Default for IntegratorParams {
    fn default() -> Self {
        Self {
            atol: 1e-10,
            rtol: 1e-10,
            max_steps: 1_000_000,
            first_step: None,
        }
    }
}

impl IntegratorParams {
    fn validate(&self) -> Result<()> {
        if !(self.atol > 0.0) {
            return Err(Error::invalid("atol", self.atol, "must be > 0"));
        }
        if !(self.rtol > 0.0) {
            return Err(Error::invalid("rtol", self.rtol, "must be > 0"));
        }
        if self.max_steps == 0 {
            return Err(Error::invalid("max_steps", 0, "must be > 0"));
        }
        if let Some(h) = self.first_step {
            if !(h > 0.0) || !h.is_finite() {
                return Err(Error::invalid("first_step", h, "must be finite and > 0"));
            }
        }
        Ok(())
    }
}

/// Step bookkeeping of one integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// One accepted step with its interpolation polynomial
#[derive(Debug, Clone)]
struct Segment<const N: usize> {
    t: f64,
    h: f64,
    y: [Complex64; N],
    /// q[j] = Σ_i K_i P[i][j]
    q: [[Complex64; N]; 4],
}

impl<const N: usize> Segment<N> {
    fn evaluate(&self, t: f64) -> [Complex64; N] {
        let theta = ((t - self.t) / self.h).clamp(0.0, 1.0);
        let mut out = self.y;
        for (i, value) in out.iter_mut().enumerate() {
            // Horner on θ(q0 + θ(q1 + θ(q2 + θ q3)))
            let poly = self.q[0][i]
                + (self.q[1][i] + (self.q[2][i] + self.q[3][i] * theta) * theta) * theta;
            *value += poly * (theta * self.h);
        }
        out
    }
}

/// Continuous solution over `[t_start, t_end]`.
#[derive(Debug, Clone)]
pub struct DenseSolution<const N: usize> {
    t_start: f64,
    t_end: f64,
    y_start: [Complex64; N],
    y_end: [Complex64; N],
    segments: Vec<Segment<N>>,
    stats: IntegrationStats,
}

impl<const N: usize> DenseSolution<N> {
    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    pub fn stats(&self) -> IntegrationStats {
        self.stats
    }

    /// Start of each accepted step, followed by `t_end`
    pub fn mesh(&self) -> Vec<f64> {
        let mut mesh: Vec<f64> = self.segments.iter().map(|s| s.t).collect();
        mesh.push(self.t_end);
        mesh
    }

    /// State at the end of the span (the last accepted step, not interpolated)
    pub fn final_state(&self) -> [Complex64; N] {
        self.y_end
    }

    /// Evaluate the solution at `t` inside the integration span.
    pub fn evaluate(&self, t: f64) -> Result<[Complex64; N]> {
        let slack = 1e-12 * (self.t_end - self.t_start);
        if !(t >= self.t_start - slack && t <= self.t_end + slack) {
            return Err(Error::invalid(
                "eta",
                t,
                format!("must lie within [{}, {}]", self.t_start, self.t_end),
            ));
        }
        if t <= self.t_start {
            return Ok(self.y_start);
        }
        if t >= self.t_end {
            return Ok(self.y_end);
        }
        let idx = self.segments.partition_point(|s| s.t <= t).saturating_sub(1);
        Ok(self.segments[idx].evaluate(t))
    }
}

fn rms<const N: usize>(values: &[Complex64; N], scale: &[f64; N]) -> f64 {
    let sum: f64 = values
        .iter()
        .zip(scale.iter())
        .map(|(v, s)| (v.norm() / s).powi(2))
        .sum();
    (sum / N as f64).sqrt()
}

/// Hairer, Nørsett & Wanner (1993), Sec. II.4 starting step
fn initial_step<S, const N: usize>(
    system: &S,
    t0: f64,
    y0: &[Complex64; N],
    f0: &[Complex64; N],
    span: f64,
    params: &IntegratorParams,
) -> f64
where
    S: OdeSystem<N> + ?Sized,
{
    let mut scale = [0.0; N];
    for (s, y) in scale.iter_mut().zip(y0.iter()) {
        *s = params.atol + y.norm() * params.rtol;
    }
    let d0 = rms(y0, &scale);
    let d1 = rms(f0, &scale);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let h0 = h0.min(span);

    let mut y1 = *y0;
    for (y, f) in y1.iter_mut().zip(f0.iter()) {
        *y += *f * h0;
    }
    let f1 = system.derivative(t0 + h0, &y1);
    let mut diff = [ZERO; N];
    for i in 0..N {
        diff[i] = f1[i] - f0[i];
    }
    let d2 = rms(&diff, &scale) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 5.0)
    };
    (100.0 * h0).min(h1).min(span)
}

/// Integrate `system` from `t0` to `t1` starting at `y0`.
///
/// Returns a dense solution covering the whole span. Fails when the step
/// size underflows or `max_steps` is exhausted.
pub fn integrate<S, const N: usize>(
    system: &S,
    t0: f64,
    t1: f64,
    y0: [Complex64; N],
    params: &IntegratorParams,
) -> Result<DenseSolution<N>>
where
    S: OdeSystem<N> + ?Sized,
{
    params.validate()?;
    if !t0.is_finite() || !t1.is_finite() || t1 <= t0 {
        return Err(Error::invalid(
            "t_end",
            t1,
            format!("must be finite and greater than t_start = {}", t0),
        ));
    }
    if y0.iter().any(|v| !v.re.is_finite() || !v.im.is_finite()) {
        return Err(Error::invalid("y0", format!("{:?}", y0), "must be finite"));
    }

    let mut stats = IntegrationStats::default();
    let mut t = t0;
    let mut y = y0;
    let mut f = system.derivative(t, &y);
    stats.evaluations += 1;

    let mut h = match params.first_step {
        Some(h) => h.min(t1 - t0),
        None => {
            stats.evaluations += 1;
            initial_step(system, t0, &y0, &f, t1 - t0, params)
        }
    };

    let mut segments = Vec::new();
    let mut k = [[ZERO; N]; 7];
    let mut last_rejected = false;

    while t < t1 {
        if stats.accepted + stats.rejected >= params.max_steps {
            return Err(Error::Algorithm(format!(
                "integrator exceeded {} steps at t = {}",
                params.max_steps, t
            )));
        }
        let min_step = 10.0 * f64::EPSILON * t.abs();
        if h < min_step || !h.is_finite() {
            return Err(Error::Algorithm(format!(
                "step size {:e} too small at t = {}",
                h, t
            )));
        }

        let h_step = h.min(t1 - t);
        let t_new = if h_step >= t1 - t { t1 } else { t + h_step };

        k[0] = f;
        for s in 1..6 {
            let mut ys = y;
            for (j, kj) in k.iter().enumerate().take(s) {
                let a = A[s][j] * h_step;
                if a != 0.0 {
                    for i in 0..N {
                        ys[i] += kj[i] * a;
                    }
                }
            }
            k[s] = system.derivative(t + C[s] * h_step, &ys);
        }

        let mut y_new = y;
        for (j, kj) in k.iter().enumerate().take(6) {
            let b = B[j] * h_step;
            if b != 0.0 {
                for i in 0..N {
                    y_new[i] += kj[i] * b;
                }
            }
        }
        k[6] = system.derivative(t_new, &y_new);
        stats.evaluations += 6;

        let mut err = [ZERO; N];
        for (j, kj) in k.iter().enumerate() {
            let e = E[j] * h_step;
            if e != 0.0 {
                for i in 0..N {
                    err[i] += kj[i] * e;
                }
            }
        }
        let mut scale = [0.0; N];
        for i in 0..N {
            scale[i] = params.atol + y[i].norm().max(y_new[i].norm()) * params.rtol;
        }
        let err_norm = rms(&err, &scale);

        if err_norm <= 1.0 {
            let mut q = [[ZERO; N]; 4];
            for (j, qj) in q.iter_mut().enumerate() {
                for (ki, pi) in k.iter().zip(P.iter()) {
                    if pi[j] != 0.0 {
                        for i in 0..N {
                            qj[i] += ki[i] * pi[j];
                        }
                    }
                }
            }
            segments.push(Segment { t, h: h_step, y, q });

            let mut factor = if err_norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err_norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
            };
            if last_rejected {
                factor = factor.min(1.0);
            }
            h = h_step * factor;
            t = t_new;
            y = y_new;
            f = k[6];
            stats.accepted += 1;
            last_rejected = false;
        } else {
            h = h_step * (SAFETY * err_norm.powf(ERROR_EXPONENT)).max(MIN_FACTOR);
            stats.rejected += 1;
            last_rejected = true;
        }
    }

    Ok(DenseSolution {
        t_start: t0,
        t_end: t1,
        y_start: y0,
        y_end: y,
        segments,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tableau_consistency() {
        // Row sums of A equal the nodes; the weights sum to one
        for s in 0..6 {
            let sum: f64 = A[s].iter().sum();
            assert_abs_diff_eq!(sum, C[s], epsilon = 1e-14);
        }
        assert_abs_diff_eq!(B.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(E.iter().sum::<f64>(), 0.0, epsilon = 1e-14);
        // At θ = 1 the interpolant reproduces the 5th order weights
        for i in 0..6 {
            let sum: f64 = P[i].iter().sum();
            assert_abs_diff_eq!(sum, B[i], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(P[6].iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_complex_rotation() {
        // y' = i y, y(0) = 1  =>  y(t) = e^{it}
        let system = |_t: f64, y: &[Complex64; 1]| [Complex64::i() * y[0]];
        let sol = integrate(&system, 0.0, 3.0, [Complex64::new(1.0, 0.0)], &IntegratorParams::default())
            .unwrap();

        let end = sol.final_state()[0];
        assert_abs_diff_eq!(end.re, 3.0_f64.cos(), epsilon = 1e-8);
        assert_abs_diff_eq!(end.im, 3.0_f64.sin(), epsilon = 1e-8);

        for &t in &[0.0, 0.37, 1.5, 2.999] {
            let y = sol.evaluate(t).unwrap()[0];
            assert_abs_diff_eq!(y.re, t.cos(), epsilon = 1e-8);
            assert_abs_diff_eq!(y.im, t.sin(), epsilon = 1e-8);
        }
        assert!(sol.stats().accepted > 10);
    }

    #[test]
    fn test_forced_linear_system() {
        // y0' = y1, y1' = -y0 + 1  =>  y0 = 1 - cos t, y1 = sin t
        let system = |_t: f64, y: &[Complex64; 2]| [y[1], -y[0] + Complex64::new(1.0, 0.0)];
        let sol = integrate(&system, 0.0, 2.0, [ZERO, ZERO], &IntegratorParams::default()).unwrap();
        let y = sol.evaluate(1.25).unwrap();
        assert_abs_diff_eq!(y[0].re, 1.0 - 1.25_f64.cos(), epsilon = 1e-8);
        assert_abs_diff_eq!(y[1].re, 1.25_f64.sin(), epsilon = 1e-8);
        assert_abs_diff_eq!(y[0].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mesh_covers_span() {
        let system = |t: f64, _y: &[Complex64; 1]| [Complex64::new(t.cos(), 0.0)];
        let sol = integrate(&system, 1.0, 4.0, [ZERO], &IntegratorParams::default()).unwrap();
        let mesh = sol.mesh();
        assert_eq!(mesh[0], 1.0);
        assert_eq!(*mesh.last().unwrap(), 4.0);
        assert!(mesh.windows(2).all(|w| w[1] > w[0]));
        assert_abs_diff_eq!(sol.final_state()[0].re, 4.0_f64.sin() - 1.0_f64.sin(), epsilon = 1e-8);
    }

    #[test]
    fn test_evaluate_outside_span() {
        let system = |_t: f64, y: &[Complex64; 1]| [-y[0]];
        let sol = integrate(&system, 0.0, 1.0, [Complex64::new(1.0, 0.0)], &IntegratorParams::default())
            .unwrap();
        assert!(sol.evaluate(1.5).is_err());
        assert!(sol.evaluate(-0.1).is_err());
    }

    #[test]
    fn test_invalid_span() {
        let system = |_t: f64, y: &[Complex64; 1]| [-y[0]];
        let params = IntegratorParams::default();
        assert!(integrate(&system, 1.0, 1.0, [ZERO], &params).is_err());
        assert!(integrate(&system, 0.0, f64::NAN, [ZERO], &params).is_err());
    }

    #[test]
    fn test_max_steps_exhausted() {
        let system = |_t: f64, y: &[Complex64; 1]| [Complex64::i() * y[0] * 100.0];
        let params = IntegratorParams {
            max_steps: 5,
            ..Default::default()
        };
        let err = integrate(&system, 0.0, 10.0, [Complex64::new(1.0, 0.0)], &params).unwrap_err();
        assert!(matches!(err, Error::Algorithm(_)));
    }
}
