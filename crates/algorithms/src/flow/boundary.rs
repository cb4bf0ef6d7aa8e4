//! Boundary conditions at the top of the boundary layer
//!
//! Three conditions on `(W, S_t, S_n)` at `η = max_z` fix the weights of the
//! branches. Branch 3 is kept at unit weight while the others are solved
//! for, then everything is rescaled so branch 0 has weight one.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use dunestrat_core::{Error, Result};

use super::profile::mu;
use super::system::q1;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// `T x = b` with `T` the `(W, S_t, S_n)` rows of the four branches at `max_z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundarySystem {
    /// `matrix[r][b]`: component `r + 1` of branch `b`
    pub matrix: [[Complex64; 4]; 3],
    /// Right-hand side for a unit displacement of the boundary-layer top
    pub target: [Complex64; 3],
}

/// Weights solving a `BoundarySystem`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryWeights {
    /// Weights of branches 0..3 with branch 3 held at one
    pub raw: [Complex64; 3],
    /// `[1, w1/w0, w2/w0, 1/w0]`
    pub coefficients: [Complex64; 4],
    /// 1-norm condition estimate of the 3×3 block
    pub condition: f64,
}

impl BoundarySystem {
    /// Assemble from the branch states at `max_z`.
    pub fn new(
        top_states: &[[Complex64; 4]; 4],
        max_z: f64,
        eta_h: f64,
        eta_0: f64,
        eta_b: f64,
        froude: f64,
        kappa: f64,
    ) -> Self {
        let mut matrix = [[ZERO; 4]; 3];
        for (b, state) in top_states.iter().enumerate() {
            for r in 0..3 {
                matrix[r][b] = state[r + 1];
            }
        }
        let m = mu(max_z, eta_0, kappa);
        let target = [
            // W = i μ δ
            Complex64::new(0.0, m),
            // S_t = δ / η
            Complex64::new(1.0 / max_z, 0.0),
            // S_n = μ² (q1 + 1/(η_H Fr²)) δ
            (q1(eta_b) + 1.0 / (eta_h * froude * froude)) * (m * m),
        ];
        Self { matrix, target }
    }

    fn block(&self) -> [Complex64; 9] {
        let mut a = [ZERO; 9];
        for r in 0..3 {
            for c in 0..3 {
                a[r * 3 + c] = self.matrix[r][c];
            }
        }
        a
    }

    /// Solve for the branch weights.
    pub fn solve(&self) -> Result<BoundaryWeights> {
        let mut mat = self.block();
        let mut rhs = [ZERO; 3];
        for r in 0..3 {
            rhs[r] = self.target[r] - self.matrix[r][3];
        }
        let w = complex_solve(3, &mut mat, &mut rhs)?;
        let raw = [w[0], w[1], w[2]];
        if raw[0].norm() == 0.0 || !raw[0].is_finite() {
            return Err(Error::Algorithm(
                "boundary system: surface branch has zero weight".into(),
            ));
        }
        let inv = raw[0].inv();
        Ok(BoundaryWeights {
            raw,
            coefficients: [Complex64::new(1.0, 0.0), raw[1] * inv, raw[2] * inv, inv],
            condition: condition_number(&self.block()),
        })
    }

    /// `max_r |T[:, :3] w + T[:, 3] - b|`
    pub fn residual(&self, raw: &[Complex64; 3]) -> f64 {
        (0..3)
            .map(|r| {
                let lhs = self.matrix[r][0] * raw[0]
                    + self.matrix[r][1] * raw[1]
                    + self.matrix[r][2] * raw[2]
                    + self.matrix[r][3];
                (lhs - self.target[r]).norm()
            })
            .fold(0.0, f64::max)
    }
}

/// Solve a dense complex system by Gaussian elimination with partial pivoting.
///
/// `mat` is row-major `n × n` and is overwritten, as is `rhs`. Only an exact
/// zero (or non-finite) pivot is an error; ill-conditioned systems are solved
/// and left to the caller to judge through a condition estimate.
pub fn complex_solve(n: usize, mat: &mut [Complex64], rhs: &mut [Complex64]) -> Result<Vec<Complex64>> {
    if mat.len() != n * n || rhs.len() != n {
        return Err(Error::SizeMismatch {
            what: "linear system",
            expected: n * n,
            actual: mat.len(),
        });
    }
    for col in 0..n {
        let mut max_val = mat[col * n + col].norm();
        let mut max_row = col;
        for row in (col + 1)..n {
            let val = mat[row * n + col].norm();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_val == 0.0 || !max_val.is_finite() {
            return Err(Error::Algorithm(format!(
                "boundary system: singular matrix (pivot {} in column {})",
                max_val, col
            )));
        }

        if max_row != col {
            for j in 0..n {
                mat.swap(col * n + j, max_row * n + j);
            }
            rhs.swap(col, max_row);
        }

        let pivot = mat[col * n + col];
        for row in (col + 1)..n {
            let factor = mat[row * n + col] / pivot;
            mat[row * n + col] = ZERO;
            for j in (col + 1)..n {
                let upper = mat[col * n + j];
                mat[row * n + j] -= factor * upper;
            }
            let upper = rhs[col];
            rhs[row] -= factor * upper;
        }
    }

    let mut x = vec![ZERO; n];
    for col in (0..n).rev() {
        let mut sum = rhs[col];
        for j in (col + 1)..n {
            sum -= mat[col * n + j] * x[j];
        }
        x[col] = sum / mat[col * n + col];
    }

    Ok(x)
}

fn one_norm(n: usize, mat: &[Complex64]) -> f64 {
    (0..n)
        .map(|c| (0..n).map(|r| mat[r * n + c].norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// `‖A‖₁ ‖A⁻¹‖₁` from the explicit inverse; `∞` when singular.
fn condition_number(a: &[Complex64; 9]) -> f64 {
    let mut inv = [ZERO; 9];
    for c in 0..3 {
        let mut mat = *a;
        let mut e = [ZERO; 3];
        e[c] = Complex64::new(1.0, 0.0);
        match complex_solve(3, &mut mat, &mut e) {
            Ok(col) => {
                for r in 0..3 {
                    inv[r * 3 + c] = col[r];
                }
            }
            Err(_) => return f64::INFINITY,
        }
    }
    one_norm(3, a) * one_norm(3, &inv)
}
