//! Large-scale trend removal
//!
//! Fits a bivariate polynomial surface `Σ c_ij x^i y^j` by least squares and
//! subtracts it, leaving the dune-scale residual for the periodicity analysis.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use dunestrat_core::raster::Raster;
use dunestrat_core::{Error, Result};

/// Parameters for the polynomial trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetrendParams {
    /// Maximum power of `x`
    pub kx: usize,
    /// Maximum power of `y`
    pub ky: usize,
    /// Maximum total degree `i + j`; all `(i, j)` products when `None`
    pub order_max: Option<usize>,
}

impl Default for DetrendParams {
    fn default() -> Self {
        Self {
            kx: 2,
            ky: 2,
            order_max: Some(2),
        }
    }
}

impl DetrendParams {
    /// Exponents `(i, j)` of the fitted monomials
    pub fn terms(&self) -> Vec<(usize, usize)> {
        let mut terms = Vec::new();
        for i in 0..=self.kx {
            for j in 0..=self.ky {
                if self.order_max.map_or(true, |o| i + j <= o) {
                    terms.push((i, j));
                }
            }
        }
        terms
    }
}

/// Fitted surface, stored on centred and scaled coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialSurface {
    pub terms: Vec<(usize, usize)>,
    pub coefficients: Vec<f64>,
    x_center: f64,
    x_scale: f64,
    y_center: f64,
    y_scale: f64,
}

impl PolynomialSurface {
    fn monomials(&self, x: f64, y: f64, out: &mut [f64]) {
        let u = (x - self.x_center) / self.x_scale;
        let v = (y - self.y_center) / self.y_scale;
        for (slot, &(i, j)) in out.iter_mut().zip(self.terms.iter()) {
            *slot = u.powi(i as i32) * v.powi(j as i32);
        }
    }

    /// Surface value at `(x, y)`
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let mut basis = vec![0.0; self.terms.len()];
        self.monomials(x, y, &mut basis);
        basis.iter().zip(self.coefficients.iter()).map(|(b, c)| b * c).sum()
    }

    /// `z - surface(x, y)` for each sample
    pub fn residual(&self, x: &[f64], y: &[f64], z: &[f64]) -> Result<Vec<f64>> {
        check_lengths(x, y, z)?;
        Ok(x.iter()
            .zip(y.iter())
            .zip(z.iter())
            .map(|((&xi, &yi), &zi)| zi - self.evaluate(xi, yi))
            .collect())
    }
}

fn check_lengths(x: &[f64], y: &[f64], z: &[f64]) -> Result<()> {
    if y.len() != x.len() {
        return Err(Error::SizeMismatch {
            what: "y",
            expected: x.len(),
            actual: y.len(),
        });
    }
    if z.len() != x.len() {
        return Err(Error::SizeMismatch {
            what: "z",
            expected: x.len(),
            actual: z.len(),
        });
    }
    Ok(())
}

fn center_and_scale(values: &[f64]) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let center = 0.5 * (lo + hi);
    let half = 0.5 * (hi - lo);
    (center, if half > 0.0 { half } else { 1.0 })
}

/// Least-squares polynomial surface through scattered `(x, y, z)` samples.
///
/// Samples with a non-finite coordinate or value are ignored.
pub fn polyfit2d(x: &[f64], y: &[f64], z: &[f64], params: DetrendParams) -> Result<PolynomialSurface> {
    check_lengths(x, y, z)?;
    let terms = params.terms();
    let m = terms.len();
    let (x_center, x_scale) = center_and_scale(x);
    let (y_center, y_scale) = center_and_scale(y);
    let mut surface = PolynomialSurface {
        terms,
        coefficients: vec![0.0; m],
        x_center,
        x_scale,
        y_center,
        y_scale,
    };

    // Normal equations: (XᵀX) c = Xᵀz
    let mut mat = vec![0.0_f64; m * m];
    let mut rhs = vec![0.0_f64; m];
    let mut basis = vec![0.0_f64; m];
    let mut used = 0usize;
    for ((&xi, &yi), &zi) in x.iter().zip(y.iter()).zip(z.iter()) {
        if !(xi.is_finite() && yi.is_finite() && zi.is_finite()) {
            continue;
        }
        surface.monomials(xi, yi, &mut basis);
        for r in 0..m {
            rhs[r] += basis[r] * zi;
            for c in r..m {
                mat[r * m + c] += basis[r] * basis[c];
            }
        }
        used += 1;
    }
    if used < m {
        return Err(Error::invalid(
            "z",
            format!("{} valid samples", used),
            format!("need at least {} for {} terms", m, m),
        ));
    }
    for r in 0..m {
        for c in 0..r {
            mat[r * m + c] = mat[c * m + r];
        }
    }

    surface.coefficients = solve_normal_equations(m, &mut mat, &mut rhs)?;
    Ok(surface)
}

fn solve_normal_equations(n: usize, mat: &mut [f64], rhs: &mut [f64]) -> Result<Vec<f64>> {
    let scale = mat.iter().map(|v| v.abs()).fold(0.0, f64::max);
    for col in 0..n {
        let mut max_val = mat[col * n + col].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            let val = mat[row * n + col].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_val < 1e-14 * scale.max(1.0) {
            return Err(Error::Algorithm(
                "polyfit2d: singular system (degenerate coordinates?)".into(),
            ));
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
            mat[row * n + col] = 0.0;
            for j in (col + 1)..n {
                mat[row * n + j] -= factor * mat[col * n + j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0_f64; n];
    for col in (0..n).rev() {
        let mut sum = rhs[col];
        for j in (col + 1)..n {
            sum -= mat[col * n + j] * x[j];
        }
        x[col] = sum / mat[col * n + col];
    }
    Ok(x)
}

/// Remove the polynomial trend from a DEM using its lon/lat axes.
///
/// When every residual lies within `1e-9 · max|z|` of zero the whole field
/// is set to exactly zero, so a surface that is itself polynomial leaves a
/// flat residual; otherwise residuals are kept as computed, however small.
/// Missing (NaN) cells become zero and do not contribute to the
/// autocorrelation.
pub fn detrend(dem: &Raster, params: DetrendParams) -> Result<(Array2<f64>, PolynomialSurface)> {
    if dem.is_empty() {
        return Err(Error::InvalidDimensions {
            width: dem.cols(),
            height: dem.rows(),
        });
    }
    let (lon, lat) = dem.axes().meshgrid();
    let z: Vec<f64> = dem.data().iter().copied().collect();
    let surface = polyfit2d(&lon, &lat, &z, params)?;
    let tolerance = 1e-9 * dem.max_abs();

    let mut residual = Array2::zeros(dem.shape());
    for ((row, col), value) in residual.indexed_iter_mut() {
        let k = row * dem.cols() + col;
        *value = z[k] - surface.evaluate(lon[k], lat[k]);
    }
    flatten_within(&mut residual, tolerance);
    Ok((residual, surface))
}

/// Zero non-finite cells, and the whole field if it is flat to `tolerance`.
fn flatten_within(residual: &mut Array2<f64>, tolerance: f64) {
    let flat = residual.iter().all(|r| !r.is_finite() || r.abs() <= tolerance);
    residual.mapv_inplace(|r| if flat || !r.is_finite() { 0.0 } else { r });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use dunestrat_core::raster::GridAxes;

    #[test]
    fn test_terms_total_order() {
        let terms = DetrendParams::default().terms();
        assert_eq!(terms, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (2, 0)]);
        let full = DetrendParams {
            kx: 1,
            ky: 1,
            order_max: None,
        };
        assert_eq!(full.terms().len(), 4);
    }

    #[test]
    fn test_exact_quadratic_recovered() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();
        for i in 0..10 {
            for j in 0..8 {
                let (xi, yi) = (10.0 + 0.1 * i as f64, -20.0 + 0.05 * j as f64);
                x.push(xi);
                y.push(yi);
                z.push(3.0 + 2.0 * xi - yi + 0.5 * xi * yi + 0.25 * xi * xi - yi * yi);
            }
        }
        let surface = polyfit2d(&x, &y, &z, DetrendParams::default()).unwrap();
        let residual = surface.residual(&x, &y, &z).unwrap();
        for r in residual {
            assert_abs_diff_eq!(r, 0.0, epsilon = 1e-9);
        }
        let expected = 3.0 + 2.0 * 10.5 + 20.1 + 0.5 * 10.5 * -20.1 + 0.25 * 10.5 * 10.5 - 20.1 * 20.1;
        assert_abs_diff_eq!(surface.evaluate(10.5, -20.1), expected, epsilon = 1e-8);
    }

    #[test]
    fn test_nan_samples_ignored() {
        let x = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0];
        let mut z: Vec<f64> = x.iter().zip(y.iter()).map(|(a, b)| 1.0 + a + 2.0 * b).collect();
        z[4] = f64::NAN;
        let params = DetrendParams {
            kx: 1,
            ky: 1,
            order_max: Some(1),
        };
        let surface = polyfit2d(&x, &y, &z, params).unwrap();
        assert_abs_diff_eq!(surface.evaluate(1.0, 1.0), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_too_few_samples() {
        let err = polyfit2d(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0], DetrendParams::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(polyfit2d(&[0.0, 1.0], &[0.0], &[1.0, 2.0], DetrendParams::default()).is_err());
    }

    #[test]
    fn test_small_residuals_kept_beside_large_ones() {
        let mut field = Array2::from_shape_vec((1, 3), vec![1e-12, 0.5, f64::NAN]).unwrap();
        flatten_within(&mut field, 1e-9);
        assert_eq!(field.as_slice().unwrap(), &[1e-12, 0.5, 0.0]);

        let mut flat = Array2::from_shape_vec((1, 3), vec![1e-12, -1e-12, f64::NAN]).unwrap();
        flatten_within(&mut flat, 1e-9);
        assert!(flat.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_detrend_polynomial_dem_is_flat() {
        let axes = GridAxes::regular(30, 20, 15.0, -24.0, 0.01, 0.01).unwrap();
        let (lon, lat) = axes.meshgrid();
        let z: Vec<f64> = lon
            .iter()
            .zip(lat.iter())
            .map(|(x, y)| 500.0 + 40.0 * x - 12.0 * y + 3.0 * x * x)
            .collect();
        let dem = Raster::with_axes(Array2::from_shape_vec((20, 30), z).unwrap(), axes).unwrap();
        let (residual, _) = detrend(&dem, DetrendParams::default()).unwrap();
        assert!(residual.iter().all(|&r| r == 0.0));
    }
}
