//! Two-dimensional autocorrelation
//!
//! Full linear autocorrelation of an `M×N` field, normalised by `M·N`, via
//! zero-padded FFTs. The output has shape `(2M-1, 2N-1)` with zero lag at
//! `(M-1, N-1)`, matching a direct `correlate(a, a, "full")`.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use rustfft::FftPlanner;
use dunestrat_core::{Error, Result};

/// Forward or inverse 2-D FFT on a row-major `rows × cols` buffer.
///
/// The result is left transposed (`cols × rows`) so a subsequent call with
/// swapped dimensions undoes it.
fn fft2_transposed(
    planner: &mut FftPlanner<f64>,
    buffer: &[Complex64],
    rows: usize,
    cols: usize,
    inverse: bool,
) -> Vec<Complex64> {
    let plan = |planner: &mut FftPlanner<f64>, len: usize| {
        if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        }
    };

    let mut work = buffer.to_vec();
    plan(planner, cols).process(&mut work);

    let mut transposed = vec![Complex64::new(0.0, 0.0); rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            transposed[c * rows + r] = work[r * cols + c];
        }
    }
    plan(planner, rows).process(&mut transposed);
    transposed
}

/// Full 2-D autocorrelation of `a`, divided by `a.len()`.
pub fn autocorrelate(a: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(Error::InvalidDimensions { width: n, height: m });
    }
    let (p, q) = (2 * m - 1, 2 * n - 1);

    let mut padded = vec![Complex64::new(0.0, 0.0); p * q];
    for ((r, c), &v) in a.indexed_iter() {
        padded[r * q + c] = Complex64::new(v, 0.0);
    }

    let mut planner = FftPlanner::new();
    // Spectrum is q × p (transposed)
    let mut spectrum = fft2_transposed(&mut planner, &padded, p, q, false);
    for v in spectrum.iter_mut() {
        *v = Complex64::new(v.norm_sqr(), 0.0);
    }
    // Back to p × q
    let circular = fft2_transposed(&mut planner, &spectrum, q, p, true);

    let norm = (p * q) as f64 * (m * n) as f64;
    let mut out = Array2::zeros((p, q));
    for ((k, l), value) in out.indexed_iter_mut() {
        // Lag (k - (m-1), l - (n-1)) wrapped into the circular result
        let dr = (k + p - (m - 1)) % p;
        let dc = (l + q - (n - 1)) % q;
        *value = circular[dr * q + dc].re / norm;
    }
    Ok(out)
}

/// Position of the largest finite value (first in row-major order on ties)
pub fn argmax(a: ArrayView2<'_, f64>) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (idx, &v) in a.indexed_iter() {
        if v.is_finite() && best.map_or(true, |(_, b)| v > b) {
            best = Some((idx, v));
        }
    }
    best.map(|(idx, _)| idx)
}
