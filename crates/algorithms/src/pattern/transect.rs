//! Profiles through a 2-D array
//!
//! Points are `(row, col)` in fractional pixel coordinates.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Sampling between grid nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Bicubic convolution; the array is zero outside its bounds
    #[default]
    Cubic,
    /// Nearest node; out-of-range samples are dropped
    Nearest,
}

/// Keys (1981) cubic convolution kernel, `a = -0.5`
fn keys_kernel(x: f64) -> f64 {
    const A: f64 = -0.5;
    let x = x.abs();
    if x <= 1.0 {
        ((A + 2.0) * x - (A + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((A * x - 5.0 * A) * x + 8.0 * A) * x - 4.0 * A
    } else {
        0.0
    }
}

/// Bicubic convolution value of `a` at `(row, col)`
pub fn cubic_at(a: ArrayView2<'_, f64>, row: f64, col: f64) -> f64 {
    let (rows, cols) = a.dim();
    let r0 = row.floor() as isize;
    let c0 = col.floor() as isize;
    let mut sum = 0.0;
    for i in (r0 - 1)..=(r0 + 2) {
        if i < 0 || i as usize >= rows {
            continue;
        }
        let wr = keys_kernel(row - i as f64);
        if wr == 0.0 {
            continue;
        }
        for j in (c0 - 1)..=(c0 + 2) {
            if j < 0 || j as usize >= cols {
                continue;
            }
            let wc = keys_kernel(col - j as f64);
            sum += wr * wc * a[[i as usize, j as usize]];
        }
    }
    sum
}

/// `num` evenly spaced samples of `a` from `p0` to `p1` (both included).
pub fn array_transect(
    a: ArrayView2<'_, f64>,
    p0: (f64, f64),
    p1: (f64, f64),
    interpolation: Interpolation,
    num: usize,
) -> Vec<f64> {
    let (rows, cols) = a.dim();
    let point = |k: usize| {
        let t = if num > 1 { k as f64 / (num - 1) as f64 } else { 0.0 };
        (p0.0 + t * (p1.0 - p0.0), p0.1 + t * (p1.1 - p0.1))
    };
    match interpolation {
        Interpolation::Cubic => (0..num)
            .map(|k| {
                let (r, c) = point(k);
                cubic_at(a, r, c)
            })
            .collect(),
        Interpolation::Nearest => (0..num)
            .filter_map(|k| {
                let (r, c) = point(k);
                let (r, c) = (r.round(), c.round());
                if r >= 0.0 && c >= 0.0 && (r as usize) < rows && (c as usize) < cols {
                    Some(a[[r as usize, c as usize]])
                } else {
                    None
                }
            })
            .collect(),
    }
}
