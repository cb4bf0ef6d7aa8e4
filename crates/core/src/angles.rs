//! Angle and angular-statistics kernels
//!
//! All angles are in degrees. Orientations of undirected features (dune
//! crests) live in `[0, 180)`, directions of vectors (winds, sand fluxes)
//! in `[0, 360)` or `[-180, 180]` as documented per function.

use crate::error::{Error, Result};

/// Sine of an angle in degrees
#[inline]
pub fn sind(x: f64) -> f64 {
    x.to_radians().sin()
}

/// Cosine of an angle in degrees
#[inline]
pub fn cosd(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Tangent of an angle in degrees
#[inline]
pub fn tand(x: f64) -> f64 {
    x.to_radians().tan()
}

/// Fold an undirected orientation into `[0, 180)`.
#[inline]
pub fn wrap_orientation(x: f64) -> f64 {
    let w = x.rem_euclid(180.0);
    // rem_euclid can round up to exactly 180 for tiny negative inputs
    if w >= 180.0 {
        0.0
    } else {
        w
    }
}

/// Smallest signed angle taking `x` onto `y`, in `(-180, 180]`.
///
/// Positive when `y` lies counterclockwise of `x`.
pub fn smallest_signed_angle_between(x: f64, y: f64) -> f64 {
    let a = (x - y).rem_euclid(360.0);
    let b = (y - x).rem_euclid(360.0);
    if a < b {
        -a
    } else {
        b
    }
}

/// Vector average of `(angle, norm)` pairs.
///
/// Pairs with a NaN angle or norm are skipped. Returns the counterclockwise
/// angle of the mean vector in `[-180, 180]` and its norm; `(NaN, NaN)` when
/// no valid pair remains.
pub fn vector_average(angles: &[f64], norms: &[f64]) -> (f64, f64) {
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut n = 0_usize;
    for (&a, &q) in angles.iter().zip(norms) {
        if a.is_nan() || q.is_nan() {
            continue;
        }
        sx += q * cosd(a);
        sy += q * sind(a);
        n += 1;
    }
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let (mx, my) = (sx / n as f64, sy / n as f64);
    (my.atan2(mx).to_degrees(), mx.hypot(my))
}

/// Mode of a distribution estimated from an equal-width histogram.
///
/// The histogram spans `[min, max]` of the finite samples with `bins` bins
/// (`[v - 0.5, v + 0.5]` when every sample equals `v`). The upper edge of the
/// fullest bin is returned, first one on ties, so the estimate sits half a
/// bin above the bin centre.
pub fn find_mode_distribution(data: &[f64], bins: usize) -> Result<f64> {
    if bins == 0 {
        return Err(Error::invalid("bins", bins, "must be > 0"));
    }
    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(Error::Algorithm("No finite samples to build a histogram".into()));
    }

    let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi == lo {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0_usize; bins];
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let best = counts
        .iter()
        .enumerate()
        .fold((0, 0), |acc, (i, &c)| if c > acc.1 { (i, c) } else { acc })
        .0;
    Ok(lo + (best as f64 + 1.0) * width)
}

/// Weighted, normalized angular histogram.
///
/// `bin_edges` must be increasing. Samples outside `[first, last]` edge are
/// ignored; the last bin includes its right edge. The density integrates to
/// one over the bins. Returns `(density, bin_centers)`.
pub fn angular_pdf(angles: &[f64], weights: &[f64], bin_edges: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    if angles.len() != weights.len() {
        return Err(Error::SizeMismatch {
            what: "weights",
            expected: angles.len(),
            actual: weights.len(),
        });
    }
    if bin_edges.len() < 2 || bin_edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Error::invalid(
            "bin_edges",
            bin_edges.len(),
            "need at least two strictly increasing edges",
        ));
    }

    let nbins = bin_edges.len() - 1;
    let first = bin_edges[0];
    let last = bin_edges[nbins];
    let mut hist = vec![0.0; nbins];

    for (&a, &w) in angles.iter().zip(weights) {
        if !a.is_finite() || !w.is_finite() || a < first || a > last {
            continue;
        }
        // index of the last edge <= a, clamped so `last` falls in the final bin
        let idx = bin_edges.partition_point(|&e| e <= a).saturating_sub(1).min(nbins - 1);
        hist[idx] += w;
    }

    let total: f64 = hist.iter().sum();
    for (i, h) in hist.iter_mut().enumerate() {
        let width = bin_edges[i + 1] - bin_edges[i];
        *h = if total > 0.0 { *h / (total * width) } else { f64::NAN };
    }

    let half = (bin_edges[1] - bin_edges[0]) / 2.0;
    let centers = bin_edges[1..].iter().map(|e| e - half).collect();
    Ok((hist, centers))
}
