//! Peak detection on 1-D profiles

use serde::{Deserialize, Serialize};

/// Which detected peak gives the wavelength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakSelection {
    /// Closest to the origin
    #[default]
    First,
    /// Highest
    Max,
}

/// Indices of the local maxima of `a`.
///
/// A peak must rise strictly from its left neighbour and fall strictly to
/// its right one; flat tops are reported at their middle (rounded down).
/// End points are never peaks.
pub fn find_peaks(a: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if a.len() < 3 {
        return peaks;
    }
    let last = a.len() - 1;
    let mut i = 1;
    while i < last {
        if a[i - 1] < a[i] {
            let mut ahead = i + 1;
            while ahead < last && a[ahead] == a[i] {
                ahead += 1;
            }
            if a[ahead] < a[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Position of the first (or highest) positive peak within `[min_pos, max_pos]`.
///
/// `max_pos` defaults to the profile length. Returns `None` when no positive
/// peak lies in range.
pub fn find_first_max(a: &[f64], selection: PeakSelection, min_pos: usize, max_pos: Option<usize>) -> Option<usize> {
    let max_pos = max_pos.unwrap_or(a.len());
    let candidates = find_peaks(a)
        .into_iter()
        .filter(|&p| p >= min_pos && p <= max_pos && a[p] > 0.0);
    match selection {
        PeakSelection::First => candidates.min(),
        PeakSelection::Max => candidates.fold(None, |best: Option<usize>, p| match best {
            Some(b) if a[b] >= a[p] => Some(b),
            _ => Some(p),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_peaks() {
        let a = [0.0, 1.0, 0.0, 2.0, 3.0, 1.0, 5.0];
        assert_eq!(find_peaks(&a), vec![1, 4]);
    }

    #[test]
    fn test_plateau_middle() {
        let a = [0.0, 2.0, 2.0, 2.0, 0.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&a), vec![2, 5]);
    }

    #[test]
    fn test_plateau_not_falling_is_not_peak() {
        let a = [0.0, 2.0, 2.0, 3.0, 1.0];
        assert_eq!(find_peaks(&a), vec![3]);
        assert!(find_peaks(&[0.0, 1.0, 1.0]).is_empty());
    }

    #[test]
    fn test_first_positive_peak() {
        // The first peak is negative and skipped
        let a = [1.0, -0.5, -0.2, -0.6, 0.3, 0.1, 0.8, 0.0];
        assert_eq!(find_first_max(&a, PeakSelection::First, 0, None), Some(4));
        assert_eq!(find_first_max(&a, PeakSelection::Max, 0, None), Some(6));
        assert_eq!(find_first_max(&a, PeakSelection::First, 5, None), Some(6));
        assert_eq!(find_first_max(&a, PeakSelection::First, 0, Some(3)), None);
    }

    #[test]
    fn test_monotonic_profile_has_no_peak() {
        let a: Vec<f64> = (0..20).map(|i| (-(i as f64) / 5.0).exp()).collect();
        assert_eq!(find_first_max(&a, PeakSelection::First, 0, None), None);
        assert_eq!(find_first_max(&[0.0; 10], PeakSelection::First, 0, None), None);
    }
}
