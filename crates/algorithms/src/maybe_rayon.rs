//! Optional rayon execution.
//!
//! With the `parallel` feature, `into_par_iter` comes from rayon. Without it
//! (e.g. for single-threaded embedding), a sequential stand-in keeps the
//! same call sites compiling against plain iterators.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;

/// Evaluate `f(0..n)` in order, on the rayon pool when `parallel` is set.
///
/// Results keep index order in both modes.
pub fn map_indices<T, F>(n: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_indices_keeps_order() {
        let seq = map_indices(50, false, |i| i * i);
        let par = map_indices(50, true, |i| i * i);
        assert_eq!(seq, par);
        assert_eq!(seq[7], 49);
    }
}
