//! Periodicity analysis of dune fields
//!
//! - [`detrend`]: polynomial trend removal
//! - [`correlation`]: FFT autocorrelation
//! - [`orientation`]: angular integration of the autocorrelation
//! - [`transect`], [`peaks`]: profile extraction and peak picking
//! - [`periodicity`]: the full orientation / wavelength / amplitude pipeline

pub mod correlation;
pub mod detrend;
pub mod orientation;
pub mod peaks;
pub mod periodicity;
pub mod transect;

pub use correlation::autocorrelate;
pub use detrend::{detrend, polyfit2d, DetrendParams, PolynomialSurface};
pub use orientation::{dominant_orientation, OrientationScan};
pub use peaks::{find_first_max, find_peaks, PeakSelection};
pub use periodicity::{analyze_pattern, periodicity_2d, PatternAnalysis, PatternDescriptor, PeriodicityParams};
pub use transect::{array_transect, Interpolation};
