//! # dunestrat parallel
//!
//! Drivers that run the flow solver many times.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential or rayon-parallel execution
//! - Sweeps of the hydrodynamic coefficients over planes of `(Fr, kH, kL_B)`
//! - Hydrodynamic coefficients along a station's time series

pub mod strategy;
pub mod sweep;
pub mod timeseries;

pub use strategy::{num_cpus, ParallelStrategy, ProcessingMode};
pub use sweep::{logspace, sweep_plane, LogAxis, SweepParams, SweepPlane, SweepResult};
pub use timeseries::{hydro_time_series, HydroSeries};
