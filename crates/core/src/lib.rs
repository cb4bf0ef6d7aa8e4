//! # dunestrat core
//!
//! Core types shared by the dunestrat crates.
//!
//! This crate provides:
//! - `Raster`: a DEM on a longitude/latitude grid (`GridAxes`)
//! - Geodesic distances on the reference ellipsoid
//! - Small angle and angular-statistics kernels
//! - `StationDataset`: the typed per-station record
//! - The `Algorithm` trait giving the numerical components a common API

pub mod angles;
pub mod error;
pub mod geodesy;
pub mod raster;
pub mod station;

pub use error::{Error, Result};
pub use geodesy::Spheroid;
pub use raster::{DemDocument, GridAxes, Raster};
pub use station::{DunePattern, StationDataset};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::angles::{cosd, sind, tand, wrap_orientation};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GridAxes, Raster};
    pub use crate::station::{DunePattern, StationDataset};
    pub use crate::Algorithm;
}

/// Core trait for the numerical components.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
