//! # dunestrat algorithms
//!
//! Numerical components of the dune-stratification study.
//!
//! ## Modules
//!
//! - **flow**: linear response of a stratified, capped boundary layer to a
//!   sinusoidal bed (hydrodynamic coefficients `A0`, `B0`)
//! - **pattern**: orientation, wavelength and amplitude of a dune field from
//!   the autocorrelation of its DEM
//! - **dune**: dune orientation from the sand-flux distribution

pub mod dune;
pub mod flow;
pub mod maybe_rayon;
pub mod pattern;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dune::{bed_instability_orientation, elongation_direction, FLUX_UP_RATIO};
    pub use crate::flow::{
        coeff_a0, coeff_b0, solve, solve_hydro_coefficients, FlowParameters, FlowSolution, FlowSolver,
        HydroCoefficients, SolverParams,
    };
    pub use crate::pattern::{
        analyze_pattern, periodicity_2d, DetrendParams, PatternAnalysis, PatternDescriptor, PeakSelection,
        PeriodicityParams,
    };
    pub use dunestrat_core::prelude::*;
}
