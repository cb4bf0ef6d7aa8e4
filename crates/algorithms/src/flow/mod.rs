//! Linear theory of a turbulent stratified flow over a sinusoidal bed
//!
//! - [`solver`]: integrate the flow branches and match the boundary-layer top
//! - [`approximation`]: fitted coefficients for the neutral unbounded case
//! - [`geometric`]: shear stress over oblique bedforms

pub mod approximation;
pub mod boundary;
pub mod geometric;
pub mod ode;
pub mod profile;
pub mod solver;
pub mod system;

pub use approximation::{coeff_a0, coeff_b0};
pub use boundary::{complex_solve, BoundarySystem, BoundaryWeights};
pub use geometric::{basal_shear_stress, basal_shear_stress_rotated};
pub use ode::{integrate, DenseSolution, IntegrationStats, IntegratorParams, OdeSystem};
pub use profile::{mu, mu_prime, KAPPA};
pub use solver::{
    solve, solve_hydro_coefficients, FlowParameters, FlowSolution, FlowSolver, HydroCoefficients,
    SolverParams,
};
pub use system::{q1, FlowSystem, Forcing};
