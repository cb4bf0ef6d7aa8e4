//! Hydrodynamic response of a capped, stratified boundary layer
//!
//! Integrates the four canonical branches of the linearised flow equations
//! from the bed to just below the boundary-layer top, matches the
//! free-atmosphere conditions there and returns the basal shear-stress
//! coefficients `A0`, `B0` (in-phase and in-quadrature with the bed).

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use dunestrat_core::{Algorithm, Error, Result};

use super::boundary::{BoundarySystem, BoundaryWeights};
use super::ode::{integrate, DenseSolution, IntegratorParams};
use super::profile::KAPPA;
use super::system::FlowSystem;
use crate::maybe_rayon::map_indices;

/// Non-dimensional flow numbers for one solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowParameters {
    /// Boundary-layer height `kH`
    pub eta_h: f64,
    /// Hydrodynamic roughness `k z0`
    pub eta_0: f64,
    /// Stratification length `k L_B` (`+∞` for a neutral free atmosphere)
    pub eta_b: f64,
    /// Froude number
    pub froude: f64,
    /// Height where the branches are matched; `ceiling_fraction · η_H` when `None`
    #[serde(default)]
    pub max_z: Option<f64>,
}

impl FlowParameters {
    pub fn new(eta_h: f64, eta_0: f64, eta_b: f64, froude: f64) -> Self {
        Self {
            eta_h,
            eta_0,
            eta_b,
            froude,
            max_z: None,
        }
    }

    /// Match the boundary conditions at an explicit height
    pub fn with_max_z(mut self, max_z: f64) -> Self {
        self.max_z = Some(max_z);
        self
    }

    /// Matching height for the given solver settings
    pub fn ceiling(&self, solver: &SolverParams) -> f64 {
        self.max_z.unwrap_or(solver.ceiling_fraction * self.eta_h)
    }

    pub fn validate(&self, solver: &SolverParams) -> Result<()> {
        if !self.eta_h.is_finite() || self.eta_h <= 0.0 {
            return Err(Error::invalid("eta_H", self.eta_h, "must be finite and > 0"));
        }
        if !self.eta_0.is_finite() || self.eta_0 <= 0.0 {
            return Err(Error::invalid("eta_0", self.eta_0, "must be finite and > 0"));
        }
        if self.eta_b.is_nan() || self.eta_b <= 0.0 {
            return Err(Error::invalid("eta_B", self.eta_b, "must be > 0 (may be +inf)"));
        }
        if !self.froude.is_finite() || self.froude == 0.0 {
            return Err(Error::invalid("Fr", self.froude, "must be finite and non-zero"));
        }
        let max_z = self.ceiling(solver);
        if !max_z.is_finite() || max_z <= 0.0 {
            return Err(Error::invalid("max_z", max_z, "must be finite and > 0"));
        }
        if max_z >= self.eta_h {
            return Err(Error::invalid("max_z", max_z, "must be below eta_H"));
        }
        Ok(())
    }
}

/// Parameters for the flow solver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Von Kármán constant
    pub kappa: f64,
    /// Integrator absolute tolerance
    pub atol: f64,
    /// Integrator relative tolerance
    pub rtol: f64,
    /// Matching height as a fraction of `η_H` (the layer top is singular)
    pub ceiling_fraction: f64,
    /// Step budget per branch
    pub max_steps: usize,
    /// Condition estimate above which the boundary solve is reported as ill-conditioned
    pub condition_warning: f64,
    /// Integrate the four branches on the rayon pool
    pub parallel_branches: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            kappa: KAPPA,
            atol: 1e-10,
            rtol: 1e-10,
            ceiling_fraction: 0.9999,
            max_steps: 1_000_000,
            condition_warning: 1e12,
            parallel_branches: true,
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<()> {
        if !self.kappa.is_finite() || self.kappa <= 0.0 {
            return Err(Error::invalid("kappa", self.kappa, "must be finite and > 0"));
        }
        if !(self.ceiling_fraction > 0.0 && self.ceiling_fraction < 1.0) {
            return Err(Error::invalid(
                "ceiling_fraction",
                self.ceiling_fraction,
                "must be in (0, 1)",
            ));
        }
        Ok(())
    }

    fn integrator(&self) -> IntegratorParams {
        IntegratorParams {
            atol: self.atol,
            rtol: self.rtol,
            max_steps: self.max_steps,
            first_step: None,
        }
    }
}

/// In-phase and in-quadrature basal shear-stress coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HydroCoefficients {
    pub a0: f64,
    pub b0: f64,
}

impl HydroCoefficients {
    pub const NAN: Self = Self {
        a0: f64::NAN,
        b0: f64::NAN,
    };

    pub fn from_complex(value: Complex64) -> Self {
        Self {
            a0: value.re,
            b0: value.im,
        }
    }

    pub fn as_complex(&self) -> Complex64 {
        Complex64::new(self.a0, self.b0)
    }
}

/// Full output of one solve
#[derive(Debug, Clone)]
pub struct FlowSolution {
    pub parameters: FlowParameters,
    pub kappa: f64,
    /// Matching height actually used
    pub max_z: f64,
    /// `[1, w1/w0, w2/w0, 1/w0]`
    pub coefficients: [Complex64; 4],
    pub weights: BoundaryWeights,
    pub boundary: BoundarySystem,
    pub branches: [DenseSolution<4>; 4],
    /// Heights requested at solve time
    pub eta_eval: Vec<f64>,
    /// Combined state `[U, W, S_t, S_n]` at each `eta_eval`
    pub values: Vec<[Complex64; 4]>,
}

impl FlowSolution {
    /// Combined solution at `eta` in `[0, max_z]`
    pub fn profile(&self, eta: f64) -> Result<[Complex64; 4]> {
        let mut out = [Complex64::new(0.0, 0.0); 4];
        for (branch, coeff) in self.branches.iter().zip(self.coefficients.iter()) {
            let state = branch.evaluate(eta)?;
            for (o, s) in out.iter_mut().zip(state.iter()) {
                *o += *coeff * *s;
            }
        }
        Ok(out)
    }

    /// `A0 + i B0 = S_t(0)`
    pub fn hydro_coefficients(&self) -> Result<HydroCoefficients> {
        Ok(HydroCoefficients::from_complex(self.profile(0.0)?[2]))
    }

    /// Largest absolute violation of the three matching conditions
    pub fn boundary_residual(&self) -> f64 {
        self.boundary.residual(&self.weights.raw)
    }

    pub fn condition(&self) -> f64 {
        self.weights.condition
    }

    /// Accepted integrator steps summed over the branches
    pub fn total_steps(&self) -> usize {
        self.branches.iter().map(|b| b.stats().accepted).sum()
    }
}

/// Flow solver algorithm
#[derive(Debug, Clone, Default)]
pub struct FlowSolver;

impl Algorithm for FlowSolver {
    type Input = FlowParameters;
    type Output = HydroCoefficients;
    type Params = SolverParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "FlowSolver"
    }

    fn description(&self) -> &'static str {
        "Basal shear-stress coefficients of a stratified boundary layer over a sinusoidal bed"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        solve_hydro_coefficients(&input, &params)
    }
}

/// Solve the linearised flow over a sinusoidal bed.
///
/// # Arguments
/// * `eta_eval` - Heights in `[0, max_z]` where the combined solution is reported
/// * `params` - Non-dimensional flow numbers
/// * `solver` - Integrator and matching settings
///
/// # Returns
/// The branches, combination coefficients and diagnostics. An ill-conditioned
/// matching system is logged, not rejected.
pub fn solve(eta_eval: &[f64], params: &FlowParameters, solver: &SolverParams) -> Result<FlowSolution> {
    solver.validate()?;
    params.validate(solver)?;
    let max_z = params.ceiling(solver);
    if let Some(&bad) = eta_eval.iter().find(|&&e| !(0.0..=max_z).contains(&e)) {
        return Err(Error::invalid("eta", bad, format!("must lie within [0, {}]", max_z)));
    }

    let integrator = solver.integrator();
    let branch_setup = FlowSystem::branches(params.eta_h, params.eta_0, solver.kappa);
    let results = map_indices(4, solver.parallel_branches, |i| {
        let (system, y0) = &branch_setup[i];
        integrate(system, 0.0, max_z, *y0, &integrator)
    });
    let branches: Vec<DenseSolution<4>> = results.into_iter().collect::<Result<_>>()?;
    let branches: [DenseSolution<4>; 4] = branches
        .try_into()
        .map_err(|_| Error::Algorithm("expected four flow branches".into()))?;

    let top = [
        branches[0].final_state(),
        branches[1].final_state(),
        branches[2].final_state(),
        branches[3].final_state(),
    ];
    let boundary = BoundarySystem::new(
        &top,
        max_z,
        params.eta_h,
        params.eta_0,
        params.eta_b,
        params.froude,
        solver.kappa,
    );
    let weights = boundary.solve()?;
    if weights.condition > solver.condition_warning {
        warn!(
            condition = weights.condition,
            eta_h = params.eta_h,
            eta_b = params.eta_b,
            froude = params.froude,
            "ill-conditioned boundary system"
        );
    }

    let mut solution = FlowSolution {
        parameters: *params,
        kappa: solver.kappa,
        max_z,
        coefficients: weights.coefficients,
        weights,
        boundary,
        branches,
        eta_eval: eta_eval.to_vec(),
        values: Vec::with_capacity(eta_eval.len()),
    };
    for &eta in eta_eval {
        let value = solution.profile(eta)?;
        solution.values.push(value);
    }

    debug!(
        eta_h = params.eta_h,
        eta_0 = params.eta_0,
        eta_b = params.eta_b,
        froude = params.froude,
        steps = solution.total_steps(),
        residual = solution.boundary_residual(),
        "flow solve"
    );
    Ok(solution)
}

/// `(A0, B0)` for one parameter set
pub fn solve_hydro_coefficients(params: &FlowParameters, solver: &SolverParams) -> Result<HydroCoefficients> {
    solve(&[], params, solver)?.hydro_coefficients()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_ceiling() {
        let params = FlowParameters::new(2.0, 1e-3, 1.5, 0.5);
        assert_relative_eq!(params.ceiling(&SolverParams::default()), 1.9998);
        assert_eq!(params.with_max_z(1.5).ceiling(&SolverParams::default()), 1.5);
    }

    #[test]
    fn test_validation() {
        let solver = SolverParams::default();
        assert!(FlowParameters::new(1.0, 1e-3, 2.0, 0.5).validate(&solver).is_ok());
        assert!(FlowParameters::new(1.0, 1e-3, f64::INFINITY, 0.5).validate(&solver).is_ok());
        assert!(FlowParameters::new(1.0, 0.0, 2.0, 0.5).validate(&solver).is_err());
        assert!(FlowParameters::new(-1.0, 1e-3, 2.0, 0.5).validate(&solver).is_err());
        assert!(FlowParameters::new(1.0, 1e-3, f64::NAN, 0.5).validate(&solver).is_err());
        assert!(FlowParameters::new(1.0, 1e-3, 2.0, 0.0).validate(&solver).is_err());
        let err = FlowParameters::new(1.0, 1e-3, 2.0, 0.5)
            .with_max_z(1.0)
            .validate(&solver)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "max_z", .. }));
    }

    #[test]
    fn test_solver_params_validation() {
        let bad = SolverParams {
            ceiling_fraction: 1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(SolverParams::default().validate().is_ok());
    }

    #[test]
    fn test_solution_profile_at_bed() {
        let params = FlowParameters::new(1.0, 1e-3, 2.0, 0.5);
        let solution = solve(&[0.0, 0.5], &params, &SolverParams::default()).unwrap();
        // Only branch 1 carries S_t at the bed
        let st0 = solution.values[0][2];
        assert_relative_eq!(st0.re, solution.coefficients[1].re, max_relative = 1e-12);
        assert_relative_eq!(st0.im, solution.coefficients[1].im, max_relative = 1e-12);
        assert_eq!(solution.values.len(), 2);
        assert!(solution.total_steps() > 0);
    }

    #[test]
    fn test_eta_eval_out_of_range() {
        let params = FlowParameters::new(1.0, 1e-3, 2.0, 0.5);
        assert!(solve(&[1.5], &params, &SolverParams::default()).is_err());
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let params = FlowParameters::new(1.0, 1e-3, 2.0, 0.5);
        let par = solve_hydro_coefficients(&params, &SolverParams::default()).unwrap();
        let seq = solve_hydro_coefficients(
            &params,
            &SolverParams {
                parallel_branches: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(par, seq);
    }
}
