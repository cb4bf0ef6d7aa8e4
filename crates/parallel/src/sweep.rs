//! Hydrodynamic coefficients over planes of the `(Fr, kH, kL_B)` parameter space

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use dunestrat_algorithms::flow::{solve_hydro_coefficients, FlowParameters, HydroCoefficients, SolverParams};
use dunestrat_core::{Error, Result};

use crate::strategy::{ParallelStrategy, ProcessingMode};

/// `num` points evenly spaced in log10 between `10^start` and `10^stop`
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| 10f64.powf(start + step * i as f64)).collect()
        }
    }
}

/// Logarithmic axis of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogAxis {
    /// log10 of the first value
    pub start: f64,
    /// log10 of the last value
    pub stop: f64,
    pub num: usize,
}

impl LogAxis {
    pub const fn new(start: f64, stop: f64, num: usize) -> Self {
        Self { start, stop, num }
    }

    pub fn values(&self) -> Vec<f64> {
        logspace(self.start, self.stop, self.num)
    }
}

/// Plane of the parameter space; the third number is held fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepPlane {
    /// Rows Froude, columns kH, fixed kL_B
    FroudeKh,
    /// Rows kL_B, columns kH, fixed Froude
    KlbKh,
    /// Rows Froude, columns kL_B, fixed kH
    FroudeKlb,
}

impl std::str::FromStr for SweepPlane {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "froude_kh" => Ok(SweepPlane::FroudeKh),
            "klb_kh" => Ok(SweepPlane::KlbKh),
            "froude_klb" => Ok(SweepPlane::FroudeKlb),
            _ => Err(Error::invalid("plane", s, "expected froude_kh, klb_kh or froude_klb")),
        }
    }
}

/// Parameters for a plane sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    pub kh: LogAxis,
    pub froude: LogAxis,
    pub klb: LogAxis,
    /// Value of kH on the `FroudeKlb` plane
    pub fixed_kh: f64,
    /// Value of the Froude number on the `KlbKh` plane
    pub fixed_froude: f64,
    /// Value of kL_B on the `FroudeKh` plane
    pub fixed_klb: f64,
    /// Roughness `k z0`, common to every point
    pub eta_0: f64,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            kh: LogAxis::new(-2.0, 1.1, 100),
            froude: LogAxis::new(-2.3, 2.5, 100),
            klb: LogAxis::new(-2.1, 1.0, 100),
            fixed_kh: 1.0,
            fixed_froude: 1.0,
            fixed_klb: 1.0,
            // z0 = 1 mm under a 2.5 km pattern
            eta_0: 2.0 * std::f64::consts::PI / 2.5e3 * 1e-3,
        }
    }
}

/// Coefficients on a sweep plane, indexed `[row axis, column axis]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub plane: SweepPlane,
    pub rows: Vec<f64>,
    pub cols: Vec<f64>,
    /// Value of the number held fixed
    pub fixed: f64,
    pub eta_0: f64,
    pub a0: Array2<f64>,
    pub b0: Array2<f64>,
    /// Points that did not yield coefficients (stored as NaN)
    pub failures: usize,
}

impl SweepParams {
    /// Row axis, column axis and fixed value of a plane
    pub fn axes(&self, plane: SweepPlane) -> (Vec<f64>, Vec<f64>, f64) {
        match plane {
            SweepPlane::FroudeKh => (self.froude.values(), self.kh.values(), self.fixed_klb),
            SweepPlane::KlbKh => (self.klb.values(), self.kh.values(), self.fixed_froude),
            SweepPlane::FroudeKlb => (self.froude.values(), self.klb.values(), self.fixed_kh),
        }
    }

    fn point(&self, plane: SweepPlane, row: f64, col: f64, fixed: f64) -> FlowParameters {
        match plane {
            SweepPlane::FroudeKh => FlowParameters::new(col, self.eta_0, fixed, row),
            SweepPlane::KlbKh => FlowParameters::new(col, self.eta_0, row, fixed),
            SweepPlane::FroudeKlb => FlowParameters::new(fixed, self.eta_0, col, row),
        }
    }
}

/// Solve the flow at every point of a plane of the parameter space.
///
/// Points are distributed according to `mode`; each point integrates its
/// four branches sequentially when the points themselves run in parallel.
pub fn sweep_plane(
    plane: SweepPlane,
    params: &SweepParams,
    solver: &SolverParams,
    mode: ProcessingMode,
) -> Result<SweepResult> {
    solver.validate()?;
    if !params.eta_0.is_finite() || params.eta_0 <= 0.0 {
        return Err(Error::invalid("eta_0", params.eta_0, "must be finite and > 0"));
    }
    let (rows, cols, fixed) = params.axes(plane);
    let (nr, nc) = (rows.len(), cols.len());
    if nr == 0 || nc == 0 {
        return Err(Error::InvalidDimensions { width: nc, height: nr });
    }

    let solver = SolverParams {
        parallel_branches: solver.parallel_branches && !mode.is_parallel(),
        ..solver.clone()
    };
    info!(?plane, rows = nr, cols = nc, fixed, "sweep");

    let points = mode.par_map(0..nr * nc, |idx| {
        let (i, j) = (idx / nc, idx % nc);
        let flow = params.point(plane, rows[i], cols[j], fixed);
        match solve_hydro_coefficients(&flow, &solver) {
            Ok(c) => Some(c),
            Err(e) => {
                debug!(i, j, error = %e, "sweep point failed");
                None
            }
        }
    });

    let failures = points.iter().filter(|p| p.is_none()).count();
    let coeffs: Vec<HydroCoefficients> = points
        .into_iter()
        .map(|p| p.unwrap_or(HydroCoefficients::NAN))
        .collect();
    let a0 = Array2::from_shape_fn((nr, nc), |(i, j)| coeffs[i * nc + j].a0);
    let b0 = Array2::from_shape_fn((nr, nc), |(i, j)| coeffs[i * nc + j].b0);

    Ok(SweepResult {
        plane,
        rows,
        cols,
        fixed,
        eta_0: params.eta_0,
        a0,
        b0,
        failures,
    })
}
