//! Hydrodynamic coefficients along a station's time series

use serde::{Deserialize, Serialize};
use tracing::info;
use dunestrat_algorithms::flow::{solve_hydro_coefficients, FlowParameters, HydroCoefficients, SolverParams};
use dunestrat_core::station::StationDataset;
use dunestrat_core::{Error, Result};

use crate::strategy::{ParallelStrategy, ProcessingMode};

/// `A0`, `B0` per time step of a station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydroSeries {
    pub station: String,
    /// Roughness `k z0` shared by every step
    pub eta_0: f64,
    pub a0: Vec<f64>,
    pub b0: Vec<f64>,
    /// Steps with finite inputs whose solve failed
    pub failures: usize,
}

impl HydroSeries {
    pub fn len(&self) -> usize {
        self.a0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a0.is_empty()
    }
}

/// Flow numbers of step `i`, or `None` when any of them is missing
fn step_parameters(station: &StationDataset, i: usize, eta_0: f64) -> Option<FlowParameters> {
    let (kh, klb, froude) = (station.kh[i], station.klb[i], station.froude[i]);
    if kh.is_nan() || klb.is_nan() || froude.is_nan() {
        return None;
    }
    Some(FlowParameters::new(kh, eta_0, klb, froude))
}

/// Solve the flow for every time step of `station`.
///
/// The wavenumber comes from the station's dune pattern, so `η0 = k z0`.
/// Steps with a NaN input, or whose parameters are rejected by the solver,
/// give `(NaN, NaN)`.
pub fn hydro_time_series(
    station: &StationDataset,
    solver: &SolverParams,
    mode: ProcessingMode,
) -> Result<HydroSeries> {
    station.validate()?;
    solver.validate()?;
    let pattern = station.pattern.ok_or_else(|| {
        Error::invalid("pattern", "None", "station has no dune pattern to set the wavenumber")
    })?;
    let k = pattern.wavenumber();
    if !k.is_finite() || k <= 0.0 {
        return Err(Error::invalid(
            "wavelength_km",
            pattern.wavelength_km,
            "must be finite and > 0",
        ));
    }
    let eta_0 = k * station.hydrodynamic_roughness;

    let solver = SolverParams {
        parallel_branches: solver.parallel_branches && !mode.is_parallel(),
        ..solver.clone()
    };
    info!(station = %station.name, steps = station.len(), eta_0, "hydro time series");

    let results = mode.par_map(0..station.len(), |i| match step_parameters(station, i, eta_0) {
        None => Ok(HydroCoefficients::NAN),
        Some(flow) => solve_hydro_coefficients(&flow, &solver),
    });

    let failures = results.iter().filter(|r| r.is_err()).count();
    let (a0, b0): (Vec<f64>, Vec<f64>) = results
        .into_iter()
        .map(|r| r.unwrap_or(HydroCoefficients::NAN))
        .map(|c| (c.a0, c.b0))
        .unzip();

    Ok(HydroSeries {
        station: station.name.clone(),
        eta_0,
        a0,
        b0,
        failures,
    })
}
