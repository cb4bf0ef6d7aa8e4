//! Per-station dataset record
//!
//! One `StationDataset` gathers everything the two numerical components
//! need about a measurement site: the time series of non-dimensional flow
//! numbers, calibration constants, the sand-flux distribution and the dune
//! pattern extracted from its DEM.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Dune pattern summary extracted from a DEM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DunePattern {
    /// Crest orientation in degrees, in `[0, 180)`
    #[serde(deserialize_with = "nan_if_null")]
    pub orientation: f64,
    /// Pattern wavelength in kilometres (NaN when undetected)
    #[serde(deserialize_with = "nan_if_null")]
    pub wavelength_km: f64,
    /// Pattern amplitude in elevation units
    #[serde(deserialize_with = "nan_if_null")]
    pub amplitude: f64,
}

impl DunePattern {
    /// Dune wavenumber `k = 2π/λ` in 1/m
    pub fn wavenumber(&self) -> f64 {
        2.0 * std::f64::consts::PI / (self.wavelength_km * 1e3)
    }
}

/// Typed per-station dataset.
///
/// JSON has no NaN: missing samples are written as `null` and read back as
/// NaN in every series. An infinite `kL_B` (neutral step) therefore
/// round-trips as a missing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationDataset {
    pub name: String,
    /// Hydrodynamic roughness `z0` in meters
    #[serde(default = "default_roughness")]
    pub hydrodynamic_roughness: f64,
    /// Froude number per time step
    #[serde(deserialize_with = "nan_if_null_series")]
    pub froude: Vec<f64>,
    /// Non-dimensional boundary-layer height `kH` per time step
    #[serde(deserialize_with = "nan_if_null_series")]
    pub kh: Vec<f64>,
    /// Non-dimensional stratification length `kL_B` per time step
    #[serde(deserialize_with = "nan_if_null_series")]
    pub klb: Vec<f64>,
    /// Sand flux orientation (degrees) per time step
    #[serde(default, deserialize_with = "nan_if_null_series")]
    pub flux_orientation: Vec<f64>,
    /// Sand flux magnitude per time step
    #[serde(default, deserialize_with = "nan_if_null_series")]
    pub flux_magnitude: Vec<f64>,
    #[serde(default)]
    pub pattern: Option<DunePattern>,
}

fn default_roughness() -> f64 {
    1e-3
}

fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn nan_if_null_series<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error> {
    let values = Vec::<Option<f64>>::deserialize(deserializer)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

impl StationDataset {
    /// Number of time steps
    pub fn len(&self) -> usize {
        self.froude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.froude.is_empty()
    }

    /// Check that the series have consistent lengths and constants are sane.
    pub fn validate(&self) -> Result<()> {
        let n = self.froude.len();
        for (what, len) in [("kh", self.kh.len()), ("klb", self.klb.len())] {
            if len != n {
                return Err(Error::SizeMismatch {
                    what,
                    expected: n,
                    actual: len,
                });
            }
        }
        if self.flux_orientation.len() != self.flux_magnitude.len() {
            return Err(Error::SizeMismatch {
                what: "flux_magnitude",
                expected: self.flux_orientation.len(),
                actual: self.flux_magnitude.len(),
            });
        }
        if !(self.hydrodynamic_roughness > 0.0) {
            return Err(Error::invalid(
                "hydrodynamic_roughness",
                self.hydrodynamic_roughness,
                "must be > 0",
            ));
        }
        Ok(())
    }

    /// Read a station from JSON
    pub fn from_json(reader: impl std::io::Read) -> Result<Self> {
        let station: Self = serde_json::from_reader(reader)?;
        station.validate()?;
        Ok(station)
    }
}
