//! Longitude/latitude coordinate vectors of a regular geographic grid

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geodesy::{vincenty_distance, Spheroid};

/// Coordinate vectors of a `(lat, lon)` grid, in degrees.
///
/// `lon[col]` is the longitude of column `col` and `lat[row]` the latitude
/// of row `row`. Both vectors must be strictly monotonic; they may run in
/// either direction (north-up DEMs usually have a decreasing `lat`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxes {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl GridAxes {
    /// Build axes from coordinate vectors, checking they are finite and monotonic.
    pub fn new(lon: Vec<f64>, lat: Vec<f64>) -> Result<Self> {
        check_axis("lon", &lon)?;
        check_axis("lat", &lat)?;
        Ok(Self { lon, lat })
    }

    /// Regular axes starting at `(lon0, lat0)` with constant steps.
    pub fn regular(
        cols: usize,
        rows: usize,
        lon0: f64,
        lat0: f64,
        d_lon: f64,
        d_lat: f64,
    ) -> Result<Self> {
        let lon = (0..cols).map(|i| lon0 + i as f64 * d_lon).collect();
        let lat = (0..rows).map(|j| lat0 + j as f64 * d_lat).collect();
        Self::new(lon, lat)
    }

    /// Pixel axes (`0, 1, 2, ...`) for rasters without geographic reference.
    pub fn pixels(rows: usize, cols: usize) -> Self {
        Self {
            lon: (0..cols).map(|i| i as f64).collect(),
            lat: (0..rows).map(|j| j as f64).collect(),
        }
    }

    /// Number of columns described by the longitude axis
    pub fn cols(&self) -> usize {
        self.lon.len()
    }

    /// Number of rows described by the latitude axis
    pub fn rows(&self) -> usize {
        self.lat.len()
    }

    /// Mean signed longitude step (degrees per column)
    pub fn lon_step(&self) -> f64 {
        mean_step(&self.lon)
    }

    /// Mean signed latitude step (degrees per row)
    pub fn lat_step(&self) -> f64 {
        mean_step(&self.lat)
    }

    /// `(x, y)` coordinate of every cell, row-major, as `np.meshgrid(lon, lat)` would give.
    pub fn meshgrid(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.rows() * self.cols();
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for &y in &self.lat {
            for &x in &self.lon {
                xs.push(x);
                ys.push(y);
            }
        }
        (xs, ys)
    }

    /// Average ground distance of one grid step, in kilometres.
    ///
    /// Geodesic distances are measured on the spheroid from the grid origin
    /// along the first row (longitude) and along the first column
    /// (latitude); the result is the mean of the two mean step lengths.
    /// Fails when a geodesic along either axis does not converge.
    pub fn km_step(&self, spheroid: &Spheroid) -> Result<f64> {
        let lat0 = self.lat[0].to_radians();
        let lon0 = self.lon[0].to_radians();

        let x_km = self
            .lon
            .iter()
            .map(|l| Ok(vincenty_distance(lat0, lon0, lat0, l.to_radians(), spheroid)? / 1e3))
            .collect::<Result<Vec<f64>>>()?;
        let y_km = self
            .lat
            .iter()
            .map(|l| Ok(vincenty_distance(lat0, lon0, l.to_radians(), lon0, spheroid)? / 1e3))
            .collect::<Result<Vec<f64>>>()?;

        let steps: Vec<f64> = [mean_step(&x_km), mean_step(&y_km)]
            .into_iter()
            .filter(|s| s.is_finite())
            .collect();
        if steps.is_empty() {
            return Ok(f64::NAN);
        }
        Ok(steps.iter().sum::<f64>() / steps.len() as f64)
    }
}

fn check_axis(name: &'static str, axis: &[f64]) -> Result<()> {
    if axis.is_empty() {
        return Err(Error::invalid(name, "[]", "axis must not be empty"));
    }
    if let Some(v) = axis.iter().find(|v| !v.is_finite()) {
        return Err(Error::invalid(name, v, "axis values must be finite"));
    }
    if axis.len() > 1 {
        let increasing = axis[1] > axis[0];
        let monotonic = axis.windows(2).all(|w| {
            if increasing {
                w[1] > w[0]
            } else {
                w[1] < w[0]
            }
        });
        if !monotonic {
            return Err(Error::invalid(
                name,
                format!("{:?}..", &axis[..2]),
                "axis must be strictly monotonic",
            ));
        }
    }
    Ok(())
}

/// Mean of consecutive differences; NaN for fewer than two values.
fn mean_step(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    (values[values.len() - 1] - values[0]) / (values.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_non_monotonic() {
        assert!(GridAxes::new(vec![0.0, 1.0, 0.5], vec![0.0]).is_err());
        assert!(GridAxes::new(vec![0.0, 1.0], vec![]).is_err());
        assert!(GridAxes::new(vec![0.0, f64::NAN], vec![0.0]).is_err());
    }

    #[test]
    fn test_descending_latitude_is_accepted() {
        let axes = GridAxes::regular(3, 4, 10.0, -20.0, 0.1, -0.1).unwrap();
        assert_eq!(axes.cols(), 3);
        assert_eq!(axes.rows(), 4);
        assert_relative_eq!(axes.lat_step(), -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_meshgrid_layout() {
        let axes = GridAxes::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0]).unwrap();
        let (xs, ys) = axes.meshgrid();
        assert_eq!(xs, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert_eq!(ys, vec![10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
    }

    #[test]
    fn test_km_step_one_arcsecond_near_equator() {
        let step = 1.0 / 3600.0;
        let axes = GridAxes::regular(50, 50, 15.0, 0.0, step, step).unwrap();
        let km = axes.km_step(&Spheroid::default()).unwrap();
        // ~30.9 m E-W and ~30.7 m N-S at the equator
        assert!(km > 0.0300 && km < 0.0315, "km_step = {km}");
    }
}
