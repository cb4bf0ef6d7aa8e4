//! Elevation raster type

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::raster::GridAxes;

/// A digital elevation model on a `(lat, lon)` grid.
///
/// Values are stored row-major as `(row, col)`; row `r` lies at
/// `axes.lat[r]` and column `c` at `axes.lon[c]`.
///
/// # Example
///
/// ```ignore
/// use dunestrat_core::{GridAxes, Raster};
///
/// let axes = GridAxes::regular(100, 80, 15.0, -24.0, 1e-3, 1e-3)?;
/// let dem = Raster::with_axes(Array2::zeros((80, 100)), axes)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster {
    data: Array2<f64>,
    axes: GridAxes,
}

impl Raster {
    /// Create a new raster filled with zeros, with pixel axes
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            axes: GridAxes::pixels(rows, cols),
        }
    }

    /// Create a raster from an ndarray, with pixel axes
    pub fn from_array(data: Array2<f64>) -> Self {
        let (rows, cols) = data.dim();
        Self {
            data,
            axes: GridAxes::pixels(rows, cols),
        }
    }

    /// Create a raster from row-major data, with pixel axes
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a georeferenced raster; axis lengths must match the array shape.
    pub fn with_axes(data: Array2<f64>, axes: GridAxes) -> Result<Self> {
        let (rows, cols) = data.dim();
        if axes.cols() != cols {
            return Err(Error::SizeMismatch {
                what: "lon axis",
                expected: cols,
                actual: axes.cols(),
            });
        }
        if axes.rows() != rows {
            return Err(Error::SizeMismatch {
                what: "lat axis",
                expected: rows,
                actual: axes.rows(),
            });
        }
        Ok(Self { data, axes })
    }

    /// Same axes, different values
    pub fn like(&self, data: Array2<f64>) -> Result<Self> {
        Self::with_axes(data, self.axes.clone())
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data.get((row, col)).copied().ok_or_else(|| {
            Error::Other(format!(
                "Index ({row}, {col}) out of bounds for raster of size {:?}",
                self.shape()
            ))
        })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let shape = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::Other(format!(
                "Index ({row}, {col}) out of bounds for raster of size {shape:?}"
            ))),
        }
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// Grid coordinate vectors
    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    /// Largest absolute finite value (0 for an all-NaN raster)
    pub fn max_abs(&self) -> f64 {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Calculate basic statistics over finite cells
    pub fn statistics(&self) -> RasterStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut count = 0_usize;

        for &v in self.data.iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            sum_sq += v * v;
            count += 1;
        }

        if count == 0 {
            return RasterStatistics {
                min: None,
                max: None,
                mean: None,
                std_dev: None,
                valid_count: 0,
                nodata_count: self.len(),
            };
        }

        let mean = sum / count as f64;
        let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
        RasterStatistics {
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
            std_dev: Some(variance.sqrt()),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}
