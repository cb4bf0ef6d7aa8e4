//! Serializable DEM exchange record

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::{GridAxes, Raster};

/// Plain-array form of a DEM: `elevation[row][col]` with its axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemDocument {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub elevation: Vec<Vec<f64>>,
}

impl DemDocument {
    /// Build a [`Raster`], checking the rows are rectangular and match the axes.
    pub fn into_raster(self) -> Result<Raster> {
        let rows = self.elevation.len();
        let cols = self.elevation.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        if let Some(bad) = self.elevation.iter().find(|r| r.len() != cols) {
            return Err(Error::SizeMismatch {
                what: "elevation row",
                expected: cols,
                actual: bad.len(),
            });
        }

        let flat: Vec<f64> = self.elevation.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| Error::Other(e.to_string()))?;
        let axes = GridAxes::new(self.lon, self.lat)?;
        Raster::with_axes(data, axes)
    }

    pub fn from_raster(raster: &Raster) -> Self {
        Self {
            lon: raster.axes().lon.clone(),
            lat: raster.axes().lat.clone(),
            elevation: raster.data().outer_iter().map(|r| r.to_vec()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_document_to_raster() {
        let json = r#"{"lon":[0.0,0.1,0.2],"lat":[5.0,5.1],"elevation":[[1,2,3],[4,5,6]]}"#;
        let doc: DemDocument = serde_json::from_str(json).unwrap();
        let raster = doc.into_raster().unwrap();
        assert_eq!(raster.shape(), (2, 3));
        assert_eq!(raster.get(1, 2).unwrap(), 6.0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let doc = DemDocument {
            lon: vec![0.0, 1.0],
            lat: vec![0.0, 1.0],
            elevation: vec![vec![1.0, 2.0], vec![3.0]],
        };
        assert!(matches!(doc.into_raster(), Err(Error::SizeMismatch { .. })));
    }
}
