//! DEM raster and its geographic grid axes

mod axes;
mod document;
mod grid;

pub use axes::GridAxes;
pub use document::DemDocument;
pub use grid::{Raster, RasterStatistics};
