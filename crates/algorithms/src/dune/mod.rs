//! Dune orientation from sand-flux distributions

pub mod courrech;

pub use courrech::{
    bed_instability_orientation, default_alpha_bins, elongation_direction, flux_at_crest, growth_rate,
    growth_rate_with, resultant_flux_at_crest, resultant_flux_perp_crest, FLUX_UP_RATIO,
};
