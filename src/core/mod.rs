//! Field cleaning and plot preparation

pub mod sentinel;
pub mod geolocation;
pub mod plot;

// Re-export main types
pub use sentinel::{clean, CleanedField, CleaningSummary, MaskRule, Rejection, SentinelCleaner};
pub use geolocation::{orbit_window, orbit_window_dyn, wrap_longitudes, DEFAULT_ORBIT_WINDOW};
pub use plot::{tick_range, ContourPlot};
