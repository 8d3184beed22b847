//! Plot-ready descriptions of the two diagnostic figures.
//!
//! Rendering is left to the caller (matplotlib through the Python bindings);
//! these structs carry the data, labels and axis layout it needs.

use ndarray::{Array2, ArrayD, Ix2};
use serde::{Deserialize, Serialize};

use crate::core::geolocation::{orbit_window_dyn, wrap_longitudes};
use crate::core::CleanedField;
use crate::types::{SiftError, SiftResult};

/// A filled-contour figure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourPlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
    pub colormap: Option<String>,
    pub x_ticks: Vec<f64>,
    pub y_ticks: Vec<f64>,
    /// Draw the y axis top-down
    pub invert_y: bool,
    /// Contoured values, NaN where missing
    pub z: Array2<f64>,
    /// Per-cell x coordinates; `None` means plain column indices
    pub x: Option<Array2<f64>>,
    /// Per-cell y coordinates; `None` means plain row indices
    pub y: Option<Array2<f64>>,
}

/// Evenly stepped ticks in `[start, stop)`
pub fn tick_range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 {
        return Vec::new();
    }
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

fn as_grid(array: &ArrayD<f64>, what: &str) -> SiftResult<Array2<f64>> {
    array
        .view()
        .into_dimensionality::<Ix2>()
        .map(|view| view.to_owned())
        .map_err(|_| {
            SiftError::InvalidArgument(format!(
                "{} must be 2-D, got shape {:?}",
                what,
                array.shape()
            ))
        })
}

impl ContourPlot {
    /// Map of cloud-top height over its swath, longitudes wrapped to [0, 360)
    pub fn cloud_top_map(
        longitude: &ArrayD<f64>,
        latitude: &ArrayD<f64>,
        cloud_top: &CleanedField,
    ) -> SiftResult<Self> {
        let z = as_grid(&cloud_top.values, "cloud-top height")?;
        let x = as_grid(&wrap_longitudes(longitude), "longitude")?;
        let y = as_grid(latitude, "latitude")?;

        if x.dim() != z.dim() || y.dim() != z.dim() {
            return Err(SiftError::Processing(format!(
                "swath coordinates {:?}/{:?} do not match field {:?}",
                x.dim(),
                y.dim(),
                z.dim()
            )));
        }

        Ok(Self {
            title: cloud_top.name.clone(),
            x_label: "Longitude".to_string(),
            y_label: "Latitude".to_string(),
            colorbar_label: "Meters".to_string(),
            colormap: Some("Blues_r".to_string()),
            x_ticks: tick_range(163.0, 192.0, 4.0),
            y_ticks: tick_range(-4.0, 21.0, 4.0),
            invert_y: false,
            z,
            x: Some(x),
            y: Some(y),
        })
    }

    /// Range-bin x orbit-bin contour of a window of the reflectivity profile
    pub fn reflectivity_profile(
        reflectivity: &CleanedField,
        window: (usize, usize),
    ) -> SiftResult<Self> {
        let z = orbit_window_dyn(&reflectivity.values, window.0, window.1)?;

        Ok(Self {
            title: reflectivity.name.clone(),
            x_label: "Orbit Bin (Arbitrary)".to_string(),
            y_label: "Range Bin".to_string(),
            colorbar_label: reflectivity.units.clone(),
            colormap: None,
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
            invert_y: true,
            z,
            x: None,
            y: None,
        })
    }

    /// Number of finite cells that will actually be contoured
    pub fn finite_cells(&self) -> usize {
        self.z.iter().filter(|v| v.is_finite()).count()
    }
}
