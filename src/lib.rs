//! cloudsift: sentinel cleaning for MODIS cloud-top height and CloudSat radar
//! reflectivity granules.
//!
//! Reads the two HDF granules through GDAL, replaces fill values and
//! out-of-range readings with NaN, rescales to physical units and prepares
//! the cloud-top map and reflectivity profile plots.

pub mod types;
pub mod io;
pub mod core;
pub mod products;
pub mod pipeline;

// Re-export main types and functions for easier access
pub use types::{
    GeophysicalField, Instrument, SiftError, SiftResult, ValidRange, Validity
};

pub use crate::core::{clean, CleanedField, CleaningSummary, ContourPlot, MaskRule, SentinelCleaner};
pub use io::{FieldAttributes, HdfSource};
pub use pipeline::{CloudSatProfile, ModisSwath, Scene, SceneConfig};

#[cfg(feature = "hdf")]
pub use io::HdfFile;
#[cfg(feature = "hdf")]
pub use pipeline::{load_scene, run};

#[cfg(feature = "python")]
mod python {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use numpy::{IntoPyArray, PyArray2, PyArrayDyn, PyReadonlyArrayDyn};
    use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
    use pyo3::prelude::*;

    use crate::core::DEFAULT_ORBIT_WINDOW;
    use crate::{
        CleaningSummary, ContourPlot, MaskRule, Scene, SceneConfig, SentinelCleaner, SiftError,
        Validity,
    };

    fn to_py_err(err: SiftError) -> PyErr {
        match err {
            SiftError::InvalidArgument(_) => PyValueError::new_err(err.to_string()),
            SiftError::IoFailure(_) | SiftError::MissingField(_) => {
                PyIOError::new_err(err.to_string())
            }
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }

    fn mask_rule(range_only: bool) -> MaskRule {
        if range_only {
            MaskRule::RangeOnly
        } else {
            MaskRule::RangeAndFill
        }
    }

    fn summary_dict(summary: &CleaningSummary) -> HashMap<&'static str, f64> {
        let mut dict = HashMap::new();
        dict.insert("total", summary.total as f64);
        dict.insert("fill", summary.fill as f64);
        dict.insert("below_range", summary.below_range as f64);
        dict.insert("above_range", summary.above_range as f64);
        dict.insert("retained", summary.retained as f64);
        dict.insert("valid_percentage", summary.valid_percentage);
        dict.insert("min", summary.min.unwrap_or(f64::NAN));
        dict.insert("max", summary.max.unwrap_or(f64::NAN));
        dict.insert("mean", summary.mean.unwrap_or(f64::NAN));
        dict
    }

    /// Replace fill and out-of-range values with NaN and divide the rest by
    /// `scale_factor`
    #[pyfunction]
    #[pyo3(signature = (raw, fill_value, valid_range, scale_factor=1.0, range_only=false))]
    fn clean<'py>(
        py: Python<'py>,
        raw: PyReadonlyArrayDyn<'py, f64>,
        fill_value: f64,
        valid_range: (f64, f64),
        scale_factor: f64,
        range_only: bool,
    ) -> PyResult<&'py PyArrayDyn<f64>> {
        let validity = Validity::new(fill_value, valid_range).with_scale_factor(scale_factor);
        let cleaned = SentinelCleaner::new(validity)
            .and_then(|cleaner| cleaner.with_rule(mask_rule(range_only)).clean(&raw.as_array()))
            .map_err(to_py_err)?;
        Ok(cleaned.into_pyarray(py))
    }

    /// Read both granules and clean every field
    #[pyfunction]
    #[pyo3(signature = (modis_path=None, cloudsat_path=None, range_only=false))]
    fn load_scene(
        modis_path: Option<String>,
        cloudsat_path: Option<String>,
        range_only: bool,
    ) -> PyResult<PyScene> {
        let mut config = SceneConfig::default();
        if let Some(path) = modis_path {
            config.modis_path = PathBuf::from(path);
        }
        if let Some(path) = cloudsat_path {
            config.cloudsat_path = PathBuf::from(path);
        }
        config.mask_rule = mask_rule(range_only);

        let scene = crate::pipeline::load_scene(&config).map_err(to_py_err)?;
        Ok(PyScene { inner: scene })
    }

    /// Python wrapper for Scene
    #[pyclass(name = "Scene")]
    struct PyScene {
        inner: Scene,
    }

    #[pymethods]
    impl PyScene {
        #[getter]
        fn cloud_top_height<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
            self.inner.modis.cloud_top_height.values.clone().into_pyarray(py)
        }

        #[getter]
        fn modis_latitude<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
            self.inner.modis.latitude.clone().into_pyarray(py)
        }

        #[getter]
        fn modis_longitude<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
            self.inner.modis.longitude.clone().into_pyarray(py)
        }

        #[getter]
        fn cloudsat_height<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
            self.inner.cloudsat.height.values.clone().into_pyarray(py)
        }

        #[getter]
        fn reflectivity<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
            self.inner.cloudsat.reflectivity.values.clone().into_pyarray(py)
        }

        #[getter]
        fn cloudsat_latitude<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
            self.inner.cloudsat.latitude.clone().into_pyarray(py)
        }

        #[getter]
        fn cloudsat_longitude<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
            self.inner.cloudsat.longitude.clone().into_pyarray(py)
        }

        fn summaries(&self) -> HashMap<String, HashMap<&'static str, f64>> {
            let mut all = HashMap::new();
            all.insert(
                "cloud_top_height".to_string(),
                summary_dict(&self.inner.modis.cloud_top_height.summary),
            );
            all.insert(
                "height".to_string(),
                summary_dict(&self.inner.cloudsat.height.summary),
            );
            all.insert(
                "reflectivity".to_string(),
                summary_dict(&self.inner.cloudsat.reflectivity.summary),
            );
            all
        }

        fn cloud_top_plot(&self) -> PyResult<PyContourPlot> {
            let plot = self.inner.cloud_top_plot().map_err(to_py_err)?;
            Ok(PyContourPlot { inner: plot })
        }

        #[pyo3(signature = (start=DEFAULT_ORBIT_WINDOW.0, end=DEFAULT_ORBIT_WINDOW.1))]
        fn reflectivity_plot(&self, start: usize, end: usize) -> PyResult<PyContourPlot> {
            let plot = self.inner.reflectivity_plot((start, end)).map_err(to_py_err)?;
            Ok(PyContourPlot { inner: plot })
        }
    }

    /// Python wrapper for ContourPlot
    #[pyclass(name = "ContourPlot")]
    struct PyContourPlot {
        inner: ContourPlot,
    }

    #[pymethods]
    impl PyContourPlot {
        #[getter]
        fn title(&self) -> String {
            self.inner.title.clone()
        }

        #[getter]
        fn x_label(&self) -> String {
            self.inner.x_label.clone()
        }

        #[getter]
        fn y_label(&self) -> String {
            self.inner.y_label.clone()
        }

        #[getter]
        fn colorbar_label(&self) -> String {
            self.inner.colorbar_label.clone()
        }

        #[getter]
        fn colormap(&self) -> Option<String> {
            self.inner.colormap.clone()
        }

        #[getter]
        fn x_ticks(&self) -> Vec<f64> {
            self.inner.x_ticks.clone()
        }

        #[getter]
        fn y_ticks(&self) -> Vec<f64> {
            self.inner.y_ticks.clone()
        }

        #[getter]
        fn invert_y(&self) -> bool {
            self.inner.invert_y
        }

        #[getter]
        fn z<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
            self.inner.z.clone().into_pyarray(py)
        }

        #[getter]
        fn x<'py>(&self, py: Python<'py>) -> Option<&'py PyArray2<f64>> {
            self.inner.x.clone().map(|x| x.into_pyarray(py))
        }

        #[getter]
        fn y<'py>(&self, py: Python<'py>) -> Option<&'py PyArray2<f64>> {
            self.inner.y.clone().map(|y| y.into_pyarray(py))
        }

        fn __repr__(&self) -> String {
            format!(
                "ContourPlot(title='{}', shape={:?}, finite={})",
                self.inner.title,
                self.inner.z.dim(),
                self.inner.finite_cells()
            )
        }
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(clean, m)?)?;
        m.add_function(wrap_pyfunction!(load_scene, m)?)?;
        m.add_class::<PyScene>()?;
        m.add_class::<PyContourPlot>()?;
        Ok(())
    }
}
