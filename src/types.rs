use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Cleaned physical values; NaN marks missing data
pub type Physical = f64;

/// N-dimensional cleaned field (1-D path data, 2-D swath/profile data)
pub type PhysicalArray = ArrayD<Physical>;

/// Satellite instrument a field comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    /// Aqua MODIS cloud-top properties swath
    Modis,
    /// CloudSat 2B-GEOPROF radar profile
    CloudSat,
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instrument::Modis => write!(f, "MODIS"),
            Instrument::CloudSat => write!(f, "CloudSat"),
        }
    }
}

/// Inclusive bounds of physically meaningful raw readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive containment test
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Range re-expressed in post-scale units.
    ///
    /// Bounds are swapped for a negative scale factor so that `min <= max`
    /// still holds.
    pub fn scaled(&self, scale_factor: f64) -> Self {
        let a = self.min / scale_factor;
        let b = self.max / scale_factor;
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

impl From<(f64, f64)> for ValidRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

/// How a raw field marks bad data and how it maps to physical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Validity {
    /// Sentinel meaning "sensor reported no data"
    pub fill_value: f64,
    pub valid_range: ValidRange,
    /// Divisor recovering physical units (1 when already physical)
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Subtracted from a kept raw reading before the scale factor is applied
    #[serde(default)]
    pub add_offset: f64,
}

fn default_scale_factor() -> f64 {
    1.0
}

impl Validity {
    pub fn new(fill_value: f64, valid_range: impl Into<ValidRange>) -> Self {
        Self {
            fill_value,
            valid_range: valid_range.into(),
            scale_factor: default_scale_factor(),
            add_offset: 0.0,
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_add_offset(mut self, add_offset: f64) -> Self {
        self.add_offset = add_offset;
        self
    }

    /// Physical value of a raw reading that passed masking
    pub fn to_physical(&self, raw: f64) -> f64 {
        (raw - self.add_offset) / self.scale_factor
    }

    /// Check the descriptor before any element is touched
    pub fn validate(&self) -> SiftResult<()> {
        let range = &self.valid_range;
        if !range.min.is_finite() || !range.max.is_finite() {
            return Err(SiftError::InvalidArgument(format!(
                "valid range bounds must be finite, got [{}, {}]",
                range.min, range.max
            )));
        }
        if range.min > range.max {
            return Err(SiftError::InvalidArgument(format!(
                "valid range is inverted: min {} > max {}",
                range.min, range.max
            )));
        }
        if self.scale_factor == 0.0 || !self.scale_factor.is_finite() {
            return Err(SiftError::InvalidArgument(format!(
                "scale factor must be finite and nonzero, got {}",
                self.scale_factor
            )));
        }
        if !self.add_offset.is_finite() {
            return Err(SiftError::InvalidArgument(format!(
                "add offset must be finite, got {}",
                self.add_offset
            )));
        }
        Ok(())
    }
}

/// A raw geophysical variable together with its validity description.
///
/// Built once per run from a freshly read array, cleaned once, then handed to
/// a single plot description.
#[derive(Debug, Clone)]
pub struct GeophysicalField {
    pub name: String,
    pub units: String,
    pub raw_values: ArrayD<f64>,
    pub validity: Validity,
}

/// Error types for field reading and cleaning
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[cfg(feature = "hdf")]
    #[error("I/O failure: {0}")]
    IoFailure(#[from] gdal::errors::GdalError),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for cloudsift operations
pub type SiftResult<T> = Result<T, SiftError>;
