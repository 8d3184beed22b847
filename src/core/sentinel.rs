use ndarray::{Array, ArrayBase, Data, Dimension};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::{GeophysicalField, PhysicalArray, SiftError, SiftResult, Validity};

/// Arrays at least this large are cleaned with rayon when `parallel` is on
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Which invalidity conditions drive masking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaskRule {
    /// Below range, above range, or equal to the fill value
    #[default]
    RangeAndFill,
    /// Range bounds only; an in-range fill value survives.
    /// Matches output produced by the legacy notebooks.
    RangeOnly,
}

/// Why a raw element was replaced with NaN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Fill,
    BelowRange,
    AboveRange,
}

/// Per-field counts and statistics gathered while cleaning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub total: usize,
    pub fill: usize,
    pub below_range: usize,
    pub above_range: usize,
    /// Raw elements that were already NaN or not representable as f64
    pub non_finite: usize,
    pub retained: usize,
    pub valid_percentage: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl CleaningSummary {
    pub fn masked(&self) -> usize {
        self.fill + self.below_range + self.above_range + self.non_finite
    }
}

/// Sentinel-to-missing-value cleaner for a single field.
///
/// Every element below the valid range, above it, or equal to the fill value
/// becomes NaN; everything else is divided by the scale factor. Works on
/// arrays of any dimensionality and any primitive numeric element type.
#[derive(Debug, Clone)]
pub struct SentinelCleaner {
    validity: Validity,
    rule: MaskRule,
}

impl SentinelCleaner {
    /// Create a cleaner, rejecting malformed validity descriptors up front
    pub fn new(validity: Validity) -> SiftResult<Self> {
        validity.validate()?;
        Ok(Self {
            validity,
            rule: MaskRule::default(),
        })
    }

    pub fn with_rule(mut self, rule: MaskRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn rule(&self) -> MaskRule {
        self.rule
    }

    /// Classify one raw value; `None` means it is kept
    pub fn classify(&self, value: f64) -> Option<Rejection> {
        let range = &self.validity.valid_range;
        if self.rule == MaskRule::RangeAndFill && value == self.validity.fill_value {
            Some(Rejection::Fill)
        } else if value < range.min {
            Some(Rejection::BelowRange)
        } else if value > range.max {
            Some(Rejection::AboveRange)
        } else {
            None
        }
    }

    fn clean_value<T: ToPrimitive>(&self, raw: &T) -> f64 {
        match raw.to_f64() {
            Some(value) if self.classify(value).is_none() => self.validity.to_physical(value),
            _ => f64::NAN,
        }
    }

    /// Clean `raw`, returning a float array of identical shape
    pub fn clean<S, D, T>(&self, raw: &ArrayBase<S, D>) -> SiftResult<Array<f64, D>>
    where
        S: Data<Elem = T>,
        D: Dimension,
        T: ToPrimitive + Send + Sync,
    {
        if raw.is_empty() {
            return Err(SiftError::InvalidArgument(
                "cannot clean an empty array".to_string(),
            ));
        }

        log::debug!(
            "Cleaning {} elements with shape {:?} (fill {}, range [{}, {}], scale {}, offset {}, rule {:?})",
            raw.len(),
            raw.shape(),
            self.validity.fill_value,
            self.validity.valid_range.min,
            self.validity.valid_range.max,
            self.validity.scale_factor,
            self.validity.add_offset,
            self.rule
        );

        #[cfg(feature = "parallel")]
        {
            if raw.len() >= PARALLEL_THRESHOLD {
                let mut cleaned = Array::<f64, D>::zeros(raw.raw_dim());
                ndarray::Zip::from(&mut cleaned)
                    .and(raw)
                    .par_for_each(|out, value| *out = self.clean_value(value));
                return Ok(cleaned);
            }
        }

        Ok(raw.map(|value| self.clean_value(value)))
    }

    /// Clean `raw` and collect masking counts and statistics of the kept values
    pub fn clean_with_summary<S, D, T>(
        &self,
        raw: &ArrayBase<S, D>,
    ) -> SiftResult<(Array<f64, D>, CleaningSummary)>
    where
        S: Data<Elem = T>,
        D: Dimension,
        T: ToPrimitive + Send + Sync,
    {
        let cleaned = self.clean(raw)?;

        let mut summary = CleaningSummary {
            total: raw.len(),
            ..Default::default()
        };
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for (raw_value, &clean_value) in raw.iter().zip(cleaned.iter()) {
            let value = raw_value.to_f64().unwrap_or(f64::NAN);
            match self.classify(value) {
                Some(Rejection::Fill) => summary.fill += 1,
                Some(Rejection::BelowRange) => summary.below_range += 1,
                Some(Rejection::AboveRange) => summary.above_range += 1,
                None if !clean_value.is_finite() => summary.non_finite += 1,
                None => {
                    summary.retained += 1;
                    sum += clean_value;
                    min = min.min(clean_value);
                    max = max.max(clean_value);
                }
            }
        }

        if summary.retained > 0 {
            summary.min = Some(min);
            summary.max = Some(max);
            summary.mean = Some(sum / summary.retained as f64);
        }
        summary.valid_percentage = 100.0 * summary.retained as f64 / summary.total as f64;

        log::info!(
            "Kept {} of {} values ({:.1}%): {} fill, {} below range, {} above range",
            summary.retained,
            summary.total,
            summary.valid_percentage,
            summary.fill,
            summary.below_range,
            summary.above_range
        );

        Ok((cleaned, summary))
    }
}

/// A field after sentinel cleaning, ready for plotting
#[derive(Debug, Clone)]
pub struct CleanedField {
    pub name: String,
    pub units: String,
    pub values: PhysicalArray,
    pub summary: CleaningSummary,
}

impl GeophysicalField {
    /// Clean this field's raw values once, keeping its labels
    pub fn clean(&self, rule: MaskRule) -> SiftResult<CleanedField> {
        log::debug!("Cleaning field '{}' ({})", self.name, self.units);
        let cleaner = SentinelCleaner::new(self.validity)?.with_rule(rule);
        let (values, summary) = cleaner.clean_with_summary(&self.raw_values)?;
        Ok(CleanedField {
            name: self.name.clone(),
            units: self.units.clone(),
            values,
            summary,
        })
    }
}

/// Clean `raw` against `validity` using the default three-way mask rule
pub fn clean<S, D, T>(raw: &ArrayBase<S, D>, validity: &Validity) -> SiftResult<Array<f64, D>>
where
    S: Data<Elem = T>,
    D: Dimension,
    T: ToPrimitive + Send + Sync,
{
    SentinelCleaner::new(*validity)?.clean(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn test_fill_and_range_masking() {
        let raw = array![100i16, -9999, 25000, 200];
        let validity = Validity::new(-9999.0, (-5000.0, 30000.0));

        let cleaned = clean(&raw, &validity).unwrap();

        assert_eq!(cleaned[0], 100.0);
        assert!(cleaned[1].is_nan());
        assert_eq!(cleaned[2], 25000.0);
        assert_eq!(cleaned[3], 200.0);
    }

    #[test]
    fn test_in_range_fill_value_depends_on_rule() {
        // Fill value placed inside the valid range so the two rules disagree
        let raw = array![0i32, 5, 10];
        let validity = Validity::new(5.0, (0.0, 10.0));

        let strict = SentinelCleaner::new(validity).unwrap();
        let legacy = SentinelCleaner::new(validity)
            .unwrap()
            .with_rule(MaskRule::RangeOnly);

        assert!(strict.clean(&raw).unwrap()[1].is_nan());
        assert_eq!(legacy.clean(&raw).unwrap()[1], 5.0);
    }

    #[test]
    fn test_shape_preserved_for_3d_input() {
        let raw = Array3::<f32>::from_shape_fn((4, 3, 2), |(i, j, k)| (i * 6 + j * 2 + k) as f32);
        let validity = Validity::new(-1.0, (0.0, 20.0));

        let cleaned = clean(&raw, &validity).unwrap();

        assert_eq!(cleaned.dim(), (4, 3, 2));
        assert!(cleaned[[3, 2, 1]].is_nan()); // 23 > 20
        assert_eq!(cleaned[[3, 1, 0]], 20.0);
    }

    #[test]
    fn test_nan_input_stays_missing() {
        let raw = array![1.0f64, f64::NAN, f64::INFINITY];
        let validity = Validity::new(-999.0, (0.0, 10.0));

        let cleaned = clean(&raw, &validity).unwrap();

        assert_eq!(cleaned[0], 1.0);
        assert!(cleaned[1].is_nan());
        assert!(cleaned[2].is_nan());
    }

    #[test]
    fn test_summary_counts() {
        let raw = Array2::from_shape_vec((2, 3), vec![150i16, -8192, 600, -9000, 5001, 5000]).unwrap();
        let validity = Validity::new(-8192.0, (-4000.0, 5000.0)).with_scale_factor(100.0);
        let cleaner = SentinelCleaner::new(validity).unwrap();

        let (cleaned, summary) = cleaner.clean_with_summary(&raw).unwrap();

        assert_eq!(cleaned.dim(), (2, 3));
        assert_eq!(summary.total, 6);
        assert_eq!(summary.fill, 1);
        assert_eq!(summary.below_range, 1);
        assert_eq!(summary.above_range, 1);
        assert_eq!(summary.retained, 3);
        assert_eq!(summary.masked(), 3);
        assert_eq!(summary.min, Some(1.5));
        assert_eq!(summary.max, Some(50.0));
        assert!((summary.valid_percentage - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_rejected() {
        let raw = Array2::<i16>::zeros((0, 5));
        let validity = Validity::new(-9999.0, (-5000.0, 30000.0));

        assert!(matches!(clean(&raw, &validity), Err(SiftError::InvalidArgument(_))));
    }
}
