use std::collections::BTreeMap;

use crate::types::{SiftError, SiftResult, ValidRange, Validity};

/// Descriptive and validity attributes attached to an HDF dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAttributes {
    pub fill_value: Option<f64>,
    pub valid_range: Option<ValidRange>,
    /// Multiplier in the file's own convention: physical = scale_factor * (raw - add_offset)
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub long_name: Option<String>,
    pub units: Option<String>,
    /// Every attribute as it was reported, keyed by name
    pub raw: BTreeMap<String, String>,
}

impl FieldAttributes {
    /// Build from GDAL style `KEY=VALUE` metadata entries.
    ///
    /// Unknown keys are kept in `raw`; entries without `=` are ignored.
    pub fn from_metadata<I, S>(entries: I) -> SiftResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attributes = Self::default();

        for entry in entries {
            let Some((key, value)) = entry.as_ref().split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "_FillValue" => attributes.fill_value = Some(parse_scalar(key, value)?),
                "valid_range" => {
                    let bounds = parse_number_list(value)?;
                    if bounds.len() != 2 {
                        return Err(SiftError::Metadata(format!(
                            "valid_range needs two values, got '{}'",
                            value
                        )));
                    }
                    attributes.valid_range = Some(ValidRange::new(bounds[0], bounds[1]));
                }
                "scale_factor" => attributes.scale_factor = Some(parse_scalar(key, value)?),
                "add_offset" => attributes.add_offset = Some(parse_scalar(key, value)?),
                "long_name" => attributes.long_name = Some(value.to_string()),
                "units" => attributes.units = Some(value.to_string()),
                _ => {}
            }
            attributes.raw.insert(key.to_string(), value.to_string());
        }

        Ok(attributes)
    }

    /// Validity descriptor from the attributes.
    ///
    /// HDF attributes multiply (`scale_factor * (raw - add_offset)`) while
    /// `Validity` divides, so the file's scale factor is inverted. A missing
    /// scale factor means 1 and a missing offset means 0.
    pub fn validity(&self) -> SiftResult<Validity> {
        let fill_value = self
            .fill_value
            .ok_or_else(|| SiftError::Metadata("missing _FillValue attribute".to_string()))?;
        let valid_range = self
            .valid_range
            .ok_or_else(|| SiftError::Metadata("missing valid_range attribute".to_string()))?;

        let scale_factor = self.scale_factor.unwrap_or(1.0);
        if scale_factor == 0.0 || !scale_factor.is_finite() {
            return Err(SiftError::Metadata(format!(
                "scale_factor attribute must be finite and nonzero, got {}",
                scale_factor
            )));
        }

        Ok(Validity::new(fill_value, valid_range)
            .with_scale_factor(1.0 / scale_factor)
            .with_add_offset(self.add_offset.unwrap_or(0.0)))
    }
}

fn parse_scalar(key: &str, text: &str) -> SiftResult<f64> {
    match parse_number_list(text)?.as_slice() {
        [value] => Ok(*value),
        other => Err(SiftError::Metadata(format!(
            "{} should hold one value, got {}",
            key,
            other.len()
        ))),
    }
}

/// Parse "a, b", "a b" or "[a, b]" into numbers
pub fn parse_number_list(text: &str) -> SiftResult<Vec<f64>> {
    text.trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')'])
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|e| SiftError::Metadata(format!("bad number '{}': {}", token, e)))
        })
        .collect()
}
