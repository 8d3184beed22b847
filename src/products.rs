//! Per-dataset field descriptions.
//!
//! CloudSat 2B-GEOPROF fill values and ranges live in HDF-EOS vgroup
//! attributes that GDAL does not surface, so they are taken from the product
//! documentation. MODIS publishes usable SDS attributes and reads them from
//! the file.

use crate::io::HdfSource;
use crate::types::{GeophysicalField, Instrument, SiftError, SiftResult, ValidRange, Validity};

/// Where a field's validity description comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValiditySource {
    /// `_FillValue`, `valid_range` and optional `scale_factor`/`add_offset` attributes
    FileAttributes,
    /// Values copied from the product documentation
    Documented(Validity),
}

/// How a coordinate is stored in a granule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateStorage {
    /// Scientific dataset with the same shape as the field
    NamedArray,
    /// 1-D record in the granule's tabular section
    TabularRecord,
}

/// Static description of one geophysical field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub instrument: Instrument,
    pub dataset: &'static str,
    /// Overrides the file's `long_name` when set
    pub long_name: Option<&'static str>,
    /// Overrides the file's `units` when set
    pub units: Option<&'static str>,
    pub validity: ValiditySource,
}

pub const MODIS_CLOUD_TOP_HEIGHT: FieldSpec = FieldSpec {
    instrument: Instrument::Modis,
    dataset: "Cloud_Top_Height",
    long_name: None,
    units: None,
    validity: ValiditySource::FileAttributes,
};

pub const CLOUDSAT_HEIGHT: FieldSpec = FieldSpec {
    instrument: Instrument::CloudSat,
    dataset: "Height",
    long_name: Some(
        "Height of range bin in Reflectivity/Cloud Mask above reference surface (~mean sea level).",
    ),
    units: Some("m"),
    validity: ValiditySource::Documented(Validity {
        fill_value: -9999.0,
        valid_range: ValidRange {
            min: -5000.0,
            max: 30000.0,
        },
        scale_factor: 1.0,
        add_offset: 0.0,
    }),
};

pub const CLOUDSAT_REFLECTIVITY: FieldSpec = FieldSpec {
    instrument: Instrument::CloudSat,
    dataset: "Radar_Reflectivity",
    long_name: Some("Radar Reflectivity Factor"),
    units: Some("dBZe"),
    validity: ValiditySource::Documented(Validity {
        fill_value: -8192.0,
        valid_range: ValidRange {
            min: -4000.0,
            max: 5000.0,
        },
        scale_factor: 100.0,
        add_offset: 0.0,
    }),
};

pub static FIELD_TABLE: [FieldSpec; 3] = [MODIS_CLOUD_TOP_HEIGHT, CLOUDSAT_HEIGHT, CLOUDSAT_REFLECTIVITY];

/// Coordinate storage per instrument
pub fn coordinate_storage(instrument: Instrument) -> CoordinateStorage {
    match instrument {
        Instrument::Modis => CoordinateStorage::NamedArray,
        Instrument::CloudSat => CoordinateStorage::TabularRecord,
    }
}

/// Look up a field by instrument and dataset name
pub fn lookup(instrument: Instrument, dataset: &str) -> Option<&'static FieldSpec> {
    FIELD_TABLE
        .iter()
        .find(|spec| spec.instrument == instrument && spec.dataset == dataset)
}

/// Like [`lookup`], failing with `MissingField` for fields outside the table
pub fn field_spec(instrument: Instrument, dataset: &str) -> SiftResult<&'static FieldSpec> {
    lookup(instrument, dataset).ok_or_else(|| {
        SiftError::MissingField(format!("no {} field description for {}", instrument, dataset))
    })
}

impl FieldSpec {
    /// Read the raw field from `source` and attach its validity description
    pub fn read<H: HdfSource + ?Sized>(&self, source: &H) -> SiftResult<GeophysicalField> {
        log::info!("Reading {} field {}", self.instrument, self.dataset);

        let (raw_values, attributes) = source.read_named_array(self.dataset)?;

        let validity = match self.validity {
            ValiditySource::FileAttributes => attributes.validity()?,
            ValiditySource::Documented(validity) => {
                if attributes.fill_value.is_some() {
                    log::debug!("Ignoring file attributes of {} in favour of documented values", self.dataset);
                }
                validity
            }
        };

        let name = self
            .long_name
            .map(str::to_string)
            .or_else(|| attributes.long_name.clone())
            .unwrap_or_else(|| self.dataset.to_string());
        let units = self
            .units
            .map(str::to_string)
            .or_else(|| attributes.units.clone())
            .unwrap_or_default();

        Ok(GeophysicalField {
            name,
            units,
            raw_values,
            validity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_validity_descriptors_are_well_formed() {
        for spec in FIELD_TABLE.iter() {
            if let ValiditySource::Documented(validity) = spec.validity {
                assert!(validity.validate().is_ok(), "{} has a bad descriptor", spec.dataset);
                assert!(!validity.valid_range.contains(validity.fill_value));
            }
        }
    }

    #[test]
    fn test_lookup() {
        let spec = lookup(Instrument::CloudSat, "Radar_Reflectivity").unwrap();
        assert_eq!(spec.units, Some("dBZe"));
        assert!(lookup(Instrument::Modis, "Radar_Reflectivity").is_none());
    }

    #[test]
    fn test_field_spec_unknown_dataset() {
        assert_eq!(field_spec(Instrument::Modis, "Cloud_Top_Height").unwrap(), &MODIS_CLOUD_TOP_HEIGHT);
        assert!(matches!(
            field_spec(Instrument::CloudSat, "Cloud_Top_Height"),
            Err(SiftError::MissingField(_))
        ));
    }

    #[test]
    fn test_coordinate_storage() {
        assert_eq!(coordinate_storage(Instrument::Modis), CoordinateStorage::NamedArray);
        assert_eq!(coordinate_storage(Instrument::CloudSat), CoordinateStorage::TabularRecord);
    }
}
