use ndarray::{Array1, ArrayD};

use crate::io::attributes::FieldAttributes;
use crate::types::SiftResult;

/// Narrow read interface over an HDF granule.
///
/// `read_named_array` returns a scientific dataset with its attributes;
/// `read_tabular_field` returns a 1-D record such as the CloudSat
/// geolocation tables.
pub trait HdfSource {
    fn read_named_array(&self, name: &str) -> SiftResult<(ArrayD<f64>, FieldAttributes)>;

    fn read_tabular_field(&self, record: &str) -> SiftResult<Array1<f64>>;
}

/// One entry of a container's SUBDATASETS listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdataset {
    /// Connection string GDAL opens the subdataset with
    pub name: String,
    pub description: String,
}

impl Subdataset {
    /// Whether this subdataset holds the field `field`.
    ///
    /// HDF-EOS names end in `:<field>`; plain SDS names only carry an index,
    /// so the description (`[2030x1354] Cloud_Top_Height mod06 ...`) is
    /// searched as well.
    pub fn holds(&self, field: &str) -> bool {
        self.name.rsplit(':').next() == Some(field)
            || self.description.split_whitespace().any(|token| token == field)
    }

    /// HDF-EOS swath geolocation field
    pub fn is_geolocation(&self) -> bool {
        self.name.contains("EOS_SWATH_GEOL")
    }
}

/// Pair up `SUBDATASET_<n>_NAME` / `SUBDATASET_<n>_DESC` metadata entries,
/// ordered by `n`.
pub fn parse_subdatasets<S: AsRef<str>>(entries: &[S]) -> Vec<Subdataset> {
    let mut indexed: Vec<(usize, Subdataset)> = Vec::new();

    for entry in entries {
        let Some((key, value)) = entry.as_ref().split_once('=') else {
            continue;
        };
        let Some(rest) = key.strip_prefix("SUBDATASET_") else {
            continue;
        };
        let Some((index, kind)) = rest.split_once('_') else {
            continue;
        };
        let Ok(index) = index.parse::<usize>() else {
            continue;
        };

        let slot = match indexed.iter().position(|(i, _)| *i == index) {
            Some(pos) => pos,
            None => {
                indexed.push((
                    index,
                    Subdataset {
                        name: String::new(),
                        description: String::new(),
                    },
                ));
                indexed.len() - 1
            }
        };
        match kind {
            "NAME" => indexed[slot].1.name = value.to_string(),
            "DESC" => indexed[slot].1.description = value.to_string(),
            _ => {}
        }
    }

    indexed.sort_by_key(|(i, _)| *i);
    indexed
        .into_iter()
        .map(|(_, sub)| sub)
        .filter(|sub| !sub.name.is_empty())
        .collect()
}

/// Find the subdataset holding `field`, preferring geolocation entries when
/// `geolocation` is set and data entries otherwise.
pub fn find_subdataset<'a>(
    subdatasets: &'a [Subdataset],
    field: &str,
    geolocation: bool,
) -> Option<&'a Subdataset> {
    let mut matches = subdatasets.iter().filter(|sub| sub.holds(field));
    let first = matches.next()?;
    if first.is_geolocation() == geolocation {
        return Some(first);
    }
    matches
        .find(|sub| sub.is_geolocation() == geolocation)
        .or(Some(first))
}

#[cfg(feature = "hdf")]
pub use gdal_backend::HdfFile;

#[cfg(feature = "hdf")]
mod gdal_backend {
    use std::path::{Path, PathBuf};

    use gdal::{Dataset, Metadata};
    use ndarray::{Array1, ArrayD, IxDyn};

    use super::{find_subdataset, parse_subdatasets, HdfSource, Subdataset};
    use crate::io::attributes::FieldAttributes;
    use crate::types::{SiftError, SiftResult};

    /// GDAL-backed HDF4 / HDF-EOS granule.
    ///
    /// The container stays open for the lifetime of the value and is closed
    /// on drop; each subdataset is opened and closed within a single read.
    pub struct HdfFile {
        path: PathBuf,
        // Held so the container stays open while subdatasets are read
        _container: Dataset,
        subdatasets: Vec<Subdataset>,
    }

    impl HdfFile {
        pub fn open<P: AsRef<Path>>(path: P) -> SiftResult<Self> {
            let path = path.as_ref();
            log::info!("Opening HDF granule: {}", path.display());

            let container = Dataset::open(path)?;
            let entries = container.metadata_domain("SUBDATASETS").unwrap_or_default();
            let subdatasets = parse_subdatasets(&entries);

            log::debug!("Found {} subdatasets in {}", subdatasets.len(), path.display());

            Ok(Self {
                path: path.to_path_buf(),
                _container: container,
                subdatasets,
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        pub fn subdatasets(&self) -> &[Subdataset] {
            &self.subdatasets
        }

        fn locate(&self, field: &str, geolocation: bool) -> SiftResult<&Subdataset> {
            find_subdataset(&self.subdatasets, field, geolocation).ok_or_else(|| {
                SiftError::MissingField(format!("{} in {}", field, self.path.display()))
            })
        }

        fn read_subdataset(&self, sub: &Subdataset) -> SiftResult<(ArrayD<f64>, FieldAttributes)> {
            log::debug!("Reading subdataset {}", sub.name);

            let dataset = Dataset::open(Path::new(&sub.name))?;
            let (width, height) = dataset.raster_size();
            let band = dataset.rasterband(1)?;
            let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

            let shape = if height == 1 { vec![width] } else { vec![height, width] };
            let values = ArrayD::from_shape_vec(IxDyn(&shape), buffer.data).map_err(|e| {
                SiftError::Processing(format!("Failed to reshape {}: {}", sub.name, e))
            })?;

            let mut entries = dataset.metadata_domain("").unwrap_or_default();
            entries.extend(band.metadata_domain("").unwrap_or_default());
            let mut attributes = FieldAttributes::from_metadata(&entries)?;
            if attributes.fill_value.is_none() {
                attributes.fill_value = band.no_data_value();
            }

            log::debug!("Read {:?} values with {} attributes", values.shape(), attributes.raw.len());
            Ok((values, attributes))
        }
    }

    impl HdfSource for HdfFile {
        fn read_named_array(&self, name: &str) -> SiftResult<(ArrayD<f64>, FieldAttributes)> {
            let sub = self.locate(name, false)?;
            self.read_subdataset(sub)
        }

        fn read_tabular_field(&self, record: &str) -> SiftResult<Array1<f64>> {
            let sub = self.locate(record, true)?;
            let (values, _) = self.read_subdataset(sub)?;
            Ok(values.iter().copied().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<String> {
        vec![
            "SUBDATASET_2_NAME=HDF4_EOS:EOS_SWATH:\"cs.hdf\":2B-GEOPROF:Radar_Reflectivity".to_string(),
            "SUBDATASET_2_DESC=[37082x125] Radar_Reflectivity 2B-GEOPROF (16-bit integer)".to_string(),
            "SUBDATASET_1_NAME=HDF4_EOS:EOS_SWATH:\"cs.hdf\":2B-GEOPROF:Height".to_string(),
            "SUBDATASET_1_DESC=[37082x125] Height 2B-GEOPROF (16-bit integer)".to_string(),
            "SUBDATASET_3_NAME=HDF4_EOS:EOS_SWATH_GEOL:\"cs.hdf\":2B-GEOPROF:Latitude".to_string(),
            "SUBDATASET_3_DESC=[37082] Latitude 2B-GEOPROF (32-bit floating-point)".to_string(),
            "SUBDATASET_4_NAME=HDF4_SDS:UNKNOWN:\"cs.hdf\":7".to_string(),
            "SUBDATASET_4_DESC=[37082] Latitude (32-bit floating-point)".to_string(),
        ]
    }

    #[test]
    fn test_parse_subdatasets_orders_by_index() {
        let subs = parse_subdatasets(&listing());

        assert_eq!(subs.len(), 4);
        assert!(subs[0].name.ends_with(":Height"));
        assert!(subs[1].description.contains("Radar_Reflectivity"));
    }

    #[test]
    fn test_find_by_eos_name_and_sds_description() {
        let subs = parse_subdatasets(&listing());

        let height = find_subdataset(&subs, "Height", false).unwrap();
        assert!(height.name.ends_with(":Height"));

        // "Height" must not match inside other tokens
        assert!(find_subdataset(&subs, "Heig", false).is_none());
    }

    #[test]
    fn test_geolocation_preference() {
        let subs = parse_subdatasets(&listing());

        let geol = find_subdataset(&subs, "Latitude", true).unwrap();
        assert!(geol.is_geolocation());

        let data = find_subdataset(&subs, "Latitude", false).unwrap();
        assert!(data.name.starts_with("HDF4_SDS"));
    }
}
