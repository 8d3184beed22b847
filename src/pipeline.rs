//! Linear read-clean-plot run over one MODIS and one CloudSat granule

use std::path::PathBuf;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::core::{CleanedField, ContourPlot, MaskRule, DEFAULT_ORBIT_WINDOW};
use crate::io::HdfSource;
use crate::products::{coordinate_storage, field_spec, CoordinateStorage};
use crate::types::{Instrument, SiftError, SiftResult};

/// Inputs and knobs for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub modis_path: PathBuf,
    pub cloudsat_path: PathBuf,
    pub mask_rule: MaskRule,
    /// Orbit bins shown in the reflectivity profile (start, end)
    pub orbit_window: (usize, usize),
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            modis_path: PathBuf::from("Data/aqua-modis_ctpres_20151225_0140.hdf"),
            cloudsat_path: PathBuf::from("Data/cloudsat_radar_20151225.hdf"),
            mask_rule: MaskRule::default(),
            orbit_window: DEFAULT_ORBIT_WINDOW,
        }
    }
}

/// Cleaned MODIS swath with its 2-D geolocation
#[derive(Debug, Clone)]
pub struct ModisSwath {
    pub latitude: ArrayD<f64>,
    pub longitude: ArrayD<f64>,
    pub cloud_top_height: CleanedField,
}

/// Cleaned CloudSat profile with its along-track geolocation
#[derive(Debug, Clone)]
pub struct CloudSatProfile {
    pub latitude: ArrayD<f64>,
    pub longitude: ArrayD<f64>,
    pub height: CleanedField,
    pub reflectivity: CleanedField,
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct Scene {
    pub modis: ModisSwath,
    pub cloudsat: CloudSatProfile,
}

impl Scene {
    pub fn cloud_top_plot(&self) -> SiftResult<ContourPlot> {
        ContourPlot::cloud_top_map(
            &self.modis.longitude,
            &self.modis.latitude,
            &self.modis.cloud_top_height,
        )
    }

    pub fn reflectivity_plot(&self, window: (usize, usize)) -> SiftResult<ContourPlot> {
        ContourPlot::reflectivity_profile(&self.cloudsat.reflectivity, window)
    }
}

fn read_coordinate<H: HdfSource + ?Sized>(
    source: &H,
    instrument: Instrument,
    name: &str,
) -> SiftResult<ArrayD<f64>> {
    match coordinate_storage(instrument) {
        CoordinateStorage::NamedArray => Ok(source.read_named_array(name)?.0),
        CoordinateStorage::TabularRecord => Ok(source.read_tabular_field(name)?.into_dyn()),
    }
}

/// Read one field through its table entry and clean it
fn read_field<H: HdfSource + ?Sized>(
    source: &H,
    instrument: Instrument,
    dataset: &str,
    rule: MaskRule,
) -> SiftResult<CleanedField> {
    field_spec(instrument, dataset)?.read(source)?.clean(rule)
}

/// Read and clean the MODIS cloud-top height swath
pub fn load_modis_swath<H: HdfSource + ?Sized>(source: &H, rule: MaskRule) -> SiftResult<ModisSwath> {
    let latitude = read_coordinate(source, Instrument::Modis, "Latitude")?;
    let longitude = read_coordinate(source, Instrument::Modis, "Longitude")?;
    let cloud_top_height = read_field(source, Instrument::Modis, "Cloud_Top_Height", rule)?;

    if latitude.shape() != longitude.shape() {
        return Err(SiftError::Processing(format!(
            "MODIS latitude {:?} and longitude {:?} differ in shape",
            latitude.shape(),
            longitude.shape()
        )));
    }

    Ok(ModisSwath {
        latitude,
        longitude,
        cloud_top_height,
    })
}

/// Read and clean the CloudSat height and reflectivity profiles
pub fn load_cloudsat_profile<H: HdfSource + ?Sized>(
    source: &H,
    rule: MaskRule,
) -> SiftResult<CloudSatProfile> {
    let latitude = read_coordinate(source, Instrument::CloudSat, "Latitude")?;
    let longitude = read_coordinate(source, Instrument::CloudSat, "Longitude")?;
    let height = read_field(source, Instrument::CloudSat, "Height", rule)?;
    let reflectivity = read_field(source, Instrument::CloudSat, "Radar_Reflectivity", rule)?;

    let profiles = reflectivity.values.shape().first().copied().unwrap_or(0);
    if latitude.len() != profiles {
        log::warn!(
            "CloudSat geolocation has {} entries for {} profiles",
            latitude.len(),
            profiles
        );
    }

    Ok(CloudSatProfile {
        latitude,
        longitude,
        height,
        reflectivity,
    })
}

/// Open both granules, clean every field once and release the files.
///
/// Each file is closed as soon as its fields are read, including when a
/// read fails.
#[cfg(feature = "hdf")]
pub fn load_scene(config: &SceneConfig) -> SiftResult<Scene> {
    use crate::io::HdfFile;

    log::info!("🛰️  Loading MODIS granule");
    let modis = {
        let file = HdfFile::open(&config.modis_path)?;
        load_modis_swath(&file, config.mask_rule)?
    };

    log::info!("📡 Loading CloudSat granule");
    let cloudsat = {
        let file = HdfFile::open(&config.cloudsat_path)?;
        load_cloudsat_profile(&file, config.mask_rule)?
    };

    log::info!("✅ Scene loaded");
    Ok(Scene { modis, cloudsat })
}

/// Load the scene and build both diagnostic plots
#[cfg(feature = "hdf")]
pub fn run(config: &SceneConfig) -> SiftResult<(Scene, ContourPlot, ContourPlot)> {
    let scene = load_scene(config)?;
    let cloud_top = scene.cloud_top_plot()?;
    let reflectivity = scene.reflectivity_plot(config.orbit_window)?;
    Ok((scene, cloud_top, reflectivity))
}
