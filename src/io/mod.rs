//! I/O modules for reading HDF granules and their attributes

pub mod attributes;
pub mod hdf;

pub use attributes::FieldAttributes;
pub use hdf::{find_subdataset, parse_subdatasets, HdfSource, Subdataset};

#[cfg(feature = "hdf")]
pub use hdf::HdfFile;
