#![crate_name = "ogr_subset"]
#![crate_type = "lib"]

//! Attribute-filtered subsets of vector datasets, on top of [GDAL/OGR](http://gdal.org/).
//!
//! The [`subset`] module holds the exporter: it reads one layer, keeps the
//! features whose attribute equals a value and writes them to a new dataset
//! with a given spatial reference and geometry type. The remaining modules
//! are the safe GDAL wrappers it is built on.
//!
//! ## Use
//!
//! ```rust,no_run
//! use ogr_subset::subset::{export_subset, SrsDefinition};
//! use ogr_subset::vector::OGRwkbGeometryType;
//!
//! let written = export_subset(
//!     "fixtures/basins.geojson",
//!     "HYBAS_ID",
//!     "10",
//!     "/tmp/basin_10.shp",
//!     SrsDefinition::Epsg(4326),
//!     OGRwkbGeometryType::wkbPolygon,
//! )
//! .unwrap();
//! assert_eq!(written, 2);
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade. During an export, warnings and
//! errors raised inside GDAL are forwarded as well, under the
//! [`config::GDAL_LOG_TARGET`] target.
//!
//! ## Build
//!
//! The `bundled` feature builds a minimal GDAL from source with the
//! `gdal-src` crate instead of linking the system library.

pub use dataset::Dataset;
pub use driver::Driver;
pub use options::{DatasetOptions, GdalOpenFlags};

pub mod config;
pub mod cpl;
mod dataset;
mod driver;
pub mod errors;
mod options;
pub mod spatial_ref;
pub mod subset;
mod utils;
pub mod vector;
pub mod vsi;

#[cfg(test)]
mod test_utils;
