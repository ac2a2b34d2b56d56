//! OGR vector data
//!
//! ## Reading
//!
//! ```rust,no_run
//! use ogr_subset::Dataset;
//!
//! let dataset = Dataset::open("fixtures/basins.geojson").unwrap();
//! let mut layer = dataset.layer(0).unwrap();
//! for feature in layer.features() {
//!     let name = feature.field("NAME").unwrap();
//!     let geometry = feature.geometry();
//!     println!("{:?} {:?}", name, geometry.map(|g| g.wkt()));
//! }
//! ```

pub use defn::{field_type_to_name, Defn, Field, FieldIterator};
pub use feature::{Feature, FieldValue};
pub use gdal_sys::{OGRFieldType, OGRwkbGeometryType};
pub use geometry::{
    geometry_type_accepts, geometry_type_flatten, geometry_type_to_name, Geometry,
};
pub use layer::{FeatureIterator, Layer, LayerOptions};

mod defn;
mod feature;
mod gdal_to_geo;
mod geometry;
mod layer;

#[cfg(test)]
mod tests;
