//! Attribute-filtered export of vector features
//!
//! [`export_subset`] covers the common case: take the first layer of a
//! dataset, keep the features whose attribute equals a value and write their
//! geometries to a new dataset. [`SubsetExporter`] takes a full
//! [`SubsetRequest`] for control over layer choice, copied fields, null
//! geometries and driver options.
//!
//! Geometries are copied as they are. The output spatial reference is only
//! assigned to the new layer, coordinates are never transformed.
//!
//! ```rust,no_run
//! use ogr_subset::subset::*;
//! use ogr_subset::vector::OGRwkbGeometryType;
//!
//! let mut output = OutputSpec::new(
//!     "/data/out/basin_10.gpkg",
//!     SrsDefinition::Source,
//!     OGRwkbGeometryType::wkbPolygon,
//! );
//! output.fields = FieldSelection::Only(vec!["PFAF_ID".to_string()]);
//!
//! let mut request = SubsetRequest::new(
//!     "/data/hybas_lev05.shp",
//!     AttributeFilter::equals("HYBAS_ID", "10"),
//!     output,
//! );
//! request.options.push_down_filter = true;
//!
//! let report = SubsetExporter::new(request).run()?;
//! println!("{} of {} features written", report.written, report.scanned);
//! # Ok::<(), ExportError>(())
//! ```

mod error;
mod exporter;
mod filter;
mod request;

pub use error::{ExportError, GeometryCopyError, SchemaError};
pub use exporter::{export_subset, ExportReport, SubsetExporter};
pub use filter::{AttributeFilter, CompiledFilter, FilterValue};
pub use request::{
    ExportOptions, FieldSelection, LayerSelector, NullGeometryPolicy, OutputSpec, SrsDefinition,
    SubsetRequest,
};
