use std::path::PathBuf;

use thiserror::Error;

use crate::errors::GdalError;
use crate::subset::FilterValue;

/// The source layer's schema does not support the requested export.
#[derive(Clone, Debug, Error)]
pub enum SchemaError {
    #[error("field '{field}' is not part of the layer schema")]
    MissingField { field: String },
    #[error("value {value} cannot be compared with {field_type} field '{field}'")]
    TypeMismatch {
        field: String,
        field_type: String,
        value: FilterValue,
    },
    #[error("field '{field}' has type {field_type}, which is not supported")]
    UnsupportedFieldType { field: String, field_type: String },
}

/// Why the geometry of a matching feature could not be transferred.
#[derive(Clone, Debug, Error)]
pub enum GeometryCopyError {
    #[error("feature has no geometry")]
    NullGeometry,
    #[error("{found} geometry cannot be written to a {expected} layer")]
    Incompatible { found: String, expected: String },
    #[error(transparent)]
    Gdal(#[from] GdalError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unable to open source dataset '{}'", .path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: GdalError,
    },
    #[error("source dataset '{}' has no layer {layer}", .path.display())]
    MissingLayer { path: PathBuf, layer: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("destination '{}' already exists", .path.display())]
    DestinationExists { path: PathBuf },
    #[error("unable to create destination '{}'", .path.display())]
    DestinationCreate {
        path: PathBuf,
        #[source]
        source: GdalError,
    },
    #[error("unable to copy the geometry of feature {}", fid_label(.fid))]
    GeometryCopy {
        fid: Option<u64>,
        #[source]
        reason: GeometryCopyError,
    },
    #[error("unable to write to '{}'", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: GdalError,
    },
    #[error(transparent)]
    Gdal(#[from] GdalError),
}

fn fid_label(fid: &Option<u64>) -> String {
    match fid {
        Some(fid) => fid.to_string(),
        None => "without id".to_string(),
    }
}
