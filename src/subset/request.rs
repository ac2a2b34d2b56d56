use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use gdal_sys::OGRwkbGeometryType;

use crate::errors::Result;
use crate::spatial_ref::SpatialRef;
use crate::subset::AttributeFilter;
use crate::vector::Layer;

/// Which layer of the source dataset to read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerSelector {
    Index(usize),
    Name(String),
}

impl Default for LayerSelector {
    /// The first layer.
    fn default() -> Self {
        LayerSelector::Index(0)
    }
}

impl Display for LayerSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LayerSelector::Index(idx) => write!(f, "#{idx}"),
            LayerSelector::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Spatial reference assigned to the output layer.
///
/// The definition is only parsed, never used to transform coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SrsDefinition {
    Epsg(u32),
    Wkt(String),
    /// Any form accepted by `OSRSetFromUserInput`, e.g. `"EPSG:4326"` or a PROJ string.
    UserInput(String),
    /// Whatever the source layer declares, possibly nothing.
    Source,
}

impl SrsDefinition {
    pub(crate) fn resolve(&self, source: &Layer) -> Result<Option<SpatialRef>> {
        match self {
            SrsDefinition::Epsg(code) => SpatialRef::from_epsg(*code).map(Some),
            SrsDefinition::Wkt(wkt) => SpatialRef::from_wkt(wkt).map(Some),
            SrsDefinition::UserInput(definition) => SpatialRef::from_definition(definition).map(Some),
            SrsDefinition::Source => Ok(source.spatial_ref()),
        }
    }
}

/// Attribute fields carried over to the output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Geometry only.
    #[default]
    None,
    All,
    /// The named fields, in the given order.
    Only(Vec<String>),
}

/// What to do with a matching feature that has no geometry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NullGeometryPolicy {
    /// Fail the export with [`GeometryCopyError::NullGeometry`](crate::subset::GeometryCopyError::NullGeometry).
    #[default]
    Reject,
    /// Leave the feature out and count it in the report.
    Skip,
    /// Write the feature without geometry.
    Keep,
}

/// Destination of an export.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSpec {
    pub path: PathBuf,
    /// Short driver name. Inferred from the path extension when `None`.
    pub driver: Option<String>,
    /// Defaults to the file stem of `path`.
    pub layer_name: Option<String>,
    pub srs: SrsDefinition,
    /// `wkbNone` produces an attribute-only layer.
    pub geometry_type: OGRwkbGeometryType::Type,
    pub fields: FieldSelection,
    /// `NAME=VALUE` options for dataset creation.
    pub dataset_options: Vec<(String, String)>,
    /// `NAME=VALUE` options for layer creation.
    pub layer_options: Vec<(String, String)>,
}

impl OutputSpec {
    pub fn new<P: AsRef<Path>>(
        path: P,
        srs: SrsDefinition,
        geometry_type: OGRwkbGeometryType::Type,
    ) -> Self {
        OutputSpec {
            path: path.as_ref().to_path_buf(),
            driver: None,
            layer_name: None,
            srs,
            geometry_type,
            fields: FieldSelection::default(),
            dataset_options: Vec::new(),
            layer_options: Vec::new(),
        }
    }

    /// Name requested for the output layer.
    pub fn layer_name(&self) -> String {
        match &self.layer_name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "subset".to_string()),
        }
    }
}

/// Knobs of an export. The defaults give the plain filter-and-copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub null_geometry: NullGeometryPolicy,
    /// Also hand the filter to the source driver as an OGR SQL attribute filter.
    pub push_down_filter: bool,
    /// Delete the destination again when the export fails after creating it.
    pub remove_partial_output: bool,
    /// Driver open options for the source, as `NAME=VALUE`.
    pub open_options: Vec<String>,
    /// Restrict the drivers tried when opening the source.
    pub allowed_drivers: Vec<String>,
    /// GDAL configuration options in effect for the duration of the export.
    pub config_options: Vec<(String, String)>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            null_geometry: NullGeometryPolicy::default(),
            push_down_filter: false,
            remove_partial_output: true,
            open_options: Vec::new(),
            allowed_drivers: Vec::new(),
            config_options: Vec::new(),
        }
    }
}

/// Everything [`SubsetExporter`](crate::subset::SubsetExporter) needs for one export.
#[derive(Clone, Debug, PartialEq)]
pub struct SubsetRequest {
    pub source: PathBuf,
    pub layer: LayerSelector,
    pub filter: AttributeFilter,
    pub output: OutputSpec,
    pub options: ExportOptions,
}

impl SubsetRequest {
    /// A request reading the first layer, with default options.
    pub fn new<P: AsRef<Path>>(source: P, filter: AttributeFilter, output: OutputSpec) -> Self {
        SubsetRequest {
            source: source.as_ref().to_path_buf(),
            layer: LayerSelector::default(),
            filter,
            output,
            options: ExportOptions::default(),
        }
    }
}
