use std::path::{Path, PathBuf};

use gdal_sys::{OGRFieldType, OGRwkbGeometryType};

use crate::config::{LogErrorScope, ThreadLocalConfigScope};
use crate::cpl::CslStringList;
use crate::errors::GdalError;
use crate::options::{DatasetOptions, GdalOpenFlags};
use crate::spatial_ref::SpatialRef;
use crate::subset::{
    AttributeFilter, CompiledFilter, ExportError, FieldSelection, FilterValue, GeometryCopyError,
    LayerSelector, NullGeometryPolicy, OutputSpec, SchemaError, SrsDefinition, SubsetRequest,
};
use crate::vector::{
    field_type_to_name, geometry_type_accepts, geometry_type_flatten, geometry_type_to_name, Defn,
    Feature, Layer, LayerOptions,
};
use crate::{vsi, Dataset, Driver};

/// Outcome of a successful export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Features read from the source layer.
    pub scanned: u64,
    /// Features passing the attribute filter.
    pub matched: u64,
    /// Features written to the destination.
    pub written: u64,
    /// Matching features left out for lack of geometry.
    pub skipped_null_geometry: u64,
    /// Path the dataset was written to.
    pub destination: PathBuf,
    /// Name of the created layer, as the driver reports it.
    pub layer_name: String,
    /// Short name of the driver that wrote the destination.
    pub driver: String,
}

/// Copies the features of one layer that pass an attribute filter into a
/// new dataset.
///
/// Every check that depends only on the inputs (source, layer, schema,
/// filter, output driver and spatial reference, destination path) runs
/// before anything is created, so these failures never leave files behind.
/// Features are then streamed in a single pass. All GDAL handles are
/// released before [`SubsetExporter::run`] returns.
#[derive(Clone, Debug)]
pub struct SubsetExporter {
    request: SubsetRequest,
}

/// Source field positions to copy, in output order.
struct FieldMapping {
    source: Vec<usize>,
}

impl SubsetExporter {
    pub fn new(request: SubsetRequest) -> Self {
        SubsetExporter { request }
    }

    pub fn request(&self) -> &SubsetRequest {
        &self.request
    }

    pub fn run(&self) -> Result<ExportReport, ExportError> {
        let _log_scope = LogErrorScope::new();
        let _config_scope = ThreadLocalConfigScope::new(&self.request.options.config_options)?;

        let source = self.open_source()?;
        let mut source_layer = self.source_layer(&source)?;
        let filter = self.request.filter.compile(source_layer.defn())?;
        let fields = self.field_mapping(source_layer.defn())?;

        let output = &self.request.output;
        let driver = self.destination_driver()?;
        let srs = output
            .srs
            .resolve(&source_layer)
            .map_err(|source| self.destination_create_err(source))?;
        for path in destination_files(&driver, &output.path) {
            if vsi::path_exists(&path)? {
                return Err(ExportError::DestinationExists { path });
            }
        }

        if self.request.options.push_down_filter {
            if filter.can_push_down() {
                let sql = filter.to_sql();
                log::debug!("pushing down attribute filter {sql}");
                source_layer.set_attribute_filter(&sql)?;
            } else {
                log::debug!(
                    "not pushing down filter on temporal field '{}'",
                    filter.field_name()
                );
            }
        }

        let mut destination = driver
            .create_vector_only(&output.path, &self.dataset_options()?)
            .map_err(|source| self.destination_create_err(source))?;
        log::debug!(
            "created '{}' with driver {}",
            output.path.display(),
            driver.short_name()
        );

        let outcome = self.copy_features(
            &mut destination,
            srs.as_ref(),
            &mut source_layer,
            &filter,
            &fields,
        );
        // close before a possible delete, and before reporting success so the data is flushed
        drop(destination);

        match outcome {
            Ok(mut report) => {
                report.driver = driver.short_name();
                log::info!(
                    "exported {} of {} features from '{}' to '{}'",
                    report.written,
                    report.scanned,
                    self.request.source.display(),
                    output.path.display()
                );
                Ok(report)
            }
            Err(err) => {
                if self.request.options.remove_partial_output {
                    self.remove_partial_output(&driver);
                }
                Err(err)
            }
        }
    }

    fn open_source(&self) -> Result<Dataset, ExportError> {
        let options = &self.request.options;
        let allowed_drivers: Vec<&str> = options.allowed_drivers.iter().map(String::as_str).collect();
        let open_options: Vec<&str> = options.open_options.iter().map(String::as_str).collect();

        let dataset = Dataset::open_ex(
            &self.request.source,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR,
                allowed_drivers: (!allowed_drivers.is_empty()).then_some(allowed_drivers.as_slice()),
                open_options: (!open_options.is_empty()).then_some(open_options.as_slice()),
                ..DatasetOptions::default()
            },
        )
        .map_err(|source| ExportError::SourceNotFound {
            path: self.request.source.clone(),
            source,
        })?;

        log::debug!(
            "opened '{}' with driver {}, {} layer(s)",
            self.request.source.display(),
            dataset.driver().short_name(),
            dataset.layer_count()
        );
        Ok(dataset)
    }

    fn source_layer<'a>(&self, dataset: &'a Dataset) -> Result<Layer<'a>, ExportError> {
        let missing = || ExportError::MissingLayer {
            path: self.request.source.clone(),
            layer: self.request.layer.to_string(),
        };
        match &self.request.layer {
            LayerSelector::Index(idx) if *idx < dataset.layer_count() => {
                dataset.layer(*idx).map_err(|_| missing())
            }
            LayerSelector::Index(_) => Err(missing()),
            LayerSelector::Name(name) => dataset.layer_by_name(name).map_err(|_| missing()),
        }
    }

    fn field_mapping(&self, defn: &Defn) -> Result<FieldMapping, ExportError> {
        let source = match &self.request.output.fields {
            FieldSelection::None => Vec::new(),
            FieldSelection::All => (0..defn.field_count()).collect(),
            FieldSelection::Only(names) => names
                .iter()
                .map(|name| match defn.field_index(name) {
                    Ok(Some(idx)) => Ok(idx),
                    _ => Err(SchemaError::MissingField {
                        field: name.clone(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        for &idx in &source {
            let field = defn.field(idx)?;
            let field_type = field.field_type();
            if !is_copyable(field_type) {
                return Err(SchemaError::UnsupportedFieldType {
                    field: field.name(),
                    field_type: field_type_to_name(field_type),
                }
                .into());
            }
        }
        Ok(FieldMapping { source })
    }

    fn destination_driver(&self) -> Result<Driver, ExportError> {
        let output = &self.request.output;
        let driver = match &output.driver {
            Some(name) => Driver::get_by_name(name),
            None => Driver::for_path(&output.path),
        }
        .map_err(|source| self.destination_create_err(source))?;

        for capability in ["DCAP_VECTOR", "DCAP_CREATE"] {
            if !driver.has_capability(capability)? {
                return Err(self.destination_create_err(GdalError::BadArgument(format!(
                    "driver {} lacks {capability}",
                    driver.short_name()
                ))));
            }
        }
        Ok(driver)
    }

    fn dataset_options(&self) -> Result<CslStringList, ExportError> {
        CslStringList::from_name_values(&self.request.output.dataset_options)
            .map_err(|source| self.destination_create_err(source))
    }

    fn copy_features(
        &self,
        destination: &mut Dataset,
        srs: Option<&SpatialRef>,
        source_layer: &mut Layer,
        filter: &CompiledFilter,
        fields: &FieldMapping,
    ) -> Result<ExportReport, ExportError> {
        let output = &self.request.output;
        let layer_name = output.layer_name();
        let layer_options = CslStringList::from_name_values(&output.layer_options)
            .map_err(|source| self.destination_create_err(source))?;

        let mut layer = destination
            .create_layer(LayerOptions {
                name: &layer_name,
                srs,
                ty: output.geometry_type,
                options: layer_options,
            })
            .map_err(|source| self.destination_create_err(source))?;

        let first_field = layer.defn().field_count();
        for &idx in &fields.source {
            let field = source_layer.defn().field(idx)?;
            layer
                .create_field_like(&field)
                .map_err(|source| self.destination_create_err(source))?;
        }

        let mut report = ExportReport {
            destination: output.path.clone(),
            layer_name: layer.name(),
            ..ExportReport::default()
        };

        let attributes_only =
            geometry_type_flatten(output.geometry_type) == OGRwkbGeometryType::wkbNone;
        let defn = layer.defn();

        for feature in source_layer.features() {
            report.scanned += 1;
            if !filter.matches(&feature)? {
                continue;
            }
            report.matched += 1;

            let mut copy = Feature::new(defn).map_err(|source| self.write_err(source))?;
            if !attributes_only {
                match feature.geometry() {
                    Some(geometry) => {
                        self.check_geometry_type(&feature, geometry.geometry_type())?;
                        copy.set_geometry(geometry)
                            .map_err(|e| geometry_copy_err(&feature, e.into()))?;
                    }
                    None => match self.request.options.null_geometry {
                        NullGeometryPolicy::Reject => {
                            return Err(geometry_copy_err(&feature, GeometryCopyError::NullGeometry))
                        }
                        NullGeometryPolicy::Skip => {
                            log::warn!(
                                "skipping feature {:?} of '{}' without geometry",
                                feature.fid(),
                                self.request.source.display()
                            );
                            report.skipped_null_geometry += 1;
                            continue;
                        }
                        NullGeometryPolicy::Keep => {}
                    },
                }
            }

            for (offset, &idx) in fields.source.iter().enumerate() {
                if let Some(value) = feature.field_by_index(idx)? {
                    copy.set_field_by_index(first_field + offset, &value)
                        .map_err(|source| self.write_err(source))?;
                }
            }

            layer
                .create_feature(&copy)
                .map_err(|source| self.write_err(source))?;
            report.written += 1;
        }

        layer.sync_to_disk().map_err(|source| self.write_err(source))?;
        Ok(report)
    }

    fn check_geometry_type(
        &self,
        feature: &Feature,
        found: OGRwkbGeometryType::Type,
    ) -> Result<(), ExportError> {
        let expected = self.request.output.geometry_type;
        if geometry_type_accepts(expected, found) {
            return Ok(());
        }
        Err(geometry_copy_err(
            feature,
            GeometryCopyError::Incompatible {
                found: geometry_type_to_name(found),
                expected: geometry_type_to_name(expected),
            },
        ))
    }

    fn remove_partial_output(&self, driver: &Driver) {
        let path = &self.request.output.path;
        if !vsi::path_exists(path).unwrap_or(false) {
            return;
        }
        match driver.delete(path) {
            Ok(()) => log::debug!("removed partial output '{}'", path.display()),
            Err(e) => log::warn!("unable to remove partial output '{}': {e}", path.display()),
        }
    }

    fn destination_create_err(&self, source: GdalError) -> ExportError {
        ExportError::DestinationCreate {
            path: self.request.output.path.clone(),
            source,
        }
    }

    fn write_err(&self, source: GdalError) -> ExportError {
        ExportError::Write {
            path: self.request.output.path.clone(),
            source,
        }
    }
}

fn geometry_copy_err(feature: &Feature, reason: GeometryCopyError) -> ExportError {
    ExportError::GeometryCopy {
        fid: feature.fid(),
        reason,
    }
}

/// Extensions of the files a multi-file driver writes next to the main one.
fn sidecar_extensions(driver: &str) -> &'static [&'static str] {
    match driver {
        "ESRI Shapefile" => &["shp", "shx", "dbf", "prj", "cpg", "qix", "sbn", "sbx"],
        "MapInfo File" => &["tab", "dat", "map", "id", "ind"],
        _ => &[],
    }
}

/// Every file the export would create at `path`, main file first.
fn destination_files(driver: &Driver, path: &Path) -> Vec<PathBuf> {
    let mut files = vec![path.to_path_buf()];
    if path.extension().is_none() {
        return files;
    }
    for extension in sidecar_extensions(&driver.short_name()) {
        let sidecar = path.with_extension(extension);
        if !files.contains(&sidecar) {
            files.push(sidecar);
        }
    }
    files
}

fn is_copyable(field_type: OGRFieldType::Type) -> bool {
    matches!(
        field_type,
        OGRFieldType::OFTInteger
            | OGRFieldType::OFTInteger64
            | OGRFieldType::OFTReal
            | OGRFieldType::OFTString
            | OGRFieldType::OFTDate
            | OGRFieldType::OFTTime
            | OGRFieldType::OFTDateTime
    )
}

/// Write the features of the first layer of `source_path` whose
/// `attribute_name` equals `attribute_value` to a new dataset.
///
/// Only geometries are copied. The output driver is picked from the
/// extension of `destination_path`, which must not exist yet. Returns the
/// number of features written, which may be zero.
///
/// ```rust,no_run
/// use ogr_subset::subset::{export_subset, SrsDefinition};
/// use ogr_subset::vector::OGRwkbGeometryType;
///
/// let written = export_subset(
///     "basins.shp",
///     "HYBAS_ID",
///     "10",
///     "basin_10.shp",
///     SrsDefinition::Epsg(4326),
///     OGRwkbGeometryType::wkbPolygon,
/// )?;
/// # Ok::<(), ogr_subset::subset::ExportError>(())
/// ```
pub fn export_subset<P, Q, V>(
    source_path: P,
    attribute_name: &str,
    attribute_value: V,
    destination_path: Q,
    spatial_reference: SrsDefinition,
    geometry_type: OGRwkbGeometryType::Type,
) -> Result<usize, ExportError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    V: Into<FilterValue>,
{
    let request = SubsetRequest::new(
        source_path,
        AttributeFilter::equals(attribute_name, attribute_value),
        OutputSpec::new(destination_path, spatial_reference, geometry_type),
    );
    let report = SubsetExporter::new(request).run()?;
    Ok(report.written as usize)
}
