use std::ffi::{c_int, CString};
use std::path::Path;
use std::ptr::null_mut;

use gdal_sys::{self, GDALDatasetH, OGRLayerH};

use crate::cpl::CslStringList;
use crate::driver::_register_drivers;
use crate::errors::*;
use crate::options::DatasetOptions;
use crate::utils::{_last_null_pointer_err, _path_to_c_string};
use crate::vector::{Layer, LayerOptions};
use crate::Driver;

/// Wrapper around a [`GDALDataset`][GDALDataset] object.
///
/// The handle is closed with `GDALClose` when the value is dropped, which also
/// flushes any pending writes. Layers borrow the dataset, so they can never
/// outlive it.
///
/// [GDALDataset]: https://gdal.org/api/gdaldataset_cpp.html#_CPPv411GDALDataset
#[derive(Debug)]
pub struct Dataset {
    c_dataset: GDALDatasetH,
}

// GDAL Docs state: The returned dataset should only be accessed by one thread at a time.
// See: https://gdal.org/api/raster_c_api.html#_CPPv48GDALOpenPKc10GDALAccess
unsafe impl Send for Dataset {}

impl Dataset {
    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_dataset(&self) -> GDALDatasetH {
        self.c_dataset
    }

    /// Creates a new Dataset by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer. The dataset takes ownership
    /// and closes it on drop.
    pub unsafe fn from_c_dataset(c_dataset: GDALDatasetH) -> Dataset {
        Dataset { c_dataset }
    }

    /// Open a dataset at the given `path` with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        Self::_open_ex(path.as_ref(), DatasetOptions::default())
    }

    /// Open a dataset with extended options. See
    /// [`GDALOpenEx`](https://gdal.org/api/raster_c_api.html#_CPPv410GDALOpenExPKcjPKcPKcPKc).
    pub fn open_ex<P: AsRef<Path>>(path: P, options: DatasetOptions) -> Result<Dataset> {
        Self::_open_ex(path.as_ref(), options)
    }

    fn _open_ex(path: &Path, options: DatasetOptions) -> Result<Dataset> {
        _register_drivers();

        let c_filename = _path_to_c_string(path)?;
        let c_open_flags = options.open_flags.bits();

        // the lists must stay alive until GDALOpenEx returns
        let c_allowed_drivers = CslStringList::from_strings(options.allowed_drivers.unwrap_or(&[]))?;
        let c_open_options = CslStringList::from_strings(options.open_options.unwrap_or(&[]))?;
        let c_sibling_files = CslStringList::from_strings(options.sibling_files.unwrap_or(&[]))?;

        let c_dataset = unsafe {
            gdal_sys::GDALOpenEx(
                c_filename.as_ptr(),
                c_open_flags,
                c_allowed_drivers.as_ptr_or_null() as *const *const _,
                c_open_options.as_ptr_or_null() as *const *const _,
                c_sibling_files.as_ptr_or_null() as *const *const _,
            )
        };
        if c_dataset.is_null() {
            return Err(_last_null_pointer_err("GDALOpenEx"));
        }
        Ok(Dataset { c_dataset })
    }

    /// Get the driver used to open or create this dataset.
    pub fn driver(&self) -> Driver {
        unsafe {
            let c_driver = gdal_sys::GDALGetDatasetDriver(self.c_dataset);
            Driver::from_c_driver(c_driver)
        }
    }

    /// Get the number of layers in this dataset.
    pub fn layer_count(&self) -> usize {
        let count = unsafe { gdal_sys::GDALDatasetGetLayerCount(self.c_dataset) };
        count as usize
    }

    fn child_layer(&self, c_layer: OGRLayerH) -> Layer {
        unsafe { Layer::from_c_layer(self, c_layer) }
    }

    /// Get the layer at position `idx`.
    pub fn layer(&self, idx: usize) -> Result<Layer> {
        let idx = c_int::try_from(idx)
            .map_err(|_| GdalError::BadArgument(format!("layer index {idx} out of range")))?;
        let c_layer = unsafe { gdal_sys::GDALDatasetGetLayer(self.c_dataset, idx) };
        if c_layer.is_null() {
            return Err(_last_null_pointer_err("GDALDatasetGetLayer"));
        }
        Ok(self.child_layer(c_layer))
    }

    /// Get the layer named `name`.
    pub fn layer_by_name(&self, name: &str) -> Result<Layer> {
        let c_name = CString::new(name)?;
        let c_layer = unsafe { gdal_sys::GDALDatasetGetLayerByName(self.c_dataset, c_name.as_ptr()) };
        if c_layer.is_null() {
            return Err(_last_null_pointer_err("GDALDatasetGetLayerByName"));
        }
        Ok(self.child_layer(c_layer))
    }

    /// Names of all layers, in dataset order.
    pub fn layer_names(&self) -> Vec<String> {
        (0..self.layer_count())
            .filter_map(|idx| self.layer(idx).ok())
            .map(|layer| layer.name())
            .collect()
    }

    /// Creates a new layer. The [`LayerOptions`] struct implements `Default`, so you only need to
    /// specify those options that deviate from the default.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use ogr_subset::{Driver, cpl::CslStringList};
    /// # use ogr_subset::spatial_ref::SpatialRef;
    /// # use ogr_subset::vector::{LayerOptions, OGRwkbGeometryType};
    /// # let driver = Driver::get_by_name("ESRI Shapefile").unwrap();
    /// # let mut dataset = driver.create_vector_only("/tmp/basins.shp".as_ref(), &CslStringList::new()).unwrap();
    /// let srs = SpatialRef::from_epsg(4326).unwrap();
    /// let layer = dataset.create_layer(LayerOptions {
    ///     name: "basins",
    ///     srs: Some(&srs),
    ///     ty: OGRwkbGeometryType::wkbPolygon,
    ///     ..Default::default()
    /// }).unwrap();
    /// ```
    pub fn create_layer(&mut self, options: LayerOptions<'_>) -> Result<Layer> {
        let c_name = CString::new(options.name)?;
        let c_srs = match options.srs {
            Some(srs) => unsafe { srs.to_c_hsrs() },
            None => null_mut(),
        };

        let c_layer = unsafe {
            gdal_sys::GDALDatasetCreateLayer(
                self.c_dataset,
                c_name.as_ptr(),
                c_srs,
                options.ty,
                options.options.as_ptr_or_null(),
            )
        };
        if c_layer.is_null() {
            return Err(_last_null_pointer_err("GDALDatasetCreateLayer"));
        };
        Ok(self.child_layer(c_layer))
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALClose(self.c_dataset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GdalOpenFlags;
    use crate::test_utils::{fixture, SuppressGDALErrorLog};

    #[test]
    fn test_open_vector() {
        let ds = Dataset::open(fixture("basins.geojson")).unwrap();
        assert_eq!(ds.layer_count(), 1);
        assert_eq!(ds.driver().short_name(), "GeoJSON");
    }

    #[test]
    fn test_open_ex_allowed_drivers() {
        let _nolog = SuppressGDALErrorLog::new();
        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR,
            allowed_drivers: Some(&["ESRI Shapefile"]),
            ..DatasetOptions::default()
        };
        assert!(Dataset::open_ex(fixture("basins.geojson"), options).is_err());

        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR,
            allowed_drivers: Some(&["GeoJSON"]),
            ..DatasetOptions::default()
        };
        assert!(Dataset::open_ex(fixture("basins.geojson"), options).is_ok());
    }

    #[test]
    fn test_open_missing() {
        let _nolog = SuppressGDALErrorLog::new();
        let result = Dataset::open(fixture("does_not_exist.shp"));
        assert!(matches!(
            result,
            Err(GdalError::NullPointer {
                method_name: "GDALOpenEx",
                ..
            })
        ));
    }

    #[test]
    fn test_layer_lookup() {
        let ds = Dataset::open(fixture("basins.geojson")).unwrap();
        assert_eq!(ds.layer_names(), vec!["basins".to_string()]);
        assert!(ds.layer_by_name("basins").is_ok());

        let _nolog = SuppressGDALErrorLog::new();
        assert!(ds.layer(3).is_err());
        assert!(ds.layer_by_name("rivers").is_err());
    }
}
