use std::ffi::CString;
use std::path::Path;
use std::sync::Once;

use gdal_sys::{self, CPLErr, GDALDataType, GDALDriverH, GDALMajorObjectH};

use crate::cpl::CslStringList;
use crate::dataset::Dataset;
use crate::errors::*;
use crate::utils::{_last_cpl_err, _last_null_pointer_err, _opt_string, _path_to_c_string, _string};

static START: Once = Once::new();

pub fn _register_drivers() {
    START.call_once(|| unsafe {
        gdal_sys::GDALAllRegister();
    });
}

/// Vector drivers picked from a destination file extension.
const DRIVERS_BY_EXTENSION: &[(&str, &str)] = &[
    ("shp", "ESRI Shapefile"),
    ("gpkg", "GPKG"),
    ("geojson", "GeoJSON"),
    ("json", "GeoJSON"),
    ("fgb", "FlatGeobuf"),
    ("gml", "GML"),
    ("kml", "KML"),
    ("csv", "CSV"),
    ("sqlite", "SQLite"),
    ("tab", "MapInfo File"),
    ("mif", "MapInfo File"),
];

/// Raster and vector driver
#[derive(Debug)]
#[allow(missing_copy_implementations)]
pub struct Driver {
    c_driver: GDALDriverH,
}

impl Driver {
    /// Returns the driver with the given short name, e.g. `"ESRI Shapefile"`.
    pub fn get_by_name(name: &str) -> Result<Driver> {
        _register_drivers();
        let c_name = CString::new(name)?;
        let c_driver = unsafe { gdal_sys::GDALGetDriverByName(c_name.as_ptr()) };
        if c_driver.is_null() {
            return Err(_last_null_pointer_err("GDALGetDriverByName"));
        };
        Ok(Driver { c_driver })
    }

    /// Short name of the vector driver conventionally used for `path`'s extension.
    pub fn short_name_for_path(path: &Path) -> Option<&'static str> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        DRIVERS_BY_EXTENSION
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, name)| *name)
    }

    /// Returns the vector driver conventionally used for `path`'s extension.
    pub fn for_path(path: &Path) -> Result<Driver> {
        match Self::short_name_for_path(path) {
            Some(name) => Self::get_by_name(name),
            None => Err(GdalError::BadArgument(format!(
                "no vector driver known for '{}'",
                path.display()
            ))),
        }
    }

    /// Creates a new Driver object by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer
    pub unsafe fn from_c_driver(c_driver: GDALDriverH) -> Driver {
        Driver { c_driver }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_driver(&self) -> GDALDriverH {
        self.c_driver
    }

    pub fn short_name(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetDriverShortName(self.c_driver) };
        _string(rv)
    }

    pub fn long_name(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetDriverLongName(self.c_driver) };
        _string(rv)
    }

    /// Check a `DCAP_*` capability, e.g. `"DCAP_VECTOR"` or `"DCAP_CREATE"`.
    pub fn has_capability(&self, capability: &str) -> Result<bool> {
        let c_key = CString::new(capability)?;
        let rv = unsafe {
            gdal_sys::GDALGetMetadataItem(
                self.c_driver as GDALMajorObjectH,
                c_key.as_ptr(),
                std::ptr::null(),
            )
        };
        Ok(_opt_string(rv).is_some_and(|value| value.eq_ignore_ascii_case("YES")))
    }

    /// Creates a dataset without raster bands, for writing vector layers.
    pub fn create_vector_only(&self, path: &Path, options: &CslStringList) -> Result<Dataset> {
        let c_filename = _path_to_c_string(path)?;
        let c_dataset = unsafe {
            gdal_sys::GDALCreate(
                self.c_driver,
                c_filename.as_ptr(),
                0,
                0,
                0,
                GDALDataType::GDT_Unknown,
                options.as_ptr_or_null(),
            )
        };

        if c_dataset.is_null() {
            return Err(_last_null_pointer_err("GDALCreate"));
        };

        Ok(unsafe { Dataset::from_c_dataset(c_dataset) })
    }

    /// Removes the dataset at `path` together with every sidecar file the driver knows of.
    ///
    /// The dataset must not be open.
    pub fn delete(&self, path: &Path) -> Result<()> {
        let c_filename = _path_to_c_string(path)?;
        let rv = unsafe { gdal_sys::GDALDeleteDataset(self.c_driver, c_filename.as_ptr()) };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }
}
