use std::ffi::CString;
use std::marker::PhantomData;
use std::ptr::null;

use gdal_sys::{self, OGRErr, OGRLayerH, OGRwkbGeometryType};

use crate::cpl::CslStringList;
use crate::dataset::Dataset;
use crate::errors::*;
use crate::spatial_ref::SpatialRef;
use crate::utils::_string;
use crate::vector::{Defn, Feature, Field};

/// Parameters for [`Dataset::create_layer`].
#[derive(Debug)]
pub struct LayerOptions<'a> {
    /// The name of the newly created layer
    pub name: &'a str,
    /// An optional spatial reference for the layer's geometries
    pub srs: Option<&'a SpatialRef>,
    /// The geometry type of the layer
    pub ty: OGRwkbGeometryType::Type,
    /// Driver specific layer creation options, such as `ENCODING=UTF-8`
    pub options: CslStringList,
}

impl Default for LayerOptions<'_> {
    /// Returns creation options for an unnamed layer without spatial reference.
    fn default() -> Self {
        LayerOptions {
            name: "",
            srs: None,
            ty: OGRwkbGeometryType::wkbUnknown,
            options: CslStringList::new(),
        }
    }
}

/// Layer in a vector dataset
///
/// ```rust,no_run
/// use ogr_subset::Dataset;
///
/// let dataset = Dataset::open("fixtures/basins.geojson").unwrap();
/// let mut layer = dataset.layer(0).unwrap();
/// for feature in layer.features() {
///     // do something with each feature
/// }
/// ```
#[derive(Debug)]
pub struct Layer<'a> {
    c_layer: OGRLayerH,
    defn: Defn,
    phantom: PhantomData<&'a Dataset>,
}

impl<'a> Layer<'a> {
    /// Creates a new Layer by wrapping a C pointer
    ///
    /// # Safety
    /// `c_layer` must be a layer owned by `dataset`.
    pub(crate) unsafe fn from_c_layer(_: &'a Dataset, c_layer: OGRLayerH) -> Self {
        let c_defn = gdal_sys::OGR_L_GetLayerDefn(c_layer);
        let defn = Defn::from_c_defn(c_defn);
        Self {
            c_layer,
            defn,
            phantom: PhantomData,
        }
    }

    /// Returns the C wrapped pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_layer(&self) -> OGRLayerH {
        self.c_layer
    }

    pub fn name(&self) -> String {
        let rv = unsafe { gdal_sys::OGR_L_GetName(self.c_layer) };
        _string(rv)
    }

    /// The field schema of this layer.
    pub fn defn(&self) -> &Defn {
        &self.defn
    }

    /// Iterate over all features in this layer, from the start.
    ///
    /// An attribute filter set on the layer restricts what is returned.
    pub fn features(&mut self) -> FeatureIterator {
        self.reset_feature_reading();
        FeatureIterator {
            defn: &self.defn,
            c_layer: self.c_layer,
        }
    }

    /// Rewind the read cursor to the first feature.
    pub fn reset_feature_reading(&mut self) {
        unsafe { gdal_sys::OGR_L_ResetReading(self.c_layer) };
    }

    /// Number of features passing the current filters.
    ///
    /// Drivers without a fast count scan the whole layer.
    pub fn feature_count(&self) -> u64 {
        let count = unsafe { gdal_sys::OGR_L_GetFeatureCount(self.c_layer, 1) };
        count.max(0) as u64
    }

    /// The spatial reference of this layer, if any.
    pub fn spatial_ref(&self) -> Option<SpatialRef> {
        let c_obj = unsafe { gdal_sys::OGR_L_GetSpatialRef(self.c_layer) };
        if c_obj.is_null() {
            return None;
        }
        unsafe { SpatialRef::from_c_obj(c_obj) }.ok()
    }

    /// Declared geometry type of the layer.
    pub fn geometry_type(&self) -> OGRwkbGeometryType::Type {
        unsafe { gdal_sys::OGR_L_GetGeomType(self.c_layer) }
    }

    /// Check an `OLC*` capability, e.g. `"SequentialWrite"` or `"CreateField"`.
    pub fn has_capability(&self, capability: &str) -> Result<bool> {
        let c_capability = CString::new(capability)?;
        Ok(unsafe { gdal_sys::OGR_L_TestCapability(self.c_layer, c_capability.as_ptr()) } != 0)
    }

    /// Restrict the features returned by [`Layer::features`] to those
    /// matching an OGR SQL `WHERE` clause.
    pub fn set_attribute_filter(&mut self, query: &str) -> Result<()> {
        let c_str = CString::new(query)?;
        let rv = unsafe { gdal_sys::OGR_L_SetAttributeFilter(self.c_layer, c_str.as_ptr()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_L_SetAttributeFilter",
            });
        }
        Ok(())
    }

    pub fn clear_attribute_filter(&mut self) {
        unsafe {
            gdal_sys::OGR_L_SetAttributeFilter(self.c_layer, null());
        }
    }

    /// Adds a field with the name, type, width and precision of `field`.
    ///
    /// Drivers may adapt the definition, for instance by truncating long
    /// names in shapefiles.
    pub fn create_field_like(&mut self, field: &Field) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_CreateField(self.c_layer, field.c_field_defn(), 1) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_L_CreateField",
            });
        }
        Ok(())
    }

    /// Writes `feature` as a new feature of this layer.
    ///
    /// The feature must follow this layer's schema. Only its fields and
    /// geometry are carried over and OGR may assign a new feature id.
    pub fn create_feature(&self, feature: &Feature) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_CreateFeature(self.c_layer, feature.c_feature()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_L_CreateFeature",
            });
        }
        Ok(())
    }

    /// Flush pending changes to disk.
    pub fn sync_to_disk(&mut self) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_SyncToDisk(self.c_layer) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_L_SyncToDisk",
            });
        }
        Ok(())
    }
}

pub struct FeatureIterator<'a> {
    defn: &'a Defn,
    c_layer: OGRLayerH,
}

impl<'a> Iterator for FeatureIterator<'a> {
    type Item = Feature<'a>;

    #[inline]
    fn next(&mut self) -> Option<Feature<'a>> {
        let c_feature = unsafe { gdal_sys::OGR_L_GetNextFeature(self.c_layer) };
        if c_feature.is_null() {
            None
        } else {
            Some(unsafe { Feature::from_c_feature(self.defn, c_feature) })
        }
    }
}
