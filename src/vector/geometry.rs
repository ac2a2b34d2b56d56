use std::ffi::{c_char, c_int, c_void, CString};
use std::fmt::{self, Debug, Formatter};
use std::ptr::null_mut;

use gdal_sys::{self, OGRErr, OGRGeometryH, OGRwkbGeometryType};

use crate::errors::*;
use crate::utils::_string;

/// OGR Geometry
///
/// An owned geometry is destroyed on drop. A borrowed one (for instance the
/// geometry of a feature read from a layer) is only a view into memory owned
/// by GDAL and must not outlive its owner.
pub struct Geometry {
    c_geometry: OGRGeometryH,
    owned: bool,
}

impl Geometry {
    /// Wraps a C pointer.
    ///
    /// # Safety
    /// `c_geometry` must be a valid geometry handle. When `owned` is `true`
    /// the returned value destroys it on drop.
    pub unsafe fn with_c_geometry(c_geometry: OGRGeometryH, owned: bool) -> Geometry {
        Geometry { c_geometry, owned }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_geometry(&self) -> OGRGeometryH {
        self.c_geometry
    }

    /// Create a geometry by parsing a
    /// [WKT](https://en.wikipedia.org/wiki/Well-known_text_representation_of_geometry) string.
    pub fn from_wkt(wkt: &str) -> Result<Geometry> {
        let c_wkt = CString::new(wkt)?;
        // OGR_G_CreateFromWkt does not write to the pointed-to memory, but this is not reflected
        // in its signature (`char**` instead of `char const**`), so we need a scary looking cast.
        let mut c_wkt_ptr = c_wkt.as_ptr() as *mut c_char;
        let mut c_geom = null_mut();
        let rv = unsafe { gdal_sys::OGR_G_CreateFromWkt(&mut c_wkt_ptr, null_mut(), &mut c_geom) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_G_CreateFromWkt",
            });
        }
        Ok(unsafe { Geometry::with_c_geometry(c_geom, true) })
    }

    /// Creates a geometry by parsing a slice of bytes in
    /// [WKB](https://en.wikipedia.org/wiki/Well-known_text_representation_of_geometry#Well-known_binary)
    /// (Well-Known Binary) format.
    pub fn from_wkb(wkb: &[u8]) -> Result<Geometry> {
        let mut c_geom = null_mut();
        let rv = unsafe {
            gdal_sys::OGR_G_CreateFromWkb(
                wkb.as_ptr() as *const c_void,
                null_mut(),
                &mut c_geom,
                wkb.len() as c_int,
            )
        };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_G_CreateFromWkb",
            });
        }
        Ok(unsafe { Geometry::with_c_geometry(c_geom, true) })
    }

    /// Serialize the geometry as WKT.
    pub fn wkt(&self) -> Result<String> {
        let mut c_wkt = null_mut();
        let rv = unsafe { gdal_sys::OGR_G_ExportToWkt(self.c_geometry, &mut c_wkt) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_G_ExportToWkt",
            });
        }
        let wkt = _string(c_wkt);
        unsafe { gdal_sys::VSIFree(c_wkt as *mut c_void) };
        Ok(wkt)
    }

    /// Serializes the geometry to little-endian WKB.
    pub fn wkb(&self) -> Result<Vec<u8>> {
        let wkb_size = unsafe { gdal_sys::OGR_G_WkbSize(self.c_geometry) as usize };
        // A WKB string explicitly indicates the byte order, so this is not a
        // problem for interoperability.
        let byte_order = gdal_sys::OGRwkbByteOrder::wkbNDR;
        let mut wkb = vec![0; wkb_size];
        let rv = unsafe { gdal_sys::OGR_G_ExportToWkb(self.c_geometry, byte_order, wkb.as_mut_ptr()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_G_ExportToWkb",
            });
        }
        Ok(wkb)
    }

    pub fn geometry_type(&self) -> OGRwkbGeometryType::Type {
        unsafe { gdal_sys::OGR_G_GetGeometryType(self.c_geometry) }
    }

    /// Name of this geometry's type, e.g. `"Polygon"` or `"3D Point"`.
    pub fn geometry_name(&self) -> String {
        geometry_type_to_name(self.geometry_type())
    }

    pub fn is_empty(&self) -> bool {
        unsafe { gdal_sys::OGR_G_IsEmpty(self.c_geometry) == 1 }
    }

    /// Number of direct sub-geometries (rings of a polygon, members of a collection).
    pub fn geometry_count(&self) -> usize {
        let cnt = unsafe { gdal_sys::OGR_G_GetGeometryCount(self.c_geometry) };
        cnt as usize
    }

    pub fn point_count(&self) -> usize {
        let cnt = unsafe { gdal_sys::OGR_G_GetPointCount(self.c_geometry) };
        cnt as usize
    }

    /// Returns the point at `index` as `(x, y, z)`.
    pub fn get_point(&self, index: i32) -> (f64, f64, f64) {
        let mut x: f64 = 0.;
        let mut y: f64 = 0.;
        let mut z: f64 = 0.;
        unsafe { gdal_sys::OGR_G_GetPoint(self.c_geometry, index, &mut x, &mut y, &mut z) };
        (x, y, z)
    }

    pub fn get_point_vec(&self) -> Vec<(f64, f64, f64)> {
        let length = unsafe { gdal_sys::OGR_G_GetPointCount(self.c_geometry) };
        (0..length).map(|i| self.get_point(i)).collect()
    }

    /// Borrows the sub-geometry at position `index`.
    ///
    /// # Safety
    /// The returned value must not outlive `self`.
    pub(crate) unsafe fn _get_geometry(&self, index: usize) -> Geometry {
        let c_geom = gdal_sys::OGR_G_GetGeometryRef(self.c_geometry, index as c_int);
        Geometry::with_c_geometry(c_geom, false)
    }
}

impl Drop for Geometry {
    fn drop(&mut self) {
        if self.owned {
            unsafe { gdal_sys::OGR_G_DestroyGeometry(self.c_geometry) };
        }
    }
}

impl Clone for Geometry {
    fn clone(&self) -> Geometry {
        let c_geometry = unsafe { gdal_sys::OGR_G_Clone(self.c_geometry) };
        unsafe { Geometry::with_c_geometry(c_geometry, true) }
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        unsafe { gdal_sys::OGR_G_Equals(self.c_geometry, other.c_geometry) != 0 }
    }
}

impl Debug for Geometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.wkt() {
            Ok(wkt) => f.write_str(wkt.as_str()),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Returns a human readable name for `ty`.
pub fn geometry_type_to_name(ty: OGRwkbGeometryType::Type) -> String {
    let rv = unsafe { gdal_sys::OGRGeometryTypeToName(ty) };
    // If the type is invalid, OGRGeometryTypeToName returns a valid string anyway.
    _string(rv)
}

/// Returns `ty` without its Z and M dimensions.
pub fn geometry_type_flatten(ty: OGRwkbGeometryType::Type) -> OGRwkbGeometryType::Type {
    unsafe { gdal_sys::OGR_GT_Flatten(ty) }
}

/// Whether a layer declared as `target` can hold a geometry of type `found`.
///
/// Dimensionality is ignored. `wkbUnknown` accepts everything, and a type
/// accepts its OGR subclasses (a `MultiPolygon` is a `GeometryCollection`).
/// A single-part type also accepts its multi-part counterpart: shapefile
/// readers report polygon and arc layers as single-part while returning
/// records with several parts as `MultiPolygon` or `MultiLineString`.
pub fn geometry_type_accepts(
    target: OGRwkbGeometryType::Type,
    found: OGRwkbGeometryType::Type,
) -> bool {
    let target = geometry_type_flatten(target);
    let found = geometry_type_flatten(found);
    if target == OGRwkbGeometryType::wkbUnknown || target == found {
        return true;
    }
    if target == OGRwkbGeometryType::wkbNone {
        return false;
    }
    if unsafe { gdal_sys::OGR_GT_GetCollection(target) } == found {
        return true;
    }
    unsafe { gdal_sys::OGR_GT_IsSubClassOf(found, target) != 0 }
}
