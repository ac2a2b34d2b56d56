use std::ffi::{c_int, CString};

use gdal_sys::{self, OGRFeatureDefnH, OGRFieldDefnH, OGRFieldType, OGRwkbGeometryType};

use crate::errors::*;
use crate::utils::_string;

/// Layer definition
///
/// Defines the fields available for features in a layer. The definition is
/// owned by its layer.
#[derive(Debug)]
pub struct Defn {
    c_defn: OGRFeatureDefnH,
}

impl Defn {
    /// Creates a new Defn by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer
    pub unsafe fn from_c_defn(c_defn: OGRFeatureDefnH) -> Defn {
        Defn { c_defn }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_defn(&self) -> OGRFeatureDefnH {
        self.c_defn
    }

    /// Number of attribute fields.
    pub fn field_count(&self) -> usize {
        let count = unsafe { gdal_sys::OGR_FD_GetFieldCount(self.c_defn) };
        count as usize
    }

    /// Iterate over the field schema of this layer.
    pub fn fields(&self) -> FieldIterator {
        FieldIterator {
            defn: self,
            next_id: 0,
            total: self.field_count(),
        }
    }

    /// Position of the field named `name`, matched case-insensitively as OGR does.
    pub fn field_index(&self, name: &str) -> Result<Option<usize>> {
        let c_name = CString::new(name)?;
        let idx = unsafe { gdal_sys::OGR_FD_GetFieldIndex(self.c_defn, c_name.as_ptr()) };
        Ok(usize::try_from(idx).ok())
    }

    /// The field at position `idx`.
    pub fn field(&self, idx: usize) -> Result<Field> {
        if idx >= self.field_count() {
            return Err(GdalError::InvalidFieldIndex {
                index: idx,
                method_name: "OGR_FD_GetFieldDefn",
            });
        }
        let c_field_defn = unsafe { gdal_sys::OGR_FD_GetFieldDefn(self.c_defn, idx as c_int) };
        Ok(Field {
            _defn: self,
            c_field_defn,
            index: idx,
        })
    }

    /// The field named `name`.
    pub fn field_by_name(&self, name: &str) -> Result<Field> {
        match self.field_index(name)? {
            Some(idx) => self.field(idx),
            None => Err(GdalError::InvalidFieldName {
                field_name: name.to_string(),
                method_name: "OGR_FD_GetFieldIndex",
            }),
        }
    }

    /// Get the geometry type of the first geometry field
    pub fn geometry_type(&self) -> OGRwkbGeometryType::Type {
        unsafe { gdal_sys::OGR_FD_GetGeomType(self.c_defn) }
    }
}

pub struct FieldIterator<'a> {
    defn: &'a Defn,
    next_id: usize,
    total: usize,
}

impl<'a> Iterator for FieldIterator<'a> {
    type Item = Field<'a>;

    #[inline]
    fn next(&mut self) -> Option<Field<'a>> {
        if self.next_id == self.total {
            return None;
        }
        let field = Field {
            _defn: self.defn,
            c_field_defn: unsafe {
                gdal_sys::OGR_FD_GetFieldDefn(self.defn.c_defn, self.next_id as c_int)
            },
            index: self.next_id,
        };
        self.next_id += 1;
        Some(field)
    }
}

/// One attribute field of a [`Defn`].
pub struct Field<'a> {
    _defn: &'a Defn,
    c_field_defn: OGRFieldDefnH,
    index: usize,
}

impl<'a> Field<'a> {
    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_field_defn(&self) -> OGRFieldDefnH {
        self.c_field_defn
    }

    /// Position of this field in the layer schema.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the name of this field.
    pub fn name(&self) -> String {
        let rv = unsafe { gdal_sys::OGR_Fld_GetNameRef(self.c_field_defn) };
        _string(rv)
    }

    /// Get the data type of this field.
    pub fn field_type(&self) -> OGRFieldType::Type {
        unsafe { gdal_sys::OGR_Fld_GetType(self.c_field_defn) }
    }

    /// Get the formatting width for this field.
    ///
    /// Zero means no specified width.
    pub fn width(&self) -> i32 {
        unsafe { gdal_sys::OGR_Fld_GetWidth(self.c_field_defn) }
    }

    /// Get the formatting precision for this field.
    ///
    /// This should normally be zero for fields of types other than Real.
    pub fn precision(&self) -> i32 {
        unsafe { gdal_sys::OGR_Fld_GetPrecision(self.c_field_defn) }
    }
}

/// Returns a human readable name for `field_type`, e.g. `"Integer64"`.
pub fn field_type_to_name(field_type: OGRFieldType::Type) -> String {
    let rv = unsafe { gdal_sys::OGR_GetFieldTypeName(field_type) };
    _string(rv)
}
