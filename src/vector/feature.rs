use std::cell::OnceCell;
use std::ffi::{c_float, c_int, CString};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike};
use gdal_sys::{self, OGRErr, OGRFeatureH, OGRFieldType};

use crate::errors::*;
use crate::utils::{_last_null_pointer_err, _string};
use crate::vector::{Defn, Geometry};

/// OGR Feature
///
/// Features returned by a layer and features created with [`Feature::new`]
/// are owned and destroyed on drop.
pub struct Feature<'a> {
    defn: &'a Defn,
    c_feature: OGRFeatureH,
    geometry: OnceCell<Option<Geometry>>,
}

impl<'a> Feature<'a> {
    /// Creates an empty feature following the schema `defn`.
    pub fn new(defn: &'a Defn) -> Result<Feature<'a>> {
        let c_feature = unsafe { gdal_sys::OGR_F_Create(defn.c_defn()) };
        if c_feature.is_null() {
            return Err(_last_null_pointer_err("OGR_F_Create"));
        };
        Ok(Feature {
            defn,
            c_feature,
            geometry: OnceCell::new(),
        })
    }

    /// Creates a new Feature by wrapping a C pointer and a Defn
    ///
    /// # Safety
    /// This method operates on a raw C pointer. The feature takes ownership of it.
    pub unsafe fn from_c_feature(defn: &'a Defn, c_feature: OGRFeatureH) -> Feature<'a> {
        Feature {
            defn,
            c_feature,
            geometry: OnceCell::new(),
        }
    }

    /// Returns the C wrapped pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_feature(&self) -> OGRFeatureH {
        self.c_feature
    }

    pub fn defn(&self) -> &Defn {
        self.defn
    }

    /// Returns the feature identifier, or `None` if none has been assigned.
    pub fn fid(&self) -> Option<u64> {
        let rv = unsafe { gdal_sys::OGR_F_GetFID(self.c_feature) };
        if rv < 0 {
            return None;
        }
        Some(rv as u64)
    }

    fn check_field_index(&self, idx: usize, method_name: &'static str) -> Result<c_int> {
        if idx >= self.defn.field_count() {
            return Err(GdalError::InvalidFieldIndex {
                index: idx,
                method_name,
            });
        }
        Ok(idx as c_int)
    }

    /// Whether the field at `idx` holds a value (neither unset nor null).
    pub fn is_field_set(&self, idx: usize) -> Result<bool> {
        let idx = self.check_field_index(idx, "OGR_F_IsFieldSetAndNotNull")?;
        Ok(unsafe { gdal_sys::OGR_F_IsFieldSetAndNotNull(self.c_feature, idx) } != 0)
    }

    /// Get the value of a named field. Unset and null fields yield `Ok(None)`.
    pub fn field(&self, name: &str) -> Result<Option<FieldValue>> {
        let c_name = CString::new(name)?;
        let idx = unsafe { gdal_sys::OGR_F_GetFieldIndex(self.c_feature, c_name.as_ptr()) };
        if idx < 0 {
            return Err(GdalError::InvalidFieldName {
                field_name: name.to_string(),
                method_name: "OGR_F_GetFieldIndex",
            });
        }
        self.field_by_index(idx as usize)
    }

    /// Get the value of the field at `idx`, typed after the field definition.
    pub fn field_by_index(&self, idx: usize) -> Result<Option<FieldValue>> {
        if !self.is_field_set(idx)? {
            return Ok(None);
        }
        let c_idx = idx as c_int;
        let field_type = self.defn.field(idx)?.field_type();
        let value = match field_type {
            OGRFieldType::OFTInteger => {
                let rv = unsafe { gdal_sys::OGR_F_GetFieldAsInteger(self.c_feature, c_idx) };
                FieldValue::IntegerValue(rv)
            }
            OGRFieldType::OFTInteger64 => {
                let rv = unsafe { gdal_sys::OGR_F_GetFieldAsInteger64(self.c_feature, c_idx) };
                FieldValue::Integer64Value(rv)
            }
            OGRFieldType::OFTReal => {
                let rv = unsafe { gdal_sys::OGR_F_GetFieldAsDouble(self.c_feature, c_idx) };
                FieldValue::RealValue(rv)
            }
            // OGR parses time strings back on write, so they travel as text.
            OGRFieldType::OFTString | OGRFieldType::OFTTime => {
                FieldValue::StringValue(self.field_as_string_unchecked(c_idx))
            }
            OGRFieldType::OFTDate => FieldValue::DateValue(self.field_as_datetime(c_idx)?.date_naive()),
            OGRFieldType::OFTDateTime => FieldValue::DateTimeValue(self.field_as_datetime(c_idx)?),
            _ => {
                return Err(GdalError::UnhandledFieldType {
                    field_type,
                    method_name: "OGR_Fld_GetType",
                })
            }
        };
        Ok(Some(value))
    }

    /// The field at `idx` rendered as text by OGR. `None` when unset or null.
    pub fn field_as_string(&self, idx: usize) -> Result<Option<String>> {
        if !self.is_field_set(idx)? {
            return Ok(None);
        }
        Ok(Some(self.field_as_string_unchecked(idx as c_int)))
    }

    /// The field at `idx` as a 64 bit integer. `None` when unset or null.
    pub fn field_as_integer64(&self, idx: usize) -> Result<Option<i64>> {
        if !self.is_field_set(idx)? {
            return Ok(None);
        }
        let rv = unsafe { gdal_sys::OGR_F_GetFieldAsInteger64(self.c_feature, idx as c_int) };
        Ok(Some(rv))
    }

    /// The field at `idx` as a double. `None` when unset or null.
    pub fn field_as_double(&self, idx: usize) -> Result<Option<f64>> {
        if !self.is_field_set(idx)? {
            return Ok(None);
        }
        let rv = unsafe { gdal_sys::OGR_F_GetFieldAsDouble(self.c_feature, idx as c_int) };
        Ok(Some(rv))
    }

    fn field_as_string_unchecked(&self, idx: c_int) -> String {
        let rv = unsafe { gdal_sys::OGR_F_GetFieldAsString(self.c_feature, idx) };
        _string(rv)
    }

    fn field_as_datetime(&self, idx: c_int) -> Result<DateTime<FixedOffset>> {
        let mut year: c_int = 0;
        let mut month: c_int = 0;
        let mut day: c_int = 0;
        let mut hour: c_int = 0;
        let mut minute: c_int = 0;
        let mut second: c_float = 0.;
        let mut tzflag: c_int = 0;

        let success = unsafe {
            gdal_sys::OGR_F_GetFieldAsDateTimeEx(
                self.c_feature,
                idx,
                &mut year,
                &mut month,
                &mut day,
                &mut hour,
                &mut minute,
                &mut second,
                &mut tzflag,
            )
        };
        if success == 0 {
            return Err(GdalError::OgrError {
                err: OGRErr::OGRERR_FAILURE,
                method_name: "OGR_F_GetFieldAsDateTimeEx",
            });
        }

        // 0 is "unknown", 1 is "local time" and 100 is GMT. Above 100 the
        // offset is counted in quarter hours, see ogrutils.cpp.
        let tzoffset_secs = if tzflag <= 100 {
            0
        } else {
            (tzflag - 100) * 15 * 60
        };
        let whole_seconds = second.trunc() as u32;
        let millis = (((second - second.trunc()) * 1000.).round() as u32).min(999);

        let naive = NaiveDate::from_ymd_opt(year, month as u32, day as u32)
            .and_then(|date| date.and_hms_milli_opt(hour as u32, minute as u32, whole_seconds, millis));
        FixedOffset::east_opt(tzoffset_secs)
            .zip(naive)
            .and_then(|(offset, naive)| offset.from_local_datetime(&naive).single())
            .ok_or_else(|| {
                GdalError::BadArgument(format!(
                    "invalid date/time {year}-{month}-{day} {hour}:{minute}:{second} (tz flag {tzflag})"
                ))
            })
    }

    /// Set the field at `idx` to `value`.
    pub fn set_field_by_index(&mut self, idx: usize, value: &FieldValue) -> Result<()> {
        let idx = self.check_field_index(idx, "OGR_F_SetField")?;
        match value {
            FieldValue::IntegerValue(value) => unsafe {
                gdal_sys::OGR_F_SetFieldInteger(self.c_feature, idx, *value as c_int)
            },
            FieldValue::Integer64Value(value) => unsafe {
                gdal_sys::OGR_F_SetFieldInteger64(self.c_feature, idx, *value)
            },
            FieldValue::RealValue(value) => unsafe {
                gdal_sys::OGR_F_SetFieldDouble(self.c_feature, idx, *value)
            },
            FieldValue::StringValue(value) => {
                let c_value = CString::new(value.as_str())?;
                unsafe { gdal_sys::OGR_F_SetFieldString(self.c_feature, idx, c_value.as_ptr()) }
            }
            FieldValue::DateValue(value) => unsafe {
                gdal_sys::OGR_F_SetFieldDateTimeEx(
                    self.c_feature,
                    idx,
                    value.year() as c_int,
                    value.month() as c_int,
                    value.day() as c_int,
                    0,
                    0,
                    0.,
                    0,
                )
            },
            FieldValue::DateTimeValue(value) => {
                let tzflag = 100 + value.offset().local_minus_utc() / (15 * 60);
                let second = value.second() as c_float
                    + (value.nanosecond() / 1_000_000) as c_float / 1000.;
                unsafe {
                    gdal_sys::OGR_F_SetFieldDateTimeEx(
                        self.c_feature,
                        idx,
                        value.year() as c_int,
                        value.month() as c_int,
                        value.day() as c_int,
                        value.hour() as c_int,
                        value.minute() as c_int,
                        second,
                        tzflag as c_int,
                    )
                }
            }
        }
        Ok(())
    }

    /// Get the feature's geometry, if it has one.
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry
            .get_or_init(|| {
                let c_geom = unsafe { gdal_sys::OGR_F_GetGeometryRef(self.c_feature) };
                if c_geom.is_null() {
                    None
                } else {
                    Some(unsafe { Geometry::with_c_geometry(c_geom, false) })
                }
            })
            .as_ref()
    }

    /// Set the feature's geometry to a copy of `geom`.
    pub fn set_geometry(&mut self, geom: &Geometry) -> Result<()> {
        // drop the borrowed view before OGR destroys the geometry it points to
        self.geometry.take();
        let rv = unsafe { gdal_sys::OGR_F_SetGeometry(self.c_feature, geom.c_geometry()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(GdalError::OgrError {
                err: rv,
                method_name: "OGR_F_SetGeometry",
            });
        }
        Ok(())
    }
}

impl Drop for Feature<'_> {
    fn drop(&mut self) {
        self.geometry.take();
        unsafe {
            gdal_sys::OGR_F_Destroy(self.c_feature);
        }
    }
}

/// Value of a single attribute field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    IntegerValue(i32),
    Integer64Value(i64),
    StringValue(String),
    RealValue(f64),
    DateValue(NaiveDate),
    DateTimeValue(DateTime<FixedOffset>),
}

impl FieldValue {
    /// Interpret the value as `String`. Returns `None` for other variants.
    pub fn into_string(self) -> Option<String> {
        match self {
            FieldValue::StringValue(rv) => Some(rv),
            _ => None,
        }
    }

    /// Interpret the value as `f64`. Integers are widened.
    pub fn into_real(self) -> Option<f64> {
        match self {
            FieldValue::RealValue(rv) => Some(rv),
            FieldValue::IntegerValue(rv) => Some(rv as f64),
            FieldValue::Integer64Value(rv) => Some(rv as f64),
            _ => None,
        }
    }

    /// Interpret the value as `i32`.
    pub fn into_int(self) -> Option<i32> {
        match self {
            FieldValue::IntegerValue(rv) => Some(rv),
            FieldValue::Integer64Value(rv) => i32::try_from(rv).ok(),
            _ => None,
        }
    }

    /// Interpret the value as `i64`.
    pub fn into_int64(self) -> Option<i64> {
        match self {
            FieldValue::IntegerValue(rv) => Some(rv as i64),
            FieldValue::Integer64Value(rv) => Some(rv),
            _ => None,
        }
    }
}
