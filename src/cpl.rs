//! GDAL Common Portability Library string lists.
//!
//! Creation options, open options and driver allow-lists are all handed to
//! GDAL as a null-terminated array of null-terminated strings. [`CslStringList`]
//! owns such an array and frees it on drop.

use std::ffi::{c_int, CString};
use std::fmt::{Debug, Formatter};
use std::ptr;

use gdal_sys::{CSLAddString, CSLCount, CSLDestroy, CSLFetchNameValue, CSLGetField, CSLSetNameValue};
use std::ffi::c_char;

use crate::errors::{GdalError, Result};
use crate::utils::_string;

/// Wraps a [`gdal_sys::CSLConstList`] (a.k.a. `char **papszStrList`).
///
/// See the [`CSL*` GDAL functions](https://gdal.org/api/cpl.html#cpl-string-h) for more details.
pub struct CslStringList {
    list_ptr: *mut *mut c_char,
}

impl CslStringList {
    /// Creates an empty GDAL string list.
    pub fn new() -> Self {
        Self {
            list_ptr: ptr::null_mut(),
        }
    }

    /// Builds a list of `NAME=VALUE` entries, as used for creation options.
    pub fn from_name_values<K, V>(pairs: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut list = Self::new();
        for (name, value) in pairs {
            list.set_name_value(name.as_ref(), value.as_ref())?;
        }
        Ok(list)
    }

    /// Builds a list of plain strings, as used for driver allow-lists and open options.
    pub fn from_strings<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut list = Self::new();
        for entry in entries {
            list.add_string(entry.as_ref())?;
        }
        Ok(list)
    }

    /// Assigns `value` to `name`.
    ///
    /// Overwrites duplicate `name`s. Fails if `name` has characters other than
    /// ASCII alphanumerics and `_`, or if `value` contains a line break.
    pub fn set_name_value(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GdalError::BadArgument(format!(
                "Invalid characters in name: '{name}'"
            )));
        }
        if value.contains(['\n', '\r']) {
            return Err(GdalError::BadArgument(format!(
                "Invalid characters in value: '{value}'"
            )));
        }
        let psz_name = CString::new(name)?;
        let psz_value = CString::new(value)?;

        unsafe {
            self.list_ptr = CSLSetNameValue(self.list_ptr, psz_name.as_ptr(), psz_value.as_ptr());
        }

        Ok(())
    }

    /// Appends `value` as a new entry.
    pub fn add_string(&mut self, value: &str) -> Result<()> {
        let psz_value = CString::new(value)?;
        unsafe {
            self.list_ptr = CSLAddString(self.list_ptr, psz_value.as_ptr());
        }
        Ok(())
    }

    /// Looks up the value corresponding to `key`.
    pub fn fetch_name_value(&self, key: &str) -> Result<Option<String>> {
        let key = CString::new(key)?;
        let c_value = unsafe { CSLFetchNameValue(self.as_ptr(), key.as_ptr()) };
        let value = if c_value.is_null() {
            None
        } else {
            Some(_string(c_value))
        };
        Ok(value)
    }

    /// Determine the number of entries in the list.
    pub fn len(&self) -> usize {
        (unsafe { CSLCount(self.as_ptr()) }) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw entries, in insertion order.
    pub fn entries(&self) -> Vec<String> {
        (0..self.len())
            .map(|idx| _string(unsafe { CSLGetField(self.as_ptr(), idx as c_int) }))
            .collect()
    }

    /// Get the raw pointer to the underlying data.
    pub fn as_ptr(&self) -> gdal_sys::CSLConstList {
        self.list_ptr
    }

    /// Pointer suitable for optional GDAL list arguments: NULL when the list is empty.
    pub(crate) fn as_ptr_or_null(&self) -> gdal_sys::CSLConstList {
        if self.is_empty() {
            ptr::null_mut()
        } else {
            self.list_ptr
        }
    }
}

impl Drop for CslStringList {
    fn drop(&mut self) {
        unsafe { CSLDestroy(self.list_ptr) }
    }
}

impl Default for CslStringList {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CslStringList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::cpl::CslStringList;
    use crate::errors::Result;

    fn fixture() -> Result<CslStringList> {
        CslStringList::from_name_values(&[("ENCODING", "UTF-8"), ("SPATIAL_INDEX", "YES")])
    }

    #[test]
    fn basic_list() -> Result<()> {
        let l = fixture()?;
        assert!(matches!(l.fetch_name_value("ENCODING"), Ok(Some(s)) if s == "UTF-8"));
        assert!(matches!(l.fetch_name_value("FOO"), Ok(None)));
        assert_eq!(l.len(), 2);
        Ok(())
    }

    #[test]
    fn can_be_empty() -> Result<()> {
        let l = CslStringList::new();
        assert!(l.is_empty());
        assert!(l.as_ptr_or_null().is_null());

        let l = fixture()?;
        assert!(!l.is_empty());
        assert!(!l.as_ptr_or_null().is_null());
        Ok(())
    }

    #[test]
    fn plain_strings_keep_order() -> Result<()> {
        let l = CslStringList::from_strings(&["GeoJSON", "ESRI Shapefile"])?;
        assert_eq!(l.entries(), vec!["GeoJSON", "ESRI Shapefile"]);
        Ok(())
    }

    #[test]
    fn invalid_keys() -> Result<()> {
        let mut l = fixture()?;
        assert!(l.set_name_value("l==t", "2").is_err());
        assert!(l.set_name_value("", "2").is_err());
        assert!(l.set_name_value("foo", "2\n4\r5").is_err());
        Ok(())
    }

    #[test]
    fn debug_fmt() -> Result<()> {
        let s = format!("{:?}", fixture()?);
        assert!(s.contains("ENCODING=UTF-8"));
        assert!(s.contains("SPATIAL_INDEX=YES"));
        Ok(())
    }
}
