use gdal_sys::{self, CPLErr};
use std::ffi::{c_char, CStr, CString};
use std::path::Path;

use crate::errors::*;

pub fn _string(raw_ptr: *const c_char) -> String {
    let c_str = unsafe { CStr::from_ptr(raw_ptr) };
    c_str.to_string_lossy().into_owned()
}

/// Like [`_string`], but maps a NULL pointer to `None`.
pub fn _opt_string(raw_ptr: *const c_char) -> Option<String> {
    if raw_ptr.is_null() {
        None
    } else {
        Some(_string(raw_ptr))
    }
}

pub fn _last_cpl_err(cpl_err_class: CPLErr::Type) -> GdalError {
    let last_err_no = unsafe { gdal_sys::CPLGetLastErrorNo() };
    let last_err_msg = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    unsafe { gdal_sys::CPLErrorReset() };
    GdalError::CplError {
        class: cpl_err_class,
        number: last_err_no,
        msg: last_err_msg,
    }
}

pub fn _last_null_pointer_err(method_name: &'static str) -> GdalError {
    let last_err_msg = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    unsafe { gdal_sys::CPLErrorReset() };
    GdalError::NullPointer {
        method_name,
        msg: last_err_msg,
    }
}

pub fn _path_to_c_string(path: &Path) -> Result<CString> {
    let path_str = path.to_string_lossy();
    CString::new(path_str.as_ref()).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_with_nul_is_rejected() {
        assert!(_path_to_c_string(Path::new("bad\0path.shp")).is_err());
        assert_eq!(
            _path_to_c_string(Path::new("/tmp/out.shp"))
                .unwrap()
                .to_str()
                .unwrap(),
            "/tmp/out.shp"
        );
    }

    #[test]
    fn test_opt_string_null() {
        assert_eq!(_opt_string(std::ptr::null()), None);
        let s = CString::new("EPSG").unwrap();
        assert_eq!(_opt_string(s.as_ptr()).as_deref(), Some("EPSG"));
    }
}
