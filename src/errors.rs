use std::ffi::{c_int, NulError};
use std::str::Utf8Error;
use thiserror::Error;

use gdal_sys::{CPLErr, OGRErr, OGRFieldType, OGRwkbGeometryType};

pub type Result<T> = std::result::Result<T, GdalError>;

#[derive(Clone, Debug, Error)]
pub enum GdalError {
    #[error("FfiNulError")]
    FfiNulError(#[from] NulError),
    #[error("StrUtf8Error")]
    StrUtf8Error(#[from] Utf8Error),
    #[error("CPL error class: '{class:?}', error number: '{number}', error msg: '{msg}'")]
    CplError {
        class: CPLErr::Type,
        number: c_int,
        msg: String,
    },
    #[error("GDAL method '{method_name}' returned a NULL pointer. Error msg: '{msg}'")]
    NullPointer {
        method_name: &'static str,
        msg: String,
    },
    #[error("OGR method '{method_name}' returned error: '{err:?}'")]
    OgrError {
        err: OGRErr::Type,
        method_name: &'static str,
    },
    #[error("Unhandled type '{field_type:?}' on OGR method {method_name}")]
    UnhandledFieldType {
        field_type: OGRFieldType::Type,
        method_name: &'static str,
    },
    #[error("Invalid field name '{field_name}' used on method {method_name}")]
    InvalidFieldName {
        field_name: String,
        method_name: &'static str,
    },
    #[error("Invalid field index {index} used on method {method_name}")]
    InvalidFieldIndex {
        index: usize,
        method_name: &'static str,
    },
    #[error("Unsupported GDAL geometry type: {0}")]
    UnsupportedGdalGeometryType(OGRwkbGeometryType::Type),
    #[error("Unable to unlink mem file: {file_name}")]
    UnlinkMemFile { file_name: String },
    #[error("Bad argument: {0}")]
    BadArgument(String),
}

/// A wrapper for [`CPLErr::Type`] that reflects it as an enum
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(C)]
pub enum CplErrType {
    #[default]
    None = 0,
    Debug = 1,
    Warning = 2,
    Failure = 3,
    Fatal = 4,
}

impl From<CPLErr::Type> for CplErrType {
    fn from(error_type: CPLErr::Type) -> Self {
        if error_type > 4 {
            return Self::None; // fallback type, should not happen
        }

        unsafe { std::mem::transmute(error_type) }
    }
}

impl From<CplErrType> for log::Level {
    fn from(error_type: CplErrType) -> Self {
        match error_type {
            CplErrType::None | CplErrType::Debug => log::Level::Debug,
            CplErrType::Warning => log::Level::Warn,
            CplErrType::Failure | CplErrType::Fatal => log::Level::Error,
        }
    }
}
