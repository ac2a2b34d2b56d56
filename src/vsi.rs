use std::ffi::c_int;
use std::path::Path;

use gdal_sys::{VSIFree, VSIGetMemFileBuffer, VSIStatBufL, VSIStatExL, VSIUnlink};

use crate::errors::{GdalError, Result};
use crate::utils::{_last_null_pointer_err, _path_to_c_string};

/// `VSI_STAT_EXISTS_FLAG` from `cpl_vsi.h`.
const VSI_STAT_EXISTS_FLAG: c_int = 0x1;

/// Whether anything exists at `path`, on disk or in one of GDAL's virtual
/// file systems (`/vsimem/`, `/vsizip/`, ...).
pub fn path_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
    _path_exists(path.as_ref())
}

fn _path_exists(path: &Path) -> Result<bool> {
    let c_path = _path_to_c_string(path)?;
    let mut stat: VSIStatBufL = unsafe { std::mem::zeroed() };
    let rv = unsafe { VSIStatExL(c_path.as_ptr(), &mut stat, VSI_STAT_EXISTS_FLAG) };
    Ok(rv == 0)
}

/// Unlink a VSIMemFile.
pub fn unlink_mem_file<P: AsRef<Path>>(file_name: P) -> Result<()> {
    _unlink_mem_file(file_name.as_ref())
}

fn _unlink_mem_file(file_name: &Path) -> Result<()> {
    let file_name_c = _path_to_c_string(file_name)?;

    let rv = unsafe { VSIUnlink(file_name_c.as_ptr()) };

    if rv != 0 {
        return Err(GdalError::UnlinkMemFile {
            file_name: file_name.display().to_string(),
        });
    }

    Ok(())
}

/// Copies the bytes of the VSIMemFile with given `file_name`.
/// Takes the ownership and frees the memory of the VSIMemFile.
pub fn get_vsi_mem_file_bytes_owned<P: AsRef<Path>>(file_name: P) -> Result<Vec<u8>> {
    _get_vsi_mem_file_bytes_owned(file_name.as_ref())
}

fn _get_vsi_mem_file_bytes_owned(file_name: &Path) -> Result<Vec<u8>> {
    let file_name = _path_to_c_string(file_name)?;

    let owned_bytes = unsafe {
        let mut length: u64 = 0;
        let bytes = VSIGetMemFileBuffer(file_name.as_ptr(), &mut length, true as i32);

        if bytes.is_null() {
            return Err(_last_null_pointer_err("VSIGetMemFileBuffer"));
        }

        let vec = std::slice::from_raw_parts(bytes, length as usize).to_vec();

        VSIFree(bytes.cast::<std::ffi::c_void>());

        vec
    };

    Ok(owned_bytes)
}
