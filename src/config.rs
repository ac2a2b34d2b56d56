//! GDAL configuration options and diagnostics
//!
//! Options set with the functions in this module are **thread local**: they
//! apply to GDAL calls made from the current thread only and override both
//! global options and environment variables. [`ThreadLocalConfigScope`] sets
//! a batch of options and puts the previous values back when dropped.
//!
//! ```rust,no_run
//! use ogr_subset::config::*;
//!
//! {
//!     let _scope = ThreadLocalConfigScope::new(&[("SHAPE_ENCODING", "UTF-8")]).unwrap();
//!     assert_eq!(
//!         get_thread_local_config_option("SHAPE_ENCODING").unwrap().as_deref(),
//!         Some("UTF-8")
//!     );
//! }
//! assert_eq!(get_thread_local_config_option("SHAPE_ENCODING").unwrap(), None);
//! ```
//!
//! Refer to [GDAL `ConfigOptions`](https://gdal.org/user/configoptions.html) for
//! a full list of options.
//!
//! ## Diagnostics
//!
//! GDAL reports warnings and errors through CPL error handlers. A
//! [`LogErrorScope`] forwards them to the [`log`] facade under the
//! [`GDAL_LOG_TARGET`] target while it is alive. [`set_error_handler`]
//! installs a process-wide callback instead.

use std::ffi::{c_char, c_void, CString};
use std::marker::PhantomData;
use std::ptr;
use std::sync::Mutex;

use gdal_sys::{CPLErr, CPLErrorNum, CPLGetErrorHandlerUserData};

use crate::errors::{CplErrType, Result};
use crate::utils::{_opt_string, _string};

/// `log` target of messages forwarded from GDAL.
pub const GDAL_LOG_TARGET: &str = "ogr_subset::gdal";

/// Set a GDAL configuration option for the current thread.
pub fn set_thread_local_config_option(key: &str, value: &str) -> Result<()> {
    let c_key = CString::new(key)?;
    let c_val = CString::new(value)?;
    unsafe {
        gdal_sys::CPLSetThreadLocalConfigOption(c_key.as_ptr(), c_val.as_ptr());
    };
    Ok(())
}

/// Value of a GDAL configuration option set for the current thread, if any.
pub fn get_thread_local_config_option(key: &str) -> Result<Option<String>> {
    let c_key = CString::new(key)?;
    let rv = unsafe { gdal_sys::CPLGetThreadLocalConfigOption(c_key.as_ptr(), ptr::null()) };
    Ok(_opt_string(rv))
}

/// Clear a GDAL configuration option for the current thread.
pub fn clear_thread_local_config_option(key: &str) -> Result<()> {
    let c_key = CString::new(key)?;
    unsafe {
        gdal_sys::CPLSetThreadLocalConfigOption(c_key.as_ptr(), ptr::null());
    };
    Ok(())
}

/// Thread-local configuration options that are reverted on drop.
///
/// Options that were unset before the scope are cleared again; the others get
/// back their previous value.
#[derive(Debug)]
pub struct ThreadLocalConfigScope {
    previous: Vec<(String, Option<String>)>,
    // thread-local state, so keep the guard on this thread
    _private: PhantomData<*mut c_void>,
}

impl ThreadLocalConfigScope {
    pub fn new<K, V>(options: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut scope = ThreadLocalConfigScope {
            previous: Vec::with_capacity(options.len()),
            _private: PhantomData,
        };
        // on error, dropping `scope` restores what was already set
        for (key, value) in options {
            let key = key.as_ref();
            let previous = get_thread_local_config_option(key)?;
            set_thread_local_config_option(key, value.as_ref())?;
            scope.previous.push((key.to_string(), previous));
        }
        Ok(scope)
    }

    /// Number of options set by this scope.
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

impl Drop for ThreadLocalConfigScope {
    fn drop(&mut self) {
        // reverse order, so keys given twice end up at their original value
        for (key, previous) in self.previous.drain(..).rev() {
            let restored = match previous {
                Some(value) => set_thread_local_config_option(&key, &value),
                None => clear_thread_local_config_option(&key),
            };
            if let Err(e) = restored {
                log::warn!("unable to restore GDAL config option {key}: {e}");
            }
        }
    }
}

unsafe extern "C" fn log_error_handler(
    error_type: CPLErr::Type,
    error_num: CPLErrorNum,
    error_msg_ptr: *const c_char,
) {
    let level = log::Level::from(CplErrType::from(error_type));
    let error_msg = _string(error_msg_ptr);
    log::log!(target: GDAL_LOG_TARGET, level, "{error_msg} (CPLE {error_num})");
}

/// Forwards GDAL diagnostics raised on the current thread to [`log`] while alive.
///
/// Debug messages map to `debug`, warnings to `warn`, failures to `error`.
/// Scopes nest: dropping one reinstates whatever handler was active before.
pub struct LogErrorScope {
    // the handler stack is per thread
    _private: PhantomData<*mut c_void>,
}

impl LogErrorScope {
    pub fn new() -> Self {
        unsafe { gdal_sys::CPLPushErrorHandler(Some(log_error_handler)) };
        LogErrorScope {
            _private: PhantomData,
        }
    }
}

impl Default for LogErrorScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogErrorScope {
    fn drop(&mut self) {
        unsafe { gdal_sys::CPLPopErrorHandler() };
    }
}

type ErrorCallbackType = dyn FnMut(CplErrType, i32, &str) + 'static + Send;
// Boxed twice: the outer box pins the callback while it is moved in and out
// of the mutex, the inner one makes it a thin pointer GDAL can carry as user data.
type PinnedErrorCallback = Box<Box<ErrorCallbackType>>;

/// The callback GDAL currently holds a pointer to
static ERROR_CALLBACK: Mutex<Option<PinnedErrorCallback>> = Mutex::new(None);

/// Install `callback` as the process-wide GDAL error handler.
///
/// Handlers pushed on a thread, such as [`LogErrorScope`], take precedence on
/// that thread. The callback may be invoked from any thread.
pub fn set_error_handler<F>(callback: F)
where
    F: FnMut(CplErrType, i32, &str) + 'static + Send + Sync,
{
    unsafe extern "C" fn error_handler(
        error_type: CPLErr::Type,
        error_num: CPLErrorNum,
        error_msg_ptr: *const c_char,
    ) {
        let error_msg = _string(error_msg_ptr);
        let error_type: CplErrType = error_type.into();

        let callback_raw = CPLGetErrorHandlerUserData();
        let callback: &mut Box<ErrorCallbackType> = &mut *(callback_raw as *mut Box<_>);

        callback(error_type, error_num, &error_msg);
    }

    let mut callback: PinnedErrorCallback = Box::new(Box::new(callback));
    let callback_ref: &mut Box<ErrorCallbackType> = callback.as_mut();

    // a poisoned lock still guards a valid callback
    let mut callback_lock = ERROR_CALLBACK
        .lock()
        .unwrap_or_else(|poison_error| poison_error.into_inner());

    unsafe {
        gdal_sys::CPLSetErrorHandlerEx(Some(error_handler), callback_ref as *mut _ as *mut c_void);
    };

    // GDAL now points into `callback`, keep it alive until it is replaced
    callback_lock.replace(callback);
}

/// Reinstate GDAL's default error handler and drop the installed callback.
pub fn remove_error_handler() {
    let mut callback_lock = ERROR_CALLBACK
        .lock()
        .unwrap_or_else(|poison_error| poison_error.into_inner());

    unsafe {
        gdal_sys::CPLSetErrorHandler(None);
    };

    callback_lock.take();
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    thread_local! {
        static CAPTURED: RefCell<Vec<(log::Level, String, String)>> = RefCell::new(Vec::new());
    }

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED.with(|captured| {
                captured.borrow_mut().push((
                    record.level(),
                    record.target().to_string(),
                    record.args().to_string(),
                ))
            });
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    fn emit_cpl_error(class: CPLErr::Type, msg: &str) {
        let c_fmt = CString::new("%s").unwrap();
        let c_msg = CString::new(msg).unwrap();
        unsafe { gdal_sys::CPLError(class, 1, c_fmt.as_ptr(), c_msg.as_ptr()) };
        unsafe { gdal_sys::CPLErrorReset() };
    }

    #[test]
    fn test_thread_local_options() {
        assert!(set_thread_local_config_option("OGR_SUBSET_TEST_A", "128").is_ok());
        assert_eq!(
            get_thread_local_config_option("OGR_SUBSET_TEST_A").unwrap(),
            Some("128".to_string())
        );
        assert!(clear_thread_local_config_option("OGR_SUBSET_TEST_A").is_ok());
        assert_eq!(
            get_thread_local_config_option("OGR_SUBSET_TEST_A").unwrap(),
            None
        );
        assert_eq!(
            get_thread_local_config_option("NON_EXISTANT_OPTION").unwrap(),
            None
        );
    }

    #[test]
    fn test_option_with_embedded_nul() {
        assert!(set_thread_local_config_option("f\0oo", "valid").is_err());
        assert!(set_thread_local_config_option("foo", "in\0valid").is_err());
        assert!(get_thread_local_config_option("f\0oo").is_err());
    }

    #[test]
    fn test_scope_restores_previous_values() {
        set_thread_local_config_option("OGR_SUBSET_TEST_B", "before").unwrap();
        {
            let scope = ThreadLocalConfigScope::new(&[
                ("OGR_SUBSET_TEST_B", "inside"),
                ("OGR_SUBSET_TEST_C", "new"),
            ])
            .unwrap();
            assert_eq!(scope.len(), 2);
            assert_eq!(
                get_thread_local_config_option("OGR_SUBSET_TEST_B").unwrap(),
                Some("inside".to_string())
            );
            assert_eq!(
                get_thread_local_config_option("OGR_SUBSET_TEST_C").unwrap(),
                Some("new".to_string())
            );
        }
        assert_eq!(
            get_thread_local_config_option("OGR_SUBSET_TEST_B").unwrap(),
            Some("before".to_string())
        );
        assert_eq!(
            get_thread_local_config_option("OGR_SUBSET_TEST_C").unwrap(),
            None
        );
        clear_thread_local_config_option("OGR_SUBSET_TEST_B").unwrap();
    }

    #[test]
    fn test_scope_with_duplicate_keys() {
        {
            let _scope = ThreadLocalConfigScope::new(&[
                ("OGR_SUBSET_TEST_D", "one"),
                ("OGR_SUBSET_TEST_D", "two"),
            ])
            .unwrap();
            assert_eq!(
                get_thread_local_config_option("OGR_SUBSET_TEST_D").unwrap(),
                Some("two".to_string())
            );
        }
        assert_eq!(
            get_thread_local_config_option("OGR_SUBSET_TEST_D").unwrap(),
            None
        );
    }

    #[test]
    fn test_failed_scope_rolls_back() {
        let result = ThreadLocalConfigScope::new(&[
            ("OGR_SUBSET_TEST_E", "set"),
            ("BAD\0KEY", "value"),
        ]);
        assert!(result.is_err());
        assert_eq!(
            get_thread_local_config_option("OGR_SUBSET_TEST_E").unwrap(),
            None
        );
    }

    #[test]
    fn test_log_error_scope_forwards_to_log() {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        {
            let _scope = LogErrorScope::new();
            emit_cpl_error(CPLErr::CE_Warning, "forwarded warning");
            emit_cpl_error(CPLErr::CE_Failure, "forwarded failure");
        }

        let captured = CAPTURED.with(|captured| captured.borrow().clone());
        let forwarded: Vec<_> = captured
            .iter()
            .filter(|(_, target, _)| target == GDAL_LOG_TARGET)
            .collect();
        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded[0].0, log::Level::Warn);
        assert!(forwarded[0].2.starts_with("forwarded warning"));
        assert_eq!(forwarded[1].0, log::Level::Error);
        assert!(forwarded[1].2.starts_with("forwarded failure"));
    }
}
