use std::{
    ffi::CString,
    sync::{Arc, Mutex},
};

use gdal_sys::{CPLErr, CPLError};
use ogr_subset::{config, errors::CplErrType};

type Captured = Arc<Mutex<Vec<(CplErrType, i32, String)>>>;

fn raise(class: CPLErr::Type, number: i32, msg: &str) {
    let msg = CString::new(msg).unwrap();
    unsafe {
        CPLError(class, number, msg.as_ptr());
    };
}

#[test]
fn test_error_handler() {
    // The process-wide handler is shared by every thread, so the scenarios run in sequence.

    use_error_handler();

    log_scope_takes_precedence();

    error_handler_interleaved();
}

fn capture() -> Captured {
    let errors: Captured = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    config::set_error_handler(move |a, b, c| {
        errors_clone.lock().unwrap().push((a, b, c.to_string()));
    });
    errors
}

fn use_error_handler() {
    let errors = capture();

    raise(CPLErr::CE_Failure, 42, "foo");
    raise(CPLErr::CE_Warning, 1, "bar");

    config::remove_error_handler();

    let result: Vec<(CplErrType, i32, String)> = errors.lock().unwrap().clone();
    assert_eq!(
        result,
        vec![
            (CplErrType::Failure, 42, "foo".to_string()),
            (CplErrType::Warning, 1, "bar".to_string())
        ]
    );
}

fn log_scope_takes_precedence() {
    let errors = capture();

    {
        let _scope = config::LogErrorScope::new();
        raise(CPLErr::CE_Warning, 7, "to log");
    }
    raise(CPLErr::CE_Warning, 8, "to callback");

    config::remove_error_handler();

    let result = errors.lock().unwrap().clone();
    assert_eq!(
        result,
        vec![(CplErrType::Warning, 8, "to callback".to_string())]
    );
}

fn error_handler_interleaved() {
    use std::thread;
    // Two threads racing to replace the handler
    for _ in 0..2 {
        thread::spawn(move || loop {
            config::set_error_handler(move |_a, _b, _c| {});
        });
    }

    // and one raising errors meanwhile
    let join_handle = thread::spawn(move || {
        for _ in 0..100 {
            raise(CPLErr::CE_Failure, 42, "foo");
            raise(CPLErr::CE_Warning, 1, "bar");
        }
    });

    join_handle.join().unwrap();
}
