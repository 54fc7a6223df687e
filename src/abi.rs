//! Purpose: C ABI bridge for non-Rust hosts (libhostlink).
//! Exports: C-callable registry, version-check, and string/error helpers.
//! Role: Lets a C host keep its package table and stub pointers in the Rust registry.
//! Invariants: Status 0 is success, -1 is failure with an error record in `out_err`.
//! Invariants: Out pointers are nulled before any work, so failures never leave stale values.
//! Invariants: Error kind codes equal the CLI exit codes.
//! Notes: Handles are stored and returned verbatim; the registry never dereferences them.
use crate::core::error::{Error, ErrorKind, to_exit_code};
use crate::core::registry::VersionRegistry;
use crate::core::version::{vcompare, vsatisfies};
use crate::stubs::HOST_STUBS_REVISION;
use std::cmp::Ordering;
use std::ffi::{CStr, CString, c_void};
use std::os::raw::c_char;
use std::ptr;

#[derive(Clone, Copy, Debug)]
struct RawHandle(*const c_void);

#[repr(C)]
pub struct hlnk_registry {
    registry: VersionRegistry<RawHandle>,
}

#[repr(C)]
pub struct hlnk_error {
    kind: i32,
    message: *mut c_char,
    package: *mut c_char,
}

#[unsafe(no_mangle)]
pub extern "C" fn hlnk_registry_new(
    out_registry: *mut *mut hlnk_registry,
    out_err: *mut *mut hlnk_error,
) -> i32 {
    if out_registry.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("out_registry is null"),
        );
    }
    let handle = Box::new(hlnk_registry {
        registry: VersionRegistry::new(),
    });
    unsafe {
        *out_registry = Box::into_raw(handle);
    }
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn hlnk_registry_free(registry: *mut hlnk_registry) {
    if registry.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(registry));
    }
}

/// `handle` may be null: the package is then provided without stubs.
#[unsafe(no_mangle)]
pub extern "C" fn hlnk_provide(
    registry: *mut hlnk_registry,
    name: *const c_char,
    version: *const c_char,
    handle: *const c_void,
    out_err: *mut *mut hlnk_error,
) -> i32 {
    let registry = match borrow_registry(registry, out_err) {
        Ok(registry) => registry,
        Err(code) => return code,
    };
    let name = match read_str(name, "name", out_err) {
        Ok(name) => name,
        Err(code) => return code,
    };
    let version = match read_str(version, "version", out_err) {
        Ok(version) => version,
        Err(code) => return code,
    };
    let handle = if handle.is_null() {
        None
    } else {
        Some(RawHandle(handle))
    };
    match registry.registry.provide(name, version, handle) {
        Ok(()) => 0,
        Err(err) => fail(out_err, err),
    }
}

/// A null `spec` accepts any version. `out_version` must be released with `hlnk_string_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hlnk_require(
    registry: *mut hlnk_registry,
    name: *const c_char,
    spec: *const c_char,
    exact: i32,
    out_version: *mut *mut c_char,
    out_handle: *mut *const c_void,
    out_err: *mut *mut hlnk_error,
) -> i32 {
    unsafe {
        if !out_version.is_null() {
            *out_version = ptr::null_mut();
        }
        if !out_handle.is_null() {
            *out_handle = ptr::null();
        }
    }
    if out_version.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("out_version is null"),
        );
    }
    let registry = match borrow_registry(registry, out_err) {
        Ok(registry) => registry,
        Err(code) => return code,
    };
    let name = match read_str(name, "name", out_err) {
        Ok(name) => name,
        Err(code) => return code,
    };
    let spec = if spec.is_null() {
        ""
    } else {
        match read_str(spec, "spec", out_err) {
            Ok(spec) => spec,
            Err(code) => return code,
        }
    };
    let provided = match registry.registry.require(name, spec, exact != 0) {
        Ok(provided) => provided,
        Err(err) => return fail(out_err, err),
    };
    unsafe {
        *out_version = to_c_string(&provided.version);
        if !out_handle.is_null() {
            *out_handle = provided.handle.map_or(ptr::null(), |handle| handle.0);
        }
    }
    0
}

/// Writes -1, 0 or 1 to `out_cmp`.
#[unsafe(no_mangle)]
pub extern "C" fn hlnk_vcompare(
    left: *const c_char,
    right: *const c_char,
    out_cmp: *mut i32,
    out_err: *mut *mut hlnk_error,
) -> i32 {
    if out_cmp.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("out_cmp is null"),
        );
    }
    unsafe {
        *out_cmp = 0;
    }
    let left = match read_str(left, "left", out_err) {
        Ok(left) => left,
        Err(code) => return code,
    };
    let right = match read_str(right, "right", out_err) {
        Ok(right) => right,
        Err(code) => return code,
    };
    let order = match vcompare(left, right) {
        Ok(order) => order,
        Err(err) => return fail(out_err, err),
    };
    unsafe {
        *out_cmp = match order {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
    }
    0
}

/// Writes 1 to `out_ok` when `version` satisfies `spec`, 0 otherwise.
#[unsafe(no_mangle)]
pub extern "C" fn hlnk_vsatisfies(
    version: *const c_char,
    spec: *const c_char,
    exact: i32,
    out_ok: *mut i32,
    out_err: *mut *mut hlnk_error,
) -> i32 {
    if out_ok.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("out_ok is null"),
        );
    }
    unsafe {
        *out_ok = 0;
    }
    let version = match read_str(version, "version", out_err) {
        Ok(version) => version,
        Err(code) => return code,
    };
    let spec = match read_str(spec, "spec", out_err) {
        Ok(spec) => spec,
        Err(code) => return code,
    };
    match vsatisfies(version, spec, exact != 0) {
        Ok(ok) => {
            unsafe {
                *out_ok = i32::from(ok);
            }
            0
        }
        Err(err) => fail(out_err, err),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hlnk_stubs_revision() -> u32 {
    HOST_STUBS_REVISION
}

#[unsafe(no_mangle)]
pub extern "C" fn hlnk_string_free(value: *mut c_char) {
    if value.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(value));
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hlnk_error_kind(err: *const hlnk_error) -> i32 {
    if err.is_null() {
        return 0;
    }
    unsafe { (*err).kind }
}

/// Borrowed; valid until `hlnk_error_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hlnk_error_message(err: *const hlnk_error) -> *const c_char {
    if err.is_null() {
        return ptr::null();
    }
    unsafe { (*err).message }
}

/// Borrowed; null when the error is not tied to a package.
#[unsafe(no_mangle)]
pub extern "C" fn hlnk_error_package(err: *const hlnk_error) -> *const c_char {
    if err.is_null() {
        return ptr::null();
    }
    unsafe { (*err).package }
}

#[unsafe(no_mangle)]
pub extern "C" fn hlnk_error_free(err: *mut hlnk_error) {
    if err.is_null() {
        return;
    }
    unsafe {
        let err = Box::from_raw(err);
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
        }
        if !err.package.is_null() {
            drop(CString::from_raw(err.package));
        }
    }
}

fn borrow_registry<'a>(
    registry: *mut hlnk_registry,
    out_err: *mut *mut hlnk_error,
) -> Result<&'a mut hlnk_registry, i32> {
    if registry.is_null() {
        return Err(fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("registry is null"),
        ));
    }
    unsafe { Ok(&mut *registry) }
}

fn read_str<'a>(
    input: *const c_char,
    what: &str,
    out_err: *mut *mut hlnk_error,
) -> Result<&'a str, i32> {
    if input.is_null() {
        return Err(fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message(format!("{what} is null")),
        ));
    }
    unsafe { CStr::from_ptr(input) }
        .to_str()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message(format!("{what} is not valid UTF-8")))
        .map_err(|err| fail(out_err, err))
}

fn fail(out_err: *mut *mut hlnk_error, err: Error) -> i32 {
    tracing::debug!(kind = ?err.kind(), message = err.message().unwrap_or(""), "abi call failed");
    if out_err.is_null() {
        return -1;
    }
    let error = Box::new(hlnk_error {
        kind: to_exit_code(err.kind()),
        message: to_c_string(&err.result_text()),
        package: err.package().map(to_c_string).unwrap_or(ptr::null_mut()),
    });
    unsafe {
        *out_err = Box::into_raw(error);
    }
    -1
}

fn to_c_string(input: &str) -> *mut c_char {
    CString::new(input)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}
