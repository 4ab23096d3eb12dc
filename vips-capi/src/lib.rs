//! Plain C exports over the libvips property system.
//!
//! Foreign runtimes that already drive libvips call these to fill generic
//! values, read operation outputs and cache images without linking against
//! the GObject headers. The library is opened on first use from the paths in
//! `VIPS_LIBRARY_PATH` / `GOBJECT_LIBRARY_PATH` or the platform defaults.
//!
//! Every function tolerates null pointers and load failures by logging and
//! leaving its outputs untouched. See `include/vips_bridge.h`.

mod cache;
mod properties;
mod values;

pub use crate::cache::{vips_cache_bridge, vips_cache_fixed_bridge};
pub use crate::properties::*;
pub use crate::values::*;

use std::ffi::{c_char, c_int, CStr};
use vips_bridge::{LibraryConfig, Vips, VipsConfig, VipsError};

/// Opens the libraries if nothing did so yet.
fn ensure_loaded() -> Result<(), VipsError> {
    if vips_sys::get().is_some() {
        return Ok(());
    }
    Vips::load(&LibraryConfig::from_env())
}

/// Runs `f` once the library is loaded, logging any failure.
fn with_bridge<T>(what: &str, f: impl FnOnce() -> Result<T, VipsError>) -> Option<T> {
    match ensure_loaded().and_then(|()| f()) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{what}: {e}");
            None
        }
    }
}

/// Borrows a C string argument.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL terminated string.
unsafe fn borrow_str<'a>(what: &str, ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        log::warn!("{what}: null string argument");
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("{what}: {e}");
            None
        }
    }
}

/// Starts libvips for hosts that do not initialise it themselves.
///
/// `program_name` may be null. Returns 0 on success and -1 on failure.
///
/// # Safety
///
/// `program_name` must be null or a NUL terminated string.
#[no_mangle]
pub unsafe extern "C" fn vo_init(program_name: *const c_char) -> c_int {
    let mut config = VipsConfig::from_env();
    if !program_name.is_null() {
        config.program_name = CStr::from_ptr(program_name).to_string_lossy().into_owned();
    }
    match Vips::init(&config) {
        Ok(()) => 0,
        Err(e) => {
            log::warn!("vo_init: {e}");
            -1
        }
    }
}
