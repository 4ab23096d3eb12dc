//! Fixed-shape wrappers around the `cache` operation.

use crate::{borrow_str, with_bridge};
use std::ffi::{c_char, c_int};
use vips_bridge::{
    cache::{cache, CacheOptions},
    Image, VipsError,
};
use vips_sys::VipsImage;

/// Collects `(name, value)` pairs into options.
///
/// The list ends at the first `None` name. Unknown names are an error.
fn parse_options<'a>(
    pairs: impl IntoIterator<Item = (Option<&'a str>, c_int)>,
) -> Result<CacheOptions, String> {
    let mut options = CacheOptions::default();
    for (name, value) in pairs {
        let Some(name) = name else { break };
        let slot = match name {
            "max_tiles" => &mut options.max_tiles,
            "tile_height" => &mut options.tile_height,
            "tile_width" => &mut options.tile_width,
            other => return Err(format!("unknown cache option {other:?}")),
        };
        *slot = Some(value);
    }
    Ok(options)
}

unsafe fn run(
    what: &str,
    input: *mut VipsImage,
    out: *mut *mut VipsImage,
    options: &CacheOptions,
) -> c_int {
    if out.is_null() {
        log::warn!("{what}: null output pointer");
        return -1;
    }
    let cached = with_bridge(what, || {
        let input = Image::from_borrowed(input)?.ok_or(VipsError::NullPointer("image"))?;
        cache(&input, options)
    });
    match cached {
        Some(image) => {
            out.write(image.into_raw());
            0
        }
        None => -1,
    }
}

/// Caches `input` with the library defaults, storing a new reference in
/// `out`. Returns 0 on success, -1 on failure.
///
/// # Safety
///
/// `input` must be a live image and `out` null or writable.
#[no_mangle]
pub unsafe extern "C" fn vips_cache_bridge(
    input: *mut VipsImage,
    out: *mut *mut VipsImage,
) -> c_int {
    run("vips_cache_bridge", input, out, &CacheOptions::default())
}

/// Caches `input` with up to three named tile options.
///
/// Accepted names are `max_tiles`, `tile_height` and `tile_width`. A null
/// name ends the list, so later pairs are ignored. Returns 0 on success, -1
/// on failure.
///
/// # Safety
///
/// As [`vips_cache_bridge`], with every name null or a NUL terminated string.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn vips_cache_fixed_bridge(
    input: *mut VipsImage,
    out: *mut *mut VipsImage,
    name1: *const c_char,
    value1: c_int,
    name2: *const c_char,
    value2: c_int,
    name3: *const c_char,
    value3: c_int,
) -> c_int {
    const WHAT: &str = "vips_cache_fixed_bridge";
    let mut pairs = Vec::with_capacity(3);
    for (name, value) in [(name1, value1), (name2, value2), (name3, value3)] {
        if name.is_null() {
            break;
        }
        let Some(name) = borrow_str(WHAT, name) else {
            return -1;
        };
        pairs.push((Some(name), value));
    }

    match parse_options(pairs) {
        Ok(options) => run(WHAT, input, out, &options),
        Err(e) => {
            log::warn!("{WHAT}: {e}");
            -1
        }
    }
}
