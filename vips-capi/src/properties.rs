//! `vo_get_*` read operation properties, `vo_set_property` assigns one.
//!
//! Getters leave their out parameter untouched when the lookup fails.

use crate::{borrow_str, with_bridge};
use std::{
    ffi::{c_char, c_int},
    mem::ManuallyDrop,
};
use vips_bridge::{property, GenericValue, Object, VipsError};
use vips_sys::{gboolean, GValue, VipsBlob, VipsImage, VipsObject, VipsOperation};

/// Runs `f` against a borrowed operation and a property name.
unsafe fn read<T>(
    what: &str,
    operation: *mut VipsOperation,
    name: *const c_char,
    f: impl FnOnce(&Object, &str) -> Result<T, VipsError>,
) -> Option<T> {
    let name = borrow_str(what, name)?;
    with_bridge(what, || {
        // borrowed, the caller keeps its reference
        let object = ManuallyDrop::new(
            Object::from_raw(operation.cast()).ok_or(VipsError::NullPointer("operation"))?,
        );
        f(&object, name)
    })
}

unsafe fn store<T>(what: &str, out: *mut T, value: Option<T>) {
    match (out.is_null(), value) {
        (true, _) => log::warn!("{what}: null output pointer"),
        (false, Some(value)) => out.write(value),
        (false, None) => {}
    }
}

/// Reads a boolean property.
///
/// # Safety
///
/// `operation` must be a live object, `name` a NUL terminated string and
/// `out` null or writable.
#[no_mangle]
pub unsafe extern "C" fn vo_get_bool(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut gboolean,
) {
    let value = read("vo_get_bool", operation, name, property::get_bool);
    store("vo_get_bool", out, value.map(gboolean::from));
}

/// Reads an int property. Enum properties yield their integer value.
///
/// # Safety
///
/// As [`vo_get_bool`].
#[no_mangle]
pub unsafe extern "C" fn vo_get_int(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut c_int,
) {
    let value = read("vo_get_int", operation, name, property::get_int);
    store("vo_get_int", out, value);
}

/// Reads a `guint64` property.
///
/// # Safety
///
/// As [`vo_get_bool`].
#[no_mangle]
pub unsafe extern "C" fn vo_get_guint64(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut u64,
) {
    let value = read("vo_get_guint64", operation, name, property::get_u64);
    store("vo_get_guint64", out, value);
}

/// Reads a double property.
///
/// # Safety
///
/// As [`vo_get_bool`].
#[no_mangle]
pub unsafe extern "C" fn vo_get_double(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut f64,
) {
    let value = read("vo_get_double", operation, name, property::get_double);
    store("vo_get_double", out, value);
}

/// Copies a double array property into `out`, which holds `size` elements.
///
/// Returns the number of elements written, or -1 when the property cannot
/// be read.
///
/// # Safety
///
/// As [`vo_get_bool`], with `out` valid for `size` writes.
#[no_mangle]
pub unsafe extern "C" fn vo_get_double_array(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut f64,
    size: c_int,
) -> c_int {
    let out: &mut [f64] = if out.is_null() || size <= 0 {
        &mut []
    } else {
        std::slice::from_raw_parts_mut(out, size as usize)
    };
    read("vo_get_double_array", operation, name, |object, name| {
        property::get_double_array_into(object, name, out)
    })
    .map_or(-1, |n| n as c_int)
}

/// Copies an int array property into `out`, which holds `size` elements.
///
/// Returns the number of elements written, or -1 when the property cannot
/// be read.
///
/// # Safety
///
/// As [`vo_get_double_array`].
#[no_mangle]
pub unsafe extern "C" fn vo_get_int_array(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut c_int,
    size: c_int,
) -> c_int {
    let out: &mut [c_int] = if out.is_null() || size <= 0 {
        &mut []
    } else {
        std::slice::from_raw_parts_mut(out, size as usize)
    };
    read("vo_get_int_array", operation, name, |object, name| {
        let values = property::get_int_array(object, name)?;
        let n = values.len().min(out.len());
        out[..n].copy_from_slice(&values[..n]);
        Ok(n)
    })
    .map_or(-1, |n| n as c_int)
}

/// Reads a string property as a new copy the caller releases with `g_free`.
///
/// A property that holds no string stores null.
///
/// # Safety
///
/// As [`vo_get_bool`].
#[no_mangle]
pub unsafe extern "C" fn vo_get_string(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut *mut c_char,
) {
    let value = read("vo_get_string", operation, name, |object, name| {
        let value = property::get_property(object, name, vips_sys::G_TYPE_STRING)?;
        let api = vips_sys::get().ok_or(VipsError::NotLoaded)?;
        Ok((api.g_value_dup_string)(value.as_ptr()))
    });
    store("vo_get_string", out, value);
}

/// Reads a blob property as a new reference the caller releases with
/// `vips_area_unref`.
///
/// # Safety
///
/// As [`vo_get_bool`].
#[no_mangle]
pub unsafe extern "C" fn vo_get_blob(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut *mut VipsBlob,
) {
    let value = read("vo_get_blob", operation, name, property::get_blob);
    store(
        "vo_get_blob",
        out,
        value.map(|blob| blob.map_or(std::ptr::null_mut(), |blob| blob.into_raw())),
    );
}

/// Reads an image property as a new reference the caller releases with
/// `g_object_unref`.
///
/// # Safety
///
/// As [`vo_get_bool`].
#[no_mangle]
pub unsafe extern "C" fn vo_get_image(
    operation: *mut VipsOperation,
    name: *const c_char,
    out: *mut *mut VipsImage,
) {
    let value = read("vo_get_image", operation, name, property::get_image);
    store(
        "vo_get_image",
        out,
        value.map(|image| image.map_or(std::ptr::null_mut(), |image| image.into_raw())),
    );
}

/// Assigns `value` to the property `name` of `object`.
///
/// A string value assigned to an enum typed property is resolved as a nick
/// of that enum. The value stays owned by the caller.
///
/// # Safety
///
/// `object` must be a live object, `name` a NUL terminated string and
/// `value` null or an initialised `GValue`.
#[no_mangle]
pub unsafe extern "C" fn vo_set_property(
    object: *mut VipsObject,
    name: *const c_char,
    value: *const GValue,
) {
    if value.is_null() {
        log::warn!("vo_set_property: null GValue");
        return;
    }
    // the caller unsets it
    let value = ManuallyDrop::new(GenericValue::from_raw(value.read()));
    read("vo_set_property", object.cast(), name, |object, name| {
        property::set_property(object, name, &value)
    });
}
