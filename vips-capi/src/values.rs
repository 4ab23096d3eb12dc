//! `vo_set_*`: fill a caller-owned `GValue`.
//!
//! The target must be zeroed (`G_VALUE_INIT`) on entry. On success it holds
//! an initialised value the caller releases with `g_value_unset`.

use crate::{borrow_str, with_bridge};
use std::{
    ffi::{c_char, c_int},
    mem::ManuallyDrop,
};
use vips_bridge::{Blob, GenericValue, Image, Object, VipsError};
use vips_sys::{gboolean, GObject, GValue, VipsBlob, VipsImage, VipsObject, VipsSource, VipsTarget};

unsafe fn write_value(
    out_value: *mut GValue,
    what: &str,
    f: impl FnOnce() -> Result<GenericValue, VipsError>,
) {
    if out_value.is_null() {
        log::warn!("{what}: null GValue");
        return;
    }
    if let Some(value) = with_bridge(what, f) {
        out_value.write(value.into_raw());
    }
}

/// Builds a slice from a C array, empty for null or non-positive sizes.
unsafe fn slice_from<'a, T>(ptr: *const T, size: c_int) -> &'a [T] {
    if ptr.is_null() || size <= 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, size as usize)
    }
}

/// Sets a `gboolean`.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`.
#[no_mangle]
pub unsafe extern "C" fn vo_set_bool(out_value: *mut GValue, value: gboolean) {
    write_value(out_value, "vo_set_bool", || GenericValue::from_bool(value != 0));
}

/// Sets a `gint`. Enum arguments accept it as the raw enum value.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`.
#[no_mangle]
pub unsafe extern "C" fn vo_set_int(out_value: *mut GValue, value: c_int) {
    write_value(out_value, "vo_set_int", || GenericValue::from_int(value));
}

/// Sets a `guint64`.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`.
#[no_mangle]
pub unsafe extern "C" fn vo_set_guint64(out_value: *mut GValue, value: u64) {
    write_value(out_value, "vo_set_guint64", || GenericValue::from_u64(value));
}

/// Sets a `gdouble`.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`.
#[no_mangle]
pub unsafe extern "C" fn vo_set_double(out_value: *mut GValue, value: f64) {
    write_value(out_value, "vo_set_double", || GenericValue::from_double(value));
}

/// Sets a string, copied.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`; `value` must be
/// null or a NUL terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn vo_set_string(out_value: *mut GValue, value: *const c_char) {
    let Some(value) = borrow_str("vo_set_string", value) else {
        return;
    };
    write_value(out_value, "vo_set_string", || GenericValue::from_string(value));
}

/// Sets a `VipsArrayInt` holding a copy of `size` ints.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`; `value` must be
/// valid for `size` reads.
#[no_mangle]
pub unsafe extern "C" fn vo_set_int_array(
    out_value: *mut GValue,
    value: *const c_int,
    size: c_int,
) {
    let values = slice_from(value, size);
    write_value(out_value, "vo_set_int_array", || GenericValue::from_int_array(values));
}

/// Sets a `VipsArrayDouble` holding a copy of `size` doubles.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`; `value` must be
/// valid for `size` reads.
#[no_mangle]
pub unsafe extern "C" fn vo_set_double_array(
    out_value: *mut GValue,
    value: *const f64,
    size: c_int,
) {
    let values = slice_from(value, size);
    write_value(out_value, "vo_set_double_array", || GenericValue::from_double_array(values));
}

/// Sets a `VipsArrayImage`; the array takes a reference to each image.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`; `value` must hold
/// `size` live images.
#[no_mangle]
pub unsafe extern "C" fn vo_set_images(
    out_value: *mut GValue,
    value: *const *mut VipsImage,
    size: c_int,
) {
    let pointers = slice_from(value, size);
    write_value(out_value, "vo_set_images", || {
        let images = pointers
            .iter()
            .map(|&ptr| Image::from_borrowed(ptr)?.ok_or(VipsError::NullPointer("image")))
            .collect::<Result<Vec<_>, _>>()?;
        GenericValue::from_images(&images)
    });
}

/// Sets a `VipsBlob`; the value takes its own reference.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`; `value` must be
/// null or a live blob.
#[no_mangle]
pub unsafe extern "C" fn vo_set_blob(out_value: *mut GValue, value: *mut VipsBlob) {
    write_value(out_value, "vo_set_blob", || {
        let blob = Blob::from_raw(value).ok_or(VipsError::NullPointer("blob"))?;
        // borrowed, the caller keeps its reference
        let blob = ManuallyDrop::new(blob);
        GenericValue::from_blob(&blob)
    });
}

unsafe fn set_object(out_value: *mut GValue, what: &str, object: *mut GObject) {
    write_value(out_value, what, || {
        let object = Object::from_raw(object).ok_or(VipsError::NullPointer("object"))?;
        // borrowed, the caller keeps its reference
        let object = ManuallyDrop::new(object);
        GenericValue::from_object(&object)
    });
}

/// Sets any libvips object, typed with its runtime type.
///
/// # Safety
///
/// `out_value` must be null or point to a zeroed `GValue`; `value` must be
/// null or a live object.
#[no_mangle]
pub unsafe extern "C" fn vo_set_object(out_value: *mut GValue, value: *mut VipsObject) {
    set_object(out_value, "vo_set_object", value.cast());
}

/// Sets a `VipsImage`.
///
/// # Safety
///
/// As [`vo_set_object`].
#[no_mangle]
pub unsafe extern "C" fn vo_set_image(out_value: *mut GValue, value: *mut VipsImage) {
    set_object(out_value, "vo_set_image", value.cast());
}

/// Sets a `VipsTarget`.
///
/// # Safety
///
/// As [`vo_set_object`].
#[no_mangle]
pub unsafe extern "C" fn vo_set_target(out_value: *mut GValue, value: *mut VipsTarget) {
    set_object(out_value, "vo_set_target", value.cast());
}

/// Sets a `VipsSource`.
///
/// # Safety
///
/// As [`vo_set_object`].
#[no_mangle]
pub unsafe extern "C" fn vo_set_source(out_value: *mut GValue, value: *mut VipsSource) {
    set_object(out_value, "vo_set_source", value.cast());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_from_null_or_empty() {
        let empty: &[f64] = unsafe { slice_from(std::ptr::null(), 3) };
        assert!(empty.is_empty());
        let data = [1, 2, 3];
        assert!(unsafe { slice_from(data.as_ptr(), -1) }.is_empty());
        assert_eq!(unsafe { slice_from(data.as_ptr(), 2) }, &[1, 2]);
    }

    #[test]
    fn null_target_is_ignored() {
        unsafe {
            vo_set_int(std::ptr::null_mut(), 3);
            vo_set_string(std::ptr::null_mut(), std::ptr::null());
        }
    }
}
