//! The generic tagged value container.
//!
//! [`GenericValue`] owns an initialised `GValue`. The constructors follow the
//! libvips conventions for every argument type an operation accepts and the
//! readers check the held type before touching the payload.

use crate::{
    error::VipsError,
    object::{type_name, Blob, Image, Object},
    runtime::{api, string_from_ptr},
};
use std::ffi::{c_int, c_void, CString};
use vips_sys::{GType, GValue, VipsApi, G_TYPE_ENUM};

/// An owned, initialised generic value.
pub struct GenericValue {
    raw: GValue,
}

fn array_len(len: usize) -> Result<c_int, VipsError> {
    c_int::try_from(len).map_err(|_| VipsError::ArrayTooLarge(len))
}

impl GenericValue {
    /// Creates a value of type `g_type` holding its default.
    pub fn new(g_type: GType) -> Result<Self, VipsError> {
        Ok(Self::init(api()?, g_type))
    }

    fn init(api: &VipsApi, g_type: GType) -> Self {
        let mut raw = GValue::default();
        // SAFETY: raw is zeroed which is the required initial state.
        unsafe { (api.g_value_init)(&mut raw, g_type) };
        Self { raw }
    }

    /// A `gboolean` value.
    pub fn from_bool(value: bool) -> Result<Self, VipsError> {
        let api = api()?;
        let mut v = Self::init(api, vips_sys::G_TYPE_BOOLEAN);
        unsafe { (api.g_value_set_boolean)(&mut v.raw, value.into()) };
        Ok(v)
    }

    /// A `gint` value. Enum arguments accept it as the raw enum value.
    pub fn from_int(value: i32) -> Result<Self, VipsError> {
        let api = api()?;
        let mut v = Self::init(api, vips_sys::G_TYPE_INT);
        unsafe { (api.g_value_set_int)(&mut v.raw, value) };
        Ok(v)
    }

    /// A `guint64` value.
    pub fn from_u64(value: u64) -> Result<Self, VipsError> {
        let api = api()?;
        let mut v = Self::init(api, vips_sys::G_TYPE_UINT64);
        unsafe { (api.g_value_set_uint64)(&mut v.raw, value) };
        Ok(v)
    }

    /// A `gdouble` value.
    pub fn from_double(value: f64) -> Result<Self, VipsError> {
        let api = api()?;
        let mut v = Self::init(api, vips_sys::G_TYPE_DOUBLE);
        unsafe { (api.g_value_set_double)(&mut v.raw, value) };
        Ok(v)
    }

    /// A string value. GObject keeps its own copy.
    pub fn from_string(value: &str) -> Result<Self, VipsError> {
        let c_value = CString::new(value)?;
        let api = api()?;
        let mut v = Self::init(api, vips_sys::G_TYPE_STRING);
        unsafe { (api.g_value_set_string)(&mut v.raw, c_value.as_ptr()) };
        Ok(v)
    }

    /// A value of enum type `g_type`.
    pub fn from_enum(g_type: GType, value: i32) -> Result<Self, VipsError> {
        let api = api()?;
        let mut v = Self::init(api, g_type);
        unsafe { (api.g_value_set_enum)(&mut v.raw, value) };
        Ok(v)
    }

    /// A `VipsArrayInt` value holding a copy of `values`.
    pub fn from_int_array(values: &[i32]) -> Result<Self, VipsError> {
        let api = api()?;
        let n = array_len(values.len())?;
        let mut v = Self::init(api, unsafe { (api.vips_array_int_get_type)() });
        unsafe { (api.vips_value_set_array_int)(&mut v.raw, values.as_ptr(), n) };
        Ok(v)
    }

    /// A `VipsArrayDouble` value holding a copy of `values`.
    pub fn from_double_array(values: &[f64]) -> Result<Self, VipsError> {
        let api = api()?;
        let n = array_len(values.len())?;
        let mut v = Self::init(api, unsafe { (api.vips_array_double_get_type)() });
        unsafe { (api.vips_value_set_array_double)(&mut v.raw, values.as_ptr(), n) };
        Ok(v)
    }

    /// A `VipsArrayImage` value. Each element holds a new reference.
    pub fn from_images(images: &[Image]) -> Result<Self, VipsError> {
        let api = api()?;
        let n = array_len(images.len())?;
        let mut v = Self::init(api, unsafe { (api.vips_array_image_get_type)() });
        unsafe {
            (api.vips_value_set_array_image)(&mut v.raw, n);
            let array = (api.vips_value_get_array_image)(&v.raw, std::ptr::null_mut());
            if array.is_null() && n > 0 {
                return Err(VipsError::NullPointer("image array"));
            }
            for (i, image) in images.iter().enumerate() {
                (api.g_object_ref)(image.as_ptr().cast());
                *array.add(i) = image.as_image_ptr();
            }
        }
        Ok(v)
    }

    /// A `VipsBlob` value holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VipsError> {
        let blob = Blob::copy_from_slice(bytes)?;
        Self::from_blob(&blob)
    }

    /// A `VipsBlob` value sharing `blob`.
    pub fn from_blob(blob: &Blob) -> Result<Self, VipsError> {
        let api = api()?;
        let mut v = Self::init(api, unsafe { (api.vips_blob_get_type)() });
        // boxed set takes its own reference
        unsafe { (api.g_value_set_boxed)(&mut v.raw, blob.as_ptr() as *const c_void) };
        Ok(v)
    }

    /// An object value typed with the object's runtime type.
    pub fn from_object(object: &Object) -> Result<Self, VipsError> {
        let api = api()?;
        let mut v = Self::init(api, object.type_id());
        unsafe { (api.g_value_set_object)(&mut v.raw, object.as_ptr().cast()) };
        Ok(v)
    }

    /// Takes ownership of an initialised raw value.
    ///
    /// # Safety
    ///
    /// `raw` must be initialised (or zeroed) and not owned elsewhere.
    pub unsafe fn from_raw(raw: GValue) -> Self {
        Self { raw }
    }

    /// Releases ownership of the raw value to the caller.
    pub fn into_raw(self) -> GValue {
        let raw = self.raw;
        std::mem::forget(self);
        raw
    }

    /// Pointer for read-only library calls.
    #[inline]
    pub fn as_ptr(&self) -> *const GValue {
        &self.raw
    }

    /// Pointer for library calls that fill the value.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut GValue {
        &mut self.raw
    }

    /// Type currently held.
    #[inline]
    pub fn value_type(&self) -> GType {
        self.raw.g_type
    }

    /// Name of the type currently held.
    pub fn type_name(&self) -> Result<String, VipsError> {
        type_name(self.raw.g_type)
    }

    /// Whether the held type is `g_type` or derives from it.
    pub fn holds(&self, g_type: GType) -> Result<bool, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.g_type_is_a)(self.raw.g_type, g_type) } != 0)
    }

    fn expect(&self, api: &VipsApi, g_type: GType) -> Result<(), VipsError> {
        if unsafe { (api.g_type_is_a)(self.raw.g_type, g_type) } != 0 {
            Ok(())
        } else {
            Err(VipsError::TypeMismatch {
                expected: type_name(g_type)?,
                found: self.type_name()?,
            })
        }
    }

    /// Reads a boolean.
    pub fn get_bool(&self) -> Result<bool, VipsError> {
        let api = api()?;
        self.expect(api, vips_sys::G_TYPE_BOOLEAN)?;
        Ok(unsafe { (api.g_value_get_boolean)(&self.raw) } != 0)
    }

    /// Reads an int, or the integer value of an enum.
    pub fn get_int(&self) -> Result<i32, VipsError> {
        let api = api()?;
        if unsafe { (api.g_type_fundamental)(self.raw.g_type) } == G_TYPE_ENUM {
            return Ok(unsafe { (api.g_value_get_enum)(&self.raw) });
        }
        self.expect(api, vips_sys::G_TYPE_INT)?;
        Ok(unsafe { (api.g_value_get_int)(&self.raw) })
    }

    /// Reads an unsigned 64 bit int.
    pub fn get_u64(&self) -> Result<u64, VipsError> {
        let api = api()?;
        self.expect(api, vips_sys::G_TYPE_UINT64)?;
        Ok(unsafe { (api.g_value_get_uint64)(&self.raw) })
    }

    /// Reads a double.
    pub fn get_double(&self) -> Result<f64, VipsError> {
        let api = api()?;
        self.expect(api, vips_sys::G_TYPE_DOUBLE)?;
        Ok(unsafe { (api.g_value_get_double)(&self.raw) })
    }

    /// Reads a string, `None` when the value holds a null string.
    pub fn get_string(&self) -> Result<Option<String>, VipsError> {
        let api = api()?;
        self.expect(api, vips_sys::G_TYPE_STRING)?;
        Ok(unsafe { string_from_ptr((api.g_value_get_string)(&self.raw)) })
    }

    /// Copies out an int array.
    pub fn get_int_array(&self) -> Result<Vec<i32>, VipsError> {
        let api = api()?;
        self.expect(api, unsafe { (api.vips_array_int_get_type)() })?;
        let mut n: c_int = 0;
        unsafe {
            let data = (api.vips_value_get_array_int)(&self.raw, &mut n);
            Ok(copy_array(data, n))
        }
    }

    /// Copies out a double array.
    pub fn get_double_array(&self) -> Result<Vec<f64>, VipsError> {
        let api = api()?;
        self.expect(api, unsafe { (api.vips_array_double_get_type)() })?;
        let mut n: c_int = 0;
        unsafe {
            let data = (api.vips_value_get_array_double)(&self.raw, &mut n);
            Ok(copy_array(data, n))
        }
    }

    /// Returns a new reference to the held blob.
    pub fn get_blob(&self) -> Result<Option<Blob>, VipsError> {
        let api = api()?;
        self.expect(api, unsafe { (api.vips_blob_get_type)() })?;
        // SAFETY: dup_boxed returns a new reference on the area.
        Ok(unsafe { Blob::from_raw((api.g_value_dup_boxed)(&self.raw).cast()) })
    }

    /// Returns a new reference to the held object.
    pub fn get_object(&self) -> Result<Option<Object>, VipsError> {
        let api = api()?;
        self.expect(api, vips_sys::G_TYPE_OBJECT)?;
        unsafe { Object::from_borrowed((api.g_value_get_object)(&self.raw).cast()) }
    }

    /// Returns a new reference to the held image.
    pub fn get_image(&self) -> Result<Option<Image>, VipsError> {
        let api = api()?;
        self.expect(api, unsafe { (api.vips_image_get_type)() })?;
        match self.get_object()? {
            Some(object) => Ok(Some(Image::try_from(object)?)),
            None => Ok(None),
        }
    }
}

/// Copies `n` elements from a library-owned array.
///
/// # Safety
///
/// `data` must be null or valid for `n` reads.
unsafe fn copy_array<T: Copy>(data: *const T, n: c_int) -> Vec<T> {
    if data.is_null() || n <= 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(data, n as usize).to_vec()
    }
}

impl Drop for GenericValue {
    fn drop(&mut self) {
        if self.raw.g_type == vips_sys::G_TYPE_INVALID {
            return;
        }
        if let Some(api) = vips_sys::get() {
            unsafe { (api.g_value_unset)(&mut self.raw) };
        }
    }
}

impl std::fmt::Debug for GenericValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericValue")
            .field("type", &self.type_name().unwrap_or_default())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_len_limits() {
        assert_eq!(array_len(0).ok(), Some(0));
        assert_eq!(array_len(3).ok(), Some(3));
        assert!(matches!(
            array_len(c_int::MAX as usize + 1),
            Err(VipsError::ArrayTooLarge(_))
        ));
    }

    #[test]
    fn copy_array_handles_null_and_empty() {
        let empty: Vec<f64> = unsafe { copy_array(std::ptr::null(), 4) };
        assert!(empty.is_empty());
        let data = [1.0, 2.0, 3.0];
        assert_eq!(unsafe { copy_array(data.as_ptr(), 0) }, Vec::<f64>::new());
        assert_eq!(unsafe { copy_array(data.as_ptr(), 2) }, vec![1.0, 2.0]);
    }

    #[test]
    fn zeroed_value_drops_without_library() {
        let value = unsafe { GenericValue::from_raw(GValue::default()) };
        assert_eq!(value.value_type(), vips_sys::G_TYPE_INVALID);
        let raw = value.into_raw();
        assert_eq!(raw.g_type, vips_sys::G_TYPE_INVALID);
    }
}
