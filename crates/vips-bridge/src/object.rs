use crate::{
    error::VipsError,
    runtime::{api, string_from_ptr, take_error},
};
use std::{ffi::c_void, ops::Deref, ptr::NonNull};
use vips_sys::{GObject, GType, GTypeInstance, VipsArea, VipsBlob, VipsImage, VipsObject};

/// An owned reference to a libvips object (`VipsObject` and subclasses).
///
/// Cloning takes a new reference, dropping releases it.
pub struct Object {
    ptr: NonNull<GObject>,
}

// SAFETY: GObject reference counting is atomic and libvips objects may be
// handed between threads.
unsafe impl Send for Object {}

impl Object {
    /// Wraps a pointer, taking over one reference the caller owns.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live `VipsObject` with a reference owned by the caller.
    pub unsafe fn from_raw(ptr: *mut GObject) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Wraps a borrowed pointer, taking a new reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live `VipsObject`.
    pub unsafe fn from_borrowed(ptr: *mut GObject) -> Result<Option<Self>, VipsError> {
        if ptr.is_null() {
            return Ok(None);
        }
        let api = api()?;
        (api.g_object_ref)(ptr.cast());
        Ok(Self::from_raw(ptr))
    }

    /// Returns the raw pointer, the reference stays owned by `self`.
    #[inline]
    pub fn as_ptr(&self) -> *mut GObject {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn as_vips_object(&self) -> *mut VipsObject {
        self.ptr.as_ptr().cast()
    }

    /// Releases ownership of the reference to the caller.
    pub fn into_raw(self) -> *mut GObject {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    /// Runtime type of the object.
    pub fn type_id(&self) -> GType {
        // SAFETY: every GObject starts with a GTypeInstance header.
        unsafe { vips_sys::instance_type(self.ptr.as_ptr() as *const GTypeInstance) }
    }

    /// Name of the runtime type, e.g. `VipsImage` or `VipsForeignLoadPng`.
    pub fn type_name(&self) -> Result<String, VipsError> {
        type_name(self.type_id())
    }

    /// libvips nickname of the runtime type, e.g. `image` or `pngload`.
    pub fn nickname(&self) -> Result<Option<String>, VipsError> {
        let api = api()?;
        Ok(unsafe { string_from_ptr((api.vips_nickname_find)(self.type_id())) })
    }

    /// Nickname when available, type name otherwise. Used in messages.
    pub(crate) fn describe(&self) -> String {
        match self.nickname() {
            Ok(Some(nickname)) => nickname,
            _ => self.type_name().unwrap_or_else(|_| "object".to_string()),
        }
    }

    /// Whether the object is an instance of `g_type` or a subtype.
    pub fn is_a(&self, g_type: GType) -> Result<bool, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.g_type_is_a)(self.type_id(), g_type) } != 0)
    }
}

impl Clone for Object {
    fn clone(&self) -> Self {
        // an object can only exist once the symbols are loaded
        if let Some(api) = vips_sys::get() {
            unsafe { (api.g_object_ref)(self.ptr.as_ptr().cast()) };
        }
        Self { ptr: self.ptr }
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        if let Some(api) = vips_sys::get() {
            unsafe { (api.g_object_unref)(self.ptr.as_ptr().cast()) };
        }
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("ptr", &self.ptr)
            .field("type", &self.type_name().unwrap_or_default())
            .finish()
    }
}

/// A `VipsSource` reading from `blob`. The source keeps its own reference.
pub fn source_from_blob(blob: &Blob) -> Result<Object, VipsError> {
    let api = api()?;
    let ptr = unsafe { (api.vips_source_new_from_blob)(blob.as_ptr()) };
    // SAFETY: the constructor returns a new reference or null.
    unsafe { Object::from_raw(ptr.cast()) }.ok_or_else(|| VipsError::Operation {
        operation: "source_new_from_blob".to_string(),
        message: take_error(api),
    })
}

/// A `VipsTarget` collecting written bytes in memory.
pub fn target_to_memory() -> Result<Object, VipsError> {
    let api = api()?;
    let ptr = unsafe { (api.vips_target_new_to_memory)() };
    unsafe { Object::from_raw(ptr.cast()) }.ok_or_else(|| VipsError::Operation {
        operation: "target_new_to_memory".to_string(),
        message: take_error(api),
    })
}

/// Returns the name of a registered type.
pub fn type_name(g_type: GType) -> Result<String, VipsError> {
    let api = api()?;
    Ok(unsafe { string_from_ptr((api.g_type_name)(g_type)) }.unwrap_or_else(|| "invalid".into()))
}

/// An owned reference to a `VipsImage`.
#[derive(Clone, Debug)]
pub struct Image(Object);

impl Image {
    /// Runtime type of `VipsImage`.
    pub fn static_type() -> Result<GType, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_image_get_type)() })
    }

    /// Wraps a pointer, taking over one reference the caller owns.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live `VipsImage` with a reference owned by the caller.
    pub unsafe fn from_raw(ptr: *mut VipsImage) -> Option<Self> {
        Object::from_raw(ptr.cast()).map(Self)
    }

    /// Wraps a borrowed pointer, taking a new reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live `VipsImage`.
    pub unsafe fn from_borrowed(ptr: *mut VipsImage) -> Result<Option<Self>, VipsError> {
        Ok(Object::from_borrowed(ptr.cast())?.map(Self))
    }

    /// Releases ownership of the reference to the caller.
    pub fn into_raw(self) -> *mut VipsImage {
        self.0.into_raw().cast()
    }

    /// Raw image pointer, the reference stays owned by `self`.
    #[inline]
    pub fn as_image_ptr(&self) -> *mut VipsImage {
        self.0.as_ptr().cast()
    }

    /// Width in pixels.
    pub fn width(&self) -> Result<i32, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_image_get_width)(self.as_image_ptr()) })
    }

    /// Height in pixels.
    pub fn height(&self) -> Result<i32, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_image_get_height)(self.as_image_ptr()) })
    }

    /// Number of bands.
    pub fn bands(&self) -> Result<i32, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_image_get_bands)(self.as_image_ptr()) })
    }
}

impl Deref for Image {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

impl TryFrom<Object> for Image {
    type Error = VipsError;

    fn try_from(object: Object) -> Result<Self, VipsError> {
        let expected = Image::static_type()?;
        if object.is_a(expected)? {
            Ok(Self(object))
        } else {
            Err(VipsError::TypeMismatch {
                expected: type_name(expected)?,
                found: object.type_name()?,
            })
        }
    }
}

impl From<Image> for Object {
    fn from(image: Image) -> Object {
        image.0
    }
}

/// An owned reference to a library blob of bytes.
pub struct Blob {
    ptr: NonNull<VipsBlob>,
}

// SAFETY: areas are reference counted under a lock.
unsafe impl Send for Blob {}

impl Blob {
    /// Copies `bytes` into a new blob.
    pub fn copy_from_slice(bytes: &[u8]) -> Result<Self, VipsError> {
        let api = api()?;
        let ptr = unsafe { (api.vips_blob_copy)(bytes.as_ptr() as *const c_void, bytes.len()) };
        // SAFETY: vips_blob_copy returns a new reference.
        unsafe { Self::from_raw(ptr) }.ok_or(VipsError::NullPointer("blob"))
    }

    /// Wraps a pointer, taking over one reference the caller owns.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live `VipsBlob` with a reference owned by the caller.
    pub unsafe fn from_raw(ptr: *mut VipsBlob) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Releases ownership of the reference to the caller.
    pub fn into_raw(self) -> *mut VipsBlob {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    /// Raw pointer, the reference stays owned by `self`.
    #[inline]
    pub fn as_ptr(&self) -> *mut VipsBlob {
        self.ptr.as_ptr()
    }

    /// The bytes held by the blob.
    pub fn as_bytes(&self) -> &[u8] {
        let Some(api) = vips_sys::get() else {
            return &[];
        };
        let mut length = 0usize;
        // SAFETY: the area stays alive as long as self holds its reference.
        unsafe {
            let data = (api.vips_blob_get)(self.ptr.as_ptr(), &mut length);
            if data.is_null() || length == 0 {
                &[]
            } else {
                std::slice::from_raw_parts(data as *const u8, length)
            }
        }
    }
}

impl Drop for Blob {
    fn drop(&mut self) {
        if let Some(api) = vips_sys::get() {
            unsafe { (api.vips_area_unref)(self.ptr.as_ptr() as *mut VipsArea) };
        }
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("ptr", &self.ptr)
            .field("len", &self.as_bytes().len())
            .finish()
    }
}
