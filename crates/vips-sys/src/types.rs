use std::ffi::{c_char, c_int, c_uint, c_void};

/// Runtime type identifier used by GObject (`gsize` in C).
pub type GType = usize;

/// GLib boolean (`gint` in C).
#[allow(non_camel_case_types)]
pub type gboolean = c_int;

/// Number of bits a fundamental type id is shifted by.
pub const G_TYPE_FUNDAMENTAL_SHIFT: usize = 2;

const fn fundamental(id: usize) -> GType {
    id << G_TYPE_FUNDAMENTAL_SHIFT
}

/// The invalid type, also the type of an unset [`GValue`].
pub const G_TYPE_INVALID: GType = fundamental(0);
/// `gboolean`.
pub const G_TYPE_BOOLEAN: GType = fundamental(5);
/// `gint`.
pub const G_TYPE_INT: GType = fundamental(6);
/// `guint64`.
pub const G_TYPE_UINT64: GType = fundamental(11);
/// Fundamental type of every registered enum.
pub const G_TYPE_ENUM: GType = fundamental(12);
/// Fundamental type of every registered flags type.
pub const G_TYPE_FLAGS: GType = fundamental(13);
/// `gdouble`.
pub const G_TYPE_DOUBLE: GType = fundamental(15);
/// `gchararray`, a NUL terminated UTF-8 string.
pub const G_TYPE_STRING: GType = fundamental(16);
/// Fundamental type of every boxed type (blobs and arrays in libvips).
pub const G_TYPE_BOXED: GType = fundamental(18);
/// Fundamental type of every object type.
pub const G_TYPE_OBJECT: GType = fundamental(20);

/// The generic tagged value container.
///
/// A zeroed value is `G_VALUE_INIT`. The payload is a union of two 64 bit
/// words in C; only GLib interprets it.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GValue {
    /// Type tag, [`G_TYPE_INVALID`] when unset.
    pub g_type: GType,
    /// Opaque payload.
    pub data: [u64; 2],
}

/// Class header shared by every GObject class.
#[repr(C)]
#[derive(Debug)]
pub struct GTypeClass {
    /// Type the class belongs to.
    pub g_type: GType,
}

/// Instance header shared by every GObject instance.
#[repr(C)]
#[derive(Debug)]
pub struct GTypeInstance {
    /// Class of the instance.
    pub g_class: *mut GTypeClass,
}

/// Public header of a property description.
#[repr(C)]
#[derive(Debug)]
pub struct GParamSpec {
    /// Instance header.
    pub g_type_instance: GTypeInstance,
    /// Canonical property name.
    pub name: *const c_char,
    /// `GParamFlags`.
    pub flags: c_int,
    /// Type of the values the property holds.
    pub value_type: GType,
    /// Type that declared the property.
    pub owner_type: GType,
}

/// Public header of an argument description attached to a libvips class.
#[repr(C)]
#[derive(Debug)]
pub struct VipsArgumentClass {
    /// Property description of the argument.
    pub pspec: *mut GParamSpec,
    /// Owning `VipsObjectClass`.
    pub object_class: *mut c_void,
    /// `VipsArgumentFlags`.
    pub flags: c_uint,
    /// Ordering of the argument in generated signatures.
    pub priority: c_int,
    /// Offset of the argument in the instance struct.
    pub offset: c_uint,
}

macro_rules! opaque {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}

opaque! {
    /// `GObject` instance.
    GObject;
    /// `VipsObject` instance.
    VipsObject;
    /// `VipsOperation` instance.
    VipsOperation;
    /// `VipsImage` instance.
    VipsImage;
    /// `VipsSource` instance.
    VipsSource;
    /// `VipsTarget` instance.
    VipsTarget;
    /// Reference counted memory area.
    VipsArea;
    /// Binary blob, a [`VipsArea`] holding bytes.
    VipsBlob;
    /// Per-instance state of an argument.
    VipsArgumentInstance;
}

/// `VIPS_ARGUMENT_REQUIRED`.
pub const VIPS_ARGUMENT_REQUIRED: c_uint = 1;
/// `VIPS_ARGUMENT_CONSTRUCT`.
pub const VIPS_ARGUMENT_CONSTRUCT: c_uint = 2;
/// `VIPS_ARGUMENT_SET_ONCE`.
pub const VIPS_ARGUMENT_SET_ONCE: c_uint = 4;
/// `VIPS_ARGUMENT_SET_ALWAYS`.
pub const VIPS_ARGUMENT_SET_ALWAYS: c_uint = 8;
/// `VIPS_ARGUMENT_INPUT`.
pub const VIPS_ARGUMENT_INPUT: c_uint = 16;
/// `VIPS_ARGUMENT_OUTPUT`.
pub const VIPS_ARGUMENT_OUTPUT: c_uint = 32;
/// `VIPS_ARGUMENT_DEPRECATED`.
pub const VIPS_ARGUMENT_DEPRECATED: c_uint = 64;
/// `VIPS_ARGUMENT_MODIFY`.
pub const VIPS_ARGUMENT_MODIFY: c_uint = 128;

/// Reads the runtime type of an instance from its class header.
///
/// # Safety
///
/// `instance` must point to a live GObject type instance.
#[inline]
pub unsafe fn instance_type(instance: *const GTypeInstance) -> GType {
    (*(*instance).g_class).g_type
}
