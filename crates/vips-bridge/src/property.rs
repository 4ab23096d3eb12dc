//! Named, typed properties of libvips objects.
//!
//! Every access first looks the argument up through libvips introspection so
//! unknown names surface as [`VipsError::UnknownArgument`] instead of a GLib
//! warning on stderr.

use crate::{
    error::VipsError,
    object::{type_name, Blob, Image, Object},
    runtime::{api, string_from_ptr, take_error},
    value::GenericValue,
};
use bitflags::bitflags;
use std::ffi::{c_uint, CString};
use vips_sys::{
    GParamSpec, GType, VipsApi, VipsArgumentClass, VipsArgumentInstance, G_TYPE_ENUM,
    G_TYPE_INT, G_TYPE_STRING,
};

bitflags! {
    /// `VipsArgumentFlags` of an argument.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArgumentFlags: c_uint {
        /// Must be set before the object is built.
        const REQUIRED = vips_sys::VIPS_ARGUMENT_REQUIRED;
        /// Can only be set at construct time.
        const CONSTRUCT = vips_sys::VIPS_ARGUMENT_CONSTRUCT;
        /// Can only be set once.
        const SET_ONCE = vips_sys::VIPS_ARGUMENT_SET_ONCE;
        /// Is always set, even when not required.
        const SET_ALWAYS = vips_sys::VIPS_ARGUMENT_SET_ALWAYS;
        /// An input argument.
        const INPUT = vips_sys::VIPS_ARGUMENT_INPUT;
        /// An output argument.
        const OUTPUT = vips_sys::VIPS_ARGUMENT_OUTPUT;
        /// Kept for compatibility, hidden from documentation.
        const DEPRECATED = vips_sys::VIPS_ARGUMENT_DEPRECATED;
        /// The operation modifies the input in place.
        const MODIFY = vips_sys::VIPS_ARGUMENT_MODIFY;
    }
}

/// What introspection knows about one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentInfo {
    /// Canonical argument name.
    pub name: String,
    /// Type of the values the argument holds.
    pub value_type: GType,
    /// Name of [`ArgumentInfo::value_type`].
    pub type_name: String,
    /// Argument flags.
    pub flags: ArgumentFlags,
    /// Whether the argument is enum typed and accepts nicks.
    pub is_enum: bool,
}

struct Argument {
    pspec: *mut GParamSpec,
    class: *mut VipsArgumentClass,
}

impl Argument {
    fn value_type(&self) -> GType {
        // SAFETY: the pspec is owned by the class, which outlives the object.
        unsafe { (*self.pspec).value_type }
    }
}

/// Fails unless GObject can convert values of `from` into `to`.
fn check_transformable(api: &VipsApi, from: GType, to: GType) -> Result<(), VipsError> {
    if unsafe { (api.g_value_type_transformable)(from, to) } != 0 {
        Ok(())
    } else {
        Err(VipsError::TypeMismatch {
            expected: type_name(to)?,
            found: type_name(from)?,
        })
    }
}

fn lookup(api: &VipsApi, object: &Object, name: &CString) -> Result<Argument, VipsError> {
    let mut pspec: *mut GParamSpec = std::ptr::null_mut();
    let mut class: *mut VipsArgumentClass = std::ptr::null_mut();
    let mut instance: *mut VipsArgumentInstance = std::ptr::null_mut();

    let status = unsafe {
        (api.vips_object_get_argument)(
            object.as_vips_object(),
            name.as_ptr(),
            &mut pspec,
            &mut class,
            &mut instance,
        )
    };

    if status != 0 || pspec.is_null() {
        return Err(VipsError::UnknownArgument {
            name: name.to_string_lossy().into_owned(),
            object: object.describe(),
            message: take_error(api),
        });
    }

    Ok(Argument { pspec, class })
}

/// Looks up an argument by name.
pub fn argument(object: &Object, name: &str) -> Result<ArgumentInfo, VipsError> {
    let api = api()?;
    let c_name = CString::new(name)?;
    let argument = lookup(api, object, &c_name)?;

    // SAFETY: both pointers come from the class and live as long as it does.
    unsafe {
        let pspec = &*argument.pspec;
        let flags = if argument.class.is_null() {
            ArgumentFlags::empty()
        } else {
            ArgumentFlags::from_bits_retain((*argument.class).flags)
        };
        Ok(ArgumentInfo {
            name: string_from_ptr(pspec.name).unwrap_or_else(|| name.to_string()),
            value_type: pspec.value_type,
            type_name: type_name(pspec.value_type)?,
            flags,
            is_enum: (api.g_type_fundamental)(pspec.value_type) == G_TYPE_ENUM,
        })
    }
}

/// Reads a property into a new value of type `g_type`.
///
/// GObject converts between transformable types, e.g. an enum property read
/// as `gint`.
pub fn get_property(
    object: &Object,
    name: &str,
    g_type: GType,
) -> Result<GenericValue, VipsError> {
    let api = api()?;
    let c_name = CString::new(name)?;
    let argument = lookup(api, object, &c_name)?;
    check_transformable(api, argument.value_type(), g_type)?;

    let mut value = GenericValue::new(g_type)?;
    unsafe { (api.g_object_get_property)(object.as_ptr(), c_name.as_ptr(), value.as_mut_ptr()) };
    Ok(value)
}

/// Reads a property with its declared type.
pub fn get_value(object: &Object, name: &str) -> Result<GenericValue, VipsError> {
    let info = argument(object, name)?;
    get_property(object, name, info.value_type)
}

/// Reads a boolean property.
pub fn get_bool(object: &Object, name: &str) -> Result<bool, VipsError> {
    get_property(object, name, vips_sys::G_TYPE_BOOLEAN)?.get_bool()
}

/// Reads an int property. Enum properties yield their integer value.
pub fn get_int(object: &Object, name: &str) -> Result<i32, VipsError> {
    let info = argument(object, name)?;
    let g_type = if info.is_enum {
        info.value_type
    } else {
        vips_sys::G_TYPE_INT
    };
    get_property(object, name, g_type)?.get_int()
}

/// Reads an unsigned 64 bit property.
pub fn get_u64(object: &Object, name: &str) -> Result<u64, VipsError> {
    get_property(object, name, vips_sys::G_TYPE_UINT64)?.get_u64()
}

/// Reads a double property.
pub fn get_double(object: &Object, name: &str) -> Result<f64, VipsError> {
    get_property(object, name, vips_sys::G_TYPE_DOUBLE)?.get_double()
}

/// Reads a string property.
pub fn get_string(object: &Object, name: &str) -> Result<Option<String>, VipsError> {
    get_property(object, name, vips_sys::G_TYPE_STRING)?.get_string()
}

/// Reads an int array property.
pub fn get_int_array(object: &Object, name: &str) -> Result<Vec<i32>, VipsError> {
    let api = api()?;
    get_property(object, name, unsafe { (api.vips_array_int_get_type)() })?.get_int_array()
}

/// Reads a double array property.
pub fn get_double_array(object: &Object, name: &str) -> Result<Vec<f64>, VipsError> {
    let api = api()?;
    get_property(object, name, unsafe { (api.vips_array_double_get_type)() })?.get_double_array()
}

/// Reads a double array property into `out`.
///
/// Copies at most `out.len()` elements and returns how many were written.
pub fn get_double_array_into(
    object: &Object,
    name: &str,
    out: &mut [f64],
) -> Result<usize, VipsError> {
    let values = get_double_array(object, name)?;
    let n = values.len().min(out.len());
    out[..n].copy_from_slice(&values[..n]);
    Ok(n)
}

/// Reads a blob property, returning a new reference.
pub fn get_blob(object: &Object, name: &str) -> Result<Option<Blob>, VipsError> {
    let api = api()?;
    get_property(object, name, unsafe { (api.vips_blob_get_type)() })?.get_blob()
}

/// Reads an image property, returning a new reference.
pub fn get_image(object: &Object, name: &str) -> Result<Option<Image>, VipsError> {
    get_property(object, name, Image::static_type()?)?.get_image()
}

/// Assigns a property.
///
/// When the argument is enum typed, a string value is resolved as a nick of
/// the enum (`"centre"`, `"lanczos3"`, ...) and an int value is taken as the
/// raw enum value. Any other value must be convertible to the argument type,
/// otherwise [`VipsError::TypeMismatch`] is returned and nothing is set.
pub fn set_property(object: &Object, name: &str, value: &GenericValue) -> Result<(), VipsError> {
    let api = api()?;
    let c_name = CString::new(name)?;
    let argument = lookup(api, object, &c_name)?;
    let value_type = argument.value_type();

    let is_enum = unsafe { (api.g_type_fundamental)(value_type) } == G_TYPE_ENUM;
    let resolved = match value.value_type() {
        G_TYPE_STRING if is_enum => {
            let enum_value = unsafe {
                let domain = (api.vips_nickname_find)(object.type_id());
                let nick = (api.g_value_get_string)(value.as_ptr());
                (api.vips_enum_from_nick)(domain, value_type, nick)
            };
            if enum_value < 0 {
                return Err(VipsError::UnknownEnumNick {
                    name: name.to_string(),
                    nick: value.get_string()?.unwrap_or_default(),
                    message: take_error(api),
                });
            }
            Some(GenericValue::from_enum(value_type, enum_value)?)
        }
        G_TYPE_INT if is_enum => Some(GenericValue::from_enum(value_type, value.get_int()?)?),
        found => {
            check_transformable(api, found, value_type)?;
            None
        }
    };

    let value = resolved.as_ref().unwrap_or(value);
    unsafe { (api.g_object_set_property)(object.as_ptr(), c_name.as_ptr(), value.as_ptr()) };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_contains() {
        let flags = ArgumentFlags::REQUIRED | ArgumentFlags::INPUT | ArgumentFlags::CONSTRUCT;
        assert!(flags.contains(ArgumentFlags::INPUT));
        assert!(flags.contains(ArgumentFlags::REQUIRED | ArgumentFlags::INPUT));
        assert!(!flags.contains(ArgumentFlags::OUTPUT));
        assert_eq!(flags.bits(), 19);
    }

    #[test]
    fn flags_from_library_bits() {
        let flags = ArgumentFlags::from_bits_retain(1 | 32);
        assert_eq!(flags, ArgumentFlags::REQUIRED | ArgumentFlags::OUTPUT);
        assert!(format!("{flags:?}").contains("REQUIRED | OUTPUT"));

        // bits from newer libraries survive the round trip
        let unknown = ArgumentFlags::from_bits_retain(1 << 12 | 16);
        assert!(unknown.contains(ArgumentFlags::INPUT));
        assert_eq!(unknown.bits(), 1 << 12 | 16);
        assert!(ArgumentFlags::empty().is_empty());
    }
}
