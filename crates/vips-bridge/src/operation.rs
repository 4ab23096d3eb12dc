use crate::{
    error::VipsError,
    object::{Blob, Image, Object},
    property,
    runtime::{api, take_error},
    value::GenericValue,
};
use std::ffi::CString;
use vips_sys::{VipsObject, VipsOperation};

/// An input argument of an operation.
#[derive(Debug, Clone, Copy)]
pub enum Argument<'a> {
    /// `gboolean`.
    Bool(bool),
    /// `gint`, also accepted by enum arguments.
    Int(i32),
    /// `guint64`.
    UInt64(u64),
    /// `gdouble`.
    Double(f64),
    /// String, resolved as a nick for enum arguments.
    Str(&'a str),
    /// `VipsArrayInt`.
    IntArray(&'a [i32]),
    /// `VipsArrayDouble`.
    DoubleArray(&'a [f64]),
    /// `VipsArrayImage`.
    Images(&'a [Image]),
    /// `VipsBlob`, the bytes are copied.
    Blob(&'a [u8]),
    /// `VipsImage`.
    Image(&'a Image),
    /// Any other object, e.g. a `VipsSource` or `VipsTarget`.
    Object(&'a Object),
}

impl Argument<'_> {
    /// Boxes the argument into a generic value.
    pub fn to_value(&self) -> Result<GenericValue, VipsError> {
        match *self {
            Argument::Bool(v) => GenericValue::from_bool(v),
            Argument::Int(v) => GenericValue::from_int(v),
            Argument::UInt64(v) => GenericValue::from_u64(v),
            Argument::Double(v) => GenericValue::from_double(v),
            Argument::Str(v) => GenericValue::from_string(v),
            Argument::IntArray(v) => GenericValue::from_int_array(v),
            Argument::DoubleArray(v) => GenericValue::from_double_array(v),
            Argument::Images(v) => GenericValue::from_images(v),
            Argument::Blob(v) => GenericValue::from_bytes(v),
            Argument::Image(v) => GenericValue::from_object(v),
            Argument::Object(v) => GenericValue::from_object(v),
        }
    }
}

/// An output argument of an operation, filled after a successful build.
#[derive(Debug)]
pub enum Output<'a> {
    /// `gboolean`.
    Bool(&'a mut bool),
    /// `gint` or enum.
    Int(&'a mut i32),
    /// `gdouble`.
    Double(&'a mut f64),
    /// `VipsArrayDouble`.
    DoubleArray(&'a mut Vec<f64>),
    /// `VipsArrayDouble` copied into a caller buffer. Fills at most the
    /// buffer length and leaves the rest untouched.
    DoubleSlice(&'a mut [f64]),
    /// `VipsArrayInt`.
    IntArray(&'a mut Vec<i32>),
    /// String.
    Str(&'a mut Option<String>),
    /// `VipsBlob`.
    Blob(&'a mut Option<Blob>),
    /// `VipsImage`.
    Image(&'a mut Option<Image>),
}

impl Output<'_> {
    fn read(self, object: &Object, name: &str) -> Result<(), VipsError> {
        match self {
            Output::Bool(out) => *out = property::get_bool(object, name)?,
            Output::Int(out) => *out = property::get_int(object, name)?,
            Output::Double(out) => *out = property::get_double(object, name)?,
            Output::DoubleArray(out) => *out = property::get_double_array(object, name)?,
            Output::DoubleSlice(out) => {
                property::get_double_array_into(object, name, out)?;
            }
            Output::IntArray(out) => *out = property::get_int_array(object, name)?,
            Output::Str(out) => *out = property::get_string(object, name)?,
            Output::Blob(out) => *out = property::get_blob(object, name)?,
            Output::Image(out) => *out = property::get_image(object, name)?,
        }
        Ok(())
    }
}

/// Named arguments of one operation call, inputs set in insertion order.
///
/// ```no_run
/// use vips_bridge::{call, Argument, Output, VOption};
///
/// let mut out = None;
/// call(
///     "black",
///     VOption::new()
///         .set("width", Argument::Int(64))
///         .set("height", Argument::Int(32))
///         .out("out", Output::Image(&mut out)),
/// )
/// .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct VOption<'a> {
    inputs: Vec<(String, Argument<'a>)>,
    outputs: Vec<(String, Output<'a>)>,
}

impl<'a> VOption<'a> {
    /// An empty option list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input argument.
    pub fn set(mut self, name: &str, value: Argument<'a>) -> Self {
        self.inputs.push((name.to_string(), value));
        self
    }

    /// Adds an output argument.
    pub fn out(mut self, name: &str, value: Output<'a>) -> Self {
        self.outputs.push((name.to_string(), value));
        self
    }

    /// Input arguments in insertion order.
    pub fn inputs(&self) -> &[(String, Argument<'a>)] {
        &self.inputs
    }

    /// Names of the output arguments in insertion order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(name, _)| name.as_str())
    }
}

/// An instance of a libvips operation.
#[derive(Debug, Clone)]
pub struct Operation {
    object: Object,
    nickname: String,
}

impl Operation {
    /// Creates an unbuilt operation by nickname, e.g. `"resize"`.
    pub fn new(nickname: &str) -> Result<Self, VipsError> {
        let api = api()?;
        let c_nickname = CString::new(nickname)?;
        let ptr = unsafe { (api.vips_operation_new)(c_nickname.as_ptr()) };
        // SAFETY: vips_operation_new returns a new reference or null.
        match unsafe { Object::from_raw(ptr.cast()) } {
            Some(object) => Ok(Self {
                object,
                nickname: nickname.to_string(),
            }),
            None => Err(VipsError::Operation {
                operation: nickname.to_string(),
                message: take_error(api),
            }),
        }
    }

    /// The operation as a plain object.
    pub fn as_object(&self) -> &Object {
        &self.object
    }

    /// Nickname the operation was created with.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Sets one input argument.
    pub fn set(&self, name: &str, value: &Argument) -> Result<(), VipsError> {
        let value = value.to_value()?;
        property::set_property(&self.object, name, &value)
    }

    /// Builds the operation through the operation cache.
    ///
    /// On a cache hit the returned operation is the cached instance. On
    /// failure the partially built outputs are released.
    pub fn build(self) -> Result<Self, VipsError> {
        let api = api()?;
        let Operation { object, nickname } = self;
        let mut ptr = object.into_raw() as *mut VipsOperation;

        let status = unsafe { (api.vips_cache_operation_buildp)(&mut ptr) };
        if status != 0 {
            let message = take_error(api);
            unsafe {
                (api.vips_object_unref_outputs)(ptr as *mut VipsObject);
                (api.g_object_unref)(ptr.cast());
            }
            return Err(VipsError::Operation {
                operation: nickname,
                message,
            });
        }

        // SAFETY: buildp leaves one reference to the (possibly cached) operation.
        let object = unsafe { Object::from_raw(ptr.cast()) }
            .ok_or(VipsError::NullPointer("operation"))?;
        Ok(Self { object, nickname })
    }

    /// Drops the references the operation holds on its outputs.
    pub fn unref_outputs(&self) -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_object_unref_outputs)(self.object.as_vips_object()) };
        Ok(())
    }
}

/// Runs an operation: set inputs, build, read outputs.
pub fn call(nickname: &str, options: VOption) -> Result<(), VipsError> {
    log::debug!("vips call {nickname}");
    let VOption { inputs, outputs } = options;

    let operation = Operation::new(nickname)?;
    for (name, value) in &inputs {
        operation.set(name, value)?;
    }
    let operation = operation.build()?;

    let result = outputs
        .into_iter()
        .try_for_each(|(name, out)| out.read(operation.as_object(), &name));
    operation.unref_outputs()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voption_keeps_order_and_splits_outputs() {
        let mut out: Option<Image> = None;
        let mut x = 0;
        let scale = [1.0, 2.0];
        let options = VOption::new()
            .set("in", Argument::Int(3))
            .set("a", Argument::DoubleArray(&scale))
            .out("out", Output::Image(&mut out))
            .out("x", Output::Int(&mut x))
            .set("interpretation", Argument::Str("srgb"));

        let names: Vec<&str> = options.inputs().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["in", "a", "interpretation"]);
        assert_eq!(options.output_names().collect::<Vec<_>>(), ["out", "x"]);
    }

    #[test]
    fn call_without_library() {
        // the symbol table is process wide, only meaningful when nothing loaded it
        if vips_sys::get().is_some() {
            return;
        }
        assert!(matches!(
            call("black", VOption::new()),
            Err(VipsError::NotLoaded)
        ));
        assert!(matches!(Argument::Int(1).to_value(), Err(VipsError::NotLoaded)));
    }
}
