//! These tests drive a real libvips and are skipped when it cannot be loaded.

use approx::assert_relative_eq;
use std::sync::OnceLock;
use vips_bridge::config::{library_required, REQUIRE_LIBRARY_ENV};
use vips_bridge::{
    call, object, property, Argument, GenericValue, Image, Operation, Output, VOption, Vips,
    VipsConfig, VipsError,
};

fn init() -> bool {
    static STARTED: OnceLock<bool> = OnceLock::new();
    *STARTED.get_or_init(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        match Vips::init(&VipsConfig::from_env()) {
            Ok(()) => true,
            Err(e) if library_required() => panic!("{REQUIRE_LIBRARY_ENV} is set: {e}"),
            Err(e) => {
                eprintln!("skipping, libvips unavailable: {e}");
                false
            }
        }
    })
}

fn black(width: i32, height: i32, bands: i32) -> Result<Image, VipsError> {
    let mut out = None;
    call(
        "black",
        VOption::new()
            .set("width", Argument::Int(width))
            .set("height", Argument::Int(height))
            .set("bands", Argument::Int(bands))
            .out("out", Output::Image(&mut out)),
    )?;
    out.ok_or(VipsError::NullPointer("image"))
}

#[test]
fn generic_values_hold_what_was_set() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    assert!(GenericValue::from_bool(true)?.get_bool()?);
    assert_eq!(GenericValue::from_int(-7)?.get_int()?, -7);
    assert_eq!(GenericValue::from_u64(u64::MAX)?.get_u64()?, u64::MAX);
    assert_relative_eq!(GenericValue::from_double(0.25)?.get_double()?, 0.25);
    assert_eq!(
        GenericValue::from_string("lanczos3")?.get_string()?,
        Some("lanczos3".to_string())
    );
    assert_eq!(GenericValue::from_int_array(&[1, 2, 3])?.get_int_array()?, vec![1, 2, 3]);
    assert_eq!(
        GenericValue::from_double_array(&[0.5, 1.5])?.get_double_array()?,
        vec![0.5, 1.5]
    );

    let blob = GenericValue::from_bytes(b"\x89PNG")?
        .get_blob()?
        .ok_or(VipsError::NullPointer("blob"))?;
    assert_eq!(blob.as_bytes(), b"\x89PNG");

    Ok(())
}

#[test]
fn reading_the_wrong_type_fails() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let value = GenericValue::from_double(1.0)?;
    assert!(matches!(value.get_int(), Err(VipsError::TypeMismatch { .. })));
    assert!(matches!(value.get_image(), Err(VipsError::TypeMismatch { .. })));
    Ok(())
}

#[test]
fn int_and_double_array_properties() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let operation = Operation::new("linear")?;
    operation.set("a", &Argument::DoubleArray(&[1.0, 2.0, 3.0]))?;
    operation.set("b", &Argument::DoubleArray(&[0.5]))?;
    operation.set("uchar", &Argument::Bool(true))?;

    let object = operation.as_object();
    assert_eq!(property::get_double_array(object, "a")?, vec![1.0, 2.0, 3.0]);
    assert!(property::get_bool(object, "uchar")?);

    let mut short = [0.0; 2];
    assert_eq!(property::get_double_array_into(object, "a", &mut short)?, 2);
    assert_eq!(short, [1.0, 2.0]);

    let mut long = [9.0; 4];
    assert_eq!(property::get_double_array_into(object, "b", &mut long)?, 1);
    assert_eq!(long, [0.5, 9.0, 9.0, 9.0]);

    Ok(())
}

#[test]
fn enum_property_from_nick() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let operation = Operation::new("embed")?;
    let info = property::argument(operation.as_object(), "extend")?;
    assert!(info.is_enum);
    assert!(info.flags.contains(property::ArgumentFlags::INPUT));

    operation.set("extend", &Argument::Str("copy"))?;
    // VIPS_EXTEND_COPY
    assert_eq!(property::get_int(operation.as_object(), "extend")?, 1);

    // the integer path assigns enums directly
    operation.set("extend", &Argument::Int(3))?;
    assert_eq!(property::get_int(operation.as_object(), "extend")?, 3);

    let err = operation.set("extend", &Argument::Str("not-a-mode"));
    assert!(matches!(err, Err(VipsError::UnknownEnumNick { .. })));

    Ok(())
}

#[test]
fn unknown_argument_is_reported() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let operation = Operation::new("black")?;
    match operation.set("no_such_argument", &Argument::Int(1)) {
        Err(VipsError::UnknownArgument { name, .. }) => assert_eq!(name, "no_such_argument"),
        other => panic!("expected UnknownArgument, got {other:?}"),
    }
    assert!(matches!(
        property::get_int(operation.as_object(), "no_such_argument"),
        Err(VipsError::UnknownArgument { .. })
    ));
    assert!(matches!(
        Operation::new("no_such_operation"),
        Err(VipsError::Operation { .. })
    ));

    Ok(())
}

#[test]
fn string_and_blob_properties() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let operation = Operation::new("jpegload_buffer")?;
    let bytes = [0xffu8, 0xd8, 0xff, 0xe0];
    operation.set("buffer", &Argument::Blob(&bytes))?;
    let blob = property::get_blob(operation.as_object(), "buffer")?
        .ok_or(VipsError::NullPointer("blob"))?;
    assert_eq!(blob.as_bytes(), &bytes);

    let operation = Operation::new("jpegsave")?;
    operation.set("profile", &Argument::Str("srgb"))?;
    assert_eq!(
        property::get_string(operation.as_object(), "profile")?,
        Some("srgb".to_string())
    );

    Ok(())
}

#[test]
fn operation_outputs_are_read_back() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let image = black(16, 8, 3)?;
    assert_eq!(image.width()?, 16);
    assert_eq!(image.height()?, 8);
    assert_eq!(image.bands()?, 3);
    assert_eq!(image.type_name()?, "VipsImage");

    let mut average = -1.0;
    call(
        "avg",
        VOption::new()
            .set("in", Argument::Image(&image))
            .out("out", Output::Double(&mut average)),
    )?;
    assert_relative_eq!(average, 0.0);

    let mut joined = None;
    let parts = [black(4, 4, 1)?, black(4, 4, 1)?];
    call(
        "bandjoin",
        VOption::new()
            .set("in", Argument::Images(&parts))
            .out("out", Output::Image(&mut joined)),
    )?;
    assert_eq!(joined.ok_or(VipsError::NullPointer("image"))?.bands()?, 2);

    Ok(())
}

#[test]
fn failing_build_returns_error_buffer() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    // width is required
    let result = call("black", VOption::new().set("height", Argument::Int(4)));
    match result {
        Err(VipsError::Operation { operation, .. }) => assert_eq!(operation, "black"),
        other => panic!("expected Operation error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn reading_an_incompatible_property_fails() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let operation = Operation::new("linear")?;
    operation.set("in", &Argument::Image(&black(2, 2, 1)?))?;
    match property::get_double(operation.as_object(), "in") {
        Err(VipsError::TypeMismatch { expected, found }) => {
            assert_eq!(expected, "gdouble");
            assert_eq!(found, "VipsImage");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    assert!(matches!(
        property::get_image(operation.as_object(), "uchar"),
        Err(VipsError::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn assigning_an_incompatible_value_fails() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let operation = Operation::new("avg")?;
    assert!(matches!(
        operation.set("in", &Argument::Double(1.0)),
        Err(VipsError::TypeMismatch { .. })
    ));

    // nothing was assigned, so the build still lacks its input
    let result = operation.build();
    assert!(matches!(result, Err(VipsError::Operation { .. })));

    // numbers still convert between each other
    let operation = Operation::new("black")?;
    operation.set("width", &Argument::Double(12.0))?;
    assert_eq!(property::get_int(operation.as_object(), "width")?, 12);
    Ok(())
}

#[test]
fn unsigned_64_bit_property() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let operation = Operation::new("rawload")?;
    let offset = u64::from(u32::MAX) + 4096;
    operation.set("offset", &Argument::UInt64(offset))?;
    assert_eq!(property::get_u64(operation.as_object(), "offset")?, offset);
    Ok(())
}

#[test]
fn object_arguments_are_type_checked() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let image = black(6, 5, 1)?;
    let mut average = -1.0;
    call(
        "avg",
        VOption::new()
            .set("in", Argument::Object(&image))
            .out("out", Output::Double(&mut average)),
    )?;
    assert_relative_eq!(average, 0.0);

    let blob = vips_bridge::Blob::copy_from_slice(&[0xff, 0xd8, 0xff])?;
    let source = object::source_from_blob(&blob)?;
    assert_eq!(source.type_name()?, "VipsSource");

    let operation = Operation::new("jpegload_source")?;
    operation.set("source", &Argument::Object(&source))?;
    assert!(matches!(
        operation.set("source", &Argument::Object(&image)),
        Err(VipsError::TypeMismatch { .. })
    ));

    let target = object::target_to_memory()?;
    assert_eq!(target.type_name()?, "VipsTarget");
    Ok(())
}

#[test]
fn double_array_output_into_slice() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let image = black(3, 3, 3)?;
    let mut pixel = [9.0; 4];
    call(
        "getpoint",
        VOption::new()
            .set("in", Argument::Image(&image))
            .set("x", Argument::Int(1))
            .set("y", Argument::Int(1))
            .out("out_array", Output::DoubleSlice(&mut pixel)),
    )?;
    assert_eq!(pixel, [0.0, 0.0, 0.0, 9.0]);

    let mut short = [9.0; 2];
    call(
        "getpoint",
        VOption::new()
            .set("in", Argument::Image(&image))
            .set("x", Argument::Int(0))
            .set("y", Argument::Int(2))
            .out("out_array", Output::DoubleSlice(&mut short)),
    )?;
    assert_eq!(short, [0.0, 0.0]);
    Ok(())
}
