//! Image cache and operation cache limits against a real libvips.

use std::sync::OnceLock;
use vips_bridge::config::{library_required, REQUIRE_LIBRARY_ENV};
use vips_bridge::{
    cache::{self, CacheLimits, CacheOptions},
    call, Argument, Image, Output, VOption, Vips, VipsConfig, VipsError,
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

fn gradient(width: i32, height: i32) -> Result<Image, VipsError> {
    let mut out = None;
    call(
        "xyz",
        VOption::new()
            .set("width", Argument::Int(width))
            .set("height", Argument::Int(height))
            .out("out", Output::Image(&mut out)),
    )?;
    out.ok_or(VipsError::NullPointer("image"))
}

#[test]
fn cache_with_default_options() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let image = gradient(64, 48)?;
    let cached = cache::cache(&image, &CacheOptions::default())?;
    assert_eq!(cached.width()?, 64);
    assert_eq!(cached.height()?, 48);
    assert_eq!(cached.bands()?, image.bands()?);
    Ok(())
}

#[test]
fn cache_with_tile_options() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let image = gradient(256, 256)?;
    let options = CacheOptions {
        max_tiles: Some(4),
        tile_height: Some(32),
        tile_width: Some(32),
    };
    let cached = cache::cache(&image, &options)?;
    assert_eq!(cached.width()?, 256);

    // pixels are unchanged by the cache
    let mut max = 0.0;
    call(
        "max",
        VOption::new()
            .set("in", Argument::Image(&cached))
            .out("out", Output::Double(&mut max)),
    )?;
    assert_eq!(max, 255.0);
    Ok(())
}

#[test]
fn operation_cache_limits_round_trip() -> Result<(), VipsError> {
    if !init() {
        return Ok(());
    }

    let before = CacheLimits::current()?;
    CacheLimits {
        max_operations: Some(42),
        max_mem: None,
        max_files: Some(17),
    }
    .apply()?;

    let now = CacheLimits::current()?;
    assert_eq!(now.max_operations, Some(42));
    assert_eq!(now.max_files, Some(17));
    assert_eq!(now.max_mem, before.max_mem);
    assert!(cache::size()? >= 0);

    before.apply()?;
    Ok(())
}
