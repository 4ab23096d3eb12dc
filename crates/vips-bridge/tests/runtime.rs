//! Process-wide libvips switches. A single test, so nothing else touches the
//! error buffer while it runs.

use vips_bridge::{
    cache,
    config::{library_required, REQUIRE_LIBRARY_ENV},
    Vips, VipsConfig, VipsError,
};

#[test]
fn runtime_switches_and_error_buffer() -> Result<(), VipsError> {
    let _ = env_logger::builder().is_test(true).try_init();
    if let Err(e) = Vips::init(&VipsConfig::from_env()) {
        if library_required() {
            panic!("{REQUIRE_LIBRARY_ENV} is set: {e}");
        }
        eprintln!("skipping, libvips unavailable: {e}");
        return Ok(());
    }

    assert!(!Vips::version_string()?.is_empty());
    assert!(Vips::get_disc_threshold()? > 0);
    Vips::progress_set(true)?;
    Vips::progress_set(false)?;
    Vips::pipe_read_limit_set(-1)?;
    cache::print()?;

    Vips::error_clear()?;
    Vips::error("bridge", "first %d message")?;
    let buffer = Vips::error_buffer()?;
    assert!(buffer.contains("bridge: first %d message"), "{buffer}");

    Vips::error_freeze()?;
    Vips::error("bridge", "while frozen")?;
    Vips::error_thaw()?;
    assert!(!Vips::error_buffer()?.contains("while frozen"));

    Vips::error_system(2, "bridge", "opening")?;
    assert!(Vips::error_buffer()?.contains("bridge: opening"));

    Vips::error_clear()?;
    assert!(Vips::error_buffer()?.is_empty());
    Ok(())
}
