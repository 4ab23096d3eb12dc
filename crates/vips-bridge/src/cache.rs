use crate::{
    error::VipsError,
    object::Image,
    operation::{call, Argument, Output, VOption},
    runtime::api,
};
use serde::Deserialize;

/// Tile parameters of the `cache` operation, library defaults when unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum number of tiles to keep.
    pub max_tiles: Option<i32>,
    /// Tile height in pixels.
    pub tile_height: Option<i32>,
    /// Tile width in pixels.
    pub tile_width: Option<i32>,
}

impl CacheOptions {
    /// The set options as `(argument name, value)` pairs.
    pub fn arguments(&self) -> Vec<(&'static str, i32)> {
        [
            ("max_tiles", self.max_tiles),
            ("tile_height", self.tile_height),
            ("tile_width", self.tile_width),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
    }
}

/// Wraps `image` in a tile cache.
///
/// Pixels computed from `image` are kept in memory so later requests for the
/// same area are served without recomputation.
pub fn cache(image: &Image, options: &CacheOptions) -> Result<Image, VipsError> {
    let mut out = None;
    let mut voption = VOption::new().set("in", Argument::Image(image));
    for (name, value) in options.arguments() {
        voption = voption.set(name, Argument::Int(value));
    }
    call("cache", voption.out("out", Output::Image(&mut out)))?;
    out.ok_or(VipsError::NullPointer("image"))
}

/// Limits of the libvips operation cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheLimits {
    /// Maximum number of cached operations.
    pub max_operations: Option<i32>,
    /// Maximum memory held by cached operations, in bytes.
    pub max_mem: Option<usize>,
    /// Maximum number of files held open by cached operations.
    pub max_files: Option<i32>,
}

impl CacheLimits {
    /// Applies the set limits, leaving the others untouched.
    pub fn apply(&self) -> Result<(), VipsError> {
        if let Some(max) = self.max_operations {
            set_max(max)?;
        }
        if let Some(max_mem) = self.max_mem {
            set_max_mem(max_mem)?;
        }
        if let Some(max_files) = self.max_files {
            set_max_files(max_files)?;
        }
        Ok(())
    }

    /// Reads the limits currently in force.
    pub fn current() -> Result<Self, VipsError> {
        Ok(Self {
            max_operations: Some(max()?),
            max_mem: Some(max_mem()?),
            max_files: Some(max_files()?),
        })
    }
}

/// Sets the maximum number of cached operations.
pub fn set_max(max: i32) -> Result<(), VipsError> {
    let api = api()?;
    unsafe { (api.vips_cache_set_max)(max) };
    Ok(())
}

/// Maximum number of cached operations.
pub fn max() -> Result<i32, VipsError> {
    let api = api()?;
    Ok(unsafe { (api.vips_cache_get_max)() })
}

/// Sets the maximum memory held by cached operations.
pub fn set_max_mem(max_mem: usize) -> Result<(), VipsError> {
    let api = api()?;
    unsafe { (api.vips_cache_set_max_mem)(max_mem) };
    Ok(())
}

/// Maximum memory held by cached operations.
pub fn max_mem() -> Result<usize, VipsError> {
    let api = api()?;
    Ok(unsafe { (api.vips_cache_get_max_mem)() })
}

/// Sets the maximum number of files held open by cached operations.
pub fn set_max_files(max_files: i32) -> Result<(), VipsError> {
    let api = api()?;
    unsafe { (api.vips_cache_set_max_files)(max_files) };
    Ok(())
}

/// Maximum number of files held open by cached operations.
pub fn max_files() -> Result<i32, VipsError> {
    let api = api()?;
    Ok(unsafe { (api.vips_cache_get_max_files)() })
}

/// Number of operations currently cached.
pub fn size() -> Result<i32, VipsError> {
    let api = api()?;
    Ok(unsafe { (api.vips_cache_get_size)() })
}

/// Prints the cache contents at shutdown.
pub fn set_dump(dump: bool) -> Result<(), VipsError> {
    let api = api()?;
    unsafe { (api.vips_cache_set_dump)(dump.into()) };
    Ok(())
}

/// Logs cache hits and misses to stdout.
pub fn set_trace(trace: bool) -> Result<(), VipsError> {
    let api = api()?;
    unsafe { (api.vips_cache_set_trace)(trace.into()) };
    Ok(())
}

/// Drops every cached operation.
pub fn drop_all() -> Result<(), VipsError> {
    let api = api()?;
    unsafe { (api.vips_cache_drop_all)() };
    Ok(())
}

/// Prints the cached operations to stdout.
pub fn print() -> Result<(), VipsError> {
    let api = api()?;
    unsafe { (api.vips_cache_print)() };
    Ok(())
}
