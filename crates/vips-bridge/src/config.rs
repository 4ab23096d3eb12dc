use crate::{cache::CacheLimits, error::VipsError};
use serde::Deserialize;
use vips_sys::LibraryConfig;

/// Environment variable overriding [`VipsConfig::program_name`].
pub const PROGRAM_ENV: &str = "VIPS_BRIDGE_PROGRAM";

/// Environment variable enabling [`VipsConfig::leak_detection`] (`1` or `true`).
pub const LEAK_ENV: &str = "VIPS_BRIDGE_LEAK";

/// Environment variable setting [`VipsConfig::concurrency`].
pub const CONCURRENCY_ENV: &str = "VIPS_BRIDGE_CONCURRENCY";

/// Environment variable making tests fail instead of skip when libvips
/// cannot be loaded (`1` or `true`).
pub const REQUIRE_LIBRARY_ENV: &str = "VIPS_BRIDGE_REQUIRE_LIB";

fn is_enabled(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes")
}

/// Whether [`REQUIRE_LIBRARY_ENV`] is set.
///
/// Test helpers call this when [`crate::Vips::init`] fails to decide between
/// skipping and failing.
pub fn library_required() -> bool {
    std::env::var(REQUIRE_LIBRARY_ENV).is_ok_and(|value| is_enabled(&value))
}

/// Settings applied by [`crate::Vips::init`].
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use vips_bridge::VipsConfig;
///
/// let config = VipsConfig::from_json(
///     r#"{ "concurrency": 2, "cache": { "max_operations": 0 } }"#,
/// )
/// .unwrap();
/// assert_eq!(config.concurrency, Some(2));
/// assert_eq!(config.cache.max_operations, Some(0));
/// assert_eq!(config.program_name, "vips-bridge");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VipsConfig {
    /// Name passed to `vips_init`, used in library messages.
    pub program_name: String,
    /// Where to find the shared libraries.
    pub library: LibraryConfig,
    /// Report leaked references at shutdown.
    pub leak_detection: bool,
    /// Worker threads per pipeline, library default when unset.
    pub concurrency: Option<i32>,
    /// Operation cache limits.
    pub cache: CacheLimits,
}

impl Default for VipsConfig {
    fn default() -> Self {
        Self {
            program_name: "vips-bridge".to_string(),
            library: LibraryConfig::default(),
            leak_detection: false,
            concurrency: None,
            cache: CacheLimits::default(),
        }
    }
}

impl VipsConfig {
    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, VipsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a config from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::from_vars(|key| std::env::var(key).ok());
        config.library = LibraryConfig::from_env();
        config
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(program_name) = var(PROGRAM_ENV) {
            config.program_name = program_name;
        }
        if let Some(leak) = var(LEAK_ENV) {
            config.leak_detection = is_enabled(&leak);
        }
        match var(CONCURRENCY_ENV).map(|value| value.trim().parse::<i32>()) {
            Some(Ok(concurrency)) => config.concurrency = Some(concurrency),
            Some(Err(e)) => log::warn!("Ignoring {CONCURRENCY_ENV}: {e}"),
            None => {}
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = VipsConfig::default();
        assert_eq!(config.program_name, "vips-bridge");
        assert!(!config.leak_detection);
        assert_eq!(config.concurrency, None);
        assert_eq!(config.cache, CacheLimits::default());
    }

    #[test]
    fn from_json_nested() -> Result<(), VipsError> {
        let config = VipsConfig::from_json(
            r#"{
                "program_name": "thumbnailer",
                "library": { "vips": "/opt/vips/lib/libvips.so.42" },
                "leak_detection": true,
                "cache": { "max_mem": 1048576, "max_files": 10 }
            }"#,
        )?;
        assert_eq!(config.program_name, "thumbnailer");
        assert!(config.leak_detection);
        assert_eq!(
            config.library.vips.as_deref(),
            Some(std::path::Path::new("/opt/vips/lib/libvips.so.42"))
        );
        assert_eq!(config.cache.max_mem, Some(1048576));
        assert_eq!(config.cache.max_files, Some(10));
        assert_eq!(config.cache.max_operations, None);
        Ok(())
    }

    #[test]
    fn from_json_rejects_bad_types() {
        assert!(matches!(
            VipsConfig::from_json(r#"{ "concurrency": "many" }"#),
            Err(VipsError::Config(_))
        ));
    }

    #[test]
    fn from_vars() {
        let vars: HashMap<&str, &str> = [
            (PROGRAM_ENV, "worker"),
            (LEAK_ENV, "1"),
            (CONCURRENCY_ENV, " 4 "),
        ]
        .into_iter()
        .collect();
        let config = VipsConfig::from_vars(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.program_name, "worker");
        assert!(config.leak_detection);
        assert_eq!(config.concurrency, Some(4));
    }

    #[test]
    fn enabled_values() {
        assert!(is_enabled("1"));
        assert!(is_enabled(" true\n"));
        assert!(!is_enabled("0"));
        assert!(!is_enabled(""));
    }

    #[test]
    fn from_vars_ignores_invalid_concurrency() {
        let config = VipsConfig::from_vars(|key| {
            (key == CONCURRENCY_ENV).then(|| "lots".to_string())
        });
        assert_eq!(config.concurrency, None);
    }
}
