use libloading::Library;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable holding an explicit path to the libvips shared library.
pub const VIPS_LIBRARY_ENV: &str = "VIPS_LIBRARY_PATH";

/// Environment variable holding an explicit path to the GObject shared library.
pub const GOBJECT_LIBRARY_ENV: &str = "GOBJECT_LIBRARY_PATH";

/// Error raised while opening the native libraries or resolving their symbols.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// None of the candidate paths could be opened.
    #[error("Could not open {name}, tried {candidates:?}. {source}")]
    LibraryNotFound {
        /// Human readable library name.
        name: &'static str,
        /// Every path or soname that was tried.
        candidates: Vec<String>,
        /// Error of the last attempt.
        source: libloading::Error,
    },

    /// A required entry point is not exported by any opened library.
    #[error("Symbol {symbol} is not exported by the loaded libraries. {source}")]
    MissingSymbol {
        /// Name of the missing symbol.
        symbol: &'static str,
        /// Error of the last lookup.
        source: libloading::Error,
    },
}

/// Where to find the native libraries.
///
/// Unset fields fall back to the platform's usual sonames, resolved through
/// the dynamic loader search path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Path to libvips.
    pub vips: Option<PathBuf>,
    /// Path to libgobject. Only needed where symbols of dependencies are not
    /// visible through the libvips handle.
    pub gobject: Option<PathBuf>,
}

impl LibraryConfig {
    /// Builds a config from [`VIPS_LIBRARY_ENV`] and [`GOBJECT_LIBRARY_ENV`].
    pub fn from_env() -> Self {
        Self {
            vips: std::env::var_os(VIPS_LIBRARY_ENV).map(PathBuf::from),
            gobject: std::env::var_os(GOBJECT_LIBRARY_ENV).map(PathBuf::from),
        }
    }

    /// Candidate names for libvips, explicit path first.
    pub fn vips_candidates(&self) -> Vec<String> {
        candidates(self.vips.as_ref(), default_vips_names())
    }

    /// Candidate names for libgobject, explicit path first.
    pub fn gobject_candidates(&self) -> Vec<String> {
        candidates(self.gobject.as_ref(), default_gobject_names())
    }

    /// Opens libvips and, when available, libgobject.
    ///
    /// libvips is mandatory. A missing libgobject is only logged since on
    /// ELF and Mach-O platforms its symbols resolve through the libvips handle.
    pub fn open(&self) -> Result<Vec<Library>, LoadError> {
        let mut libraries = vec![open_first("libvips", self.vips_candidates())?];
        match open_first("libgobject", self.gobject_candidates()) {
            Ok(gobject) => libraries.push(gobject),
            Err(e) => log::debug!("{e}"),
        }
        Ok(libraries)
    }
}

fn candidates(explicit: Option<&PathBuf>, defaults: &[&str]) -> Vec<String> {
    match explicit {
        Some(path) => vec![path.to_string_lossy().into_owned()],
        None => defaults.iter().map(|name| name.to_string()).collect(),
    }
}

fn open_first(name: &'static str, candidates: Vec<String>) -> Result<Library, LoadError> {
    let mut last_error = None;
    for candidate in &candidates {
        // SAFETY: loading runs the library initialisers, libvips and glib have
        // no initialisers with preconditions.
        match unsafe { Library::new(candidate) } {
            Ok(library) => {
                log::debug!("Loaded {name} from {candidate}");
                return Ok(library);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(LoadError::LibraryNotFound {
        name,
        source: last_error.unwrap_or(libloading::Error::DlOpenUnknown),
        candidates,
    })
}

#[cfg(target_os = "windows")]
fn default_vips_names() -> &'static [&'static str] {
    &["libvips-42.dll", "vips.dll"]
}

#[cfg(target_os = "windows")]
fn default_gobject_names() -> &'static [&'static str] {
    &["libgobject-2.0-0.dll", "gobject-2.0-0.dll"]
}

#[cfg(target_os = "macos")]
fn default_vips_names() -> &'static [&'static str] {
    &[
        "libvips.42.dylib",
        "/opt/homebrew/lib/libvips.42.dylib",
        "/usr/local/lib/libvips.42.dylib",
    ]
}

#[cfg(target_os = "macos")]
fn default_gobject_names() -> &'static [&'static str] {
    &[
        "libgobject-2.0.0.dylib",
        "/opt/homebrew/lib/libgobject-2.0.0.dylib",
        "/usr/local/lib/libgobject-2.0.0.dylib",
    ]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_vips_names() -> &'static [&'static str] {
    &["libvips.so.42", "libvips.so"]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_gobject_names() -> &'static [&'static str] {
    &["libgobject-2.0.so.0", "libgobject-2.0.so"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_replaces_defaults() {
        let config = LibraryConfig {
            vips: Some(PathBuf::from("/opt/vips/lib/libvips.so.42")),
            gobject: None,
        };
        assert_eq!(
            config.vips_candidates(),
            vec!["/opt/vips/lib/libvips.so.42".to_string()]
        );
        assert_eq!(config.gobject_candidates().len(), default_gobject_names().len());
    }

    #[test]
    fn deserialize_partial_config() -> Result<(), serde_json::Error> {
        let config: LibraryConfig = serde_json::from_str(r#"{ "vips": "/tmp/libvips.so" }"#)?;
        assert_eq!(config.vips, Some(PathBuf::from("/tmp/libvips.so")));
        assert_eq!(config.gobject, None);

        let config: LibraryConfig = serde_json::from_str("{}")?;
        assert_eq!(config, LibraryConfig::default());
        Ok(())
    }

    #[test]
    fn missing_library_reports_candidates() {
        let config = LibraryConfig {
            vips: Some(PathBuf::from("/nonexistent/libvips-bridge-test.so")),
            gobject: None,
        };
        match config.open() {
            Err(LoadError::LibraryNotFound {
                name, candidates, ..
            }) => {
                assert_eq!(name, "libvips");
                assert_eq!(candidates, vec!["/nonexistent/libvips-bridge-test.so"]);
            }
            other => panic!("expected LibraryNotFound, got {:?}", other.map(|l| l.len())),
        }
    }
}
