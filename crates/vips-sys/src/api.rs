use crate::library::{LibraryConfig, LoadError};
use crate::types::*;
use libloading::Library;
use std::ffi::{c_char, c_int, c_void};
use std::sync::OnceLock;

static API: OnceLock<VipsApi> = OnceLock::new();

/// Opens the native libraries once per process and returns the symbol table.
///
/// Later calls return the table from the first successful load and ignore
/// `config`.
pub fn load(config: &LibraryConfig) -> Result<&'static VipsApi, LoadError> {
    if let Some(api) = API.get() {
        return Ok(api);
    }
    let api = VipsApi::open(config)?;
    // a concurrent loader may have won the race, its table is kept
    Ok(API.get_or_init(|| api))
}

/// Returns the symbol table if [`load`] succeeded before.
pub fn get() -> Option<&'static VipsApi> {
    API.get()
}

/// Resolves a symbol from the first library exporting it.
///
/// # Safety
///
/// `T` must be the exact function pointer type of the symbol.
unsafe fn lookup<T: Copy>(libraries: &[Library], symbol: &'static str) -> Result<T, LoadError> {
    let mut last_error = None;
    for library in libraries {
        match library.get::<T>(symbol.as_bytes()) {
            Ok(resolved) => return Ok(*resolved),
            Err(e) => last_error = Some(e),
        }
    }
    Err(LoadError::MissingSymbol {
        symbol,
        source: last_error.unwrap_or(libloading::Error::DlSymUnknown),
    })
}

macro_rules! symbols {
    (
        $( fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?; )*
        variadic {
            $( fn $vname:ident($($varg:ident: $vty:ty),* $(,)?) $(-> $vret:ty)?; )*
        }
    ) => {
        /// Entry points of libvips and GObject resolved at run time.
        ///
        /// Every field is a raw C function pointer; calling one is `unsafe`
        /// with the contract documented by the C library.
        #[allow(missing_docs)]
        pub struct VipsApi {
            // keeps the function pointers below valid
            _libraries: Vec<Library>,
            $( pub $name: unsafe extern "C" fn($($arg: $ty),*) $(-> $ret)?, )*
            $( pub $vname: unsafe extern "C" fn($($varg: $vty,)* ...) $(-> $vret)?, )*
        }

        impl VipsApi {
            /// Opens the libraries described by `config` and resolves every symbol.
            pub fn open(config: &LibraryConfig) -> Result<Self, LoadError> {
                let libraries = config.open()?;
                // SAFETY: each type below matches the C prototype of the symbol.
                unsafe {
                    Ok(Self {
                        $( $name: lookup(&libraries, stringify!($name))?, )*
                        $( $vname: lookup(&libraries, stringify!($vname))?, )*
                        _libraries: libraries,
                    })
                }
            }
        }

        impl std::fmt::Debug for VipsApi {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct("VipsApi")
                    .field("libraries", &self._libraries.len())
                    $( .field(stringify!($name), &(self.$name as *const c_void)) )*
                    $( .field(stringify!($vname), &(self.$vname as *const c_void)) )*
                    .finish()
            }
        }
    };
}

symbols! {
    // gobject: generic values
    fn g_value_init(value: *mut GValue, g_type: GType) -> *mut GValue;
    fn g_value_unset(value: *mut GValue);
    fn g_value_set_boolean(value: *mut GValue, v_boolean: gboolean);
    fn g_value_get_boolean(value: *const GValue) -> gboolean;
    fn g_value_set_int(value: *mut GValue, v_int: c_int);
    fn g_value_get_int(value: *const GValue) -> c_int;
    fn g_value_set_uint64(value: *mut GValue, v_uint64: u64);
    fn g_value_get_uint64(value: *const GValue) -> u64;
    fn g_value_set_double(value: *mut GValue, v_double: f64);
    fn g_value_get_double(value: *const GValue) -> f64;
    fn g_value_set_string(value: *mut GValue, v_string: *const c_char);
    fn g_value_get_string(value: *const GValue) -> *const c_char;
    fn g_value_dup_string(value: *const GValue) -> *mut c_char;
    fn g_value_set_enum(value: *mut GValue, v_enum: c_int);
    fn g_value_get_enum(value: *const GValue) -> c_int;
    fn g_value_set_boxed(value: *mut GValue, v_boxed: *const c_void);
    fn g_value_get_boxed(value: *const GValue) -> *mut c_void;
    fn g_value_dup_boxed(value: *const GValue) -> *mut c_void;
    fn g_value_set_object(value: *mut GValue, v_object: *mut c_void);
    fn g_value_get_object(value: *const GValue) -> *mut c_void;

    // gobject: types and objects
    fn g_type_name(g_type: GType) -> *const c_char;
    fn g_type_fundamental(g_type: GType) -> GType;
    fn g_type_is_a(g_type: GType, is_a_type: GType) -> gboolean;
    fn g_value_type_transformable(src_type: GType, dest_type: GType) -> gboolean;
    fn g_object_ref(object: *mut c_void) -> *mut c_void;
    fn g_object_unref(object: *mut c_void);
    fn g_object_get_property(
        object: *mut GObject,
        property_name: *const c_char,
        value: *mut GValue,
    );
    fn g_object_set_property(
        object: *mut GObject,
        property_name: *const c_char,
        value: *const GValue,
    );
    fn g_free(mem: *mut c_void);

    // vips: runtime
    fn vips_init(argv0: *const c_char) -> c_int;
    fn vips_shutdown();
    fn vips_thread_shutdown();
    fn vips_version_string() -> *const c_char;
    fn vips_leak_set(leak: gboolean);
    fn vips_concurrency_set(concurrency: c_int);
    fn vips_concurrency_get() -> c_int;
    fn vips_tracked_get_mem() -> usize;
    fn vips_tracked_get_mem_highwater() -> usize;
    fn vips_tracked_get_allocs() -> c_int;
    fn vips_progress_set(progress: gboolean);
    fn vips_get_disc_threshold() -> u64;
    fn vips_pipe_read_limit_set(limit: i64);
    fn vips_error_buffer() -> *const c_char;
    fn vips_error_clear();
    fn vips_error_freeze();
    fn vips_error_thaw();

    // vips: types
    fn vips_image_get_type() -> GType;
    fn vips_source_get_type() -> GType;
    fn vips_target_get_type() -> GType;
    fn vips_blob_get_type() -> GType;
    fn vips_array_int_get_type() -> GType;
    fn vips_array_double_get_type() -> GType;
    fn vips_array_image_get_type() -> GType;

    // vips: boxed values
    fn vips_value_set_array_int(value: *mut GValue, array: *const c_int, n: c_int);
    fn vips_value_get_array_int(value: *const GValue, n: *mut c_int) -> *mut c_int;
    fn vips_value_set_array_double(value: *mut GValue, array: *const f64, n: c_int);
    fn vips_value_get_array_double(value: *const GValue, n: *mut c_int) -> *mut f64;
    fn vips_value_set_array_image(value: *mut GValue, n: c_int);
    fn vips_value_get_array_image(
        value: *const GValue,
        n: *mut c_int,
    ) -> *mut *mut VipsImage;
    fn vips_blob_copy(data: *const c_void, length: usize) -> *mut VipsBlob;
    fn vips_blob_get(blob: *mut VipsBlob, length: *mut usize) -> *const c_void;
    fn vips_area_unref(area: *mut VipsArea);

    // vips: objects, arguments and operations
    fn vips_object_get_argument(
        object: *mut VipsObject,
        name: *const c_char,
        pspec: *mut *mut GParamSpec,
        argument_class: *mut *mut VipsArgumentClass,
        argument_instance: *mut *mut VipsArgumentInstance,
    ) -> c_int;
    fn vips_object_unref_outputs(object: *mut VipsObject);
    fn vips_nickname_find(g_type: GType) -> *const c_char;
    fn vips_enum_from_nick(domain: *const c_char, g_type: GType, nick: *const c_char) -> c_int;
    fn vips_operation_new(name: *const c_char) -> *mut VipsOperation;
    fn vips_cache_operation_buildp(operation: *mut *mut VipsOperation) -> c_int;
    fn vips_source_new_from_blob(blob: *mut VipsBlob) -> *mut VipsSource;
    fn vips_target_new_to_memory() -> *mut VipsTarget;
    fn vips_image_get_width(image: *const VipsImage) -> c_int;
    fn vips_image_get_height(image: *const VipsImage) -> c_int;
    fn vips_image_get_bands(image: *const VipsImage) -> c_int;
    fn vips_foreign_find_load(filename: *const c_char) -> *const c_char;
    fn vips_foreign_find_save(filename: *const c_char) -> *const c_char;

    // vips: operation cache
    fn vips_cache_set_max(max: c_int);
    fn vips_cache_get_max() -> c_int;
    fn vips_cache_set_max_mem(max_mem: usize);
    fn vips_cache_get_max_mem() -> usize;
    fn vips_cache_set_max_files(max_files: c_int);
    fn vips_cache_get_max_files() -> c_int;
    fn vips_cache_get_size() -> c_int;
    fn vips_cache_set_dump(dump: gboolean);
    fn vips_cache_set_trace(trace: gboolean);
    fn vips_cache_drop_all();
    fn vips_cache_print();

    // printf-style, always called with a "%s" format
    variadic {
        fn vips_error(domain: *const c_char, fmt: *const c_char);
        fn vips_error_system(err: c_int, domain: *const c_char, fmt: *const c_char);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn open_fails_without_library() {
        let config = LibraryConfig {
            vips: Some(PathBuf::from("/nonexistent/libvips.so.42")),
            gobject: Some(PathBuf::from("/nonexistent/libgobject-2.0.so.0")),
        };
        assert!(matches!(
            VipsApi::open(&config),
            Err(LoadError::LibraryNotFound { name: "libvips", .. })
        ));
    }
}
