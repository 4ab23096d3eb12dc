use crate::{config::VipsConfig, error::VipsError};
use std::ffi::{c_char, CStr, CString};
use vips_sys::{LibraryConfig, VipsApi};

/// printf format passing one string argument through unchanged.
const STRING_FORMAT: &[u8] = b"%s\0";

/// Returns the loaded symbol table.
pub(crate) fn api() -> Result<&'static VipsApi, VipsError> {
    vips_sys::get().ok_or(VipsError::NotLoaded)
}

/// Copies a borrowed C string, `None` for null.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL terminated string.
pub(crate) unsafe fn string_from_ptr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Drains the library error buffer.
pub(crate) fn take_error(api: &VipsApi) -> String {
    // SAFETY: the buffer is a static NUL terminated string owned by libvips.
    unsafe {
        let message = string_from_ptr((api.vips_error_buffer)()).unwrap_or_default();
        (api.vips_error_clear)();
        message.trim_end().to_string()
    }
}

/// Process-wide control of the native library.
pub struct Vips;

impl Vips {
    /// Loads the symbols without starting libvips.
    ///
    /// Use this when the host process has already called `vips_init`.
    pub fn load(config: &LibraryConfig) -> Result<(), VipsError> {
        vips_sys::load(config)?;
        Ok(())
    }

    /// Loads the symbols, starts libvips and applies the runtime settings.
    ///
    /// Calling it again is harmless; libvips ignores repeated starts and the
    /// settings are applied again.
    pub fn init(config: &VipsConfig) -> Result<(), VipsError> {
        let api = vips_sys::load(&config.library)?;
        let program_name = CString::new(config.program_name.as_str())?;

        // SAFETY: program_name outlives the call, libvips copies it.
        if unsafe { (api.vips_init)(program_name.as_ptr()) } != 0 {
            return Err(VipsError::Init(take_error(api)));
        }

        if config.leak_detection {
            unsafe { (api.vips_leak_set)(1) };
        }
        if let Some(concurrency) = config.concurrency {
            Self::concurrency_set(concurrency)?;
        }
        config.cache.apply()?;

        log::debug!(
            "libvips {} started as {}",
            Self::version_string()?,
            config.program_name
        );

        Ok(())
    }

    /// Returns the libvips version, e.g. `8.15.1`.
    pub fn version_string() -> Result<String, VipsError> {
        let api = api()?;
        unsafe { string_from_ptr((api.vips_version_string)()) }
            .ok_or(VipsError::NullPointer("version string"))
    }

    /// Returns the accumulated library error messages without clearing them.
    pub fn error_buffer() -> Result<String, VipsError> {
        let api = api()?;
        Ok(unsafe { string_from_ptr((api.vips_error_buffer)()) }.unwrap_or_default())
    }

    /// Clears the library error buffer.
    pub fn error_clear() -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_error_clear)() };
        Ok(())
    }

    /// Appends a message to the library error buffer.
    pub fn error(domain: &str, message: &str) -> Result<(), VipsError> {
        let api = api()?;
        let c_domain = CString::new(domain)?;
        let c_message = CString::new(message)?;
        // the message is passed as an argument, never as the format
        unsafe {
            (api.vips_error)(
                c_domain.as_ptr(),
                STRING_FORMAT.as_ptr().cast(),
                c_message.as_ptr(),
            )
        };
        Ok(())
    }

    /// Appends a message and the text of the system error `code`.
    pub fn error_system(code: i32, domain: &str, message: &str) -> Result<(), VipsError> {
        let api = api()?;
        let c_domain = CString::new(domain)?;
        let c_message = CString::new(message)?;
        unsafe {
            (api.vips_error_system)(
                code,
                c_domain.as_ptr(),
                STRING_FORMAT.as_ptr().cast(),
                c_message.as_ptr(),
            )
        };
        Ok(())
    }

    /// Stops new messages from reaching the error buffer until [`Vips::error_thaw`].
    pub fn error_freeze() -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_error_freeze)() };
        Ok(())
    }

    /// Lets messages reach the error buffer again.
    pub fn error_thaw() -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_error_thaw)() };
        Ok(())
    }

    /// Enables or disables progress reporting on every image.
    pub fn progress_set(enabled: bool) -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_progress_set)(enabled.into()) };
        Ok(())
    }

    /// Size in bytes above which decompressed images go to a temporary file.
    pub fn get_disc_threshold() -> Result<u64, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_get_disc_threshold)() })
    }

    /// Limits how many bytes loaders read from a pipe, -1 for no limit.
    pub fn pipe_read_limit_set(limit: i64) -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_pipe_read_limit_set)(limit) };
        Ok(())
    }

    /// Sets the number of worker threads per pipeline.
    pub fn concurrency_set(max: i32) -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_concurrency_set)(max) };
        Ok(())
    }

    /// Returns the number of worker threads per pipeline.
    pub fn concurrency_get() -> Result<i32, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_concurrency_get)() })
    }

    /// Enables or disables reference leak reports at shutdown.
    pub fn leak_set(enabled: bool) -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_leak_set)(enabled.into()) };
        Ok(())
    }

    /// Bytes currently allocated through the tracked allocator.
    pub fn tracked_get_mem() -> Result<usize, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_tracked_get_mem)() })
    }

    /// Highest value [`Vips::tracked_get_mem`] has reached.
    pub fn tracked_get_mem_highwater() -> Result<usize, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_tracked_get_mem_highwater)() })
    }

    /// Number of live tracked allocations.
    pub fn tracked_get_allocs() -> Result<i32, VipsError> {
        let api = api()?;
        Ok(unsafe { (api.vips_tracked_get_allocs)() })
    }

    /// Frees the per-thread state libvips keeps for the calling thread.
    pub fn thread_shutdown() -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_thread_shutdown)() };
        Ok(())
    }

    /// Shuts libvips down. No object may be used afterwards.
    pub fn shutdown() -> Result<(), VipsError> {
        let api = api()?;
        unsafe { (api.vips_shutdown)() };
        Ok(())
    }

    /// Finds the nickname of the loader for a file, e.g. `pngload`.
    pub fn foreign_find_load(filename: &str) -> Result<String, VipsError> {
        Self::foreign_find(filename, |api| api.vips_foreign_find_load)
    }

    /// Finds the nickname of the saver for a file name, e.g. `jpegsave`.
    pub fn foreign_find_save(filename: &str) -> Result<String, VipsError> {
        Self::foreign_find(filename, |api| api.vips_foreign_find_save)
    }

    fn foreign_find(
        filename: &str,
        select: impl Fn(&VipsApi) -> unsafe extern "C" fn(*const c_char) -> *const c_char,
    ) -> Result<String, VipsError> {
        let api = api()?;
        let c_filename = CString::new(filename)?;
        // SAFETY: the returned nickname is static, owned by the class.
        match unsafe { string_from_ptr(select(api)(c_filename.as_ptr())) } {
            Some(nickname) => Ok(nickname),
            None => Err(VipsError::Operation {
                operation: filename.to_string(),
                message: take_error(api),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_from_null() {
        assert_eq!(unsafe { string_from_ptr(std::ptr::null()) }, None);
    }

    #[test]
    fn facade_needs_library() {
        if vips_sys::get().is_some() {
            return;
        }
        assert!(matches!(Vips::progress_set(true), Err(VipsError::NotLoaded)));
        assert!(matches!(Vips::get_disc_threshold(), Err(VipsError::NotLoaded)));
        assert!(matches!(Vips::error("bridge", "boom"), Err(VipsError::NotLoaded)));
        assert!(matches!(
            Vips::error_system(2, "bridge", "open"),
            Err(VipsError::NotLoaded)
        ));
        assert!(matches!(Vips::error_freeze(), Err(VipsError::NotLoaded)));
        assert!(matches!(Vips::error_thaw(), Err(VipsError::NotLoaded)));
        assert!(matches!(Vips::pipe_read_limit_set(-1), Err(VipsError::NotLoaded)));
        assert!(matches!(crate::cache::print(), Err(VipsError::NotLoaded)));
    }

    #[test]
    fn string_from_c_str() {
        let s = CString::new("jpegload").unwrap();
        assert_eq!(
            unsafe { string_from_ptr(s.as_ptr()) },
            Some("jpegload".to_string())
        );
    }
}
