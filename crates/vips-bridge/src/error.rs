use vips_sys::LoadError;

/// An error type for the bridge.
#[derive(thiserror::Error, Debug)]
pub enum VipsError {
    /// The native libraries could not be opened.
    #[error("Failed to load libvips. {0}")]
    Load(#[from] LoadError),

    /// A call was made before the symbols were loaded.
    #[error("libvips is not loaded, call Vips::init first")]
    NotLoaded,

    /// `vips_init` reported a failure.
    #[error("Failed to initialize libvips. {0}")]
    Init(String),

    /// A string argument contains an interior NUL byte.
    #[error("Invalid C string. {0}")]
    InvalidCString(#[from] std::ffi::NulError),

    /// An array is longer than the library's `int` length.
    #[error("Array of {0} elements is too large")]
    ArrayTooLarge(usize),

    /// The object has no argument with this name.
    #[error("No argument {name:?} on {object}. {message}")]
    UnknownArgument {
        /// Requested argument name.
        name: String,
        /// Nickname or type name of the object.
        object: String,
        /// Library error buffer contents.
        message: String,
    },

    /// A string could not be resolved as a nick of the argument's enum type.
    #[error("Invalid value {nick:?} for enum argument {name:?}. {message}")]
    UnknownEnumNick {
        /// Argument name.
        name: String,
        /// Nick that failed to resolve.
        nick: String,
        /// Library error buffer contents.
        message: String,
    },

    /// A value holds a different type than the one requested.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the requested type.
        expected: String,
        /// Name of the type actually held.
        found: String,
    },

    /// An operation could not be created or built.
    #[error("Operation {operation} failed. {message}")]
    Operation {
        /// Operation nickname.
        operation: String,
        /// Library error buffer contents.
        message: String,
    },

    /// The library returned a null pointer where an object was expected.
    #[error("libvips returned a null {0}")]
    NullPointer(&'static str),

    /// The configuration could not be parsed.
    #[error("Invalid configuration. {0}")]
    Config(#[from] serde_json::Error),
}
