#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! The crate is a thin layer over the libvips object system: typed values go
//! into generic containers, containers are assigned to named properties of
//! operations, operations are built through the operation cache and their
//! outputs are read back the same way.
//!
//! ```no_run
//! use vips_bridge::{cache, Argument, Output, VOption, Vips, VipsConfig};
//!
//! Vips::init(&VipsConfig::from_env()).unwrap();
//!
//! let mut image = None;
//! vips_bridge::call(
//!     "black",
//!     VOption::new()
//!         .set("width", Argument::Int(512))
//!         .set("height", Argument::Int(512))
//!         .out("out", Output::Image(&mut image)),
//! )
//! .unwrap();
//!
//! let options = cache::CacheOptions { tile_width: Some(128), ..Default::default() };
//! let cached = cache::cache(&image.unwrap(), &options).unwrap();
//! assert_eq!(cached.width().unwrap(), 512);
//! ```

/// Image cache operation and operation cache limits.
pub mod cache;

/// Runtime settings.
pub mod config;

/// Error types for the bridge.
pub mod error;

/// Reference counted object handles.
pub mod object;

/// Operation calls.
pub mod operation;

pub mod property;

/// Library start-up, shutdown and global state.
pub mod runtime;

pub mod value;

pub use crate::config::VipsConfig;
pub use crate::error::VipsError;
pub use crate::object::{Blob, Image, Object};
pub use crate::operation::{call, Argument, Operation, Output, VOption};
pub use crate::runtime::Vips;
pub use crate::value::GenericValue;
pub use vips_sys::{GType, LibraryConfig};
