#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Nothing here links against libvips at build time. The shared libraries are
//! opened on first use and every entry point is resolved into a [`VipsApi`]
//! table that lives for the rest of the process.

/// `#[repr(C)]` layouts and fundamental type ids shared with GObject and libvips.
pub mod types;

/// Locating and opening the native shared libraries.
pub mod library;

/// The resolved symbol table.
pub mod api;

pub use crate::api::{get, load, VipsApi};
pub use crate::library::{LibraryConfig, LoadError};
pub use crate::types::*;
