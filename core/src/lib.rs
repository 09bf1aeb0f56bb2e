//! Format-agnostic object serialization: versioned save/restore of polymorphic,
//! shared and cyclic object graphs over binary and text archives.

extern crate self as archivum_core_rs;

pub mod archive;
pub mod binary;
pub mod class_traits;
pub mod codec;
pub mod config;
pub mod config_option;
pub mod descriptor;
pub mod error;
pub mod json;
pub mod persist;
pub mod pointer;
pub mod registry;
pub mod text;
pub mod variant;

pub use archive::*;
pub use binary::*;
pub use class_traits::*;
pub use codec::*;
pub use config::*;
pub use config_option::*;
pub use descriptor::*;
pub use error::*;
pub use json::*;
pub use persist::*;
pub use pointer::*;
pub use registry::*;
pub use text::*;
pub use variant::*;

// Re-exports for derive macros
pub use archivum_derive_rs::{ClassTraits, SelfDescribing};
