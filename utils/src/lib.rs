//! Utilities shared by the Archivum crates.

pub mod collections;
pub mod io;
