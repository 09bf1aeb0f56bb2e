mod primitive;

pub use self::primitive::*;

use strum::{Display, EnumIter};

use crate::error::ArchiveResult;

/// Format-independent archive version written by this build.
pub const ARCHIVE_MAJOR_VERSION: u32 = 1;
pub const BINARY_MINOR_VERSION: u32 = 1;
pub const TEXT_MINOR_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ArchiveFormat {
  #[strum(serialize = "binary")]
  Binary,
  #[strum(serialize = "text")]
  Text,
}

impl ArchiveFormat {
  /// Highest format-specific minor version this build reads and the one it writes.
  pub fn minor_version(self) -> u32 {
    match self {
      ArchiveFormat::Binary => BINARY_MINOR_VERSION,
      ArchiveFormat::Text => TEXT_MINOR_VERSION,
    }
  }
}

/// Per-format encoding of the closed set of primitive kinds.
///
/// `begin_value`/`end_value` frame every primitive written through the archive engine.
pub trait PrimitiveWriter {
  fn format(&self) -> ArchiveFormat;

  fn is_open(&self) -> bool;

  fn write_header(&mut self, major_version: u32, minor_version: u32) -> ArchiveResult<()>;

  fn begin_value(&mut self) -> ArchiveResult<()> {
    Ok(())
  }

  fn end_value(&mut self) -> ArchiveResult<()> {
    Ok(())
  }

  /// Named key/value pairs; formats without field names leave these as no-ops.
  fn begin_field(&mut self, _name: &str) -> ArchiveResult<()> {
    Ok(())
  }

  fn end_field(&mut self, _name: &str) -> ArchiveResult<()> {
    Ok(())
  }

  fn write_u8(&mut self, value: u8) -> ArchiveResult<()>;
  fn write_i8(&mut self, value: i8) -> ArchiveResult<()>;
  fn write_u16(&mut self, value: u16) -> ArchiveResult<()>;
  fn write_i16(&mut self, value: i16) -> ArchiveResult<()>;
  fn write_u32(&mut self, value: u32) -> ArchiveResult<()>;
  fn write_i32(&mut self, value: i32) -> ArchiveResult<()>;
  fn write_u64(&mut self, value: u64) -> ArchiveResult<()>;
  fn write_i64(&mut self, value: i64) -> ArchiveResult<()>;
  fn write_f32(&mut self, value: f32) -> ArchiveResult<()>;
  fn write_f64(&mut self, value: f64) -> ArchiveResult<()>;
  fn write_bool(&mut self, value: bool) -> ArchiveResult<()>;
  fn write_char(&mut self, value: char) -> ArchiveResult<()>;

  /// Length-prefixed text.
  fn write_text(&mut self, text: &str) -> ArchiveResult<()>;

  /// Length-prefixed byte array.
  fn write_bytes(&mut self, bytes: &[u8]) -> ArchiveResult<()>;

  /// Bytes whose length the reader already knows.
  fn write_raw_span(&mut self, bytes: &[u8]) -> ArchiveResult<()>;

  fn flush(&mut self) -> ArchiveResult<()>;
}

pub trait PrimitiveReader {
  fn format(&self) -> ArchiveFormat;

  fn is_open(&self) -> bool;

  /// Validates the magic token and returns the stored `(major, minor)` versions.
  fn read_header(&mut self) -> ArchiveResult<(u32, u32)>;

  fn begin_value(&mut self) -> ArchiveResult<()> {
    Ok(())
  }

  fn end_value(&mut self) -> ArchiveResult<()> {
    Ok(())
  }

  fn begin_field(&mut self, _name: &str) -> ArchiveResult<()> {
    Ok(())
  }

  fn end_field(&mut self, _name: &str) -> ArchiveResult<()> {
    Ok(())
  }

  fn read_u8(&mut self) -> ArchiveResult<u8>;
  fn read_i8(&mut self) -> ArchiveResult<i8>;
  fn read_u16(&mut self) -> ArchiveResult<u16>;
  fn read_i16(&mut self) -> ArchiveResult<i16>;
  fn read_u32(&mut self) -> ArchiveResult<u32>;
  fn read_i32(&mut self) -> ArchiveResult<i32>;
  fn read_u64(&mut self) -> ArchiveResult<u64>;
  fn read_i64(&mut self) -> ArchiveResult<i64>;
  fn read_f32(&mut self) -> ArchiveResult<f32>;
  fn read_f64(&mut self) -> ArchiveResult<f64>;
  fn read_bool(&mut self) -> ArchiveResult<bool>;
  fn read_char(&mut self) -> ArchiveResult<char>;

  /// Reads length-prefixed text; a prefix above `max_length` is rejected.
  fn read_text(&mut self, max_length: usize) -> ArchiveResult<String>;

  fn read_bytes(&mut self, max_length: usize) -> ArchiveResult<Vec<u8>>;

  /// Fills `buffer` completely.
  fn read_raw_span(&mut self, buffer: &mut [u8]) -> ArchiveResult<()>;
}
