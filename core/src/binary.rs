use std::io::{self, Read, Write};

use archivum_utils_rs::io::Device;

use crate::codec::{ArchiveFormat, PrimitiveReader, PrimitiveWriter};
use crate::error::{ArchiveError, ArchiveResult};

pub const BINARY_MAGIC: &[u8; 8] = b"ARCVBIN\0";

/// Native-endian fixed-width codec with `u32` length prefixes and no value framing.
#[derive(Debug)]
pub struct BinaryWriter<W> {
  stream: W,
}

impl<W: Write + Device> BinaryWriter<W> {
  pub fn new(stream: W) -> Self {
    Self { stream }
  }

  pub fn into_inner(self) -> W {
    self.stream
  }

  fn write_length(&mut self, length: usize) -> ArchiveResult<()> {
    let length = u32::try_from(length)
      .map_err(|_| ArchiveError::invalid_data_format(format!("length {length} exceeds the u32 prefix")))?;
    self.write_u32(length)
  }
}

macro_rules! write_native {
  ($($name:ident: $ty:ty),* $(,)?) => {
    $(
      fn $name(&mut self, value: $ty) -> ArchiveResult<()> {
        self.stream.write_all(&value.to_ne_bytes())?;
        Ok(())
      }
    )*
  };
}

impl<W: Write + Device> PrimitiveWriter for BinaryWriter<W> {
  fn format(&self) -> ArchiveFormat {
    ArchiveFormat::Binary
  }

  fn is_open(&self) -> bool {
    self.stream.is_open()
  }

  fn write_header(&mut self, major_version: u32, minor_version: u32) -> ArchiveResult<()> {
    self.stream.write_all(BINARY_MAGIC)?;
    self.write_i32(major_version as i32)?;
    self.write_i32(minor_version as i32)
  }

  write_native! {
    write_u8: u8,
    write_i8: i8,
    write_u16: u16,
    write_i16: i16,
    write_u32: u32,
    write_i32: i32,
    write_u64: u64,
    write_i64: i64,
    write_f32: f32,
    write_f64: f64,
  }

  fn write_bool(&mut self, value: bool) -> ArchiveResult<()> {
    self.write_u8(u8::from(value))
  }

  fn write_char(&mut self, value: char) -> ArchiveResult<()> {
    self.write_u32(u32::from(value))
  }

  fn write_text(&mut self, text: &str) -> ArchiveResult<()> {
    self.write_bytes(text.as_bytes())
  }

  fn write_bytes(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
    self.write_length(bytes.len())?;
    self.write_raw_span(bytes)
  }

  fn write_raw_span(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
    self.stream.write_all(bytes)?;
    Ok(())
  }

  fn flush(&mut self) -> ArchiveResult<()> {
    self.stream.flush()?;
    Ok(())
  }
}

#[derive(Debug)]
pub struct BinaryReader<R> {
  stream: R,
}

impl<R: Read + Device> BinaryReader<R> {
  pub fn new(stream: R) -> Self {
    Self { stream }
  }

  pub fn into_inner(self) -> R {
    self.stream
  }

  fn read_length(&mut self, max_length: usize) -> ArchiveResult<usize> {
    let length = self.read_u32()? as usize;
    if length > max_length {
      return Err(ArchiveError::invalid_data_format(format!(
        "length {length} exceeds the limit of {max_length}"
      )));
    }
    Ok(length)
  }

  fn read_exactly(&mut self, length: usize) -> ArchiveResult<Vec<u8>> {
    let mut buffer = Vec::new();
    (&mut self.stream).take(length as u64).read_to_end(&mut buffer)?;
    if buffer.len() != length {
      return Err(ArchiveError::stream(format!(
        "short read: expected {length} bytes, got {}",
        buffer.len()
      )));
    }
    Ok(buffer)
  }
}

macro_rules! read_native {
  ($($name:ident: $ty:ty),* $(,)?) => {
    $(
      fn $name(&mut self) -> ArchiveResult<$ty> {
        let mut bytes = [0u8; std::mem::size_of::<$ty>()];
        self.stream.read_exact(&mut bytes)?;
        Ok(<$ty>::from_ne_bytes(bytes))
      }
    )*
  };
}

impl<R: Read + Device> PrimitiveReader for BinaryReader<R> {
  fn format(&self) -> ArchiveFormat {
    ArchiveFormat::Binary
  }

  fn is_open(&self) -> bool {
    self.stream.is_open()
  }

  fn read_header(&mut self) -> ArchiveResult<(u32, u32)> {
    let mut magic = [0u8; BINARY_MAGIC.len()];
    match self.stream.read_exact(&mut magic) {
      Ok(()) => {}
      Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
        return Err(ArchiveError::unrecognized_format("binary"));
      }
      Err(err) => return Err(err.into()),
    }
    if &magic != BINARY_MAGIC {
      return Err(ArchiveError::unrecognized_format("binary"));
    }
    let major = self.read_i32()?;
    let minor = self.read_i32()?;
    let major = u32::try_from(major).map_err(|_| ArchiveError::invalid_data_format("negative major version"))?;
    let minor = u32::try_from(minor).map_err(|_| ArchiveError::invalid_data_format("negative minor version"))?;
    Ok((major, minor))
  }

  read_native! {
    read_u8: u8,
    read_i8: i8,
    read_u16: u16,
    read_i16: i16,
    read_u32: u32,
    read_i32: i32,
    read_u64: u64,
    read_i64: i64,
    read_f32: f32,
    read_f64: f64,
  }

  fn read_bool(&mut self) -> ArchiveResult<bool> {
    match self.read_u8()? {
      0 => Ok(false),
      1 => Ok(true),
      other => Err(ArchiveError::invalid_data_format(format!("{other} is not a boolean"))),
    }
  }

  fn read_char(&mut self) -> ArchiveResult<char> {
    let code = self.read_u32()?;
    char::from_u32(code).ok_or_else(|| ArchiveError::invalid_data_format(format!("{code:#x} is not a char")))
  }

  fn read_text(&mut self, max_length: usize) -> ArchiveResult<String> {
    let bytes = self.read_bytes(max_length)?;
    String::from_utf8(bytes).map_err(|err| ArchiveError::invalid_data_format(err.to_string()))
  }

  fn read_bytes(&mut self, max_length: usize) -> ArchiveResult<Vec<u8>> {
    let length = self.read_length(max_length)?;
    self.read_exactly(length)
  }

  fn read_raw_span(&mut self, buffer: &mut [u8]) -> ArchiveResult<()> {
    self.stream.read_exact(buffer)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests;
