use std::fmt::Display;
use std::io::{self, Read, Write};
use std::str::FromStr;

use archivum_utils_rs::io::Device;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::codec::{ArchiveFormat, PrimitiveReader, PrimitiveWriter};
use crate::error::{ArchiveError, ArchiveResult};

pub const TEXT_MAGIC: &[u8; 7] = b"ARCVTXT";

const MAX_TOKEN_LENGTH: usize = 1024;

/// Space-separated token codec. Text is `length<space>chars`, raw spans are base64.
#[derive(Debug)]
pub struct TextWriter<W> {
  stream: W,
}

impl<W: Write + Device> TextWriter<W> {
  pub fn new(stream: W) -> Self {
    Self { stream }
  }

  pub fn into_inner(self) -> W {
    self.stream
  }

  fn write_token(&mut self, token: impl Display) -> ArchiveResult<()> {
    write!(self.stream, "{token}")?;
    Ok(())
  }
}

macro_rules! write_decimal {
  ($($name:ident: $ty:ty),* $(,)?) => {
    $(
      fn $name(&mut self, value: $ty) -> ArchiveResult<()> {
        self.write_token(value)
      }
    )*
  };
}

macro_rules! float_token {
  ($value:expr) => {{
    let value = $value;
    if value.is_nan() {
      "nan".to_string()
    } else if value.is_infinite() {
      let token = if value.is_sign_positive() { "inf" } else { "-inf" };
      token.to_string()
    } else {
      value.to_string()
    }
  }};
}

impl<W: Write + Device> PrimitiveWriter for TextWriter<W> {
  fn format(&self) -> ArchiveFormat {
    ArchiveFormat::Text
  }

  fn is_open(&self) -> bool {
    self.stream.is_open()
  }

  fn write_header(&mut self, major_version: u32, minor_version: u32) -> ArchiveResult<()> {
    self.stream.write_all(TEXT_MAGIC)?;
    write!(self.stream, " {major_version}")?;
    // legacy major 0 headers carry no minor version
    if major_version != 0 {
      write!(self.stream, " {minor_version}")?;
    }
    Ok(())
  }

  fn begin_value(&mut self) -> ArchiveResult<()> {
    self.stream.write_all(b" ")?;
    Ok(())
  }

  write_decimal! {
    write_u8: u8,
    write_i8: i8,
    write_u16: u16,
    write_i16: i16,
    write_u32: u32,
    write_i32: i32,
    write_u64: u64,
    write_i64: i64,
  }

  fn write_f32(&mut self, value: f32) -> ArchiveResult<()> {
    self.write_token(float_token!(value))
  }

  fn write_f64(&mut self, value: f64) -> ArchiveResult<()> {
    self.write_token(float_token!(value))
  }

  fn write_bool(&mut self, value: bool) -> ArchiveResult<()> {
    self.write_token(u8::from(value))
  }

  fn write_char(&mut self, value: char) -> ArchiveResult<()> {
    self.write_token(u32::from(value))
  }

  fn write_text(&mut self, text: &str) -> ArchiveResult<()> {
    write!(self.stream, "{} ", text.chars().count())?;
    self.stream.write_all(text.as_bytes())?;
    Ok(())
  }

  fn write_bytes(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
    write!(self.stream, "{} ", bytes.len())?;
    self.write_raw_span(bytes)
  }

  fn write_raw_span(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
    self.stream.write_all(STANDARD.encode(bytes).as_bytes())?;
    Ok(())
  }

  fn flush(&mut self) -> ArchiveResult<()> {
    self.stream.flush()?;
    Ok(())
  }
}

#[derive(Debug)]
pub struct TextReader<R> {
  stream: R,
  peeked: Option<u8>,
}

impl<R: Read + Device> TextReader<R> {
  pub fn new(stream: R) -> Self {
    Self { stream, peeked: None }
  }

  pub fn into_inner(self) -> R {
    self.stream
  }

  fn next_byte(&mut self) -> ArchiveResult<Option<u8>> {
    if let Some(byte) = self.peeked.take() {
      return Ok(Some(byte));
    }
    let mut byte = [0u8; 1];
    loop {
      match self.stream.read(&mut byte) {
        Ok(0) => return Ok(None),
        Ok(_) => return Ok(Some(byte[0])),
        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
        Err(err) => return Err(err.into()),
      }
    }
  }

  fn expect_byte(&mut self) -> ArchiveResult<u8> {
    self
      .next_byte()?
      .ok_or_else(|| ArchiveError::stream("unexpected end of stream"))
  }

  fn skip_whitespace(&mut self) -> ArchiveResult<()> {
    while let Some(byte) = self.next_byte()? {
      if !byte.is_ascii_whitespace() {
        self.peeked = Some(byte);
        break;
      }
    }
    Ok(())
  }

  fn read_token(&mut self) -> ArchiveResult<String> {
    let mut token = Vec::new();
    while let Some(byte) = self.next_byte()? {
      if byte.is_ascii_whitespace() {
        self.peeked = Some(byte);
        break;
      }
      if token.len() == MAX_TOKEN_LENGTH {
        return Err(ArchiveError::invalid_data_format("token too long"));
      }
      token.push(byte);
    }
    if token.is_empty() {
      return Err(ArchiveError::stream("unexpected end of stream"));
    }
    String::from_utf8(token).map_err(|err| ArchiveError::invalid_data_format(err.to_string()))
  }

  fn parse_token<T>(&mut self, what: &str) -> ArchiveResult<T>
  where
    T: FromStr,
    T::Err: Display, {
    let token = self.read_token()?;
    token
      .parse()
      .map_err(|err| ArchiveError::invalid_data_format(format!("{token:?} is not a valid {what}: {err}")))
  }

  fn read_length(&mut self, max_length: usize) -> ArchiveResult<usize> {
    let length: usize = self.parse_token("length")?;
    if length > max_length {
      return Err(ArchiveError::invalid_data_format(format!(
        "length {length} exceeds the limit of {max_length}"
      )));
    }
    match self.expect_byte()? {
      b' ' => Ok(length),
      other => Err(ArchiveError::invalid_data_format(format!(
        "expected a separator after the length, found {:?}",
        other as char
      ))),
    }
  }

  fn read_utf8_char(&mut self) -> ArchiveResult<char> {
    let first = self.expect_byte()?;
    let width = match first {
      0x00..=0x7f => 1,
      0xc0..=0xdf => 2,
      0xe0..=0xef => 3,
      0xf0..=0xf7 => 4,
      _ => return Err(ArchiveError::invalid_data_format("invalid utf-8 lead byte")),
    };
    let mut buffer = [first, 0, 0, 0];
    for slot in &mut buffer[1..width] {
      *slot = self.expect_byte()?;
    }
    std::str::from_utf8(&buffer[..width])
      .ok()
      .and_then(|decoded| decoded.chars().next())
      .ok_or_else(|| ArchiveError::invalid_data_format("invalid utf-8 sequence"))
  }

  fn read_exact_bytes(&mut self, length: usize) -> ArchiveResult<Vec<u8>> {
    let mut buffer = Vec::new();
    if length > 0 {
      buffer.extend(self.peeked.take());
    }
    let remaining = (length - buffer.len()) as u64;
    (&mut self.stream).take(remaining).read_to_end(&mut buffer)?;
    if buffer.len() != length {
      return Err(ArchiveError::stream(format!(
        "short read: expected {length} bytes, got {}",
        buffer.len()
      )));
    }
    Ok(buffer)
  }

  fn read_base64(&mut self, length: usize) -> ArchiveResult<Vec<u8>> {
    let encoded_length = base64::encoded_len(length, true)
      .ok_or_else(|| ArchiveError::invalid_data_format("span too large to encode"))?;
    let encoded = self.read_exact_bytes(encoded_length)?;
    let decoded = STANDARD
      .decode(&encoded)
      .map_err(|err| ArchiveError::invalid_data_format(err.to_string()))?;
    if decoded.len() != length {
      return Err(ArchiveError::invalid_data_format(format!(
        "base64 field decodes to {} bytes, expected {length}",
        decoded.len()
      )));
    }
    Ok(decoded)
  }
}

macro_rules! read_decimal {
  ($($name:ident: $ty:ty),* $(,)?) => {
    $(
      fn $name(&mut self) -> ArchiveResult<$ty> {
        self.parse_token(stringify!($ty))
      }
    )*
  };
}

macro_rules! read_float {
  ($($name:ident: $ty:ident),* $(,)?) => {
    $(
      fn $name(&mut self) -> ArchiveResult<$ty> {
        let token = self.read_token()?;
        match token.as_str() {
          "nan" => Ok($ty::NAN),
          "inf" => Ok($ty::INFINITY),
          "-inf" => Ok($ty::NEG_INFINITY),
          _ => token
            .parse()
            .map_err(|_| ArchiveError::invalid_data_format(format!("{token:?} is not a floating point value"))),
        }
      }
    )*
  };
}

impl<R: Read + Device> PrimitiveReader for TextReader<R> {
  fn format(&self) -> ArchiveFormat {
    ArchiveFormat::Text
  }

  fn is_open(&self) -> bool {
    self.stream.is_open()
  }

  fn read_header(&mut self) -> ArchiveResult<(u32, u32)> {
    for expected in TEXT_MAGIC {
      match self.next_byte()? {
        Some(byte) if byte == *expected => {}
        _ => return Err(ArchiveError::unrecognized_format("text")),
      }
    }
    self.skip_whitespace()?;
    let major: u32 = self.parse_token("major version")?;
    if major == 0 {
      return Ok((0, 0));
    }
    self.skip_whitespace()?;
    let minor: u32 = self.parse_token("minor version")?;
    Ok((major, minor))
  }

  fn begin_value(&mut self) -> ArchiveResult<()> {
    self.skip_whitespace()
  }

  read_decimal! {
    read_u8: u8,
    read_i8: i8,
    read_u16: u16,
    read_i16: i16,
    read_u32: u32,
    read_i32: i32,
    read_u64: u64,
    read_i64: i64,
  }

  read_float! {
    read_f32: f32,
    read_f64: f64,
  }

  fn read_bool(&mut self) -> ArchiveResult<bool> {
    match self.read_token()?.as_str() {
      "0" => Ok(false),
      "1" => Ok(true),
      other => Err(ArchiveError::invalid_data_format(format!("{other:?} is not a boolean"))),
    }
  }

  fn read_char(&mut self) -> ArchiveResult<char> {
    let code: u32 = self.parse_token("char")?;
    char::from_u32(code).ok_or_else(|| ArchiveError::invalid_data_format(format!("{code:#x} is not a char")))
  }

  fn read_text(&mut self, max_length: usize) -> ArchiveResult<String> {
    let length = self.read_length(max_length)?;
    let mut text = String::with_capacity(length.min(1 << 16));
    for _ in 0..length {
      text.push(self.read_utf8_char()?);
    }
    Ok(text)
  }

  fn read_bytes(&mut self, max_length: usize) -> ArchiveResult<Vec<u8>> {
    let length = self.read_length(max_length)?;
    self.read_base64(length)
  }

  fn read_raw_span(&mut self, buffer: &mut [u8]) -> ArchiveResult<()> {
    let decoded = self.read_base64(buffer.len())?;
    buffer.copy_from_slice(&decoded);
    Ok(())
  }
}

#[cfg(test)]
mod tests;
