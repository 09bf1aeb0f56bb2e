use std::fmt::{Display, Formatter};
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::io::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
  ReadOnly,
  WriteOnly,
  ReadWrite,
  /// Write-only, positioned at the end of the existing contents.
  Append,
  /// Write-only, discarding the existing contents.
  Truncate,
}

impl OpenMode {
  pub fn is_readable(&self) -> bool {
    matches!(self, OpenMode::ReadOnly | OpenMode::ReadWrite)
  }

  pub fn is_writable(&self) -> bool {
    !matches!(self, OpenMode::ReadOnly)
  }
}

impl Display for OpenMode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      OpenMode::ReadOnly => write!(f, "read-only"),
      OpenMode::WriteOnly => write!(f, "write-only"),
      OpenMode::ReadWrite => write!(f, "read-write"),
      OpenMode::Append => write!(f, "append"),
      OpenMode::Truncate => write!(f, "truncate"),
    }
  }
}

/// In-memory byte device with an explicit open/closed lifecycle.
///
/// A freshly created device is closed; reads and writes fail until it is opened
/// with a compatible [`OpenMode`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
  buffer: Vec<u8>,
  position: usize,
  mode: Option<OpenMode>,
}

impl MemoryDevice {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
    Self {
      buffer: data.into(),
      position: 0,
      mode: None,
    }
  }

  pub fn open(&mut self, mode: OpenMode) -> io::Result<()> {
    if let Some(current) = self.mode {
      return Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("device already open ({current})"),
      ));
    }
    match mode {
      OpenMode::Append => self.position = self.buffer.len(),
      OpenMode::Truncate => {
        self.buffer.clear();
        self.position = 0;
      }
      _ => self.position = 0,
    }
    tracing::trace!("memory device opened: mode = {}, size = {}", mode, self.buffer.len());
    self.mode = Some(mode);
    Ok(())
  }

  pub fn close(&mut self) {
    self.mode = None;
    self.position = 0;
  }

  pub fn mode(&self) -> Option<OpenMode> {
    self.mode
  }

  pub fn data(&self) -> &[u8] {
    &self.buffer
  }

  pub fn position(&self) -> usize {
    self.position
  }

  pub fn into_inner(self) -> Vec<u8> {
    self.buffer
  }

  fn require(&self, readable: bool) -> io::Result<()> {
    match self.mode {
      None => Err(io::Error::new(io::ErrorKind::NotConnected, "device is not open")),
      Some(mode) if readable && !mode.is_readable() => Err(io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("device is open {mode}, reading is not permitted"),
      )),
      Some(mode) if !readable && !mode.is_writable() => Err(io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("device is open {mode}, writing is not permitted"),
      )),
      Some(_) => Ok(()),
    }
  }
}

impl Device for MemoryDevice {
  fn is_open(&self) -> bool {
    self.mode.is_some()
  }
}

impl Read for MemoryDevice {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.require(true)?;
    let available = self.buffer.len().saturating_sub(self.position);
    if available == 0 {
      return Ok(0);
    }
    let n = available.min(buf.len());
    buf[..n].copy_from_slice(&self.buffer[self.position..self.position + n]);
    self.position += n;
    Ok(n)
  }
}

impl Write for MemoryDevice {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.require(false)?;
    let end = self.position + buf.len();
    if end > self.buffer.len() {
      self.buffer.resize(end, 0);
    }
    self.buffer[self.position..end].copy_from_slice(buf);
    self.position = end;
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl Seek for MemoryDevice {
  fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
    if self.mode.is_none() {
      return Err(io::Error::new(io::ErrorKind::NotConnected, "device is not open"));
    }
    let target = match pos {
      SeekFrom::Start(offset) => offset as i128,
      SeekFrom::End(delta) => self.buffer.len() as i128 + delta as i128,
      SeekFrom::Current(delta) => self.position as i128 + delta as i128,
    };
    if target < 0 {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "seek to a negative position",
      ));
    }
    self.position = target as usize;
    Ok(self.position as u64)
  }
}

#[cfg(test)]
mod tests;
