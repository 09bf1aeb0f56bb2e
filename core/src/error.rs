use std::io;
use std::panic::Location;

use thiserror::Error;

/// The fixed set of failure kinds raised by archives, codecs and registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArchiveErrorKind {
  #[error("Unknown error")]
  Unknown,
  #[error("Invalid data format")]
  InvalidDataFormat,
  #[error("Unregistered class")]
  UnregisteredClass,
  #[error("Serializer not found")]
  SerializerNotFound,
  #[error("Class version mismatch")]
  ClassVersionMismatch,
  #[error("Stream error")]
  StreamError,
  #[error("Stream not open")]
  StreamNotOpen,
  #[error("Unrecognized archive format")]
  UnrecognizedArchiveFormat,
  #[error("Archive version mismatch")]
  ArchiveVersionMismatch,
}

#[derive(Debug, Error)]
#[error("{kind}: {message}{}", .info.as_ref().map(|info| format!(" ({info})")).unwrap_or_default())]
pub struct ArchiveError {
  kind: ArchiveErrorKind,
  message: String,
  info: Option<String>,
  location: &'static Location<'static>,
  #[source]
  source: Option<io::Error>,
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

impl ArchiveError {
  #[track_caller]
  pub fn new(kind: ArchiveErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
      info: None,
      location: Location::caller(),
      source: None,
    }
  }

  pub fn with_info(mut self, info: impl Into<String>) -> Self {
    self.info = Some(info.into());
    self
  }

  #[track_caller]
  pub fn unknown(message: impl Into<String>) -> Self {
    Self::new(ArchiveErrorKind::Unknown, message)
  }

  #[track_caller]
  pub fn invalid_data_format(message: impl Into<String>) -> Self {
    Self::new(ArchiveErrorKind::InvalidDataFormat, message)
  }

  #[track_caller]
  pub fn unregistered_class(class_name: &str) -> Self {
    Self::new(ArchiveErrorKind::UnregisteredClass, "no factory registered for class").with_info(class_name)
  }

  #[track_caller]
  pub fn serializer_not_found(class_name: &str) -> Self {
    Self::new(ArchiveErrorKind::SerializerNotFound, "no serializer registered for class").with_info(class_name)
  }

  #[track_caller]
  pub fn class_version_mismatch(class_name: &str, stored: u32, known: u32) -> Self {
    Self::new(
      ArchiveErrorKind::ClassVersionMismatch,
      format!("stored version {stored} is newer than known version {known}"),
    )
    .with_info(class_name)
  }

  #[track_caller]
  pub fn stream(message: impl Into<String>) -> Self {
    Self::new(ArchiveErrorKind::StreamError, message)
  }

  #[track_caller]
  pub fn stream_not_open() -> Self {
    Self::new(ArchiveErrorKind::StreamNotOpen, "the underlying device is not open")
  }

  #[track_caller]
  pub fn unrecognized_format(expected: &str) -> Self {
    Self::new(ArchiveErrorKind::UnrecognizedArchiveFormat, "archive magic does not match").with_info(expected)
  }

  #[track_caller]
  pub fn archive_version_mismatch(major: u32, minor: u32, max_major: u32, max_minor: u32) -> Self {
    Self::new(
      ArchiveErrorKind::ArchiveVersionMismatch,
      format!("archive version {major}.{minor} exceeds supported {max_major}.{max_minor}"),
    )
  }

  pub fn kind(&self) -> ArchiveErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn info(&self) -> Option<&str> {
    self.info.as_deref()
  }

  pub fn location(&self) -> &'static Location<'static> {
    self.location
  }
}

impl From<io::Error> for ArchiveError {
  #[track_caller]
  fn from(error: io::Error) -> Self {
    let message = match error.kind() {
      io::ErrorKind::UnexpectedEof => "unexpected end of stream".to_string(),
      _ => error.to_string(),
    };
    Self {
      kind: ArchiveErrorKind::StreamError,
      message,
      info: None,
      location: Location::caller(),
      source: Some(error),
    }
  }
}

static_assertions::assert_impl_all!(ArchiveError: Send, Sync);

#[cfg(test)]
mod tests;
