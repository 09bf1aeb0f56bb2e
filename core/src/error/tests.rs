use std::error::Error;
use std::io;

use crate::error::{ArchiveError, ArchiveErrorKind};

#[test]
fn test_display_includes_info() {
  let err = ArchiveError::unregistered_class("Circle");
  assert_eq!(err.kind(), ArchiveErrorKind::UnregisteredClass);
  assert_eq!(err.info(), Some("Circle"));
  assert_eq!(
    err.to_string(),
    "Unregistered class: no factory registered for class (Circle)"
  );
}

#[test]
fn test_display_without_info() {
  let err = ArchiveError::invalid_data_format("bad token");
  assert_eq!(err.to_string(), "Invalid data format: bad token");
}

#[test]
fn test_location_points_at_caller() {
  let err = ArchiveError::stream_not_open();
  assert!(err.location().file().ends_with("tests.rs"));
}

#[test]
fn test_io_error_becomes_stream_error() {
  let err: ArchiveError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
  assert_eq!(err.kind(), ArchiveErrorKind::StreamError);
  assert_eq!(err.message(), "unexpected end of stream");
  assert!(err.source().is_some());
}

#[test]
fn test_version_mismatch_message() {
  let err = ArchiveError::class_version_mismatch("Shape", 3, 2);
  assert_eq!(err.kind(), ArchiveErrorKind::ClassVersionMismatch);
  assert!(err.message().contains("3"));
  assert!(err.message().contains("2"));
}
