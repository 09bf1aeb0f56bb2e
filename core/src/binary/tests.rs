use rstest::rstest;

use crate::binary::{BinaryReader, BinaryWriter, BINARY_MAGIC};
use crate::codec::{PrimitiveReader, PrimitiveWriter};
use crate::error::ArchiveErrorKind;

#[test]
fn test_header_layout() {
  let mut buffer = Vec::new();
  let mut writer = BinaryWriter::new(&mut buffer);
  writer.write_header(1, 1).unwrap();

  let mut expected = BINARY_MAGIC.to_vec();
  expected.extend_from_slice(&1i32.to_ne_bytes());
  expected.extend_from_slice(&1i32.to_ne_bytes());
  assert_eq!(buffer, expected);
}

#[test]
fn test_text_is_length_prefixed() {
  let mut buffer = Vec::new();
  BinaryWriter::new(&mut buffer).write_text("ab cd").unwrap();

  assert_eq!(&buffer[..4], &5u32.to_ne_bytes());
  assert_eq!(&buffer[4..], b"ab cd");

  let mut reader = BinaryReader::new(buffer.as_slice());
  assert_eq!(reader.read_text(usize::MAX).unwrap(), "ab cd");
}

#[test]
fn test_wrong_magic_is_unrecognized() {
  let data = b"NOTMAGIC\x01\0\0\0\x01\0\0\0".to_vec();
  let err = BinaryReader::new(data.as_slice()).read_header().unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::UnrecognizedArchiveFormat);
}

#[test]
fn test_empty_stream_is_unrecognized() {
  let err = BinaryReader::new(&[][..]).read_header().unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::UnrecognizedArchiveFormat);
}

#[test]
fn test_short_span_is_stream_error() {
  let mut buffer = Vec::new();
  BinaryWriter::new(&mut buffer).write_u32(10).unwrap();
  buffer.extend_from_slice(b"abc");

  let err = BinaryReader::new(buffer.as_slice()).read_bytes(usize::MAX).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::StreamError);
}

#[test]
fn test_length_over_limit_is_rejected() {
  let mut buffer = Vec::new();
  BinaryWriter::new(&mut buffer).write_bytes(&[0u8; 16]).unwrap();

  let err = BinaryReader::new(buffer.as_slice()).read_bytes(8).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}

#[rstest]
#[case(&[2u8][..])]
#[case(&[0xffu8][..])]
fn test_invalid_bool(#[case] data: &[u8]) {
  let err = BinaryReader::new(data).read_bool().unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}

#[test]
fn test_invalid_utf8_text() {
  let mut buffer = Vec::new();
  BinaryWriter::new(&mut buffer).write_bytes(&[0xff, 0xfe]).unwrap();

  let err = BinaryReader::new(buffer.as_slice()).read_text(usize::MAX).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}
