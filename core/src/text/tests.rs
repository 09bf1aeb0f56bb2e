use rstest::rstest;

use crate::codec::{PrimitiveReader, PrimitiveWriter};
use crate::error::ArchiveErrorKind;
use crate::text::{TextReader, TextWriter};

fn written(f: impl FnOnce(&mut TextWriter<&mut Vec<u8>>)) -> String {
  let mut buffer = Vec::new();
  let mut writer = TextWriter::new(&mut buffer);
  f(&mut writer);
  String::from_utf8(buffer).unwrap()
}

#[test]
fn test_header() {
  assert_eq!(written(|w| w.write_header(1, 1).unwrap()), "ARCVTXT 1 1");
  assert_eq!(written(|w| w.write_header(0, 1).unwrap()), "ARCVTXT 0");
}

#[test]
fn test_legacy_header_has_no_minor() {
  let mut reader = TextReader::new(&b"ARCVTXT 0 7"[..]);
  assert_eq!(reader.read_header().unwrap(), (0, 0));
  reader.begin_value().unwrap();
  assert_eq!(reader.read_i32().unwrap(), 7);
}

#[rstest]
#[case(f64::INFINITY, "inf")]
#[case(f64::NEG_INFINITY, "-inf")]
#[case(f64::NAN, "nan")]
#[case(0.5, "0.5")]
fn test_float_tokens(#[case] value: f64, #[case] token: &str) {
  assert_eq!(written(|w| w.write_f64(value).unwrap()), token);
}

#[test]
fn test_text_counts_characters() {
  assert_eq!(written(|w| w.write_text("héllo wörld").unwrap()), "11 héllo wörld");

  let mut reader = TextReader::new("11 héllo wörld 3".as_bytes());
  assert_eq!(reader.read_text(usize::MAX).unwrap(), "héllo wörld");
  reader.begin_value().unwrap();
  assert_eq!(reader.read_u8().unwrap(), 3);
}

#[test]
fn test_empty_raw_span_is_zero_length() {
  assert_eq!(written(|w| w.write_raw_span(&[]).unwrap()), "");
  assert_eq!(written(|w| w.write_raw_span(b"hi").unwrap()), "aGk=");
}

#[test]
fn test_raw_span_round_trip() {
  let mut reader = TextReader::new(&b"aGk= 5"[..]);
  let mut span = [0u8; 2];
  reader.read_raw_span(&mut span).unwrap();
  assert_eq!(&span, b"hi");
}

#[rstest]
#[case("abc")]
#[case("1.2.3")]
fn test_bad_float_token(#[case] token: &str) {
  let err = TextReader::new(token.as_bytes()).read_f64().unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}

#[test]
fn test_wrong_magic() {
  let err = TextReader::new(&b"ARCVBIN 1 1"[..]).read_header().unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::UnrecognizedArchiveFormat);
}

#[test]
fn test_truncated_text_is_stream_error() {
  let err = TextReader::new(&b"5 ab"[..]).read_text(usize::MAX).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::StreamError);
}
