use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use rstest::rstest;

use crate::io::{Device, MemoryDevice, OpenMode};

#[test]
fn test_new_device_is_closed() {
  let mut device = MemoryDevice::new();
  assert!(!device.is_open());
  let err = device.write(b"abc").unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotConnected);
}

#[test]
fn test_write_then_read_back() {
  let mut device = MemoryDevice::new();
  device.open(OpenMode::WriteOnly).unwrap();
  device.write_all(b"hello").unwrap();
  device.close();

  device.open(OpenMode::ReadOnly).unwrap();
  let mut out = String::new();
  device.read_to_string(&mut out).unwrap();
  assert_eq!(out, "hello");
}

#[test]
fn test_append_and_truncate() {
  let mut device = MemoryDevice::with_data(b"ab".to_vec());
  device.open(OpenMode::Append).unwrap();
  device.write_all(b"cd").unwrap();
  device.close();
  assert_eq!(device.data(), b"abcd");

  device.open(OpenMode::Truncate).unwrap();
  device.write_all(b"x").unwrap();
  assert_eq!(device.data(), b"x");
}

#[rstest]
#[case(OpenMode::ReadOnly, false, true)]
#[case(OpenMode::WriteOnly, true, false)]
#[case(OpenMode::ReadWrite, true, true)]
fn test_mode_permissions(#[case] mode: OpenMode, #[case] can_write: bool, #[case] can_read: bool) {
  let mut device = MemoryDevice::with_data(vec![1, 2, 3]);
  device.open(mode).unwrap();
  assert_eq!(device.write(&[9]).is_ok(), can_write);
  device.seek(SeekFrom::Start(0)).unwrap();
  let mut buf = [0u8; 1];
  assert_eq!(device.read(&mut buf).is_ok(), can_read);
}

#[test]
fn test_double_open_is_rejected() {
  let mut device = MemoryDevice::new();
  device.open(OpenMode::ReadWrite).unwrap();
  assert_eq!(
    device.open(OpenMode::ReadOnly).unwrap_err().kind(),
    ErrorKind::AlreadyExists
  );
}

#[test]
fn test_short_read_at_end() {
  let mut device = MemoryDevice::with_data(vec![1, 2]);
  device.open(OpenMode::ReadOnly).unwrap();
  let mut buf = [0u8; 4];
  assert_eq!(device.read(&mut buf).unwrap(), 2);
  assert_eq!(device.read(&mut buf).unwrap(), 0);
}
