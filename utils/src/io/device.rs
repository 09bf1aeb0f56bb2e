use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::net::TcpStream;

/// A byte stream whose open/closed state can be queried before use.
///
/// Archives refuse to start a session on a device that is not open.
pub trait Device {
  fn is_open(&self) -> bool;
}

impl Device for Vec<u8> {
  fn is_open(&self) -> bool {
    true
  }
}

impl Device for &[u8] {
  fn is_open(&self) -> bool {
    true
  }
}

impl<T> Device for Cursor<T> {
  fn is_open(&self) -> bool {
    true
  }
}

impl Device for File {
  fn is_open(&self) -> bool {
    true
  }
}

impl Device for TcpStream {
  fn is_open(&self) -> bool {
    self.peer_addr().is_ok()
  }
}

impl<D: Device> Device for BufReader<D> {
  fn is_open(&self) -> bool {
    self.get_ref().is_open()
  }
}

impl<D: Device + Write> Device for BufWriter<D> {
  fn is_open(&self) -> bool {
    self.get_ref().is_open()
  }
}

impl<D: Device + ?Sized> Device for &mut D {
  fn is_open(&self) -> bool {
    (**self).is_open()
  }
}

impl<D: Device + ?Sized> Device for Box<D> {
  fn is_open(&self) -> bool {
    (**self).is_open()
  }
}
