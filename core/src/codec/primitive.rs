use crate::codec::{PrimitiveReader, PrimitiveWriter};
use crate::error::{ArchiveError, ArchiveResult};

/// Selects the codec method for one primitive type.
pub trait Primitive: Copy + 'static {
  fn write_to<W: PrimitiveWriter + ?Sized>(self, writer: &mut W) -> ArchiveResult<()>;

  fn read_from<R: PrimitiveReader + ?Sized>(reader: &mut R) -> ArchiveResult<Self>;
}

macro_rules! primitive {
  ($($ty:ty => $write:ident, $read:ident;)*) => {
    $(
      impl Primitive for $ty {
        fn write_to<W: PrimitiveWriter + ?Sized>(self, writer: &mut W) -> ArchiveResult<()> {
          writer.$write(self)
        }

        fn read_from<R: PrimitiveReader + ?Sized>(reader: &mut R) -> ArchiveResult<Self> {
          reader.$read()
        }
      }
    )*
  };
}

primitive! {
  u8 => write_u8, read_u8;
  i8 => write_i8, read_i8;
  u16 => write_u16, read_u16;
  i16 => write_i16, read_i16;
  u32 => write_u32, read_u32;
  i32 => write_i32, read_i32;
  u64 => write_u64, read_u64;
  i64 => write_i64, read_i64;
  f32 => write_f32, read_f32;
  f64 => write_f64, read_f64;
  bool => write_bool, read_bool;
  char => write_char, read_char;
}

// Platform-width integers always travel as 64 bits.
impl Primitive for usize {
  fn write_to<W: PrimitiveWriter + ?Sized>(self, writer: &mut W) -> ArchiveResult<()> {
    writer.write_u64(self as u64)
  }

  fn read_from<R: PrimitiveReader + ?Sized>(reader: &mut R) -> ArchiveResult<Self> {
    let value = reader.read_u64()?;
    usize::try_from(value).map_err(|_| ArchiveError::invalid_data_format(format!("{value} does not fit in usize")))
  }
}

impl Primitive for isize {
  fn write_to<W: PrimitiveWriter + ?Sized>(self, writer: &mut W) -> ArchiveResult<()> {
    writer.write_i64(self as i64)
  }

  fn read_from<R: PrimitiveReader + ?Sized>(reader: &mut R) -> ArchiveResult<Self> {
    let value = reader.read_i64()?;
    isize::try_from(value).map_err(|_| ArchiveError::invalid_data_format(format!("{value} does not fit in isize")))
  }
}
