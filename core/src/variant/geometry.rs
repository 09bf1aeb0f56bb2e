use crate::archive::{InputArchive, OutputArchive};
use crate::error::ArchiveResult;
use crate::persist::Persist;
use crate::ClassTraits;

macro_rules! geometry {
  ($(#[$meta:meta])* $name:ident($class:tt) { $($field:ident: $ty:ty),* $(,)? }) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Default, ClassTraits)]
    #[class(name = $class, untracked, no_class_info)]
    pub struct $name {
      $(pub $field: $ty),*
    }

    impl $name {
      pub fn new($($field: $ty),*) -> Self {
        Self { $($field),* }
      }
    }

    impl Persist for $name {
      fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
        $(ar.field(stringify!($field), &self.$field)?;)*
        Ok(())
      }

      fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
        Ok(Self {
          $($field: ar.field(stringify!($field))?),*
        })
      }
    }
  };
}

geometry!(Point("Point") { x: i32, y: i32 });
geometry!(PointF("PointF") { x: f64, y: f64 });
geometry!(Size("Size") { width: i32, height: i32 });
geometry!(SizeF("SizeF") { width: f64, height: f64 });
geometry!(Rect("Rect") { x: i32, y: i32, width: i32, height: i32 });
geometry!(RectF("RectF") { x: f64, y: f64, width: f64, height: f64 });
geometry!(Line("Line") { p1: Point, p2: Point });
geometry!(LineF("LineF") { p1: PointF, p2: PointF });
geometry!(
  /// 8-bit RGBA color.
  Color("Color") { red: u8, green: u8, blue: u8, alpha: u8 }
);
