use std::borrow::Cow;

/// Static per-type metadata consulted by the archive engine.
///
/// Traits attach to the exact type and are not inherited. A type that is serialized
/// through a base reference must set a non-empty `NAME`.
pub trait ClassTraits {
  const NAME: &'static str = "";
  const VERSION: u32 = 0;
  const IS_ABSTRACT: bool = false;
  /// Shared references to the type are deduplicated within one archive.
  const TRACKED: bool = true;
  /// The persisted version number is written in front of the value.
  const STORE_CLASS_INFO: bool = true;
  const IS_PRIMITIVE: bool = false;

  fn class_name() -> Cow<'static, str> {
    Cow::Borrowed(Self::NAME)
  }
}

/// Composes a parameterized class name such as `Vec<int32>` or `BTreeMap<string,double>`.
pub fn template_name(outer: &str, inner: &[Cow<'_, str>]) -> String {
  format!("{outer}<{}>", inner.join(","))
}

/// Returns a default instance unless the type is marked abstract.
pub fn construct_default<T: ClassTraits + Default>() -> Option<T> {
  if T::IS_ABSTRACT {
    None
  } else {
    Some(T::default())
  }
}

macro_rules! primitive_class_traits {
  ($($ty:ty => $name:literal),* $(,)?) => {
    $(
      impl ClassTraits for $ty {
        const NAME: &'static str = $name;
        const TRACKED: bool = false;
        const STORE_CLASS_INFO: bool = false;
        const IS_PRIMITIVE: bool = true;
      }
    )*
  };
}

primitive_class_traits! {
  i8 => "int8",
  u8 => "uint8",
  i16 => "int16",
  u16 => "uint16",
  i32 => "int32",
  u32 => "uint32",
  i64 => "int64",
  u64 => "uint64",
  isize => "isize",
  usize => "usize",
  f32 => "float",
  f64 => "double",
  bool => "bool",
  char => "char",
  String => "string",
}
