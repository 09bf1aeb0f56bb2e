mod geometry;

pub use self::geometry::*;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::archive::{InputArchive, OutputArchive};
use crate::class_traits::{template_name, ClassTraits};
use crate::descriptor::{SelfDescribing, TypeDescriptor};
use crate::error::ArchiveResult;
use crate::persist::Persist;

/// Persisted type tag of a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, strum::Display)]
#[repr(u32)]
pub enum VariantKind {
  Invalid = 0,
  Bool = 1,
  Int = 2,
  UInt = 3,
  LongLong = 4,
  ULongLong = 5,
  Double = 6,
  Char = 7,
  Map = 8,
  List = 9,
  String = 10,
  StringList = 11,
  ByteArray = 12,
  Date = 14,
  Time = 15,
  DateTime = 16,
  Rect = 19,
  RectF = 20,
  Size = 21,
  SizeF = 22,
  Line = 23,
  LineF = 24,
  Point = 25,
  PointF = 26,
  Float = 38,
  Color = 67,
  User = 1024,
}

/// A user-defined value carried by [`Variant::User`].
///
/// Implemented for every `SelfDescribing + Clone + PartialEq + Debug` type. A payload
/// only round-trips once registered with `ClassRegistry::register_variant_payload`.
pub trait VariantPayload: SelfDescribing + Send + Sync + Debug {
  fn clone_payload(&self) -> Box<dyn VariantPayload>;

  fn eq_payload(&self, other: &dyn VariantPayload) -> bool;
}

impl<T> VariantPayload for T
where
  T: SelfDescribing + Clone + PartialEq + Debug + Send + Sync,
{
  fn clone_payload(&self) -> Box<dyn VariantPayload> {
    Box::new(self.clone())
  }

  fn eq_payload(&self, other: &dyn VariantPayload) -> bool {
    other.as_any().downcast_ref::<T>() == Some(self)
  }
}

#[derive(Debug)]
pub struct UserValue(Box<dyn VariantPayload>);

impl UserValue {
  pub fn new(payload: impl VariantPayload) -> Self {
    Self(Box::new(payload))
  }

  pub fn payload(&self) -> &dyn VariantPayload {
    self.0.as_ref()
  }

  pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
    self.payload().as_any().downcast_ref::<T>()
  }

  pub fn descriptor(&self) -> TypeDescriptor {
    self.payload().describe()
  }
}

impl Clone for UserValue {
  fn clone(&self) -> Self {
    Self(self.payload().clone_payload())
  }
}

impl PartialEq for UserValue {
  fn eq(&self, other: &Self) -> bool {
    self.payload().eq_payload(other.payload())
  }
}

/// Boxed "any value" with a closed set of built-in kinds plus registered user payloads.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
  #[default]
  Invalid,
  Bool(bool),
  Int(i32),
  UInt(u32),
  LongLong(i64),
  ULongLong(u64),
  Float(f32),
  Double(f64),
  Char(char),
  String(String),
  ByteArray(Vec<u8>),
  StringList(Vec<String>),
  List(Vec<Variant>),
  Map(BTreeMap<String, Variant>),
  Date(NaiveDate),
  Time(NaiveTime),
  DateTime(NaiveDateTime),
  Point(Point),
  PointF(PointF),
  Size(Size),
  SizeF(SizeF),
  Rect(Rect),
  RectF(RectF),
  Line(Line),
  LineF(LineF),
  Color(Color),
  User(UserValue),
}

impl Variant {
  pub fn user(payload: impl VariantPayload) -> Self {
    Variant::User(UserValue::new(payload))
  }

  pub fn is_valid(&self) -> bool {
    !matches!(self, Variant::Invalid)
  }

  pub fn kind(&self) -> VariantKind {
    match self {
      Variant::Invalid => VariantKind::Invalid,
      Variant::Bool(_) => VariantKind::Bool,
      Variant::Int(_) => VariantKind::Int,
      Variant::UInt(_) => VariantKind::UInt,
      Variant::LongLong(_) => VariantKind::LongLong,
      Variant::ULongLong(_) => VariantKind::ULongLong,
      Variant::Float(_) => VariantKind::Float,
      Variant::Double(_) => VariantKind::Double,
      Variant::Char(_) => VariantKind::Char,
      Variant::String(_) => VariantKind::String,
      Variant::ByteArray(_) => VariantKind::ByteArray,
      Variant::StringList(_) => VariantKind::StringList,
      Variant::List(_) => VariantKind::List,
      Variant::Map(_) => VariantKind::Map,
      Variant::Date(_) => VariantKind::Date,
      Variant::Time(_) => VariantKind::Time,
      Variant::DateTime(_) => VariantKind::DateTime,
      Variant::Point(_) => VariantKind::Point,
      Variant::PointF(_) => VariantKind::PointF,
      Variant::Size(_) => VariantKind::Size,
      Variant::SizeF(_) => VariantKind::SizeF,
      Variant::Rect(_) => VariantKind::Rect,
      Variant::RectF(_) => VariantKind::RectF,
      Variant::Line(_) => VariantKind::Line,
      Variant::LineF(_) => VariantKind::LineF,
      Variant::Color(_) => VariantKind::Color,
      Variant::User(_) => VariantKind::User,
    }
  }

  pub fn payload<T: 'static>(&self) -> Option<&T> {
    match self {
      Variant::User(value) => value.downcast_ref(),
      _ => None,
    }
  }
}

macro_rules! variant_from {
  ($($ty:ty => $kind:ident),* $(,)?) => {
    $(
      impl From<$ty> for Variant {
        fn from(value: $ty) -> Self {
          Variant::$kind(value)
        }
      }
    )*
  };
}

variant_from! {
  bool => Bool,
  i32 => Int,
  u32 => UInt,
  i64 => LongLong,
  u64 => ULongLong,
  f32 => Float,
  f64 => Double,
  char => Char,
  String => String,
  Vec<String> => StringList,
  Vec<Variant> => List,
  BTreeMap<String, Variant> => Map,
  NaiveDate => Date,
  NaiveTime => Time,
  NaiveDateTime => DateTime,
  Point => Point,
  PointF => PointF,
  Size => Size,
  SizeF => SizeF,
  Rect => Rect,
  RectF => RectF,
  Line => Line,
  LineF => LineF,
  Color => Color,
}

impl From<&str> for Variant {
  fn from(value: &str) -> Self {
    Variant::String(value.to_string())
  }
}

/// Registry name of a user payload class, e.g. `Variant<Matrix>`.
pub fn variant_type_name(class_name: &str) -> String {
  template_name("Variant", &[Cow::Borrowed(class_name)])
}

impl ClassTraits for Variant {
  const NAME: &'static str = "Variant";
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;
}

/// An unregistered user payload reads as `Variant::Invalid`. Its body stays in the stream,
/// so nothing read after it can be trusted.
impl Persist for Variant {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_enum(self.kind())?;
    match self {
      Variant::Invalid => Ok(()),
      Variant::Bool(value) => ar.write(value),
      Variant::Int(value) => ar.write(value),
      Variant::UInt(value) => ar.write(value),
      Variant::LongLong(value) => ar.write(value),
      Variant::ULongLong(value) => ar.write(value),
      Variant::Float(value) => ar.write(value),
      Variant::Double(value) => ar.write(value),
      Variant::Char(value) => ar.write(value),
      Variant::String(value) => ar.write(value),
      Variant::ByteArray(value) => ar.write_bytes(value),
      Variant::StringList(value) => ar.write(value),
      Variant::List(value) => ar.write(value),
      Variant::Map(value) => ar.write(value),
      Variant::Date(value) => ar.write(value),
      Variant::Time(value) => ar.write(value),
      Variant::DateTime(value) => ar.write(value),
      Variant::Point(value) => ar.write(value),
      Variant::PointF(value) => ar.write(value),
      Variant::Size(value) => ar.write(value),
      Variant::SizeF(value) => ar.write(value),
      Variant::Rect(value) => ar.write(value),
      Variant::RectF(value) => ar.write(value),
      Variant::Line(value) => ar.write(value),
      Variant::LineF(value) => ar.write(value),
      Variant::Color(value) => ar.write(value),
      Variant::User(value) => save_user(ar, value),
    }
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let kind: VariantKind = ar.read_enum()?;
    let value = match kind {
      VariantKind::Invalid => Variant::Invalid,
      VariantKind::Bool => Variant::Bool(ar.read()?),
      VariantKind::Int => Variant::Int(ar.read()?),
      VariantKind::UInt => Variant::UInt(ar.read()?),
      VariantKind::LongLong => Variant::LongLong(ar.read()?),
      VariantKind::ULongLong => Variant::ULongLong(ar.read()?),
      VariantKind::Float => Variant::Float(ar.read()?),
      VariantKind::Double => Variant::Double(ar.read()?),
      VariantKind::Char => Variant::Char(ar.read()?),
      VariantKind::String => Variant::String(ar.read()?),
      VariantKind::ByteArray => Variant::ByteArray(ar.read_bytes()?),
      VariantKind::StringList => Variant::StringList(ar.read()?),
      VariantKind::List => Variant::List(ar.read()?),
      VariantKind::Map => Variant::Map(ar.read()?),
      VariantKind::Date => Variant::Date(ar.read()?),
      VariantKind::Time => Variant::Time(ar.read()?),
      VariantKind::DateTime => Variant::DateTime(ar.read()?),
      VariantKind::Point => Variant::Point(ar.read()?),
      VariantKind::PointF => Variant::PointF(ar.read()?),
      VariantKind::Size => Variant::Size(ar.read()?),
      VariantKind::SizeF => Variant::SizeF(ar.read()?),
      VariantKind::Rect => Variant::Rect(ar.read()?),
      VariantKind::RectF => Variant::RectF(ar.read()?),
      VariantKind::Line => Variant::Line(ar.read()?),
      VariantKind::LineF => Variant::LineF(ar.read()?),
      VariantKind::Color => Variant::Color(ar.read()?),
      VariantKind::User => load_user(ar)?,
    };
    Ok(value)
  }
}

/// Unregistered payloads degrade to an empty class name instead of failing the session.
fn save_user(ar: &mut OutputArchive<'_>, value: &UserValue) -> ArchiveResult<()> {
  let descriptor = value.descriptor();
  let name = variant_type_name(descriptor.name());
  let Some(serializer) = ar.registry().serializers().lookup(ar.format(), &name) else {
    tracing::warn!("Unregistered variant payload written as an empty placeholder: class = {}", name);
    return ar.write_str("");
  };
  ar.write_str(&name)?;
  let version = ar.write_class_version(descriptor.store_version(), descriptor.version())?;
  serializer.save(ar, value.payload().as_any(), version)
}

fn load_user(ar: &mut InputArchive<'_>) -> ArchiveResult<Variant> {
  let name = ar.read_string()?;
  if name.is_empty() {
    tracing::warn!("Variant payload placeholder read as an invalid variant");
    return Ok(Variant::Invalid);
  }
  let Some(factory) = ar.registry().factories().lookup::<dyn VariantPayload>(ar.format(), &name) else {
    tracing::warn!("Unregistered variant payload read as an invalid variant: class = {}", name);
    return Ok(Variant::Invalid);
  };
  let version = ar.read_descriptor_version(&factory.descriptor())?;
  let payload = factory.restore(ar, version)?;
  Ok(payload.map(|payload| Variant::User(UserValue(payload))).unwrap_or_default())
}

#[cfg(test)]
mod tests;
