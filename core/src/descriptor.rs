use std::any::Any;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use crate::class_traits::ClassTraits;

/// The resolved `{name, version, store_version}` of one concrete serialized object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
  name: Cow<'static, str>,
  version: u32,
  store_version: bool,
}

impl TypeDescriptor {
  pub fn new(name: impl Into<Cow<'static, str>>, version: u32, store_version: bool) -> Self {
    Self {
      name: name.into(),
      version,
      store_version,
    }
  }

  pub fn of<T: ClassTraits + ?Sized>() -> Self {
    Self::new(T::class_name(), T::VERSION, T::STORE_CLASS_INFO)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn version(&self) -> u32 {
    self.version
  }

  pub fn store_version(&self) -> bool {
    self.store_version
  }

  pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
    self.name = name.into();
    self
  }
}

impl Display for TypeDescriptor {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}@{}", self.name, self.version)
  }
}

/// Runtime self-description for values reached through a trait object.
///
/// Implement it with `#[derive(SelfDescribing)]` and make it a supertrait of every
/// polymorphic base trait.
pub trait SelfDescribing: Any {
  fn describe(&self) -> TypeDescriptor;

  fn as_any(&self) -> &dyn Any;

  fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests;
