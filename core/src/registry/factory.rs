use std::any::{Any, TypeId};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use archivum_utils_rs::collections::DashMapStackExtension;
use dashmap::DashMap;

use crate::archive::InputArchive;
use crate::class_traits::construct_default;
use crate::codec::ArchiveFormat;
use crate::descriptor::TypeDescriptor;
use crate::error::ArchiveResult;
use crate::persist::Persist;
use crate::registry::{AnyDowncastExt, RegistrationId};

/// Creates instances of one concrete class behind base `B`.
pub trait ObjectFactory<B: ?Sized>: Send + Sync {
  fn descriptor(&self) -> TypeDescriptor;

  /// Reads a new instance whose class name and version were already consumed.
  /// Abstract classes yield `None`.
  fn restore(&self, ar: &mut InputArchive<'_>, version: u32) -> ArchiveResult<Option<Box<B>>>;

  /// Default-constructs an instance; `None` for abstract or non-default-constructible classes.
  fn instantiate(&self) -> Option<Box<B>>;
}

/// Factory for a default-constructible class.
pub struct DefaultFactory<B: ?Sized, C> {
  descriptor: TypeDescriptor,
  upcast: fn(Box<C>) -> Box<B>,
}

impl<B: ?Sized, C: Persist> DefaultFactory<B, C> {
  pub fn new(upcast: fn(Box<C>) -> Box<B>) -> Self {
    Self {
      descriptor: TypeDescriptor::of::<C>(),
      upcast,
    }
  }

  pub fn with_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
    self.descriptor = descriptor;
    self
  }
}

impl<B: ?Sized, C: Persist + Default> ObjectFactory<B> for DefaultFactory<B, C> {
  fn descriptor(&self) -> TypeDescriptor {
    self.descriptor.clone()
  }

  fn restore(&self, ar: &mut InputArchive<'_>, version: u32) -> ArchiveResult<Option<Box<B>>> {
    C::load(ar, version).map(|object| Some((self.upcast)(Box::new(object))))
  }

  fn instantiate(&self) -> Option<Box<B>> {
    construct_default::<C>().map(|object| (self.upcast)(Box::new(object)))
  }
}

/// Factory for a class without a default value; `Persist::load` reads its construction
/// arguments from the archive.
pub struct ArgsFactory<B: ?Sized, C> {
  descriptor: TypeDescriptor,
  upcast: fn(Box<C>) -> Box<B>,
}

impl<B: ?Sized, C: Persist> ArgsFactory<B, C> {
  pub fn new(upcast: fn(Box<C>) -> Box<B>) -> Self {
    Self {
      descriptor: TypeDescriptor::of::<C>(),
      upcast,
    }
  }
}

impl<B: ?Sized, C: Persist> ObjectFactory<B> for ArgsFactory<B, C> {
  fn descriptor(&self) -> TypeDescriptor {
    self.descriptor.clone()
  }

  fn restore(&self, ar: &mut InputArchive<'_>, version: u32) -> ArchiveResult<Option<Box<B>>> {
    C::load(ar, version).map(|object| Some((self.upcast)(Box::new(object))))
  }

  fn instantiate(&self) -> Option<Box<B>> {
    None
  }
}

/// Factory registered for an abstract base; it never yields an instance.
pub struct AbstractFactory<B: ?Sized> {
  descriptor: TypeDescriptor,
  _phantom: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized> AbstractFactory<B> {
  pub fn new(descriptor: TypeDescriptor) -> Self {
    Self {
      descriptor,
      _phantom: PhantomData,
    }
  }
}

impl<B: ?Sized> ObjectFactory<B> for AbstractFactory<B> {
  fn descriptor(&self) -> TypeDescriptor {
    self.descriptor.clone()
  }

  fn restore(&self, _ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Option<Box<B>>> {
    Ok(None)
  }

  fn instantiate(&self) -> Option<Box<B>> {
    None
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryKey {
  format: Option<ArchiveFormat>,
  name: String,
  base: TypeId,
}

impl FactoryKey {
  pub fn new<B: ?Sized + 'static>(format: Option<ArchiveFormat>, name: &str) -> Self {
    Self {
      format,
      name: name.to_string(),
      base: TypeId::of::<B>(),
    }
  }

  pub fn format(&self) -> Option<ArchiveFormat> {
    self.format
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

type FactoryEntry = (RegistrationId, Arc<dyn Any + Send + Sync>);

/// Name-keyed factories, one stack of entries per `(format, name, base)`.
#[derive(Default)]
pub struct FactoryRegistry {
  entries: DashMap<FactoryKey, Vec<FactoryEntry>>,
}

impl FactoryRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn insert<B: ?Sized + 'static>(
    &self,
    id: RegistrationId,
    format: Option<ArchiveFormat>,
    name: &str,
    factory: Arc<dyn ObjectFactory<B>>,
  ) -> FactoryKey {
    let key = FactoryKey::new::<B>(format, name);
    tracing::debug!(
      "Registering factory: name = {}, format = {:?}, base = {}, id = {}",
      name,
      format,
      std::any::type_name::<B>(),
      id
    );
    self
      .entries
      .push_value(key.clone(), (id, Arc::new(factory) as Arc<dyn Any + Send + Sync>));
    key
  }

  pub(crate) fn remove(&self, key: &FactoryKey, id: RegistrationId) -> usize {
    self.entries.remove_values_where(key, |(entry_id, _)| *entry_id == id)
  }

  /// Tries the format-specific entry first, then the format-agnostic one.
  pub fn lookup<B: ?Sized + 'static>(&self, format: ArchiveFormat, name: &str) -> Option<Arc<dyn ObjectFactory<B>>> {
    [Some(format), None].into_iter().find_map(|format| {
      let key = FactoryKey::new::<B>(format, name);
      self
        .entries
        .last_value(&key)
        .and_then(|(_, factory)| factory.downcast_arc::<Arc<dyn ObjectFactory<B>>>().ok())
        .map(|factory| factory.as_ref().clone())
    })
  }

  pub fn contains<B: ?Sized + 'static>(&self, format: Option<ArchiveFormat>, name: &str) -> bool {
    self.entries.contains_key(&FactoryKey::new::<B>(format, name))
  }

  pub fn len(&self) -> usize {
    self.entries.iter().map(|entry| entry.value().len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl Debug for FactoryRegistry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FactoryRegistry").field("entries", &self.len()).finish()
  }
}
