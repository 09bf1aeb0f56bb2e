use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use archivum_utils_rs::collections::DashMapStackExtension;
use dashmap::DashMap;

use crate::archive::OutputArchive;
use crate::codec::ArchiveFormat;
use crate::descriptor::TypeDescriptor;
use crate::error::{ArchiveError, ArchiveResult};
use crate::persist::Persist;
use crate::registry::RegistrationId;

/// Type-erased save entry point for objects reached through a base reference.
pub trait ErasedSerializer: Send + Sync {
  fn descriptor(&self) -> TypeDescriptor;

  fn save(&self, ar: &mut OutputArchive<'_>, object: &dyn Any, version: u32) -> ArchiveResult<()>;
}

pub struct TypedSerializer<C> {
  descriptor: TypeDescriptor,
  _phantom: PhantomData<fn(&C)>,
}

impl<C: Persist> TypedSerializer<C> {
  pub fn new() -> Self {
    Self {
      descriptor: TypeDescriptor::of::<C>(),
      _phantom: PhantomData,
    }
  }
}

impl<C: Persist> Default for TypedSerializer<C> {
  fn default() -> Self {
    Self::new()
  }
}

impl<C: Persist + 'static> ErasedSerializer for TypedSerializer<C> {
  fn descriptor(&self) -> TypeDescriptor {
    self.descriptor.clone()
  }

  fn save(&self, ar: &mut OutputArchive<'_>, object: &dyn Any, version: u32) -> ArchiveResult<()> {
    let object = object.downcast_ref::<C>().ok_or_else(|| {
      ArchiveError::unknown("serializer received an object of a different class").with_info(self.descriptor.name())
    })?;
    object.save(ar, version)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializerKey {
  format: Option<ArchiveFormat>,
  name: String,
}

impl SerializerKey {
  pub fn new(format: Option<ArchiveFormat>, name: &str) -> Self {
    Self {
      format,
      name: name.to_string(),
    }
  }

  pub fn format(&self) -> Option<ArchiveFormat> {
    self.format
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

type SerializerEntry = (RegistrationId, Arc<dyn ErasedSerializer>);

/// Name-keyed serializers, one stack of entries per `(format, name)`.
#[derive(Default)]
pub struct SerializerRegistry {
  entries: DashMap<SerializerKey, Vec<SerializerEntry>>,
}

impl SerializerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn insert(
    &self,
    id: RegistrationId,
    format: Option<ArchiveFormat>,
    name: &str,
    serializer: Arc<dyn ErasedSerializer>,
  ) -> SerializerKey {
    let key = SerializerKey::new(format, name);
    tracing::debug!(
      "Registering serializer: name = {}, format = {:?}, id = {}",
      name,
      format,
      id
    );
    self.entries.push_value(key.clone(), (id, serializer));
    key
  }

  pub(crate) fn remove(&self, key: &SerializerKey, id: RegistrationId) -> usize {
    self.entries.remove_values_where(key, |(entry_id, _)| *entry_id == id)
  }

  /// Tries the format-specific entry first, then the format-agnostic one.
  pub fn lookup(&self, format: ArchiveFormat, name: &str) -> Option<Arc<dyn ErasedSerializer>> {
    [Some(format), None].into_iter().find_map(|format| {
      self
        .entries
        .last_value(&SerializerKey::new(format, name))
        .map(|(_, serializer)| serializer)
    })
  }

  pub fn contains(&self, format: Option<ArchiveFormat>, name: &str) -> bool {
    self.entries.contains_key(&SerializerKey::new(format, name))
  }

  pub fn len(&self) -> usize {
    self.entries.iter().map(|entry| entry.value().len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl Debug for SerializerRegistry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SerializerRegistry").field("entries", &self.len()).finish()
  }
}
