use std::fmt::{Display, Formatter};

use crate::registry::{ClassRegistry, FactoryKey, SerializerKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
  pub(crate) fn new(value: u64) -> Self {
    Self(value)
  }

  pub fn value(&self) -> u64 {
    self.0
  }
}

impl Display for RegistrationId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Keeps registry entries alive; dropping it removes exactly the entries it added.
///
/// Removal goes by registration id, so an entry registered later under the same name
/// is left untouched.
#[must_use = "dropping a Registration removes its entries immediately"]
#[derive(Debug)]
pub struct Registration {
  registry: ClassRegistry,
  id: RegistrationId,
  factory_keys: Vec<FactoryKey>,
  serializer_keys: Vec<SerializerKey>,
  kept: bool,
}

impl Registration {
  pub(crate) fn new(
    registry: ClassRegistry,
    id: RegistrationId,
    factory_keys: Vec<FactoryKey>,
    serializer_keys: Vec<SerializerKey>,
  ) -> Self {
    Self {
      registry,
      id,
      factory_keys,
      serializer_keys,
      kept: false,
    }
  }

  pub fn id(&self) -> RegistrationId {
    self.id
  }

  /// Leaves the entries registered for the lifetime of the registry.
  pub fn keep(mut self) {
    self.kept = true;
  }

  /// Removes the entries now.
  pub fn unregister(self) {}
}

impl Drop for Registration {
  fn drop(&mut self) {
    if self.kept {
      return;
    }
    let factories = self
      .factory_keys
      .iter()
      .map(|key| self.registry.factories().remove(key, self.id))
      .sum::<usize>();
    let serializers = self
      .serializer_keys
      .iter()
      .map(|key| self.registry.serializers().remove(key, self.id))
      .sum::<usize>();
    tracing::debug!(
      "Unregistering: id = {}, factories = {}, serializers = {}",
      self.id,
      factories,
      serializers
    );
  }
}
