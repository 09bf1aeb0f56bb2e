mod factory;
mod registration;
mod serializer;

pub use self::{factory::*, registration::*, serializer::*};

use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::class_traits::ClassTraits;
use crate::codec::ArchiveFormat;
use crate::descriptor::TypeDescriptor;
use crate::error::{ArchiveError, ArchiveResult};
use crate::persist::Persist;
use crate::variant::{variant_type_name, VariantPayload};

pub trait AnyDowncastExt {
  fn downcast_arc<T: Any + Send + Sync>(self) -> Result<Arc<T>, Arc<dyn Any + Send + Sync>>;
}

impl AnyDowncastExt for Arc<dyn Any + Send + Sync> {
  fn downcast_arc<T: Any + Send + Sync>(self) -> Result<Arc<T>, Arc<dyn Any + Send + Sync>> {
    Arc::downcast(self)
  }
}

#[derive(Default)]
struct RegistryInner {
  factories: FactoryRegistry,
  serializers: SerializerRegistry,
  next_id: AtomicU64,
}

static SHARED_REGISTRY: Lazy<ClassRegistry> = Lazy::new(ClassRegistry::new);

/// Factory and serializer registries shared by archive sessions.
///
/// Cloning yields another handle to the same registries. Entries are added through the
/// `register_*` methods and removed when the returned [`Registration`] is dropped.
#[derive(Clone, Default)]
pub struct ClassRegistry {
  inner: Arc<RegistryInner>,
}

impl ClassRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide registry used by `ArchiveConfig::default()`.
  pub fn shared() -> Self {
    SHARED_REGISTRY.clone()
  }

  pub fn factories(&self) -> &FactoryRegistry {
    &self.inner.factories
  }

  pub fn serializers(&self) -> &SerializerRegistry {
    &self.inner.serializers
  }

  /// Registers a default-constructible class `C` under base `B` for every format.
  ///
  /// ```ignore
  /// let registration = registry.register_class::<dyn Shape, Circle>(|circle| circle);
  /// ```
  pub fn register_class<B, C>(&self, upcast: fn(Box<C>) -> Box<B>) -> Registration
  where
    B: ?Sized + 'static,
    C: Persist + Default + 'static, {
    self.register_entries::<B>(
      None,
      C::class_name().as_ref(),
      Some(Arc::new(DefaultFactory::new(upcast))),
      Some(Arc::new(TypedSerializer::<C>::new())),
    )
  }

  /// Like [`register_class`](Self::register_class), but only for archives of `format`.
  pub fn register_class_for<B, C>(&self, format: ArchiveFormat, upcast: fn(Box<C>) -> Box<B>) -> Registration
  where
    B: ?Sized + 'static,
    C: Persist + Default + 'static, {
    self.register_entries::<B>(
      Some(format),
      C::class_name().as_ref(),
      Some(Arc::new(DefaultFactory::new(upcast))),
      Some(Arc::new(TypedSerializer::<C>::new())),
    )
  }

  /// Registers a class without a default value. It can be restored from an archive but
  /// not instantiated.
  pub fn register_class_with_args<B, C>(&self, upcast: fn(Box<C>) -> Box<B>) -> Registration
  where
    B: ?Sized + 'static,
    C: Persist + 'static, {
    self.register_entries::<B>(
      None,
      C::class_name().as_ref(),
      Some(Arc::new(ArgsFactory::new(upcast))),
      Some(Arc::new(TypedSerializer::<C>::new())),
    )
  }

  /// Registers the abstract base itself; lookups succeed but never yield an instance.
  pub fn register_abstract<B: ClassTraits + ?Sized + 'static>(&self) -> Registration {
    let descriptor = TypeDescriptor::of::<B>();
    let name = descriptor.name().to_string();
    self.register_entries::<B>(None, &name, Some(Arc::new(AbstractFactory::new(descriptor))), None)
  }

  /// Registers a user payload of the dynamic value wrapper under `Variant<Name>`.
  pub fn register_variant_payload<T>(&self) -> Registration
  where
    T: VariantPayload + Persist + Default + 'static, {
    let name = variant_type_name(&T::class_name());
    let descriptor = TypeDescriptor::of::<T>().with_name(name.clone());
    let factory = DefaultFactory::<dyn VariantPayload, T>::new(|payload| payload).with_descriptor(descriptor);
    self.register_entries::<dyn VariantPayload>(
      None,
      &name,
      Some(Arc::new(factory)),
      Some(Arc::new(TypedSerializer::<T>::new())),
    )
  }

  /// Finds the factory for `name` under base `B`, format-specific entries first.
  pub fn factory<B: ?Sized + 'static>(
    &self,
    format: ArchiveFormat,
    name: &str,
  ) -> ArchiveResult<Arc<dyn ObjectFactory<B>>> {
    self
      .factories()
      .lookup::<B>(format, name)
      .ok_or_else(|| ArchiveError::unregistered_class(name))
  }

  pub fn serializer(&self, format: ArchiveFormat, name: &str) -> ArchiveResult<Arc<dyn ErasedSerializer>> {
    self
      .serializers()
      .lookup(format, name)
      .ok_or_else(|| ArchiveError::serializer_not_found(name))
  }

  /// Default-constructs the class registered under `name`; abstract classes yield `None`.
  pub fn instantiate<B: ?Sized + 'static>(&self, format: ArchiveFormat, name: &str) -> ArchiveResult<Option<Box<B>>> {
    Ok(self.factory::<B>(format, name)?.instantiate())
  }

  fn register_entries<B: ?Sized + 'static>(
    &self,
    format: Option<ArchiveFormat>,
    name: &str,
    factory: Option<Arc<dyn ObjectFactory<B>>>,
    serializer: Option<Arc<dyn ErasedSerializer>>,
  ) -> Registration {
    if name.is_empty() {
      tracing::warn!(
        "Registering a class without a name: base = {}",
        std::any::type_name::<B>()
      );
    }
    let id = RegistrationId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
    let factory_keys = factory
      .map(|factory| self.factories().insert(id, format, name, factory))
      .into_iter()
      .collect();
    let serializer_keys = serializer
      .map(|serializer| self.serializers().insert(id, format, name, serializer))
      .into_iter()
      .collect();
    Registration::new(self.clone(), id, factory_keys, serializer_keys)
  }
}

impl Debug for ClassRegistry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ClassRegistry")
      .field("factories", self.factories())
      .field("serializers", self.serializers())
      .finish()
  }
}

static_assertions::assert_impl_all!(ClassRegistry: Send, Sync, Clone);
