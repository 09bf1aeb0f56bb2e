use crate::archive::{InputArchive, OutputArchive};
use crate::descriptor::{SelfDescribing, TypeDescriptor};
use crate::error::{ArchiveError, ArchiveResult};
use crate::persist::Persist;
use crate::pointer::Pointee;

/// How a pointee is described, saved and restored when reached through a pointer.
pub trait DispatchStrategy<T: ?Sized> {
  fn describe(object: &T) -> TypeDescriptor;

  fn save(object: &T, ar: &mut OutputArchive<'_>, descriptor: &TypeDescriptor, version: u32) -> ArchiveResult<()>;

  /// Resolves the descriptor for a class name read from the stream.
  fn incoming(ar: &InputArchive<'_>, name: &str) -> ArchiveResult<TypeDescriptor>;

  fn restore(ar: &mut InputArchive<'_>, name: &str, version: u32) -> ArchiveResult<Box<T>>;
}

/// Trait-only dispatch for concrete types; no registry involved.
#[derive(Debug, Clone, Copy)]
pub struct StaticDispatch;

/// Runtime dispatch for trait objects through `SelfDescribing` and the class registry.
#[derive(Debug, Clone, Copy)]
pub struct DynamicDispatch;

impl<T: Persist + 'static> DispatchStrategy<T> for StaticDispatch {
  fn describe(_object: &T) -> TypeDescriptor {
    TypeDescriptor::of::<T>()
  }

  fn save(object: &T, ar: &mut OutputArchive<'_>, _descriptor: &TypeDescriptor, version: u32) -> ArchiveResult<()> {
    object.save(ar, version)
  }

  fn incoming(_ar: &InputArchive<'_>, name: &str) -> ArchiveResult<TypeDescriptor> {
    let descriptor = TypeDescriptor::of::<T>();
    if descriptor.name() != name {
      return Err(
        ArchiveError::invalid_data_format(format!("expected class {:?}", descriptor.name())).with_info(name),
      );
    }
    Ok(descriptor)
  }

  fn restore(ar: &mut InputArchive<'_>, _name: &str, version: u32) -> ArchiveResult<Box<T>> {
    T::load(ar, version).map(Box::new)
  }
}

impl<B: SelfDescribing + ?Sized> DispatchStrategy<B> for DynamicDispatch {
  fn describe(object: &B) -> TypeDescriptor {
    object.describe()
  }

  fn save(object: &B, ar: &mut OutputArchive<'_>, descriptor: &TypeDescriptor, version: u32) -> ArchiveResult<()> {
    let serializer = ar.registry().serializer(ar.format(), descriptor.name())?;
    serializer.save(ar, object.as_any(), version)
  }

  fn incoming(ar: &InputArchive<'_>, name: &str) -> ArchiveResult<TypeDescriptor> {
    Ok(ar.registry().factory::<B>(ar.format(), name)?.descriptor())
  }

  fn restore(ar: &mut InputArchive<'_>, name: &str, version: u32) -> ArchiveResult<Box<B>> {
    let factory = ar.registry().factory::<B>(ar.format(), name)?;
    factory
      .restore(ar, version)?
      .ok_or_else(|| ArchiveError::invalid_data_format("abstract class cannot be restored").with_info(name))
  }
}

/// Resolves the descriptor of `object` through its pointee dispatch strategy.
pub fn describe<T>(object: &T) -> TypeDescriptor
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>, {
  <T::Dispatch as DispatchStrategy<T>>::describe(object)
}

/// Declares a trait object as a polymorphic base.
///
/// ```ignore
/// pub trait Shape: SelfDescribing {
///   fn area(&self) -> f64;
/// }
/// polymorphic_base!(dyn Shape, "Shape");
/// ```
///
/// `Box<dyn Shape>`, `Rc<dyn Shape>` and `Arc<dyn Shape>` then save through the
/// serializer registry and restore through the factory registry.
#[macro_export]
macro_rules! polymorphic_base {
  ($base:ty, $name:expr) => {
    impl $crate::ClassTraits for $base {
      const NAME: &'static str = $name;
      const IS_ABSTRACT: bool = true;
    }

    impl $crate::Pointee for $base {
      type Dispatch = $crate::DynamicDispatch;
    }
  };
}
