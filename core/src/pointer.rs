mod dispatch;
mod weak;

pub use self::{dispatch::*, weak::*};

use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::archive::{InputArchive, OutputArchive, TrackedHandle};
use crate::class_traits::{template_name, ClassTraits};
use crate::error::{ArchiveError, ArchiveResult};
use crate::persist::Persist;

/// A type that can be held by `Box`, `Rc`, `Arc` and `RcWeak` inside an archive.
///
/// `Dispatch` is `StaticDispatch` for concrete types (see `#[derive(ClassTraits)]`)
/// and `DynamicDispatch` for polymorphic bases (see `polymorphic_base!`).
pub trait Pointee: ClassTraits + 'static {
  type Dispatch;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub(crate) enum PointerTag {
  Null = 0,
  NewTracked = 1,
  NewUntracked = 2,
  Reference = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IncomingPointer {
  Null,
  /// A full object follows; tracked objects carry their key.
  Fresh(Option<u32>),
  Reference(u32),
}

macro_rules! static_pointee {
  ($($ty:ty),* $(,)?) => {
    $(
      impl Pointee for $ty {
        type Dispatch = StaticDispatch;
      }
    )*
  };
}

static_pointee!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize, f32, f64, bool, char, String);

trait SharedHandle<T: ?Sized>: Clone + 'static {
  fn from_box(object: Box<T>) -> Self;

  fn tracked(&self) -> TrackedHandle;

  fn target(&self) -> &T;
}

impl<T: ?Sized + 'static> SharedHandle<T> for Rc<T> {
  fn from_box(object: Box<T>) -> Self {
    Rc::from(object)
  }

  fn tracked(&self) -> TrackedHandle {
    TrackedHandle::of_rc(self)
  }

  fn target(&self) -> &T {
    self
  }
}

impl<T: ?Sized + 'static> SharedHandle<T> for Arc<T> {
  fn from_box(object: Box<T>) -> Self {
    Arc::from(object)
  }

  fn tracked(&self) -> TrackedHandle {
    TrackedHandle::of_arc(self)
  }

  fn target(&self) -> &T {
    self
  }
}

/// Restores a new object and, when it is tracked, publishes it under `key`.
fn restore_fresh<T, H>(ar: &mut InputArchive<'_>, key: Option<u32>) -> ArchiveResult<H>
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>,
  H: SharedHandle<T>, {
  let Some(key) = key else {
    return ar.read_object::<T>().map(H::from_box);
  };
  ar.identities_mut().reserve(key)?;
  let handle = H::from_box(ar.read_object::<T>()?);
  ar.identities_mut().complete(key, &handle)?;
  Ok(handle)
}

fn save_shared<T, H>(handle: Option<&H>, ar: &mut OutputArchive<'_>) -> ArchiveResult<()>
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>,
  H: SharedHandle<T>, {
  match handle {
    None => ar.write_pointer::<T>(None, None),
    Some(handle) => ar.write_pointer(Some(handle.target()), Some(handle.tracked())),
  }
}

fn load_shared<T, H>(ar: &mut InputArchive<'_>) -> ArchiveResult<Option<H>>
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>,
  H: SharedHandle<T>, {
  match ar.read_pointer_header()? {
    IncomingPointer::Null => Ok(None),
    IncomingPointer::Reference(key) => ar.identities_mut().resolve(key).map(Some),
    IncomingPointer::Fresh(key) => restore_fresh::<T, H>(ar, key).map(Some),
  }
}

fn load_boxed<T>(ar: &mut InputArchive<'_>) -> ArchiveResult<Option<Box<T>>>
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>, {
  match ar.read_pointer_header()? {
    IncomingPointer::Null => Ok(None),
    IncomingPointer::Fresh(None) => ar.read_object::<T>().map(Some),
    IncomingPointer::Fresh(Some(_)) | IncomingPointer::Reference(_) => {
      Err(ArchiveError::invalid_data_format("boxed objects are never shared").with_info(T::class_name()))
    }
  }
}

fn null_pointer<T: ClassTraits + ?Sized>() -> ArchiveError {
  ArchiveError::invalid_data_format("null pointer for a non-nullable handle").with_info(T::class_name())
}

impl<T: ClassTraits> ClassTraits for Option<T> {
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;

  fn class_name() -> Cow<'static, str> {
    Cow::Owned(template_name("Option", &[T::class_name()]))
  }
}

impl<T: ClassTraits + ?Sized> ClassTraits for Box<T> {
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;

  fn class_name() -> Cow<'static, str> {
    Cow::Owned(template_name("Box", &[T::class_name()]))
  }
}

impl<T> Persist for Box<T>
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>,
{
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_pointer(Some(&**self), None)
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    load_boxed(ar)?.ok_or_else(null_pointer::<T>)
  }
}

impl<T> Persist for Option<Box<T>>
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>,
{
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_pointer(self.as_deref(), None)
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    load_boxed(ar)
  }
}

macro_rules! shared_pointer {
  ($handle:ident, $name:literal) => {
    impl<T: ClassTraits + ?Sized> ClassTraits for $handle<T> {
      const TRACKED: bool = false;
      const STORE_CLASS_INFO: bool = false;

      fn class_name() -> Cow<'static, str> {
        Cow::Owned(template_name($name, &[T::class_name()]))
      }
    }

    impl<T> Persist for $handle<T>
    where
      T: Pointee + ?Sized,
      T::Dispatch: DispatchStrategy<T>,
    {
      fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
        save_shared::<T, $handle<T>>(Some(self), ar)
      }

      fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
        load_shared::<T, $handle<T>>(ar)?.ok_or_else(null_pointer::<T>)
      }
    }

    impl<T> Persist for Option<$handle<T>>
    where
      T: Pointee + ?Sized,
      T::Dispatch: DispatchStrategy<T>,
    {
      fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
        save_shared::<T, $handle<T>>(self.as_ref(), ar)
      }

      fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
        load_shared::<T, $handle<T>>(ar)
      }
    }
  };
}

shared_pointer!(Rc, "Rc");
shared_pointer!(Arc, "Arc");
