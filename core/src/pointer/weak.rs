use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

use crate::archive::{InputArchive, OutputArchive, TrackedHandle};
use crate::class_traits::{template_name, ClassTraits};
use crate::error::ArchiveResult;
use crate::persist::Persist;
use crate::pointer::{restore_fresh, DispatchStrategy, IncomingPointer, Pointee};

/// A weak reference that survives being restored before its target.
///
/// Use it for back-edges of cyclic graphs. When the target is still being restored
/// the reference is patched once the target is complete.
pub struct RcWeak<T: ?Sized> {
  slot: Rc<RefCell<Option<Weak<T>>>>,
}

impl<T: ?Sized> RcWeak<T> {
  pub fn new() -> Self {
    Self {
      slot: Rc::new(RefCell::new(None)),
    }
  }

  pub fn from_rc(target: &Rc<T>) -> Self {
    let weak = Self::new();
    weak.set(target);
    weak
  }

  pub fn set(&self, target: &Rc<T>) {
    *self.slot.borrow_mut() = Some(Rc::downgrade(target));
  }

  pub fn upgrade(&self) -> Option<Rc<T>> {
    self.slot.borrow().as_ref().and_then(Weak::upgrade)
  }

  pub fn is_set(&self) -> bool {
    self.slot.borrow().is_some()
  }
}

impl<T: ?Sized> Default for RcWeak<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: ?Sized> Clone for RcWeak<T> {
  fn clone(&self) -> Self {
    Self {
      slot: Rc::new(RefCell::new(self.slot.borrow().clone())),
    }
  }
}

impl<T: ?Sized> Debug for RcWeak<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RcWeak")
      .field("set", &self.is_set())
      .field("alive", &self.upgrade().is_some())
      .finish()
  }
}

impl<T: ClassTraits + ?Sized> ClassTraits for RcWeak<T> {
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;

  fn class_name() -> Cow<'static, str> {
    Cow::Owned(template_name("Weak", &[T::class_name()]))
  }
}

impl<T> Persist for RcWeak<T>
where
  T: Pointee + ?Sized,
  T::Dispatch: DispatchStrategy<T>,
{
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    match self.upgrade() {
      None => ar.write_pointer::<T>(None, None),
      Some(target) => ar.write_pointer(Some(&*target), Some(TrackedHandle::of_rc(&target))),
    }
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let weak = RcWeak::new();
    match ar.read_pointer_header()? {
      IncomingPointer::Null => {}
      IncomingPointer::Reference(key) => {
        let slot = weak.slot.clone();
        let resolved = ar.identities_mut().resolve_or_defer(key, move |target: &Rc<T>| {
          *slot.borrow_mut() = Some(Rc::downgrade(target));
        })?;
        if let Some(target) = resolved {
          weak.set(&target);
        }
      }
      IncomingPointer::Fresh(key) => {
        let target = restore_fresh::<T, Rc<T>>(ar, key)?;
        weak.set(&target);
      }
    }
    Ok(weak)
  }
}
