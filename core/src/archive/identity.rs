use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{ArchiveError, ArchiveResult};

/// Identifies one shared object on the write side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectId {
  /// Allocation identity of a live `Rc`/`Arc`.
  Address(usize),
  /// Caller-chosen identifier.
  Logical(u64),
}

impl ObjectId {
  pub fn of_rc<T: ?Sized>(handle: &Rc<T>) -> Self {
    ObjectId::Address(Rc::as_ptr(handle).cast::<()>() as usize)
  }

  pub fn of_arc<T: ?Sized>(handle: &Arc<T>) -> Self {
    ObjectId::Address(Arc::as_ptr(handle).cast::<()>() as usize)
  }

  pub fn logical(id: u64) -> Self {
    ObjectId::Logical(id)
  }
}

/// An object about to be written through a shared handle.
///
/// Address identities carry a clone of the handle so the allocation cannot be reused
/// by another object while the session is open.
#[derive(Debug)]
pub struct TrackedHandle {
  id: ObjectId,
  anchor: Option<Box<dyn Any>>,
}

impl TrackedHandle {
  pub fn of_rc<T: ?Sized + 'static>(handle: &Rc<T>) -> Self {
    Self {
      id: ObjectId::of_rc(handle),
      anchor: Some(Box::new(handle.clone())),
    }
  }

  pub fn of_arc<T: ?Sized + 'static>(handle: &Arc<T>) -> Self {
    Self {
      id: ObjectId::of_arc(handle),
      anchor: Some(Box::new(handle.clone())),
    }
  }

  /// A caller-chosen identity; the caller keeps the object alive.
  pub fn logical(id: ObjectId) -> Self {
    Self { id, anchor: None }
  }

  pub fn id(&self) -> ObjectId {
    self.id
  }
}

#[derive(Debug)]
struct WriteEntry {
  key: u32,
  pointee: TypeId,
  pointee_name: &'static str,
  _anchor: Option<Box<dyn Any>>,
}

/// Maps objects already written in this session to their tracking key.
///
/// Every entry remembers the pointee type it was first written as. Reaching the same
/// object through another pointee type (`Rc<Circle>` then `Rc<dyn Shape>`) is rejected,
/// since a reader could not hand out both handles for one slot.
#[derive(Debug, Default)]
pub struct WriteIdentityTable {
  entries: HashMap<ObjectId, WriteEntry>,
}

impl WriteIdentityTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Key of an object already written as pointee `T`.
  pub fn lookup<T: ?Sized + 'static>(&self, id: &ObjectId) -> ArchiveResult<Option<u32>> {
    match self.entries.get(id) {
      None => Ok(None),
      Some(entry) if entry.pointee == TypeId::of::<T>() => Ok(Some(entry.key)),
      Some(entry) => Err(
        ArchiveError::invalid_data_format(format!(
          "object {} was already written as {}",
          entry.key, entry.pointee_name
        ))
        .with_info(std::any::type_name::<T>()),
      ),
    }
  }

  /// Assigns the next key to `handle`. Keys are dense and start at zero.
  pub fn insert<T: ?Sized + 'static>(&mut self, handle: TrackedHandle) -> u32 {
    let key = self.entries.len() as u32;
    self.entries.insert(
      handle.id,
      WriteEntry {
        key,
        pointee: TypeId::of::<T>(),
        pointee_name: std::any::type_name::<T>(),
        _anchor: handle.anchor,
      },
    );
    key
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

type Fixup = Box<dyn FnOnce(&dyn Any) -> ArchiveResult<()>>;

enum Slot {
  Pending(Vec<Fixup>),
  Ready(Box<dyn Any>),
}

/// Arena of restored shared objects indexed by tracking key.
///
/// A slot is `Pending` while its object is being restored and holds a handle clone
/// once it is complete.
#[derive(Default)]
pub struct ReadIdentityTable {
  slots: Vec<Slot>,
}

impl ReadIdentityTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn reserve(&mut self, key: u32) -> ArchiveResult<()> {
    if key as usize != self.slots.len() {
      return Err(ArchiveError::invalid_data_format(format!(
        "tracking key {key} out of sequence, expected {}",
        self.slots.len()
      )));
    }
    self.slots.push(Slot::Pending(Vec::new()));
    Ok(())
  }

  /// Stores the finished handle and runs the fixups queued by weak back-references.
  pub fn complete<H: Any + Clone>(&mut self, key: u32, handle: &H) -> ArchiveResult<()> {
    let slot = self
      .slots
      .get_mut(key as usize)
      .ok_or_else(|| ArchiveError::invalid_data_format(format!("unknown tracking key {key}")))?;
    match std::mem::replace(slot, Slot::Ready(Box::new(handle.clone()))) {
      Slot::Pending(fixups) => {
        for fixup in fixups {
          fixup(handle)?;
        }
        Ok(())
      }
      Slot::Ready(_) => Err(ArchiveError::invalid_data_format(format!(
        "tracking key {key} restored twice"
      ))),
    }
  }

  pub fn resolve<H: Any + Clone>(&self, key: u32) -> ArchiveResult<H> {
    match self.slots.get(key as usize) {
      None => Err(ArchiveError::invalid_data_format(format!("unknown tracking key {key}"))),
      Some(Slot::Pending(_)) => Err(ArchiveError::invalid_data_format(format!(
        "strong reference to object {key} that is still being restored"
      ))),
      Some(Slot::Ready(handle)) => Self::downcast(key, &**handle),
    }
  }

  /// Like [`resolve`](Self::resolve), but a pending slot queues `fixup` instead of failing.
  pub fn resolve_or_defer<H, F>(&mut self, key: u32, fixup: F) -> ArchiveResult<Option<H>>
  where
    H: Any + Clone,
    F: FnOnce(&H) + 'static, {
    match self.slots.get_mut(key as usize) {
      None => Err(ArchiveError::invalid_data_format(format!("unknown tracking key {key}"))),
      Some(Slot::Ready(handle)) => Self::downcast(key, &**handle).map(Some),
      Some(Slot::Pending(fixups)) => {
        tracing::trace!(key, "deferring weak back-reference");
        fixups.push(Box::new(move |handle: &dyn Any| {
          let handle = Self::downcast::<H>(key, handle)?;
          fixup(&handle);
          Ok(())
        }));
        Ok(None)
      }
    }
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  fn downcast<H: Any + Clone>(key: u32, handle: &dyn Any) -> ArchiveResult<H> {
    handle.downcast_ref::<H>().cloned().ok_or_else(|| {
      ArchiveError::invalid_data_format(format!(
        "object {key} was restored as a different handle type than {}",
        std::any::type_name::<H>()
      ))
    })
  }
}

impl Debug for ReadIdentityTable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let pending = self.slots.iter().filter(|slot| matches!(slot, Slot::Pending(_))).count();
    f.debug_struct("ReadIdentityTable")
      .field("slots", &self.slots.len())
      .field("pending", &pending)
      .finish()
  }
}

#[cfg(test)]
mod tests;
