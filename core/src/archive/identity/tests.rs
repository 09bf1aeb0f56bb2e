use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

use crate::archive::{ObjectId, ReadIdentityTable, TrackedHandle, WriteIdentityTable};
use crate::error::ArchiveErrorKind;

#[test]
fn test_write_table_assigns_dense_keys() {
  let a = Rc::new(1);
  let b = Rc::new(2);
  let mut table = WriteIdentityTable::new();

  assert_eq!(table.insert::<i32>(TrackedHandle::of_rc(&a)), 0);
  assert_eq!(table.insert::<i32>(TrackedHandle::of_rc(&b)), 1);
  assert_eq!(table.lookup::<i32>(&ObjectId::of_rc(&a.clone())).unwrap(), Some(0));
  assert_eq!(table.lookup::<i32>(&ObjectId::logical(7)).unwrap(), None);
}

#[test]
fn test_write_table_keeps_allocation_alive() {
  let mut table = WriteIdentityTable::new();
  let first = Rc::new(10u32);
  let id = ObjectId::of_rc(&first);
  table.insert::<u32>(TrackedHandle::of_rc(&first));
  assert_eq!(Rc::strong_count(&first), 2);
  drop(first);

  let second = Rc::new(20u32);
  assert_ne!(ObjectId::of_rc(&second), id);
  assert_eq!(table.lookup::<u32>(&ObjectId::of_rc(&second)).unwrap(), None);
}

#[test]
fn test_write_table_rejects_other_pointee_type() {
  let mut table = WriteIdentityTable::new();
  let handle = Rc::new(5u8);
  table.insert::<u8>(TrackedHandle::of_rc(&handle));

  let err = table.lookup::<dyn Debug>(&ObjectId::of_rc(&handle)).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}

#[test]
fn test_logical_handle_has_no_anchor() {
  let mut table = WriteIdentityTable::new();
  let key = table.insert::<str>(TrackedHandle::logical(ObjectId::logical(3)));
  assert_eq!(key, 0);
  assert_eq!(TrackedHandle::logical(ObjectId::logical(3)).id(), ObjectId::logical(3));
  assert_eq!(table.lookup::<str>(&ObjectId::logical(3)).unwrap(), Some(0));
}

#[test]
fn test_resolve_ready_slot() {
  let mut table = ReadIdentityTable::new();
  let handle = Rc::new("shared".to_string());
  table.reserve(0).unwrap();
  table.complete(0, &handle).unwrap();

  let resolved: Rc<String> = table.resolve(0).unwrap();
  assert!(Rc::ptr_eq(&resolved, &handle));
}

#[test]
fn test_strong_reference_to_pending_slot_fails() {
  let mut table = ReadIdentityTable::new();
  table.reserve(0).unwrap();

  let err = table.resolve::<Rc<String>>(0).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}

#[test]
fn test_deferred_fixup_runs_on_complete() {
  let mut table = ReadIdentityTable::new();
  table.reserve(0).unwrap();

  let seen = Rc::new(Cell::new(0));
  let observer = seen.clone();
  let resolved = table
    .resolve_or_defer::<Rc<i32>, _>(0, move |handle| observer.set(**handle))
    .unwrap();
  assert!(resolved.is_none());

  table.complete(0, &Rc::new(42)).unwrap();
  assert_eq!(seen.get(), 42);
}

#[test]
fn test_out_of_sequence_key() {
  let mut table = ReadIdentityTable::new();
  let err = table.reserve(3).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}

#[test]
fn test_handle_type_mismatch() {
  let mut table = ReadIdentityTable::new();
  table.reserve(0).unwrap();
  table.complete(0, &Rc::new(1u8)).unwrap();

  let err = table.resolve::<Rc<String>>(0).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}
