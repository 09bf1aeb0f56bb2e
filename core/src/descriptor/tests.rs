use crate::class_traits::ClassTraits;
use crate::descriptor::TypeDescriptor;

struct Circle;

impl ClassTraits for Circle {
  const NAME: &'static str = "Circle";
  const VERSION: u32 = 3;
  const STORE_CLASS_INFO: bool = false;
}

#[test]
fn test_of_reads_class_traits() {
  let descriptor = TypeDescriptor::of::<Circle>();
  assert_eq!(descriptor.name(), "Circle");
  assert_eq!(descriptor.version(), 3);
  assert!(!descriptor.store_version());
  assert_eq!(descriptor.to_string(), "Circle@3");
}

#[test]
fn test_with_name() {
  let descriptor = TypeDescriptor::of::<Circle>().with_name("Variant<Circle>");
  assert_eq!(descriptor.name(), "Variant<Circle>");
  assert_eq!(descriptor.version(), 3);
}
