use dashmap::DashMap;

use crate::collections::DashMapStackExtension;

#[test]
fn test_last_value_shadows_older_entries() {
  let map: DashMap<&str, Vec<u32>> = DashMap::new();
  map.push_value("circle", 1);
  map.push_value("circle", 2);
  assert_eq!(map.last_value(&"circle"), Some(2));

  assert_eq!(map.remove_values_where(&"circle", |v| *v == 2), 1);
  assert_eq!(map.last_value(&"circle"), Some(1));
}

#[test]
fn test_empty_stack_removes_key() {
  let map: DashMap<&str, Vec<u32>> = DashMap::new();
  map.push_value("square", 7);
  assert_eq!(map.remove_values_where(&"square", |_| true), 1);
  assert!(!map.contains_key("square"));
  assert_eq!(map.remove_values_where(&"square", |_| true), 0);
}
