use dashmap::DashMap;
use std::hash::Hash;

/// Operations for maps whose values are stacks of entries sharing one key.
///
/// The most recently pushed entry shadows older ones; removing it uncovers the
/// previous entry again.
pub trait DashMapStackExtension<K: Eq + Hash, V> {
  fn push_value(&self, key: K, value: V);

  /// Removes every entry under `key` matching `predicate` and returns how many were removed.
  /// The key disappears once its stack is empty.
  fn remove_values_where<F>(&self, key: &K, predicate: F) -> usize
  where
    F: FnMut(&V) -> bool;

  fn last_value(&self, key: &K) -> Option<V>
  where
    V: Clone;
}

impl<K: Eq + Hash, V> DashMapStackExtension<K, V> for DashMap<K, Vec<V>> {
  fn push_value(&self, key: K, value: V) {
    self.entry(key).or_default().push(value);
  }

  fn remove_values_where<F>(&self, key: &K, mut predicate: F) -> usize
  where
    F: FnMut(&V) -> bool, {
    let Some(mut values) = self.get_mut(key) else {
      return 0;
    };
    let before = values.len();
    values.retain(|value| !predicate(value));
    let removed = before - values.len();
    drop(values);
    self.remove_if(key, |_, values| values.is_empty());
    removed
  }

  fn last_value(&self, key: &K) -> Option<V>
  where
    V: Clone, {
    self.get(key).and_then(|values| values.last().cloned())
  }
}

#[cfg(test)]
mod tests;
