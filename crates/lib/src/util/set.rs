//! Deduplication helpers for ordered and sorted collections.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Sort by `key` ascending and keep the first item seen for each key.
pub fn sorted_unique_by_key<'a, T: Clone + 'a, K: Ord>(
  items: impl IntoIterator<Item = &'a T>,
  key: impl Fn(&'a T) -> K,
) -> Vec<T> {
  let mut unique: BTreeMap<K, &'a T> = BTreeMap::new();
  for item in items {
    unique.entry(key(item)).or_insert(item);
  }
  unique.into_values().cloned().collect()
}

/// Drop duplicates while keeping the first occurrence of each item in place.
pub fn first_unique<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
  let mut seen = HashSet::new();
  items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
