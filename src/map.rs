//! Ordering-aware map type for JSON objects.
//!
//! [`JsonMap`] wraps an [`IndexMap`] whose insert discipline follows a
//! property [`OrderStrategy`]: ascending key order for `Lexicographical`,
//! descending for `Reverse`, plain insertion order otherwise. An untyped
//! object deserialized under a given strategy therefore preserves that same
//! ordering when it is serialized again.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{JsonMap, JsonValue, OrderStrategy};
//!
//! let mut map = JsonMap::with_order(OrderStrategy::Lexicographical);
//! map.insert("b".to_string(), JsonValue::from(2));
//! map.insert("a".to_string(), JsonValue::from(1));
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["a", "b"]);
//! ```

use crate::config::OrderStrategy;
use crate::value::JsonValue;
use indexmap::IndexMap;

/// Inserts into an index map at the position dictated by the ordering
/// strategy. Existing keys are replaced in place.
pub(crate) fn ordered_insert<V>(
    map: &mut IndexMap<String, V>,
    order: OrderStrategy,
    key: String,
    value: V,
) -> Option<V> {
    if map.contains_key(&key) {
        return map.insert(key, value);
    }
    match order {
        OrderStrategy::Lexicographical => {
            let index = match map.binary_search_keys(&key) {
                Ok(i) | Err(i) => i,
            };
            map.shift_insert(index, key, value)
        }
        OrderStrategy::Reverse => {
            let index = match map.binary_search_by(|k, _| key.cmp(k)) {
                Ok(i) | Err(i) => i,
            };
            map.shift_insert(index, key, value)
        }
        OrderStrategy::Declaration | OrderStrategy::Any => map.insert(key, value),
    }
}

/// An ordered map of string keys to JSON values.
///
/// The map remembers the strategy it was created with and keeps its keys in
/// the corresponding order as entries are inserted. Equality ignores key
/// order, comparing the key/value sets only.
#[derive(Debug, Clone)]
pub struct JsonMap {
    entries: IndexMap<String, JsonValue>,
    order: OrderStrategy,
}

impl JsonMap {
    /// Creates an empty map with insertion ordering.
    #[must_use]
    pub fn new() -> Self {
        JsonMap {
            entries: IndexMap::new(),
            order: OrderStrategy::Declaration,
        }
    }

    /// Creates an empty map whose insert discipline follows `order`.
    #[must_use]
    pub fn with_order(order: OrderStrategy) -> Self {
        JsonMap {
            entries: IndexMap::new(),
            order,
        }
    }

    /// Creates an empty map with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        JsonMap {
            entries: IndexMap::with_capacity(capacity),
            order: OrderStrategy::Declaration,
        }
    }

    /// The ordering strategy this map maintains.
    #[must_use]
    pub fn order(&self) -> OrderStrategy {
        self.order
    }

    /// Inserts a key-value pair at the position dictated by the map's
    /// ordering strategy. If the key already exists, the old value is
    /// replaced in place and returned.
    pub fn insert(&mut self, key: String, value: JsonValue) -> Option<JsonValue> {
        ordered_insert(&mut self.entries, self.order, key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the keys, in map order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, JsonValue> {
        self.entries.keys()
    }

    /// Returns an iterator over the values, in map order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, JsonValue> {
        self.entries.values()
    }

    /// Returns an iterator over the key-value pairs, in map order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, JsonValue> {
        self.entries.iter()
    }
}

impl Default for JsonMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for JsonMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl IntoIterator for JsonMap {
    type Item = (String, JsonValue);
    type IntoIter = indexmap::map::IntoIter<String, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a JsonMap {
    type Item = (&'a String, &'a JsonValue);
    type IntoIter = indexmap::map::Iter<'a, String, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, JsonValue)> for JsonMap {
    fn from_iter<T: IntoIterator<Item = (String, JsonValue)>>(iter: T) -> Self {
        JsonMap {
            entries: IndexMap::from_iter(iter),
            order: OrderStrategy::Declaration,
        }
    }
}
