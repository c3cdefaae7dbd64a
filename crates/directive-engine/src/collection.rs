use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ConfigError;

/// An item stored in a [`Collection`], identified by a unique key.
pub trait Keyed {
    /// Human-readable item kind, used in duplicate-key errors.
    const KIND: &'static str;

    fn key(&self) -> &str;
}

/// Ordered, uniqueness-enforcing container keyed by [`Keyed::key`].
///
/// Items are shared (`Arc`) so that subsets and unions never copy the
/// underlying values: a device's resolved directives point at the same
/// directive objects as the global catalog.
#[derive(Debug)]
pub struct Collection<T> {
    items: IndexMap<String, Arc<T>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: Keyed> Collection<T> {
    /// Build from owned items, rejecting duplicate keys.
    pub fn new<I>(items: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_shared(items.into_iter().map(Arc::new))
    }

    /// Build from already-shared items, rejecting duplicate keys.
    pub fn from_shared<I>(items: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        let mut map = IndexMap::new();
        for item in items {
            let key = item.key().to_string();
            if map.contains_key(&key) {
                return Err(ConfigError::DuplicateKey { kind: T::KIND, key });
            }
            map.insert(key, item);
        }
        Ok(Self { items: map })
    }

    pub fn get(&self, key: &str) -> Option<&Arc<T>> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.values()
    }

    /// Order-preserving subset of the items matching `predicate`.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool,
    {
        Self {
            items: self
                .items
                .iter()
                .filter(|(_, item)| predicate(item))
                .map(|(k, v)| (k.clone(), Arc::clone(v)))
                .collect(),
        }
    }

    /// Subset of the items whose key is in `keys`.
    ///
    /// The result keeps this collection's order, not the order of `keys`.
    pub fn filter_by_keys<K: AsRef<str>>(&self, keys: &[K]) -> Self {
        let wanted: HashSet<&str> = keys.iter().map(AsRef::as_ref).collect();
        self.filter(|item| wanted.contains(item.key()))
    }

    /// Set-style union: `self`'s items followed by `other`'s.
    ///
    /// A key present in both is a configuration error.
    pub fn union(&self, other: &Self) -> Result<Self, ConfigError> {
        Self::from_shared(self.iter().chain(other.iter()).cloned())
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a Arc<T>;
    type IntoIter = indexmap::map::Values<'a, String, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}
