use std::{iter::Iterator, marker::PhantomData, fmt::{self, Debug, Display}, any::type_name, hash::Hash};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque identifier for an object of type `T`. IDs handed out by one
/// [`IDFactory`] are never reused.
pub struct ID<T> (usize, PhantomData<T>);

impl<T> ID<T> {
    /// Rebuilds an id from its raw value. Only the persistence layer should
    /// need this; everything else gets ids from an [`IDFactory`].
    pub fn from_raw(raw: usize) -> Self {
        Self(raw, PhantomData)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

impl<T> Hash for ID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ID<T> {}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = type_name::<T>().rsplit("::").next().unwrap_or("?");
        write!(f, "'{} ID {}'", short, self.0)
    }
}

impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<T> Eq for ID<T> {}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Serialize for ID<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0 as u64)
    }
}

impl<'de, T> Deserialize<'de> for ID<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        Ok(Self::from_raw(raw as usize))
    }
}


pub struct IDFactory<I>(usize, PhantomData<I>);

impl<T> IDFactory<ID<T>> {
    pub fn new() -> Self {
        Self(0, PhantomData)
    }

    pub fn get_id(&mut self) -> ID<T> {
        self.0 += 1;
        ID(self.0, PhantomData)
    }

    /// The highest id handed out so far (0 if none).
    pub fn high_water(&self) -> usize {
        self.0
    }

    /// Makes sure every id produced from now on is greater than `raw`.
    pub fn resume_after(&mut self, raw: usize) {
        self.0 = self.0.max(raw);
    }
}

impl<T> Default for IDFactory<ID<T>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for IDFactory<ID<T>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IDFactory({})", self.0)
    }
}

impl<T> Iterator for IDFactory<ID<T>> {
    type Item = ID<T>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.get_id())
    }
}

/// Resolves ids to the objects a store owns. Lookups are fallible: an id may
/// refer to something that has since left the store.
pub trait IDMapper<T> {
    fn get(&self, id: ID<T>) -> Option<&T>;
    fn get_mut(&mut self, id: ID<T>) -> Option<&mut T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing;

    #[test]
    fn factory_never_repeats() {
        let mut ids = IDFactory::<ID<Thing>>::new();
        let first: Vec<_> = ids.by_ref().take(3).collect();
        assert_eq!(first.iter().map(|id| id.raw()).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_ne!(ids.get_id(), first[2]);
    }

    #[test]
    fn resume_after_skips_past_seen_ids() {
        let mut ids = IDFactory::<ID<Thing>>::new();
        ids.resume_after(41);
        assert_eq!(ids.get_id().raw(), 42);
        // resuming lower never rewinds
        ids.resume_after(5);
        assert_eq!(ids.get_id().raw(), 43);
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let id = ID::<Thing>::from_raw(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: ID<Thing> = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }
}
