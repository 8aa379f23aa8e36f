//! Lock-free, copy-on-write containers replaced wholesale on reload.
//!
//! Readers load the current snapshot through [`ArcSwap`] and never block.
//! A reader that captured a snapshot, key set or iterator keeps observing
//! those contents to completion, whatever swaps happen afterwards.
//!
//! Individual-element mutators exist only to fail: the contents are
//! immutable and the only way to change them is [`ReloadableMap::swap`] /
//! [`ReloadableSet::swap`].

use arc_swap::ArcSwap;
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by every element-wise mutator of a reloadable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{container} is immutable; use swap to replace its contents (attempted `{operation}`)")]
pub struct ImmutableError {
    /// Container type.
    pub container: &'static str,
    /// Rejected operation.
    pub operation: &'static str,
}

/// Contents of a reloadable container at one generation.
///
/// Generation 0 is the initial contents; every swap increments it.
#[derive(Debug)]
pub struct Snapshot<C> {
    generation: u64,
    contents: C,
}

impl<C> Snapshot<C> {
    /// Generation this snapshot was installed at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The captured contents.
    pub fn contents(&self) -> &C {
        &self.contents
    }
}

impl<C> Deref for Snapshot<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.contents
    }
}

/// Shared swap machinery.
#[derive(Debug)]
struct Reloadable<C> {
    current: ArcSwap<Snapshot<C>>,
    /// Serializes writers so generations are installed in order.
    writer: Mutex<()>,
}

impl<C> Reloadable<C> {
    fn new(contents: C) -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot {
                generation: 0,
                contents,
            }),
            writer: Mutex::new(()),
        }
    }

    fn load(&self) -> Arc<Snapshot<C>> {
        self.current.load_full()
    }

    fn swap(&self, contents: C) -> u64 {
        let _writer = self.writer.lock();
        let generation = self.current.load().generation + 1;
        self.current.store(Arc::new(Snapshot {
            generation,
            contents,
        }));
        generation
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Map
// ═══════════════════════════════════════════════════════════════════════════

/// A hot-swappable, read-only map.
#[derive(Debug)]
pub struct ReloadableMap<K, V> {
    inner: Reloadable<IndexMap<K, V>>,
}

impl<K: Hash + Eq, V> ReloadableMap<K, V> {
    const NAME: &'static str = "ReloadableMap";

    /// Create a map holding `contents` at generation 0.
    pub fn new(contents: IndexMap<K, V>) -> Self {
        Self {
            inner: Reloadable::new(contents),
        }
    }

    /// Atomically replace the whole contents. Returns the new generation.
    pub fn swap(&self, contents: IndexMap<K, V>) -> u64 {
        self.inner.swap(contents)
    }

    /// Capture the current contents.
    pub fn snapshot(&self) -> Arc<Snapshot<IndexMap<K, V>>> {
        self.inner.load()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.inner.current.load().generation
    }

    /// Value for `key` in the current contents.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.current.load().contents.get(key).cloned()
    }

    /// Whether `key` is present in the current contents.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.current.load().contents.contains_key(key)
    }

    /// Number of entries in the current contents.
    pub fn len(&self) -> usize {
        self.inner.current.load().contents.len()
    }

    /// Whether the current contents are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of the current contents, pinned to this generation.
    pub fn key_set(&self) -> KeySet<K, V> {
        KeySet {
            snapshot: self.inner.load(),
        }
    }

    /// Owning iterator over the current entries, pinned to this generation.
    pub fn iter(&self) -> SnapshotIter<K, V> {
        SnapshotIter {
            snapshot: self.inner.load(),
            index: 0,
        }
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn put(&self, _key: K, _value: V) -> Result<Option<V>, ImmutableError> {
        Err(Self::immutable("put"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn put_all(&self, _entries: impl IntoIterator<Item = (K, V)>) -> Result<(), ImmutableError> {
        Err(Self::immutable("put_all"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn remove<Q>(&self, _key: &Q) -> Result<Option<V>, ImmutableError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Err(Self::immutable("remove"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn retain(&self, _keep: impl FnMut(&K, &V) -> bool) -> Result<(), ImmutableError> {
        Err(Self::immutable("retain"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn clear(&self) -> Result<(), ImmutableError> {
        Err(Self::immutable("clear"))
    }

    fn immutable(operation: &'static str) -> ImmutableError {
        ImmutableError {
            container: Self::NAME,
            operation,
        }
    }
}

impl<K: Hash + Eq, V> Default for ReloadableMap<K, V> {
    fn default() -> Self {
        Self::new(IndexMap::new())
    }
}

/// Key view over one generation of a [`ReloadableMap`].
#[derive(Debug)]
pub struct KeySet<K, V> {
    snapshot: Arc<Snapshot<IndexMap<K, V>>>,
}

impl<K: Hash + Eq, V> KeySet<K, V> {
    /// Generation the keys were captured at.
    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    /// Whether `key` was present at capture time.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.snapshot.contents.contains_key(key)
    }

    /// Number of captured keys.
    pub fn len(&self) -> usize {
        self.snapshot.contents.len()
    }

    /// Whether no key was captured.
    pub fn is_empty(&self) -> bool {
        self.snapshot.contents.is_empty()
    }

    /// Iterate captured keys in insertion order.
    pub fn iter(&self) -> indexmap::map::Keys<'_, K, V> {
        self.snapshot.contents.keys()
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a KeySet<K, V> {
    type Item = &'a K;
    type IntoIter = indexmap::map::Keys<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning entry iterator over one generation of a [`ReloadableMap`].
#[derive(Debug)]
pub struct SnapshotIter<K, V> {
    snapshot: Arc<Snapshot<IndexMap<K, V>>>,
    index: usize,
}

impl<K: Clone, V: Clone> Iterator for SnapshotIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.snapshot.contents.get_index(self.index)?;
        self.index += 1;
        Some((key.clone(), value.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.snapshot.contents.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for SnapshotIter<K, V> {}

// ═══════════════════════════════════════════════════════════════════════════
// Set
// ═══════════════════════════════════════════════════════════════════════════

/// A hot-swappable, read-only set.
#[derive(Debug)]
pub struct ReloadableSet<T> {
    inner: Reloadable<IndexSet<T>>,
}

impl<T: Hash + Eq> ReloadableSet<T> {
    const NAME: &'static str = "ReloadableSet";

    /// Create a set holding `contents` at generation 0.
    pub fn new(contents: IndexSet<T>) -> Self {
        Self {
            inner: Reloadable::new(contents),
        }
    }

    /// Atomically replace the whole contents. Returns the new generation.
    pub fn swap(&self, contents: IndexSet<T>) -> u64 {
        self.inner.swap(contents)
    }

    /// Capture the current contents.
    pub fn snapshot(&self) -> Arc<Snapshot<IndexSet<T>>> {
        self.inner.load()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.inner.current.load().generation
    }

    /// Whether `value` is present in the current contents.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.current.load().contents.contains(value)
    }

    /// Number of elements in the current contents.
    pub fn len(&self) -> usize {
        self.inner.current.load().contents.len()
    }

    /// Whether the current contents are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owning iterator over the current elements, pinned to this generation.
    pub fn iter(&self) -> SetSnapshotIter<T> {
        SetSnapshotIter {
            snapshot: self.inner.load(),
            index: 0,
        }
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn add(&self, _value: T) -> Result<bool, ImmutableError> {
        Err(Self::immutable("add"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn add_all(&self, _values: impl IntoIterator<Item = T>) -> Result<bool, ImmutableError> {
        Err(Self::immutable("add_all"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn remove<Q>(&self, _value: &Q) -> Result<bool, ImmutableError>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Err(Self::immutable("remove"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn remove_all(&self, _values: impl IntoIterator<Item = T>) -> Result<bool, ImmutableError> {
        Err(Self::immutable("remove_all"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn retain_all(&self, _keep: impl FnMut(&T) -> bool) -> Result<bool, ImmutableError> {
        Err(Self::immutable("retain_all"))
    }

    /// Always fails: use [`swap`](Self::swap).
    pub fn clear(&self) -> Result<(), ImmutableError> {
        Err(Self::immutable("clear"))
    }

    fn immutable(operation: &'static str) -> ImmutableError {
        ImmutableError {
            container: Self::NAME,
            operation,
        }
    }
}

impl<T: Hash + Eq> Default for ReloadableSet<T> {
    fn default() -> Self {
        Self::new(IndexSet::new())
    }
}

/// Owning iterator over one generation of a [`ReloadableSet`].
#[derive(Debug)]
pub struct SetSnapshotIter<T> {
    snapshot: Arc<Snapshot<IndexSet<T>>>,
    index: usize,
}

impl<T: Clone> Iterator for SetSnapshotIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let value = self.snapshot.contents.get_index(self.index)?;
        self.index += 1;
        Some(value.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.snapshot.contents.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for SetSnapshotIter<T> {}
