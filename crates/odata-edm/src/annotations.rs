//! Annotation storage for schema elements
//!
//! Higher layers attach opaque values to types and properties of a model,
//! addressed by the Rust type of the value (the "annotation kind"). At most
//! one value is stored per (site, kind) pair and it lives as long as the
//! store does.
//!
//! A site is an [`EdmElement`] by default. Layers that need finer scoping
//! own a store keyed by their own site type.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::types::EdmElement;

type AnnotationValue = Arc<dyn Any + Send + Sync>;

/// Thread-safe annotation table, one per [`EdmModel`](crate::EdmModel) and
/// one per higher-layer owner that needs its own scope
pub struct AnnotationStore<K = EdmElement> {
    entries: RwLock<FxHashMap<(K, TypeId), AnnotationValue>>,
}

impl<K> Default for AnnotationStore<K> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
        }
    }
}

impl<K: Copy + Eq + Hash> AnnotationStore<K> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the annotation of kind `T` attached to `element`
    pub fn get<T>(&self, element: K) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entries = self.entries.read();
        let value = entries.get(&(element, TypeId::of::<T>()))?.clone();
        value.downcast::<T>().ok()
    }

    /// Attach (or replace) the annotation of kind `T` on `element`
    pub fn set<T>(&self, element: K, value: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let erased: AnnotationValue = value;
        self.entries
            .write()
            .insert((element, TypeId::of::<T>()), erased);
    }

    /// Fetch the annotation of kind `T`, creating it with `init` when absent
    ///
    /// `init` runs without holding the lock so it may itself read other
    /// annotations. When two callers race, both may run `init`, but only the
    /// first value written is kept and returned to everyone.
    pub fn get_or_try_insert<T, E, F>(&self, element: K, init: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<Arc<T>, E>,
    {
        if let Some(existing) = self.get::<T>(element) {
            return Ok(existing);
        }

        let created = init()?;
        let stored = {
            let mut entries = self.entries.write();
            entries
                .entry((element, TypeId::of::<T>()))
                .or_insert_with(|| {
                    let erased: AnnotationValue = created.clone();
                    erased
                })
                .clone()
        };

        // Keyed by `TypeId::of::<T>()`, so the downcast cannot miss.
        Ok(stored.downcast::<T>().unwrap_or(created))
    }

    /// Number of stored annotations
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been stored yet
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K> fmt::Debug for AnnotationStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("len", &self.entries.read().len())
            .finish()
    }
}
