//! Wire-name to application type resolution
//!
//! Payloads name their types by schema name. [`ClientTypeCache`] maps such a
//! name, together with the application type the reader expects, to the
//! concrete application type to materialize. Results (including "no
//! match") are remembered for the lifetime of the cache and never
//! recomputed, so types registered after a name was first resolved do not
//! change its answer.
//!
//! A cache belongs to one [`TypeUniverse`] because type handles are only
//! meaningful inside it. Every model over that universe may share the
//! cache; it is an ordinary value so tests can create isolated ones.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::error::{MetadataError, MetadataResult};
use crate::reflect::{ClientTypeId, TypeUniverse};

type CacheKey = (ClientTypeId, String);

/// Memo table of wire-name resolutions over one type universe
#[derive(Debug)]
pub struct ClientTypeCache {
    universe: Arc<TypeUniverse>,
    entries: Mutex<FxHashMap<CacheKey, Option<ClientTypeId>>>,
}

/// Part of a wire name after the last `.`, unless the dot ends the name
fn local_name(wire_name: &str) -> &str {
    match wire_name.rfind('.') {
        Some(index) if index + 1 < wire_name.len() => &wire_name[index + 1..],
        _ => wire_name,
    }
}

impl ClientTypeCache {
    /// Create an empty cache over `universe`
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self {
            universe,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Universe the cached handles belong to
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// Resolve `wire_name` to a type assignable to `expected`
    ///
    /// The lock is held only for the map lookups; the scan of the type
    /// universe runs unlocked, so concurrent first-time callers may scan
    /// redundantly but always store the same answer. An ambiguous name is
    /// an error and is not stored.
    pub fn resolve(
        &self,
        wire_name: &str,
        expected: ClientTypeId,
    ) -> MetadataResult<Option<ClientTypeId>> {
        let key = (expected, wire_name.to_string());
        if let Some(cached) = self.entries.lock().get(&key) {
            trace!(wire_name, expected = %expected, "wire name cache hit");
            return Ok(*cached);
        }

        let resolved = Self::scan(&self.universe, wire_name, expected)?;

        let mut entries = self.entries.lock();
        let stored = *entries.entry(key).or_insert(resolved);
        debug!(
            wire_name,
            expected = %expected,
            resolved = ?stored,
            "resolved wire type name"
        );
        Ok(stored)
    }

    fn scan(
        universe: &TypeUniverse,
        wire_name: &str,
        expected: ClientTypeId,
    ) -> MetadataResult<Option<ClientTypeId>> {
        let name = local_name(wire_name);
        let expected_ty = universe.get(expected)?;
        if expected_ty.name() == name {
            return Ok(Some(expected));
        }

        let mut found: Option<ClientTypeId> = None;
        for candidate in universe.snapshot() {
            if !candidate.is_public() || candidate.name() != name {
                continue;
            }
            if !universe.is_assignable_from(expected, candidate.id()) {
                continue;
            }
            if found.is_some() {
                warn!(wire_name, expected = %expected_ty, "ambiguous wire type name");
                return Err(MetadataError::AmbiguousType {
                    wire_name: wire_name.to_string(),
                    expected: expected_ty.full_name(),
                });
            }
            found = Some(candidate.id());
        }
        Ok(found)
    }

    /// Number of remembered resolutions
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::ClientTypeBuilder;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("Sample.Customer"), "Customer");
        assert_eq!(local_name("Customer"), "Customer");
        assert_eq!(local_name("Sample."), "Sample.");
        assert_eq!(local_name("A.B.C"), "C");
    }

    #[test]
    fn test_expected_type_matches_by_name() {
        let universe = Arc::new(TypeUniverse::new());
        let customer = universe.register(ClientTypeBuilder::class("Sample.Customer"));
        let cache = ClientTypeCache::new(universe.clone());

        assert_eq!(
            cache.resolve("Other.Customer", customer).unwrap(),
            Some(customer)
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_derived_type_found() {
        let universe = Arc::new(TypeUniverse::new());
        let person = universe.register(ClientTypeBuilder::class("Sample.Person"));
        let employee = universe.register(ClientTypeBuilder::class("Sample.Employee").base(person));
        universe.register(ClientTypeBuilder::class("Sample.Manager").base(person).internal());
        let cache = ClientTypeCache::new(universe.clone());

        assert_eq!(
            cache.resolve("Sample.Employee", person).unwrap(),
            Some(employee)
        );
        assert_eq!(cache.resolve("Sample.Manager", person).unwrap(), None);
    }

    #[test]
    fn test_absent_result_is_cached() {
        let universe = Arc::new(TypeUniverse::new());
        let person = universe.register(ClientTypeBuilder::class("Sample.Person"));
        let cache = ClientTypeCache::new(universe.clone());

        assert_eq!(cache.resolve("Sample.Student", person).unwrap(), None);

        // registered after the first lookup: not observed
        universe.register(ClientTypeBuilder::class("Sample.Student").base(person));
        assert_eq!(cache.resolve("Sample.Student", person).unwrap(), None);
    }

    #[test]
    fn test_ambiguous_not_cached() {
        let universe = Arc::new(TypeUniverse::new());
        let base = universe.register(ClientTypeBuilder::class("Sample.Part"));
        universe.register(ClientTypeBuilder::class("A.Widget").base(base));
        universe.register(ClientTypeBuilder::class("B.Widget").base(base));
        let cache = ClientTypeCache::new(universe.clone());

        let err = cache.resolve("Widget", base).unwrap_err();
        match err {
            MetadataError::AmbiguousType { wire_name, expected } => {
                assert_eq!(wire_name, "Widget");
                assert_eq!(expected, "Sample.Part");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(cache.is_empty());
    }
}
