//! Step-scoped memoization for spatial queries (`spec.md` §4.G).

use crate::error::BridgeError;
use josh_core::GeoKey;
use josh_units::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Identifies one spatial query uniquely enough to memoize its result
/// for the remainder of the step it was issued in.
///
/// `GeoKey` itself isn't `Hash`, so the origin is flattened to its type
/// name and cell rather than stored whole. `radius` is carried as its
/// bit pattern (`f64` isn't `Eq`/`Hash`) — two queries issued with the
/// literal same distance value hit the same cache entry; queries whose
/// distance differs by float noise simply miss, which is the safe
/// direction to err in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryFingerprint {
    origin_type: String,
    origin_cell: (i64, i64),
    attribute: String,
    radius_bits: u64,
    resolver_version: u64,
}

impl QueryFingerprint {
    /// Build a fingerprint for a query centered on `origin`.
    ///
    /// `resolver_version` ties the fingerprint to the step it was built
    /// in (`spec.md` §4.G / §4.E, grounded on `murk-obs`'s
    /// `WorldGenerationId`): a fingerprint built against an earlier
    /// version never collides with one built after `begin_step`
    /// bumped the counter, even if every other field matches.
    pub fn new(origin: &GeoKey, attribute: &str, radius: f64, resolver_version: u64) -> Self {
        Self {
            origin_type: origin.type_name().to_string(),
            origin_cell: origin.cell(),
            attribute: attribute.to_string(),
            radius_bits: radius.to_bits(),
            resolver_version,
        }
    }
}

/// Caches the result of each distinct spatial query for the duration of
/// one step.
///
/// `spec.md` §4.G: "a query with the same center, radius, and attribute
/// issued twice within one step returns the memoized result rather than
/// re-scanning the patch set." `begin_step` bumps the resolver-version
/// counter that every new fingerprint is built against, which makes
/// entries from a prior step unreachable without an explicit sweep —
/// the same amortized-invalidation trick `ObsPlanCache` uses.
pub struct QueryCache {
    version: AtomicU64,
    entries: Mutex<HashMap<QueryFingerprint, Value>>,
}

impl QueryCache {
    /// An empty cache, starting at resolver version 0.
    pub fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The resolver version new fingerprints should be built against.
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Begin a new step: bump the resolver version and drop every
    /// memoized entry so the cache does not grow without bound.
    pub fn begin_step(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
        self.entries.lock().expect("query cache lock poisoned").clear();
    }

    /// Return the memoized value for `fingerprint`, computing and
    /// storing it via `compute` on a miss.
    pub fn get_or_compute(
        &self,
        fingerprint: QueryFingerprint,
        compute: impl FnOnce() -> Result<Value, BridgeError>,
    ) -> Result<Value, BridgeError> {
        if let Some(v) = self
            .entries
            .lock()
            .expect("query cache lock poisoned")
            .get(&fingerprint)
        {
            return Ok(v.clone());
        }
        let value = compute()?;
        self.entries
            .lock()
            .expect("query cache lock poisoned")
            .insert(fingerprint, value.clone());
        Ok(value)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_units::Units;
    use std::cell::Cell;

    #[test]
    fn second_call_with_same_fingerprint_hits_cache() {
        let cache = QueryCache::new();
        let origin = GeoKey::for_cell("Default", (0, 0));
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(Value::Int(7, Units::empty()))
        };
        let fp = QueryFingerprint::new(&origin, "value", 3.0, cache.current_version());
        cache.get_or_compute(fp.clone(), compute).unwrap();
        cache.get_or_compute(fp, compute).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn begin_step_invalidates_prior_entries() {
        let cache = QueryCache::new();
        let origin = GeoKey::for_cell("Default", (0, 0));
        let fp_before = QueryFingerprint::new(&origin, "value", 3.0, cache.current_version());
        cache
            .get_or_compute(fp_before, || Ok(Value::Int(1, Units::empty())))
            .unwrap();

        cache.begin_step();
        let calls = Cell::new(0);
        let fp_after = QueryFingerprint::new(&origin, "value", 3.0, cache.current_version());
        cache
            .get_or_compute(fp_after, || {
                calls.set(calls.get() + 1);
                Ok(Value::Int(2, Units::empty()))
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
    }
}
