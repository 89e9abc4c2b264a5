//! Loading and caching precomputed grids by logical name (`spec.md` §4.F,
//! §6).

use crate::error::BridgeError;
use josh_space::{GridError, PrecomputedGrid};
use josh_units::UnitRegistry;
use std::collections::HashMap;
use std::sync::Mutex;

/// How the bridge turns a logical external-data name into the raw
/// `.jshd` bytes behind it.
///
/// `spec.md` §6: "resolution of a logical precomputed-data name to bytes
/// is pluggable — a file on disk, an embedded resource, a network
/// fetch." The bridge depends only on this trait, not on any one
/// resolution strategy.
pub trait InputGetterStrategy: Send + Sync {
    /// Resolve `logical_name` to its raw bytes.
    fn resolve(&self, logical_name: &str) -> Result<Vec<u8>, GridError>;
}

/// An [`InputGetterStrategy`] backed by an in-memory name -> bytes map,
/// the fixture a test or embedder without a real filesystem uses.
#[derive(Clone, Debug, Default)]
pub struct MapInputGetter {
    entries: HashMap<String, Vec<u8>>,
}

impl MapInputGetter {
    /// An empty getter; every resolution misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the raw bytes for a logical name.
    pub fn insert(&mut self, logical_name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(logical_name.into(), bytes);
    }
}

impl InputGetterStrategy for MapInputGetter {
    fn resolve(&self, logical_name: &str) -> Result<Vec<u8>, GridError> {
        self.entries
            .get(logical_name)
            .cloned()
            .ok_or_else(|| GridError::NotFound {
                name: logical_name.to_string(),
            })
    }
}

/// Parses and caches precomputed grids by logical name for the lifetime
/// of the bridge that owns this loader.
///
/// `spec.md` §4.F: a grid's extents, step range, and units never change
/// once loaded, so parsing the same logical name twice would only waste
/// work; the cache is keyed on the name alone, not on the query the
/// caller is about to run against it.
pub struct PrecomputedGridLoader {
    getter: Box<dyn InputGetterStrategy>,
    cache: Mutex<HashMap<String, PrecomputedGrid>>,
}

impl PrecomputedGridLoader {
    /// Build a loader backed by `getter`.
    pub fn new(getter: Box<dyn InputGetterStrategy>) -> Self {
        Self {
            getter,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the grid named `logical_name`, parsing and caching it on
    /// first access.
    pub fn get(
        &self,
        logical_name: &str,
        registry: &UnitRegistry,
    ) -> Result<PrecomputedGrid, BridgeError> {
        {
            let cache = self.cache.lock().expect("grid cache lock poisoned");
            if let Some(grid) = cache.get(logical_name) {
                return Ok(grid.clone());
            }
        }
        let bytes = self.getter.resolve(logical_name).map_err(|e| match e {
            GridError::NotFound { name } => BridgeError::ExternalDataNotFound { name },
            other => BridgeError::Grid(other),
        })?;
        let grid = PrecomputedGrid::from_bytes(&bytes, registry)?;
        self.cache
            .lock()
            .expect("grid cache lock poisoned")
            .insert(logical_name.to_string(), grid.clone());
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_units::Units;

    fn sample_grid_bytes() -> Vec<u8> {
        let grid = PrecomputedGrid::new(0, 0, 0, 0, 0, 0, Units::base("mm"), vec![vec![vec![1.5]]])
            .unwrap();
        grid.to_bytes().unwrap()
    }

    #[test]
    fn loads_and_caches_by_logical_name() {
        let mut getter = MapInputGetter::new();
        getter.insert("rain", sample_grid_bytes());
        let loader = PrecomputedGridLoader::new(Box::new(getter));
        let registry = UnitRegistry::new();

        let first = loader.get("rain", &registry).unwrap();
        let second = loader.get("rain", &registry).unwrap();
        assert_eq!(first.extents(), second.extents());
    }

    #[test]
    fn unknown_name_is_external_data_not_found() {
        let loader = PrecomputedGridLoader::new(Box::new(MapInputGetter::new()));
        let registry = UnitRegistry::new();
        assert!(matches!(
            loader.get("missing", &registry),
            Err(BridgeError::ExternalDataNotFound { .. })
        ));
    }
}
