//! [`Replicate`]: one full simulation run's retained timestep history.

use josh_entity::FrozenEntity;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Identified by integer index; owns the bounded ring of recent,
/// frozen timesteps a replicate retains (`spec.md` §3, §4.8: "retention
/// = last two completed steps").
///
/// Cheap to clone: the retained history lives behind an `Arc`, so every
/// clone shares the same underlying ring rather than copying it.
#[derive(Clone)]
pub struct Replicate {
    inner: Arc<ReplicateInner>,
}

struct ReplicateInner {
    index: u64,
    retention: usize,
    history: RwLock<BTreeMap<u64, Arc<Vec<FrozenEntity>>>>,
}

impl Replicate {
    /// Build a replicate identified by `index`, retaining the last
    /// `retention` completed steps (`spec.md` §4.8's default is 2).
    pub fn new(index: u64, retention: usize) -> Self {
        Self {
            inner: Arc::new(ReplicateInner {
                index,
                retention,
                history: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// This replicate's integer index.
    pub fn index(&self) -> u64 {
        self.inner.index
    }

    /// How many completed steps this replicate retains.
    pub fn retention(&self) -> usize {
        self.inner.retention
    }

    /// Record the frozen patch set for a just-completed absolute step,
    /// evicting the oldest retained step once more than `retention`
    /// steps are held.
    ///
    /// `spec.md` invariant 5: "after timestep *t* completes, timesteps
    /// *≤ t − 2* are not retrievable; *t* and *t − 1* are" — eviction
    /// keeps only the most recent `retention` entries regardless of
    /// how many steps have run in total.
    pub fn record_step(&self, step: u64, snapshot: Vec<FrozenEntity>) {
        let mut history = self.inner.history.write().expect("replicate history lock poisoned");
        history.insert(step, Arc::new(snapshot));
        while history.len() > self.inner.retention {
            let Some(&oldest) = history.keys().next() else {
                break;
            };
            history.remove(&oldest);
        }
    }

    /// Fetch the frozen patch set for `step`, if it is still within the
    /// retention window.
    pub fn get_step(&self, step: u64) -> Option<Arc<Vec<FrozenEntity>>> {
        self.inner
            .history
            .read()
            .expect("replicate history lock poisoned")
            .get(&step)
            .cloned()
    }

    /// The absolute step numbers currently retained, oldest first.
    pub fn retained_steps(&self) -> Vec<u64> {
        self.inner
            .history
            .read()
            .expect("replicate history lock poisoned")
            .keys()
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_core::{EntityKind, GeoKey};
    use josh_entity::Entity;
    use josh_entity::Prototype;
    use std::sync::Arc as StdArc;

    fn sample_snapshot() -> Vec<FrozenEntity> {
        let prototype = StdArc::new(Prototype::new("Default", EntityKind::Patch));
        let entity = Entity::new(prototype, Some(GeoKey::for_cell("Default", (0, 0))), None);
        vec![entity.freeze()]
    }

    #[test]
    fn retains_only_the_last_two_steps_by_default() {
        let replicate = Replicate::new(0, 2);
        replicate.record_step(0, sample_snapshot());
        replicate.record_step(1, sample_snapshot());
        replicate.record_step(2, sample_snapshot());

        assert!(replicate.get_step(0).is_none());
        assert!(replicate.get_step(1).is_some());
        assert!(replicate.get_step(2).is_some());
        assert_eq!(replicate.retained_steps(), vec![1, 2]);
    }

    #[test]
    fn clone_shares_the_same_history() {
        let replicate = Replicate::new(3, 2);
        let handle = replicate.clone();
        replicate.record_step(5, sample_snapshot());
        assert!(handle.get_step(5).is_some());
        assert_eq!(handle.index(), 3);
    }
}
