//! Update-frequency registries
//!
//! A world keeps one registry per update pass. Each entry records how often
//! an entity wants to be updated and how much time has built up since it
//! last was. Entries are keyed by entity id; an entity appears at most once.

use crate::ecs::EntityId;

/// One registered entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryEntry {
    /// Registered entity
    pub entity_id: EntityId,
    /// Minimum seconds between updates
    pub interval: f32,
    /// Time accumulated since the last update
    pub time_since_last_update: f32,
}

/// Ordered list of entities registered for one update pass
#[derive(Debug, Default)]
pub struct UpdateRegistry {
    entries: Vec<RegistryEntry>,
}

impl UpdateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, or change its interval if already present.
    ///
    /// A changed entry keeps its accumulated time.
    pub fn register(&mut self, entity_id: EntityId, interval: f32) {
        match self.entries.iter_mut().find(|e| e.entity_id == entity_id) {
            Some(entry) => entry.interval = interval,
            None => self.entries.push(RegistryEntry {
                entity_id,
                interval,
                time_since_last_update: 0.0,
            }),
        }
        self.resort();
    }

    /// Drop an entity; returns false if it was not registered
    pub fn unregister(&mut self, entity_id: EntityId) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.entity_id == entity_id) else {
            return false;
        };
        self.entries.swap_remove(index);
        self.resort();
        true
    }

    /// Keep the most frequently updated entries first.
    ///
    /// The sort is stable, so entries with equal intervals keep their
    /// relative order and the set fired on any tick is unchanged.
    pub fn resort(&mut self) {
        self.entries.sort_by(|a, b| a.interval.total_cmp(&b.interval));
    }

    /// Accumulate `delta_time` on every entry and collect the due ones.
    ///
    /// Each due entry is reset and reported with the time it actually
    /// accumulated, which may exceed its interval.
    pub fn advance(&mut self, delta_time: f32) -> Vec<(EntityId, f32)> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            entry.time_since_last_update += delta_time;
            if entry.time_since_last_update >= entry.interval {
                due.push((entry.entity_id, entry.time_since_last_update));
                entry.time_since_last_update = 0.0;
            }
        }
        due
    }

    /// True if the entity is registered
    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.entries.iter().any(|e| e.entity_id == entity_id)
    }

    /// Entry for an entity
    pub fn entry(&self, entity_id: EntityId) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.entity_id == entity_id)
    }

    /// All entries in firing order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_register_is_upsert() {
        let mut registry = UpdateRegistry::new();
        let id = EntityId::new(7);
        registry.register(id, 0.5);
        registry.register(id, 0.25);
        assert_eq!(registry.len(), 1);
        assert_relative_eq!(registry.entry(id).unwrap().interval, 0.25);
    }

    #[test]
    fn test_advance_reports_accumulated_time() {
        let mut registry = UpdateRegistry::new();
        let id = EntityId::new(1);
        registry.register(id, 1.0);

        assert!(registry.advance(0.4).is_empty());
        assert!(registry.advance(0.4).is_empty());
        let due = registry.advance(0.4);
        assert_eq!(due.len(), 1);
        assert_relative_eq!(due[0].1, 1.2, epsilon = 1.0e-5);
        assert_relative_eq!(registry.entry(id).unwrap().time_since_last_update, 0.0);
    }

    #[test]
    fn test_resort_orders_by_interval() {
        let mut registry = UpdateRegistry::new();
        registry.register(EntityId::new(1), 1.0);
        registry.register(EntityId::new(2), 0.0);
        registry.register(EntityId::new(3), 0.5);
        let order: Vec<u32> = registry.entries().iter().map(|e| e.entity_id.get()).collect();
        assert_eq!(order, vec![2, 3, 1]);

        assert!(registry.unregister(EntityId::new(2)));
        assert!(!registry.unregister(EntityId::new(2)));
        let order: Vec<u32> = registry.entries().iter().map(|e| e.entity_id.get()).collect();
        assert_eq!(order, vec![3, 1]);
    }
}
