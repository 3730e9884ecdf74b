//! Scene graph trait and implementations
//!
//! Provides pluggable spatial records for world entity enumeration.

use crate::ecs::EntityId;
use crate::foundation::bounds::AABB;
use crate::foundation::math::Vec3;

/// Trait for spatial data structures used by a world
///
/// Allows pluggable implementations (list, octree, BSP, etc.) behind one API.
pub trait SceneGraph {
    /// Add or refresh an entity's bounding volume
    fn update(&mut self, entity: EntityId, bounds: AABB);

    /// Remove an entity; returns false if it was not present
    fn remove(&mut self, entity: EntityId) -> bool;

    /// Recorded bounds of an entity
    fn bounds_of(&self, entity: EntityId) -> Option<AABB>;

    /// Query all entities whose bounds touch a box
    fn query_aabb(&self, aabb: &AABB) -> Vec<EntityId>;

    /// Query all entities whose bounds touch a sphere
    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// Get the total number of entities in the scene graph
    fn entity_count(&self) -> usize;

    /// Clear all entities from the scene graph
    fn clear(&mut self);
}

/// Simple list-based scene graph (no spatial optimization)
///
/// Performs linear search for all queries. Sufficient for small scenes and
/// replaceable by a tree without changing the API.
#[derive(Debug, Default)]
pub struct SimpleListGraph {
    entities: Vec<(EntityId, AABB)>,
}

impl SimpleListGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneGraph for SimpleListGraph {
    fn update(&mut self, entity: EntityId, bounds: AABB) {
        match self.entities.iter_mut().find(|(e, _)| *e == entity) {
            Some(entry) => entry.1 = bounds,
            None => self.entities.push((entity, bounds)),
        }
    }

    fn remove(&mut self, entity: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|(e, _)| *e != entity);
        self.entities.len() != before
    }

    fn bounds_of(&self, entity: EntityId) -> Option<AABB> {
        self.entities.iter().find(|(e, _)| *e == entity).map(|(_, b)| *b)
    }

    fn query_aabb(&self, aabb: &AABB) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, bounds)| !bounds.is_empty() && bounds.intersects(aabb))
            .map(|(entity, _)| *entity)
            .collect()
    }

    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, bounds)| bounds.intersects_sphere(center, radius))
            .map(|(entity, _)| *entity)
            .collect()
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_list_graph_queries() {
        let mut graph = SimpleListGraph::new();
        let near = EntityId::new(1);
        let far = EntityId::new(2);

        graph.update(near, AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)));
        graph.update(far, AABB::new(Vec3::repeat(10.0), Vec3::repeat(11.0)));
        assert_eq!(graph.entity_count(), 2);

        assert_eq!(graph.query_radius(Vec3::zeros(), 0.5), vec![near]);
        assert_eq!(graph.query_aabb(&AABB::new(Vec3::repeat(9.0), Vec3::repeat(12.0))), vec![far]);

        graph.update(far, AABB::new(Vec3::zeros(), Vec3::repeat(0.1)));
        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.query_radius(Vec3::zeros(), 0.5).len(), 2);

        assert!(graph.remove(near));
        assert!(!graph.remove(near));
        assert_eq!(graph.entity_count(), 1);
    }

    #[test]
    fn test_empty_bounds_never_match() {
        let mut graph = SimpleListGraph::new();
        graph.update(EntityId::new(3), AABB::empty());
        assert!(graph.query_aabb(&AABB::infinite()).is_empty());
        assert!(graph.query_radius(Vec3::zeros(), 100.0).is_empty());
    }
}
