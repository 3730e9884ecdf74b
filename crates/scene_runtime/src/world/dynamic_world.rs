//! Dynamic world
//!
//! The concrete [`World`]: a flat list of placed entities indexed by id,
//! plus the brushes (static level geometry) that are not entities at all.

use super::{Brush, BrushId, World, WorldCore, WorldLink, WorldStats};
use crate::assets::StaticMesh;
use crate::config::{ConfigError, WorldConfig};
use crate::ecs::{EntityId, EntityRef, Mobility};
use crate::foundation::bounds::AABB;
use crate::foundation::collections::HandleMap;
use crate::foundation::math::{Transform, Vec3};
use crate::physics::{PhysicsWorld, SimplePhysicsWorld};
use crate::render::{HeadlessRenderWorld, RenderWorld};
use crate::scene::SimpleListGraph;
use std::cell::{Ref, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// World storing entities in a dense list
#[derive(Debug)]
pub struct DynamicWorld {
    core: WorldCore,
    entities: Vec<EntityRef>,
    index: HashMap<EntityId, usize>,
    brushes: HandleMap<Brush>,
}

impl Default for DynamicWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicWorld {
    /// Headless world with default settings
    pub fn new() -> Self {
        Self::build(WorldConfig::default(), Box::new(HeadlessRenderWorld::new()), None)
    }

    /// World around the given render and physics worlds.
    ///
    /// The physics world's gravity is replaced by the configured one.
    pub fn with_config(
        config: WorldConfig,
        render_world: Box<dyn RenderWorld>,
        physics_world: Box<dyn PhysicsWorld>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, render_world, Some(physics_world)))
    }

    /// Headless world with the given settings
    pub fn headless(config: WorldConfig) -> Result<Self, ConfigError> {
        let physics = Box::new(SimplePhysicsWorld::new(config.gravity_vector()));
        Self::with_config(config, Box::new(HeadlessRenderWorld::new()), physics)
    }

    fn build(
        config: WorldConfig,
        render_world: Box<dyn RenderWorld>,
        physics_world: Option<Box<dyn PhysicsWorld>>,
    ) -> Self {
        let mut physics_world =
            physics_world.unwrap_or_else(|| Box::new(SimplePhysicsWorld::new(config.gravity_vector())));
        physics_world.set_gravity(config.gravity_vector());
        let link = WorldLink::new(render_world, physics_world, Box::new(SimpleListGraph::new()));

        log::info!(
            "Created world '{}' (gravity {:?}, first entity id {}, effect cap {})",
            config.name,
            config.gravity,
            config.first_entity_id,
            config.max_transient_effects
        );

        Self {
            core: WorldCore::new(config, link),
            entities: Vec::new(),
            index: HashMap::new(),
            brushes: HandleMap::new(),
        }
    }

    /// Render world, borrowed
    pub fn render_world(&self) -> Ref<'_, Box<dyn RenderWorld>> {
        self.core.link().render_world()
    }

    /// Physics world, borrowed
    pub fn physics_world(&self) -> Ref<'_, Box<dyn PhysicsWorld>> {
        self.core.link().physics_world()
    }

    /// Physics world, mutably borrowed
    pub fn physics_world_mut(&self) -> RefMut<'_, Box<dyn PhysicsWorld>> {
        self.core.link().physics_world_mut()
    }

    /// Settings the world was built with
    pub fn config(&self) -> &WorldConfig {
        self.core.config()
    }

    /// Statistics of the last frame
    pub fn stats(&self) -> &WorldStats {
        self.core.stats()
    }

    /// Placed entities in placement order (removal swaps the last entity into the gap)
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    /// First placed entity with the given name
    pub fn get_entity_by_name(&self, name: &str) -> Option<EntityRef> {
        self.entities
            .iter()
            .find(|entity| entity.borrow().name() == name)
            .cloned()
    }

    /// Placed entities with global mobility
    pub fn global_entities(&self) -> Vec<EntityRef> {
        self.entities
            .iter()
            .filter(|entity| entity.borrow().mobility() == Mobility::Global)
            .cloned()
            .collect()
    }

    /// Entities whose bounding box touches `bounds`. Global entities are
    /// never reported; see [`DynamicWorld::global_entities`].
    pub fn enumerate_entities_in_box(&self, bounds: &AABB) -> Vec<EntityRef> {
        let ids = self.core.link().spatial().query_aabb(bounds);
        self.resolve(ids)
    }

    /// Entities whose bounding box touches the sphere. Global entities are
    /// never reported.
    pub fn enumerate_entities_in_sphere(&self, center: Vec3, radius: f32) -> Vec<EntityRef> {
        let ids = self.core.link().spatial().query_radius(center, radius);
        self.resolve(ids)
    }

    fn resolve(&self, ids: Vec<EntityId>) -> Vec<EntityRef> {
        ids.into_iter()
            .filter_map(|id| self.index.get(&id).map(|&slot| Rc::clone(&self.entities[slot])))
            .collect()
    }

    /// Place static level geometry
    pub fn add_brush(&mut self, mesh: Arc<StaticMesh>, transform: Transform) -> BrushId {
        let brush = Brush::new(mesh, transform);
        let link = self.core.link();
        link.add_renderable(Arc::clone(brush.proxy()));
        if let Some(object) = brush.collision_object() {
            link.add_collision_object(Arc::clone(object));
        }
        log::info!("Added brush '{}'", brush.mesh().name());
        BrushId::new(self.brushes.insert(brush))
    }

    /// Remove static level geometry
    pub fn remove_brush(&mut self, id: BrushId) -> Option<Brush> {
        let brush = self.brushes.remove(id.key())?;
        self.unregister_brush(&brush);
        log::info!("Removed brush '{}'", brush.mesh().name());
        Some(brush)
    }

    /// Placed brush
    pub fn brush(&self, id: BrushId) -> Option<&Brush> {
        self.brushes.get(id.key())
    }

    /// Number of placed brushes
    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    fn unregister_brush(&self, brush: &Brush) {
        unregister_brush(self.core.link(), brush);
    }
}

impl World for DynamicWorld {
    fn core(&self) -> &WorldCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WorldCore {
        &mut self.core
    }

    fn add_entity(&mut self, entity: EntityRef) -> EntityId {
        assert!(
            !entity.borrow().is_in_world(),
            "entity {} is already in a world",
            entity.borrow().id()
        );
        let id = self.core.allocate_entity_id();
        let slot = self.entities.len();
        {
            let mut placed = entity.borrow_mut();
            placed.set_id(id);
            placed.set_world_slot(Some(slot));
            log::debug!("Adding {} '{}' as entity {}", placed.type_name(), placed.name(), id);
        }
        self.entities.push(Rc::clone(&entity));
        self.index.insert(id, slot);

        let link = self.core.link().clone();
        entity.borrow_mut().on_add_to_world(&link);
        id
    }

    fn remove_entity(&mut self, entity_id: EntityId) -> Option<EntityRef> {
        let slot = self.index.remove(&entity_id)?;
        let entity = self.entities.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            let moved_id = moved.borrow().id();
            moved.borrow_mut().set_world_slot(Some(slot));
            self.index.insert(moved_id, slot);
        }
        {
            let mut removed = entity.borrow_mut();
            removed.on_remove_from_world();
            removed.set_world_slot(None);
            log::debug!("Removed {} '{}' (entity {})", removed.type_name(), removed.name(), entity_id);
        }
        Some(entity)
    }

    fn get_entity_by_id(&self, entity_id: EntityId) -> Option<EntityRef> {
        self.index
            .get(&entity_id)
            .map(|&slot| Rc::clone(&self.entities[slot]))
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl Drop for DynamicWorld {
    fn drop(&mut self) {
        let entity_count = self.entities.len();
        for (slot, entity) in self.entities.drain(..).enumerate() {
            if let Ok(mut placed) = entity.try_borrow_mut() {
                placed.on_remove_from_world();
                placed.set_world_slot(None);
            } else {
                let id = self
                    .index
                    .iter()
                    .find_map(|(id, &s)| (s == slot).then_some(*id))
                    .unwrap_or(EntityId::NONE);
                log::warn!("Entity {} is borrowed during world shutdown and stays attached", id);
            }
        }
        self.index.clear();
        let link = self.core.link().clone();
        for (_, brush) in self.brushes.drain() {
            unregister_brush(&link, &brush);
        }
        self.core.clear_transient_effects();
        log::info!("Shut down world '{}' ({} entities released)", self.core.config().name, entity_count);
    }
}

fn unregister_brush(link: &WorldLink, brush: &Brush) {
    link.remove_renderable(brush.proxy());
    if let Some(object) = brush.collision_object() {
        link.remove_collision_object(object);
    }
}
