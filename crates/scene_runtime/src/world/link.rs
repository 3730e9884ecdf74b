//! Shared world services
//!
//! Entities and components do not own their world. While placed, they hold
//! a [`WorldLink`]: a cheap handle to the parts of the world they are allowed
//! to touch (render world, physics world, update registries, spatial record
//! and removal queue). The world itself owns the one strong copy that
//! outlives every placement.

use super::registry::UpdateRegistry;
use crate::ecs::{EntityId, Mobility};
use crate::foundation::bounds::AABB;
use crate::foundation::math::Vec3;
use crate::physics::{CollisionObject, PhysicsWorld};
use crate::render::{RenderProxy, RenderWorld};
use crate::scene::SceneGraph;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

struct WorldShared {
    render_world: RefCell<Box<dyn RenderWorld>>,
    physics_world: RefCell<Box<dyn PhysicsWorld>>,
    sync_registry: RefCell<UpdateRegistry>,
    async_registry: RefCell<UpdateRegistry>,
    spatial: RefCell<Box<dyn SceneGraph>>,
    removal_queue: RefCell<VecDeque<EntityId>>,
}

/// Handle to the services of one world
#[derive(Clone)]
pub struct WorldLink {
    shared: Rc<WorldShared>,
}

impl fmt::Debug for WorldLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldLink")
            .field("renderables", &self.render_world().renderable_count())
            .field("collision_objects", &self.physics_world().object_count())
            .finish_non_exhaustive()
    }
}

impl WorldLink {
    /// Wrap the collaborators of a new world
    pub fn new(
        render_world: Box<dyn RenderWorld>,
        physics_world: Box<dyn PhysicsWorld>,
        spatial: Box<dyn SceneGraph>,
    ) -> Self {
        Self {
            shared: Rc::new(WorldShared {
                render_world: RefCell::new(render_world),
                physics_world: RefCell::new(physics_world),
                sync_registry: RefCell::new(UpdateRegistry::new()),
                async_registry: RefCell::new(UpdateRegistry::new()),
                spatial: RefCell::new(spatial),
                removal_queue: RefCell::new(VecDeque::new()),
            }),
        }
    }

    /// True if both handles refer to the same world
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Borrow the render world
    pub fn render_world(&self) -> Ref<'_, Box<dyn RenderWorld>> {
        self.shared.render_world.borrow()
    }

    /// Borrow the physics world
    pub fn physics_world(&self) -> Ref<'_, Box<dyn PhysicsWorld>> {
        self.shared.physics_world.borrow()
    }

    /// Mutably borrow the physics world
    pub fn physics_world_mut(&self) -> RefMut<'_, Box<dyn PhysicsWorld>> {
        self.shared.physics_world.borrow_mut()
    }

    /// Borrow the spatial record
    pub fn spatial(&self) -> Ref<'_, Box<dyn SceneGraph>> {
        self.shared.spatial.borrow()
    }

    /// Borrow the sync update registry
    pub fn sync_registry(&self) -> Ref<'_, UpdateRegistry> {
        self.shared.sync_registry.borrow()
    }

    /// Borrow the async update registry
    pub fn async_registry(&self) -> Ref<'_, UpdateRegistry> {
        self.shared.async_registry.borrow()
    }

    /// Configured gravity of the physics world
    pub fn gravity(&self) -> Vec3 {
        self.physics_world().gravity()
    }

    /// Start drawing a proxy
    pub fn add_renderable(&self, proxy: Arc<RenderProxy>) {
        self.shared.render_world.borrow_mut().add_renderable(proxy);
    }

    /// Stop drawing a proxy
    pub fn remove_renderable(&self, proxy: &Arc<RenderProxy>) {
        if !self.shared.render_world.borrow_mut().remove_renderable(proxy) {
            log::warn!("Render proxy {} was not registered", proxy.id());
        }
    }

    /// Start simulating a collision object
    pub fn add_collision_object(&self, object: Arc<CollisionObject>) {
        self.shared.physics_world.borrow_mut().add_object(object);
    }

    /// Stop simulating a collision object
    pub fn remove_collision_object(&self, object: &Arc<CollisionObject>) {
        if !self.shared.physics_world.borrow_mut().remove_object(object) {
            log::warn!("Collision object {} was not registered", object.id());
        }
    }

    /// Upsert an entity into the sync update pass
    pub fn register_entity_for_update(&self, entity_id: EntityId, interval: f32) {
        log::debug!("Entity {} registered for updates every {}s", entity_id, interval);
        self.shared.sync_registry.borrow_mut().register(entity_id, interval);
    }

    /// Remove an entity from the sync update pass
    pub fn unregister_entity_for_update(&self, entity_id: EntityId) {
        log::debug!("Entity {} unregistered from updates", entity_id);
        self.shared.sync_registry.borrow_mut().unregister(entity_id);
    }

    /// Upsert an entity into the async update pass
    pub fn register_entity_for_async_update(&self, entity_id: EntityId, interval: f32) {
        log::debug!("Entity {} registered for async updates every {}s", entity_id, interval);
        self.shared.async_registry.borrow_mut().register(entity_id, interval);
    }

    /// Remove an entity from the async update pass
    pub fn unregister_entity_for_async_update(&self, entity_id: EntityId) {
        log::debug!("Entity {} unregistered from async updates", entity_id);
        self.shared.async_registry.borrow_mut().unregister(entity_id);
    }

    /// Refresh the spatial record of an entity. Global entities are never recorded.
    pub fn move_entity(&self, entity_id: EntityId, bounds: &AABB, mobility: Mobility) {
        if mobility == Mobility::Global {
            return;
        }
        self.shared.spatial.borrow_mut().update(entity_id, *bounds);
    }

    /// Drop the spatial record of an entity
    pub fn remove_spatial(&self, entity_id: EntityId) {
        self.shared.spatial.borrow_mut().remove(entity_id);
    }

    /// Queue an entity for removal at the end of the frame; queuing twice is a no-op
    pub fn queue_remove_entity(&self, entity_id: EntityId) -> bool {
        let mut queue = self.shared.removal_queue.borrow_mut();
        if queue.contains(&entity_id) {
            return false;
        }
        queue.push_back(entity_id);
        true
    }

    /// Take the next queued removal
    pub fn pop_removal(&self) -> Option<EntityId> {
        self.shared.removal_queue.borrow_mut().pop_front()
    }

    /// Number of queued removals
    pub fn pending_removals(&self) -> usize {
        self.shared.removal_queue.borrow().len()
    }

    /// Run the synchronous physics step
    pub(crate) fn step_physics(&self, delta_time: f32) {
        self.shared.physics_world.borrow_mut().update(delta_time);
    }

    /// Run the asynchronous physics phase
    pub(crate) fn step_physics_async(&self, delta_time: f32) {
        self.shared.physics_world.borrow_mut().update_async(delta_time);
    }

    /// Advance the sync registry and collect due entities
    pub(crate) fn advance_sync_registry(&self, delta_time: f32) -> Vec<(EntityId, f32)> {
        self.shared.sync_registry.borrow_mut().advance(delta_time)
    }

    /// Advance the async registry and collect due entities
    pub(crate) fn advance_async_registry(&self, delta_time: f32) -> Vec<(EntityId, f32)> {
        self.shared.async_registry.borrow_mut().advance(delta_time)
    }
}
