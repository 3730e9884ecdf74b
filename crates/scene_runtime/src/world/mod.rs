//! Worlds
//!
//! A world places entities and coordinates them with the render and physics
//! worlds it owns. It allocates entity ids, schedules the two update passes,
//! defers structural removal to the end of the frame, tracks observers and
//! runs transient particle effects.
//!
//! The frame protocol is fixed:
//!
//! ```text
//! begin_frame(dt) -> update_async(dt) -> update(dt) -> end_frame()
//! ```
//!
//! [`World`] supplies that protocol on top of a small storage interface;
//! [`DynamicWorld`] is the concrete storage.

mod brush;
mod dynamic_world;
mod link;
mod observer;
mod particles;
mod registry;


pub use brush::{Brush, BrushId};
pub use dynamic_world::DynamicWorld;
pub use link::WorldLink;
pub use observer::{Observer, ObserverKey, ObserverList};
pub use particles::{Particle, ParticleSimulation, TransientParticleEffect};
pub use registry::{RegistryEntry, UpdateRegistry};

use crate::assets::ParticleSystemDesc;
use crate::config::WorldConfig;
use crate::ecs::{EntityId, EntityRef};
use crate::foundation::collections::{HandleMap, TypedHandle};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::foundation::time::{GameClock, Stopwatch};
use crate::physics::{CollisionLayers, CollisionObject, Ray};
use std::sync::Arc;

/// Handle to a live transient particle effect
pub type EffectHandle = TypedHandle<TransientParticleEffect>;

/// Result of a world ray cast
#[derive(Debug, Clone)]
pub struct WorldRayHit {
    /// Entity owning the hit object; `None` for brushes and unowned objects
    pub entity: Option<EntityRef>,
    /// Collision object that was hit
    pub object: Arc<CollisionObject>,
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Per-frame statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldStats {
    /// Entities updated by the last async pass
    pub async_updates: usize,
    /// Entities updated by the last sync pass
    pub sync_updates: usize,
    /// Transient effects that expired during the last update
    pub expired_effects: usize,
    /// Entities removed by the last end of frame
    pub removals: usize,
    /// Wall-clock time of the last two update passes, in milliseconds
    pub update_time_ms: f32,
}

/// State shared by every world implementation
#[derive(Debug)]
pub struct WorldCore {
    link: WorldLink,
    config: WorldConfig,
    next_entity_id: u32,
    clock: GameClock,
    observers: ObserverList,
    effects: HandleMap<TransientParticleEffect>,
    next_effect_seed: u64,
    stats: WorldStats,
}

impl WorldCore {
    /// Create the shared state around a set of world services
    pub fn new(config: WorldConfig, link: WorldLink) -> Self {
        Self {
            next_entity_id: config.first_entity_id.max(1),
            link,
            config,
            clock: GameClock::new(),
            observers: ObserverList::new(),
            effects: HandleMap::new(),
            next_effect_seed: 1,
            stats: WorldStats::default(),
        }
    }

    /// Services handed to placed entities
    pub fn link(&self) -> &WorldLink {
        &self.link
    }

    /// Settings the world was built with
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Game clock
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Tracked observers
    pub fn observers(&self) -> &ObserverList {
        &self.observers
    }

    /// Statistics of the last frame
    pub fn stats(&self) -> &WorldStats {
        &self.stats
    }

    /// Hand out the next entity id; ids only ever increase
    pub fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Live transient effect
    pub fn transient_effect(&self, handle: EffectHandle) -> Option<&TransientParticleEffect> {
        self.effects.get(handle.key())
    }

    /// Number of live transient effects
    pub fn transient_effect_count(&self) -> usize {
        self.effects.len()
    }

    fn spawn_effect(&mut self, desc: Arc<ParticleSystemDesc>, life_span: f32, transform: Transform, velocity: Vec3, mass: f32) -> EffectHandle {
        while self.effects.len() >= self.config.max_transient_effects.max(1) {
            let oldest = self
                .effects
                .iter()
                .min_by(|a, b| a.1.time_remaining().total_cmp(&b.1.time_remaining()))
                .map(|(key, _)| key);
            let Some(key) = oldest else { break };
            if let Some(evicted) = self.effects.remove(key) {
                log::debug!(
                    "Evicting transient effect with {:.3}s left to stay under {} effects",
                    evicted.time_remaining(),
                    self.config.max_transient_effects
                );
                self.link.remove_renderable(evicted.proxy());
            }
        }

        let seed = self.next_effect_seed;
        self.next_effect_seed += 1;
        let name = desc.name.clone();
        let effect = TransientParticleEffect::new(desc, seed, life_span, transform, velocity, mass);
        self.link.add_renderable(Arc::clone(effect.proxy()));
        let handle = EffectHandle::new(self.effects.insert(effect));
        log::debug!("Spawned transient effect '{}' for {:.3}s", name, life_span);
        handle
    }

    fn update_effects(&mut self, delta_time: f32) -> usize {
        if self.effects.is_empty() {
            return 0;
        }
        let gravity = self.link.gravity();
        let expired: Vec<_> = self
            .effects
            .iter_mut()
            .filter_map(|(key, effect)| (!effect.update(delta_time, gravity)).then_some(key))
            .collect();
        for key in &expired {
            if let Some(effect) = self.effects.remove(*key) {
                self.link.remove_renderable(effect.proxy());
            }
        }
        if !expired.is_empty() {
            log::debug!("{} transient effect(s) expired", expired.len());
        }
        expired.len()
    }

    /// Drop every transient effect and unregister their proxies
    pub fn clear_transient_effects(&mut self) {
        for (_, effect) in self.effects.drain() {
            self.link.remove_renderable(effect.proxy());
        }
    }
}

/// A container of placed entities driven once per tick
///
/// Implementors provide entity storage; the frame protocol, scheduling,
/// transient effects, observers and ray casts are provided.
pub trait World {
    /// Shared state
    fn core(&self) -> &WorldCore;

    /// Shared state, mutably
    fn core_mut(&mut self) -> &mut WorldCore;

    /// Place an entity, assigning it a fresh id
    ///
    /// # Panics
    /// If the entity is already in a world.
    fn add_entity(&mut self, entity: EntityRef) -> EntityId;

    /// Take an entity out of the world immediately. Not for use during an
    /// update pass; see [`World::queue_remove_entity`].
    fn remove_entity(&mut self, entity_id: EntityId) -> Option<EntityRef>;

    /// Look up a placed entity
    fn get_entity_by_id(&self, entity_id: EntityId) -> Option<EntityRef>;

    /// Number of placed entities
    fn entity_count(&self) -> usize;

    /// Services handed to placed entities
    fn link(&self) -> &WorldLink {
        self.core().link()
    }

    /// Hand out the next entity id
    fn allocate_entity_id(&mut self) -> EntityId {
        self.core_mut().allocate_entity_id()
    }

    /// Accumulated game time in seconds
    fn game_time(&self) -> f64 {
        self.core().clock().total_time()
    }

    /// Start a frame: advance the game clock
    fn begin_frame(&mut self, delta_time: f32) {
        let core = self.core_mut();
        core.clock.advance(delta_time);
        core.stats = WorldStats::default();
    }

    /// Async pass: physics async phase, then every due async entity
    fn update_async(&mut self, delta_time: f32) {
        let stopwatch = Stopwatch::start_new();
        let link = self.link().clone();
        link.step_physics_async(delta_time);
        let due = link.advance_async_registry(delta_time);
        for &(entity_id, elapsed) in &due {
            if let Some(entity) = self.get_entity_by_id(entity_id) {
                log::trace!("Async update of entity {} after {:.4}s", entity_id, elapsed);
                entity.borrow_mut().update_async(elapsed);
            }
        }
        let stats = &mut self.core_mut().stats;
        stats.async_updates = due.len();
        stats.update_time_ms += stopwatch.elapsed_millis();
    }

    /// Sync pass: physics step, every due sync entity, then transient effects
    fn update(&mut self, delta_time: f32) {
        let stopwatch = Stopwatch::start_new();
        let link = self.link().clone();
        link.step_physics(delta_time);
        let due = link.advance_sync_registry(delta_time);
        for &(entity_id, elapsed) in &due {
            if let Some(entity) = self.get_entity_by_id(entity_id) {
                log::trace!("Update of entity {} after {:.4}s", entity_id, elapsed);
                entity.borrow_mut().update(elapsed);
            }
        }
        let core = self.core_mut();
        core.stats.sync_updates = due.len();
        core.stats.expired_effects = core.update_effects(delta_time);
        core.stats.update_time_ms += stopwatch.elapsed_millis();
    }

    /// End a frame: remove every queued entity, oldest request first.
    /// Returns the number removed.
    fn end_frame(&mut self) -> usize {
        let link = self.link().clone();
        let mut removed = 0;
        while let Some(entity_id) = link.pop_removal() {
            if self.remove_entity(entity_id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("End of frame removed {} entity(ies)", removed);
        }
        self.core_mut().stats.removals = removed;
        removed
    }

    /// Remove an entity at the end of the frame; queuing twice is a no-op
    fn queue_remove_entity(&self, entity_id: EntityId) -> bool {
        self.link().queue_remove_entity(entity_id)
    }

    /// Start a world-owned particle effect that lives for `life_span`
    /// seconds, drifting with `initial_velocity` and falling under gravity
    /// scaled by `mass` when `mass` is not zero
    fn spawn_particle_emitter(
        &mut self,
        system: Arc<ParticleSystemDesc>,
        life_span: f32,
        location: Vec3,
        rotation: Quat,
        scale: Vec3,
        initial_velocity: Vec3,
        mass: f32,
    ) -> EffectHandle {
        let transform = Transform::new(location, rotation, scale);
        self.core_mut()
            .spawn_effect(system, life_span, transform, initial_velocity, mass)
    }

    /// Live transient effect
    fn transient_effect(&self, handle: EffectHandle) -> Option<&TransientParticleEffect> {
        self.core().transient_effect(handle)
    }

    /// Number of live transient effects
    fn transient_effect_count(&self) -> usize {
        self.core().transient_effect_count()
    }

    /// Track an observer; false (and a move) if the key is already tracked
    fn add_observer(&mut self, key: ObserverKey, location: Vec3) -> bool {
        self.core_mut().observers.add(key, location)
    }

    /// Move a tracked observer; false if unknown
    fn update_observer(&mut self, key: ObserverKey, location: Vec3) -> bool {
        self.core_mut().observers.update(key, location)
    }

    /// Stop tracking an observer; false if unknown
    fn remove_observer(&mut self, key: ObserverKey) -> bool {
        self.core_mut().observers.remove(key)
    }

    /// Tracked observers
    fn observers(&self) -> &ObserverList {
        self.core().observers()
    }

    /// Closest physics hit along a ray, mapped back to its entity
    fn ray_cast(&self, ray: &Ray, max_distance: f32, mask: CollisionLayers) -> Option<WorldRayHit> {
        let hit = self.link().physics_world().ray_cast(ray, max_distance, mask)?;
        let entity = EntityId::from_raw(hit.entity_id).and_then(|id| self.get_entity_by_id(id));
        Some(WorldRayHit {
            entity,
            object: hit.object,
            point: hit.point,
            normal: hit.normal,
            distance: hit.distance,
        })
    }
}
