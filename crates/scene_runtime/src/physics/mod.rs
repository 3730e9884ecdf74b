//! Physics world interface
//!
//! The runtime never solves physics itself. It only keeps collision objects
//! registered with a [`PhysicsWorld`] while their owners are placed, keeps
//! their transforms current, and asks the world for ray hits.
//! [`SimplePhysicsWorld`] is a brute-force implementation suitable for
//! headless runs and tests.

pub mod collision;
pub mod collision_layers;
mod simple_world;

pub use collision::{CollisionMeshTemplate, CollisionShape, Ray, Triangle};
pub use collision_layers::CollisionLayers;
pub use simple_world::SimplePhysicsWorld;

use crate::foundation::bounds::AABB;
use crate::foundation::math::{Transform, Vec3};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// A shape registered with a physics world
///
/// The entity id is the back-link used to map ray hits to entities; 0 means
/// the object belongs to no entity (for example a brush).
#[derive(Debug)]
pub struct CollisionObject {
    id: u64,
    shape: CollisionShape,
    layers: CollisionLayers,
    entity_id: AtomicU32,
    transform: RwLock<Transform>,
}

impl CollisionObject {
    /// Create a shared collision object at the identity transform
    pub fn new(shape: CollisionShape, layers: CollisionLayers) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            shape,
            layers,
            entity_id: AtomicU32::new(0),
            transform: RwLock::new(Transform::identity()),
        })
    }

    /// Process-unique object id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Model-space shape
    pub fn shape(&self) -> &CollisionShape {
        &self.shape
    }

    /// Layer membership
    pub fn layers(&self) -> CollisionLayers {
        self.layers
    }

    /// Owning entity id, 0 for none
    pub fn entity_id(&self) -> u32 {
        self.entity_id.load(Ordering::Acquire)
    }

    /// Set or clear (0) the owning entity id
    pub fn set_entity_id(&self, entity_id: u32) {
        self.entity_id.store(entity_id, Ordering::Release);
    }

    /// Current world transform
    pub fn transform(&self) -> Transform {
        self.transform.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Move the object
    pub fn set_transform(&self, transform: &Transform) {
        *self.transform.write().unwrap_or_else(PoisonError::into_inner) = transform.clone();
    }

    /// World-space bounds at the current transform
    pub fn world_bounds(&self) -> AABB {
        self.shape.local_bounds().transformed(&self.transform())
    }

    /// Ray test at the current transform
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        self.shape.intersect_ray(ray, &self.transform())
    }
}

/// Closest hit returned by [`PhysicsWorld::ray_cast`]
#[derive(Debug, Clone)]
pub struct PhysicsRayHit {
    /// The object that was hit
    pub object: Arc<CollisionObject>,
    /// Entity id stored on the object at hit time, 0 for none
    pub entity_id: u32,
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Physics simulation consumed by a world
pub trait PhysicsWorld {
    /// Start simulating an object
    fn add_object(&mut self, object: Arc<CollisionObject>);

    /// Stop simulating an object; returns false if it was not registered
    fn remove_object(&mut self, object: &Arc<CollisionObject>) -> bool;

    /// Synchronous simulation step
    fn update(&mut self, delta_time: f32);

    /// Asynchronous simulation phase, may overlap the previous frame's rendering
    fn update_async(&mut self, delta_time: f32);

    /// Closest hit within `max_distance` among objects accepted by `mask`
    fn ray_cast(&self, ray: &Ray, max_distance: f32, mask: CollisionLayers) -> Option<PhysicsRayHit>;

    /// Configured gravity
    fn gravity(&self) -> Vec3;

    /// Change the gravity
    fn set_gravity(&mut self, gravity: Vec3);

    /// Number of registered objects
    fn object_count(&self) -> usize;

    /// True if this exact object is registered
    fn contains_object(&self, object: &CollisionObject) -> bool;
}
