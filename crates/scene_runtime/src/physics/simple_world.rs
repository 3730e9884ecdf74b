//! Brute-force physics world

use super::{CollisionLayers, CollisionObject, PhysicsRayHit, PhysicsWorld, Ray};
use crate::foundation::math::Vec3;
use std::sync::Arc;

/// Physics world that stores objects in a list and ray casts against all of them
#[derive(Debug)]
pub struct SimplePhysicsWorld {
    objects: Vec<Arc<CollisionObject>>,
    gravity: Vec3,
    simulated_time: f64,
    async_time: f64,
    step_count: u64,
}

impl Default for SimplePhysicsWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl SimplePhysicsWorld {
    /// Create an empty world with the given gravity
    pub fn new(gravity: Vec3) -> Self {
        Self {
            objects: Vec::new(),
            gravity,
            simulated_time: 0.0,
            async_time: 0.0,
            step_count: 0,
        }
    }

    /// Registered objects
    pub fn objects(&self) -> &[Arc<CollisionObject>] {
        &self.objects
    }

    /// Total time advanced by synchronous steps
    pub fn simulated_time(&self) -> f64 {
        self.simulated_time
    }

    /// Total time advanced by asynchronous phases
    pub fn async_time(&self) -> f64 {
        self.async_time
    }

    /// Number of synchronous steps taken
    pub fn step_count(&self) -> u64 {
        self.step_count
    }
}

impl PhysicsWorld for SimplePhysicsWorld {
    fn add_object(&mut self, object: Arc<CollisionObject>) {
        debug_assert!(
            !self.contains_object(&object),
            "collision object {} added twice",
            object.id()
        );
        self.objects.push(object);
    }

    fn remove_object(&mut self, object: &Arc<CollisionObject>) -> bool {
        match self.objects.iter().position(|o| Arc::ptr_eq(o, object)) {
            Some(index) => {
                self.objects.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn update(&mut self, delta_time: f32) {
        self.simulated_time += f64::from(delta_time);
        self.step_count += 1;
    }

    fn update_async(&mut self, delta_time: f32) {
        self.async_time += f64::from(delta_time);
    }

    fn ray_cast(&self, ray: &Ray, max_distance: f32, mask: CollisionLayers) -> Option<PhysicsRayHit> {
        self.objects
            .iter()
            .filter(|object| object.layers().accepted_by(mask))
            .filter_map(|object| {
                let (distance, point, normal) = object.intersect_ray(ray)?;
                (distance <= max_distance).then(|| PhysicsRayHit {
                    object: Arc::clone(object),
                    entity_id: object.entity_id(),
                    point,
                    normal,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn contains_object(&self, object: &CollisionObject) -> bool {
        self.objects.iter().any(|o| std::ptr::eq(Arc::as_ptr(o), object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use crate::physics::CollisionShape;
    use approx::assert_relative_eq;

    fn sphere_at(x: f32, entity_id: u32) -> Arc<CollisionObject> {
        let object = CollisionObject::new(CollisionShape::sphere(1.0), CollisionLayers::DYNAMIC);
        object.set_transform(&Transform::from_position(Vec3::new(x, 0.0, 0.0)));
        object.set_entity_id(entity_id);
        object
    }

    #[test]
    fn test_ray_cast_returns_closest() {
        let mut world = SimplePhysicsWorld::default();
        world.add_object(sphere_at(10.0, 1));
        world.add_object(sphere_at(5.0, 2));

        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        let hit = world.ray_cast(&ray, f32::MAX, CollisionLayers::all()).unwrap();
        assert_eq!(hit.entity_id, 2);
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1.0e-5);

        assert!(world.ray_cast(&ray, 3.0, CollisionLayers::all()).is_none());
        assert!(world.ray_cast(&ray, f32::MAX, CollisionLayers::STATIC).is_none());
    }

    #[test]
    fn test_remove_object() {
        let mut world = SimplePhysicsWorld::default();
        let object = sphere_at(0.0, 0);
        world.add_object(Arc::clone(&object));
        assert!(world.contains_object(&object));
        assert!(world.remove_object(&object));
        assert!(!world.remove_object(&object));
        assert_eq!(world.object_count(), 0);
    }
}
