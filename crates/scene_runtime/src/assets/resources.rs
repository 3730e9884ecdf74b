//! Named payload resources consumed by components
//!
//! These are the already-loaded forms of meshes and particle systems. Loading
//! them from disk is the job of an asset pipeline outside this crate; the
//! runtime only looks them up by name.

use crate::foundation::bounds::AABB;
use crate::foundation::math::Vec3;
use crate::physics::collision::{CollisionMeshTemplate, CollisionShape};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A static mesh: local bounds plus optional collision geometry
#[derive(Debug, Clone)]
pub struct StaticMesh {
    name: String,
    bounds: AABB,
    collision: Option<CollisionShape>,
}

impl StaticMesh {
    /// Create a mesh with explicit local bounds and no collision geometry
    pub fn new(name: impl Into<String>, bounds: AABB) -> Self {
        Self {
            name: name.into(),
            bounds,
            collision: None,
        }
    }

    /// Axis-aligned cube of the given half size, with box collision
    pub fn cube(name: impl Into<String>, half_size: f32) -> Self {
        let extents = Vec3::repeat(half_size);
        Self {
            name: name.into(),
            bounds: AABB::from_center_extents(Vec3::zeros(), extents),
            collision: Some(CollisionShape::Box(extents)),
        }
    }

    /// Triangle mesh; bounds and collision are derived from the vertices
    pub fn from_triangles(name: impl Into<String>, vertices: &[Vec3], indices: &[u32]) -> Self {
        let template = CollisionMeshTemplate::from_vertices(vertices, indices);
        Self {
            name: name.into(),
            bounds: template.local_bounds,
            collision: Some(CollisionShape::Mesh(Arc::new(template))),
        }
    }

    /// Replace the collision geometry
    pub fn with_collision(mut self, shape: Option<CollisionShape>) -> Self {
        self.collision = shape;
        self
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounds in mesh-local space
    pub fn local_bounds(&self) -> AABB {
        self.bounds
    }

    /// Collision geometry, if the mesh has any
    pub fn collision_shape(&self) -> Option<&CollisionShape> {
        self.collision.as_ref()
    }
}

/// Description of a particle system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSystemDesc {
    /// Resource name
    pub name: String,
    /// Particles emitted per second
    pub emission_rate: f32,
    /// Live particle cap
    pub max_particles: usize,
    /// Seconds each particle lives
    pub particle_lifetime: f32,
    /// Speed along the emission direction
    pub initial_speed: f32,
    /// Cone half-angle around `direction`, in radians
    pub spread: f32,
    /// Emission direction in emitter space
    pub direction: [f32; 3],
    /// Multiplier on world gravity
    pub gravity_scale: f32,
    /// Render size of one particle, also used to pad bounds
    pub particle_size: f32,
}

impl Default for ParticleSystemDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            emission_rate: 20.0,
            max_particles: 128,
            particle_lifetime: 1.0,
            initial_speed: 2.0,
            spread: 0.4,
            direction: [0.0, 1.0, 0.0],
            gravity_scale: 0.0,
            particle_size: 0.1,
        }
    }
}

impl ParticleSystemDesc {
    /// Named system with default parameters
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Emission direction as a unit vector
    pub fn direction_vector(&self) -> Vec3 {
        let direction = Vec3::new(self.direction[0], self.direction[1], self.direction[2]);
        direction.try_normalize(1.0e-6).unwrap_or_else(Vec3::y)
    }
}
