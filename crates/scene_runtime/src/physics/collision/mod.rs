//! Collision geometry
//!
//! Shapes are stored in model space and carried into world space only
//! during tests.
//!
//! - [`primitives`] - Basic geometric primitives (rays, triangles)
//! - [`mesh`] - Mesh-based collision geometry
//! - [`shape`] - The shape attached to a collision object

pub mod mesh;
pub mod primitives;
pub mod shape;

pub use mesh::CollisionMeshTemplate;
pub use primitives::{intersect_ray_sphere, Ray, Triangle};
pub use shape::CollisionShape;
