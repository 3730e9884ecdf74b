//! Concrete entity kinds
//!
//! Each kind is an [`EntityBehavior`](super::EntityBehavior) plugged into a
//! plain [`Entity`](super::Entity); the `create` constructors return the
//! assembled entity.

pub mod light;
pub mod static_mesh;

pub use light::LightEntity;
pub use static_mesh::StaticMeshEntity;
