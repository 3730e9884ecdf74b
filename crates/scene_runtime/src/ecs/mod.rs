//! Entity/component model
//!
//! Entities are composed from [`Component`]s, own their components outright,
//! and are shared with the world through [`EntityRef`]. Concrete component
//! kinds live in [`components`], concrete entity kinds in [`entities`].

pub mod component;
pub mod components;
pub mod entities;
pub mod entity;
pub mod properties;

pub use component::{common_properties, Component, ComponentBase, ComponentError, ComponentFlags, ComponentId, OwnerRequest};
pub use components::{InterpolatorComponent, InterpolatorMode, MeshComponent, ParticleEmitterComponent};
pub use entities::{LightEntity, StaticMeshEntity};
pub use entity::{ComponentMut, Entity, EntityBehavior, EntityId, EntityRef, Mobility, UpdateRequests};
pub use properties::{
    Property, PropertyContext, PropertyError, PropertyInfo, PropertyKind, PropertyTable, PropertyValue, Reflect,
};
