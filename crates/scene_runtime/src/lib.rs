//! # Scene Runtime
//!
//! An entity/component/world runtime for game scenes, kept in sync with a
//! render world and a physics world.
//!
//! ## Features
//!
//! - **Composed entities**: entities own components; both reach the world
//!   only through a [`world::WorldLink`]
//! - **Aggregate bounds**: entity bounds always cover their own and their
//!   components' bounds
//! - **Scheduled updates**: reference-counted sync and async registrations
//!   with per-entity intervals
//! - **Deferred removal**: structural changes wait for the end of the frame
//! - **Reflection**: named, typed property tables for every kind
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_runtime::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut resources = ResourceManager::new();
//!     resources.register_mesh(StaticMesh::cube("crate", 0.5))?;
//!
//!     let mut world = DynamicWorld::headless(WorldConfig::default())?;
//!     let crate_entity = StaticMeshEntity::create(&resources, "crate")?;
//!     world.add_entity(crate_entity.into_ref());
//!
//!     let delta_time = 1.0 / 60.0;
//!     world.begin_frame(delta_time);
//!     world.update_async(delta_time);
//!     world.update(delta_time);
//!     world.end_frame();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod physics;
pub mod render;
pub mod scene;
pub mod world;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        assets::{ParticleSystemDesc, ResourceManager, StaticMesh},
        config::{Config, ConfigError, WorldConfig},
        ecs::{
            Component, Entity, EntityBehavior, EntityId, EntityRef, InterpolatorComponent, InterpolatorMode,
            LightEntity, MeshComponent, Mobility, ParticleEmitterComponent, PropertyValue, StaticMeshEntity,
        },
        foundation::{
            bounds::{BoundingSphere, AABB},
            math::{Quat, Transform, Vec3},
            time::{GameClock, Stopwatch},
        },
        physics::{CollisionLayers, Ray},
        render::{LightParams, LightType},
        world::{DynamicWorld, ObserverKey, World, WorldRayHit},
    };
}
