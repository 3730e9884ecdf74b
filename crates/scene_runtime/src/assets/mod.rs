//! Asset management system
//!
//! Components never load anything themselves: they ask a
//! [`ResourceProvider`] for a named resource and fail cleanly when it is
//! missing.

pub mod resource_manager;
pub mod resources;

pub use resource_manager::ResourceManager;
pub use resources::{ParticleSystemDesc, StaticMesh};

use std::sync::Arc;
use thiserror::Error;

/// Resource resolution errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// No mesh with this name
    #[error("Mesh not found: {0}")]
    MeshNotFound(String),

    /// No particle system with this name
    #[error("Particle system not found: {0}")]
    ParticleSystemNotFound(String),

    /// A resource with this name is already registered
    #[error("Duplicate resource name: {0}")]
    DuplicateName(String),
}

/// Lookup of named resources
pub trait ResourceProvider {
    /// Find a mesh by name
    fn get_mesh(&self, name: &str) -> Option<Arc<StaticMesh>>;

    /// Find a particle system by name
    fn get_particle_system(&self, name: &str) -> Option<Arc<ParticleSystemDesc>>;

    /// Find a mesh or log and report the missing name
    fn require_mesh(&self, name: &str) -> Result<Arc<StaticMesh>, ResourceError> {
        self.get_mesh(name).ok_or_else(|| {
            log::warn!("Mesh '{}' not found", name);
            ResourceError::MeshNotFound(name.to_string())
        })
    }

    /// Find a particle system or log and report the missing name
    fn require_particle_system(&self, name: &str) -> Result<Arc<ParticleSystemDesc>, ResourceError> {
        self.get_particle_system(name).ok_or_else(|| {
            log::warn!("Particle system '{}' not found", name);
            ResourceError::ParticleSystemNotFound(name.to_string())
        })
    }
}
