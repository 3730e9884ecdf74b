//! Resource Manager - named registry of loaded resources
//!
//! Components resolve their payload (meshes, particle systems) by name
//! through the [`ResourceProvider`] trait. [`ResourceManager`] is the
//! in-memory implementation: resources are registered once under a unique
//! name and shared through `Arc`.

use super::resources::{ParticleSystemDesc, StaticMesh};
use super::{ResourceError, ResourceProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory registry of named resources
#[derive(Debug, Default)]
pub struct ResourceManager {
    meshes: HashMap<String, Arc<StaticMesh>>,
    particle_systems: HashMap<String, Arc<ParticleSystemDesc>>,
}

impl ResourceManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh under its own name
    pub fn register_mesh(&mut self, mesh: StaticMesh) -> Result<Arc<StaticMesh>, ResourceError> {
        let name = mesh.name().to_string();
        if self.meshes.contains_key(&name) {
            return Err(ResourceError::DuplicateName(name));
        }
        let mesh = Arc::new(mesh);
        self.meshes.insert(name.clone(), Arc::clone(&mesh));
        log::debug!("Registered mesh '{}'", name);
        Ok(mesh)
    }

    /// Register a particle system under its own name
    pub fn register_particle_system(
        &mut self,
        system: ParticleSystemDesc,
    ) -> Result<Arc<ParticleSystemDesc>, ResourceError> {
        let name = system.name.clone();
        if self.particle_systems.contains_key(&name) {
            return Err(ResourceError::DuplicateName(name));
        }
        let system = Arc::new(system);
        self.particle_systems.insert(name.clone(), Arc::clone(&system));
        log::debug!("Registered particle system '{}'", name);
        Ok(system)
    }

    /// Drop a mesh; users holding the `Arc` keep their copy
    pub fn unregister_mesh(&mut self, name: &str) -> Option<Arc<StaticMesh>> {
        self.meshes.remove(name)
    }

    /// Number of registered meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of registered particle systems
    pub fn particle_system_count(&self) -> usize {
        self.particle_systems.len()
    }
}

impl ResourceProvider for ResourceManager {
    fn get_mesh(&self, name: &str) -> Option<Arc<StaticMesh>> {
        self.meshes.get(name).cloned()
    }

    fn get_particle_system(&self, name: &str) -> Option<Arc<ParticleSystemDesc>> {
        self.particle_systems.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut resources = ResourceManager::new();
        resources.register_mesh(StaticMesh::cube("crate", 0.5)).unwrap();
        assert!(resources.get_mesh("crate").is_some());
        assert!(resources.get_mesh("barrel").is_none());
        assert_eq!(resources.mesh_count(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut resources = ResourceManager::new();
        resources.register_particle_system(ParticleSystemDesc::named("smoke")).unwrap();
        let err = resources
            .register_particle_system(ParticleSystemDesc::named("smoke"))
            .unwrap_err();
        assert!(matches!(err, ResourceError::DuplicateName(name) if name == "smoke"));
    }

    #[test]
    fn test_require_reports_missing_name() {
        let resources = ResourceManager::new();
        let err = resources.require_mesh("ghost").unwrap_err();
        assert!(matches!(err, ResourceError::MeshNotFound(name) if name == "ghost"));
    }
}
