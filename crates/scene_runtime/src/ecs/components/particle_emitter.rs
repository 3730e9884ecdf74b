//! Particle emitter component
//!
//! Runs a [`ParticleSimulation`] at the component's world transform. The
//! emitter asks its owner for async updates for as long as it is attached;
//! every async tick advances the simulation and resizes the component bounds
//! to cover the live particles.

use crate::assets::{ParticleSystemDesc, ResourceError, ResourceProvider};
use crate::ecs::component::{common_properties, Component, ComponentBase, ComponentError, OwnerRequest};
use crate::ecs::entity::EntityId;
use crate::ecs::properties::{Property, PropertyError, PropertyKind, PropertyTable, PropertyValue};
use crate::foundation::bounds::{BoundingSphere, AABB};
use crate::foundation::math::{Transform, Vec3};
use crate::render::{RenderProxy, RenderProxyKind};
use crate::world::ParticleSimulation;
use std::any::Any;
use std::sync::Arc;

/// Component emitting particles from a named particle system
pub struct ParticleEmitterComponent {
    base: ComponentBase,
    system_name: String,
    simulation: Option<ParticleSimulation>,
    enabled: bool,
    seed: u64,
    update_interval: f32,
}

impl Default for ParticleEmitterComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleEmitterComponent {
    /// Create an enabled emitter with no particle system
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new(),
            system_name: String::new(),
            simulation: None,
            enabled: true,
            seed: 0,
            update_interval: 0.0,
        }
    }

    /// Create an emitter for the named particle system; fails without
    /// building anything if the system cannot be resolved
    pub fn create(resources: &dyn ResourceProvider, system_name: &str) -> Result<Self, ComponentError> {
        let mut component = Self::new();
        component.set_particle_system_name(resources, system_name)?;
        Ok(component)
    }

    /// Interval requested for async updates on attach
    #[must_use]
    pub fn with_update_interval(mut self, interval: f32) -> Self {
        debug_assert!(!self.base.is_attached(), "update interval changed while attached");
        self.update_interval = interval;
        self
    }

    /// Interval requested for async updates
    pub fn update_interval(&self) -> f32 {
        self.update_interval
    }

    /// Name of the current particle system
    pub fn particle_system_name(&self) -> &str {
        &self.system_name
    }

    /// Live simulation, if a system is set
    pub fn simulation(&self) -> Option<&ParticleSimulation> {
        self.simulation.as_ref()
    }

    /// Resolve and start a particle system by name; an empty name clears it.
    /// On failure the current system keeps running.
    pub fn set_particle_system_name(
        &mut self,
        resources: &dyn ResourceProvider,
        system_name: &str,
    ) -> Result<(), ResourceError> {
        let desc = if system_name.is_empty() {
            None
        } else {
            Some(resources.require_particle_system(system_name)?)
        };
        self.set_particle_system(desc);
        Ok(())
    }

    /// Start an already resolved particle system, replacing the proxy
    pub fn set_particle_system(&mut self, desc: Option<Arc<ParticleSystemDesc>>) {
        self.system_name = desc.as_ref().map(|d| d.name.clone()).unwrap_or_default();
        let proxy = desc.as_ref().map(|d| {
            RenderProxy::new(RenderProxyKind::Particles {
                system: d.name.clone(),
                positions: Vec::new(),
                size: d.particle_size,
            })
        });
        self.simulation = desc.map(|d| {
            let mut simulation = ParticleSimulation::new(d, self.seed);
            simulation.set_emitting(self.enabled);
            simulation
        });
        self.base.set_render_proxy(proxy);
        self.refresh_bounds();
    }

    /// True while new particles are emitted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start or stop emission; live particles run out either way
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if let Some(simulation) = &mut self.simulation {
            simulation.set_emitting(enabled);
        }
    }

    /// Seed of the emission random stream
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart emission from a new seed, dropping live particles
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        if let Some(simulation) = &mut self.simulation {
            simulation.reseed(seed);
        }
        self.sync_proxy();
        self.refresh_bounds();
    }

    fn sync_proxy(&self) {
        if let (Some(simulation), Some(proxy)) = (&self.simulation, self.base.render_proxy()) {
            simulation.sync_proxy(proxy);
        }
    }
}

static PARTICLE_EMITTER_PROPERTIES: [Property<ParticleEmitterComponent>; 8] = [
    common_properties::local_position(),
    common_properties::local_rotation(),
    common_properties::local_scale(),
    common_properties::visible(),
    common_properties::collidable(),
    Property::<ParticleEmitterComponent>::new(
        "ParticleSystem",
        PropertyKind::String,
        |c| PropertyValue::String(c.system_name.clone()),
        |c, value, context| Ok(c.set_particle_system_name(context.resources, value.as_str()?)?),
    ),
    Property::<ParticleEmitterComponent>::new(
        "Enabled",
        PropertyKind::Bool,
        |c| PropertyValue::Bool(c.enabled),
        |c, value, _| {
            c.set_enabled(value.as_bool()?);
            Ok(())
        },
    ),
    Property::<ParticleEmitterComponent>::new(
        "Seed",
        PropertyKind::Int,
        |c| PropertyValue::Int(i64::try_from(c.seed).unwrap_or(i64::MAX)),
        |c, value, _| {
            let raw = value.as_int()?;
            let seed = u64::try_from(raw).map_err(|_| PropertyError::Rejected(format!("negative seed {raw}")))?;
            c.set_seed(seed);
            Ok(())
        },
    ),
];

impl PropertyTable for ParticleEmitterComponent {
    fn property_table() -> &'static [Property<Self>] {
        &PARTICLE_EMITTER_PROPERTIES
    }
}

impl Component for ParticleEmitterComponent {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "ParticleEmitterComponent"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn initialize(&mut self, resources: &dyn ResourceProvider) -> Result<(), ComponentError> {
        if self.simulation.is_none() && !self.system_name.is_empty() {
            let name = self.system_name.clone();
            self.set_particle_system_name(resources, &name)?;
        }
        Ok(())
    }

    // Particles live in world space, so the bounds are not a transformed
    // local box.
    fn calculate_world_bounds(&self) -> (AABB, BoundingSphere) {
        self.simulation
            .as_ref()
            .map_or((AABB::empty(), BoundingSphere::empty()), ParticleSimulation::bounds)
    }

    fn on_add_to_entity(&mut self, owner: EntityId, owner_transform: &Transform) {
        self.base.attach(owner, owner_transform);
        self.base.request(OwnerRequest::RegisterForAsyncUpdates(self.update_interval));
        self.on_local_transform_change();
    }

    fn on_remove_from_entity(&mut self) {
        self.base.request(OwnerRequest::UnregisterForAsyncUpdates);
        self.base.detach();
        self.on_local_transform_change();
    }

    fn update_async(&mut self, delta_time: f32) {
        let gravity = self.base.world().map_or_else(Vec3::zeros, |world| world.gravity());
        let emitter = self.base.world_transform().clone();
        if let Some(simulation) = &mut self.simulation {
            simulation.step(delta_time, &emitter, gravity);
        }
        self.sync_proxy();
        self.refresh_bounds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;
    use crate::ecs::properties::{PropertyContext, Reflect};
    use approx::assert_relative_eq;

    fn resources() -> ResourceManager {
        let mut resources = ResourceManager::new();
        resources
            .register_particle_system(ParticleSystemDesc {
                emission_rate: 10.0,
                initial_speed: 0.0,
                particle_size: 0.5,
                ..ParticleSystemDesc::named("sparks")
            })
            .unwrap();
        resources
    }

    #[test]
    fn test_create_missing_system_fails() {
        let resources = resources();
        assert!(ParticleEmitterComponent::create(&resources, "smoke").is_err());
    }

    #[test]
    fn test_update_grows_bounds_around_particles() {
        let resources = resources();
        let mut emitter = ParticleEmitterComponent::create(&resources, "sparks").unwrap();
        assert!(emitter.base().bounding_box().is_empty());

        emitter.update_async(0.2);
        assert_eq!(emitter.simulation().unwrap().particle_count(), 2);
        let bounds = emitter.base().bounding_box();
        assert_relative_eq!(bounds.min, Vec3::repeat(-0.5));
        assert_relative_eq!(bounds.max, Vec3::repeat(0.5));

        let proxy = emitter.base().render_proxy().unwrap();
        match proxy.kind() {
            RenderProxyKind::Particles { positions, .. } => assert_eq!(positions.len(), 2),
            other => panic!("unexpected proxy kind {other:?}"),
        }
    }

    #[test]
    fn test_disabled_emitter_emits_nothing() {
        let resources = resources();
        let context = PropertyContext::new(&resources);
        let mut emitter = ParticleEmitterComponent::create(&resources, "sparks").unwrap();
        emitter.set_property("Enabled", &PropertyValue::Bool(false), &context).unwrap();
        emitter.update_async(1.0);
        assert_eq!(emitter.simulation().unwrap().particle_count(), 0);
    }

    #[test]
    fn test_negative_seed_rejected() {
        let resources = resources();
        let context = PropertyContext::new(&resources);
        let mut emitter = ParticleEmitterComponent::create(&resources, "sparks").unwrap();
        assert!(matches!(
            emitter.set_property("Seed", &PropertyValue::Int(-3), &context),
            Err(PropertyError::Rejected(_))
        ));
        emitter.set_property("Seed", &PropertyValue::Int(12), &context).unwrap();
        assert_eq!(emitter.seed(), 12);
    }
}
