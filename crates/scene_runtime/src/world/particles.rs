//! Particle simulation and transient particle effects
//!
//! [`ParticleSimulation`] is the CPU-side state of one particle system:
//! emission, aging and integration of individual particles. It is driven by
//! the particle emitter component and by the world's transient effects.
//!
//! A [`TransientParticleEffect`] is a world-owned emitter with a countdown
//! timer. It is not attached to any entity; the world moves it by its own
//! velocity (plus gravity when it has mass) and drops it once the timer runs
//! out.

use crate::assets::ParticleSystemDesc;
use crate::foundation::bounds::{BoundingSphere, AABB};
use crate::foundation::math::{Transform, Vec3};
use crate::render::{RenderProxy, RenderProxyKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;
use std::sync::Arc;

/// One live particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World-space position
    pub position: Vec3,
    /// World-space velocity
    pub velocity: Vec3,
    /// Seconds since emission
    pub age: f32,
}

/// Deterministic CPU particle state for one system
#[derive(Debug, Clone)]
pub struct ParticleSimulation {
    desc: Arc<ParticleSystemDesc>,
    particles: Vec<Particle>,
    rng: ChaCha8Rng,
    seed: u64,
    emission_accumulator: f32,
    emitting: bool,
}

impl ParticleSimulation {
    /// Create an emitting simulation with no live particles
    pub fn new(desc: Arc<ParticleSystemDesc>, seed: u64) -> Self {
        Self {
            particles: Vec::with_capacity(desc.max_particles),
            desc,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            emission_accumulator: 0.0,
            emitting: true,
        }
    }

    /// System description
    pub fn desc(&self) -> &Arc<ParticleSystemDesc> {
        &self.desc
    }

    /// Seed the random stream was started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the random stream and drop live particles
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.clear();
    }

    /// True while new particles are emitted
    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Start or stop emission; live particles keep aging either way
    pub fn set_emitting(&mut self, emitting: bool) {
        self.emitting = emitting;
        if !emitting {
            self.emission_accumulator = 0.0;
        }
    }

    /// Drop every live particle
    pub fn clear(&mut self) {
        self.particles.clear();
        self.emission_accumulator = 0.0;
    }

    /// Live particles
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Positions of the live particles
    pub fn positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.position).collect()
    }

    /// Advance by `delta_time`: age and integrate live particles, then emit
    /// new ones from `emitter` according to the emission rate.
    pub fn step(&mut self, delta_time: f32, emitter: &Transform, gravity: Vec3) {
        let lifetime = self.desc.particle_lifetime;
        let acceleration = gravity * self.desc.gravity_scale;

        self.particles.retain_mut(|particle| {
            particle.age += delta_time;
            if particle.age >= lifetime {
                return false;
            }
            particle.velocity += acceleration * delta_time;
            particle.position += particle.velocity * delta_time;
            true
        });

        if !self.emitting || self.desc.emission_rate <= 0.0 {
            return;
        }
        self.emission_accumulator += delta_time * self.desc.emission_rate;
        let direction = emitter.rotation * self.desc.direction_vector();
        while self.emission_accumulator >= 1.0 {
            self.emission_accumulator -= 1.0;
            if self.particles.len() >= self.desc.max_particles {
                continue;
            }
            let velocity = self.random_direction(direction) * self.desc.initial_speed;
            self.particles.push(Particle {
                position: emitter.position,
                velocity,
                age: 0.0,
            });
        }
    }

    fn random_direction(&mut self, axis: Vec3) -> Vec3 {
        let spread = self.desc.spread.max(0.0);
        let theta = self.rng.gen_range(0.0..=spread);
        let phi = self.rng.gen::<f32>() * TAU;

        let helper = if axis.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        let tangent = axis.cross(&helper).normalize();
        let bitangent = axis.cross(&tangent);
        (axis * theta.cos() + (tangent * phi.cos() + bitangent * phi.sin()) * theta.sin()).normalize()
    }

    /// World-space bounds of the live particles, padded by the particle size;
    /// empty when nothing is alive
    pub fn bounds(&self) -> (AABB, BoundingSphere) {
        if self.particles.is_empty() {
            return (AABB::empty(), BoundingSphere::empty());
        }
        let bounds = AABB::from_points(self.particles.iter().map(|p| p.position)).expanded(self.desc.particle_size);
        (bounds, BoundingSphere::from_aabb(&bounds))
    }

    /// Copy the live state into a particle proxy
    pub fn sync_proxy(&self, proxy: &RenderProxy) {
        let positions = self.positions();
        let (bounds, _) = self.bounds();
        proxy.update(|state| {
            state.bounds = bounds;
            if let RenderProxyKind::Particles { positions: live, .. } = &mut state.kind {
                *live = positions;
            }
        });
    }
}

/// A world-owned particle effect with a lifetime
#[derive(Debug)]
pub struct TransientParticleEffect {
    proxy: Arc<RenderProxy>,
    simulation: ParticleSimulation,
    base_transform: Transform,
    time_remaining: f32,
    velocity: Vec3,
    mass: f32,
}

impl TransientParticleEffect {
    /// Create an effect; the caller registers the proxy with its render world
    pub fn new(
        desc: Arc<ParticleSystemDesc>,
        seed: u64,
        life_span: f32,
        base_transform: Transform,
        initial_velocity: Vec3,
        mass: f32,
    ) -> Self {
        let proxy = RenderProxy::new(RenderProxyKind::Particles {
            system: desc.name.clone(),
            positions: Vec::new(),
            size: desc.particle_size,
        });
        proxy.set_transform(&base_transform);
        Self {
            proxy,
            simulation: ParticleSimulation::new(desc, seed),
            base_transform,
            time_remaining: life_span,
            velocity: initial_velocity,
            mass,
        }
    }

    /// Render proxy drawn for this effect
    pub fn proxy(&self) -> &Arc<RenderProxy> {
        &self.proxy
    }

    /// Particle state
    pub fn simulation(&self) -> &ParticleSimulation {
        &self.simulation
    }

    /// Current placement
    pub fn transform(&self) -> &Transform {
        &self.base_transform
    }

    /// Seconds until the effect is dropped
    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Mass scaling gravity; 0 ignores gravity
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Advance one tick. Returns false when the effect has expired and must
    /// be dropped; the expiry test is `delta_time >= time_remaining`.
    pub fn update(&mut self, delta_time: f32, gravity: Vec3) -> bool {
        self.base_transform.position += self.velocity * delta_time;
        if self.mass != 0.0 {
            self.velocity += gravity * self.mass * delta_time;
        }
        if delta_time >= self.time_remaining {
            return false;
        }
        self.time_remaining -= delta_time;

        self.simulation.step(delta_time, &self.base_transform, gravity);
        self.proxy.set_transform(&self.base_transform);
        self.simulation.sync_proxy(&self.proxy);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fountain() -> Arc<ParticleSystemDesc> {
        Arc::new(ParticleSystemDesc {
            emission_rate: 10.0,
            max_particles: 4,
            particle_lifetime: 1.0,
            ..ParticleSystemDesc::named("fountain")
        })
    }

    #[test]
    fn test_emission_respects_rate_and_cap() {
        let mut simulation = ParticleSimulation::new(fountain(), 7);
        simulation.step(0.25, &Transform::identity(), Vec3::zeros());
        assert_eq!(simulation.particle_count(), 2);
        simulation.step(1.0, &Transform::identity(), Vec3::zeros());
        assert_eq!(simulation.particle_count(), 4);
    }

    #[test]
    fn test_same_seed_same_particles() {
        let mut a = ParticleSimulation::new(fountain(), 42);
        let mut b = ParticleSimulation::new(fountain(), 42);
        for _ in 0..5 {
            a.step(0.1, &Transform::identity(), Vec3::zeros());
            b.step(0.1, &Transform::identity(), Vec3::zeros());
        }
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_particles_expire_after_lifetime() {
        let mut simulation = ParticleSimulation::new(fountain(), 1);
        simulation.step(0.1, &Transform::identity(), Vec3::zeros());
        assert_eq!(simulation.particle_count(), 1);
        simulation.set_emitting(false);
        simulation.step(1.0, &Transform::identity(), Vec3::zeros());
        assert_eq!(simulation.particle_count(), 0);
        assert!(simulation.bounds().0.is_empty());
    }

    #[test]
    fn test_effect_expires_when_delta_reaches_remaining() {
        let mut effect = TransientParticleEffect::new(fountain(), 0, 1.0, Transform::identity(), Vec3::zeros(), 0.0);
        assert!(effect.update(0.5, Vec3::zeros()));
        assert_relative_eq!(effect.time_remaining(), 0.5);
        assert!(!effect.update(0.6, Vec3::zeros()));
    }

    #[test]
    fn test_effect_moves_and_falls_with_mass() {
        let gravity = Vec3::new(0.0, -10.0, 0.0);
        let mut effect = TransientParticleEffect::new(
            fountain(),
            0,
            5.0,
            Transform::identity(),
            Vec3::new(1.0, 0.0, 0.0),
            2.0,
        );
        assert!(effect.update(0.5, gravity));
        assert_relative_eq!(effect.transform().position, Vec3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(effect.velocity(), Vec3::new(1.0, -10.0, 0.0));
    }
}
