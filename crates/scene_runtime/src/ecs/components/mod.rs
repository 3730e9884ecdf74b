//! Concrete component kinds

pub mod interpolator;
pub mod mesh;
pub mod particle_emitter;

pub use interpolator::{InterpolatorComponent, InterpolatorMode};
pub use mesh::MeshComponent;
pub use particle_emitter::ParticleEmitterComponent;
