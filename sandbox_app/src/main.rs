//! Crate yard demo
//!
//! Runs a headless world for a few seconds: static crates on the floor, a
//! swinging lamp, a smoking chimney and crates dropped from the sky that
//! burst into sparks and remove themselves when they land.

use rand::prelude::*;
use scene_runtime::config::Config;
use scene_runtime::foundation::logging;
use scene_runtime::prelude::*;
use std::rc::Rc;
use std::sync::Arc;

const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAME_COUNT: usize = 300;
const DROP_EVERY: usize = 20;
const FLOOR_HEIGHT: f32 = 0.0;

/// A crate falling under gravity until it reaches the floor
struct FallingCrate {
    velocity: Vec3,
    sparks: Arc<ParticleSystemDesc>,
}

impl EntityBehavior for FallingCrate {
    fn type_name(&self) -> &'static str {
        "FallingCrate"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn update(&mut self, entity: &mut Entity, delta_time: f32) {
        let gravity = entity.world().map_or(Vec3::zeros(), |world| world.gravity());
        self.velocity += gravity * delta_time;
        let position = entity.position() + self.velocity * delta_time;
        entity.set_position(position);

        if position.y <= FLOOR_HEIGHT && entity.queue_remove_from_world() {
            log::info!("{} landed at ({:.1}, {:.1})", entity.name(), position.x, position.z);
        }
    }
}

fn load_config() -> Result<WorldConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(WorldConfig::load_from_file(&path)?),
        None => Ok(WorldConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_filter(&config.log_level);

    log::info!("Starting crate yard demo");

    let mut resources = ResourceManager::new();
    resources.register_mesh(StaticMesh::cube("crate", 0.5))?;
    resources.register_mesh(StaticMesh::cube("floor", 1.0))?;
    let sparks = resources.register_particle_system(ParticleSystemDesc {
        emission_rate: 60.0,
        max_particles: 32,
        particle_lifetime: 0.4,
        initial_speed: 4.0,
        spread: 1.2,
        ..ParticleSystemDesc::named("sparks")
    })?;
    resources.register_particle_system(ParticleSystemDesc {
        emission_rate: 12.0,
        particle_lifetime: 2.5,
        initial_speed: 0.8,
        spread: 0.2,
        ..ParticleSystemDesc::named("smoke")
    })?;

    let mut world = DynamicWorld::headless(config)?;
    let mut rng = rand::thread_rng();

    // Floor and a ring of static crates
    world.add_brush(
        Arc::new(StaticMesh::cube("floor", 1.0)),
        Transform::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::new(20.0, 1.0, 20.0)),
    );
    for i in 0..8 {
        let angle = i as f32 * std::f32::consts::TAU / 8.0;
        let mut entity = StaticMeshEntity::create(&resources, "crate")?;
        entity.set_name(format!("stack-{i}"));
        entity.set_position(Vec3::new(angle.cos() * 6.0, 0.5, angle.sin() * 6.0));
        world.add_entity(entity.into_ref());
    }

    // Sun and a swinging lamp
    world.add_entity(LightEntity::create(LightParams::directional(Vec3::new(1.0, 0.95, 0.8), 0.6), Mobility::Global).into_ref());
    let mut lamp = LightEntity::create(LightParams::point(Vec3::new(1.0, 0.6, 0.3), 2.0, 8.0), Mobility::Movable);
    lamp.set_name("lamp");
    lamp.set_position(Vec3::new(-3.0, 4.0, 0.0));
    let swing = lamp.add_component(Box::new(
        InterpolatorComponent::new(1.5)
            .with_mode(InterpolatorMode::PingPong)
            .with_pause_time(0.25)
            .with_offset(Vec3::new(6.0, 0.0, 0.0), Quat::identity(), Vec3::repeat(1.0)),
    ));
    if let Some(mut interpolator) = lamp.component_mut::<InterpolatorComponent>(swing) {
        interpolator.set_active(true);
    }
    let lamp = lamp.into_ref();
    world.add_entity(Rc::clone(&lamp));

    // Chimney
    let mut chimney = Entity::new(Mobility::Movable);
    chimney.set_name("chimney");
    chimney.set_position(Vec3::new(0.0, 3.0, -4.0));
    chimney.add_component(Box::new(ParticleEmitterComponent::create(&resources, "smoke")?));
    world.add_entity(chimney.into_ref());

    world.add_observer(ObserverKey(1), Vec3::new(0.0, 2.0, 10.0));

    let mut dropped = 0;
    let mut landed = 0;
    for frame in 0..FRAME_COUNT {
        if frame % DROP_EVERY == 0 {
            let mut falling = Entity::with_behavior(
                Mobility::Movable,
                Box::new(FallingCrate {
                    velocity: Vec3::zeros(),
                    sparks: Arc::clone(&sparks),
                }),
            );
            falling.set_name(format!("falling-{dropped}"));
            falling.set_position(Vec3::new(rng.gen_range(-4.0..4.0), rng.gen_range(6.0..10.0), rng.gen_range(-4.0..4.0)));
            falling.add_component(Box::new(MeshComponent::create(&resources, "crate")?));
            falling.register_for_updates(0.0);
            world.add_entity(falling.into_ref());
            dropped += 1;
        }

        world.begin_frame(FRAME_TIME);
        world.update_async(FRAME_TIME);
        world.update(FRAME_TIME);

        // Sparks where the landed crates were, before they leave the world
        let pending: Vec<_> = (0..world.link().pending_removals())
            .filter_map(|_| world.link().pop_removal())
            .collect();
        for id in &pending {
            if let Some(entity) = world.get_entity_by_id(*id) {
                let position = entity.borrow().position();
                let desc = entity
                    .borrow()
                    .behavior::<FallingCrate>()
                    .map(|b| Arc::clone(&b.sparks));
                if let Some(desc) = desc {
                    world.spawn_particle_emitter(desc, 0.6, position, Quat::identity(), Vec3::repeat(1.0), Vec3::new(0.0, 1.0, 0.0), 0.5);
                }
            }
            world.queue_remove_entity(*id);
        }
        landed += world.end_frame();

        if frame % 60 == 0 {
            let ray = Ray::new(lamp.borrow().position(), Vec3::new(0.0, -1.0, 0.0));
            match world.ray_cast(&ray, 50.0, CollisionLayers::all()) {
                Some(hit) => match hit.entity {
                    Some(entity) => log::info!("Lamp shines on {} at {:.2}m", entity.borrow().name(), hit.distance),
                    None => log::info!("Lamp shines on the floor at {:.2}m", hit.distance),
                },
                None => log::info!("Lamp shines into the void"),
            }
            let stats = world.stats();
            log::info!(
                "t={:.1}s entities={} effects={} renderables={} updates(sync={}, async={}) {:.3}ms",
                world.game_time(),
                world.entity_count(),
                world.transient_effect_count(),
                world.render_world().renderable_count(),
                stats.sync_updates,
                stats.async_updates,
                stats.update_time_ms
            );
        }
    }

    log::info!("Dropped {} crates, {} landed", dropped, landed);
    Ok(())
}
