//! Static mesh entity
//!
//! Places a mesh directly on an entity, without a component. The entity's
//! own bounds are the mesh box under the entity transform. It defaults to
//! [`Mobility::Static`], so once placed it never moves.

use crate::assets::{ResourceError, ResourceProvider, StaticMesh};
use crate::ecs::entity::{Entity, EntityBehavior, Mobility};
use crate::ecs::properties::{Property, PropertyError, PropertyKind, PropertyValue};
use crate::foundation::bounds::{BoundingSphere, AABB};
use crate::physics::{CollisionLayers, CollisionObject};
use crate::render::{RenderProxy, RenderProxyKind};
use crate::world::WorldLink;
use std::any::Any;
use std::sync::Arc;

/// Entity behavior for a placed static mesh
#[derive(Debug, Default)]
pub struct StaticMeshEntity {
    mesh: Option<Arc<StaticMesh>>,
    cast_shadows: bool,
    proxy: Option<Arc<RenderProxy>>,
    collision_object: Option<Arc<CollisionObject>>,
}

impl StaticMeshEntity {
    /// Build a detached static entity showing the named mesh; fails without
    /// building anything if the mesh cannot be resolved
    pub fn create(resources: &dyn ResourceProvider, mesh_name: &str) -> Result<Entity, ResourceError> {
        Self::create_with_mobility(resources, mesh_name, Mobility::Static)
    }

    /// Same as [`Self::create`] with an explicit mobility
    pub fn create_with_mobility(
        resources: &dyn ResourceProvider,
        mesh_name: &str,
        mobility: Mobility,
    ) -> Result<Entity, ResourceError> {
        let mesh = resources.require_mesh(mesh_name)?;
        let behavior = Self {
            cast_shadows: true,
            ..Self::default()
        };
        let mut entity = Entity::with_behavior(mobility, Box::new(behavior));
        entity.with_behavior_mut::<Self, _>(|this, entity| this.install(entity, Some(mesh)));
        Ok(entity)
    }

    /// Current mesh
    pub fn mesh(&self) -> Option<&Arc<StaticMesh>> {
        self.mesh.as_ref()
    }

    /// Name of the current mesh, empty when none
    pub fn mesh_name(&self) -> &str {
        self.mesh.as_ref().map_or("", |m| m.name())
    }

    /// Render proxy, when a mesh is set
    pub fn proxy(&self) -> Option<&Arc<RenderProxy>> {
        self.proxy.as_ref()
    }

    /// Collision object, when the mesh has collision geometry
    pub fn collision_object(&self) -> Option<&Arc<CollisionObject>> {
        self.collision_object.as_ref()
    }

    /// Resolve and show a mesh by name on a static mesh entity; an empty name
    /// clears it. On failure the current mesh is kept.
    pub fn set_mesh_name(
        entity: &mut Entity,
        resources: &dyn ResourceProvider,
        mesh_name: &str,
    ) -> Result<(), PropertyError> {
        let mesh = if mesh_name.is_empty() {
            None
        } else {
            Some(resources.require_mesh(mesh_name)?)
        };
        entity
            .with_behavior_mut::<Self, _>(|this, entity| this.install(entity, mesh))
            .ok_or_else(not_a_static_mesh)
    }

    /// Turn shadow casting on or off on a static mesh entity
    pub fn set_cast_shadows(entity: &mut Entity, cast_shadows: bool) -> Result<(), PropertyError> {
        entity
            .with_behavior_mut::<Self, _>(|this, _| {
                this.cast_shadows = cast_shadows;
                if let Some(proxy) = &this.proxy {
                    proxy.update(|state| {
                        if let RenderProxyKind::Mesh { cast_shadows: flag, .. } = &mut state.kind {
                            *flag = cast_shadows;
                        }
                    });
                }
            })
            .ok_or_else(not_a_static_mesh)
    }

    fn install(&mut self, entity: &mut Entity, mesh: Option<Arc<StaticMesh>>) {
        if let Some(world) = entity.world() {
            self.unregister(world);
        }
        let layers = if entity.mobility() == Mobility::Static {
            CollisionLayers::STATIC
        } else {
            CollisionLayers::DYNAMIC
        };
        self.proxy = mesh.as_ref().map(|m| {
            RenderProxy::new(RenderProxyKind::Mesh {
                mesh: m.name().to_string(),
                cast_shadows: self.cast_shadows,
            })
        });
        self.collision_object = mesh
            .as_ref()
            .and_then(|m| m.collision_shape())
            .map(|shape| CollisionObject::new(shape.clone(), layers));
        self.mesh = mesh;

        self.sync(entity);
        if let Some(world) = entity.world() {
            self.register(world, entity.id().get());
        }
    }

    fn register(&self, world: &WorldLink, entity_id: u32) {
        if let Some(proxy) = &self.proxy {
            proxy.set_entity_id(entity_id);
            world.add_renderable(Arc::clone(proxy));
        }
        if let Some(object) = &self.collision_object {
            object.set_entity_id(entity_id);
            world.add_collision_object(Arc::clone(object));
        }
    }

    fn unregister(&self, world: &WorldLink) {
        if let Some(proxy) = &self.proxy {
            world.remove_renderable(proxy);
            proxy.set_entity_id(0);
        }
        if let Some(object) = &self.collision_object {
            world.remove_collision_object(object);
            object.set_entity_id(0);
        }
    }

    fn sync(&self, entity: &mut Entity) {
        let bounds = self
            .mesh
            .as_ref()
            .map_or_else(AABB::empty, |m| m.local_bounds().transformed(entity.transform()));
        if let Some(proxy) = &self.proxy {
            proxy.set_transform(entity.transform());
            proxy.set_bounds(bounds);
        }
        if let Some(object) = &self.collision_object {
            object.set_transform(entity.transform());
        }
        entity.set_bounds(bounds, BoundingSphere::from_aabb(&bounds), true);
    }
}

fn not_a_static_mesh() -> PropertyError {
    PropertyError::Rejected("entity is not a static mesh".to_string())
}

impl EntityBehavior for StaticMeshEntity {
    fn type_name(&self) -> &'static str {
        "StaticMeshEntity"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn properties(&self) -> &'static [Property<Entity>] {
        &STATIC_MESH_PROPERTIES
    }

    fn on_add_to_world(&mut self, entity: &mut Entity, world: &WorldLink) {
        self.register(world, entity.id().get());
    }

    fn on_remove_from_world(&mut self, _entity: &mut Entity, world: &WorldLink) {
        self.unregister(world);
    }

    fn on_transform_change(&mut self, entity: &mut Entity) {
        self.sync(entity);
    }
}

static STATIC_MESH_PROPERTIES: [Property<Entity>; 2] = [
    Property::<Entity>::new(
        "MeshName",
        PropertyKind::String,
        |e| {
            PropertyValue::String(
                e.behavior::<StaticMeshEntity>()
                    .map_or_else(String::new, |this| this.mesh_name().to_string()),
            )
        },
        |e, value, context| StaticMeshEntity::set_mesh_name(e, context.resources, value.as_str()?),
    ),
    Property::<Entity>::new(
        "CastShadows",
        PropertyKind::Bool,
        |e| PropertyValue::Bool(e.behavior::<StaticMeshEntity>().is_some_and(|this| this.cast_shadows)),
        |e, value, _| StaticMeshEntity::set_cast_shadows(e, value.as_bool()?),
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;
    use crate::ecs::properties::PropertyContext;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn resources() -> ResourceManager {
        let mut resources = ResourceManager::new();
        resources.register_mesh(StaticMesh::cube("rock", 1.0)).unwrap();
        resources.register_mesh(StaticMesh::cube("boulder", 3.0)).unwrap();
        resources
    }

    #[test]
    fn test_create_defaults_to_static() {
        let resources = resources();
        let entity = StaticMeshEntity::create(&resources, "rock").unwrap();
        assert_eq!(entity.mobility(), Mobility::Static);
        assert_eq!(entity.type_name(), "StaticMeshEntity");
        assert_relative_eq!(entity.bounding_box().max, Vec3::repeat(1.0));
        let behavior = entity.behavior::<StaticMeshEntity>().unwrap();
        assert_eq!(behavior.collision_object().unwrap().layers(), CollisionLayers::STATIC);
    }

    #[test]
    fn test_create_missing_mesh_fails() {
        let resources = resources();
        assert_eq!(
            StaticMeshEntity::create(&resources, "pebble").unwrap_err(),
            ResourceError::MeshNotFound("pebble".into())
        );
    }

    #[test]
    fn test_detached_static_entity_moves_bounds() {
        let resources = resources();
        let mut entity = StaticMeshEntity::create(&resources, "rock").unwrap();
        assert!(entity.set_position(Vec3::new(0.0, 5.0, 0.0)));
        assert_relative_eq!(entity.bounding_box().center(), Vec3::new(0.0, 5.0, 0.0));
        let proxy = entity.behavior::<StaticMeshEntity>().unwrap().proxy().unwrap();
        assert_eq!(proxy.bounds(), entity.bounding_box());
    }

    #[test]
    fn test_mesh_name_property_swaps_mesh() {
        let resources = resources();
        let context = PropertyContext::new(&resources);
        let mut entity = StaticMeshEntity::create(&resources, "rock").unwrap();
        entity
            .set_property("MeshName", &PropertyValue::String("boulder".into()), &context)
            .unwrap();
        assert_relative_eq!(entity.bounding_box().max, Vec3::repeat(3.0));
        assert!(entity
            .set_property("MeshName", &PropertyValue::String("pebble".into()), &context)
            .is_err());
        assert_eq!(entity.get_property("MeshName").unwrap(), PropertyValue::String("boulder".into()));
    }
}
