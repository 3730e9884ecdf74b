//! Mesh component
//!
//! Draws a named [`StaticMesh`] at the component's world transform and, when
//! the mesh carries collision geometry, keeps a matching collision object in
//! the physics world.

use crate::assets::{ResourceError, ResourceProvider, StaticMesh};
use crate::ecs::component::{common_properties, Component, ComponentBase, ComponentError, ComponentFlags};
use crate::ecs::properties::{Property, PropertyKind, PropertyTable, PropertyValue};
use crate::foundation::bounds::AABB;
use crate::physics::{CollisionLayers, CollisionObject};
use crate::render::{RenderProxy, RenderProxyKind};
use std::any::Any;
use std::sync::Arc;

/// Component drawing a static mesh
pub struct MeshComponent {
    base: ComponentBase,
    mesh_name: String,
    mesh: Option<Arc<StaticMesh>>,
}

impl Default for MeshComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshComponent {
    /// Create a component with no mesh
    pub fn new() -> Self {
        Self {
            base: ComponentBase::new(),
            mesh_name: String::new(),
            mesh: None,
        }
    }

    /// Create a component showing the named mesh; fails without building
    /// anything if the mesh cannot be resolved
    pub fn create(resources: &dyn ResourceProvider, mesh_name: &str) -> Result<Self, ComponentError> {
        let mut component = Self::new();
        component.set_mesh_name(resources, mesh_name)?;
        Ok(component)
    }

    /// Name of the current mesh resource
    pub fn mesh_name(&self) -> &str {
        &self.mesh_name
    }

    /// Current mesh resource
    pub fn mesh(&self) -> Option<&Arc<StaticMesh>> {
        self.mesh.as_ref()
    }

    /// Resolve and show a mesh by name; an empty name clears the mesh. On
    /// failure the current mesh is kept.
    pub fn set_mesh_name(&mut self, resources: &dyn ResourceProvider, mesh_name: &str) -> Result<(), ResourceError> {
        let mesh = if mesh_name.is_empty() {
            None
        } else {
            Some(resources.require_mesh(mesh_name)?)
        };
        self.set_mesh(mesh);
        Ok(())
    }

    /// Show an already resolved mesh, replacing the proxies
    pub fn set_mesh(&mut self, mesh: Option<Arc<StaticMesh>>) {
        self.mesh_name = mesh.as_ref().map(|m| m.name().to_string()).unwrap_or_default();

        let proxy = mesh.as_ref().map(|m| {
            RenderProxy::new(RenderProxyKind::Mesh {
                mesh: m.name().to_string(),
                cast_shadows: self.cast_shadows(),
            })
        });
        let object = mesh
            .as_ref()
            .and_then(|m| m.collision_shape())
            .map(|shape| CollisionObject::new(shape.clone(), CollisionLayers::DYNAMIC));

        self.mesh = mesh;
        self.base.set_render_proxy(proxy);
        self.base.set_collision_object(object);
        self.refresh_bounds();
    }

    /// True if the mesh casts shadows
    pub fn cast_shadows(&self) -> bool {
        self.base.flags().contains(ComponentFlags::CAST_SHADOWS)
    }

    /// Turn shadow casting on or off
    pub fn set_cast_shadows(&mut self, cast_shadows: bool) {
        self.base.set_flag(ComponentFlags::CAST_SHADOWS, cast_shadows);
        if let Some(proxy) = self.base.render_proxy() {
            proxy.update(|state| {
                if let RenderProxyKind::Mesh { cast_shadows: flag, .. } = &mut state.kind {
                    *flag = cast_shadows;
                }
            });
        }
    }
}

static MESH_PROPERTIES: [Property<MeshComponent>; 7] = [
    common_properties::local_position(),
    common_properties::local_rotation(),
    common_properties::local_scale(),
    common_properties::visible(),
    common_properties::collidable(),
    Property::<MeshComponent>::new(
        "MeshName",
        PropertyKind::String,
        |c| PropertyValue::String(c.mesh_name.clone()),
        |c, value, context| Ok(c.set_mesh_name(context.resources, value.as_str()?)?),
    ),
    Property::<MeshComponent>::new(
        "CastShadows",
        PropertyKind::Bool,
        |c| PropertyValue::Bool(c.cast_shadows()),
        |c, value, _| {
            c.set_cast_shadows(value.as_bool()?);
            Ok(())
        },
    ),
];

impl PropertyTable for MeshComponent {
    fn property_table() -> &'static [Property<Self>] {
        &MESH_PROPERTIES
    }
}

impl Component for MeshComponent {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "MeshComponent"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn initialize(&mut self, resources: &dyn ResourceProvider) -> Result<(), ComponentError> {
        if self.mesh.is_none() && !self.mesh_name.is_empty() {
            let name = self.mesh_name.clone();
            self.set_mesh_name(resources, &name)?;
        }
        Ok(())
    }

    fn local_bounds(&self) -> AABB {
        self.mesh.as_ref().map_or_else(AABB::empty, |m| m.local_bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceManager;
    use crate::ecs::properties::{PropertyContext, PropertyError, Reflect};
    use crate::foundation::math::Vec3;
    use crate::physics::CollisionShape;
    use approx::assert_relative_eq;

    fn resources() -> ResourceManager {
        let mut resources = ResourceManager::new();
        resources.register_mesh(StaticMesh::cube("crate", 1.0)).unwrap();
        resources
            .register_mesh(StaticMesh::cube("ghost", 2.0).with_collision(None))
            .unwrap();
        resources
            .register_mesh(StaticMesh::cube("ball", 0.5).with_collision(Some(CollisionShape::sphere(0.5))))
            .unwrap();
        resources
    }

    #[test]
    fn test_create_missing_mesh_fails() {
        let resources = resources();
        let result = MeshComponent::create(&resources, "nope");
        assert!(matches!(
            result,
            Err(ComponentError::Resource(ResourceError::MeshNotFound(ref name))) if name == "nope"
        ));
    }

    #[test]
    fn test_create_builds_proxy_and_bounds() {
        let resources = resources();
        let mut component = MeshComponent::create(&resources, "crate").unwrap();
        assert!(component.base().render_proxy().is_some());
        assert!(component.base().collision_object().is_some());
        assert_relative_eq!(component.base().bounding_box().max, Vec3::new(1.0, 1.0, 1.0));

        component.set_local_scale(Vec3::repeat(3.0));
        assert_relative_eq!(component.base().bounding_box().max, Vec3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn test_mesh_without_collision_has_no_object() {
        let resources = resources();
        let component = MeshComponent::create(&resources, "ghost").unwrap();
        assert!(component.base().collision_object().is_none());
    }

    #[test]
    fn test_failed_rename_keeps_current_mesh() {
        let resources = resources();
        let context = PropertyContext::new(&resources);
        let mut component = MeshComponent::create(&resources, "crate").unwrap();
        let proxy_id = component.base().render_proxy().unwrap().id();

        let err = component
            .set_property("MeshName", &PropertyValue::String("missing".into()), &context)
            .unwrap_err();
        assert_eq!(err, PropertyError::Resource(ResourceError::MeshNotFound("missing".into())));
        assert_eq!(component.mesh_name(), "crate");
        assert_eq!(component.base().render_proxy().unwrap().id(), proxy_id);

        component
            .set_property("MeshName", &PropertyValue::String("ball".into()), &context)
            .unwrap();
        assert_eq!(component.mesh_name(), "ball");
        assert_relative_eq!(component.base().bounding_box().max, Vec3::repeat(0.5));
    }

    #[test]
    fn test_cast_shadows_reaches_proxy() {
        let resources = resources();
        let mut component = MeshComponent::create(&resources, "crate").unwrap();
        component.set_cast_shadows(false);
        let kind = component.base().render_proxy().unwrap().kind();
        assert_eq!(
            kind,
            RenderProxyKind::Mesh {
                mesh: "crate".into(),
                cast_shadows: false
            }
        );
        assert_eq!(component.get_property("CastShadows").unwrap(), PropertyValue::Bool(false));
    }
}
