//! Brushes
//!
//! A brush is static level geometry placed straight into a world with no
//! entity around it. It never moves and never updates; it only owns a render
//! proxy and, when its mesh has collision geometry, a collision object whose
//! entity id stays 0.

use crate::assets::StaticMesh;
use crate::foundation::bounds::AABB;
use crate::foundation::collections::TypedHandle;
use crate::foundation::math::Transform;
use crate::physics::{CollisionLayers, CollisionObject};
use crate::render::{RenderProxy, RenderProxyKind};
use std::sync::Arc;

/// Handle to a brush placed in a world
pub type BrushId = TypedHandle<Brush>;

/// Static geometry without an entity
#[derive(Debug)]
pub struct Brush {
    mesh: Arc<StaticMesh>,
    transform: Transform,
    bounds: AABB,
    proxy: Arc<RenderProxy>,
    collision_object: Option<Arc<CollisionObject>>,
}

impl Brush {
    /// Build a brush for a mesh at a transform
    pub fn new(mesh: Arc<StaticMesh>, transform: Transform) -> Self {
        let bounds = mesh.local_bounds().transformed(&transform);
        let proxy = RenderProxy::new(RenderProxyKind::Mesh {
            mesh: mesh.name().to_string(),
            cast_shadows: true,
        });
        proxy.set_transform(&transform);
        proxy.set_bounds(bounds);

        let collision_object = mesh.collision_shape().map(|shape| {
            let object = CollisionObject::new(shape.clone(), CollisionLayers::STATIC);
            object.set_transform(&transform);
            object
        });

        Self {
            mesh,
            transform,
            bounds,
            proxy,
            collision_object,
        }
    }

    /// Mesh resource
    pub fn mesh(&self) -> &Arc<StaticMesh> {
        &self.mesh
    }

    /// Placement
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World-space bounds
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// Render proxy
    pub fn proxy(&self) -> &Arc<RenderProxy> {
        &self.proxy
    }

    /// Collision object, when the mesh has collision geometry
    pub fn collision_object(&self) -> Option<&Arc<CollisionObject>> {
        self.collision_object.as_ref()
    }
}
