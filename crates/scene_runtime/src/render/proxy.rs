//! Render proxies
//!
//! A proxy is the render world's view of one visual thing. It is shared
//! (`Arc`) between the component that owns it and the render world that
//! draws it, so its mutable state sits behind a lock.

use super::lighting::LightParams;
use crate::foundation::bounds::AABB;
use crate::foundation::math::{Mat4, Transform, Vec3};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

static NEXT_PROXY_ID: AtomicU64 = AtomicU64::new(1);

/// What a proxy draws
#[derive(Debug, Clone, PartialEq)]
pub enum RenderProxyKind {
    /// A static mesh
    Mesh {
        /// Mesh resource name
        mesh: String,
        /// Whether the mesh casts shadows
        cast_shadows: bool,
    },
    /// A light source
    Light(LightParams),
    /// A particle system
    Particles {
        /// Particle system resource name
        system: String,
        /// Live particle positions in world space
        positions: Vec<Vec3>,
        /// Particle render size
        size: f32,
    },
}

/// Mutable proxy state
#[derive(Debug, Clone)]
pub struct RenderProxyState {
    /// World matrix
    pub transform: Mat4,
    /// World-space bounds
    pub bounds: AABB,
    /// Drawn only when true
    pub visible: bool,
    /// Owning entity id, 0 for none
    pub entity_id: u32,
    /// Payload
    pub kind: RenderProxyKind,
}

/// Shared handle to a renderable
#[derive(Debug)]
pub struct RenderProxy {
    id: u64,
    state: RwLock<RenderProxyState>,
}

impl RenderProxy {
    /// Create a visible proxy at the identity transform
    pub fn new(kind: RenderProxyKind) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_PROXY_ID.fetch_add(1, Ordering::Relaxed),
            state: RwLock::new(RenderProxyState {
                transform: Mat4::identity(),
                bounds: AABB::empty(),
                visible: true,
                entity_id: 0,
                kind,
            }),
        })
    }

    /// Process-unique proxy id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read the current state
    pub fn state(&self) -> RwLockReadGuard<'_, RenderProxyState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the state
    pub fn update<R>(&self, f: impl FnOnce(&mut RenderProxyState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Place the proxy
    pub fn set_transform(&self, transform: &Transform) {
        let matrix = transform.to_matrix();
        self.update(|state| state.transform = matrix);
    }

    /// World matrix
    pub fn transform(&self) -> Mat4 {
        self.state().transform
    }

    /// Set world-space bounds
    pub fn set_bounds(&self, bounds: AABB) {
        self.update(|state| state.bounds = bounds);
    }

    /// World-space bounds
    pub fn bounds(&self) -> AABB {
        self.state().bounds
    }

    /// Show or hide
    pub fn set_visible(&self, visible: bool) {
        self.update(|state| state.visible = visible);
    }

    /// Visibility flag
    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    /// Set or clear (0) the owning entity id
    pub fn set_entity_id(&self, entity_id: u32) {
        self.update(|state| state.entity_id = entity_id);
    }

    /// Owning entity id
    pub fn entity_id(&self) -> u32 {
        self.state().entity_id
    }

    /// Copy of the payload
    pub fn kind(&self) -> RenderProxyKind {
        self.state().kind.clone()
    }
}
