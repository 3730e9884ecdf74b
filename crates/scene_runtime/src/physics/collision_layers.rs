//! Collision layers for filtering ray casts

use bitflags::bitflags;

bitflags! {
    /// Layer membership of a collision object, and the mask a query accepts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Brushes and static meshes
        const STATIC = 1 << 0;
        /// Objects owned by movable entities
        const DYNAMIC = 1 << 1;
        /// Volumes that report hits but have no physical response
        const TRIGGER = 1 << 2;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::DYNAMIC
    }
}

impl CollisionLayers {
    /// True when an object on `self` is accepted by a query `mask`
    pub fn accepted_by(self, mask: Self) -> bool {
        self.intersects(mask)
    }
}
