//! Bounding volumes
//!
//! World-space axis-aligned boxes and spheres used as the aggregate bounds
//! of components and entities. Both types carry two sentinels:
//!
//! - **empty**: contributes nothing to a merge (the identity of `merge`)
//! - **infinite**: absorbs everything it is merged with (e.g. a directional
//!   light that affects the whole world)

use super::math::{Transform, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-Aligned Bounding Box
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The empty box; merging with it returns the other operand unchanged
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// The infinite box
    pub fn infinite() -> Self {
        Self {
            min: Vec3::repeat(f32::NEG_INFINITY),
            max: Vec3::repeat(f32::INFINITY),
        }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points
            .into_iter()
            .fold(Self::empty(), |acc, p| Self::new(acc.min.inf(&p), acc.max.sup(&p)))
    }

    /// True when the box contains no point at all
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True when any axis is unbounded
    pub fn is_infinite(&self) -> bool {
        !self.is_empty() && (self.min.iter().any(|v| v.is_infinite()) || self.max.iter().any(|v| v.is_infinite()))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Smallest box containing both boxes
    pub fn merge(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grow the box by `amount` on every side
    pub fn expanded(&self, amount: f32) -> AABB {
        if self.is_empty() {
            return *self;
        }
        AABB {
            min: self.min - Vec3::repeat(amount),
            max: self.max + Vec3::repeat(amount),
        }
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// World-space box enclosing this local-space box under `transform`.
    ///
    /// Empty and infinite boxes map to themselves.
    pub fn transformed(&self, transform: &Transform) -> AABB {
        if self.is_empty() || self.is_infinite() {
            return *self;
        }
        AABB::from_points(self.corners().iter().map(|c| transform.transform_point(*c)))
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Check if this AABB touches a sphere
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        let closest = center.sup(&self.min).inf(&self.max);
        (closest - center).magnitude_squared() <= radius * radius
    }

    /// Test ray intersection with this AABB using slab method
    ///
    /// Returns the distance to the entry point and the index of the axis
    /// whose slab was entered last (0 = x, 1 = y, 2 = z).
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<(f32, usize)> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        let mut entry_axis = 0;

        for axis in 0..3 {
            if ray_dir[axis] == 0.0 {
                if ray_origin[axis] < self.min[axis] || ray_origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / ray_dir[axis];
            let t1 = (self.min[axis] - ray_origin[axis]) * inv;
            let t2 = (self.max[axis] - ray_origin[axis]) * inv;
            let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
            if near > tmin {
                tmin = near;
                entry_axis = axis;
            }
            tmax = tmax.min(far);
        }

        // Ray intersects if tmax >= tmin and tmax >= 0
        if tmax >= tmin && tmax >= 0.0 {
            Some((tmin.max(0.0), entry_axis))
        } else {
            None
        }
    }
}

/// A bounding sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere; negative marks the empty sphere
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// The empty sphere
    pub fn empty() -> Self {
        Self {
            center: Vec3::zeros(),
            radius: -1.0,
        }
    }

    /// The infinite sphere
    pub fn infinite() -> Self {
        Self {
            center: Vec3::zeros(),
            radius: f32::INFINITY,
        }
    }

    /// Sphere circumscribing a box
    pub fn from_aabb(aabb: &AABB) -> Self {
        if aabb.is_empty() {
            Self::empty()
        } else if aabb.is_infinite() {
            Self::infinite()
        } else {
            Self::new(aabb.center(), aabb.extents().magnitude())
        }
    }

    /// True for the empty sentinel
    pub fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    /// True for the infinite sentinel
    pub fn is_infinite(&self) -> bool {
        self.radius.is_infinite()
    }

    /// Smallest sphere enclosing both spheres
    pub fn merge(&self, other: &BoundingSphere) -> BoundingSphere {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        if self.is_infinite() || other.is_infinite() {
            return Self::infinite();
        }

        let offset = other.center - self.center;
        let distance = offset.magnitude();
        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }

        let radius = (distance + self.radius + other.radius) * 0.5;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self::new(center, radius)
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_box_is_merge_identity() {
        let b = AABB::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(AABB::empty().merge(&b), b);
        assert_eq!(b.merge(&AABB::empty()), b);
        assert!(AABB::empty().is_empty());
    }

    #[test]
    fn test_infinite_box_absorbs() {
        let b = AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        assert!(b.merge(&AABB::infinite()).is_infinite());
    }

    #[test]
    fn test_transformed_box_translates_and_scales() {
        let b = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let t = Transform::from_position(Vec3::new(5.0, 0.0, 0.0)).with_scale(Vec3::new(2.0, 1.0, 1.0));
        let moved = b.transformed(&t);
        assert_relative_eq!(moved.min, Vec3::new(3.0, -1.0, -1.0));
        assert_relative_eq!(moved.max, Vec3::new(7.0, 1.0, 1.0));
    }

    #[test]
    fn test_sphere_merge_encloses_both() {
        let a = BoundingSphere::new(Vec3::zeros(), 1.0);
        let b = BoundingSphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0);
        let merged = a.merge(&b);
        assert_relative_eq!(merged.radius, 3.0);
        assert_relative_eq!(merged.center, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(BoundingSphere::empty().merge(&a), a);
    }

    #[test]
    fn test_sphere_merge_contained() {
        let big = BoundingSphere::new(Vec3::zeros(), 10.0);
        let small = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
        assert_eq!(big.merge(&small), big);
        assert_eq!(small.merge(&big), big);
    }

    #[test]
    fn test_ray_enters_box_on_near_face() {
        let b = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let (t, axis) = b.intersect_ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(t, 4.0);
        assert_eq!(axis, 0);
        assert!(b.intersect_ray(Vec3::new(-5.0, 3.0, 0.0), Vec3::new(1.0, 0.0, 0.0)).is_none());
    }
}
