//! High-level collision shape abstractions
//!
//! Shapes store their data in model space and are tested against rays by
//! carrying the ray into that space on demand.

use super::mesh::CollisionMeshTemplate;
use super::primitives::{intersect_ray_sphere, Ray};
use crate::foundation::bounds::AABB;
use crate::foundation::math::{Transform, Vec3};
use std::sync::Arc;

/// Collision shape types (stored in MODEL SPACE)
#[derive(Debug, Clone)]
pub enum CollisionShape {
    /// Sphere of the given radius around the local origin
    Sphere(f32),
    /// Box with the given half extents around the local origin
    Box(Vec3),
    /// Shared triangle mesh template
    Mesh(Arc<CollisionMeshTemplate>),
}

impl CollisionShape {
    /// Creates a spherical collision shape with given radius
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere(radius)
    }

    /// Creates a mesh collision shape from MODEL SPACE vertices and indices
    pub fn mesh_from_model(vertices: &[Vec3], indices: &[u32]) -> Self {
        Self::Mesh(Arc::new(CollisionMeshTemplate::from_vertices(vertices, indices)))
    }

    /// Bounds in model space
    pub fn local_bounds(&self) -> AABB {
        match self {
            Self::Sphere(radius) => AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(*radius)),
            Self::Box(half_extents) => AABB::from_center_extents(Vec3::zeros(), *half_extents),
            Self::Mesh(template) => template.local_bounds,
        }
    }

    /// Test a world-space ray against this shape placed at `transform`
    /// Returns (distance, hit_point, normal) in world space
    pub fn intersect_ray(&self, ray: &Ray, transform: &Transform) -> Option<(f32, Vec3, Vec3)> {
        if let Self::Sphere(radius) = self {
            return intersect_ray_sphere(ray, transform.position, radius * transform.max_scale());
        }

        // An affine map keeps the ray parameter, so `t` found in model space
        // is also the world distance along the normalized world ray.
        let inverse = transform.inverse();
        let local_ray = Ray {
            origin: inverse.transform_point(ray.origin),
            direction: inverse.transform_vector(ray.direction),
        };

        let (t, local_normal) = match self {
            Self::Box(half_extents) => {
                let bounds = AABB::from_center_extents(Vec3::zeros(), *half_extents);
                let (t, axis) = bounds.intersect_ray(local_ray.origin, local_ray.direction)?;
                let mut normal = Vec3::zeros();
                normal[axis] = -local_ray.direction[axis].signum();
                (t, normal)
            }
            Self::Mesh(template) => {
                let (t, _, normal) = template.intersect_ray(&local_ray)?;
                (t, normal)
            }
            Self::Sphere(_) => return None,
        };

        let point = ray.point_at(t);
        let normal = transform
            .rotation
            .transform_vector(&local_normal.component_div(&transform.scale))
            .try_normalize(1.0e-6)
            .unwrap_or(-ray.direction);
        Some((t, point, normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scaled_box_hit_distance_is_world_distance() {
        let shape = CollisionShape::Box(Vec3::new(1.0, 1.0, 1.0));
        let transform = Transform::from_position(Vec3::new(10.0, 0.0, 0.0)).with_scale(Vec3::new(2.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));

        let (t, point, normal) = shape.intersect_ray(&ray, &transform).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = 1.0e-4);
        assert_relative_eq!(point, Vec3::new(8.0, 0.0, 0.0), epsilon = 1.0e-4);
        assert_relative_eq!(normal, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-4);
    }

    #[test]
    fn test_sphere_scales_with_transform() {
        let shape = CollisionShape::sphere(1.0);
        let transform = Transform::from_position(Vec3::new(0.0, 0.0, 10.0)).with_scale(Vec3::repeat(3.0));
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0));
        let (t, _, _) = shape.intersect_ray(&ray, &transform).unwrap();
        assert_relative_eq!(t, 7.0, epsilon = 1.0e-4);
    }

    #[test]
    fn test_box_miss() {
        let shape = CollisionShape::Box(Vec3::repeat(0.5));
        let ray = Ray::new(Vec3::new(0.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(shape.intersect_ray(&ray, &Transform::identity()).is_none());
    }
}
