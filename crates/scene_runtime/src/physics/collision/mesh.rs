//! Collision mesh representations
//!
//! Triangle meshes are stored once in model space and shared between every
//! collision object that uses them; ray tests run in that local space.

use super::primitives::{intersect_ray_sphere, Ray, Triangle};
use crate::foundation::bounds::AABB;
use crate::foundation::math::Vec3;

/// A collision mesh template stored in MODEL SPACE (local coordinates)
#[derive(Debug, Clone)]
pub struct CollisionMeshTemplate {
    /// Triangles in MODEL SPACE (local coordinates, never modified)
    pub local_triangles: Vec<Triangle>,
    /// Local bounding box
    pub local_bounds: AABB,
    /// Local bounding sphere radius around the origin
    pub local_bounding_radius: f32,
}

impl CollisionMeshTemplate {
    /// Creates a new collision mesh template from MODEL SPACE vertices and indices
    ///
    /// Trailing indices that do not form a full triangle are ignored, as are
    /// triangles referencing out-of-range vertices.
    pub fn from_vertices(vertices: &[Vec3], indices: &[u32]) -> Self {
        let local_triangles: Vec<Triangle> = indices
            .chunks_exact(3)
            .filter_map(|chunk| {
                let v0 = vertices.get(chunk[0] as usize)?;
                let v1 = vertices.get(chunk[1] as usize)?;
                let v2 = vertices.get(chunk[2] as usize)?;
                Some(Triangle::new(*v0, *v1, *v2))
            })
            .collect();

        let corners: Vec<Vec3> = local_triangles.iter().flat_map(|tri| [tri.v0, tri.v1, tri.v2]).collect();
        let local_bounds = AABB::from_points(corners.iter().copied());
        let local_bounding_radius = corners.iter().map(|v| v.magnitude()).fold(0.0f32, f32::max);

        Self {
            local_triangles,
            local_bounds,
            local_bounding_radius,
        }
    }

    /// Closest hit of a MODEL SPACE ray against every triangle
    /// Returns (t, hit_point, normal) in model space
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        intersect_ray_sphere(ray, Vec3::zeros(), self.local_bounding_radius)?;

        self.local_triangles
            .iter()
            .filter_map(|triangle| triangle.intersect_ray(ray).map(|(t, _, _)| (t, triangle)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, triangle)| {
                // Face the normal back toward the ray
                let mut normal = triangle.normal();
                if normal.dot(&ray.direction) > 0.0 {
                    normal = -normal;
                }
                (t, ray.point_at(t), normal)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> CollisionMeshTemplate {
        let vertices = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        CollisionMeshTemplate::from_vertices(&vertices, &[0, 1, 2, 0, 2, 3, 7])
    }

    #[test]
    fn test_template_bounds() {
        let mesh = quad();
        assert_eq!(mesh.local_triangles.len(), 2);
        assert_relative_eq!(mesh.local_bounds.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_relative_eq!(mesh.local_bounding_radius, 2.0f32.sqrt());
    }

    #[test]
    fn test_ray_hits_quad_facing_ray() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 4.0), Vec3::new(0.0, 0.0, -1.0));
        let (t, point, normal) = quad().intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1.0e-5);
        assert_relative_eq!(point, Vec3::new(0.5, 0.5, 0.0), epsilon = 1.0e-5);
        assert_relative_eq!(normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1.0e-5);
    }
}
