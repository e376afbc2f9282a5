use glam::{Mat4, Vec2, Vec3};

use crate::camera::Camera;
use crate::scene_graph::{ObjectId, Scene};

/// Converts a pointer position in physical pixels to normalized device
/// coordinates, x and y each in [-1, 1] with +y up.
pub fn pointer_ndc(position: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (position.x / viewport.x) * 2.0 - 1.0,
        -((position.y / viewport.y) * 2.0 - 1.0),
    )
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// World-space ray from the camera through the given NDC position:
    /// unproject the near- and far-plane points and aim from one to the other.
    pub fn from_camera(camera: &Camera, ndc: Vec2, resolution: Vec2) -> Ray {
        let inverse = camera.view_projection(resolution).inverse();

        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));

        Ray {
            origin: near,
            dir: (far - near).normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(point1: Vec3, point2: Vec3) -> Aabb {
        let min = point1.min(point2);
        let max = point1.max(point2);
        Aabb { min, max }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Bounds of this box after applying `matrix` to every corner.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners().map(|corner| matrix.transform_point3(corner));

        let mut min = corners[0];
        let mut max = corners[0];
        for corner in &corners[1..] {
            min = min.min(*corner);
            max = max.max(*corner);
        }

        Aabb { min, max }
    }

    /// Slab test. Returns the parametric distance to the entry point (0.0 when
    /// the origin is inside the box), or None when the ray misses.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = ray.dir.recip();
        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;

        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();

        if t_far >= t_near.max(0.0) {
            Some(t_near.max(0.0))
        } else {
            None
        }
    }
}

/// Nearest mesh-bearing child of `root` hit by the ray, by entry distance.
/// Callers decide what to do when the winner is the base cube.
pub fn pick_nearest(scene: &Scene, root: ObjectId, ray: &Ray) -> Option<(ObjectId, f32)> {
    let root_object = scene.get_object(root)?;

    let mut nearest: Option<(ObjectId, f32)> = None;

    for &child_id in &root_object.child_ids {
        let Some(object) = scene.get_object(child_id) else {
            continue;
        };
        let Some(mesh) = object.mesh_id.and_then(|id| scene.get_mesh(id)) else {
            continue;
        };

        let bounds = mesh
            .bounds
            .transformed(&object.transform.get_world_matrix());

        if let Some(t) = bounds.intersect_ray(ray) {
            if nearest.map_or(true, |(_, best)| t < best) {
                nearest = Some((child_id, t));
            }
        }
    }

    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    use crate::camera::Camera;

    #[test]
    fn ndc_maps_viewport_corners_and_center() {
        let viewport = Vec2::new(800.0, 600.0);
        assert_eq!(pointer_ndc(Vec2::new(400.0, 300.0), viewport), Vec2::ZERO);
        assert_eq!(
            pointer_ndc(Vec2::new(0.0, 0.0), viewport),
            Vec2::new(-1.0, 1.0)
        );
        assert_eq!(
            pointer_ndc(Vec2::new(800.0, 600.0), viewport),
            Vec2::new(1.0, -1.0)
        );
    }

    #[test]
    fn ndc_tracks_viewport_changes() {
        let position = Vec2::new(512.0, 384.0);
        assert_ne!(
            pointer_ndc(position, Vec2::new(800.0, 600.0)),
            pointer_ndc(position, Vec2::new(1024.0, 768.0))
        );
        assert_eq!(
            pointer_ndc(position, Vec2::new(1024.0, 768.0)),
            Vec2::ZERO
        );
    }

    #[test]
    fn slab_test_hits_a_box_in_front() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            dir: Vec3::NEG_Z,
        };
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));
    }

    #[test]
    fn slab_test_misses_a_box_to_the_side() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray {
            origin: Vec3::new(3.0, 0.0, 5.0),
            dir: Vec3::NEG_Z,
        };
        assert_eq!(aabb.intersect_ray(&ray), None);
    }

    #[test]
    fn slab_test_ignores_boxes_behind_the_origin() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            dir: Vec3::Z,
        };
        assert_eq!(aabb.intersect_ray(&ray), None);
    }

    #[test]
    fn slab_test_from_inside_enters_at_zero() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::X,
        };
        assert_eq!(aabb.intersect_ray(&ray), Some(0.0));
    }

    #[test]
    fn transformed_bounds_follow_translation_and_scale() {
        let aabb = Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(0.15),
            glam::Quat::IDENTITY,
            Vec3::new(0.5, -0.1, -0.3),
        );

        let world = aabb.transformed(&matrix);
        assert!((world.min - Vec3::new(0.425, -0.175, -0.375)).length() < 1e-6);
        assert!((world.max - Vec3::new(0.575, -0.025, -0.225)).length() < 1e-6);
    }

    #[test]
    fn camera_ray_through_center_points_at_the_target() {
        let camera = Camera {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 25f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        };

        let ray = Ray::from_camera(&camera, Vec2::ZERO, Vec2::new(800.0, 600.0));
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
        assert!(ray.origin.z <= 5.0);
    }
}
