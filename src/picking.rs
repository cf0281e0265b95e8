//! Pointer picking against the current hit-test set.
//!
//! - [`Ray`] — origin plus direction, built from normalized device coordinates
//! - [`Collider`] — box, sphere or flat quad attached to an entity
//! - [`pick`] — nearest hit among a list of candidate entities
//!
//! Picking is stateless: the ray is rebuilt from the camera on every call, and
//! only entities passed in the candidate list are tested, so objects belonging
//! to an inactive stage can never be hit.

use glam::{Mat4, Vec2, Vec3, Vec4};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::transform::Transform;

/// A ray in 3D space, used for raycasting and picking.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// The starting point of the ray.
    pub origin: Vec3,
    /// The normalized direction of the ray.
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Unproject normalized device coordinates (`-1..1`, +y up) through the
    /// given view and projection matrices.
    pub fn from_ndc(ndc: Vec2, view_matrix: Mat4, projection_matrix: Mat4) -> Self {
        let near_clip = Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far_clip = Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        let inv_view_proj = (projection_matrix * view_matrix).inverse();

        let near_world = inv_view_proj * near_clip;
        let far_world = inv_view_proj * far_clip;

        // Perspective divide
        let near_point = near_world.truncate() / near_world.w;
        let far_point = far_world.truncate() / far_world.w;

        Self {
            origin: near_point,
            direction: (far_point - near_point).normalize_or_zero(),
        }
    }

    /// Picking ray for the camera's current pose.
    pub fn from_camera(camera: &Camera, aspect: f32, ndc: Vec2) -> Self {
        Self::from_ndc(ndc, camera.view_matrix(), camera.projection_matrix(aspect))
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance to an axis-aligned box, if hit.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for i in 0..3 {
            let origin = self.origin[i];
            let dir = self.direction[i];

            if dir.abs() < f32::EPSILON {
                if origin < min[i] || origin > max[i] {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir;
                let mut t1 = (min[i] - origin) * inv_dir;
                let mut t2 = (max[i] - origin) * inv_dir;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }

                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        nearest_positive(t_min, t_max)
    }

    /// Distance to a sphere, if hit.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);
        nearest_positive(t1, t2)
    }

    /// Distance to a rectangle centred at `center`, spanning `±half_size`
    /// along `axis_u` and `axis_v` (unit vectors).
    pub fn intersect_quad(
        &self,
        center: Vec3,
        axis_u: Vec3,
        axis_v: Vec3,
        half_size: Vec2,
    ) -> Option<f32> {
        let normal = axis_u.cross(axis_v);
        let denom = normal.dot(self.direction);
        if denom.abs() < f32::EPSILON {
            return None;
        }

        let t = normal.dot(center - self.origin) / denom;
        if t <= 0.0 {
            return None;
        }

        let local = self.point_at(t) - center;
        if local.dot(axis_u).abs() <= half_size.x && local.dot(axis_v).abs() <= half_size.y {
            Some(t)
        } else {
            None
        }
    }
}

fn nearest_positive(near: f32, far: f32) -> Option<f32> {
    if near > 0.0 {
        Some(near)
    } else if far > 0.0 {
        Some(far)
    } else {
        None
    }
}

/// A collision shape for picking.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Collider {
    /// Axis-aligned box defined by half-extents. Rotation is ignored.
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Flat rectangle in the entity's local XY plane, e.g. a clickable panel.
    Quad { half_size: Vec2 },
}

impl Collider {
    /// Box collider from full dimensions.
    pub fn box_collider(size: Vec3) -> Self {
        Self::Box {
            half_extents: size * 0.5,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Quad collider from full width and height.
    pub fn quad(width: f32, height: f32) -> Self {
        Self::Quad {
            half_size: Vec2::new(width, height) * 0.5,
        }
    }

    /// Distance along `ray` to this collider placed at `transform`.
    pub fn intersect(&self, ray: &Ray, transform: &Transform) -> Option<f32> {
        let scale = transform.scale;
        match self {
            Collider::Box { half_extents } => {
                let scaled_half = *half_extents * scale;
                ray.intersect_aabb(
                    transform.position - scaled_half,
                    transform.position + scaled_half,
                )
            }
            Collider::Sphere { radius } => {
                // Use the average scale for sphere radius
                let avg_scale = (scale.x + scale.y + scale.z) / 3.0;
                ray.intersect_sphere(transform.position, radius * avg_scale)
            }
            Collider::Quad { half_size } => ray.intersect_quad(
                transform.position,
                transform.rotation * Vec3::X,
                transform.rotation * Vec3::Y,
                *half_size * scale.truncate(),
            ),
        }
    }
}

/// A ray-collider intersection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    /// Distance from ray origin to the hit point.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
}

/// Test `ray` against `candidates` and return the closest hit.
///
/// Candidates without both a [`Transform`] and a [`Collider`], or that no
/// longer exist, are skipped.
pub fn raycast(world: &World, ray: &Ray, candidates: &[Entity]) -> Option<RayHit> {
    let mut best: Option<RayHit> = None;

    for &entity in candidates {
        if !world.contains(entity) {
            log::warn!("pick candidate {:?} no longer exists", entity);
            continue;
        }
        let (Ok(transform), Ok(collider)) =
            (world.get::<&Transform>(entity), world.get::<&Collider>(entity))
        else {
            continue;
        };

        if let Some(distance) = collider.intersect(ray, &transform) {
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(RayHit {
                    entity,
                    distance,
                    point: ray.point_at(distance),
                });
            }
        }
    }

    best
}

/// Nearest object under the pointer.
///
/// `ndc` is the pointer in normalized device coordinates. The ray is derived
/// from the camera's pose at call time.
pub fn pick(
    world: &World,
    camera: &Camera,
    aspect: f32,
    ndc: Vec2,
    hit_test_set: &[Entity],
) -> Option<RayHit> {
    if hit_test_set.is_empty() {
        return None;
    }
    let ray = Ray::from_camera(camera, aspect, ndc);
    raycast(world, &ray, hit_test_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new().at(0.0, 0.0, 20.0).looking_at(0.0, 0.0, 0.0)
    }

    #[test]
    fn centre_ray_points_down_the_view_axis() {
        let ray = Ray::from_camera(&camera(), 16.0 / 9.0, Vec2::ZERO);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(ray.origin.z, 19.9, epsilon = 1e-3);
    }

    #[test]
    fn sphere_hit_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(ray.intersect_sphere(Vec3::ZERO, 2.0), Some(8.0));
        assert_eq!(ray.intersect_sphere(Vec3::new(5.0, 0.0, 0.0), 2.0), None);
    }

    #[test]
    fn aabb_from_inside_returns_exit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.intersect_aabb(Vec3::splat(-1.0), Vec3::splat(1.0)), Some(1.0));
    }

    #[test]
    fn quad_respects_bounds() {
        let ray = Ray::new(Vec3::new(1.0, 1.0, 10.0), Vec3::NEG_Z);
        let panel = Transform::from_position(Vec3::ZERO);
        assert_eq!(Collider::quad(5.0, 5.0).intersect(&ray, &panel), Some(10.0));
        assert_eq!(Collider::quad(1.0, 1.0).intersect(&ray, &panel), None);

        let behind = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::NEG_Z);
        assert_eq!(Collider::quad(5.0, 5.0).intersect(&behind, &panel), None);
    }

    #[test]
    fn pick_returns_nearest_candidate() {
        let mut world = World::new();
        let far = world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
            Collider::sphere(1.0),
        ));
        let near = world.spawn((Transform::from_position(Vec3::ZERO), Collider::sphere(1.0)));

        let hit = pick(&world, &camera(), 1.0, Vec2::ZERO, &[far, near]).unwrap();
        assert_eq!(hit.entity, near);
        assert_relative_eq!(hit.point.z, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn pick_ignores_entities_outside_the_set() {
        let mut world = World::new();
        let hidden = world.spawn((Transform::new(), Collider::sphere(1.6)));
        let visible = world.spawn((
            Transform::from_position(Vec3::new(10.0, 10.0, 0.0)),
            Collider::quad(5.0, 5.0),
        ));

        assert_eq!(pick(&world, &camera(), 1.0, Vec2::ZERO, &[visible]), None);
        assert_eq!(pick(&world, &camera(), 1.0, Vec2::ZERO, &[]), None);
        assert!(pick(&world, &camera(), 1.0, Vec2::ZERO, &[hidden]).is_some());
    }

    #[test]
    fn pick_skips_despawned_and_bare_entities() {
        let mut world = World::new();
        let gone = world.spawn((Transform::new(), Collider::sphere(1.0)));
        let bare = world.spawn((Transform::new(),));
        world.despawn(gone).unwrap();

        assert_eq!(pick(&world, &camera(), 1.0, Vec2::ZERO, &[gone, bare]), None);
    }

    #[test]
    fn collider_from_json() {
        let collider: Collider =
            serde_json::from_str(r#"{ "shape": "quad", "half_size": [2.5, 2.5] }"#).unwrap();
        assert_eq!(collider, Collider::quad(5.0, 5.0));
    }
}
