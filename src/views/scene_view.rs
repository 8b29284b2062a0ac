// src/views/scene_view.rs
//
// Turntable scene rendering. The group's solids are transformed on the CPU
// (uniform scale, spin about the vertical axis, then the fixed upright flip),
// lit with a two-sided lambert term, depth-sorted and drawn back to front as
// plain 2D triangles. Triangle counts after extrusion are small enough that
// the painter's approach comfortably outruns the display rate.

use nannou::prelude::*;
use std::cmp::Ordering;

use crate::models::MeshGroup;
use crate::views::camera::Camera;

const AMBIENT: f32 = 0.28;

/// Key light direction in world space, normalized at first use.
const LIGHT_DIR: Vec3 = nannou::glam::const_vec3!([0.35, 0.55, 0.85]);

pub fn draw_group(draw: &Draw, group: &MeshGroup, spin: f32, camera: &Camera, base: Rgb<f32>) {
    let light = LIGHT_DIR.normalize();
    let scale = group.transform.scale;
    let flip = group.transform.flip_x;

    let mut triangles: Vec<([Point2; 3], f32, Rgb<f32>)> =
        Vec::with_capacity(group.triangle_count());

    for solid in &group.solids {
        'tri: for tri in solid.indices.chunks_exact(3) {
            let mut points = [Point2::ZERO; 3];
            let mut depth_sum = 0.0;
            let mut normal_sum = Vec3::ZERO;

            for (slot, &index) in tri.iter().enumerate() {
                let world = transform_point(solid.vertices[index as usize], scale, spin, flip);
                match camera.project(world) {
                    Some((projected, depth)) => {
                        points[slot] = projected;
                        depth_sum += depth;
                    }
                    None => continue 'tri,
                }
                normal_sum += rotate_x(flip, rotate_y(spin, solid.normals[index as usize]));
            }

            let normal = normal_sum.normalize_or_zero();
            let shade = AMBIENT + (1.0 - AMBIENT) * normal.dot(light).abs();
            let color = rgb(base.red * shade, base.green * shade, base.blue * shade);
            triangles.push((points, depth_sum / 3.0, color));
        }
    }

    // painter's order, far to near
    triangles.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    for (points, _, color) in triangles {
        draw.tri()
            .points(points[0], points[1], points[2])
            .color(color);
    }
}

pub fn transform_point(v: Point3, scale: f32, spin: f32, flip: f32) -> Point3 {
    rotate_x(flip, rotate_y(spin, v * scale))
}

pub fn rotate_y(angle: f32, v: Vec3) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    vec3(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}

pub fn rotate_x(angle: f32, v: Vec3) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    vec3(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn test_quarter_turn_about_vertical_axis() {
        assert_vec3_eq(rotate_y(FRAC_PI_2, vec3(1.0, 0.0, 0.0)), vec3(0.0, 0.0, -1.0));
        assert_vec3_eq(rotate_y(FRAC_PI_2, vec3(0.0, 0.0, 1.0)), vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_upright_flip_mirrors_y_and_z() {
        assert_vec3_eq(rotate_x(PI, vec3(2.0, 3.0, 4.0)), vec3(2.0, -3.0, -4.0));
    }

    #[test]
    fn test_full_turn_is_identity() {
        let v = vec3(1.5, -2.0, 0.5);
        assert_vec3_eq(rotate_y(2.0 * PI, v), v);
    }

    #[test]
    fn test_rotation_preserves_length() {
        let v = vec3(3.0, 1.0, -2.0);
        assert_relative_eq!(rotate_y(1.234, v).length(), v.length(), epsilon = 1e-5);
    }

    #[test]
    fn test_transform_applies_scale_before_rotation() {
        let out = transform_point(pt3(1.0, 0.0, 0.0), 2.0, 0.0, 0.0);
        assert_vec3_eq(out, vec3(2.0, 0.0, 0.0));
    }
}
