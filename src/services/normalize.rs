// src/services/normalize.rs
//
// Post-build normalization: center the freshly extruded solids by baking a
// translation into their vertices, then express size and orientation as
// transform state. Keeping scale and flip out of the vertex data means view
// parameter changes never have to touch geometry.

use nannou::prelude::*;

use crate::models::{GroupTransform, SolidMesh};

/// Largest dimension of a normalized group, in scene units. The camera's
/// framing distance is derived from the same constant.
pub const REFERENCE_SIZE: f32 = 50.0;

/// Center the solids about the origin in place and return the transform that
/// scales the group to REFERENCE_SIZE and flips it upright.
pub fn normalize_solids(solids: &mut [SolidMesh]) -> GroupTransform {
    let mut union: Option<(Point3, Point3)> = None;
    for solid in solids.iter() {
        if let Some((min, max)) = solid.bounds() {
            union = Some(match union {
                Some((umin, umax)) => (umin.min(min), umax.max(max)),
                None => (min, max),
            });
        }
    }
    let (min, max) = match union {
        Some(bounds) => bounds,
        None => return GroupTransform::default(),
    };

    let center = (min + max) * 0.5;
    for solid in solids.iter_mut() {
        solid.translate(-center);
    }

    let extent = max - min;
    let largest = extent.x.max(extent.y).max(extent.z);
    let scale = if largest > 1e-6 {
        REFERENCE_SIZE / largest
    } else {
        1.0
    };

    GroupTransform {
        scale,
        ..GroupTransform::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn block(min: Point3, max: Point3) -> SolidMesh {
        let mut mesh = SolidMesh::new();
        mesh.add_vertex(min, Vec3::Z);
        mesh.add_vertex(pt3(max.x, min.y, min.z), Vec3::Z);
        mesh.add_vertex(max, Vec3::Z);
        mesh.add_triangle(0, 1, 2);
        mesh
    }

    #[test]
    fn test_centering_is_baked() {
        let mut solids = vec![block(pt3(10.0, 20.0, -5.0), pt3(30.0, 60.0, 5.0))];
        normalize_solids(&mut solids);
        let (min, max) = solids[0].bounds().unwrap();
        let center = (min + max) * 0.5;
        assert_relative_eq!(center.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(center.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_scale_targets_reference_size() {
        let mut solids = vec![block(pt3(0.0, 0.0, 0.0), pt3(200.0, 100.0, 10.0))];
        let transform = normalize_solids(&mut solids);
        let (min, max) = solids[0].bounds().unwrap();
        let largest = (max - min).x.max((max - min).y).max((max - min).z);
        assert_relative_eq!(largest * transform.scale, REFERENCE_SIZE, epsilon = 1e-3);
    }

    #[test]
    fn test_flip_is_transform_state_only() {
        let original = block(pt3(0.0, 0.0, 0.0), pt3(10.0, 10.0, 10.0));
        let mut solids = vec![original.clone()];
        let transform = normalize_solids(&mut solids);
        assert_relative_eq!(transform.flip_x, PI);
        // vertices are only translated, never mirrored
        let (min, max) = solids[0].bounds().unwrap();
        assert_relative_eq!(max.y - min.y, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_degenerate_extent_keeps_unit_scale() {
        let mut point = SolidMesh::new();
        point.add_vertex(pt3(3.0, 3.0, 3.0), Vec3::Z);
        let mut solids = vec![point];
        let transform = normalize_solids(&mut solids);
        assert_relative_eq!(transform.scale, 1.0);
    }

    #[test]
    fn test_empty_group_is_identity() {
        let mut solids: Vec<SolidMesh> = Vec::new();
        let transform = normalize_solids(&mut solids);
        assert_relative_eq!(transform.scale, 1.0);
    }

    #[test]
    fn test_idempotent_after_normalization() {
        let mut solids = vec![block(pt3(5.0, 5.0, 5.0), pt3(25.0, 15.0, 10.0))];
        normalize_solids(&mut solids);
        let first = solids[0].bounds().unwrap();
        let again = normalize_solids(&mut solids);
        let second = solids[0].bounds().unwrap();
        assert_relative_eq!(first.0.x, second.0.x, epsilon = 1e-4);
        assert_relative_eq!(first.1.y, second.1.y, epsilon = 1e-4);
        assert!(again.scale.is_finite());
    }
}
