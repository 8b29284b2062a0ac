// src/services/extrude.rs
//
// Solid mesh construction: sweep one planar shape along the Z axis into a
// triangulated volume. Caps are earcut triangulations, side walls are flat
// quads with analytic edge normals, and an optional bevel rounds the rim
// where each cap meets the walls. The extrusion is symmetric about z = 0 so
// depth changes never move the solid off-center.

use nannou::prelude::*;
use std::f32::consts::FRAC_PI_2;

use crate::config::BevelConfig;
use crate::models::shape::triangulate_rings;
use crate::models::{CapTriangulation, PlanarShape, QualityTier, SolidMesh};

#[derive(Debug, Clone)]
pub struct ExtrusionConfig {
    pub depth: f32,
    /// Longitudinal slices along the depth axis.
    pub cap_subdivision: u32,
    pub bevel: BevelConfig,
}

impl ExtrusionConfig {
    pub fn new(depth: f32, quality: QualityTier, bevel: &BevelConfig) -> Self {
        let mut bevel = bevel.clone();
        bevel.segments = quality.bevel_segments();
        Self {
            depth,
            cap_subdivision: quality.cap_subdivision(),
            bevel,
        }
    }
}

/// Extrude one shape. Returns None for non-positive depth or when the shape
/// collapses to zero triangles; callers drop such shapes from the group.
pub fn build_solid(shape: &PlanarShape, config: &ExtrusionConfig) -> Option<SolidMesh> {
    if config.depth <= 0.0 {
        return None;
    }
    let half = config.depth * 0.5;
    let bevel = active_bevel(&config.bevel);

    // Cap rims sit at the far end of the bevel, pulled into the material by
    // its size, so the rounded rows meet them exactly.
    let (cap_outer, cap_holes, cap_z) = match bevel {
        Some((thickness, size, _)) => {
            let outer = inset_ring(shape.outer(), size);
            let holes: Vec<Vec<Point2>> =
                shape.holes().iter().map(|h| inset_ring(h, size)).collect();
            (outer, holes, half + thickness)
        }
        None => (shape.outer().to_vec(), shape.holes().to_vec(), half),
    };
    let cap = triangulate_rings(&cap_outer, &cap_holes)?;

    let wall_points = shape.boundary_point_count();
    let mut mesh = SolidMesh::with_capacity(
        cap.points.len() * 2 + wall_points * 4 * config.cap_subdivision as usize,
        cap.indices.len() * 2 + wall_points * 6 * config.cap_subdivision as usize,
    );

    add_cap(&mut mesh, &cap, -cap_z, -Vec3::Z);
    add_cap(&mut mesh, &cap, cap_z, Vec3::Z);

    let rings = std::iter::once(shape.outer()).chain(shape.holes().iter().map(|h| h.as_slice()));
    for ring in rings.clone() {
        add_walls(&mut mesh, ring, half, config.cap_subdivision.max(1));
    }

    if let Some((thickness, size, segments)) = bevel {
        for ring in rings {
            add_bevel(&mut mesh, ring, half, thickness, size, segments, 1.0);
            add_bevel(&mut mesh, ring, half, thickness, size, segments, -1.0);
        }
    }

    if mesh.is_empty() {
        None
    } else {
        Some(mesh)
    }
}

fn active_bevel(bevel: &BevelConfig) -> Option<(f32, f32, u32)> {
    if bevel.enabled && bevel.thickness > 0.0 && bevel.size >= 0.0 && bevel.segments >= 1 {
        Some((bevel.thickness, bevel.size, bevel.segments))
    } else {
        None
    }
}

fn add_cap(mesh: &mut SolidMesh, cap: &CapTriangulation, z: f32, normal: Vec3) {
    let base = mesh.vertex_count() as u32;
    for p in &cap.points {
        mesh.add_vertex(pt3(p.x, p.y, z), normal);
    }
    for tri in cap.indices.chunks_exact(3) {
        if z < 0.0 {
            // reversed winding for the bottom cap
            mesh.add_triangle(base + tri[0], base + tri[2], base + tri[1]);
        } else {
            mesh.add_triangle(base + tri[0], base + tri[1], base + tri[2]);
        }
    }
}

/// Quad strip walls between -half and +half, split into `slices` rows.
/// With outer rings counter-clockwise and holes clockwise, the outward
/// normal of edge e is (e.y, -e.x) for both ring kinds.
fn add_walls(mesh: &mut SolidMesh, ring: &[Point2], half: f32, slices: u32) {
    let dz = (half * 2.0) / slices as f32;
    for slice in 0..slices {
        let z0 = -half + slice as f32 * dz;
        let z1 = z0 + dz;
        for i in 0..ring.len() {
            let p0 = ring[i];
            let p1 = ring[(i + 1) % ring.len()];
            let edge = p1 - p0;
            let len = edge.length();
            if len < 1e-6 {
                continue;
            }
            let normal = vec3(edge.y / len, -edge.x / len, 0.0);

            let base = mesh.vertex_count() as u32;
            mesh.add_vertex(pt3(p0.x, p0.y, z0), normal);
            mesh.add_vertex(pt3(p1.x, p1.y, z0), normal);
            mesh.add_vertex(pt3(p1.x, p1.y, z1), normal);
            mesh.add_vertex(pt3(p0.x, p0.y, z1), normal);
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base, base + 2, base + 3);
        }
    }
}

/// Rounded rim between the wall edge at ±half and the inset cap rim at
/// ±(half + thickness), following a quarter-circle profile.
fn add_bevel(
    mesh: &mut SolidMesh,
    ring: &[Point2],
    half: f32,
    thickness: f32,
    size: f32,
    segments: u32,
    sign: f32,
) {
    let n = ring.len();
    let miters = miter_directions(ring);
    let base = mesh.vertex_count() as u32;

    for row in 0..=segments {
        let t = row as f32 / segments as f32;
        let inset = size * (1.0 - (t * FRAC_PI_2).cos());
        let z = sign * (half + thickness * (t * FRAC_PI_2).sin());
        for i in 0..n {
            let p = ring[i] + miters[i] * inset;
            // wall normal tilting over into the cap normal
            let wall = vec3(-miters[i].x, -miters[i].y, 0.0);
            let normal = (wall * (t * FRAC_PI_2).cos()
                + vec3(0.0, 0.0, sign) * (t * FRAC_PI_2).sin())
            .normalize_or_zero();
            mesh.add_vertex(pt3(p.x, p.y, z), normal);
        }
    }

    for row in 0..segments {
        for i in 0..n {
            let j = (i + 1) % n;
            let a = base + row * n as u32 + i as u32;
            let b = base + row * n as u32 + j as u32;
            let c = base + (row + 1) * n as u32 + j as u32;
            let d = base + (row + 1) * n as u32 + i as u32;
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(a, c, d);
        }
    }
}

/// Per-vertex material-ward offset directions with a clamped miter, shared
/// by the bevel rows and the inset cap rim so they stay welded.
fn miter_directions(ring: &[Point2]) -> Vec<Vec2> {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            let e0 = (ring[i] - prev).normalize_or_zero();
            let e1 = (next - ring[i]).normalize_or_zero();
            // interior lies to the left of each edge
            let n0 = vec2(-e0.y, e0.x);
            let n1 = vec2(-e1.y, e1.x);
            let sum = n0 + n1;
            if sum.length() < 1e-4 {
                return n1;
            }
            let unit = sum.normalize();
            let scale = (1.0 / unit.dot(n1).max(0.35)).min(3.0);
            unit * scale
        })
        .collect()
}

fn inset_ring(ring: &[Point2], distance: f32) -> Vec<Point2> {
    let miters = miter_directions(ring);
    ring.iter()
        .zip(miters.iter())
        .map(|(p, m)| *p + *m * distance)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanarShape;
    use approx::assert_relative_eq;

    fn square_shape(size: f32) -> PlanarShape {
        PlanarShape::new(vec![
            pt2(0.0, 0.0),
            pt2(size, 0.0),
            pt2(size, size),
            pt2(0.0, size),
        ])
        .unwrap()
    }

    fn flat_config(depth: f32) -> ExtrusionConfig {
        ExtrusionConfig {
            depth,
            cap_subdivision: 1,
            bevel: BevelConfig {
                enabled: false,
                thickness: 0.0,
                size: 0.0,
                segments: 0,
            },
        }
    }

    fn beveled_config(depth: f32) -> ExtrusionConfig {
        ExtrusionConfig {
            bevel: BevelConfig {
                enabled: true,
                thickness: 1.0,
                size: 0.8,
                segments: 2,
            },
            ..flat_config(depth)
        }
    }

    #[test]
    fn test_square_extrusion() {
        let mesh = build_solid(&square_shape(10.0), &flat_config(30.0)).unwrap();
        // 2 cap triangles per side + 2 per wall edge
        assert_eq!(mesh.triangle_count(), 12);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.z, -15.0, epsilon = 1e-4);
        assert_relative_eq!(max.z, 15.0, epsilon = 1e-4);
        assert_relative_eq!(max.x - min.x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_non_positive_depth_rejected() {
        assert!(build_solid(&square_shape(10.0), &flat_config(0.0)).is_none());
        assert!(build_solid(&square_shape(10.0), &flat_config(-5.0)).is_none());
    }

    #[test]
    fn test_hole_walls_added() {
        let mut shape = square_shape(10.0);
        shape.add_hole(vec![
            pt2(4.0, 4.0),
            pt2(6.0, 4.0),
            pt2(6.0, 6.0),
            pt2(4.0, 6.0),
        ]);
        let solid = build_solid(&shape, &flat_config(10.0)).unwrap();
        let plain = build_solid(&square_shape(10.0), &flat_config(10.0)).unwrap();
        assert!(solid.triangle_count() > plain.triangle_count());
    }

    #[test]
    fn test_cap_subdivision_multiplies_wall_quads() {
        let mut config = flat_config(30.0);
        let coarse = build_solid(&square_shape(10.0), &config).unwrap();
        config.cap_subdivision = 3;
        let fine = build_solid(&square_shape(10.0), &config).unwrap();
        // caps unchanged, walls tripled
        assert_eq!(fine.triangle_count() - 4, (coarse.triangle_count() - 4) * 3);
    }

    #[test]
    fn test_bevel_extends_depth_and_adds_triangles() {
        let flat = build_solid(&square_shape(10.0), &flat_config(30.0)).unwrap();
        let beveled = build_solid(&square_shape(10.0), &beveled_config(30.0)).unwrap();
        assert!(beveled.triangle_count() > flat.triangle_count());

        let (min, max) = beveled.bounds().unwrap();
        assert_relative_eq!(max.z, 16.0, epsilon = 1e-4);
        assert_relative_eq!(min.z, -16.0, epsilon = 1e-4);
    }

    #[test]
    fn test_normals_are_finite_and_unit() {
        let mesh = build_solid(&square_shape(10.0), &beveled_config(20.0)).unwrap();
        for n in &mesh.normals {
            assert!(n.is_finite());
            assert_relative_eq!(n.length(), 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_degenerate_shape_yields_no_mesh() {
        // collinear outline triangulates to nothing
        if let Some(shape) = PlanarShape::new(vec![
            pt2(0.0, 0.0),
            pt2(5.0, 0.0),
            pt2(10.0, 0.0),
        ]) {
            assert!(build_solid(&shape, &flat_config(10.0)).is_none());
        }
    }
}
