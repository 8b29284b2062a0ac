// src/models/solid.rs
//
// Triangulated 3D volumes and the group that holds one build of the scene.
// Solids are discarded and rebuilt whenever an input changes, never mutated
// in place (the single exception is the baked centering translation applied
// by the normalization stage).

use nannou::prelude::*;
use std::f32::consts::PI;

#[derive(Debug, Clone, Default)]
pub struct SolidMesh {
    pub vertices: Vec<Point3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl SolidMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(index_count),
        }
    }

    pub fn add_vertex(&mut self, position: Point3, normal: Vec3) {
        self.vertices.push(position);
        self.normals.push(normal);
    }

    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Bake a translation into the vertex data.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Axis-aligned bounds of the raw (untransformed) geometry.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        Some((min, max))
    }
}

/// Outer transform scope state produced by normalization. Scale and the fixed
/// vertical-axis correction live here as transform state only; they are never
/// baked into vertices, so camera and spin changes never touch geometry.
#[derive(Debug, Clone, Copy)]
pub struct GroupTransform {
    pub scale: f32,
    /// 180 degrees about the horizontal axis, correcting SVG's y-down
    /// convention.
    pub flip_x: f32,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            flip_x: PI,
        }
    }
}

/// One build of the scene: the ordered solids for the current document plus
/// the normalized outer transform.
#[derive(Debug, Clone, Default)]
pub struct MeshGroup {
    pub solids: Vec<SolidMesh>,
    pub transform: GroupTransform,
}

impl MeshGroup {
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.solids.iter().map(|s| s.triangle_count()).sum()
    }

    /// Union bounds over all solids' raw geometry.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let mut union: Option<(Point3, Point3)> = None;
        for solid in &self.solids {
            if let Some((min, max)) = solid.bounds() {
                union = Some(match union {
                    Some((umin, umax)) => (umin.min(min), umax.max(max)),
                    None => (min, max),
                });
            }
        }
        union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> SolidMesh {
        let mut mesh = SolidMesh::new();
        mesh.add_vertex(pt3(0.0, 0.0, 0.0), Vec3::Z);
        mesh.add_vertex(pt3(1.0, 0.0, 0.0), Vec3::Z);
        mesh.add_vertex(pt3(1.0, 1.0, 0.0), Vec3::Z);
        mesh.add_vertex(pt3(0.0, 1.0, 0.0), Vec3::Z);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        mesh
    }

    #[test]
    fn test_counts() {
        let mesh = unit_quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.is_empty());
        assert!(SolidMesh::new().is_empty());
    }

    #[test]
    fn test_translate_bakes_into_vertices() {
        let mut mesh = unit_quad();
        mesh.translate(vec3(-0.5, -0.5, 2.0));
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, pt3(-0.5, -0.5, 2.0));
        assert_eq!(max, pt3(0.5, 0.5, 2.0));
    }

    #[test]
    fn test_group_union_bounds() {
        let mut far = unit_quad();
        far.translate(vec3(10.0, 0.0, 0.0));
        let group = MeshGroup {
            solids: vec![unit_quad(), far],
            transform: GroupTransform::default(),
        };
        let (min, max) = group.bounds().unwrap();
        assert_eq!(min, pt3(0.0, 0.0, 0.0));
        assert_eq!(max, pt3(11.0, 1.0, 0.0));
    }

    #[test]
    fn test_empty_group_has_no_bounds() {
        assert!(MeshGroup::default().bounds().is_none());
    }
}
