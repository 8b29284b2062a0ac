// src/models/shape.rs
//
// A closed planar outline with optional interior holes, already resolved from
// fill-rule semantics. Winding is normalized on construction: outer boundary
// counter-clockwise, holes clockwise.

use nannou::prelude::*;

#[derive(Debug, Clone)]
pub struct PlanarShape {
    outer: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
}

/// Triangulated cap outline: every boundary point (outer then holes, in
/// order) plus triangle indices into that flat list.
#[derive(Debug, Clone)]
pub struct CapTriangulation {
    pub points: Vec<Point2>,
    pub indices: Vec<u32>,
}

impl PlanarShape {
    /// Returns None for degenerate rings; every constructed shape has at
    /// least 3 boundary points.
    pub fn new(outer: Vec<Point2>) -> Option<Self> {
        let mut outer = dedup_ring(outer);
        if outer.len() < 3 {
            return None;
        }
        if signed_area(&outer) < 0.0 {
            outer.reverse();
        }
        Some(Self {
            outer,
            holes: Vec::new(),
        })
    }

    /// Degenerate holes are dropped silently.
    pub fn add_hole(&mut self, hole: Vec<Point2>) {
        let mut hole = dedup_ring(hole);
        if hole.len() < 3 {
            return;
        }
        if signed_area(&hole) > 0.0 {
            hole.reverse();
        }
        self.holes.push(hole);
    }

    pub fn outer(&self) -> &[Point2] {
        &self.outer
    }

    pub fn holes(&self) -> &[Vec<Point2>] {
        &self.holes
    }

    pub fn boundary_point_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()
    }

    /// Triangulate outer + holes with earcut. Returns None when the shape
    /// collapses to zero triangles; callers skip such shapes silently.
    pub fn triangulate(&self) -> Option<CapTriangulation> {
        triangulate_rings(&self.outer, &self.holes)
    }
}

/// Earcut over an arbitrary ring set (used for both cap outlines and the
/// inset rims produced by beveling).
pub fn triangulate_rings(outer: &[Point2], holes: &[Vec<Point2>]) -> Option<CapTriangulation> {
    if outer.len() < 3 {
        return None;
    }

    let mut vertices =
        Vec::with_capacity((outer.len() + holes.iter().map(|h| h.len()).sum::<usize>()) * 2);
    for p in outer {
        vertices.push(p.x as f64);
        vertices.push(p.y as f64);
    }

    let mut hole_indices = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_indices.push(vertices.len() / 2);
        for p in hole {
            vertices.push(p.x as f64);
            vertices.push(p.y as f64);
        }
    }

    let raw = earcutr::earcut(&vertices, &hole_indices, 2).ok()?;

    // drop zero-area triangles so fully collinear outlines resolve to None
    let mut indices = Vec::with_capacity(raw.len());
    for tri in raw.chunks_exact(3) {
        let (ax, ay) = (vertices[tri[0] * 2], vertices[tri[0] * 2 + 1]);
        let (bx, by) = (vertices[tri[1] * 2], vertices[tri[1] * 2 + 1]);
        let (cx, cy) = (vertices[tri[2] * 2], vertices[tri[2] * 2 + 1]);
        let doubled_area = (bx - ax) * (cy - ay) - (cx - ax) * (by - ay);
        if doubled_area.abs() > 1e-12 {
            indices.extend(tri.iter().map(|&i| i as u32));
        }
    }
    if indices.is_empty() {
        return None;
    }

    let points = vertices
        .chunks_exact(2)
        .map(|c| pt2(c[0] as f32, c[1] as f32))
        .collect();

    Some(CapTriangulation { points, indices })
}

/// Shoelace area; positive for counter-clockwise rings.
pub fn signed_area(ring: &[Point2]) -> f32 {
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd ray cast. This is the one fill rule the whole pipeline uses.
pub fn ring_contains(ring: &[Point2], p: Point2) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn dedup_ring(mut ring: Vec<Point2>) -> Vec<Point2> {
    const EPS: f32 = 1e-5;
    ring.dedup_by(|a, b| a.distance(*b) < EPS);
    if ring.len() > 1 {
        let first = ring[0];
        if ring[ring.len() - 1].distance(first) < EPS {
            ring.pop();
        }
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> Vec<Point2> {
        vec![
            pt2(0.0, 0.0),
            pt2(size, 0.0),
            pt2(size, size),
            pt2(0.0, size),
        ]
    }

    mod construction {
        use super::*;

        #[test]
        fn test_degenerate_rings_rejected() {
            assert!(PlanarShape::new(vec![]).is_none());
            assert!(PlanarShape::new(vec![pt2(0.0, 0.0), pt2(1.0, 1.0)]).is_none());
            // duplicate points collapse below the minimum
            assert!(
                PlanarShape::new(vec![pt2(0.0, 0.0), pt2(0.0, 0.0), pt2(1.0, 1.0)]).is_none()
            );
        }

        #[test]
        fn test_winding_normalized() {
            let mut cw = square(10.0);
            cw.reverse();
            let shape = PlanarShape::new(cw).unwrap();
            assert!(signed_area(shape.outer()) > 0.0);

            let mut shape = PlanarShape::new(square(10.0)).unwrap();
            shape.add_hole(square(2.0)); // passed counter-clockwise
            assert!(signed_area(&shape.holes()[0]) < 0.0);
        }

        #[test]
        fn test_closing_point_dropped() {
            let mut ring = square(10.0);
            ring.push(pt2(0.0, 0.0));
            let shape = PlanarShape::new(ring).unwrap();
            assert_eq!(shape.outer().len(), 4);
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn test_ring_contains() {
            let ring = square(10.0);
            assert!(ring_contains(&ring, pt2(5.0, 5.0)));
            assert!(!ring_contains(&ring, pt2(15.0, 5.0)));
            assert!(!ring_contains(&ring, pt2(-1.0, -1.0)));
        }

        #[test]
        fn test_boundary_point_count() {
            let mut shape = PlanarShape::new(square(10.0)).unwrap();
            shape.add_hole(vec![pt2(2.0, 2.0), pt2(4.0, 2.0), pt2(3.0, 4.0)]);
            assert_eq!(shape.boundary_point_count(), 7);
        }
    }

    mod triangulation {
        use super::*;

        #[test]
        fn test_square_cap() {
            let shape = PlanarShape::new(square(10.0)).unwrap();
            let cap = shape.triangulate().unwrap();
            assert_eq!(cap.points.len(), 4);
            assert_eq!(cap.indices.len(), 6);
        }

        #[test]
        fn test_square_with_hole() {
            let mut shape = PlanarShape::new(square(10.0)).unwrap();
            shape.add_hole(vec![
                pt2(4.0, 4.0),
                pt2(6.0, 4.0),
                pt2(6.0, 6.0),
                pt2(4.0, 6.0),
            ]);
            let cap = shape.triangulate().unwrap();
            assert_eq!(cap.points.len(), 8);
            // a square ring triangulates into 8 triangles
            assert_eq!(cap.indices.len(), 24);
        }

        #[test]
        fn test_collinear_outline_yields_none() {
            let shape = PlanarShape::new(vec![
                pt2(0.0, 0.0),
                pt2(5.0, 0.0),
                pt2(10.0, 0.0),
            ]);
            if let Some(shape) = shape {
                assert!(shape.triangulate().is_none());
            }
        }
    }
}
