// src/services/svg/outline.rs
//
// Path outline extraction: SVG markup in, ordered filled shapes out.
// Document parsing is delegated to usvg (which folds transforms and turns
// basic shapes into paths); this module flattens the curve segments and
// resolves subpath nesting into outlines-with-holes under the even-odd rule,
// the single fill rule the whole pipeline uses.
//
// Extraction never fails across this boundary: malformed or empty markup
// degrades to an empty shape list, logged, and the rest of the pipeline
// simply renders an empty scene.

use nannou::prelude::*;
use usvg::tiny_skia_path::{Path as FlatPath, PathSegment};

use crate::models::shape::{ring_contains, signed_area};
use crate::models::PlanarShape;

/// Extract every filled outline of the document, in traversal order.
/// `curve_budget` is the quality tier's upper bound on segments per curved
/// edge (16..=96); the effective count shrinks sub-linearly with the number
/// of curves so dense paths stay bounded.
pub fn extract_outlines(markup: &str, curve_budget: u32) -> Vec<PlanarShape> {
    if markup.trim().is_empty() {
        return Vec::new();
    }

    let options = usvg::Options::default();
    let tree = match usvg::Tree::from_str(markup, &options) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("SVG parse failed, rendering empty scene: {}", err);
            return Vec::new();
        }
    };

    let mut rings = Vec::new();
    collect_rings(tree.root(), curve_budget, &mut rings);
    resolve_shapes(rings)
}

fn collect_rings(group: &usvg::Group, curve_budget: u32, rings: &mut Vec<Vec<Point2>>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(child) => collect_rings(child, curve_budget, rings),
            usvg::Node::Path(path) => {
                // stroke-only paths carry no fillable area
                if path.fill().is_none() {
                    continue;
                }
                let data = match path.data().clone().transform(path.abs_transform()) {
                    Some(data) => data,
                    None => continue,
                };
                let steps = segments_per_curve(count_curves(&data), curve_budget);
                flatten_path(&data, steps, rings);
            }
            _ => {}
        }
    }
}

/// Straight segments per curved edge: sub-linear in the path's curve count,
/// clamped so a single swoosh stays smooth and a 10k-node ornament stays
/// tractable.
pub fn segments_per_curve(curve_count: usize, curve_budget: u32) -> u32 {
    let scaled = curve_budget as f32 / (1.0 + (curve_count as f32).sqrt() * 0.25);
    (scaled.round() as u32).clamp(3, 24)
}

fn count_curves(data: &FlatPath) -> usize {
    data.segments()
        .filter(|s| matches!(s, PathSegment::QuadTo(..) | PathSegment::CubicTo(..)))
        .count()
}

/// Flatten one path's subpaths into closed polygonal rings. Open subpaths
/// are implicitly closed, matching SVG fill semantics.
fn flatten_path(data: &FlatPath, steps: u32, rings: &mut Vec<Vec<Point2>>) {
    let mut current: Vec<Point2> = Vec::new();

    let mut close_current = |ring: &mut Vec<Point2>| {
        if ring.len() >= 3 {
            rings.push(std::mem::take(ring));
        } else {
            ring.clear();
        }
    };

    for segment in data.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                close_current(&mut current);
                current.push(pt2(p.x, p.y));
            }
            PathSegment::LineTo(p) => current.push(pt2(p.x, p.y)),
            PathSegment::QuadTo(c, p) => {
                let from = match current.last() {
                    Some(last) => *last,
                    None => continue,
                };
                for i in 1..=steps {
                    let t = i as f32 / steps as f32;
                    current.push(quad_point(from, pt2(c.x, c.y), pt2(p.x, p.y), t));
                }
            }
            PathSegment::CubicTo(c1, c2, p) => {
                let from = match current.last() {
                    Some(last) => *last,
                    None => continue,
                };
                for i in 1..=steps {
                    let t = i as f32 / steps as f32;
                    current.push(cubic_point(
                        from,
                        pt2(c1.x, c1.y),
                        pt2(c2.x, c2.y),
                        pt2(p.x, p.y),
                        t,
                    ));
                }
            }
            PathSegment::Close => close_current(&mut current),
        }
    }
    close_current(&mut current);
}

fn quad_point(a: Point2, c: Point2, b: Point2, t: f32) -> Point2 {
    let u = 1.0 - t;
    a * (u * u) + c * (2.0 * u * t) + b * (t * t)
}

fn cubic_point(a: Point2, c1: Point2, c2: Point2, b: Point2, t: f32) -> Point2 {
    let u = 1.0 - t;
    a * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + b * (t * t * t)
}

/// Resolve raw rings into shapes under the even-odd rule: a ring contained by
/// an even number of other rings is an outer boundary; an odd one is a hole
/// of its smallest even-depth container. Islands inside holes become their
/// own shapes.
fn resolve_shapes(rings: Vec<Vec<Point2>>) -> Vec<PlanarShape> {
    let probes: Vec<Point2> = rings.iter().map(|r| probe_point(r)).collect();
    let areas: Vec<f32> = rings.iter().map(|r| signed_area(r).abs()).collect();

    let depth: Vec<usize> = (0..rings.len())
        .map(|i| {
            (0..rings.len())
                .filter(|&j| j != i && ring_contains(&rings[j], probes[i]))
                .count()
        })
        .collect();

    // outer shells first, in document order
    let mut shapes = Vec::new();
    let mut shape_of_ring = vec![usize::MAX; rings.len()];
    for (i, ring) in rings.iter().enumerate() {
        if depth[i] % 2 == 0 {
            if let Some(shape) = PlanarShape::new(ring.clone()) {
                shape_of_ring[i] = shapes.len();
                shapes.push(shape);
            }
        }
    }

    // attach each hole to its tightest even-depth container
    for (i, ring) in rings.iter().enumerate() {
        if depth[i] % 2 == 1 {
            let parent = (0..rings.len())
                .filter(|&j| {
                    j != i
                        && depth[j] % 2 == 0
                        && shape_of_ring[j] != usize::MAX
                        && ring_contains(&rings[j], probes[i])
                })
                .min_by(|&a, &b| areas[a].total_cmp(&areas[b]));
            if let Some(parent) = parent {
                shapes[shape_of_ring[parent]].add_hole(ring.clone());
            }
        }
    }

    shapes
}

/// A point interior to the ring, for containment probing. The vertex mean
/// works for convex-ish rings; concave ones fall back to a corner triangle
/// midpoint, then to the first vertex.
fn probe_point(ring: &[Point2]) -> Point2 {
    let mean = ring.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / ring.len() as f32;
    if ring_contains(ring, mean) {
        return mean;
    }
    if ring.len() >= 3 {
        let tri = (ring[0] + ring[1] + ring[2]) / 3.0;
        if ring_contains(ring, tri) {
            return tri;
        }
    }
    ring[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 120 120">
        <path fill="#000" d="M10 10 H110 V110 H10 Z"/>
    </svg>"##;

    const RING: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 120 120">
        <path fill-rule="evenodd" fill="#000"
              d="M10 10 H110 V110 H10 Z M40 40 H80 V80 H40 Z"/>
    </svg>"##;

    const ISLAND: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 120 120">
        <path fill-rule="evenodd" fill="#000"
              d="M10 10 H110 V110 H10 Z M30 30 H90 V90 H30 Z M50 50 H70 V70 H50 Z"/>
    </svg>"##;

    #[test]
    fn test_square_yields_one_shape() {
        let shapes = extract_outlines(SQUARE, 32);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].outer().len(), 4);
        assert!(shapes[0].holes().is_empty());
    }

    #[test]
    fn test_ring_yields_shape_with_hole() {
        let shapes = extract_outlines(RING, 32);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].holes().len(), 1);
    }

    #[test]
    fn test_island_inside_hole_is_its_own_shape() {
        let shapes = extract_outlines(ISLAND, 32);
        assert_eq!(shapes.len(), 2);
        let with_hole = shapes.iter().filter(|s| !s.holes().is_empty()).count();
        assert_eq!(with_hole, 1);
    }

    #[test]
    fn test_document_order_preserved() {
        let markup = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100">
            <path fill="#000" d="M0 0 H40 V40 H0 Z"/>
            <path fill="#000" d="M100 0 H140 V40 H100 Z"/>
        </svg>"##;
        let shapes = extract_outlines(markup, 32);
        assert_eq!(shapes.len(), 2);
        let first_max_x = shapes[0].outer().iter().map(|p| p.x).fold(f32::MIN, f32::max);
        let second_min_x = shapes[1].outer().iter().map(|p| p.x).fold(f32::MAX, f32::min);
        assert!(first_max_x < second_min_x);
    }

    #[test]
    fn test_circle_element_becomes_outline() {
        let markup = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            <circle cx="50" cy="50" r="30" fill="#000"/>
        </svg>"##;
        let shapes = extract_outlines(markup, 32);
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].outer().len() >= 8);
    }

    #[test]
    fn test_malformed_markup_degrades_to_empty() {
        assert!(extract_outlines("<svg><path", 32).is_empty());
        assert!(extract_outlines("not xml at all", 32).is_empty());
    }

    #[test]
    fn test_empty_input_degrades_to_empty() {
        assert!(extract_outlines("", 32).is_empty());
        assert!(extract_outlines("   \n\t", 32).is_empty());
    }

    #[test]
    fn test_stroke_only_path_skipped() {
        let markup = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            <path fill="none" stroke="#f00" d="M0 0 H100 V100 H0 Z"/>
        </svg>"##;
        assert!(extract_outlines(markup, 32).is_empty());
    }

    #[test]
    fn test_sub_three_point_paths_filtered() {
        let markup = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            <path fill="#000" d="M0 0 L10 10"/>
        </svg>"##;
        assert!(extract_outlines(markup, 32).is_empty());
    }

    #[test]
    fn test_segments_per_curve_bounded() {
        assert_eq!(segments_per_curve(0, 96), 24);
        assert!(segments_per_curve(10_000, 96) >= 3);
        assert!(segments_per_curve(10_000, 96) < segments_per_curve(4, 96));
        for curves in [0, 1, 10, 100, 10_000] {
            for budget in [16, 32, 96] {
                let s = segments_per_curve(curves, budget);
                assert!((3..=24).contains(&s));
            }
        }
    }
}
