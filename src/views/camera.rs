// src/views/camera.rs
//
// Perspective projection for the turntable view. The camera sits on the +Z
// axis looking at the origin, at a distance derived from the normalized group
// size, so any logo fills a comparable share of the frame regardless of its
// source dimensions. Field of view is the one user-facing knob.

use nannou::prelude::*;

use crate::services::normalize::REFERENCE_SIZE;

/// Extra framing slack around the normalized group.
const FIT_MARGIN: f32 = 1.35;
/// Points closer than this to the camera plane are culled.
const NEAR_LIMIT: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub fov_degrees: f32,
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(fov_degrees: f32, viewport: Vec2) -> Self {
        Self {
            fov_degrees,
            viewport,
        }
    }

    fn half_fov(&self) -> f32 {
        (self.fov_degrees.clamp(10.0, 120.0) * 0.5).to_radians()
    }

    /// Distance from the origin chosen so a REFERENCE_SIZE group fits the
    /// vertical field of view with margin. Narrow fov pushes the camera back,
    /// wide fov pulls it in; the subject's apparent size barely changes while
    /// perspective distortion does.
    pub fn distance(&self) -> f32 {
        (REFERENCE_SIZE * 0.5 * FIT_MARGIN) / self.half_fov().tan()
    }

    /// Project a world-space point to viewport coordinates plus its distance
    /// from the camera. Returns None for points at or behind the camera.
    pub fn project(&self, point: Point3) -> Option<(Point2, f32)> {
        let view_z = self.distance() - point.z;
        if view_z < NEAR_LIMIT {
            return None;
        }
        let focal = (self.viewport.y * 0.5) / self.half_fov().tan();
        let x = point.x * focal / view_z;
        let y = point.y * focal / view_z;
        Some((pt2(x, y), view_z))
    }
}
