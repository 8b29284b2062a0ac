// src/models/view_params.rs
//
// Mutable, non-geometric view state. Changing any of these never invalidates
// mesh data; the expensive parameters (depth, quality tier) live with the
// scene builder instead.

use nannou::prelude::*;
use serde::Deserialize;
use std::f32::consts::TAU;

use crate::config::ViewDefaults;

/// Geometry quality tier. Draft keeps slider drags cheap, Export is forced
/// for the duration of a turntable capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Draft,
    Standard,
    Export,
}

impl QualityTier {
    /// Upper bound on straight segments per curved boundary edge.
    pub fn curve_budget(self) -> u32 {
        match self {
            QualityTier::Draft => 16,
            QualityTier::Standard => 32,
            QualityTier::Export => 96,
        }
    }

    pub fn bevel_segments(self) -> u32 {
        match self {
            QualityTier::Draft => 1,
            QualityTier::Standard => 2,
            QualityTier::Export => 4,
        }
    }

    /// Longitudinal slices along the extrusion axis.
    pub fn cap_subdivision(self) -> u32 {
        match self {
            QualityTier::Draft => 1,
            QualityTier::Standard => 1,
            QualityTier::Export => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            QualityTier::Draft => QualityTier::Standard,
            QualityTier::Standard => QualityTier::Export,
            QualityTier::Export => QualityTier::Draft,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewParameters {
    pub background: Rgb<f32>,
    pub fov_degrees: f32,
    pub turn_seconds: f32,
}

impl ViewParameters {
    pub fn from_defaults(defaults: &ViewDefaults) -> Self {
        let [r, g, b] = defaults.background;
        Self {
            background: rgb(r, g, b),
            fov_degrees: defaults.fov_degrees,
            turn_seconds: defaults.turn_seconds,
        }
    }

    /// Spin speed in radians per second for the interactive turntable.
    pub fn spin_rate(&self) -> f32 {
        TAU / self.turn_seconds.max(0.5)
    }
}
