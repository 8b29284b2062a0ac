// src/config/config_types.rs
//
// Config types for the app

use crate::models::QualityTier;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    pub texture_width: u32,
    pub texture_height: u32,
    pub texture_samples: u32,
}

#[derive(Debug, Deserialize)]
pub struct PathConfig {
    pub document_state_file: String,
    pub samples_directory: String,
    pub output_directory: String,
}

#[derive(Debug, Deserialize)]
pub struct OscConfig {
    pub rx_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct ExtrusionDefaults {
    pub depth: f32,
    pub quality: QualityTier,
    pub bevel: BevelConfig,
}

/// Rounds the rim where an extruded cap meets the side walls.
#[derive(Debug, Deserialize, Clone)]
pub struct BevelConfig {
    pub enabled: bool,
    pub thickness: f32, // how far the rounding extends along the depth axis
    pub size: f32,      // how far the cap rim is pulled into the material
    pub segments: u32,
}

#[derive(Debug, Deserialize)]
pub struct ViewDefaults {
    pub background: [f32; 3],
    pub fov_degrees: f32,
    pub turn_seconds: f32,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub fps: u64,
    pub duration_seconds: f32,
    pub flush_margin_seconds: f32,
}
