// src/config/mod.rs

pub mod config_load;
pub mod config_types;

pub use config_load::Config;
pub use config_types::{
    BevelConfig, CaptureConfig, ExtrusionDefaults, OscConfig, PathConfig, RenderConfig,
    ViewDefaults, WindowConfig,
};
