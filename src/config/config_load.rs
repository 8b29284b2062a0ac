// src/config/config_load.rs
//
// loading of config.toml

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_types::*;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub window: WindowConfig,
    pub rendering: RenderConfig,
    pub paths: PathConfig,
    pub osc: OscConfig,
    pub extrusion: ExtrusionDefaults,
    pub view: ViewDefaults,
    pub capture: CaptureConfig,
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn Error>> {
        // First try the executable's directory, then fall back to the
        // current working directory.
        if let Some(exe_config) = Self::load_from_exe_dir() {
            return Ok(exe_config);
        }
        Self::load_from_working_dir()
    }

    fn load_from_exe_dir() -> Option<Self> {
        let exe_path = std::env::current_exe().ok()?;
        let config_path = exe_path.parent()?.join("config.toml");

        if config_path.exists() {
            let content = fs::read_to_string(&config_path).ok()?;
            toml::from_str(&content).ok()
        } else {
            None
        }
    }

    fn load_from_working_dir() -> Result<Self, Box<dyn Error>> {
        let content = fs::read_to_string("config.toml")?;
        Ok(toml::from_str(&content)?)
    }

    pub fn resolve_state_file(&self) -> PathBuf {
        resolve(&self.paths.document_state_file)
    }

    pub fn resolve_samples_dir(&self) -> PathBuf {
        resolve(&self.paths.samples_directory)
    }

    pub fn resolve_output_dir(&self) -> PathBuf {
        resolve(&self.paths.output_directory)
    }
}

// Relative paths resolve against the executable's directory when possible so
// the app behaves the same launched from target/ or from a bundle.
fn resolve(path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join(path)))
        .unwrap_or_else(|| PathBuf::from(path))
}
