// src/services/mod.rs

pub mod extrude;
pub mod frame_recorder;
pub mod normalize;
pub mod scene;
pub mod svg;
pub mod turntable;

pub use extrude::{build_solid, ExtrusionConfig};
pub use frame_recorder::FrameRecorder;
pub use normalize::normalize_solids;
pub use scene::{GeometryParams, SceneBuilder};
pub use svg::extract_outlines;
pub use turntable::{turntable_angle, CaptureError, CapturePhase, CaptureSnapshot, TurntableRecorder};
