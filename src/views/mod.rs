// src/views/mod.rs

pub mod camera;
pub mod scene_view;

pub use camera::Camera;
pub use scene_view::draw_group;
