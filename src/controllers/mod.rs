// src/controllers/mod.rs

pub mod osc;

pub use osc::{OscCommand, OscController, OscSender};
