// src/services/svg/mod.rs

pub mod outline;

pub use outline::extract_outlines;
