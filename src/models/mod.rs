// src/models/mod.rs

pub mod document;
pub mod shape;
pub mod solid;
pub mod view_params;

pub use document::{DocumentError, VectorDocument};
pub use shape::{CapTriangulation, PlanarShape};
pub use solid::{GroupTransform, MeshGroup, SolidMesh};
pub use view_params::{QualityTier, ViewParameters};
