// src/services/scene.rs
//
// Scene builder: owns the current mesh group and rebuilds it from the
// document when a geometry-affecting parameter commits. Parameter writes are
// cheap and coalescing; the expensive rebuild runs at most once per tick,
// always against the latest pending values. A one-tick arming delay lets the
// caller paint its busy indicator before the rebuild blocks the frame.

use rayon::prelude::*;

use crate::config::BevelConfig;
use crate::models::{MeshGroup, QualityTier, SolidMesh, VectorDocument};
use crate::services::extrude::{build_solid, ExtrusionConfig};
use crate::services::normalize::normalize_solids;
use crate::services::svg::extract_outlines;

/// The parameters whose changes invalidate mesh data. Everything else (fov,
/// spin, background) is view state and bypasses the builder entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryParams {
    pub depth: f32,
    pub quality: QualityTier,
}

/// One full pass of the geometry pipeline: outlines, per-shape extrusion in
/// parallel, then normalization. Degenerate shapes drop out silently, so the
/// group may hold fewer solids than the document has outlines.
pub fn rebuild_group(
    document: &VectorDocument,
    params: &GeometryParams,
    bevel: &BevelConfig,
) -> MeshGroup {
    let shapes = extract_outlines(&document.markup, params.quality.curve_budget());
    let config = ExtrusionConfig::new(params.depth, params.quality, bevel);
    let mut solids: Vec<SolidMesh> = shapes
        .par_iter()
        .filter_map(|shape| build_solid(shape, &config))
        .collect();
    let transform = normalize_solids(&mut solids);
    MeshGroup { solids, transform }
}

pub struct SceneBuilder {
    committed: GeometryParams,
    pending: GeometryParams,
    bevel: BevelConfig,
    group: MeshGroup,
    generation: u64,
    built_generation: u64,
    armed: bool,
    rebuild_count: u64,
}

impl SceneBuilder {
    pub fn new(params: GeometryParams, bevel: BevelConfig) -> Self {
        Self {
            committed: params,
            pending: params,
            bevel,
            group: MeshGroup::default(),
            generation: 1, // one build owed for the initial document
            built_generation: 0,
            armed: false,
            rebuild_count: 0,
        }
    }

    pub fn group(&self) -> &MeshGroup {
        &self.group
    }

    /// The values the on-screen readout should echo. Pending moves on every
    /// write; committed lags until the next rebuild lands.
    pub fn pending(&self) -> &GeometryParams {
        &self.pending
    }

    pub fn committed(&self) -> &GeometryParams {
        &self.committed
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// A rebuild is owed but has not landed yet.
    pub fn is_busy(&self) -> bool {
        self.generation != self.built_generation
    }

    pub fn set_depth(&mut self, depth: f32) {
        if (self.pending.depth - depth).abs() > f32::EPSILON {
            self.pending.depth = depth;
            self.touch();
        }
    }

    pub fn set_quality(&mut self, quality: QualityTier) {
        if self.pending.quality != quality {
            self.pending.quality = quality;
            self.touch();
        }
    }

    pub fn document_changed(&mut self) {
        self.touch();
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.armed = false;
    }

    /// Advance one frame. Returns true when a rebuild landed this tick.
    pub fn tick(&mut self, document: &VectorDocument) -> bool {
        if !self.is_busy() {
            return false;
        }
        if !self.armed {
            // give the caller one painted frame before blocking
            self.armed = true;
            return false;
        }
        let generation = self.generation;
        let group = rebuild_group(document, &self.pending, &self.bevel);
        self.apply(generation, group)
    }

    /// Synchronous rebuild at a forced quality tier, for capture entry where
    /// the first recorded frame must already be at full resolution.
    pub fn force_rebuild_with_quality(
        &mut self,
        document: &VectorDocument,
        quality: QualityTier,
    ) {
        self.pending.quality = quality;
        self.generation += 1;
        let generation = self.generation;
        let group = rebuild_group(document, &self.pending, &self.bevel);
        self.apply(generation, group);
    }

    /// Install a finished build unless a newer parameter write superseded it.
    fn apply(&mut self, generation: u64, group: MeshGroup) -> bool {
        if generation != self.generation {
            return false;
        }
        self.group = group;
        self.committed = self.pending;
        self.built_generation = generation;
        self.armed = false;
        self.rebuild_count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VectorDocument;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <path fill="#000" d="M10 10 H90 V90 H10 Z"/>
    </svg>"##;

    fn document() -> VectorDocument {
        VectorDocument::from_markup("square", SQUARE).unwrap()
    }

    fn bevel_off() -> BevelConfig {
        BevelConfig {
            enabled: false,
            thickness: 0.0,
            size: 0.0,
            segments: 0,
        }
    }

    fn params(depth: f32) -> GeometryParams {
        GeometryParams {
            depth,
            quality: QualityTier::Standard,
        }
    }

    fn drain(builder: &mut SceneBuilder, document: &VectorDocument) {
        for _ in 0..4 {
            builder.tick(document);
        }
    }

    #[test]
    fn test_initial_build_is_owed() {
        let document = document();
        let mut builder = SceneBuilder::new(params(12.0), bevel_off());
        assert!(builder.is_busy());
        drain(&mut builder, &document);
        assert!(!builder.is_busy());
        assert!(!builder.group().is_empty());
        assert_eq!(builder.rebuild_count(), 1);
    }

    #[test]
    fn test_rapid_writes_coalesce_to_one_rebuild() {
        let document = document();
        let mut builder = SceneBuilder::new(params(12.0), bevel_off());
        drain(&mut builder, &document);

        builder.set_depth(14.0);
        builder.set_depth(18.0);
        builder.set_depth(22.0);
        drain(&mut builder, &document);

        assert_eq!(builder.rebuild_count(), 2);
        assert_eq!(builder.committed().depth, 22.0);
    }

    #[test]
    fn test_rebuild_defers_one_armed_tick() {
        let document = document();
        let mut builder = SceneBuilder::new(params(12.0), bevel_off());
        // first tick arms, second builds
        assert!(!builder.tick(&document));
        assert!(builder.is_busy());
        assert!(builder.tick(&document));
        assert!(!builder.is_busy());
    }

    #[test]
    fn test_write_during_armed_tick_restarts_the_wait() {
        let document = document();
        let mut builder = SceneBuilder::new(params(12.0), bevel_off());
        assert!(!builder.tick(&document)); // armed
        builder.set_depth(30.0); // disarms
        assert!(!builder.tick(&document)); // re-armed
        assert!(builder.tick(&document));
        assert_eq!(builder.committed().depth, 30.0);
        assert_eq!(builder.rebuild_count(), 1);
    }

    #[test]
    fn test_stale_build_is_discarded() {
        let document = document();
        let mut builder = SceneBuilder::new(params(12.0), bevel_off());
        let stale_generation = builder.generation;
        let group = rebuild_group(&document, &params(12.0), &bevel_off());
        builder.set_depth(40.0);
        assert!(!builder.apply(stale_generation, group));
        assert!(builder.is_busy());
        assert_eq!(builder.rebuild_count(), 0);
    }

    #[test]
    fn test_unchanged_writes_never_rebuild() {
        let document = document();
        let mut builder = SceneBuilder::new(params(12.0), bevel_off());
        drain(&mut builder, &document);

        builder.set_depth(12.0);
        builder.set_quality(QualityTier::Standard);
        assert!(!builder.is_busy());
        drain(&mut builder, &document);
        assert_eq!(builder.rebuild_count(), 1);
    }

    #[test]
    fn test_forced_quality_rebuild_is_synchronous() {
        let document = document();
        let mut builder = SceneBuilder::new(params(12.0), bevel_off());
        builder.force_rebuild_with_quality(&document, QualityTier::Export);
        assert!(!builder.is_busy());
        assert_eq!(builder.committed().quality, QualityTier::Export);
        assert!(!builder.group().is_empty());
    }

    #[test]
    fn test_group_never_exceeds_outline_count() {
        let document = document();
        let group = rebuild_group(&document, &params(12.0), &bevel_off());
        let outlines = extract_outlines(&document.markup, 32).len();
        assert!(group.solids.len() <= outlines);
    }
}
