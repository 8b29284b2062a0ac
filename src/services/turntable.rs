// src/services/turntable.rs
//
// Turntable capture state machine. A capture drives the spin angle through
// exactly one full revolution over a fixed wall-clock duration, then holds
// the final pose for a short flush margin so the encoder drains before the
// file is closed. The machine is clockless; the caller feeds it elapsed
// seconds, which keeps every transition testable.

use std::f32::consts::TAU;
use thiserror::Error;

use crate::models::QualityTier;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("a capture is already running")]
    AlreadyActive,
    #[error("nothing to capture, the scene has no geometry")]
    NoGeometry,
    #[error("video encoder failed: {0}")]
    Encoder(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Recording,
    Finalizing,
}

/// Interactive state stashed when a capture starts and restored when it ends,
/// successfully or not.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSnapshot {
    pub spin_angle: f32,
    pub quality: QualityTier,
}

/// Spin angle for a capture that entered at `entry`: a linear sweep through
/// one revolution, clamped so margin frames past the duration hold the final
/// pose instead of overshooting.
pub fn turntable_angle(entry: f32, elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return entry + TAU;
    }
    entry + TAU * (elapsed / duration).clamp(0.0, 1.0)
}

pub struct TurntableRecorder {
    phase: CapturePhase,
    duration: f32,
    flush_margin: f32,
    entry_angle: f32,
    snapshot: Option<CaptureSnapshot>,
}

impl TurntableRecorder {
    pub fn new(duration: f32, flush_margin: f32) -> Self {
        Self {
            phase: CapturePhase::Idle,
            duration,
            flush_margin,
            entry_angle: 0.0,
            snapshot: None,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != CapturePhase::Idle
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Begin recording from the given interactive state.
    pub fn start(
        &mut self,
        snapshot: CaptureSnapshot,
        has_geometry: bool,
    ) -> Result<(), CaptureError> {
        if self.is_active() {
            return Err(CaptureError::AlreadyActive);
        }
        if !has_geometry {
            return Err(CaptureError::NoGeometry);
        }
        self.entry_angle = snapshot.spin_angle;
        self.snapshot = Some(snapshot);
        self.phase = CapturePhase::Recording;
        Ok(())
    }

    /// Spin angle the scene must show at `elapsed` seconds into the capture.
    pub fn angle(&self, elapsed: f32) -> f32 {
        turntable_angle(self.entry_angle, elapsed, self.duration)
    }

    /// Advance the recording clock. Returns true exactly once, when frame
    /// capture should stop and finalization begins.
    pub fn advance(&mut self, elapsed: f32) -> bool {
        if self.phase == CapturePhase::Recording && elapsed > self.duration + self.flush_margin {
            self.phase = CapturePhase::Finalizing;
            return true;
        }
        false
    }

    /// Close out a finalized capture, yielding the snapshot to restore.
    pub fn finish(&mut self) -> Option<CaptureSnapshot> {
        if self.phase != CapturePhase::Finalizing {
            return None;
        }
        self.phase = CapturePhase::Idle;
        self.snapshot.take()
    }

    /// Tear down from any phase, on encoder failure. The snapshot is still
    /// yielded so interactive state comes back even when the file does not.
    pub fn abort(&mut self) -> Option<CaptureSnapshot> {
        self.phase = CapturePhase::Idle;
        self.snapshot.take()
    }
}
