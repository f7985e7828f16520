//! Per-frame diagnostics collected when `DetectorParams::collect_debug` is set.

use kanji_ar_core::GrayImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalError;
use crate::dictionary::LabelId;
use crate::edge::{EdgeTrace, RefineError};
use crate::pose::PoseError;

/// Why a candidate quad did not become a detection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    #[error(transparent)]
    Refine(#[from] RefineError),
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
    #[error("no dictionary glyph recognized")]
    Unrecognized,
    #[error(transparent)]
    Pose(#[from] PoseError),
}

/// One quad that passed the polygon and size filters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateDebug {
    /// Coarse clockwise quad from the polygon approximation.
    pub quad: [Point2<f64>; 4],
    pub edges: Vec<EdgeTrace>,
    pub corners: Option<[Point2<f64>; 4]>,
    pub flood_mean: Option<f64>,
    pub rotations: Option<u8>,
    pub label: Option<LabelId>,
    pub reject: Option<RejectReason>,
    /// Image handed to the recognizer.
    #[serde(skip)]
    pub canonical: Option<GrayImage>,
}

impl CandidateDebug {
    pub(crate) fn new(quad: [Point2<f64>; 4]) -> Self {
        Self {
            quad,
            edges: Vec::new(),
            corners: None,
            flood_mean: None,
            rotations: None,
            label: None,
            reject: None,
            canonical: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DetectionDebug {
    pub threshold: u8,
    /// Contours found in the binary frame, quads or not.
    pub contours: usize,
    pub candidates: Vec<CandidateDebug>,
}

impl DetectionDebug {
    pub fn accepted(&self) -> impl Iterator<Item = &CandidateDebug> {
        self.candidates.iter().filter(|c| c.reject.is_none())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &CandidateDebug> {
        self.candidates.iter().filter(|c| c.reject.is_some())
    }
}
