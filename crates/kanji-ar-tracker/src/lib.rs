//! Glyph marker tracking.
//!
//! The pipeline, per frame:
//! - binarize and extract contours, keep quads of plausible size,
//! - refine each quad's corners from sub-pixel edge positions,
//! - rectify to a canonical image, validate it and turn it upright,
//! - classify the glyph through a pluggable [`GlyphRecognizer`],
//! - estimate the marker pose from the oriented corners.
//!
//! Candidates that fail any step are dropped; a frame never fails as a whole.
//! Geometry and image primitives live in `kanji-ar-core`.

mod canonical;
mod classify;
mod combination;
mod debug;
mod detector;
mod dictionary;
mod edge;
mod io;
mod params;
mod pose;
mod state;
mod tracker;

pub use canonical::{canonical_target, rectify, rotate_corners, CanonicalError, CanonicalMarker};
pub use classify::{GlyphClassifier, GlyphRecognizer, MatchPolicy, RecognizerError};
pub use combination::{virtual_pose, CombinationLink, FrameCombinations, ResolvedCombination};
pub use debug::{CandidateDebug, DetectionDebug, RejectReason};
pub use detector::{FrameDetection, MarkerDetector};
pub use dictionary::{CombinationEntry, DictionaryError, GlyphEntry, LabelDictionary, LabelId};
pub use edge::{strip_length, EdgeRefiner, EdgeStrip, EdgeTrace, RefineError, RefinedQuad};
pub use io::{ConfigError, FrameReport, TrackerConfig, TrackerIoError};
pub use params::{CanonicalParams, DetectorParams, EdgePolarity, EdgeRefineParams};
pub use pose::{
    marker_model_corners, Axis, AxisRotation, ModelAdjustment, Pose, PoseError, PoseEstimator,
};
pub use state::{DetectedMarker, TrackerState};
pub use tracker::Tracker;

pub use kanji_ar_core::{CameraIntrinsics, ColorImageView, GrayImage, GrayImageView};
