//! Facade crate for the `kanji-ar-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometry core and the tracking pipeline
//! - (feature `image`) helpers to run detection on `image` buffers, draw the
//!   diagnostic overlay and call an external OCR command as the recognizer
//! - (feature `cli`) the `kanji-ar` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use kanji_ar::detect::{gray_view, load_config};
//! use kanji_ar::recognizer::CommandRecognizer;
//! use kanji_ar::{FrameCombinations, MarkerDetector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, dictionary) = load_config("tracker.json")?;
//! let detector = MarkerDetector::new(config.detector.clone(), dictionary, CommandRecognizer::default());
//!
//! let img = image::open("frame.png")?.to_luma8();
//! let markers = detector.detect(&gray_view(&img), config.threshold);
//! let combos = FrameCombinations::resolve(
//!     &markers,
//!     detector.dictionary(),
//!     detector.estimator(),
//!     config.detector.marker_size_m,
//! );
//! println!("{} markers, {} combinations", markers.len(), combos.matches().count());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `kanji_ar::core`: images, contours, polygons, lines, homographies, camera model.
//! - `kanji_ar::tracker`: detector, edge refiner, classifier, pose, state.
//! - `kanji_ar::detect` (feature `image`): `image` buffer adapters and config loading.
//! - `kanji_ar::overlay` (feature `image`): diagnostic drawing.
//! - `kanji_ar::recognizer` (feature `image`): external OCR command.

pub use kanji_ar_core as core;
pub use kanji_ar_tracker as tracker;

pub use kanji_ar_tracker::{
    DetectedMarker, DetectorParams, FrameCombinations, GlyphRecognizer, LabelDictionary, LabelId,
    MarkerDetector, Pose, PoseEstimator, Tracker, TrackerConfig, TrackerState,
};

#[cfg(feature = "image")]
pub mod detect;
#[cfg(feature = "image")]
pub mod overlay;
#[cfg(feature = "image")]
pub mod recognizer;
