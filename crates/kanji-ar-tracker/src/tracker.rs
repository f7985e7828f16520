use kanji_ar_core::{ColorImageView, GrayImageView};

use crate::classify::GlyphRecognizer;
use crate::combination::FrameCombinations;
use crate::debug::DetectionDebug;
use crate::detector::MarkerDetector;
use crate::state::TrackerState;

/// Stateful wrapper around [`MarkerDetector`] for render loops.
///
/// Detections accumulate across [`Tracker::track`] calls until the caller
/// invokes [`Tracker::reset`], normally once per frame after the overlays
/// have been drawn.
pub struct Tracker<R> {
    detector: MarkerDetector<R>,
    threshold: u8,
    state: TrackerState,
    last_debug: Option<DetectionDebug>,
}

impl<R: GlyphRecognizer> Tracker<R> {
    pub fn new(detector: MarkerDetector<R>, threshold: u8) -> Self {
        Self {
            detector,
            threshold,
            state: TrackerState::new(),
            last_debug: None,
        }
    }

    pub fn detector(&self) -> &MarkerDetector<R> {
        &self.detector
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold;
    }

    /// Detect in `gray` and merge the result into the current state.
    pub fn track(&mut self, gray: &GrayImageView<'_>) -> &TrackerState {
        let frame = self.detector.detect_frame(gray, self.threshold);
        self.state.extend(frame.markers);
        self.last_debug = frame.debug;
        &self.state
    }

    pub fn track_color(&mut self, frame: &ColorImageView<'_>) -> &TrackerState {
        let gray = frame.to_gray();
        self.track(&gray.view())
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Diagnostics of the last `track` call, if the detector collects them.
    pub fn last_debug(&self) -> Option<&DetectionDebug> {
        self.last_debug.as_ref()
    }

    /// Combinations among the current detections.
    pub fn combinations(&self) -> FrameCombinations {
        FrameCombinations::resolve(
            &self.state,
            self.detector.dictionary(),
            self.detector.estimator(),
            self.detector.params().marker_size_m,
        )
    }

    /// Drop all accumulated detections.
    pub fn reset(&mut self) {
        self.state.clear();
        self.last_debug = None;
    }
}
