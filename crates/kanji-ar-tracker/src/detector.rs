//! Frame-level glyph marker detection.
//!
//! Binarize, extract contours, keep 4-gons of plausible size, refine their
//! corners, rectify to the canonical image, validate, orient, classify and
//! finally estimate the pose. Every failure is local to one candidate.

use kanji_ar_core::{
    approx_poly_dp, arc_length, bounding_rect, ensure_clockwise, find_contours, threshold_binary,
    ColorImageView, Contour, GrayImageView,
};
use nalgebra::Point2;

use crate::canonical::{rectify, rotate_corners};
use crate::classify::{GlyphClassifier, GlyphRecognizer};
use crate::debug::{CandidateDebug, DetectionDebug, RejectReason};
use crate::dictionary::LabelDictionary;
use crate::edge::EdgeRefiner;
use crate::params::DetectorParams;
use crate::pose::PoseEstimator;
use crate::state::{DetectedMarker, TrackerState};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Detections of one frame, with diagnostics when requested.
#[derive(Clone, Debug, Default)]
pub struct FrameDetection {
    pub markers: TrackerState,
    pub debug: Option<DetectionDebug>,
}

/// Glyph marker detector.
pub struct MarkerDetector<R> {
    params: DetectorParams,
    refiner: EdgeRefiner,
    classifier: GlyphClassifier<R>,
    estimator: PoseEstimator,
}

impl<R: GlyphRecognizer> MarkerDetector<R> {
    pub fn new(params: DetectorParams, dictionary: LabelDictionary, recognizer: R) -> Self {
        let classifier = GlyphClassifier::new(recognizer, dictionary, params.match_policy);
        Self {
            refiner: EdgeRefiner::new(params.edge),
            estimator: PoseEstimator::new(params.intrinsics),
            classifier,
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    #[inline]
    pub fn dictionary(&self) -> &LabelDictionary {
        self.classifier.dictionary()
    }

    #[inline]
    pub fn estimator(&self) -> &PoseEstimator {
        &self.estimator
    }

    /// Detect markers in a grayscale frame binarized at `threshold`.
    pub fn detect(&self, gray: &GrayImageView<'_>, threshold: u8) -> TrackerState {
        self.run(gray, threshold, None)
    }

    /// [`Self::detect`] on an interleaved color frame.
    pub fn detect_color(&self, frame: &ColorImageView<'_>, threshold: u8) -> TrackerState {
        let gray = frame.to_gray();
        self.detect(&gray.view(), threshold)
    }

    /// Detect and always collect diagnostics.
    pub fn detect_with_debug(
        &self,
        gray: &GrayImageView<'_>,
        threshold: u8,
    ) -> (TrackerState, DetectionDebug) {
        let mut debug = DetectionDebug {
            threshold,
            ..DetectionDebug::default()
        };
        let markers = self.run(gray, threshold, Some(&mut debug));
        (markers, debug)
    }

    /// Detect, collecting diagnostics only if `collect_debug` is set.
    pub fn detect_frame(&self, gray: &GrayImageView<'_>, threshold: u8) -> FrameDetection {
        if self.params.collect_debug {
            let (markers, debug) = self.detect_with_debug(gray, threshold);
            FrameDetection {
                markers,
                debug: Some(debug),
            }
        } else {
            FrameDetection {
                markers: self.detect(gray, threshold),
                debug: None,
            }
        }
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, gray, debug),
            fields(width = gray.width, height = gray.height)
        )
    )]
    fn run(
        &self,
        gray: &GrayImageView<'_>,
        threshold: u8,
        mut debug: Option<&mut DetectionDebug>,
    ) -> TrackerState {
        let binary = threshold_binary(gray, threshold);
        let contours = find_contours(&binary.view());
        if let Some(d) = debug.as_deref_mut() {
            d.contours = contours.len();
        }

        let mut state = TrackerState::new();
        let mut candidates = 0usize;
        for contour in &contours {
            let Some(quad) = self.candidate_quad(contour, gray) else {
                continue;
            };
            candidates += 1;
            let mut cand = debug.is_some().then(|| CandidateDebug::new(quad));
            match self.process_candidate(gray, &quad, cand.as_mut()) {
                Ok(marker) => {
                    if let Some(prev) = state.insert(marker) {
                        log::debug!("label {} seen twice, keeping the later quad", prev.id);
                    }
                }
                Err(reason) => {
                    log::debug!("candidate {} rejected: {reason}", candidates - 1);
                    if let Some(c) = cand.as_mut() {
                        c.reject = Some(reason);
                    }
                }
            }
            if let (Some(d), Some(c)) = (debug.as_deref_mut(), cand) {
                d.candidates.push(c);
            }
        }

        log::debug!(
            "threshold {threshold}: {} contours, {candidates} quads, {} markers",
            contours.len(),
            state.len()
        );
        state
    }

    /// Clockwise quad from a contour, if it simplifies to four vertices and
    /// fits the size window.
    fn candidate_quad(
        &self,
        contour: &Contour,
        gray: &GrayImageView<'_>,
    ) -> Option<[Point2<f64>; 4]> {
        let eps = self.params.approx_epsilon_frac * arc_length(&contour.points);
        let poly = approx_poly_dp(&contour.points, eps);
        if poly.len() != 4 {
            return None;
        }
        let rect = bounding_rect(&poly);
        let min_side = self.params.min_side_px;
        let max_w = gray.width as i32 - self.params.frame_margin_px;
        let max_h = gray.height as i32 - self.params.frame_margin_px;
        if rect.width < min_side || rect.height < min_side || rect.width > max_w || rect.height > max_h
        {
            return None;
        }
        let mut quad = [Point2::origin(); 4];
        for (q, p) in quad.iter_mut().zip(&poly) {
            *q = Point2::new(p.x as f64, p.y as f64);
        }
        ensure_clockwise(&mut quad);
        Some(quad)
    }

    fn process_candidate(
        &self,
        gray: &GrayImageView<'_>,
        quad: &[Point2<f64>; 4],
        mut cand: Option<&mut CandidateDebug>,
    ) -> Result<DetectedMarker, RejectReason> {
        let refined = self.refiner.refine(quad, gray)?;
        if let Some(c) = cand.as_deref_mut() {
            c.edges = refined.edges.to_vec();
            c.corners = Some(refined.corners);
        }

        let canonical = rectify(gray, &refined.corners, &self.params.canonical)?;
        let label = self.classifier.classify(&canonical.image.view());
        if let Some(c) = cand.as_deref_mut() {
            c.flood_mean = Some(canonical.flood_mean);
            c.rotations = Some(canonical.rotations);
            c.canonical = Some(canonical.image);
            c.label = label;
        }
        let id = label.ok_or(RejectReason::Unrecognized)?;

        let image_corners = rotate_corners(&refined.corners, canonical.rotations);
        let intrinsics = self.estimator.intrinsics();
        let camera_corners = image_corners.map(|c| intrinsics.image_to_centered(c));
        let pose = self
            .estimator
            .estimate(&camera_corners, self.params.marker_size_m)?;

        let glyph = self
            .dictionary()
            .glyph(id)
            .map(|g| g.glyph.clone())
            .unwrap_or_default();
        Ok(DetectedMarker {
            id,
            glyph,
            image_corners,
            camera_corners,
            pose,
            rotations: canonical.rotations,
        })
    }
}
