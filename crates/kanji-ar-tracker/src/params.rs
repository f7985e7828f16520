use kanji_ar_core::CameraIntrinsics;
use serde::{Deserialize, Serialize};

use crate::classify::MatchPolicy;

/// Which intensity transition marks the marker's outer edge, as seen
/// walking from inside the quad to outside.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolarity {
    /// Dark marker on bright paper: intensity rises outward.
    #[default]
    DarkInside,
    /// Bright marker on a dark background: intensity falls outward.
    BrightInside,
    /// Strongest transition of either sign.
    Any,
}

impl EdgePolarity {
    #[inline]
    pub fn response(self, gradient: f64) -> f64 {
        match self {
            EdgePolarity::DarkInside => gradient,
            EdgePolarity::BrightInside => -gradient,
            EdgePolarity::Any => gradient.abs(),
        }
    }
}

/// Sub-pixel edge refinement settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRefineParams {
    /// Each edge is split into this many segments; the interior split
    /// points are the sample positions.
    pub segments: usize,
    /// Strip length as a fraction of the segment length.
    pub strip_scale: f64,
    /// Lower bound on the strip length (forced odd afterwards).
    pub min_strip_len: usize,
    /// Intensity used for strip samples that fall outside the frame.
    pub fallback_intensity: f64,
    pub polarity: EdgePolarity,
    /// Adjacent fitted lines with `|u0 x u1|` below this are parallel.
    pub parallel_eps: f64,
}

impl Default for EdgeRefineParams {
    fn default() -> Self {
        Self {
            segments: 7,
            strip_scale: 0.8,
            min_strip_len: 5,
            fallback_intensity: 127.0,
            polarity: EdgePolarity::DarkInside,
            parallel_eps: kanji_ar_core::PARALLEL_EPS,
        }
    }
}

/// Canonical (rectified) marker image settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalParams {
    /// Side of the square canonical image in pixels.
    pub size: usize,
    /// Binarization threshold applied after rectification.
    pub threshold: u8,
    /// Erosion radius (square element of side `2r + 1`).
    pub erode_radius: usize,
    /// Accept only when `flood_min < mean < flood_max` after the corner
    /// flood fill.
    pub flood_min: f64,
    pub flood_max: f64,
    /// Side of the bottom-left patch that must be dark once oriented.
    pub orientation_patch: usize,
    pub orientation_threshold: f64,
    /// Turn limit before a candidate is dropped; values above 4 act as 4.
    pub max_rotations: u8,
}

impl Default for CanonicalParams {
    fn default() -> Self {
        Self {
            size: 100,
            threshold: 55,
            erode_radius: 1,
            flood_min: 128.0,
            flood_max: 240.0,
            orientation_patch: 20,
            orientation_threshold: 128.0,
            max_rotations: 4,
        }
    }
}

/// Parameters for [`crate::MarkerDetector`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    /// Minimum bounding-box side of a candidate quad.
    pub min_side_px: i32,
    /// Candidates must be at least this much smaller than the frame.
    pub frame_margin_px: i32,
    pub edge: EdgeRefineParams,
    pub canonical: CanonicalParams,
    /// Physical marker side length in meters.
    pub marker_size_m: f64,
    pub match_policy: MatchPolicy,
    pub intrinsics: CameraIntrinsics,
    /// Record a [`crate::DetectionDebug`] for every frame.
    pub collect_debug: bool,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            approx_epsilon_frac: 0.02,
            min_side_px: 20,
            frame_margin_px: 10,
            edge: EdgeRefineParams::default(),
            canonical: CanonicalParams::default(),
            marker_size_m: 0.041,
            match_policy: MatchPolicy::default(),
            intrinsics: CameraIntrinsics::default(),
            collect_debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let p: DetectorParams =
            serde_json::from_str(r#"{"marker_size_m": 0.05, "edge": {"polarity": "any"}}"#)
                .unwrap();
        assert_eq!(p.marker_size_m, 0.05);
        assert_eq!(p.edge.polarity, EdgePolarity::Any);
        assert_eq!(p.edge.segments, 7);
        assert_eq!(p.canonical.threshold, 55);
        assert_eq!(p.match_policy, MatchPolicy::LastSubstring);
    }

    #[test]
    fn polarity_response_signs() {
        assert_eq!(EdgePolarity::DarkInside.response(-4.0), -4.0);
        assert_eq!(EdgePolarity::BrightInside.response(-4.0), 4.0);
        assert_eq!(EdgePolarity::Any.response(-4.0), 4.0);
    }
}
