//! Canonical marker image: perspective rectification, binarization, the
//! border validity test and orientation normalization.

use kanji_ar_core::{
    erode_square, flood_fill_corners, homography_from_4pt, mean, region_mean, rotate_cw,
    threshold_binary, warp_perspective_gray, GrayImage, GrayImageView,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::params::CanonicalParams;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CanonicalError {
    #[error("refined corners do not define a homography")]
    DegenerateCorners,
    #[error("border fill mean {mean:.1} outside the accepted band")]
    FloodMeanOutOfBand { mean: f64 },
    #[error("no orientation block after {rotations} quarter turns")]
    Unoriented { rotations: u8 },
}

/// Rectified, binarized and upright marker interior, ready for recognition.
#[derive(Clone, Debug)]
pub struct CanonicalMarker {
    /// Eroded, oriented image with the border flooded white.
    pub image: GrayImage,
    /// Quarter turns clockwise applied to reach the upright orientation.
    pub rotations: u8,
    /// Mean of the non-eroded image after the border fill.
    pub flood_mean: f64,
}

/// Destination corners of the canonical square, clockwise from top-left,
/// at the outer pixel boundaries.
pub fn canonical_target(size: usize) -> [Point2<f64>; 4] {
    let s = size as f64 - 0.5;
    [
        Point2::new(-0.5, -0.5),
        Point2::new(s, -0.5),
        Point2::new(s, s),
        Point2::new(-0.5, s),
    ]
}

/// Re-index corners after `rotations` clockwise quarter turns of the
/// canonical image: `out[(i + k) % 4] = corners[i]`.
pub fn rotate_corners<T: Copy>(corners: &[T; 4], rotations: u8) -> [T; 4] {
    let k = rotations as usize % 4;
    let mut out = *corners;
    for (i, &c) in corners.iter().enumerate() {
        out[(i + k) % 4] = c;
    }
    out
}

/// Build the canonical image of the quad with clockwise `corners` in `gray`.
pub fn rectify(
    gray: &GrayImageView<'_>,
    corners: &[Point2<f64>; 4],
    params: &CanonicalParams,
) -> Result<CanonicalMarker, CanonicalError> {
    let size = params.size;
    let h = homography_from_4pt(&canonical_target(size), corners)
        .ok_or(CanonicalError::DegenerateCorners)?;
    let warped = warp_perspective_gray(gray, &h, size, size);
    let binary = threshold_binary(&warped.view(), params.threshold);
    let mut eroded = erode_square(&binary.view(), params.erode_radius);

    let mut filled = binary;
    flood_fill_corners(&mut filled, 255);
    let flood_mean = mean(&filled.view());
    if flood_mean <= params.flood_min || flood_mean >= params.flood_max {
        return Err(CanonicalError::FloodMeanOutOfBand { mean: flood_mean });
    }

    let patch = params.orientation_patch.min(size);
    let max_rotations = params.max_rotations.min(4);
    let mut rotations = 0u8;
    while region_mean(&eroded.view(), 0, size - patch, patch, patch) > params.orientation_threshold
    {
        eroded = rotate_cw(&eroded.view());
        rotations = rotations.saturating_add(1);
        if rotations >= max_rotations {
            return Err(CanonicalError::Unoriented { rotations });
        }
    }

    flood_fill_corners(&mut eroded, 255);
    Ok(CanonicalMarker {
        image: eroded,
        rotations,
        flood_mean,
    })
}
