//! Geometry and image primitives for glyph marker tracking.
//!
//! Everything here works on plain 8-bit grayscale buffers and `nalgebra`
//! types. There is no dependency on an image decoding crate.

mod camera;
mod contour;
mod homography;
mod image;
mod line;
mod logger;
mod morphology;
mod polygon;

pub use camera::{decompose_plane_homography, CameraIntrinsics, PlanePose};
pub use contour::{find_contours, Contour};
pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{
    sample_bilinear, sample_bilinear_or, sample_bilinear_u8, ChannelOrder, ColorImageView,
    GrayImage, GrayImageView,
};
pub use line::{fit_line, Line2, PARALLEL_EPS};
pub use morphology::{
    erode_square, flood_fill, flood_fill_corners, mean, region_mean, rotate_cw, threshold_binary,
};
pub use polygon::{
    approx_poly_dp, arc_length, bounding_rect, ensure_clockwise, signed_area, BoundingRect,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
