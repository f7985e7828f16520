//! Pinhole camera model and plane-to-image homography decomposition.
//!
//! Camera space follows the OpenGL convention: x right, y up, the camera
//! looks down `-z`. Image space is x right, y down, origin at the top-left
//! pixel.

use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// Focal lengths and principal point in pixels, plus the frame size they
/// were derived for.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::from_vertical_fov(640, 480, 45.0)
    }
}

impl CameraIntrinsics {
    /// Square-pixel camera with the principal point at the frame center.
    pub fn from_vertical_fov(width: u32, height: u32, fov_y_deg: f64) -> Self {
        let half = (0.5 * fov_y_deg).to_radians();
        let f = 0.5 * height as f64 / half.tan();
        Self {
            fx: f,
            fy: f,
            cx: 0.5 * width as f64,
            cy: 0.5 * height as f64,
            width,
            height,
        }
    }

    /// Image pixel to camera-centered pixel coordinates (principal point at
    /// the origin, y up).
    #[inline]
    pub fn image_to_centered(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(p.x - self.cx, self.cy - p.y)
    }

    #[inline]
    pub fn centered_to_image(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(p.x + self.cx, self.cy - p.y)
    }

    /// Centered pixel coordinates to the normalized image plane.
    #[inline]
    pub fn centered_to_normalized(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(p.x / self.fx, p.y / self.fy)
    }

    /// Project a camera-space point (in front of the camera, `z < 0`) to
    /// image pixels.
    pub fn project(&self, p: Vector3<f64>) -> Option<Point2<f64>> {
        let depth = -p.z;
        if depth <= 0.0 || !depth.is_finite() {
            return None;
        }
        let centered = Point2::new(self.fx * p.x / depth, self.fy * p.y / depth);
        Some(self.centered_to_image(centered))
    }
}

/// Rigid motion recovered from a plane homography.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanePose {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

/// Decompose `m ~ [r1 r2 t]` (plane `z = 0` to camera) into a proper
/// rotation and translation.
///
/// The overall sign is fixed so that the plane origin lies in front of the
/// camera (`t.z < 0`). The rotation is re-orthonormalized: `r1` is
/// normalized, `r3 = r1 x r2` normalized, and `r2` rebuilt as `r3 x r1`.
pub fn decompose_plane_homography(m: &Matrix3<f64>) -> Option<PlanePose> {
    let m1: Vector3<f64> = m.column(0).into_owned();
    let m2: Vector3<f64> = m.column(1).into_owned();
    let m3: Vector3<f64> = m.column(2).into_owned();

    let n1 = m1.norm();
    let n2 = m2.norm();
    let denom = n1 + n2;
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    let mut lambda = 2.0 / denom;
    if m3.z * lambda > 0.0 {
        lambda = -lambda;
    }

    let r1 = (m1 * lambda).try_normalize(1e-12)?;
    let r2_raw = m2 * lambda;
    let r3 = r1.cross(&r2_raw).try_normalize(1e-12)?;
    let r2 = r3.cross(&r1);
    let t = m3 * lambda;

    let rotation = Matrix3::from_columns(&[r1, r2, r3]);
    if !rotation.iter().chain(t.iter()).all(|v| v.is_finite()) {
        return None;
    }
    Some(PlanePose {
        rotation,
        translation: t,
    })
}
