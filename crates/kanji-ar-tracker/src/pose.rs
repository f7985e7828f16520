//! Marker pose from four refined corners.
//!
//! The marker frame has its origin at the marker center, x to the right and
//! y up along the upright glyph, z toward the viewer. A marker seen head-on
//! and upright therefore has the identity rotation.

use kanji_ar_core::{decompose_plane_homography, homography_from_4pt, CameraIntrinsics};
use nalgebra::{Matrix3, Matrix4, Point2, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoseError {
    #[error("marker size must be positive and finite")]
    InvalidMarkerSize,
    #[error("no homography through the corner configuration")]
    DegenerateCorners,
    #[error("homography does not decompose into a finite rigid motion")]
    NonFinite,
}

/// Rigid transform, marker frame to camera frame, as a row-major 4x4
/// matrix `[R | t; 0 0 0 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub matrix: [[f64; 4]; 4],
}

impl Pose {
    pub fn from_parts(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Self {
        let mut matrix = [[0.0; 4]; 4];
        for (r, row) in matrix.iter_mut().take(3).enumerate() {
            for (c, v) in row.iter_mut().take(3).enumerate() {
                *v = rotation[(r, c)];
            }
            row[3] = translation[r];
        }
        matrix[3][3] = 1.0;
        Self { matrix }
    }

    pub fn identity() -> Self {
        Self::from_parts(&Matrix3::identity(), &Vector3::zeros())
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        Matrix3::from_fn(|r, c| self.matrix[r][c])
    }

    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.matrix[0][3], self.matrix[1][3], self.matrix[2][3])
    }

    pub fn to_matrix4(&self) -> Matrix4<f64> {
        Matrix4::from_fn(|r, c| self.matrix[r][c])
    }

    /// Row-major flat copy.
    pub fn to_row_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.matrix[i / 4][i % 4];
        }
        out
    }

    /// Column-major flat copy, the layout OpenGL-style renderers load.
    pub fn to_column_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.matrix[i % 4][i / 4];
        }
        out
    }
}

/// Marker corners in the marker frame, in the same order as the canonical
/// image corners (top-left, top-right, bottom-right, bottom-left of the
/// upright glyph).
pub fn marker_model_corners(size: f64) -> [Point2<f64>; 4] {
    let h = 0.5 * size;
    [
        Point2::new(-h, h),
        Point2::new(h, h),
        Point2::new(h, -h),
        Point2::new(-h, -h),
    ]
}

/// Pose from corners under a fixed pinhole model.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoseEstimator {
    intrinsics: CameraIntrinsics,
}

impl PoseEstimator {
    pub fn new(intrinsics: CameraIntrinsics) -> Self {
        Self { intrinsics }
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Pose of a square of side `size` from its corners in camera-centered
    /// pixel coordinates (principal point at the origin, y up).
    ///
    /// No conditioning check is made on the corner configuration; nearly
    /// collinear corners yield an unstable pose rather than an error.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn estimate(&self, corners: &[Point2<f64>; 4], size: f64) -> Result<Pose, PoseError> {
        if size <= 0.0 || !size.is_finite() {
            return Err(PoseError::InvalidMarkerSize);
        }
        let normalized = corners.map(|c| self.intrinsics.centered_to_normalized(c));
        let h = homography_from_4pt(&marker_model_corners(size), &normalized)
            .ok_or(PoseError::DegenerateCorners)?;

        // The normalized image point is (X, Y) / -Z, so flipping the sign of
        // the third row turns H into lambda * [r1 r2 t].
        let flip = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        let plane = decompose_plane_homography(&(flip * h.h)).ok_or(PoseError::NonFinite)?;
        Ok(Pose::from_parts(&plane.rotation, &plane.translation))
    }

    /// Same as [`Self::estimate`], taking image-space pixel corners.
    pub fn estimate_from_image(
        &self,
        corners: &[Point2<f64>; 4],
        size: f64,
    ) -> Result<Pose, PoseError> {
        let centered = corners.map(|c| self.intrinsics.image_to_centered(c));
        self.estimate(&centered, size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRotation {
    pub axis: Axis,
    pub degrees: f64,
}

fn unit_scale() -> f64 {
    1.0
}

/// Per-label model placement: a uniform scale followed by a sequence of
/// axis rotations, applied in the marker frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelAdjustment {
    #[serde(default = "unit_scale")]
    pub scale: f64,
    #[serde(default)]
    pub rotations: Vec<AxisRotation>,
}

impl Default for ModelAdjustment {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotations: Vec::new(),
        }
    }
}

impl ModelAdjustment {
    /// `S * R_0 * R_1 * ...` as a homogeneous matrix.
    pub fn matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::new_scaling(self.scale);
        for r in &self.rotations {
            let rot = Rotation3::from_axis_angle(&r.axis.unit(), r.degrees.to_radians());
            m *= rot.to_homogeneous();
        }
        m
    }

    /// Model matrix for content anchored at `pose`.
    pub fn apply(&self, pose: &Pose) -> Matrix4<f64> {
        pose.to_matrix4() * self.matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn project_square(k: &CameraIntrinsics, pose: &Pose, size: f64) -> [Point2<f64>; 4] {
        let r = pose.rotation();
        let t = pose.translation();
        marker_model_corners(size).map(|p| {
            let cam = r * Vector3::new(p.x, p.y, 0.0) + t;
            let img = k.project(cam).expect("in front of the camera");
            k.image_to_centered(img)
        })
    }

    #[test]
    fn head_on_square_has_identity_rotation() {
        let k = CameraIntrinsics::default();
        let est = PoseEstimator::new(k);
        for depth in [0.2, 0.4, 0.8] {
            let truth = Pose::from_parts(&Matrix3::identity(), &Vector3::new(0.0, 0.0, -depth));
            let corners = project_square(&k, &truth, 0.041);
            let pose = est.estimate(&corners, 0.041).unwrap();
            assert_abs_diff_eq!(pose.rotation(), Matrix3::identity(), epsilon = 1e-9);
            assert_abs_diff_eq!(pose.translation().norm(), depth, epsilon = 1e-9);
        }
    }

    #[test]
    fn recovers_tilted_pose_as_a_proper_rotation() {
        let k = CameraIntrinsics::default();
        let rot = Rotation3::from_euler_angles(0.35, -0.2, 0.6).into_inner();
        let truth = Pose::from_parts(&rot, &Vector3::new(0.03, -0.01, -0.5));
        let corners = project_square(&k, &truth, 0.041);

        let pose = PoseEstimator::new(k).estimate(&corners, 0.041).unwrap();
        let r = pose.rotation();
        assert_abs_diff_eq!(r.transpose() * r, Matrix3::identity(), epsilon = 1e-9);
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r, rot, epsilon = 1e-6);
        assert_abs_diff_eq!(pose.translation(), truth.translation(), epsilon = 1e-6);
    }

    #[test]
    fn image_corners_use_the_principal_point() {
        let k = CameraIntrinsics::default();
        let half = 0.5 * 0.041 * k.fx / 0.3;
        let (cx, cy) = (k.cx, k.cy);
        let image = [
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ];
        let pose = PoseEstimator::new(k)
            .estimate_from_image(&image, 0.041)
            .unwrap();
        assert_abs_diff_eq!(
            pose.translation(),
            Vector3::new(0.0, 0.0, -0.3),
            epsilon = 1e-9
        );
    }

    #[test]
    fn invalid_size_is_rejected() {
        let est = PoseEstimator::default();
        let c = marker_model_corners(10.0);
        assert_eq!(est.estimate(&c, 0.0), Err(PoseError::InvalidMarkerSize));
        assert_eq!(est.estimate(&c, f64::NAN), Err(PoseError::InvalidMarkerSize));
    }

    #[test]
    fn layouts_agree() {
        let pose = Pose::from_parts(
            &Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0),
            &Vector3::new(10.0, 11.0, 12.0),
        );
        let rm = pose.to_row_major();
        let cm = pose.to_column_major();
        assert_eq!(&rm[..4], &[1.0, 2.0, 3.0, 10.0]);
        assert_eq!(&cm[..4], &[1.0, 4.0, 7.0, 0.0]);
        assert_eq!(rm[15], 1.0);
        assert_eq!(pose.to_matrix4()[(2, 3)], 12.0);
    }

    #[test]
    fn adjustment_scales_then_rotates() {
        let adj = ModelAdjustment {
            scale: 0.5,
            rotations: vec![AxisRotation {
                axis: Axis::X,
                degrees: 90.0,
            }],
        };
        let m = adj.apply(&Pose::identity());
        // Model +y maps to marker +z after the quarter turn about x.
        let v = m * nalgebra::Vector4::new(0.0, 2.0, 0.0, 1.0);
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.z, 1.0, epsilon = 1e-12);
        assert_eq!(ModelAdjustment::default().matrix(), Matrix4::identity());
    }
}
