//! Pinhole camera model and pixel/world coordinate transforms

use nalgebra::{Matrix3, Matrix4, Point3};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Pinhole intrinsic parameters, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl CameraIntrinsics {
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }
}

/// A calibrated camera: intrinsics plus a camera-to-world pose
///
/// The pose maps camera coordinates into world coordinates; its inverse is
/// precomputed at construction so per-pixel transforms stay cheap.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    intrinsics: CameraIntrinsics,
    pose: Matrix4<f32>,
    inv_pose: Matrix4<f32>,
}

impl Camera {
    /// Create a camera from intrinsics and a camera-to-world pose matrix
    pub fn new(intrinsics: CameraIntrinsics, pose: Matrix4<f32>) -> Result<Self> {
        if intrinsics.fx <= 0.0 || intrinsics.fy <= 0.0 {
            return Err(Error::InvalidData(
                "focal lengths must be positive".to_string(),
            ));
        }
        let inv_pose = pose.try_inverse().ok_or_else(|| {
            Error::InvalidData("camera pose matrix is not invertible".to_string())
        })?;
        Ok(Self {
            intrinsics,
            pose,
            inv_pose,
        })
    }

    /// Camera whose frame coincides with the world frame
    pub fn from_intrinsics(intrinsics: CameraIntrinsics) -> Result<Self> {
        Self::new(intrinsics, Matrix4::identity())
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Focal length in pixels, as used for angular-to-pixel scaling
    pub fn estimate_focal_length(&self) -> f32 {
        self.intrinsics.fx
    }

    /// Rotation block of the camera-to-world pose
    pub fn rotation(&self) -> Matrix3<f32> {
        self.pose.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Rotation block of the world-to-camera transform
    pub fn inv_rotation(&self) -> Matrix3<f32> {
        self.inv_pose.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Back-project a pixel at the given depth into world coordinates
    ///
    /// NaN depth propagates to a NaN point rather than failing.
    pub fn reproject(&self, row: f32, col: f32, depth: f32) -> Point3<f32> {
        let x = (col - self.intrinsics.cx) * depth / self.intrinsics.fx;
        let y = (row - self.intrinsics.cy) * depth / self.intrinsics.fy;
        let cam = Point3::new(x, y, depth);
        let homogeneous = self.pose * cam.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(cam)
    }
}
