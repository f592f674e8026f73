//! Scalar voxel grids (occupancy or truncated signed distance fields)

use nalgebra::Point3;
use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3};

use crate::{Error, Result, VoxelProvider};

/// A 3D scalar field on a regular grid with a world-to-index mapping
///
/// Values may contain NaN for unknown cells. `oob_value` is the sentinel
/// substituted for out-of-bounds reads when bounds checking is enabled.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    values: Array3<f32>,
    origin: Point3<f32>,
    voxel_size: f32,
    oob_value: f32,
}

impl VoxelGrid {
    /// Create a grid from its scalar field, world origin, and voxel edge length
    pub fn new(values: Array3<f32>, origin: Point3<f32>, voxel_size: f32) -> Result<Self> {
        if voxel_size <= 0.0 {
            return Err(Error::InvalidData(
                "voxel_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            values,
            origin,
            voxel_size,
            oob_value: f32::NAN,
        })
    }

    /// Replace the sentinel returned for out-of-bounds reads (default NaN)
    pub fn with_oob_value(mut self, value: f32) -> Self {
        self.oob_value = value;
        self
    }

    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub fn oob_value(&self) -> f32 {
        self.oob_value
    }

    /// Grid extent along each axis
    pub fn shape(&self) -> (usize, usize, usize) {
        self.values.dim()
    }
}

impl VoxelProvider for VoxelGrid {
    fn values(&self) -> ArrayView3<'_, f32> {
        self.values.view()
    }

    fn world_to_idx(&self, points: ArrayView2<'_, f32>) -> Array2<i32> {
        let origin = [self.origin.x, self.origin.y, self.origin.z];
        Array2::from_shape_fn((points.nrows(), 3), |(i, axis)| {
            let v = (points[[i, axis]] - origin[axis]) / self.voxel_size;
            if v.is_nan() {
                // NaN coordinates must never alias cell 0
                i32::MIN
            } else {
                v.floor() as i32
            }
        })
    }

    fn get_idxs(&self, idxs: ArrayView2<'_, i32>, check_bounds: bool) -> Result<Array1<f32>> {
        let (dx, dy, dz) = self.values.dim();
        let dims = [dx as i32, dy as i32, dz as i32];
        let mut out = Array1::zeros(idxs.nrows());
        for i in 0..idxs.nrows() {
            let (x, y, z) = (idxs[[i, 0]], idxs[[i, 1]], idxs[[i, 2]]);
            let inside =
                x >= 0 && y >= 0 && z >= 0 && x < dims[0] && y < dims[1] && z < dims[2];
            out[i] = if inside {
                self.values[[x as usize, y as usize, z as usize]]
            } else if check_bounds {
                self.oob_value
            } else {
                return Err(Error::OutOfBounds(format!(
                    "voxel index ({}, {}, {}) outside grid of shape {:?}",
                    x,
                    y,
                    z,
                    self.values.dim()
                )));
            };
        }
        Ok(out)
    }
}
