//! Provider traits decoupling the sampling engines from concrete data sources

use ndarray::{Array1, Array2, ArrayView2, ArrayView3};

use crate::{Camera, Result};

/// Read-only access to a depth image and its attached per-pixel data
///
/// Implemented by [`crate::DepthImage`]; synthetic test fixtures and other
/// sensor frontends can substitute their own implementation without touching
/// the sampling engines.
pub trait DepthProvider {
    /// The HxW depth array; NaN marks invalid pixels
    fn depth(&self) -> ArrayView2<'_, f32>;

    /// Camera calibration used to reproject pixels
    fn camera(&self) -> &Camera;

    /// Optional validity mask, same shape as the depth array
    fn mask(&self) -> Option<ArrayView2<'_, bool>>;

    /// World coordinates of every pixel as an H*W x 3 table in row-major
    /// pixel order, freshly allocated; rows are NaN where depth is NaN
    fn world_xyz(&self) -> Array2<f32>;

    /// Per-pixel world-space normals (H*W x 3); errors if none are attached
    fn world_normals(&self) -> Result<ArrayView2<'_, f32>>;

    /// Precomputed HxWxC feature channel volume, if attached
    fn spider_channels(&self) -> Option<ArrayView3<'_, f32>>;
}

/// Read-only access to a scalar voxel grid with world-coordinate addressing
pub trait VoxelProvider {
    /// The raw scalar field
    fn values(&self) -> ArrayView3<'_, f32>;

    /// Map world-space points (N x 3) to integer grid indices (N x 3)
    ///
    /// Indices may fall outside the grid extent; non-finite coordinates map
    /// to indices guaranteed to be out of bounds.
    fn world_to_idx(&self, points: ArrayView2<'_, f32>) -> Array2<i32>;

    /// Gather one scalar per index triple
    ///
    /// With `check_bounds`, out-of-range triples yield the grid's
    /// out-of-bounds sentinel; without it the first violation is a hard
    /// error.
    fn get_idxs(&self, idxs: ArrayView2<'_, i32>, check_bounds: bool) -> Result<Array1<f32>>;
}
