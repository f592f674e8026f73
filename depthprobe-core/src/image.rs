//! Depth images with camera calibration and optional per-pixel attachments

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::{Camera, DepthProvider, Error, Result};

/// A (row, col) pixel location in a depth image
pub type PixelIndex = (usize, usize);

/// Row-major flattened position of a pixel in an image of the given width
pub fn flat_index(index: PixelIndex, width: usize) -> usize {
    index.0 * width + index.1
}

/// A depth image bound to a calibrated camera
///
/// Depth is in world units; NaN marks invalid pixels. The optional mask
/// marks pixels belonging to the surface of interest. World normals and
/// spider channels are produced elsewhere and attached before the samplers
/// that consume them run.
#[derive(Debug, Clone)]
pub struct DepthImage {
    depth: Array2<f32>,
    camera: Camera,
    mask: Option<Array2<bool>>,
    world_normals: Option<Array2<f32>>,
    spider_channels: Option<Array3<f32>>,
}

impl DepthImage {
    pub fn new(depth: Array2<f32>, camera: Camera) -> Self {
        Self {
            depth,
            camera,
            mask: None,
            world_normals: None,
            spider_channels: None,
        }
    }

    pub fn height(&self) -> usize {
        self.depth.nrows()
    }

    pub fn width(&self) -> usize {
        self.depth.ncols()
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Attach a validity mask; must match the depth shape
    pub fn set_mask(&mut self, mask: Array2<bool>) -> Result<()> {
        if mask.dim() != self.depth.dim() {
            return Err(Error::InvalidData(format!(
                "mask shape {:?} does not match depth shape {:?}",
                mask.dim(),
                self.depth.dim()
            )));
        }
        self.mask = Some(mask);
        Ok(())
    }

    /// Attach precomputed per-pixel world normals (H*W x 3, row-major)
    pub fn set_world_normals(&mut self, normals: Array2<f32>) -> Result<()> {
        if normals.dim() != (self.depth.len(), 3) {
            return Err(Error::InvalidData(format!(
                "normals shape {:?} does not match {} pixels",
                normals.dim(),
                self.depth.len()
            )));
        }
        self.world_normals = Some(normals);
        Ok(())
    }

    /// Attach a precomputed HxWxC channel volume
    pub fn set_spider_channels(&mut self, channels: Array3<f32>) -> Result<()> {
        let (h, w, _) = channels.dim();
        if (h, w) != self.depth.dim() {
            return Err(Error::InvalidData(format!(
                "channel volume shape {:?} does not match depth shape {:?}",
                channels.dim(),
                self.depth.dim()
            )));
        }
        self.spider_channels = Some(channels);
        Ok(())
    }
}

impl DepthProvider for DepthImage {
    fn depth(&self) -> ArrayView2<'_, f32> {
        self.depth.view()
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn mask(&self) -> Option<ArrayView2<'_, bool>> {
        self.mask.as_ref().map(|m| m.view())
    }

    fn world_xyz(&self) -> Array2<f32> {
        let (h, w) = self.depth.dim();
        let mut xyz = Array2::zeros((h * w, 3));
        for ((row, col), &depth) in self.depth.indexed_iter() {
            let point = self.camera.reproject(row as f32, col as f32, depth);
            let i = row * w + col;
            xyz[[i, 0]] = point.x;
            xyz[[i, 1]] = point.y;
            xyz[[i, 2]] = point.z;
        }
        xyz
    }

    fn world_normals(&self) -> Result<ArrayView2<'_, f32>> {
        self.world_normals
            .as_ref()
            .map(|n| n.view())
            .ok_or(Error::NotBound("world normals"))
    }

    fn spider_channels(&self) -> Option<ArrayView3<'_, f32>> {
        self.spider_channels.as_ref().map(|c| c.view())
    }
}
