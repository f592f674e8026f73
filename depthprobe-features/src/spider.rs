//! Lookup of precomputed per-pixel channel features ("spider" features)

use depthprobe_core::{DepthProvider, Error, PixelIndex, Result};
use ndarray::{Array2, ArrayView3};

/// Gathers precomputed per-pixel feature channels
///
/// The channel volume is computed offline and attached to the image before
/// this engine wraps it; the engine itself is a fast-path accessor, not a
/// computation.
pub struct SpiderEngine<'a> {
    channels: ArrayView3<'a, f32>,
}

impl<'a> SpiderEngine<'a> {
    /// Wrap an image that carries a spider channel volume
    pub fn new(im: &'a dyn DepthProvider) -> Result<Self> {
        let channels = im.spider_channels().ok_or_else(|| {
            Error::InvalidData("image carries no spider channel volume".to_string())
        })?;
        Ok(Self { channels })
    }

    /// Channels stored per pixel
    pub fn num_channels(&self) -> usize {
        self.channels.dim().2
    }

    /// Gather the channel vector at each pixel
    ///
    /// # Panics
    /// Passing pixel coordinates inside the volume is the caller's
    /// contract; an out-of-range index panics.
    pub fn compute_spider_features(&self, idxs: &[PixelIndex]) -> Array2<f32> {
        let num_channels = self.num_channels();
        let mut out = Array2::zeros((idxs.len(), num_channels));
        for (i, &(row, col)) in idxs.iter().enumerate() {
            for k in 0..num_channels {
                out[[i, k]] = self.channels[[row, col, k]];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use depthprobe_core::{Camera, CameraIntrinsics, DepthImage};
    use ndarray::{Array2, Array3};

    fn channeled_image() -> DepthImage {
        let camera =
            Camera::from_intrinsics(CameraIntrinsics::new(100.0, 100.0, 4.0, 4.0)).unwrap();
        let mut im = DepthImage::new(Array2::from_elem((8, 8), 1.0), camera);
        // channel value encodes its source pixel and channel
        let channels =
            Array3::from_shape_fn((8, 8, 4), |(r, c, k)| (r * 100 + c * 10 + k) as f32);
        im.set_spider_channels(channels).unwrap();
        im
    }

    #[test]
    fn test_missing_channels_rejected() {
        let camera =
            Camera::from_intrinsics(CameraIntrinsics::new(100.0, 100.0, 4.0, 4.0)).unwrap();
        let im = DepthImage::new(Array2::from_elem((8, 8), 1.0), camera);
        assert!(SpiderEngine::new(&im).is_err());
    }

    #[test]
    fn test_gathers_channel_vectors() {
        let im = channeled_image();
        let engine = SpiderEngine::new(&im).unwrap();
        let features = engine.compute_spider_features(&[(2, 3), (7, 0)]);
        assert_eq!(features.dim(), (2, 4));
        assert_relative_eq!(features[[0, 0]], 230.0);
        assert_relative_eq!(features[[0, 3]], 233.0);
        assert_relative_eq!(features[[1, 1]], 701.0);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_index_panics() {
        let im = channeled_image();
        let engine = SpiderEngine::new(&im).unwrap();
        let _ = engine.compute_spider_features(&[(8, 0)]);
    }
}
