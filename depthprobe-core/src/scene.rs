//! A captured scene: depth frame plus the TSDF volume fused for it

use crate::{DepthImage, VoxelGrid};

/// One reconstructed scene frame
///
/// Bundles a depth image with the TSDF grid fused from the same viewpoint;
/// this is the binding context for the ring-sampling engine.
#[derive(Debug, Clone)]
pub struct Scene {
    pub im: DepthImage,
    pub tsdf: VoxelGrid,
}

impl Scene {
    pub fn new(im: DepthImage, tsdf: VoxelGrid) -> Self {
        Self { im, tsdf }
    }
}
