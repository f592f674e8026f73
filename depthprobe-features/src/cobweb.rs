//! Radial depth-difference profiles ("cobweb" features)

use depthprobe_core::{DepthProvider, Error, PixelIndex, Result};
use itertools::iproduct;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Radii sampled along each compass direction
const NUM_OFFSETS: usize = 10;

/// Compass directions, 45 degrees apart
const NUM_DIRECTIONS: usize = 8;

/// Length of one cobweb feature vector
pub const COBWEB_LEN: usize = NUM_OFFSETS * NUM_DIRECTIONS;

/// World-Z below which masked sampling treats a pixel as background
const MIN_WORLD_Z: f32 = 0.035;

/// Samples depth differences along compass directions at increasing radii
///
/// `t` is the step size in world meters at a depth of 1. Unless
/// `fixed_patch_size` is set, the pixel step shrinks in proportion to the
/// centre depth so the sampled pattern keeps a constant real-world
/// footprint.
pub struct CobwebEngine {
    t: f32,
    fixed_patch_size: bool,
    mask: Option<Array2<bool>>,
    start_angles: Option<Array2<f32>>,
    bound: Option<BoundImage>,
}

/// Snapshot taken at bind time; per-index sampling reads only this
struct BoundImage {
    /// Depth with masked and background pixels overwritten with NaN
    working: Array2<f32>,
    /// Depth exactly as the image provided it
    pristine: Array2<f32>,
    focal_length: f32,
}

impl CobwebEngine {
    pub fn new(t: f32, fixed_patch_size: bool) -> Self {
        Self {
            t,
            fixed_patch_size,
            mask: None,
            start_angles: None,
            bound: None,
        }
    }

    /// Mask applied to the working depth copy at bind time
    pub fn with_mask(mut self, mask: Array2<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Per-pixel start angles in degrees for the compass sweep
    ///
    /// Without this every profile starts at 0 degrees; supply local
    /// gradient orientations to rotate each profile into its surface frame.
    pub fn with_start_angles(mut self, angles: Array2<f32>) -> Self {
        self.start_angles = Some(angles);
        self
    }

    /// Bind an image, snapshotting its depth
    ///
    /// When a mask is configured, masked-out pixels and pixels whose world
    /// Z is below the background threshold become NaN in the working copy.
    /// The caller's image is never written to.
    pub fn set_image(&mut self, im: &dyn DepthProvider) -> Result<()> {
        let pristine = im.depth().to_owned();
        let mut working = pristine.clone();

        if let Some(angles) = &self.start_angles {
            if angles.dim() != working.dim() {
                return Err(Error::InvalidData(format!(
                    "start angle shape {:?} does not match depth shape {:?}",
                    angles.dim(),
                    working.dim()
                )));
            }
        }

        if let Some(mask) = &self.mask {
            if mask.dim() != working.dim() {
                return Err(Error::InvalidData(format!(
                    "mask shape {:?} does not match depth shape {:?}",
                    mask.dim(),
                    working.dim()
                )));
            }
            let (_, w) = working.dim();
            let xyz = im.world_xyz();
            for ((row, col), v) in working.indexed_iter_mut() {
                let world_z = xyz[[row * w + col, 2]];
                if !mask[[row, col]] || world_z < MIN_WORLD_Z {
                    *v = f32::NAN;
                }
            }
        }

        self.bound = Some(BoundImage {
            working,
            pristine,
            focal_length: im.camera().estimate_focal_length(),
        });
        Ok(())
    }

    /// Extract the cobweb vector at one pixel
    ///
    /// Targets are visited offset-major: all 8 directions at the first
    /// radius, then all 8 at the second, and so on. Slots whose target
    /// falls outside the image stay NaN, as do differences against masked
    /// depth. A zero or NaN centre depth makes the offsets degenerate and
    /// every slot invalid; that is a property of the sample, not an error.
    pub fn get_cobweb(&self, index: PixelIndex) -> Result<Array1<f32>> {
        let bound = self.bound.as_ref().ok_or(Error::NotBound("image"))?;
        let (h, w) = bound.working.dim();
        let (row, col) = index;
        if row >= h || col >= w {
            return Err(Error::OutOfBounds(format!(
                "pixel ({}, {}) outside {}x{} image",
                row, col, h, w
            )));
        }

        // the centre depth scaling the pattern comes from the unmasked
        // image; the differences use whatever the mask left behind
        let start_depth = bound.pristine[[row, col]];
        let offset_dist = if self.fixed_patch_size {
            bound.focal_length * self.t
        } else {
            bound.focal_length * self.t / start_depth
        };
        let start_angle = self.start_angles.as_ref().map_or(0.0, |a| a[[row, col]]);
        let center = bound.working[[row, col]];

        let mut cobweb = Array1::from_elem(COBWEB_LEN, f32::NAN);
        for (slot, (step, dir)) in iproduct!(1..=NUM_OFFSETS, 0..NUM_DIRECTIONS).enumerate() {
            let offset = offset_dist * step as f32;
            let angle = (start_angle + (dir * 45) as f32).to_radians();
            let target_row = row as f32 - offset * angle.sin();
            let target_col = col as f32 + offset * angle.cos();
            if !target_row.is_finite() || !target_col.is_finite() {
                continue;
            }
            // truncate toward zero, then bounds-check the integer target
            let (tr, tc) = (target_row as i64, target_col as i64);
            if tr >= 0 && tr < h as i64 && tc >= 0 && tc < w as i64 {
                cobweb[slot] = bound.working[[tr as usize, tc as usize]] - center;
            }
        }
        Ok(cobweb)
    }

    /// Extract cobwebs for a batch of pixels
    ///
    /// Elements are independent; the batch fans out across worker threads.
    pub fn extract_patches(&self, indices: &[PixelIndex]) -> Result<Vec<Array1<f32>>> {
        indices
            .par_iter()
            .map(|&index| self.get_cobweb(index))
            .collect()
    }
}
