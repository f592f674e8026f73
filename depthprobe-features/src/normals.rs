//! Surface differential estimation: normals and curvature
//!
//! Two normal estimators (image-space finite differences and voxel-grid
//! finite differences) plus height-field curvature. [`normalize_rows`]
//! deliberately lets zero-length rows divide to NaN/Inf; the voxel-grid
//! path clamps degenerate lengths instead. Downstream consumers rely on
//! both behaviors, so they stay distinct.

use depthprobe_core::{DepthProvider, Error, Result, VoxelProvider};
use nalgebra::Vector3;
use ndarray::{Array2, Array3, ArrayView2};

/// Finite-difference step, in voxels, for voxel-grid normals
const VOXEL_OFFSET: usize = 3;

/// Extra padding so reads near the grid boundary saturate
const VOXEL_MARGIN: usize = 10;

/// Length clamp for the guarded voxel-gradient normalization
const MIN_GRADIENT_LEN: f32 = 1e-4;

/// Normalize each row of an N x 3 table to unit length
///
/// Unguarded: a zero-length row divides to NaN. The input is untouched.
pub fn normalize_rows(vectors: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = vectors.to_owned();
    for mut row in out.outer_iter_mut() {
        let len = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        row.mapv_inplace(|v| v / len);
    }
    out
}

/// Numpy-convention gradient of a 2D field along both axes
///
/// Central differences in the interior, one-sided at the borders,
/// `spacing` between adjacent samples. Axes shorter than 2 yield zeros.
fn gradient(f: ArrayView2<'_, f32>, spacing: f32) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = f.dim();
    let mut d0 = Array2::zeros((h, w));
    let mut d1 = Array2::zeros((h, w));
    for r in 0..h {
        for c in 0..w {
            if h >= 2 {
                d0[[r, c]] = if r == 0 {
                    (f[[1, c]] - f[[0, c]]) / spacing
                } else if r == h - 1 {
                    (f[[h - 1, c]] - f[[h - 2, c]]) / spacing
                } else {
                    (f[[r + 1, c]] - f[[r - 1, c]]) / (2.0 * spacing)
                };
            }
            if w >= 2 {
                d1[[r, c]] = if c == 0 {
                    (f[[r, 1]] - f[[r, 0]]) / spacing
                } else if c == w - 1 {
                    (f[[r, w - 1]] - f[[r, w - 2]]) / spacing
                } else {
                    (f[[r, c + 1]] - f[[r, c - 1]]) / (2.0 * spacing)
                };
            }
        }
    }
    (d0, d1)
}

/// Per-pixel surface normals from the reprojected point cloud
///
/// Gradients of the three world coordinate grids along both image axes
/// give two tangent fields; their per-pixel cross product, normalized,
/// is the surface normal. Returns an H*W x 3 table in row-major pixel
/// order with NaN rows where the geometry is degenerate.
pub fn normals_from_depth(im: &dyn DepthProvider, stepsize: f32) -> Result<Array2<f32>> {
    let (h, w) = im.depth().dim();
    if h < 2 || w < 2 {
        return Err(Error::InvalidData(
            "need at least a 2x2 depth image".to_string(),
        ));
    }
    if stepsize <= 0.0 {
        return Err(Error::InvalidData("stepsize must be positive".to_string()));
    }

    let xyz = im.world_xyz();
    let coordinate_grid =
        |axis: usize| Array2::from_shape_fn((h, w), |(r, c)| xyz[[r * w + c, axis]]);
    let (dx0, dx1) = gradient(coordinate_grid(0).view(), stepsize);
    let (dy0, dy1) = gradient(coordinate_grid(1).view(), stepsize);
    let (dz0, dz1) = gradient(coordinate_grid(2).view(), stepsize);

    let mut cross = Array2::zeros((h * w, 3));
    for r in 0..h {
        for c in 0..w {
            let along_rows = Vector3::new(dx0[[r, c]], dy0[[r, c]], dz0[[r, c]]);
            let along_cols = Vector3::new(dx1[[r, c]], dy1[[r, c]], dz1[[r, c]]);
            let normal = along_rows.cross(&along_cols);
            let i = r * w + c;
            cross[[i, 0]] = normal.x;
            cross[[i, 1]] = normal.y;
            cross[[i, 2]] = normal.z;
        }
    }
    Ok(normalize_rows(cross.view()))
}

/// Mean and Gaussian curvature of the depth surface, plus the raw second
/// derivatives they were built from
#[derive(Debug, Clone)]
pub struct Curvature {
    pub mean: Array2<f32>,
    pub gaussian: Array2<f32>,
    pub zyy: Array2<f32>,
    pub zxx: Array2<f32>,
}

/// Height-field curvature from depth-image finite differences
///
/// Rows are y and columns x. The formulas are the textbook mean/Gaussian
/// curvature of the surface Z(x, y):
///
/// H = -[(Zx^2 + 1) Zyy - 2 Zx Zy Zxy + (Zy^2 + 1) Zxx]
///     / (2 (Zx^2 + Zy^2 + 1)^1.5)
/// K = (Zxx Zyy - Zxy^2) / (1 + Zx^2 + Zy^2)^2
pub fn curvature_from_depth(im: &dyn DepthProvider, offset: f32) -> Result<Curvature> {
    let depth = im.depth();
    let (h, w) = depth.dim();
    if h < 2 || w < 2 {
        return Err(Error::InvalidData(
            "need at least a 2x2 depth image".to_string(),
        ));
    }
    if offset <= 0.0 {
        return Err(Error::InvalidData("offset must be positive".to_string()));
    }

    let (zy, zx) = gradient(depth, offset);
    let (zxy, zxx) = gradient(zx.view(), offset);
    let (zyy, _) = gradient(zy.view(), offset);

    let mut mean = Array2::zeros((h, w));
    let mut gaussian = Array2::zeros((h, w));
    for r in 0..h {
        for c in 0..w {
            let (gx, gy) = (zx[[r, c]], zy[[r, c]]);
            let numerator = (gx * gx + 1.0) * zyy[[r, c]] - 2.0 * gx * gy * zxy[[r, c]]
                + (gy * gy + 1.0) * zxx[[r, c]];
            mean[[r, c]] = -numerator / (2.0 * (gx * gx + gy * gy + 1.0).powf(1.5));
            gaussian[[r, c]] = (zxx[[r, c]] * zyy[[r, c]] - zxy[[r, c]] * zxy[[r, c]])
                / (1.0 + gx * gx + gy * gy).powi(2);
        }
    }
    Ok(Curvature {
        mean,
        gaussian,
        zyy,
        zxx,
    })
}

/// Per-pixel normals from finite differences in a voxel grid
///
/// The grid is edge-padded so probes near its boundary saturate, and NaN
/// cells are filled with the grid's minimum before differencing. For each
/// masked-in pixel, the central difference along each grid axis at its
/// world location forms an unnormalized gradient; the gradient is
/// normalized with degenerate lengths clamped to a small epsilon, then
/// rotated from world into camera space. Pixels outside the mask keep
/// zero rows.
pub fn normals_from_voxels(
    im: &dyn DepthProvider,
    grid: &dyn VoxelProvider,
) -> Result<Array2<f32>> {
    let mask = im
        .mask()
        .ok_or_else(|| Error::InvalidData("image has no mask".to_string()))?;
    let values = grid.values();
    let (gx, gy, gz) = values.dim();
    if gx == 0 || gy == 0 || gz == 0 {
        return Err(Error::InvalidData("voxel grid is empty".to_string()));
    }

    let pad = (VOXEL_OFFSET + VOXEL_MARGIN) as i64;
    let global_min = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::INFINITY, f32::min);
    let padded = Array3::from_shape_fn(
        (
            gx + 2 * pad as usize,
            gy + 2 * pad as usize,
            gz + 2 * pad as usize,
        ),
        |(x, y, z)| {
            let sx = (x as i64 - pad).clamp(0, gx as i64 - 1) as usize;
            let sy = (y as i64 - pad).clamp(0, gy as i64 - 1) as usize;
            let sz = (z as i64 - pad).clamp(0, gz as i64 - 1) as usize;
            let v = values[[sx, sy, sz]];
            if v.is_nan() {
                global_min
            } else {
                v
            }
        },
    );
    let extents = padded.dim();
    let extents = [extents.0 as i64, extents.1 as i64, extents.2 as i64];
    let clamp = |v: i64, axis: usize| v.clamp(0, extents[axis] - 1) as usize;

    let xyz = im.world_xyz();
    let inliers: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m)
        .map(|(i, _)| i)
        .collect();
    let inlier_xyz = Array2::from_shape_fn((inliers.len(), 3), |(i, a)| xyz[[inliers[i], a]]);
    let idx = grid.world_to_idx(inlier_xyz.view());

    let inv_rotation = im.camera().inv_rotation();
    let mut normals = Array2::zeros((mask.len(), 3));
    for (i, &pixel) in inliers.iter().enumerate() {
        let base = [
            idx[[i, 0]] as i64 + pad,
            idx[[i, 1]] as i64 + pad,
            idx[[i, 2]] as i64 + pad,
        ];
        let mut diff = Vector3::zeros();
        for axis in 0..3 {
            let mut plus = base;
            let mut minus = base;
            plus[axis] += VOXEL_OFFSET as i64;
            minus[axis] -= VOXEL_OFFSET as i64;
            let value_plus = padded[[clamp(plus[0], 0), clamp(plus[1], 1), clamp(plus[2], 2)]];
            let value_minus =
                padded[[clamp(minus[0], 0), clamp(minus[1], 1), clamp(minus[2], 2)]];
            diff[axis] = value_plus - value_minus;
        }

        let mut len = diff.norm();
        if len == 0.0 {
            len = MIN_GRADIENT_LEN;
        }
        let normal = inv_rotation * (diff / len);
        normals[[pixel, 0]] = normal.x;
        normals[[pixel, 1]] = normal.y;
        normals[[pixel, 2]] = normal.z;
    }
    Ok(normals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use depthprobe_core::{Camera, CameraIntrinsics, DepthImage, Point3, VoxelGrid};
    use ndarray::array;

    fn test_camera() -> Camera {
        Camera::from_intrinsics(CameraIntrinsics::new(50.0, 50.0, 8.0, 8.0)).unwrap()
    }

    #[test]
    fn test_normalize_rows_unit_length() {
        let v = array![[3.0, 0.0, 4.0], [0.0, 2.0, 0.0]];
        let n = normalize_rows(v.view());
        assert_relative_eq!(n[[0, 0]], 0.6);
        assert_relative_eq!(n[[0, 2]], 0.8);
        assert_relative_eq!(n[[1, 1]], 1.0);
    }

    #[test]
    fn test_normalize_rows_zero_row_is_nan() {
        let v = array![[0.0, 0.0, 0.0]];
        let n = normalize_rows(v.view());
        assert!(n[[0, 0]].is_nan());
    }

    #[test]
    fn test_gradient_of_linear_field_is_exact() {
        let f = Array2::from_shape_fn((4, 5), |(r, c)| 2.0 * r as f32 + 3.0 * c as f32);
        let (d0, d1) = gradient(f.view(), 1.0);
        for v in d0.iter() {
            assert_relative_eq!(*v, 2.0);
        }
        for v in d1.iter() {
            assert_relative_eq!(*v, 3.0);
        }
    }

    #[test]
    fn test_gradient_respects_spacing() {
        let f = Array2::from_shape_fn((3, 3), |(r, _)| 4.0 * r as f32);
        let (d0, _) = gradient(f.view(), 2.0);
        for v in d0.iter() {
            assert_relative_eq!(*v, 2.0);
        }
    }

    #[test]
    fn test_planar_depth_gives_constant_unit_normals() {
        let im = DepthImage::new(Array2::from_elem((16, 16), 2.0), test_camera());
        let normals = normals_from_depth(&im, 1.0).unwrap();
        for row in normals.outer_iter() {
            let norm = (row[0] * row[0] + row[1] * row[1] + row[2] * row[2]).sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-5);
            // constant-depth plane faces straight along -Z
            assert_relative_eq!(row[0], 0.0, epsilon = 1e-5);
            assert_relative_eq!(row[1], 0.0, epsilon = 1e-5);
            assert_relative_eq!(row[2], -1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_planar_depth_has_zero_curvature() {
        let depth = Array2::from_shape_fn((16, 16), |(r, c)| 0.5 + 0.01 * r as f32 + 0.02 * c as f32);
        let im = DepthImage::new(depth, test_camera());
        let curvature = curvature_from_depth(&im, 1.0).unwrap();
        for v in curvature.mean.iter() {
            assert_relative_eq!(*v, 0.0, epsilon = 1e-4);
        }
        for v in curvature.gaussian.iter() {
            assert_relative_eq!(*v, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_curvature_rejects_tiny_images() {
        let im = DepthImage::new(Array2::zeros((1, 5)), test_camera());
        assert!(curvature_from_depth(&im, 1.0).is_err());
    }

    #[test]
    fn test_voxel_normals_zero_gradient_is_finite() {
        // a uniform grid has no gradient anywhere; the clamped
        // normalization must yield finite (zero) normals, unlike
        // normalize_rows on the same input
        let mut im = DepthImage::new(Array2::from_elem((4, 4), 1.0), test_camera());
        im.set_mask(Array2::from_elem((4, 4), true)).unwrap();
        let grid = VoxelGrid::new(
            ndarray::Array3::from_elem((8, 8, 8), 0.5),
            Point3::new(-1.0, -1.0, -1.0),
            0.25,
        )
        .unwrap();
        let normals = normals_from_voxels(&im, &grid).unwrap();
        assert_eq!(normals.dim(), (16, 3));
        for v in normals.iter() {
            assert!(v.is_finite());
            assert_relative_eq!(*v, 0.0);
        }
    }

    #[test]
    fn test_voxel_normals_point_along_gradient() {
        // field increasing along world x; gradient and thus normal +x
        let mut im = DepthImage::new(Array2::from_elem((2, 2), 1.0), test_camera());
        im.set_mask(Array2::from_elem((2, 2), true)).unwrap();
        let values = ndarray::Array3::from_shape_fn((16, 16, 16), |(x, _, _)| x as f32);
        let grid = VoxelGrid::new(values, Point3::new(-2.0, -2.0, -2.0), 0.25).unwrap();
        let normals = normals_from_voxels(&im, &grid).unwrap();
        for row in normals.outer_iter() {
            assert_relative_eq!(row[0], 1.0, epsilon = 1e-5);
            assert_relative_eq!(row[1], 0.0, epsilon = 1e-5);
            assert_relative_eq!(row[2], 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_voxel_normals_skip_non_inliers() {
        let mut im = DepthImage::new(Array2::from_elem((2, 2), 1.0), test_camera());
        let mut mask = Array2::from_elem((2, 2), true);
        mask[[0, 0]] = false;
        im.set_mask(mask).unwrap();
        let values = ndarray::Array3::from_shape_fn((16, 16, 16), |(x, _, _)| x as f32);
        let grid = VoxelGrid::new(values, Point3::new(-2.0, -2.0, -2.0), 0.25).unwrap();
        let normals = normals_from_voxels(&im, &grid).unwrap();
        assert_relative_eq!(normals[[0, 0]], 0.0);
        assert_relative_eq!(normals[[1, 0]], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_voxel_normals_require_mask() {
        let im = DepthImage::new(Array2::from_elem((2, 2), 1.0), test_camera());
        let grid =
            VoxelGrid::new(ndarray::Array3::zeros((4, 4, 4)), Point3::origin(), 1.0).unwrap();
        assert!(normals_from_voxels(&im, &grid).is_err());
    }

    #[test]
    fn test_voxel_normals_nan_cells_filled_with_minimum() {
        // NaN cells take the global minimum, so a gradient into a NaN
        // region points away from it rather than poisoning the output
        let mut im = DepthImage::new(Array2::from_elem((2, 2), 1.0), test_camera());
        im.set_mask(Array2::from_elem((2, 2), true)).unwrap();
        let mut values = ndarray::Array3::from_elem((16, 16, 16), 1.0);
        for x in 12..16 {
            for y in 0..16 {
                for z in 0..16 {
                    values[[x, y, z]] = f32::NAN;
                }
            }
        }
        values[[0, 0, 0]] = 0.5; // the global minimum
        let grid = VoxelGrid::new(values, Point3::new(-2.0, -2.0, -2.0), 0.25).unwrap();
        let normals = normals_from_voxels(&im, &grid).unwrap();
        for v in normals.iter() {
            assert!(v.is_finite());
        }
    }
}
