//! Ring-sampled voxel-grid features oriented by surface normals

use depthprobe_core::{
    flat_index, DepthProvider, Error, PixelIndex, Point3f, Result, Scene, Vector3f, VoxelProvider,
};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Elevations of the main sweep, in degrees
const ELEVATIONS: [f32; 3] = [-45.0, 0.0, 45.0];

/// Azimuth steps per ring sweep, 45 degrees apart
const NUM_AZIMUTHS: usize = 8;

/// Samples contributed by one ring: 3 elevations x 8 azimuths + 2 poles
pub const SAMPLES_PER_RING: usize = ELEVATIONS.len() * NUM_AZIMUTHS + 2;

/// Probes a TSDF grid on concentric rings around a surface point
///
/// The rings are swept in the grid's world frame, with the azimuthal start
/// taken from the heading of the point's normal; the grid is assumed to be
/// oriented with its up direction pointing upwards. Units are world units.
pub struct SampledFeatures<'a> {
    num_rings: usize,
    radius: f32,
    sc: Option<&'a Scene>,
}

impl<'a> SampledFeatures<'a> {
    pub fn new(num_rings: usize, radius: f32) -> Result<Self> {
        if num_rings == 0 {
            return Err(Error::InvalidData(
                "num_rings must be at least 1".to_string(),
            ));
        }
        if radius <= 0.0 {
            return Err(Error::InvalidData("radius must be positive".to_string()));
        }
        Ok(Self {
            num_rings,
            radius,
            sc: None,
        })
    }

    /// Bind the scene whose TSDF grid and image the samplers read
    pub fn set_scene(&mut self, sc: &'a Scene) {
        self.sc = Some(sc);
    }

    /// Feature length produced per sampled point
    pub fn feature_len(&self) -> usize {
        self.num_rings * SAMPLES_PER_RING
    }

    /// World-space sample locations around a point
    ///
    /// Ring radii grow as radius * (1 + i). The main sweep emits, per ring,
    /// every elevation/azimuth combination; the two pole points per ring
    /// follow as a second pass after the whole sweep, so per-ring blocks of
    /// 24 come first and all poles last.
    pub fn sample_locations(&self, point: Point3f, normal: Vector3f) -> Array2<f32> {
        let start_angle = normal.x.atan2(normal.y).to_degrees();
        let ring_offsets: Vec<f32> = (0..self.num_rings)
            .map(|i| self.radius * (1 + i) as f32)
            .collect();

        let mut locations: Vec<[f32; 3]> = Vec::with_capacity(self.feature_len());
        for &r in &ring_offsets {
            for elevation_deg in ELEVATIONS {
                let elevation = elevation_deg.to_radians();
                let z = r * elevation.sin();
                let cos_elevation = elevation.cos();
                for k in 0..NUM_AZIMUTHS {
                    let azimuth = (start_angle + (k * 45) as f32).to_radians();
                    locations.push([
                        r * azimuth.sin() * cos_elevation,
                        r * azimuth.cos() * cos_elevation,
                        z,
                    ]);
                }
            }
        }
        // top and bottom probes, appended after the full sweep
        for &r in &ring_offsets {
            locations.push([0.0, 0.0, r]);
            locations.push([0.0, 0.0, -r]);
        }

        Array2::from_shape_fn((locations.len(), 3), |(i, axis)| {
            locations[i][axis] + point[axis]
        })
    }

    /// Sampled grid values for a single surface point
    ///
    /// Probes outside the grid yield the grid's out-of-bounds sentinel.
    pub fn single_sample(&self, point: Point3f, normal: Vector3f) -> Result<Array1<f32>> {
        let sc = self.sc.ok_or(Error::NotBound("scene"))?;
        let locations = self.sample_locations(point, normal);
        let idxs = sc.tsdf.world_to_idx(locations.view());
        sc.tsdf.get_idxs(idxs.view(), true)
    }

    /// Sampled features for a batch of pixels, rows in input order
    ///
    /// World points and normals are looked up on the scene's image, which
    /// must carry precomputed world normals.
    pub fn sample_idxs(&self, idxs: &[PixelIndex]) -> Result<Array2<f32>> {
        let sc = self.sc.ok_or(Error::NotBound("scene"))?;
        let (h, w) = sc.im.depth().dim();
        let xyz = sc.im.world_xyz();
        let normals = sc.im.world_normals()?;

        let rows: Vec<Array1<f32>> = idxs
            .par_iter()
            .map(|&index| {
                let (row, col) = index;
                if row >= h || col >= w {
                    return Err(Error::OutOfBounds(format!(
                        "pixel ({}, {}) outside {}x{} image",
                        row, col, h, w
                    )));
                }
                let i = flat_index(index, w);
                let point = Point3f::new(xyz[[i, 0]], xyz[[i, 1]], xyz[[i, 2]]);
                let normal = Vector3f::new(normals[[i, 0]], normals[[i, 1]], normals[[i, 2]]);
                self.single_sample(point, normal)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut out = Array2::zeros((rows.len(), self.feature_len()));
        for (i, row) in rows.iter().enumerate() {
            out.row_mut(i).assign(row);
        }
        Ok(out)
    }
}
