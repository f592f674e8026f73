//! # depthprobe features
//!
//! Feature sampling engines for local surface geometry.
//!
//! The engines here turn a depth frame (and optionally a fused TSDF grid)
//! into fixed-length per-pixel descriptors:
//!
//! - **Cobweb**: depth differences along compass directions at increasing
//!   radii around a pixel
//! - **Spider**: lookup of channel vectors precomputed per pixel
//! - **Normals / curvature**: surface differentials from the depth image or
//!   from a voxel grid
//! - **Sampled features**: normal-oriented ring probes of a TSDF grid
//!
//! All engines read their inputs through the provider traits in
//! `depthprobe-core` and never mutate caller-owned data.

pub mod cobweb;
pub mod imputer;
pub mod normals;
pub mod sampled;
pub mod spider;

pub use cobweb::*;
pub use imputer::*;
pub use normals::*;
pub use sampled::*;
pub use spider::*;
