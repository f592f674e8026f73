//! Core data structures and traits for depthprobe
//!
//! This crate provides the shared types for local geometric descriptor
//! extraction from depth images and voxel grids: camera models, depth
//! images, scalar voxel grids, scenes, experiment configuration, and the
//! provider traits the sampling engines consume.

pub mod camera;
pub mod config;
pub mod error;
pub mod image;
pub mod scene;
pub mod traits;
pub mod voxel;

pub use camera::*;
pub use config::*;
pub use error::*;
pub use image::*;
pub use scene::*;
pub use traits::*;
pub use voxel::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;
