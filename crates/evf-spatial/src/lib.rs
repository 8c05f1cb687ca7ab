//! Dense voxel grids, masks and labeled regions.
//!
//! This crate provides the spatial substrate for the distance-transform and
//! rank-normalization crates of the workspace:
//!
//! - [`VoxelGrid`] - Dense 3D sample buffer with physical [`Spacing`] and a global offset
//! - [`Extent`] - Grid dimensions and column-major indexing
//! - [`VoxelCoord`] - Integer voxel coordinates
//! - [`GridBounds`] - Axis-aligned bounds in voxel space
//! - [`Mask`] - Membership predicate with leaf ([`BinaryMask`], [`ThresholdMask`],
//!   [`LabelMask`]) and composite ([`DifferenceMask`], [`UnionMask`]) variants
//! - [`Population`] and [`Region`] - Labeled objects of a label image
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no GUI or engine dependencies**. It can be used in:
//! - CLI tools
//! - Image analysis pipelines
//! - Servers
//! - Python bindings
//!
//! # Coordinate Frames
//!
//! Each grid has a *local* frame (`0..nx`, `0..ny`, `0..nz`) and an integer
//! offset placing it in the *global* frame of the image it was cropped from.
//! Physical positions are global voxel coordinates multiplied by the spacing.
//!
//! # Example
//!
//! ```
//! use evf_spatial::{Extent, Mask, Spacing, VoxelGrid, difference, threshold};
//!
//! let data: Vec<f64> = (0..16).map(f64::from).collect();
//! let image = VoxelGrid::from_vec(Extent::planar(4, 4), Spacing::anisotropic(0.1, 0.3), data)?;
//!
//! let bright = threshold(&image, 8.0, f64::INFINITY, false, false);
//! let very_bright = threshold(&image, 12.0, f64::INFINITY, false, false);
//! let band = difference(&bright, &very_bright)?;
//!
//! assert_eq!(band.count(), 4);
//! # Ok::<(), evf_spatial::SpatialError>(())
//! ```
//!
//! # Quality Standards
//!
//! - Zero `unwrap`/`expect` in library code

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bounds;
mod error;
mod grid;
mod mask;
mod region;
mod spacing;
mod voxel;

pub use bounds::{GridBounds, GridBoundsIter};
pub use error::{SpatialError, SpatialResult};
pub use grid::VoxelGrid;
pub use mask::{
    BinaryMask, DifferenceMask, LabelMask, Mask, ThresholdMask, UnionMask, difference, threshold,
    union,
};
pub use region::{Population, Region};
pub use spacing::{Extent, Spacing};
pub use voxel::VoxelCoord;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
