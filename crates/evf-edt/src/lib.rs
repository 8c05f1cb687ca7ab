//! Exact Euclidean distance transform for anisotropic voxel masks.
//!
//! This crate computes, for every voxel of a grid, the exact Euclidean
//! distance in physical units to the nearest voxel on the other side of a
//! [`Mask`](evf_spatial::Mask) boundary.
//!
//! # Algorithm
//!
//! The transform is separable: zero-side voxels start at 0 and all others at
//! +inf, then every line along X, Y and Z in turn is replaced by the lower
//! envelope of parabolas rooted at its samples, weighted by the squared voxel
//! size of that axis (Felzenszwalb & Huttenlocher). The cost is O(N) per axis.
//! Grid faces can act as an extra zero-distance plane (see [`BorderPolicy`]).
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no GUI or engine dependencies**. Lines of each axis
//! pass run in parallel on the rayon thread pool.
//!
//! # Example
//!
//! ```
//! use evf_edt::{EdtParams, distance_transform};
//! use evf_spatial::{BinaryMask, Extent, Spacing};
//!
//! // 3D stack with a thicker axial step.
//! let extent = Extent::new(9, 9, 5);
//! let mask = BinaryMask::from_fn(extent, |x, y, z| {
//!     (2..7).contains(&x) && (2..7).contains(&y) && (1..4).contains(&z)
//! });
//!
//! let dist = distance_transform(&mask, Spacing::anisotropic(0.1, 0.5), &EdtParams::inside())?;
//!
//! // Three in-plane steps (0.3) beat two axial ones (1.0).
//! assert!((dist[(4, 4, 2)] - 0.3).abs() < 1e-12);
//! // On a side face the background is one in-plane step away.
//! assert!((dist[(2, 4, 2)] - 0.1).abs() < 1e-12);
//! # Ok::<(), evf_edt::EdtError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod envelope;
mod error;
mod params;
mod transform;

pub use error::{EdtError, EdtResult};
pub use params::{BorderPolicy, EdtParams, Side};
pub use transform::{distance_transform, signed_distance_transform};
