//! Rank-normalized distance fields over labeled voxel regions.
//!
//! Given a labeled image, this crate measures how deep every voxel of a
//! container object lies, relative to the container boundary or to reference
//! objects inside it, and expresses that depth as the fraction of the
//! container's voxels that are closer. The result is an eroded volume
//! fraction (EVF) map: 0 at the reference, growing to 1 at the voxels
//! farthest from it, independent of the object's size and shape.
//!
//! - [`RankTable`], [`normalize`], [`normalize_with_excluded`] - Percentile
//!   ranks of a distance field under a mask, with tie averaging and lookup
//!   of excluded voxels
//! - [`compute_evf`] - Distance transform, mask algebra and normalization for
//!   one container of a [`Population`](evf_spatial::Population)
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **no GUI or engine dependencies**.
//!
//! # Example
//!
//! ```
//! use evf_field::{EvfParams, Reference, compute_evf};
//! use evf_spatial::{Extent, Population, Spacing, VoxelGrid};
//!
//! // One 6x6x3 container.
//! let mut labels = VoxelGrid::filled(Extent::new(8, 8, 5), Spacing::anisotropic(0.1, 0.3), 0_u32)?;
//! for z in 1..=3 {
//!     for y in 1..=6 {
//!         for x in 1..=6 {
//!             labels[(x, y, z)] = 1;
//!         }
//!     }
//! }
//! let population = Population::from_labels(labels);
//!
//! let map = compute_evf(&population, 1, &Reference::Container, &EvfParams::default())?;
//! let mut image = VoxelGrid::filled(Extent::new(8, 8, 5), Spacing::anisotropic(0.1, 0.3), 0.0)?;
//!
//! assert_eq!(map.embed_into(&mut image), 108);
//! assert!(image.as_slice().iter().all(|r| (0.0..=1.0).contains(r)));
//! # Ok::<(), evf_field::FieldError>(())
//! ```
//!
//! # Quality Standards
//!
//! - Zero `unwrap`/`expect` in library code
//! - Ties are bitwise-equal distances, never an epsilon

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod assembly;
mod error;
mod params;
mod rank;
mod result;

pub use assembly::compute_evf;
pub use error::{FieldError, FieldResult};
pub use params::{EvfParams, ExcludedPolicy, FieldOutput, RankParams, Reference, ReferenceSide};
pub use rank::{RankTable, VoxelSample, normalize, normalize_with_excluded};
pub use result::EvfMap;
