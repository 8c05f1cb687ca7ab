//! Errors raised by grids, masks and label populations.

use crate::{Extent, VoxelCoord};

/// Result type alias for spatial operations.
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Failure of a grid, mask or population operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// A voxel spacing component is not a positive finite number.
    #[error("voxel spacing must be positive and finite, got ({dx}, {dy}, {dz})")]
    InvalidSpacing {
        /// Spacing along X.
        dx: f64,
        /// Spacing along Y.
        dy: f64,
        /// Spacing along Z.
        dz: f64,
    },

    /// A voxel lies outside the grid or mask it addresses.
    #[error("voxel {coord:?} lies outside the grid")]
    OutOfBounds {
        /// Offending local coordinate.
        coord: VoxelCoord,
    },

    /// An extent has a zero-length axis.
    #[error("extent {0} has an empty axis")]
    EmptyExtent(Extent),

    /// An extent cannot be indexed with `usize` offsets and `i32` coordinates.
    #[error("extent {0} is too large to index")]
    ExtentTooLarge(Extent),

    /// A sample buffer does not match the number of voxels of its extent.
    #[error("buffer holds {actual} samples but extent needs {expected}")]
    LengthMismatch {
        /// Voxel count of the extent.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// Two grids or masks that must share an extent do not.
    #[error("extent mismatch: {left} vs {right}")]
    ExtentMismatch {
        /// Extent of the left operand.
        left: Extent,
        /// Extent of the right operand.
        right: Extent,
    },

    /// A label has no voxels in the population.
    #[error("label {0} is not present in the population")]
    UnknownLabel(u32),
}

impl SpatialError {
    /// Create an extent mismatch error.
    #[must_use]
    pub const fn extent_mismatch(left: Extent, right: Extent) -> Self {
        Self::ExtentMismatch { left, right }
    }
}
