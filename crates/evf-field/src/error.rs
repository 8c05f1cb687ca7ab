//! Error types for rank normalization and field assembly.

use evf_edt::EdtError;
use evf_spatial::{Extent, SpatialError};
use thiserror::Error;

/// Result type alias for field operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur while normalizing or assembling a field.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FieldError {
    /// A grid or mask operation failed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// The distance transform rejected its input.
    #[error(transparent)]
    Edt(#[from] EdtError),

    /// The normalization mask selects no voxel.
    #[error("normalization mask is empty")]
    EmptyMask,

    /// A mask does not cover the same extent as the field.
    #[error("extent mismatch: field is {field}, mask is {mask}")]
    ExtentMismatch {
        /// Extent of the field being normalized.
        field: Extent,
        /// Extent of the offending mask.
        mask: Extent,
    },

    /// A reference label has no voxel inside the container's bounding box.
    #[error("label {0} not found inside the container")]
    UnknownLabel(u32),

    /// Invalid assembly parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl FieldError {
    /// Create an empty mask error.
    #[must_use]
    pub const fn empty_mask() -> Self {
        Self::EmptyMask
    }

    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }

    /// Fails with [`FieldError::ExtentMismatch`] unless both extents agree.
    pub(crate) fn check_extent(field: Extent, mask: Extent) -> FieldResult<()> {
        if field == mask {
            Ok(())
        } else {
            Err(Self::ExtentMismatch { field, mask })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldError::empty_mask();
        assert!(format!("{err}").contains("empty"));

        let err = FieldError::invalid_params("negative erosion");
        assert!(format!("{err}").contains("negative erosion"));

        let err = FieldError::ExtentMismatch {
            field: Extent::new(4, 4, 2),
            mask: Extent::planar(4, 4),
        };
        assert!(format!("{err}").contains("4x4x2"));

        let err = FieldError::from(SpatialError::UnknownLabel(7));
        assert!(format!("{err}").contains('7'));
    }

    #[test]
    fn test_check_extent() {
        assert!(FieldError::check_extent(Extent::planar(3, 3), Extent::planar(3, 3)).is_ok());
        assert!(matches!(
            FieldError::check_extent(Extent::planar(3, 3), Extent::planar(3, 4)),
            Err(FieldError::ExtentMismatch { .. })
        ));
    }
}
