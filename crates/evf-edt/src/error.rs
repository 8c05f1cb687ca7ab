//! Error types for distance transforms.

use evf_spatial::SpatialError;
use thiserror::Error;

/// Result type alias for distance transform operations.
pub type EdtResult<T> = Result<T, EdtError>;

/// Errors that can occur during a distance transform.
///
/// Every error is raised before the first axis pass, so a failed transform
/// never leaves partial output behind.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EdtError {
    /// The voxel spacing is not positive and finite on every axis.
    #[error("invalid voxel spacing: {0}")]
    InvalidSpacing(#[source] SpatialError),

    /// The mask extent cannot be transformed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use evf_spatial::Extent;

    #[test]
    fn test_error_display() {
        let err = EdtError::InvalidSpacing(SpatialError::InvalidSpacing {
            dx: -0.1,
            dy: 0.1,
            dz: 0.1,
        });
        assert!(format!("{err}").contains("-0.1"));

        let err = EdtError::from(SpatialError::EmptyExtent(Extent::new(0, 1, 1)));
        assert!(format!("{err}").contains("0x1x1"));
    }
}
