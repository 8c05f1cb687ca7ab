//! Parameters for the distance transform.

/// Which side of the mask boundary receives distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// Voxels inside the mask get their distance to the nearest voxel outside it.
    #[default]
    Inside,
    /// Voxels outside the mask get their distance to the nearest mask voxel.
    Outside,
}

/// How the faces of the grid take part in the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderPolicy {
    /// [`BorderPolicy::Source`] for [`Side::Inside`], [`BorderPolicy::Ignore`]
    /// for [`Side::Outside`].
    #[default]
    Auto,
    /// The plane just beyond each grid face counts as a zero-distance source.
    Source,
    /// The grid faces play no role; only voxels are sources.
    Ignore,
}

/// Parameters for [`distance_transform`](crate::distance_transform).
///
/// # Example
///
/// ```
/// use evf_edt::{BorderPolicy, EdtParams, Side};
///
/// let params = EdtParams::default();
/// assert_eq!(params.side, Side::Inside);
/// assert!(params.border_is_source());
///
/// let params = EdtParams::outside().squared(true);
/// assert!(params.squared);
/// assert!(!params.border_is_source());
///
/// let params = EdtParams::outside().border(BorderPolicy::Source);
/// assert!(params.border_is_source());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdtParams {
    /// Side of the mask that receives distances.
    pub side: Side,
    /// Return squared distances (skips the final square root).
    pub squared: bool,
    /// Treatment of the grid faces.
    pub border: BorderPolicy,
}

impl EdtParams {
    /// Distances inside the mask, grid faces counting as outside.
    #[must_use]
    pub const fn inside() -> Self {
        Self {
            side: Side::Inside,
            squared: false,
            border: BorderPolicy::Auto,
        }
    }

    /// Distances outside the mask to the nearest mask voxel.
    #[must_use]
    pub const fn outside() -> Self {
        Self {
            side: Side::Outside,
            squared: false,
            border: BorderPolicy::Auto,
        }
    }

    /// Set whether squared distances are returned.
    #[must_use]
    pub const fn squared(mut self, squared: bool) -> Self {
        self.squared = squared;
        self
    }

    /// Set the border policy.
    #[must_use]
    pub const fn border(mut self, border: BorderPolicy) -> Self {
        self.border = border;
        self
    }

    /// Whether the grid faces act as zero-distance sources.
    #[must_use]
    pub const fn border_is_source(&self) -> bool {
        match self.border {
            BorderPolicy::Auto => matches!(self.side, Side::Inside),
            BorderPolicy::Source => true,
            BorderPolicy::Ignore => false,
        }
    }
}
