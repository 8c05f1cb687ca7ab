//! Parameters for rank normalization and field assembly.

use crate::error::{FieldError, FieldResult};

/// What excluded voxels receive during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExcludedPolicy {
    /// Look the raw distance up in the rank table.
    #[default]
    Interpolate,
    /// Force every excluded voxel to 0.
    Zero,
}

/// Parameters for [`normalize`](crate::normalize) and
/// [`normalize_with_excluded`](crate::normalize_with_excluded).
///
/// # Example
///
/// ```
/// use evf_field::{ExcludedPolicy, RankParams};
///
/// let params = RankParams::default();
/// assert_eq!(params.excluded, ExcludedPolicy::Interpolate);
/// assert!(!params.pin_max_to_one);
///
/// let params = RankParams::new().excluded(ExcludedPolicy::Zero).pin_max_to_one(true);
/// assert!(params.pin_max_to_one);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankParams {
    /// Treatment of excluded voxels.
    pub excluded: ExcludedPolicy,
    /// Assign exactly 1 to the highest-ranked run instead of `rank / n`.
    pub pin_max_to_one: bool,
}

impl RankParams {
    /// Interpolated excluded voxels, no endpoint pinning.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            excluded: ExcludedPolicy::Interpolate,
            pin_max_to_one: false,
        }
    }

    /// Set the excluded-voxel policy.
    #[must_use]
    pub const fn excluded(mut self, policy: ExcludedPolicy) -> Self {
        self.excluded = policy;
        self
    }

    /// Set whether the highest rank is pinned to 1.
    #[must_use]
    pub const fn pin_max_to_one(mut self, pin: bool) -> Self {
        self.pin_max_to_one = pin;
        self
    }
}

/// The set distances are measured from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reference {
    /// The container's own boundary.
    #[default]
    Container,
    /// Objects of the label image lying inside the container (nuclei of a
    /// cell, foci of a nucleus).
    Labels(Vec<u32>),
}

/// Which side of the reference boundary receives values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferenceSide {
    /// Container voxels outside the reference, valued by their distance to it.
    #[default]
    Outside,
    /// Reference voxels, valued by their distance to the reference boundary.
    Inside,
    /// Both: positive outside, negated inside, crossing zero at the boundary.
    Both,
}

/// Output of field assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldOutput {
    /// Percentile ranks in `[0, 1]`.
    #[default]
    Rank,
    /// Raw physical distances.
    Distance,
}

/// Parameters for [`compute_evf`](crate::compute_evf).
///
/// # Example
///
/// ```
/// use evf_field::{EvfParams, FieldOutput, ReferenceSide};
///
/// let params = EvfParams::default();
/// assert_eq!(params.erosion, 0.0);
/// assert_eq!(params.output, FieldOutput::Rank);
/// assert!(params.background.is_nan());
///
/// let params = EvfParams::new().erosion(0.5).side(ReferenceSide::Both).background(-2.0);
/// assert!(params.validate().is_ok());
/// assert!(EvfParams::new().erosion(-1.0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvfParams {
    /// Physical depth of the border shell excluded from normalization when the
    /// reference is the container. 0 disables erosion.
    pub erosion: f64,
    /// Side of the reference boundary that receives values.
    pub side: ReferenceSide,
    /// Ranks or raw distances.
    pub output: FieldOutput,
    /// Value of voxels outside every normalized region.
    pub background: f64,
    /// Normalization parameters.
    pub rank: RankParams,
}

impl Default for EvfParams {
    fn default() -> Self {
        Self::new()
    }
}

impl EvfParams {
    /// No erosion, outside side, rank output, NaN background.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            erosion: 0.0,
            side: ReferenceSide::Outside,
            output: FieldOutput::Rank,
            background: f64::NAN,
            rank: RankParams::new(),
        }
    }

    /// Set the erosion depth.
    #[must_use]
    pub const fn erosion(mut self, erosion: f64) -> Self {
        self.erosion = erosion;
        self
    }

    /// Set the reference side.
    #[must_use]
    pub const fn side(mut self, side: ReferenceSide) -> Self {
        self.side = side;
        self
    }

    /// Set the output kind.
    #[must_use]
    pub const fn output(mut self, output: FieldOutput) -> Self {
        self.output = output;
        self
    }

    /// Set the background value.
    #[must_use]
    pub const fn background(mut self, background: f64) -> Self {
        self.background = background;
        self
    }

    /// Set the normalization parameters.
    #[must_use]
    pub const fn rank(mut self, rank: RankParams) -> Self {
        self.rank = rank;
        self
    }

    /// Checks that the erosion depth is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidParams`] otherwise.
    pub fn validate(&self) -> FieldResult<()> {
        if self.erosion.is_finite() && self.erosion >= 0.0 {
            Ok(())
        } else {
            Err(FieldError::invalid_params(format!(
                "erosion must be finite and non-negative, got {}",
                self.erosion
            )))
        }
    }
}
