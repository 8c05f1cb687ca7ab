//! Empirical percentile ranks of a distance field.
//!
//! The samples of the normalization mask are sorted by distance. Each sample
//! takes its position in the sorted order as rank, except that every maximal
//! run of bitwise-equal distances shares the mean of the run's first and last
//! positions. Dividing by the volume `n` gives ranks in `[0, 1)` spaced by
//! `1 / n` when all distances are distinct.
//!
//! Voxels of a second, excluded mask are not counted in `n`; they are placed
//! in the table afterwards by looking up their raw distance.

// Ranks are sorted positions; volumes fit in f64 mantissas.
#![allow(clippy::cast_precision_loss)]

use std::cmp::Ordering;

use evf_spatial::{Extent, Mask, VoxelGrid, difference};
use tracing::{debug, info, warn};

use crate::error::{FieldError, FieldResult};
use crate::params::{ExcludedPolicy, RankParams};

/// One voxel of the normalization mask, keyed by distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSample {
    /// Raw distance of the voxel.
    pub distance: f64,
    /// In-plane flattened index `x + y * nx`.
    pub xy: usize,
    /// Slice index.
    pub z: usize,
}

impl VoxelSample {
    /// Flattened index into a grid of `extent`.
    #[must_use]
    pub const fn index(&self, extent: Extent) -> usize {
        self.xy + self.z * extent.slice_len()
    }
}

/// Sorted samples of a normalization mask and their normalized ranks.
///
/// # Example
///
/// ```
/// use evf_field::{RankParams, RankTable};
/// use evf_spatial::{BinaryMask, Extent, Spacing, VoxelGrid};
///
/// let field = VoxelGrid::from_vec(
///     Extent::planar(5, 1),
///     Spacing::default(),
///     vec![0.3, 0.1, 0.2, 0.2, 0.4],
/// )?;
/// let table = RankTable::build(&field, &BinaryMask::full(field.extent()), &RankParams::new())?;
///
/// assert_eq!(table.len(), 5);
/// assert_eq!(table.tie_runs(), 1);
/// // The two 0.2 samples share rank (1 + 2) / 2.
/// assert_eq!(table.lookup(0.2), 1.5 / 5.0);
/// // Between 0.3 (rank 3) and 0.4 (rank 4).
/// assert!((table.lookup(0.35) - 0.7).abs() < 1e-12);
/// # Ok::<(), evf_field::FieldError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RankTable {
    extent: Extent,
    samples: Vec<VoxelSample>,
    ranks: Vec<f64>,
    tie_runs: usize,
}

impl RankTable {
    /// Collects, sorts and ranks the voxels of `mask` in `field`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ExtentMismatch`] if the mask does not cover the
    /// field, and [`FieldError::EmptyMask`] if it selects no voxel.
    pub fn build<M: Mask>(
        field: &VoxelGrid<f64>,
        mask: &M,
        params: &RankParams,
    ) -> FieldResult<Self> {
        let extent = field.extent();
        FieldError::check_extent(extent, mask.extent())?;

        let mut samples = collect(field, mask);
        if samples.is_empty() {
            return Err(FieldError::empty_mask());
        }
        // Stable, so equal distances keep traversal order.
        samples.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let (ranks, tie_runs) = assign_ranks(&samples, params.pin_max_to_one);
        debug!(
            volume = samples.len(),
            tie_runs,
            min = samples[0].distance,
            max = samples[samples.len() - 1].distance,
            "Built rank table"
        );

        Ok(Self {
            extent,
            samples,
            ranks,
            tie_runs,
        })
    }

    /// Number of samples (`n`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`: a table is never built from an empty mask.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of runs of two or more tied distances.
    #[must_use]
    pub const fn tie_runs(&self) -> usize {
        self.tie_runs
    }

    /// Samples in ascending distance order.
    #[must_use]
    pub fn samples(&self) -> &[VoxelSample] {
        &self.samples
    }

    /// Normalized rank of each sample, aligned with [`RankTable::samples`].
    #[must_use]
    pub fn ranks(&self) -> &[f64] {
        &self.ranks
    }

    /// Rank of an arbitrary distance against the table.
    ///
    /// A distance present in the table returns its rank exactly. A distance
    /// between two entries returns the mean of their ranks. Below the first
    /// entry the rank is 0, above the last it is 1.
    #[must_use]
    pub fn lookup(&self, distance: f64) -> f64 {
        let pos = self
            .samples
            .partition_point(|s| s.distance.total_cmp(&distance) == Ordering::Less);
        match self.samples.get(pos) {
            Some(s) if s.distance.to_bits() == distance.to_bits() => self.ranks[pos],
            _ if pos == 0 => 0.0,
            None => 1.0,
            Some(_) => (self.ranks[pos - 1] + self.ranks[pos]) / 2.0,
        }
    }

    /// Writes every sample's rank into `field` at its voxel.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ExtentMismatch`] if `field` is not the grid the
    /// table was built from.
    pub fn write_ranks(&self, field: &mut VoxelGrid<f64>) -> FieldResult<()> {
        FieldError::check_extent(self.extent, field.extent())?;
        let data = field.as_mut_slice();
        for (sample, &rank) in self.samples.iter().zip(&self.ranks) {
            data[sample.index(self.extent)] = rank;
        }
        Ok(())
    }
}

/// Mask voxels of `field` in traversal order.
fn collect<M: Mask>(field: &VoxelGrid<f64>, mask: &M) -> Vec<VoxelSample> {
    let extent = field.extent();
    let mut samples = Vec::new();
    for z in 0..extent.nz {
        for y in 0..extent.ny {
            for x in 0..extent.nx {
                if mask.contains_at(x, y, z) {
                    samples.push(VoxelSample {
                        distance: field[(x, y, z)],
                        xy: x + y * extent.nx,
                        z,
                    });
                }
            }
        }
    }
    samples
}

/// Normalized ranks of sorted samples and the number of tie runs.
fn assign_ranks(samples: &[VoxelSample], pin_max_to_one: bool) -> (Vec<f64>, usize) {
    let n = samples.len();
    let volume = n as f64;
    let mut ranks = vec![0.0; n];
    let mut tie_runs = 0;

    let mut start = 0;
    while start < n {
        let bits = samples[start].distance.to_bits();
        let mut end = start;
        while end + 1 < n && samples[end + 1].distance.to_bits() == bits {
            end += 1;
        }
        if end > start {
            tie_runs += 1;
        }
        let rank = if pin_max_to_one && end == n - 1 {
            1.0
        } else {
            (start + end) as f64 / 2.0 / volume
        };
        ranks[start..=end].fill(rank);
        start = end + 1;
    }

    (ranks, tie_runs)
}

/// Replaces the distances under `mask` with their percentile ranks.
///
/// Voxels outside the mask keep their value.
///
/// # Errors
///
/// Returns [`FieldError::ExtentMismatch`] if the mask does not cover the
/// field, and [`FieldError::EmptyMask`] if it selects no voxel.
///
/// # Example
///
/// ```
/// use evf_field::{RankParams, normalize};
/// use evf_spatial::{BinaryMask, Extent, Spacing, VoxelGrid};
///
/// let mut field = VoxelGrid::from_vec(
///     Extent::planar(4, 1),
///     Spacing::default(),
///     vec![0.7, 0.1, 0.4, 9.0],
/// )?;
/// let mask = BinaryMask::from_fn(field.extent(), |x, _, _| x < 3);
/// normalize(&mut field, &mask, &RankParams::new())?;
///
/// assert_eq!(field.as_slice(), &[2.0 / 3.0, 0.0, 1.0 / 3.0, 9.0]);
/// # Ok::<(), evf_field::FieldError>(())
/// ```
pub fn normalize<M: Mask>(
    field: &mut VoxelGrid<f64>,
    mask: &M,
    params: &RankParams,
) -> FieldResult<RankTable> {
    let table = RankTable::build(field, mask, params)?;
    table.write_ranks(field)?;
    info!(
        volume = table.len(),
        tie_runs = table.tie_runs(),
        "Rank normalization complete"
    );
    Ok(table)
}

/// Like [`normalize`], then ranks the voxels of `excluded` against the table.
///
/// Excluded voxels do not count in the volume. Their raw distances are read
/// before any rank is written and resolved with [`RankTable::lookup`], or set
/// to 0 under [`ExcludedPolicy::Zero`]. Voxels in both masks are normalized
/// as ordinary samples.
///
/// # Errors
///
/// Same as [`normalize`]; an extent mismatch of `excluded` is reported too.
pub fn normalize_with_excluded<M: Mask, E: Mask>(
    field: &mut VoxelGrid<f64>,
    mask: &M,
    excluded: &E,
    params: &RankParams,
) -> FieldResult<RankTable> {
    let extent = field.extent();
    FieldError::check_extent(extent, excluded.extent())?;
    let table = RankTable::build(field, mask, params)?;

    let only_excluded = difference(excluded, mask)?;
    let mut raw = Vec::new();
    for z in 0..extent.nz {
        for y in 0..extent.ny {
            for x in 0..extent.nx {
                if only_excluded.contains_at(x, y, z) {
                    raw.push((extent.index(x, y, z), field[(x, y, z)]));
                }
            }
        }
    }
    let overlap = excluded.count() - raw.len();
    if overlap > 0 {
        warn!(
            overlap,
            "Excluded mask overlaps the normalization mask; shared voxels are normalized"
        );
    }

    table.write_ranks(field)?;
    let data = field.as_mut_slice();
    for &(index, distance) in &raw {
        data[index] = match params.excluded {
            ExcludedPolicy::Interpolate => table.lookup(distance),
            ExcludedPolicy::Zero => 0.0,
        };
    }

    info!(
        volume = table.len(),
        excluded = raw.len(),
        tie_runs = table.tie_runs(),
        policy = ?params.excluded,
        "Rank normalization complete"
    );
    Ok(table)
}
