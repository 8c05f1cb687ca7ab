//! Boolean masks over voxel grids.
//!
//! A [`Mask`] is a membership predicate over the voxels of an [`Extent`].
//! Leaf masks own or borrow their backing samples ([`BinaryMask`],
//! [`ThresholdMask`], [`LabelMask`]); composites ([`DifferenceMask`],
//! [`UnionMask`]) evaluate their operands lazily and never allocate a buffer.
//!
//! Masks are implemented for references, so composites can borrow their
//! operands:
//!
//! ```
//! use evf_spatial::{BinaryMask, Extent, Mask, difference};
//!
//! let extent = Extent::planar(4, 1);
//! let a = BinaryMask::from_fn(extent, |x, _, _| x < 3);
//! let b = BinaryMask::from_fn(extent, |x, _, _| x == 1);
//!
//! let a_minus_b = difference(&a, &b)?;
//! assert_eq!(a_minus_b.count(), 2);
//! assert!(a_minus_b.contains_at(0, 0, 0));
//! assert!(!a_minus_b.contains_at(1, 0, 0));
//! # Ok::<(), evf_spatial::SpatialError>(())
//! ```

use crate::error::{SpatialError, SpatialResult};
use crate::grid::VoxelGrid;
use crate::spacing::Extent;
use crate::voxel::VoxelCoord;

/// Membership predicate over the voxels of a grid extent.
pub trait Mask {
    /// Extent of the grid the mask is defined on.
    fn extent(&self) -> Extent;

    /// Membership of voxel `(x, y, z)`.
    ///
    /// Callers guarantee the indices lie inside [`Mask::extent`].
    fn contains_at(&self, x: usize, y: usize, z: usize) -> bool;

    /// Membership of a local coordinate; `false` outside the extent.
    fn contains(&self, coord: VoxelCoord) -> bool {
        coord
            .to_indices()
            .is_some_and(|(x, y, z)| self.extent().contains(x, y, z) && self.contains_at(x, y, z))
    }

    /// Number of voxels in the mask, by full traversal.
    fn count(&self) -> usize {
        let extent = self.extent();
        let mut count = 0;
        for z in 0..extent.nz {
            for y in 0..extent.ny {
                for x in 0..extent.nx {
                    if self.contains_at(x, y, z) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// Evaluates the mask once into an owned buffer.
    fn to_binary(&self) -> BinaryMask {
        BinaryMask::from_fn(self.extent(), |x, y, z| self.contains_at(x, y, z))
    }
}

impl<M: Mask + ?Sized> Mask for &M {
    fn extent(&self) -> Extent {
        (**self).extent()
    }

    fn contains_at(&self, x: usize, y: usize, z: usize) -> bool {
        (**self).contains_at(x, y, z)
    }

    fn count(&self) -> usize {
        (**self).count()
    }

    fn to_binary(&self) -> BinaryMask {
        (**self).to_binary()
    }
}

fn check_extents(left: Extent, right: Extent) -> SpatialResult<()> {
    if left == right {
        Ok(())
    } else {
        Err(SpatialError::extent_mismatch(left, right))
    }
}

// =============================================================================
// Leaf masks
// =============================================================================

/// A mask that owns one boolean per voxel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryMask {
    extent: Extent,
    data: Vec<bool>,
}

impl BinaryMask {
    /// An all-false mask.
    #[must_use]
    pub fn empty(extent: Extent) -> Self {
        Self {
            extent,
            data: vec![false; extent.len()],
        }
    }

    /// An all-true mask.
    #[must_use]
    pub fn full(extent: Extent) -> Self {
        Self {
            extent,
            data: vec![true; extent.len()],
        }
    }

    /// Builds a mask by evaluating `f(x, y, z)` on every voxel.
    #[must_use]
    pub fn from_fn<F>(extent: Extent, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> bool,
    {
        let mut data = Vec::with_capacity(extent.len());
        for z in 0..extent.nz {
            for y in 0..extent.ny {
                for x in 0..extent.nx {
                    data.push(f(x, y, z));
                }
            }
        }
        Self { extent, data }
    }

    /// Builds a mask from the non-default samples of a grid.
    #[must_use]
    pub fn from_grid<T: Default + PartialEq>(grid: &VoxelGrid<T>) -> Self {
        let zero = T::default();
        Self {
            extent: grid.extent(),
            data: grid.as_slice().iter().map(|v| *v != zero).collect(),
        }
    }

    /// Builds a mask with the given local coordinates set.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::OutOfBounds`] for a coordinate outside `extent`.
    pub fn from_coords<I>(extent: Extent, coords: I) -> SpatialResult<Self>
    where
        I: IntoIterator<Item = VoxelCoord>,
    {
        let mut mask = Self::empty(extent);
        for coord in coords {
            mask.set(coord, true)?;
        }
        Ok(mask)
    }

    /// Sets membership of a local coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::OutOfBounds`] if the coordinate is outside the extent.
    pub fn set(&mut self, coord: VoxelCoord, inside: bool) -> SpatialResult<()> {
        let (x, y, z) = coord
            .to_indices()
            .filter(|&(x, y, z)| self.extent.contains(x, y, z))
            .ok_or(SpatialError::OutOfBounds { coord })?;
        let index = self.extent.index(x, y, z);
        self.data[index] = inside;
        Ok(())
    }

    /// Membership flags in column-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// Converts to a `u8` grid (1 inside, 0 outside) with the given geometry.
    #[must_use]
    pub fn to_grid_like<U>(&self, like: &VoxelGrid<U>) -> VoxelGrid<u8> {
        let mut grid = VoxelGrid::filled_like(like, 0_u8);
        for (dst, &inside) in grid.as_mut_slice().iter_mut().zip(&self.data) {
            *dst = u8::from(inside);
        }
        grid
    }
}

impl Mask for BinaryMask {
    fn extent(&self) -> Extent {
        self.extent
    }

    fn contains_at(&self, x: usize, y: usize, z: usize) -> bool {
        self.data[self.extent.index(x, y, z)]
    }

    fn count(&self) -> usize {
        self.data.iter().filter(|&&inside| inside).count()
    }

    fn to_binary(&self) -> BinaryMask {
        self.clone()
    }
}

/// A mask selecting grid samples inside a value window.
///
/// Built by [`threshold`]; borrows the grid and never modifies it. NaN
/// samples are never inside.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdMask<'a, T> {
    grid: &'a VoxelGrid<T>,
    low: T,
    high: T,
    strict_low: bool,
    strict_high: bool,
}

/// Selects voxels whose value lies between `low` and `high`.
///
/// `strict_low` / `strict_high` make the corresponding bound exclusive.
///
/// # Example
///
/// ```
/// use evf_spatial::{Extent, Mask, Spacing, VoxelGrid, threshold};
///
/// let grid = VoxelGrid::from_vec(Extent::planar(4, 1), Spacing::default(), vec![0.0, 0.5, 1.0, 1.5])?;
///
/// assert_eq!(threshold(&grid, 0.0, 1.0, false, false).count(), 3);
/// assert_eq!(threshold(&grid, 0.0, 1.0, true, false).count(), 2);
/// assert_eq!(threshold(&grid, 0.0, 1.0, true, true).count(), 1);
/// # Ok::<(), evf_spatial::SpatialError>(())
/// ```
#[must_use]
pub const fn threshold<T>(
    grid: &VoxelGrid<T>,
    low: T,
    high: T,
    strict_low: bool,
    strict_high: bool,
) -> ThresholdMask<'_, T> {
    ThresholdMask {
        grid,
        low,
        high,
        strict_low,
        strict_high,
    }
}

impl<T: PartialOrd> ThresholdMask<'_, T> {
    fn accepts(&self, value: &T) -> bool {
        let above = if self.strict_low {
            *value > self.low
        } else {
            *value >= self.low
        };
        let below = if self.strict_high {
            *value < self.high
        } else {
            *value <= self.high
        };
        above && below
    }
}

impl<T: PartialOrd> Mask for ThresholdMask<'_, T> {
    fn extent(&self) -> Extent {
        self.grid.extent()
    }

    fn contains_at(&self, x: usize, y: usize, z: usize) -> bool {
        self.accepts(&self.grid[(x, y, z)])
    }

    fn count(&self) -> usize {
        self.grid
            .as_slice()
            .iter()
            .filter(|v| self.accepts(v))
            .count()
    }
}

/// A mask selecting voxels of a label image that carry one of a set of labels.
#[derive(Debug, Clone)]
pub struct LabelMask<'a> {
    labels: &'a VoxelGrid<u32>,
    selected: Vec<u32>,
}

impl<'a> LabelMask<'a> {
    /// Selects voxels whose label is in `selected`.
    #[must_use]
    pub fn new<I>(labels: &'a VoxelGrid<u32>, selected: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut selected: Vec<u32> = selected.into_iter().collect();
        selected.sort_unstable();
        selected.dedup();
        Self { labels, selected }
    }

    /// Selects voxels carrying exactly `label`.
    #[must_use]
    pub fn single(labels: &'a VoxelGrid<u32>, label: u32) -> Self {
        Self {
            labels,
            selected: vec![label],
        }
    }

    /// The selected labels, sorted.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.selected
    }
}

impl Mask for LabelMask<'_> {
    fn extent(&self) -> Extent {
        self.labels.extent()
    }

    fn contains_at(&self, x: usize, y: usize, z: usize) -> bool {
        self.selected
            .binary_search(&self.labels[(x, y, z)])
            .is_ok()
    }
}

// =============================================================================
// Composite masks
// =============================================================================

/// Voxels in `a` but not in `b`.
#[derive(Debug, Clone, Copy)]
pub struct DifferenceMask<A, B> {
    a: A,
    b: B,
}

/// Builds the set difference `a \ b`.
///
/// # Errors
///
/// Returns [`SpatialError::ExtentMismatch`] if the operands have different extents.
pub fn difference<A: Mask, B: Mask>(a: A, b: B) -> SpatialResult<DifferenceMask<A, B>> {
    check_extents(a.extent(), b.extent())?;
    Ok(DifferenceMask { a, b })
}

impl<A: Mask, B: Mask> Mask for DifferenceMask<A, B> {
    fn extent(&self) -> Extent {
        self.a.extent()
    }

    fn contains_at(&self, x: usize, y: usize, z: usize) -> bool {
        self.a.contains_at(x, y, z) && !self.b.contains_at(x, y, z)
    }
}

/// Voxels in `a` or in `b`.
#[derive(Debug, Clone, Copy)]
pub struct UnionMask<A, B> {
    a: A,
    b: B,
}

/// Builds the union `a ∪ b`.
///
/// # Errors
///
/// Returns [`SpatialError::ExtentMismatch`] if the operands have different extents.
pub fn union<A: Mask, B: Mask>(a: A, b: B) -> SpatialResult<UnionMask<A, B>> {
    check_extents(a.extent(), b.extent())?;
    Ok(UnionMask { a, b })
}

impl<A: Mask, B: Mask> Mask for UnionMask<A, B> {
    fn extent(&self) -> Extent {
        self.a.extent()
    }

    fn contains_at(&self, x: usize, y: usize, z: usize) -> bool {
        self.a.contains_at(x, y, z) || self.b.contains_at(x, y, z)
    }
}
