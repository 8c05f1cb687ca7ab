//! Inclusive voxel boxes.

use crate::spacing::Extent;
use crate::voxel::VoxelCoord;

/// Box of voxels between two inclusive corners.
///
/// Regions record their bounding box in the global frame; grids report the
/// box they cover through [`VoxelGrid::bounds`](crate::VoxelGrid::bounds).
///
/// # Example
///
/// ```
/// use evf_spatial::{Extent, GridBounds, VoxelCoord};
///
/// let mut bounds = GridBounds::from_point(VoxelCoord::new(4, 4, 1));
/// bounds.expand_to_include(VoxelCoord::new(2, 7, 1));
///
/// assert_eq!(bounds.min, VoxelCoord::new(2, 4, 1));
/// assert_eq!(bounds.extent(), Extent::new(3, 4, 1));
/// assert_eq!(bounds.volume(), 12);
/// assert!(bounds.contains(VoxelCoord::new(3, 5, 1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridBounds {
    /// Lowest corner (inclusive).
    pub min: VoxelCoord,
    /// Highest corner (inclusive).
    pub max: VoxelCoord,
}

impl GridBounds {
    /// Box spanned by two opposite corners, given in any order.
    #[must_use]
    pub fn new(a: VoxelCoord, b: VoxelCoord) -> Self {
        Self {
            min: a.zip_with(b, i32::min),
            max: a.zip_with(b, i32::max),
        }
    }

    /// Single-voxel box.
    #[must_use]
    pub const fn from_point(coord: VoxelCoord) -> Self {
        Self {
            min: coord,
            max: coord,
        }
    }

    /// Box covered by a grid of `extent` whose first voxel sits at `origin`.
    ///
    /// `extent` must be non-empty and fit in `i32` coordinates (see
    /// [`Extent::validate`]).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn covering(origin: VoxelCoord, extent: Extent) -> Self {
        let far = VoxelCoord::new(
            extent.nx as i32 - 1,
            extent.ny as i32 - 1,
            extent.nz as i32 - 1,
        );
        Self {
            min: origin,
            max: origin + far,
        }
    }

    /// Number of voxels along each axis.
    #[must_use]
    pub fn extent(&self) -> Extent {
        let span = |lo: i32, hi: i32| hi.abs_diff(lo) as usize + 1;
        Extent::new(
            span(self.min.x, self.max.x),
            span(self.min.y, self.max.y),
            span(self.min.z, self.max.z),
        )
    }

    /// Number of voxels in the box.
    #[must_use]
    pub fn volume(&self) -> usize {
        self.extent().len()
    }

    /// Returns `true` if `coord` lies in the box.
    #[must_use]
    pub const fn contains(&self, coord: VoxelCoord) -> bool {
        self.min.x <= coord.x
            && coord.x <= self.max.x
            && self.min.y <= coord.y
            && coord.y <= self.max.y
            && self.min.z <= coord.z
            && coord.z <= self.max.z
    }

    /// Returns `true` if `other` lies entirely in the box.
    #[must_use]
    pub const fn encloses(&self, other: &Self) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Grows the box to cover `coord`.
    pub fn expand_to_include(&mut self, coord: VoxelCoord) {
        self.min = self.min.zip_with(coord, i32::min);
        self.max = self.max.zip_with(coord, i32::max);
    }

    /// Common part of two boxes, if any.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let lo = self.min.zip_with(other.min, i32::max);
        let hi = self.max.zip_with(other.max, i32::min);
        (lo.x <= hi.x && lo.y <= hi.y && lo.z <= hi.z).then_some(Self { min: lo, max: hi })
    }

    /// Coordinates of the box with X varying fastest, the memory order of
    /// [`VoxelGrid`](crate::VoxelGrid).
    #[must_use]
    pub fn iter(&self) -> GridBoundsIter {
        let extent = self.extent();
        GridBoundsIter {
            origin: self.min,
            extent,
            next: 0,
            len: extent.len(),
        }
    }
}

impl IntoIterator for GridBounds {
    type Item = VoxelCoord;
    type IntoIter = GridBoundsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the coordinates of a [`GridBounds`].
#[derive(Debug, Clone)]
pub struct GridBoundsIter {
    origin: VoxelCoord,
    extent: Extent,
    next: usize,
    len: usize,
}

impl Iterator for GridBoundsIter {
    type Item = VoxelCoord;

    fn next(&mut self) -> Option<VoxelCoord> {
        if self.next >= self.len {
            return None;
        }
        let (x, y, z) = self.extent.coords(self.next);
        self.next += 1;
        VoxelCoord::from_indices(x, y, z).map(|local| self.origin + local)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for GridBoundsIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_ordered() {
        let bounds = GridBounds::new(VoxelCoord::new(3, -1, 0), VoxelCoord::new(-2, 4, 2));
        assert_eq!(bounds.min, VoxelCoord::new(-2, -1, 0));
        assert_eq!(bounds.max, VoxelCoord::new(3, 4, 2));
        assert_eq!(bounds.extent(), Extent::new(6, 6, 3));
    }

    #[test]
    fn test_covering_matches_extent() {
        let extent = Extent::new(4, 3, 2);
        let bounds = GridBounds::covering(VoxelCoord::new(10, 0, -1), extent);
        assert_eq!(bounds.max, VoxelCoord::new(13, 2, 0));
        assert_eq!(bounds.extent(), extent);
        assert_eq!(bounds.volume(), 24);
    }

    #[test]
    fn test_encloses_and_intersection() {
        let outer = GridBounds::new(VoxelCoord::origin(), VoxelCoord::new(9, 9, 0));
        let inner = GridBounds::new(VoxelCoord::new(2, 2, 0), VoxelCoord::new(4, 5, 0));
        let straddling = GridBounds::new(VoxelCoord::new(8, 8, 0), VoxelCoord::new(12, 12, 0));
        let apart = GridBounds::from_point(VoxelCoord::new(20, 0, 0));

        assert!(outer.encloses(&inner));
        assert!(!outer.encloses(&straddling));
        assert_eq!(
            outer.intersection(&straddling),
            Some(GridBounds::new(VoxelCoord::new(8, 8, 0), VoxelCoord::new(9, 9, 0)))
        );
        assert_eq!(outer.intersection(&apart), None);
    }

    #[test]
    fn test_iter_follows_memory_order() {
        let bounds = GridBounds::new(VoxelCoord::new(5, 5, 5), VoxelCoord::new(6, 6, 6));
        let iter = bounds.iter();
        assert_eq!(iter.len(), 8);
        let coords: Vec<_> = iter.collect();
        assert_eq!(coords[0], VoxelCoord::new(5, 5, 5));
        assert_eq!(coords[1], VoxelCoord::new(6, 5, 5));
        assert_eq!(coords[2], VoxelCoord::new(5, 6, 5));
        assert_eq!(coords[7], VoxelCoord::new(6, 6, 6));
    }
}
