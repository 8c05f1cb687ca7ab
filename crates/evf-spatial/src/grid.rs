//! Dense voxel grid data structure.

use std::ops::{Index, IndexMut};

use nalgebra::Point3;

use crate::bounds::GridBounds;
use crate::error::{SpatialError, SpatialResult};
use crate::spacing::{Extent, Spacing};
use crate::voxel::VoxelCoord;

/// A dense 3D voxel grid with physical voxel spacing.
///
/// Samples are stored column-major (`x + y*nx + z*nx*ny`), the layout used by
/// microscopy and NIfTI stacks, so one XY slice is contiguous and a voxel can
/// also be addressed by its in-slice index `xy` and slice `z`.
///
/// The grid carries an integer `offset`: the position of its local voxel
/// `(0, 0, 0)` in the caller's global frame. Cropping keeps the offset
/// consistent so results computed on a crop can be placed back with
/// [`VoxelGrid::embed_into`].
///
/// # Type Parameter
///
/// - `T`: The sample type, e.g. `f64` for distance and rank fields, `u32` for
///   label images, `bool` for materialised masks.
///
/// # Example
///
/// ```
/// use evf_spatial::{Extent, Spacing, VoxelCoord, VoxelGrid};
///
/// let mut grid = VoxelGrid::filled(Extent::planar(4, 4), Spacing::isotropic(0.5), 0.0_f64)?;
/// grid.set(VoxelCoord::new(1, 2, 0), 3.5)?;
///
/// assert_eq!(grid.get(VoxelCoord::new(1, 2, 0)), Some(&3.5));
/// assert_eq!(grid[(1, 2, 0)], 3.5);
/// assert_eq!(grid.get(VoxelCoord::new(4, 0, 0)), None);
/// # Ok::<(), evf_spatial::SpatialError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelGrid<T> {
    extent: Extent,
    spacing: Spacing,
    offset: VoxelCoord,
    data: Vec<T>,
}

impl<T: Clone> VoxelGrid<T> {
    /// Creates a grid with every voxel set to `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the extent has an empty axis or cannot be indexed.
    pub fn filled(extent: Extent, spacing: Spacing, value: T) -> SpatialResult<Self> {
        extent.validate()?;
        Ok(Self {
            extent,
            spacing,
            offset: VoxelCoord::origin(),
            data: vec![value; extent.len()],
        })
    }

    /// Creates a grid of the same extent, spacing and offset as `like`.
    #[must_use]
    pub fn filled_like<U>(like: &VoxelGrid<U>, value: T) -> Self {
        Self {
            extent: like.extent,
            spacing: like.spacing,
            offset: like.offset,
            data: vec![value; like.extent.len()],
        }
    }

    /// Copies the sub-box `bounds` (in local coordinates) into a new grid.
    ///
    /// The crop's offset is the global position of `bounds.min`, so global
    /// coordinates are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::OutOfBounds`] if `bounds` is not inside the grid.
    ///
    /// # Example
    ///
    /// ```
    /// use evf_spatial::{Extent, GridBounds, Spacing, VoxelCoord, VoxelGrid};
    ///
    /// let data: Vec<u32> = (0..16).collect();
    /// let grid = VoxelGrid::from_vec(Extent::planar(4, 4), Spacing::default(), data)?;
    /// let crop = grid.crop(GridBounds::new(VoxelCoord::new(1, 1, 0), VoxelCoord::new(2, 2, 0)))?;
    ///
    /// assert_eq!(crop.extent(), Extent::planar(2, 2));
    /// assert_eq!(crop.offset(), VoxelCoord::new(1, 1, 0));
    /// assert_eq!(crop.as_slice(), &[5, 6, 9, 10]);
    /// # Ok::<(), evf_spatial::SpatialError>(())
    /// ```
    pub fn crop(&self, bounds: GridBounds) -> SpatialResult<Self> {
        for corner in [bounds.min, bounds.max] {
            if self.local_index(corner).is_none() {
                return Err(SpatialError::OutOfBounds { coord: corner });
            }
        }
        let extent = bounds.extent();
        let data = bounds
            .iter()
            .filter_map(|coord| self.get(coord).cloned())
            .collect::<Vec<_>>();
        debug_assert_eq!(data.len(), extent.len());
        Ok(Self {
            extent,
            spacing: self.spacing,
            offset: self.offset + bounds.min,
            data,
        })
    }

    /// Writes every voxel of this grid into `target` at the same global
    /// position, skipping voxels for which `keep` returns `false` and voxels
    /// that fall outside `target`.
    ///
    /// Returns the number of voxels written.
    ///
    /// # Example
    ///
    /// ```
    /// use evf_spatial::{Extent, Spacing, VoxelCoord, VoxelGrid};
    ///
    /// let patch = VoxelGrid::filled(Extent::planar(2, 2), Spacing::default(), 1.0_f64)?
    ///     .with_offset(VoxelCoord::new(3, 3, 0));
    /// let mut image = VoxelGrid::filled(Extent::planar(8, 8), Spacing::default(), 0.0_f64)?;
    ///
    /// let written = patch.embed_into(&mut image, |_| true);
    /// assert_eq!(written, 4);
    /// assert_eq!(image[(4, 4, 0)], 1.0);
    /// assert_eq!(image[(5, 5, 0)], 0.0);
    /// # Ok::<(), evf_spatial::SpatialError>(())
    /// ```
    pub fn embed_into<F>(&self, target: &mut Self, keep: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let mut written = 0;
        for (local, value) in self.iter() {
            if !keep(value) {
                continue;
            }
            let target_local = self.offset + local - target.offset;
            if let Some(index) = target.local_index(target_local) {
                target.data[index] = value.clone();
                written += 1;
            }
        }
        written
    }
}

impl<T> VoxelGrid<T> {
    /// Wraps an existing sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::LengthMismatch`] if `data` does not hold exactly
    /// one sample per voxel, or an extent validation error.
    pub fn from_vec(extent: Extent, spacing: Spacing, data: Vec<T>) -> SpatialResult<Self> {
        extent.validate()?;
        if data.len() != extent.len() {
            return Err(SpatialError::LengthMismatch {
                expected: extent.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            extent,
            spacing,
            offset: VoxelCoord::origin(),
            data,
        })
    }

    /// Returns the grid extent.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Returns the physical voxel spacing.
    #[must_use]
    pub const fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// Returns the global position of local voxel `(0, 0, 0)`.
    #[must_use]
    pub const fn offset(&self) -> VoxelCoord {
        self.offset
    }

    /// Returns the grid with a new offset.
    #[must_use]
    pub fn with_offset(mut self, offset: VoxelCoord) -> Self {
        self.offset = offset;
        self
    }

    /// Shifts the grid in the global frame by `delta`.
    pub fn translate(&mut self, delta: VoxelCoord) {
        self.offset = self.offset + delta;
    }

    /// Returns the grid's voxels as bounds in the global frame.
    #[must_use]
    pub fn bounds(&self) -> GridBounds {
        GridBounds::covering(self.offset, self.extent)
    }

    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false` for a constructed grid; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw samples in column-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable raw samples in column-major order.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the grid and returns its samples.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Flat index of a local coordinate, or `None` outside the grid.
    #[must_use]
    pub fn local_index(&self, coord: VoxelCoord) -> Option<usize> {
        let (x, y, z) = coord.to_indices()?;
        self.extent
            .contains(x, y, z)
            .then(|| self.extent.index(x, y, z))
    }

    /// Local coordinate of a flat index.
    ///
    /// Returns `None` if the index is out of range.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Option<VoxelCoord> {
        if index >= self.data.len() {
            return None;
        }
        let (x, y, z) = self.extent.coords(index);
        VoxelCoord::from_indices(x, y, z)
    }

    /// Gets a reference to the sample at a local coordinate.
    #[must_use]
    pub fn get(&self, coord: VoxelCoord) -> Option<&T> {
        self.local_index(coord).map(|i| &self.data[i])
    }

    /// Gets a mutable reference to the sample at a local coordinate.
    pub fn get_mut(&mut self, coord: VoxelCoord) -> Option<&mut T> {
        self.local_index(coord).map(|i| &mut self.data[i])
    }

    /// Sets the sample at a local coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::OutOfBounds`] if the coordinate is outside the grid.
    pub fn set(&mut self, coord: VoxelCoord, value: T) -> SpatialResult<()> {
        let index = self
            .local_index(coord)
            .ok_or(SpatialError::OutOfBounds { coord })?;
        self.data[index] = value;
        Ok(())
    }

    /// Gets the sample at in-slice index `xy` of slice `z`.
    #[must_use]
    pub fn get_xy(&self, xy: usize, z: usize) -> Option<&T> {
        if xy >= self.extent.slice_len() || z >= self.extent.nz {
            return None;
        }
        self.data.get(xy + z * self.extent.slice_len())
    }

    /// Mutable sample at in-slice index `xy` of slice `z`.
    pub fn get_xy_mut(&mut self, xy: usize, z: usize) -> Option<&mut T> {
        if xy >= self.extent.slice_len() || z >= self.extent.nz {
            return None;
        }
        let slice_len = self.extent.slice_len();
        self.data.get_mut(xy + z * slice_len)
    }

    /// Converts a local coordinate to the global frame.
    #[must_use]
    pub fn to_global(&self, local: VoxelCoord) -> VoxelCoord {
        self.offset + local
    }

    /// Converts a global coordinate to this grid's local frame.
    #[must_use]
    pub fn to_local(&self, global: VoxelCoord) -> VoxelCoord {
        global - self.offset
    }

    /// Physical position of a local voxel (its minimum corner) in the global
    /// frame.
    #[must_use]
    pub fn physical_position(&self, local: VoxelCoord) -> Point3<f64> {
        let global = self.to_global(local).to_vector();
        Point3::from(global.component_mul(&self.spacing.to_vector()))
    }

    /// Iterates over `(local coordinate, sample)` pairs in memory order.
    pub fn iter(&self) -> impl Iterator<Item = (VoxelCoord, &T)> + '_ {
        let extent = self.extent;
        self.data.iter().enumerate().filter_map(move |(i, v)| {
            let (x, y, z) = extent.coords(i);
            VoxelCoord::from_indices(x, y, z).map(|c| (c, v))
        })
    }

    /// Applies `f` to every sample, producing a grid of the same geometry.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> VoxelGrid<U>
    where
        F: FnMut(&T) -> U,
    {
        VoxelGrid {
            extent: self.extent,
            spacing: self.spacing,
            offset: self.offset,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Returns `true` if `other` has the same extent.
    #[must_use]
    pub fn same_extent<U>(&self, other: &VoxelGrid<U>) -> bool {
        self.extent == other.extent
    }
}

impl<T> Index<(usize, usize, usize)> for VoxelGrid<T> {
    type Output = T;

    fn index(&self, (x, y, z): (usize, usize, usize)) -> &T {
        assert!(
            self.extent.contains(x, y, z),
            "voxel ({x}, {y}, {z}) outside extent {}",
            self.extent
        );
        &self.data[self.extent.index(x, y, z)]
    }
}

impl<T> IndexMut<(usize, usize, usize)> for VoxelGrid<T> {
    fn index_mut(&mut self, (x, y, z): (usize, usize, usize)) -> &mut T {
        assert!(
            self.extent.contains(x, y, z),
            "voxel ({x}, {y}, {z}) outside extent {}",
            self.extent
        );
        let index = self.extent.index(x, y, z);
        &mut self.data[index]
    }
}
