//! Grid extent and physical voxel spacing.

use std::fmt;

use nalgebra::Vector3;

use crate::error::{SpatialError, SpatialResult};

/// Number of voxels along each axis of a dense grid.
///
/// A grid with `nz == 1` is a 2D image.
///
/// # Example
///
/// ```
/// use evf_spatial::Extent;
///
/// let extent = Extent::new(10, 10, 3);
/// assert_eq!(extent.len(), 300);
/// assert_eq!(extent.slice_len(), 100);
/// assert_eq!(extent.index(1, 2, 1), 1 + 2 * 10 + 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    /// Voxels along X.
    pub nx: usize,
    /// Voxels along Y.
    pub ny: usize,
    /// Voxels along Z.
    pub nz: usize,
}

impl Extent {
    /// Creates a new extent.
    #[must_use]
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Creates a 2D extent (a single slice).
    #[must_use]
    pub const fn planar(nx: usize, ny: usize) -> Self {
        Self::new(nx, ny, 1)
    }

    /// Checks that every axis has at least one voxel and that the voxel count
    /// fits in memory addressing and in `i32` coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyExtent`] for an empty axis and
    /// [`SpatialError::ExtentTooLarge`] when the extent cannot be indexed.
    pub fn validate(&self) -> SpatialResult<()> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(SpatialError::EmptyExtent(*self));
        }
        let fits = [self.nx, self.ny, self.nz]
            .iter()
            .all(|&n| i32::try_from(n).is_ok());
        if !fits || self.checked_len().is_none() {
            return Err(SpatialError::ExtentTooLarge(*self));
        }
        Ok(())
    }

    fn checked_len(&self) -> Option<usize> {
        self.nx.checked_mul(self.ny)?.checked_mul(self.nz)
    }

    /// Total number of voxels.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Returns `true` if the extent holds no voxels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of voxels in one XY slice.
    #[must_use]
    pub const fn slice_len(&self) -> usize {
        self.nx * self.ny
    }

    /// Returns `true` for a single-slice grid.
    #[must_use]
    pub const fn is_planar(&self) -> bool {
        self.nz == 1
    }

    /// Column-major flat index: `x + y*nx + z*nx*ny`.
    #[must_use]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.nx + z * self.nx * self.ny
    }

    /// Inverse of [`Extent::index`].
    #[must_use]
    pub const fn coords(&self, index: usize) -> (usize, usize, usize) {
        let xy = index % self.slice_len();
        (xy % self.nx, xy / self.nx, index / self.slice_len())
    }

    /// Returns `true` if the indices address a voxel of this extent.
    #[must_use]
    pub const fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.nx && y < self.ny && z < self.nz
    }

    /// Axis lengths as an array, X first.
    #[must_use]
    pub const fn as_array(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

/// Physical size of a voxel along each axis.
///
/// Microscopy stacks usually share one in-plane size (`dx == dy`) and a larger
/// axial step `dz`; [`Spacing::anisotropic`] builds that case directly.
///
/// # Example
///
/// ```
/// use evf_spatial::Spacing;
///
/// let spacing = Spacing::anisotropic(0.1, 0.12);
/// assert!(spacing.validate().is_ok());
/// assert!(spacing.is_anisotropic());
///
/// assert!(Spacing::new(0.1, f64::NAN, 0.1).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spacing {
    /// Voxel size along X.
    pub dx: f64,
    /// Voxel size along Y.
    pub dy: f64,
    /// Voxel size along Z.
    pub dz: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self::isotropic(1.0)
    }
}

impl Spacing {
    /// Creates a spacing with independent sizes per axis.
    #[must_use]
    pub const fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    /// Same size along every axis.
    #[must_use]
    pub const fn isotropic(d: f64) -> Self {
        Self::new(d, d, d)
    }

    /// In-plane size `xy` for X and Y, axial size `z` for Z.
    #[must_use]
    pub const fn anisotropic(xy: f64, z: f64) -> Self {
        Self::new(xy, xy, z)
    }

    /// Creates a spacing, rejecting non-positive or non-finite components.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidSpacing`] if any component is invalid.
    pub fn try_new(dx: f64, dy: f64, dz: f64) -> SpatialResult<Self> {
        let spacing = Self::new(dx, dy, dz);
        spacing.validate()?;
        Ok(spacing)
    }

    /// Checks that every component is a positive finite number.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidSpacing`] otherwise.
    pub fn validate(&self) -> SpatialResult<()> {
        let ok = [self.dx, self.dy, self.dz]
            .iter()
            .all(|d| d.is_finite() && *d > 0.0);
        if ok {
            Ok(())
        } else {
            Err(SpatialError::InvalidSpacing {
                dx: self.dx,
                dy: self.dy,
                dz: self.dz,
            })
        }
    }

    /// Ratio of axial to in-plane size (`dz / dx`).
    #[must_use]
    pub fn z_ratio(&self) -> f64 {
        self.dz / self.dx
    }

    /// Returns `true` if the axes do not all share one size.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_anisotropic(&self) -> bool {
        self.dx != self.dy || self.dx != self.dz
    }

    /// Size along an axis (0 = X, 1 = Y, 2 = Z).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 2`.
    #[must_use]
    pub fn along(&self, axis: usize) -> f64 {
        self.as_array()[axis]
    }

    /// Sizes as an array, X first.
    #[must_use]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }

    /// Sizes as a vector.
    #[must_use]
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.dx, self.dy, self.dz)
    }

    /// Physical volume of one voxel.
    #[must_use]
    pub fn voxel_volume(&self) -> f64 {
        self.dx * self.dy * self.dz
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extent_index_roundtrip() {
        let extent = Extent::new(4, 3, 2);
        for i in 0..extent.len() {
            let (x, y, z) = extent.coords(i);
            assert_eq!(extent.index(x, y, z), i);
        }
    }

    #[test]
    fn test_extent_validate() {
        assert!(Extent::new(1, 1, 1).validate().is_ok());
        assert!(matches!(
            Extent::new(0, 4, 4).validate(),
            Err(SpatialError::EmptyExtent(_))
        ));
        assert!(matches!(
            Extent::new(usize::MAX, 2, 1).validate(),
            Err(SpatialError::ExtentTooLarge(_))
        ));
    }

    #[test]
    fn test_extent_display() {
        assert_eq!(Extent::planar(10, 20).to_string(), "10x20x1");
    }

    #[test]
    fn test_spacing_validate() {
        assert!(Spacing::try_new(0.1, 0.1, 0.5).is_ok());
        assert!(Spacing::try_new(0.0, 0.1, 0.5).is_err());
        assert!(Spacing::try_new(0.1, -0.1, 0.5).is_err());
        assert!(Spacing::try_new(0.1, 0.1, f64::INFINITY).is_err());
        assert!(Spacing::try_new(f64::NAN, 0.1, 0.1).is_err());
    }

    #[test]
    fn test_spacing_ratio() {
        let spacing = Spacing::anisotropic(0.1, 0.12);
        assert_relative_eq!(spacing.z_ratio(), 1.2, epsilon = 1e-12);
        assert_eq!(spacing.along(1), 0.1);
        assert_relative_eq!(spacing.voxel_volume(), 0.0012, epsilon = 1e-15);
        assert!(!Spacing::isotropic(0.5).is_anisotropic());
    }
}
