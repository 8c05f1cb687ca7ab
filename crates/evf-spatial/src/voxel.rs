//! Integer voxel coordinates.

use std::ops::{Add, Neg, Sub};

use nalgebra::Vector3;

/// Position of a voxel, in a grid's local frame or in the global frame of the
/// image the grid was cropped from.
///
/// Components are `i32` so a global position can sit left of a crop's origin.
/// Arithmetic wraps instead of panicking; grid extents are validated to fit
/// `i32`, so wrapping only occurs for coordinates no grid can address.
///
/// # Example
///
/// ```
/// use evf_spatial::VoxelCoord;
///
/// let offset = VoxelCoord::new(100, 40, 2);
/// let local = VoxelCoord::new(3, 4, 0);
///
/// let global = offset + local;
/// assert_eq!(global, VoxelCoord::new(103, 44, 2));
/// assert_eq!(global - offset, local);
/// assert_eq!(local.to_indices(), Some((3, 4, 0)));
/// assert_eq!((-local).to_indices(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Slice.
    pub z: i32,
}

impl VoxelCoord {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// `(0, 0, 0)`.
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }

    /// Converts buffer indices; `None` if one does not fit in `i32`.
    #[must_use]
    pub fn from_indices(x: usize, y: usize, z: usize) -> Option<Self> {
        Some(Self::new(
            i32::try_from(x).ok()?,
            i32::try_from(y).ok()?,
            i32::try_from(z).ok()?,
        ))
    }

    /// Converts to buffer indices; `None` if a component is negative.
    #[must_use]
    pub fn to_indices(self) -> Option<(usize, usize, usize)> {
        Some((
            usize::try_from(self.x).ok()?,
            usize::try_from(self.y).ok()?,
            usize::try_from(self.z).ok()?,
        ))
    }

    /// The coordinate in voxel units as a float vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    pub(crate) fn zip_with(self, other: Self, f: impl Fn(i32, i32) -> i32) -> Self {
        Self::new(f(self.x, other.x), f(self.y, other.y), f(self.z, other.z))
    }
}

impl Add for VoxelCoord {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.zip_with(other, i32::wrapping_add)
    }
}

impl Sub for VoxelCoord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.zip_with(other, i32::wrapping_sub)
    }
}

impl Neg for VoxelCoord {
    type Output = Self;

    fn neg(self) -> Self {
        Self::origin() - self
    }
}
