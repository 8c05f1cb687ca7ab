//! Labeled objects in a voxel image.
//!
//! A [`Population`] wraps a label image (0 = background) and indexes every
//! non-zero label as a [`Region`] with its bounding box and voxel count.
//! Masks are materialised lazily as [`LabelMask`]s over the label image.

use std::collections::BTreeMap;

use tracing::debug;

use crate::bounds::GridBounds;
use crate::error::{SpatialError, SpatialResult};
use crate::grid::VoxelGrid;
use crate::mask::LabelMask;
use crate::spacing::Spacing;
use crate::voxel::VoxelCoord;

/// One labeled object of a [`Population`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// The object's label value.
    pub label: u32,
    /// Bounding box in the global frame.
    pub bounds: GridBounds,
    /// Number of voxels carrying the label.
    pub volume: usize,
}

impl Region {
    /// Physical volume of the object.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn physical_volume(&self, spacing: Spacing) -> f64 {
        self.volume as f64 * spacing.voxel_volume()
    }
}

/// A label image and the regions it contains.
///
/// # Example
///
/// ```
/// use evf_spatial::{Extent, Mask, Population, Spacing, VoxelCoord, VoxelGrid};
///
/// #[rustfmt::skip]
/// let labels = VoxelGrid::from_vec(Extent::planar(4, 2), Spacing::default(), vec![
///     0, 1, 1, 0,
///     0, 1, 2, 2,
/// ])?;
/// let population = Population::from_labels(labels);
///
/// assert_eq!(population.len(), 2);
/// let region = population.region(1)?;
/// assert_eq!(region.volume, 3);
/// assert_eq!(region.bounds.min, VoxelCoord::new(1, 0, 0));
/// assert_eq!(population.mask(2).count(), 2);
/// # Ok::<(), evf_spatial::SpatialError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Population {
    labels: VoxelGrid<u32>,
    regions: BTreeMap<u32, Region>,
}

impl Population {
    /// Indexes every non-zero label of `labels`.
    #[must_use]
    pub fn from_labels(labels: VoxelGrid<u32>) -> Self {
        let mut regions: BTreeMap<u32, Region> = BTreeMap::new();
        for (local, &label) in labels.iter() {
            if label == 0 {
                continue;
            }
            let global = labels.to_global(local);
            regions
                .entry(label)
                .and_modify(|r| {
                    r.bounds.expand_to_include(global);
                    r.volume += 1;
                })
                .or_insert(Region {
                    label,
                    bounds: GridBounds::from_point(global),
                    volume: 1,
                });
        }
        debug!(
            extent = %labels.extent(),
            regions = regions.len(),
            "Indexed label population"
        );
        Self { labels, regions }
    }

    /// The label image.
    #[must_use]
    pub const fn labels(&self) -> &VoxelGrid<u32> {
        &self.labels
    }

    /// Physical voxel spacing of the label image.
    #[must_use]
    pub const fn spacing(&self) -> Spacing {
        self.labels.spacing()
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the image has no labeled voxel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Looks up a region by label.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownLabel`] if no voxel carries `label`.
    pub fn region(&self, label: u32) -> SpatialResult<&Region> {
        self.regions
            .get(&label)
            .ok_or(SpatialError::UnknownLabel(label))
    }

    /// Iterates over regions in label order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.values()
    }

    /// Mask of one object over the whole label image.
    #[must_use]
    pub fn mask(&self, label: u32) -> LabelMask<'_> {
        LabelMask::single(&self.labels, label)
    }

    /// Mask of several objects over the whole label image.
    #[must_use]
    pub fn mask_of<I>(&self, labels: I) -> LabelMask<'_>
    where
        I: IntoIterator<Item = u32>,
    {
        LabelMask::new(&self.labels, labels)
    }

    /// Labels of the other regions whose bounding box lies inside `label`'s
    /// box (candidate children). Only bounding boxes are compared.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownLabel`] if `label` is absent.
    pub fn nested_in(&self, label: u32) -> SpatialResult<Vec<u32>> {
        let outer = self.region(label)?.bounds;
        Ok(self
            .regions
            .values()
            .filter(|r| r.label != label)
            .filter(|r| outer.encloses(&r.bounds))
            .map(|r| r.label)
            .collect())
    }

    /// Restricts the population to the bounding box of `label`.
    ///
    /// The cropped label image keeps the global offset, and regions are
    /// re-indexed inside the crop (objects cut by the box shrink accordingly).
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownLabel`] if `label` is absent.
    pub fn crop_to(&self, label: u32) -> SpatialResult<Self> {
        self.crop_around(label, 0)
    }

    /// Restricts the population to the bounding box of `label` grown by
    /// `margin` voxels on every side and clipped to the label image.
    ///
    /// A margin of one keeps the voxels just outside a thin object, so an
    /// axis of the crop has a single voxel only where the image does.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownLabel`] if `label` is absent.
    pub fn crop_around(&self, label: u32, margin: u16) -> SpatialResult<Self> {
        let bounds = self.region(label)?.bounds;
        let pad = VoxelCoord::new(i32::from(margin), i32::from(margin), i32::from(margin));
        let grown = GridBounds::new(bounds.min - pad, bounds.max + pad);
        let clipped = grown
            .intersection(&self.labels.bounds())
            .unwrap_or(bounds);
        let local = GridBounds::new(
            self.labels.to_local(clipped.min),
            self.labels.to_local(clipped.max),
        );
        let cropped = self.labels.crop(local)?;
        Ok(Self::from_labels(cropped))
    }
}
