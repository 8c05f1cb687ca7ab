//! Result type of field assembly.

use evf_spatial::{BinaryMask, GridBounds, Mask, VoxelCoord, VoxelGrid};

use crate::params::FieldOutput;

/// A field computed over the bounding box of a container.
///
/// `field` carries the global offset of the box, so local voxel `(0, 0, 0)`
/// sits at [`EvfMap::offset`] in the frame of the original label image.
#[derive(Debug, Clone)]
pub struct EvfMap {
    /// Values over the container's bounding box; background elsewhere.
    pub field: VoxelGrid<f64>,
    /// Voxels of `field` that carry a value.
    pub domain: BinaryMask,
    /// Label of the container.
    pub container: u32,
    /// Ranks or raw distances.
    pub output: FieldOutput,
    /// Voxels counted in the normalization (both sides for a signed field).
    pub volume: usize,
    /// Voxels ranked against the table without being counted.
    pub excluded_volume: usize,
    /// Voxels of the reference set.
    pub reference_volume: usize,
}

impl EvfMap {
    /// Global position of local voxel `(0, 0, 0)`.
    #[must_use]
    pub const fn offset(&self) -> VoxelCoord {
        self.field.offset()
    }

    /// Bounding box of the field in the global frame.
    #[must_use]
    pub fn bounds(&self) -> GridBounds {
        self.field.bounds()
    }

    /// Value at a global coordinate, if it lies in the domain.
    #[must_use]
    pub fn value_at(&self, global: VoxelCoord) -> Option<f64> {
        let local = self.field.to_local(global);
        if self.domain.contains(local) {
            self.field.get(local).copied()
        } else {
            None
        }
    }

    /// Writes the domain voxels into a grid of the caller's global frame.
    ///
    /// Returns the number of voxels written; voxels falling outside `target`
    /// are skipped.
    pub fn embed_into(&self, target: &mut VoxelGrid<f64>) -> usize {
        let mut written = 0;
        for (local, &value) in self.field.iter() {
            if !self.domain.contains(local) {
                continue;
            }
            let global = self.field.to_global(local);
            if let Some(slot) = target.get_mut(target.to_local(global)) {
                *slot = value;
                written += 1;
            }
        }
        written
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use evf_spatial::{Extent, Spacing};

    fn patch() -> EvfMap {
        let extent = Extent::planar(2, 2);
        let field = VoxelGrid::from_vec(extent, Spacing::default(), vec![0.1, 0.2, 0.3, f64::NAN])
            .unwrap()
            .with_offset(VoxelCoord::new(5, 1, 0));
        let domain = BinaryMask::from_fn(extent, |x, y, _| x + y < 2);
        EvfMap {
            field,
            domain,
            container: 1,
            output: FieldOutput::Rank,
            volume: 3,
            excluded_volume: 0,
            reference_volume: 3,
        }
    }

    #[test]
    fn test_value_at_global() {
        let map = patch();
        assert_eq!(map.value_at(VoxelCoord::new(5, 1, 0)), Some(0.1));
        assert_eq!(map.value_at(VoxelCoord::new(5, 2, 0)), Some(0.3));
        assert_eq!(map.value_at(VoxelCoord::new(6, 2, 0)), None);
        assert_eq!(map.value_at(VoxelCoord::new(0, 0, 0)), None);
        assert_eq!(map.bounds().max, VoxelCoord::new(6, 2, 0));
    }

    #[test]
    fn test_embed_skips_background_and_clipped_voxels() {
        let map = patch();
        let mut image = VoxelGrid::filled(Extent::planar(6, 3), Spacing::default(), -1.0).unwrap();
        // Column x = 6 falls outside the image.
        assert_eq!(map.embed_into(&mut image), 2);
        assert_eq!(image[(5, 1, 0)], 0.1);
        assert_eq!(image[(5, 2, 0)], 0.3);
        assert_eq!(image[(4, 1, 0)], -1.0);
    }
}
