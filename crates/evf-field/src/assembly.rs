//! Field assembly over labeled populations.
//!
//! A container region (a cell, a nucleus) defines the voxels that are
//! normalized. Distances are measured either from the container's own
//! boundary or from reference objects lying inside it, then turned into
//! percentile ranks over the container's voxels.

use evf_edt::{EdtParams, distance_transform};
use evf_spatial::{
    BinaryMask, GridBounds, LabelMask, Mask, Population, VoxelGrid, difference, threshold,
};
use tracing::{debug, info};

use crate::error::{FieldError, FieldResult};
use crate::params::{EvfParams, FieldOutput, Reference, ReferenceSide};
use crate::rank::{normalize, normalize_with_excluded};
use crate::result::EvfMap;

/// Computes the distance or rank field of one container.
///
/// The returned field covers the container's bounding box and keeps the
/// box's global offset. Distances to a boundary are measured on the box grown
/// by one voxel, so the background just outside the box counts as outside
/// even for a container one voxel thick. Only the faces of the image itself
/// act as an outside beyond the last voxel.
///
/// With [`Reference::Container`], container voxels receive their distance to
/// the container boundary. A positive `erosion` removes the shell of voxels
/// within that distance of the boundary from the normalization and ranks them
/// against the remaining core. Every shell distance lies below the smallest
/// core distance, so under
/// [`ExcludedPolicy::Interpolate`](crate::ExcludedPolicy::Interpolate) shell
/// voxels clamp to rank 0 and are never interpolated. The side parameter is
/// not used.
///
/// With [`Reference::Labels`], the listed objects form the reference.
/// [`ReferenceSide::Outside`] values container voxels by their distance to the
/// nearest reference voxel, [`ReferenceSide::Inside`] values reference voxels
/// by their distance to the reference boundary, and [`ReferenceSide::Both`]
/// does both with the inside part negated. Each side is normalized on its own.
/// Erosion is not used.
///
/// # Errors
///
/// - [`FieldError::InvalidParams`] for a negative or non-finite erosion, an
///   empty label list, or a reference label equal to the container
/// - [`FieldError::Spatial`] if the container label is absent
/// - [`FieldError::UnknownLabel`] if a reference label has no voxel in the
///   container's bounding box
/// - [`FieldError::EmptyMask`] if a normalized side has no voxel
/// - [`FieldError::Edt`] for an invalid spacing
///
/// # Example
///
/// ```
/// use evf_field::{EvfParams, Reference, compute_evf};
/// use evf_spatial::{Extent, Population, Spacing, VoxelCoord, VoxelGrid};
///
/// // A 5x5 container (label 1) with a one-voxel object (label 2) at its centre.
/// let mut labels = VoxelGrid::filled(Extent::planar(7, 7), Spacing::isotropic(0.2), 0_u32)?;
/// for y in 1..=5 {
///     for x in 1..=5 {
///         labels[(x, y, 0)] = 1;
///     }
/// }
/// labels[(3, 3, 0)] = 2;
/// let population = Population::from_labels(labels);
///
/// let map = compute_evf(&population, 1, &Reference::Labels(vec![2]), &EvfParams::default())?;
///
/// assert_eq!(map.volume, 24);
/// assert_eq!(map.offset(), VoxelCoord::new(1, 1, 0));
/// // The four direct neighbours of the object share the lowest rank.
/// assert_eq!(map.value_at(VoxelCoord::new(3, 2, 0)), Some(1.5 / 24.0));
/// // The object itself is not valued on the outside side.
/// assert_eq!(map.value_at(VoxelCoord::new(3, 3, 0)), None);
/// # Ok::<(), evf_field::FieldError>(())
/// ```
pub fn compute_evf(
    population: &Population,
    container: u32,
    reference: &Reference,
    params: &EvfParams,
) -> FieldResult<EvfMap> {
    params.validate()?;
    let crop = population.crop_to(container)?;
    let context = population.crop_around(container, 1)?;
    let labels = crop.labels();

    debug!(
        container,
        extent = %labels.extent(),
        offset = ?labels.offset(),
        reference = ?reference,
        side = ?params.side,
        output = ?params.output,
        "Assembling field"
    );

    let map = match reference {
        Reference::Container => container_field(&crop, &context, container, params)?,
        Reference::Labels(refs) => reference_field(&crop, &context, container, refs, params)?,
    };

    info!(
        container,
        volume = map.volume,
        excluded = map.excluded_volume,
        reference = map.reference_volume,
        "Field assembly complete"
    );
    Ok(map)
}

/// Distances from the container's own boundary, with optional erosion.
fn container_field(
    crop: &Population,
    context: &Population,
    container: u32,
    params: &EvfParams,
) -> FieldResult<EvfMap> {
    let labels = crop.labels();
    let container_mask = LabelMask::single(labels, container);
    let mut dist = inside_distances(&context.mask(container), context, labels)?;

    // Outside voxels sit at distance 0, so the strict lower bound keeps the
    // shell inside the container. A zero erosion gives an empty shell.
    let shell = threshold(&dist, 0.0, params.erosion, true, false).to_binary();
    let core = difference(&container_mask, &shell)?;
    let volume = core.count();
    let excluded_volume = shell.count();
    debug!(
        container,
        volume,
        excluded_volume,
        erosion = params.erosion,
        "Eroded container"
    );

    if params.output == FieldOutput::Rank {
        normalize_with_excluded(&mut dist, &core, &shell, &params.rank)?;
    }

    let domain = container_mask.to_binary();
    let mut field = VoxelGrid::filled_like(labels, params.background);
    paint(&mut field, &dist, &domain, 1.0);

    Ok(EvfMap {
        field,
        reference_volume: domain.count(),
        domain,
        container,
        output: params.output,
        volume,
        excluded_volume,
    })
}

/// Distances from reference objects inside the container.
fn reference_field(
    crop: &Population,
    context: &Population,
    container: u32,
    refs: &[u32],
    params: &EvfParams,
) -> FieldResult<EvfMap> {
    if refs.is_empty() {
        return Err(FieldError::invalid_params("reference label list is empty"));
    }
    for &label in refs {
        if label == container {
            return Err(FieldError::invalid_params(format!(
                "reference label {label} is the container; use Reference::Container"
            )));
        }
        if crop.region(label).is_err() {
            return Err(FieldError::UnknownLabel(label));
        }
    }
    if params.erosion > 0.0 {
        debug!(erosion = params.erosion, "Erosion ignored for a label reference");
    }

    let labels = crop.labels();
    let spacing = crop.spacing();
    let reference = crop.mask_of(refs.iter().copied());
    let outside = difference(crop.mask(container), &reference)?;
    let rank = params.output == FieldOutput::Rank;

    let mut field = VoxelGrid::filled_like(labels, params.background);
    let mut volume = 0;
    let valued_outside = matches!(params.side, ReferenceSide::Outside | ReferenceSide::Both);
    let valued_inside = matches!(params.side, ReferenceSide::Inside | ReferenceSide::Both);

    if valued_outside {
        let mut dist = distance_transform(&reference, spacing, &EdtParams::outside())?;
        if rank {
            volume += normalize(&mut dist, &outside, &params.rank)?.len();
        } else {
            volume += outside.count();
        }
        paint(&mut field, &dist, &outside, 1.0);
    }
    if valued_inside {
        let padded = context.mask_of(refs.iter().copied());
        let mut dist = inside_distances(&padded, context, labels)?;
        if rank {
            volume += normalize(&mut dist, &reference, &params.rank)?.len();
        } else {
            volume += reference.count();
        }
        let sign = if params.side == ReferenceSide::Both { -1.0 } else { 1.0 };
        paint(&mut field, &dist, &reference, sign);
    }

    let domain = BinaryMask::from_fn(labels.extent(), |x, y, z| {
        (valued_outside && outside.contains_at(x, y, z))
            || (valued_inside && reference.contains_at(x, y, z))
    });

    Ok(EvfMap {
        field,
        domain,
        container,
        output: params.output,
        volume,
        excluded_volume: 0,
        reference_volume: reference.count(),
    })
}

/// Inside-mode distances of `mask`, a mask over the padded `context` crop,
/// cut back to the voxels of `labels`.
fn inside_distances<M: Mask>(
    mask: &M,
    context: &Population,
    labels: &VoxelGrid<u32>,
) -> FieldResult<VoxelGrid<f64>> {
    let padded = context.labels();
    let dist = distance_transform(mask, padded.spacing(), &EdtParams::inside())?;
    let bounds = labels.bounds();
    let local = GridBounds::new(padded.to_local(bounds.min), padded.to_local(bounds.max));
    Ok(dist.crop(local)?.with_offset(labels.offset()))
}

/// Copies `sign * source` into `target` on the voxels of `mask`.
fn paint<M: Mask>(target: &mut VoxelGrid<f64>, source: &VoxelGrid<f64>, mask: &M, sign: f64) {
    let extent = source.extent();
    let (src, dst) = (source.as_slice(), target.as_mut_slice());
    for z in 0..extent.nz {
        for y in 0..extent.ny {
            for x in 0..extent.nx {
                if mask.contains_at(x, y, z) {
                    let i = extent.index(x, y, z);
                    dst[i] = sign * src[i];
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use evf_spatial::{Extent, Spacing, SpatialError, VoxelCoord};

    /// A 7-voxel rod (label 1) inside a 9x1 image.
    fn rod() -> Population {
        let mut labels = VoxelGrid::filled(Extent::planar(9, 1), Spacing::default(), 0_u32).unwrap();
        for x in 1..=7 {
            labels[(x, 0, 0)] = 1;
        }
        Population::from_labels(labels)
    }

    /// A 7-voxel rod (label 1) along the middle row of a 9x3 image, with an
    /// object (label 2) covering its three central voxels.
    fn thin_rod() -> Population {
        let mut labels = VoxelGrid::filled(Extent::planar(9, 3), Spacing::default(), 0_u32).unwrap();
        for x in 1..=7 {
            labels[(x, 1, 0)] = if (3..=5).contains(&x) { 2 } else { 1 };
        }
        Population::from_labels(labels)
    }

    /// A 5x5 container (label 1) with a one-voxel object (label 2) at its centre,
    /// and a stray object (label 3) outside it.
    fn cell() -> Population {
        let mut labels =
            VoxelGrid::filled(Extent::planar(9, 7), Spacing::isotropic(0.2), 0_u32).unwrap();
        for y in 1..=5 {
            for x in 1..=5 {
                labels[(x, y, 0)] = 1;
            }
        }
        labels[(3, 3, 0)] = 2;
        labels[(8, 6, 0)] = 3;
        Population::from_labels(labels)
    }

    #[test]
    fn test_container_ranks() {
        let map = compute_evf(&rod(), 1, &Reference::Container, &EvfParams::new()).unwrap();
        assert_eq!(map.offset(), VoxelCoord::new(1, 0, 0));
        assert_eq!(map.volume, 7);
        assert_eq!(map.excluded_volume, 0);
        // Distances 1 2 3 4 3 2 1.
        let ranks: Vec<f64> = map.field.as_slice().to_vec();
        assert_relative_eq!(ranks[0], 0.5 / 7.0);
        assert_relative_eq!(ranks[3], 6.0 / 7.0);
        assert_eq!(ranks[1], ranks[5]);
    }

    #[test]
    fn test_container_erosion_excludes_shell() {
        let params = EvfParams::new().erosion(1.0);
        let map = compute_evf(&rod(), 1, &Reference::Container, &params).unwrap();
        assert_eq!(map.volume, 5);
        assert_eq!(map.excluded_volume, 2);
        // Core distances 2 3 4 3 2; the shell (distance 1) clamps to 0.
        let expected = [0.0, 0.1, 0.5, 0.8, 0.5, 0.1, 0.0];
        for (r, e) in map.field.as_slice().iter().zip(expected) {
            assert_relative_eq!(*r, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_container_distance_output() {
        let params = EvfParams::new().output(FieldOutput::Distance);
        let map = compute_evf(&rod(), 1, &Reference::Container, &params).unwrap();
        assert_eq!(map.field.as_slice(), &[1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_thin_container_sees_neighbouring_rows() {
        let mut labels = VoxelGrid::filled(Extent::planar(9, 3), Spacing::default(), 0_u32).unwrap();
        for x in 1..=7 {
            labels[(x, 1, 0)] = 1;
        }
        let pop = Population::from_labels(labels);

        let params = EvfParams::new().output(FieldOutput::Distance);
        let map = compute_evf(&pop, 1, &Reference::Container, &params).unwrap();
        assert_eq!(map.offset(), VoxelCoord::new(1, 1, 0));
        assert_eq!(map.field.as_slice(), &[1.0; 7]);

        // Every voxel is tied, so every rank is the same.
        let map = compute_evf(&pop, 1, &Reference::Container, &EvfParams::new()).unwrap();
        let first = map.field.as_slice()[0];
        assert!(map.field.as_slice().iter().all(|&r| r == first));
    }

    #[test]
    fn test_single_voxel_container_is_finite() {
        let mut labels = VoxelGrid::filled(Extent::planar(3, 3), Spacing::isotropic(0.4), 0_u32).unwrap();
        labels[(1, 1, 0)] = 1;
        let pop = Population::from_labels(labels);

        let params = EvfParams::new().output(FieldOutput::Distance);
        let map = compute_evf(&pop, 1, &Reference::Container, &params).unwrap();
        assert_eq!(map.field.extent(), Extent::new(1, 1, 1));
        assert_relative_eq!(map.value_at(VoxelCoord::new(1, 1, 0)).unwrap(), 0.4);

        let map = compute_evf(&pop, 1, &Reference::Container, &EvfParams::new()).unwrap();
        assert!(map.value_at(VoxelCoord::new(1, 1, 0)).unwrap().is_finite());
    }

    #[test]
    fn test_single_slice_plate_sees_axial_neighbours() {
        // A 3x3 plate on the middle slice of a 5x5x3 stack with thin slices.
        let mut labels =
            VoxelGrid::filled(Extent::new(5, 5, 3), Spacing::anisotropic(1.0, 0.3), 0_u32)
                .unwrap();
        for y in 1..=3 {
            for x in 1..=3 {
                labels[(x, y, 1)] = 1;
            }
        }
        let pop = Population::from_labels(labels);

        let params = EvfParams::new().output(FieldOutput::Distance);
        let map = compute_evf(&pop, 1, &Reference::Container, &params).unwrap();
        assert_eq!(map.field.extent(), Extent::new(3, 3, 1));
        for &d in map.field.as_slice() {
            assert_relative_eq!(d, 0.3, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_thin_reference_inside_side() {
        let params = EvfParams::new()
            .side(ReferenceSide::Inside)
            .output(FieldOutput::Distance);
        let map = compute_evf(&thin_rod(), 1, &Reference::Labels(vec![2]), &params).unwrap();
        assert_eq!(map.volume, 3);
        for x in 3..=5 {
            assert_eq!(map.value_at(VoxelCoord::new(x, 1, 0)), Some(1.0));
        }
        assert_eq!(map.value_at(VoxelCoord::new(2, 1, 0)), None);

        // The outside side only sees the rod itself.
        let params = params.side(ReferenceSide::Outside);
        let map = compute_evf(&thin_rod(), 1, &Reference::Labels(vec![2]), &params).unwrap();
        assert_eq!(map.value_at(VoxelCoord::new(1, 1, 0)), Some(2.0));
        assert_eq!(map.value_at(VoxelCoord::new(7, 1, 0)), Some(2.0));
    }

    #[test]
    fn test_erosion_swallowing_container_is_empty() {
        let params = EvfParams::new().erosion(10.0);
        let err = compute_evf(&rod(), 1, &Reference::Container, &params).unwrap_err();
        assert!(matches!(err, FieldError::EmptyMask));
    }

    #[test]
    fn test_reference_outside_side() {
        let map = compute_evf(&cell(), 1, &Reference::Labels(vec![2]), &EvfParams::new()).unwrap();
        assert_eq!(map.volume, 24);
        assert_eq!(map.reference_volume, 1);
        assert_eq!(map.value_at(VoxelCoord::new(3, 3, 0)), None);
        assert_eq!(map.value_at(VoxelCoord::new(2, 3, 0)), Some(1.5 / 24.0));
        // Corners are the farthest, a tie run of four at the top.
        assert_eq!(map.value_at(VoxelCoord::new(1, 1, 0)), Some(21.5 / 24.0));
    }

    #[test]
    fn test_reference_both_sides_distance() {
        let params = EvfParams::new()
            .side(ReferenceSide::Both)
            .output(FieldOutput::Distance);
        let map = compute_evf(&cell(), 1, &Reference::Labels(vec![2]), &params).unwrap();
        assert_eq!(map.volume, 25);
        assert_relative_eq!(map.value_at(VoxelCoord::new(3, 3, 0)).unwrap(), -0.2);
        assert_relative_eq!(map.value_at(VoxelCoord::new(3, 2, 0)).unwrap(), 0.2);
        assert_relative_eq!(
            map.value_at(VoxelCoord::new(1, 1, 0)).unwrap(),
            0.2 * 8.0_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_reference_inside_side() {
        let params = EvfParams::new().side(ReferenceSide::Inside);
        let map = compute_evf(&cell(), 1, &Reference::Labels(vec![2]), &params).unwrap();
        assert_eq!(map.volume, 1);
        assert_eq!(map.value_at(VoxelCoord::new(3, 3, 0)), Some(0.0));
        assert_eq!(map.value_at(VoxelCoord::new(2, 3, 0)), None);
    }

    #[test]
    fn test_reference_errors() {
        let pop = cell();
        let params = EvfParams::new();

        let err = compute_evf(&pop, 1, &Reference::Labels(vec![]), &params).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParams(_)));

        let err = compute_evf(&pop, 1, &Reference::Labels(vec![1]), &params).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParams(_)));

        // Label 3 exists but lies outside the container's box.
        let err = compute_evf(&pop, 1, &Reference::Labels(vec![3]), &params).unwrap_err();
        assert!(matches!(err, FieldError::UnknownLabel(3)));

        let err = compute_evf(&pop, 9, &Reference::Container, &params).unwrap_err();
        assert!(matches!(
            err,
            FieldError::Spatial(SpatialError::UnknownLabel(9))
        ));

        let err = compute_evf(&pop, 1, &Reference::Container, &params.erosion(-1.0)).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParams(_)));
    }

    #[test]
    fn test_background_outside_domain() {
        // An L-shaped container leaves label-0 voxels in its bounding box.
        let mut labels = VoxelGrid::filled(Extent::planar(4, 4), Spacing::default(), 0_u32).unwrap();
        for i in 0..4 {
            labels[(i, 0, 0)] = 1;
            labels[(0, i, 0)] = 1;
        }
        let params = EvfParams::new().background(-1.0);
        let map =
            compute_evf(&Population::from_labels(labels), 1, &Reference::Container, &params)
                .unwrap();
        assert_eq!(map.field[(2, 2, 0)], -1.0);
        assert_eq!(map.value_at(VoxelCoord::new(2, 2, 0)), None);
        assert_eq!(map.domain.count(), 7);
    }
}
