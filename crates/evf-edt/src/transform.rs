//! Separable exact Euclidean distance transform.
//!
//! Each axis pass transforms every line of the grid independently, so lines
//! are distributed over the rayon thread pool. Results do not depend on the
//! number of threads.

// Grid indices are converted to f64 for border distances.
#![allow(clippy::cast_precision_loss)]

use evf_spatial::{Extent, Mask, Spacing, VoxelGrid};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::envelope::LineBuffers;
use crate::error::{EdtError, EdtResult};
use crate::params::{EdtParams, Side};

/// Computes the exact Euclidean distance map of a mask.
///
/// With [`Side::Inside`], every voxel of the mask receives its physical
/// distance to the nearest voxel outside it; voxels outside the mask are the
/// zero side. With [`Side::Outside`], voxels outside the mask receive their
/// distance to the nearest mask voxel and mask voxels are 0. See
/// [`BorderPolicy`](crate::BorderPolicy) for the role of the grid faces.
///
/// Axes with a single voxel are degenerate: they have no border, so a 2D
/// image never sees a face along Z.
///
/// Voxels that cannot reach any zero-side voxel (an empty source set) hold
/// `f64::INFINITY`.
///
/// # Arguments
///
/// * `mask` - The mask; its extent is the extent of the result
/// * `spacing` - Physical voxel size along each axis
/// * `params` - Side, squared output and border policy
///
/// # Errors
///
/// Returns [`EdtError::InvalidSpacing`] if any spacing component is NaN,
/// infinite, zero or negative, and [`EdtError::Spatial`] for an invalid extent.
/// Validation happens before any computation.
///
/// # Example
///
/// ```
/// use evf_edt::{EdtParams, distance_transform};
/// use evf_spatial::{BinaryMask, Extent, Spacing};
///
/// // A 5x1 row whose three middle pixels are inside.
/// let mask = BinaryMask::from_fn(Extent::planar(5, 1), |x, _, _| (1..=3).contains(&x));
/// let dist = distance_transform(&mask, Spacing::isotropic(0.5), &EdtParams::inside())?;
///
/// assert_eq!(dist.as_slice(), &[0.0, 0.5, 1.0, 0.5, 0.0]);
/// # Ok::<(), evf_edt::EdtError>(())
/// ```
pub fn distance_transform<M: Mask>(
    mask: &M,
    spacing: Spacing,
    params: &EdtParams,
) -> EdtResult<VoxelGrid<f64>> {
    spacing.validate().map_err(EdtError::InvalidSpacing)?;
    let extent = mask.extent();
    extent.validate()?;

    let border = params.border_is_source();
    debug!(
        extent = %extent,
        side = ?params.side,
        border,
        dx = spacing.dx,
        dy = spacing.dy,
        dz = spacing.dz,
        "Starting distance transform"
    );

    let (mut data, sources) = seed(mask, extent, params.side);
    let border_axes = border_axes(extent, border);

    if sources == 0 && !border_axes.iter().any(|&b| b) {
        warn!(
            extent = %extent,
            side = ?params.side,
            "No zero-side voxels; every distance is infinite"
        );
    } else {
        let weights = spacing.as_array().map(|d| d * d);
        if sources > 0 {
            pass_x(&mut data, extent, weights[0]);
            pass_y(&mut data, extent, weights[1]);
            pass_z(&mut data, extent, weights[2]);
        }
        apply_border(&mut data, extent, spacing, border_axes);
    }

    if !params.squared {
        data.par_iter_mut().for_each(|d| *d = d.sqrt());
    }

    info!(
        extent = %extent,
        sources,
        squared = params.squared,
        "Distance transform complete"
    );

    Ok(VoxelGrid::from_vec(extent, spacing, data)?)
}

/// Computes a signed distance map: positive outside the mask, negative inside.
///
/// Outside voxels hold their distance to the nearest mask voxel; inside voxels
/// hold minus their distance to the nearest outside voxel (grid faces count as
/// outside). Both sides use the default border policy of their side.
///
/// # Errors
///
/// Same as [`distance_transform`].
///
/// # Example
///
/// ```
/// use evf_edt::signed_distance_transform;
/// use evf_spatial::{BinaryMask, Extent, Spacing};
///
/// let mask = BinaryMask::from_fn(Extent::planar(7, 1), |x, _, _| (2..=4).contains(&x));
/// let field = signed_distance_transform(&mask, Spacing::isotropic(1.0))?;
///
/// assert_eq!(field.as_slice(), &[2.0, 1.0, -1.0, -2.0, -1.0, 1.0, 2.0]);
/// # Ok::<(), evf_edt::EdtError>(())
/// ```
pub fn signed_distance_transform<M: Mask>(
    mask: &M,
    spacing: Spacing,
) -> EdtResult<VoxelGrid<f64>> {
    let inside = distance_transform(mask, spacing, &EdtParams::inside())?;
    let mut field = distance_transform(mask, spacing, &EdtParams::outside())?;

    field
        .as_mut_slice()
        .par_iter_mut()
        .zip(inside.as_slice().par_iter())
        .for_each(|(out, &inner)| {
            if inner > 0.0 {
                *out = -inner;
            }
        });

    Ok(field)
}

/// Initial squared distances: 0 on the zero side, +inf elsewhere.
fn seed<M: Mask>(mask: &M, extent: Extent, side: Side) -> (Vec<f64>, usize) {
    let mut data = Vec::with_capacity(extent.len());
    let mut sources = 0;
    for z in 0..extent.nz {
        for y in 0..extent.ny {
            for x in 0..extent.nx {
                let inside = mask.contains_at(x, y, z);
                let source = match side {
                    Side::Inside => !inside,
                    Side::Outside => inside,
                };
                if source {
                    sources += 1;
                    data.push(0.0);
                } else {
                    data.push(f64::INFINITY);
                }
            }
        }
    }
    (data, sources)
}

/// Axes whose faces act as sources: requested, and more than one voxel long.
fn border_axes(extent: Extent, border: bool) -> [bool; 3] {
    extent.as_array().map(|n| border && n > 1)
}

/// Transforms rows along X; rows are contiguous.
fn pass_x(data: &mut [f64], extent: Extent, weight: f64) {
    let nx = extent.nx;
    if nx < 2 {
        return;
    }
    data.par_chunks_mut(nx)
        .for_each_init(
            || LineBuffers::new(nx),
            |buffers, row| {
                buffers.input.copy_from_slice(row);
                buffers.run(weight);
                row.copy_from_slice(&buffers.output);
            },
        );
}

/// Transforms columns along Y, one XY slice per task.
fn pass_y(data: &mut [f64], extent: Extent, weight: f64) {
    let (nx, ny) = (extent.nx, extent.ny);
    if ny < 2 {
        return;
    }
    data.par_chunks_mut(extent.slice_len())
        .for_each_init(
            || LineBuffers::new(ny),
            |buffers, slice| {
                for x in 0..nx {
                    for (y, v) in buffers.input.iter_mut().enumerate() {
                        *v = slice[x + y * nx];
                    }
                    buffers.run(weight);
                    for (y, &v) in buffers.output.iter().enumerate() {
                        slice[x + y * nx] = v;
                    }
                }
            },
        );
}

/// Transforms lines along Z, one XY position per task.
fn pass_z(data: &mut [f64], extent: Extent, weight: f64) {
    let nz = extent.nz;
    if nz < 2 {
        return;
    }
    let slice_len = extent.slice_len();
    let source: &[f64] = &*data;
    let lines: Vec<Vec<f64>> = (0..slice_len)
        .into_par_iter()
        .map_init(
            || LineBuffers::new(nz),
            |buffers, xy| {
                for (z, v) in buffers.input.iter_mut().enumerate() {
                    *v = source[xy + z * slice_len];
                }
                buffers.run(weight);
                buffers.output.clone()
            },
        )
        .collect();

    for (xy, line) in lines.iter().enumerate() {
        for (z, &v) in line.iter().enumerate() {
            data[xy + z * slice_len] = v;
        }
    }
}

/// Folds in the squared distance to the nearest grid face along each active axis.
fn apply_border(data: &mut [f64], extent: Extent, spacing: Spacing, axes: [bool; 3]) {
    if !axes.iter().any(|&a| a) {
        return;
    }
    let steps = spacing.as_array();
    let face = |i: usize, n: usize, axis: usize| -> f64 {
        if !axes[axis] {
            return f64::INFINITY;
        }
        let d = (i + 1).min(n - i) as f64 * steps[axis];
        d * d
    };
    let Extent { nx, ny, nz } = extent;

    data.par_chunks_mut(extent.slice_len())
        .enumerate()
        .for_each(|(z, slice)| {
            let fz = face(z, nz, 2);
            for (xy, v) in slice.iter_mut().enumerate() {
                let (x, y) = (xy % nx, xy / nx);
                let nearest = face(x, nx, 0).min(face(y, ny, 1)).min(fz);
                if nearest < *v {
                    *v = nearest;
                }
            }
        });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::params::BorderPolicy;
    use approx::assert_relative_eq;
    use evf_spatial::{BinaryMask, SpatialError, VoxelCoord};

    fn brute_force(mask: &BinaryMask, spacing: Spacing, params: &EdtParams) -> Vec<f64> {
        let extent = mask.extent();
        let (seeded, _) = seed(mask, extent, params.side);
        let border = border_axes(extent, params.border_is_source());
        let steps = spacing.as_array();
        (0..extent.len())
            .map(|i| {
                let (x, y, z) = extent.coords(i);
                let mut best = f64::INFINITY;
                for (j, &s) in seeded.iter().enumerate() {
                    if s != 0.0 {
                        continue;
                    }
                    let (qx, qy, qz) = extent.coords(j);
                    let dx = (x as f64 - qx as f64) * steps[0];
                    let dy = (y as f64 - qy as f64) * steps[1];
                    let dz = (z as f64 - qz as f64) * steps[2];
                    best = best.min(dx * dx + dy * dy + dz * dz);
                }
                for (axis, (&active, &i)) in border.iter().zip(&[x, y, z]).enumerate() {
                    if active {
                        let n = extent.as_array()[axis];
                        let d = (i + 1).min(n - i) as f64 * steps[axis];
                        best = best.min(d * d);
                    }
                }
                best.sqrt()
            })
            .collect()
    }

    fn blob(extent: Extent) -> BinaryMask {
        // Deterministic irregular shape.
        BinaryMask::from_fn(extent, |x, y, z| (x * 7 + y * 3 + z * 5) % 4 != 0 && x + y > 2)
    }

    #[test]
    fn test_matches_brute_force_inside() {
        let mask = blob(Extent::new(7, 6, 4));
        let spacing = Spacing::anisotropic(0.1, 0.27);
        let params = EdtParams::inside();
        let fast = distance_transform(&mask, spacing, &params).unwrap();
        let slow = brute_force(&mask, spacing, &params);
        for (a, b) in fast.as_slice().iter().zip(&slow) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matches_brute_force_outside() {
        let mask = blob(Extent::new(6, 5, 3));
        let spacing = Spacing::new(0.2, 0.15, 0.5);
        for border in [BorderPolicy::Auto, BorderPolicy::Source] {
            let params = EdtParams::outside().border(border);
            let fast = distance_transform(&mask, spacing, &params).unwrap();
            let slow = brute_force(&mask, spacing, &params);
            for (a, b) in fast.as_slice().iter().zip(&slow) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_squared_output() {
        let mask = blob(Extent::new(5, 5, 2));
        let spacing = Spacing::anisotropic(0.3, 0.7);
        let plain = distance_transform(&mask, spacing, &EdtParams::inside()).unwrap();
        let squared =
            distance_transform(&mask, spacing, &EdtParams::inside().squared(true)).unwrap();
        for (d, d2) in plain.as_slice().iter().zip(squared.as_slice()) {
            assert_relative_eq!(d * d, *d2, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_on_sources() {
        let mask = blob(Extent::new(6, 6, 3));
        let spacing = Spacing::anisotropic(0.1, 0.2);
        let inside = distance_transform(&mask, spacing, &EdtParams::inside()).unwrap();
        let outside = distance_transform(&mask, spacing, &EdtParams::outside()).unwrap();
        for (i, inside_mask) in mask.as_slice().iter().enumerate() {
            if *inside_mask {
                assert_eq!(outside.as_slice()[i], 0.0);
                assert!(inside.as_slice()[i] > 0.0);
            } else {
                assert_eq!(inside.as_slice()[i], 0.0);
            }
        }
    }

    #[test]
    fn test_empty_mask_outside_is_infinite() {
        let mask = BinaryMask::empty(Extent::new(4, 4, 2));
        let dist = distance_transform(&mask, Spacing::default(), &EdtParams::outside()).unwrap();
        assert!(dist.as_slice().iter().all(|d| *d == f64::INFINITY));
    }

    #[test]
    fn test_full_mask_inside_sees_border() {
        let mask = BinaryMask::full(Extent::planar(5, 3));
        let dist = distance_transform(&mask, Spacing::isotropic(2.0), &EdtParams::inside()).unwrap();
        assert_eq!(dist[(0, 0, 0)], 2.0);
        assert_eq!(dist[(2, 1, 0)], 4.0);
    }

    #[test]
    fn test_full_mask_inside_without_border_is_infinite() {
        let mask = BinaryMask::full(Extent::planar(3, 3));
        let params = EdtParams::inside().border(BorderPolicy::Ignore);
        let dist = distance_transform(&mask, Spacing::default(), &params).unwrap();
        assert!(dist.as_slice().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_single_voxel_grid() {
        let mask = BinaryMask::full(Extent::new(1, 1, 1));
        let dist = distance_transform(&mask, Spacing::default(), &EdtParams::inside()).unwrap();
        assert_eq!(dist.as_slice(), &[f64::INFINITY]);
    }

    #[test]
    fn test_invalid_spacing_rejected() {
        let mask = BinaryMask::full(Extent::planar(3, 3));
        for spacing in [
            Spacing::new(f64::NAN, 1.0, 1.0),
            Spacing::new(1.0, -1.0, 1.0),
            Spacing::new(1.0, 1.0, 0.0),
            Spacing::new(1.0, 1.0, f64::INFINITY),
        ] {
            let err = distance_transform(&mask, spacing, &EdtParams::inside()).unwrap_err();
            assert!(matches!(
                err,
                EdtError::InvalidSpacing(SpatialError::InvalidSpacing { .. })
            ));
        }
    }

    #[test]
    fn test_planar_has_no_z_border() {
        // Z spacing of a 2D image must not matter.
        let mask = BinaryMask::full(Extent::planar(4, 4));
        let a = distance_transform(&mask, Spacing::new(1.0, 1.0, 0.01), &EdtParams::inside())
            .unwrap();
        let b = distance_transform(&mask, Spacing::new(1.0, 1.0, 100.0), &EdtParams::inside())
            .unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_signed_transform() {
        let mask = BinaryMask::from_coords(
            Extent::planar(5, 5),
            [
                VoxelCoord::new(1, 1, 0),
                VoxelCoord::new(2, 1, 0),
                VoxelCoord::new(1, 2, 0),
                VoxelCoord::new(2, 2, 0),
            ],
        )
        .unwrap();
        let field = signed_distance_transform(&mask, Spacing::isotropic(1.0)).unwrap();
        assert_eq!(field[(1, 1, 0)], -1.0);
        assert_eq!(field[(3, 1, 0)], 1.0);
        assert_relative_eq!(field[(4, 4, 0)], 8.0_f64.sqrt());
    }
}
