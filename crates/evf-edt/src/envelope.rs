//! One-dimensional squared distance transform by lower envelope of parabolas.
//!
//! For a sampled function `f` on a line with physical step `s`, computes
//!
//! ```text
//! d(p) = min_q ( f(q) + s² (p - q)² )
//! ```
//!
//! in linear time (Felzenszwalb & Huttenlocher). Running it along X with
//! `f` = 0 at sources and +inf elsewhere, then along Y and Z on the previous
//! result, yields the exact squared Euclidean distance in physical units.

// Line positions are grid indices; they fit in f64 mantissas for any
// realistic image size.
#![allow(clippy::cast_precision_loss)]

/// Reusable buffers for transforming lines of one length.
#[derive(Debug, Clone)]
pub(crate) struct LineBuffers {
    /// Samples of the line before the transform.
    pub input: Vec<f64>,
    /// Transformed samples.
    pub output: Vec<f64>,
    /// Positions of the parabolas forming the lower envelope.
    vertices: Vec<usize>,
    /// Left boundary of each envelope parabola.
    boundaries: Vec<f64>,
}

impl LineBuffers {
    pub fn new(len: usize) -> Self {
        Self {
            input: vec![0.0; len],
            output: vec![0.0; len],
            vertices: Vec::with_capacity(len),
            boundaries: Vec::with_capacity(len),
        }
    }

    /// Transforms `input` into `output` with parabola weight `weight = s²`.
    ///
    /// Infinite samples contribute no parabola. A line without any finite
    /// sample stays infinite.
    pub fn run(&mut self, weight: f64) {
        let Self {
            input,
            output,
            vertices,
            boundaries,
        } = self;
        vertices.clear();
        boundaries.clear();

        for (q, &fq) in input.iter().enumerate() {
            if !fq.is_finite() {
                continue;
            }
            let boundary = loop {
                let Some(&p) = vertices.last() else {
                    break f64::NEG_INFINITY;
                };
                let s = intersection(input, p, q, weight);
                // The first boundary is -inf, so at least one parabola stays.
                if boundaries.last().is_some_and(|&b| s <= b) {
                    vertices.pop();
                    boundaries.pop();
                } else {
                    break s;
                }
            };
            vertices.push(q);
            boundaries.push(boundary);
        }

        if vertices.is_empty() {
            output.fill(f64::INFINITY);
            return;
        }

        let mut k = 0;
        for (p, out) in output.iter_mut().enumerate() {
            let position = p as f64;
            while k + 1 < vertices.len() && boundaries[k + 1] < position {
                k += 1;
            }
            let q = vertices[k];
            let delta = position - q as f64;
            *out = weight.mul_add(delta * delta, input[q]);
        }
    }
}

/// Abscissa where the parabolas rooted at `p < q` intersect.
fn intersection(f: &[f64], p: usize, q: usize, weight: f64) -> f64 {
    let (p, fp) = (p as f64, f[p]);
    let (q, fq) = (q as f64, f[q]);
    (weight.mul_add(q * q, fq) - weight.mul_add(p * p, fp)) / (2.0 * weight * (q - p))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const INF: f64 = f64::INFINITY;

    fn brute_force(f: &[f64], weight: f64) -> Vec<f64> {
        (0..f.len())
            .map(|p| {
                f.iter()
                    .enumerate()
                    .map(|(q, &fq)| {
                        let d = p as f64 - q as f64;
                        fq + weight * d * d
                    })
                    .fold(INF, f64::min)
            })
            .collect()
    }

    fn transform(f: &[f64], weight: f64) -> Vec<f64> {
        let mut buffers = LineBuffers::new(f.len());
        buffers.input.copy_from_slice(f);
        buffers.run(weight);
        buffers.output
    }

    #[test]
    fn test_single_source() {
        let out = transform(&[INF, INF, 0.0, INF, INF], 1.0);
        assert_eq!(out, vec![4.0, 1.0, 0.0, 1.0, 4.0]);
    }

    #[test]
    fn test_two_sources_weighted() {
        let out = transform(&[0.0, INF, INF, INF, 0.0], 0.01);
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.01, epsilon = 1e-15);
        assert_relative_eq!(out[2], 0.04, epsilon = 1e-15);
        assert_relative_eq!(out[3], 0.01, epsilon = 1e-15);
        assert_relative_eq!(out[4], 0.0);
    }

    #[test]
    fn test_no_source_stays_infinite() {
        let out = transform(&[INF, INF, INF], 1.0);
        assert!(out.iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn test_matches_brute_force_with_offsets() {
        let f = [3.0, INF, 0.5, 7.0, INF, INF, 0.0, 2.0, INF, 9.0, 0.25];
        for weight in [1.0, 0.01, 1.44, 25.0] {
            let fast = transform(&f, weight);
            let slow = brute_force(&f, weight);
            for (a, b) in fast.iter().zip(&slow) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_equal_sources() {
        let out = transform(&[0.0, 0.0, 0.0], 4.0);
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }
}
