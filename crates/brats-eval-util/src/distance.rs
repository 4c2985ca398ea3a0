//! Distance transform operations for voxel grids.
//!
//! Exact Euclidean distance transform (Felzenszwalb–Huttenlocher lower
//! envelope of parabolas) applied separably along each axis, with anisotropic
//! voxel spacing. Equivalent to `scipy.ndimage.distance_transform_edt` on the
//! inverted mask with `sampling = spacing`.

use crate::{mask::VoxelGrid, volume::VoxelSpacing};

/// Euclidean distance from every voxel to the nearest foreground voxel.
///
/// # Arguments
/// * `features` - Grid whose foreground voxels are the distance sources
/// * `spacing` - Physical voxel size along each axis
///
/// # Returns
/// Row-major distances, same layout as `features`. Every entry is
/// `f64::INFINITY` when `features` has no foreground voxel.
pub fn euclidean_distance_transform(features: &VoxelGrid, spacing: VoxelSpacing) -> Vec<f64> {
    let dims = features.dims();
    let mut squared: Vec<f64> = features
        .voxels()
        .iter()
        .map(|&foreground| if foreground { 0.0 } else { f64::INFINITY })
        .collect();

    let strides = [dims[1] * dims[2], dims[2], 1];
    let mut envelope = LowerEnvelope::default();

    for axis in 0..3 {
        let len = dims[axis];
        let stride = strides[axis];
        if len == 0 {
            continue;
        }
        let step = spacing.axis(axis);
        let mut line = vec![0.0; len];
        let mut out = vec![0.0; len];

        // Every voxel whose coordinate along `axis` is zero starts one line.
        for start in (0..squared.len()).filter(|index| (index / stride) % len == 0) {
            for (i, value) in line.iter_mut().enumerate() {
                *value = squared[start + i * stride];
            }
            envelope.transform(&line, step, &mut out);
            for (i, value) in out.iter().enumerate() {
                squared[start + i * stride] = *value;
            }
        }
    }

    squared.into_iter().map(f64::sqrt).collect()
}

/// Scratch buffers for the 1D squared distance transform.
#[derive(Debug, Default)]
struct LowerEnvelope {
    /// Sample positions of the parabolas forming the envelope.
    vertices: Vec<usize>,
    /// Left boundary of the region where each parabola is minimal.
    boundaries: Vec<f64>,
}

impl LowerEnvelope {
    /// 1D squared distance transform of `f` with sample spacing `step`.
    ///
    /// Infinite samples never contribute a parabola.
    fn transform(&mut self, f: &[f64], step: f64, out: &mut [f64]) {
        self.vertices.clear();
        self.boundaries.clear();

        let position = |index: usize| index as f64 * step;
        let intersection = |p: usize, q: usize| {
            let (xp, xq) = (position(p), position(q));
            ((f[q] + xq * xq) - (f[p] + xp * xp)) / (2.0 * (xq - xp))
        };

        for q in (0..f.len()).filter(|&q| f[q].is_finite()) {
            let mut boundary = f64::NEG_INFINITY;
            while let Some(&p) = self.vertices.last() {
                let s = intersection(p, q);
                if s <= self.boundaries[self.boundaries.len() - 1] {
                    self.vertices.pop();
                    self.boundaries.pop();
                    boundary = f64::NEG_INFINITY;
                } else {
                    boundary = s;
                    break;
                }
            }
            self.vertices.push(q);
            self.boundaries.push(boundary);
        }

        if self.vertices.is_empty() {
            out.fill(f64::INFINITY);
            return;
        }

        let mut k = 0;
        for (i, value) in out.iter_mut().enumerate() {
            let x = position(i);
            while k + 1 < self.vertices.len() && self.boundaries[k + 1] < x {
                k += 1;
            }
            let p = self.vertices[k];
            let offset = x - position(p);
            *value = offset.mul_add(offset, f[p]);
        }
    }
}
