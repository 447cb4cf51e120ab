//! Image-space to physical-space coordinate conversion.
//!
//! A fixed 4x4 affine matrix (configuration-supplied) maps image pixel
//! coordinates plus the slice position into physical anatomical
//! coordinates. The transform backs the measuring tool and position
//! readouts, so it must be bit-reproducible: same inputs, same outputs.

use crate::config::ViewerConfig;

/// Pure converter between image pixels and physical coordinates.
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    matrix: [[f64; 4]; 4],
    image_size: f64,
}

impl CoordinateTransformer {
    /// Build a transformer from the configuration.
    ///
    /// Returns `None` when the configuration carries no matrix; callers
    /// must treat that as "physical coordinates unavailable" rather than
    /// compute with a zero matrix.
    pub fn from_config(config: &ViewerConfig) -> Option<Self> {
        config.matrix.map(|matrix| Self {
            matrix,
            image_size: f64::from(config.image_size),
        })
    }

    /// Convert an image pixel position on a slice into physical space.
    ///
    /// The input vector is `[image_size - x, slice * axis_step,
    /// image_size - y, 1]`, left-multiplied by the stored matrix; the
    /// first three components of the result are returned.
    pub fn to_physical(&self, x: f64, y: f64, slice: usize, axis_step: f64) -> [f64; 3] {
        let v = [
            self.image_size - x,
            slice as f64 * axis_step,
            self.image_size - y,
            1.0,
        ];
        let mut out = [0.0; 3];
        for (row, slot) in self.matrix.iter().take(3).zip(out.iter_mut()) {
            *slot = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
        }
        out
    }

    /// The horizontal/vertical physical pair of an image point, used for
    /// on-screen scale-bar calibration.
    pub fn image_to_xy(&self, x: f64, y: f64, slice: usize, axis_step: f64) -> (f64, f64) {
        let p = self.to_physical(x, y, slice, axis_step);
        (p[0], p[2])
    }

    /// Physical length of the segment between two image points on the
    /// same slice; backs the on-screen ruler.
    pub fn scale_bar_length(&self, a: (f64, f64), b: (f64, f64), slice: usize, step: f64) -> f64 {
        let (ax, ay) = self.image_to_xy(a.0, a.1, slice, step);
        let (bx, by) = self.image_to_xy(b.0, b.1, slice, step);
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    }
}
