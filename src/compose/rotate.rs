//! Tilt-and-crop with bicubic resampling.
//!
//! Rotating the whole oversized canvas with expanded bounds and then taking
//! a center crop only ever keeps the crop window, so [`CropWindow`] maps each
//! output pixel straight back into the unrotated canvas and samples there.
//! Points that fall outside the canvas are black, which is what an expanded
//! rotation fills the new area with.

use image::RgbImage;
use postergrid_common::{Error, Result};
use rayon::prelude::*;

/// Bicubic kernel sharpness (Keys, a = -0.5).
const CUBIC_A: f64 = -0.5;

/// A rotation in image space. Positive angles turn counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    cos: f64,
    sin: f64,
}

impl Rotation {
    pub fn degrees(angle: f64) -> Self {
        let radians = angle.to_radians();
        Self {
            cos: radians.cos(),
            sin: radians.sin(),
        }
    }

    /// Size of the bounding box of a `width` x `height` image after rotation.
    pub fn expanded_bounds(&self, width: u32, height: u32) -> (u32, u32) {
        let (w, h) = (f64::from(width), f64::from(height));
        let half_w = (w * self.cos.abs() + h * self.sin.abs()) / 2.0;
        let half_h = (w * self.sin.abs() + h * self.cos.abs()) / 2.0;
        // Corners sit symmetrically around the center.
        (2 * half_w.ceil() as u32, 2 * half_h.ceil() as u32)
    }

    /// The centered `out_width` x `out_height` window of the rotated,
    /// expanded `src_width` x `src_height` image.
    pub fn crop_window(
        &self,
        src_width: u32,
        src_height: u32,
        out_width: u32,
        out_height: u32,
    ) -> CropWindow {
        let (rotated_width, rotated_height) = self.expanded_bounds(src_width, src_height);
        CropWindow {
            rotation: *self,
            src_width,
            src_height,
            rotated_width,
            rotated_height,
            offset_x: rotated_width.saturating_sub(out_width) / 2,
            offset_y: rotated_height.saturating_sub(out_height) / 2,
            width: out_width,
            height: out_height,
        }
    }
}

/// Output window of a rotate-expand-then-center-crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    rotation: Rotation,
    pub src_width: u32,
    pub src_height: u32,
    pub rotated_width: u32,
    pub rotated_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    /// Map a continuous output coordinate to a continuous source coordinate.
    pub fn source_point(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = f64::from(self.offset_x) + x - f64::from(self.rotated_width) / 2.0;
        let dy = f64::from(self.offset_y) + y - f64::from(self.rotated_height) / 2.0;
        let Rotation { cos, sin } = self.rotation;
        (
            dx * cos - dy * sin + f64::from(self.src_width) / 2.0,
            dx * sin + dy * cos + f64::from(self.src_height) / 2.0,
        )
    }

    /// Whether all four output corners land inside the source canvas, i.e.
    /// the crop has no black fill in its corners.
    pub fn corners_covered(&self) -> bool {
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
            .into_iter()
            .map(|(x, y)| self.source_point(x, y))
            .all(|(sx, sy)| {
                sx >= 0.0
                    && sy >= 0.0
                    && sx <= f64::from(self.src_width)
                    && sy <= f64::from(self.src_height)
            })
    }

    /// Resample the window out of `src`, one row per rayon task.
    pub fn resample(&self, src: &RgbImage) -> Result<RgbImage> {
        if src.width() != self.src_width || src.height() != self.src_height {
            return Err(Error::invalid_input(format!(
                "source is {}x{}, window expects {}x{}",
                src.width(),
                src.height(),
                self.src_width,
                self.src_height
            )));
        }

        let row_len = self.width as usize * 3;
        let mut buf = vec![0u8; row_len * self.height as usize];
        if row_len > 0 {
            buf.par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| self.fill_row(src, y as u32, row));
        }

        RgbImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| Error::internal("rotated buffer size mismatch"))
    }

    fn fill_row(&self, src: &RgbImage, y: u32, row: &mut [u8]) {
        let (src_w, src_h) = (f64::from(self.src_width), f64::from(self.src_height));
        for (x, px) in row.chunks_exact_mut(3).enumerate() {
            // Sample at pixel centers.
            let (sx, sy) = self.source_point(x as f64 + 0.5, f64::from(y) + 0.5);
            if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
                continue;
            }
            px.copy_from_slice(&bicubic(src, sx - 0.5, sy - 0.5));
        }
    }
}

/// Keys cubic convolution weight for distance `t`.
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((CUBIC_A + 2.0) * t - (CUBIC_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((CUBIC_A * t - 5.0 * CUBIC_A) * t + 8.0 * CUBIC_A) * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Sample `src` at pixel-index coordinate (`u`, `v`) with a 4x4 bicubic
/// kernel, clamping taps to the image edge.
fn bicubic(src: &RgbImage, u: f64, v: f64) -> [u8; 3] {
    let raw = src.as_raw();
    let (w, h) = (src.width() as i64, src.height() as i64);
    let (x0, y0) = (u.floor(), v.floor());
    let (fx, fy) = (u - x0, v - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let wx = [
        cubic_weight(1.0 + fx),
        cubic_weight(fx),
        cubic_weight(1.0 - fx),
        cubic_weight(2.0 - fx),
    ];
    let wy = [
        cubic_weight(1.0 + fy),
        cubic_weight(fy),
        cubic_weight(1.0 - fy),
        cubic_weight(2.0 - fy),
    ];

    let mut acc = [0.0f64; 3];
    for (j, wyj) in wy.iter().enumerate() {
        let sy = (y0 - 1 + j as i64).clamp(0, h - 1) as usize;
        for (i, wxi) in wx.iter().enumerate() {
            let sx = (x0 - 1 + i as i64).clamp(0, w - 1) as usize;
            let idx = (sy * w as usize + sx) * 3;
            let weight = wxi * wyj;
            acc[0] += f64::from(raw[idx]) * weight;
            acc[1] += f64::from(raw[idx + 1]) * weight;
            acc[2] += f64::from(raw[idx + 2]) * weight;
        }
    }

    acc.map(|c| c.round().clamp(0.0, 255.0) as u8)
}
