//! Grid geometry for a device profile.
//!
//! Everything here is closed-form: tile size from resolution tiers, an
//! oversized square canvas large enough to survive the tilt, and the number
//! of rows and columns needed to fill it.

use crate::devices::DeviceProfile;

const BASE_POSTER_WIDTH: f64 = 200.0;
const BASE_POSTER_HEIGHT: f64 = 300.0;
const BASE_GAP: f64 = 5.0;
const MOBILE_GAP: f64 = 8.0;
const MOBILE_BOOST: f64 = 1.3;

/// The oversized canvas side is the target diagonal times this factor.
pub const COVERAGE_FACTOR: f64 = 1.2;

/// Pre-computed layout of the tiled canvas for one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Final (scaled) output width.
    pub width: u32,
    /// Final (scaled) output height.
    pub height: u32,
    pub poster_scale: f64,
    pub tile_width: u32,
    pub tile_height: u32,
    pub gap: u32,
    /// Side of the square canvas that gets tiled, then rotated.
    pub canvas_side: u32,
    pub cols: u32,
    pub rows: u32,
}

impl GridLayout {
    pub fn plan(profile: &DeviceProfile) -> Self {
        let scale = profile.scale_factor;
        let (width, height) = profile.scaled_size();

        let mut poster_scale = poster_scale(width, height);
        let mut gap = (BASE_GAP * scale) as u32;
        if profile.is_mobile() {
            poster_scale *= MOBILE_BOOST;
            gap = (MOBILE_GAP * scale) as u32;
        }

        let tile_width = (BASE_POSTER_WIDTH * poster_scale * scale) as u32;
        let tile_height = (BASE_POSTER_HEIGHT * poster_scale * scale) as u32;

        let canvas_side = (diagonal(width, height) * COVERAGE_FACTOR) as u32;

        // Zero-sized tiles would divide by zero; the compositor reports them.
        let cols = canvas_side / (tile_width + gap).max(1) + 2;
        let rows = canvas_side / (tile_height + gap).max(1) + 2;

        Self {
            width,
            height,
            poster_scale,
            tile_width,
            tile_height,
            gap,
            canvas_side,
            cols,
            rows,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Top-left corner of the cell at `row`, `col`.
    pub fn cell_origin(&self, row: u32, col: u32) -> (u32, u32) {
        (
            col * (self.tile_width + self.gap),
            row * (self.tile_height + self.gap),
        )
    }

    /// Whether the tile grid reaches past the canvas in both axes.
    pub fn tiles_cover_canvas(&self) -> bool {
        self.cols * (self.tile_width + self.gap) >= self.canvas_side
            && self.rows * (self.tile_height + self.gap) >= self.canvas_side
    }
}

/// Poster-size multiplier from the scaled output size.
///
/// Four width tiers for desktops and tablets, then two height tiers for
/// portrait phones (aspect < 0.6); everything else gets the tablet size.
pub fn poster_scale(width: u32, height: u32) -> f64 {
    let aspect_ratio = f64::from(width) / f64::from(height.max(1));

    if width > 3000 {
        1.2
    } else if width > 2000 {
        1.0
    } else if width > 1500 {
        0.8
    } else if aspect_ratio < 0.6 {
        if height > 2500 {
            1.0
        } else {
            0.9
        }
    } else {
        0.7
    }
}

pub fn diagonal(width: u32, height: u32) -> f64 {
    f64::from(width).hypot(f64::from(height))
}
