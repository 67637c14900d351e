//! Grid compositor: tiles cached posters onto an oversized canvas, tilts it
//! and crops the center to the device's output size.
//!
//! - [`layout`] -- tile size, gap and canvas geometry per profile.
//! - [`rotate`] -- the tilt-and-crop resampler.

pub mod layout;
pub mod rotate;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use postergrid_common::{Error, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::devices::DeviceProfile;
use crate::report::{SkipReason, Stage};

pub use layout::GridLayout;
pub use rotate::{CropWindow, Rotation};

/// Fixed tilt applied to the tiled canvas, in degrees (negative is clockwise).
pub const TILT_DEGREES: f64 = -15.0;

/// A finished composite and what went into it.
#[derive(Debug)]
pub struct Composite {
    pub image: RgbImage,
    pub layout: GridLayout,
    /// Posters that could not be resized; their cells stay black.
    pub blank_tiles: Vec<SkipReason>,
}

/// Compose the tilted poster grid for `profile`.
///
/// Returns `Ok(None)` when there are no posters to tile.
pub fn compose_grid(profile: &DeviceProfile, posters: &[DynamicImage]) -> Result<Option<Composite>> {
    if posters.is_empty() {
        warn!(device = %profile.name, "No cached posters available");
        return Ok(None);
    }

    let layout = GridLayout::plan(profile);
    debug!(
        device = %profile.name,
        width = layout.width,
        height = layout.height,
        tile_width = layout.tile_width,
        tile_height = layout.tile_height,
        canvas = layout.canvas_side,
        cells = layout.cell_count(),
        "Planned grid"
    );

    // Each distinct poster is resized once; cells reuse the result.
    let fitted: Vec<Result<RgbImage>> = posters
        .par_iter()
        .map(|poster| fit_tile(poster, layout.tile_width, layout.tile_height))
        .collect();

    let mut blank_tiles = Vec::new();
    let mut tiles: Vec<Option<RgbImage>> = Vec::with_capacity(fitted.len());
    for (index, result) in fitted.into_iter().enumerate() {
        match result {
            Ok(tile) => tiles.push(Some(tile)),
            Err(e) => {
                warn!(device = %profile.name, poster = index, error = %e, "Error resizing poster");
                blank_tiles.push(SkipReason::new(
                    Stage::TileResize,
                    format!("{} poster {index}", profile.name),
                    e,
                ));
                tiles.push(None);
            }
        }
    }

    let canvas = tile_canvas(&layout, &tiles);

    let window = Rotation::degrees(TILT_DEGREES).crop_window(
        layout.canvas_side,
        layout.canvas_side,
        layout.width,
        layout.height,
    );
    let image = window.resample(&canvas)?;

    Ok(Some(Composite {
        image,
        layout,
        blank_tiles,
    }))
}

/// Fill a black `canvas_side` square with tiles in row-major order, cycling
/// through `tiles`. `None` entries leave their cell blank.
pub fn tile_canvas(layout: &GridLayout, tiles: &[Option<RgbImage>]) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(layout.canvas_side, layout.canvas_side, Rgb([0, 0, 0]));
    if tiles.is_empty() {
        return canvas;
    }

    let mut index = 0usize;
    for row in 0..layout.rows {
        for col in 0..layout.cols {
            if let Some(tile) = &tiles[index % tiles.len()] {
                let (x, y) = layout.cell_origin(row, col);
                imageops::replace(&mut canvas, tile, i64::from(x), i64::from(y));
            }
            index += 1;
        }
    }
    canvas
}

/// Resize one poster to the tile size with Lanczos resampling.
pub fn fit_tile(poster: &DynamicImage, width: u32, height: u32) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_input(format!("tile size {width}x{height}")));
    }
    if poster.width() == 0 || poster.height() == 0 {
        return Err(Error::invalid_input("poster has no pixels"));
    }
    Ok(imageops::resize(
        &poster.to_rgb8(),
        width,
        height,
        FilterType::Lanczos3,
    ))
}
