//! Size-targeting encoder.
//!
//! Every composite becomes three files:
//!
//! - a lossless PNG archival copy, written as-is;
//! - a JPEG whose quality is binary-searched to fit a byte budget picked
//!   from the output's pixel count, written with optimized Huffman tables;
//! - a lossy WebP encoded from the decoded JPEG rather than the canvas, so
//!   its size tracks the budgeted JPEG without a second search.

pub mod search;
pub mod staging;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageFormat, RgbImage};
use jpeg_encoder::{ColorType, SamplingFactor};
use postergrid_common::{ArtifactFormat, Error, Result};
use tracing::{debug, info};

pub use search::{search_quality, Probe, QualitySearch};
pub use staging::Staging;

/// WebP effort level (libwebp `method`), 6 being the slowest and smallest.
pub const WEBP_METHOD: i32 = 6;

/// Byte budget, in KB, for a JPEG covering `pixels` pixels.
pub fn target_kb(pixels: u64) -> u32 {
    match pixels {
        p if p > 8_000_000 => 2000,
        p if p > 4_000_000 => 1400,
        p if p > 2_000_000 => 1000,
        p if p > 1_000_000 => 800,
        _ => 500,
    }
}

/// WebP quality for a given JPEG budget.
pub fn webp_quality(target_kb: u32) -> u8 {
    if target_kb > 1000 {
        90
    } else {
        85
    }
}

/// One written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Sizes and qualities chosen for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeStats {
    pub width: u32,
    pub height: u32,
    pub target_kb: u32,
    pub jpeg_quality: u8,
    pub webp_quality: u8,
    pub probes: Vec<Probe>,
}

/// The three encoded files of one device, still in their staging area.
#[derive(Debug)]
pub struct ArtifactSet {
    pub device: String,
    pub stem: String,
    pub files: BTreeMap<ArtifactFormat, ArtifactFile>,
    pub stats: EncodeStats,
    /// Keeps a temporary staging directory alive until publishing is done.
    pub staging: Staging,
}

impl ArtifactSet {
    pub fn path(&self, format: ArtifactFormat) -> Option<&PathBuf> {
        self.files.get(&format).map(|f| &f.path)
    }
}

/// Encode `canvas` into the three artifact formats under `staging`.
pub fn encode_artifacts(
    canvas: &RgbImage,
    device: &str,
    stem: &str,
    staging: Staging,
) -> Result<ArtifactSet> {
    staging.prepare()?;
    let (width, height) = canvas.dimensions();
    let target_kb = target_kb(u64::from(width) * u64::from(height));
    let target_bytes = target_kb as usize * 1024;

    let mut files = BTreeMap::new();

    let png = encode_png(canvas)?;
    files.insert(
        ArtifactFormat::Original,
        write_artifact(&staging, stem, ArtifactFormat::Original, &png)?,
    );

    let search = search_quality(target_bytes, |quality| {
        let bytes = encode_jpeg(canvas, quality, false)?.len();
        debug!(device, quality, bytes, "JPEG probe");
        Ok(bytes)
    })?;
    let jpeg = encode_jpeg(canvas, search.selected, true)?;
    files.insert(
        ArtifactFormat::Jpeg,
        write_artifact(&staging, stem, ArtifactFormat::Jpeg, &jpeg)?,
    );

    let webp_quality = webp_quality(target_kb);
    let from_jpeg = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)?.to_rgb8();
    let webp = encode_webp(&from_jpeg, webp_quality)?;
    files.insert(
        ArtifactFormat::Webp,
        write_artifact(&staging, stem, ArtifactFormat::Webp, &webp)?,
    );

    info!(
        device,
        width,
        height,
        target_kb,
        png_mb = %format!("{:.1}", png.len() as f64 / (1024.0 * 1024.0)),
        jpeg_kb = jpeg.len() / 1024,
        jpeg_quality = search.selected,
        webp_kb = webp.len() / 1024,
        webp_quality,
        "Encoded artifacts"
    );

    Ok(ArtifactSet {
        device: device.to_string(),
        stem: stem.to_string(),
        files,
        stats: EncodeStats {
            width,
            height,
            target_kb,
            jpeg_quality: search.selected,
            webp_quality,
            probes: search.probes,
        },
        staging,
    })
}

fn write_artifact(
    staging: &Staging,
    stem: &str,
    format: ArtifactFormat,
    data: &[u8],
) -> Result<ArtifactFile> {
    let path = staging.path_for(stem, format);
    std::fs::write(&path, data)?;
    Ok(ArtifactFile {
        path,
        bytes: data.len() as u64,
    })
}

pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    canvas.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Baseline 4:2:0 JPEG at `quality`.
///
/// `optimize_huffman` builds Huffman tables from the image's own symbol
/// statistics instead of the standard ones, trading a second pass for a
/// smaller file at identical pixels.
pub fn encode_jpeg(canvas: &RgbImage, quality: u8, optimize_huffman: bool) -> Result<Vec<u8>> {
    let (width, height) = canvas.dimensions();
    let too_large = || Error::encode(format!("{width}x{height} exceeds the JPEG size limit"));
    let width = u16::try_from(width).map_err(|_| too_large())?;
    let height = u16::try_from(height).map_err(|_| too_large())?;

    let mut buf = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buf, quality);
    encoder.set_sampling_factor(SamplingFactor::F_2_2);
    encoder.set_optimized_huffman_tables(optimize_huffman);
    encoder
        .encode(canvas.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| Error::encode(format!("JPEG encoding failed: {e}")))?;
    Ok(buf)
}

/// Lossy WebP with libwebp at `quality` and [`WEBP_METHOD`].
pub fn encode_webp(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let encoder = webp::Encoder::from_rgb(image.as_raw(), image.width(), image.height());
    let mut config = webp::WebPConfig::new()
        .map_err(|_| Error::encode("failed to initialise libwebp config"))?;
    config.lossless = 0;
    config.quality = f32::from(quality);
    config.method = WEBP_METHOD;
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| Error::encode(format!("WebP encoding failed: {e:?}")))?;
    Ok(memory.to_vec())
}
