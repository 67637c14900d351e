//! Bounded binary search over JPEG quality for a byte budget.

use postergrid_common::Result;

pub const MIN_QUALITY: u8 = 50;
pub const MAX_QUALITY: u8 = 95;
/// The search stops once the open interval is this narrow.
pub const QUALITY_TOLERANCE: u8 = 5;

/// One trial encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub quality: u8,
    pub bytes: usize,
}

/// Outcome of a quality search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualitySearch {
    /// Highest probed quality that fit the budget, or [`MAX_QUALITY`] if
    /// none did.
    pub selected: u8,
    pub probes: Vec<Probe>,
}

impl QualitySearch {
    /// Whether any probe fit the budget.
    pub fn found_fit(&self, target_bytes: usize) -> bool {
        self.probes.iter().any(|p| p.bytes <= target_bytes)
    }
}

/// Search `[MIN_QUALITY, MAX_QUALITY]` for the highest quality whose encoded
/// size is at most `target_bytes`. `probe` encodes at a quality and returns
/// the size in bytes.
pub fn search_quality<F>(target_bytes: usize, mut probe: F) -> Result<QualitySearch>
where
    F: FnMut(u8) -> Result<usize>,
{
    let mut min_quality = MIN_QUALITY;
    let mut max_quality = MAX_QUALITY;
    let mut selected = MAX_QUALITY;
    let mut probes = Vec::new();

    while max_quality - min_quality > QUALITY_TOLERANCE {
        let quality = (min_quality + max_quality) / 2;
        let bytes = probe(quality)?;
        probes.push(Probe { quality, bytes });

        if bytes > target_bytes {
            max_quality = quality;
        } else {
            min_quality = quality;
            selected = quality;
        }
    }

    Ok(QualitySearch { selected, probes })
}
