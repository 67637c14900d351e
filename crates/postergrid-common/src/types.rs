//! Core type definitions shared by the fetcher, compositor and publisher.
//!
//! All enums serialize in lowercase so they read naturally in TOML config
//! files and in the JSON run report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of catalog listing an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// A feature film from the popular-movies listing.
    Movie,
    /// A series from the popular-tv listing.
    Tv,
}

impl CatalogKind {
    /// API path of the popular listing for this kind.
    pub fn popular_path(&self) -> &'static str {
        match self {
            Self::Movie => "/movie/popular",
            Self::Tv => "/tv/popular",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Tv => write!(f, "tv"),
        }
    }
}

/// Broad class of screen a device profile targets.
///
/// Only [`DeviceCategory::Mobile`] changes the grid layout: it gets larger
/// posters and a wider gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    /// Desktop monitors and laptops.
    Desktop,
    /// Tablets.
    Tablet,
    /// Phones.
    Mobile,
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desktop => write!(f, "desktop"),
            Self::Tablet => write!(f, "tablet"),
            Self::Mobile => write!(f, "mobile"),
        }
    }
}

/// One of the three encoded outputs produced per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Lossless PNG archival copy.
    Original,
    /// Size-budgeted JPEG.
    Jpeg,
    /// WebP derived from the JPEG.
    Webp,
}

impl ArtifactFormat {
    /// All formats in publishing order.
    pub const ALL: [ArtifactFormat; 3] = [Self::Original, Self::Jpeg, Self::Webp];

    /// Folder / key prefix used for this format.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Original => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// MIME type sent as `Content-Type` on upload.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Original => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
