//! Run report: what was produced and what was skipped, and why.
//!
//! Nothing short of a missing API key aborts a run. Every other failure is
//! recorded here as a [`SkipReason`] tagged with the [`Stage`] it happened
//! in, next to the outcomes that did succeed.

use std::collections::BTreeMap;
use std::fmt;

use postergrid_common::ArtifactFormat;
use serde::Serialize;

/// Pipeline stage a skip happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ListingPage,
    MissingPoster,
    PosterDownload,
    PosterDecode,
    TileResize,
    Render,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ListingPage => "listing page",
            Self::MissingPoster => "missing poster",
            Self::PosterDownload => "poster download",
            Self::PosterDecode => "poster decode",
            Self::TileResize => "tile resize",
            Self::Render => "render",
            Self::Upload => "upload",
        };
        f.write_str(s)
    }
}

/// Why a page, poster, tile, device or artifact was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipReason {
    pub stage: Stage,
    /// What was skipped: a page label, a title, a device name, a storage key.
    pub subject: String,
    pub message: String,
}

impl SkipReason {
    pub fn new(stage: Stage, subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            stage,
            subject: subject.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped ({}): {}", self.subject, self.stage, self.message)
    }
}

/// Success-or-skip result for one unit of work.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum Outcome<T> {
    Success(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Skipped(_) => None,
        }
    }
}

/// Summary of the catalog fetch and poster download stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    pub requested: usize,
    pub movies: usize,
    pub series: usize,
    pub posters_cached: usize,
    pub skips: Vec<SkipReason>,
}

/// Storage references for one device's artifacts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishedArtifacts {
    pub device: String,
    /// Local path or URL per format. Failed uploads are absent.
    pub references: BTreeMap<ArtifactFormat, String>,
    /// Target budget and chosen qualities, for display.
    pub target_kb: u32,
    pub jpeg_quality: u8,
    pub webp_quality: u8,
    pub skips: Vec<SkipReason>,
}

impl PublishedArtifacts {
    /// The archival reference when present, otherwise any reference.
    pub fn primary_reference(&self) -> Option<&str> {
        self.references
            .get(&ArtifactFormat::Original)
            .or_else(|| self.references.values().next())
            .map(String::as_str)
    }
}

/// Result of one device render.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Tiles left blank because their poster could not be resized.
    pub blank_tiles: Vec<SkipReason>,
    pub outcome: Outcome<PublishedArtifacts>,
}

/// Aggregated result of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub fetch: FetchReport,
    pub devices: Vec<DeviceReport>,
    /// Whether artifacts went to object storage rather than local folders.
    pub remote_storage: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.devices.iter().filter(|d| d.outcome.is_success()).count()
    }

    /// Every skip recorded anywhere in the run.
    pub fn all_skips(&self) -> Vec<&SkipReason> {
        let mut skips: Vec<&SkipReason> = self.fetch.skips.iter().collect();
        for device in &self.devices {
            skips.extend(device.blank_tiles.iter());
            match &device.outcome {
                Outcome::Success(published) => skips.extend(published.skips.iter()),
                Outcome::Skipped(reason) => skips.push(reason),
            }
        }
        skips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(device: &str) -> PublishedArtifacts {
        let mut references = BTreeMap::new();
        references.insert(ArtifactFormat::Jpeg, format!("/tmp/{device}.jpg"));
        PublishedArtifacts {
            device: device.into(),
            references,
            ..Default::default()
        }
    }

    #[test]
    fn primary_reference_falls_back() {
        let mut p = published("laptop");
        assert_eq!(p.primary_reference(), Some("/tmp/laptop.jpg"));
        p.references
            .insert(ArtifactFormat::Original, "/tmp/laptop.png".into());
        assert_eq!(p.primary_reference(), Some("/tmp/laptop.png"));
        assert_eq!(PublishedArtifacts::default().primary_reference(), None);
    }

    #[test]
    fn run_report_counts_and_collects_skips() {
        let report = RunReport {
            fetch: FetchReport {
                skips: vec![SkipReason::new(Stage::ListingPage, "movie page 2", "timeout")],
                ..Default::default()
            },
            devices: vec![
                DeviceReport {
                    device: "A".into(),
                    width: 1,
                    height: 1,
                    blank_tiles: vec![],
                    outcome: Outcome::Success(published("a")),
                },
                DeviceReport {
                    device: "B".into(),
                    width: 1,
                    height: 1,
                    blank_tiles: vec![],
                    outcome: Outcome::Skipped(SkipReason::new(Stage::Render, "B", "boom")),
                },
            ],
            remote_storage: false,
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.all_skips().len(), 2);
    }

    #[test]
    fn skip_reason_display() {
        let skip = SkipReason::new(Stage::Upload, "jpeg/test.jpg", "403 Forbidden");
        assert_eq!(skip.to_string(), "jpeg/test.jpg skipped (upload): 403 Forbidden");
    }

    #[test]
    fn outcome_serializes_tagged() {
        let o: Outcome<u8> = Outcome::Skipped(SkipReason::new(Stage::Render, "X", "bad"));
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["detail"]["stage"], "render");
    }
}
