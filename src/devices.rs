//! Device profiles: the named screens a wallpaper is rendered for.

use postergrid_common::DeviceCategory;
use serde::{Deserialize, Serialize};

/// A named output specification representing a target screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Display name; also the source of the output file stem.
    pub name: String,
    /// Logical width in pixels before scaling.
    pub width: u32,
    /// Logical height in pixels before scaling.
    pub height: u32,
    /// Multiplier applied to width, height, tile size and gap.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Screen class; mobile profiles get larger posters.
    #[serde(default = "default_category")]
    pub category: DeviceCategory,
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_category() -> DeviceCategory {
    DeviceCategory::Desktop
}

impl DeviceProfile {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        scale_factor: f64,
        category: DeviceCategory,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            scale_factor,
            category,
        }
    }

    /// Output size after applying the scale factor (truncating).
    pub fn scaled_size(&self) -> (u32, u32) {
        (
            (f64::from(self.width) * self.scale_factor) as u32,
            (f64::from(self.height) * self.scale_factor) as u32,
        )
    }

    /// File stem used for every artifact of this profile.
    pub fn file_stem(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }

    pub fn is_mobile(&self) -> bool {
        self.category == DeviceCategory::Mobile
    }
}

/// The fixed list of device profiles rendered when no override is configured.
pub fn default_profiles() -> Vec<DeviceProfile> {
    use DeviceCategory::{Desktop, Mobile, Tablet};

    vec![
        // Desktop displays
        DeviceProfile::new("Desktop_4K", 3840, 2160, 1.0, Desktop),
        DeviceProfile::new("Desktop_QHD", 2560, 1440, 1.5, Desktop),
        DeviceProfile::new("Desktop_FHD", 1920, 1080, 2.0, Desktop),
        DeviceProfile::new("Laptop", 1366, 768, 2.5, Desktop),
        // Tablet displays
        DeviceProfile::new("iPad_Pro_12.9", 2732, 2048, 1.0, Tablet),
        DeviceProfile::new("iPad_Air", 2360, 1640, 1.0, Tablet),
        DeviceProfile::new("iPad_Mini", 2266, 1488, 1.0, Tablet),
        // Phone displays
        DeviceProfile::new("iPhone_14_Pro_Max", 1290, 2796, 1.0, Mobile),
        DeviceProfile::new("iPhone_14", 1170, 2532, 1.0, Mobile),
        DeviceProfile::new("Android_Large", 1440, 3200, 1.0, Mobile),
        DeviceProfile::new("Android_Standard", 1080, 2400, 1.0, Mobile),
    ]
}

/// Keep only the profiles whose name matches one of `names` (case-insensitive).
///
/// An empty filter keeps every profile.
pub fn select_profiles(profiles: Vec<DeviceProfile>, names: &[String]) -> Vec<DeviceProfile> {
    if names.is_empty() {
        return profiles;
    }
    profiles
        .into_iter()
        .filter(|p| names.iter().any(|n| n.eq_ignore_ascii_case(&p.name)))
        .collect()
}
