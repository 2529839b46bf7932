//! Viewer configuration, loadable from JSON.

use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde_derive::*;

use crate::{frame::DisplayUnit, palette::Palette};

/// Presentation settings of a [`Session`](crate::Session).
///
/// Every field has a default, so a config file need only
/// list what it changes:
///
/// ```json
/// { "palette": "Ironbow", "unit": "temperature", "pixel_decimals": 3 }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Playback tick period in milliseconds.
    pub tick_interval_ms: u64,
    pub legend_height: u32,
    pub legend_width: u32,
    pub legend_decimals: usize,
    pub pixel_decimals: usize,
    pub metadata_decimals: usize,
    pub palette: Palette,
    pub unit: DisplayUnit,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            tick_interval_ms: 33,
            legend_height: 500,
            legend_width: 30,
            legend_decimals: 1,
            pixel_decimals: 2,
            metadata_decimals: 1,
            palette: Palette::Jet,
            unit: DisplayUnit::Counts,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
