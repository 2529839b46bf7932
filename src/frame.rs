//! Decoded frames and the physical units they are expressed in.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, ensure, Result};
use ndarray::Array2;
use serde_derive::*;

/// Physical unit a frame is decoded in.
///
/// The unit drives both the decode request sent to a
/// [`Document`](crate::source::Document) and the precision
/// used when values are presented: counts are always shown
/// as integers, the other units with a fixed number of
/// decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayUnit {
    #[serde(alias = "counts", alias = "raw")]
    Counts,
    #[serde(alias = "temperature", alias = "temp", alias = "celsius")]
    Temperature,
    #[serde(alias = "radiance")]
    Radiance,
}

impl DisplayUnit {
    pub const ALL: [DisplayUnit; 3] = [
        DisplayUnit::Counts,
        DisplayUnit::Temperature,
        DisplayUnit::Radiance,
    ];

    /// Short label shown next to a value.
    pub fn label(self) -> &'static str {
        match self {
            DisplayUnit::Counts => "Counts",
            DisplayUnit::Temperature => "°C",
            DisplayUnit::Radiance => "Radiance",
        }
    }

    /// Number of decimals to present a value with, given
    /// the precision a consumer asked for. Counts are
    /// integral; everything else gets 1 to 4 decimals.
    pub fn decimals(self, requested: usize) -> usize {
        match self {
            DisplayUnit::Counts => 0,
            _ => requested.max(1).min(4),
        }
    }

    /// Format `value` for display. Counts are rounded to the
    /// nearest integer, not truncated.
    pub fn format(self, value: f64, requested_decimals: usize) -> String {
        format!("{:.*}", self.decimals(requested_decimals), value)
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayUnit::Counts => "counts",
            DisplayUnit::Temperature => "temperature",
            DisplayUnit::Radiance => "radiance",
        };
        f.write_str(name)
    }
}

impl FromStr for DisplayUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "counts" | "raw" => Ok(DisplayUnit::Counts),
            "temperature" | "temp" | "celsius" => Ok(DisplayUnit::Temperature),
            "radiance" => Ok(DisplayUnit::Radiance),
            _ => Err(anyhow!("unknown unit `{}`: expected counts, temperature or radiance", s)),
        }
    }
}

/// A 2-D grid of samples in a single physical unit.
///
/// Rows index the vertical axis, so a frame of width `w`
/// and height `h` holds an array of shape `(h, w)`. Frames
/// are replaced wholesale on each decode and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    data: Array2<f64>,
    unit: DisplayUnit,
}

impl RawFrame {
    /// Wrap decoded samples. Fails if any sample is NaN or
    /// infinite.
    pub fn new(data: Array2<f64>, unit: DisplayUnit) -> Result<Self> {
        if let Some(((row, col), val)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(anyhow!(
                "non-finite {} sample {} at x = {}, y = {}",
                unit,
                val,
                col,
                row
            ));
        }
        Ok(RawFrame { data, unit })
    }

    pub fn from_rows(rows: &[&[f64]], unit: DisplayUnit) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        ensure!(
            rows.iter().all(|r| r.len() == width),
            "ragged rows: every row must hold {} samples",
            width
        );
        let flat = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(Array2::from_shape_vec((height, width), flat)?, unit)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Sample at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.data.get((y, x)).copied()
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats::of(&self.data)
    }
}

/// Extremes of a frame, used for scaling and legend labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameStats {
    pub min: f64,
    pub max: f64,
}

impl FrameStats {
    pub fn of(data: &Array2<f64>) -> Self {
        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            // empty frame
            return FrameStats { min: 0., max: 0. };
        }
        FrameStats { min, max }
    }

    pub fn is_flat(&self) -> bool {
        self.max == self.min
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}
