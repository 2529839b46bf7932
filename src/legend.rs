//! Color legend: a vertical gradient bar and its end labels.

use image::RgbImage;
use ndarray::Array2;
use serde_derive::*;
use tracing::debug;

use crate::{
    frame::{DisplayUnit, FrameStats},
    palette::{apply_palette, Palette},
};

/// Narrowest / widest gradient bar that is built.
const MIN_WIDTH: u32 = 1;
const MAX_WIDTH: u32 = 40;

/// Build a gradient column of `height` rows running from
/// palette index 255 at the top down to 0 at the bottom.
///
/// Indices are spaced linearly and truncated, so a height
/// of 1 yields a single row at index 255.
pub fn build_gradient(height: u32, width: u32, palette: Palette) -> RgbImage {
    let height = height.max(1);
    let width = width.max(MIN_WIDTH).min(MAX_WIDTH);
    let steps = (height - 1).max(1) as f64;
    let column: Vec<u8> = (0..height)
        .map(|row| (255. - 255. * row as f64 / steps) as u8)
        .collect();
    let indices = Array2::from_shape_fn((height as usize, width as usize), |(row, _)| {
        column[row]
    });
    apply_palette(&indices, palette)
}

/// Text shown at the ends of the legend bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendLabels {
    /// Label at the top of the bar (frame maximum).
    pub max_text: String,
    /// Label at the bottom of the bar (frame minimum).
    pub min_text: String,
}

pub fn build_labels(stats: FrameStats, unit: DisplayUnit, decimals: usize) -> LegendLabels {
    LegendLabels {
        max_text: unit.format(stats.max, decimals),
        min_text: unit.format(stats.min, decimals),
    }
}

/// Cached legend for the current palette and frame.
///
/// The gradient is keyed by palette and size and rebuilt
/// only when one of those changes; the labels follow the
/// most recently decoded frame.
#[derive(Debug, Clone)]
pub struct ColorLegend {
    palette: Palette,
    height: u32,
    width: u32,
    gradient: RgbImage,
    labels: Option<LegendLabels>,
}

impl ColorLegend {
    pub fn new(palette: Palette, height: u32, width: u32) -> Self {
        ColorLegend {
            palette,
            height,
            width,
            gradient: build_gradient(height, width, palette),
            labels: None,
        }
    }

    /// Rebuild the gradient if palette or size differ from
    /// the cached one. Returns whether a rebuild happened.
    pub fn refresh(&mut self, palette: Palette, height: u32, width: u32) -> bool {
        if (palette, height, width) == (self.palette, self.height, self.width) {
            return false;
        }
        debug!(%palette, height, width, "rebuilding legend gradient");
        *self = ColorLegend {
            palette,
            height,
            width,
            gradient: build_gradient(height, width, palette),
            labels: self.labels.take(),
        };
        true
    }

    pub fn relabel(&mut self, stats: FrameStats, unit: DisplayUnit, decimals: usize) {
        self.labels = Some(build_labels(stats, unit, decimals));
    }

    pub fn clear_labels(&mut self) {
        self.labels = None;
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn gradient(&self) -> &RgbImage {
        &self.gradient
    }

    pub fn labels(&self) -> Option<&LegendLabels> {
        self.labels.as_ref()
    }
}
