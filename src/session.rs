//! The viewer session: one owner for the open document,
//! playback state, selections and render caches.
//!
//! Hosts drive a [`Session`] with command methods mirroring
//! the user's actions and draw whatever
//! [`view`](Session::view) holds afterwards. Every command
//! is a no-op while nothing is open.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use image::RgbImage;
use serde_derive::*;
use tracing::{debug, info, warn};

use crate::{
    config::ViewerConfig,
    error::{ViewerError, ViewerResult},
    export::export_csv,
    frame::{DisplayUnit, FrameStats, RawFrame},
    inspect::{centering_offset, inspect, PixelReading},
    legend::{ColorLegend, LegendLabels},
    metadata::Metadata,
    normalize::{normalize_with_stats, IndexFrame},
    palette::{apply_palette, Palette},
    playback::{PlaybackController, PlaybackState, Transition},
    source::{Document, FrameSource},
};

/// What the host should currently display.
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub index: usize,
    pub image: RgbImage,
    pub stats: FrameStats,
    pub labels: LegendLabels,
}

/// One line summary of a rendered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub index: usize,
    pub min: f64,
    pub max: f64,
    pub max_text: String,
    pub min_text: String,
}

impl RenderedView {
    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            index: self.index,
            min: self.stats.min,
            max: self.stats.max,
            max_text: self.labels.max_text.clone(),
            min_text: self.labels.min_text.clone(),
        }
    }
}

/// Last decoded frame with its normalization.
struct Decoded {
    index: usize,
    raw: RawFrame,
    stats: FrameStats,
    indices: IndexFrame,
}

pub struct Session {
    config: ViewerConfig,
    document: Option<Box<dyn Document>>,
    playback: PlaybackController,
    unit: DisplayUnit,
    palette: Palette,
    legend: ColorLegend,
    decoded: Option<Decoded>,
    view: Option<RenderedView>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(ViewerConfig::default())
    }
}

impl Session {
    pub fn new(config: ViewerConfig) -> Self {
        let legend = ColorLegend::new(config.palette, config.legend_height, config.legend_width);
        Session {
            unit: config.unit,
            palette: config.palette,
            config,
            document: None,
            playback: PlaybackController::new(),
            legend,
            decoded: None,
            view: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn legend(&self) -> &ColorLegend {
        &self.legend
    }

    pub fn view(&self) -> Option<&RenderedView> {
        self.view.as_ref()
    }

    /// The most recently decoded frame.
    pub fn raw_frame(&self) -> Option<&RawFrame> {
        self.decoded.as_ref().map(|d| &d.raw)
    }

    pub fn frame_count(&self) -> usize {
        self.playback.frame_count()
    }

    /// Open `path` with `source` and render its first frame.
    /// On failure the current document, if any, stays.
    pub fn open(&mut self, source: &dyn FrameSource, path: &Path) -> ViewerResult<Transition> {
        let open_error = |cause| ViewerError::DocumentOpen {
            path: path.to_path_buf(),
            cause,
        };
        let doc = source.open(path).map_err(open_error)?;
        let (doc, decoded) = match self.prepare(doc).map_err(open_error) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(path = %path.display(), "{}", e);
                return Err(e);
            }
        };
        Ok(self.install(doc, decoded))
    }

    /// Take over an already opened document.
    pub fn open_document(&mut self, doc: Box<dyn Document>) -> ViewerResult<Transition> {
        let (doc, decoded) = match self.prepare(doc) {
            Ok(ok) => ok,
            Err(cause) => {
                let e = ViewerError::DocumentOpen {
                    path: PathBuf::from("<document>"),
                    cause,
                };
                warn!("{}", e);
                return Err(e);
            }
        };
        Ok(self.install(doc, decoded))
    }

    /// Select the unit and decode frame 0 of a new document
    /// without touching the session.
    fn prepare(&self, mut doc: Box<dyn Document>) -> anyhow::Result<(Box<dyn Document>, Decoded)> {
        ensure!(doc.frame_count() > 0, "document has no frames");
        let unit = if doc.supports(self.unit) {
            self.unit
        } else {
            warn!(unit = %self.unit, "unit not available for this document, using counts");
            DisplayUnit::Counts
        };
        doc.set_unit(unit)?;
        let raw = doc.decode(0).context("decoding frame 0")?;
        let decoded = decode_cache(0, raw);
        Ok((doc, decoded))
    }

    fn install(&mut self, doc: Box<dyn Document>, decoded: Decoded) -> Transition {
        let (width, height) = doc.frame_dims();
        info!(frames = doc.frame_count(), width, height, "session opened");
        self.unit = doc.unit();
        let transition = self.playback.open(doc.frame_count());
        self.document = Some(doc);
        self.decoded = Some(decoded);
        self.present();
        transition
    }

    pub fn close(&mut self) -> Transition {
        self.document = None;
        self.decoded = None;
        self.view = None;
        self.legend.clear_labels();
        self.playback.close()
    }

    pub fn toggle_play(&mut self) -> ViewerResult<Transition> {
        let t = self.playback.toggle_play();
        self.apply(t)
    }

    pub fn pause(&mut self) -> ViewerResult<Transition> {
        let t = self.playback.pause();
        self.apply(t)
    }

    pub fn stop(&mut self) -> ViewerResult<Transition> {
        let t = self.playback.stop();
        self.apply(t)
    }

    pub fn step(&mut self, delta: isize) -> ViewerResult<Transition> {
        let t = self.playback.step(delta);
        self.apply(t)
    }

    pub fn seek(&mut self, value: f64) -> ViewerResult<Transition> {
        let t = self.playback.seek(value);
        self.apply(t)
    }

    pub fn tick(&mut self) -> ViewerResult<Transition> {
        let t = self.playback.tick();
        self.apply(t)
    }

    pub fn begin_seek_gesture(&mut self) -> ViewerResult<Transition> {
        let t = self.playback.begin_seek_gesture();
        self.apply(t)
    }

    pub fn end_seek_gesture(&mut self) -> ViewerResult<Transition> {
        let t = self.playback.end_seek_gesture();
        self.apply(t)
    }

    fn apply(&mut self, t: Transition) -> ViewerResult<Transition> {
        match t.render {
            Some(index) => {
                self.render(index)?;
                Ok(t)
            }
            None => Ok(t),
        }
    }

    /// Decode (unless cached) and present frame `index`. A
    /// failure pauses playback and leaves the view as it was.
    fn render(&mut self, index: usize) -> ViewerResult<()> {
        let cached = self
            .decoded
            .as_ref()
            .map_or(false, |d| d.index == index && d.raw.unit() == self.unit);
        if !cached {
            let doc = match self.document.as_mut() {
                Some(doc) => doc,
                None => return Ok(()),
            };
            match doc.decode(index) {
                Ok(raw) => self.decoded = Some(decode_cache(index, raw)),
                Err(cause) => {
                    self.playback.pause();
                    warn!(index, "decode failed, pausing: {:#}", cause);
                    return Err(ViewerError::Decode { index, cause });
                }
            }
        }
        self.present();
        Ok(())
    }

    /// Recolor the cached frame and refresh legend labels.
    fn present(&mut self) {
        let decoded = match &self.decoded {
            Some(d) => d,
            None => return,
        };
        self.legend
            .relabel(decoded.stats, decoded.raw.unit(), self.config.legend_decimals);
        let labels = match self.legend.labels() {
            Some(labels) => labels.clone(),
            None => return,
        };
        self.view = Some(RenderedView {
            index: decoded.index,
            image: apply_palette(&decoded.indices, self.palette),
            stats: decoded.stats,
            labels,
        });
    }

    /// Switch the decode unit and re-decode the displayed
    /// frame. An unavailable unit is refused and nothing
    /// changes.
    pub fn set_unit(&mut self, unit: DisplayUnit) -> ViewerResult<()> {
        let doc = match self.document.as_mut() {
            Some(doc) => doc,
            None => {
                self.unit = unit;
                return Ok(());
            }
        };
        if unit == self.unit {
            return Ok(());
        }
        if !doc.supports(unit) || doc.set_unit(unit).is_err() {
            warn!(%unit, current = %self.unit, "unit not available, keeping current");
            return Err(ViewerError::UnsupportedUnit { unit });
        }
        let previous = self.unit;
        self.unit = unit;
        let index = self
            .view
            .as_ref()
            .map_or(self.playback.current_frame(), |v| v.index);
        if let Err(e) = self.render(index) {
            self.unit = previous;
            if let Some(doc) = self.document.as_mut() {
                if let Err(cause) = doc.set_unit(previous) {
                    warn!(unit = %previous, "cannot restore unit: {:#}", cause);
                }
            }
            return Err(e);
        }
        info!(%unit, "unit changed");
        Ok(())
    }

    /// Switch palettes: rebuild the legend gradient and
    /// recolor the displayed frame without decoding.
    pub fn set_palette(&mut self, palette: Palette) {
        if palette == self.palette {
            return;
        }
        info!(%palette, "palette changed");
        self.palette = palette;
        self.refresh_legend();
        self.present();
    }

    pub fn set_palette_name(&mut self, name: &str) {
        self.set_palette(Palette::from_name(name));
    }

    pub fn set_legend_height(&mut self, height: u32) {
        self.config.legend_height = height;
        self.refresh_legend();
    }

    fn refresh_legend(&mut self) {
        let rebuilt = self.legend.refresh(
            self.palette,
            self.config.legend_height,
            self.config.legend_width,
        );
        debug!(rebuilt, "legend refreshed");
    }

    /// Reading under `pointer` on a `canvas` of
    /// `(width, height)` with the frame centered.
    pub fn inspect(&self, canvas: (usize, usize), pointer: (i64, i64)) -> Option<PixelReading> {
        let raw = self.raw_frame()?;
        let offset = centering_offset(canvas, (raw.width(), raw.height()));
        inspect(
            Some(raw),
            offset,
            pointer,
            raw.unit(),
            self.config.pixel_decimals,
        )
    }

    /// Status-bar text for `pointer`; empty outside the
    /// frame.
    pub fn status_text(&self, canvas: (usize, usize), pointer: (i64, i64)) -> String {
        match (self.inspect(canvas, pointer), self.raw_frame()) {
            (Some(reading), Some(raw)) => reading.status_text(raw.unit()),
            _ => String::new(),
        }
    }

    /// e.g. `Frame: 3 / 9` for the fourth of ten frames.
    pub fn frame_label(&self) -> String {
        let last = self.playback.frame_count().saturating_sub(1);
        format!("Frame: {} / {}", self.playback.current_frame(), last)
    }

    pub fn metadata(&self) -> Option<Metadata> {
        self.document.as_ref().map(|doc| doc.metadata())
    }

    pub fn metadata_rows(&self) -> Vec<(String, String)> {
        self.metadata()
            .map(|m| m.rows(self.config.metadata_decimals))
            .unwrap_or_default()
    }

    /// Write the last decoded frame as CSV.
    pub fn export_csv(&self, path: &Path) -> ViewerResult<()> {
        let raw = self.raw_frame().ok_or(ViewerError::NoFrame)?;
        export_csv(raw, path).map_err(|cause| {
            warn!(path = %path.display(), "export failed: {}", cause);
            ViewerError::Export {
                path: path.to_path_buf(),
                cause,
            }
        })
    }
}

fn decode_cache(index: usize, raw: RawFrame) -> Decoded {
    let (indices, stats) = normalize_with_stats(&raw);
    Decoded {
        index,
        raw,
        stats,
        indices,
    }
}
