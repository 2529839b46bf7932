//! Playback and false-color rendering of radiometric
//! thermal frame sequences.
//!
//! This crate is the toolkit-agnostic core of a thermal
//! video viewer:
//!
//! 1. [Open](source::FrameSource) FLIR radiometric JPEGs,
//! `.seq` sequences or ExifTool JSON, and decode frames as
//! raw counts, [temperature] or radiance.
//!
//! 2. [Normalize](normalize::normalize) each frame to 8-bit
//! indices, [colorize](palette::apply_palette) them with a
//! named palette and build the matching
//! [color legend](legend::ColorLegend).
//!
//! 3. Drive play / pause / seek through
//! [`PlaybackController`], and resolve pointer positions to
//! pixel values with [`inspect`](inspect::inspect).
//!
//! # Usage
//!
//! A [`Session`] owns all of the above. Hosts send it
//! commands and draw the resulting view:
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use std::path::Path;
//! use thermal_view::{DisplayUnit, Palette, RadiometricFiles, Session};
//!
//! let mut session = Session::default();
//! session.open(&RadiometricFiles, Path::new("flight.seq"))?;
//! session.set_unit(DisplayUnit::Temperature)?;
//! session.set_palette(Palette::Ironbow);
//! session.toggle_play()?;
//! loop {
//!     session.tick()?;
//!     if let Some(view) = session.view() {
//!         // draw view.image and view.labels
//!     }
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Temperatures follow the [Thermimage R library]; the FFF
//! container layout follows [ExifTool].
//!
//! [Thermimage R library]: //github.com/gtatters/Thermimage/blob/master/R/raw2temp.R
//! [ExifTool]: //exiftool.org

pub(crate) mod flir;

pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod inspect;
pub mod legend;
pub mod metadata;
pub mod normalize;
pub mod palette;
pub mod playback;
pub mod session;
pub mod source;
pub mod temperature;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::config::ViewerConfig;
pub use crate::error::{ViewerError, ViewerResult};
pub use crate::frame::{DisplayUnit, FrameStats, RawFrame};
pub use crate::palette::Palette;
pub use crate::playback::{PlaybackController, PlaybackState, Transition};
pub use crate::session::{RenderedView, Session};
pub use crate::source::{Document, FrameSource, MemoryDocument, RadiometricFiles};
