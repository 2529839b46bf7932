//! Frame sources: opening radiometric documents and decoding
//! their frames in a requested unit.
//!
//! [`RadiometricFiles`] recognizes three on-disk formats by
//! content:
//!
//! - FLIR radiometric JPEGs (one frame),
//! - FLIR `.seq` / `.fff` sequences (concatenated FFF
//!   blocks, one frame each),
//! - JSON written by `exiftool -b -j` (one frame per entry).
//!
//! [`MemoryDocument`] serves frames already in memory.

mod exiftool;
mod memory;
mod rjpeg;
mod seq;

use std::{fs, path::Path};

use anyhow::{anyhow, bail, ensure, Context, Result};
use ndarray::Array2;
use tracing::info;

use crate::{
    frame::{DisplayUnit, RawFrame},
    metadata::Metadata,
    temperature::ThermalSettings,
};

pub use exiftool::{ExiftoolDocument, ThermalExif, ThermalRawBytes};
pub use memory::MemoryDocument;
pub use rjpeg::RJpegDocument;
pub use seq::SeqDocument;

/// An opened radiometric document.
///
/// The selected unit is part of the document's state: it
/// persists across [`decode`](Document::decode) calls until
/// changed with [`set_unit`](Document::set_unit).
pub trait Document {
    fn frame_count(&self) -> usize;

    /// `(width, height)` shared by every frame.
    fn frame_dims(&self) -> (usize, usize);

    fn unit(&self) -> DisplayUnit;

    fn supports(&self, unit: DisplayUnit) -> bool;

    /// Select the unit for subsequent decodes. Fails, leaving
    /// the unit unchanged, if the document cannot produce it.
    fn set_unit(&mut self, unit: DisplayUnit) -> Result<()>;

    /// Decode frame `index` in the current unit.
    fn decode(&mut self, index: usize) -> Result<RawFrame>;

    fn decode_as(&mut self, index: usize, unit: DisplayUnit) -> Result<RawFrame> {
        self.set_unit(unit)?;
        self.decode(index)
    }

    fn metadata(&self) -> Metadata;
}

/// Something that can open documents from paths.
pub trait FrameSource {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>>;
}

/// Opens the FLIR file formats this crate can parse.
#[derive(Debug, Default, Clone, Copy)]
pub struct RadiometricFiles;

impl FrameSource for RadiometricFiles {
    fn open(&self, path: &Path) -> Result<Box<dyn Document>> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let doc: Box<dyn Document> = if bytes.starts_with(&[0xff, 0xd8]) {
            Box::new(RJpegDocument::from_bytes(bytes)?)
        } else if crate::flir::has_fff_magic(&bytes) {
            Box::new(SeqDocument::from_bytes(bytes)?)
        } else if looks_like_json(&bytes) {
            Box::new(ExiftoolDocument::from_reader(&bytes[..])?)
        } else {
            bail!("not a recognized radiometric format (expected FLIR jpeg, seq or exiftool json)");
        };
        ensure!(doc.frame_count() > 0, "document has no frames");
        let (width, height) = doc.frame_dims();
        info!(
            path = %path.display(),
            frames = doc.frame_count(),
            width,
            height,
            "opened document"
        );
        Ok(doc)
    }
}

fn looks_like_json(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map_or(false, |&b| b == b'[' || b == b'{')
}

/// Units obtainable from raw counts given (optional)
/// calibration settings.
pub(crate) fn radiometric_supports(settings: Option<&ThermalSettings>, unit: DisplayUnit) -> bool {
    unit == DisplayUnit::Counts || settings.is_some()
}

/// Convert raw sensor counts into `unit` using `settings`.
pub(crate) fn radiometric_frame(
    raw: Array2<f64>,
    settings: Option<&ThermalSettings>,
    unit: DisplayUnit,
) -> Result<RawFrame> {
    let data = match (unit, settings) {
        (DisplayUnit::Counts, _) => raw,
        (_, None) => bail!("{} requires camera calibration, which is missing", unit),
        (DisplayUnit::Temperature, Some(s)) => {
            let t = s.temperature_transform(s.object_distance());
            raw.mapv(|v| t(v))
        }
        (DisplayUnit::Radiance, Some(s)) => raw.mapv(s.radiance_transform(s.object_distance())),
    };
    RawFrame::new(data, unit)
}

pub(crate) fn check_index(index: usize, frame_count: usize) -> Result<()> {
    if index < frame_count {
        Ok(())
    } else {
        Err(anyhow!(
            "frame {} out of range: document has {} frames",
            index,
            frame_count
        ))
    }
}

pub(crate) fn check_dims(data: &Array2<f64>, (width, height): (usize, usize)) -> Result<()> {
    let (rows, cols) = data.dim();
    ensure!(
        (cols, rows) == (width, height),
        "frame is {}x{}, document declares {}x{}",
        cols,
        rows,
        width,
        height
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flir::testdata::fff_block;
    use std::{env, io::Write};

    fn write_temp(name: &str, bytes: &[u8]) -> Result<std::path::PathBuf> {
        let path = env::temp_dir().join(format!("thermal-view-{}-{}", std::process::id(), name));
        fs::File::create(&path)?.write_all(bytes)?;
        Ok(path)
    }

    #[test]
    fn sniffs_sequences() -> Result<()> {
        let mut bytes = fff_block(2, 1, &[10, 20], true);
        bytes.extend(fff_block(2, 1, &[30, 40], true));
        let path = write_temp("seq.seq", &bytes)?;
        let mut doc = RadiometricFiles.open(&path)?;
        fs::remove_file(&path)?;
        assert_eq!(doc.frame_count(), 2);
        assert_eq!(doc.frame_dims(), (2, 1));
        assert_eq!(doc.decode(1)?.get(1, 0), Some(40.));
        Ok(())
    }

    #[test]
    fn rejects_unknown_and_missing_files() -> Result<()> {
        let path = write_temp("junk.bin", b"GIF89a not thermal")?;
        let err = RadiometricFiles.open(&path).err().expect("unknown format");
        fs::remove_file(&path)?;
        assert!(format!("{}", err).contains("not a recognized"));

        let missing = env::temp_dir().join("thermal-view-definitely-missing.seq");
        assert!(RadiometricFiles.open(&missing).is_err());
        Ok(())
    }

    #[test]
    fn counts_need_no_calibration() -> Result<()> {
        let raw = Array2::from_elem((2, 2), 7.);
        assert!(radiometric_supports(None, DisplayUnit::Counts));
        assert!(!radiometric_supports(None, DisplayUnit::Temperature));
        assert_eq!(radiometric_frame(raw.clone(), None, DisplayUnit::Counts)?.get(0, 0), Some(7.));
        assert!(radiometric_frame(raw, None, DisplayUnit::Radiance).is_err());
        Ok(())
    }

    /// Opens every FLIR file under `THERMAL_DATASETS_PATH`,
    /// when set, and decodes its first frame in all units.
    #[test]
    fn decode_datasets() -> Result<()> {
        use glob::{glob_with, MatchOptions};

        let base = match env::var("THERMAL_DATASETS_PATH") {
            Ok(base) => base,
            Err(_) => return Ok(()),
        };
        let mut opts = MatchOptions::new();
        opts.case_sensitive = false;
        for pattern in ["jpg", "seq"].iter() {
            for path in glob_with(&format!("{}/**/*.{}", base, pattern), opts)? {
                let path = path?;
                eprintln!("Reading {}...", path.display());
                let mut doc = match RadiometricFiles.open(&path) {
                    Ok(doc) => doc,
                    Err(e) => {
                        eprintln!("\t{:#}", e);
                        continue;
                    }
                };
                let units: Vec<_> = DisplayUnit::ALL
                    .iter()
                    .copied()
                    .filter(|u| doc.supports(*u))
                    .collect();
                for unit in units {
                    let frame = doc.decode_as(0, unit)?;
                    eprintln!("\t{}: {:?}", unit, frame.stats());
                }
            }
        }
        Ok(())
    }
}
