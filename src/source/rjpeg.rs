use anyhow::{anyhow, ensure, Context, Result};
use img_parts::jpeg::Jpeg;
use ndarray::Array2;
use tracing::warn;

use super::{check_index, radiometric_frame, radiometric_supports, Document};
use crate::{
    flir::{FffBlock, FlirCameraParams},
    frame::{DisplayUnit, RawFrame},
    metadata::Metadata,
    temperature::ThermalSettings,
};

/// A FLIR radiometric JPEG: a single frame whose raw
/// sensor image travels in the APP1 segments.
pub struct RJpegDocument {
    raw: Array2<f64>,
    params: Option<FlirCameraParams>,
    settings: Option<ThermalSettings>,
    unit: DisplayUnit,
}

impl RJpegDocument {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let jpeg = Jpeg::from_bytes(bytes.into()).context("parsing jpeg structure")?;
        let block = FffBlock::try_from_jpeg(&jpeg)?;
        let raw = block
            .try_parse_raw_data()?
            .ok_or_else(|| anyhow!("FLIR jpeg carries no raw sensor image"))?;
        let params = block.try_parse_camera_params()?;
        if params.is_none() {
            warn!("no camera calibration; only raw counts are available");
        }
        let settings = params.as_ref().map(ThermalSettings::from);
        Ok(RJpegDocument {
            raw,
            params,
            settings,
            unit: DisplayUnit::Counts,
        })
    }
}

impl Document for RJpegDocument {
    fn frame_count(&self) -> usize {
        1
    }

    fn frame_dims(&self) -> (usize, usize) {
        let (rows, cols) = self.raw.dim();
        (cols, rows)
    }

    fn unit(&self) -> DisplayUnit {
        self.unit
    }

    fn supports(&self, unit: DisplayUnit) -> bool {
        radiometric_supports(self.settings.as_ref(), unit)
    }

    fn set_unit(&mut self, unit: DisplayUnit) -> Result<()> {
        ensure!(self.supports(unit), "{} is not available for this image", unit);
        self.unit = unit;
        Ok(())
    }

    fn decode(&mut self, index: usize) -> Result<RawFrame> {
        check_index(index, 1)?;
        radiometric_frame(self.raw.clone(), self.settings.as_ref(), self.unit)
    }

    fn metadata(&self) -> Metadata {
        let mut meta = Metadata::with_geometry(1, self.frame_dims());
        if let Some(settings) = &self.settings {
            meta.extend_settings(settings);
        }
        if let Some(params) = &self.params {
            meta.extend_camera(params);
        }
        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flir::testdata::fff_block;
    use crate::metadata::{MetadataValue, Property};

    /// Minimal JPEG carrying `fff` split over APP1 segments
    /// of at most `chunk` bytes.
    fn rjpeg(fff: &[u8], chunk: usize) -> Vec<u8> {
        let chunks: Vec<_> = fff.chunks(chunk).collect();
        let mut out = vec![0xff, 0xd8];
        for (idx, data) in chunks.iter().enumerate() {
            let mut contents = b"FLIR\0\x01".to_vec();
            contents.push(idx as u8);
            contents.push((chunks.len() - 1) as u8);
            contents.extend_from_slice(data);
            out.extend_from_slice(&[0xff, 0xe1]);
            out.extend_from_slice(&(contents.len() as u16 + 2).to_be_bytes());
            out.extend(contents);
        }
        out.extend_from_slice(&[0xff, 0xd9]);
        out
    }

    #[test]
    fn decodes_all_units() -> Result<()> {
        let fff = fff_block(2, 2, &[13000, 14000, 15000, 16000], true);
        let mut doc = RJpegDocument::from_bytes(rjpeg(&fff, 100))?;
        assert_eq!(doc.frame_count(), 1);
        assert_eq!(doc.frame_dims(), (2, 2));

        let counts = doc.decode(0)?;
        assert_eq!(counts.unit(), DisplayUnit::Counts);
        assert_eq!(counts.get(1, 1), Some(16000.));

        let temps = doc.decode_as(0, DisplayUnit::Temperature)?;
        assert!(temps.get(1, 1) > temps.get(0, 0));
        assert_eq!(doc.unit(), DisplayUnit::Temperature);
        assert!(doc.decode(1).is_err());

        let meta = doc.metadata();
        assert_eq!(
            meta.get(Property::CameraModel),
            Some(&MetadataValue::Text("FLIR E8".into()))
        );
        Ok(())
    }

    #[test]
    fn uncalibrated_images_stay_in_counts() -> Result<()> {
        let fff = fff_block(1, 1, &[100], false);
        let mut doc = RJpegDocument::from_bytes(rjpeg(&fff, 1000))?;
        assert!(!doc.supports(DisplayUnit::Radiance));
        assert!(doc.set_unit(DisplayUnit::Radiance).is_err());
        assert_eq!(doc.unit(), DisplayUnit::Counts);
        Ok(())
    }

    #[test]
    fn plain_jpeg_is_rejected() {
        assert!(RJpegDocument::from_bytes(vec![0xff, 0xd8, 0xff, 0xd9]).is_err());
    }
}
