use std::ops::Range;

use anyhow::{anyhow, ensure, Context, Result};
use tracing::{debug, warn};

use super::{check_dims, check_index, radiometric_frame, radiometric_supports, Document};
use crate::{
    flir::{split_sequence, FffBlock, FlirCameraParams},
    frame::{DisplayUnit, RawFrame},
    metadata::Metadata,
    temperature::ThermalSettings,
};

/// A FLIR `.seq` file. The whole file is held in memory;
/// frames are parsed only when decoded.
pub struct SeqDocument {
    bytes: Vec<u8>,
    frames: Vec<Range<usize>>,
    dims: (usize, usize),
    /// Calibration of the first frame.
    params: Option<FlirCameraParams>,
    settings: Option<ThermalSettings>,
    unit: DisplayUnit,
}

impl SeqDocument {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let frames = split_sequence(&bytes)?;
        let first = FffBlock::try_from_bytes(bytes[frames[0].clone()].to_vec())
            .context("parsing first frame")?;
        let dims = first
            .try_raw_dims()?
            .ok_or_else(|| anyhow!("first frame carries no raw sensor image"))?;
        let params = first.try_parse_camera_params()?;
        if params.is_none() {
            warn!("no camera calibration; only raw counts are available");
        }
        let settings = params.as_ref().map(ThermalSettings::from);
        debug!(frames = frames.len(), "split sequence");
        Ok(SeqDocument {
            bytes,
            frames,
            dims,
            params,
            settings,
            unit: DisplayUnit::Counts,
        })
    }

    fn block(&self, index: usize) -> Result<FffBlock> {
        check_index(index, self.frames.len())?;
        FffBlock::try_from_bytes(self.bytes[self.frames[index].clone()].to_vec())
    }
}

impl Document for SeqDocument {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_dims(&self) -> (usize, usize) {
        self.dims
    }

    fn unit(&self) -> DisplayUnit {
        self.unit
    }

    fn supports(&self, unit: DisplayUnit) -> bool {
        radiometric_supports(self.settings.as_ref(), unit)
    }

    fn set_unit(&mut self, unit: DisplayUnit) -> Result<()> {
        ensure!(self.supports(unit), "{} is not available for this sequence", unit);
        self.unit = unit;
        Ok(())
    }

    /// Each frame carries its own calibration, which is used
    /// in preference to the first frame's.
    fn decode(&mut self, index: usize) -> Result<RawFrame> {
        let block = self.block(index)?;
        let raw = block
            .try_parse_raw_data()?
            .ok_or_else(|| anyhow!("frame carries no raw sensor image"))?;
        check_dims(&raw, self.dims)?;
        let own = match self.unit {
            DisplayUnit::Counts => None,
            _ => block.try_parse_camera_params()?.map(|p| ThermalSettings::from(&p)),
        };
        radiometric_frame(raw, own.as_ref().or(self.settings.as_ref()), self.unit)
    }

    fn metadata(&self) -> Metadata {
        let mut meta = Metadata::with_geometry(self.frames.len(), self.dims);
        if let Some(settings) = &self.settings {
            meta.extend_settings(settings);
        }
        if let Some(params) = &self.params {
            meta.extend_camera(params);
        }
        meta
    }
}
