use std::io::{Cursor, Read};

use anyhow::{bail, ensure, Context, Result};
use image::{
    codecs::{png::PngDecoder, tiff::TiffDecoder},
    ColorType, ImageDecoder,
};
use ndarray::Array2;
use serde_derive::*;

use super::{check_dims, check_index, radiometric_frame, radiometric_supports, Document};
use crate::{
    frame::{DisplayUnit, RawFrame},
    metadata::{Metadata, Property},
    temperature::ThermalSettings,
};

/// One entry of `exiftool -b -j` output for a FLIR image.
#[derive(Deserialize, Debug)]
pub struct ThermalExif {
    #[serde(flatten)]
    pub settings: ThermalSettings,

    #[serde(flatten)]
    pub raw: ThermalRawBytes,

    #[serde(rename = "CameraModel", default)]
    pub camera_model: Option<String>,
    #[serde(rename = "CameraSerialNumber", default)]
    pub camera_serial_number: Option<String>,
    #[serde(rename = "LensModel", default)]
    pub lens_model: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ThermalRawBytes {
    #[serde(rename = "RawThermalImageType")]
    ty: String,

    #[serde(
        rename = "RawThermalImage",
        deserialize_with = "serde_helpers::base64_bytes"
    )]
    bytes: Vec<u8>,
}

impl ThermalRawBytes {
    /// `(width, height)` from the embedded image header.
    pub fn dims(&self) -> Result<(usize, usize)> {
        let (width, height) = match self.ty.as_str() {
            "TIFF" => TiffDecoder::new(Cursor::new(&self.bytes))?.dimensions(),
            "PNG" => PngDecoder::new(Cursor::new(&self.bytes))?.dimensions(),
            ty => bail!("unsupported raw image type: {}", ty),
        };
        Ok((width as usize, height as usize))
    }

    /// Raw sensor values as a `(height, width)` array.
    ///
    /// FLIR writes 16-bit PNG samples little-endian despite
    /// PNG being big-endian, so those are swapped back.
    pub fn thermal_image(&self) -> Result<Array2<f64>> {
        let (width, height) = self.dims()?;
        let samples = match self.ty.as_str() {
            "TIFF" => read_samples(TiffDecoder::new(Cursor::new(&self.bytes))?, false)?,
            _ => read_samples(PngDecoder::new(Cursor::new(&self.bytes))?, true)?,
        };
        Ok(Array2::from_shape_vec((height, width), samples)?)
    }
}

fn read_samples<'a, D: ImageDecoder<'a>>(decoder: D, swap: bool) -> Result<Vec<f64>> {
    use zerocopy::{AsBytes, FromBytes};
    fn read_as<'a, T, D>(decoder: D) -> Result<Vec<T>>
    where
        T: AsBytes + FromBytes + Default + Clone,
        D: ImageDecoder<'a>,
    {
        let (width, height) = decoder.dimensions();
        let mut image = vec![T::default(); width as usize * height as usize];
        decoder.read_image(image.as_bytes_mut())?;
        Ok(image)
    }

    Ok(match decoder.color_type() {
        ColorType::L8 => read_as::<u8, _>(decoder)?.into_iter().map(f64::from).collect(),
        ColorType::L16 => read_as::<u16, _>(decoder)?
            .into_iter()
            .map(|v| f64::from(if swap { v.swap_bytes() } else { v }))
            .collect(),
        ty => bail!("unsupported color type: {:?}", ty),
    })
}

/// Frames described by ExifTool JSON; one per array entry.
pub struct ExiftoolDocument {
    frames: Vec<ThermalExif>,
    dims: (usize, usize),
    unit: DisplayUnit,
}

impl ExiftoolDocument {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Entries {
            Many(Vec<ThermalExif>),
            One(Box<ThermalExif>),
        }
        let frames = match serde_json::from_reader(reader).context("parsing exiftool json")? {
            Entries::Many(frames) => frames,
            Entries::One(frame) => vec![*frame],
        };
        ensure!(!frames.is_empty(), "exiftool json has no entries");
        let dims = frames[0].raw.dims()?;
        Ok(ExiftoolDocument {
            frames,
            dims,
            unit: DisplayUnit::Counts,
        })
    }
}

impl Document for ExiftoolDocument {
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
        radiometric_supports(Some(&self.frames[0].settings), unit)
    }

    fn set_unit(&mut self, unit: DisplayUnit) -> Result<()> {
        ensure!(self.supports(unit), "{} is not available", unit);
        self.unit = unit;
        Ok(())
    }

    fn decode(&mut self, index: usize) -> Result<RawFrame> {
        check_index(index, self.frames.len())?;
        let frame = &self.frames[index];
        let raw = frame.raw.thermal_image()?;
        check_dims(&raw, self.dims)?;
        radiometric_frame(raw, Some(&frame.settings), self.unit)
    }

    fn metadata(&self) -> Metadata {
        let first = &self.frames[0];
        let mut meta = Metadata::with_geometry(self.frames.len(), self.dims);
        meta.extend_settings(&first.settings);
        let text = |s: &Option<String>| s.as_deref().unwrap_or_default().trim().to_string();
        meta.push_text(Property::CameraModel, text(&first.camera_model));
        meta.push_text(Property::CameraSerialNumber, text(&first.camera_serial_number));
        meta.push_text(Property::LensModel, text(&first.lens_model));
        meta
    }
}

mod serde_helpers {
    use serde::*;

    /// ExifTool binary fields look like `"base64:AAEC..."`.
    pub fn base64_bytes<'de, D>(de: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let str_rep = <String as Deserialize>::deserialize(de)?;
        let encoded = str_rep
            .strip_prefix("base64:")
            .ok_or_else(|| Error::custom("unexpected format: must begin with `base64:`"))?;
        base64::decode(encoded).map_err(Error::custom)
    }
}
