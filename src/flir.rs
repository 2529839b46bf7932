//! Parse FLIR FFF blocks: the record container FLIR uses
//! both inside radiometric JPEGs and, concatenated, in
//! `.seq` sequence files.
//!
//! Only the raw sensor image record and the camera-info
//! record are decoded, which is enough to obtain counts,
//! radiance and temperature for every pixel. Layouts follow
//! the FLIR tables of [ExifTool].
//!
//! [ExifTool]: //exiftool.org
use std::{io::Read, ops::Range};

use anyhow::{anyhow, bail, ensure, Result};
use bincode::{DefaultOptions, Options};
use img_parts::jpeg::{markers, Jpeg};
use ndarray::Array2;
use serde::Deserialize;
use serde_derive::*;

const FFF_MAGIC: &[u8; 4] = b"FFF\0";
const FFF_HEADER_LEN: usize = 0x40;
const DIR_ENTRY_LEN: usize = 0x20;

const RECORD_RAW_DATA: u16 = 0x01;
const RECORD_CAMERA_INFO: u16 = 0x20;

/// A parsed FFF block: its bytes and record directory.
#[derive(Debug)]
pub struct FffBlock {
    data: Vec<u8>,
    dir: Vec<FlirRecordDirEntry>,
}

impl FffBlock {
    /// Reassemble and parse the FFF block embedded in the
    /// APP1 segments of an R-JPEG.
    pub fn try_from_jpeg(image: &Jpeg) -> Result<Self> {
        Self::try_from_bytes(collect_flir_segment_data_from_jpeg(image)?)
    }

    /// Parse a block whose first bytes are the FFF header.
    pub fn try_from_bytes(data: Vec<u8>) -> Result<Self> {
        let (dir, _) = parse_fff_directory(&data)?;
        Ok(FffBlock { data, dir })
    }

    /// Raw sensor values as a `(height, width)` array, or
    /// `None` if the block carries no raw image record.
    pub fn try_parse_raw_data(&self) -> Result<Option<Array2<f64>>> {
        self.dir
            .iter()
            .find_map(|e| e.try_parse_raw_data(&self.data).transpose())
            .transpose()
    }

    /// Width and height of the raw image without decoding
    /// its pixels.
    pub fn try_raw_dims(&self) -> Result<Option<(usize, usize)>> {
        self.dir
            .iter()
            .find_map(|e| e.try_raw_dims(&self.data).transpose())
            .transpose()
    }

    pub fn try_parse_camera_params(&self) -> Result<Option<FlirCameraParams>> {
        self.dir
            .iter()
            .find_map(|e| e.try_parse_camera_params(&self.data).transpose())
            .transpose()
    }
}

/// Locate the FFF blocks of a sequence file.
///
/// Each block is measured through its own record directory;
/// the next one is searched for from there, which skips any
/// padding FLIR places between frames.
pub fn split_sequence(bytes: &[u8]) -> Result<Vec<Range<usize>>> {
    let mut frames = vec![];
    let mut start = find_magic(bytes, 0);
    while let Some(pos) = start {
        let (dir, dir_end) = parse_fff_directory(&bytes[pos..])
            .map_err(|e| anyhow!("FFF block {} at byte {}: {}", frames.len(), pos, e))?;
        let extent = extent_of(&dir, dir_end).min(bytes.len() - pos);
        ensure!(extent >= FFF_HEADER_LEN, "empty FFF block at byte {}", pos);
        let next = find_magic(bytes, pos + extent);
        frames.push(pos..next.unwrap_or(bytes.len()));
        start = next;
    }
    ensure!(!frames.is_empty(), "no FFF block found");
    Ok(frames)
}

fn extent_of(dir: &[FlirRecordDirEntry], dir_end: usize) -> usize {
    dir.iter()
        .map(|e| e.offset as usize + e.length as usize)
        .fold(dir_end, usize::max)
}

fn find_magic(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(FFF_MAGIC.len())
        .position(|w| w == FFF_MAGIC)
        .map(|p| p + from)
}

pub fn has_fff_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(FFF_MAGIC)
}

/// Collect FLIR data from Jpeg APP1 segments.
///
/// FLIR data is stored as a collection of APP1 segments
/// with the following format:
///
/// - 0x0: signature: "FLIR\0"
/// - 0x6: segment number: zero-based idx
/// - 0x7: last segment number (= total segments - 1)
/// - 0x8..: data
fn collect_flir_segment_data_from_jpeg(image: &Jpeg) -> Result<Vec<u8>> {
    let mut flir_segments: Vec<Vec<u8>> = vec![];
    let mut num_copied = 0;

    for segment in image.segments_by_marker(markers::APP1) {
        let contents = segment.contents();
        if contents.len() < 8 || &contents[0..5] != b"FLIR\0" {
            continue;
        }

        let current_segment = contents[6] as usize;
        let total_segments = contents[7] as usize + 1;

        match flir_segments.len() {
            0 => flir_segments.resize(total_segments, vec![]),
            l if l != total_segments => bail!(
                "inconsistent count of total FLIR segments: {} != {}",
                l,
                total_segments
            ),
            _ => (),
        }
        ensure!(
            current_segment < flir_segments.len(),
            "FLIR segment idx out of bounds: {} >= {}",
            current_segment,
            flir_segments.len()
        );

        let curr_seg = &mut flir_segments[current_segment];
        ensure!(
            curr_seg.is_empty(),
            "duplicate FLIR segment: idx = {}",
            current_segment
        );
        curr_seg.extend_from_slice(&contents[8..]);
        num_copied += 1;
    }

    ensure!(!flir_segments.is_empty(), "no FLIR segments in jpeg");
    ensure!(
        num_copied == flir_segments.len(),
        "expected {} FLIR segments, found only {}",
        flir_segments.len(),
        num_copied
    );

    Ok(flir_segments.concat())
}

fn is_block_little_endian(block: &[u8]) -> Result<bool> {
    #[derive(Debug, Deserialize)]
    struct FffHeaderPre {
        format: [u8; 4],
        creator: [u8; 16],
        version: u32,
    }

    let hdr: FffHeaderPre = deserialize_with_endian(true, block)?;
    if &hdr.format != FFF_MAGIC {
        bail!("unexpected signature in FFF block");
    }
    Ok(hdr.version >= 100 && hdr.version < 200)
}

// FFF header:
// 0x00 - string[4] file format ID = "FFF\0"
// 0x04 - string[16] file creator
// 0x14 - int32u file format version = 100
// 0x18 - int32u offset to record directory
// 0x1c - int32u number of entries in record directory
// 0x20 - int32u next free index ID
// 0x24 - int16u swap pattern
// 0x26 - int16u[7] spares
// 0x34 - int32u[2] reserved
// 0x3c - int32u checksum
fn parse_fff_directory(block: &[u8]) -> Result<(Vec<FlirRecordDirEntry>, usize)> {
    ensure!(
        block.len() >= FFF_HEADER_LEN,
        "FFF block too short: {} bytes",
        block.len()
    );
    let is_le = is_block_little_endian(block)?;

    #[derive(Debug, Deserialize)]
    struct FffHeader {
        offset: u32,
        num_entries: u32,
    }

    let hdr: FffHeader = deserialize_with_endian(is_le, &block[0x18..])?;
    let dir_start = hdr.offset as usize;
    let dir_len = hdr.num_entries as usize * DIR_ENTRY_LEN;
    let mut dir_segment = block
        .get(dir_start..dir_start + dir_len)
        .ok_or_else(|| anyhow!("FFF record directory past end of block"))?;

    let dir = (0..hdr.num_entries)
        .map(|_| deserialize_with_endian(is_le, &mut dir_segment))
        .collect::<Result<_>>()?;
    Ok((dir, dir_start + dir_len))
}

// FFF record entry:
// 0x00 - int16u record type
// 0x02 - int16u record subtype: RawData 1=BE, 2=LE, 3=PNG
// 0x04 - int32u record version
// 0x08 - int32u index id
// 0x0c - int32u record offset from start of FFF block
// 0x10 - int32u record length
// 0x14 - int32u parent
// 0x18 - int32u object number
// 0x1c - int32u checksum: 0 for no checksum
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct FlirRecordDirEntry {
    ty: u16,
    sub_type: u16,
    version: u32,

    id: u32,
    offset: u32,
    length: u32,

    parent: u32,
    obj_num: u32,
    checksum: u32,
}

impl FlirRecordDirEntry {
    fn data<'a>(&self, block: &'a [u8]) -> Result<&'a [u8]> {
        let start = self.offset as usize;
        block
            .get(start..start + self.length as usize)
            .ok_or_else(|| anyhow!("unexpected end of FFF block while reading record"))
    }

    /// Endianness flag and dims of a raw data record.
    fn raw_header(&self, block: &[u8]) -> Result<Option<(bool, usize, usize)>> {
        if self.ty != RECORD_RAW_DATA {
            return Ok(None);
        }
        ensure!(self.sub_type != 3, "PNG type raw data not yet supported");

        let data = self.data(block)?;
        ensure!(
            data.len() > 6,
            "raw data record size mismatch: expected at least 6 bytes, found {}",
            data.len(),
        );
        let is_le = deserialize_with_endian::<u16, _>(true, data)? == 2;

        #[derive(Debug, Deserialize)]
        struct RawDataDims {
            width: u16,
            height: u16,
        }
        let dims: RawDataDims = deserialize_with_endian(is_le, &data[2..])?;
        Ok(Some((is_le, dims.width as usize, dims.height as usize)))
    }

    fn try_raw_dims(&self, block: &[u8]) -> Result<Option<(usize, usize)>> {
        Ok(self.raw_header(block)?.map(|(_, w, h)| (w, h)))
    }

    fn try_parse_raw_data(&self, block: &[u8]) -> Result<Option<Array2<f64>>> {
        let (is_le, width, height) = match self.raw_header(block)? {
            Some(hdr) => hdr,
            None => return Ok(None),
        };
        let data = self.data(block)?;
        let expected = 2 * (16 + width * height);
        ensure!(
            data.len() >= expected,
            "raw data record size mismatch: expected {} bytes, found {}",
            expected,
            data.len()
        );

        let mut raw_data_slice = &data[0x20..];
        let mut raw_data = Vec::with_capacity(width * height);
        for _ in 0..width * height {
            raw_data.push(deserialize_with_endian::<u16, _>(is_le, &mut raw_data_slice)? as f64);
        }

        Ok(Some(Array2::from_shape_vec((height, width), raw_data)?))
    }

    fn try_parse_camera_params(&self, block: &[u8]) -> Result<Option<FlirCameraParams>> {
        if self.ty != RECORD_CAMERA_INFO {
            return Ok(None);
        }

        let data = self.data(block)?;
        ensure!(
            data.len() >= 0x384,
            "camera info record size mismatch: expected at least {} bytes, found {}",
            0x384,
            data.len()
        );

        let is_le = deserialize_with_endian::<u16, _>(true, data)? == 2;

        Ok(Some(FlirCameraParams {
            temperature_params: deserialize_with_endian(is_le, &data[0x20..])?,
            camera_info: deserialize_with_endian(is_le, &data[0xd4..])?,
            lens_info: deserialize_with_endian(is_le, &data[0x170..])?,
            filter_info: deserialize_with_endian(is_le, &data[0x1ec..])?,
            extra_params: deserialize_with_endian(is_le, &data[0x308..])?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct FlirCameraParams {
    pub(crate) temperature_params: FlirTemperatureParams,
    pub(crate) camera_info: FlirCameraInfo,
    pub(crate) lens_info: FlirLensInfo,
    pub(crate) filter_info: FlirFilterInfo,
    pub(crate) extra_params: FlirExtraParams,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct FlirTemperatureParams {
    pub(crate) emissivity: f32,
    pub(crate) object_distance: f32,

    pub(crate) reflected_apparent_temperature: f32,
    pub(crate) atmospheric_temperature: f32,
    pub(crate) ir_window_temperature: f32,
    pub(crate) ir_window_transmission: f32,

    _dummy_ignore: u32,

    pub(crate) relative_humidity: f32,
    _dummy_ignore_1: [u32; 6],

    pub(crate) planck_r1: f32,
    pub(crate) planck_b: f32,
    pub(crate) planck_f: f32,
    _dummy_ignore_2: [u32; 3],

    pub(crate) atmospheric_transmission_alpha_1: f32,
    pub(crate) atmospheric_transmission_alpha_2: f32,
    pub(crate) atmospheric_transmission_beta_1: f32,
    pub(crate) atmospheric_transmission_beta_2: f32,
    pub(crate) atmospheric_transmission_x: f32,
    _dummy_ignore_3: [u32; 3],

    pub(crate) camera_temperature_range: [f32; 8],
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlirCameraInfo {
    pub(crate) camera_model: [u8; 32],
    pub(crate) camera_part_number: [u8; 16],
    pub(crate) camera_serial_number: [u8; 16],
    pub(crate) camera_software: [u8; 16],
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlirLensInfo {
    pub(crate) lens_model: [u8; 32],
    pub(crate) lens_part_number: [u8; 16],
    pub(crate) lens_serial_number: [u8; 16],
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct FlirFilterInfo {
    pub(crate) filter_model: [u8; 32],
    pub(crate) filter_part_number: [u8; 16],
    pub(crate) filter_serial_number: [u8; 16],
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct FlirExtraParams {
    pub(crate) planck_o: i32,
    pub(crate) planck_r2: f32,
    pub(crate) raw_value_ranges: [u16; 4],
}

/// Text of a NUL-padded fixed-size string field.
pub(crate) fn fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

fn deserialize_with_endian<T, R>(use_little_endian: bool, read: R) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let opts = DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes();
    Ok(if use_little_endian {
        opts.with_little_endian().deserialize_from(read)?
    } else {
        opts.with_big_endian().deserialize_from(read)?
    })
}

/// Builders for synthetic FFF blocks.
#[cfg(test)]
pub(crate) mod testdata {
    use super::*;

    /// Little-endian FFF block with a raw image record and,
    /// optionally, a camera-info record.
    pub(crate) fn fff_block(width: u16, height: u16, raw: &[u16], with_params: bool) -> Vec<u8> {
        assert_eq!(raw.len(), width as usize * height as usize);
        let num_entries: u32 = if with_params { 2 } else { 1 };
        let dir_offset = FFF_HEADER_LEN as u32;
        let raw_offset = dir_offset + num_entries * DIR_ENTRY_LEN as u32;
        let raw_len = 2 * (16 + raw.len() as u32);
        let params_offset = raw_offset + raw_len;

        let mut out = vec![];
        out.extend_from_slice(FFF_MAGIC);
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&100u32.to_le_bytes());
        out.extend_from_slice(&dir_offset.to_le_bytes());
        out.extend_from_slice(&num_entries.to_le_bytes());
        out.resize(FFF_HEADER_LEN, 0);

        let entry = |out: &mut Vec<u8>, ty: u16, offset: u32, length: u32| {
            out.extend_from_slice(&ty.to_le_bytes());
            out.extend_from_slice(&2u16.to_le_bytes());
            out.extend_from_slice(&[0u8; 8]);
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&length.to_le_bytes());
            out.extend_from_slice(&[0u8; 12]);
        };
        entry(&mut out, RECORD_RAW_DATA, raw_offset, raw_len);
        if with_params {
            entry(&mut out, RECORD_CAMERA_INFO, params_offset, 0x384);
        }

        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.resize(raw_offset as usize + 0x20, 0);
        for v in raw {
            out.extend_from_slice(&v.to_le_bytes());
        }

        if with_params {
            out.extend_from_slice(&camera_info_record());
        }
        out
    }

    fn camera_info_record() -> Vec<u8> {
        let mut rec = vec![0u8; 0x384];
        rec[0..2].copy_from_slice(&2u16.to_le_bytes());
        let mut put_f32 = |at: usize, v: f32| rec[at..at + 4].copy_from_slice(&v.to_le_bytes());
        let t = 0x20;
        put_f32(t, 0.95); // emissivity
        put_f32(t + 0x04, 1.0); // object distance
        put_f32(t + 0x08, 293.15); // reflected apparent temperature
        put_f32(t + 0x0c, 293.15); // atmospheric temperature
        put_f32(t + 0x10, 293.15); // IR window temperature
        put_f32(t + 0x14, 1.0); // IR window transmission
        put_f32(t + 0x1c, 0.5); // relative humidity
        put_f32(t + 0x38, 21106.77); // planck R1
        put_f32(t + 0x3c, 1501.0); // planck B
        put_f32(t + 0x40, 1.0); // planck F
        put_f32(t + 0x50, 0.006569); // alpha 1
        put_f32(t + 0x54, 0.01262); // alpha 2
        put_f32(t + 0x58, -0.002276); // beta 1
        put_f32(t + 0x5c, -0.00667); // beta 2
        put_f32(t + 0x60, 1.9); // X
        put_f32(0x308 + 0x04, 0.012545258); // planck R2
        rec[0x308..0x30c].copy_from_slice(&(-7340i32).to_le_bytes());
        rec[0xd4..0xd4 + 8].copy_from_slice(b"FLIR E8\0");
        rec[0x170..0x170 + 10].copy_from_slice(b"FOL7 45\0\0\0");
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::testdata::fff_block;
    use super::*;

    #[test]
    fn raw_image_record() -> Result<()> {
        let block = FffBlock::try_from_bytes(fff_block(3, 2, &[1, 2, 3, 4, 5, 6], false))?;
        assert_eq!(block.try_raw_dims()?, Some((3, 2)));
        let raw = block.try_parse_raw_data()?.expect("raw record");
        assert_eq!(raw.dim(), (2, 3));
        assert_eq!(raw[(1, 0)], 4.);
        assert!(block.try_parse_camera_params()?.is_none());
        Ok(())
    }

    #[test]
    fn camera_info_record() -> Result<()> {
        let block = FffBlock::try_from_bytes(fff_block(1, 1, &[100], true))?;
        let params = block.try_parse_camera_params()?.expect("camera info");
        assert_eq!(params.temperature_params.emissivity, 0.95);
        assert_eq!(params.extra_params.planck_o, -7340);
        assert_eq!(fixed_str(&params.camera_info.camera_model), "FLIR E8");
        assert_eq!(fixed_str(&params.lens_info.lens_model), "FOL7 45");
        Ok(())
    }

    #[test]
    fn splits_concatenated_blocks() -> Result<()> {
        let a = fff_block(2, 2, &[1, 2, 3, 4], true);
        let b = fff_block(2, 2, &[5, 6, 7, 8], true);
        let mut seq = a.clone();
        seq.extend_from_slice(&[0u8; 7]);
        seq.extend_from_slice(&b);
        let frames = split_sequence(&seq)?;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].start, 0);
        assert_eq!(frames[1].start, a.len() + 7);
        assert_eq!(frames[1].end, seq.len());
        Ok(())
    }

    #[test]
    fn rejects_garbage() {
        assert!(FffBlock::try_from_bytes(b"not a flir block at all".to_vec()).is_err());
        assert!(split_sequence(&[0u8; 128]).is_err());
    }
}
