use anyhow::{ensure, Result};
use ndarray::Array2;

use super::{check_dims, check_index, Document};
use crate::{
    frame::{DisplayUnit, RawFrame},
    metadata::Metadata,
};

/// Frames supplied by the caller, stored in
/// [`DisplayUnit::Counts`]. Other units become available
/// through [`with_linear`](MemoryDocument::with_linear).
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    frames: Vec<Array2<f64>>,
    dims: (usize, usize),
    conversions: Vec<(DisplayUnit, f64, f64)>,
    unit: DisplayUnit,
}

impl MemoryDocument {
    /// Every frame must have the same `(height, width)`.
    pub fn new(frames: Vec<Array2<f64>>) -> Result<Self> {
        let dims = frames
            .first()
            .map(|f| (f.ncols(), f.nrows()))
            .unwrap_or((0, 0));
        for (idx, frame) in frames.iter().enumerate() {
            ensure!(
                (frame.ncols(), frame.nrows()) == dims,
                "frame {} is {}x{}, expected {}x{}",
                idx,
                frame.ncols(),
                frame.nrows(),
                dims.0,
                dims.1
            );
        }
        Ok(MemoryDocument {
            frames,
            dims,
            conversions: vec![],
            unit: DisplayUnit::Counts,
        })
    }

    /// Offer `unit` as `counts * gain + offset`.
    pub fn with_linear(mut self, unit: DisplayUnit, gain: f64, offset: f64) -> Self {
        self.conversions.retain(|(u, _, _)| *u != unit);
        self.conversions.push((unit, gain, offset));
        self
    }
}

impl Document for MemoryDocument {
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
        unit == DisplayUnit::Counts || self.conversions.iter().any(|(u, _, _)| *u == unit)
    }

    fn set_unit(&mut self, unit: DisplayUnit) -> Result<()> {
        ensure!(self.supports(unit), "{} is not available", unit);
        self.unit = unit;
        Ok(())
    }

    fn decode(&mut self, index: usize) -> Result<RawFrame> {
        check_index(index, self.frames.len())?;
        let counts = &self.frames[index];
        check_dims(counts, self.dims)?;
        let data = match self.conversions.iter().find(|(u, _, _)| *u == self.unit) {
            Some(&(_, gain, offset)) => counts.mapv(|v| v * gain + offset),
            None => counts.clone(),
        };
        RawFrame::new(data, self.unit)
    }

    fn metadata(&self) -> Metadata {
        Metadata::with_geometry(self.frames.len(), self.dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn linear_units() -> Result<()> {
        let mut doc = MemoryDocument::new(vec![arr2(&[[10., 20.]]), arr2(&[[30., 40.]])])?
            .with_linear(DisplayUnit::Temperature, 0.5, -5.);
        assert_eq!(doc.frame_dims(), (2, 1));
        assert!(!doc.supports(DisplayUnit::Radiance));
        assert!(doc.set_unit(DisplayUnit::Radiance).is_err());
        let frame = doc.decode_as(1, DisplayUnit::Temperature)?;
        assert_eq!(frame.get(1, 0), Some(15.));
        assert_eq!(doc.decode(0)?.get(0, 0), Some(0.));
        Ok(())
    }

    #[test]
    fn rejects_ragged_frames() {
        let ragged = vec![arr2(&[[1., 2.]]), arr2(&[[1.], [2.]])];
        assert!(MemoryDocument::new(ragged).is_err());
    }

    #[test]
    fn non_finite_samples_fail_decode() -> Result<()> {
        let mut doc = MemoryDocument::new(vec![arr2(&[[1., f64::NAN]])])?;
        assert!(doc.decode(0).is_err());
        Ok(())
    }
}
