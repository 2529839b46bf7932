//! Pointer to pixel lookup over a centered frame.

use serde_derive::*;

use crate::frame::{DisplayUnit, RawFrame};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelReading {
    pub x: usize,
    pub y: usize,
    /// The stored sample, unrounded.
    pub value: f64,
    /// `value` formatted for the frame's unit.
    pub text: String,
}

impl PixelReading {
    /// Status-bar text, e.g. `X:12 Y:40 | 31.25 °C`.
    pub fn status_text(&self, unit: DisplayUnit) -> String {
        format!("X:{} Y:{} | {} {}", self.x, self.y, self.text, unit.label())
    }
}

/// Offset of a `frame` drawn centered on a `canvas`, both
/// as `(width, height)`. Negative when the frame is larger.
pub fn centering_offset(canvas: (usize, usize), frame: (usize, usize)) -> (i64, i64) {
    let center = |c: usize, f: usize| (c as i64 - f as i64).div_euclid(2);
    (center(canvas.0, frame.0), center(canvas.1, frame.1))
}

/// Resolve the sample under `pointer`.
///
/// `offset` is where the frame's top-left corner sits on
/// the canvas. Pointers outside the frame, or no frame at
/// all, yield `None`.
pub fn inspect(
    raw: Option<&RawFrame>,
    offset: (i64, i64),
    pointer: (i64, i64),
    unit: DisplayUnit,
    decimals: usize,
) -> Option<PixelReading> {
    let raw = raw?;
    let ix = pointer.0.checked_sub(offset.0)?;
    let iy = pointer.1.checked_sub(offset.1)?;
    if ix < 0 || iy < 0 {
        return None;
    }
    let (x, y) = (ix as usize, iy as usize);
    let value = raw.get(x, y)?;
    Some(PixelReading {
        x,
        y,
        value,
        text: unit.format(value, decimals),
    })
}
