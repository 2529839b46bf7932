//! Per-frame auto-scaling of samples to 8-bit palette
//! indices.

use ndarray::Array2;
use tracing::debug;

use crate::frame::{FrameStats, RawFrame};

/// 8-bit palette indices, same shape as the frame they
/// were computed from.
pub type IndexFrame = Array2<u8>;

/// Scale a frame linearly so that its minimum maps to 0
/// and its maximum to 255.
///
/// A flat frame (every sample equal) maps to all zeros.
pub fn normalize(raw: &RawFrame) -> IndexFrame {
    normalize_with_stats(raw).0
}

/// Same as [`normalize`], also returning the extremes the
/// scaling used.
pub fn normalize_with_stats(raw: &RawFrame) -> (IndexFrame, FrameStats) {
    let stats = raw.stats();
    (scale(raw.data(), stats), stats)
}

pub(crate) fn scale(data: &Array2<f64>, stats: FrameStats) -> IndexFrame {
    if stats.is_flat() {
        debug!(value = stats.min, "flat frame, using zero indices");
        return Array2::zeros(data.raw_dim());
    }
    // Spans wider than f64::MAX are scaled down by half first.
    let k = if stats.span().is_finite() { 1. } else { 0.5 };
    let lo = stats.min * k;
    let factor = 255. / (stats.max * k - lo);
    data.mapv(|s| ((s * k - lo) * factor).round().max(0.).min(255.) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DisplayUnit;
    use anyhow::Result;
    use ndarray::array;

    #[test]
    fn two_by_two_scales_linearly() -> Result<()> {
        let frame = RawFrame::from_rows(&[&[10., 20.], &[30., 40.]], DisplayUnit::Counts)?;
        let (indices, stats) = normalize_with_stats(&frame);
        assert_eq!(indices, array![[0u8, 85], [170, 255]]);
        assert_eq!(stats, FrameStats { min: 10., max: 40. });
        Ok(())
    }

    #[test]
    fn extremes_hit_both_ends() -> Result<()> {
        let frame = RawFrame::from_rows(
            &[&[-12.5, 3.25, 7.0], &[0.1, 99.9, -0.5]],
            DisplayUnit::Temperature,
        )?;
        let indices = normalize(&frame);
        assert_eq!(indices[(0, 0)], 0);
        assert_eq!(indices[(1, 1)], 255);
        // (0.1 + 12.5) / 112.4 * 255 = 28.58
        assert_eq!(indices[(1, 0)], 29);
        Ok(())
    }

    #[test]
    fn huge_span_still_reaches_both_ends() -> Result<()> {
        let frame = RawFrame::from_rows(&[&[-1e308, 0., 1e308]], DisplayUnit::Radiance)?;
        let indices = normalize(&frame);
        assert_eq!(indices[(0, 0)], 0);
        assert_eq!(indices[(0, 2)], 255);
        assert!((127..=128).contains(&indices[(0, 1)]));
        Ok(())
    }

    #[test]
    fn flat_frame_is_zero() -> Result<()> {
        let frame = RawFrame::from_rows(&[&[5.; 4], &[5.; 4], &[5.; 4]], DisplayUnit::Counts)?;
        let indices = normalize(&frame);
        assert_eq!(indices.dim(), (3, 4));
        assert!(indices.iter().all(|&i| i == 0));
        Ok(())
    }

    #[test]
    fn empty_frame_does_not_panic() -> Result<()> {
        let frame = RawFrame::new(Array2::zeros((0, 0)), DisplayUnit::Counts)?;
        assert_eq!(normalize(&frame).len(), 0);
        Ok(())
    }
}
