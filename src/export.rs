//! Comma-separated text export of a decoded frame.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use itertools::Itertools;
use tracing::info;

use crate::frame::{DisplayUnit, RawFrame};

/// Write `raw` row-major, one comma-separated row per line.
///
/// Counts are written as integers; other units with full
/// precision so that re-importing yields the exact samples.
pub fn write_csv<W: Write>(raw: &RawFrame, mut out: W) -> io::Result<()> {
    let counts = raw.unit() == DisplayUnit::Counts;
    for row in raw.data().rows() {
        let line = row
            .iter()
            .map(|v| {
                if counts {
                    format!("{:.0}", v)
                } else {
                    v.to_string()
                }
            })
            .join(",");
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

pub fn export_csv(raw: &RawFrame, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(raw, BufWriter::new(file))?;
    info!(
        path = %path.display(),
        width = raw.width(),
        height = raw.height(),
        "exported frame"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn counts_as_integers() -> Result<()> {
        let raw = RawFrame::from_rows(&[&[10., 20.], &[30., 40.]], DisplayUnit::Counts)?;
        let mut out = vec![];
        write_csv(&raw, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "10,20\n30,40\n");
        Ok(())
    }

    #[test]
    fn temperatures_keep_precision() -> Result<()> {
        let raw = RawFrame::from_rows(&[&[21.5, -3.25, 0.125]], DisplayUnit::Temperature)?;
        let mut out = vec![];
        write_csv(&raw, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "21.5,-3.25,0.125\n");
        Ok(())
    }

    #[test]
    fn unwritable_destination() -> Result<()> {
        let raw = RawFrame::from_rows(&[&[1.]], DisplayUnit::Counts)?;
        let dir = std::env::temp_dir();
        assert!(export_csv(&raw, &dir).is_err());
        Ok(())
    }
}
