use std::{fs::File, io::BufWriter, path::Path};

use anyhow::Result;
use image::{imageops::overlay, Rgb, RgbImage};
use thermal_view::RenderedView;

const GAP: u32 = 10;

/// The frame with its legend bar to the right, both
/// vertically centered on the taller of the two.
pub fn compose(view: &RenderedView, gradient: &RgbImage) -> RgbImage {
    let (fw, fh) = view.image.dimensions();
    let (lw, lh) = gradient.dimensions();
    let height = fh.max(lh);
    let mut canvas = RgbImage::from_pixel(fw + GAP + lw, height, Rgb([0, 0, 0]));
    overlay(&mut canvas, &view.image, 0, (height - fh) / 2);
    overlay(&mut canvas, gradient, fw + GAP, (height - lh) / 2);
    canvas
}

pub fn write_view_png(view: &RenderedView, gradient: &RgbImage, path: &Path) -> Result<()> {
    let image = compose(view, gradient);
    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::RGB);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.write_header()?.write_image_data(image.as_raw())?;
    Ok(())
}
