//! Image encoding: `DynamicImage` → TIFF bytes carrying the render DPI.
//!
//! `image`'s own TIFF writer has no way to set resolution tags, so pages are
//! written through the `tiff` encoder directly. XResolution and YResolution
//! are both `dpi/1` with ResolutionUnit = inch, which is what scanners, OCR
//! engines and print pipelines read back to recover physical page size.

use crate::config::ColorMode;
use image::DynamicImage;
use std::io::Cursor;
use tiff::encoder::{colortype, Rational, TiffEncoder};
use tiff::tags::ResolutionUnit;
use tracing::debug;

/// Encode a rendered page as an uncompressed TIFF at `dpi`.
///
/// The image is converted to the requested colour mode first, so a colour
/// render written as [`ColorMode::Grayscale`] becomes 8-bit gray.
pub fn encode_tiff(
    img: &DynamicImage,
    dpi: u32,
    color_mode: ColorMode,
) -> Result<Vec<u8>, tiff::TiffError> {
    let mut buf = Vec::new();
    let resolution = Rational { n: dpi, d: 1 };

    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buf))?;
        match color_mode {
            ColorMode::Grayscale => {
                let gray = img.to_luma8();
                let mut image =
                    encoder.new_image::<colortype::Gray8>(gray.width(), gray.height())?;
                image.resolution(ResolutionUnit::Inch, resolution);
                image.write_data(gray.as_raw())?;
            }
            ColorMode::Rgb => {
                let rgb = img.to_rgb8();
                let mut image = encoder.new_image::<colortype::RGB8>(rgb.width(), rgb.height())?;
                image.resolution(ResolutionUnit::Inch, resolution);
                image.write_data(rgb.as_raw())?;
            }
        }
    }

    debug!(
        "Encoded {}x{} TIFF at {} DPI → {} bytes",
        img.width(),
        img.height(),
        dpi,
        buf.len()
    );
    Ok(buf)
}
