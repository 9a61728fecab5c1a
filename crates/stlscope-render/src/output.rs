//! Image encoding and saving

use std::path::Path;

use image::{ImageEncoder, ImageFormat, RgbaImage};

use crate::Result;

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}

/// Save an image, choosing the encoder from the file extension
///
/// Formats without an alpha channel (JPEG, BMP) get the RGB channels only.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let format = ImageFormat::from_path(path)?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Bmp => {
            let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            rgb.save_with_format(path, format)?;
        }
        _ => image.save_with_format(path, format)?,
    }
    Ok(())
}
