//! Decoding of downloaded chart photos.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, ImageReader};

/// A downloaded photo that decoded successfully as an image.
///
/// The original bytes are kept for upload; decoding only validates them and
/// establishes the format and dimensions.
#[derive(Debug, Clone)]
pub struct ChartImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl ChartImage {
    pub fn decode(bytes: Vec<u8>) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .context("Failed to read image data")?;
        let format = reader
            .format()
            .context("Unrecognized image format")?;
        let decoded = reader.decode().context("Failed to decode image")?;

        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            format,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([20, 160, 80]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}
