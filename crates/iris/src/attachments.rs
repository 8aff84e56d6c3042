//! Client-side image preparation.
//!
//! Every attached image is re-encoded to JPEG and sent inline as a data URI. Transparent
//! pixels are flattened onto a white background first, since JPEG has no alpha channel.
use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, Rgb, RgbImage};

use crate::errors::ImageError;

pub const JPEG_QUALITY: u8 = 90;
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Re-encode image bytes of any supported format as a JPEG data URI
pub fn encode_jpeg_data_uri(data: &[u8]) -> Result<String, ImageError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;

    let rgba = img.to_rgba8();
    let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let over_white =
            |channel: u8| ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    });

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(&flattened)?;

    Ok(format!("{}{}", JPEG_DATA_URI_PREFIX, STANDARD.encode(&buf)))
}

pub fn load_jpeg_data_uri(path: &Path) -> Result<String, ImageError> {
    let data = std::fs::read(path)?;
    encode_jpeg_data_uri(&data)
}
