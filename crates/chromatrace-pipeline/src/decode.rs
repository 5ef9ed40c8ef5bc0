//! Image decoding.
//!
//! Accepts raw uploaded bytes (PNG, JPEG, BMP, WebP, GIF) and produces
//! the RGBA pixel buffer every later step works on.

use image::RgbaImage;

use crate::types::PipelineError;

/// Decode raw image bytes into an 8-bit RGBA buffer.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[must_use = "returns the decoded image"]
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
///
/// Used to hand masks to consumers that expect an encoded image
/// (blob URLs in the browser, files from the CLI).
///
/// # Errors
///
/// Returns [`PipelineError::ImageDecode`] if the encoder rejects the
/// buffer.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}
