use std::io::Cursor;
use std::path::Path;

use image::{ImageError, ImageFormat, Rgb, RgbImage};

use super::task::write_atomically;

/// Edge length, in pixels, of the square placeholder image.
pub const PLACEHOLDER_SIZE: u32 = 100;

/// Write a solid black square in place of an image that could not be fetched.
///
/// The encoding follows the destination extension; extensions without an
/// encoder get PNG bytes.
pub fn write_placeholder(path: &Path) -> Result<(), ImageError> {
    let bytes = encode_placeholder(ImageFormat::from_path(path).ok())?;
    write_atomically(path, &bytes).map_err(ImageError::IoError)
}

fn encode_placeholder(format: Option<ImageFormat>) -> Result<Vec<u8>, ImageError> {
    let image = RgbImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Rgb([0, 0, 0]));
    if let Some(format) = format {
        let mut bytes = Vec::new();
        if image.write_to(&mut Cursor::new(&mut bytes), format).is_ok() {
            return Ok(bytes);
        }
    }
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
