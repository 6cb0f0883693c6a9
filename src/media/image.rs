use crate::domain::PreparedImage;
use image::ImageFormat;
use std::io::Cursor;

/// Photo footprint inside the "Property Photo" cell, in pixels.
pub const MAX_WIDTH: u32 = 160;
pub const MAX_HEIGHT: u32 = 120;

/// Decodes downloaded bytes and shrinks them to fit the photo cell.
/// The error string says why the bytes are not a usable picture.
pub fn prepare_image(bytes: &[u8]) -> Result<PreparedImage, String> {
    let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;

    let fitted = if decoded.width() > MAX_WIDTH || decoded.height() > MAX_HEIGHT {
        decoded.thumbnail(MAX_WIDTH, MAX_HEIGHT)
    } else {
        decoded
    };

    let mut png = Vec::new();
    fitted
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(PreparedImage {
        png,
        width: fitted.width(),
        height: fitted.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut out = Vec::new();
        RgbImage::from_pixel(width, height, Rgb([10, 120, 60]))
            .write_to(&mut Cursor::new(&mut out), format)
            .unwrap();
        out
    }

    #[test]
    fn large_photos_shrink_keeping_aspect() {
        let img = prepare_image(&encoded(800, 400, ImageFormat::Jpeg)).unwrap();
        assert_eq!((img.width, img.height), (160, 80));
        assert!(image::load_from_memory(&img.png).is_ok());
    }

    #[test]
    fn small_photos_keep_their_size() {
        let img = prepare_image(&encoded(40, 30, ImageFormat::Png)).unwrap();
        assert_eq!((img.width, img.height), (40, 30));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(prepare_image(b"<html>not an image</html>").is_err());
    }
}
