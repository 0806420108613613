use image::ImageFormat;

use crate::domain::error::DomainError;

/// Detects the format from content (not from the client's content type) and
/// decodes the whole image. Returns the file extension to store it under.
pub fn inspect(bytes: &[u8]) -> Result<&'static str, DomainError> {
    if bytes.is_empty() {
        return Err(DomainError::invalid_image("the submitted file is empty"));
    }
    let format = image::guess_format(bytes).map_err(|_| {
        DomainError::invalid_image("the file you uploaded was either not an image or a corrupted image")
    })?;
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DomainError::invalid_image(e.to_string()))?;
    Ok(extension_for(format))
}

fn extension_for(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn png_is_accepted() {
        assert_eq!(inspect(&png_bytes()).unwrap(), "png");
    }

    #[test]
    fn text_is_rejected() {
        let err = inspect(b"notimage").unwrap_err();
        assert!(matches!(err, DomainError::InvalidImage { .. }));
    }

    #[test]
    fn truncated_png_is_rejected() {
        let bytes = png_bytes();
        let err = inspect(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidImage { .. }));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(inspect(&[]).is_err());
    }
}
