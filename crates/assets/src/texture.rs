//! Texture loading.
//!
//! Decodes common image formats into the raw RGBA8 pixel buffer the
//! renderer uploads to a sampled image.

use std::path::Path;

use tracing::info;

use crate::error::{AssetError, AssetResult};

/// A decoded texture: tightly packed RGBA8 pixels and dimensions.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureData {
    /// Loads and decodes a texture file into RGBA8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> AssetResult<Self> {
        let decoded = image::open(path)?.to_rgba8();
        let (width, height) = decoded.dimensions();

        info!("Loaded texture {:?}: {}x{}", path, width, height);

        Ok(Self {
            pixels: decoded.into_raw(),
            width,
            height,
        })
    }

    /// Wraps an existing RGBA8 pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length does not match the dimensions.
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> AssetResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(AssetError::Malformed(format!(
                "pixel buffer is {} bytes, expected {} for {}x{} RGBA",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Size of the pixel buffer in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_accepts_matching_dimensions() {
        let texture = TextureData::from_rgba(vec![255; 2 * 2 * 4], 2, 2).unwrap();
        assert_eq!(texture.width, 2);
        assert_eq!(texture.height, 2);
        assert_eq!(texture.byte_len(), 16);
    }

    #[test]
    fn test_from_rgba_rejects_short_buffer() {
        let result = TextureData::from_rgba(vec![255; 10], 2, 2);
        assert!(matches!(result, Err(AssetError::Malformed(_))));
    }

    #[test]
    fn test_decode_from_memory() {
        // A 1x1 red pixel encoded as PNG
        let mut png = Vec::new();
        {
            use image::{ImageBuffer, Rgba};
            let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
            img.write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageOutputFormat::Png,
            )
            .unwrap();
        }

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        let texture =
            TextureData::from_rgba(decoded.clone().into_raw(), decoded.width(), decoded.height())
                .unwrap();

        assert_eq!(texture.width, 1);
        assert_eq!(texture.height, 1);
        assert_eq!(&texture.pixels, &[255, 0, 0, 255]);
    }
}
