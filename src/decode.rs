// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use image::{DynamicImage, ImageReader, ImageResult};
use std::path::Path;

/// RGBA8 pixels with rows stored bottom to top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Flips `image` vertically and converts it to 4 channels of 8 bits.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }
}

/// Decodes the file at `path`, picking the format from its contents rather
/// than its extension.
pub fn decode_file(path: &Path) -> ImageResult<DecodedImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(DecodedImage::from_image(&image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_decode_flips_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stripe.png");
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 255, 128]));
        image.save(&path).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (1, 2));
        assert_eq!(decoded.pixels, vec![0, 0, 255, 128, 255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_expands_to_rgba() {
        let image = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(2, 1, image::Luma([7])));
        let decoded = DecodedImage::from_image(&image);
        assert_eq!(decoded.pixels, vec![7, 7, 7, 255, 7, 7, 7, 255]);
    }

    #[test]
    fn test_decode_ignores_file_extension() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("sprite.png");
        RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 4])).save(&png).unwrap();
        let bare = dir.path().join("sprite");
        let mislabelled = dir.path().join("sprite.tex");
        std::fs::copy(&png, &bare).unwrap();
        std::fs::copy(&png, &mislabelled).unwrap();

        for path in [bare, mislabelled] {
            let decoded = decode_file(&path).unwrap();
            assert_eq!((decoded.width, decoded.height), (4, 2));
            assert_eq!(&decoded.pixels[..4], &[1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_decode_rejects_non_image_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(decode_file(&path).is_err());
    }

    #[test]
    fn test_decode_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(decode_file(&dir.path().join("missing.png")).is_err());
    }
}
