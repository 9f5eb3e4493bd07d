//! Best-effort watermarking of generated images.
//!
//! A missing or unreadable watermark is not an error: [`Watermark::load`]
//! returns `None` and the pipeline carries on with the untouched image.

use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, warn};

use crate::image_client::ImageError;

pub const DEFAULT_OPACITY: f32 = 0.8;
pub const DEFAULT_SCALE: f32 = 0.2;
/// Gap between the watermark and the bottom-right corner, in pixels.
const MARGIN_PX: u32 = 10;

#[derive(Debug, Clone)]
pub struct Watermark {
    mark: RgbaImage,
    opacity: f32,
    scale: f32,
}

impl Watermark {
    /// Loads the watermark image at `path`, or `None` when the path is unset,
    /// missing, or not a decodable image.
    pub fn load(path: Option<&Path>, opacity: f32, scale: f32) -> Option<Self> {
        let path = path?;
        if !path.is_file() {
            warn!("Watermark {} not found; skipping", path.display());
            return None;
        }

        match image::open(path) {
            Ok(img) => {
                debug!("Loaded watermark {}", path.display());
                Some(Self {
                    mark: img.to_rgba8(),
                    opacity: opacity.clamp(0.0, 1.0),
                    scale,
                })
            }
            Err(e) => {
                warn!("Watermark {} is not a valid image ({e}); skipping", path.display());
                None
            }
        }
    }

    /// Composites the watermark onto the bottom-right corner of `image_bytes`
    /// and re-encodes the result as an RGB PNG.
    pub fn apply(&self, image_bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
        let mut base = image::load_from_memory(image_bytes)?.to_rgba8();

        let target_width = ((base.width() as f32) * self.scale).round() as u32;
        let ratio = target_width as f32 / self.mark.width() as f32;
        let target_height = ((self.mark.height() as f32) * ratio).round() as u32;

        if target_width > 0 && target_height > 0 {
            let mut mark = imageops::resize(
                &self.mark,
                target_width,
                target_height,
                FilterType::Lanczos3,
            );

            if self.opacity < 1.0 {
                for pixel in mark.pixels_mut() {
                    pixel[3] = ((pixel[3] as f32) * self.opacity) as u8;
                }
            }

            let x = base.width().saturating_sub(mark.width() + MARGIN_PX);
            let y = base.height().saturating_sub(mark.height() + MARGIN_PX);
            imageops::overlay(&mut base, &mark, i64::from(x), i64::from(y));
        }

        let rgb = DynamicImage::ImageRgba8(base).to_rgb8();
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb).write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbImage};

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn write_mark(dir: &Path, color: [u8; 4]) -> std::path::PathBuf {
        let path = dir.join("mark.png");
        RgbaImage::from_pixel(50, 25, Rgba(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_none_path() {
        assert!(Watermark::load(None, DEFAULT_OPACITY, DEFAULT_SCALE).is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        assert!(Watermark::load(Some(&path), DEFAULT_OPACITY, DEFAULT_SCALE).is_none());
    }

    #[test]
    fn test_load_invalid_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(Watermark::load(Some(&path), DEFAULT_OPACITY, DEFAULT_SCALE).is_none());
    }

    #[test]
    fn test_apply_marks_bottom_right_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mark(dir.path(), [255, 0, 0, 255]);
        let watermark = Watermark::load(Some(&path), 1.0, 0.2).unwrap();

        let out = watermark.apply(&png_bytes(200, 200, [0, 0, 255])).unwrap();
        let result = image::load_from_memory(&out).unwrap().to_rgb8();

        assert_eq!(result.dimensions(), (200, 200));
        // mark is 40x20, placed at (150, 170)
        let marked = result.get_pixel(170, 180);
        assert!(marked[0] > 250 && marked[2] < 5, "got {marked:?}");
        assert_eq!(result.get_pixel(5, 5), &Rgb([0, 0, 255]));
        assert_eq!(result.get_pixel(195, 195), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_apply_blends_with_opacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mark(dir.path(), [255, 255, 255, 255]);
        let watermark = Watermark::load(Some(&path), 0.5, 0.2).unwrap();

        let out = watermark.apply(&png_bytes(200, 200, [0, 0, 0])).unwrap();
        let result = image::load_from_memory(&out).unwrap().to_rgb8();
        let blended = result.get_pixel(170, 180)[0];
        assert!(blended > 100 && blended < 160, "got {blended}");
    }

    #[test]
    fn test_apply_rejects_non_image_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mark(dir.path(), [255, 0, 0, 255]);
        let watermark = Watermark::load(Some(&path), DEFAULT_OPACITY, DEFAULT_SCALE).unwrap();
        assert!(matches!(
            watermark.apply(b"raw bytes"),
            Err(ImageError::Codec(_))
        ));
    }

    #[test]
    fn test_apply_on_tiny_image_skips_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mark(dir.path(), [255, 0, 0, 255]);
        let watermark = Watermark::load(Some(&path), 1.0, 0.2).unwrap();
        let out = watermark.apply(&png_bytes(2, 2, [0, 255, 0])).unwrap();
        let result = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(result.get_pixel(1, 1), &Rgb([0, 255, 0]));
    }
}
