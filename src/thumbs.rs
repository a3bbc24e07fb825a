//! Media Vault - Thumbnail Engine
//!
//! Derives compact encrypted-at-rest previews. Photo previews target 1/10 of
//! each original linear dimension; video-frame previews target 1/4, since a
//! video thumbnail stands in for a first frame and needs more detail.
//! Previews are JPEG-compressed, never raw pixels, to bound metadata growth.

use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};

use crate::error::VaultResult;
use crate::vault::MediaKind;

/// Photo previews shrink each linear dimension by this factor
pub const PHOTO_DIVISOR: u32 = 10;

/// Video-frame previews shrink each linear dimension by this factor
pub const VIDEO_FRAME_DIVISOR: u32 = 4;

/// Thumbnail Engine
#[derive(Clone, Copy, Default)]
pub struct ThumbnailEngine;

impl ThumbnailEngine {
    pub fn new() -> Self {
        Self
    }

    /// Derive a preview for a decoded image or video frame. Audio and notes
    /// have no visual preview.
    pub fn generate(&self, kind: MediaKind, decoded: &[u8]) -> VaultResult<Option<Vec<u8>>> {
        let divisor = match kind {
            MediaKind::Photo => PHOTO_DIVISOR,
            MediaKind::Video => VIDEO_FRAME_DIVISOR,
            MediaKind::Audio | MediaKind::Note => return Ok(None),
        };

        let img = image::load_from_memory(decoded)?;
        let preview = self.scale_down(&img, divisor);

        let mut out = Vec::new();
        preview.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)?;
        Ok(Some(out))
    }

    /// Scale both dimensions by `1/divisor`, rounding, never below 1px.
    fn scale_down(&self, img: &DynamicImage, divisor: u32) -> DynamicImage {
        let (width, height) = img.dimensions();
        let w = ((width as f32 / divisor as f32).round() as u32).max(1);
        let h = ((height as f32 / divisor as f32).round() as u32).max(1);
        img.resize_exact(w, h, FilterType::Lanczos3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_of(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_photo_preview_is_one_tenth() {
        let engine = ThumbnailEngine::new();
        let thumb = engine
            .generate(MediaKind::Photo, &png_of(800, 600))
            .unwrap()
            .unwrap();

        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (80, 60));
    }

    #[test]
    fn test_video_frame_preview_is_one_quarter() {
        let engine = ThumbnailEngine::new();
        let thumb = engine
            .generate(MediaKind::Video, &png_of(800, 600))
            .unwrap()
            .unwrap();

        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (200, 150));
    }

    #[test]
    fn test_odd_dimensions_round_within_one_pixel() {
        let engine = ThumbnailEngine::new();
        let thumb = engine
            .generate(MediaKind::Photo, &png_of(805, 595))
            .unwrap()
            .unwrap();

        let (w, h) = image::load_from_memory(&thumb).unwrap().dimensions();
        assert!((w as i64 - 80).abs() <= 1, "width {w}");
        assert!((h as i64 - 60).abs() <= 1, "height {h}");
    }

    #[test]
    fn test_tiny_source_never_collapses_to_zero() {
        let engine = ThumbnailEngine::new();
        let thumb = engine
            .generate(MediaKind::Photo, &png_of(4, 3))
            .unwrap()
            .unwrap();

        let (w, h) = image::load_from_memory(&thumb).unwrap().dimensions();
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn test_audio_and_notes_have_no_preview() {
        let engine = ThumbnailEngine::new();
        assert!(engine.generate(MediaKind::Audio, b"pcm").unwrap().is_none());
        assert!(engine.generate(MediaKind::Note, b"text").unwrap().is_none());
    }

    #[test]
    fn test_undecodable_image_is_an_error() {
        let engine = ThumbnailEngine::new();
        assert!(engine.generate(MediaKind::Photo, b"not an image").is_err());
    }
}
