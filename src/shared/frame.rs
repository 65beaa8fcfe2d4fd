// This is free and unencumbered software released into the public domain.

use crate::shared::CameraError;
use image::DynamicImage;
use std::time::{SystemTime, UNIX_EPOCH};

/// A decoded viewfinder frame, mirrored left-right for display.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub image: DynamicImage,
    pub timestamp_ns: u64,
}

impl Frame {
    /// Decodes an encoded preview (typically JPEG) and mirrors it left-right.
    pub fn decode_preview(data: &[u8]) -> Result<Self, CameraError> {
        let image = image::load_from_memory(data)
            .map_err(|e| CameraError::driver("decoding preview frame", e))?;
        Ok(Self {
            image: image.fliph(),
            timestamp_ns: now_ns_best_effort(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[inline]
fn now_ns_best_effort() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(image: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn preview_is_mirrored_left_right() {
        let mut source = RgbImage::new(2, 1);
        source.put_pixel(0, 0, Rgb([255, 0, 0]));
        source.put_pixel(1, 0, Rgb([0, 0, 255]));

        let frame = Frame::decode_preview(&png(&source)).unwrap();
        let rgb = frame.image.to_rgb8();
        assert_eq!((frame.width(), frame.height()), (2, 1));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = Frame::decode_preview(b"not an image").unwrap_err();
        assert!(matches!(err, CameraError::DriverError { .. }));
    }
}
