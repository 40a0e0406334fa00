use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

use crate::session::DepthImage;

pub const PREVIEW_WIDTH: u32 = 320;
pub const PREVIEW_HEIGHT: u32 = 240;

/// Preview surface for the color stream: smooth resample down to the
/// fixed preview size.
pub fn color_preview(frame: &RgbImage) -> RgbImage {
    imageops::resize(frame, PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Triangle)
}

/// Preview surface for the depth stream. Nearest-neighbour resize so raw
/// samples pass through unfiltered, then normalized to the frame's
/// observed min/max for display: close-range sensors occupy a narrow
/// slice of the 16-bit range and would render near-black otherwise.
/// Display-only; saved depth files keep the raw samples.
pub fn depth_preview(frame: &DepthImage) -> GrayImage {
    let resized = imageops::resize(frame, PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Nearest);

    let (mut min, mut max) = (u16::MAX, u16::MIN);
    for p in resized.pixels() {
        min = min.min(p.0[0]);
        max = max.max(p.0[0]);
    }
    let span = u32::from(max.saturating_sub(min)).max(1);

    let mut gray = GrayImage::new(PREVIEW_WIDTH, PREVIEW_HEIGHT);
    for (dst, src) in gray.pixels_mut().zip(resized.pixels()) {
        dst.0[0] = (u32::from(src.0[0] - min) * 255 / span) as u8;
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_previews_are_fixed_size() {
        let color = RgbImage::new(640, 480);
        let depth = DepthImage::new(640, 480);

        let color_out = color_preview(&color);
        let depth_out = depth_preview(&depth);

        assert_eq!(color_out.dimensions(), (PREVIEW_WIDTH, PREVIEW_HEIGHT));
        assert_eq!(depth_out.dimensions(), (PREVIEW_WIDTH, PREVIEW_HEIGHT));
    }

    #[test]
    fn test_uniform_color_stays_uniform_through_resample() {
        let color = RgbImage::from_pixel(640, 480, Rgb([120, 40, 200]));
        let out = color_preview(&color);
        assert!(out.pixels().all(|p| *p == Rgb([120, 40, 200])));
    }

    #[test]
    fn test_close_range_depth_spans_full_gray_range() {
        // Two plausible millimetre values; nearest resize must only pick
        // existing samples, and normalization must stretch them to the
        // full display range instead of leaving both near-black
        let depth = DepthImage::from_fn(64, 48, |x, _| {
            image::Luma([if x < 32 { 1000 } else { 3000 }])
        });
        let out = depth_preview(&depth);

        let values: std::collections::HashSet<u8> = out.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, [0u8, 255].into_iter().collect());
    }

    #[test]
    fn test_flat_depth_frame_renders_uniformly() {
        let depth = DepthImage::from_pixel(8, 8, image::Luma([0x1234]));
        let out = depth_preview(&depth);
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_nearer_samples_render_darker() {
        let depth = DepthImage::from_fn(64, 48, |x, _| image::Luma([300 + x as u16 * 60]));
        let out = depth_preview(&depth);

        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(PREVIEW_WIDTH - 1, 0).0[0], 255);
        let mid = out.get_pixel(PREVIEW_WIDTH / 2, 0).0[0];
        assert!(mid > 0 && mid < 255);
    }
}
