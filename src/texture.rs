use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use image::{GrayImage, RgbImage};

use crate::ui::CaptureApp;

impl CaptureApp {
    pub fn update_color_texture(&mut self, ctx: &Context, image: &RgbImage) {
        // Skip invalid frames to prevent a white flash in the pane
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image.as_flat_samples();
        let color_image = ColorImage::from_rgb(size, pixels.as_slice());

        set_or_create(ctx, &mut self.color_texture, "color_preview", color_image);
    }

    pub fn update_depth_texture(&mut self, ctx: &Context, image: &GrayImage) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image
            .pixels()
            .map(|p| egui::Color32::from_gray(p.0[0]))
            .collect();
        let color_image = ColorImage { size, pixels };

        set_or_create(ctx, &mut self.depth_texture, "depth_preview", color_image);
    }
}

/// Reuse the existing texture when the size matches - recreating every
/// frame churns GPU memory at 30 FPS.
fn set_or_create(
    ctx: &Context,
    slot: &mut Option<TextureHandle>,
    name: &str,
    image: ColorImage,
) {
    match slot {
        Some(texture) if texture.size() == image.size => {
            texture.set(image, TextureOptions::NEAREST);
        }
        _ => {
            *slot = Some(ctx.load_texture(name, image, TextureOptions::NEAREST));
        }
    }
}
