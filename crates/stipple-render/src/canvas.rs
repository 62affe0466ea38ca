//! CPU pixel canvas: clear, alpha-blended circles, scaled blits, PNG export

use image::RgbaImage;
use std::path::Path;
use stipple_core::{Color, Rect};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid canvas dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
}

/// An RGBA8 surface drawn entirely on the CPU.
///
/// The particle engine paints into this each frame; a windowed presenter
/// packs it into its framebuffer, and the headless path saves it as PNG.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions(width, height));
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Fill the whole canvas with one opaque color
    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Draw a filled circle, source-over blended with `alpha` in [0, 1]
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, rgb: [u8; 3], alpha: f32) {
        if alpha <= 0.0 || radius <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);

        let x0 = ((cx - radius).floor().max(0.0)) as u32;
        let y0 = ((cy - radius).floor().max(0.0)) as u32;
        let x1 = ((cx + radius).ceil().min(self.width as f32 - 1.0)).max(0.0) as u32;
        let y1 = ((cy + radius).ceil().min(self.height as f32 - 1.0)).max(0.0) as u32;
        if (cx + radius) < 0.0 || (cy + radius) < 0.0 {
            return;
        }

        let r_sq = radius * radius;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r_sq {
                    self.blend_pixel(px, py, rgb, alpha);
                }
            }
        }
    }

    /// Scale `bitmap` to `dest` with nearest sampling, blending source alpha.
    /// Pixels falling outside the canvas are clipped.
    pub fn blit_scaled(&mut self, bitmap: &RgbaImage, dest: Rect) {
        let (bw, bh) = bitmap.dimensions();
        if bw == 0 || bh == 0 || dest.w <= 0.0 || dest.h <= 0.0 {
            return;
        }

        let x0 = dest.x.floor().max(0.0) as u32;
        let y0 = dest.y.floor().max(0.0) as u32;
        let x1 = ((dest.x + dest.w).ceil().min(self.width as f32)).max(0.0) as u32;
        let y1 = ((dest.y + dest.h).ceil().min(self.height as f32)).max(0.0) as u32;

        for py in y0..y1 {
            let v = (py as f32 + 0.5 - dest.y) / dest.h;
            let sy = ((v * bh as f32) as u32).min(bh - 1);
            for px in x0..x1 {
                let u = (px as f32 + 0.5 - dest.x) / dest.w;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let sx = ((u * bw as f32) as u32).min(bw - 1);
                let src = bitmap.get_pixel(sx, sy).0;
                self.blend_pixel(px, py, [src[0], src[1], src[2]], src[3] as f32 / 255.0);
            }
        }
    }

    /// Outline a rectangle with a solid border, clipped to the canvas
    pub fn stroke_rect(&mut self, rect: Rect, rgb: [u8; 3], thickness: u32) {
        let t = thickness as f32;
        let bands = [
            Rect::new(rect.x, rect.y, rect.w, t),
            Rect::new(rect.x, rect.y + rect.h - t, rect.w, t),
            Rect::new(rect.x, rect.y, t, rect.h),
            Rect::new(rect.x + rect.w - t, rect.y, t, rect.h),
        ];
        for band in bands {
            let x0 = band.x.floor().max(0.0) as u32;
            let y0 = band.y.floor().max(0.0) as u32;
            let x1 = ((band.x + band.w).ceil().min(self.width as f32)).max(0.0) as u32;
            let y1 = ((band.y + band.h).ceil().min(self.height as f32)).max(0.0) as u32;
            for py in y0..y1 {
                for px in x0..x1 {
                    self.blend_pixel(px, py, rgb, 1.0);
                }
            }
        }
    }

    /// Pack the canvas as 0RGB words for a softbuffer framebuffer.
    /// `out` must hold exactly width * height words.
    pub fn pack_0rgb(&self, out: &mut [u32]) {
        for (word, px) in out.iter_mut().zip(self.pixels.chunks_exact(4)) {
            *word = ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | (px[2] as u32);
        }
    }

    /// Write the canvas to a PNG file
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let img = RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| RenderError::EncodeFailed("pixel buffer size mismatch".to_string()))?;
        img.save(path.as_ref())
            .map_err(|e| RenderError::EncodeFailed(e.to_string()))
    }

    fn blend_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3], alpha: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let inv = 1.0 - alpha;
        let dst = &mut self.pixels[idx..idx + 4];
        dst[0] = (rgb[0] as f32 * alpha + dst[0] as f32 * inv) as u8;
        dst[1] = (rgb[1] as f32 * alpha + dst[1] as f32 * inv) as u8;
        dst[2] = (rgb[2] as f32 * alpha + dst[2] as f32 * inv) as u8;
        dst[3] = (255.0 * alpha + dst[3] as f32 * inv) as u8;
    }
}
