//! Grid sampling: bitmap in, sparse colored point cloud out

use crate::bitmap::{load_bitmap, resize_to_grid};
use crate::cache::{SampleCache, SampleKey};
use crate::types::{ColorBoost, SampleError, SampledImage};
use image::RgbaImage;
use std::sync::Arc;
use stipple_core::SamplePoint;

/// Pixels at or below this alpha are treated as background and skipped
const ALPHA_CUTOFF: u8 = 100;

/// Samples bitmaps into point clouds, caching results per (source, width bucket, gap).
/// Cloning is cheap and shares the cache.
#[derive(Clone)]
pub struct Sampler {
    cache: SampleCache,
    boost: Option<ColorBoost>,
}

/// A sample plus the decoded source bitmap when it was freshly loaded.
/// The bitmap backs the fallback path for empty or draw-failed samples.
pub struct SampleOutcome {
    pub image: Arc<SampledImage>,
    pub bitmap: Option<Arc<RgbaImage>>,
}

impl Sampler {
    pub fn new(cache: SampleCache) -> Self {
        Self { cache, boost: None }
    }

    pub fn with_boost(mut self, boost: ColorBoost) -> Self {
        if !boost.is_identity() {
            self.boost = Some(boost);
        }
        self
    }

    /// Swap the boost in place. Identity boosts clear it.
    pub fn set_boost(&mut self, boost: Option<ColorBoost>) {
        self.boost = boost.filter(|b| !b.is_identity());
    }

    pub fn cache(&self) -> &SampleCache {
        &self.cache
    }

    /// Sample `source` at the given display width and gap, reusing the cache.
    /// Never fails: load and draw problems come back as an error-flagged result.
    pub fn prefetch(&self, source: &str, target_width: u32, gap: f32) -> Arc<SampledImage> {
        self.sample_with_bitmap(source, target_width, gap).image
    }

    /// Like `prefetch`, but hands back the decoded bitmap on a fresh load
    pub fn sample_with_bitmap(&self, source: &str, target_width: u32, gap: f32) -> SampleOutcome {
        let key = SampleKey::new(source, target_width, gap);
        if let Some(hit) = self.cache.get(&key) {
            return SampleOutcome {
                image: hit,
                bitmap: None,
            };
        }

        let bitmap = match load_bitmap(source) {
            Ok(b) => Arc::new(b),
            Err(e) => {
                eprintln!("[sampler] {}", e);
                return SampleOutcome {
                    image: Arc::new(SampledImage::failed(e)),
                    bitmap: None,
                };
            }
        };

        let image = match resize_to_grid(&bitmap, target_width) {
            Ok(grid) => Arc::new(self.sample_grid(&grid, gap)),
            Err(e) => {
                eprintln!("[sampler] {}", e);
                // Draw failures are not cached; keep the bitmap for fallback display
                return SampleOutcome {
                    image: Arc::new(SampledImage::failed(e)),
                    bitmap: Some(bitmap),
                };
            }
        };

        self.cache.insert(key, Arc::clone(&image));
        SampleOutcome {
            image,
            bitmap: Some(bitmap),
        }
    }

    /// Walk an already-scaled grid bitmap, emitting one point per grid cell
    /// whose pixel clears the alpha cutoff. The point sits at the cell center;
    /// the color is read at the cell's top-left pixel. Deterministic for a
    /// given bitmap, gap, and boost.
    pub fn sample_grid(&self, grid: &RgbaImage, gap: f32) -> SampledImage {
        let (width, height) = grid.dimensions();
        // A non-positive gap would never advance the walk
        let gap = gap.max(0.1);
        let offset = gap / 2.0;

        let mut points = Vec::new();
        let mut y = 0.0f32;
        while y < height as f32 {
            let mut x = 0.0f32;
            while x < width as f32 {
                let px = grid.get_pixel(x as u32, y as u32);
                if px[3] > ALPHA_CUTOFF {
                    let (r, g, b) = self.boost_rgb(px[0], px[1], px[2]);
                    points.push(SamplePoint {
                        u: (x + offset) / width as f32,
                        v: (y + offset) / height as f32,
                        r,
                        g,
                        b,
                    });
                }
                x += gap;
            }
            y += gap;
        }

        SampledImage {
            width,
            height,
            points,
            error: None,
        }
    }

    fn boost_rgb(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        match self.boost {
            Some(boost) => (boost.apply(r), boost.apply(g), boost.apply(b)),
            None => (r, g, b),
        }
    }
}
