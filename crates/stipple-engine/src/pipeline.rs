//! Background sampling pipeline.
//!
//! Each request runs on its own short-lived thread and reports back over a
//! channel. Deliveries carry the generation they were issued under so the
//! engine can discard results that a newer transition has overtaken.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use image::RgbaImage;
use stipple_sampler::{load_bitmap, SampledImage, Sampler};

/// A resolved sampling request: width and gap already defaulted and capped.
#[derive(Debug, Clone)]
pub struct SampleRequest {
    pub source: String,
    pub target_width: u32,
    pub gap: f32,
}

/// Result of one sampling run, tagged with its generation.
pub struct SampleDelivery {
    pub generation: u64,
    pub source: String,
    pub image: Arc<SampledImage>,
    /// Decoded bitmap for the fallback view, when one is needed and available.
    pub bitmap: Option<Arc<RgbaImage>>,
}

pub struct SampleWorker {
    sampler: Sampler,
    tx: Sender<SampleDelivery>,
    rx: Receiver<SampleDelivery>,
}

impl SampleWorker {
    pub fn new(sampler: Sampler) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { sampler, tx, rx }
    }

    /// Kick off a sampling run in the background. The delivery lands on the
    /// worker channel; a dropped engine just drops the channel and the
    /// thread's send becomes a no-op.
    pub fn submit(&self, generation: u64, request: SampleRequest) {
        let sampler = self.sampler.clone();
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("stipple-sample-{generation}"))
            .spawn(move || {
                let delivery = run_request(&sampler, generation, request);
                let _ = tx.send(delivery);
            });
        if let Err(err) = spawned {
            eprintln!("[pipeline] failed to spawn sample thread: {err}");
        }
    }

    /// Run a request on the calling thread and hand back the delivery.
    pub fn sample_blocking(&self, generation: u64, request: SampleRequest) -> SampleDelivery {
        run_request(&self.sampler, generation, request)
    }

    pub fn try_recv(&self) -> Option<SampleDelivery> {
        self.rx.try_recv().ok()
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler {
        &mut self.sampler
    }
}

fn run_request(sampler: &Sampler, generation: u64, request: SampleRequest) -> SampleDelivery {
    let outcome = sampler.sample_with_bitmap(&request.source, request.target_width, request.gap);
    let image = outcome.image;

    // Provision the fallback bitmap. Draw failures keep the bitmap that was
    // already decoded; a cached zero-point result arrives without one, so it
    // is reloaded here. Load failures get nothing (no second attempt).
    let bitmap = if image.needs_fallback() && image.error.is_none() {
        outcome
            .bitmap
            .or_else(|| load_bitmap(&request.source).ok().map(Arc::new))
    } else if image.needs_fallback() {
        outcome.bitmap
    } else {
        None
    };

    SampleDelivery {
        generation,
        source: request.source,
        image,
        bitmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stipple_sampler::SampleCache;

    fn checker_png(dir: &std::path::Path, name: &str) -> String {
        let mut img = RgbaImage::new(16, 16);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let on = (x / 4 + y / 4) % 2 == 0;
            *pixel = if on {
                image::Rgba([220, 40, 40, 255])
            } else {
                image::Rgba([0, 0, 0, 0])
            };
        }
        let path = dir.join(name);
        img.save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("stipple_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn background_delivery_arrives_tagged() {
        let dir = temp_dir();
        let source = checker_png(&dir, "checker.png");

        let worker = SampleWorker::new(Sampler::new(SampleCache::new()));
        worker.submit(
            7,
            SampleRequest {
                source: source.clone(),
                target_width: 16,
                gap: 4.0,
            },
        );

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let delivery = loop {
            if let Some(delivery) = worker.try_recv() {
                break delivery;
            }
            assert!(std::time::Instant::now() < deadline, "delivery never arrived");
            std::thread::sleep(std::time::Duration::from_millis(5));
        };

        assert_eq!(delivery.generation, 7);
        assert_eq!(delivery.source, source);
        assert!(!delivery.image.points.is_empty());
        assert!(delivery.bitmap.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_failure_delivers_without_bitmap() {
        let worker = SampleWorker::new(Sampler::new(SampleCache::new()));
        let delivery = worker.sample_blocking(
            1,
            SampleRequest {
                source: "/no/such/image.png".into(),
                target_width: 100,
                gap: 6.0,
            },
        );
        assert!(delivery.image.needs_fallback());
        assert!(delivery.image.error.is_some());
        assert!(delivery.bitmap.is_none());
    }

    #[test]
    fn transparent_image_reloads_bitmap_on_cache_hit() {
        let dir = temp_dir();
        let path = dir.join("clear.png");
        RgbaImage::from_pixel(12, 12, image::Rgba([0, 0, 0, 0]))
            .save(&path)
            .unwrap();
        let source = path.to_string_lossy().into_owned();

        let worker = SampleWorker::new(Sampler::new(SampleCache::new()));

        // First run decodes the bitmap and caches the empty result.
        let first = worker.sample_blocking(
            1,
            SampleRequest {
                source: source.clone(),
                target_width: 12,
                gap: 4.0,
            },
        );
        assert!(first.image.needs_fallback());
        assert!(first.bitmap.is_some());

        // Second run hits the cache; the bitmap is reloaded for the fallback.
        let second = worker.sample_blocking(
            2,
            SampleRequest {
                source: source.clone(),
                target_width: 12,
                gap: 4.0,
            },
        );
        assert!(second.image.needs_fallback());
        assert!(second.bitmap.is_some());

        std::fs::remove_dir_all(&dir).ok();
    }
}
