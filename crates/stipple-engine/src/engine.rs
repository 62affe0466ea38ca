//! The transition engine: owns the swarm, drives sampling, paints frames.

use std::sync::Arc;

use image::RgbaImage;
use stipple_core::{Rect, Vec2};
use stipple_render::Canvas;
use stipple_runtime::PointerState;
use stipple_sampler::{ColorBoost, SampleCache, Sampler};
use stipple_sim::{FrameInput, Swarm, SwarmRng};

use crate::config::EngineConfig;
use crate::events::EngineEvent;
use crate::pipeline::{SampleDelivery, SampleRequest, SampleWorker};

const DEFAULT_SEED: u32 = 0x9E37_79B9;
const MIN_SAMPLE_WIDTH: u32 = 10;
const PLACEHOLDER_RGB: [u8; 3] = [70, 70, 70];
const PLACEHOLDER_THICKNESS: u32 = 2;

/// One transition target. Unset fields fall back to the engine config.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub source: String,
    pub display_width: Option<f32>,
    pub gap: Option<f32>,
    pub dot_radius: Option<f32>,
    pub boost: Option<ColorBoost>,
}

impl ImageRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            display_width: None,
            gap: None,
            dot_radius: None,
            boost: None,
        }
    }

    pub fn with_display_width(mut self, width: f32) -> Self {
        self.display_width = Some(width);
        self
    }

    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = Some(gap);
        self
    }

    pub fn with_dot_radius(mut self, radius: f32) -> Self {
        self.dot_radius = Some(radius);
        self
    }

    pub fn with_boost(mut self, boost: ColorBoost) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// Bitmap (or placeholder) shown when an image yields no particles.
pub struct FallbackView {
    pub source: String,
    pub bitmap: Option<Arc<RgbaImage>>,
}

/// Orchestrates the image-to-swarm pipeline.
///
/// The engine never blocks a frame on sampling: [`request`](Self::request)
/// runs in the background and the result is folded in by the next
/// [`step`](Self::step). Results from transitions that were overtaken by a
/// newer request are discarded on arrival.
pub struct TransitionEngine {
    config: EngineConfig,
    worker: SampleWorker,
    swarm: Swarm,
    rng: SwarmRng,
    pointer: PointerState,
    layout: Rect,
    surface: (u32, u32),
    generation: u64,
    fallback: Option<FallbackView>,
    current_source: Option<String>,
    events: Vec<EngineEvent>,
}

impl TransitionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_cache(config, SampleCache::new())
    }

    /// Build an engine over a shared cache, so several engines (or a watcher
    /// that resets it) can reuse sampling work.
    pub fn with_cache(config: EngineConfig, cache: SampleCache) -> Self {
        let mut sampler = Sampler::new(cache);
        if let Some(boost) = config.boost {
            sampler = sampler.with_boost(boost);
        }
        Self {
            config,
            worker: SampleWorker::new(sampler),
            swarm: Swarm::new(),
            rng: SwarmRng::new(DEFAULT_SEED),
            pointer: PointerState::new(),
            layout: Rect::new(0.0, 0.0, 0.0, 0.0),
            surface: (0, 0),
            generation: 0,
            fallback: None,
            current_source: None,
            events: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng = SwarmRng::new(seed);
        self
    }

    /// Shared handle the embedder feeds pointer positions through.
    pub fn pointer(&self) -> PointerState {
        self.pointer.clone()
    }

    /// Box the particles lay out in, in surface pixels. Read fresh every
    /// frame, so moving it mid-flight redirects particles without a reset.
    /// Embedders that fill the whole surface set this to the surface rect.
    pub fn set_layout(&mut self, layout: Rect) {
        self.layout = layout;
    }

    pub fn layout(&self) -> Rect {
        self.layout
    }

    /// Record the new surface size. Particles keep their positions; only
    /// future spawns and paints see the change.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    pub fn cache(&self) -> &SampleCache {
        self.worker.sampler().cache()
    }

    pub fn sampler(&self) -> &Sampler {
        self.worker.sampler()
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn fallback(&self) -> Option<&FallbackView> {
        self.fallback.as_ref()
    }

    pub fn current_source(&self) -> Option<&str> {
        self.current_source.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a transition in the background. The swarm keeps flying toward
    /// its old targets until the sample arrives.
    pub fn request(&mut self, request: ImageRequest) {
        self.apply_overrides(&request);
        self.generation += 1;
        let resolved = self.resolve(&request);
        println!(
            "[engine] transition {} -> {} ({}px grid, gap {})",
            self.generation, resolved.source, resolved.target_width, resolved.gap
        );
        self.worker.submit(self.generation, resolved);
    }

    /// Sample on the calling thread and reconcile before returning. Used by
    /// offline rendering, where frame pacing does not matter.
    pub fn transition(&mut self, request: ImageRequest) {
        self.apply_overrides(&request);
        self.generation += 1;
        let resolved = self.resolve(&request);
        let delivery = self.worker.sample_blocking(self.generation, resolved);
        self.accept(delivery);
    }

    /// Fold in any finished background samples.
    pub fn pump(&mut self) {
        while let Some(delivery) = self.worker.try_recv() {
            self.accept(delivery);
        }
    }

    /// Advance the simulation one frame: pump deliveries, then step the
    /// swarm against the current layout and pointer.
    pub fn step(&mut self) {
        self.pump();
        let input = FrameInput {
            layout: self.layout,
            pointer: self.pointer.get(),
        };
        self.swarm.step(&input, &self.config.tuning);
    }

    /// Draw the current frame: background, then either the fallback view or
    /// the visible dots.
    pub fn paint(&self, canvas: &mut Canvas) {
        canvas.clear(self.config.background);
        if let Some(view) = &self.fallback {
            match &view.bitmap {
                Some(bitmap) => {
                    let dest = fit_rect(bitmap.dimensions(), self.layout);
                    canvas.blit_scaled(bitmap, dest);
                }
                None => {
                    canvas.stroke_rect(self.layout, PLACEHOLDER_RGB, PLACEHOLDER_THICKNESS);
                }
            }
        } else {
            for dot in self.swarm.dots() {
                canvas.fill_circle(dot.x, dot.y, dot.radius, [dot.r, dot.g, dot.b], dot.alpha);
            }
        }
    }

    /// `step` + `paint` in one call, for embedders that drive frames whole.
    pub fn tick(&mut self, canvas: &mut Canvas) {
        self.step();
        self.paint(canvas);
    }

    /// Hand back everything that happened since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn apply_overrides(&mut self, request: &ImageRequest) {
        if let Some(radius) = request.dot_radius {
            if radius > 0.0 {
                self.config.tuning.dot_radius = radius;
            } else {
                eprintln!("[engine] ignoring non-positive dot radius {radius}");
            }
        }
        if let Some(boost) = request.boost {
            let boost = Some(boost).filter(|b| !b.is_identity());
            if boost != self.config.boost {
                // Cached samples carry the old boost baked into their colors.
                self.config.boost = boost;
                self.worker.sampler_mut().set_boost(boost);
                self.cache().reset();
                println!("[engine] color boost changed, sample cache reset");
            }
        }
    }

    /// Fill in a request's unset width and gap from the layout and config,
    /// with the width capped and floored the same way a transition would.
    pub fn resolve(&self, request: &ImageRequest) -> SampleRequest {
        let hint = request.display_width.unwrap_or_else(|| {
            if self.layout.w > 0.0 {
                self.layout.w
            } else {
                self.config.default_width
            }
        });
        let width = (hint.min(self.config.width_cap).floor() as u32).max(MIN_SAMPLE_WIDTH);
        SampleRequest {
            source: request.source.clone(),
            target_width: width,
            gap: request.gap.unwrap_or(self.config.gap),
        }
    }

    fn accept(&mut self, delivery: SampleDelivery) {
        if delivery.generation != self.generation {
            println!("[engine] discarding stale sample for {}", delivery.source);
            return;
        }

        let image = delivery.image;
        let fallback = image.needs_fallback();
        if fallback {
            if let Some(err) = &image.error {
                eprintln!("[engine] {}: {err}", delivery.source);
            }
            self.swarm.clear();
            self.fallback = Some(FallbackView {
                source: delivery.source.clone(),
                bitmap: delivery.bitmap,
            });
        } else {
            self.fallback = None;
            let center = Vec2::new(self.surface.0 as f32 * 0.5, self.surface.1 as f32 * 0.5);
            self.swarm
                .reconcile(&image.points, center, &mut self.rng, &self.config.tuning);
            println!(
                "[engine] {} ready with {} points",
                delivery.source,
                image.points.len()
            );
        }
        self.current_source = Some(delivery.source.clone());
        self.events.push(EngineEvent::ImageReady {
            source: delivery.source,
            points: image.points.len(),
            fallback,
        });
    }
}

/// Largest rect with the bitmap's aspect ratio that fits inside `dest`,
/// centered.
fn fit_rect((bw, bh): (u32, u32), dest: Rect) -> Rect {
    if bw == 0 || bh == 0 || dest.w <= 0.0 || dest.h <= 0.0 {
        return dest;
    }
    let scale = (dest.w / bw as f32).min(dest.h / bh as f32);
    let w = bw as f32 * scale;
    let h = bh as f32 * scale;
    Rect::new(
        dest.x + (dest.w - w) * 0.5,
        dest.y + (dest.h - h) * 0.5,
        w,
        h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stipple_sampler::{SampleError, SampledImage};

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("stipple_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn solid_png(dir: &std::path::Path, name: &str, size: u32) -> String {
        let img = RgbaImage::from_pixel(size, size, image::Rgba([200, 30, 30, 255]));
        let path = dir.join(name);
        img.save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn sized_engine() -> TransitionEngine {
        let mut engine = TransitionEngine::new(EngineConfig::default());
        engine.resize_surface(100, 100);
        engine.set_layout(Rect::new(0.0, 0.0, 100.0, 100.0));
        engine
    }

    #[test]
    fn sync_transition_populates_swarm_and_fires_ready() {
        let dir = temp_dir();
        let source = solid_png(&dir, "red.png", 16);
        let mut engine = sized_engine();

        engine.transition(
            ImageRequest::new(&source)
                .with_display_width(16.0)
                .with_gap(4.0),
        );

        // 16x16 opaque grid walked at gap 4 is a 4x4 lattice.
        assert_eq!(engine.swarm().len(), 16);
        assert!(engine.fallback().is_none());
        assert_eq!(engine.current_source(), Some(source.as_str()));

        let events = engine.drain_events();
        assert_eq!(
            events,
            vec![EngineEvent::ImageReady {
                source: source.clone(),
                points: 16,
                fallback: false,
            }]
        );
        assert!(engine.drain_events().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_failure_engages_fallback_once() {
        let mut engine = sized_engine();
        engine.transition(ImageRequest::new("/no/such/image.png"));

        assert!(engine.swarm().is_empty());
        let view = engine.fallback().unwrap();
        assert!(view.bitmap.is_none());

        let events = engine.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            EngineEvent::ImageReady {
                source: "/no/such/image.png".into(),
                points: 0,
                fallback: true,
            }
        );
    }

    #[test]
    fn recovery_after_fallback() {
        let dir = temp_dir();
        let source = solid_png(&dir, "ok.png", 16);
        let mut engine = sized_engine();

        engine.transition(ImageRequest::new("/no/such/image.png"));
        assert!(engine.fallback().is_some());

        engine.transition(
            ImageRequest::new(&source)
                .with_display_width(16.0)
                .with_gap(4.0),
        );
        assert!(engine.fallback().is_none());
        assert_eq!(engine.swarm().len(), 16);
        assert_eq!(engine.drain_events().len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stale_delivery_is_discarded() {
        let dir = temp_dir();
        let source = solid_png(&dir, "current.png", 16);
        let mut engine = sized_engine();

        engine.transition(
            ImageRequest::new(&source)
                .with_display_width(16.0)
                .with_gap(4.0),
        );
        let populated = engine.swarm().len();

        // A delivery from an older generation must not disturb anything.
        let stale = SampleDelivery {
            generation: 0,
            source: "overtaken.png".into(),
            image: Arc::new(SampledImage::failed(SampleError::Load("gone".into()))),
            bitmap: None,
        };
        engine.accept(stale);

        assert_eq!(engine.swarm().len(), populated);
        assert!(engine.fallback().is_none());
        assert_eq!(engine.current_source(), Some(source.as_str()));
        assert_eq!(engine.drain_events().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn background_request_lands_via_step() {
        let dir = temp_dir();
        let source = solid_png(&dir, "async.png", 16);
        let mut engine = sized_engine();

        engine.request(
            ImageRequest::new(&source)
                .with_display_width(16.0)
                .with_gap(4.0),
        );
        assert!(engine.swarm().is_empty());

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            engine.step();
            if !engine.drain_events().is_empty() {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "sample never arrived");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(engine.swarm().len(), 16);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn paced_loop_drives_the_engine() {
        use stipple_runtime::{LoopFlow, RenderLoop};

        let dir = temp_dir();
        let source = solid_png(&dir, "looped.png", 16);

        let mut engine = sized_engine();
        engine.request(
            ImageRequest::new(&source)
                .with_display_width(16.0)
                .with_gap(4.0),
        );

        let (tx, rx) = std::sync::mpsc::channel();
        let handle = RenderLoop::spawn("test-engine-loop", 240.0, move |_| {
            engine.step();
            for event in engine.drain_events() {
                let EngineEvent::ImageReady { points, .. } = event;
                let _ = tx.send(points);
                return LoopFlow::Stop;
            }
            LoopFlow::Continue
        })
        .unwrap();

        let points = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("loop never reported the transition");
        assert_eq!(points, 16);
        drop(handle);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn width_resolution_caps_and_floors() {
        let engine = sized_engine();

        let wide = engine.resolve(&ImageRequest::new("a").with_display_width(5000.0));
        assert_eq!(wide.target_width, 2000);

        let tiny = engine.resolve(&ImageRequest::new("a").with_display_width(3.0));
        assert_eq!(tiny.target_width, 10);

        // No hint: the layout box wins over the config default.
        let from_layout = engine.resolve(&ImageRequest::new("a"));
        assert_eq!(from_layout.target_width, 100);

        let mut bare = TransitionEngine::new(EngineConfig::default());
        bare.resize_surface(50, 50);
        let from_default = bare.resolve(&ImageRequest::new("a"));
        assert_eq!(from_default.target_width, 800);
    }

    #[test]
    fn dot_radius_override_sticks() {
        let mut engine = sized_engine();
        engine.transition(ImageRequest::new("/no/such/image.png").with_dot_radius(5.0));
        assert_eq!(engine.config().tuning.dot_radius, 5.0);

        engine.transition(ImageRequest::new("/no/such/image.png").with_dot_radius(-1.0));
        assert_eq!(engine.config().tuning.dot_radius, 5.0);
    }

    #[test]
    fn boost_override_resets_cache_and_recolors() {
        let dir = temp_dir();
        let source = solid_png(&dir, "boosted.png", 16);
        let mut engine = sized_engine();

        engine.transition(
            ImageRequest::new(&source)
                .with_display_width(16.0)
                .with_gap(4.0),
        );
        assert_eq!(engine.cache().len(), 1);
        assert_eq!(engine.swarm().particles()[0].target_r, 200.0);

        // A different boost invalidates the cached colors and resamples.
        engine.transition(
            ImageRequest::new(&source)
                .with_display_width(16.0)
                .with_gap(4.0)
                .with_boost(ColorBoost {
                    mult: 1.5,
                    gamma: 1.0,
                }),
        );
        assert_eq!(engine.cache().len(), 1);
        assert_eq!(engine.swarm().particles()[0].target_r, 255.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn paint_draws_placeholder_without_bitmap() {
        let mut engine = sized_engine();
        engine.transition(ImageRequest::new("/no/such/image.png"));

        let mut canvas = Canvas::new(100, 100).unwrap();
        engine.paint(&mut canvas);

        // Border pixel carries the placeholder grey, interior the background.
        assert_eq!(canvas.pixels()[0..3], PLACEHOLDER_RGB);
        let mid = (50 * 100 + 50) * 4;
        let [br, bg, bb, _] = engine.config().background.to_rgba8();
        assert_eq!(canvas.pixels()[mid..mid + 3], [br, bg, bb]);
    }

    #[test]
    fn fit_rect_letterboxes() {
        let dest = Rect::new(0.0, 0.0, 100.0, 100.0);
        let fitted = fit_rect((200, 100), dest);
        assert_eq!(fitted.w, 100.0);
        assert_eq!(fitted.h, 50.0);
        assert_eq!(fitted.x, 0.0);
        assert_eq!(fitted.y, 25.0);
    }
}
