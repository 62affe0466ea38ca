//! Headless transition-to-PNG render command

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use stipple_core::Rect;
use stipple_engine::{EngineConfig, EngineEvent, ImageRequest, TransitionEngine};
use stipple_render::Canvas;
use stipple_runtime::{LoopFlow, RenderLoop};

pub struct RenderArgs {
    pub images: Vec<String>,
    pub output: String,
    pub frames: u32,
    pub size: (u32, u32),
    pub stride: u32,
    pub config: Option<String>,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let (width, height) = args.size;
    let frames_per_image = args.frames.max(1);
    let stride = args.stride.max(1);

    let config = match &args.config {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("Failed to load config {}", path))?
        }
        None => EngineConfig::default(),
    };
    let fps = config.target_fps;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output))?;

    let mut engine = TransitionEngine::new(config);
    engine.resize_surface(width, height);
    engine.set_layout(Rect::new(0.0, 0.0, width as f32, height as f32));

    let canvas = Canvas::new(width, height).context("Failed to create canvas")?;

    let (done_tx, done_rx) = mpsc::channel();
    let mut job = RenderJob {
        engine,
        canvas,
        images: args.images,
        output: PathBuf::from(&args.output),
        frames_per_image,
        stride,
        image_index: 0,
        frame_in_image: 0,
        frame_index: 0,
        written: 0,
        done: done_tx,
    };

    let mut handle = RenderLoop::spawn("stipple-render", fps, move |_| job.advance())?;
    let written = done_rx
        .recv()
        .context("Render loop ended without a result")??;
    handle.stop();

    println!(
        "Rendered {} frames ({}x{}) to {}",
        written, width, height, args.output
    );

    Ok(())
}

/// One render run, advanced a frame at a time by the paced loop. Completion
/// or the first write failure reports over `done` and stops the loop.
struct RenderJob {
    engine: TransitionEngine,
    canvas: Canvas,
    images: Vec<String>,
    output: PathBuf,
    frames_per_image: u32,
    stride: u32,
    image_index: usize,
    frame_in_image: u32,
    frame_index: u32,
    written: u32,
    done: mpsc::Sender<Result<u32>>,
}

impl RenderJob {
    fn advance(&mut self) -> LoopFlow {
        if self.frame_in_image == 0 {
            if self.image_index >= self.images.len() {
                let _ = self.done.send(Ok(self.written));
                return LoopFlow::Stop;
            }
            let source = self.images[self.image_index].clone();
            self.engine.transition(ImageRequest::new(source));
            for event in self.engine.drain_events() {
                let EngineEvent::ImageReady {
                    source,
                    points,
                    fallback,
                } = event;
                if fallback {
                    println!("{}: fallback view", source);
                } else {
                    println!("{}: {} points", source, points);
                }
            }
        }

        self.engine.tick(&mut self.canvas);
        if self.frame_index % self.stride == 0 {
            let path = self
                .output
                .join(format!("frame_{:05}.png", self.frame_index));
            let saved = self
                .canvas
                .save_png(&path)
                .with_context(|| format!("Failed to save {}", path.display()));
            if let Err(e) = saved {
                let _ = self.done.send(Err(e));
                return LoopFlow::Stop;
            }
            self.written += 1;
        }
        self.frame_index += 1;

        self.frame_in_image += 1;
        if self.frame_in_image >= self.frames_per_image {
            self.frame_in_image = 0;
            self.image_index += 1;
        }
        LoopFlow::Continue
    }
}
