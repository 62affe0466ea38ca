//! Windowed playback with pointer repulsion and hot-reload

use std::num::NonZeroU32;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use stipple_core::Rect;
use stipple_engine::{EngineConfig, EngineEvent, ImageRequest, TransitionEngine};
use stipple_render::Canvas;
use stipple_runtime::{FrameClock, PointerState};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

pub struct PlayArgs {
    pub images: Vec<String>,
    pub watch: bool,
    pub config: Option<String>,
}

pub fn run(args: PlayArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("Failed to load config {}", path))?
        }
        None => EngineConfig::default(),
    };

    // Watch local file sources; URLs have nothing on disk to watch.
    let (watch_tx, watch_rx) = mpsc::channel();
    let _watcher = if args.watch {
        let mut debouncer = new_debouncer(Duration::from_millis(500), watch_tx)
            .context("Failed to create file watcher")?;

        let mut watched = 0;
        for source in &args.images {
            let path = Path::new(source);
            if path.exists() {
                debouncer
                    .watcher()
                    .watch(path, RecursiveMode::NonRecursive)
                    .with_context(|| format!("Failed to watch {}", source))?;
                watched += 1;
            }
        }
        println!("Watching {} files for changes...", watched);
        Some(debouncer)
    } else {
        None
    };

    println!(
        "Playlist: {} images (space or click advances, R re-samples, Esc quits)",
        args.images.len()
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlayApp::new(config, args.images, watch_rx);
    event_loop.run_app(&mut app)?;

    Ok(())
}

struct PlayApp {
    engine: TransitionEngine,
    pointer: PointerState,
    playlist: Vec<String>,
    index: usize,
    watch_rx: mpsc::Receiver<DebounceEventResult>,
    clock: FrameClock,
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    canvas: Option<Canvas>,
    prefetched: bool,
}

impl PlayApp {
    fn new(
        config: EngineConfig,
        playlist: Vec<String>,
        watch_rx: mpsc::Receiver<DebounceEventResult>,
    ) -> Self {
        let clock = FrameClock::new(config.target_fps);
        let engine = TransitionEngine::new(config);
        let pointer = engine.pointer();
        Self {
            engine,
            pointer,
            playlist,
            index: 0,
            watch_rx,
            clock,
            window: None,
            surface: None,
            canvas: None,
            prefetched: false,
        }
    }

    fn request_current(&mut self) {
        let source = self.playlist[self.index].clone();
        self.engine.request(ImageRequest::new(source));
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.playlist.len();
        self.request_current();
    }

    fn apply_size(&mut self, width: u32, height: u32) {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return; // minimized
        };
        if let Some(surface) = &mut self.surface {
            if let Err(e) = surface.resize(w, h) {
                eprintln!("[play] surface resize failed: {}", e);
                return;
            }
        }
        match Canvas::new(width, height) {
            Ok(canvas) => self.canvas = Some(canvas),
            Err(e) => eprintln!("[play] {}", e),
        }
        self.engine.resize_surface(width, height);
        self.engine
            .set_layout(Rect::new(0.0, 0.0, width as f32, height as f32));
    }

    fn check_watch(&mut self) {
        let mut changed = false;
        while let Ok(result) = self.watch_rx.try_recv() {
            match result {
                Ok(events) => {
                    for event in &events {
                        println!("[watch] {} changed", event.path.display());
                    }
                    changed = true;
                }
                Err(e) => eprintln!("[watch] error: {:?}", e),
            }
        }
        if changed {
            self.engine.cache().reset();
            self.request_current();
        }
    }

    fn handle_events(&mut self) {
        for event in self.engine.drain_events() {
            let EngineEvent::ImageReady {
                source,
                points,
                fallback,
            } = event;
            if fallback {
                println!("[play] {}: fallback view", source);
            } else {
                println!("[play] {}: {} points", source, points);
            }
            if !self.prefetched {
                self.prefetched = true;
                self.prefetch_remaining();
            }
        }
    }

    /// Warm the cache for the rest of the playlist once the first image is
    /// up, so later advances reconcile without a sampling delay.
    fn prefetch_remaining(&mut self) {
        if self.playlist.len() < 2 {
            return;
        }
        let sampler = self.engine.sampler().clone();
        let mut pending = Vec::new();
        for offset in 1..self.playlist.len() {
            let i = (self.index + offset) % self.playlist.len();
            pending.push(self.engine.resolve(&ImageRequest::new(&self.playlist[i])));
        }
        let spawned = std::thread::Builder::new()
            .name("stipple-prefetch".into())
            .spawn(move || {
                for request in pending {
                    let image =
                        sampler.prefetch(&request.source, request.target_width, request.gap);
                    println!(
                        "[play] prefetched {} ({} points)",
                        request.source,
                        image.points.len()
                    );
                }
            });
        if let Err(e) = spawned {
            eprintln!("[play] failed to spawn prefetch thread: {}", e);
        }
    }

    fn redraw(&mut self) {
        self.clock.tick();
        self.engine.step();
        self.handle_events();

        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.engine.paint(canvas);

        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match surface.buffer_mut() {
            Ok(mut buffer) => {
                canvas.pack_0rgb(&mut buffer);
                if let Err(e) = buffer.present() {
                    eprintln!("[play] present failed: {}", e);
                }
            }
            Err(e) => eprintln!("[play] surface buffer unavailable: {}", e),
        }

        self.clock.pace();
    }
}

impl ApplicationHandler for PlayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Stipple")
            .with_inner_size(PhysicalSize::new(1280, 720));
        let window = Rc::new(event_loop.create_window(attrs).unwrap());

        let context = softbuffer::Context::new(Rc::clone(&window)).unwrap();
        let surface = softbuffer::Surface::new(&context, Rc::clone(&window)).unwrap();
        self.surface = Some(surface);

        let size = window.inner_size();
        self.window = Some(window);
        self.apply_size(size.width, size.height);

        self.request_current();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                self.apply_size(new_size.width, new_size.height);
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => self.advance(),
                KeyCode::KeyR => {
                    self.engine.cache().reset();
                    self.request_current();
                }
                _ => {}
            },

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.advance();
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.set(position.x as f32, position.y as f32);
            }

            WindowEvent::CursorLeft { .. } => {
                self.pointer.park();
            }

            WindowEvent::RedrawRequested => {
                self.redraw();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.check_watch();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
