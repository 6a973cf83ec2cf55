use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use pixel_canvas::cli::Cli;
use pixel_canvas::core::{
    DisplayContext, FrameOutcome, RenderLoop, SoftwareSurface, WindowPresenter, WinitInputAdapter,
};
use pixel_canvas::identity::IdentityStore;
use pixel_canvas::loader::{ArchiveSource, BoardSource, HttpBoardSource};
use pixel_canvas::sync::{LocalBroker, StompTransport, Transport};
use pixel_canvas::{AppServices, CanvasApp, UiRequest};

// === Constants ===

const INITIAL_WINDOW_WIDTH: u32 = 1024;
const INITIAL_WINDOW_HEIGHT: u32 = 768;

/// Window-side state: everything that only exists once a window does
struct Frontend {
    window: Arc<Window>,
    presenter: WindowPresenter,
    render: RenderLoop<SoftwareSurface>,
}

struct App {
    cli: Cli,
    canvas: CanvasApp,
    identity_store: IdentityStore,
    adapter: WinitInputAdapter,
    frontend: Option<Frontend>,
    started: bool,
}

impl App {
    fn new(cli: Cli) -> anyhow::Result<Self> {
        let config = cli.load_config()?;
        let identity_store = IdentityStore::new(&cli.identity);
        let identity = cli.apply_identity(identity_store.load()?);

        let (transport, source): (Box<dyn Transport>, Box<dyn BoardSource>) = if cli.is_offline() {
            let archive = match &cli.archive {
                Some(path) => ArchiveSource::load(path)?,
                None => ArchiveSource::default(),
            };
            log::info!("offline: in-process broker, {} archived placements", archive.len());
            (
                Box::new(LocalBroker::new(config.routes(), config.transport_settings())),
                Box::new(archive),
            )
        } else {
            let url = config.websocket_url();
            log::info!("backend {}, broker {url}", config.api_base);
            (
                Box::new(StompTransport::new(url, config.transport_settings())),
                Box::new(HttpBoardSource::from_config(&config)),
            )
        };

        let mut canvas = CanvasApp::new(&config, identity, AppServices::new(transport, source));
        if !canvas.select_color(cli.color) {
            log::warn!("--color {} ignored", cli.color);
        }

        Ok(Self {
            cli,
            canvas,
            identity_store,
            adapter: WinitInputAdapter::default(),
            frontend: None,
            started: false,
        })
    }

    fn create_frontend(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("Pixel Canvas")
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        INITIAL_WINDOW_WIDTH,
                        INITIAL_WINDOW_HEIGHT,
                    )),
            )?,
        );
        let presenter = WindowPresenter::new(window.clone()).context("failed to initialize presenter")?;

        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        let context = DisplayContext::from_physical(size.width, size.height, scale_factor);

        let mut render = RenderLoop::new(SoftwareSurface::new(context));
        render.start(Box::new(window.clone()));
        self.adapter = WinitInputAdapter::new(scale_factor);

        if self.started {
            self.canvas.resize(context.width, context.height);
        } else {
            self.canvas.start(context.width, context.height);
            if let Some(at) = self.cli.history {
                self.canvas.load_history(at);
            }
            self.started = true;
        }

        self.frontend = Some(Frontend { window, presenter, render });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(frontend) = self.frontend.as_mut() else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }
        let context = DisplayContext::from_physical(width, height, frontend.window.scale_factor());
        frontend.presenter.resize(width, height);
        frontend.render.resize(context);
        self.canvas.resize(context.width, context.height);
    }

    fn redraw(&mut self) {
        self.canvas.frame_tick();

        for request in self.canvas.take_ui_requests() {
            match request {
                UiRequest::ShowSignIn => log::warn!("not signed in; restart with --token to place pixels"),
            }
        }

        let Some(frontend) = self.frontend.as_mut() else {
            return;
        };
        let outcome = frontend.render.frame(self.canvas.frame_input());
        if outcome == FrameOutcome::Drawn {
            if let Err(e) = frontend.presenter.upload(frontend.render.surface()) {
                log::error!("frame upload failed: {e:#}");
                return;
            }
        }
        // Presenting skipped frames too keeps the loop paced by vsync
        if outcome != FrameOutcome::Stopped {
            if let Err(e) = frontend.presenter.present() {
                log::error!("present failed: {e:#}");
            }
        }
    }

    /// Shortcuts outside gesture handling
    fn handle_shortcut(&mut self, code: KeyCode) -> bool {
        let palette_len = self.canvas.buffer().palette().len();
        let selected = self.canvas.selected_color() as usize;
        match code {
            KeyCode::BracketRight if palette_len > 0 => {
                self.canvas.select_color(((selected + 1) % palette_len) as u8);
            }
            KeyCode::BracketLeft if palette_len > 0 => {
                self.canvas.select_color(((selected + palette_len - 1) % palette_len) as u8);
            }
            KeyCode::KeyR if self.canvas.is_history_active() => {
                self.canvas.reset_to_current();
            }
            _ => return false,
        }
        true
    }

    fn shutdown(&mut self) {
        self.canvas.shutdown();
        if let Some(frontend) = self.frontend.as_mut() {
            frontend.render.teardown();
        }
        if let Err(e) = self.identity_store.save(self.canvas.identity()) {
            log::error!("could not save identity: {e:#}");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.frontend.is_none() {
            if let Err(e) = self.create_frontend(event_loop) {
                log::error!("failed to open canvas window: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } if self.handle_shortcut(code) => {}
            other => {
                if let Some(input) = self.adapter.process_event(&other) {
                    if let Some(result) = self.canvas.handle_input(input) {
                        log::debug!("placement: {result:?}");
                    }
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli)?;

    log::info!("Pixel Canvas - drag to pan, wheel to zoom, click to place, [ ] to change color, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
