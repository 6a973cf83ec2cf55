use chrono::{DateTime, Utc};

use crate::board::{Pixel, PixelBuffer};
use crate::config::AppConfig;
use crate::cooldown::{CooldownEvent, CooldownGate};
use crate::core::clock::{SystemClock, TimeSource};
use crate::core::controller::InputEvent;
use crate::core::render_loop::FrameInput;
use crate::identity::Identity;
use crate::input::{InputController, Intent};
use crate::loader::{BoardLoader, BoardSource};
use crate::placement::{PlacementContext, PlacementPipeline, PlacementResult, UiRequest};
use crate::status::StatusLog;
use crate::sync::{PollSummary, SyncChannel, Transport};
use crate::viewport::CoordinateTransform;

/// External collaborators the app is built around
pub struct AppServices {
    pub transport: Box<dyn Transport>,
    pub source: Box<dyn BoardSource>,
    pub clock: Box<dyn TimeSource>,
}

impl AppServices {
    pub fn new(transport: Box<dyn Transport>, source: Box<dyn BoardSource>) -> Self {
        Self {
            transport,
            source,
            clock: Box::new(SystemClock),
        }
    }
}

/// One canvas session: every component, owned in one place
pub struct CanvasApp {
    buffer: PixelBuffer,
    transform: CoordinateTransform,
    cooldown: CooldownGate,
    channel: SyncChannel,
    pipeline: PlacementPipeline,
    input: InputController,
    loader: BoardLoader,
    identity: Identity,
    status: StatusLog,
    selected_color: u8,
    ui_requests: Vec<UiRequest>,
}

impl CanvasApp {
    pub fn new(config: &AppConfig, identity: Identity, services: AppServices) -> Self {
        let buffer = PixelBuffer::new(config.canvas_width, config.canvas_height, config.palette());
        let transform = CoordinateTransform::new(buffer.dimensions(), config.initial_scale);

        Self {
            transform,
            cooldown: CooldownGate::new(services.clock, config.cooldown_tick()),
            channel: SyncChannel::new(services.transport, config.routes(), config.transport_settings()),
            pipeline: PlacementPipeline::new(config.placement_enabled, config.rate_limit_seconds),
            input: InputController::new(config.initial_scale),
            loader: BoardLoader::new(services.source),
            identity,
            status: StatusLog::new(),
            selected_color: 0,
            ui_requests: Vec::new(),
            buffer,
        }
    }

    /// Center the board, load it and go live when signed in
    pub fn start(&mut self, display_width: f64, display_height: f64) {
        self.transform.reset_viewport(display_width, display_height);
        self.loader.load_current(self.identity.token(), &mut self.buffer, &mut self.status);

        match self.identity.token() {
            Some(token) => {
                if let Err(e) = self.channel.connect(token) {
                    self.status.error(format!("Could not connect: {e}"));
                }
            }
            None => self.status.info("Sign in to load the board and place pixels."),
        }
    }

    /// Feed one input event; clicks go through the placement pipeline
    pub fn handle_input(&mut self, event: InputEvent) -> Option<PlacementResult> {
        let Intent::Place { x, y } = self.input.handle(event, &mut self.transform)?;
        Some(self.place(Pixel::new(x, y, self.selected_color as i32)))
    }

    pub fn place(&mut self, pixel: Pixel) -> PlacementResult {
        self.pipeline.request_placement(
            pixel,
            PlacementContext {
                buffer: &mut self.buffer,
                cooldown: &mut self.cooldown,
                publisher: &mut self.channel,
                identity: &mut self.identity,
                status: &mut self.status,
                ui_requests: &mut self.ui_requests,
                history_active: self.loader.is_history_active(),
            },
        )
    }

    /// Per-frame housekeeping: cooldown tick and network drain
    pub fn frame_tick(&mut self) -> PollSummary {
        if let Some(CooldownEvent::Expired) = self.cooldown.tick() {
            log::debug!("ready to place again");
        }
        self.channel.poll(&mut self.buffer, &mut self.status)
    }

    /// What the render loop draws this frame
    pub fn frame_input(&self) -> FrameInput<'_> {
        FrameInput {
            buffer: &self.buffer,
            viewport: self.transform.viewport(),
            hover: self.input.hover(),
        }
    }

    pub fn select_color(&mut self, index: u8) -> bool {
        if (index as usize) < self.buffer.palette().len() {
            self.selected_color = index;
            true
        } else {
            log::warn!("color {index} is not in the palette");
            false
        }
    }

    /// Jump to a cell and zoom in on it
    pub fn focus_pixel(&mut self, x: i32, y: i32) -> bool {
        if !self.buffer.dimensions().contains(x, y) {
            self.status.warning(format!("Pixel ({x}, {y}) is outside the canvas."));
            return false;
        }
        self.transform.focus_cell(x, y);
        self.input.set_hover(Some((x, y)));
        self.status.info(format!("Moved to ({x}, {y})."));
        true
    }

    pub fn load_history(&mut self, at: DateTime<Utc>) -> bool {
        self.loader
            .load_history(at, Utc::now(), self.identity.token(), &mut self.buffer, &mut self.status)
    }

    pub fn reset_to_current(&mut self) -> Option<usize> {
        self.loader
            .reset_to_current(self.identity.token(), &mut self.buffer, &mut self.status)
    }

    /// New logical display size
    pub fn resize(&mut self, display_width: f64, display_height: f64) {
        self.transform.resize_display(display_width, display_height);
    }

    /// Drop the token and the live session; the board stays as it is
    pub fn sign_out(&mut self) {
        self.identity.sign_out();
        self.channel.disconnect();
    }

    /// Stop everything that runs on its own. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.channel.disconnect();
        self.cooldown.stop();
    }

    /// Pending UI requests, oldest first
    pub fn take_ui_requests(&mut self) -> Vec<UiRequest> {
        std::mem::take(&mut self.ui_requests)
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    pub fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn selected_color(&self) -> u8 {
        self.selected_color
    }

    pub fn is_history_active(&self) -> bool {
        self.loader.is_history_active()
    }
}
