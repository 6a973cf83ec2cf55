use glam::DVec2;

use super::clock::FrameClock;
use super::display_context::DisplayContext;
use super::surface::{RasterSurface, RasterView};
use super::timer::FixedHz;
use crate::board::PixelBuffer;
use crate::palette::Rgba;
use crate::viewport::Viewport;

/// Color outside the board
pub const CLEAR_COLOR: Rgba = Rgba::opaque(0x1e, 0x1f, 0x24);
/// Hover outline color
pub const HIGHLIGHT_COLOR: Rgba = Rgba::opaque(0x11, 0x11, 0x11);
/// Hover outline width in logical pixels
const HIGHLIGHT_WIDTH: f64 = 1.0;

/// Handle for asking the display to call back on its next refresh
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// Everything a frame reads
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub buffer: &'a PixelBuffer,
    pub viewport: Viewport,
    pub hover: Option<(i32, i32)>,
}

/// What happened on a frame tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// Nothing changed since the last drawn frame
    Skipped,
    /// Loop already torn down
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameKey {
    generation: u64,
    viewport: Viewport,
    context: DisplayContext,
    hover: Option<(i32, i32)>,
}

/// Perpetual redraw driver
///
/// Each tick clears the surface, blits the board raster through the
/// viewport and outlines the hovered cell, then asks the scheduler for the
/// next frame. Redraw is idempotent, so skipping an unchanged frame is
/// purely an optimization.
pub struct RenderLoop<S: RasterSurface> {
    surface: S,
    scheduler: Option<Box<dyn FrameScheduler>>,
    last: Option<FrameKey>,
    clock: FrameClock,
    fps_report: FixedHz,
    frames_drawn: u64,
    frames_since_report: u32,
}

impl<S: RasterSurface> RenderLoop<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            scheduler: None,
            last: None,
            clock: FrameClock::new(),
            fps_report: FixedHz::new(1.0),
            frames_drawn: 0,
            frames_since_report: 0,
        }
    }

    /// Attach the scheduling handle and request the first frame
    pub fn start(&mut self, scheduler: Box<dyn FrameScheduler>) {
        if self.scheduler.is_some() {
            log::warn!("render loop already running, replacing scheduler");
        }
        scheduler.request_frame();
        self.scheduler = Some(scheduler);
        self.clock.reset();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Release the scheduling handle. Returns false when already torn down.
    pub fn teardown(&mut self) -> bool {
        match self.scheduler.take() {
            Some(_) => {
                log::debug!("render loop torn down after {} frames", self.frames_drawn);
                true
            }
            None => false,
        }
    }

    /// Resize the surface; forces the next frame to draw
    pub fn resize(&mut self, context: DisplayContext) {
        self.surface.resize(context);
        self.last = None;
    }

    /// Run one frame and schedule the next
    pub fn frame(&mut self, input: FrameInput<'_>) -> FrameOutcome {
        let Some(scheduler) = self.scheduler.as_ref() else {
            return FrameOutcome::Stopped;
        };

        let key = FrameKey {
            generation: input.buffer.generation(),
            viewport: input.viewport,
            context: self.surface.context(),
            hover: input.hover,
        };

        let outcome = if self.last == Some(key) {
            FrameOutcome::Skipped
        } else {
            Self::compose(&mut self.surface, &input);
            self.last = Some(key);
            self.frames_drawn += 1;
            self.frames_since_report += 1;
            FrameOutcome::Drawn
        };

        if self.fps_report.tick(self.clock.tick()) {
            log::trace!("{} frames drawn in the last second", self.frames_since_report);
            self.frames_since_report = 0;
        }

        scheduler.request_frame();
        outcome
    }

    fn compose(surface: &mut S, input: &FrameInput<'_>) {
        let size = input.buffer.dimensions();
        let raster = RasterView {
            width: size.width,
            height: size.height,
            texels: input.buffer.raster(),
        };

        surface.clear(CLEAR_COLOR);
        surface.blit(raster, &input.viewport);

        if let Some((x, y)) = input.hover {
            let scale = input.viewport.scale;
            let origin = DVec2::new(x as f64, y as f64) * scale + input.viewport.offset;
            surface.stroke_rect(origin, DVec2::splat(scale), HIGHLIGHT_COLOR, HIGHLIGHT_WIDTH);
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl<S: RasterSurface> Drop for RenderLoop<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
