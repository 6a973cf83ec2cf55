use glam::DVec2;

use crate::board::BoardSize;

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 40.0;
pub const DEFAULT_SCALE: f64 = 8.0;
/// Zoom requests closer than this to the current scale are ignored
pub const ZOOM_EPSILON: f64 = 0.01;
/// Minimum scale used when jumping to a specific cell
pub const FOCUS_SCALE: f64 = 20.0;

/// Pan/zoom state: `scale` screen pixels per cell, `offset` is where the
/// board origin lands on screen. Logical (density-independent) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset: DVec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            offset: DVec2::ZERO,
        }
    }
}

/// Mapping between board space and viewport space
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    viewport: Viewport,
    board: BoardSize,
    /// Logical display size
    display: DVec2,
}

impl CoordinateTransform {
    pub fn new(board: BoardSize, scale: f64) -> Self {
        Self {
            viewport: Viewport {
                scale: scale.clamp(MIN_ZOOM, MAX_ZOOM),
                offset: DVec2::ZERO,
            },
            board,
            display: DVec2::ZERO,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scale(&self) -> f64 {
        self.viewport.scale
    }

    pub fn offset(&self) -> DVec2 {
        self.viewport.offset
    }

    pub fn board(&self) -> BoardSize {
        self.board
    }

    pub fn display_size(&self) -> DVec2 {
        self.display
    }

    /// Board point to viewport point; no rounding
    pub fn board_to_viewport(&self, point: DVec2) -> DVec2 {
        point * self.viewport.scale + self.viewport.offset
    }

    /// Viewport point to board point; no rounding
    pub fn viewport_to_board(&self, point: DVec2) -> DVec2 {
        (point - self.viewport.offset) / self.viewport.scale
    }

    /// Cell under a viewport point. Not bounds checked.
    pub fn cell_at(&self, point: DVec2) -> (i32, i32) {
        let board = self.viewport_to_board(point).floor();
        (board.x as i32, board.y as i32)
    }

    /// Zoom to `target`, keeping `anchor` (a board point) fixed on screen.
    /// Without an anchor the board point under the display center is kept.
    /// Returns whether the viewport changed.
    pub fn set_zoom(&mut self, target: f64, anchor: Option<DVec2>) -> bool {
        let next = target.clamp(MIN_ZOOM, MAX_ZOOM);
        if (next - self.viewport.scale).abs() < ZOOM_EPSILON {
            return false;
        }

        let anchor = anchor.unwrap_or_else(|| self.viewport_to_board(self.display * 0.5));
        let screen = self.board_to_viewport(anchor);

        self.viewport.scale = next;
        self.viewport.offset = screen - anchor * next;
        true
    }

    /// Multiply the current scale, anchored like `set_zoom`
    pub fn zoom_by(&mut self, factor: f64, anchor: Option<DVec2>) -> bool {
        self.set_zoom(self.viewport.scale * factor, anchor)
    }

    /// Center the whole board in a display of the given logical size
    pub fn reset_viewport(&mut self, display_width: f64, display_height: f64) {
        self.display = DVec2::new(display_width, display_height);
        let board = DVec2::new(self.board.width as f64, self.board.height as f64);
        self.viewport.offset = (self.display - board * self.viewport.scale) / 2.0;
    }

    /// Record a new display size and recenter
    pub fn resize_display(&mut self, display_width: f64, display_height: f64) {
        self.reset_viewport(display_width, display_height);
    }

    /// Drag support: offset becomes `origin + delta`
    pub fn pan_from(&mut self, origin: DVec2, delta: DVec2) {
        self.viewport.offset = origin + delta;
    }

    /// Shift the offset by a screen delta
    pub fn pan_by(&mut self, delta: DVec2) {
        self.viewport.offset += delta;
    }

    /// Center a cell on screen, zooming in to at least `FOCUS_SCALE`
    pub fn focus_cell(&mut self, x: i32, y: i32) {
        if self.viewport.scale < FOCUS_SCALE {
            self.viewport.scale = FOCUS_SCALE;
        }
        let scale = self.viewport.scale;
        let cell = DVec2::new(x as f64, y as f64);
        self.viewport.offset = self.display * 0.5 - cell * scale - DVec2::splat(scale / 2.0);
    }

    /// Replace the board; the viewport is recentered for the current display
    pub fn set_board(&mut self, board: BoardSize) {
        self.board = board;
        self.reset_viewport(self.display.x, self.display.y);
    }
}
