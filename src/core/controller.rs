use glam::DVec2;

/// Identifier of one pointer (mouse, pen or a single touch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

impl PointerId {
    /// The mouse is always pointer zero
    pub const MOUSE: PointerId = PointerId(0);
}

/// Keyboard equivalents of pointer gestures
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    ZoomIn,
    ZoomOut,
    ResetView,
    /// Pan by a logical screen delta
    Pan(DVec2),
}

/// Platform-neutral input, positions in logical pixels relative to the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { id: PointerId, position: DVec2 },
    PointerMove { id: PointerId, position: DVec2 },
    PointerUp { id: PointerId, position: DVec2 },
    PointerCancel { id: PointerId },
    /// Cursor left the surface
    PointerLeave,
    /// Positive `delta_y` scrolls down (zooms out)
    Wheel { position: DVec2, delta_y: f64 },
    Key(KeyCommand),
}
