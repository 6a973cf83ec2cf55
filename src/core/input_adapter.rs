use glam::DVec2;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{InputEvent, KeyCommand, PointerId};

/// Logical pixels moved per arrow-key press
pub const KEY_PAN_STEP: f64 = 40.0;
/// Logical pixels per wheel "line"
const WHEEL_LINE_HEIGHT: f64 = 40.0;

/// Winit reports physical positions; everything downstream is logical
pub fn to_logical(position: PhysicalPosition<f64>, scale_factor: f64) -> DVec2 {
    let scale_factor = if scale_factor > 0.0 { scale_factor } else { 1.0 };
    DVec2::new(position.x / scale_factor, position.y / scale_factor)
}

/// Adapter that bridges Winit events to platform-neutral input events
#[derive(Debug, Clone)]
pub struct WinitInputAdapter {
    /// Cursor position in logical pixels, `None` while outside the window
    cursor: Option<DVec2>,
    /// Left button went down inside the window and has not come up yet
    mouse_pressed: bool,
    /// Device pixel ratio of the window
    scale_factor: f64,
}

impl WinitInputAdapter {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            cursor: None,
            mouse_pressed: false,
            scale_factor,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn cursor(&self) -> Option<DVec2> {
        self.cursor
    }

    pub fn is_mouse_pressed(&self) -> bool {
        self.mouse_pressed
    }

    /// Translate one window event; most events translate to nothing
    pub fn process_event(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = *scale_factor;
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = to_logical(*position, self.scale_factor);
                self.cursor = Some(position);
                Some(InputEvent::PointerMove { id: PointerId::MOUSE, position })
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                Some(InputEvent::PointerLeave)
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => match state {
                ElementState::Pressed => {
                    let position = self.cursor?;
                    self.mouse_pressed = true;
                    Some(InputEvent::PointerDown { id: PointerId::MOUSE, position })
                }
                ElementState::Released => {
                    if !std::mem::take(&mut self.mouse_pressed) {
                        return None;
                    }
                    // A release outside the window ends the press but is never a click
                    Some(match self.cursor {
                        Some(position) => InputEvent::PointerUp { id: PointerId::MOUSE, position },
                        None => InputEvent::PointerCancel { id: PointerId::MOUSE },
                    })
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let position = self.cursor?;
                Some(InputEvent::Wheel {
                    position,
                    delta_y: wheel_delta_y(*delta, self.scale_factor),
                })
            }
            WindowEvent::Touch(touch) => {
                // Touch ids never collide with the mouse
                let id = PointerId(touch.id.wrapping_add(1));
                let position = to_logical(touch.location, self.scale_factor);
                Some(match touch.phase {
                    TouchPhase::Started => InputEvent::PointerDown { id, position },
                    TouchPhase::Moved => InputEvent::PointerMove { id, position },
                    TouchPhase::Ended => InputEvent::PointerUp { id, position },
                    TouchPhase::Cancelled => InputEvent::PointerCancel { id },
                })
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return None;
                };
                keycode_to_command(code).map(InputEvent::Key)
            }
            _ => None,
        }
    }
}

impl Default for WinitInputAdapter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Normalize wheel input to DOM convention: positive means scroll down
pub fn wheel_delta_y(delta: MouseScrollDelta, scale_factor: f64) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -(y as f64) * WHEEL_LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(position) => -to_logical(position, scale_factor).y,
    }
}

/// Map Winit KeyCode to a gesture equivalent
pub fn keycode_to_command(code: KeyCode) -> Option<KeyCommand> {
    match code {
        KeyCode::Equal | KeyCode::NumpadAdd => Some(KeyCommand::ZoomIn),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(KeyCommand::ZoomOut),
        KeyCode::Home => Some(KeyCommand::ResetView),
        KeyCode::ArrowLeft => Some(KeyCommand::Pan(DVec2::new(KEY_PAN_STEP, 0.0))),
        KeyCode::ArrowRight => Some(KeyCommand::Pan(DVec2::new(-KEY_PAN_STEP, 0.0))),
        KeyCode::ArrowUp => Some(KeyCommand::Pan(DVec2::new(0.0, KEY_PAN_STEP))),
        KeyCode::ArrowDown => Some(KeyCommand::Pan(DVec2::new(0.0, -KEY_PAN_STEP))),
        _ => None,
    }
}
