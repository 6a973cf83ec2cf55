use std::collections::HashMap;

use glam::DVec2;

use crate::core::controller::{InputEvent, KeyCommand, PointerId};
use crate::viewport::{CoordinateTransform, DEFAULT_SCALE};

/// Movement in either axis beyond this turns a press into a drag
pub const DRAG_THRESHOLD: f64 = 2.0;
pub const ZOOM_IN_FACTOR: f64 = 1.1;
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// What a gesture asks the rest of the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// A click landed on this cell (not bounds checked)
    Place { x: i32, y: i32 },
}

#[derive(Debug, Clone, Copy)]
struct PendingGesture {
    start: DVec2,
    last: DVec2,
}

/// One press-to-release interaction, possibly spanning several pointers
#[derive(Debug, Clone, Copy)]
struct DragSession {
    /// Pointer whose movement pans the view
    anchor: PointerId,
    /// Anchor position the pan delta is measured from
    start: DVec2,
    /// Viewport offset at `start`
    origin: DVec2,
    dragging: bool,
    /// More than one pointer took part; never a click
    multi: bool,
}

/// Turns pointer, wheel and key input into viewport changes and clicks
///
/// Idle -> Pressed -> Dragging -> Idle. A release that never became a
/// drag is a click. The session ends when the last pointer lifts.
#[derive(Debug, Clone)]
pub struct InputController {
    pointers: HashMap<PointerId, PendingGesture>,
    session: Option<DragSession>,
    hover: Option<(i32, i32)>,
    home_scale: f64,
}

impl InputController {
    /// `home_scale` is the zoom level restored by the reset-view command
    pub fn new(home_scale: f64) -> Self {
        Self {
            pointers: HashMap::new(),
            session: None,
            hover: None,
            home_scale,
        }
    }

    /// Hovered cell, only while it is on the board
    pub fn hover(&self) -> Option<(i32, i32)> {
        self.hover
    }

    /// Point the hover at a cell, e.g. after jumping to it
    pub fn set_hover(&mut self, cell: Option<(i32, i32)>) {
        self.hover = cell;
    }

    pub fn is_pressed(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some_and(|s| s.dragging)
    }

    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn handle(&mut self, event: InputEvent, transform: &mut CoordinateTransform) -> Option<Intent> {
        match event {
            InputEvent::PointerDown { id, position } => {
                // Same id pressed again: its release was lost, start over
                if self.pointers.remove(&id).is_some() {
                    if self.pointers.is_empty() {
                        self.session = None;
                    } else if self.session.is_some_and(|s| s.anchor == id) {
                        self.hand_over(transform);
                    }
                }
                self.pointers.insert(id, PendingGesture { start: position, last: position });
                match self.session.as_mut() {
                    Some(session) => session.multi = true,
                    None => {
                        self.session = Some(DragSession {
                            anchor: id,
                            start: position,
                            origin: transform.offset(),
                            dragging: false,
                            multi: false,
                        });
                    }
                }
                if !self.is_dragging() {
                    self.track_hover(position, transform);
                }
                None
            }
            InputEvent::PointerMove { id, position } => {
                if let Some(gesture) = self.pointers.get_mut(&id) {
                    gesture.last = position;
                }

                match self.session.as_mut() {
                    Some(session) if session.anchor == id => {
                        let delta = position - session.start;
                        if !session.dragging
                            && (delta.x.abs() > DRAG_THRESHOLD || delta.y.abs() > DRAG_THRESHOLD)
                        {
                            session.dragging = true;
                            self.hover = None;
                        }
                        if session.dragging {
                            transform.pan_from(session.origin, delta);
                        } else {
                            self.track_hover(position, transform);
                        }
                    }
                    Some(session) if session.dragging => {}
                    _ => self.track_hover(position, transform),
                }
                None
            }
            InputEvent::PointerUp { id, position } => {
                self.pointers.remove(&id)?;
                let session = self.session?;

                if !self.pointers.is_empty() {
                    if session.anchor == id {
                        self.hand_over(transform);
                    }
                    return None;
                }

                self.session = None;
                if session.dragging || session.multi || session.anchor != id {
                    return None;
                }

                self.track_hover(position, transform);
                let (x, y) = transform.cell_at(position);
                Some(Intent::Place { x, y })
            }
            InputEvent::PointerCancel { id } => {
                self.pointers.remove(&id)?;
                self.hover = None;
                if self.pointers.is_empty() {
                    self.session = None;
                } else if self.session.is_some_and(|s| s.anchor == id) {
                    self.hand_over(transform);
                }
                None
            }
            InputEvent::PointerLeave => {
                self.hover = None;
                None
            }
            InputEvent::Wheel { position, delta_y } => {
                let factor = if delta_y < 0.0 {
                    ZOOM_IN_FACTOR
                } else if delta_y > 0.0 {
                    ZOOM_OUT_FACTOR
                } else {
                    return None;
                };
                let anchor = transform.viewport_to_board(position);
                if transform.zoom_by(factor, Some(anchor)) {
                    self.rebase(transform);
                }
                None
            }
            InputEvent::Key(command) => {
                match command {
                    KeyCommand::ZoomIn => {
                        transform.zoom_by(ZOOM_IN_FACTOR, None);
                    }
                    KeyCommand::ZoomOut => {
                        transform.zoom_by(ZOOM_OUT_FACTOR, None);
                    }
                    KeyCommand::ResetView => {
                        transform.set_zoom(self.home_scale, None);
                        let display = transform.display_size();
                        transform.reset_viewport(display.x, display.y);
                    }
                    KeyCommand::Pan(delta) => transform.pan_by(delta),
                }
                self.rebase(transform);
                self.hover = None;
                None
            }
        }
    }

    /// Pass the pan to a remaining pointer so the view does not jump
    fn hand_over(&mut self, transform: &CoordinateTransform) {
        let next = self.pointers.iter().min_by_key(|(id, _)| id.0).map(|(id, g)| (*id, g.last));
        if let (Some(session), Some((id, last))) = (self.session.as_mut(), next) {
            session.anchor = id;
            session.start = last;
            session.origin = transform.offset();
        }
    }

    /// The viewport moved under an ongoing drag; continue from here
    fn rebase(&mut self, transform: &CoordinateTransform) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(gesture) = self.pointers.get(&session.anchor) {
            session.start = gesture.last;
            session.origin = transform.offset();
        }
    }

    fn track_hover(&mut self, position: DVec2, transform: &CoordinateTransform) {
        let (x, y) = transform.cell_at(position);
        self.hover = transform.board().contains(x, y).then_some((x, y));
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}
