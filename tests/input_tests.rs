use pixel_canvas::board::BoardSize;
use pixel_canvas::core::{InputEvent, WinitInputAdapter};
use pixel_canvas::input::{InputController, Intent};
use pixel_canvas::viewport::CoordinateTransform;
use winit::dpi::PhysicalPosition;
use winit::event::{DeviceId, ElementState, MouseButton, WindowEvent};

#[cfg(test)]
mod input_tests {
    use super::*;

    fn device() -> DeviceId {
        // SAFETY: only used as an opaque tag in synthesized events
        unsafe { DeviceId::dummy() }
    }

    fn moved(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved { device_id: device(), position: PhysicalPosition::new(x, y) }
    }

    fn button(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput { device_id: device(), state, button: MouseButton::Left }
    }

    fn transform() -> CoordinateTransform {
        // 10 px cells, board origin at (0, 0)
        let mut t = CoordinateTransform::new(BoardSize::new(32, 32), 10.0);
        t.reset_viewport(320.0, 320.0);
        t
    }

    /// Feed window events through the adapter into the controller
    fn run(
        adapter: &mut WinitInputAdapter,
        input: &mut InputController,
        transform: &mut CoordinateTransform,
        events: &[WindowEvent],
    ) -> Vec<Intent> {
        events
            .iter()
            .filter_map(|event| adapter.process_event(event))
            .filter_map(|event: InputEvent| input.handle(event, transform))
            .collect()
    }

    #[test]
    fn test_release_outside_window_does_not_swallow_next_click() {
        let mut adapter = WinitInputAdapter::default();
        let mut input = InputController::default();
        let mut t = transform();

        let intents = run(
            &mut adapter,
            &mut input,
            &mut t,
            &[
                moved(55.0, 35.0),
                button(ElementState::Pressed),
                WindowEvent::CursorLeft { device_id: device() },
                button(ElementState::Released),
            ],
        );
        assert!(intents.is_empty());
        assert!(!input.is_pressed());

        let intents = run(
            &mut adapter,
            &mut input,
            &mut t,
            &[
                WindowEvent::CursorEntered { device_id: device() },
                moved(55.0, 35.0),
                button(ElementState::Pressed),
                button(ElementState::Released),
            ],
        );
        assert_eq!(intents, [Intent::Place { x: 5, y: 3 }]);
    }

    #[test]
    fn test_drag_out_of_window_never_places() {
        let mut adapter = WinitInputAdapter::default();
        let mut input = InputController::default();
        let mut t = transform();

        let intents = run(
            &mut adapter,
            &mut input,
            &mut t,
            &[
                moved(100.0, 100.0),
                button(ElementState::Pressed),
                moved(150.0, 100.0),
                WindowEvent::CursorLeft { device_id: device() },
                button(ElementState::Released),
            ],
        );

        assert!(intents.is_empty());
        assert!(!input.is_dragging());
        assert_eq!(t.offset().x, 50.0);
    }
}
