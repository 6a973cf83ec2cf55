use chrono::{Duration, Utc};
use glam::DVec2;
use pixel_canvas::config::AppConfig;
use pixel_canvas::core::{InputEvent, PointerId};
use pixel_canvas::identity::Identity;
use pixel_canvas::loader::{ArchiveSource, ArchivedPlacement};
use pixel_canvas::sync::LocalBroker;
use pixel_canvas::{AppServices, CanvasApp, Pixel, PlacementResult, UiRequest};

#[cfg(test)]
mod placement_tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            canvas_width: 32,
            canvas_height: 32,
            rate_limit_seconds: 1,
            reconnect_delay_ms: 0,
            initial_scale: 10.0,
            ..AppConfig::default()
        }
    }

    fn archive() -> ArchiveSource {
        ArchiveSource::new(vec![ArchivedPlacement {
            x: 1,
            y: 1,
            c: 6,
            placed_at: Utc::now() - Duration::hours(1),
        }])
    }

    fn app(identity: Identity) -> CanvasApp {
        let config = config();
        let broker = LocalBroker::new(config.routes(), config.transport_settings());
        let mut app = CanvasApp::new(&config, identity, AppServices::new(Box::new(broker), Box::new(archive())));
        app.start(320.0, 320.0);
        app.frame_tick();
        app
    }

    fn click(app: &mut CanvasApp, x: f64, y: f64) -> Option<PlacementResult> {
        let position = DVec2::new(x, y);
        app.handle_input(InputEvent::PointerDown { id: PointerId::MOUSE, position });
        app.handle_input(InputEvent::PointerUp { id: PointerId::MOUSE, position })
    }

    #[test]
    fn test_sign_in_reported_before_history_and_bounds() {
        let mut app = app(Identity::new("ada", "token"));
        assert!(app.load_history(Utc::now() - Duration::minutes(5)));
        app.sign_out();
        assert!(app.is_history_active());

        // Signed out, in history mode and off the board all at once
        assert_eq!(app.place(Pixel::new(-5, 99, 0)), PlacementResult::NotAuthenticated);
        assert_eq!(app.take_ui_requests(), [UiRequest::ShowSignIn]);
        assert_eq!(app.status().latest().unwrap().text, "Sign in to place pixels.");
    }

    #[test]
    fn test_history_mode_blocks_placement() {
        let mut app = app(Identity::new("ada", "token"));
        assert!(app.load_history(Utc::now() - Duration::minutes(5)));

        assert_eq!(app.place(Pixel::new(-5, 99, 0)), PlacementResult::Invalid);
        assert_eq!(app.place(Pixel::new(3, 3, 0)), PlacementResult::Invalid);
        assert!(app.status().latest().unwrap().text.contains("history"));

        app.reset_to_current();
        app.frame_tick();
        assert_eq!(app.place(Pixel::new(3, 3, 0)), PlacementResult::Sent);
    }

    #[test]
    fn test_click_places_selected_color() {
        let mut app = app(Identity::new("ada", "token"));
        assert!(app.select_color(9));

        // Board is 32 cells of 10 px centered in 320 px: origin at 0
        assert_eq!(click(&mut app, 55.0, 35.0), Some(PlacementResult::Sent));
        assert_eq!(app.buffer().color_at(5, 3), Some(9));
        assert_eq!(app.identity().pixel_count, 1);
        assert!(app.cooldown().is_active());
    }

    #[test]
    fn test_cooldown_skips_second_click() {
        let mut app = app(Identity::new("ada", "token"));

        assert_eq!(click(&mut app, 55.0, 35.0), Some(PlacementResult::Sent));
        assert_eq!(click(&mut app, 75.0, 35.0), Some(PlacementResult::Skipped));
        assert_ne!(app.buffer().color_at(7, 3), Some(0));
    }

    #[test]
    fn test_drag_never_places() {
        let mut app = app(Identity::new("ada", "token"));

        app.handle_input(InputEvent::PointerDown { id: PointerId::MOUSE, position: DVec2::new(50.0, 50.0) });
        app.handle_input(InputEvent::PointerMove { id: PointerId::MOUSE, position: DVec2::new(80.0, 50.0) });
        let result = app.handle_input(InputEvent::PointerUp { id: PointerId::MOUSE, position: DVec2::new(80.0, 50.0) });

        assert_eq!(result, None);
        assert_eq!(app.identity().pixel_count, 0);
        assert_eq!(app.transform().offset(), DVec2::new(30.0, 0.0));
    }

    #[test]
    fn test_publish_while_disconnected_is_skipped() {
        let mut app = app(Identity::new("ada", "token"));
        app.shutdown();

        assert_eq!(app.place(Pixel::new(2, 2, 2)), PlacementResult::Skipped);
        assert_eq!(app.status().latest().unwrap().text, "Failed to send pixel.");
        assert!(!app.cooldown().is_active());
    }

    #[test]
    fn test_disabled_placement() {
        let config = AppConfig {
            placement_enabled: false,
            ..config()
        };
        let broker = LocalBroker::new(config.routes(), config.transport_settings());
        let mut app = CanvasApp::new(
            &config,
            Identity::default(),
            AppServices::new(Box::new(broker), Box::new(archive())),
        );

        assert_eq!(app.place(Pixel::new(-1, -1, 99)), PlacementResult::Disabled);
        assert!(app.take_ui_requests().is_empty());
    }
}
