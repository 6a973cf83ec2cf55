use glam::DVec2;
use pixel_canvas::board::BoardSize;
use pixel_canvas::viewport::{CoordinateTransform, MAX_ZOOM, MIN_ZOOM};

#[cfg(test)]
mod coordinate_tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn transform_with(scale: f64, offset: DVec2) -> CoordinateTransform {
        let mut t = CoordinateTransform::new(BoardSize::new(2000, 2000), scale);
        t.reset_viewport(1280.0, 720.0);
        t.pan_from(offset, DVec2::ZERO);
        t
    }

    fn scales() -> Vec<f64> {
        vec![MIN_ZOOM, 0.5, 1.0, 3.7, 8.0, 19.99, MAX_ZOOM]
    }

    fn offsets() -> Vec<DVec2> {
        vec![
            DVec2::ZERO,
            DVec2::new(-7350.25, 12.5),
            DVec2::new(640.0, -360.0),
            DVec2::new(1e5, 1e5),
        ]
    }

    fn board_points() -> Vec<DVec2> {
        vec![
            DVec2::ZERO,
            DVec2::new(10.5, 10.5),
            DVec2::new(1999.999, 0.001),
            DVec2::new(-3.0, 2500.0),
        ]
    }

    #[test]
    fn test_round_trip_board_viewport_board() {
        for scale in scales() {
            for offset in offsets() {
                let t = transform_with(scale, offset);
                for p in board_points() {
                    let back = t.viewport_to_board(t.board_to_viewport(p));
                    assert!((back - p).length() < 1e-6, "scale {scale} offset {offset} point {p}");
                }
            }
        }
    }

    #[test]
    fn test_zoom_anchor_is_fixed_point() {
        for start in scales() {
            for target in [MIN_ZOOM, 0.33, 2.0, 12.0, 39.5, MAX_ZOOM] {
                for anchor in board_points() {
                    let mut t = transform_with(start, DVec2::new(-120.0, 75.0));
                    let before = t.board_to_viewport(anchor);
                    t.set_zoom(target, Some(anchor));
                    let after = t.board_to_viewport(anchor);
                    assert!((after - before).length() < 1e-6, "{start} -> {target} at {anchor}");
                }
            }
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut t = transform_with(8.0, DVec2::ZERO);
        for value in [-10.0, 0.0, 0.1, 0.25, 1.0, 40.0, 41.0, 1e9] {
            t.set_zoom(value, None);
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&t.scale()), "{value} gave {}", t.scale());
        }
    }

    #[test]
    fn test_tiny_zoom_change_is_ignored() {
        let mut t = transform_with(8.0, DVec2::new(3.0, 4.0));
        assert!(!t.set_zoom(8.005, Some(DVec2::new(100.0, 100.0))));
        assert_eq!(t.scale(), 8.0);
        assert_eq!(t.offset(), DVec2::new(3.0, 4.0));
    }

    #[test]
    fn test_reset_centers_board() {
        let mut t = CoordinateTransform::new(BoardSize::new(100, 50), 4.0);
        t.reset_viewport(800.0, 600.0);
        assert_eq!(t.offset(), DVec2::new(200.0, 200.0));

        let center = t.viewport_to_board(DVec2::new(400.0, 300.0));
        assert!((center - DVec2::new(50.0, 25.0)).length() < EPS);
    }

    #[test]
    fn test_zoom_without_anchor_keeps_display_center() {
        let mut t = CoordinateTransform::new(BoardSize::new(100, 100), 4.0);
        t.reset_viewport(800.0, 600.0);
        let center = DVec2::new(400.0, 300.0);
        let before = t.viewport_to_board(center);

        t.set_zoom(10.0, None);
        assert!((t.viewport_to_board(center) - before).length() < EPS);
    }

    #[test]
    fn test_focus_cell_centers_and_zooms() {
        let mut t = transform_with(2.0, DVec2::ZERO);
        t.focus_cell(500, 700);

        assert_eq!(t.scale(), 20.0);
        let middle = t.board_to_viewport(DVec2::new(500.5, 700.5));
        assert!((middle - DVec2::new(640.0, 360.0)).length() < EPS);
    }

    #[test]
    fn test_cell_at_floors_negative_coordinates() {
        let t = transform_with(10.0, DVec2::ZERO);
        assert_eq!(t.cell_at(DVec2::new(-0.5, 15.0)), (-1, 1));
        assert_eq!(t.cell_at(DVec2::new(19.99, 0.0)), (1, 0));
    }
}
