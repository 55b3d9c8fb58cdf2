use town_engine::{Vec2, Viewport};

/// Top-left world coordinate shown at the viewport origin.
///
/// The camera centers on `focus` and clamps to the map edges. On an axis
/// where the map is smaller than the viewport the map is centered instead,
/// which yields a negative offset.
pub(crate) fn camera_offset(focus: Vec2, map_width: f32, map_height: f32, viewport: Viewport) -> Vec2 {
    Vec2::new(
        axis_offset(focus.x, map_width, viewport.width as f32),
        axis_offset(focus.y, map_height, viewport.height as f32),
    )
}

fn axis_offset(focus: f32, extent: f32, view: f32) -> f32 {
    if extent < view {
        return -(view - extent) * 0.5;
    }
    (focus - view * 0.5).clamp(0.0, extent - view)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport {
        width: 1280,
        height: 720,
    };

    #[test]
    fn camera_follows_focus_in_the_middle_of_a_large_map() {
        let offset = camera_offset(Vec2::new(1200.0, 900.0), 2400.0, 1800.0, VIEW);
        assert_eq!(offset, Vec2::new(560.0, 540.0));
    }

    #[test]
    fn camera_clamps_to_map_edges() {
        let top_left = camera_offset(Vec2::new(20.0, 20.0), 2400.0, 1800.0, VIEW);
        assert_eq!(top_left, Vec2::ZERO);

        let bottom_right = camera_offset(Vec2::new(2390.0, 1790.0), 2400.0, 1800.0, VIEW);
        assert_eq!(bottom_right, Vec2::new(1120.0, 1080.0));
    }

    #[test]
    fn small_map_is_centered_with_negative_offset() {
        let offset = camera_offset(Vec2::new(400.0, 300.0), 800.0, 600.0, VIEW);
        assert_eq!(offset, Vec2::new(-240.0, -60.0));
    }

    #[test]
    fn map_narrower_than_view_centers_only_that_axis() {
        let view = Viewport {
            width: 1000,
            height: 400,
        };
        let offset = camera_offset(Vec2::new(400.0, 500.0), 800.0, 600.0, view);
        assert_eq!(offset, Vec2::new(-100.0, 200.0));
    }
}
