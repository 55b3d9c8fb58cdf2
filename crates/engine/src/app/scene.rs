use std::ops::{Add, AddAssign, Sub};

use super::input::{aggregate_direction, ActionStates};
use super::rendering::DrawSurface;
use super::InputAction;

#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    stick_vector: Vec2,
    typed_text: String,
    backspace_presses: u32,
    submit_pressed: bool,
    cancel_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        actions: ActionStates,
        stick_vector: Vec2,
        typed_text: String,
        backspace_presses: u32,
        submit_pressed: bool,
        cancel_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            actions,
            stick_vector,
            typed_text,
            backspace_presses,
            submit_pressed,
            cancel_pressed,
            window_width,
            window_height,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Merged keyboard and pointer direction; each key axis is in {-1, 0, 1}.
    pub fn movement_direction(&self) -> Vec2 {
        aggregate_direction(self.actions.key_axes(), self.stick_vector)
    }

    pub fn stick_vector(&self) -> Vec2 {
        self.stick_vector
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    pub fn backspace_presses(&self) -> u32 {
        self.backspace_presses
    }

    pub fn submit_pressed(&self) -> bool {
        self.submit_pressed
    }

    pub fn cancel_pressed(&self) -> bool {
        self.cancel_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_stick_vector(mut self, stick_vector: Vec2) -> Self {
        self.stick_vector = stick_vector;
        self
    }

    pub fn with_typed_text(mut self, typed_text: &str) -> Self {
        self.typed_text = typed_text.to_string();
        self
    }

    pub fn with_backspace_presses(mut self, backspace_presses: u32) -> Self {
        self.backspace_presses = backspace_presses;
        self
    }

    pub fn with_submit_pressed(mut self, submit_pressed: bool) -> Self {
        self.submit_pressed = submit_pressed;
        self
    }

    pub fn with_cancel_pressed(mut self, cancel_pressed: bool) -> Self {
        self.cancel_pressed = cancel_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// A scene owns its simulation state. `update` runs once per fixed tick;
/// `render` only reads committed state and is driven by the render observer.
pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot);
    fn render(&mut self, surface: &mut dyn DrawSurface);
    fn unload(&mut self);
    /// Bumped whenever state visible on screen changes.
    fn render_revision(&self) -> u64;
    /// True while something on screen changes without a state commit.
    fn is_animating(&self) -> bool {
        false
    }
    fn debug_title(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_has_no_direction_or_edges() {
        let snapshot = InputSnapshot::empty();

        assert!(snapshot.movement_direction().is_zero());
        assert!(!snapshot.submit_pressed());
        assert!(!snapshot.cancel_pressed());
        assert_eq!(snapshot.typed_text(), "");
        assert_eq!(snapshot.backspace_presses(), 0);
    }

    #[test]
    fn held_keys_drive_movement_direction() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveUp, true);

        assert_eq!(snapshot.movement_direction(), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn stick_vector_overrides_held_keys() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::MoveRight, true)
            .with_stick_vector(Vec2::new(0.0, 0.3));

        assert_eq!(snapshot.movement_direction(), Vec2::new(0.0, 0.3));
    }

    #[test]
    fn vec2_arithmetic() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, 1.0);

        assert_eq!(a + b, Vec2::new(4.0, 5.0));
        assert_eq!(a - b, Vec2::new(2.0, 3.0));
        assert_eq!(a.scaled(2.0), Vec2::new(6.0, 8.0));
        assert!((a.length() - 5.0).abs() < 0.0001);
        assert!((a.distance(Vec2::ZERO) - 5.0).abs() < 0.0001);
    }
}
