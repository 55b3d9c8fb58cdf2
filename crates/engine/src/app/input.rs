use super::scene::Vec2;

pub const DRAG_STICK_MAX_RADIUS_PX: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

const ACTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    /// Unit steps per held direction, before any normalization.
    pub(crate) fn key_axes(&self) -> Vec2 {
        let mut axes = Vec2::ZERO;
        if self.is_down(InputAction::MoveUp) {
            axes.y -= 1.0;
        }
        if self.is_down(InputAction::MoveDown) {
            axes.y += 1.0;
        }
        if self.is_down(InputAction::MoveLeft) {
            axes.x -= 1.0;
        }
        if self.is_down(InputAction::MoveRight) {
            axes.x += 1.0;
        }
        axes
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
        }
    }
}

/// Pointer-drag joystick. The drag origin is the press point; the reported
/// vector is the offset from it divided by the max radius, capped at length 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStick {
    origin: Option<Vec2>,
    vector: Vec2,
    max_radius: f32,
}

impl Default for DragStick {
    fn default() -> Self {
        Self::new(DRAG_STICK_MAX_RADIUS_PX)
    }
}

impl DragStick {
    pub fn new(max_radius: f32) -> Self {
        Self {
            origin: None,
            vector: Vec2::ZERO,
            max_radius: max_radius.max(f32::EPSILON),
        }
    }

    pub fn begin(&mut self, position: Vec2) {
        self.origin = Some(position);
        self.vector = Vec2::ZERO;
    }

    pub fn drag_to(&mut self, position: Vec2) {
        let Some(origin) = self.origin else {
            return;
        };
        let offset = position - origin;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            self.vector = Vec2::ZERO;
            return;
        }
        let constrained = distance.min(self.max_radius);
        self.vector = offset.scaled(constrained / (distance * self.max_radius));
    }

    pub fn end(&mut self) {
        self.origin = None;
        self.vector = Vec2::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    pub fn vector(&self) -> Vec2 {
        self.vector
    }
}

/// A non-zero stick vector replaces keyboard input entirely.
pub fn aggregate_direction(keys: Vec2, stick: Vec2) -> Vec2 {
    if stick.is_zero() {
        keys
    } else {
        stick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.0001
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveLeft, true);
        states.set(InputAction::MoveRight, true);
        states.set(InputAction::MoveUp, true);

        assert_eq!(states.key_axes(), Vec2 { x: 0.0, y: -1.0 });
    }

    #[test]
    fn diagonal_keys_are_not_normalized_here() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveDown, true);
        states.set(InputAction::MoveRight, true);

        assert_eq!(states.key_axes(), Vec2 { x: 1.0, y: 1.0 });
    }

    #[test]
    fn drag_stick_reports_fraction_of_radius() {
        let mut stick = DragStick::default();
        stick.begin(Vec2 { x: 100.0, y: 100.0 });
        stick.drag_to(Vec2 { x: 115.0, y: 100.0 });

        let vector = stick.vector();
        assert!(approx_eq(vector.x, 0.3));
        assert!(approx_eq(vector.y, 0.0));
    }

    #[test]
    fn drag_stick_caps_at_unit_length() {
        let mut stick = DragStick::default();
        stick.begin(Vec2 { x: 0.0, y: 0.0 });
        stick.drag_to(Vec2 { x: 300.0, y: 400.0 });

        let vector = stick.vector();
        assert!(approx_eq(vector.length(), 1.0));
        assert!(approx_eq(vector.x, 0.6));
        assert!(approx_eq(vector.y, 0.8));
    }

    #[test]
    fn drag_without_begin_is_ignored_and_end_resets() {
        let mut stick = DragStick::default();
        stick.drag_to(Vec2 { x: 40.0, y: 0.0 });
        assert!(stick.vector().is_zero());

        stick.begin(Vec2 { x: 0.0, y: 0.0 });
        stick.drag_to(Vec2 { x: 0.0, y: -25.0 });
        assert!(stick.is_active());
        stick.end();
        assert!(!stick.is_active());
        assert!(stick.vector().is_zero());
    }

    #[test]
    fn stick_takes_precedence_over_keys() {
        let keys = Vec2 { x: 1.0, y: 1.0 };
        let stick = Vec2 { x: -0.2, y: 0.0 };

        assert_eq!(aggregate_direction(keys, stick), stick);
        assert_eq!(aggregate_direction(keys, Vec2::ZERO), keys);
        assert!(aggregate_direction(Vec2::ZERO, Vec2::ZERO).is_zero());
    }
}
