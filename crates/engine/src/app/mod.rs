mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::{aggregate_direction, DragStick, InputAction, DRAG_STICK_MAX_RADIUS_PX};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use rendering::{
    text_line_height_px, Color, DrawSurface, Rect, Renderer, SoftwareCanvas, TextAlign, Viewport,
};
pub use scene::{InputSnapshot, Scene, Vec2};
