mod canvas;
mod font;
mod renderer;

use super::Vec2;

pub use canvas::SoftwareCanvas;
pub use renderer::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Replaces the alpha channel with `opacity` in [0, 1].
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix('#')?;
        let channel = |text: &str| u8::from_str_radix(text, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
            )),
            3 => {
                let expand = |text: &str| channel(text).map(|value| value * 17);
                Some(Self::rgb(
                    expand(digits.get(0..1)?)?,
                    expand(digits.get(1..2)?)?,
                    expand(digits.get(2..3)?)?,
                ))
            }
            _ => None,
        }
    }

    pub(crate) fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Strict interior test; points on an edge are outside.
    pub fn contains_exclusive(&self, point: Vec2) -> bool {
        point.x > self.x && point.x < self.right() && point.y > self.y && point.y < self.bottom()
    }

    pub fn inflated(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Immediate-mode 2D surface. Coordinates pass through the current translation;
/// `save`/`restore` push and pop the translation and dash pattern together.
/// Text anchors are the alignment point on the horizontal axis and the
/// vertical middle of the line.
pub trait DrawSurface {
    fn viewport(&self) -> Viewport;
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    /// Alternating on/off lengths for subsequent strokes. Empty means solid.
    fn set_line_dash(&mut self, segments: &[f32]);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, line_width: f32, color: Color);
    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color);
    fn fill_ellipse(&mut self, center: Vec2, radius_x: f32, radius_y: f32, color: Color);
    fn stroke_ellipse(
        &mut self,
        center: Vec2,
        radius_x: f32,
        radius_y: f32,
        line_width: f32,
        color: Color,
    );
    /// Fills the region between the arc and its chord. Angles in radians,
    /// measured clockwise from +x in screen space.
    fn fill_arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, color: Color);
    fn fill_path(&mut self, points: &[Vec2], color: Color);
    fn stroke_path(&mut self, points: &[Vec2], line_width: f32, color: Color);
    fn fill_text(&mut self, text: &str, anchor: Vec2, align: TextAlign, scale: u32, color: Color);

    fn measure_text(&self, text: &str, scale: u32) -> f32 {
        font::text_width_px(text, scale)
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, line_width: f32, color: Color) {
        self.stroke_path(&[from, to], line_width, color);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.fill_ellipse(center, radius, radius, color);
    }
}

pub fn text_line_height_px(scale: u32) -> f32 {
    font::line_height_px(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_long_and_short_forms() {
        assert_eq!(Color::from_hex("#ecfccb"), Some(Color::rgb(0xec, 0xfc, 0xcb)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("ecfccb"), None);
        assert_eq!(Color::from_hex("#ecfcc"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn rect_containment_excludes_edges() {
        let portal = Rect::new(330.0, 190.0, 40.0, 10.0);

        assert!(portal.contains_exclusive(Vec2::new(350.0, 195.0)));
        assert!(!portal.contains_exclusive(Vec2::new(330.0, 195.0)));
        assert!(!portal.contains_exclusive(Vec2::new(350.0, 200.0)));
        assert!(!portal.contains_exclusive(Vec2::new(350.0, 185.0)));
    }

    #[test]
    fn opacity_maps_to_alpha_channel() {
        assert_eq!(Color::BLACK.with_opacity(0.5).a, 128);
        assert_eq!(Color::BLACK.with_opacity(2.0).a, 255);
        assert_eq!(Color::BLACK.with_opacity(-1.0).a, 0);
    }
}
