use std::f32::consts::TAU;
use std::ops::Range;

use crate::app::Vec2;

use super::font;
use super::{Color, DrawSurface, Rect, TextAlign, Viewport};

const ARC_SEGMENTS_MIN: f32 = 12.0;
const ARC_SEGMENTS_MAX: f32 = 128.0;
const ARC_PX_PER_SEGMENT: f32 = 4.0;
const DASH_EPSILON: f32 = 0.0001;

#[derive(Debug, Clone, Default)]
struct CanvasState {
    offset: Vec2,
    dash: Vec<f32>,
}

/// Rasterizes onto an RGBA8 frame. A pixel is covered when its center lies
/// inside the shape; everything outside the frame is clipped.
pub struct SoftwareCanvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    state: CanvasState,
    saved: Vec<CanvasState>,
    scanline_hits: Vec<f32>,
}

impl<'a> SoftwareCanvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
            state: CanvasState::default(),
            saved: Vec::new(),
            scanline_hits: Vec::new(),
        }
    }

    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_rgba();
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&rgba);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let offset = self.byte_offset(x as i32, y as i32)?;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.frame[offset..offset + 4]);
        Some(rgba)
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let offset = pixel.checked_mul(4)?;
        (offset + 4 <= self.frame.len()).then_some(offset)
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if color.a == 0 {
            return;
        }
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let dst = &mut self.frame[offset..offset + 4];
        if color.a == 255 {
            dst.copy_from_slice(&color.to_rgba());
            return;
        }
        let alpha = color.a as u32;
        let inverse = 255 - alpha;
        for (channel, src) in dst.iter_mut().zip([color.r, color.g, color.b]) {
            *channel = ((src as u32 * alpha + *channel as u32 * inverse + 127) / 255) as u8;
        }
        dst[3] = dst[3].max(color.a);
    }

    fn device(&self, point: Vec2) -> Vec2 {
        point + self.state.offset
    }

    fn covered_range(start: f32, end: f32, limit: u32) -> Range<i32> {
        let first = (start - 0.5).ceil().max(0.0) as i32;
        let last = ((end - 0.5).ceil() as i32).min(limit as i32);
        first..last.max(first)
    }

    fn fill_span(&mut self, row: i32, x_start: f32, x_end: f32, color: Color) {
        if row < 0 || row >= self.height as i32 {
            return;
        }
        for x in Self::covered_range(x_start, x_end, self.width) {
            self.blend_pixel(x, row, color);
        }
    }

    fn fill_device_rect(&mut self, left: f32, top: f32, right: f32, bottom: f32, color: Color) {
        for row in Self::covered_range(top, bottom, self.height) {
            self.fill_span(row, left, right, color);
        }
    }

    fn fill_device_polygon(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 {
            return;
        }
        let (min_y, max_y) = points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), point| {
            (lo.min(point.y), hi.max(point.y))
        });
        let mut hits = std::mem::take(&mut self.scanline_hits);
        for row in Self::covered_range(min_y, max_y, self.height) {
            let center_y = row as f32 + 0.5;
            hits.clear();
            for (index, a) in points.iter().enumerate() {
                let b = points[(index + 1) % points.len()];
                let crosses =
                    (a.y <= center_y && b.y > center_y) || (b.y <= center_y && a.y > center_y);
                if crosses {
                    hits.push(a.x + (center_y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            hits.sort_by(f32::total_cmp);
            for pair in hits.chunks_exact(2) {
                self.fill_span(row, pair[0], pair[1], color);
            }
        }
        self.scanline_hits = hits;
    }

    fn fill_device_segment(&mut self, from: Vec2, to: Vec2, line_width: f32, color: Color) {
        let delta = to - from;
        let length = delta.length();
        if length <= f32::EPSILON {
            return;
        }
        let half = (line_width * 0.5).max(0.5);
        let normal = Vec2::new(-delta.y / length * half, delta.x / length * half);
        let quad = [
            from + normal,
            to + normal,
            to - normal,
            from - normal,
        ];
        self.fill_device_polygon(&quad, color);
    }

    fn dash_pattern(&self) -> Option<Vec<f32>> {
        let dash = &self.state.dash;
        if dash.is_empty() || dash.iter().sum::<f32>() <= DASH_EPSILON {
            return None;
        }
        let mut pattern = dash.clone();
        if pattern.len() % 2 == 1 {
            pattern.extend_from_slice(dash);
        }
        Some(pattern)
    }
}

impl DrawSurface for SoftwareCanvas<'_> {
    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }

    fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.offset += Vec2::new(dx, dy);
    }

    fn set_line_dash(&mut self, segments: &[f32]) {
        self.state.dash = segments.iter().map(|length| length.max(0.0)).collect();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let origin = self.device(Vec2::new(rect.x, rect.y));
        self.fill_device_rect(
            origin.x,
            origin.y,
            origin.x + rect.width,
            origin.y + rect.height,
            color,
        );
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f32, color: Color) {
        let half = line_width.max(0.0) * 0.5;
        let outer = rect.inflated(half);
        let inner = rect.inflated(-half);
        if inner.width <= 0.0 || inner.height <= 0.0 {
            self.fill_rect(outer, color);
            return;
        }
        self.fill_rect(Rect::new(outer.x, outer.y, outer.width, inner.y - outer.y), color);
        self.fill_rect(
            Rect::new(outer.x, inner.bottom(), outer.width, outer.bottom() - inner.bottom()),
            color,
        );
        self.fill_rect(Rect::new(outer.x, inner.y, inner.x - outer.x, inner.height), color);
        self.fill_rect(
            Rect::new(inner.right(), inner.y, outer.right() - inner.right(), inner.height),
            color,
        );
    }

    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        let radius = radius.min(rect.width * 0.5).min(rect.height * 0.5).max(0.0);
        let origin = self.device(Vec2::new(rect.x, rect.y));
        let (left, top) = (origin.x, origin.y);
        let (right, bottom) = (left + rect.width, top + rect.height);
        for row in Self::covered_range(top, bottom, self.height) {
            let center_y = row as f32 + 0.5;
            let corner_dy = if center_y < top + radius {
                top + radius - center_y
            } else if center_y > bottom - radius {
                center_y - (bottom - radius)
            } else {
                0.0
            };
            let inset = if corner_dy > 0.0 {
                radius - (radius * radius - corner_dy * corner_dy).max(0.0).sqrt()
            } else {
                0.0
            };
            self.fill_span(row, left + inset, right - inset, color);
        }
    }

    fn fill_ellipse(&mut self, center: Vec2, radius_x: f32, radius_y: f32, color: Color) {
        if radius_x <= 0.0 || radius_y <= 0.0 {
            return;
        }
        let center = self.device(center);
        for row in Self::covered_range(center.y - radius_y, center.y + radius_y, self.height) {
            let t = (row as f32 + 0.5 - center.y) / radius_y;
            if t.abs() >= 1.0 {
                continue;
            }
            let half = radius_x * (1.0 - t * t).sqrt();
            self.fill_span(row, center.x - half, center.x + half, color);
        }
    }

    fn stroke_ellipse(
        &mut self,
        center: Vec2,
        radius_x: f32,
        radius_y: f32,
        line_width: f32,
        color: Color,
    ) {
        let half = line_width.max(0.0) * 0.5;
        let (outer_x, outer_y) = (radius_x + half, radius_y + half);
        let (inner_x, inner_y) = (radius_x - half, radius_y - half);
        if inner_x <= 0.0 || inner_y <= 0.0 {
            self.fill_ellipse(center, outer_x, outer_y, color);
            return;
        }
        let center = self.device(center);
        for row in Self::covered_range(center.y - outer_y, center.y + outer_y, self.height) {
            let dy = row as f32 + 0.5 - center.y;
            let outer_t = dy / outer_y;
            if outer_t.abs() >= 1.0 {
                continue;
            }
            let outer_half = outer_x * (1.0 - outer_t * outer_t).sqrt();
            let inner_t = dy / inner_y;
            if inner_t.abs() >= 1.0 {
                self.fill_span(row, center.x - outer_half, center.x + outer_half, color);
                continue;
            }
            let inner_half = inner_x * (1.0 - inner_t * inner_t).sqrt();
            self.fill_span(row, center.x - outer_half, center.x - inner_half, color);
            self.fill_span(row, center.x + inner_half, center.x + outer_half, color);
        }
    }

    fn fill_arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let sweep = (end_angle - start_angle).clamp(-TAU, TAU);
        let segments = (sweep.abs() * radius / ARC_PX_PER_SEGMENT)
            .ceil()
            .clamp(ARC_SEGMENTS_MIN, ARC_SEGMENTS_MAX) as usize;
        let center = self.device(center);
        let points = (0..=segments)
            .map(|index| {
                let angle = start_angle + sweep * index as f32 / segments as f32;
                Vec2::new(center.x + angle.cos() * radius, center.y + angle.sin() * radius)
            })
            .collect::<Vec<_>>();
        self.fill_device_polygon(&points, color);
    }

    fn fill_path(&mut self, points: &[Vec2], color: Color) {
        let device = points
            .iter()
            .map(|point| self.device(*point))
            .collect::<Vec<_>>();
        self.fill_device_polygon(&device, color);
    }

    fn stroke_path(&mut self, points: &[Vec2], line_width: f32, color: Color) {
        let device = points
            .iter()
            .map(|point| self.device(*point))
            .collect::<Vec<_>>();
        let Some(pattern) = self.dash_pattern() else {
            for pair in device.windows(2) {
                self.fill_device_segment(pair[0], pair[1], line_width, color);
            }
            return;
        };

        let mut dash_index = 0usize;
        let mut dash_remaining = pattern[0];
        let mut pen_down = true;
        for pair in device.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let length = from.distance(to);
            let mut consumed = 0.0f32;
            while length - consumed > DASH_EPSILON {
                let step = dash_remaining.min(length - consumed);
                if pen_down && step > DASH_EPSILON {
                    let a = from + (to - from).scaled(consumed / length);
                    let b = from + (to - from).scaled((consumed + step) / length);
                    self.fill_device_segment(a, b, line_width, color);
                }
                consumed += step;
                dash_remaining -= step;
                if dash_remaining <= DASH_EPSILON {
                    dash_index = (dash_index + 1) % pattern.len();
                    dash_remaining = pattern[dash_index];
                    pen_down = !pen_down;
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, anchor: Vec2, align: TextAlign, scale: u32, color: Color) {
        let scale = scale.max(1);
        let width = font::text_width_px(text, scale);
        let left = match align {
            TextAlign::Left => anchor.x,
            TextAlign::Center => anchor.x - width * 0.5,
            TextAlign::Right => anchor.x - width,
        };
        let top = anchor.y - font::glyph_height_px(scale) * 0.5;
        let cell = scale as f32;
        for (index, ch) in text.chars().enumerate() {
            let glyph_left = left + index as f32 * font::advance_px(scale);
            for (col, row) in font::glyph_cells(ch) {
                self.fill_rect(
                    Rect::new(
                        glyph_left + col as f32 * cell,
                        top + row as f32 * cell,
                        cell,
                        cell,
                    ),
                    color,
                );
            }
        }
    }
}
