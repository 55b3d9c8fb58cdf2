use town_engine::{text_line_height_px, Color, DrawSurface, Rect, TextAlign, Vec2, Viewport};

use super::DialogueView;
use crate::app::chat::{Message, Role};
use crate::app::world::GameMap;

const BADGE_BACKDROP: Color = Color::rgba(255, 255, 255, 230);
const INK: Color = Color::rgb(15, 23, 42);
const MUTED: Color = Color::rgb(100, 116, 139);
const PLACEHOLDER: Color = Color::rgb(148, 163, 184);
const OUTDOOR_DOT: Color = Color::rgb(34, 197, 94);
const INDOOR_DOT: Color = Color::rgb(59, 130, 246);
const EXIT_SHADE: Color = Color::rgba(0, 0, 0, 77);
const NOTICE_BACKDROP: Color = Color::rgba(0, 0, 0, 204);
const NOTICE_TITLE: Color = Color::rgb(248, 113, 113);
const NOTICE_BODY: Color = Color::rgb(203, 213, 225);
const PANEL: Color = Color::rgba(255, 255, 255, 242);
const USER_BUBBLE: Color = Color::rgb(37, 99, 235);
const NPC_BUBBLE: Color = Color::rgb(241, 245, 249);
const INPUT_FIELD: Color = Color::rgb(226, 232, 240);

const TEXT_SCALE: u32 = 2;
const PANEL_MARGIN: f32 = 16.0;
const PANEL_MAX_WIDTH: f32 = 720.0;
const PANEL_HEIGHT: f32 = 240.0;
const PANEL_PADDING: f32 = 14.0;
const HEADER_HEIGHT: f32 = 24.0;
const INPUT_HEIGHT: f32 = 28.0;
const BUBBLE_PADDING: f32 = 6.0;
const BUBBLE_GAP: f32 = 6.0;
/// Share of the message column a single bubble may take.
const BUBBLE_MAX_SHARE: f32 = 0.75;
const TYPING_DOT_PERIOD_MS: f64 = 300.0;

pub(crate) fn draw_location_badge(surface: &mut dyn DrawSurface, map: &GameMap) {
    let text_width = surface.measure_text(&map.name, TEXT_SCALE);
    let badge = Rect::new(16.0, 16.0, text_width + 44.0, 32.0);
    surface.fill_round_rect(badge, 10.0, BADGE_BACKDROP);

    let dot = if map.is_outdoor() { OUTDOOR_DOT } else { INDOOR_DOT };
    let middle = badge.y + badge.height * 0.5;
    surface.fill_circle(Vec2::new(badge.x + 16.0, middle), 4.0, dot);
    surface.fill_text(
        &map.name,
        Vec2::new(badge.x + 28.0, middle),
        TextAlign::Left,
        TEXT_SCALE,
        INK,
    );
}

/// Marks the first portal of an indoor map, which is always its way out.
/// Drawn in world space.
pub(crate) fn draw_exit_hint(surface: &mut dyn DrawSurface, map: &GameMap) {
    if map.is_outdoor() {
        return;
    }
    let Some(exit) = map.portals.first() else {
        return;
    };
    surface.fill_rect(exit.rect, EXIT_SHADE);
    surface.fill_text("EXIT", exit.rect.center(), TextAlign::Center, TEXT_SCALE, Color::WHITE);
}

pub(crate) fn draw_credentials_notice(surface: &mut dyn DrawSurface, viewport: Viewport) {
    let width = viewport.width as f32;
    let height = viewport.height as f32;
    surface.fill_rect(Rect::new(0.0, 0.0, width, height), NOTICE_BACKDROP);
    let center = Vec2::new(width * 0.5, height * 0.5);
    surface.fill_text(
        "API Key Required",
        Vec2::new(center.x, center.y - 16.0),
        TextAlign::Center,
        4,
        NOTICE_TITLE,
    );
    surface.fill_text(
        "Set API_KEY to play.",
        Vec2::new(center.x, center.y + 20.0),
        TextAlign::Center,
        TEXT_SCALE,
        NOTICE_BODY,
    );
}

pub(crate) fn draw_fade(surface: &mut dyn DrawSurface, viewport: Viewport, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    surface.fill_rect(
        Rect::new(0.0, 0.0, viewport.width as f32, viewport.height as f32),
        Color::BLACK.with_opacity(opacity),
    );
}

pub(crate) fn draw_dialogue(
    surface: &mut dyn DrawSurface,
    viewport: Viewport,
    dialogue: &DialogueView<'_>,
    anim_time_ms: f64,
) {
    let width = (viewport.width as f32 - PANEL_MARGIN * 2.0).clamp(0.0, PANEL_MAX_WIDTH);
    let panel = Rect::new(
        (viewport.width as f32 - width) * 0.5,
        viewport.height as f32 - PANEL_HEIGHT - PANEL_MARGIN,
        width,
        PANEL_HEIGHT,
    );
    surface.fill_round_rect(panel, 12.0, PANEL);

    let header_middle = panel.y + PANEL_PADDING + HEADER_HEIGHT * 0.5 - 4.0;
    surface.fill_text(
        &dialogue.npc.name,
        Vec2::new(panel.x + PANEL_PADDING, header_middle),
        TextAlign::Left,
        TEXT_SCALE,
        INK,
    );
    surface.fill_text(
        "ESC to leave",
        Vec2::new(panel.right() - PANEL_PADDING, header_middle),
        TextAlign::Right,
        1,
        MUTED,
    );

    let column = Rect::new(
        panel.x + PANEL_PADDING,
        panel.y + PANEL_PADDING + HEADER_HEIGHT,
        panel.width - PANEL_PADDING * 2.0,
        panel.height - PANEL_PADDING * 3.0 - HEADER_HEIGHT - INPUT_HEIGHT,
    );
    draw_transcript(surface, column, dialogue, anim_time_ms);

    let input = Rect::new(
        column.x,
        panel.bottom() - PANEL_PADDING - INPUT_HEIGHT,
        column.width,
        INPUT_HEIGHT,
    );
    draw_input_line(surface, input, dialogue);
}

/// Lays bubbles out from the bottom of the column upward and stops at the
/// first one that no longer fits, so the newest messages are always shown.
fn draw_transcript(
    surface: &mut dyn DrawSurface,
    column: Rect,
    dialogue: &DialogueView<'_>,
    anim_time_ms: f64,
) {
    let line_height = text_line_height_px(TEXT_SCALE);
    let char_width = surface.measure_text("MM", TEXT_SCALE) - surface.measure_text("M", TEXT_SCALE);
    let max_chars = ((column.width * BUBBLE_MAX_SHARE - BUBBLE_PADDING * 2.0) / char_width)
        .floor()
        .max(1.0) as usize;

    let mut bottom = column.bottom();
    if dialogue.loading {
        let dots = ".".repeat(typing_dot_count(anim_time_ms));
        let bubble = bubble_rect(surface, column, bottom, &[dots.clone()], Role::Npc);
        surface.fill_round_rect(bubble, 8.0, NPC_BUBBLE);
        draw_bubble_lines(surface, bubble, &[dots], Role::Npc);
        bottom = bubble.y - BUBBLE_GAP;
    }

    for message in dialogue.messages.iter().rev() {
        let lines = wrap_text(&message.text, max_chars);
        let height = lines.len() as f32 * line_height + BUBBLE_PADDING * 2.0;
        if bottom - height < column.y {
            break;
        }
        let bubble = bubble_rect(surface, column, bottom, &lines, message.role);
        surface.fill_round_rect(bubble, 8.0, bubble_color(message));
        draw_bubble_lines(surface, bubble, &lines, message.role);
        bottom = bubble.y - BUBBLE_GAP;
    }
}

fn bubble_rect(
    surface: &dyn DrawSurface,
    column: Rect,
    bottom: f32,
    lines: &[String],
    role: Role,
) -> Rect {
    let line_height = text_line_height_px(TEXT_SCALE);
    let text_width = lines
        .iter()
        .map(|line| surface.measure_text(line, TEXT_SCALE))
        .fold(0.0_f32, f32::max);
    let width = text_width + BUBBLE_PADDING * 2.0;
    let height = lines.len() as f32 * line_height + BUBBLE_PADDING * 2.0;
    let x = match role {
        Role::User => column.right() - width,
        Role::Npc => column.x,
    };
    Rect::new(x, bottom - height, width, height)
}

fn draw_bubble_lines(surface: &mut dyn DrawSurface, bubble: Rect, lines: &[String], role: Role) {
    let line_height = text_line_height_px(TEXT_SCALE);
    let color = match role {
        Role::User => Color::WHITE,
        Role::Npc => INK,
    };
    for (index, line) in lines.iter().enumerate() {
        let middle = bubble.y + BUBBLE_PADDING + line_height * (index as f32 + 0.5);
        surface.fill_text(
            line,
            Vec2::new(bubble.x + BUBBLE_PADDING, middle),
            TextAlign::Left,
            TEXT_SCALE,
            color,
        );
    }
}

fn bubble_color(message: &Message) -> Color {
    match message.role {
        Role::User => USER_BUBBLE,
        Role::Npc => NPC_BUBBLE,
    }
}

fn draw_input_line(surface: &mut dyn DrawSurface, field: Rect, dialogue: &DialogueView<'_>) {
    surface.fill_round_rect(field, 8.0, INPUT_FIELD);
    let middle = field.y + field.height * 0.5;
    let text_left = field.x + 8.0;

    if dialogue.draft.is_empty() {
        surface.fill_rect(Rect::new(text_left, middle - 6.0, 2.0, 12.0), INK);
        surface.fill_text(
            "Type a message...",
            Vec2::new(text_left + 6.0, middle),
            TextAlign::Left,
            TEXT_SCALE,
            PLACEHOLDER,
        );
        return;
    }

    // Long drafts scroll so the tail and caret stay visible.
    let available = field.width - 24.0;
    let mut visible = dialogue.draft;
    while !visible.is_empty() && surface.measure_text(visible, TEXT_SCALE) > available {
        let mut chars = visible.chars();
        chars.next();
        visible = chars.as_str();
    }
    surface.fill_text(visible, Vec2::new(text_left, middle), TextAlign::Left, TEXT_SCALE, INK);
    let caret_x = text_left + surface.measure_text(visible, TEXT_SCALE) + 3.0;
    surface.fill_rect(Rect::new(caret_x, middle - 6.0, 2.0, 12.0), INK);
}

/// One to three dots, cycling.
pub(crate) fn typing_dot_count(anim_time_ms: f64) -> usize {
    let step = (anim_time_ms.max(0.0) / TYPING_DOT_PERIOD_MS) as u64;
    (step % 3) as usize + 1
}

/// Greedy word wrap to `max_chars` per line. Words longer than a line are
/// split. Whitespace runs collapse to one space.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}
