use std::f32::consts::PI;

use town_engine::{Color, DrawSurface, Rect, TextAlign, Vec2};

use crate::app::town::INTERACTION_RADIUS;
use crate::app::world::{Building, Furniture, FurnitureKind, Npc, NpcAppearance, Tree};

const SHADOW: Color = Color::rgba(0, 0, 0, 38);
const BUILDING_SHADOW: Color = Color::rgba(0, 0, 0, 51);
const SIDE_SHADE: Color = Color::rgba(0, 0, 0, 26);
const HIGHLIGHT: Color = Color::rgba(255, 255, 255, 26);
const INK: Color = Color::rgb(15, 23, 42);
const SLATE_DARK: Color = Color::rgb(30, 41, 59);
const SLATE: Color = Color::rgb(51, 65, 85);
const SLATE_LIGHT: Color = Color::rgb(148, 163, 184);
const GLASS: Color = Color::rgb(186, 230, 253);
const WALL: Color = Color::rgb(248, 250, 252);
const FOLIAGE: Color = Color::rgb(34, 197, 94);
const TRUNK: Color = Color::rgb(93, 64, 55);
const CANOPY: Color = Color::rgb(21, 128, 61);
const POOL: Color = Color::rgb(147, 197, 253);
const POOL_RIM: Color = Color::rgb(226, 232, 240);
const SPOUT: Color = Color::rgb(241, 245, 249);
const SPRAY: Color = Color::rgba(255, 255, 255, 153);
const LAMP_GLOW: Color = Color::rgb(253, 230, 138);
const LAMP_HALO: Color = Color::rgba(253, 230, 138, 90);
const PLAYER_MARKER: Color = Color::rgba(255, 255, 255, 204);
const LABEL_BACKDROP: Color = Color::rgba(15, 23, 42, 153);
const BOOK_COLORS: [Color; 4] = [
    Color::rgb(239, 68, 68),
    Color::rgb(59, 130, 246),
    Color::rgb(234, 179, 8),
    Color::rgb(34, 197, 94),
];

pub(crate) const PLAYER_APPEARANCE: NpcAppearance = NpcAppearance {
    skin: Color::rgb(252, 165, 165),
    hair: Color::rgb(59, 7, 100),
    shirt: Color::rgb(219, 39, 119),
    pants: Color::rgb(251, 207, 232),
};

/// Speech bubble shows while the player is this close to an NPC.
const BUBBLE_DISTANCE: f32 = INTERACTION_RADIUS * 2.5;
/// Offsets of spray droplets from the fountain spout, fixed so the prop does
/// not flicker between redraws.
const SPRAY_OFFSETS: [(f32, f32); 5] = [
    (-14.0, -6.0),
    (9.0, -9.0),
    (-4.0, 5.0),
    (17.0, 3.0),
    (2.0, -12.0),
];

/// Feet-anchored figure: `position` is where the shadow sits.
pub(crate) struct CharacterPose {
    pub(crate) position: Vec2,
    pub(crate) facing: f32,
    pub(crate) moving: bool,
    pub(crate) anim_time_ms: f64,
}

pub(crate) fn draw_character(
    surface: &mut dyn DrawSurface,
    pose: &CharacterPose,
    appearance: &NpcAppearance,
    is_player: bool,
) {
    let Vec2 { x, y } = pose.position;
    let (bob, stride) = if pose.moving {
        let phase = (pose.anim_time_ms / 100.0).sin() as f32;
        (phase * 2.0, phase * 4.0)
    } else {
        (0.0, 0.0)
    };

    surface.fill_ellipse(pose.position, 10.0, 4.0, SHADOW);

    surface.fill_round_rect(Rect::new(x + 1.0, y - 10.0, 4.0, 10.0 + stride), 2.0, appearance.pants);
    surface.fill_round_rect(Rect::new(x - 5.0, y - 10.0, 4.0, 10.0 - stride), 2.0, appearance.pants);

    surface.fill_round_rect(Rect::new(x - 8.0, y - 24.0 + bob, 16.0, 16.0), 4.0, appearance.shirt);

    let head = Vec2::new(x, y - 28.0 + bob);
    surface.fill_circle(head, 7.0, appearance.skin);
    surface.fill_arc(Vec2::new(x, y - 29.0 + bob), 7.5, PI, 2.0 * PI, appearance.hair);
    // Back of the head stays covered on the side away from the facing.
    let nape = Rect::new(
        if pose.facing < 0.0 { x + 3.0 } else { x - 7.5 },
        y - 29.0 + bob,
        4.5,
        5.0,
    );
    surface.fill_rect(nape, appearance.hair);

    let eye_x = x + pose.facing.signum() * 2.5;
    for dx in [-2.0, 2.0] {
        surface.fill_rect(Rect::new(eye_x + dx - 0.75, y - 28.0 + bob, 1.5, 2.0), INK);
    }

    if is_player {
        surface.fill_path(
            &[
                Vec2::new(x - 4.0, y - 45.0 + bob),
                Vec2::new(x + 4.0, y - 45.0 + bob),
                Vec2::new(x, y - 40.0 + bob),
            ],
            PLAYER_MARKER,
        );
    }
}

/// NPC figure plus its name label and, when the player is near, a "?" bubble.
pub(crate) fn draw_npc(surface: &mut dyn DrawSurface, npc: &Npc, player_position: Vec2, anim_time_ms: f64) {
    let pose = CharacterPose {
        position: npc.position,
        facing: 1.0,
        moving: false,
        anim_time_ms,
    };
    draw_character(surface, &pose, &npc.appearance, false);

    let Vec2 { x, y } = npc.position;
    let label_width = surface.measure_text(&npc.name, 1) + 8.0;
    surface.fill_round_rect(
        Rect::new(x - label_width * 0.5, y + 5.0, label_width, 11.0),
        3.0,
        LABEL_BACKDROP,
    );
    surface.fill_text(&npc.name, Vec2::new(x, y + 10.5), TextAlign::Center, 1, Color::WHITE);

    if npc.position.distance(player_position) < BUBBLE_DISTANCE {
        surface.fill_circle(Vec2::new(x, y - 55.0), 12.0, Color::WHITE);
        surface.fill_path(
            &[
                Vec2::new(x, y - 45.0),
                Vec2::new(x - 5.0, y - 55.0),
                Vec2::new(x + 5.0, y - 55.0),
            ],
            Color::WHITE,
        );
        surface.fill_text("?", Vec2::new(x, y - 55.0), TextAlign::Center, 3, Color::BLACK);
    }
}

pub(crate) fn draw_tree(surface: &mut dyn DrawSurface, tree: &Tree) {
    let Vec2 { x, y } = tree.position;
    let s = tree.scale;
    surface.fill_ellipse(tree.position, 14.0 * s, 14.0 * s * 0.4, SHADOW);
    surface.fill_rect(Rect::new(x - 3.0 * s, y - 5.0 * s, 6.0 * s, 10.0 * s), TRUNK);
    surface.fill_circle(Vec2::new(x, y - 30.0 * s), 20.0 * s, CANOPY);
}

pub(crate) fn draw_building(surface: &mut dyn DrawSurface, building: &Building) {
    let Rect {
        x,
        y,
        width: w,
        height: h,
    } = building.rect;

    surface.fill_rect(Rect::new(x + 10.0, y + 10.0, w, h), BUILDING_SHADOW);
    surface.fill_rect(building.rect, WALL);

    let cols = (w / 40.0).floor().max(0.0) as u32;
    let rows = (h / 50.0).floor().max(0.0) as u32;
    for row in 0..rows.saturating_sub(1) {
        for col in 0..cols {
            if !window_lit(building, row, col) {
                continue;
            }
            let wx = x + 15.0 + col as f32 * 35.0;
            let wy = y + 30.0 + row as f32 * 45.0;
            if wx + 20.0 < x + w && wy + 30.0 < y + h {
                surface.fill_rect(Rect::new(wx, wy, 20.0, 30.0), GLASS);
                surface.fill_rect(Rect::new(wx - 2.0, wy + 30.0, 24.0, 4.0), SLATE_LIGHT);
            }
        }
    }

    surface.fill_path(
        &[
            Vec2::new(x - 5.0, y),
            Vec2::new(x + w + 5.0, y),
            Vec2::new(x + w, y + 20.0),
            Vec2::new(x, y + 20.0),
        ],
        building.color,
    );

    let center_x = x + w * 0.5;
    surface.fill_rect(Rect::new(center_x - 40.0, y + 30.0, 80.0, 20.0), SLATE_DARK);
    surface.fill_text(
        &building.label,
        Vec2::new(center_x, y + 40.0),
        TextAlign::Center,
        2,
        Color::WHITE,
    );

    surface.fill_rect(Rect::new(center_x - 15.0, y + h - 40.0, 30.0, 40.0), SLATE);
}

/// Stable per-window hash so roughly seven in ten windows are glazed.
pub(crate) fn window_lit(building: &Building, row: u32, col: u32) -> bool {
    let mut hash = (building.rect.x as i32 as u32).wrapping_mul(73_856_093)
        ^ (building.rect.y as i32 as u32).wrapping_mul(19_349_663)
        ^ row.wrapping_mul(83_492_791)
        ^ col.wrapping_mul(2_654_435_761);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0x5bd1_e995);
    hash ^= hash >> 15;
    hash % 10 < 7
}

pub(crate) fn draw_furniture(surface: &mut dyn DrawSurface, furniture: &Furniture) {
    let Rect {
        x,
        y,
        width: w,
        height: h,
    } = furniture.rect;
    let color = furniture.color;

    if furniture.kind != FurnitureKind::Fountain {
        surface.fill_rect(Rect::new(x + 2.0, y + h - 2.0, w, 4.0), SHADOW);
    }

    // Blocky props are extruded 10px upward with a shaded front face.
    let raised = Rect::new(x, y - 10.0, w, h);
    let front = Rect::new(x, y + h - 10.0, w, 10.0);

    match furniture.kind {
        FurnitureKind::Fountain => {
            let center = furniture.rect.center();
            let pool_ry = (h * 0.5 - 10.0).max(1.0);
            surface.fill_ellipse(center, w * 0.5, pool_ry, POOL);
            surface.stroke_ellipse(center, w * 0.5, pool_ry, 8.0, POOL_RIM);
            surface.fill_circle(Vec2::new(center.x, center.y - 10.0), 20.0, SPOUT);
            for (dx, dy) in SPRAY_OFFSETS {
                surface.fill_circle(Vec2::new(center.x + dx, center.y - 20.0 + dy), 3.0, SPRAY);
            }
        }
        FurnitureKind::Table => {
            surface.fill_rect(raised, color);
            surface.fill_rect(front, SIDE_SHADE);
            surface.fill_rect(Rect::new(x + 5.0, y - 5.0, w - 10.0, h - 10.0), HIGHLIGHT);
            surface.fill_rect(Rect::new(x + 3.0, y + h - 10.0, 4.0, 10.0), SLATE_DARK);
            surface.fill_rect(Rect::new(x + w - 7.0, y + h - 10.0, 4.0, 10.0), SLATE_DARK);
        }
        FurnitureKind::Desk => {
            surface.fill_rect(raised, color);
            surface.fill_rect(front, SIDE_SHADE);
            surface.fill_rect(Rect::new(x + 5.0, y - 5.0, w - 10.0, h - 10.0), HIGHLIGHT);
            let drawer = Rect::new(x + w - 30.0, y + h - 9.0, 22.0, 7.0);
            surface.fill_rect(drawer, SIDE_SHADE);
            surface.fill_rect(Rect::new(drawer.center().x - 3.0, drawer.y + 3.0, 6.0, 1.5), SLATE_LIGHT);
        }
        FurnitureKind::Shelf => {
            surface.fill_rect(raised, color);
            surface.fill_rect(front, SIDE_SHADE);
            let mut row_top = y - 6.0;
            while row_top + 10.0 <= y + h - 12.0 {
                let mut book_x = x + 4.0;
                let mut index = (row_top as i32).unsigned_abs() as usize;
                while book_x + 5.0 <= x + w - 4.0 {
                    let book = BOOK_COLORS[index % BOOK_COLORS.len()];
                    surface.fill_rect(Rect::new(book_x, row_top, 5.0, 10.0), book);
                    book_x += 7.0;
                    index += 1;
                }
                row_top += 14.0;
            }
        }
        FurnitureKind::Bed => {
            surface.fill_rect(raised, color);
            surface.fill_rect(front, SIDE_SHADE);
            surface.fill_rect(Rect::new(x + 10.0, y - 5.0, w - 20.0, 20.0), Color::WHITE);
            let blanket_height = (h - 36.0).max(0.0);
            surface.fill_rect(Rect::new(x + 4.0, y + 20.0, w - 8.0, blanket_height), HIGHLIGHT);
        }
        FurnitureKind::Counter => {
            surface.fill_rect(raised, color);
            surface.fill_rect(front, SIDE_SHADE);
            surface.fill_rect(Rect::new(x, y - 10.0, w, 8.0), HIGHLIGHT);
        }
        FurnitureKind::Bench => {
            surface.fill_rect(raised, color);
            surface.fill_rect(front, SIDE_SHADE);
            for slat in 0..3 {
                let slat_y = y - 7.0 + slat as f32 * 7.0;
                surface.fill_rect(Rect::new(x, slat_y, w, 2.0), SIDE_SHADE);
            }
        }
        FurnitureKind::Chair => {
            surface.fill_rect(furniture.rect, color);
            surface.fill_rect(Rect::new(x, y - 10.0, w, 10.0), color);
            surface.fill_rect(Rect::new(x, y - 10.0, w, 10.0), SIDE_SHADE);
        }
        FurnitureKind::PottedPlant => {
            surface.fill_rect(raised, color);
            let crown = Vec2::new(x + w * 0.5, y);
            surface.fill_circle(Vec2::new(crown.x - w * 0.25, crown.y + 2.0), w / 3.0, FOLIAGE);
            surface.fill_circle(Vec2::new(crown.x + w * 0.25, crown.y + 2.0), w / 3.0, FOLIAGE);
            surface.fill_circle(crown, w * 0.5, FOLIAGE);
        }
        FurnitureKind::Car => {
            surface.fill_round_rect(raised, 6.0, color);
            let wheel_top = y - 10.0;
            let wheel_bottom = y + h - 10.0;
            for wheel_x in [x + w * 0.2, x + w * 0.8] {
                surface.fill_circle(Vec2::new(wheel_x, wheel_top), 5.0, SLATE_DARK);
                surface.fill_circle(Vec2::new(wheel_x, wheel_bottom), 5.0, SLATE_DARK);
            }
            let cabin = Rect::new(x + w * 0.25, y - 6.0, w * 0.5, (h - 8.0).max(0.0));
            surface.fill_round_rect(cabin, 4.0, SIDE_SHADE);
            surface.fill_rect(Rect::new(cabin.x + 3.0, cabin.y + 3.0, cabin.width * 0.3, cabin.height - 6.0), GLASS);
            surface.fill_rect(
                Rect::new(cabin.right() - 3.0 - cabin.width * 0.3, cabin.y + 3.0, cabin.width * 0.3, cabin.height - 6.0),
                GLASS,
            );
        }
        FurnitureKind::Lamp => {
            let center_x = x + w * 0.5;
            surface.fill_rect(Rect::new(x + 4.0, y + h - 4.0, w - 8.0, 4.0), color);
            surface.fill_rect(Rect::new(center_x - 2.0, y, 4.0, h), color);
            surface.fill_circle(Vec2::new(center_x, y + 6.0), 14.0, LAMP_HALO);
            surface.fill_circle(Vec2::new(center_x, y + 6.0), 7.0, LAMP_GLOW);
        }
    }
}
