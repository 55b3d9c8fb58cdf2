use town_engine::{Color, DrawSurface, Rect, Vec2};

use crate::app::world::{Crosswalk, FloorStyle, GameMap, Road};

const TILE_PITCH: f32 = 40.0;
const TILE_LINE: Color = Color::rgba(0, 0, 0, 13);
const PLANK_PITCH: f32 = 30.0;
const PLANK_LINE: Color = Color::rgba(0, 0, 0, 26);

const SIDEWALK: Color = Color::rgb(203, 213, 225);
const SIDEWALK_WIDTH: f32 = 12.0;
const ASPHALT: Color = Color::rgb(148, 163, 184);
const ROAD_MARKING: Color = Color::rgb(226, 232, 240);
const ROAD_DASH: [f32; 2] = [20.0, 20.0];

const CROSSWALK_STRIPE: f32 = 10.0;
const CROSSWALK_STEP: f32 = 15.0;

const FLOWER_RADIUS: f32 = 3.0;

const INDOOR_WALL: Color = Color::rgb(51, 65, 85);
const INDOOR_WALL_WIDTH: f32 = 20.0;

/// Base fill plus the floor pattern over the whole map.
pub(crate) fn draw_floor(surface: &mut dyn DrawSurface, map: &GameMap) {
    surface.fill_rect(Rect::new(0.0, 0.0, map.width, map.height), map.floor_color);

    match map.floor {
        FloorStyle::Tile => {
            for x in grid(map.width, TILE_PITCH) {
                surface.stroke_line(Vec2::new(x, 0.0), Vec2::new(x, map.height), 1.0, TILE_LINE);
            }
            for y in grid(map.height, TILE_PITCH) {
                surface.stroke_line(Vec2::new(0.0, y), Vec2::new(map.width, y), 1.0, TILE_LINE);
            }
        }
        FloorStyle::Wood => {
            for x in grid(map.width, PLANK_PITCH) {
                surface.stroke_line(Vec2::new(x, 0.0), Vec2::new(x, map.height), 1.0, PLANK_LINE);
            }
        }
        FloorStyle::Grass | FloorStyle::Carpet => {}
    }
}

/// Roads, crosswalks, water and flowers: everything flat that sits under props.
pub(crate) fn draw_outdoor_ground(surface: &mut dyn DrawSurface, map: &GameMap) {
    for road in &map.roads {
        draw_road(surface, road);
    }
    for crosswalk in &map.crosswalks {
        draw_crosswalk(surface, crosswalk);
    }
    if let Some(water) = &map.water {
        surface.fill_ellipse(water.center, water.radius_x, water.radius_y, water.color);
    }
    for flower in &map.flowers {
        surface.fill_circle(flower.position, FLOWER_RADIUS, flower.color);
    }
}

pub(crate) fn draw_indoor_walls(surface: &mut dyn DrawSurface, map: &GameMap) {
    surface.stroke_rect(
        Rect::new(0.0, 0.0, map.width, map.height),
        INDOOR_WALL_WIDTH,
        INDOOR_WALL,
    );
}

fn draw_road(surface: &mut dyn DrawSurface, road: &Road) {
    let rect = road.rect;
    surface.fill_rect(rect.inflated(SIDEWALK_WIDTH), SIDEWALK);
    surface.fill_rect(rect, ASPHALT);

    let (from, to) = if road.is_horizontal() {
        let mid = rect.y + rect.height * 0.5;
        (Vec2::new(rect.x, mid), Vec2::new(rect.right(), mid))
    } else {
        let mid = rect.x + rect.width * 0.5;
        (Vec2::new(mid, rect.y), Vec2::new(mid, rect.bottom()))
    };
    surface.save();
    surface.set_line_dash(&ROAD_DASH);
    surface.stroke_line(from, to, 4.0, ROAD_MARKING);
    surface.restore();
}

fn draw_crosswalk(surface: &mut dyn DrawSurface, crosswalk: &Crosswalk) {
    let rect = crosswalk.rect;
    if crosswalk.vertical {
        for offset in grid(rect.height, CROSSWALK_STEP) {
            surface.fill_rect(
                Rect::new(rect.x, rect.y + offset, rect.width, CROSSWALK_STRIPE),
                Color::WHITE,
            );
        }
    } else {
        for offset in grid(rect.width, CROSSWALK_STEP) {
            surface.fill_rect(
                Rect::new(rect.x + offset, rect.y, CROSSWALK_STRIPE, rect.height),
                Color::WHITE,
            );
        }
    }
}

/// Offsets `0, pitch, 2*pitch, ...` strictly below `extent`.
fn grid(extent: f32, pitch: f32) -> impl Iterator<Item = f32> {
    let count = if pitch > 0.0 && extent > 0.0 {
        (extent / pitch).ceil() as usize
    } else {
        0
    };
    (0..count).map(move |index| index as f32 * pitch)
}
