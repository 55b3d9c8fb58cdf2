//! Frame composition over a `DrawSurface`.
//!
//! Layers, back to front: floor, flat ground decoration (or indoor walls),
//! depth-sorted props and characters, then screen-space HUD. Nothing here
//! mutates simulation state.

mod camera;
mod depth;
mod ground;
mod hud;
mod props;

use town_engine::DrawSurface;

use crate::app::chat::Message;
use crate::app::town::PlayerState;
use crate::app::world::{GameMap, Npc};

use camera::camera_offset;
use depth::{collect_draw_items, DrawItem};

/// Read-only snapshot of everything one frame needs.
pub(crate) struct FrameView<'a> {
    pub(crate) map: &'a GameMap,
    pub(crate) npcs: Vec<&'a Npc>,
    pub(crate) player: &'a PlayerState,
    pub(crate) dialogue: Option<DialogueView<'a>>,
    pub(crate) transition_opacity: f32,
    pub(crate) credentials_ready: bool,
    pub(crate) anim_time_ms: f64,
}

pub(crate) struct DialogueView<'a> {
    pub(crate) npc: &'a Npc,
    pub(crate) messages: &'a [Message],
    pub(crate) draft: &'a str,
    pub(crate) loading: bool,
}

pub(crate) fn render_frame(surface: &mut dyn DrawSurface, view: &FrameView<'_>) {
    let viewport = surface.viewport();
    let map = view.map;
    let camera = camera_offset(view.player.position, map.width, map.height, viewport);

    surface.save();
    surface.translate(-camera.x, -camera.y);

    ground::draw_floor(surface, map);
    if map.is_outdoor() {
        ground::draw_outdoor_ground(surface, map);
    } else {
        ground::draw_indoor_walls(surface, map);
    }

    for item in collect_draw_items(map, &view.npcs, view.player, camera.x, viewport.width as f32) {
        draw_item(surface, item, view);
    }

    hud::draw_exit_hint(surface, map);
    surface.restore();

    hud::draw_location_badge(surface, map);
    if let Some(dialogue) = &view.dialogue {
        hud::draw_dialogue(surface, viewport, dialogue, view.anim_time_ms);
    }
    if !view.credentials_ready {
        hud::draw_credentials_notice(surface, viewport);
    }
    hud::draw_fade(surface, viewport, view.transition_opacity);
}

fn draw_item(surface: &mut dyn DrawSurface, item: DrawItem<'_>, view: &FrameView<'_>) {
    match item {
        DrawItem::Player(player) => {
            let pose = props::CharacterPose {
                position: player.position,
                facing: player.facing,
                moving: player.moving,
                anim_time_ms: view.anim_time_ms,
            };
            props::draw_character(surface, &pose, &props::PLAYER_APPEARANCE, true);
        }
        DrawItem::Npc(npc) => {
            props::draw_npc(surface, npc, view.player.position, view.anim_time_ms);
        }
        DrawItem::Tree(tree) => props::draw_tree(surface, tree),
        DrawItem::Building(building) => props::draw_building(surface, building),
        DrawItem::Furniture(furniture) => props::draw_furniture(surface, furniture),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use town_engine::{Color, Rect, TextAlign, Vec2, Viewport};

    use super::*;
    use crate::app::world::{compile_world, WorldRegistry};

    const SHIPPED_WORLD: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../assets/base/world.xml"
    ));

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Translate(f32, f32),
        Save,
        Restore,
        FillRect(Rect, Color),
        Text(String, Vec2),
        Other,
    }

    /// Records calls instead of rasterizing.
    struct RecordingSurface {
        viewport: Viewport,
        ops: Vec<Op>,
    }

    impl RecordingSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                viewport: Viewport { width, height },
                ops: Vec::new(),
            }
        }

        fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(text, _) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl DrawSurface for RecordingSurface {
        fn viewport(&self) -> Viewport {
            self.viewport
        }
        fn save(&mut self) {
            self.ops.push(Op::Save);
        }
        fn restore(&mut self) {
            self.ops.push(Op::Restore);
        }
        fn translate(&mut self, dx: f32, dy: f32) {
            self.ops.push(Op::Translate(dx, dy));
        }
        fn set_line_dash(&mut self, _segments: &[f32]) {
            self.ops.push(Op::Other);
        }
        fn fill_rect(&mut self, rect: Rect, color: Color) {
            self.ops.push(Op::FillRect(rect, color));
        }
        fn stroke_rect(&mut self, _rect: Rect, _line_width: f32, _color: Color) {
            self.ops.push(Op::Other);
        }
        fn fill_round_rect(&mut self, _rect: Rect, _radius: f32, _color: Color) {
            self.ops.push(Op::Other);
        }
        fn fill_ellipse(&mut self, _center: Vec2, _rx: f32, _ry: f32, _color: Color) {
            self.ops.push(Op::Other);
        }
        fn stroke_ellipse(&mut self, _c: Vec2, _rx: f32, _ry: f32, _lw: f32, _color: Color) {
            self.ops.push(Op::Other);
        }
        fn fill_arc(&mut self, _c: Vec2, _r: f32, _start: f32, _end: f32, _color: Color) {
            self.ops.push(Op::Other);
        }
        fn fill_path(&mut self, _points: &[Vec2], _color: Color) {
            self.ops.push(Op::Other);
        }
        fn stroke_path(&mut self, _points: &[Vec2], _line_width: f32, _color: Color) {
            self.ops.push(Op::Other);
        }
        fn fill_text(&mut self, text: &str, anchor: Vec2, _align: TextAlign, _scale: u32, _color: Color) {
            self.ops.push(Op::Text(text.to_string(), anchor));
        }
    }

    fn shipped_world() -> WorldRegistry {
        compile_world(Path::new("world.xml"), SHIPPED_WORLD).expect("shipped world compiles")
    }

    fn view<'a>(world: &'a WorldRegistry, player: &'a PlayerState) -> FrameView<'a> {
        let map = world.map(&player.map_id).expect("map");
        FrameView {
            map,
            npcs: world.npcs_on_map(&map.id).collect(),
            player,
            dialogue: None,
            transition_opacity: 0.0,
            credentials_ready: true,
            anim_time_ms: 0.0,
        }
    }

    #[test]
    fn world_space_is_bracketed_by_camera_translation() {
        let world = shipped_world();
        let player = PlayerState::spawn("world", Vec2::new(1200.0, 900.0));
        let mut surface = RecordingSurface::new(1280, 720);

        render_frame(&mut surface, &view(&world, &player));

        assert_eq!(surface.ops[0], Op::Save);
        assert_eq!(surface.ops[1], Op::Translate(-560.0, -540.0));
        assert!(surface.ops.contains(&Op::Restore));
        assert_eq!(
            surface.ops[2],
            Op::FillRect(Rect::new(0.0, 0.0, 2400.0, 1800.0), world.outdoor_map().floor_color)
        );
    }

    #[test]
    fn indoor_frame_labels_exit_and_location() {
        let world = shipped_world();
        let player = PlayerState::spawn("cafe", Vec2::new(400.0, 300.0));
        let mut surface = RecordingSurface::new(1280, 720);

        render_frame(&mut surface, &view(&world, &player));

        let texts = surface.texts();
        assert!(texts.contains(&"EXIT"));
        assert!(texts.contains(&"The Daily Grind Cafe"));
        assert!(!texts.contains(&"API Key Required"));
    }

    #[test]
    fn fade_overlay_is_drawn_last() {
        let world = shipped_world();
        let player = PlayerState::spawn("world", Vec2::new(1200.0, 900.0));
        let mut frame = view(&world, &player);
        frame.transition_opacity = 0.5;
        let mut surface = RecordingSurface::new(640, 480);

        render_frame(&mut surface, &frame);

        assert_eq!(
            surface.ops.last(),
            Some(&Op::FillRect(
                Rect::new(0.0, 0.0, 640.0, 480.0),
                Color::BLACK.with_opacity(0.5)
            ))
        );
    }

    #[test]
    fn missing_credentials_show_blocking_notice() {
        let world = shipped_world();
        let player = PlayerState::spawn("world", Vec2::new(1200.0, 900.0));
        let mut frame = view(&world, &player);
        frame.credentials_ready = false;
        let mut surface = RecordingSurface::new(640, 480);

        render_frame(&mut surface, &frame);

        assert!(surface.texts().contains(&"API Key Required"));
    }

    #[test]
    fn dialogue_panel_shows_partner_messages_and_typing_indicator() {
        let world = shipped_world();
        let npc = world.npcs_on_map("cafe").next().expect("cafe npc");
        let player = PlayerState::spawn("cafe", Vec2::new(400.0, 300.0));
        let messages = vec![Message::npc("Hello there"), Message::user("Hi")];
        let mut frame = view(&world, &player);
        frame.dialogue = Some(DialogueView {
            npc,
            messages: &messages,
            draft: "one tea",
            loading: true,
        });
        let mut surface = RecordingSurface::new(1280, 720);

        render_frame(&mut surface, &frame);

        let texts = surface.texts();
        assert!(texts.contains(&npc.name.as_str()));
        assert!(texts.contains(&"Hello there"));
        assert!(texts.contains(&"Hi"));
        assert!(texts.contains(&"one tea"));
        assert!(texts.contains(&"."));
    }

    #[test]
    fn question_bubble_appears_only_near_npc() {
        let world = shipped_world();
        let npc = world.npcs_on_map("cafe").next().expect("cafe npc");
        let near = PlayerState::spawn("cafe", npc.position + Vec2::new(0.0, 100.0));
        let far = PlayerState::spawn("cafe", npc.position + Vec2::new(0.0, 130.0));

        let count_bubbles = |player: &PlayerState| {
            let mut surface = RecordingSurface::new(1280, 720);
            render_frame(&mut surface, &view(&world, player));
            surface.texts().iter().filter(|text| **text == "?").count()
        };

        assert_eq!(count_bubbles(&near), 1);
        assert_eq!(count_bubbles(&far), 0);
    }
}
