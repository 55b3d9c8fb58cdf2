//! Static world content: maps, portals, props and the NPC roster.
//!
//! Everything here is compiled once from `world.xml` at startup and never
//! mutated afterwards.

mod compiler;
mod scenery;

use town_engine::{Color, Rect, Vec2};

#[cfg(test)]
pub(crate) use compiler::compile_world;
pub(crate) use compiler::{load_world, WorldCompileError};
pub(crate) use scenery::{Flower, Tree};

pub(crate) const WORLD_FILE_NAME: &str = "world.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapKind {
    Outdoor,
    Indoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FloorStyle {
    Grass,
    Tile,
    Wood,
    Carpet,
}

impl FloorStyle {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw {
            "grass" => Some(Self::Grass),
            "tile" => Some(Self::Tile),
            "wood" => Some(Self::Wood),
            "carpet" => Some(Self::Carpet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Portal {
    pub(crate) rect: Rect,
    pub(crate) target_map: String,
    pub(crate) target_position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FurnitureKind {
    Table,
    Shelf,
    Bed,
    Counter,
    Desk,
    PottedPlant,
    Bench,
    Fountain,
    Chair,
    Car,
    Lamp,
}

impl FurnitureKind {
    pub(crate) const ALL_TOKENS: &'static str =
        "table, shelf, bed, counter, desk, potted_plant, bench, fountain, chair, car, lamp";

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        let kind = match raw {
            "table" => Self::Table,
            "shelf" => Self::Shelf,
            "bed" => Self::Bed,
            "counter" => Self::Counter,
            "desk" => Self::Desk,
            "potted_plant" => Self::PottedPlant,
            "bench" => Self::Bench,
            "fountain" => Self::Fountain,
            "chair" => Self::Chair,
            "car" => Self::Car,
            "lamp" => Self::Lamp,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Furniture {
    pub(crate) kind: FurnitureKind,
    pub(crate) rect: Rect,
    pub(crate) color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Building {
    pub(crate) label: String,
    pub(crate) rect: Rect,
    pub(crate) color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Road {
    pub(crate) rect: Rect,
}

impl Road {
    pub(crate) fn is_horizontal(&self) -> bool {
        self.rect.width > self.rect.height
    }
}

/// `vertical` stripes run top to bottom and are laid out along x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Crosswalk {
    pub(crate) rect: Rect,
    pub(crate) vertical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WaterBody {
    pub(crate) center: Vec2,
    pub(crate) radius_x: f32,
    pub(crate) radius_y: f32,
    pub(crate) color: Color,
}

#[derive(Debug, Clone)]
pub(crate) struct GameMap {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) kind: MapKind,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) floor: FloorStyle,
    pub(crate) floor_color: Color,
    pub(crate) portals: Vec<Portal>,
    pub(crate) furniture: Vec<Furniture>,
    pub(crate) buildings: Vec<Building>,
    pub(crate) roads: Vec<Road>,
    pub(crate) crosswalks: Vec<Crosswalk>,
    pub(crate) water: Option<WaterBody>,
    pub(crate) trees: Vec<Tree>,
    pub(crate) flowers: Vec<Flower>,
}

impl GameMap {
    pub(crate) fn is_outdoor(&self) -> bool {
        self.kind == MapKind::Outdoor
    }

    pub(crate) fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// First portal whose rectangle strictly contains `point`.
    pub(crate) fn portal_at(&self, point: Vec2) -> Option<&Portal> {
        self.portals
            .iter()
            .find(|portal| portal.rect.contains_exclusive(point))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NpcAppearance {
    pub(crate) skin: Color,
    pub(crate) hair: Color,
    pub(crate) shirt: Color,
    pub(crate) pants: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Npc {
    pub(crate) id: String,
    pub(crate) map_id: String,
    pub(crate) name: String,
    pub(crate) profile: String,
    pub(crate) greeting: String,
    pub(crate) position: Vec2,
    pub(crate) appearance: NpcAppearance,
}

#[derive(Debug, Clone)]
pub(crate) struct WorldRegistry {
    maps: Vec<GameMap>,
    npcs: Vec<Npc>,
    outdoor_index: usize,
    start_map: String,
    start_position: Vec2,
}

impl WorldRegistry {
    pub(crate) fn map(&self, id: &str) -> Option<&GameMap> {
        self.maps.iter().find(|map| map.id == id)
    }

    pub(crate) fn maps(&self) -> &[GameMap] {
        &self.maps
    }

    pub(crate) fn outdoor_map(&self) -> &GameMap {
        &self.maps[self.outdoor_index]
    }

    /// Roster order is preserved; proximity checks take the first match.
    pub(crate) fn npcs_on_map<'a>(&'a self, map_id: &'a str) -> impl Iterator<Item = &'a Npc> + 'a {
        self.npcs.iter().filter(move |npc| npc.map_id == map_id)
    }

    pub(crate) fn npc(&self, id: &str) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.id == id)
    }

    pub(crate) fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub(crate) fn start_map(&self) -> &str {
        &self.start_map
    }

    pub(crate) fn start_position(&self) -> Vec2 {
        self.start_position
    }
}
