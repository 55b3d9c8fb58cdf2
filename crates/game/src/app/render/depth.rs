use crate::app::town::PlayerState;
use crate::app::world::{Building, Furniture, GameMap, Npc, Tree};

/// Horizontal margin outside the viewport within which trees are still drawn.
const TREE_CULL_MARGIN: f32 = 50.0;
/// Buildings sort slightly above their bottom edge so characters standing at
/// the door overlap the facade.
const BUILDING_SORT_LIFT: f32 = 10.0;

/// Anything drawn in the depth-sorted layer. Larger keys draw later.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DrawItem<'a> {
    Player(&'a PlayerState),
    Npc(&'a Npc),
    Tree(&'a Tree),
    Building(&'a Building),
    Furniture(&'a Furniture),
}

impl DrawItem<'_> {
    pub(crate) fn sort_key(&self) -> f32 {
        match self {
            DrawItem::Player(player) => player.position.y,
            DrawItem::Npc(npc) => npc.position.y,
            DrawItem::Tree(tree) => tree.position.y,
            DrawItem::Building(building) => building.rect.bottom() - BUILDING_SORT_LIFT,
            DrawItem::Furniture(furniture) => furniture.rect.bottom(),
        }
    }
}

/// Gathers the map's props plus the characters and returns them in draw order.
pub(crate) fn collect_draw_items<'a>(
    map: &'a GameMap,
    npcs: &[&'a Npc],
    player: &'a PlayerState,
    camera_x: f32,
    view_width: f32,
) -> Vec<DrawItem<'a>> {
    let mut items = Vec::with_capacity(
        1 + npcs.len() + map.trees.len() + map.buildings.len() + map.furniture.len(),
    );
    items.push(DrawItem::Player(player));
    items.extend(npcs.iter().copied().map(DrawItem::Npc));
    items.extend(
        map.trees
            .iter()
            .filter(|tree| {
                tree.position.x >= camera_x - TREE_CULL_MARGIN
                    && tree.position.x <= camera_x + view_width + TREE_CULL_MARGIN
            })
            .map(DrawItem::Tree),
    );
    items.extend(map.buildings.iter().map(DrawItem::Building));
    items.extend(map.furniture.iter().map(DrawItem::Furniture));
    sort_by_depth(&mut items);
    items
}

/// Ascending key; equal keys keep insertion order.
pub(crate) fn sort_by_depth(items: &mut [DrawItem<'_>]) {
    items.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
}
