use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use town_engine::{Color, Vec2};

const TREE_EDGE_MARGIN: f32 = 50.0;
const FLOWER_EDGE_MARGIN: f32 = 20.0;
const TREE_SCALE_MIN: f32 = 0.8;
const TREE_SCALE_MAX: f32 = 1.2;
const FLOWER_PALETTE: [Color; 3] = [
    Color::rgb(0xf4, 0x72, 0xb6),
    Color::rgb(0xfb, 0xbf, 0x24),
    Color::rgb(0xa7, 0x8b, 0xfa),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Tree {
    pub(crate) position: Vec2,
    pub(crate) scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Flower {
    pub(crate) position: Vec2,
    pub(crate) color: Color,
}

/// Same seed and map size always yield the same layout.
pub(crate) fn generate_scenery(
    seed: u64,
    tree_count: usize,
    flower_count: usize,
    map_width: f32,
    map_height: f32,
) -> (Vec<Tree>, Vec<Flower>) {
    let mut rng = StdRng::seed_from_u64(seed);

    let trees = (0..tree_count)
        .map(|_| Tree {
            position: Vec2::new(
                span(&mut rng, TREE_EDGE_MARGIN, map_width - TREE_EDGE_MARGIN),
                span(&mut rng, TREE_EDGE_MARGIN, map_height - TREE_EDGE_MARGIN),
            ),
            scale: rng.gen_range(TREE_SCALE_MIN..TREE_SCALE_MAX),
        })
        .collect();

    let flowers = (0..flower_count)
        .map(|_| Flower {
            position: Vec2::new(
                span(&mut rng, FLOWER_EDGE_MARGIN, map_width - FLOWER_EDGE_MARGIN),
                span(&mut rng, FLOWER_EDGE_MARGIN, map_height - FLOWER_EDGE_MARGIN),
            ),
            color: FLOWER_PALETTE
                .choose(&mut rng)
                .copied()
                .unwrap_or(FLOWER_PALETTE[0]),
        })
        .collect();

    (trees, flowers)
}

/// Uniform in `[low, high)`; collapses to `low` when the span is empty.
fn span(rng: &mut StdRng, low: f32, high: f32) -> f32 {
    if high <= low {
        return low;
    }
    rng.gen_range(low..high)
}
