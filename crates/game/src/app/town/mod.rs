use std::collections::BTreeSet;

use thiserror::Error;
use town_engine::{DrawSurface, InputAction, InputSnapshot, Scene, Vec2};
use tracing::{debug, info};

use super::chat::{
    ConversationHistory, HistoryStore, Message, ReplyCompletion, ReplyDispatcher, ReplyRequest,
};
use super::render::{self, DialogueView, FrameView};
use super::world::{GameMap, Npc, WorldRegistry};

pub(crate) const PLAYER_HITBOX_RADIUS: f32 = 15.0;
pub(crate) const INTERACTION_RADIUS: f32 = 50.0;
pub(crate) const MOVEMENT_SPEED: f32 = 5.0;
const PUSH_BACK_DISTANCE: f32 = INTERACTION_RADIUS + 5.0;
const FADE_STEPS: u8 = 10;
const FADE_STEP_INTERVAL_MS: f32 = 30.0;
const FADE_SETTLE_MS: f32 = 300.0;
const MAX_DRAFT_CHARS: usize = 280;
const MOVE_ACTIONS: [InputAction; 4] = [
    InputAction::MoveUp,
    InputAction::MoveDown,
    InputAction::MoveLeft,
    InputAction::MoveRight,
];

include!("types.rs");
include!("movement.rs");
include!("transition.rs");
include!("conversation.rs");
include!("scene_impl.rs");

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
