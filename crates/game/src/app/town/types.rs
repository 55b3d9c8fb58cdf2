#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayerState {
    pub(crate) map_id: String,
    pub(crate) position: Vec2,
    /// -1 faces left, 1 faces right.
    pub(crate) facing: f32,
    pub(crate) moving: bool,
}

impl PlayerState {
    pub(crate) fn spawn(map_id: &str, position: Vec2) -> Self {
        Self {
            map_id: map_id.to_string(),
            position,
            facing: 1.0,
            moving: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PortalTarget {
    pub(crate) map_id: String,
    pub(crate) position: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
enum MovementTrigger {
    Portal(PortalTarget),
    Npc(String),
}

#[derive(Debug, Clone, PartialEq)]
struct MovementOutcome {
    position: Vec2,
    facing: f32,
    moving: bool,
    trigger: Option<MovementTrigger>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransitionPhase {
    Idle,
    FadingOut { target: PortalTarget },
    Switching { target: PortalTarget },
    FadingIn { settle_remaining_ms: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum SendRejected {
    #[error("no conversation is active")]
    NoActiveConversation,
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is still pending for this conversation")]
    ReplyPending,
    #[error("active npc is not in the roster")]
    UnknownNpc,
}

/// Side effects a tick asks its owner to perform.
#[derive(Debug, Default)]
pub(crate) struct TickReport {
    pub(crate) reply_request: Option<ReplyRequest>,
    pub(crate) history_changed: bool,
}
