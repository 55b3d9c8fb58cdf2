use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info};

use super::reply::LOST_IN_THOUGHT_FALLBACK;
use super::{Message, ReplyService};
use crate::app::world::Npc;

/// Input for one reply: the NPC, its history up to and including the
/// just-sent line, and that line.
#[derive(Debug, Clone)]
pub(crate) struct ReplyRequest {
    pub(crate) npc: Npc,
    pub(crate) history: Vec<Message>,
    pub(crate) user_message: String,
}

/// Addressed by NPC identity so a late reply lands in the right bucket.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReplyCompletion {
    pub(crate) npc_id: String,
    pub(crate) message: Message,
}

/// Runs each request on its own worker thread and hands completions back
/// through a channel drained by the simulation tick.
pub(crate) struct ReplyDispatcher {
    service: Arc<dyn ReplyService>,
    sender: Sender<ReplyCompletion>,
    receiver: Receiver<ReplyCompletion>,
}

impl ReplyDispatcher {
    pub(crate) fn new(service: Arc<dyn ReplyService>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            service,
            sender,
            receiver,
        }
    }

    pub(crate) fn dispatch(&self, request: ReplyRequest) {
        let npc_id = request.npc.id.clone();
        info!(
            npc = %npc_id,
            history_len = request.history.len(),
            "reply_dispatched"
        );

        let service = Arc::clone(&self.service);
        let sender = self.sender.clone();
        let spawned = thread::Builder::new()
            .name("reply-worker".to_string())
            .spawn(move || {
                let text =
                    service.generate_reply(&request.npc, &request.history, &request.user_message);
                let completion = ReplyCompletion {
                    npc_id: request.npc.id,
                    message: Message::npc(text),
                };
                if sender.send(completion).is_err() {
                    debug!("reply_dropped_after_shutdown");
                }
            });

        if let Err(err) = spawned {
            error!(npc = %npc_id, error = %err, "reply_worker_spawn_failed");
            let _ = self.sender.send(ReplyCompletion {
                npc_id,
                message: Message::npc(LOST_IN_THOUGHT_FALLBACK),
            });
        }
    }

    /// Completions that arrived since the last call, in arrival order.
    pub(crate) fn drain(&self) -> Vec<ReplyCompletion> {
        self.receiver.try_iter().collect()
    }

    #[cfg(test)]
    pub(crate) fn wait_for_completion(
        &self,
        timeout: std::time::Duration,
    ) -> Option<ReplyCompletion> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use town_engine::{Color, Vec2};

    use super::*;
    use crate::app::world::NpcAppearance;

    struct EchoService {
        seen: Mutex<Vec<(String, usize, String)>>,
    }

    impl ReplyService for EchoService {
        fn generate_reply(&self, npc: &Npc, history: &[Message], user_message: &str) -> String {
            self.seen.lock().expect("lock").push((
                npc.id.clone(),
                history.len(),
                user_message.to_string(),
            ));
            format!("{} heard: {}", npc.name, user_message)
        }
    }

    fn npc(id: &str) -> Npc {
        Npc {
            id: id.to_string(),
            map_id: "world".to_string(),
            name: id.to_uppercase(),
            profile: "profile".to_string(),
            greeting: "hello".to_string(),
            position: Vec2::ZERO,
            appearance: NpcAppearance {
                skin: Color::WHITE,
                hair: Color::BLACK,
                shirt: Color::WHITE,
                pants: Color::BLACK,
            },
        }
    }

    #[test]
    fn completion_is_addressed_to_requesting_npc() {
        let service = Arc::new(EchoService {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = ReplyDispatcher::new(service.clone());

        dispatcher.dispatch(ReplyRequest {
            npc: npc("bob"),
            history: vec![Message::npc("hello"), Message::user("hi bob")],
            user_message: "hi bob".to_string(),
        });

        let completion = dispatcher
            .wait_for_completion(Duration::from_secs(5))
            .expect("completion");
        assert_eq!(completion.npc_id, "bob");
        assert_eq!(completion.message.text, "BOB heard: hi bob");
        assert_eq!(
            service.seen.lock().expect("lock").as_slice(),
            &[("bob".to_string(), 2, "hi bob".to_string())]
        );
    }

    #[test]
    fn drain_is_empty_without_completions() {
        let dispatcher = ReplyDispatcher::new(Arc::new(EchoService {
            seen: Mutex::new(Vec::new()),
        }));

        assert!(dispatcher.drain().is_empty());
    }
}
