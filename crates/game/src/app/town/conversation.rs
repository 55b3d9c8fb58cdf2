/// Conversation modality plus the per-NPC histories it appends to.
/// Pending replies are tracked per NPC so one NPC never has two in flight.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConversationState {
    active_npc: Option<String>,
    history: ConversationHistory,
    pending: BTreeSet<String>,
}

impl ConversationState {
    pub(crate) fn new(history: ConversationHistory) -> Self {
        Self {
            active_npc: None,
            history,
            pending: BTreeSet::new(),
        }
    }

    pub(crate) fn active_npc(&self) -> Option<&str> {
        self.active_npc.as_deref()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active_npc.is_some()
    }

    pub(crate) fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub(crate) fn messages_for(&self, npc_id: &str) -> &[Message] {
        self.history.get(npc_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn is_pending(&self, npc_id: &str) -> bool {
        self.pending.contains(npc_id)
    }

    /// True while the active conversation waits on a reply.
    pub(crate) fn is_loading(&self) -> bool {
        self.active_npc()
            .is_some_and(|npc_id| self.is_pending(npc_id))
    }

    pub(crate) fn has_pending_replies(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Opens a conversation; seeds the greeting only when the NPC has no
    /// history yet. Returns whether history changed.
    pub(crate) fn start(&mut self, npc: &Npc) -> bool {
        self.active_npc = Some(npc.id.clone());
        let messages = self.history.entry(npc.id.clone()).or_default();
        if !messages.is_empty() {
            return false;
        }
        messages.push(Message::npc(npc.greeting.clone()));
        true
    }

    /// History is retained; in-flight replies still land.
    pub(crate) fn end(&mut self) -> Option<String> {
        self.active_npc.take()
    }

    /// Appends the user line before capturing the request input, so the
    /// request always sees it.
    pub(crate) fn send(
        &mut self,
        world: &WorldRegistry,
        text: &str,
    ) -> Result<ReplyRequest, SendRejected> {
        let npc_id = self
            .active_npc
            .clone()
            .ok_or(SendRejected::NoActiveConversation)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::EmptyMessage);
        }
        if self.is_pending(&npc_id) {
            return Err(SendRejected::ReplyPending);
        }
        let npc = world.npc(&npc_id).ok_or(SendRejected::UnknownNpc)?;

        let messages = self.history.entry(npc_id.clone()).or_default();
        messages.push(Message::user(text));
        let history = messages.clone();
        self.pending.insert(npc_id);

        Ok(ReplyRequest {
            npc: npc.clone(),
            history,
            user_message: text.to_string(),
        })
    }

    /// The single history-merge point for replies, keyed by the NPC that
    /// was asked regardless of which conversation is open now.
    pub(crate) fn apply_reply(&mut self, completion: ReplyCompletion) {
        self.pending.remove(&completion.npc_id);
        self.history
            .entry(completion.npc_id)
            .or_default()
            .push(completion.message);
    }
}
