/// Simulation context: the single writer of player, transition, conversation
/// and draft state. I/O (reply workers, persistence) stays with the owner.
pub(crate) struct TownSimulation {
    world: WorldRegistry,
    player: PlayerState,
    transition: TransitionController,
    conversation: ConversationState,
    draft: String,
    /// Movement keys still held from before the conversation opened. Their
    /// key-repeat text is not typing.
    held_since_open: Vec<InputAction>,
    credentials_ready: bool,
    revision: u64,
}

impl TownSimulation {
    pub(crate) fn new(
        world: WorldRegistry,
        history: ConversationHistory,
        credentials_ready: bool,
    ) -> Self {
        let player = PlayerState::spawn(world.start_map(), world.start_position());
        Self {
            world,
            player,
            transition: TransitionController::default(),
            conversation: ConversationState::new(history),
            draft: String::new(),
            held_since_open: Vec::new(),
            credentials_ready,
            revision: 0,
        }
    }

    pub(crate) fn world(&self) -> &WorldRegistry {
        &self.world
    }

    pub(crate) fn player(&self) -> &PlayerState {
        &self.player
    }

    #[cfg(test)]
    pub(crate) fn transition(&self) -> &TransitionController {
        &self.transition
    }

    pub(crate) fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    #[cfg(test)]
    pub(crate) fn draft(&self) -> &str {
        &self.draft
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn current_map(&self) -> &GameMap {
        self.world
            .map(&self.player.map_id)
            .unwrap_or_else(|| self.world.outdoor_map())
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.player.moving || self.transition.is_active() || self.conversation.is_loading()
    }

    /// Replies merge first, then the transition advances, then whichever
    /// modality is current consumes input.
    pub(crate) fn tick(
        &mut self,
        dt_seconds: f32,
        input: &InputSnapshot,
        completions: Vec<ReplyCompletion>,
    ) -> TickReport {
        let mut report = TickReport::default();

        for completion in completions {
            debug!(npc = %completion.npc_id, "reply_applied");
            self.conversation.apply_reply(completion);
            report.history_changed = true;
        }

        let opacity_before = self.transition.opacity();
        let phase_before = self.transition.is_active();
        if let Some(target) = self.transition.tick(dt_seconds) {
            self.switch_map(target);
            self.transition.complete_switch();
        }
        if self.transition.opacity() != opacity_before
            || self.transition.is_active() != phase_before
        {
            self.bump();
        }

        if self.conversation.is_active() {
            self.set_moving(false);
            self.handle_dialogue_input(input, &mut report);
        } else if self.transition.is_active() {
            self.set_moving(false);
        } else {
            self.step_movement(input.movement_direction(), &mut report);
            if self.conversation.is_active() {
                self.held_since_open = MOVE_ACTIONS
                    .into_iter()
                    .filter(|action| input.is_down(*action))
                    .collect();
            }
        }

        if report.history_changed {
            self.bump();
        }
        report
    }

    pub(crate) fn frame_view(&self, anim_time_ms: f64) -> FrameView<'_> {
        let map = self.current_map();
        let dialogue = self.conversation.active_npc().and_then(|npc_id| {
            self.world.npc(npc_id).map(|npc| DialogueView {
                npc,
                messages: self.conversation.messages_for(npc_id),
                draft: &self.draft,
                loading: self.conversation.is_loading(),
            })
        });
        FrameView {
            map,
            npcs: self.world.npcs_on_map(&map.id).collect(),
            player: &self.player,
            dialogue,
            transition_opacity: self.transition.opacity(),
            credentials_ready: self.credentials_ready,
            anim_time_ms,
        }
    }

    fn step_movement(&mut self, direction: Vec2, report: &mut TickReport) {
        let map = self
            .world
            .map(&self.player.map_id)
            .unwrap_or_else(|| self.world.outdoor_map());
        let outcome = resolve_movement(
            &self.player,
            direction,
            map,
            self.world.npcs_on_map(&self.player.map_id),
            self.credentials_ready,
        );

        if outcome.position != self.player.position
            || outcome.facing != self.player.facing
            || outcome.moving != self.player.moving
        {
            self.player.position = outcome.position;
            self.player.facing = outcome.facing;
            self.player.moving = outcome.moving;
            self.revision = self.revision.wrapping_add(1);
        }

        match outcome.trigger {
            Some(MovementTrigger::Portal(target)) => {
                let to = target.map_id.clone();
                if self.transition.begin(target) {
                    info!(from = %self.player.map_id, to = %to, "transition_started");
                    self.revision = self.revision.wrapping_add(1);
                }
            }
            Some(MovementTrigger::Npc(npc_id)) => {
                let Some(npc) = self.world.npc(&npc_id) else {
                    return;
                };
                let seeded = self.conversation.start(npc);
                self.player.position = push_back_from(npc.position, self.player.position, map);
                self.player.moving = false;
                self.draft.clear();
                report.history_changed |= seeded;
                self.revision = self.revision.wrapping_add(1);
                info!(npc = %npc.id, seeded, "conversation_started");
            }
            None => {}
        }
    }

    fn handle_dialogue_input(&mut self, input: &InputSnapshot, report: &mut TickReport) {
        if input.cancel_pressed() {
            if let Some(npc_id) = self.conversation.end() {
                info!(npc = %npc_id, "conversation_ended");
            }
            self.draft.clear();
            self.bump();
            return;
        }

        self.held_since_open.retain(|action| input.is_down(*action));
        let typed_text = if self.held_since_open.is_empty() {
            input.typed_text()
        } else {
            ""
        };

        let mut draft_changed = false;
        for ch in typed_text.chars() {
            if self.draft.chars().count() >= MAX_DRAFT_CHARS {
                break;
            }
            self.draft.push(ch);
            draft_changed = true;
        }
        for _ in 0..input.backspace_presses() {
            draft_changed |= self.draft.pop().is_some();
        }

        if input.submit_pressed() {
            match self.conversation.send(&self.world, &self.draft) {
                Ok(request) => {
                    info!(npc = %request.npc.id, chars = request.user_message.len(), "message_sent");
                    self.draft.clear();
                    draft_changed = true;
                    report.history_changed = true;
                    report.reply_request = Some(request);
                }
                Err(reason) => debug!(reason = %reason, "send_rejected"),
            }
        }

        if draft_changed {
            self.bump();
        }
    }

    fn switch_map(&mut self, target: PortalTarget) {
        info!(
            from = %self.player.map_id,
            map = %target.map_id,
            x = target.position.x,
            y = target.position.y,
            "map_switched"
        );
        self.player.map_id = target.map_id;
        self.player.position = target.position;
        self.player.moving = false;
        self.bump();
    }

    fn set_moving(&mut self, moving: bool) {
        if self.player.moving != moving {
            self.player.moving = moving;
            self.bump();
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Scene adapter: drains reply completions, dispatches new requests and
/// persists history after every history change.
pub(crate) struct TownScene {
    simulation: TownSimulation,
    replies: ReplyDispatcher,
    history_store: HistoryStore,
}

impl TownScene {
    pub(crate) fn new(
        world: WorldRegistry,
        history_store: HistoryStore,
        replies: ReplyDispatcher,
        credentials_ready: bool,
    ) -> Self {
        let history = history_store.load();
        Self {
            simulation: TownSimulation::new(world, history, credentials_ready),
            replies,
            history_store,
        }
    }

    pub(crate) fn simulation(&self) -> &TownSimulation {
        &self.simulation
    }
}

impl Scene for TownScene {
    fn load(&mut self) {
        let world = self.simulation.world();
        info!(
            maps = world.maps().len(),
            npcs = world.npcs().len(),
            start_map = %self.simulation.player().map_id,
            credentials_ready = self.simulation.credentials_ready,
            "scene_loaded"
        );
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        let completions = self.replies.drain();
        let report = self.simulation.tick(fixed_dt_seconds, input, completions);

        if let Some(request) = report.reply_request {
            self.replies.dispatch(request);
        }
        if report.history_changed {
            self.history_store
                .save(self.simulation.conversation().history());
        }
    }

    fn render(&mut self, surface: &mut dyn DrawSurface) {
        let now_ms = chrono::Utc::now().timestamp_millis() as f64;
        render::render_frame(surface, &self.simulation.frame_view(now_ms));
    }

    fn unload(&mut self) {
        self.history_store
            .save(self.simulation.conversation().history());
        info!(
            pending_replies = self.simulation.conversation().has_pending_replies(),
            "scene_unloaded"
        );
    }

    fn render_revision(&self) -> u64 {
        self.simulation.revision()
    }

    fn is_animating(&self) -> bool {
        self.simulation.is_animating()
    }

    fn debug_title(&self) -> Option<String> {
        let player = self.simulation.player();
        Some(format!(
            "English Town | {} | ({:.0}, {:.0})",
            self.simulation.current_map().name,
            player.position.x,
            player.position.y
        ))
    }
}
