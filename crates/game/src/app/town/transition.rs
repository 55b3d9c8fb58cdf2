/// Fade-to-black map switch: Idle -> FadingOut -> Switching -> FadingIn -> Idle.
/// Opacity moves one step every `FADE_STEP_INTERVAL_MS` of accumulated tick time.
#[derive(Debug, Clone)]
pub(crate) struct TransitionController {
    phase: TransitionPhase,
    level: u8,
    clock_ms: f32,
}

impl Default for TransitionController {
    fn default() -> Self {
        Self {
            phase: TransitionPhase::Idle,
            level: 0,
            clock_ms: 0.0,
        }
    }
}

impl TransitionController {
    #[cfg(test)]
    pub(crate) fn phase(&self) -> &TransitionPhase {
        &self.phase
    }

    pub(crate) fn is_active(&self) -> bool {
        self.phase != TransitionPhase::Idle
    }

    pub(crate) fn opacity(&self) -> f32 {
        f32::from(self.level) / f32::from(FADE_STEPS)
    }

    /// Ignored unless idle.
    pub(crate) fn begin(&mut self, target: PortalTarget) -> bool {
        if self.is_active() {
            return false;
        }
        self.phase = TransitionPhase::FadingOut { target };
        self.level = 0;
        self.clock_ms = 0.0;
        true
    }

    /// Returns the target once, on the tick the screen becomes fully opaque.
    /// The caller swaps maps and then calls `complete_switch`; a later tick
    /// completes it if the caller did not.
    pub(crate) fn tick(&mut self, dt_seconds: f32) -> Option<PortalTarget> {
        if matches!(self.phase, TransitionPhase::Switching { .. }) {
            self.complete_switch();
        }
        if !self.is_active() {
            self.clock_ms = 0.0;
            return None;
        }
        self.clock_ms += dt_seconds.max(0.0) * 1000.0;

        loop {
            match &mut self.phase {
                TransitionPhase::Idle | TransitionPhase::Switching { .. } => return None,
                TransitionPhase::FadingOut { target } => {
                    if self.clock_ms < FADE_STEP_INTERVAL_MS {
                        return None;
                    }
                    self.clock_ms -= FADE_STEP_INTERVAL_MS;
                    self.level += 1;
                    if self.level >= FADE_STEPS {
                        let target = target.clone();
                        self.phase = TransitionPhase::Switching {
                            target: target.clone(),
                        };
                        self.clock_ms = 0.0;
                        return Some(target);
                    }
                }
                TransitionPhase::FadingIn {
                    settle_remaining_ms,
                } => {
                    if *settle_remaining_ms > 0.0 {
                        let spent = self.clock_ms.min(*settle_remaining_ms);
                        *settle_remaining_ms -= spent;
                        self.clock_ms -= spent;
                        if *settle_remaining_ms > 0.0 {
                            return None;
                        }
                    }
                    if self.clock_ms < FADE_STEP_INTERVAL_MS {
                        return None;
                    }
                    self.clock_ms -= FADE_STEP_INTERVAL_MS;
                    self.level = self.level.saturating_sub(1);
                    if self.level == 0 {
                        self.phase = TransitionPhase::Idle;
                        self.clock_ms = 0.0;
                        return None;
                    }
                }
            }
        }
    }

    pub(crate) fn complete_switch(&mut self) {
        if matches!(self.phase, TransitionPhase::Switching { .. }) {
            self.phase = TransitionPhase::FadingIn {
                settle_remaining_ms: FADE_SETTLE_MS,
            };
            self.clock_ms = 0.0;
        }
    }
}
