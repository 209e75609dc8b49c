#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    Mend,
    Bolt,
    Shockwave,
    Phase,
}

impl AbilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AbilityKind::Mend => "mend",
            AbilityKind::Bolt => "bolt",
            AbilityKind::Shockwave => "shockwave",
            AbilityKind::Phase => "phase",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceModel {
    Cooldown { seconds: f32 },
    Charges { max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityDefinition {
    pub kind: AbilityKind,
    pub sequence_length: usize,
    pub resource: ResourceModel,
    pub challenge_timeout_seconds: f32,
    pub energy_cost: f32,
}

/// One of the four directional input symbols. Equality only; the symbols
/// have no meaningful ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionSymbol {
    Up,
    Down,
    Left,
    Right,
}

impl DirectionSymbol {
    pub const ALL: [DirectionSymbol; 4] = [
        DirectionSymbol::Up,
        DirectionSymbol::Down,
        DirectionSymbol::Left,
        DirectionSymbol::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DirectionSymbol::Up => "up",
            DirectionSymbol::Down => "down",
            DirectionSymbol::Left => "left",
            DirectionSymbol::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeFailReason {
    Timeout,
    WrongInput,
}

impl ChallengeFailReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeFailReason::Timeout => "timeout",
            ChallengeFailReason::WrongInput => "wrong_input",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Pending,
    Succeeded,
    Failed(ChallengeFailReason),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Succeeded,
    Failed(ChallengeFailReason),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    OnCooldown,
    NoCharges,
    PoolExhausted,
    ChallengeInProgress,
    LockedOut,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::OnCooldown => "on_cooldown",
            RejectReason::NoCharges => "no_charges",
            RejectReason::PoolExhausted => "pool_exhausted",
            RejectReason::ChallengeInProgress => "challenge_in_progress",
            RejectReason::LockedOut => "locked_out",
        }
    }
}

/// Events produced for external collaborators (UI overlay, audio, screen
/// tint). The session drains the bus at the end of every tick.
#[derive(Debug, Clone, PartialEq)]
pub enum CastEvent {
    AbilityActivated {
        kind: AbilityKind,
        sequence: Vec<DirectionSymbol>,
    },
    ActivationRejected {
        kind: AbilityKind,
        reason: RejectReason,
    },
    InputSlotResolved {
        index: usize,
        correct: bool,
    },
    ChallengeResolved {
        kind: AbilityKind,
        success: bool,
    },
    ChallengeCancelled {
        kind: AbilityKind,
    },
    DilationStarted,
    DilationStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastEventKind {
    AbilityActivated,
    ActivationRejected,
    InputSlotResolved,
    ChallengeResolved,
    ChallengeCancelled,
    DilationStarted,
    DilationStopped,
}

impl CastEvent {
    pub fn kind(&self) -> CastEventKind {
        match self {
            Self::AbilityActivated { .. } => CastEventKind::AbilityActivated,
            Self::ActivationRejected { .. } => CastEventKind::ActivationRejected,
            Self::InputSlotResolved { .. } => CastEventKind::InputSlotResolved,
            Self::ChallengeResolved { .. } => CastEventKind::ChallengeResolved,
            Self::ChallengeCancelled { .. } => CastEventKind::ChallengeCancelled,
            Self::DilationStarted => CastEventKind::DilationStarted,
            Self::DilationStopped => CastEventKind::DilationStopped,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CastEventCounts {
    pub total: u32,
    pub ability_activated: u32,
    pub activation_rejected: u32,
    pub input_slot_resolved: u32,
    pub challenge_resolved: u32,
    pub challenge_cancelled: u32,
    pub dilation_started: u32,
    pub dilation_stopped: u32,
}

impl CastEventCounts {
    fn record(&mut self, kind: CastEventKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            CastEventKind::AbilityActivated => {
                self.ability_activated = self.ability_activated.saturating_add(1)
            }
            CastEventKind::ActivationRejected => {
                self.activation_rejected = self.activation_rejected.saturating_add(1)
            }
            CastEventKind::InputSlotResolved => {
                self.input_slot_resolved = self.input_slot_resolved.saturating_add(1)
            }
            CastEventKind::ChallengeResolved => {
                self.challenge_resolved = self.challenge_resolved.saturating_add(1)
            }
            CastEventKind::ChallengeCancelled => {
                self.challenge_cancelled = self.challenge_cancelled.saturating_add(1)
            }
            CastEventKind::DilationStarted => {
                self.dilation_started = self.dilation_started.saturating_add(1)
            }
            CastEventKind::DilationStopped => {
                self.dilation_stopped = self.dilation_stopped.saturating_add(1)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct CastEventBus {
    current_tick_events: Vec<CastEvent>,
    last_tick_counts: CastEventCounts,
}

impl CastEventBus {
    pub fn emit(&mut self, event: CastEvent) {
        self.current_tick_events.push(event);
    }

    pub fn events(&self) -> &[CastEvent] {
        &self.current_tick_events
    }

    pub fn finish_tick_rollover(&mut self) {
        let mut counts = CastEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.current_tick_events.clear();
    }

    pub fn last_tick_counts(&self) -> CastEventCounts {
        self.last_tick_counts
    }
}

/// World-side effect requested by a successful cast. The dispatcher queues
/// these; the session drains them into the world layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectCommand {
    Heal { amount: u32 },
    SpawnProjectile { speed: f32, lifetime_seconds: f32 },
    Knockback { radius: f32, strength: f32 },
    PhaseMode { duration_seconds: f32 },
}

/// Maps a successfully cast ability to its world-side effect. A missing
/// executor must never block resolution; the cast still completes and the
/// effect is simply skipped.
pub trait EffectExecutor {
    fn execute(&mut self, kind: AbilityKind) -> Option<EffectCommand>;
}

/// External resource-pool veto, consulted before activation. Spend is
/// reported only on a successful cast.
pub trait ResourceGate {
    fn can_afford(&self, kind: AbilityKind) -> bool;
    fn spend(&mut self, kind: AbilityKind);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_counts_roll_over_per_tick() {
        let mut bus = CastEventBus::default();
        bus.emit(CastEvent::DilationStarted);
        bus.emit(CastEvent::InputSlotResolved {
            index: 0,
            correct: true,
        });
        bus.emit(CastEvent::InputSlotResolved {
            index: 1,
            correct: false,
        });
        assert_eq!(bus.events().len(), 3);

        bus.finish_tick_rollover();
        let counts = bus.last_tick_counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.dilation_started, 1);
        assert_eq!(counts.input_slot_resolved, 2);
        assert!(bus.events().is_empty());

        bus.finish_tick_rollover();
        assert_eq!(bus.last_tick_counts().total, 0);
    }

    #[test]
    fn direction_symbols_compare_by_value() {
        assert_eq!(DirectionSymbol::Up, DirectionSymbol::Up);
        assert_ne!(DirectionSymbol::Up, DirectionSymbol::Down);
        assert_eq!(DirectionSymbol::ALL.len(), 4);
    }
}
