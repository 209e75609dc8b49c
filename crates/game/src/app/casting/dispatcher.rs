use std::collections::HashMap;

use engine::SimulationClock;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error};

use super::challenge::CastChallenge;
use super::cooldown::CooldownLedger;
use super::pause::WorldPauseController;
use super::sequence::generate_sequence;
use super::types::{
    AbilityDefinition, AbilityKind, CastEvent, CastEventBus, ChallengeOutcome, DirectionSymbol,
    EffectCommand, EffectExecutor, RejectReason, ResourceGate,
};

/// Keeps the key that just resolved a challenge from immediately starting
/// the next one. Measured on the wall clock.
pub const POST_RESOLUTION_LOCKOUT_SECONDS: f32 = 0.5;

/// Façade over the casting pipeline: resource gates → sequence → world pause
/// → challenge, and terminal handling back out. Owns the RNG, the per-kind
/// definitions, the cooldown ledger and the single active-challenge slot.
pub struct AbilityDispatcher {
    definitions: HashMap<AbilityKind, AbilityDefinition>,
    cooldowns: CooldownLedger,
    active_challenge: Option<CastChallenge>,
    lockout_remaining_seconds: f32,
    rng: ChaCha8Rng,
    executor: Option<Box<dyn EffectExecutor>>,
    pending_effects: Vec<EffectCommand>,
}

impl AbilityDispatcher {
    pub fn new(definitions: Vec<AbilityDefinition>, rng: ChaCha8Rng) -> Self {
        let cooldowns = CooldownLedger::from_definitions(definitions.iter());
        let definitions = definitions
            .into_iter()
            .map(|definition| (definition.kind, definition))
            .collect();
        Self {
            definitions,
            cooldowns,
            active_challenge: None,
            lockout_remaining_seconds: 0.0,
            rng,
            executor: None,
            pending_effects: Vec::new(),
        }
    }

    pub fn set_effect_executor(&mut self, executor: Box<dyn EffectExecutor>) {
        self.executor = Some(executor);
    }

    #[cfg(test)]
    pub fn is_casting(&self) -> bool {
        self.active_challenge.is_some()
    }

    /// Activation request. Gate order: single-challenge slot, lockout,
    /// external pool, then the ledger (consumed optimistically here; a
    /// failed or cancelled cast is never refunded). On success the world is
    /// paused and the challenge created; rejection emits a notification and
    /// otherwise no-ops.
    pub fn try_activate(
        &mut self,
        kind: AbilityKind,
        clock: &mut SimulationClock,
        pause: &mut WorldPauseController,
        pool: &mut dyn ResourceGate,
        events: &mut CastEventBus,
    ) -> bool {
        if self.active_challenge.is_some() {
            return Self::reject(kind, RejectReason::ChallengeInProgress, events);
        }
        if self.lockout_remaining_seconds > 0.0 {
            return Self::reject(kind, RejectReason::LockedOut, events);
        }
        let Some(definition) = self.definitions.get(&kind).copied() else {
            debug!(kind = kind.as_str(), "unknown_ability_kind");
            return false;
        };
        if !pool.can_afford(kind) {
            return Self::reject(kind, RejectReason::PoolExhausted, events);
        }
        if let Err(reason) = self.cooldowns.try_consume(kind) {
            return Self::reject(kind, reason, events);
        }

        let sequence = generate_sequence(&mut self.rng, definition.sequence_length);
        if let Err(err) = pause.enter_pause(clock) {
            error!(error = %err, kind = kind.as_str(), "world_pause_failed");
            return false;
        }
        events.emit(CastEvent::AbilityActivated {
            kind,
            sequence: sequence.clone(),
        });
        self.active_challenge = Some(CastChallenge::new(
            kind,
            sequence,
            definition.challenge_timeout_seconds,
        ));
        true
    }

    /// Per-frame step. Must be called unconditionally once per tick: the
    /// challenge is the only thing that can lift the pause it induced, and
    /// its timeout has no external watchdog.
    pub fn tick(
        &mut self,
        clock: &mut SimulationClock,
        pause: &mut WorldPauseController,
        pool: &mut dyn ResourceGate,
        symbols: &[DirectionSymbol],
        abort_pressed: bool,
        events: &mut CastEventBus,
    ) {
        // ability cooldowns advance on the scaled clock: frozen during a
        // pause, slowed during dilation.
        self.cooldowns.tick(clock.scaled_delta());

        let (step, kind) = match self.active_challenge.as_mut() {
            Some(challenge) => (
                challenge.tick(clock.wall_delta(), symbols, abort_pressed),
                challenge.kind(),
            ),
            None => {
                self.lockout_remaining_seconds =
                    (self.lockout_remaining_seconds - clock.wall_delta()).max(0.0);
                return;
            }
        };

        if let Some(slot) = step.slot {
            events.emit(CastEvent::InputSlotResolved {
                index: slot.index,
                correct: slot.correct,
            });
        }
        let Some(outcome) = step.outcome else {
            return;
        };

        // every terminal path resumes the world, then locks activation out
        // for a moment so the resolving key cannot bleed into a new cast.
        self.active_challenge = None;
        if let Err(err) = pause.exit_pause(clock) {
            error!(error = %err, kind = kind.as_str(), "world_resume_failed");
        }
        self.lockout_remaining_seconds = POST_RESOLUTION_LOCKOUT_SECONDS;

        match outcome {
            ChallengeOutcome::Succeeded => {
                pool.spend(kind);
                match self.executor.as_mut() {
                    Some(executor) => {
                        if let Some(command) = executor.execute(kind) {
                            self.pending_effects.push(command);
                        }
                    }
                    None => debug!(kind = kind.as_str(), "effect_executor_missing"),
                }
                events.emit(CastEvent::ChallengeResolved {
                    kind,
                    success: true,
                });
            }
            ChallengeOutcome::Failed(reason) => {
                debug!(
                    kind = kind.as_str(),
                    reason = reason.as_str(),
                    "cast_failed"
                );
                events.emit(CastEvent::ChallengeResolved {
                    kind,
                    success: false,
                });
            }
            ChallengeOutcome::Cancelled => {
                events.emit(CastEvent::ChallengeCancelled { kind });
            }
        }
    }

    pub fn drain_effects(&mut self) -> Vec<EffectCommand> {
        std::mem::take(&mut self.pending_effects)
    }

    pub fn active_challenge(&self) -> Option<&CastChallenge> {
        self.active_challenge.as_ref()
    }

    pub fn cooldown_progress(&self, kind: AbilityKind) -> f32 {
        self.cooldowns.progress(kind)
    }

    fn reject(kind: AbilityKind, reason: RejectReason, events: &mut CastEventBus) -> bool {
        debug!(
            kind = kind.as_str(),
            reason = reason.as_str(),
            "activation_rejected"
        );
        events.emit(CastEvent::ActivationRejected { kind, reason });
        false
    }

    #[cfg(test)]
    pub fn lockout_remaining_seconds(&self) -> f32 {
        self.lockout_remaining_seconds
    }

    #[cfg(test)]
    pub fn charges_remaining(&self, kind: AbilityKind) -> Option<u32> {
        self.cooldowns.charges_remaining(kind)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::app::casting::types::{ChallengeStatus, ResourceModel};

    const DT: f32 = 1.0 / 60.0;

    struct FreePool;

    impl ResourceGate for FreePool {
        fn can_afford(&self, _kind: AbilityKind) -> bool {
            true
        }
        fn spend(&mut self, _kind: AbilityKind) {}
    }

    struct EmptyPool;

    impl ResourceGate for EmptyPool {
        fn can_afford(&self, _kind: AbilityKind) -> bool {
            false
        }
        fn spend(&mut self, _kind: AbilityKind) {}
    }

    struct RecordingExecutor;

    impl EffectExecutor for RecordingExecutor {
        fn execute(&mut self, kind: AbilityKind) -> Option<EffectCommand> {
            match kind {
                AbilityKind::Mend => Some(EffectCommand::Heal { amount: 25 }),
                _ => None,
            }
        }
    }

    fn definitions() -> Vec<AbilityDefinition> {
        vec![
            AbilityDefinition {
                kind: AbilityKind::Mend,
                sequence_length: 3,
                resource: ResourceModel::Charges { max: 3 },
                challenge_timeout_seconds: 4.0,
                energy_cost: 20.0,
            },
            AbilityDefinition {
                kind: AbilityKind::Bolt,
                sequence_length: 2,
                resource: ResourceModel::Cooldown { seconds: 2.5 },
                challenge_timeout_seconds: 3.0,
                energy_cost: 10.0,
            },
        ]
    }

    fn dispatcher() -> AbilityDispatcher {
        let mut dispatcher =
            AbilityDispatcher::new(definitions(), ChaCha8Rng::seed_from_u64(42));
        dispatcher.set_effect_executor(Box::new(RecordingExecutor));
        dispatcher
    }

    struct Rig {
        dispatcher: AbilityDispatcher,
        clock: SimulationClock,
        pause: WorldPauseController,
        events: CastEventBus,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                dispatcher: dispatcher(),
                clock: SimulationClock::new(),
                pause: WorldPauseController::new(),
                events: CastEventBus::default(),
            }
        }

        fn activate(&mut self, kind: AbilityKind, pool: &mut dyn ResourceGate) -> bool {
            self.dispatcher
                .try_activate(kind, &mut self.clock, &mut self.pause, pool, &mut self.events)
        }

        fn tick(
            &mut self,
            pool: &mut dyn ResourceGate,
            symbols: &[DirectionSymbol],
            abort: bool,
        ) {
            self.clock.begin_tick(DT);
            self.dispatcher.tick(
                &mut self.clock,
                &mut self.pause,
                pool,
                symbols,
                abort,
                &mut self.events,
            );
        }

        fn required_sequence(&self) -> Vec<DirectionSymbol> {
            self.dispatcher
                .active_challenge()
                .expect("challenge pending")
                .required()
                .to_vec()
        }

        fn last_event(&self) -> &CastEvent {
            self.events.events().last().expect("events emitted")
        }
    }

    #[test]
    fn activation_pauses_world_and_emits_sequence() {
        let mut rig = Rig::new();
        assert!(rig.activate(AbilityKind::Mend, &mut FreePool));
        assert_eq!(rig.clock.scale(), 0.0);
        assert!(rig.pause.is_paused());
        assert_eq!(rig.required_sequence().len(), 3);
        assert!(matches!(
            rig.last_event(),
            CastEvent::AbilityActivated {
                kind: AbilityKind::Mend,
                ..
            }
        ));
        assert_eq!(rig.dispatcher.charges_remaining(AbilityKind::Mend), Some(2));
    }

    #[test]
    fn exact_sequence_resolves_success_and_spends_pool_once() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Mend, &mut FreePool);
        let sequence = rig.required_sequence();

        for (index, symbol) in sequence.iter().enumerate() {
            rig.tick(&mut FreePool, &[*symbol], false);
            if index < sequence.len() - 1 {
                assert!(rig.dispatcher.is_casting());
            }
        }

        assert!(!rig.dispatcher.is_casting());
        assert!(!rig.pause.is_paused());
        assert_eq!(rig.clock.scale(), 1.0);
        assert!(matches!(
            rig.last_event(),
            CastEvent::ChallengeResolved {
                success: true,
                ..
            }
        ));
        assert_eq!(rig.dispatcher.drain_effects(), vec![EffectCommand::Heal {
            amount: 25
        }]);
    }

    #[test]
    fn wrong_symbol_fails_immediately_without_waiting() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Mend, &mut FreePool);
        let sequence = rig.required_sequence();

        rig.tick(&mut FreePool, &[sequence[0]], false);
        let wrong = DirectionSymbol::ALL
            .into_iter()
            .find(|candidate| *candidate != sequence[1])
            .expect("alphabet has four symbols");
        rig.tick(&mut FreePool, &[wrong], false);

        assert!(!rig.dispatcher.is_casting());
        assert!(!rig.pause.is_paused());
        assert!(matches!(
            rig.last_event(),
            CastEvent::ChallengeResolved {
                success: false,
                ..
            }
        ));
        assert!(rig.dispatcher.drain_effects().is_empty());
        // optimistic consumption is not refunded.
        assert_eq!(rig.dispatcher.charges_remaining(AbilityKind::Mend), Some(2));
    }

    #[test]
    fn two_distinct_symbols_in_one_tick_are_ignored() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Mend, &mut FreePool);
        let sequence = rig.required_sequence();
        let other = DirectionSymbol::ALL
            .into_iter()
            .find(|candidate| *candidate != sequence[0])
            .expect("alphabet has four symbols");

        rig.tick(&mut FreePool, &[sequence[0], other], false);
        let challenge = rig.dispatcher.active_challenge().expect("still pending");
        assert_eq!(challenge.progress_index(), 0);
        assert_eq!(challenge.status(), ChallengeStatus::Pending);
    }

    #[test]
    fn timeout_resolves_failure_and_resumes_world() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Bolt, &mut FreePool);
        for _ in 0..((3.5 / DT) as usize) {
            rig.tick(&mut FreePool, &[], false);
            if !rig.dispatcher.is_casting() {
                break;
            }
        }
        assert!(!rig.dispatcher.is_casting());
        assert!(!rig.pause.is_paused());
    }

    #[test]
    fn abort_cancels_and_still_resumes_world() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Mend, &mut FreePool);
        rig.tick(&mut FreePool, &[], true);
        assert!(matches!(
            rig.last_event(),
            CastEvent::ChallengeCancelled {
                kind: AbilityKind::Mend
            }
        ));
        assert!(!rig.pause.is_paused());
        assert_eq!(rig.clock.scale(), 1.0);
        // charge stays spent on cancel as well.
        assert_eq!(rig.dispatcher.charges_remaining(AbilityKind::Mend), Some(2));
    }

    #[test]
    fn second_activation_rejected_while_challenge_pending() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Mend, &mut FreePool);
        assert!(!rig.activate(AbilityKind::Bolt, &mut FreePool));
        assert!(matches!(
            rig.last_event(),
            CastEvent::ActivationRejected {
                reason: RejectReason::ChallengeInProgress,
                ..
            }
        ));
    }

    #[test]
    fn post_resolution_lockout_blocks_then_expires() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Mend, &mut FreePool);
        rig.tick(&mut FreePool, &[], true);
        assert!(rig.dispatcher.lockout_remaining_seconds() > 0.0);

        assert!(!rig.activate(AbilityKind::Bolt, &mut FreePool));
        assert!(matches!(
            rig.last_event(),
            CastEvent::ActivationRejected {
                reason: RejectReason::LockedOut,
                ..
            }
        ));

        for _ in 0..((0.6 / DT) as usize) {
            rig.tick(&mut FreePool, &[], false);
        }
        assert_eq!(rig.dispatcher.lockout_remaining_seconds(), 0.0);
        assert!(rig.activate(AbilityKind::Bolt, &mut FreePool));
    }

    #[test]
    fn exhausted_pool_rejects_before_the_ledger_is_touched() {
        let mut rig = Rig::new();
        assert!(!rig.activate(AbilityKind::Mend, &mut EmptyPool));
        assert!(matches!(
            rig.last_event(),
            CastEvent::ActivationRejected {
                reason: RejectReason::PoolExhausted,
                ..
            }
        ));
        assert_eq!(rig.dispatcher.charges_remaining(AbilityKind::Mend), Some(3));
        assert!(!rig.pause.is_paused());
    }

    #[test]
    fn cooldown_model_rejects_while_ticking_down_on_scaled_time() {
        let mut rig = Rig::new();
        rig.activate(AbilityKind::Bolt, &mut FreePool);
        rig.tick(&mut FreePool, &[], true);
        for _ in 0..((0.6 / DT) as usize) {
            rig.tick(&mut FreePool, &[], false);
        }

        assert!(!rig.activate(AbilityKind::Bolt, &mut FreePool));
        assert!(matches!(
            rig.last_event(),
            CastEvent::ActivationRejected {
                reason: RejectReason::OnCooldown,
                ..
            }
        ));

        for _ in 0..((3.0 / DT) as usize) {
            rig.tick(&mut FreePool, &[], false);
        }
        assert!(rig.activate(AbilityKind::Bolt, &mut FreePool));
    }

    #[test]
    fn missing_executor_still_completes_resolution() {
        let mut rig = Rig::new();
        rig.dispatcher = AbilityDispatcher::new(definitions(), ChaCha8Rng::seed_from_u64(42));
        rig.activate(AbilityKind::Mend, &mut FreePool);
        let sequence = rig.required_sequence();
        for symbol in sequence {
            rig.tick(&mut FreePool, &[symbol], false);
        }
        assert!(!rig.dispatcher.is_casting());
        assert!(!rig.pause.is_paused());
        assert!(rig.dispatcher.drain_effects().is_empty());
        assert!(matches!(
            rig.last_event(),
            CastEvent::ChallengeResolved {
                success: true,
                ..
            }
        ));
    }
}
