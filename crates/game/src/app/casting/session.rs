use engine::{InputAction, InputSnapshot, SimCommand, Simulation, SimulationClock};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use super::config::GameTuning;
use super::dilation::{DilationSignal, TimeDilationEngine};
use super::dispatcher::AbilityDispatcher;
use super::pause::WorldPauseController;
use super::pool::EnergyPool;
use super::types::{AbilityKind, CastEvent, CastEventBus, DirectionSymbol};
use super::world::{CompensationSet, TunedEffects, Vec2, WorldState};

const ACTIVATION_BINDINGS: [(InputAction, AbilityKind); 4] = [
    (InputAction::CastMend, AbilityKind::Mend),
    (InputAction::CastBolt, AbilityKind::Bolt),
    (InputAction::CastShockwave, AbilityKind::Shockwave),
    (InputAction::CastPhase, AbilityKind::Phase),
];

const SYMBOL_BINDINGS: [(InputAction, DirectionSymbol); 4] = [
    (InputAction::SymbolUp, DirectionSymbol::Up),
    (InputAction::SymbolDown, DirectionSymbol::Down),
    (InputAction::SymbolLeft, DirectionSymbol::Left),
    (InputAction::SymbolRight, DirectionSymbol::Right),
];

const TRAINING_DUMMY_POSITIONS: [Vec2; 2] = [
    Vec2 { x: 2.0, y: 0.0 },
    Vec2 { x: -6.0, y: 0.0 },
];

/// The playable core: owns every casting/dilation subsystem plus the small
/// world that consumes the compensation factors, and fixes the per-tick
/// order they advance in.
pub struct CastingSession {
    dispatcher: AbilityDispatcher,
    dilation: TimeDilationEngine,
    pause: WorldPauseController,
    pool: EnergyPool,
    events: CastEventBus,
    world: WorldState,
}

impl CastingSession {
    pub fn new(tuning: GameTuning, rng: ChaCha8Rng) -> Self {
        let mut dispatcher = AbilityDispatcher::new(tuning.abilities.clone(), rng);
        dispatcher.set_effect_executor(Box::new(TunedEffects::new(tuning.effects)));
        let pool = EnergyPool::new(
            tuning.energy,
            &tuning.abilities,
            tuning.dilation_energy_cost,
        );
        let mut world = WorldState::new(&tuning.player);
        for position in TRAINING_DUMMY_POSITIONS {
            world.spawn_dummy(position);
        }
        Self {
            dispatcher,
            dilation: TimeDilationEngine::new(tuning.dilation),
            pause: WorldPauseController::new(),
            pool,
            events: CastEventBus::default(),
            world,
        }
    }

    fn collect_symbols(input: &InputSnapshot) -> Vec<DirectionSymbol> {
        SYMBOL_BINDINGS
            .iter()
            .filter(|(action, _)| input.pressed(*action))
            .map(|(_, symbol)| *symbol)
            .collect()
    }

    fn move_axis(input: &InputSnapshot) -> f32 {
        let mut axis = 0.0;
        if input.is_down(InputAction::SymbolRight) {
            axis += 1.0;
        }
        if input.is_down(InputAction::SymbolLeft) {
            axis -= 1.0;
        }
        axis
    }

    fn emit_dilation_signal(&mut self, signal: DilationSignal) {
        self.events.emit(match signal {
            DilationSignal::Started => CastEvent::DilationStarted,
            DilationSignal::Stopped => CastEvent::DilationStopped,
        });
    }

    fn log_event(&self, event: &CastEvent) {
        match event {
            CastEvent::AbilityActivated { kind, sequence } => {
                info!(
                    kind = kind.as_str(),
                    sequence = %format_sequence(sequence),
                    "ability_activated"
                );
            }
            CastEvent::ActivationRejected { kind, reason } => {
                info!(
                    kind = kind.as_str(),
                    reason = reason.as_str(),
                    cooldown_progress = self.dispatcher.cooldown_progress(*kind),
                    "ability_rejected"
                );
            }
            CastEvent::InputSlotResolved { index, correct } => {
                debug!(index = *index, correct = *correct, "cast_slot_resolved");
            }
            CastEvent::ChallengeResolved { kind, success } => {
                info!(kind = kind.as_str(), success = *success, "cast_resolved");
            }
            CastEvent::ChallengeCancelled { kind } => {
                info!(kind = kind.as_str(), "cast_cancelled");
            }
            CastEvent::DilationStarted => info!("dilation_started"),
            CastEvent::DilationStopped => info!("dilation_stopped"),
        }
    }
}

impl Simulation for CastingSession {
    fn tick(&mut self, clock: &mut SimulationClock, input: &InputSnapshot) -> SimCommand {
        if input.quit_requested() || input.pressed(InputAction::Quit) {
            return SimCommand::Exit;
        }

        // dilation first: it elapses on the wall clock and drives the scale
        // every other system reads this tick.
        if let Some(signal) = self.dilation.tick(clock.wall_delta(), clock, &mut self.pause) {
            self.emit_dilation_signal(signal);
        }

        // challenge/lockout/cooldown step. Unconditional: the pending
        // challenge is the only thing that can lift the pause it induced.
        let symbols = Self::collect_symbols(input);
        let abort_pressed = input.pressed(InputAction::AbortCast);
        self.dispatcher.tick(
            clock,
            &mut self.pause,
            &mut self.pool,
            &symbols,
            abort_pressed,
            &mut self.events,
        );
        if let Some(challenge) = self.dispatcher.active_challenge() {
            trace!(
                progress = challenge.progress_index(),
                total = challenge.required().len(),
                remaining_timeout = challenge.remaining_timeout_seconds(),
                "challenge_pending"
            );
        }

        // energy regenerates on the scaled clock.
        self.pool.tick(clock.scaled_delta());

        // activation requests: gates run strictly before challenge creation.
        for (action, kind) in ACTIVATION_BINDINGS {
            if input.pressed(action) {
                self.dispatcher.try_activate(
                    kind,
                    clock,
                    &mut self.pause,
                    &mut self.pool,
                    &mut self.events,
                );
            }
        }
        if input.pressed(InputAction::Dilate) {
            if self.pool.can_afford_dilation() {
                if let Some(signal) = self.dilation.try_activate(clock, &mut self.pause) {
                    self.pool.spend_dilation();
                    self.emit_dilation_signal(signal);
                }
            } else {
                debug!("dilation_rejected_pool_exhausted");
            }
        }

        // world-side effects of successful casts, then the world itself on
        // the scaled clock with the per-domain compensation curves.
        for command in self.dispatcher.drain_effects() {
            self.world.apply_effect(command);
        }
        let compensation = CompensationSet {
            raw: self.dilation.raw_compensation(clock),
            movement: self.dilation.movement_compensation(clock),
            jump: self.dilation.jump_compensation(clock),
        };
        self.world.tick(
            clock.scaled_delta(),
            Self::move_axis(input),
            input.pressed(InputAction::Jump),
            compensation,
        );

        // hand the tick's events to the collaborators (log stand-in).
        for event in self.events.events() {
            self.log_event(event);
        }
        self.events.finish_tick_rollover();
        let counts = self.events.last_tick_counts();
        if counts.total > 0 {
            trace!(events = counts.total, "cast_events_flushed");
        }

        SimCommand::Continue
    }
}

fn format_sequence(sequence: &[DirectionSymbol]) -> String {
    sequence
        .iter()
        .map(|symbol| symbol.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
