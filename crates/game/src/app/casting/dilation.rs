use engine::SimulationClock;
use tracing::debug;

use super::pause::WorldPauseController;

/// Below this the inverse would explode; treat the clock as effectively
/// stopped and fall back to the neutral factor.
const MIN_COMPENSATED_SCALE: f32 = 1e-4;

const JUMP_COMPENSATION_BLEND: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DilationTuning {
    pub base_scale: f32,
    pub duration_seconds: f32,
    pub cooldown_seconds: f32,
    pub recovery_fraction: f32,
}

impl Default for DilationTuning {
    fn default() -> Self {
        Self {
            base_scale: 0.3,
            duration_seconds: 5.0,
            cooldown_seconds: 12.0,
            recovery_fraction: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DilationSignal {
    Started,
    Stopped,
}

/// Manages the single active slow-motion interval.
///
/// The interval elapses on the wall clock. The scale sits at `base_scale`
/// until the trailing `recovery_fraction` of the duration, then ramps
/// linearly back to 1.0 and lands on exactly 1.0 at expiry. The cooldown is
/// the engine's own and also runs on the wall clock.
///
/// Scale writes are arbitrated with the pause controller: while a pause is
/// active the engine retargets the pause's saved scale instead of touching
/// the frozen clock, so there is exactly one scale writer at any moment. A
/// dilation that expires mid-pause therefore retargets the restore value to
/// 1.0 rather than unfreezing the world early.
#[derive(Debug)]
pub struct TimeDilationEngine {
    tuning: DilationTuning,
    active: bool,
    elapsed_seconds: f32,
    cooldown_remaining_seconds: f32,
}

impl TimeDilationEngine {
    pub fn new(tuning: DilationTuning) -> Self {
        Self {
            tuning,
            active: false,
            elapsed_seconds: 0.0,
            cooldown_remaining_seconds: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_ready(&self) -> bool {
        !self.active && self.cooldown_remaining_seconds <= 0.0
    }

    #[cfg(test)]
    pub fn cooldown_remaining_seconds(&self) -> f32 {
        self.cooldown_remaining_seconds
    }

    pub fn try_activate(
        &mut self,
        clock: &mut SimulationClock,
        pause: &mut WorldPauseController,
    ) -> Option<DilationSignal> {
        if !self.is_ready() {
            debug!(
                active = self.active,
                cooldown_remaining = self.cooldown_remaining_seconds,
                "dilation_not_ready"
            );
            return None;
        }
        self.active = true;
        self.elapsed_seconds = 0.0;
        self.write_scale(self.tuning.base_scale, clock, pause);
        Some(DilationSignal::Started)
    }

    /// Advances the effect by one wall-clock tick. Must run every frame,
    /// paused or not; the interval's wall-clock duration is unaffected by
    /// a pause.
    pub fn tick(
        &mut self,
        wall_delta_seconds: f32,
        clock: &mut SimulationClock,
        pause: &mut WorldPauseController,
    ) -> Option<DilationSignal> {
        if !self.active {
            self.cooldown_remaining_seconds =
                (self.cooldown_remaining_seconds - wall_delta_seconds).max(0.0);
            return None;
        }

        self.elapsed_seconds += wall_delta_seconds;
        if self.elapsed_seconds >= self.tuning.duration_seconds {
            self.active = false;
            self.cooldown_remaining_seconds = self.tuning.cooldown_seconds;
            self.write_scale(1.0, clock, pause);
            return Some(DilationSignal::Stopped);
        }

        self.write_scale(self.current_scale(), clock, pause);
        None
    }

    /// Exact inverse of the current scale while active; 1.0 otherwise.
    /// Consumers that must be scale-invariant (projectile flight and
    /// lifetime) multiply their scaled delta by this.
    pub fn raw_compensation(&self, clock: &SimulationClock) -> f32 {
        if self.active {
            raw_compensation(clock.scale())
        } else {
            1.0
        }
    }

    pub fn movement_compensation(&self, clock: &SimulationClock) -> f32 {
        movement_compensation(self.raw_compensation(clock))
    }

    pub fn jump_compensation(&self, clock: &SimulationClock) -> f32 {
        jump_compensation(self.raw_compensation(clock))
    }

    fn current_scale(&self) -> f32 {
        let recovery_start =
            self.tuning.duration_seconds * (1.0 - self.tuning.recovery_fraction);
        if self.elapsed_seconds < recovery_start {
            return self.tuning.base_scale;
        }
        let window = self.tuning.duration_seconds - recovery_start;
        if window <= 0.0 {
            return self.tuning.base_scale;
        }
        let t = ((self.elapsed_seconds - recovery_start) / window).clamp(0.0, 1.0);
        self.tuning.base_scale + (1.0 - self.tuning.base_scale) * t
    }

    fn write_scale(
        &self,
        scale: f32,
        clock: &mut SimulationClock,
        pause: &mut WorldPauseController,
    ) {
        if pause.is_paused() {
            pause.update_saved_scale(scale);
        } else {
            clock.set_scale(scale);
        }
    }
}

/// `1 / scale`, with a neutral fallback for a stopped or uninitialized
/// clock. Used where exact real-time-equivalent motion is required.
pub fn raw_compensation(scale: f32) -> f32 {
    if !scale.is_finite() || scale <= MIN_COMPENSATED_SCALE {
        return 1.0;
    }
    1.0 / scale
}

/// Deliberately under-compensates walking so slow motion still feels slow
/// without freezing the player in place (raw 3.33 → ~1.82).
pub fn movement_compensation(raw: f32) -> f32 {
    raw.sqrt()
}

/// Nearly un-compensated: gravity is scaled down by the same global scale,
/// so full compensation would send jumps sky-high (raw 3.33 → ~1.23).
pub fn jump_compensation(raw: f32) -> f32 {
    1.0 + (raw - 1.0) * JUMP_COMPENSATION_BLEND
}
