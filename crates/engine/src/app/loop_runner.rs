use std::env;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use super::clock::SimulationClock;
use super::input::InputSource;
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::sim::{SimCommand, Simulation};

pub const SLOW_TICK_ENV_VAR: &str = "CHRONOCAST_SLOW_TICK_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_tick_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_tick_ms: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid loop config: {field} must be non-zero")]
    InvalidLoopConfig { field: &'static str },
}

pub fn run_sim(
    config: LoopConfig,
    sim: &mut dyn Simulation,
    input: &mut dyn InputSource,
) -> Result<(), AppError> {
    run_sim_with_metrics(config, sim, input, MetricsHandle::default())
}

/// Headless fixed-timestep loop.
///
/// Each frame: measure the wall delta, clamp it, accumulate, and run at most
/// `max_ticks_per_frame` fixed ticks. A tick runs unconditionally every time
/// the accumulator allows one, regardless of the clock's current scale: the
/// simulation is the one that paused the clock, and it is the only thing
/// that can unpause it, so it must keep being ticked.
pub fn run_sim_with_metrics(
    config: LoopConfig,
    sim: &mut dyn Simulation,
    input: &mut dyn InputSource,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    validate_config(&config)?;

    let fixed_dt = Duration::from_secs_f64(1.0 / config.target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let slow_tick_delay = resolve_slow_tick_delay(config.simulated_slow_tick_ms);

    info!(
        target_tps = config.target_tps,
        max_frame_delta_ms = config.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = config.max_ticks_per_frame,
        metrics_log_interval_ms = config.metrics_log_interval.as_millis() as u64,
        slow_tick_delay_ms = slow_tick_delay.as_millis() as u64,
        "loop_config"
    );

    let mut clock = SimulationClock::new();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics = MetricsAccumulator::new(config.metrics_log_interval);
    let mut total_ticks: u64 = 0;

    loop {
        let now = Instant::now();
        let mut frame_delta = now.saturating_duration_since(last_frame_instant);
        last_frame_instant = now;
        if frame_delta > config.max_frame_delta {
            warn!(
                frame_delta_ms = frame_delta.as_millis() as u64,
                clamped_to_ms = config.max_frame_delta.as_millis() as u64,
                "frame_delta_clamped"
            );
            frame_delta = config.max_frame_delta;
        }
        accumulator = accumulator.saturating_add(frame_delta);

        let mut ticks_this_frame = 0u32;
        while accumulator >= fixed_dt {
            if ticks_this_frame >= config.max_ticks_per_frame {
                warn!(
                    dropped_ms = accumulator.as_millis() as u64,
                    "tick_budget_exhausted"
                );
                accumulator = Duration::ZERO;
                break;
            }
            accumulator -= fixed_dt;
            ticks_this_frame += 1;
            total_ticks = total_ticks.saturating_add(1);

            let snapshot = input.next_tick();
            let tick_start = Instant::now();
            clock.begin_tick(fixed_dt_seconds);
            let command = sim.tick(&mut clock, &snapshot);
            metrics.record_tick(tick_start.elapsed(), clock.scale());

            if !slow_tick_delay.is_zero() {
                thread::sleep(slow_tick_delay);
            }

            if command == SimCommand::Exit {
                info!(total_ticks, "simulation_exit");
                return Ok(());
            }
        }

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                sim_scale = snapshot.sim_scale,
                "tick_metrics"
            );
        }

        let frame_elapsed = last_frame_instant.elapsed();
        if let Some(sleep_for) = fixed_dt.checked_sub(frame_elapsed) {
            thread::sleep(sleep_for);
        }
    }
}

fn validate_config(config: &LoopConfig) -> Result<(), AppError> {
    if config.target_tps == 0 {
        return Err(AppError::InvalidLoopConfig {
            field: "target_tps",
        });
    }
    if config.max_ticks_per_frame == 0 {
        return Err(AppError::InvalidLoopConfig {
            field: "max_ticks_per_frame",
        });
    }
    if config.max_frame_delta.is_zero() {
        return Err(AppError::InvalidLoopConfig {
            field: "max_frame_delta",
        });
    }
    if config.metrics_log_interval.is_zero() {
        return Err(AppError::InvalidLoopConfig {
            field: "metrics_log_interval",
        });
    }
    Ok(())
}

fn resolve_slow_tick_delay(config_ms: u64) -> Duration {
    let env_ms = env::var(SLOW_TICK_ENV_VAR)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(0);
    Duration::from_millis(config_ms.max(env_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::{InputSnapshot, ScriptedInput};

    struct CountingSim {
        ticks_seen: u32,
        exit_after: u32,
    }

    impl Simulation for CountingSim {
        fn tick(&mut self, clock: &mut SimulationClock, input: &InputSnapshot) -> SimCommand {
            self.ticks_seen += 1;
            assert!(clock.wall_delta() > 0.0);
            if input.quit_requested() || self.ticks_seen >= self.exit_after {
                SimCommand::Exit
            } else {
                SimCommand::Continue
            }
        }
    }

    #[test]
    fn rejects_zero_target_tps() {
        let config = LoopConfig {
            target_tps: 0,
            ..LoopConfig::default()
        };
        let mut sim = CountingSim {
            ticks_seen: 0,
            exit_after: 1,
        };
        let mut input = ScriptedInput::default();
        let result = run_sim(config, &mut sim, &mut input);
        assert!(matches!(
            result,
            Err(AppError::InvalidLoopConfig {
                field: "target_tps"
            })
        ));
    }

    #[test]
    fn rejects_zero_max_ticks_per_frame() {
        let config = LoopConfig {
            max_ticks_per_frame: 0,
            ..LoopConfig::default()
        };
        let mut sim = CountingSim {
            ticks_seen: 0,
            exit_after: 1,
        };
        let mut input = ScriptedInput::default();
        assert!(run_sim(config, &mut sim, &mut input).is_err());
    }

    #[test]
    fn loop_exits_when_simulation_requests_it() {
        let config = LoopConfig {
            target_tps: 240,
            ..LoopConfig::default()
        };
        let mut sim = CountingSim {
            ticks_seen: 0,
            exit_after: 3,
        };
        let mut input = ScriptedInput::default();
        input.push_idle_ticks(16);
        run_sim(config, &mut sim, &mut input).expect("loop should run");
        assert_eq!(sim.ticks_seen, 3);
    }
}
